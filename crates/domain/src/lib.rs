//! Shared types for every imagechat crate: the error enum, provider-agnostic
//! messages and tool calls, image payloads, configuration and trace events.

pub mod config;
pub mod error;
pub mod image;
pub mod tool;
pub mod trace;
