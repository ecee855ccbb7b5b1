//! Image tools exposed to the model.
//!
//! - `generate_image`: create a new image from a prompt
//! - `edit_image`: modify the conversation's current image
//! - `analyze_image`: answer a question about the current image
//!
//! Executors never fail outward: every outcome, including provider errors
//! and timeouts, becomes a [`ToolResult`] whose text is fed back to the model.

pub mod executor;
pub mod invocation;
pub mod schema;

pub use executor::{ImageToolExecutor, ToolResult};
pub use invocation::{ImageTool, InvocationError};
pub use schema::definitions;
