//! OpenAI image generation and editing adapter.
//!
//! `POST {base_url}/images/generations` takes JSON; `POST {base_url}/images/edits`
//! takes a multipart form with the source image as a file part. Both return
//! `data[0].b64_json`, or `data[0].url` for models that only hand out links.

use std::time::{Duration, Instant};

use ic_domain::config::{ImagesConfig, LlmConfig};
use ic_domain::error::{Error, Result};
use ic_domain::image::ImageData;
use ic_domain::trace::TraceEvent;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::traits::{ImageEditRequest, ImageGenerateRequest, ImageProvider};
use crate::util::{from_reqwest, read_success_body, AuthHeader};

pub struct OpenAiImageProvider {
    id: String,
    base_url: String,
    auth: AuthHeader,
    model: String,
    default_size: String,
    client: reqwest::Client,
}

impl OpenAiImageProvider {
    /// Build from the shared `[llm]` connection settings plus `[images]`.
    pub fn from_config(llm: &LlmConfig, images: &ImagesConfig) -> Result<Self> {
        let auth = AuthHeader::from_config(&llm.auth)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(images.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: llm.provider_id.clone(),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            auth,
            model: images.model.clone(),
            default_size: images.size.clone(),
            client,
        })
    }

    fn generation_body(&self, req: &ImageGenerateRequest) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": req.prompt,
            "size": req.size.as_deref().unwrap_or(&self.default_size),
            "n": 1,
        });
        // gpt-image models always return base64 and reject this field.
        if is_dalle_model(&self.model) {
            body["response_format"] = Value::String("b64_json".into());
        }
        body
    }

    fn edit_form(&self, req: &ImageEditRequest) -> Result<Form> {
        let bytes = req.image.decode()?;
        let part = Part::bytes(bytes)
            .file_name("image.png")
            .mime_str(req.image.media_type())
            .map_err(from_reqwest)?;

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", req.prompt.clone())
            .text("size", req.size.clone().unwrap_or_else(|| self.default_size.clone()))
            .text("n", "1")
            .part("image", part);
        if is_dalle_model(&self.model) {
            form = form.text("response_format", "b64_json");
        }
        Ok(form)
    }

    /// Pull the first image out of a `data` array, downloading it when the
    /// response only carries a URL.
    async fn extract_image(&self, body: &Value) -> Result<ImageData> {
        let first = body
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|rows| rows.first())
            .ok_or_else(|| self.err("response contained no image"))?;

        if let Some(b64) = first.get("b64_json").and_then(|v| v.as_str()) {
            if !b64.trim().is_empty() {
                return Ok(ImageData::from_base64(b64));
            }
        }
        if let Some(url) = first.get("url").and_then(|v| v.as_str()) {
            return self.download(url).await;
        }
        Err(self.err("response contained no image"))
    }

    async fn download(&self, url: &str) -> Result<ImageData> {
        tracing::debug!(provider = %self.id, "downloading image from returned url");
        let resp = self.client.get(url).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.err(format!("image download failed (HTTP {})", status.as_u16())));
        }
        let bytes = resp.bytes().await.map_err(from_reqwest)?;
        Ok(ImageData::from_bytes(&bytes))
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::Provider {
            provider: self.id.clone(),
            message: message.into(),
        }
    }

    fn trace(&self, operation: &str, started: Instant) {
        TraceEvent::ImageRequest {
            provider: self.id.clone(),
            model: self.model.clone(),
            operation: operation.into(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();
    }
}

fn is_dalle_model(model: &str) -> bool {
    model.to_ascii_lowercase().starts_with("dall-e")
}

#[async_trait::async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate(&self, req: &ImageGenerateRequest) -> Result<ImageData> {
        let url = format!("{}/images/generations", self.base_url);
        tracing::debug!(provider = %self.id, url = %url, model = %self.model, "image generation request");

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header(&self.auth.name, &self.auth.value)
            .json(&self.generation_body(req))
            .send()
            .await
            .map_err(from_reqwest)?;

        let body = read_success_body(&self.id, resp).await?;
        let image = self.extract_image(&body).await?;
        self.trace("generate", started);
        Ok(image)
    }

    async fn edit(&self, req: &ImageEditRequest) -> Result<ImageData> {
        let url = format!("{}/images/edits", self.base_url);
        tracing::debug!(
            provider = %self.id,
            url = %url,
            model = %self.model,
            source_len = req.image.encoded_len(),
            "image edit request"
        );

        let form = self.edit_form(req)?;
        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header(&self.auth.name, &self.auth.value)
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;

        let body = read_success_body(&self.id, resp).await?;
        let image = self.extract_image(&body).await?;
        self.trace("edit", started);
        Ok(image)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_domain::config::AuthConfig;

    fn provider(model: &str) -> OpenAiImageProvider {
        let llm = LlmConfig {
            auth: AuthConfig {
                key: Some("sk-test".into()),
                env: None,
                ..Default::default()
            },
            ..Default::default()
        };
        let images = ImagesConfig {
            model: model.into(),
            ..Default::default()
        };
        OpenAiImageProvider::from_config(&llm, &images).unwrap()
    }

    #[test]
    fn gpt_image_body_omits_response_format() {
        let body = provider("gpt-image-1").generation_body(&ImageGenerateRequest {
            prompt: "a red fox".into(),
            size: None,
        });
        assert_eq!(body["model"], "gpt-image-1");
        assert_eq!(body["prompt"], "a red fox");
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["n"], 1);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn dalle_body_requests_base64() {
        let body = provider("dall-e-3").generation_body(&ImageGenerateRequest {
            prompt: "a red fox".into(),
            size: Some("1792x1024".into()),
        });
        assert_eq!(body["response_format"], "b64_json");
        assert_eq!(body["size"], "1792x1024");
    }

    #[test]
    fn edit_form_rejects_invalid_source() {
        let req = ImageEditRequest {
            image: ImageData::from_base64("not base64 at all!"),
            prompt: "make it blue".into(),
            size: None,
        };
        assert!(provider("gpt-image-1").edit_form(&req).is_err());
    }

    #[tokio::test]
    async fn extracts_inline_base64() {
        let body = serde_json::json!({ "data": [{ "b64_json": "aGVsbG8=" }] });
        let image = provider("gpt-image-1").extract_image(&body).await.unwrap();
        assert_eq!(image.as_base64(), "aGVsbG8=");
    }

    #[tokio::test]
    async fn empty_data_is_provider_error() {
        let body = serde_json::json!({ "data": [] });
        let err = provider("gpt-image-1").extract_image(&body).await.unwrap_err();
        assert!(err.to_string().contains("no image"));
    }
}
