//! Image generation client.
//!
//! Calls the OpenAI images API and returns the URL of the generated image.

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use openai_client::mask_token;
use std::sync::Arc;

/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// One-image-per-call client for the OpenAI images API (or a compatible endpoint).
#[derive(Clone)]
pub struct ImageGenerationClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    size: ImageSize,
    masked_key: String,
}

impl ImageGenerationClient {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let masked_key = mask_token(&api_key);
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: ImageSize::S1024x1024,
            masked_key,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn image_model(&self) -> ImageModel {
        match self.model.as_str() {
            "dall-e-2" => ImageModel::DallE2,
            "dall-e-3" => ImageModel::DallE3,
            other => ImageModel::Other(other.to_string()),
        }
    }

    /// Generates one image for `prompt` and returns its URL.
    #[tracing::instrument(skip(self, prompt), fields(model = %self.model))]
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        tracing::info!(
            size = ?self.size,
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            api_key = %self.masked_key,
            "OpenAI image generation request"
        );

        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(self.image_model())
            .size(self.size)
            .response_format(ImageResponseFormat::Url)
            .n(1)
            .build()?;

        let response = self.client.images().create(request).await?;

        match response.data.first().and_then(|d| match d.as_ref() {
            Image::Url { url, .. } => Some(url),
            Image::B64Json { .. } => None,
        }) {
            Some(url) => {
                tracing::info!(image_url = %url, "OpenAI image generation completed");
                Ok(url.clone())
            }
            None => anyhow::bail!("No image URL in response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: Known model names map to their enum variants; others pass through.**
    #[test]
    fn image_model_mapping() {
        let client = ImageGenerationClient::with_base_url(
            "sk-test-key-0000".to_string(),
            "https://api.openai.com/v1".to_string(),
        );
        assert!(matches!(client.image_model(), ImageModel::DallE3));
        let client = client.with_model("dall-e-2");
        assert!(matches!(client.image_model(), ImageModel::DallE2));
        let client = client.with_model("gpt-image-1");
        assert!(matches!(client.image_model(), ImageModel::Other(ref m) if m == "gpt-image-1"));
    }

    #[tokio::test]
    #[ignore] // needs a real OPENAI_API_KEY
    async fn generate_image_live() {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap();
        let client = ImageGenerationClient::with_base_url(api_key, "https://api.openai.com/v1".to_string());
        let url = client.generate_image("a lighthouse at dusk").await.unwrap();
        assert!(url.starts_with("http"));
    }
}
