pub mod nvidia;
pub mod shapes;

pub use self::nvidia::NvidiaImageClient;

use async_trait::async_trait;
use log::{ debug, error, info };
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use self::shapes::{ match_shape, to_image_reference };

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No image URL returned from image provider")]
    NoImageProduced,
    #[error("Failed to generate image. Please check your API configuration and try again.")]
    GenerationFailed,
}

/// Fixed-shape body for the image endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub prompt: String,
    pub mode: &'static str,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub steps: u32,
}

impl ImagePayload {
    pub fn new(prompt: &str, width: u32, height: u32, steps: u32, cfg_scale: f32, seed: u64) -> Self {
        Self {
            prompt: prompt.to_string(),
            mode: "base",
            cfg_scale,
            width,
            height,
            seed,
            steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub image_url: String,
    pub prompt: String,
    pub seed: u64,
}

/// Transport to the image provider. Returns the raw JSON body on success
/// status; non-success statuses are errors.
#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate(&self, payload: &ImagePayload) -> Result<Value, Box<dyn StdError + Send + Sync>>;
}

/// Normalizes whatever layout the provider answered with into one reference.
pub fn extract_image_reference(body: &Value) -> Result<String, ImageError> {
    match match_shape(body) {
        Some((shape, raw)) => {
            debug!("Image found in '{}' shape", shape);
            Ok(to_image_reference(raw))
        }
        None => {
            let keys = body
                .as_object()
                .map(|o| o.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            error!("No image found in response. Available keys: {:?}", keys);
            Err(ImageError::NoImageProduced)
        }
    }
}

pub struct ImageGenerator {
    client: Arc<dyn ImageClient>,
}

impl ImageGenerator {
    pub fn new(client: Arc<dyn ImageClient>) -> Self {
        Self { client }
    }

    /// One image per call, no retry. Every failure surfaces as
    /// `ImageError::GenerationFailed`.
    pub async fn generate(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
        steps: u32,
        cfg_scale: f32,
        seed: u64
    ) -> Result<GeneratedImage, ImageError> {
        let payload = ImagePayload::new(prompt, width, height, steps, cfg_scale, seed);
        info!("Generating image {}x{} steps={} cfg_scale={} seed={}", width, height, steps, cfg_scale, seed);

        let body = self.client.generate(&payload).await.map_err(|e| {
            error!("Image generation API error: {}", e);
            ImageError::GenerationFailed
        })?;

        let image_url = extract_image_reference(&body).map_err(|e| {
            error!("Image generation API error: {}", e);
            ImageError::GenerationFailed
        })?;

        Ok(GeneratedImage {
            image_url,
            prompt: prompt.to_string(),
            seed,
        })
    }
}
