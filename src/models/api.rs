use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{ Serialize, Deserialize };
use thiserror::Error;

use super::chat::Attachment;
use crate::llm::registry::DEFAULT_MODEL_ID;

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MAX_PROMPT_CHARS: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("message must be between 1 and {max} characters")]
    MessageLength { max: usize },
    #[error("prompt must be between 1 and {max} characters")]
    PromptLength { max: usize },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: f64, max: f64 },
    #[error("attachment '{0}' is not valid base64")]
    InvalidAttachment(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default = "default_model")]
    pub ai_model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            attachments: None,
            ai_model: default_model(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.message.chars().count();
        if len == 0 || len > MAX_MESSAGE_CHARS {
            return Err(ValidationError::MessageLength { max: MAX_MESSAGE_CHARS });
        }
        for attachment in self.attachments.iter().flatten() {
            if STANDARD.decode(attachment.data.as_bytes()).is_err() {
                return Err(ValidationError::InvalidAttachment(attachment.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f32,
    #[serde(default)]
    pub seed: u64,
}

fn default_dimension() -> u32 {
    1024
}

fn default_steps() -> u32 {
    50
}

fn default_cfg_scale() -> f32 {
    3.5
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(())
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: default_dimension(),
            height: default_dimension(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            seed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.prompt.chars().count();
        if len == 0 || len > MAX_PROMPT_CHARS {
            return Err(ValidationError::PromptLength { max: MAX_PROMPT_CHARS });
        }
        check_range("width", self.width as f64, 512.0, 2048.0)?;
        check_range("height", self.height as f64, 512.0, 2048.0)?;
        check_range("steps", self.steps as f64, 1.0, 100.0)?;
        check_range("cfg_scale", self.cfg_scale as f64, 1.0, 20.0)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationResponse {
    pub image_url: String,
    pub prompt: String,
    pub seed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub message: String,
}
