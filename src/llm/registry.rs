use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{ json, Map, Value };

use super::Provider;

pub const DEFAULT_MODEL_ID: &str = "deepseek-v3.1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// Which gateway serves a model, together with the parameters only that
/// gateway understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRoute {
    /// `extra_body` fields are merged verbatim into the request body.
    Nvidia {
        extra_body: Option<Map<String, Value>>,
    },
    OpenRouter,
}

impl ProviderRoute {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderRoute::Nvidia { .. } => Provider::Nvidia,
            ProviderRoute::OpenRouter => Provider::OpenRouter,
        }
    }

    pub fn extension(&self) -> Map<String, Value> {
        match self {
            ProviderRoute::Nvidia { extra_body: Some(extra) } => extra.clone(),
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub model: &'static str,
    pub params: GenerationParams,
    pub route: ProviderRoute,
}

impl ModelDescriptor {
    pub fn provider(&self) -> Provider {
        self.route.provider()
    }
}

/// Fixed at startup. The first entry is the fallback for unknown ids.
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

fn nvidia(
    id: &'static str,
    model: &'static str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32
) -> ModelDescriptor {
    ModelDescriptor {
        id,
        model,
        params: GenerationParams { temperature, top_p, max_tokens },
        route: ProviderRoute::Nvidia { extra_body: None },
    }
}

static BUILTIN: Lazy<ModelRegistry> = Lazy::new(|| {
    let mut deepseek = nvidia(DEFAULT_MODEL_ID, "deepseek-ai/deepseek-v3.1", 0.2, 0.7, 8192);
    let mut extra = Map::new();
    extra.insert("chat_template_kwargs".to_string(), json!({ "thinking": true }));
    deepseek.route = ProviderRoute::Nvidia { extra_body: Some(extra) };

    ModelRegistry {
        models: vec![
            deepseek,
            nvidia("deepseek-r1", "deepseek-ai/deepseek-r1", 0.6, 0.7, 4096),
            nvidia("qwen-coder", "qwen/qwen3-coder-480b-a35b-instruct", 0.7, 0.8, 4096),
            ModelDescriptor {
                id: "gemini-2.0-flash",
                model: "google/gemini-2.0-flash-exp:free",
                params: GenerationParams { temperature: 0.7, top_p: 0.9, max_tokens: 4000 },
                route: ProviderRoute::OpenRouter,
            },
            nvidia("llama-3.3", "meta/llama-3.3-70b-instruct", 0.2, 0.7, 1024),
            nvidia("chatgpt-oss", "openai/gpt-oss-120b", 1.0, 1.0, 4096)
        ],
    }
});

impl ModelRegistry {
    pub fn builtin() -> &'static ModelRegistry {
        &BUILTIN
    }

    pub fn default_model(&self) -> &ModelDescriptor {
        &self.models[0]
    }

    /// Never fails: absent or unknown ids resolve to the default model.
    pub fn resolve(&self, model_id: Option<&str>) -> &ModelDescriptor {
        model_id
            .and_then(|id| self.models.iter().find(|m| m.id == id))
            .unwrap_or_else(|| self.default_model())
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }
}
