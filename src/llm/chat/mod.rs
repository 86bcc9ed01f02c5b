pub mod nvidia;
pub mod openrouter;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use std::error::Error as StdError;
use std::sync::Arc;
use super::{ Provider, ProviderConfig };
use self::nvidia::NvidiaChatClient;
use self::openrouter::OpenRouterChatClient;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Plain text, or a list of typed parts for multimodal turns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// OpenAI-compatible completion body shared by both gateways.
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// First choice's content; `None` when the upstream sent null or empty text.
    pub response: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        request: &ChatCompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn provider(&self) -> Provider;

    fn get_base_url(&self) -> String;
}

pub(crate) async fn post_completion(
    http: &HttpClient,
    base_url: &str,
    request: &ChatCompletionRequest
) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!("POST {} model={}", url, request.model);

    let resp = http
        .post(&url)
        .json(request)
        .send().await?
        .error_for_status()?
        .json::<ChatCompletionResponse>().await?;

    let choice = resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| format!("No choices returned from {}", url))?;

    Ok(CompletionResponse {
        response: choice.message.content.filter(|c| !c.is_empty()),
    })
}

pub fn new_client(
    config: &ProviderConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.provider {
        Provider::Nvidia => {
            let specific_client = NvidiaChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        Provider::OpenRouter => {
            let specific_client = OpenRouterChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multimodal_content_serializes_as_typed_parts() {
        let message = ChatMessage {
            role: "user".into(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: "what is this?".into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: "data:image/png;base64,QUJD".into() },
                }
            ]),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "what is this?" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,QUJD" } }
                ]
            })
        );
    }

    #[test]
    fn extension_fields_are_merged_at_top_level() {
        let mut extra = Map::new();
        extra.insert("chat_template_kwargs".into(), json!({ "thinking": true }));
        let request = ChatCompletionRequest {
            model: "m".into(),
            messages: vec![ChatMessage::text("user", "hi")],
            temperature: 0.5,
            top_p: 0.75,
            max_tokens: 16,
            extra,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["chat_template_kwargs"]["thinking"], json!(true));
        assert_eq!(body["max_tokens"], json!(16));
        assert_eq!(body["messages"][0]["content"], json!("hi"));
        assert!(body.get("extra").is_none());
    }
}
