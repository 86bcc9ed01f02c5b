use log::{ error, info };
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

use super::chat::{
    new_client,
    ChatClient,
    ChatCompletionRequest,
    ChatMessage,
    ContentPart,
    ImageUrl,
    MessageContent,
};
use super::registry::{ ModelDescriptor, ModelRegistry };
use super::{ Provider, ProviderConfig };
use crate::models::chat::{ Attachment, Turn };

pub const SYSTEM_PROMPT: &str =
    "You are YetSAI, an advanced AI assistant. You are helpful, intelligent, and engaging. \
Provide thoughtful, accurate responses while maintaining a friendly and professional tone. \
Keep responses concise but comprehensive when needed.\n\n\
When users send images, analyze them carefully and provide detailed descriptions or answer questions about them. \
For other file types, acknowledge them and provide relevant guidance based on the file names and types.";

pub const APOLOGY: &str = "I apologize, but I couldn't generate a response. Please try again.";

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Failed to generate AI response. Please check your API configuration and try again.")]
    GenerationFailed,
}

/// `message` followed by an "Attached files" block listing each file as
/// `- name (type)`. Unchanged when `files` is empty.
pub fn with_file_listing(message: &str, files: &[&Attachment]) -> String {
    if files.is_empty() {
        return message.to_string();
    }
    let listing = files
        .iter()
        .map(|f| format!("- {} ({})", f.name, f.mime_type))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\nAttached files:\n{}", message, listing)
}

/// Shapes the new user turn. Images become inline `image_url` parts after a
/// single text part; other files are only listed by name and type.
pub fn build_user_content(message: &str, attachments: &[Attachment]) -> MessageContent {
    let (images, others): (Vec<&Attachment>, Vec<&Attachment>) = attachments
        .iter()
        .partition(|a| a.is_image());
    let text = with_file_listing(message, &others);

    if images.is_empty() {
        return MessageContent::Text(text);
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(ContentPart::Text { text });
    parts.extend(
        images.into_iter().map(|img| ContentPart::ImageUrl {
            image_url: ImageUrl { url: img.data_url() },
        })
    );
    MessageContent::Parts(parts)
}

pub fn build_messages(history: &[Turn], user_content: MessageContent) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::text("system", SYSTEM_PROMPT));
    messages.extend(history.iter().map(|turn| ChatMessage::text(turn.role.as_str(), turn.content.clone())));
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user_content,
    });
    messages
}

pub fn build_request(descriptor: &ModelDescriptor, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: descriptor.model.to_string(),
        messages,
        temperature: descriptor.params.temperature,
        top_p: descriptor.params.top_p,
        max_tokens: descriptor.params.max_tokens,
        extra: descriptor.route.extension(),
    }
}

/// Picks the model, shapes the payload and dispatches to the matching gateway.
pub struct ResponseRouter {
    registry: &'static ModelRegistry,
    clients: HashMap<Provider, Arc<dyn ChatClient>>,
}

impl ResponseRouter {
    pub fn new(clients: Vec<Arc<dyn ChatClient>>) -> Self {
        let clients = clients
            .into_iter()
            .map(|client| (client.provider(), client))
            .collect();
        Self {
            registry: ModelRegistry::builtin(),
            clients,
        }
    }

    pub fn from_configs(
        configs: &[ProviderConfig]
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let clients = configs.iter().map(new_client).collect::<Result<Vec<_>, _>>()?;
        for client in &clients {
            info!("Chat client configured: provider={}, URL={}", client.provider(), client.get_base_url());
        }
        Ok(Self::new(clients))
    }

    pub fn registry(&self) -> &'static ModelRegistry {
        self.registry
    }

    pub async fn generate_response(
        &self,
        message: &str,
        history: &[Turn],
        attachments: &[Attachment],
        model_id: Option<&str>
    ) -> Result<String, RouterError> {
        let descriptor = self.registry.resolve(model_id);
        let provider = descriptor.provider();
        let client = self.clients.get(&provider).ok_or_else(|| {
            error!("No chat client configured for provider {}", provider);
            RouterError::GenerationFailed
        })?;

        let user_content = build_user_content(message, attachments);
        let request = build_request(descriptor, build_messages(history, user_content));
        info!(
            "Routing chat turn: model={} provider={} history={} attachments={}",
            descriptor.id,
            provider,
            history.len(),
            attachments.len()
        );

        match client.complete(&request).await {
            Ok(resp) => Ok(resp.response.unwrap_or_else(|| APOLOGY.to_string())),
            Err(e) => {
                error!("{} API error for model {}: {}", provider, descriptor.model, e);
                Err(RouterError::GenerationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::CompletionResponse;
    use crate::llm::registry::DEFAULT_MODEL_ID;
    use crate::models::chat::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingClient {
        provider: Provider,
        reply: Option<String>,
        fail: bool,
        seen: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl RecordingClient {
        fn new(provider: Provider, reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: reply.map(str::to_string),
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(provider: Provider) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply: None,
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn shared(self: &Arc<Self>) -> Arc<dyn ChatClient> {
            self.clone()
        }

        fn last(&self) -> ChatCompletionRequest {
            self.seen.lock().unwrap().last().cloned().expect("no request recorded")
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn complete(
            &self,
            request: &ChatCompletionRequest
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err("upstream exploded: 502 Bad Gateway".into());
            }
            Ok(CompletionResponse { response: self.reply.clone() })
        }

        fn provider(&self) -> Provider {
            self.provider
        }

        fn get_base_url(&self) -> String {
            "http://stub".to_string()
        }
    }

    fn attachment(name: &str, mime_type: &str) -> Attachment {
        Attachment {
            name: name.into(),
            mime_type: mime_type.into(),
            data: "QUJD".into(),
            size: 3,
        }
    }

    #[test]
    fn image_and_file_produce_text_part_plus_one_image_part() {
        let content = build_user_content("Describe this", &[
            attachment("photo.png", "image/png"),
            attachment("report.pdf", "application/pdf"),
        ]);

        let MessageContent::Parts(parts) = content else {
            panic!("expected multimodal content");
        };
        assert_eq!(parts.len(), 2);
        match &parts[0] {
            ContentPart::Text { text } => {
                assert!(text.starts_with("Describe this"));
                assert!(text.contains("- report.pdf (application/pdf)"));
                assert!(!text.contains("photo.png"));
            }
            other => panic!("expected text part, got {:?}", other),
        }
        let images = parts
            .iter()
            .filter(|p| matches!(p, ContentPart::ImageUrl { .. }))
            .count();
        assert_eq!(images, 1);
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl { image_url: ImageUrl { url: "data:image/png;base64,QUJD".into() } }
        );
    }

    #[test]
    fn files_without_images_stay_plain_text() {
        let content = build_user_content("Read these", &[
            attachment("a.txt", "text/plain"),
            attachment("b.csv", "text/csv"),
        ]);
        assert_eq!(
            content,
            MessageContent::Text(
                "Read these\n\nAttached files:\n- a.txt (text/plain)\n- b.csv (text/csv)".into()
            )
        );
    }

    #[test]
    fn no_attachments_leaves_message_untouched() {
        assert_eq!(build_user_content("Hello", &[]), MessageContent::Text("Hello".into()));
    }

    #[test]
    fn messages_are_system_then_history_then_user() {
        let history = vec![
            Turn { role: Role::User, content: "hi".into() },
            Turn { role: Role::Assistant, content: "hello".into() }
        ];
        let messages = build_messages(&history, MessageContent::Text("next".into()));
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, MessageContent::Text(SYSTEM_PROMPT.into()));
        assert_eq!(messages[3].content, MessageContent::Text("next".into()));
    }

    #[tokio::test]
    async fn dispatches_to_provider_of_resolved_model() {
        let nvidia = RecordingClient::new(Provider::Nvidia, Some("from nvidia"));
        let openrouter = RecordingClient::new(Provider::OpenRouter, Some("from openrouter"));
        let router = ResponseRouter::new(vec![nvidia.shared(), openrouter.shared()]);

        let reply = router.generate_response("hi", &[], &[], Some("gemini-2.0-flash")).await.unwrap();
        assert_eq!(reply, "from openrouter");
        let request = openrouter.last();
        assert_eq!(request.model, "google/gemini-2.0-flash-exp:free");
        assert_eq!(request.max_tokens, 4000);
        assert!(request.extra.is_empty());

        let reply = router.generate_response("hi", &[], &[], Some("no-such-model")).await.unwrap();
        assert_eq!(reply, "from nvidia");
        let request = nvidia.last();
        assert_eq!(request.model, "deepseek-ai/deepseek-v3.1");
        assert!(request.extra.contains_key("chat_template_kwargs"));
        assert_eq!(
            router.registry().resolve(Some("no-such-model")).id,
            DEFAULT_MODEL_ID
        );
    }

    #[tokio::test]
    async fn empty_reply_becomes_apology() {
        let router = ResponseRouter::new(vec![RecordingClient::new(Provider::Nvidia, None).shared()]);
        let reply = router.generate_response("hi", &[], &[], None).await.unwrap();
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn upstream_error_is_collapsed() {
        let router = ResponseRouter::new(vec![RecordingClient::failing(Provider::Nvidia).shared()]);
        let err = router.generate_response("hi", &[], &[], None).await.unwrap_err();
        assert!(matches!(err, RouterError::GenerationFailed));
        assert!(!err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn missing_client_is_generation_failure() {
        let router = ResponseRouter::new(vec![RecordingClient::new(Provider::Nvidia, Some("x")).shared()]);
        let err = router.generate_response("hi", &[], &[], Some("gemini-2.0-flash")).await;
        assert!(matches!(err, Err(RouterError::GenerationFailed)));
    }

    #[test]
    fn from_configs_registers_both_gateways() {
        let mut openrouter = ProviderConfig::new(Provider::OpenRouter, "or-key");
        openrouter.base_url = Some("http://localhost:9999/v1".into());
        let router = ResponseRouter::from_configs(&[
            ProviderConfig::new(Provider::Nvidia, "nv-key"),
            openrouter,
        ]).unwrap();

        assert_eq!(router.clients.len(), 2);
        assert_eq!(
            router.clients[&Provider::Nvidia].get_base_url(),
            crate::llm::chat::nvidia::DEFAULT_BASE_URL
        );
        assert_eq!(router.clients[&Provider::OpenRouter].get_base_url(), "http://localhost:9999/v1");
    }
}
