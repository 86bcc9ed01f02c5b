use crate::history::{ history_turns, initialize_history_store, HistoryError, HistoryStore };
use crate::image::{ ImageError, ImageGenerator, NvidiaImageClient };
use crate::llm::router::{ ResponseRouter, RouterError };
use crate::cli::Args;
use crate::models::api::{ ChatRequest, ChatResponse, ImageGenerationRequest, ImageGenerationResponse };
use crate::models::chat::{ Message, NewMessage };

use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(Debug, ThisError)]
pub enum AgentError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Ties the conversation store to the response router and the image adapter.
#[derive(Clone)]
pub struct ChatAgent {
    history_store: Arc<dyn HistoryStore>,
    router: Arc<ResponseRouter>,
    image_generator: Arc<ImageGenerator>,
}

impl ChatAgent {
    pub fn new(
        history_store: Arc<dyn HistoryStore>,
        router: ResponseRouter,
        image_generator: ImageGenerator
    ) -> Self {
        Self {
            history_store,
            router: Arc::new(router),
            image_generator: Arc::new(image_generator),
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let history_store = initialize_history_store(args)?;

        for config in args.provider_configs() {
            if config.api_key.is_empty() {
                warn!("No API key configured for {}; calls to it will fail", config.provider);
            }
        }
        let router = ResponseRouter::from_configs(&args.provider_configs())?;

        if args.image_api_key.is_empty() {
            warn!("No image API key configured; image generation will fail");
        }
        let image_client = NvidiaImageClient::new(&args.image_api_key, args.image_url.clone())?;
        info!("Image client configured: URL={}", image_client.url());
        let image_generator = ImageGenerator::new(Arc::new(image_client));

        Ok(Self::new(history_store, router, image_generator))
    }

    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    /// One chat turn: fetch or create the session's conversation, read its
    /// history, generate the reply, then append the user and assistant turns.
    /// Nothing is stored when generation fails.
    pub async fn process_message(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let session_id = request.session_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let conversation = self.history_store.get_or_create_conversation(&session_id).await?;
        let previous = self.history_store.get_messages_by_conversation_id(&conversation.id).await?;
        let history = history_turns(&previous);
        // Stored whenever the field was sent, including an empty list.
        let serialized_attachments = match &request.attachments {
            Some(list) => Some(serde_json::to_string(list).map_err(HistoryError::from)?),
            None => None,
        };
        let attachments = request.attachments.unwrap_or_default();

        let response = self.router.generate_response(
            &request.message,
            &history,
            &attachments,
            Some(request.ai_model.as_str())
        ).await?;

        self.history_store.create_message(
            NewMessage::user(&conversation.id, &request.message, serialized_attachments)
        ).await?;
        self.history_store.create_message(
            NewMessage::assistant(&conversation.id, &response)
        ).await?;

        Ok(ChatResponse { response, session_id })
    }

    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>, AgentError> {
        Ok(self.history_store.get_messages_by_session_id(session_id).await?)
    }

    pub async fn clear_conversation(&self, session_id: &str) -> Result<bool, AgentError> {
        let removed = self.history_store.clear_conversation(session_id).await?;
        if removed {
            info!("Cleared conversation for session {}", session_id);
        }
        Ok(removed)
    }

    pub async fn generate_image(
        &self,
        request: ImageGenerationRequest
    ) -> Result<ImageGenerationResponse, AgentError> {
        let image = self.image_generator.generate(
            &request.prompt,
            request.width,
            request.height,
            request.steps,
            request.cfg_scale,
            request.seed
        ).await?;
        Ok(ImageGenerationResponse {
            image_url: image.image_url,
            prompt: image.prompt,
            seed: image.seed,
        })
    }
}
