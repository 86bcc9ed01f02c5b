mod memory;
mod redis;

pub use self::memory::MemoryHistoryStore;
pub use self::redis::RedisHistoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;
use crate::cli::Args;
use crate::models::chat::{ Conversation, Message, NewMessage, Turn };

#[derive(Debug, ThisError)]
pub enum HistoryError {
    #[error("history backend error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Conversation and message persistence. Lookup misses are `None` or an empty
/// list, never an error.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create_conversation(&self, session_id: &str) -> Result<Conversation, HistoryError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, HistoryError>;

    async fn get_conversation_by_session_id(
        &self,
        session_id: &str
    ) -> Result<Option<Conversation>, HistoryError>;

    /// Returns the session's conversation, creating it if needed. Backends make
    /// this atomic so one session never owns two conversations.
    async fn get_or_create_conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, HistoryError>;

    async fn create_message(&self, message: NewMessage) -> Result<Message, HistoryError>;

    /// Messages of one conversation in ascending timestamp order.
    async fn get_messages_by_conversation_id(
        &self,
        conversation_id: &str
    ) -> Result<Vec<Message>, HistoryError>;

    async fn get_messages_by_session_id(
        &self,
        session_id: &str
    ) -> Result<Vec<Message>, HistoryError> {
        match self.get_conversation_by_session_id(session_id).await? {
            Some(conversation) => self.get_messages_by_conversation_id(&conversation.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Deletes the session's conversation and its messages. Returns whether
    /// anything was removed.
    async fn clear_conversation(&self, session_id: &str) -> Result<bool, HistoryError>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new())),
        "redis" => {
            let store = RedisHistoryStore::new(&args.history_host, &args.history_redis_prefix)?;
            Ok(Arc::new(store))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    if args.history_type.eq_ignore_ascii_case("memory") {
        info!("Chat history will be kept in process memory");
    } else {
        info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    }
    create_history_store(args)
}

pub fn history_turns(messages: &[Message]) -> Vec<Turn> {
    messages.iter().map(Turn::from).collect()
}

/// Stable sort keeps append order for messages sharing a timestamp.
pub(crate) fn sort_by_timestamp(messages: &mut [Message]) {
    messages.sort_by_key(|m| m.timestamp);
}
