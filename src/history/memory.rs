use async_trait::async_trait;
use chrono::Utc;
use std::collections::{ HashMap, HashSet };
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ sort_by_timestamp, HistoryError, HistoryStore };
use crate::models::chat::{ Conversation, Message, NewMessage };

#[derive(Default)]
struct Inner {
    conversations: HashMap<String, Conversation>,
    /// session id -> id of the first conversation created for it
    sessions: HashMap<String, String>,
    messages: Vec<Message>,
}

impl Inner {
    fn insert_conversation(&mut self, session_id: &str) -> Conversation {
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| conversation.id.clone());
        self.conversations.insert(conversation.id.clone(), conversation.clone());
        conversation
    }

    fn by_session(&self, session_id: &str) -> Option<&Conversation> {
        self.sessions.get(session_id).and_then(|id| self.conversations.get(id))
    }
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryHistoryStore {
    inner: RwLock<Inner>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn create_conversation(&self, session_id: &str) -> Result<Conversation, HistoryError> {
        Ok(self.inner.write().await.insert_conversation(session_id))
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, HistoryError> {
        Ok(self.inner.read().await.conversations.get(id).cloned())
    }

    async fn get_conversation_by_session_id(
        &self,
        session_id: &str
    ) -> Result<Option<Conversation>, HistoryError> {
        Ok(self.inner.read().await.by_session(session_id).cloned())
    }

    async fn get_or_create_conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, HistoryError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.by_session(session_id) {
            return Ok(existing.clone());
        }
        Ok(inner.insert_conversation(session_id))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, HistoryError> {
        let message = message.into_message();
        self.inner.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn get_messages_by_conversation_id(
        &self,
        conversation_id: &str
    ) -> Result<Vec<Message>, HistoryError> {
        let mut messages: Vec<Message> = self.inner
            .read().await
            .messages.iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        sort_by_timestamp(&mut messages);
        Ok(messages)
    }

    async fn clear_conversation(&self, session_id: &str) -> Result<bool, HistoryError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.remove(session_id).is_none() {
            return Ok(false);
        }
        let removed: HashSet<String> = inner.conversations
            .values()
            .filter(|c| c.session_id == session_id)
            .map(|c| c.id.clone())
            .collect();
        inner.conversations.retain(|id, _| !removed.contains(id));
        inner.messages.retain(|m| !removed.contains(&m.conversation_id));
        Ok(true)
    }
}
