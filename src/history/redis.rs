use async_trait::async_trait;
use chrono::Utc;
use log::{ debug, error, warn };
use redis::aio::MultiplexedConnection;
use redis::{ AsyncCommands, Client };
use uuid::Uuid;

use super::{ sort_by_timestamp, HistoryError, HistoryStore };
use crate::models::chat::{ Conversation, Message, NewMessage };

/// Key layout under a prefix:
/// `conversation:{id}` JSON record,
/// `session:{session_id}` id of the conversation that owns the session,
/// `session-conversations:{session_id}` set of every conversation id made for it,
/// `messages:{conversation_id}` list of JSON messages in append order.
#[derive(Debug, Clone)]
struct Keys {
    prefix: String,
}

impl Keys {
    fn conversation(&self, id: &str) -> String {
        format!("{}conversation:{}", self.prefix, id)
    }

    fn session(&self, session_id: &str) -> String {
        format!("{}session:{}", self.prefix, session_id)
    }

    fn session_conversations(&self, session_id: &str) -> String {
        format!("{}session-conversations:{}", self.prefix, session_id)
    }

    fn messages(&self, conversation_id: &str) -> String {
        format!("{}messages:{}", self.prefix, conversation_id)
    }

    /// Everything owned by a session: its index keys plus the record and
    /// message list of each conversation id given, deduplicated.
    fn owned_by_session<'a>(
        &self,
        session_id: &str,
        conversation_ids: impl IntoIterator<Item = &'a String>
    ) -> Vec<String> {
        let mut keys = vec![self.session(session_id), self.session_conversations(session_id)];
        for id in conversation_ids {
            let record = self.conversation(id);
            if !keys.contains(&record) {
                keys.push(record);
                keys.push(self.messages(id));
            }
        }
        keys
    }
}

/// Durable backend. Each session is claimed by at most one conversation
/// through `SET NX` on its session key.
pub struct RedisHistoryStore {
    client: Client,
    keys: Keys,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(host)?,
            keys: Keys { prefix: key_prefix.to_string() },
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    /// Writes a new conversation and tries to claim the session for it.
    /// Returns the conversation and whether the claim succeeded.
    async fn insert_conversation(
        &self,
        conn: &mut MultiplexedConnection,
        session_id: &str
    ) -> Result<(Conversation, bool), HistoryError> {
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&conversation)?;
        let _: () = conn.set(self.keys.conversation(&conversation.id), json).await?;
        let _: i64 = conn.sadd(self.keys.session_conversations(session_id), &conversation.id).await?;
        let claimed: bool = conn.set_nx(self.keys.session(session_id), &conversation.id).await?;
        Ok((conversation, claimed))
    }

    async fn discard_conversation(
        &self,
        conn: &mut MultiplexedConnection,
        conversation: &Conversation
    ) -> Result<(), HistoryError> {
        let _: i64 = conn.del(self.keys.conversation(&conversation.id)).await?;
        let _: i64 = conn
            .srem(self.keys.session_conversations(&conversation.session_id), &conversation.id).await?;
        Ok(())
    }

    async fn load_conversation(
        &self,
        conn: &mut MultiplexedConnection,
        id: &str
    ) -> Result<Option<Conversation>, HistoryError> {
        let raw: Option<String> = conn.get(self.keys.conversation(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Loads the conversation owning the session. An index entry whose record
    /// is gone is removed so the session can be claimed again.
    async fn load_session(
        &self,
        conn: &mut MultiplexedConnection,
        session_id: &str
    ) -> Result<Option<Conversation>, HistoryError> {
        let id: Option<String> = conn.get(self.keys.session(session_id)).await?;
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(conversation) = self.load_conversation(conn, &id).await? {
            return Ok(Some(conversation));
        }

        warn!("Session {} points at missing conversation {}, releasing it", session_id, id);
        let session_key = self.keys.session(session_id);
        let current: Option<String> = conn.get(&session_key).await?;
        if current.as_deref() == Some(id.as_str()) {
            let _: i64 = conn.del(&session_key).await?;
        }
        let _: i64 = conn.srem(self.keys.session_conversations(session_id), &id).await?;
        Ok(None)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn create_conversation(&self, session_id: &str) -> Result<Conversation, HistoryError> {
        let mut conn = self.get_connection().await?;
        let (conversation, _) = self.insert_conversation(&mut conn, session_id).await?;
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, HistoryError> {
        let mut conn = self.get_connection().await?;
        self.load_conversation(&mut conn, id).await
    }

    async fn get_conversation_by_session_id(
        &self,
        session_id: &str
    ) -> Result<Option<Conversation>, HistoryError> {
        let mut conn = self.get_connection().await?;
        self.load_session(&mut conn, session_id).await
    }

    async fn get_or_create_conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, HistoryError> {
        let mut conn = self.get_connection().await?;
        if let Some(conversation) = self.load_session(&mut conn, session_id).await? {
            return Ok(conversation);
        }

        let (conversation, claimed) = self.insert_conversation(&mut conn, session_id).await?;
        if claimed {
            return Ok(conversation);
        }

        // Another request claimed the session first; drop ours and use theirs.
        debug!("Session {} claimed concurrently, discarding {}", session_id, conversation.id);
        self.discard_conversation(&mut conn, &conversation).await?;
        match self.load_session(&mut conn, session_id).await? {
            Some(winner) => Ok(winner),
            None => {
                // The winner vanished in between; claim with a fresh record.
                let (retry, claimed) = self.insert_conversation(&mut conn, session_id).await?;
                if !claimed {
                    warn!("Session {} is contended, using unclaimed conversation {}", session_id, retry.id);
                }
                Ok(retry)
            }
        }
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, HistoryError> {
        let mut conn = self.get_connection().await?;
        let message = message.into_message();
        let json = serde_json::to_string(&message)?;
        let _: i64 = conn.rpush(self.keys.messages(&message.conversation_id), json).await?;
        Ok(message)
    }

    async fn get_messages_by_conversation_id(
        &self,
        conversation_id: &str
    ) -> Result<Vec<Message>, HistoryError> {
        let mut conn = self.get_connection().await?;
        let entries: Vec<String> = conn.lrange(self.keys.messages(conversation_id), 0, -1).await?;
        let mut messages = Vec::with_capacity(entries.len());

        for entry in &entries {
            match serde_json::from_str::<Message>(entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => error!("Error parsing history entry: {}", e),
            }
        }
        sort_by_timestamp(&mut messages);
        Ok(messages)
    }

    async fn clear_conversation(&self, session_id: &str) -> Result<bool, HistoryError> {
        let mut conn = self.get_connection().await?;
        let indexed: Option<String> = conn.get(self.keys.session(session_id)).await?;
        let Some(indexed) = indexed else {
            return Ok(false);
        };
        let mut ids: Vec<String> = conn.smembers(self.keys.session_conversations(session_id)).await?;
        ids.push(indexed);

        let keys = self.keys.owned_by_session(session_id, &ids);
        let _: i64 = conn.del(keys).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Keys {
        Keys { prefix: "yetsai:".into() }
    }

    #[test]
    fn keys_are_prefixed() {
        let keys = keys();
        assert_eq!(keys.conversation("c1"), "yetsai:conversation:c1");
        assert_eq!(keys.session("s1"), "yetsai:session:s1");
        assert_eq!(keys.session_conversations("s1"), "yetsai:session-conversations:s1");
        assert_eq!(keys.messages("c1"), "yetsai:messages:c1");
    }

    #[test]
    fn clearing_covers_every_conversation_of_the_session() {
        let ids = vec!["c1".to_string(), "c2".to_string(), "c1".to_string()];
        let cleared = keys().owned_by_session("s1", &ids);
        assert_eq!(cleared, [
            "yetsai:session:s1",
            "yetsai:session-conversations:s1",
            "yetsai:conversation:c1",
            "yetsai:messages:c1",
            "yetsai:conversation:c2",
            "yetsai:messages:c2",
        ]);
    }

    // Live tests: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

    fn live_store() -> RedisHistoryStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let prefix = format!("yetsai-test-{}:", Uuid::new_v4());
        RedisHistoryStore::new(&url, &prefix).unwrap()
    }

    #[tokio::test]
    #[ignore = "integration test - requires a running Redis"]
    async fn session_keeps_its_first_conversation() {
        let store = live_store();
        let first = store.get_or_create_conversation("s").await.unwrap();
        let again = store.get_or_create_conversation("s").await.unwrap();
        assert_eq!(first.id, again.id);

        store.create_conversation("s").await.unwrap();
        let found = store.get_conversation_by_session_id("s").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    #[ignore = "integration test - requires a running Redis"]
    async fn stale_session_index_is_reclaimed() {
        let store = live_store();
        let lost = store.get_or_create_conversation("s").await.unwrap();

        let mut conn = store.get_connection().await.unwrap();
        let _: i64 = conn.del(store.keys.conversation(&lost.id)).await.unwrap();

        let fresh = store.get_or_create_conversation("s").await.unwrap();
        assert_ne!(fresh.id, lost.id);
        let found = store.get_conversation_by_session_id("s").await.unwrap().unwrap();
        assert_eq!(found.id, fresh.id);

        store.create_message(NewMessage::user(&fresh.id, "hi", None)).await.unwrap();
        assert_eq!(store.get_messages_by_session_id("s").await.unwrap().len(), 1);
        assert_eq!(store.get_or_create_conversation("s").await.unwrap().id, fresh.id);
    }

    #[tokio::test]
    #[ignore = "integration test - requires a running Redis"]
    async fn clear_removes_every_conversation_of_the_session() {
        let store = live_store();
        let owner = store.get_or_create_conversation("s").await.unwrap();
        let extra = store.create_conversation("s").await.unwrap();
        store.create_message(NewMessage::user(&owner.id, "hi", None)).await.unwrap();
        store.create_message(NewMessage::user(&extra.id, "stray", None)).await.unwrap();

        assert!(store.clear_conversation("s").await.unwrap());
        assert!(store.get_conversation(&owner.id).await.unwrap().is_none());
        assert!(store.get_conversation(&extra.id).await.unwrap().is_none());
        assert!(store.get_messages_by_conversation_id(&extra.id).await.unwrap().is_empty());
        assert!(store.get_messages_by_session_id("s").await.unwrap().is_empty());
        assert!(!store.clear_conversation("s").await.unwrap());
    }
}
