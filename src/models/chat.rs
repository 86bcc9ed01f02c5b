use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub role: Role,
    /// Attachment list as sent by the client, kept as opaque JSON text.
    pub attachments: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Fields supplied by the caller when appending a message; the store assigns
/// `id` and `timestamp`.
#[derive(Clone, Debug)]
pub struct NewMessage {
    pub conversation_id: String,
    pub content: String,
    pub role: Role,
    pub attachments: Option<String>,
}

impl NewMessage {
    pub fn user(conversation_id: &str, content: &str, attachments: Option<String>) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role: Role::User,
            attachments,
        }
    }

    pub fn assistant(conversation_id: &str, content: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role: Role::Assistant,
            attachments: None,
        }
    }

    pub(crate) fn into_message(self) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: self.conversation_id,
            content: self.content,
            role: self.role,
            attachments: self.attachments,
            timestamp: Utc::now(),
        }
    }
}

/// A file uploaded alongside a chat message. `data` is base64 text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data: String,
    pub size: u64,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Inline `data:` reference carrying the attachment bytes.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One prior exchange unit handed to the router.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
