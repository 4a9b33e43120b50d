use serde::{Deserialize, Serialize};

/// Telegram chat id (numeric). Also the subscriber identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// A piece of quoted content: a Bible verse or a saying of a saint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub author: Option<String>,
    pub text: String,
}

/// A prayer resolved to a single language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrayerText {
    pub title: Option<String>,
    pub text: String,
}
