use crate::model::{Id, ModelValidationError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const MESSAGE_MAX_LEN: usize = 280;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub username: String,
    pub message: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row payload for inserting a post. The backend assigns `id` and
/// `created_at`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct NewPost {
    pub username: String,
    pub message: String,
    pub image_url: Option<String>,
}

impl NewPost {
    #[must_use]
    pub fn new(username: &Username, message: &Message, image_url: Option<String>) -> Self {
        Self {
            username: username.get().to_owned(),
            message: message.get().to_owned(),
            image_url,
        }
    }
}

/// A display name with surrounding whitespace removed. Never empty.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(username: &str) -> Result<Self, ModelValidationError> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            Err(ModelValidationError::EmptyUsername)
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trimmed post text of at most [`MESSAGE_MAX_LEN`] characters. Never empty.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Message(String);

impl Message {
    pub fn new(message: &str) -> Result<Self, ModelValidationError> {
        let trimmed = message.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            Err(ModelValidationError::EmptyMessage)
        } else if len > MESSAGE_MAX_LEN {
            Err(ModelValidationError::MessageTooLong(len))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Message::new(&inner).map_err(serde::de::Error::custom)
    }
}
