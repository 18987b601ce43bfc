use serde::{Deserialize, Serialize};
use socialwall_common::model::{
    ModelValidationError,
    post::{Message, Post},
};
use time::OffsetDateTime;

/// A row of the posts table as the backend returns it. Only `message` is
/// required by the table schema, so everything else may come back null.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub username: Option<String>,
    pub message: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct MessagePatch {
    pub message: Message,
}

/// Error body shape shared by the table and storage endpoints.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "Key")]
    pub key: String,
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            username: value.username.unwrap_or_default(),
            message: value
                .message
                .ok_or(ModelValidationError::MissingField("message"))?,
            image_url: value.image_url,
            created_at: value.created_at,
        })
    }
}
