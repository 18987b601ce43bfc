use socialwall_common::model::{
    Id, ModelValidationError,
    post::{Message, NewPost, Post, PostMarker},
};
use std::{fmt::Display, future::Future, str::FromStr};
use thiserror::Error;
use url::Url;

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to the backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("The backend URL is invalid: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("The backend URL cannot carry a path: {0}")]
    UnusableUrl(String),
    /// An error reported by the backend itself. Displays as the backend's
    /// message so callers can match on its text.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("The backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("The backend returned an invalid post: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error("The backend did not return the inserted post")]
    EmptyInsert,
}

impl BackendError {
    /// HTTP status the backend replied with, if the failure came from a reply.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Http(err) => err.status().map(|status| status.as_u16()),
            BackendError::PostNotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Object storage namespaces known to the wall.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Bucket {
    PostImages,
    ProfilePictures,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::PostImages, Bucket::ProfilePictures];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::PostImages => "post-images",
            Bucket::ProfilePictures => "profile-pictures",
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("Bucket not found")]
pub struct UnknownBucketError(pub String);

impl FromStr for Bucket {
    type Err = UnknownBucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| UnknownBucketError(s.to_owned()))
    }
}

/// The hosted backend as seen by the wall: one posts table and object
/// storage with public URLs.
pub trait Backend {
    /// All posts, newest first.
    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<Post>>> + Send;

    fn insert_post(&self, post: &NewPost) -> impl Future<Output = Result<Post>> + Send;

    fn update_message(
        &self,
        id: Id<PostMarker>,
        message: &Message,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_post(&self, id: Id<PostMarker>) -> impl Future<Output = Result<()>> + Send;

    /// Stores `bytes` under `file_name` and returns the public URL.
    fn upload(
        &self,
        bucket: Bucket,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String>> + Send;
}

pub(crate) const STORAGE_OBJECT: [&str; 3] = ["storage", "v1", "object"];

/// Public URL of `file_name` in `bucket` below `base`. Each path segment is
/// percent-encoded, so any file name gives a valid URL.
#[must_use]
pub fn public_object_url(base: &Url, bucket: Bucket, file_name: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty()
            .extend(STORAGE_OBJECT)
            .extend(["public", bucket.as_str(), file_name]);
    }
    url
}

/// Guesses a content type from the file extension. Unknown extensions are
/// stored as opaque bytes.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
