//! Client for the hosted backend's table and storage HTTP APIs.

use crate::{
    client::{
        Backend, BackendError, Bucket, Result, STORAGE_OBJECT, content_type_for,
        public_object_url,
    },
    record::{ApiErrorBody, MessagePatch, PostRecord, UploadRecord},
};
use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use socialwall_common::model::{
    Id,
    post::{Message, NewPost, Post, PostMarker},
};
use std::fmt::Debug;
use tracing::{debug, instrument};
use url::Url;

const POSTS_TABLE: [&str; 3] = ["rest", "v1", "posts"];

pub struct RestBackend {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Self::with_client(http, base_url, api_key)
    }

    pub fn with_client(http: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::UnusableUrl(base_url.into()));
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// The URL under which an uploaded object is publicly readable.
    #[must_use]
    pub fn public_url(&self, bucket: Bucket, file_name: &str) -> String {
        public_object_url(&self.base_url, bucket, file_name).into()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `with_client`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn id_filter(id: Id<PostMarker>) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }
}

/// Turns a non-success reply into [`BackendError::Api`], carrying the
/// backend's own message where it sent one.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let message = serde_json::from_slice::<ApiErrorBody>(&body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        });

    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = check(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

impl Backend for RestBackend {
    #[instrument(skip(self))]
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let request = self
            .http
            .get(self.endpoint(&POSTS_TABLE))
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        let records: Vec<PostRecord> = decode(self.authorized(request).send().await?).await?;
        debug!(count = records.len(), "Fetched posts");

        records
            .into_iter()
            .map(|record| Post::try_from(record).map_err(BackendError::from))
            .collect()
    }

    #[instrument(skip(self))]
    async fn insert_post(&self, post: &NewPost) -> Result<Post> {
        let request = self
            .http
            .post(self.endpoint(&POSTS_TABLE))
            .header("Prefer", "return=representation")
            .json(&[post]);

        let records: Vec<PostRecord> = decode(self.authorized(request).send().await?).await?;
        let record = records.into_iter().next().ok_or(BackendError::EmptyInsert)?;

        Ok(Post::try_from(record)?)
    }

    #[instrument(skip(self, message))]
    async fn update_message(&self, id: Id<PostMarker>, message: &Message) -> Result<()> {
        let patch = MessagePatch {
            message: message.clone(),
        };
        let request = self
            .http
            .patch(self.endpoint(&POSTS_TABLE))
            .query(&Self::id_filter(id))
            .json(&patch);

        check(self.authorized(request).send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: Id<PostMarker>) -> Result<()> {
        let request = self
            .http
            .delete(self.endpoint(&POSTS_TABLE))
            .query(&Self::id_filter(id));

        check(self.authorized(request).send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, bucket: Bucket, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let mut segments = STORAGE_OBJECT.to_vec();
        segments.extend([bucket.as_str(), file_name]);

        let request = self
            .http
            .post(self.endpoint(&segments))
            .header(CONTENT_TYPE, content_type_for(file_name))
            .body(bytes);

        let upload: UploadRecord = decode(self.authorized(request).send().await?).await?;
        debug!(key = %upload.key, "Uploaded object");

        Ok(self.public_url(bucket, file_name))
    }
}
