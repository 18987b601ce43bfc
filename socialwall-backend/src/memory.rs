//! In-process backend. Backs the devserver and the client tests.

use crate::client::{Backend, BackendError, Bucket, Result, public_object_url};
use socialwall_common::model::{
    Id,
    post::{Message, NewPost, Post, PostMarker},
};
use std::collections::{BTreeMap, HashMap, HashSet};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Operation {
    FetchPosts,
    InsertPost,
    UpdateMessage,
    DeletePost,
    Upload,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    last_created_at: Option<OffsetDateTime>,
    posts: BTreeMap<Id<PostMarker>, Post>,
    buckets: HashSet<Bucket>,
    objects: HashMap<(Bucket, String), Vec<u8>>,
    failures: HashMap<Operation, String>,
    calls: usize,
}

impl MemoryState {
    /// Counts the call and pops an injected failure for it, if any.
    fn begin(&mut self, operation: Operation) -> Result<()> {
        self.calls += 1;
        match self.failures.remove(&operation) {
            Some(message) => Err(BackendError::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    /// Creation times are strictly increasing so newest-first ordering is
    /// total even when the clock does not advance between inserts.
    fn next_created_at(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    public_base_url: String,
}

impl MemoryBackend {
    /// A backend without storage buckets. Uploads fail until a bucket is
    /// added with [`MemoryBackend::with_bucket`].
    #[must_use]
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into();

        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                ..MemoryState::default()
            }),
            public_base_url,
        }
    }

    /// A backend with every [`Bucket`] available.
    #[must_use]
    pub fn with_all_buckets(public_base_url: impl Into<String>) -> Self {
        Bucket::ALL
            .into_iter()
            .fold(Self::new(public_base_url), Self::with_bucket)
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: Bucket) -> Self {
        self.state.get_mut().buckets.insert(bucket);
        self
    }

    /// Public URL of an object. Fails when the configured base URL is not a
    /// valid base for object paths.
    pub fn public_url(&self, bucket: Bucket, file_name: &str) -> Result<String> {
        let base = Url::parse(&self.public_base_url)?;
        if base.cannot_be_a_base() {
            return Err(BackendError::UnusableUrl(self.public_base_url.clone()));
        }
        Ok(public_object_url(&base, bucket, file_name).into())
    }

    /// Makes the next call of `operation` fail with a backend error that
    /// carries `message`.
    pub async fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .failures
            .insert(operation, message.into());
    }

    /// Number of backend calls made so far, failed ones included.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }

    pub async fn object(&self, bucket: Bucket, file_name: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .objects
            .get(&(bucket, file_name.to_owned()))
            .cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }
}

impl Backend for MemoryBackend {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::FetchPosts)?;

        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post> {
        let mut state = self.state.lock().await;
        state.begin(Operation::InsertPost)?;

        let id = Id::new(state.next_id);
        state.next_id += 1;

        let created = Post {
            id,
            username: post.username.clone(),
            message: post.message.clone(),
            image_url: post.image_url.clone(),
            created_at: state.next_created_at(),
        };
        state.posts.insert(id, created.clone());
        debug!(%id, "Inserted post");

        Ok(created)
    }

    async fn update_message(&self, id: Id<PostMarker>, message: &Message) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::UpdateMessage)?;

        let post = state
            .posts
            .get_mut(&id)
            .ok_or(BackendError::PostNotFound(id))?;
        message.get().clone_into(&mut post.message);
        Ok(())
    }

    async fn delete_post(&self, id: Id<PostMarker>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeletePost)?;

        state
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::PostNotFound(id))
    }

    async fn upload(&self, bucket: Bucket, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Upload)?;

        if !state.buckets.contains(&bucket) {
            return Err(BackendError::Api {
                status: 404,
                message: "Bucket not found".to_owned(),
            });
        }

        let url = self.public_url(bucket, file_name)?;
        let key = (bucket, file_name.to_owned());
        if state.objects.contains_key(&key) {
            return Err(BackendError::Api {
                status: 409,
                message: "The resource already exists".to_owned(),
            });
        }
        state.objects.insert(key, bytes);

        Ok(url)
    }
}
