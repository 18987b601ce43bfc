use socialwall_backend::Backend;
use socialwall_common::model::{
    Id,
    post::{Post, PostMarker},
};
use tracing::{debug, error};

/// Client-side copy of the feed. Only ever replaced as a whole.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FeedLoader {
    posts: Vec<Post>,
}

impl FeedLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the full feed, newest first. A failed fetch is logged and
    /// leaves the current list in place. Returns whether the list was
    /// refreshed.
    pub async fn load<B: Backend>(&mut self, backend: &B) -> bool {
        match backend.fetch_posts().await {
            Ok(posts) => {
                debug!(count = posts.len(), "Fetched posts");
                self.posts = posts;
                true
            }
            Err(err) => {
                error!(error = %err, "Error fetching posts");
                false
            }
        }
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: Id<PostMarker>) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }
}
