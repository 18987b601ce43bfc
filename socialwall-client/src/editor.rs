use crate::{composer::ENTER_MESSAGE, ui::Ui};
use socialwall_backend::Backend;
use socialwall_common::{
    model::{
        Id,
        post::{Message, Post, PostMarker},
    },
    text::MessageInput,
};
use tracing::{error, info, warn};

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this post?";
pub const UPDATE_FAILED: &str = "Failed to update post";
pub const DELETE_FAILED: &str = "Failed to delete post";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum EditOutcome {
    Saved,
    Deleted,
    /// The user answered no to the delete confirmation.
    Declined,
    Rejected,
    Failed,
    /// Nothing is being edited.
    Ignored,
}

/// Inline editing of a single post at a time.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FeedEditor {
    target: Option<Id<PostMarker>>,
    buffer: MessageInput,
}

impl FeedEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(&self) -> Option<Id<PostMarker>> {
        self.target
    }

    #[must_use]
    pub fn is_editing(&self, id: Id<PostMarker>) -> bool {
        self.target == Some(id)
    }

    #[must_use]
    pub fn buffer(&self) -> &MessageInput {
        &self.buffer
    }

    /// Opens `post` for editing, dropping any edit in progress. A stored
    /// message over the length limit is not opened, since the buffer could
    /// only hold part of it; any edit in progress is then kept.
    pub fn start_edit(&mut self, post: &Post) -> bool {
        let Some(buffer) = MessageInput::from_text(&post.message) else {
            warn!(id = %post.id, len = post.message.chars().count(), "Post too long to edit");
            return false;
        };
        self.target = Some(post.id);
        self.buffer = buffer;
        true
    }

    /// Replaces the buffer. Returns `false` when not editing or when `text`
    /// is over the length limit.
    pub fn set_text(&mut self, text: &str) -> bool {
        self.target.is_some() && self.buffer.set(text)
    }

    pub fn type_text(&mut self, text: &str) -> usize {
        if self.target.is_none() {
            return 0;
        }
        self.buffer.type_str(text)
    }

    pub fn cancel(&mut self) {
        self.target = None;
        self.buffer.clear();
    }

    pub async fn save<B: Backend, U: Ui>(&mut self, backend: &B, ui: &mut U) -> EditOutcome {
        let Some(id) = self.target else {
            return EditOutcome::Ignored;
        };
        let Ok(message) = Message::new(self.buffer.as_str()) else {
            ui.alert(ENTER_MESSAGE);
            return EditOutcome::Rejected;
        };

        match backend.update_message(id, &message).await {
            Ok(()) => {
                info!(%id, "Post updated");
                self.cancel();
                EditOutcome::Saved
            }
            Err(err) => {
                error!(%id, error = %err, "Error updating post");
                ui.alert(UPDATE_FAILED);
                EditOutcome::Failed
            }
        }
    }

    /// Deletes `id` after the user confirms. Any post may be deleted, not
    /// only the one being edited.
    pub async fn delete<B: Backend, U: Ui>(
        &mut self,
        backend: &B,
        ui: &mut U,
        id: Id<PostMarker>,
    ) -> EditOutcome {
        if !ui.confirm(CONFIRM_DELETE) {
            return EditOutcome::Declined;
        }

        match backend.delete_post(id).await {
            Ok(()) => {
                info!(%id, "Post deleted");
                if self.is_editing(id) {
                    self.cancel();
                }
                EditOutcome::Deleted
            }
            Err(err) => {
                error!(%id, error = %err, "Error deleting post");
                ui.alert(DELETE_FAILED);
                EditOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        composer::ENTER_MESSAGE,
        editor::{CONFIRM_DELETE, DELETE_FAILED, EditOutcome, FeedEditor, UPDATE_FAILED},
        ui::RecordingUi,
    };
    use socialwall_backend::{Backend, MemoryBackend, memory::Operation};
    use socialwall_common::model::{
        Id,
        post::{Message, NewPost, Post, Username},
    };

    async fn backend_with_post(message: &str) -> (MemoryBackend, Post) {
        let backend = MemoryBackend::new("http://localhost");
        let post = backend
            .insert_post(&NewPost::new(
                &Username::new("Ada").unwrap(),
                &Message::new(message).unwrap(),
                None,
            ))
            .await
            .unwrap();
        (backend, post)
    }

    #[tokio::test]
    async fn save_updates_and_exits() {
        let (backend, post) = backend_with_post("first draft").await;
        let mut ui = RecordingUi::new();
        let mut editor = FeedEditor::new();

        editor.start_edit(&post);
        assert_eq!(editor.buffer().as_str(), "first draft");
        assert!(editor.set_text("  second draft "));

        assert_eq!(editor.save(&backend, &mut ui).await, EditOutcome::Saved);
        assert_eq!(editor.target(), None);
        assert_eq!(
            backend.fetch_posts().await.unwrap()[0].message,
            "second draft"
        );
    }

    #[tokio::test]
    async fn cancel_leaves_post_alone() {
        let (backend, post) = backend_with_post("original").await;
        let mut editor = FeedEditor::new();

        editor.start_edit(&post);
        editor.set_text("changed");
        editor.cancel();

        assert_eq!(editor.target(), None);
        assert!(editor.buffer().is_empty());
        assert_eq!(backend.fetch_posts().await.unwrap()[0].message, "original");
    }

    #[tokio::test]
    async fn blank_edit_is_rejected() {
        let (backend, post) = backend_with_post("original").await;
        let mut ui = RecordingUi::new();
        let mut editor = FeedEditor::new();

        editor.start_edit(&post);
        editor.set_text("   ");
        assert_eq!(editor.save(&backend, &mut ui).await, EditOutcome::Rejected);
        assert_eq!(ui.last_alert(), Some(ENTER_MESSAGE));
        assert!(editor.is_editing(post.id));
    }

    #[tokio::test]
    async fn failed_save_stays_in_edit_mode() {
        let (backend, post) = backend_with_post("original").await;
        backend
            .fail_next(Operation::UpdateMessage, "timeout")
            .await;
        let mut ui = RecordingUi::new();
        let mut editor = FeedEditor::new();

        editor.start_edit(&post);
        editor.set_text("new");
        assert_eq!(editor.save(&backend, &mut ui).await, EditOutcome::Failed);
        assert_eq!(ui.last_alert(), Some(UPDATE_FAILED));
        assert!(editor.is_editing(post.id));
        assert_eq!(editor.buffer().as_str(), "new");
    }

    #[tokio::test]
    async fn save_without_target() {
        let backend = MemoryBackend::new("http://localhost");
        let mut ui = RecordingUi::new();
        let mut editor = FeedEditor::new();

        assert!(!editor.set_text("text"));
        assert_eq!(editor.type_text("text"), 0);
        assert_eq!(editor.save(&backend, &mut ui).await, EditOutcome::Ignored);
        assert_eq!(backend.calls().await, 0);
    }

    #[tokio::test]
    async fn delete_asks_first() {
        let (backend, post) = backend_with_post("doomed").await;
        let mut ui = RecordingUi::answering([false, true]);
        let mut editor = FeedEditor::new();

        assert_eq!(
            editor.delete(&backend, &mut ui, post.id).await,
            EditOutcome::Declined
        );
        assert_eq!(backend.fetch_posts().await.unwrap().len(), 1);

        editor.start_edit(&post);
        assert_eq!(
            editor.delete(&backend, &mut ui, post.id).await,
            EditOutcome::Deleted
        );
        assert!(backend.fetch_posts().await.unwrap().is_empty());
        assert_eq!(editor.target(), None);
        assert_eq!(ui.questions(), [CONFIRM_DELETE, CONFIRM_DELETE]);
    }

    #[tokio::test]
    async fn failed_delete_alerts() {
        let backend = MemoryBackend::new("http://localhost");
        let mut ui = RecordingUi::answering([true]);
        let mut editor = FeedEditor::new();

        assert_eq!(
            editor.delete(&backend, &mut ui, Id::new(42)).await,
            EditOutcome::Failed
        );
        assert_eq!(ui.last_alert(), Some(DELETE_FAILED));
    }

    #[tokio::test]
    async fn editing_is_clamped() {
        let (_, post) = backend_with_post(&"a".repeat(280)).await;
        let mut editor = FeedEditor::new();

        assert!(editor.start_edit(&post));
        assert_eq!(editor.buffer().len(), 280);
        assert_eq!(editor.type_text("more"), 0);
        assert!(!editor.set_text(&"b".repeat(281)));
        assert_eq!(editor.buffer().as_str(), "a".repeat(280));
    }

    #[tokio::test]
    async fn oversized_post_is_not_opened() {
        let (backend, short) = backend_with_post("short").await;
        let mut long = short.clone();
        long.id = Id::new(99);
        long.message = "a".repeat(300);
        let mut editor = FeedEditor::new();

        assert!(editor.start_edit(&short));
        editor.set_text("draft");
        assert!(!editor.start_edit(&long));
        assert!(editor.is_editing(short.id));
        assert_eq!(editor.buffer().as_str(), "draft");
        assert_eq!(backend.calls().await, 1);
    }
}
