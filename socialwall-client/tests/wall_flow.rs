use socialwall_backend::{Backend, Bucket, MemoryBackend, memory::Operation};
use socialwall_client::{
    command::Command,
    composer::{ComposerState, ENTER_MESSAGE, SubmitOutcome},
    editor::{EditOutcome, UPDATE_FAILED},
    profile::ProfileStore,
    render::{AvatarPolicy, DEFAULT_AVATAR, FeedView, PostBody},
    ui::RecordingUi,
    upload::ImageFile,
    wall::{Flow, Wall},
};
use socialwall_common::model::{
    post::{Message, NewPost, Username},
    profile::LocalProfile,
};
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use time::UtcOffset;

const BASE_URL: &str = "http://wall.test";

async fn open_wall(
    backend: MemoryBackend,
    ui: RecordingUi,
    profile: Option<LocalProfile>,
) -> (Wall<MemoryBackend, RecordingUi>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let profiles = ProfileStore::open(dir.path().join("data")).unwrap();
    if let Some(profile) = profile {
        profiles.save(&profile).unwrap();
    }

    let wall = Wall::open(
        backend,
        ui,
        profiles,
        AvatarPolicy::MatchingAuthor,
        UtcOffset::UTC,
    )
    .await;
    (wall, dir)
}

fn image_on_disk(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
    path
}

async fn seed(backend: &MemoryBackend, username: &str, message: &str) {
    backend
        .insert_post(&NewPost::new(
            &Username::new(username).unwrap(),
            &Message::new(message).unwrap(),
            None,
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_backend_shows_empty_state() {
    let (wall, _dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        None,
    )
    .await;

    assert_eq!(wall.view(), FeedView::Empty);
    assert_eq!(wall.sidebar().name, "User");
}

#[tokio::test]
async fn post_without_image_appears_after_reload() {
    let (mut wall, _dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        Some(LocalProfile::new("Ada", None)),
    )
    .await;
    assert_eq!(wall.composer().username(), "Ada");

    assert_eq!(
        wall.execute("message hello wall".parse().unwrap()).await,
        Flow::Continue
    );
    assert_eq!(wall.execute(Command::Post).await, Flow::Redraw);

    let posts = wall.feed().posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].username, "Ada");
    assert_eq!(posts[0].message, "hello wall");
    assert_eq!(posts[0].image_url, None);
    assert!(wall.ui().alerts().is_empty());
    assert!(wall.composer().message().is_empty());
}

#[tokio::test]
async fn empty_message_is_rejected_without_network() {
    let (mut wall, _dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        Some(LocalProfile::new("Ada", None)),
    )
    .await;
    let calls = wall.backend().calls().await;
    let composer = wall.composer().clone();

    assert_eq!(wall.submit().await, SubmitOutcome::Rejected);
    assert_eq!(wall.ui().last_alert(), Some(ENTER_MESSAGE));
    assert_eq!(wall.backend().calls().await, calls);
    assert_eq!(wall.composer(), &composer);
}

#[tokio::test]
async fn first_post_requires_profile_setup() {
    let (mut wall, dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        None,
    )
    .await;

    wall.execute(Command::Name("Ada".to_owned())).await;
    wall.execute(Command::Message("my first post".to_owned())).await;
    assert_eq!(wall.execute(Command::Post).await, Flow::Continue);
    assert_eq!(
        wall.composer().state(),
        &ComposerState::ProfileSetup { avatar: None }
    );
    assert!(wall.feed().is_empty());

    let avatar = image_on_disk(&dir, "me.png");
    wall.execute(Command::Avatar(avatar)).await;
    assert!(matches!(
        wall.composer().state(),
        ComposerState::ProfileSetup { avatar: Some(_) }
    ));
    assert_eq!(wall.execute(Command::SetupComplete).await, Flow::Redraw);

    let profile = wall.profile().unwrap();
    assert_eq!(profile.username, "Ada");
    let avatar_url = profile.profile_picture.unwrap();
    assert!(avatar_url.starts_with(
        "http://wall.test/storage/v1/object/public/profile-pictures/profile_"
    ));

    let view = wall.view();
    assert_eq!(view.posts().len(), 1);
    assert_eq!(view.posts()[0].avatar_url, avatar_url);
    assert_eq!(wall.sidebar().name, "Ada");
}

#[tokio::test]
async fn skipping_setup_posts_without_avatar() {
    let (mut wall, _dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        None,
    )
    .await;

    wall.composer_mut().set_username("Grace");
    wall.composer_mut().set_message("hi");
    assert_eq!(wall.submit().await, SubmitOutcome::ProfileSetupRequired);
    assert_eq!(wall.skip_profile_setup().await, SubmitOutcome::Posted);

    assert_eq!(wall.profile(), Some(LocalProfile::new("Grace", None)));
    assert_eq!(wall.feed().posts().len(), 1);
    assert_eq!(wall.view().posts()[0].avatar_url, DEFAULT_AVATAR);
    assert_eq!(wall.backend().object_count().await, 0);
}

#[tokio::test]
async fn edit_and_cancel() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    seed(&backend, "Ada", "original").await;
    let (mut wall, _dir) = open_wall(backend, RecordingUi::new(), None).await;
    let id = wall.feed().posts()[0].id;

    assert_eq!(wall.execute(Command::Edit(id)).await, Flow::Redraw);
    wall.execute(Command::EditText("changed".to_owned())).await;
    assert!(matches!(
        &wall.view().posts()[0].body,
        PostBody::Editing { text, .. } if text == "changed"
    ));
    assert_eq!(wall.execute(Command::Cancel).await, Flow::Redraw);
    assert_eq!(wall.editor().target(), None);
    assert_eq!(wall.backend().fetch_posts().await.unwrap()[0].message, "original");

    assert!(wall.start_edit(id));
    wall.editor_mut().set_text(&"x".repeat(280));
    assert_eq!(wall.save_edit().await, EditOutcome::Saved);
    assert_eq!(wall.editor().target(), None);
    assert_eq!(wall.feed().posts()[0].message, "x".repeat(280));
}

#[tokio::test]
async fn failed_edit_keeps_editing() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    seed(&backend, "Ada", "original").await;
    let (mut wall, _dir) = open_wall(backend, RecordingUi::new(), None).await;
    let id = wall.feed().posts()[0].id;

    wall.start_edit(id);
    wall.editor_mut().set_text("new");
    wall.backend()
        .fail_next(Operation::UpdateMessage, "connection refused")
        .await;

    assert_eq!(wall.save_edit().await, EditOutcome::Failed);
    assert_eq!(wall.ui().last_alert(), Some(UPDATE_FAILED));
    assert_eq!(wall.editor().target(), Some(id));
    assert_eq!(wall.feed().posts()[0].message, "original");
}

#[tokio::test]
async fn delete_needs_confirmation() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    seed(&backend, "Ada", "keep").await;
    seed(&backend, "Ada", "drop").await;
    let (mut wall, _dir) = open_wall(backend, RecordingUi::answering([false]), None).await;
    let id = wall.feed().posts()[0].id;

    assert_eq!(wall.delete(id).await, EditOutcome::Declined);
    assert_eq!(wall.feed().posts().len(), 2);

    wall.ui_mut().push_answer(true);
    assert_eq!(wall.execute(Command::Delete(id)).await, Flow::Redraw);
    let posts = wall.feed().posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].message, "keep");
    assert!(wall.feed().find(id).is_none());
}

#[tokio::test]
async fn typing_stops_at_the_limit() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    seed(&backend, "Ada", "short").await;
    let (mut wall, _dir) = open_wall(backend, RecordingUi::new(), None).await;

    wall.execute(Command::Type("a".repeat(279))).await;
    wall.execute(Command::Type("bcd".to_owned())).await;
    let message = wall.composer().message().as_str();
    assert_eq!(message.chars().count(), 280);
    assert!(message.ends_with("ab"));

    let id = wall.feed().posts()[0].id;
    wall.start_edit(id);
    assert_eq!(wall.editor_mut().type_text(&"z".repeat(300)), 275);
    assert_eq!(wall.editor().buffer().len(), 280);
}

#[tokio::test]
async fn upload_failure_aborts_post() {
    let backend = MemoryBackend::new(BASE_URL);
    let (mut wall, dir) = open_wall(
        backend,
        RecordingUi::new(),
        Some(LocalProfile::new("Ada", None)),
    )
    .await;

    wall.execute(Command::Message("with image".to_owned())).await;
    wall.execute(Command::Image(image_on_disk(&dir, "cat.png"))).await;
    assert_eq!(wall.execute(Command::Post).await, Flow::Continue);

    assert_eq!(
        wall.ui().last_alert(),
        Some(
            "Upload not configured. You need to create a \"post-images\" bucket in Supabase \
             Storage."
        )
    );
    assert!(wall.backend().fetch_posts().await.unwrap().is_empty());
    assert_eq!(wall.composer().message().as_str(), "with image");
    assert_eq!(wall.composer().image().map(ImageFile::name), Some("cat.png"));
}

#[tokio::test]
async fn failed_reload_keeps_feed() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    seed(&backend, "Ada", "visible").await;
    let (mut wall, _dir) = open_wall(backend, RecordingUi::new(), None).await;

    wall.backend()
        .fail_next(Operation::FetchPosts, "service unavailable")
        .await;
    assert_eq!(wall.execute(Command::Feed).await, Flow::Redraw);
    assert_eq!(wall.feed().posts().len(), 1);
    assert!(wall.ui().alerts().is_empty());
}

#[tokio::test]
async fn sidebar_avatar_change() {
    let backend = MemoryBackend::new(BASE_URL).with_bucket(Bucket::ProfilePictures);
    seed(&backend, "Ada", "mine").await;
    seed(&backend, "Grace", "theirs").await;
    let (mut wall, dir) = open_wall(
        backend,
        RecordingUi::new(),
        Some(LocalProfile::new("Ada", None)),
    )
    .await;

    let path = image_on_disk(&dir, "new.jpg");
    assert_eq!(wall.execute(Command::Avatar(path)).await, Flow::Redraw);

    let avatar = wall.profile().unwrap().profile_picture.unwrap();
    assert!(avatar.contains("/profile-pictures/sidebar_profile_"));
    assert!(avatar.ends_with(".jpg"));
    assert_eq!(wall.sidebar().avatar_url, avatar);

    let view = wall.view();
    let by_author = |name: &str| {
        view.posts()
            .iter()
            .find(|post| post.username == name)
            .unwrap()
            .avatar_url
            .clone()
    };
    assert_eq!(by_author("Ada"), avatar);
    assert_eq!(by_author("Grace"), DEFAULT_AVATAR);
}

#[tokio::test]
async fn avatar_change_before_first_post_still_requires_setup() {
    let (mut wall, dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        None,
    )
    .await;

    let path = image_on_disk(&dir, "a.png");
    assert_eq!(wall.execute(Command::Avatar(path)).await, Flow::Redraw);
    assert_eq!(wall.profile(), None);
    let sidebar = wall.sidebar();
    assert_eq!(sidebar.name, "User");
    assert!(sidebar.avatar_url.contains("/profile-pictures/sidebar_profile_"));
    let avatar = sidebar.avatar_url;

    wall.execute(Command::Name("Ada".to_owned())).await;
    wall.execute(Command::Message("first ever".to_owned())).await;
    assert_eq!(wall.submit().await, SubmitOutcome::ProfileSetupRequired);
    assert!(wall.backend().fetch_posts().await.unwrap().is_empty());

    assert_eq!(wall.execute(Command::SetupComplete).await, Flow::Redraw);
    assert_eq!(
        wall.profile(),
        Some(LocalProfile::new("Ada", Some(avatar.clone())))
    );
    assert_eq!(wall.backend().object_count().await, 1);
    let posts = wall.feed().posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].message, "first ever");
    assert_eq!(wall.view().posts()[0].avatar_url, avatar);
}

#[tokio::test]
async fn oversized_post_is_not_edited() {
    let backend = MemoryBackend::with_all_buckets(BASE_URL);
    backend
        .insert_post(&NewPost {
            username: "Ada".to_owned(),
            message: "a".repeat(300),
            image_url: None,
        })
        .await
        .unwrap();
    let (mut wall, _dir) = open_wall(backend, RecordingUi::new(), None).await;

    let id = wall.feed().posts()[0].id;
    assert_eq!(wall.execute(Command::Edit(id)).await, Flow::Continue);
    assert_eq!(wall.editor().target(), None);
    assert_eq!(
        wall.ui().last_alert(),
        Some(format!("Post {id} is longer than 280 characters and cannot be edited").as_str())
    );
    assert_eq!(
        wall.backend().fetch_posts().await.unwrap()[0].message,
        "a".repeat(300)
    );
}

#[tokio::test]
async fn unreadable_image_is_reported() {
    let (mut wall, dir) = open_wall(
        MemoryBackend::with_all_buckets(BASE_URL),
        RecordingUi::new(),
        None,
    )
    .await;

    wall.execute(Command::Image(dir.path().join("missing.png"))).await;
    assert!(
        wall.ui()
            .last_alert()
            .unwrap()
            .starts_with("Could not read image: ")
    );
    assert!(wall.composer().image().is_none());
}
