//! Ties the feed, the composer, the editor and the local profile together
//! and reloads the feed after every change.

use crate::{
    command::Command,
    composer::{Composer, SubmitOutcome},
    editor::{EditOutcome, FeedEditor},
    feed::FeedLoader,
    profile::ProfileStore,
    render::{AvatarPolicy, FeedView, Sidebar, render_feed},
    ui::Ui,
    upload::{AVATAR_CHANGE_PREFIX, ImageFile, profile_picture_alert, upload_image},
};
use socialwall_backend::{Backend, Bucket};
use socialwall_common::model::{
    Id,
    post::{MESSAGE_MAX_LEN, PostMarker},
    profile::LocalProfile,
};
use std::path::Path;
use time::UtcOffset;
use tracing::{error, info, warn};

/// What the front end should do after a command.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Flow {
    /// Nothing visible changed.
    Continue,
    /// The feed or the edit state changed and should be shown again.
    Redraw,
    Quit,
}

pub struct Wall<B, U> {
    backend: B,
    ui: U,
    profiles: ProfileStore,
    feed: FeedLoader,
    composer: Composer,
    editor: FeedEditor,
    policy: AvatarPolicy,
    offset: UtcOffset,
}

impl<B: Backend, U: Ui> Wall<B, U> {
    /// Builds the wall and loads the feed once.
    pub async fn open(
        backend: B,
        ui: U,
        profiles: ProfileStore,
        policy: AvatarPolicy,
        offset: UtcOffset,
    ) -> Self {
        let profile = stored_profile(&profiles);
        let mut wall = Self {
            backend,
            ui,
            profiles,
            feed: FeedLoader::new(),
            composer: Composer::new(profile.as_ref()),
            editor: FeedEditor::new(),
            policy,
            offset,
        };
        wall.reload().await;
        wall
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    #[must_use]
    pub fn feed(&self) -> &FeedLoader {
        &self.feed
    }

    #[must_use]
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    #[must_use]
    pub fn editor(&self) -> &FeedEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut FeedEditor {
        &mut self.editor
    }

    #[must_use]
    pub fn profile(&self) -> Option<LocalProfile> {
        stored_profile(&self.profiles)
    }

    /// The profile shown on this device. Before the setup is completed, an
    /// avatar picked from the sidebar is shown without a name.
    fn displayed_profile(&self) -> Option<LocalProfile> {
        self.profile().or_else(|| {
            let avatar = self.profiles.avatar().unwrap_or_else(|err| {
                warn!(error = %err, "Could not read stored avatar");
                None
            })?;
            Some(LocalProfile::new("", Some(avatar)))
        })
    }

    pub async fn reload(&mut self) -> bool {
        self.feed.load(&self.backend).await
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let outcome = self
            .composer
            .submit(&self.backend, &mut self.ui, &self.profiles)
            .await;
        self.reload_after_post(outcome).await
    }

    pub async fn complete_profile_setup(&mut self) -> SubmitOutcome {
        let outcome = self
            .composer
            .complete_profile_setup(&self.backend, &mut self.ui, &self.profiles)
            .await;
        self.reload_after_post(outcome).await
    }

    pub async fn skip_profile_setup(&mut self) -> SubmitOutcome {
        let outcome = self
            .composer
            .skip_profile_setup(&self.backend, &mut self.ui, &self.profiles)
            .await;
        self.reload_after_post(outcome).await
    }

    async fn reload_after_post(&mut self, outcome: SubmitOutcome) -> SubmitOutcome {
        if outcome == SubmitOutcome::Posted {
            self.reload().await;
        }
        outcome
    }

    /// Uploads a new profile picture from the sidebar and stores its URL.
    pub async fn change_avatar(&mut self, file: ImageFile) -> bool {
        let url = match upload_image(
            &self.backend,
            Bucket::ProfilePictures,
            AVATAR_CHANGE_PREFIX,
            &file,
        )
        .await
        {
            Ok(url) => url,
            Err(err) => {
                self.ui.alert(&profile_picture_alert(&err));
                return false;
            }
        };

        match self.profiles.set_avatar(url.clone()) {
            Ok(()) => {
                info!(avatar = %url, "Profile picture changed");
                true
            }
            Err(err) => {
                error!(error = %err, "Could not save local profile");
                self.ui.alert(&format!("Could not save your profile: {err}"));
                false
            }
        }
    }

    /// Opens a post from the current feed for editing.
    pub fn start_edit(&mut self, id: Id<PostMarker>) -> bool {
        match self.feed.find(id) {
            Some(post) => {
                let started = self.editor.start_edit(post);
                if !started {
                    self.ui.alert(&format!(
                        "Post {id} is longer than {MESSAGE_MAX_LEN} characters and cannot be edited"
                    ));
                }
                started
            }
            None => {
                self.ui.alert(&format!("Post {id} is not on the wall"));
                false
            }
        }
    }

    pub async fn save_edit(&mut self) -> EditOutcome {
        let outcome = self.editor.save(&self.backend, &mut self.ui).await;
        if outcome == EditOutcome::Saved {
            self.reload().await;
        }
        outcome
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    pub async fn delete(&mut self, id: Id<PostMarker>) -> EditOutcome {
        let outcome = self.editor.delete(&self.backend, &mut self.ui, id).await;
        if outcome == EditOutcome::Deleted {
            self.reload().await;
        }
        outcome
    }

    #[must_use]
    pub fn view(&self) -> FeedView {
        render_feed(
            self.feed.posts(),
            &self.editor,
            self.displayed_profile().as_ref(),
            self.policy,
            self.offset,
        )
    }

    #[must_use]
    pub fn sidebar(&self) -> Sidebar {
        Sidebar::new(self.displayed_profile().as_ref())
    }

    async fn read_image(&mut self, path: &Path) -> Option<ImageFile> {
        match ImageFile::read(path).await {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not read image");
                self.ui.alert(&format!("Could not read image: {err}"));
                None
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Feed => {
                self.reload().await;
                Flow::Redraw
            }
            Command::Name(name) => {
                self.composer.set_username(&name);
                Flow::Continue
            }
            Command::Message(message) => {
                if !self.composer.set_message(&message) {
                    self.ui.alert("That message is too long");
                }
                Flow::Continue
            }
            Command::Type(text) => {
                self.composer.type_message(&text);
                Flow::Continue
            }
            Command::Image(path) => {
                if let Some(file) = self.read_image(&path).await {
                    self.composer.set_image(Some(file));
                }
                Flow::Continue
            }
            Command::ClearImage => {
                self.composer.set_image(None);
                Flow::Continue
            }
            Command::Post => redraw_if(self.submit().await == SubmitOutcome::Posted),
            Command::Avatar(path) => {
                let Some(file) = self.read_image(&path).await else {
                    return Flow::Continue;
                };
                if self.composer.in_profile_setup() {
                    self.composer.choose_avatar(file);
                    Flow::Continue
                } else {
                    redraw_if(self.change_avatar(file).await)
                }
            }
            Command::SetupComplete => {
                redraw_if(self.complete_profile_setup().await == SubmitOutcome::Posted)
            }
            Command::SetupSkip => {
                redraw_if(self.skip_profile_setup().await == SubmitOutcome::Posted)
            }
            Command::Edit(id) => redraw_if(self.start_edit(id)),
            Command::EditText(text) => {
                if !self.editor.set_text(&text) {
                    self.ui.alert("Nothing is being edited, or the text is too long");
                    return Flow::Continue;
                }
                Flow::Redraw
            }
            Command::Save => redraw_if(self.save_edit().await == EditOutcome::Saved),
            Command::Cancel => {
                self.cancel_edit();
                Flow::Redraw
            }
            Command::Delete(id) => redraw_if(self.delete(id).await == EditOutcome::Deleted),
            Command::Help => Flow::Continue,
            Command::Quit => Flow::Quit,
        }
    }
}

fn redraw_if(changed: bool) -> Flow {
    if changed {
        Flow::Redraw
    } else {
        Flow::Continue
    }
}

fn stored_profile(profiles: &ProfileStore) -> Option<LocalProfile> {
    profiles.get().unwrap_or_else(|err| {
        warn!(error = %err, "Could not read local profile");
        None
    })
}
