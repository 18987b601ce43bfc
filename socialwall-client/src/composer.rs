//! The post form and the one-time profile setup that gates it.

use crate::{
    profile::ProfileStore,
    ui::Ui,
    upload::{
        ImageFile, PROFILE_SETUP_PREFIX, post_image_alert, profile_picture_alert, upload_image,
    },
};
use socialwall_backend::{Backend, Bucket};
use socialwall_common::{
    model::{
        ModelValidationError,
        post::{Message, NewPost, Username},
        profile::LocalProfile,
    },
    text::MessageInput,
};
use tracing::{error, info, warn};

pub const ENTER_NAME: &str = "Please enter your name";
pub const ENTER_MESSAGE: &str = "Please enter a message";

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub enum ComposerState {
    #[default]
    Composing,
    /// Shown on the first submit from a device without a saved profile.
    /// Holds the avatar picked so far.
    ProfileSetup { avatar: Option<ImageFile> },
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum SubmitOutcome {
    /// The post was created; the feed should be reloaded.
    Posted,
    /// Nothing was sent; the profile has to be set up first.
    ProfileSetupRequired,
    /// Input did not validate. An alert was shown.
    Rejected,
    /// A backend or storage call failed. An alert was shown.
    Failed,
    /// The action does not apply in the current state.
    Ignored,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Composer {
    username: String,
    message: MessageInput,
    image: Option<ImageFile>,
    state: ComposerState,
}

impl Composer {
    /// A fresh form, with the name taken from the saved profile if any.
    #[must_use]
    pub fn new(profile: Option<&LocalProfile>) -> Self {
        Self {
            username: profile.map(|profile| profile.username.clone()).unwrap_or_default(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    #[must_use]
    pub fn in_profile_setup(&self) -> bool {
        matches!(self.state, ComposerState::ProfileSetup { .. })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn message(&self) -> &MessageInput {
        &self.message
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn set_username(&mut self, username: &str) {
        username.clone_into(&mut self.username);
    }

    /// Replaces the message. Text over the length limit is ignored.
    pub fn set_message(&mut self, message: &str) -> bool {
        self.message.set(message)
    }

    /// Types `text` onto the end of the message and returns how many
    /// characters fit.
    pub fn type_message(&mut self, text: &str) -> usize {
        self.message.type_str(text)
    }

    pub fn set_image(&mut self, image: Option<ImageFile>) {
        self.image = image;
    }

    /// Picks the avatar in the profile setup. Returns `false` outside of it.
    pub fn choose_avatar(&mut self, file: ImageFile) -> bool {
        match &mut self.state {
            ComposerState::ProfileSetup { avatar } => {
                *avatar = Some(file);
                true
            }
            ComposerState::Composing => false,
        }
    }

    fn validate(&self) -> Result<(Username, Message), ModelValidationError> {
        let username = Username::new(&self.username)?;
        let message = Message::new(self.message.as_str())?;
        Ok((username, message))
    }

    fn validate_or_alert<U: Ui>(&self, ui: &mut U) -> Option<(Username, Message)> {
        match self.validate() {
            Ok(valid) => Some(valid),
            Err(err) => {
                let alert = match err {
                    ModelValidationError::EmptyUsername => ENTER_NAME.to_owned(),
                    ModelValidationError::EmptyMessage => ENTER_MESSAGE.to_owned(),
                    other => other.to_string(),
                };
                ui.alert(&alert);
                None
            }
        }
    }

    /// Share button. Validates the form, then either posts or, on a device
    /// without a profile, switches to the profile setup.
    pub async fn submit<B: Backend, U: Ui>(
        &mut self,
        backend: &B,
        ui: &mut U,
        profiles: &ProfileStore,
    ) -> SubmitOutcome {
        if self.in_profile_setup() {
            return SubmitOutcome::ProfileSetupRequired;
        }
        if self.validate_or_alert(ui).is_none() {
            return SubmitOutcome::Rejected;
        }

        match profiles.get() {
            Ok(Some(_)) => self.post(backend, ui).await,
            Ok(None) => {
                info!("No local profile yet, starting profile setup");
                self.state = ComposerState::ProfileSetup { avatar: None };
                SubmitOutcome::ProfileSetupRequired
            }
            Err(err) => {
                error!(error = %err, "Could not read local profile");
                ui.alert(&format!("Could not read your profile: {err}"));
                SubmitOutcome::Failed
            }
        }
    }

    /// Finishes the profile setup with the chosen avatar, then sends the
    /// pending post. Without a chosen avatar, one already picked from the
    /// sidebar is kept.
    pub async fn complete_profile_setup<B: Backend, U: Ui>(
        &mut self,
        backend: &B,
        ui: &mut U,
        profiles: &ProfileStore,
    ) -> SubmitOutcome {
        let ComposerState::ProfileSetup { avatar } = &self.state else {
            return SubmitOutcome::Ignored;
        };
        let Some(username) = self.setup_username(ui) else {
            return SubmitOutcome::Rejected;
        };

        let profile_picture = match avatar {
            Some(file) => {
                match upload_image(backend, Bucket::ProfilePictures, PROFILE_SETUP_PREFIX, file)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(err) => {
                        ui.alert(&profile_picture_alert(&err));
                        return SubmitOutcome::Failed;
                    }
                }
            }
            None => profiles.avatar().unwrap_or_else(|err| {
                warn!(error = %err, "Could not read stored avatar");
                None
            }),
        };

        self.finish_setup(backend, ui, profiles, username, profile_picture)
            .await
    }

    /// Finishes the profile setup without an avatar, then sends the pending
    /// post.
    pub async fn skip_profile_setup<B: Backend, U: Ui>(
        &mut self,
        backend: &B,
        ui: &mut U,
        profiles: &ProfileStore,
    ) -> SubmitOutcome {
        if !self.in_profile_setup() {
            return SubmitOutcome::Ignored;
        }
        let Some(username) = self.setup_username(ui) else {
            return SubmitOutcome::Rejected;
        };

        self.finish_setup(backend, ui, profiles, username, None)
            .await
    }

    fn setup_username<U: Ui>(&self, ui: &mut U) -> Option<Username> {
        let username = Username::new(&self.username).ok();
        if username.is_none() {
            ui.alert(ENTER_NAME);
        }
        username
    }

    async fn finish_setup<B: Backend, U: Ui>(
        &mut self,
        backend: &B,
        ui: &mut U,
        profiles: &ProfileStore,
        username: Username,
        profile_picture: Option<String>,
    ) -> SubmitOutcome {
        let profile = LocalProfile::new(username.into_inner(), profile_picture);
        if let Err(err) = profiles.save(&profile) {
            error!(error = %err, "Could not save local profile");
            ui.alert(&format!("Could not save your profile: {err}"));
            return SubmitOutcome::Failed;
        }
        info!(username = %profile.username, "Profile set up");

        self.username = profile.username;
        self.state = ComposerState::Composing;
        self.post(backend, ui).await
    }

    /// Uploads the image, if any, and inserts the post. The message and
    /// image are cleared only on success; the name is always kept.
    async fn post<B: Backend, U: Ui>(&mut self, backend: &B, ui: &mut U) -> SubmitOutcome {
        let Some((username, message)) = self.validate_or_alert(ui) else {
            return SubmitOutcome::Rejected;
        };

        let image_url = match &self.image {
            Some(image) => match upload_image(backend, Bucket::PostImages, "", image).await {
                Ok(url) => Some(url),
                Err(err) => {
                    ui.alert(&post_image_alert(Bucket::PostImages, &err));
                    return SubmitOutcome::Failed;
                }
            },
            None => None,
        };

        let new_post = NewPost::new(&username, &message, image_url);
        match backend.insert_post(&new_post).await {
            Ok(post) => {
                info!(id = %post.id, "Post successful");
                self.message.clear();
                self.image = None;
                SubmitOutcome::Posted
            }
            Err(err) => {
                error!(error = %err, post = ?new_post, "Insert failed");
                ui.alert(&format!("Failed to post: {err}"));
                SubmitOutcome::Failed
            }
        }
    }
}
