/// Per-device display name and avatar. Lives only in on-device storage and
/// is never attached to a [`Post`](crate::model::post::Post) record.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct LocalProfile {
    pub username: String,
    pub profile_picture: Option<String>,
}

impl LocalProfile {
    #[must_use]
    pub fn new(username: impl Into<String>, profile_picture: Option<String>) -> Self {
        Self {
            username: username.into(),
            profile_picture,
        }
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }
}
