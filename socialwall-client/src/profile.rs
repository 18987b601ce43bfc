//! On-device storage for the [`LocalProfile`].
//!
//! Storage is a single JSON object of string keys to string values, like a
//! browser's local storage. The profile is kept JSON-encoded under
//! [`PROFILE_KEY`], in the same shape the web client writes, so an exported
//! browser entry can be dropped in as is.

use serde::{Deserialize, Serialize};
use socialwall_common::model::profile::LocalProfile;
use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

pub const PROFILE_KEY: &str = "userProfile";
pub const STORAGE_FILE_NAME: &str = "local_storage.json";

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Could not access local storage at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Local storage is not a JSON object of strings: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default)]
    profile_picture: Option<String>,
    #[serde(default)]
    has_setup_profile: bool,
}

impl ProfileRecord {
    /// The profile, if the setup was completed with a name. An entry
    /// written only by an avatar change does not count.
    fn completed(self) -> Option<LocalProfile> {
        let username = self.username.filter(|username| !username.trim().is_empty())?;
        self.has_setup_profile
            .then(|| LocalProfile::new(username, self.profile_picture))
    }
}

impl From<&LocalProfile> for ProfileRecord {
    fn from(profile: &LocalProfile) -> Self {
        Self {
            username: Some(profile.username.clone()),
            profile_picture: profile.profile_picture.clone(),
            has_setup_profile: true,
        }
    }
}

type Storage = BTreeMap<String, String>;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ProfileStore {
    dir: PathBuf,
    path: PathBuf,
}

impl ProfileStore {
    /// Opens the storage in `dir`, creating the directory if needed. The
    /// storage file itself is only written on the first save.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| ProfileError::Io {
            path: dir.to_owned(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_owned(),
            path: dir.join(STORAGE_FILE_NAME),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The profile saved by a completed setup. An entry that does not
    /// decode, or that only holds an avatar, counts as absent.
    pub fn get(&self) -> Result<Option<LocalProfile>> {
        Ok(self.read_record()?.and_then(ProfileRecord::completed))
    }

    /// The stored avatar URL, whether or not the setup was completed.
    pub fn avatar(&self) -> Result<Option<String>> {
        Ok(self.read_record()?.and_then(|record| record.profile_picture))
    }

    pub fn save(&self, profile: &LocalProfile) -> Result<()> {
        self.write_record(&ProfileRecord::from(profile))
    }

    /// Points the profile at a new avatar. Without a saved profile, an
    /// entry holding only the avatar is created; it stays incomplete until
    /// the profile setup saves a name.
    pub fn set_avatar(&self, avatar_url: String) -> Result<()> {
        let mut record = self.read_record()?.unwrap_or_default();
        record.profile_picture = Some(avatar_url);
        self.write_record(&record)
    }

    fn read_record(&self) -> Result<Option<ProfileRecord>> {
        let storage = self.read_storage()?;
        let Some(entry) = storage.get(PROFILE_KEY) else {
            return Ok(None);
        };

        match serde_json::from_str::<ProfileRecord>(entry) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable profile entry");
                Ok(None)
            }
        }
    }

    fn write_record(&self, record: &ProfileRecord) -> Result<()> {
        let mut storage = self.read_storage()?;
        storage.insert(PROFILE_KEY.to_owned(), serde_json::to_string(record)?);
        let encoded = serde_json::to_vec_pretty(&storage)?;

        // Written next to the storage file and renamed over it, so a reader
        // sees either the old or the new storage.
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|source| self.io_error(source))?;
        file.write_all(&encoded)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;
        file.persist(&self.path).map_err(|err| self.io_error(err.error))?;

        debug!(path = %self.path.display(), "Saved profile");
        Ok(())
    }

    fn read_storage(&self) -> Result<Storage> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Storage::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
