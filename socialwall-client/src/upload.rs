//! Image files picked by the user and how they land in object storage.

use socialwall_backend::{Backend, BackendError, Bucket};
use std::{io, path::Path};
use time::OffsetDateTime;
use tracing::{error, info};

const BUCKET_NOT_FOUND: &str = "Bucket not found";
const ROW_LEVEL_SECURITY: &str = "new row violates row-level security";

pub const PROFILE_SETUP_PREFIX: &str = "profile_";
pub const AVATAR_CHANGE_PREFIX: &str = "sidebar_profile_";

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ImageFile {
    name: String,
    bytes: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned();

        Ok(Self { name, bytes })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Text after the last `.`. A name without a dot is its own extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(_, extension)| extension)
    }

    /// `<prefix><unix millis>.<extension>`. Two uploads in the same
    /// millisecond collide.
    #[must_use]
    pub fn storage_name(&self, prefix: &str, now: OffsetDateTime) -> String {
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        format!("{prefix}{millis}.{}", self.extension())
    }
}

/// Uploads `file` under a fresh timestamped name and returns its public URL.
pub async fn upload_image<B: Backend>(
    backend: &B,
    bucket: Bucket,
    prefix: &str,
    file: &ImageFile,
) -> Result<String, BackendError> {
    let file_name = file.storage_name(prefix, OffsetDateTime::now_utc());

    match backend
        .upload(bucket, &file_name, file.bytes().to_vec())
        .await
    {
        Ok(url) => {
            info!(%bucket, %file_name, %url, "Upload successful");
            Ok(url)
        }
        Err(err) => {
            error!(%bucket, %file_name, error = %err, "Upload failed");
            Err(err)
        }
    }
}

#[must_use]
pub fn post_image_alert(bucket: Bucket, err: &BackendError) -> String {
    let message = err.to_string();
    if message.contains(BUCKET_NOT_FOUND) {
        format!(
            "Upload not configured. You need to create a \"{bucket}\" bucket in Supabase Storage."
        )
    } else if message.contains(ROW_LEVEL_SECURITY) {
        "Storage permissions issue. You may need to disable RLS on storage or create storage \
         policies."
            .to_owned()
    } else {
        format!("Upload failed: {message}")
    }
}

#[must_use]
pub fn profile_picture_alert(err: &BackendError) -> String {
    let message = err.to_string();
    if message.contains(BUCKET_NOT_FOUND) {
        format!(
            "Profile pictures bucket not found. Please create a \"{}\" bucket in Supabase Storage.",
            Bucket::ProfilePictures
        )
    } else if message.contains(ROW_LEVEL_SECURITY) {
        format!(
            "Storage permissions issue. You may need to create storage policies for {}.",
            Bucket::ProfilePictures
        )
    } else {
        format!("Failed to upload profile picture: {message}")
    }
}
