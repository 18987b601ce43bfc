use crate::server::{Result, ServerError, ServerRouter, auth::ApiKey, json::Json};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use socialwall_backend::{
    Backend, Bucket, MemoryBackend, client::content_type_for, record::UploadRecord,
};
use std::sync::Arc;
use tracing::info;

/// Matches the hosted storage's default upload size limit.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(upload_object)
        .typed_get(get_public_object)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/storage/v1/object/{bucket}/{file_name}", rejection(ServerError))]
struct ObjectPath {
    bucket: String,
    file_name: String,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/storage/v1/object/public/{bucket}/{file_name}", rejection(ServerError))]
struct PublicObjectPath {
    bucket: String,
    file_name: String,
}

async fn upload_object(
    ObjectPath { bucket, file_name }: ObjectPath,
    _: ApiKey,
    State(backend): State<Arc<MemoryBackend>>,
    bytes: Bytes,
) -> Result<Json<UploadRecord>> {
    let bucket: Bucket = bucket.parse()?;
    let url = backend.upload(bucket, &file_name, bytes.to_vec()).await?;
    info!(%url, "Stored object");

    Ok(Json(UploadRecord {
        key: format!("{bucket}/{file_name}"),
    }))
}

async fn get_public_object(
    PublicObjectPath { bucket, file_name }: PublicObjectPath,
    State(backend): State<Arc<MemoryBackend>>,
) -> Result<Response> {
    let bucket: Bucket = bucket.parse()?;
    let bytes = backend
        .object(bucket, &file_name)
        .await
        .ok_or(ServerError::ObjectNotFound)?;

    Ok(([(CONTENT_TYPE, content_type_for(&file_name))], bytes).into_response())
}
