use crate::server::{
    Result, ServerError, ServerRouter,
    auth::ApiKey,
    json::{Created, Json},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use socialwall_backend::{Backend, MemoryBackend, record::MessagePatch};
use socialwall_common::model::{
    Id,
    post::{Message, NewPost, Post, PostMarker},
};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(insert_posts)
        .typed_patch(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/rest/v1/posts")]
struct PostsPath;

/// The subset of table query parameters the wall uses.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct PostsQuery {
    id: Option<String>,
    order: Option<String>,
    select: Option<String>,
}

impl PostsQuery {
    /// Parses the `id=eq.<n>` filter that targets a single row.
    fn id_filter(&self) -> Result<Id<PostMarker>> {
        let filter = self.id.as_deref().ok_or(ServerError::MissingFilter)?;

        filter
            .strip_prefix("eq.")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| ServerError::InvalidFilter(filter.to_owned()))
    }

    fn check_listing(&self) -> Result<()> {
        if let Some(select) = self.select.as_deref()
            && select != "*"
        {
            return Err(ServerError::UnsupportedSelect(select.to_owned()));
        }
        if let Some(order) = self.order.as_deref()
            && order != "created_at.desc"
        {
            return Err(ServerError::UnsupportedOrder(order.to_owned()));
        }
        Ok(())
    }
}

/// An inserted row. The table only insists on `message`.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct InsertRow {
    #[serde(default)]
    username: Option<String>,
    message: Message,
    #[serde(default)]
    image_url: Option<String>,
}

impl From<InsertRow> for NewPost {
    fn from(row: InsertRow) -> Self {
        Self {
            username: row.username.unwrap_or_default(),
            message: row.message.into_inner(),
            image_url: row.image_url,
        }
    }
}

async fn list_posts(
    PostsPath: PostsPath,
    _: ApiKey,
    Query(query): Query<PostsQuery>,
    State(backend): State<Arc<MemoryBackend>>,
) -> Result<Json<Vec<Post>>> {
    query.check_listing()?;
    let posts = backend.fetch_posts().await?;

    Ok(Json(posts))
}

async fn insert_posts(
    PostsPath: PostsPath,
    _: ApiKey,
    State(backend): State<Arc<MemoryBackend>>,
    Json(rows): Json<Vec<InsertRow>>,
) -> Result<Created<Vec<Post>>> {
    let mut created = Vec::with_capacity(rows.len());
    for row in rows {
        created.push(backend.insert_post(&row.into()).await?);
    }

    Ok(Created(created))
}

async fn update_post(
    PostsPath: PostsPath,
    _: ApiKey,
    Query(query): Query<PostsQuery>,
    State(backend): State<Arc<MemoryBackend>>,
    Json(patch): Json<MessagePatch>,
) -> Result<StatusCode> {
    let id = query.id_filter()?;
    backend.update_message(id, &patch.message).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_post(
    PostsPath: PostsPath,
    _: ApiKey,
    Query(query): Query<PostsQuery>,
    State(backend): State<Arc<MemoryBackend>>,
) -> Result<StatusCode> {
    let id = query.id_filter()?;
    backend.delete_post(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
