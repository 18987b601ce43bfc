use crate::server::ServerRouter;
use axum::Router;

mod posts;
mod storage;

pub fn routes() -> ServerRouter {
    Router::new().merge(posts::routes()).merge(storage::routes())
}
