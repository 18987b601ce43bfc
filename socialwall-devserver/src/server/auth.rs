use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

const API_KEY_HEADER: &str = "apikey";

/// The key every table and upload request has to present. `None` leaves
/// the server open.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct RequiredApiKey(Option<Arc<str>>);

impl RequiredApiKey {
    #[must_use]
    pub fn new(key: Option<String>) -> Self {
        Self(key.map(Arc::from))
    }
}

/// Proof that the request carried the configured API key, both in the
/// `apikey` header and, if present, as the bearer token.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ApiKey;

impl<S> FromRequestParts<S> for ApiKey
where
    RequiredApiKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequiredApiKey(Some(expected)) = RequiredApiKey::from_ref(state) else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .ok_or(ServerError::MissingApiKey)?
            .to_str()
            .map_err(|_| ServerError::InvalidApiKey)?;
        if presented != &*expected {
            return Err(ServerError::InvalidApiKey);
        }

        let bearer =
            <AuthorizationHeader as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?;
        if let Some(TypedHeader(Authorization(bearer))) = bearer
            && bearer.token() != &*expected
        {
            return Err(ServerError::InvalidApiKey);
        }

        Ok(Self)
    }
}
