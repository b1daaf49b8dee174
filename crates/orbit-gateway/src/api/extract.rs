//! Request extractors: client address, bearer authentication, JSON bodies.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;

use orbit_core::error::OrbitError;
use orbit_core::model::{Principal, User};

use super::error::ApiError;
use crate::app_state::AppState;
use crate::auth::TokenType;
use crate::store::StoreError;

/// Unwrap a JSON body taken as `Result<Json<T>, JsonRejection>`.
///
/// Handlers take the body this way and call this after `throttle`, so a
/// malformed body is still counted against its endpoint group.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> orbit_core::Result<T> {
    body.map(|Json(value)| value)
        .map_err(|e| OrbitError::validation(e.body_text()))
}

/// Source address: first `X-Forwarded-For` hop, else the socket peer.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        Ok(ClientAddr(forwarded.or(peer)))
    }
}

/// Bearer-authenticated user, reloaded from the identity store.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
}

impl Authenticated {
    pub fn principal(&self) -> Principal {
        self.user.principal()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                OrbitError::AuthFailed("Authentication credentials were not provided".into())
            })?;

        let claims = state.tokens().verify(token, TokenType::Access)?;
        let user = match state.identities().get_user(claims.user_id()?).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                return Err(OrbitError::AuthFailed("User not found".into()).into());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Authenticated { user })
    }
}
