//! Per-request sessions resolved against the external auth provider.
//!
//! A request carries the provider's access token either as a bearer token or in
//! the [`SESSION_COOKIE`] cookie. Each request gets its own [`Session`]; nothing
//! about one visitor is visible to another.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::session::{Profile, Session};
use crate::AppState;

pub const SESSION_COOKIE: &str = "lab_access_token";

#[derive(Deserialize)]
struct ProviderUser {
    id: String,
}

/// Access token from `Authorization: Bearer ...`, else from the session cookie.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value storing `token` for the whole site.
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

fn provider_request(state: &AppState, builder: RequestBuilder, token: &str) -> RequestBuilder {
    let builder = builder.bearer_auth(token).timeout(state.config.fetch_timeout);
    match &state.config.auth_api_key {
        Some(key) => builder.header("apikey", key),
        None => builder,
    }
}

/// Looks `token` up with the auth provider. Any failure reads as signed out.
pub async fn resolve_session(state: &AppState, token: &str) -> Option<Session> {
    let base = state.config.auth_url.as_deref()?;

    let request = provider_request(state, state.http.get(format!("{}/auth/v1/user", base)), token);
    let res = match request.send().await {
        Ok(res) => res,
        Err(e) => {
            warn!(error = %e, "auth provider unreachable");
            return None;
        }
    };

    match res.status() {
        status if status.is_success() => {}
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            debug!("access token rejected by auth provider");
            return None;
        }
        status => {
            warn!(%status, "auth provider error");
            return None;
        }
    }

    let user: ProviderUser = match res.json().await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "undecodable auth provider user");
            return None;
        }
    };

    let profile = fetch_profile(state, base, &user.id, token).await;
    Some(Session {
        user_id: user.id,
        access_token: token.to_string(),
        profile,
    })
}

async fn fetch_profile(state: &AppState, base: &str, user_id: &str, token: &str) -> Option<Profile> {
    let request = state
        .http
        .get(format!("{}/rest/v1/profiles", base))
        .query(&[("id", format!("eq.{}", user_id)), ("select", "first_name,last_name".to_string())]);
    let res = provider_request(state, request, token).send().await.ok()?;
    if !res.status().is_success() {
        debug!(status = %res.status(), %user_id, "no profile for user");
        return None;
    }
    let rows: Vec<Profile> = res.json().await.ok()?;
    rows.into_iter().next()
}

/// Revokes `token` with the auth provider. Failures are logged and otherwise ignored.
pub async fn revoke(state: &AppState, token: &str) {
    let Some(base) = state.config.auth_url.as_deref() else { return };

    let request = provider_request(state, state.http.post(format!("{}/auth/v1/logout", base)), token);
    match request.send().await {
        Ok(res) if res.status().is_success() => debug!("session revoked"),
        Ok(res) => warn!(status = %res.status(), "auth provider refused sign-out"),
        Err(e) => warn!(error = %e, "auth provider unreachable on sign-out"),
    }
}

/// The requesting visitor's session, if they are signed in.
pub struct CurrentSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = match access_token(&parts.headers) {
            Some(token) => resolve_session(state, &token).await,
            None => None,
        };
        Ok(CurrentSession(session))
    }
}
