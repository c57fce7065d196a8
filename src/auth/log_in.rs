//! The log-in endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Storage, UserProfile,
    auth::{AuthState, cookie::set_auth_cookie},
    rejection::parse_json_body,
};

/// The credentials a user registers or logs in with.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// The name the user is registered as.
    pub username: String,
    /// The plain text password.
    pub password: String,
}

/// A route handler that logs in a user with their username and password.
///
/// On success the auth cookie is set and the user's profile is returned.
/// An unknown username and a wrong password get the same 401 response.
pub async fn post_log_in<S>(
    State(state): State<AuthState<S>>,
    jar: PrivateCookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, Error>
where
    S: Storage,
{
    let credentials = parse_json_body(payload)?;

    let user = state
        .storage
        .get_user_by_username(credentials.username.trim())?
        .ok_or(Error::InvalidCredentials)?;

    if !user.password_hash.verify(&credentials.password)? {
        tracing::debug!("Failed log in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;
    tracing::info!("User {} logged in", user.id);

    Ok((StatusCode::OK, jar, Json(UserProfile::from(&user))).into_response())
}
