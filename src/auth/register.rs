//! The endpoint for registering a new user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error, NewUser, PasswordHash, Storage, UserProfile, ValidatedPassword,
    auth::{AuthState, Credentials, cookie::set_auth_cookie},
    rejection::parse_json_body,
    validate_username,
};

/// A route handler for registering a new user.
///
/// The username is trimmed and must not be empty or taken, and the password
/// must be hard to guess. The new user is logged in straight away.
pub async fn register_user<S>(
    State(state): State<AuthState<S>>,
    jar: PrivateCookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, Error>
where
    S: Storage,
{
    let credentials = parse_json_body(payload)?;
    let username = validate_username(&credentials.username)?;

    // Checked before hashing so a taken name does not pay for a bcrypt round.
    if state.storage.get_user_by_username(&username)?.is_some() {
        return Err(Error::DuplicateUsername);
    }

    let password = ValidatedPassword::new(&credentials.password)?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = state.storage.create_user(NewUser {
        username,
        password_hash,
    })?;
    tracing::info!("Registered user {} ({})", user.id, user.username);

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((StatusCode::CREATED, jar, Json(UserProfile::from(&user))).into_response())
}
