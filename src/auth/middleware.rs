//! Authentication middleware that validates the auth cookie and extends sessions.

use axum::{
    extract::{FromRef, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use time::Duration;

use crate::{
    AppState, Error, Storage,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
};

/// Each authenticated request keeps the session alive for at least this long.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware and the auth route handlers.
#[derive(Debug, Clone)]
pub struct AuthState<S>
where
    S: Storage,
{
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
    /// The store for users.
    pub storage: S,
}

impl<S> FromRef<AppState<S>> for AuthState<S>
where
    S: Storage,
{
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_hash_cost: state.password_hash_cost,
            storage: state.storage.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl<S> FromRef<AuthState<S>> for Key
where
    S: Storage,
{
    fn from_ref(state: &AuthState<S>) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid auth cookie.
///
/// The logged in [User](crate::User) is placed into the request extensions and
/// the request is executed normally if the cookie is valid, otherwise a 401
/// response is returned. The session is extended on the way out.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn auth_guard<S>(
    State(state): State<AuthState<S>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: Storage,
{
    let jar = PrivateCookieJar::from_headers(request.headers(), state.cookie_key.clone());

    let user = match get_token_from_cookies(&jar)
        .and_then(|token| state.storage.get_user(token.user_id))
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!("Auth token refers to a user that does not exist.");
            return Error::Unauthorized.into_response();
        }
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), SESSION_EXTENSION) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}
