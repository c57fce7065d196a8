//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{PasswordHash, ReportFonts, Storage, auth::DEFAULT_COOKIE_DURATION};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<S>
where
    S: Storage,
{
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
    /// The fonts used to render PDF reports. Reports are unavailable when
    /// this is `None`.
    pub report_fonts: Option<ReportFonts>,
    /// The store for users and their expenses.
    pub storage: S,
}

impl<S> AppState<S>
where
    S: Storage,
{
    /// Create a new [AppState] with the default cookie duration and password
    /// hash cost, and without report fonts.
    pub fn new(storage: S, cookie_secret: &str) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            password_hash_cost: PasswordHash::DEFAULT_COST,
            report_fonts: None,
            storage,
        }
    }

    /// Set the fonts that PDF reports are rendered with.
    pub fn with_report_fonts(mut self, report_fonts: ReportFonts) -> Self {
        self.report_fonts = Some(report_fonts);
        self
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl<S> FromRef<AppState<S>> for Key
where
    S: Storage,
{
    fn from_ref(state: &AppState<S>) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState, MemoryStorage, PasswordHash, ReportFonts, auth::DEFAULT_COOKIE_DURATION,
    };

    #[test]
    fn new_uses_defaults() {
        let state = AppState::new(MemoryStorage::new(), "foobar");

        assert_eq!(state.cookie_duration, DEFAULT_COOKIE_DURATION);
        assert_eq!(state.password_hash_cost, PasswordHash::DEFAULT_COST);
        assert_eq!(state.report_fonts, None);
    }

    #[test]
    fn can_set_report_fonts() {
        let fonts = ReportFonts::new("fonts", "LiberationSans");

        let state = AppState::new(MemoryStorage::new(), "foobar").with_report_fonts(fonts.clone());

        assert_eq!(state.report_fonts, Some(fonts));
    }

    #[test]
    fn same_secret_gives_same_key() {
        let left = AppState::new(MemoryStorage::new(), "foobar");
        let right = AppState::new(MemoryStorage::new(), "foobar");

        assert_eq!(left.cookie_key.master(), right.cookie_key.master());
    }
}
