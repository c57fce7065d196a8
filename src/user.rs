//! The user model and the public view of a user that is sent to clients.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the store.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The fields needed to create a [User]. The store assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Trim whitespace from `username` and check that something is left.
///
/// # Errors
///
/// Returns [Error::EmptyUsername] if `username` is empty after trimming.
pub fn validate_username(username: &str) -> Result<String, Error> {
    let username = username.trim();

    if username.is_empty() {
        return Err(Error::EmptyUsername);
    }

    Ok(username.to_owned())
}

/// The user details that are safe to send to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserID,
    /// The user's name.
    pub username: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, user::validate_username};

    #[test]
    fn validate_username_trims_whitespace() {
        assert_eq!(validate_username("  alice "), Ok("alice".to_owned()));
    }

    #[test]
    fn validate_username_rejects_blank_username() {
        assert_eq!(validate_username("   "), Err(Error::EmptyUsername));
    }
}
