//! Ledger is a web API for tracking personal income and expenses.
//!
//! Authenticated users record transactions, list and delete them, and export
//! them as a PDF report with income, expense and net balance totals.
//!
//! The storage backend is chosen when the server starts: either the
//! in-memory [MemoryStorage] or the SQLite backed [SQLiteStorage]. Both
//! implement the [Storage] trait and are handed to [build_router] through
//! [AppState].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod endpoints;
mod expense;
mod logging;
mod money;
mod password;
mod rejection;
mod report;
mod routing;
mod storage;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, create_cookie_key};
pub use database_id::{DatabaseID, ExpenseID};
pub use expense::{Expense, ExpenseForm, ExpenseType, NewExpense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{format_minor_units, to_minor_units};
pub use password::{PasswordHash, ValidatedPassword};
pub use report::{
    DEFAULT_REPORT_FONT_FAMILY, ExpenseReport, ReportFonts, Summary, page_footer, render_pdf,
};
pub use routing::build_router;
pub use storage::{MemoryStorage, SQLiteStorage, Storage, initialize as initialize_db};
pub use user::{NewUser, User, UserID, UserProfile, validate_username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount of an expense was negative, not a finite number, or too
    /// large to store exactly.
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    /// An empty (or whitespace only) string was used as an expense category.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// The request body could not be parsed.
    ///
    /// Callers should pass in the parser's error message.
    #[error("invalid request body: {0}")]
    InvalidJson(String),

    /// A path parameter, e.g. an expense ID, could not be parsed.
    #[error("invalid path parameter: {0}")]
    InvalidPath(String),

    /// An empty (or whitespace only) string was used as a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The username used to register is already taken.
    #[error("username already exists")]
    DuplicateUsername,

    /// The request did not carry a valid auth token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The username and password did not match a registered user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The resource exists but belongs to another user.
    #[error("Forbidden")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An expense was created for a user ID that is not in the store.
    #[error("the user ID does not refer to a valid user")]
    InvalidUser,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth token could not be written to or read from its cookie.
    #[error("could not encode the auth token: {0}")]
    CookieError(String),

    /// The PDF report could not be rendered.
    #[error("could not render the report: {0}")]
    ReportError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("users.username") =>
            {
                Error::DuplicateUsername
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidUser
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidAmount(_)
            | Error::EmptyCategory
            | Error::InvalidJson(_)
            | Error::InvalidPath(_)
            | Error::EmptyUsername
            | Error::TooWeak(_)
            | Error::DuplicateUsername => StatusCode::BAD_REQUEST,
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidUser
            | Error::HashingError(_)
            | Error::CookieError(_)
            | Error::ReportError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The message sent to the client for any error that is not the client's fault.
pub(crate) const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred, check the server logs for more details.";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal details are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            INTERNAL_ERROR_MESSAGE.to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, INTERNAL_ERROR_MESSAGE, test_utils::json_body};

    #[tokio::test]
    async fn validation_error_includes_detail() {
        let response = Error::InvalidAmount("must be zero or greater").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "invalid amount: must be zero or greater");
    }

    #[tokio::test]
    async fn storage_error_hides_detail() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn forbidden_and_not_found_are_distinct() {
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
