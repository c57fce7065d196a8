#![allow(missing_docs)]

use axum::{http::StatusCode, response::Response};
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use serde_json::{Value, json};

use crate::{
    AppState, Error, Expense, ExpenseID, MemoryStorage, NewExpense, NewUser, ReportFonts,
    Storage, User, UserID, auth::COOKIE_TOKEN, build_router, endpoints,
};

/// A password that passes the strength check.
pub(crate) const TEST_PASSWORD: &str = "averystrongandsecurepassword";

/// The lowest bcrypt cost, so that tests do not spend their time hashing.
const TEST_PASSWORD_HASH_COST: u32 = 4;

pub(crate) fn test_app_state<S: Storage>(storage: S) -> AppState<S> {
    let mut state = AppState::new(storage, "nafstenoas");
    state.password_hash_cost = TEST_PASSWORD_HASH_COST;
    state
}

pub(crate) fn new_test_server_with<S: Storage>(storage: S) -> TestServer {
    TestServer::new(build_router(test_app_state(storage))).expect("Could not create test server.")
}

pub(crate) fn new_test_server() -> TestServer {
    new_test_server_with(MemoryStorage::new())
}

/// Register `username` and return their auth cookie.
pub(crate) async fn log_in_as(server: &TestServer, username: &str) -> Cookie<'static> {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({"username": username, "password": TEST_PASSWORD}))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.cookie(COOKIE_TOKEN)
}

/// Create an expense through the API, `amount` in dollars.
pub(crate) async fn create_expense_as(
    server: &TestServer,
    token: &Cookie<'static>,
    amount: f64,
    category: &str,
) -> Expense {
    let response = server
        .post(endpoints::EXPENSES)
        .add_cookie(token.clone())
        .json(&json!({"amount": amount, "category": category, "type": "Expense"}))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}

/// DejaVu Sans, checked in under `tests/fonts`.
pub(crate) fn test_fonts() -> ReportFonts {
    ReportFonts::new(
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts"),
        "DejaVuSans",
    )
}

/// Count the page objects in a PDF file, skipping the `/Type/Pages` tree.
pub(crate) fn count_pdf_pages(pdf: &[u8]) -> usize {
    const MARKER: &[u8] = b"/Type/Page";

    pdf.windows(MARKER.len() + 1)
        .filter(|window| window.starts_with(MARKER) && window[MARKER.len()] != b's')
        .count()
}

pub(crate) async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not JSON")
}

/// A store that works like [MemoryStorage] except that deleting an expense
/// always fails.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingDeleteStorage {
    inner: MemoryStorage,
}

impl Storage for FailingDeleteStorage {
    fn get_user(&self, id: UserID) -> Result<Option<User>, Error> {
        self.inner.get_user(id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.inner.get_user_by_username(username)
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        self.inner.create_user(new_user)
    }

    fn get_expenses(&self, user_id: UserID) -> Result<Vec<Expense>, Error> {
        self.inner.get_expenses(user_id)
    }

    fn get_expense(&self, id: ExpenseID) -> Result<Option<Expense>, Error> {
        self.inner.get_expense(id)
    }

    fn create_expense(&self, user_id: UserID, new_expense: NewExpense) -> Result<Expense, Error> {
        self.inner.create_expense(user_id, new_expense)
    }

    fn delete_expense(&self, _id: ExpenseID) -> Result<(), Error> {
        Err(Error::DatabaseLockError)
    }
}
