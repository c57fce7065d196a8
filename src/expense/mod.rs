//! Expenses: the model, and the route handlers that list, create, delete and
//! export a user's expenses.
//!
//! Every handler here sits behind the auth guard, which places the logged in
//! [User](crate::User) into the request extensions.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod report_endpoint;

use axum::extract::FromRef;

use crate::{AppState, ReportFonts, Storage};

pub use core::{Expense, ExpenseForm, ExpenseType, NewExpense};
pub(crate) use core::now_utc_millis;
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use get_endpoint::{get_expense_endpoint, get_owned_expense};
pub use list_endpoint::{export_expenses_endpoint, list_expenses_endpoint};
pub use report_endpoint::get_report_endpoint;

/// The state needed by the expense route handlers.
#[derive(Debug, Clone)]
pub struct ExpenseState<S>
where
    S: Storage,
{
    /// The store for users and expenses.
    pub storage: S,
    /// The fonts for rendering PDF reports, if configured.
    pub report_fonts: Option<ReportFonts>,
}

impl<S> FromRef<AppState<S>> for ExpenseState<S>
where
    S: Storage,
{
    fn from_ref(state: &AppState<S>) -> Self {
        Self {
            storage: state.storage.clone(),
            report_fonts: state.report_fonts.clone(),
        }
    }
}
