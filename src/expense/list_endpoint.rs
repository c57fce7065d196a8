use axum::{Extension, Json, extract::State};

use crate::{
    Error, Storage, User,
    expense::{Expense, ExpenseState},
};

/// A route handler that returns the logged in user's expenses as a JSON array.
///
/// Expenses are ordered by creation time, oldest first.
pub async fn list_expenses_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Expense>>, Error>
where
    S: Storage,
{
    state.storage.get_expenses(user.id).map(Json)
}

/// A route handler that returns the full list of the logged in user's
/// expenses for the client to build a report from.
///
/// The response has the same shape as [list_expenses_endpoint].
pub async fn export_expenses_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Expense>>, Error>
where
    S: Storage,
{
    let expenses = state.storage.get_expenses(user.id)?;
    tracing::debug!("Exporting {} expenses for user {}", expenses.len(), user.id);

    Ok(Json(expenses))
}
