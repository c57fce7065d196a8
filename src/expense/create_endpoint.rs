use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error, Storage, User,
    expense::{ExpenseForm, ExpenseState},
    rejection::parse_json_body,
};

/// A route handler for creating a new expense for the logged in user.
///
/// The amount in the request is in major units (dollars). The response is the
/// stored expense with the amount in minor units (cents).
///
/// The body is validated before the store is touched, so invalid input never
/// reaches storage.
pub async fn create_expense_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
    payload: Result<Json<ExpenseForm>, JsonRejection>,
) -> Result<Response, Error>
where
    S: Storage,
{
    let new_expense = parse_json_body(payload)?.validate()?;
    let expense = state.storage.create_expense(user.id, new_expense)?;

    Ok((StatusCode::CREATED, Json(expense)).into_response())
}
