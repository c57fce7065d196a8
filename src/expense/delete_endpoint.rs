use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde_json::{Value, json};

use crate::{
    Error, ExpenseID, Storage, User,
    expense::{ExpenseState, get_owned_expense},
    rejection::parse_path_param,
};

/// A route handler for deleting one of the logged in user's expenses.
///
/// Responds with 404 if the expense does not exist and 403 if it belongs to
/// another user.
pub async fn delete_expense_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
    expense_id: Result<Path<ExpenseID>, PathRejection>,
) -> Result<Json<Value>, Error>
where
    S: Storage,
{
    let expense_id = parse_path_param(expense_id)?;
    get_owned_expense(&state.storage, expense_id, user.id)?;
    state.storage.delete_expense(expense_id)?;
    tracing::info!("User {} deleted expense {expense_id}", user.id);

    Ok(Json(json!({ "message": "Expense deleted" })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        Expense,
        endpoints::{self, format_endpoint},
        test_utils::{
            FailingDeleteStorage, create_expense_as, log_in_as, new_test_server,
            new_test_server_with,
        },
    };

    #[tokio::test]
    async fn owner_can_delete_expense() {
        let server = new_test_server();
        let token = log_in_as(&server, "alice").await;
        let expense = create_expense_as(&server, &token, 4.0, "Coffee").await;

        let response = server
            .delete(&format_endpoint(endpoints::EXPENSE, expense.id))
            .add_cookie(token.clone())
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"message": "Expense deleted"}));
        let listed = server
            .get(endpoints::EXPENSES)
            .add_cookie(token)
            .await
            .json::<Vec<Expense>>();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found_the_second_time() {
        let server = new_test_server();
        let token = log_in_as(&server, "alice").await;
        let expense = create_expense_as(&server, &token, 4.0, "Coffee").await;
        let path = format_endpoint(endpoints::EXPENSE, expense.id);

        server
            .delete(&path)
            .add_cookie(token.clone())
            .await
            .assert_status_ok();
        server
            .delete(&path)
            .add_cookie(token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_user_cannot_delete_expense() {
        let server = new_test_server();
        let alice = log_in_as(&server, "alice").await;
        let bob = log_in_as(&server, "bob").await;
        let expense = create_expense_as(&server, &alice, 4.0, "Coffee").await;

        server
            .delete(&format_endpoint(endpoints::EXPENSE, expense.id))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let listed = server
            .get(endpoints::EXPENSES)
            .add_cookie(alice)
            .await
            .json::<Vec<Expense>>();
        assert_eq!(listed, vec![expense]);
    }

    #[tokio::test]
    async fn delete_missing_expense_is_not_found() {
        let server = new_test_server();
        let token = log_in_as(&server, "alice").await;

        server
            .delete(&format_endpoint(endpoints::EXPENSE, 999))
            .add_cookie(token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_requires_log_in() {
        let server = new_test_server();

        server
            .delete(&format_endpoint(endpoints::EXPENSE, 1))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let server = new_test_server_with(FailingDeleteStorage::default());
        let token = log_in_as(&server, "alice").await;
        let expense = create_expense_as(&server, &token, 4.0, "Coffee").await;

        let response = server
            .delete(&format_endpoint(endpoints::EXPENSE, expense.id))
            .add_cookie(token)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["message"], crate::INTERNAL_ERROR_MESSAGE);
    }
}
