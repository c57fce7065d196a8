use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::{
    Error, ExpenseID, Storage, User, UserID,
    expense::{Expense, ExpenseState},
    rejection::parse_path_param,
};

/// Fetch the expense `id` and check that it belongs to `owner`.
///
/// The existence check comes first, so a missing expense is reported as not
/// found no matter who asks.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such expense, [Error::Forbidden]
/// if it belongs to another user, or any error from `storage`.
pub fn get_owned_expense<S>(storage: &S, id: ExpenseID, owner: UserID) -> Result<Expense, Error>
where
    S: Storage,
{
    let expense = storage.get_expense(id)?.ok_or(Error::NotFound)?;

    if expense.user_id != owner {
        tracing::warn!(
            "User {owner} tried to access expense {id} owned by user {}",
            expense.user_id
        );
        return Err(Error::Forbidden);
    }

    Ok(expense)
}

/// A route handler that returns one of the logged in user's expenses.
pub async fn get_expense_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
    expense_id: Result<Path<ExpenseID>, PathRejection>,
) -> Result<Json<Expense>, Error>
where
    S: Storage,
{
    let expense_id = parse_path_param(expense_id)?;

    get_owned_expense(&state.storage, expense_id, user.id).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        Error, ExpenseType, MemoryStorage, NewExpense, NewUser, PasswordHash, Storage, UserID,
        endpoints::{self, format_endpoint},
        expense::get_owned_expense,
        test_utils::{create_expense_as, log_in_as, new_test_server},
    };

    fn storage_with_two_users() -> (MemoryStorage, UserID, UserID) {
        let storage = MemoryStorage::new();
        let [alice, bob] = ["alice", "bob"].map(|username| {
            storage
                .create_user(NewUser {
                    username: username.to_owned(),
                    password_hash: PasswordHash::new_unchecked("hunter2"),
                })
                .unwrap()
                .id
        });

        (storage, alice, bob)
    }

    fn new_expense() -> NewExpense {
        NewExpense {
            amount: 1000,
            category: "Salary".to_owned(),
            description: None,
            expense_type: ExpenseType::Income,
        }
    }

    #[test]
    fn owner_can_get_expense() {
        let (storage, alice, _) = storage_with_two_users();
        let expense = storage.create_expense(alice, new_expense()).unwrap();

        assert_eq!(get_owned_expense(&storage, expense.id, alice), Ok(expense));
    }

    #[test]
    fn other_user_is_forbidden() {
        let (storage, alice, bob) = storage_with_two_users();
        let expense = storage.create_expense(alice, new_expense()).unwrap();

        assert_eq!(
            get_owned_expense(&storage, expense.id, bob),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn missing_expense_is_not_found_for_everyone() {
        let (storage, alice, bob) = storage_with_two_users();

        assert_eq!(get_owned_expense(&storage, 42, alice), Err(Error::NotFound));
        assert_eq!(get_owned_expense(&storage, 42, bob), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn get_endpoint_checks_owner() {
        let server = new_test_server();
        let alice = log_in_as(&server, "alice").await;
        let bob = log_in_as(&server, "bob").await;
        let expense = create_expense_as(&server, &alice, 10.0, "Rent").await;
        let path = format_endpoint(endpoints::EXPENSE, expense.id);

        server.get(&path).add_cookie(alice).await.assert_status_ok();
        server
            .get(&path)
            .add_cookie(bob.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id + 1))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
