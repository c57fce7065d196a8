//! The storage contract for users and expenses, and its two backends.
//!
//! The backend is picked once when the server starts. Route handlers are
//! generic over [Storage], so they never know which backend they talk to.

mod memory;
mod sqlite;

use std::fmt::Debug;

use crate::{Error, Expense, ExpenseID, NewExpense, NewUser, User, UserID};

pub use memory::MemoryStorage;
pub use sqlite::{SQLiteStorage, initialize};

/// Handles the creation and retrieval of users and expenses.
///
/// Implementations must be safe to share between request handlers. Cloning a
/// store gives another handle to the same underlying data.
pub trait Storage: Clone + Debug + Send + Sync + 'static {
    /// Get the user with the ID `id`, or `None` if there is no such user.
    fn get_user(&self, id: UserID) -> Result<Option<User>, Error>;

    /// Get the user registered as `username`, or `None` if there is no such user.
    ///
    /// Usernames are matched exactly, including case.
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Create a user and assign them a new ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateUsername] if the username is already taken.
    fn create_user(&self, new_user: NewUser) -> Result<User, Error>;

    /// Get every expense owned by `user_id`, oldest first.
    ///
    /// Expenses created at the same instant are ordered by ID.
    fn get_expenses(&self, user_id: UserID) -> Result<Vec<Expense>, Error>;

    /// Get the expense with the ID `id`, or `None` if there is no such expense.
    fn get_expense(&self, id: ExpenseID) -> Result<Option<Expense>, Error>;

    /// Create an expense owned by `user_id`. The store assigns the ID and
    /// the creation time.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUser] if `user_id` does not refer to a user, or
    /// [Error::InvalidAmount] if the amount is negative.
    fn create_expense(&self, user_id: UserID, new_expense: NewExpense) -> Result<Expense, Error>;

    /// Delete the expense with the ID `id`.
    ///
    /// Deleting an expense that does not exist is not an error.
    fn delete_expense(&self, id: ExpenseID) -> Result<(), Error>;
}

/// Generates the same suite of tests for each storage backend.
///
/// `$new_storage` is an expression that evaluates to a new, empty store.
#[cfg(test)]
macro_rules! storage_contract_tests {
    ($module:ident, $new_storage:expr) => {
        mod $module {
            use crate::{
                Error, ExpenseType, NewExpense, NewUser, PasswordHash, Storage, UserID,
            };

            fn new_user(username: &str) -> NewUser {
                NewUser {
                    username: username.to_owned(),
                    password_hash: PasswordHash::new_unchecked("hunter2"),
                }
            }

            fn new_expense(amount: i64, category: &str) -> NewExpense {
                NewExpense {
                    amount,
                    category: category.to_owned(),
                    description: None,
                    expense_type: ExpenseType::Expense,
                }
            }

            #[test]
            fn create_user_assigns_distinct_ids() {
                let storage = $new_storage;

                let alice = storage.create_user(new_user("alice")).unwrap();
                let bob = storage.create_user(new_user("bob")).unwrap();

                assert_ne!(alice.id, bob.id);
                assert_eq!(alice.username, "alice");
                assert_eq!(alice.password_hash, PasswordHash::new_unchecked("hunter2"));
            }

            #[test]
            fn create_user_rejects_duplicate_username() {
                let storage = $new_storage;
                storage.create_user(new_user("alice")).unwrap();

                let result = storage.create_user(new_user("alice"));

                assert_eq!(result, Err(Error::DuplicateUsername));
            }

            #[test]
            fn get_user_by_id_and_username() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();

                assert_eq!(storage.get_user(alice.id), Ok(Some(alice.clone())));
                assert_eq!(storage.get_user_by_username("alice"), Ok(Some(alice)));
            }

            #[test]
            fn get_missing_user_is_none() {
                let storage = $new_storage;
                storage.create_user(new_user("alice")).unwrap();

                assert_eq!(storage.get_user(UserID::new(999)), Ok(None));
                assert_eq!(storage.get_user_by_username("Alice"), Ok(None));
                assert_eq!(storage.get_user_by_username("bob"), Ok(None));
            }

            #[test]
            fn create_expense_assigns_id_owner_and_time() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();
                let mut expense = new_expense(1250, "Salary");
                expense.description = Some("October".to_owned());
                expense.expense_type = ExpenseType::Income;

                let created = storage.create_expense(alice.id, expense).unwrap();

                assert!(created.id > 0);
                assert_eq!(created.user_id, alice.id);
                assert_eq!(created.amount, 1250);
                assert_eq!(created.category, "Salary");
                assert_eq!(created.description.as_deref(), Some("October"));
                assert_eq!(created.expense_type, ExpenseType::Income);
                assert_eq!(storage.get_expense(created.id), Ok(Some(created)));
            }

            #[test]
            fn create_expense_for_missing_user_fails() {
                let storage = $new_storage;

                let result = storage.create_expense(UserID::new(42), new_expense(100, "Food"));

                assert_eq!(result, Err(Error::InvalidUser));
            }

            #[test]
            fn create_expense_rejects_negative_amount() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();

                let result = storage.create_expense(alice.id, new_expense(-1, "Food"));

                assert!(
                    matches!(result, Err(Error::InvalidAmount(_))),
                    "expected an invalid amount error, got {result:?}"
                );
                assert_eq!(storage.get_expenses(alice.id), Ok(vec![]));
            }

            #[test]
            fn zero_amount_is_allowed() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();

                let created = storage.create_expense(alice.id, new_expense(0, "Free"));

                assert_eq!(created.map(|expense| expense.amount), Ok(0));
            }

            #[test]
            fn get_expenses_is_scoped_to_owner_in_creation_order() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();
                let bob = storage.create_user(new_user("bob")).unwrap();

                let first = storage.create_expense(alice.id, new_expense(100, "Rent")).unwrap();
                storage.create_expense(bob.id, new_expense(200, "Food")).unwrap();
                let second = storage.create_expense(alice.id, new_expense(300, "Fuel")).unwrap();

                assert_eq!(storage.get_expenses(alice.id), Ok(vec![first, second]));
                assert_eq!(storage.get_expenses(bob.id).map(|e| e.len()), Ok(1));
                assert_eq!(storage.get_expenses(UserID::new(999)), Ok(vec![]));
            }

            #[test]
            fn get_missing_expense_is_none() {
                let storage = $new_storage;

                assert_eq!(storage.get_expense(1), Ok(None));
            }

            #[test]
            fn delete_expense_removes_it() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();
                let kept = storage.create_expense(alice.id, new_expense(100, "Rent")).unwrap();
                let deleted = storage.create_expense(alice.id, new_expense(200, "Food")).unwrap();

                storage.delete_expense(deleted.id).unwrap();

                assert_eq!(storage.get_expense(deleted.id), Ok(None));
                assert_eq!(storage.get_expenses(alice.id), Ok(vec![kept]));
            }

            #[test]
            fn delete_expense_is_idempotent() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();
                let expense = storage.create_expense(alice.id, new_expense(100, "Rent")).unwrap();

                assert_eq!(storage.delete_expense(expense.id), Ok(()));
                assert_eq!(storage.delete_expense(expense.id), Ok(()));
                assert_eq!(storage.delete_expense(999), Ok(()));
            }

            #[test]
            fn ids_are_not_reused_after_delete() {
                let storage = $new_storage;
                let alice = storage.create_user(new_user("alice")).unwrap();
                let first = storage.create_expense(alice.id, new_expense(100, "Rent")).unwrap();
                storage.delete_expense(first.id).unwrap();

                let second = storage.create_expense(alice.id, new_expense(100, "Rent")).unwrap();

                assert_ne!(first.id, second.id);
            }

            #[test]
            fn clones_share_data() {
                let storage = $new_storage;
                let other_handle = storage.clone();

                let alice = storage.create_user(new_user("alice")).unwrap();

                assert_eq!(other_handle.get_user(alice.id), Ok(Some(alice)));
            }
        }
    };
}

#[cfg(test)]
storage_contract_tests!(memory_storage_tests, crate::MemoryStorage::new());

#[cfg(test)]
storage_contract_tests!(
    sqlite_storage_tests,
    crate::SQLiteStorage::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap()
);
