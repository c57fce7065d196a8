//! An in-memory store that lives as long as the server process.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Error, Expense, ExpenseID, NewExpense, NewUser, Storage, User, UserID,
    expense::now_utc_millis,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserID, User>,
    expenses: BTreeMap<ExpenseID, Expense>,
    next_user_id: i64,
    next_expense_id: i64,
}

/// Keeps users and expenses in memory behind a single lock.
///
/// IDs start at 1 and are never reused, even after an expense is deleted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables.lock().map_err(|error| {
            tracing::error!("could not acquire the memory storage lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl Storage for MemoryStorage {
    fn get_user(&self, id: UserID) -> Result<Option<User>, Error> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let mut tables = self.lock()?;

        if tables
            .users
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(Error::DuplicateUsername);
        }

        tables.next_user_id += 1;
        let user = User {
            id: UserID::new(tables.next_user_id),
            username: new_user.username,
            password_hash: new_user.password_hash,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    fn get_expenses(&self, user_id: UserID) -> Result<Vec<Expense>, Error> {
        let tables = self.lock()?;

        let mut expenses: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|expense| expense.user_id == user_id)
            .cloned()
            .collect();
        // The map is keyed by ID, so a stable sort keeps ties in ID order.
        expenses.sort_by_key(|expense| expense.created_at);

        Ok(expenses)
    }

    fn get_expense(&self, id: ExpenseID) -> Result<Option<Expense>, Error> {
        Ok(self.lock()?.expenses.get(&id).cloned())
    }

    fn create_expense(&self, user_id: UserID, new_expense: NewExpense) -> Result<Expense, Error> {
        if new_expense.amount < 0 {
            return Err(Error::InvalidAmount("must be zero or greater"));
        }

        let mut tables = self.lock()?;

        if !tables.users.contains_key(&user_id) {
            return Err(Error::InvalidUser);
        }

        tables.next_expense_id += 1;
        let expense = Expense {
            id: tables.next_expense_id,
            user_id,
            amount: new_expense.amount,
            category: new_expense.category,
            description: new_expense.description,
            expense_type: new_expense.expense_type,
            created_at: now_utc_millis(),
        };
        tables.expenses.insert(expense.id, expense.clone());

        Ok(expense)
    }

    fn delete_expense(&self, id: ExpenseID) -> Result<(), Error> {
        self.lock()?.expenses.remove(&id);

        Ok(())
    }
}
