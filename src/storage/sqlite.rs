//! A SQLite backed store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    Error, Expense, ExpenseID, NewExpense, NewUser, PasswordHash, Storage, User, UserID,
};

/// The format SQLite's `strftime('%Y-%m-%d %H:%M:%f')` writes timestamps in.
/// Timestamps are always UTC.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
);

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category, description, type, created_at";

/// Create the tables for users and expenses if they do not already exist.
///
/// Also turns on foreign key enforcement for `connection`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            amount INTEGER NOT NULL CHECK (amount >= 0),
            category TEXT NOT NULL,
            description TEXT,
            type TEXT NOT NULL CHECK (type IN ('Income', 'Expense')),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_user_id ON expenses(user_id);",
    )?;

    Ok(())
}

/// Keeps users and expenses in a SQLite database.
///
/// The connection is shared between clones and guarded by a mutex, so only
/// one query runs at a time.
#[derive(Debug, Clone)]
pub struct SQLiteStorage {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStorage {
    /// Create a store from `connection`, creating the tables if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire the database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_created_at: String = row.get(6)?;
    let created_at = parse_timestamp(&raw_created_at)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, error.into()))?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        expense_type: row.get(5)?,
        created_at,
    })
}

fn parse_timestamp(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT).map(PrimitiveDateTime::assume_utc)
}

impl Storage for SQLiteStorage {
    fn get_user(&self, id: UserID) -> Result<Option<User>, Error> {
        self.lock()?
            .prepare("SELECT id, username, password FROM users WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], map_user_row)
            .optional()
            .map_err(|error| error.into())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.lock()?
            .prepare("SELECT id, username, password FROM users WHERE username = :username")?
            .query_row(&[(":username", &username)], map_user_row)
            .optional()
            .map_err(|error| error.into())
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let connection = self.lock()?;

        connection.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            (&new_user.username, new_user.password_hash.as_ref()),
        )?;

        Ok(User {
            id: UserID::new(connection.last_insert_rowid()),
            username: new_user.username,
            password_hash: new_user.password_hash,
        })
    }

    fn get_expenses(&self, user_id: UserID) -> Result<Vec<Expense>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = :user_id
            ORDER BY created_at ASC, id ASC"
        ))?;

        statement
            .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| error.into())
    }

    fn get_expense(&self, id: ExpenseID) -> Result<Option<Expense>, Error> {
        self.lock()?
            .prepare(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = :id"))?
            .query_row(&[(":id", &id)], map_expense_row)
            .optional()
            .map_err(|error| error.into())
    }

    fn create_expense(&self, user_id: UserID, new_expense: NewExpense) -> Result<Expense, Error> {
        if new_expense.amount < 0 {
            return Err(Error::InvalidAmount("must be zero or greater"));
        }

        self.lock()?
            .prepare(&format!(
                "INSERT INTO expenses (user_id, amount, category, description, type)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING {EXPENSE_COLUMNS}"
            ))?
            .query_row(
                (
                    user_id.as_i64(),
                    new_expense.amount,
                    &new_expense.category,
                    &new_expense.description,
                    new_expense.expense_type,
                ),
                map_expense_row,
            )
            .map_err(|error| error.into())
    }

    fn delete_expense(&self, id: ExpenseID) -> Result<(), Error> {
        self.lock()?
            .execute("DELETE FROM expenses WHERE id = ?1", [id])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{NewUser, PasswordHash, SQLiteStorage, Storage, initialize_db};

    use super::parse_timestamp;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize_db(&connection).unwrap();
        initialize_db(&connection).unwrap();
    }

    #[test]
    fn both_tables_use_autoincrement_ids() {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO users (username, password) VALUES ('alice', 'hunter2')",
                (),
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO expenses (user_id, amount, category, type) VALUES (1, 100, 'Food', 'Expense')",
                (),
            )
            .unwrap();

        // SQLite only tracks tables declared with AUTOINCREMENT in sqlite_sequence.
        let mut tables: Vec<String> = connection
            .prepare("SELECT name FROM sqlite_sequence")
            .unwrap()
            .query_map((), |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        tables.sort();
        assert_eq!(tables, ["expenses", "users"]);
    }

    #[test]
    fn parses_sqlite_timestamps_as_utc() {
        assert_eq!(
            parse_timestamp("2026-10-18 09:30:00.123").unwrap(),
            datetime!(2026-10-18 09:30:00.123 UTC)
        );
        assert!(parse_timestamp("18/10/2026").is_err());
    }

    #[test]
    fn data_survives_reopening_the_store() {
        let dir = std::env::temp_dir().join(format!("ledger-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reopen.db");
        let _ = std::fs::remove_file(&path);

        let alice = SQLiteStorage::new(Connection::open(&path).unwrap())
            .unwrap()
            .create_user(NewUser {
                username: "alice".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            })
            .unwrap();

        let reopened = SQLiteStorage::new(Connection::open(&path).unwrap()).unwrap();
        assert_eq!(reopened.get_user_by_username("alice"), Ok(Some(alice)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
