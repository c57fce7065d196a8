//! Defines the expense model and the validation applied to new expenses.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, ExpenseID, UserID, money::to_minor_units};

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent.
    Expense,
}

impl ExpenseType {
    /// The name used for this type in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseType::Income => "Income",
            ExpenseType::Expense => "Expense",
        }
    }
}

impl Display for ExpenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ExpenseType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ExpenseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Income" => Ok(ExpenseType::Income),
            "Expense" => Ok(ExpenseType::Expense),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not an expense type").into(),
            )),
        }
    }
}

/// A single income or expense entry owned by one user.
///
/// Expenses are never modified after they are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense, assigned by the store.
    pub id: ExpenseID,
    /// The user that owns the expense.
    pub user_id: UserID,
    /// The amount of money in minor units (cents). Never negative.
    pub amount: i64,
    /// What the money was earned or spent on, e.g. "Groceries".
    pub category: String,
    /// An optional free-text note.
    pub description: Option<String>,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    /// When the expense was created, assigned by the store.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create an [Expense].
///
/// The store assigns the ID, owner and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The amount of money in minor units (cents).
    pub amount: i64,
    /// What the money was earned or spent on.
    pub category: String,
    /// An optional free-text note.
    pub description: Option<String>,
    /// Whether the money was earned or spent.
    pub expense_type: ExpenseType,
}

/// The expense data sent by a client, with the amount in major units (dollars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseForm {
    /// The amount of money in major units, e.g. `12.5` for $12.50.
    pub amount: f64,
    /// What the money was earned or spent on.
    pub category: String,
    /// An optional free-text note.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
}

impl ExpenseForm {
    /// Check the form and convert it into a [NewExpense].
    ///
    /// The amount is converted to minor units, `category` and `description`
    /// are trimmed, and a blank description becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if the amount is negative, not finite
    /// or too large, or [Error::EmptyCategory] if the category is blank.
    pub fn validate(self) -> Result<NewExpense, Error> {
        let amount = to_minor_units(self.amount)?;

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_owned);

        Ok(NewExpense {
            amount,
            category: category.to_owned(),
            description,
            expense_type: self.expense_type,
        })
    }
}

/// The current time in UTC truncated to whole milliseconds.
///
/// Creation times are truncated so that they survive a round trip through
/// the database and JSON unchanged.
pub(crate) fn now_utc_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        Error, UserID,
        expense::{Expense, ExpenseForm, ExpenseType, NewExpense, core::now_utc_millis},
    };

    fn form(amount: f64) -> ExpenseForm {
        ExpenseForm {
            amount,
            category: "Salary".to_owned(),
            description: None,
            expense_type: ExpenseType::Income,
        }
    }

    #[test]
    fn validate_converts_amount_to_cents() {
        let new_expense = form(12.5).validate().unwrap();

        assert_eq!(
            new_expense,
            NewExpense {
                amount: 1250,
                category: "Salary".to_owned(),
                description: None,
                expense_type: ExpenseType::Income,
            }
        );
    }

    #[test]
    fn validate_rejects_negative_amount() {
        let result = form(-5.0).validate();

        assert_eq!(result, Err(Error::InvalidAmount("must be zero or greater")));
    }

    #[test]
    fn validate_rejects_blank_category() {
        let mut form = form(1.0);
        form.category = "   ".to_owned();

        assert_eq!(form.validate(), Err(Error::EmptyCategory));
    }

    #[test]
    fn validate_drops_blank_description() {
        let mut blank = form(1.0);
        blank.description = Some("  ".to_owned());
        let mut padded = form(1.0);
        padded.description = Some(" Pay day ".to_owned());

        assert_eq!(blank.validate().unwrap().description, None);
        assert_eq!(
            padded.validate().unwrap().description,
            Some("Pay day".to_owned())
        );
    }

    #[test]
    fn form_deserialises_without_description() {
        let form: ExpenseForm = serde_json::from_value(json!({
            "amount": 12.5,
            "category": "Salary",
            "type": "Income",
        }))
        .unwrap();

        assert_eq!(form.description, None);
        assert_eq!(form.expense_type, ExpenseType::Income);
    }

    #[test]
    fn form_rejects_unknown_type() {
        let result = serde_json::from_value::<ExpenseForm>(json!({
            "amount": 12.5,
            "category": "Salary",
            "type": "Transfer",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn expense_serialises_with_camel_case_keys() {
        let expense = Expense {
            id: 1,
            user_id: UserID::new(2),
            amount: 1250,
            category: "Salary".to_owned(),
            description: None,
            expense_type: ExpenseType::Income,
            created_at: datetime!(2026-10-18 09:30:00.123 UTC),
        };

        let value = serde_json::to_value(&expense).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 1,
                "userId": 2,
                "amount": 1250,
                "category": "Salary",
                "description": null,
                "type": "Income",
                "createdAt": "2026-10-18T09:30:00.123Z",
            })
        );
    }

    #[test]
    fn now_has_millisecond_precision() {
        let now = now_utc_millis();

        assert_eq!(now.nanosecond() % 1_000_000, 0);
    }
}
