//! Expense reports: totals for a list of expenses and the page layout of the
//! PDF report built from them.
//!
//! The layout is computed up front, independent of any PDF library. The
//! "Page N of M" footers are added while rendering, once the number of
//! physical pages is known.

mod pdf;

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Expense, ExpenseType, money::format_minor_units};

pub use pdf::{DEFAULT_REPORT_FONT_FAMILY, ReportFonts, render_pdf};

/// The title printed at the top of every report.
pub const REPORT_TITLE: &str = "Expense Report";
/// The column headings of the transaction table.
pub const TABLE_HEADINGS: [&str; 5] = ["Date", "Type", "Category", "Description", "Amount"];
/// How many table rows fit on the first page, below the title and summary.
pub const FIRST_PAGE_ROWS: usize = 20;
/// How many table rows fit on every page after the first.
pub const PAGE_ROWS: usize = 32;
/// Longer categories are cut short. The PDF renderer may shorten them further
/// to fit their column.
pub const MAX_CATEGORY_CHARS: usize = 24;
/// Longer descriptions are cut short. The PDF renderer may shorten them
/// further to fit their column.
pub const MAX_DESCRIPTION_CHARS: usize = 40;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

/// Income, expense and net totals in minor units.
///
/// Totals are `i128` so that no number of valid amounts can overflow them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// The sum of all income amounts.
    pub total_income: i128,
    /// The sum of all expense amounts.
    pub total_expense: i128,
    /// `total_income - total_expense`.
    pub net_balance: i128,
}

impl Summary {
    /// Total up `expenses` in a single pass.
    ///
    /// An empty list gives zero for every total.
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let (total_income, total_expense) =
            expenses
                .iter()
                .fold((0_i128, 0_i128), |(income, spent), expense| {
                    let amount = i128::from(expense.amount);
                    match expense.expense_type {
                        ExpenseType::Income => (income + amount, spent),
                        ExpenseType::Expense => (income, spent + amount),
                    }
                });

        Self {
            total_income,
            total_expense,
            net_balance: total_income - total_expense,
        }
    }

    /// The summary lines printed under the report title.
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Total Income: {}", format_minor_units(self.total_income)),
            format!("Total Expenses: {}", format_minor_units(self.total_expense)),
            format!("Net Balance: {}", format_minor_units(self.net_balance)),
        ]
    }
}

/// One row of the transaction table, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// The day the expense was created, e.g. "2026-10-18".
    pub date: String,
    /// "Income" or "Expense".
    pub expense_type: String,
    /// The expense category.
    pub category: String,
    /// The description, or an empty string if there is none.
    pub description: String,
    /// The amount in dollars, e.g. "$12.50".
    pub amount: String,
}

impl ReportRow {
    fn new(expense: &Expense) -> Self {
        Self {
            date: format_or_empty(expense.created_at, DATE_FORMAT),
            expense_type: expense.expense_type.to_string(),
            category: truncate(&expense.category, MAX_CATEGORY_CHARS),
            description: truncate(
                expense.description.as_deref().unwrap_or_default(),
                MAX_DESCRIPTION_CHARS,
            ),
            amount: format_minor_units(expense.amount.into()),
        }
    }

    /// The cells of the row in the same order as [TABLE_HEADINGS].
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.date,
            &self.expense_type,
            &self.category,
            &self.description,
            &self.amount,
        ]
    }
}

/// The rows that start on a new page of the report, below a repeated table
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    /// The table rows on this page.
    pub rows: Vec<ReportRow>,
}

/// A report laid out into pages, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseReport {
    /// The report title.
    pub title: String,
    /// When the report was generated, e.g. "Generated on 2026-10-18 09:30 UTC".
    pub generated_on: String,
    /// The totals over every expense in the report.
    pub summary: Summary,
    /// The planned pages of the report. There is always at least one page.
    /// The first page also carries the title and summary.
    pub pages: Vec<ReportPage>,
}

impl ExpenseReport {
    /// Lay out a report for `expenses`, keeping the order they are given in.
    pub fn new(expenses: &[Expense], generated_at: OffsetDateTime) -> Self {
        let rows: Vec<ReportRow> = expenses.iter().map(ReportRow::new).collect();

        let mut chunks = Vec::new();
        let (first, mut rest) = rows.split_at(rows.len().min(FIRST_PAGE_ROWS));
        chunks.push(first);
        while !rest.is_empty() {
            let (page, remaining) = rest.split_at(rest.len().min(PAGE_ROWS));
            chunks.push(page);
            rest = remaining;
        }

        let pages = chunks
            .into_iter()
            .map(|rows| ReportPage {
                rows: rows.to_vec(),
            })
            .collect();

        Self {
            title: REPORT_TITLE.to_owned(),
            generated_on: format!(
                "Generated on {}",
                format_or_empty(generated_at, DATE_TIME_FORMAT)
            ),
            summary: Summary::from_expenses(expenses),
            pages,
        }
    }

    /// The number of table rows across all pages.
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|page| page.rows.len()).sum()
    }
}

/// The footer printed at the bottom of page `page` (counting from 1).
pub fn page_footer(page: usize, page_count: usize) -> String {
    format!("Page {page} of {page_count}")
}

fn format_or_empty(date_time: OffsetDateTime, format: &[BorrowedFormatItem]) -> String {
    date_time
        .to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_else(|error| {
            tracing::error!("Could not format {date_time} for the report: {error}");
            String::new()
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
