use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use ledger_rs::{
    ExpenseType, NewExpense, NewUser, PasswordHash, SQLiteStorage, Storage, ValidatedPassword,
};

/// A utility for creating a test database for the REST API server of ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The name of the test user.
    #[arg(long, default_value = "test")]
    username: String,

    /// The password of the test user. Not checked for strength.
    #[arg(long, default_value = "test")]
    password: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let storage = SQLiteStorage::new(Connection::open(output_path)?)?;

    println!("Creating test user '{}'...", args.username);
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(&args.password),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = storage.create_user(NewUser {
        username: args.username,
        password_hash,
    })?;

    println!("Creating sample expenses...");
    let samples = [
        (350_000, "Salary", "Monthly pay", ExpenseType::Income),
        (120_000, "Rent", "", ExpenseType::Expense),
        (8_450, "Groceries", "Weekly shop", ExpenseType::Expense),
        (1_250, "Interest", "", ExpenseType::Income),
        (4_599, "Utilities", "Power bill", ExpenseType::Expense),
    ];
    for (amount, category, description, expense_type) in samples {
        storage.create_expense(
            user.id,
            NewExpense {
                amount,
                category: category.to_owned(),
                description: (!description.is_empty()).then(|| description.to_owned()),
                expense_type,
            },
        )?;
    }

    println!("Success!");

    Ok(())
}
