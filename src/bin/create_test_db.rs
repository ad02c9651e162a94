use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use pocketbook::{
    NewTransaction, PasswordHash, TransactionType, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// A utility for creating a test database for the pocketbook web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("demo@local.dev", password_hash, &conn)?;

    println!("Creating demo transactions...");

    let now = OffsetDateTime::now_utc();
    let demo_transactions = [
        ("Groceries", 150_000.0, TransactionType::Expense, "Food", 2),
        ("Salary", 5_000_000.0, TransactionType::Income, "Other", 1),
        ("Coffee", 45_000.0, TransactionType::Expense, "Food", 0),
    ];

    for (title, amount, kind, category, days_ago) in demo_transactions {
        let transaction = NewTransaction::new(title, amount, kind, category)?
            .created_at(now - Duration::days(days_ago));

        create_transaction(user.id, transaction, &conn)?;
    }

    println!("Success! Log in with demo@local.dev and the password 'test'.");

    Ok(())
}
