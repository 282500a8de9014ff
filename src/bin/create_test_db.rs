use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use budgetctl::{
    NewUser, SecretProvider, TOKEN_KEY_ENV, Transaction, TransactionType, create_transaction,
    create_user, initialize_db, issue_token,
};

/// A utility for creating a test database for the REST API server of budgetctl.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The hex encoded token key the server will use. If set, a session token
    /// for the test user is printed.
    #[arg(long, env = TOKEN_KEY_ENV, hide_env_values = true)]
    token_key: Option<String>,
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
    let user = create_user(
        NewUser::from_oauth("test@example.com", "Test User", ""),
        &conn,
    )?;

    println!("Creating test transactions...");
    let today = OffsetDateTime::now_utc().date();
    let samples = [
        (3200.0, TransactionType::Income, "Salary", "Income", vec!["work"]),
        (1450.0, TransactionType::Expense, "Rent", "Housing", vec!["fixed"]),
        (82.35, TransactionType::Expense, "Groceries", "Food", vec!["weekly"]),
        (4.5, TransactionType::Expense, "Coffee", "Food", vec!["treat", "work"]),
        (60.0, TransactionType::Expense, "Power bill", "Utilities", vec!["fixed"]),
    ];

    for (days_ago, (amount, kind, description, category, tags)) in samples.into_iter().enumerate()
    {
        create_transaction(
            Transaction::build(amount, kind)
                .date(today - Duration::days(days_ago as i64))
                .description(description)
                .category(category)
                .tags(tags.into_iter().map(str::to_owned).collect()),
            user.id,
            &conn,
        )?;
    }

    if let Some(token_key) = args.token_key {
        let secrets = SecretProvider::new(Some(token_key));
        let token = issue_token(user.id, &secrets)?;
        println!("Session token for {} (valid for 24 hours):\n{token}", user.email);
    }

    println!("Success!");

    Ok(())
}
