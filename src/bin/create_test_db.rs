use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    NewExpense, PasswordHash, Username, ValidatedPassword, create_expense, create_user,
    initialize_db,
};

/// A utility for creating a test database for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Title, amount, category and how many days ago each sample expense was made.
const SAMPLE_EXPENSES: [(&str, f64, &str, i64); 12] = [
    ("Groceries", 1840.50, "Food", 1),
    ("Bus pass", 600.0, "Transport", 3),
    ("Dinner with friends", 1250.0, "Food", 6),
    ("Electricity bill", 2100.75, "Utilities", 9),
    ("Movie tickets", 480.0, "Entertainment", 12),
    ("Rent", 15000.0, "Rent", 20),
    ("Groceries", 2210.25, "Food", 33),
    ("Taxi", 350.0, "Transport", 36),
    ("Internet", 899.0, "Utilities", 40),
    ("Concert", 2500.0, "Entertainment", 44),
    ("Rent", 15000.0, "Rent", 50),
    ("Lunch", 320.0, "Food", 57),
];

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
    let user = create_user(Username::new("test")?, password_hash, &conn)?;

    println!("Creating sample expenses...");

    let today = OffsetDateTime::now_utc().date();

    for (title, amount, category, days_ago) in SAMPLE_EXPENSES {
        create_expense(
            NewExpense {
                title: title.to_owned(),
                amount,
                category: category.to_owned(),
                date: today - Duration::days(days_ago),
            },
            Some(user.id),
            &conn,
        )?;
    }

    println!("Success! Log in with the username \"test\" and password \"test\".");

    Ok(())
}
