//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row, ToSql, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, auth::UserID, summary::Period};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of an expense.
pub type ExpenseId = i64;

/// Money spent on something, e.g. "Lunch", ₹250 in "Food" on 2025-10-04.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// A short description of what the money was spent on.
    pub title: String,
    /// How much was spent, never negative.
    pub amount: f64,
    /// A free-form category name, e.g. "Food", "Travel" or "Bills".
    pub category: String,
    /// The day the money was spent.
    pub date: Date,
    /// The user that recorded the expense.
    ///
    /// `None` for expenses whose owner has been deleted.
    pub user_id: Option<UserID>,
}

/// The validated fields for creating or updating an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// A short description of what the money was spent on.
    pub title: String,
    /// How much was spent, never negative.
    pub amount: f64,
    /// A free-form category name.
    pub category: String,
    /// The day the money was spent.
    pub date: Date,
}

/// Which expenses to return from [query_expenses] and [sum_expenses].
///
/// Every field is optional, an empty filter matches every expense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Only match expenses whose title contains this text, ignoring case.
    pub title_query: Option<String>,
    /// Only match expenses in this exact category.
    pub category: Option<String>,
    /// Only match expenses dated within this month.
    pub period: Option<Period>,
    /// Only match expenses recorded by this user.
    pub owner: Option<UserID>,
}

impl ExpenseFilter {
    /// Build the SQL `WHERE` clause and its named parameters.
    fn where_clause(&self) -> (String, Vec<(&'static str, Box<dyn ToSql>)>) {
        let mut conditions = Vec::new();
        let mut parameters: Vec<(&'static str, Box<dyn ToSql>)> = Vec::new();

        if let Some(title_query) = &self.title_query {
            conditions.push("title LIKE :title ESCAPE '\\'");
            parameters.push((":title", Box::new(format!("%{}%", escape_like(title_query)))));
        }

        if let Some(category) = &self.category {
            conditions.push("category = :category");
            parameters.push((":category", Box::new(category.clone())));
        }

        if let Some(period) = self.period {
            let (first_day, last_day) = period.date_range();
            conditions.push("date BETWEEN :first_day AND :last_day");
            parameters.push((":first_day", Box::new(first_day)));
            parameters.push((":last_day", Box::new(last_day)));
        }

        if let Some(owner) = self.owner {
            conditions.push("user_id = :user_id");
            parameters.push((":user_id", Box::new(owner.as_i64())));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (clause, parameters)
    }
}

/// Escape the wildcard characters of a SQL `LIKE` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }

        escaped.push(c);
    }

    escaped
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                user_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the list filters and the monthly summary.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
        (),
    )?;

    Ok(())
}

/// Insert a new expense recorded by `owner`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_expense(
    expense: NewExpense,
    owner: Option<UserID>,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (title, amount, category, date, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, title, amount, category, date, user_id",
        )?
        .query_row(
            params![
                expense.title,
                expense.amount,
                expense.category,
                expense.date,
                owner.map(|user_id| user_id.as_i64()),
            ],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, title, amount, category, date, user_id FROM expense WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Replace the fields of the expense with `id`.
///
/// The owner of the expense is not changed.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET title = ?1, amount = ?2, category = ?3, date = ?4 WHERE id = ?5",
        params![
            expense.title,
            expense.amount,
            expense.category,
            expense.date,
            id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// Delete the expense with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Get the expenses matching `filter`, newest first.
///
/// Expenses on the same day are ordered by ID, most recently created first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn query_expenses(
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (where_clause, parameters) = filter.where_clause();
    let query = format!(
        "SELECT id, title, amount, category, date, user_id FROM expense {where_clause}
         ORDER BY date DESC, id DESC"
    );
    let parameters = parameters
        .iter()
        .map(|(name, value)| (*name, value.as_ref()))
        .collect::<Vec<_>>();

    connection
        .prepare(&query)?
        .query_map(parameters.as_slice(), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the total amount of the expenses matching `filter`.
///
/// Returns zero if no expenses match.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_expenses(filter: &ExpenseFilter, connection: &Connection) -> Result<f64, Error> {
    let (where_clause, parameters) = filter.where_clause();
    let query = format!("SELECT COALESCE(SUM(amount), 0.0) FROM expense {where_clause}");
    let parameters = parameters
        .iter()
        .map(|(name, value)| (*name, value.as_ref()))
        .collect::<Vec<_>>();

    connection
        .query_row(&query, parameters.as_slice(), |row| row.get(0))
        .map_err(Error::from)
}

/// Get the distinct categories in use, sorted alphabetically.
///
/// `owner` restricts the categories to the expenses recorded by that user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_categories(
    owner: Option<UserID>,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    let filter = ExpenseFilter {
        owner,
        ..Default::default()
    };
    let (where_clause, parameters) = filter.where_clause();
    let query = format!("SELECT DISTINCT category FROM expense {where_clause} ORDER BY category");
    let parameters = parameters
        .iter()
        .map(|(name, value)| (*name, value.as_ref()))
        .collect::<Vec<_>>();

    connection
        .prepare(&query)?
        .query_map(parameters.as_slice(), |row| row.get(0))?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let user_id: Option<i64> = row.get(5)?;

    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        date: row.get(4)?,
        user_id: user_id.map(UserID::new),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::{PasswordHash, UserID, Username, create_user},
        db::initialize,
        summary::Period,
    };

    use super::{
        ExpenseFilter, NewExpense, create_expense, delete_expense, get_categories, get_expense,
        query_expenses, sum_expenses, update_expense,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(username: &str, conn: &Connection) -> UserID {
        create_user(
            Username::new_unchecked(username),
            PasswordHash::new_unchecked("hunter2"),
            conn,
        )
        .unwrap()
        .id
    }

    fn new_expense(title: &str, amount: f64, category: &str, date: time::Date) -> NewExpense {
        NewExpense {
            title: title.to_owned(),
            amount,
            category: category.to_owned(),
            date,
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);

        let expense = create_expense(
            new_expense("Lunch", 250.0, "Food", date!(2025 - 10 - 04)),
            Some(user_id),
            &conn,
        )
        .unwrap();

        assert!(expense.id > 0);
        assert_eq!(expense.title, "Lunch");
        assert_eq!(expense.amount, 250.0);
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.date, date!(2025 - 10 - 04));
        assert_eq!(expense.user_id, Some(user_id));
        assert_eq!(get_expense(expense.id, &conn), Ok(expense));
    }

    #[test]
    fn get_missing_expense_fails() {
        let conn = get_test_connection();

        assert_eq!(get_expense(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_replaces_fields_and_keeps_owner() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let expense = create_expense(
            new_expense("Lunch", 250.0, "Food", date!(2025 - 10 - 04)),
            Some(user_id),
            &conn,
        )
        .unwrap();
        let update = new_expense("Train", 80.5, "Travel", date!(2025 - 10 - 05));

        update_expense(expense.id, &update, &conn).unwrap();

        let got = get_expense(expense.id, &conn).unwrap();
        assert_eq!(got.title, "Train");
        assert_eq!(got.amount, 80.5);
        assert_eq!(got.category, "Travel");
        assert_eq!(got.date, date!(2025 - 10 - 05));
        assert_eq!(got.user_id, Some(user_id));
    }

    #[test]
    fn update_missing_expense_fails() {
        let conn = get_test_connection();
        let update = new_expense("Train", 80.5, "Travel", date!(2025 - 10 - 05));

        assert_eq!(
            update_expense(7, &update, &conn),
            Err(Error::UpdateMissingExpense)
        );
    }

    #[test]
    fn delete_removes_expense() {
        let conn = get_test_connection();
        let expense = create_expense(
            new_expense("Lunch", 250.0, "Food", date!(2025 - 10 - 04)),
            None,
            &conn,
        )
        .unwrap();

        delete_expense(expense.id, &conn).unwrap();

        assert_eq!(get_expense(expense.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_expense(expense.id, &conn),
            Err(Error::DeleteMissingExpense)
        );
    }

    #[test]
    fn deleting_user_keeps_their_expenses() {
        let conn = get_test_connection();
        let user_id = create_test_user("alice", &conn);
        let expense = create_expense(
            new_expense("Lunch", 250.0, "Food", date!(2025 - 10 - 04)),
            Some(user_id),
            &conn,
        )
        .unwrap();

        conn.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])
            .unwrap();

        assert_eq!(get_expense(expense.id, &conn).unwrap().user_id, None);
    }

    #[test]
    fn query_orders_by_date_then_id_descending() {
        let conn = get_test_connection();
        let first = create_expense(
            new_expense("A", 1.0, "Food", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();
        let second = create_expense(
            new_expense("B", 2.0, "Food", date!(2025 - 10 - 03)),
            None,
            &conn,
        )
        .unwrap();
        let third = create_expense(
            new_expense("C", 3.0, "Food", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();

        let got = query_expenses(&ExpenseFilter::default(), &conn).unwrap();

        assert_eq!(got, vec![second, third, first]);
    }

    #[test]
    fn query_filters_by_title_ignoring_case() {
        let conn = get_test_connection();
        create_expense(
            new_expense("Morning Coffee", 120.0, "Food", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();
        create_expense(
            new_expense("Bus ticket", 30.0, "Travel", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();

        let got = query_expenses(
            &ExpenseFilter {
                title_query: Some("coffee".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "Morning Coffee");
    }

    #[test]
    fn title_query_treats_wildcards_literally() {
        let conn = get_test_connection();
        create_expense(
            new_expense("100% juice", 90.0, "Food", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();
        create_expense(
            new_expense("1000 rupee note", 1000.0, "Bills", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();

        let got = query_expenses(
            &ExpenseFilter {
                title_query: Some("0%".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].title, "100% juice");
    }

    #[test]
    fn query_filters_by_category_period_and_owner() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        let bob = create_test_user("bob", &conn);
        let want = create_expense(
            new_expense("Dinner", 500.0, "Food", date!(2025 - 03 - 31)),
            Some(alice),
            &conn,
        )
        .unwrap();
        // Wrong category, month, year and owner respectively.
        for (category, date, owner) in [
            ("Bills", date!(2025 - 03 - 10), alice),
            ("Food", date!(2025 - 04 - 01), alice),
            ("Food", date!(2024 - 03 - 15), alice),
            ("Food", date!(2025 - 03 - 15), bob),
        ] {
            create_expense(new_expense("Other", 1.0, category, date), Some(owner), &conn).unwrap();
        }

        let filter = ExpenseFilter {
            title_query: None,
            category: Some("Food".to_owned()),
            period: Some(Period::new(3, 2025).unwrap()),
            owner: Some(alice),
        };

        assert_eq!(query_expenses(&filter, &conn).unwrap(), vec![want]);
        assert_eq!(sum_expenses(&filter, &conn).unwrap(), 500.0);
    }

    #[test]
    fn sum_of_no_expenses_is_zero() {
        let conn = get_test_connection();

        assert_eq!(sum_expenses(&ExpenseFilter::default(), &conn).unwrap(), 0.0);
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let conn = get_test_connection();
        let alice = create_test_user("alice", &conn);
        for category in ["Travel", "Food", "Bills", "Food"] {
            create_expense(
                new_expense("x", 1.0, category, date!(2025 - 10 - 01)),
                Some(alice),
                &conn,
            )
            .unwrap();
        }
        create_expense(
            new_expense("x", 1.0, "Rent", date!(2025 - 10 - 01)),
            None,
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_categories(None, &conn).unwrap(),
            vec!["Bills", "Food", "Rent", "Travel"]
        );
        assert_eq!(
            get_categories(Some(alice), &conn).unwrap(),
            vec!["Bills", "Food", "Travel"]
        );
    }
}
