//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The name a user logs in with.
///
/// Surrounding whitespace is removed and the remaining text must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a username from user input.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyUsername] if `raw_username` is empty or only whitespace.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(Error::EmptyUsername);
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without trimming or checking it.
    ///
    /// The caller should ensure the string is a valid username, e.g. because
    /// it was read from the database.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if another user already has `username`.
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    username: Username,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (username.as_ref(), password_hash.as_ref()),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 2067 => {
                Error::DuplicateUsername(username.to_string())
            }
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `username`.
///
/// The lookup is exact, so `username` should already be trimmed.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no user with `user_id`.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id,
        username: Username::new_unchecked(&raw_username),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

#[cfg(test)]
mod username_tests {
    use crate::{Error, auth::Username};

    #[test]
    fn new_trims_whitespace() {
        let username = Username::new("  alice \n").unwrap();

        assert_eq!(username.as_ref(), "alice");
    }

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(Username::new(""), Err(Error::EmptyUsername));
        assert_eq!(Username::new(" \t "), Err(Error::EmptyUsername));
    }
}
