//! Code for creating the user table and fetching users from the database.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// The password hash stored for accounts created through an OAuth provider.
///
/// These accounts never log in with a password, the column is only filled so
/// that it is never empty.
pub const OAUTH_PASSWORD_SENTINEL: &str = "google_oauth_user";

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

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email, unique across all users.
    pub email: String,
    /// The user's display name, if the OAuth provider supplied one.
    pub name: Option<String>,
    /// A URL to the user's profile picture.
    pub avatar_url: Option<String>,
    /// Free-form user preferences, a JSON object.
    pub preferences: Value,
    /// The user's password hash, [OAUTH_PASSWORD_SENTINEL] for OAuth accounts.
    pub password_hash: String,
}

/// The data needed to insert a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's email, must not belong to an existing user.
    pub email: String,
    /// The user's display name.
    pub name: Option<String>,
    /// A URL to the user's profile picture.
    pub avatar_url: Option<String>,
    /// Free-form user preferences.
    pub preferences: Value,
    /// The user's password hash.
    pub password_hash: String,
}

impl NewUser {
    /// A user created from an OAuth profile.
    ///
    /// Empty display names and avatar URLs are stored as absent and the
    /// preferences start as an empty JSON object.
    pub fn from_oauth(email: &str, name: &str, avatar_url: &str) -> Self {
        Self {
            email: email.to_owned(),
            name: non_empty(name),
            avatar_url: non_empty(avatar_url),
            preferences: Value::Object(Default::default()),
            password_hash: OAUTH_PASSWORD_SENTINEL.to_owned(),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Handles the creation and retrieval of users.
///
/// Implementations must return [Error::NotFound] when no user matches, so
/// that callers can tell a missing user apart from a failing store.
pub trait UserStore: Send + Sync {
    /// Get a user by their ID.
    fn get_user_by_id(&self, id: UserID) -> Result<User, Error>;

    /// Get a user by their email.
    fn get_user_by_email(&self, email: &str) -> Result<User, Error>;

    /// Create a new user and return it with its assigned ID.
    fn create_user(&self, user: NewUser) -> Result<User, Error>;
}

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store over a shared connection.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    fn get_user_by_id(&self, id: UserID) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_id(id, &connection)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection
            .prepare("SELECT id, email, name, avatar_url, preferences, password FROM user WHERE email = ?1")?
            .query_row([email], map_user_row)
            .optional()?
            .ok_or(Error::NotFound)
    }

    fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(user, &connection)
    }
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
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                avatar_url TEXT,
                preferences TEXT NOT NULL DEFAULT '{}',
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
/// Returns [Error::DuplicateEmail] if the email is taken, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, name, avatar_url, preferences, password) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &user.email,
            &user.name,
            &user.avatar_url,
            &user.preferences,
            &user.password_hash,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: user.email,
        name: user.name,
        avatar_url: user.avatar_url,
        preferences: user.preferences,
        password_hash: user.password_hash,
    })
}

/// Get the user from the database that has the specified `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn get_user_by_id(id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, name, avatar_url, preferences, password FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &id.as_i64())], map_user_row)
        .map_err(Error::from)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let preferences: Option<Value> = row.get(4)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        avatar_url: row.get(3)?,
        preferences: preferences.unwrap_or_else(|| Value::Object(Default::default())),
        password_hash: row.get(5)?,
    })
}

#[cfg(test)]
mod user_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        Error,
        db::initialize,
        user::{NewUser, OAUTH_PASSWORD_SENTINEL, SQLiteUserStore, UserID, UserStore},
    };

    fn get_store() -> SQLiteUserStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteUserStore::new(Arc::new(Mutex::new(connection)))
    }

    #[test]
    fn create_user_assigns_id_and_defaults() {
        let store = get_store();

        let user = store
            .create_user(NewUser::from_oauth("jane@example.com", "Jane", ""))
            .unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name.as_deref(), Some("Jane"));
        assert_eq!(user.avatar_url, None);
        assert_eq!(user.preferences, json!({}));
        assert_eq!(user.password_hash, OAUTH_PASSWORD_SENTINEL);
    }

    #[test]
    fn get_user_by_id_returns_created_user() {
        let store = get_store();
        let want = store
            .create_user(NewUser::from_oauth(
                "jane@example.com",
                "Jane",
                "https://example.com/jane.png",
            ))
            .unwrap();

        let got = store.get_user_by_id(want.id).unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_user_by_email_returns_created_user() {
        let store = get_store();
        let want = store
            .create_user(NewUser::from_oauth("jane@example.com", "", ""))
            .unwrap();

        let got = store.get_user_by_email("jane@example.com").unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn missing_user_is_not_found() {
        let store = get_store();

        assert_eq!(store.get_user_by_id(UserID::new(42)), Err(Error::NotFound));
        assert_eq!(
            store.get_user_by_email("nobody@example.com"),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = get_store();
        store
            .create_user(NewUser::from_oauth("jane@example.com", "", ""))
            .unwrap();

        let result = store.create_user(NewUser::from_oauth("jane@example.com", "Other", ""));

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn preferences_round_trip_as_json() {
        let store = get_store();
        let mut new_user = NewUser::from_oauth("jane@example.com", "", "");
        new_user.preferences = json!({"currency": "NZD", "darkMode": true});

        let created = store.create_user(new_user).unwrap();
        let got = store.get_user_by_id(created.id).unwrap();

        assert_eq!(got.preferences, json!({"currency": "NZD", "darkMode": true}));
    }
}
