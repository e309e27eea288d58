use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use travelmate_common::{Trip, TripInput, TripPatch};

use crate::models::{NewUser, User};

/// SQLite-backed store for accounts and trips.
pub struct Database {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Record not found")]
    NotFound,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Maps the users.email UNIQUE violation to [`StoreError::DuplicateEmail`].
fn user_write_error(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::DuplicateEmail
        }
        _ => StoreError::Database(e.to_string()),
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin";
const TRIP_COLUMNS: &str =
    "id, title, description, location, start_date, end_date, longitude, latitude, notes, user_id";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get::<_, i64>(4)? != 0,
    })
}

fn trip_from_row(row: &Row<'_>) -> rusqlite::Result<Trip> {
    Ok(Trip {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        longitude: row.get(6)?,
        latitude: row.get(7)?,
        notes: row.get(8)?,
        user_id: row.get(9)?,
    })
}

/// `?, ?, ?` with `n` placeholders.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Ids as SQL integers. Values beyond the rowid range match nothing and are dropped.
fn rowid_values(ids: &[u64]) -> Vec<Value> {
    ids.iter()
        .filter_map(|id| i64::try_from(*id).ok())
        .map(Value::Integer)
        .collect()
}

/// Escape LIKE wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl Database {
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::Io(e.to_string()))?;
                }
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS trips (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                start_date TEXT NOT NULL DEFAULT '',
                end_date TEXT NOT NULL DEFAULT '',
                longitude REAL NOT NULL DEFAULT 0,
                latitude REAL NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT '',
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_trips_user_id ON trips(user_id);",
        )?;

        tracing::info!("Database initialized at {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // ========== Users ==========

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Insert a user. The email UNIQUE constraint settles concurrent
    /// registrations of the same address.
    pub fn create_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)",
            params![
                new_user.name,
                new_user.email,
                new_user.password_hash,
                new_user.is_admin as i64
            ],
        )
        .map_err(user_write_error)?;

        Ok(User {
            id: conn.last_insert_rowid() as u64,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            is_admin: new_user.is_admin,
        })
    }

    /// Write every mutable column of an existing user.
    pub fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE users SET name = ?1, email = ?2, password_hash = ?3, is_admin = ?4 WHERE id = ?5",
                params![
                    user.name,
                    user.email,
                    user.password_hash,
                    user.is_admin as i64,
                    user.id
                ],
            )
            .map_err(user_write_error)?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Number of users with `email`, optionally ignoring one record.
    pub fn count_users_by_email(
        &self,
        email: &str,
        excluding_id: Option<u64>,
    ) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: u64 = match excluding_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
                params![email, id],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn count_users(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========== Trips ==========

    pub fn create_trip(&self, owner_id: u64, input: &TripInput) -> Result<Trip, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trips (title, description, location, start_date, end_date, longitude, latitude, notes, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                input.title,
                input.description,
                input.location,
                input.start_date,
                input.end_date,
                input.longitude,
                input.latitude,
                input.notes,
                owner_id
            ],
        )?;

        Ok(Trip {
            id: conn.last_insert_rowid() as u64,
            title: input.title.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            start_date: input.start_date.clone(),
            end_date: input.end_date.clone(),
            longitude: input.longitude,
            latitude: input.latitude,
            notes: input.notes.clone(),
            user_id: owner_id,
        })
    }

    pub fn get_trip(&self, id: u64) -> Result<Option<Trip>, StoreError> {
        let conn = self.conn()?;
        let trip = conn
            .query_row(
                &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"),
                params![id],
                trip_from_row,
            )
            .optional()?;
        Ok(trip)
    }

    /// Trips owned by `owner_id`, or every trip when `None`.
    pub fn list_trips(&self, owner_id: Option<u64>) -> Result<Vec<Trip>, StoreError> {
        let conn = self.conn()?;
        let trips = match owner_id {
            Some(owner) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TRIP_COLUMNS} FROM trips WHERE user_id = ?1 ORDER BY id"
                ))?;
                let rows = stmt.query_map(params![owner], trip_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {TRIP_COLUMNS} FROM trips ORDER BY id"))?;
                let rows = stmt.query_map([], trip_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(trips)
    }

    /// Replace the content of a trip. The owner is left unchanged.
    pub fn update_trip(&self, id: u64, input: &TripInput) -> Result<Trip, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE trips SET title = ?1, description = ?2, location = ?3, start_date = ?4,
                end_date = ?5, longitude = ?6, latitude = ?7, notes = ?8
             WHERE id = ?9",
            params![
                input.title,
                input.description,
                input.location,
                input.start_date,
                input.end_date,
                input.longitude,
                input.latitude,
                input.notes,
                id
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        let trip = conn.query_row(
            &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"),
            params![id],
            trip_from_row,
        )?;
        Ok(trip)
    }

    /// Returns false when no such trip exists.
    pub fn delete_trip(&self, id: u64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM trips WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Case-insensitive substring search over the descriptive trip fields.
    pub fn search_trips(&self, query: &str, owner_id: Option<u64>) -> Result<Vec<Trip>, StoreError> {
        let conn = self.conn()?;
        let pattern = like_pattern(query);

        let mut sql = format!(
            "SELECT {TRIP_COLUMNS} FROM trips
             WHERE (title LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
                OR location LIKE ?1 ESCAPE '\\' OR start_date LIKE ?1 ESCAPE '\\'
                OR end_date LIKE ?1 ESCAPE '\\')"
        );
        let mut values = vec![Value::Text(pattern)];
        if let Some(owner) = owner_id {
            sql.push_str(" AND user_id = ?2");
            values.push(Value::Integer(owner as i64));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let trips = stmt
            .query_map(params_from_iter(values.iter()), trip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trips)
    }

    /// Apply `patch` to the listed trips, restricted to `owner_id` when set.
    /// Returns the number of trips changed.
    pub fn bulk_update_trips(
        &self,
        ids: &[u64],
        patch: &TripPatch,
        owner_id: Option<u64>,
    ) -> Result<usize, StoreError> {
        let ids = rowid_values(ids);
        if ids.is_empty() || patch.is_empty() {
            return Ok(0);
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        let text_fields = [
            ("title", &patch.title),
            ("description", &patch.description),
            ("location", &patch.location),
            ("start_date", &patch.start_date),
            ("end_date", &patch.end_date),
            ("notes", &patch.notes),
        ];
        for (column, value) in text_fields {
            if let Some(v) = value {
                assignments.push(format!("{column} = ?"));
                values.push(Value::Text(v.clone()));
            }
        }
        for (column, value) in [("longitude", patch.longitude), ("latitude", patch.latitude)] {
            if let Some(v) = value {
                assignments.push(format!("{column} = ?"));
                values.push(Value::Real(v));
            }
        }

        let mut sql = format!(
            "UPDATE trips SET {} WHERE id IN ({})",
            assignments.join(", "),
            placeholders(ids.len())
        );
        values.extend(ids);
        if let Some(owner) = owner_id {
            sql.push_str(" AND user_id = ?");
            values.push(Value::Integer(owner as i64));
        }

        let conn = self.conn()?;
        let updated = conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(updated)
    }

    /// Delete the listed trips, restricted to `owner_id` when set.
    pub fn bulk_delete_trips(&self, ids: &[u64], owner_id: Option<u64>) -> Result<usize, StoreError> {
        let mut values = rowid_values(ids);
        if values.is_empty() {
            return Ok(0);
        }

        let mut sql = format!("DELETE FROM trips WHERE id IN ({})", placeholders(values.len()));
        if let Some(owner) = owner_id {
            sql.push_str(" AND user_id = ?");
            values.push(Value::Integer(owner as i64));
        }

        let conn = self.conn()?;
        let deleted = conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(deleted)
    }

    pub fn count_trips(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========== Maintenance ==========

    /// Delete every trip and every non-admin account in one transaction.
    /// Returns `(trips_deleted, users_deleted)`.
    pub fn reset(&self) -> Result<(usize, usize), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let trips = tx.execute("DELETE FROM trips", [])?;
        let users = tx.execute("DELETE FROM users WHERE is_admin = 0", [])?;
        tx.commit()?;
        Ok((trips, users))
    }
}
