// src/db/users.rs
use crate::domain::actor::Role;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub creci: Option<String>,
}

/// Users are owned by the authentication collaborator; this insert exists for
/// dev tooling and tests.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: Option<&str>,
    role: Role,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into users (name, email, role, created_at) values (?, ?, ?, ?)",
        params![name, email, role, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert user failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user(conn: &Connection, user_id: i64) -> Result<Option<UserRow>, ServerError> {
    conn.query_row(
        "select id, name, email, role, creci from users where id = ?",
        params![user_id],
        |r| {
            Ok(UserRow {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
                role: r.get(3)?,
                creci: r.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}

/// Name of a user for human-readable history, if the user still exists.
pub fn user_name(conn: &Connection, user_id: i64) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "select name from users where id = ?",
        params![user_id],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user name failed: {e}")))
}
