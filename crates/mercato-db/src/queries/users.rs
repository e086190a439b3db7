use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::models::{NewUser, UserRow};
use crate::Database;

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            insert_user(conn, user)?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }
}

pub(super) fn insert_user(conn: &Connection, user: &NewUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, role, first_name, last_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user.id,
            user.email,
            user.password_hash,
            user.role,
            user.first_name,
            user.last_name
        ],
    )?;
    Ok(())
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a compile-time constant at every call site, never user input.
    let sql = format!(
        "SELECT id, email, password_hash, role, first_name, last_name, created_at
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}
