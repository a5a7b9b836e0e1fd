//! Helpers for turning constraint violations into client errors.

use sqlx::error::DatabaseError;

fn database_error(err: &sqlx::Error) -> Option<&dyn DatabaseError> {
    match err {
        sqlx::Error::Database(db_err) => Some(db_err.as_ref()),
        _ => None,
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_foreign_key_violation())
}

/// Name of the violated constraint or index, when the driver reports one.
pub fn constraint_name(err: &sqlx::Error) -> Option<&str> {
    database_error(err).and_then(|e| e.constraint())
}
