// ABOUTME: Custom error types for the migration console
// ABOUTME: Provides context-specific error variants with actionable messages

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigratorError {
    Connection(String),
    NotFound(String),
    Validation(String),
    AlreadyPolling(String),
    Migration(String),
}

impl fmt::Display for MigratorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MigratorError::Connection(msg) => write!(f, "Connection error: {}", msg),
            MigratorError::NotFound(msg) => write!(f, "Not found: {}", msg),
            MigratorError::Validation(msg) => write!(f, "Validation error: {}", msg),
            MigratorError::AlreadyPolling(key) => {
                write!(f, "Polling session '{}' is already active", key)
            }
            MigratorError::Migration(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for MigratorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_polling_names_the_key() {
        let err = MigratorError::AlreadyPolling("pv:my-plan".to_string());
        assert_eq!(
            err.to_string(),
            "Polling session 'pv:my-plan' is already active"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = MigratorError::NotFound("migplans/p1".to_string()).into();
        assert_eq!(
            err.downcast_ref::<MigratorError>(),
            Some(&MigratorError::NotFound("migplans/p1".to_string()))
        );
    }
}
