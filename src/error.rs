use thiserror::Error;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_SCHEMA_MISSING: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum CkwError {
    #[error("database {db_path} has no '{table}' table; point SQLITE_PATH or --db-path at a database with the vendors schema")]
    SchemaMissing { table: String, db_path: String },

    #[error("interrupted after committing {committed} update(s); the uncommitted batch was discarded")]
    Interrupted { committed: usize },

    #[error("no vendor with id {id}")]
    RecordNotFound { id: i64 },

    #[error("invalid filter '{input}': {reason}")]
    InvalidFilter { input: String, reason: String },

    #[error("filter column '{column}' does not exist in the vendors table")]
    UnknownColumn { column: String },
}

impl CkwError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SchemaMissing { .. } => EXIT_SCHEMA_MISSING,
            Self::Interrupted { .. } => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Maps any error escaping a command onto the process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CkwError>())
        .map(CkwError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn exit_codes_follow_error_taxonomy() {
        let missing = anyhow::Error::new(CkwError::SchemaMissing {
            table: "vendors".to_string(),
            db_path: "providers.db".to_string(),
        });
        assert_eq!(exit_code_for(&missing), EXIT_SCHEMA_MISSING);

        let interrupted = anyhow::Error::new(CkwError::Interrupted { committed: 200 });
        assert_eq!(exit_code_for(&interrupted), EXIT_INTERRUPTED);

        let generic = anyhow::anyhow!("disk I/O error");
        assert_eq!(exit_code_for(&generic), EXIT_FAILURE);
    }

    #[test]
    fn exit_code_survives_added_context() {
        let result: Result<(), CkwError> = Err(CkwError::Interrupted { committed: 0 });
        let err = result.context("recompute aborted").unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INTERRUPTED);
    }
}
