//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::StoreError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    App(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("no category matches '{0}'")]
    UnknownRef(String),

    #[error("hierarchy check found {0} issue(s)")]
    Unhealthy(usize),

    #[error("render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::App(e.into())
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::App(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::UnknownRef(_) => exitcode::NOINPUT,
            CliError::Unhealthy(_) => exitcode::DATAERR,
            CliError::Output(_) => exitcode::SOFTWARE,
            CliError::Io(_) => exitcode::IOERR,
            CliError::App(e) => match e {
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::Store(_) => exitcode::IOERR,
                ApplicationError::Domain(d) => match d {
                    DomainError::NotFound(_) => exitcode::NOINPUT,
                    DomainError::CorruptedHierarchy { .. } => exitcode::SOFTWARE,
                    _ => exitcode::DATAERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoryId;

    #[test]
    fn given_domain_errors_when_mapping_then_sysexits_codes() {
        let id = CategoryId::new();
        assert_eq!(CliError::from(DomainError::NotFound(id)).exit_code(), exitcode::NOINPUT);
        assert_eq!(CliError::from(DomainError::SelfParent(id)).exit_code(), exitcode::DATAERR);
        assert_eq!(
            CliError::from(DomainError::CorruptedHierarchy {
                start: id,
                max_depth: 3
            })
            .exit_code(),
            exitcode::SOFTWARE
        );
        assert_eq!(
            CliError::from(StoreError::Unavailable("down".into())).exit_code(),
            exitcode::IOERR
        );
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
        assert_eq!(CliError::UnknownRef("x".into()).exit_code(), exitcode::NOINPUT);
    }
}
