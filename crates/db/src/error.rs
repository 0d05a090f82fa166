use equiplog_core::error::CoreError;

/// Errors from repository writes that validate their input first.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
