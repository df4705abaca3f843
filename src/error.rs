use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("failed to start database runtime")]
    Runtime(#[from] std::io::Error),
    #[error("DATABASE_URL is not set; pass --database-url or use --dry-run")]
    MissingDatabaseUrl,
    #[error("invalid table name '{0}'")]
    InvalidTable(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to connect to the database")]
    Connect(#[source] StoreError),
    #[error("failed to begin transaction")]
    Begin(#[source] StoreError),
    #[error("failed to insert chunk {chunk} of {chunks}")]
    Insert {
        chunk: usize,
        chunks: usize,
        #[source]
        source: StoreError,
    },
    #[error("failed to commit transaction")]
    Commit(#[source] StoreError),
    #[error("rollback failed after: {original}")]
    Rollback {
        original: Box<LoadError>,
        #[source]
        source: StoreError,
    },
}
