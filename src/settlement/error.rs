use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cooperative cancellation observed. A clean exit, not a failure; the
    /// runner maps it to the CANCELED status.
    #[error("job canceled")]
    Canceled,

    /// The job row carries no date range. Jobs are only ever created with
    /// one, so this is a caller bug and fails the job.
    #[error("job has no date range")]
    MissingDateRange,

    #[error("job queue closed")]
    QueueClosed,

    #[error("aggregation worker panicked")]
    WorkerPanicked,
}
