use thiserror::Error;

/// Error type for workline operations.
///
/// `Clone` because a stored failure may be observed by any number of
/// broadcast readers, each of which receives its own copy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The writer side of a promise was dropped without ever
    /// supplying a value or a failure.
    #[error("promise dropped before a value was set")]
    BrokenPromise,

    /// A value or failure was set on a promise that had already
    /// been fulfilled.
    #[error("promise was already set")]
    PromiseAlreadySet,

    /// The task queue was stopped before this task could run.
    #[error("task queue stopped before the task ran")]
    QueueStopped,

    /// The task's work function panicked.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// A task queue was created with zero worker threads.
    #[error("task queue requires at least one worker thread")]
    NoWorkers,
}

/// Result type alias for workline operations.
pub type Result<T> = std::result::Result<T, Error>;
