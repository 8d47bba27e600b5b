use drt_records::{RecordsError, ReviewerId};

/// Failures reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("persistence collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to decode collaborator response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Dispatch-time checks on a reviewer selection, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("please select at least {required} reviewers")]
    TooFewReviewers { required: usize },
    #[error("please select a lead reviewer")]
    NoLeadDesignated,
    #[error("lead reviewer must be one of the selected reviewers")]
    LeadNotAmongSelected,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("records error: {0}")]
    Records(#[from] RecordsError),

    #[error("unknown draft field: {0}")]
    UnknownField(String),

    #[error("entry index {index} is out of range for a collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("step index {0} does not exist")]
    NoSuchStep(usize),

    #[error("the application can only be submitted from the review step")]
    NotAtReviewStep,

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("the application has already been submitted")]
    AlreadySubmitted,

    #[error("the collaborator did not confirm creation of the application")]
    NotCreated,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("application is {status}; reviewers can only be assigned to New applications")]
    NotAssignable { status: String },

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("please select a decision")]
    NoDecision,

    #[error(
        "assignment for reviewer {failed} failed after {count} record(s) were created \
         (rolled back: {rolled_back}): {source}",
        count = created.len()
    )]
    PartialAssignment {
        failed: ReviewerId,
        created: Vec<ReviewerId>,
        rolled_back: bool,
        #[source]
        source: StoreError,
    },

    #[error("persistence collaborator error: {0}")]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Lift a records error, surfacing unknown field paths as [`CoreError::UnknownField`].
    pub(crate) fn from_records(err: RecordsError) -> Self {
        match err {
            RecordsError::UnknownField(path) => CoreError::UnknownField(path),
            other => CoreError::Records(other),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
