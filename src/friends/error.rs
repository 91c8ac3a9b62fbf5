//! Error taxonomy for relationship operations
//!
//! Every variant is recoverable and reported to the caller as a structured
//! failure; none is fatal to the process.

use hyper::StatusCode;

/// Failures of the relationship state machine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendError {
    #[error("Invalid sender or receiver type: {0}")]
    InvalidKind(String),

    #[error("Cannot send friend request to yourself")]
    SelfRequest,

    #[error("Friend request already sent")]
    DuplicateRequest,

    #[error("Already friends")]
    AlreadyConnected,

    #[error("Sender not found")]
    SenderNotFound,

    #[error("Receiver not found")]
    ReceiverNotFound,

    #[error("Friend request not found")]
    RequestNotFound,

    #[error("Storage error: {0}")]
    Store(String),
}

impl FriendError {
    /// HTTP status code for the API envelope
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidKind(_)
            | Self::SelfRequest
            | Self::DuplicateRequest
            | Self::AlreadyConnected => StatusCode::BAD_REQUEST,
            Self::SenderNotFound | Self::ReceiverNotFound | Self::RequestNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
