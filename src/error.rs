//! Error types for the courier library
//!
//! All errors surface at construction time; the message fast paths have no
//! error conditions. `try_*` operations report a failed attempt through
//! their boolean/`Option` return value, and `spin_*` operations cannot fail
//! by contract.

use thiserror::Error;

/// Result type alias for courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

/// Errors that can occur while constructing inboxes and nodes
#[derive(Debug, Error)]
pub enum CourierError {
    /// Inbox capacity was not a power of two greater than one
    #[error("inbox capacity must be a power of two >= 2 (got {0})")]
    InvalidCapacity(usize),

    /// The slot buffer could not be allocated
    #[error("inbox slot buffer allocation failed")]
    AllocationFailed,

    /// A node was constructed with no inboxes
    #[error("node must bundle at least one inbox")]
    EmptyNode,

    /// The same inbox handle appeared twice in one node
    #[error("node contains the same inbox twice (position {0})")]
    DuplicateInbox(usize),

    /// A typed view was requested for an inbox with a different payload size
    #[error("message type size {actual} does not match inbox message size {expected}")]
    MessageSizeMismatch {
        /// Payload size the inbox was created with
        expected: usize,
        /// Size of the requested message type
        actual: usize,
    },
}
