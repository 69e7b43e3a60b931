//! Error types for queue operations.

use thiserror::Error;

use crate::state::MessageKey;

/// Errors returned by [`MessageQueueManager`](crate::queue::MessageQueueManager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
	/// A message with the same key is already queued.
	#[error("message '{0}' is already queued")]
	DuplicateKey(MessageKey),

	/// No queued message has this key.
	#[error("no queued message with key '{0}'")]
	UnknownKey(MessageKey),

	/// The suspension token was never issued or was already resumed.
	#[error("suspension token {0} is not outstanding")]
	UnknownSuspensionToken(u64),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
