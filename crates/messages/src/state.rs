//! Message identity and queue-side state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::handler::MessageStateHandler;

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared reference to a message. The coordinator compares these by identity.
pub type MessageRef = Rc<MessageState>;

/// Stable identifier of a message kind, used to tag metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageIdentifier(pub u32);

impl fmt::Display for MessageIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Opaque key the queue uses to find a message again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKey(String);

impl MessageKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for MessageKey {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl From<String> for MessageKey {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Display for MessageKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Queue ordering class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	/// Shown in arrival order.
	#[default]
	Normal,
	/// Jumps ahead of every normal message.
	Urgent,
}

/// One pending or displayed message.
pub struct MessageState {
	id: u64,
	key: MessageKey,
	handler: Rc<dyn MessageStateHandler>,
	priority: Priority,
	active: Cell<bool>,
}

impl MessageState {
	/// Creates a normal-priority message.
	pub fn new(key: impl Into<MessageKey>, handler: Rc<dyn MessageStateHandler>) -> Self {
		Self {
			id: NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed),
			key: key.into(),
			handler,
			priority: Priority::Normal,
			active: Cell::new(false),
		}
	}

	/// Sets the queue priority.
	#[must_use]
	pub fn with_priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	/// Wraps the state in a shared reference.
	pub fn into_ref(self) -> MessageRef {
		Rc::new(self)
	}

	/// Process-unique id, used in logs.
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn key(&self) -> &MessageKey {
		&self.key
	}

	pub fn handler(&self) -> &Rc<dyn MessageStateHandler> {
		&self.handler
	}

	pub fn priority(&self) -> Priority {
		self.priority
	}

	/// Metrics identifier reported by the handler.
	pub fn identifier(&self) -> MessageIdentifier {
		self.handler.message_identifier()
	}

	/// True while the queue presents this message as a display candidate.
	pub fn is_active(&self) -> bool {
		self.active.get()
	}

	pub(crate) fn set_active(&self, active: bool) {
		self.active.set(active);
	}
}

impl fmt::Debug for MessageState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MessageState")
			.field("id", &self.id)
			.field("key", &self.key)
			.field("identifier", &self.identifier())
			.field("priority", &self.priority)
			.field("active", &self.active.get())
			.finish()
	}
}

/// Identity comparison of two optional messages.
pub fn same_message(a: Option<&MessageRef>, b: Option<&MessageRef>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => Rc::ptr_eq(a, b),
		_ => false,
	}
}
