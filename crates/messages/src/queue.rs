//! Priority queue that decides which messages the coordinator presents.
//!
//! The manager owns its coordinator. Every change to the queue, every
//! coordinator completion and every finished animator set re-derives the
//! candidates from the queue head, so multi-step transitions and requests
//! dropped while an animation played both catch up without caller help.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::animator::AnimatorSet;
use crate::config::MessagesConfig;
use crate::coordinator::{CoordinatorBuilder, MessageAnimationCoordinator, MessageSlots};
use crate::error::{QueueError, Result};
use crate::handler::DismissReason;
use crate::state::{MessageKey, MessageRef, Priority};

/// Outstanding [`MessageQueueManager::suspend`] call.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "the queue stays suspended until the token is passed to `resume`"]
pub struct SuspensionToken(u64);

impl SuspensionToken {
	pub fn id(&self) -> u64 {
		self.0
	}
}

#[derive(Default)]
struct QueueState {
	/// Urgent messages first, arrival order within a priority.
	messages: VecDeque<MessageRef>,
	suspensions: BTreeSet<u64>,
	next_token: u64,
	/// Messages last handed to the coordinator as candidates.
	active: Vec<MessageRef>,
}

impl QueueState {
	fn position(&self, key: &MessageKey) -> Option<usize> {
		self.messages.iter().position(|message| message.key() == key)
	}

	fn is_suspended(&self) -> bool {
		!self.suspensions.is_empty()
	}

	fn candidates(&self, stacking: bool) -> MessageSlots {
		if self.is_suspended() {
			return MessageSlots::empty();
		}
		let mut head = self.messages.iter().cloned();
		let front = head.next();
		let back = if stacking { head.next() } else { None };
		MessageSlots::new(front, back)
	}

	fn mark_active(&mut self, candidates: &MessageSlots) {
		for message in self.active.drain(..) {
			message.set_active(false);
		}
		for message in candidates.iter() {
			message.set_active(true);
			self.active.push(Rc::clone(message));
		}
	}
}

struct QueueInner {
	coordinator: MessageAnimationCoordinator,
	stacking: bool,
	state: RefCell<QueueState>,
}

impl QueueInner {
	/// Hands the current candidates to the coordinator.
	fn update(self: &Rc<Self>) {
		let (candidates, suspended) = {
			let mut state = self.state.borrow_mut();
			let candidates = state.candidates(self.stacking);
			state.mark_active(&candidates);
			(candidates, state.is_suspended())
		};

		let weak = Rc::downgrade(self);
		let on_finished = move || {
			if let Some(inner) = weak.upgrade() {
				inner.update();
			}
		};
		if self.stacking {
			self.coordinator
				.update_with_stacking(candidates, suspended, on_finished);
		} else {
			self.coordinator
				.update_without_stacking(candidates.front, suspended, on_finished);
		}
	}
}

/// Ordered message queue driving a [`MessageAnimationCoordinator`].
pub struct MessageQueueManager {
	inner: Rc<QueueInner>,
}

impl MessageQueueManager {
	/// Builds the coordinator from `builder` and presents messages in the mode
	/// `config` selects.
	pub fn new(builder: CoordinatorBuilder, config: &MessagesConfig) -> Self {
		let stacking = config.stacking;
		let inner = Rc::new_cyclic(|weak: &Weak<QueueInner>| {
			let weak = weak.clone();
			let coordinator = builder
				.before_start(move |set: &AnimatorSet| {
					let weak = weak.clone();
					set.add_end_listener(move || {
						if let Some(inner) = weak.upgrade() {
							inner.update();
						}
					});
				})
				.build();
			QueueInner {
				coordinator,
				stacking,
				state: RefCell::default(),
			}
		});
		Self { inner }
	}

	/// Queues `message` behind every message of equal or higher priority.
	pub fn enqueue(&self, message: MessageRef) -> Result<()> {
		{
			let mut state = self.inner.state.borrow_mut();
			if state.position(message.key()).is_some() {
				return Err(QueueError::DuplicateKey(message.key().clone()));
			}
			let at = match message.priority() {
				Priority::Urgent => state
					.messages
					.iter()
					.take_while(|queued| queued.priority() == Priority::Urgent)
					.count(),
				Priority::Normal => state.messages.len(),
			};
			tracing::debug!(
				message = message.id(),
				key = %message.key(),
				priority = ?message.priority(),
				position = at,
				"Enqueued message"
			);
			state.messages.insert(at, message);
		}
		self.inner.update();
		Ok(())
	}

	/// Removes the message with `key` and tells its handler why.
	///
	/// A displayed message is hidden; the next queued one follows.
	pub fn dismiss(&self, key: &MessageKey, reason: DismissReason) -> Result<MessageRef> {
		let removed = {
			let mut state = self.inner.state.borrow_mut();
			state
				.position(key)
				.and_then(|index| state.messages.remove(index))
		};
		let Some(message) = removed else {
			return Err(QueueError::UnknownKey(key.clone()));
		};
		tracing::debug!(message = message.id(), key = %key, ?reason, "Dismissed message");
		message.handler().on_dismissed(reason);
		self.inner.update();
		Ok(message)
	}

	/// Dismisses every queued message. Returns how many were removed.
	pub fn dismiss_all(&self, reason: DismissReason) -> usize {
		let removed: Vec<MessageRef> = self.inner.state.borrow_mut().messages.drain(..).collect();
		if removed.is_empty() {
			return 0;
		}
		tracing::debug!(count = removed.len(), ?reason, "Dismissed all messages");
		for message in &removed {
			message.handler().on_dismissed(reason);
		}
		self.inner.update();
		removed.len()
	}

	/// Hides every message until the returned token is resumed. Suspensions
	/// nest; the queue shows messages again once none is outstanding.
	pub fn suspend(&self) -> SuspensionToken {
		let token = {
			let mut state = self.inner.state.borrow_mut();
			state.next_token += 1;
			let token = state.next_token;
			state.suspensions.insert(token);
			token
		};
		tracing::debug!(token, "Suspended message queue");
		self.inner.update();
		SuspensionToken(token)
	}

	pub fn resume(&self, token: SuspensionToken) -> Result<()> {
		let still_suspended = {
			let mut state = self.inner.state.borrow_mut();
			if !state.suspensions.remove(&token.0) {
				return Err(QueueError::UnknownSuspensionToken(token.0));
			}
			state.is_suspended()
		};
		tracing::debug!(token = token.0, still_suspended, "Resumed message queue");
		self.inner.update();
		Ok(())
	}

	/// Messages the coordinator currently presents.
	pub fn displayed(&self) -> MessageSlots {
		self.inner.coordinator.current_displayed_messages()
	}

	pub fn coordinator(&self) -> &MessageAnimationCoordinator {
		&self.inner.coordinator
	}

	pub fn contains(&self, key: &MessageKey) -> bool {
		self.inner.state.borrow().position(key).is_some()
	}

	/// Queued messages in presentation order.
	pub fn queued(&self) -> Vec<MessageRef> {
		self.inner.state.borrow().messages.iter().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.inner.state.borrow().messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.state.borrow().messages.is_empty()
	}

	pub fn is_suspended(&self) -> bool {
		self.inner.state.borrow().is_suspended()
	}

	pub fn is_stacking(&self) -> bool {
		self.inner.stacking
	}
}

impl fmt::Debug for MessageQueueManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("MessageQueueManager")
			.field("stacking", &self.inner.stacking)
			.field("queued", &state.messages.len())
			.field("suspensions", &state.suspensions.len())
			.field("coordinator", &self.inner.coordinator)
			.finish()
	}
}
