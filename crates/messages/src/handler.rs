//! Capabilities the embedder supplies to the coordinator.

use std::fmt;

use crate::animator::Animator;
use crate::position::Position;
use crate::state::MessageIdentifier;

/// Single-shot deferred step.
///
/// Handed to collaborators that decide when work may proceed. Resuming
/// consumes the continuation, so it runs at most once; dropping it abandons
/// the step.
pub struct Continuation(Box<dyn FnOnce()>);

impl Continuation {
	pub fn new(step: impl FnOnce() + 'static) -> Self {
		Self(Box::new(step))
	}

	/// Runs the deferred step.
	pub fn resume(self) {
		(self.0)();
	}
}

impl fmt::Debug for Continuation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Continuation")
	}
}

/// Why the queue dropped a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
	/// The user accepted the primary action.
	PrimaryAction,
	/// The user chose a secondary action.
	SecondaryAction,
	/// The auto-dismiss timer elapsed.
	Timer,
	/// The user swiped the message away.
	Gesture,
	/// The owning scope went away.
	ScopeDestroyed,
	/// The feature that enqueued it withdrew it.
	DismissedByFeature,
	#[default]
	Unknown,
}

/// View-side capability of one message.
pub trait MessageStateHandler {
	/// Builds an animation moving the view from `from` to `to`.
	///
	/// Must be safe to call again after a previous show animator was cancelled.
	fn show(&self, from: Position, to: Position) -> Box<dyn Animator>;

	/// Builds an animation hiding the view, or `None` when it is already
	/// hidden and nothing needs to play.
	fn hide(&self, from: Position, to: Position, animate: bool) -> Option<Box<dyn Animator>>;

	/// Identifier reported with stacking metrics.
	fn message_identifier(&self) -> MessageIdentifier;

	/// The queue dropped this message.
	fn on_dismissed(&self, _reason: DismissReason) {}
}

/// Lifecycle hooks around presentation.
pub trait MessageQueueDelegate {
	/// Called before the first message becomes visible. The delegate resumes
	/// `ready` once showing may begin, synchronously or later.
	fn on_start_showing(&self, ready: Continuation);

	/// Called once every message has been hidden.
	fn on_finish_hiding(&self);

	/// An animator set started.
	fn on_animation_start(&self) {}

	/// An animator set ended or was cancelled.
	fn on_animation_end(&self) {}
}

/// Container hosting the message views.
pub trait MessageContainer {
	/// Runs `task` exactly once after the container finished its initial
	/// layout pass, ahead of other layout-dependent work.
	fn run_after_initial_message_layout(&self, task: Continuation);
}
