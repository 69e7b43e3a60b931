//! Message presentation coordinator.
//!
//! [`MessageAnimationCoordinator`] owns the visible-message state and the one
//! active [`AnimatorSet`]. Callers hand it the message(s) that should be
//! visible; it diffs them against what is displayed, picks the animation and
//! reports completion through a callback.
//!
//! Collaborators may call back into the coordinator synchronously (a delegate
//! resuming `on_start_showing` inline, a runtime ending a set from inside the
//! start callback, a completion callback issuing the next update). No borrow
//! of coordinator state is held across any such call, and every deferred step
//! re-validates against a generation counter before acting.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::animator::{Animator, AnimatorSet};
use crate::handler::{Continuation, MessageContainer, MessageQueueDelegate};
use crate::metrics::{MetricsRecorder, TracingRecorder};
use crate::state::{MessageRef, same_message};

mod single;
mod stacked;

/// Front and back slots of the message stack.
#[derive(Clone, Default)]
pub struct MessageSlots {
	pub front: Option<MessageRef>,
	pub back: Option<MessageRef>,
}

impl MessageSlots {
	pub fn new(front: Option<MessageRef>, back: Option<MessageRef>) -> Self {
		Self { front, back }
	}

	/// Both slots empty.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Only the front slot filled.
	pub fn front_only(front: MessageRef) -> Self {
		Self {
			front: Some(front),
			back: None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.front.is_none() && self.back.is_none()
	}

	/// Number of filled slots.
	pub fn len(&self) -> usize {
		usize::from(self.front.is_some()) + usize::from(self.back.is_some())
	}

	/// Identity comparison of both slots.
	pub fn same_as(&self, other: &Self) -> bool {
		same_message(self.front.as_ref(), other.front.as_ref()) && same_message(self.back.as_ref(), other.back.as_ref())
	}

	/// Messages front to back.
	pub fn iter(&self) -> impl Iterator<Item = &MessageRef> {
		self.front.iter().chain(self.back.iter())
	}

	/// Repairs a pair the stack cannot display: a back without a front moves
	/// forward, and a message occupying both slots keeps only the front.
	pub(crate) fn normalized(self) -> Self {
		debug_assert!(
			self.front.is_some() || self.back.is_none(),
			"stacked candidates have a back message without a front"
		);
		debug_assert!(
			!matches!((&self.front, &self.back), (Some(f), Some(b)) if Rc::ptr_eq(f, b)),
			"stacked candidates repeat one message in both slots"
		);
		match (self.front, self.back) {
			(None, back) => Self { front: back, back: None },
			(Some(front), Some(back)) if Rc::ptr_eq(&front, &back) => Self::front_only(front),
			(front, back) => Self { front, back },
		}
	}
}

impl From<[Option<MessageRef>; 2]> for MessageSlots {
	fn from([front, back]: [Option<MessageRef>; 2]) -> Self {
		Self { front, back }
	}
}

impl fmt::Debug for MessageSlots {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let key = |slot: &Option<MessageRef>| slot.as_ref().map(|message| message.key().to_string());
		f.debug_list()
			.entry(&key(&self.front))
			.entry(&key(&self.back))
			.finish()
	}
}

#[derive(Default)]
struct CoordinatorState {
	/// Intended visible state. Single-slot mode only uses the front slot.
	displayed: MessageSlots,
	/// Message whose single-slot show step last completed.
	last_shown: Option<MessageRef>,
	animator_set: AnimatorSet,
	/// Slots still on screen while a committed stacked step waits for the
	/// delegate or the layout pass.
	pending_from: Option<MessageSlots>,
	/// Bumped whenever a transition supersedes earlier deferred work.
	generation: u64,
}

impl CoordinatorState {
	fn supersede(&mut self) -> u64 {
		self.generation = self.generation.wrapping_add(1);
		self.generation
	}

	fn commit(&mut self, displayed: MessageSlots) -> u64 {
		self.displayed = displayed;
		self.pending_from = None;
		self.supersede()
	}
}

struct Shared {
	state: RefCell<CoordinatorState>,
	container: Rc<dyn MessageContainer>,
	delegate: Rc<dyn MessageQueueDelegate>,
	start_animator: Box<dyn Fn(AnimatorSet)>,
	metrics: Rc<dyn MetricsRecorder>,
}

impl Shared {
	fn is_current(&self, generation: u64) -> bool {
		self.state.borrow().generation == generation
	}

	/// Cancels and forgets the active set. A set that was playing still gets
	/// its `on_animation_end` bracket.
	fn retire_active_set(&self) {
		let stale = std::mem::take(&mut self.state.borrow_mut().animator_set);
		stale.remove_all_listeners();
		if stale.is_started() {
			tracing::trace!("Cancelling active animator set");
			stale.cancel();
			self.delegate.on_animation_end();
		}
	}

	/// Replaces the active set with one playing `animators` and hands it to the
	/// runtime. `on_end` runs when it plays out, or right away when there is
	/// nothing to play.
	fn launch(self: &Rc<Self>, animators: Vec<Box<dyn Animator>>, on_end: impl FnOnce(&Rc<Shared>) + 'static) {
		self.state.borrow_mut().pending_from = None;
		self.retire_active_set();
		if animators.is_empty() {
			on_end(self);
			return;
		}

		let set = AnimatorSet::play_together(animators);
		let weak = Rc::downgrade(self);
		set.add_end_listener(move || {
			if let Some(shared) = weak.upgrade() {
				shared.delegate.on_animation_end();
				on_end(&shared);
			}
		});

		self.state.borrow_mut().animator_set = set.clone();
		self.delegate.on_animation_start();
		(self.start_animator)(set);
	}

	/// Like [`launch`](Self::launch), but waits for the container's layout pass
	/// and gives up if another transition happened meanwhile.
	fn launch_after_layout(
		self: &Rc<Self>,
		generation: u64,
		animators: Vec<Box<dyn Animator>>,
		on_end: impl FnOnce(&Rc<Shared>) + 'static,
	) {
		let weak = Rc::downgrade(self);
		self.container
			.run_after_initial_message_layout(Continuation::new(move || {
				let Some(shared) = weak.upgrade() else {
					return;
				};
				if !shared.is_current(generation) {
					tracing::trace!(generation, "Dropping animation superseded before layout");
					return;
				}
				shared.launch(animators, on_end);
			}));
	}
}

/// Drives show, hide and stacking animations for message banners.
///
/// Use one of [`update_without_stacking`](Self::update_without_stacking) or
/// [`update_with_stacking`](Self::update_with_stacking) for the lifetime of
/// a coordinator.
pub struct MessageAnimationCoordinator {
	shared: Rc<Shared>,
}

impl MessageAnimationCoordinator {
	/// Starts building a coordinator. `start_animator` must start every set it
	/// receives on the embedder's animation runtime.
	pub fn builder(
		container: Rc<dyn MessageContainer>,
		delegate: Rc<dyn MessageQueueDelegate>,
		start_animator: impl Fn(AnimatorSet) + 'static,
	) -> CoordinatorBuilder {
		CoordinatorBuilder {
			container,
			delegate,
			start_animator: Box::new(start_animator),
			metrics: None,
		}
	}

	/// Message in the single slot, or the front of the stack.
	pub fn current_displayed_message(&self) -> Option<MessageRef> {
		self.shared.state.borrow().displayed.front.clone()
	}

	pub fn current_displayed_messages(&self) -> MessageSlots {
		self.shared.state.borrow().displayed.clone()
	}

	pub fn last_shown_message(&self) -> Option<MessageRef> {
		self.shared.state.borrow().last_shown.clone()
	}

	/// True while an animator set is playing.
	pub fn is_animating(&self) -> bool {
		self.shared.state.borrow().animator_set.is_started()
	}
}

impl fmt::Debug for MessageAnimationCoordinator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.borrow();
		f.debug_struct("MessageAnimationCoordinator")
			.field("displayed", &state.displayed)
			.field("animating", &state.animator_set.is_started())
			.field("generation", &state.generation)
			.finish()
	}
}

/// Builder for [`MessageAnimationCoordinator`].
pub struct CoordinatorBuilder {
	container: Rc<dyn MessageContainer>,
	delegate: Rc<dyn MessageQueueDelegate>,
	start_animator: Box<dyn Fn(AnimatorSet)>,
	metrics: Option<Rc<dyn MetricsRecorder>>,
}

impl CoordinatorBuilder {
	/// Sets the stacking histogram sink (defaults to [`TracingRecorder`]).
	#[must_use]
	pub fn metrics(mut self, metrics: Rc<dyn MetricsRecorder>) -> Self {
		self.metrics = Some(metrics);
		self
	}

	/// Runs `hook` on every set after the coordinator registered its own end
	/// listener and before the set reaches the runtime.
	#[must_use]
	pub(crate) fn before_start(mut self, hook: impl Fn(&AnimatorSet) + 'static) -> Self {
		let start = self.start_animator;
		self.start_animator = Box::new(move |set| {
			hook(&set);
			start(set);
		});
		self
	}

	pub fn build(self) -> MessageAnimationCoordinator {
		MessageAnimationCoordinator {
			shared: Rc::new(Shared {
				state: RefCell::new(CoordinatorState::default()),
				container: self.container,
				delegate: self.delegate,
				start_animator: self.start_animator,
				metrics: self.metrics.unwrap_or_else(|| Rc::new(TracingRecorder)),
			}),
		}
	}
}
