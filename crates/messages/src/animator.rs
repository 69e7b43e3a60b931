//! Animators and animator sets.
//!
//! An [`Animator`] is one platform animation. An [`AnimatorSet`] groups
//! animators that start, cancel and end as a unit; it is a cheap shared
//! handle so the coordinator and the runtime that plays it can both observe it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::position::Position;
use crate::state::MessageIdentifier;

/// A single animation driven by the embedder's runtime.
pub trait Animator: fmt::Debug {
	/// Total play time.
	fn duration(&self) -> Duration;

	/// Called once when the owning set starts.
	fn start(&mut self) {}

	/// Applies animation progress in `0.0..=1.0`.
	fn set_fraction(&mut self, _fraction: f32) {}

	/// Called when the owning set is cancelled before finishing.
	fn cancel(&mut self) {}
}

/// Lifecycle of an [`AnimatorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetState {
	/// Built but not started.
	#[default]
	Idle,
	/// Started and not yet ended or cancelled.
	Running,
	/// Cancelled while running; end listeners were dropped.
	Cancelled,
	/// Played to completion; end listeners have fired.
	Ended,
}

type EndListener = Box<dyn FnOnce()>;

#[derive(Default)]
struct SetInner {
	animators: Vec<Box<dyn Animator>>,
	state: SetState,
	listeners: Vec<EndListener>,
}

/// Group of animators started and cancelled as a unit.
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct AnimatorSet {
	inner: Rc<RefCell<SetInner>>,
}

impl AnimatorSet {
	/// Creates an empty idle set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a set playing a single animator.
	pub fn play(animator: Box<dyn Animator>) -> Self {
		Self::play_together(vec![animator])
	}

	/// Creates a set playing all animators simultaneously.
	pub fn play_together(animators: Vec<Box<dyn Animator>>) -> Self {
		Self {
			inner: Rc::new(RefCell::new(SetInner {
				animators,
				..SetInner::default()
			})),
		}
	}

	/// Returns the number of animators in the set.
	pub fn len(&self) -> usize {
		self.inner.borrow().animators.len()
	}

	/// Returns true if the set has no animators.
	pub fn is_empty(&self) -> bool {
		self.inner.borrow().animators.is_empty()
	}

	/// Returns the current lifecycle state.
	pub fn state(&self) -> SetState {
		self.inner.borrow().state
	}

	/// Returns true between [`start`](Self::start) and end or cancellation.
	pub fn is_started(&self) -> bool {
		self.state() == SetState::Running
	}

	/// Returns the longest animator duration.
	pub fn duration(&self) -> Duration {
		self.inner
			.borrow()
			.animators
			.iter()
			.map(|animator| animator.duration())
			.max()
			.unwrap_or(Duration::ZERO)
	}

	/// Registers a listener fired once when the set plays to completion.
	pub fn add_end_listener(&self, listener: impl FnOnce() + 'static) {
		self.inner.borrow_mut().listeners.push(Box::new(listener));
	}

	/// Drops every registered end listener without firing it.
	pub fn remove_all_listeners(&self) {
		self.inner.borrow_mut().listeners.clear();
	}

	/// Starts an idle set. Has no effect on a set that already ran.
	pub fn start(&self) {
		let mut inner = self.inner.borrow_mut();
		if inner.state != SetState::Idle {
			return;
		}
		inner.state = SetState::Running;
		for animator in &mut inner.animators {
			animator.start();
		}
	}

	/// Feeds progress to every animator of a running set.
	pub fn set_fraction(&self, fraction: f32) {
		let mut inner = self.inner.borrow_mut();
		if inner.state != SetState::Running {
			return;
		}
		let fraction = fraction.clamp(0.0, 1.0);
		for animator in &mut inner.animators {
			animator.set_fraction(fraction);
		}
	}

	/// Cancels a running set. End listeners are dropped, not fired.
	pub fn cancel(&self) {
		let mut inner = self.inner.borrow_mut();
		if inner.state != SetState::Running {
			return;
		}
		inner.state = SetState::Cancelled;
		inner.listeners.clear();
		for animator in &mut inner.animators {
			animator.cancel();
		}
	}

	/// Completes a running set and fires its end listeners.
	///
	/// Listeners run after the set releases its own state, so they may freely
	/// inspect or replace this set.
	pub fn end(&self) {
		let listeners = {
			let mut inner = self.inner.borrow_mut();
			if inner.state != SetState::Running {
				return;
			}
			for animator in &mut inner.animators {
				animator.set_fraction(1.0);
			}
			inner.state = SetState::Ended;
			std::mem::take(&mut inner.listeners)
		};
		for listener in listeners {
			listener();
		}
	}
}

impl fmt::Debug for AnimatorSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("AnimatorSet")
			.field("state", &inner.state)
			.field("animators", &inner.animators)
			.field("listeners", &inner.listeners.len())
			.finish()
	}
}

/// Stock animator moving a message view between two positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAnimator {
	identifier: MessageIdentifier,
	from: Position,
	to: Position,
	duration: Duration,
	fraction: f32,
}

impl SlotAnimator {
	pub fn new(identifier: MessageIdentifier, from: Position, to: Position, duration: Duration) -> Self {
		Self {
			identifier,
			from,
			to,
			duration,
			fraction: 0.0,
		}
	}

	/// Position the view currently rests closest to.
	pub fn settled_position(&self) -> Position {
		if self.fraction >= 0.5 { self.to } else { self.from }
	}
}

impl Animator for SlotAnimator {
	fn duration(&self) -> Duration {
		self.duration
	}

	fn start(&mut self) {
		self.fraction = 0.0;
	}

	fn set_fraction(&mut self, fraction: f32) {
		self.fraction = fraction;
	}

	fn cancel(&mut self) {
		tracing::trace!(
			identifier = %self.identifier,
			from = %self.from,
			to = %self.to,
			settled = %self.settled_position(),
			"Slot animation cancelled"
		);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	fn slot(from: Position, to: Position, millis: u64) -> Box<dyn Animator> {
		Box::new(SlotAnimator::new(MessageIdentifier(1), from, to, Duration::from_millis(millis)))
	}

	#[test]
	fn end_fires_listeners_once() {
		let set = AnimatorSet::play(slot(Position::Invisible, Position::Front, 100));
		let fired = Rc::new(Cell::new(0));
		let counter = Rc::clone(&fired);
		set.add_end_listener(move || counter.set(counter.get() + 1));

		set.start();
		assert!(set.is_started());
		set.end();
		set.end();

		assert_eq!(fired.get(), 1);
		assert_eq!(set.state(), SetState::Ended);
	}

	#[test]
	fn cancel_drops_listeners() {
		let set = AnimatorSet::play(slot(Position::Front, Position::Invisible, 100));
		let fired = Rc::new(Cell::new(false));
		let flag = Rc::clone(&fired);
		set.add_end_listener(move || flag.set(true));

		set.start();
		set.cancel();
		set.end();

		assert!(!fired.get());
		assert_eq!(set.state(), SetState::Cancelled);
	}

	#[test]
	fn end_requires_start() {
		let set = AnimatorSet::play(slot(Position::Front, Position::Back, 100));
		let fired = Rc::new(Cell::new(false));
		let flag = Rc::clone(&fired);
		set.add_end_listener(move || flag.set(true));

		set.end();
		assert!(!fired.get());
		assert_eq!(set.state(), SetState::Idle);
	}

	#[test]
	fn listener_may_inspect_its_own_set() {
		let set = AnimatorSet::play(slot(Position::Back, Position::Front, 10));
		let handle = set.clone();
		let observed = Rc::new(Cell::new(None));
		let out = Rc::clone(&observed);
		set.add_end_listener(move || {
			handle.remove_all_listeners();
			out.set(Some(handle.state()));
		});

		set.start();
		set.end();
		assert_eq!(observed.get(), Some(SetState::Ended));
	}

	#[test]
	fn duration_is_longest_animator() {
		let set = AnimatorSet::play_together(vec![
			slot(Position::Invisible, Position::Front, 250),
			slot(Position::Front, Position::Back, 400),
		]);
		assert_eq!(set.duration(), Duration::from_millis(400));
		assert_eq!(AnimatorSet::new().duration(), Duration::ZERO);
	}

	#[test]
	fn slot_animator_settles_past_midpoint() {
		let mut animator = SlotAnimator::new(MessageIdentifier(7), Position::Invisible, Position::Front, Duration::from_millis(100));
		animator.set_fraction(0.25);
		assert_eq!(animator.settled_position(), Position::Invisible);
		animator.set_fraction(0.75);
		assert_eq!(animator.settled_position(), Position::Front);
	}

	#[test]
	fn restarted_slot_animator_rests_at_its_origin() {
		let mut animator = SlotAnimator::new(MessageIdentifier(7), Position::Front, Position::Back, Duration::from_millis(100));
		animator.set_fraction(0.9);
		animator.cancel();
		assert_eq!(animator.settled_position(), Position::Back);
		animator.start();
		assert_eq!(animator.settled_position(), Position::Front);
	}
}
