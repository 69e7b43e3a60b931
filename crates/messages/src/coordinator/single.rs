//! Single-slot transitions: one message visible at a time.

use std::rc::Rc;

use super::{MessageAnimationCoordinator, MessageSlots, Shared};
use crate::handler::Continuation;
use crate::position::Position;
use crate::state::{MessageRef, same_message};

type OnFinished = Box<dyn FnOnce()>;

impl MessageAnimationCoordinator {
	/// Moves the single visible slot towards `candidate`.
	///
	/// A candidate identical to the displayed message is a no-op and
	/// `on_finished` is not called. Unless `suspended`, requests arriving while
	/// an animation plays are dropped; the caller re-derives its candidate from
	/// the completion of the running transition.
	///
	/// Showing commits the candidate immediately and calls `on_finished` once
	/// the delegate allowed the show and the animation is scheduled. Hiding
	/// clears the slot and calls `on_finished` when the hide animation ends.
	/// A suspended hide does not animate.
	pub fn update_without_stacking(&self, candidate: Option<MessageRef>, suspended: bool, on_finished: impl FnOnce() + 'static) {
		let current = {
			let state = self.shared.state.borrow();
			if same_message(state.displayed.front.as_ref(), candidate.as_ref()) {
				return;
			}
			if !suspended && state.animator_set.is_started() {
				tracing::trace!(
					candidate = ?candidate.as_ref().map(|message| message.id()),
					"Dropping update while animating"
				);
				return;
			}
			state.displayed.front.clone()
		};

		let on_finished: OnFinished = Box::new(on_finished);
		match (current, candidate) {
			(Some(current), _) => self.shared.begin_single_hide(current, suspended, on_finished),
			(None, Some(candidate)) => self.shared.begin_single_show(candidate, on_finished),
			(None, None) => {}
		}
	}
}

impl Shared {
	fn begin_single_show(self: &Rc<Self>, candidate: MessageRef, on_finished: OnFinished) {
		let generation = self
			.state
			.borrow_mut()
			.commit(MessageSlots::front_only(Rc::clone(&candidate)));
		tracing::debug!(message = candidate.id(), key = %candidate.key(), "Showing message");

		let weak = Rc::downgrade(self);
		self.delegate.on_start_showing(Continuation::new(move || {
			let Some(shared) = weak.upgrade() else {
				return;
			};
			if !shared.is_current(generation) {
				tracing::trace!(message = candidate.id(), "Abandoning show, displayed message changed");
				return;
			}

			let animator = candidate.handler().show(Position::Invisible, Position::Front);
			shared.launch_after_layout(generation, vec![animator], |_| {});
			shared.state.borrow_mut().last_shown = Some(candidate);
			on_finished();
		}));
	}

	fn begin_single_hide(self: &Rc<Self>, current: MessageRef, suspended: bool, on_finished: OnFinished) {
		let shown = {
			let mut state = self.state.borrow_mut();
			state.supersede();
			state
				.last_shown
				.as_ref()
				.is_some_and(|last| Rc::ptr_eq(last, &current))
		};
		if !shown {
			tracing::trace!(message = current.id(), "Clearing message that never finished showing");
			self.finish_single_hide(on_finished);
			return;
		}

		tracing::debug!(message = current.id(), key = %current.key(), suspended, "Hiding message");
		self.retire_active_set();
		let animators = current
			.handler()
			.hide(Position::Front, Position::Invisible, !suspended)
			.into_iter()
			.collect();
		self.launch(animators, move |shared: &Rc<Shared>| shared.finish_single_hide(on_finished));
	}

	fn finish_single_hide(&self, on_finished: OnFinished) {
		self.delegate.on_finish_hiding();
		{
			let mut state = self.state.borrow_mut();
			state.commit(MessageSlots::empty());
			state.last_shown = None;
		}
		on_finished();
	}
}
