//! Stacked transitions: a front message with an optional one peeking behind it.

use std::rc::Rc;

use super::{MessageAnimationCoordinator, MessageSlots, Shared};
use crate::animator::Animator;
use crate::handler::Continuation;
use crate::metrics::{StackingAnimationAction, StackingAnimationType};
use crate::position::Position;
use crate::state::MessageRef;

/// One message moving between slots as part of a stacked transition.
#[derive(Debug, Clone)]
pub(crate) struct SlotMove {
	message: MessageRef,
	from: Position,
	to: Position,
	action: StackingAnimationAction,
}

impl SlotMove {
	fn new(message: &MessageRef, from: Position, to: Position, action: StackingAnimationAction) -> Self {
		Self {
			message: Rc::clone(message),
			from,
			to,
			action,
		}
	}

	fn is_removal(&self) -> bool {
		matches!(
			self.action,
			StackingAnimationAction::RemoveFront | StackingAnimationAction::RemoveBack
		)
	}

	/// True when the move puts a view on screen that was not laid out before.
	fn introduces_view(&self) -> bool {
		matches!(
			self.action,
			StackingAnimationAction::InsertAtFront | StackingAnimationAction::InsertAtBack
		)
	}

	fn build(&self, animate: bool) -> Option<Box<dyn Animator>> {
		let handler = self.message.handler();
		if self.is_removal() {
			handler.hide(self.from, self.to, animate)
		} else {
			Some(handler.show(self.from, self.to))
		}
	}
}

/// Classified stacked transition: its kind, the state it commits and the
/// moves that animate it.
#[derive(Debug, Clone)]
pub(crate) struct StackingPlan {
	kind: StackingAnimationType,
	target: MessageSlots,
	moves: Vec<SlotMove>,
}

impl StackingPlan {
	/// Plans the move from `current` to `next`, or `None` when both match.
	///
	/// Requests that need more than one animation are reduced to their first
	/// step; `target` is then an intermediate state and the caller is expected
	/// to repeat the request once the step completes.
	pub(crate) fn between(current: &MessageSlots, next: &MessageSlots) -> Option<Self> {
		use Position::{Back, Front, Invisible};
		use StackingAnimationAction as Action;
		use StackingAnimationType as Kind;

		if current.same_as(next) {
			return None;
		}
		let is = |a: &MessageRef, b: &MessageRef| Rc::ptr_eq(a, b);
		let holds = |slot: Option<&MessageRef>, message: &MessageRef| slot.is_some_and(|m| is(m, message));

		let plan = match (
			current.front.as_ref(),
			current.back.as_ref(),
			next.front.as_ref(),
			next.back.as_ref(),
		) {
			(None, _, None, _) => {
				debug_assert!(
					current.back.is_none() && next.back.is_none(),
					"stacked slots hold a back message without a front"
				);
				return None;
			}
			(None, _, Some(nf), None) => Self {
				kind: Kind::ShowFrontOnly,
				target: MessageSlots::front_only(Rc::clone(nf)),
				moves: vec![SlotMove::new(nf, Invisible, Front, Action::InsertAtFront)],
			},
			(None, _, Some(nf), Some(nb)) => Self {
				kind: Kind::ShowAll,
				target: MessageSlots::new(Some(Rc::clone(nf)), Some(Rc::clone(nb))),
				moves: vec![
					SlotMove::new(nf, Invisible, Front, Action::InsertAtFront),
					SlotMove::new(nb, Front, Back, Action::InsertAtBack),
				],
			},
			(Some(cf), cb, None, _) => Self::remove_all(cf, cb),
			(Some(cf), None, Some(nf), Some(nb)) if is(nf, cf) => Self {
				kind: Kind::InsertAtBack,
				target: MessageSlots::new(Some(Rc::clone(cf)), Some(Rc::clone(nb))),
				moves: vec![SlotMove::new(nb, Front, Back, Action::InsertAtBack)],
			},
			(Some(cf), Some(cb), Some(nf), _) if is(nf, cf) => Self::remove_back(cf, cb),
			(Some(cf), Some(cb), Some(nf), nb) if is(nf, cb) || holds(nb, cb) => Self {
				kind: Kind::RemoveFrontAndShowBack,
				target: MessageSlots::front_only(Rc::clone(cb)),
				moves: vec![
					SlotMove::new(cf, Front, Invisible, Action::RemoveFront),
					SlotMove::new(cb, Back, Front, Action::PushToFront),
				],
			},
			// The old front moves back, but the back slot is still taken.
			(Some(cf), Some(cb), Some(_), Some(nb)) if is(nb, cf) => Self::remove_back(cf, cb),
			(Some(cf), None, Some(nf), Some(nb)) if is(nb, cf) => Self {
				kind: Kind::PushFrontToBack,
				target: MessageSlots::new(Some(Rc::clone(nf)), Some(Rc::clone(cf))),
				moves: vec![
					SlotMove::new(nf, Invisible, Front, Action::InsertAtFront),
					SlotMove::new(cf, Front, Back, Action::PushToBack),
				],
			},
			// Nothing visible survives; clear the stack and show the rest afterwards.
			(Some(cf), cb, Some(_), _) => Self::remove_all(cf, cb),
		};
		Some(plan)
	}

	fn remove_back(front: &MessageRef, back: &MessageRef) -> Self {
		Self {
			kind: StackingAnimationType::RemoveBackOnly,
			target: MessageSlots::front_only(Rc::clone(front)),
			moves: vec![SlotMove::new(
				back,
				Position::Back,
				Position::Front,
				StackingAnimationAction::RemoveBack,
			)],
		}
	}

	fn remove_all(front: &MessageRef, back: Option<&MessageRef>) -> Self {
		let mut moves = vec![SlotMove::new(
			front,
			Position::Front,
			Position::Invisible,
			StackingAnimationAction::RemoveFront,
		)];
		if let Some(back) = back {
			moves.push(SlotMove::new(
				back,
				Position::Back,
				Position::Front,
				StackingAnimationAction::RemoveBack,
			));
		}
		Self {
			kind: StackingAnimationType::RemoveAll,
			target: MessageSlots::empty(),
			moves,
		}
	}

	#[cfg(test)]
	pub(crate) fn kind(&self) -> StackingAnimationType {
		self.kind
	}

	#[cfg(test)]
	pub(crate) fn target(&self) -> &MessageSlots {
		&self.target
	}

	#[cfg(test)]
	pub(crate) fn actions(&self) -> impl Iterator<Item = StackingAnimationAction> + '_ {
		self.moves.iter().map(|slot_move| slot_move.action)
	}
}

impl StackingAnimationType {
	/// Classifies the stacked transition from `current` to `next`.
	///
	/// Returns `None` when nothing changes. Every other pair of valid slot
	/// states maps to exactly one kind.
	pub fn classify(current: &MessageSlots, next: &MessageSlots) -> Option<Self> {
		StackingPlan::between(current, next).map(|plan| plan.kind)
	}
}

fn build_animators(moves: &[SlotMove], animate: bool) -> Vec<Box<dyn Animator>> {
	moves.iter().filter_map(|slot_move| slot_move.build(animate)).collect()
}

impl MessageAnimationCoordinator {
	/// Moves the stack towards `candidates`.
	///
	/// Identical candidates are a no-op and `on_finished` is not called. Unless
	/// `suspended`, requests arriving while a step is in flight are dropped. A
	/// step is in flight from the moment it is committed, including while it
	/// waits for the delegate or the layout pass. A suspended request cancels
	/// the running animation or abandons the waiting step instead, and its
	/// hides do not animate.
	///
	/// The displayed pair is committed immediately, possibly to an intermediate
	/// state when the request needs several steps. `on_finished` runs when the
	/// step's animation ends; callers re-issue their candidates from it to
	/// continue.
	pub fn update_with_stacking(&self, candidates: impl Into<MessageSlots>, suspended: bool, on_finished: impl FnOnce() + 'static) {
		let next = candidates.into().normalized();
		let current = {
			let state = self.shared.state.borrow();
			if state.displayed.same_as(&next) {
				return;
			}
			if !suspended && (state.animator_set.is_started() || state.pending_from.is_some()) {
				tracing::trace!(candidates = ?next, "Dropping stacked update while a step is in flight");
				return;
			}
			state.pending_from.clone().unwrap_or_else(|| state.displayed.clone())
		};
		if suspended {
			self.shared.retire_active_set();
		}

		let Some(StackingPlan { kind, target, moves }) = StackingPlan::between(&current, &next) else {
			// Only reachable when a waiting step is abandoned and the screen
			// already matches the request.
			tracing::debug!(to = ?next, "Abandoning waiting stacked step");
			self.shared.state.borrow_mut().commit(next.clone());
			if next.is_empty() {
				self.shared.delegate.on_finish_hiding();
			}
			on_finished();
			return;
		};
		self.shared.record_stacking(kind, &moves);
		tracing::debug!(?kind, from = ?current, to = ?target, requested = ?next, suspended, "Stacked transition");
		let deferred = kind.starts_from_empty() || moves.iter().any(SlotMove::introduces_view);
		let generation = {
			let mut state = self.shared.state.borrow_mut();
			let generation = state.commit(target);
			if deferred {
				state.pending_from = Some(current);
			}
			generation
		};

		let animate = !suspended;
		let on_end = move |shared: &Rc<Shared>| {
			if kind == StackingAnimationType::RemoveAll {
				shared.delegate.on_finish_hiding();
			}
			on_finished();
		};

		if kind.starts_from_empty() {
			let weak = Rc::downgrade(&self.shared);
			self.shared
				.delegate
				.on_start_showing(Continuation::new(move || {
					let Some(shared) = weak.upgrade() else {
						return;
					};
					if !shared.is_current(generation) {
						tracing::trace!(?kind, "Abandoning stacked show, displayed messages changed");
						return;
					}
					let animators = build_animators(&moves, animate);
					shared.launch_after_layout(generation, animators, on_end);
				}));
		} else if moves.iter().any(SlotMove::introduces_view) {
			let animators = build_animators(&moves, animate);
			self.shared.launch_after_layout(generation, animators, on_end);
		} else {
			let animators = build_animators(&moves, animate);
			self.shared.launch(animators, on_end);
		}
	}
}

impl Shared {
	fn record_stacking(&self, kind: StackingAnimationType, moves: &[SlotMove]) {
		self.metrics.record_stacking_animation_type(kind);
		for slot_move in moves {
			self.metrics
				.record_stacking_animation_action(slot_move.action, slot_move.message.identifier());
		}
	}
}
