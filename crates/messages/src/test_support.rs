//! Recording test doubles for the coordinator's collaborators.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::animator::{Animator, AnimatorSet, SlotAnimator};
use crate::coordinator::{CoordinatorBuilder, MessageAnimationCoordinator};
use crate::handler::{Continuation, DismissReason, MessageContainer, MessageQueueDelegate, MessageStateHandler};
use crate::metrics::RecordedMetrics;
use crate::position::Position;
use crate::state::{MessageIdentifier, MessageRef, MessageState, Priority};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
	Show { key: String, from: Position, to: Position },
	Hide { key: String, from: Position, to: Position, animate: bool },
	Dismissed { key: String, reason: DismissReason },
	StartShowing,
	FinishHiding,
	AnimationStart,
	AnimationEnd,
}

impl Call {
	pub(crate) fn show(key: &str, from: Position, to: Position) -> Self {
		Self::Show {
			key: key.to_owned(),
			from,
			to,
		}
	}

	pub(crate) fn hide(key: &str, from: Position, to: Position, animate: bool) -> Self {
		Self::Hide {
			key: key.to_owned(),
			from,
			to,
			animate,
		}
	}

	fn is_handler_call(&self) -> bool {
		matches!(self, Self::Show { .. } | Self::Hide { .. })
	}
}

type CallLog = Rc<RefCell<Vec<Call>>>;

pub(crate) struct FakeHandler {
	key: String,
	identifier: MessageIdentifier,
	log: CallLog,
	hide_animates: Cell<bool>,
}

impl MessageStateHandler for FakeHandler {
	fn show(&self, from: Position, to: Position) -> Box<dyn Animator> {
		self.log.borrow_mut().push(Call::show(&self.key, from, to));
		Box::new(SlotAnimator::new(self.identifier, from, to, Duration::from_millis(100)))
	}

	fn hide(&self, from: Position, to: Position, animate: bool) -> Option<Box<dyn Animator>> {
		self.log
			.borrow_mut()
			.push(Call::hide(&self.key, from, to, animate));
		self.hide_animates
			.get()
			.then(|| Box::new(SlotAnimator::new(self.identifier, from, to, Duration::from_millis(100))) as Box<dyn Animator>)
	}

	fn message_identifier(&self) -> MessageIdentifier {
		self.identifier
	}

	fn on_dismissed(&self, reason: DismissReason) {
		self.log.borrow_mut().push(Call::Dismissed {
			key: self.key.clone(),
			reason,
		});
	}
}

pub(crate) struct FakeDelegate {
	log: CallLog,
	defer: Cell<bool>,
	pending: RefCell<Vec<Continuation>>,
}

impl FakeDelegate {
	/// Resumes every withheld `on_start_showing` continuation.
	pub(crate) fn release(&self) {
		let pending = std::mem::take(&mut *self.pending.borrow_mut());
		for ready in pending {
			ready.resume();
		}
	}
}

impl MessageQueueDelegate for FakeDelegate {
	fn on_start_showing(&self, ready: Continuation) {
		self.log.borrow_mut().push(Call::StartShowing);
		if self.defer.get() {
			self.pending.borrow_mut().push(ready);
		} else {
			ready.resume();
		}
	}

	fn on_finish_hiding(&self) {
		self.log.borrow_mut().push(Call::FinishHiding);
	}

	fn on_animation_start(&self) {
		self.log.borrow_mut().push(Call::AnimationStart);
	}

	fn on_animation_end(&self) {
		self.log.borrow_mut().push(Call::AnimationEnd);
	}
}

#[derive(Default)]
pub(crate) struct FakeContainer {
	defer: Cell<bool>,
	pending: RefCell<Vec<Continuation>>,
}

impl FakeContainer {
	/// Completes the withheld layout pass.
	pub(crate) fn layout(&self) {
		let pending = std::mem::take(&mut *self.pending.borrow_mut());
		for task in pending {
			task.resume();
		}
	}
}

impl MessageContainer for FakeContainer {
	fn run_after_initial_message_layout(&self, task: Continuation) {
		if self.defer.get() {
			self.pending.borrow_mut().push(task);
		} else {
			task.resume();
		}
	}
}

/// Shared fakes plus the sets handed to the start callback.
pub(crate) struct Fakes {
	log: CallLog,
	pub(crate) delegate: Rc<FakeDelegate>,
	pub(crate) container: Rc<FakeContainer>,
	pub(crate) metrics: Rc<RecordedMetrics>,
	started: Rc<RefCell<Vec<AnimatorSet>>>,
}

impl Fakes {
	pub(crate) fn new() -> Self {
		let log = CallLog::default();
		Self {
			delegate: Rc::new(FakeDelegate {
				log: Rc::clone(&log),
				defer: Cell::new(false),
				pending: RefCell::default(),
			}),
			container: Rc::new(FakeContainer::default()),
			metrics: Rc::new(RecordedMetrics::new()),
			started: Rc::default(),
			log,
		}
	}

	/// Holds `on_start_showing` continuations until [`FakeDelegate::release`].
	pub(crate) fn defer_show(&self) {
		self.delegate.defer.set(true);
	}

	/// Holds layout tasks until [`FakeContainer::layout`].
	pub(crate) fn defer_layout(&self) {
		self.container.defer.set(true);
	}

	/// Coordinator builder whose start callback starts sets immediately.
	pub(crate) fn builder(&self) -> CoordinatorBuilder {
		let started = Rc::clone(&self.started);
		MessageAnimationCoordinator::builder(self.container.clone(), self.delegate.clone(), move |set: AnimatorSet| {
			set.start();
			started.borrow_mut().push(set);
		})
		.metrics(self.metrics.clone())
	}

	pub(crate) fn coordinator(&self) -> MessageAnimationCoordinator {
		self.builder().build()
	}

	pub(crate) fn message(&self, key: &str, identifier: u32) -> MessageRef {
		self.message_with(key, identifier, Priority::Normal, true)
	}

	pub(crate) fn urgent(&self, key: &str, identifier: u32) -> MessageRef {
		self.message_with(key, identifier, Priority::Urgent, true)
	}

	/// A message whose `hide` reports nothing to animate.
	pub(crate) fn static_message(&self, key: &str, identifier: u32) -> MessageRef {
		self.message_with(key, identifier, Priority::Normal, false)
	}

	fn message_with(&self, key: &str, identifier: u32, priority: Priority, hide_animates: bool) -> MessageRef {
		let handler = Rc::new(FakeHandler {
			key: key.to_owned(),
			identifier: MessageIdentifier(identifier),
			log: Rc::clone(&self.log),
			hide_animates: Cell::new(hide_animates),
		});
		MessageState::new(key, handler).with_priority(priority).into_ref()
	}

	pub(crate) fn calls(&self) -> Vec<Call> {
		self.log.borrow().clone()
	}

	/// Only `show`/`hide` calls, in order.
	pub(crate) fn handler_calls(&self) -> Vec<Call> {
		self.log
			.borrow()
			.iter()
			.filter(|call| call.is_handler_call())
			.cloned()
			.collect()
	}

	pub(crate) fn clear_calls(&self) {
		self.log.borrow_mut().clear();
	}

	pub(crate) fn count(&self, call: &Call) -> usize {
		self.log.borrow().iter().filter(|c| *c == call).count()
	}

	pub(crate) fn started_sets(&self) -> Vec<AnimatorSet> {
		self.started.borrow().clone()
	}

	/// Ends playing sets, including ones started by completions, until none remain.
	pub(crate) fn settle(&self) {
		for _ in 0..64 {
			let playing: Vec<AnimatorSet> = self
				.started
				.borrow()
				.iter()
				.filter(|set| set.is_started())
				.cloned()
				.collect();
			if playing.is_empty() {
				return;
			}
			for set in playing {
				set.end();
			}
		}
		panic!("animations did not settle");
	}
}

/// Keys of the displayed pair, for compact assertions.
pub(crate) fn keys(coordinator: &MessageAnimationCoordinator) -> (Option<String>, Option<String>) {
	let slots = coordinator.current_displayed_messages();
	let key = |slot: Option<MessageRef>| slot.map(|message| message.key().to_string());
	(key(slots.front), key(slots.back))
}
