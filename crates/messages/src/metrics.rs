//! Stacking classification histograms.
//!
//! Every stacked transition the coordinator performs is reported once as a
//! [`StackingAnimationType`], followed by one [`StackingAnimationAction`] per
//! message it moves.

use std::cell::RefCell;
use std::fmt;

use crate::state::MessageIdentifier;

/// Histogram receiving [`StackingAnimationType`] samples.
pub const STACKING_ANIMATION_TYPE_HISTOGRAM: &str = "Android.Messages.Stacking";

/// Kind of stacked transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackingAnimationType {
	/// Empty stack to front and back.
	ShowAll = 0,
	/// Empty stack to front only.
	ShowFrontOnly = 1,
	/// Front leaves, back moves forward.
	RemoveFrontAndShowBack = 2,
	/// Back leaves, front stays.
	RemoveBackOnly = 3,
	/// A new message slides in behind the front.
	InsertAtBack = 4,
	/// A new front arrives and the old front moves behind it.
	PushFrontToBack = 5,
	/// Every visible message leaves.
	RemoveAll = 6,
}

impl StackingAnimationType {
	/// Histogram sample value.
	pub fn sample(self) -> i32 {
		self as i32
	}

	/// True for transitions that begin from an empty stack.
	pub fn starts_from_empty(self) -> bool {
		matches!(self, Self::ShowAll | Self::ShowFrontOnly)
	}
}

/// Per-message movement within a stacked transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackingAnimationAction {
	InsertAtFront,
	InsertAtBack,
	PushToFront,
	PushToBack,
	RemoveFront,
	RemoveBack,
}

impl StackingAnimationAction {
	/// Histogram receiving samples for this action, keyed by message identifier.
	pub fn histogram(self) -> &'static str {
		match self {
			Self::InsertAtFront => "Android.Messages.Stacking.InsertAtFront",
			Self::InsertAtBack => "Android.Messages.Stacking.InsertAtBack",
			Self::PushToFront => "Android.Messages.Stacking.PushToFront",
			Self::PushToBack => "Android.Messages.Stacking.PushToBack",
			Self::RemoveFront => "Android.Messages.Stacking.RemoveFront",
			Self::RemoveBack => "Android.Messages.Stacking.RemoveBack",
		}
	}
}

/// Sink for stacking histograms.
pub trait MetricsRecorder {
	fn record_stacking_animation_type(&self, kind: StackingAnimationType);

	fn record_stacking_animation_action(&self, action: StackingAnimationAction, identifier: MessageIdentifier);
}

/// Recorder emitting each sample as a `debug` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl MetricsRecorder for TracingRecorder {
	fn record_stacking_animation_type(&self, kind: StackingAnimationType) {
		tracing::debug!(
			histogram = STACKING_ANIMATION_TYPE_HISTOGRAM,
			sample = kind.sample(),
			?kind,
			"Recorded stacking animation"
		);
	}

	fn record_stacking_animation_action(&self, action: StackingAnimationAction, identifier: MessageIdentifier) {
		tracing::debug!(
			histogram = action.histogram(),
			sample = identifier.0,
			"Recorded stacking action"
		);
	}
}

/// One recorded histogram sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSample {
	Type(StackingAnimationType),
	Action(StackingAnimationAction, MessageIdentifier),
}

impl fmt::Display for MetricSample {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Type(kind) => write!(f, "{STACKING_ANIMATION_TYPE_HISTOGRAM}: {kind:?}"),
			Self::Action(action, identifier) => write!(f, "{}: {identifier}", action.histogram()),
		}
	}
}

/// In-memory recorder keeping samples in arrival order.
#[derive(Debug, Default)]
pub struct RecordedMetrics {
	samples: RefCell<Vec<MetricSample>>,
}

impl RecordedMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn samples(&self) -> Vec<MetricSample> {
		self.samples.borrow().clone()
	}

	pub fn types(&self) -> Vec<StackingAnimationType> {
		self.samples
			.borrow()
			.iter()
			.filter_map(|sample| match sample {
				MetricSample::Type(kind) => Some(*kind),
				MetricSample::Action(..) => None,
			})
			.collect()
	}

	pub fn count_type(&self, kind: StackingAnimationType) -> usize {
		self.samples
			.borrow()
			.iter()
			.filter(|sample| **sample == MetricSample::Type(kind))
			.count()
	}

	pub fn count_action(&self, action: StackingAnimationAction) -> usize {
		self.samples
			.borrow()
			.iter()
			.filter(|sample| matches!(sample, MetricSample::Action(a, _) if *a == action))
			.count()
	}

	pub fn clear(&self) {
		self.samples.borrow_mut().clear();
	}
}

impl MetricsRecorder for RecordedMetrics {
	fn record_stacking_animation_type(&self, kind: StackingAnimationType) {
		self.samples.borrow_mut().push(MetricSample::Type(kind));
	}

	fn record_stacking_animation_action(&self, action: StackingAnimationAction, identifier: MessageIdentifier) {
		self.samples.borrow_mut().push(MetricSample::Action(action, identifier));
	}
}
