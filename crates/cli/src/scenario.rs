//! Scripted scenarios replayed against a queue manager on a [`Timeline`].
//!
//! ```toml
//! [[step]]
//! action = "enqueue"
//! key = "download"
//! identifier = 3
//! priority = "urgent"
//!
//! [[step]]
//! action = "tick"
//! ms = 500
//!
//! [[step]]
//! action = "dismiss"
//! key = "download"
//! reason = "timer"
//! ```

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, bail};
use marquee_messages::{
	Animator, Continuation, DismissReason, MessageAnimationCoordinator, MessageContainer, MessageIdentifier, MessageKey,
	MessageQueueDelegate, MessageQueueManager, MessageRef, MessageState, MessageStateHandler, MessagesConfig, MetricSample,
	Position, Priority, RecordedMetrics, SlotAnimator, Timeline, TimingConfig,
};
use serde::Deserialize;

/// Frame length used when advancing the timeline.
const FRAME: Duration = Duration::from_millis(16);

/// Upper bound on frames a `settle` step may take.
const MAX_SETTLE_FRAMES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
	#[serde(default, rename = "step")]
	pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
	Enqueue {
		key: String,
		#[serde(default)]
		identifier: u32,
		#[serde(default)]
		priority: Priority,
	},
	Dismiss {
		key: String,
		#[serde(default)]
		reason: DismissReason,
	},
	/// Suspends the queue; each `resume` releases the latest suspension.
	Suspend,
	Resume,
	/// Advances the clock in frame-sized steps.
	Tick { ms: u64 },
	/// Plays every running animation to completion.
	Settle,
}

impl Scenario {
	pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
		toml::from_str(input).context("invalid scenario")
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let input = std::fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
		Self::from_toml_str(&input).with_context(|| format!("in {}", path.display()))
	}
}

type EventLog = Rc<RefCell<Vec<String>>>;

fn record(events: &EventLog, event: String) {
	tracing::info!("{event}");
	events.borrow_mut().push(event);
}

struct ConsoleHandler {
	key: String,
	identifier: MessageIdentifier,
	timing: TimingConfig,
	events: EventLog,
}

impl MessageStateHandler for ConsoleHandler {
	fn show(&self, from: Position, to: Position) -> Box<dyn Animator> {
		record(&self.events, format!("show {} {from}->{to}", self.key));
		Box::new(SlotAnimator::new(self.identifier, from, to, self.timing.duration_for(from, to)))
	}

	fn hide(&self, from: Position, to: Position, animate: bool) -> Option<Box<dyn Animator>> {
		if !animate {
			record(&self.events, format!("hide {} {from}->{to} (instant)", self.key));
			return None;
		}
		record(&self.events, format!("hide {} {from}->{to}", self.key));
		Some(Box::new(SlotAnimator::new(self.identifier, from, to, self.timing.duration_for(from, to))))
	}

	fn message_identifier(&self) -> MessageIdentifier {
		self.identifier
	}

	fn on_dismissed(&self, reason: DismissReason) {
		record(&self.events, format!("dismissed {}: {reason:?}", self.key));
	}
}

struct ConsoleDelegate {
	events: EventLog,
}

impl MessageQueueDelegate for ConsoleDelegate {
	fn on_start_showing(&self, ready: Continuation) {
		record(&self.events, "start showing".to_owned());
		ready.resume();
	}

	fn on_finish_hiding(&self) {
		record(&self.events, "finish hiding".to_owned());
	}

	fn on_animation_start(&self) {
		record(&self.events, "animation start".to_owned());
	}

	fn on_animation_end(&self) {
		record(&self.events, "animation end".to_owned());
	}
}

/// Container with no layout pass to wait for.
struct ImmediateContainer;

impl MessageContainer for ImmediateContainer {
	fn run_after_initial_message_layout(&self, task: Continuation) {
		task.resume();
	}
}

/// Final state of a replayed scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	pub front: Option<String>,
	pub back: Option<String>,
	pub queued: Vec<String>,
	pub suspended: bool,
	pub elapsed: Duration,
	pub events: Vec<String>,
	pub metrics: Vec<MetricSample>,
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let slot = |slot: &Option<String>| slot.clone().unwrap_or_else(|| "-".to_owned());
		writeln!(f, "events:")?;
		for event in &self.events {
			writeln!(f, "  {event}")?;
		}
		writeln!(f, "front: {}", slot(&self.front))?;
		writeln!(f, "back: {}", slot(&self.back))?;
		writeln!(f, "queued: {}", self.queued.join(", "))?;
		writeln!(f, "suspended: {}", if self.suspended { "yes" } else { "no" })?;
		writeln!(f, "elapsed: {}ms", self.elapsed.as_millis())?;
		if !self.metrics.is_empty() {
			writeln!(f, "metrics:")?;
			for sample in &self.metrics {
				writeln!(f, "  {sample}")?;
			}
		}
		Ok(())
	}
}

fn advance(timeline: &Timeline, total: Duration) {
	let mut remaining = total;
	while !remaining.is_zero() {
		let step = remaining.min(FRAME);
		timeline.tick(step);
		remaining -= step;
	}
}

/// Replays `scenario`, then lets running animations finish.
pub fn run(scenario: &Scenario, config: &MessagesConfig) -> anyhow::Result<Report> {
	let timeline = Rc::new(Timeline::new());
	let metrics = Rc::new(RecordedMetrics::new());
	let events = EventLog::default();

	let runtime = Rc::clone(&timeline);
	let builder = MessageAnimationCoordinator::builder(
		Rc::new(ImmediateContainer),
		Rc::new(ConsoleDelegate { events: Rc::clone(&events) }),
		move |set| runtime.start(set),
	)
	.metrics(metrics.clone());
	let manager = MessageQueueManager::new(builder, config);

	let mut suspensions = Vec::new();
	let mut elapsed = Duration::ZERO;
	let settle = |elapsed: &mut Duration| -> anyhow::Result<()> {
		let frames = timeline.run_until_idle(FRAME, MAX_SETTLE_FRAMES);
		*elapsed += FRAME * u32::try_from(frames)?;
		if !timeline.is_idle() {
			bail!("animations still running after {MAX_SETTLE_FRAMES} frames");
		}
		Ok(())
	};

	for (index, step) in scenario.steps.iter().enumerate() {
		let number = index + 1;
		tracing::debug!(step = number, ?step, "Running scenario step");
		match step {
			Step::Enqueue {
				key,
				identifier,
				priority,
			} => {
				let handler = Rc::new(ConsoleHandler {
					key: key.clone(),
					identifier: MessageIdentifier(*identifier),
					timing: config.timing,
					events: Rc::clone(&events),
				});
				let message = MessageState::new(key.as_str(), handler)
					.with_priority(*priority)
					.into_ref();
				manager
					.enqueue(message)
					.with_context(|| format!("step {number}"))?;
			}
			Step::Dismiss { key, reason } => {
				manager
					.dismiss(&MessageKey::from(key.as_str()), *reason)
					.with_context(|| format!("step {number}"))?;
			}
			Step::Suspend => suspensions.push(manager.suspend()),
			Step::Resume => {
				let token = suspensions
					.pop()
					.with_context(|| format!("step {number}: resume without an outstanding suspend"))?;
				manager.resume(token)?;
			}
			Step::Tick { ms } => {
				let delta = Duration::from_millis(*ms);
				advance(&timeline, delta);
				elapsed += delta;
			}
			Step::Settle => settle(&mut elapsed)?,
		}
	}
	settle(&mut elapsed)?;

	let displayed = manager.displayed();
	let key = |slot: Option<MessageRef>| slot.map(|message| message.key().to_string());
	let report = Report {
		front: key(displayed.front),
		back: key(displayed.back),
		queued: manager
			.queued()
			.iter()
			.map(|message| message.key().to_string())
			.collect(),
		suspended: manager.is_suspended(),
		elapsed,
		events: events.borrow().clone(),
		metrics: metrics.samples(),
	};
	Ok(report)
}
