//! Frame-driven runtime for animator sets.
//!
//! The embedder calls [`Timeline::tick`] once per frame with the elapsed time.
//! Sets finish once their longest animator has played out; cancelled sets are
//! forgotten on the next tick.

use std::cell::RefCell;
use std::time::Duration;

use crate::animator::AnimatorSet;

#[derive(Debug)]
struct Track {
	set: AnimatorSet,
	elapsed: Duration,
	duration: Duration,
}

impl Track {
	fn progress(&self) -> f32 {
		if self.duration.is_zero() {
			return 1.0;
		}
		(self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
	}

	fn is_done(&self) -> bool {
		self.elapsed >= self.duration
	}
}

/// Plays animator sets against a manually advanced clock.
#[derive(Debug, Default)]
pub struct Timeline {
	tracks: RefCell<Vec<Track>>,
}

impl Timeline {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts `set` and plays it from the next tick.
	pub fn start(&self, set: AnimatorSet) {
		set.start();
		if !set.is_started() {
			tracing::trace!(state = ?set.state(), "Ignoring animator set that cannot start");
			return;
		}
		let duration = set.duration();
		tracing::trace!(?duration, animators = set.len(), "Timeline started animator set");
		self.tracks.borrow_mut().push(Track {
			set,
			elapsed: Duration::ZERO,
			duration,
		});
	}

	/// Advances every playing set by `delta` and ends the ones that completed.
	///
	/// Returns how many sets ended. End listeners run after the timeline
	/// released its own state, so they may start new sets.
	pub fn tick(&self, delta: Duration) -> usize {
		let finished: Vec<Track> = {
			let mut tracks = self.tracks.borrow_mut();
			tracks.retain(|track| track.set.is_started());
			for track in tracks.iter_mut() {
				track.elapsed = track.elapsed.saturating_add(delta).min(track.duration);
				track.set.set_fraction(track.progress());
			}
			let (done, playing) = std::mem::take(&mut *tracks).into_iter().partition(Track::is_done);
			*tracks = playing;
			done
		};

		for track in &finished {
			track.set.end();
		}
		finished.len()
	}

	/// Number of sets still playing.
	pub fn active_count(&self) -> usize {
		self.tracks
			.borrow()
			.iter()
			.filter(|track| track.set.is_started())
			.count()
	}

	pub fn is_idle(&self) -> bool {
		self.active_count() == 0
	}

	/// Ticks by `step` until idle or `max_steps` ticks elapsed. Returns the
	/// number of ticks taken.
	pub fn run_until_idle(&self, step: Duration, max_steps: usize) -> usize {
		let mut steps = 0;
		while steps < max_steps && !self.is_idle() {
			self.tick(step);
			steps += 1;
		}
		steps
	}
}
