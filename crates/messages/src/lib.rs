//! Message banner presentation.
//!
//! Decides which show/hide animations move the visible banners from one state
//! to the next, keeping at most one animator set alive and firing exactly one
//! completion per transition. Rendering, layout and the animation runtime are
//! supplied by the embedder through the traits in [`handler`].
//!
//! # Components
//!
//! - [`coordinator`] - [`MessageAnimationCoordinator`], single-slot and stacked transitions
//! - [`queue`] - [`MessageQueueManager`], priority queue and suspension feeding the coordinator
//! - [`animator`] - [`AnimatorSet`] and the stock [`SlotAnimator`]
//! - [`timeline`] - frame-driven reference runtime for animator sets
//! - [`metrics`] - stacking classification histograms

pub mod animator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod position;
pub mod queue;
pub mod state;
pub mod timeline;

#[cfg(test)]
mod test_support;

pub use animator::{Animator, AnimatorSet, SlotAnimator};
pub use config::{ConfigError, MessagesConfig, TimingConfig};
pub use coordinator::{CoordinatorBuilder, MessageAnimationCoordinator, MessageSlots};
pub use error::{QueueError, Result};
pub use handler::{Continuation, DismissReason, MessageContainer, MessageQueueDelegate, MessageStateHandler};
pub use metrics::{MetricSample, MetricsRecorder, RecordedMetrics, StackingAnimationAction, StackingAnimationType, TracingRecorder};
pub use position::Position;
pub use queue::{MessageQueueManager, SuspensionToken};
pub use state::{MessageIdentifier, MessageKey, MessageRef, MessageState, Priority};
pub use timeline::Timeline;
