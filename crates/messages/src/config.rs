//! Presentation configuration.
//!
//! ```toml
//! stacking = true
//!
//! [timing]
//! enter_ms = 300
//! exit_ms = 200
//! stack_ms = 250
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::position::Position;

/// Longest animation a configuration may request.
const MAX_ANIMATION_MS: u64 = 10_000;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or structure.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A timing value is zero or unreasonably long.
	#[error("invalid timing '{field}': {value}ms (expected 1..={max})", max = MAX_ANIMATION_MS)]
	InvalidTiming {
		/// The offending key under `[timing]`.
		field: &'static str,
		/// The rejected value in milliseconds.
		value: u64,
	},
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagesConfig {
	/// Show up to two messages at once, one behind the other.
	pub stacking: bool,
	/// Animation durations.
	pub timing: TimingConfig,
}

/// Animation durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
	/// Entering from off screen.
	pub enter_ms: u64,
	/// Leaving the screen.
	pub exit_ms: u64,
	/// Moving between the front and back slots.
	pub stack_ms: u64,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			enter_ms: 300,
			exit_ms: 200,
			stack_ms: 250,
		}
	}
}

impl TimingConfig {
	/// Duration of a move between two positions.
	pub fn duration_for(&self, from: Position, to: Position) -> Duration {
		let millis = match (from, to) {
			(_, Position::Invisible) => self.exit_ms,
			(Position::Invisible, _) => self.enter_ms,
			_ => self.stack_ms,
		};
		Duration::from_millis(millis)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		for (field, value) in [
			("enter_ms", self.enter_ms),
			("exit_ms", self.exit_ms),
			("stack_ms", self.stack_ms),
		] {
			if value == 0 || value > MAX_ANIMATION_MS {
				return Err(ConfigError::InvalidTiming { field, value });
			}
		}
		Ok(())
	}
}

impl MessagesConfig {
	/// Parses and validates configuration text.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.timing.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), stacking = config.stacking, "Loaded messages config");
		Ok(config)
	}
}
