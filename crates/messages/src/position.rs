//! Logical slots a message animates between.

use std::fmt;

/// Visual position of a message view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
	/// Off screen.
	#[default]
	Invisible,
	/// Fully visible, top of the stack.
	Front,
	/// Peeking out behind the front message.
	Back,
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Invisible => "invisible",
			Self::Front => "front",
			Self::Back => "back",
		};
		f.write_str(name)
	}
}
