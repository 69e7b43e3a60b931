use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Replay message banner scenarios through the presentation coordinator")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Replay a scenario file and print the final state
	Run {
		/// Scenario file (TOML list of `[[step]]` tables)
		scenario: PathBuf,

		/// Presentation configuration
		#[arg(long, short = 'c', value_name = "PATH")]
		config: Option<PathBuf>,

		/// Force stacked presentation regardless of configuration
		#[arg(long)]
		stacking: bool,
	},
	/// Validate a configuration file
	CheckConfig {
		/// Configuration file to validate.
		path: PathBuf,
	},
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn run_accepts_global_verbose_after_subcommand() {
		let cli = Cli::try_parse_from(["marquee", "run", "demo.toml", "--stacking", "-v"]).unwrap();
		assert!(cli.verbose);
		match cli.command {
			Command::Run { scenario, config, stacking } => {
				assert_eq!(scenario, PathBuf::from("demo.toml"));
				assert_eq!(config, None);
				assert!(stacking);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}
}
