//! Marquee scenario runner.
//!
//! Replays scripted message queues through the presentation coordinator on a
//! frame-driven timeline and prints what was shown, hidden and recorded.

use anyhow::Context;
use clap::Parser;
use marquee_messages::MessagesConfig;

mod cli;
mod scenario;

use cli::{Cli, Command};
use scenario::Scenario;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	match cli.command {
		Command::Run {
			scenario,
			config,
			stacking,
		} => {
			let mut config = match config {
				Some(path) => MessagesConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
				None => MessagesConfig::default(),
			};
			config.stacking |= stacking;

			let scenario = Scenario::load(&scenario)?;
			tracing::info!(steps = scenario.steps.len(), stacking = config.stacking, "Replaying scenario");
			let report = scenario::run(&scenario, &config)?;
			print!("{report}");
		}
		Command::CheckConfig { path } => {
			let config = MessagesConfig::load(&path).with_context(|| format!("checking {}", path.display()))?;
			println!(
				"{}: ok (stacking: {}, enter {}ms, exit {}ms, stack {}ms)",
				path.display(),
				config.stacking,
				config.timing.enter_ms,
				config.timing.exit_ms,
				config.timing.stack_ms
			);
		}
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("marquee_messages=trace,marquee=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
