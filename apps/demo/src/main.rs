use std::{path::PathBuf, sync::Arc};

use animation::{Animation, AnimationOutcome, Animator, StepValue};
use anyhow::{Context, Result};
use bossbar::{BossBar, Observer, ObserverError, ObserverHandle};
use clap::{Args, Parser, Subcommand};
use shared::{
    domain::{BarColor, ObserverId},
    protocol::BossEvent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(about = "Runs a boss bar animation against console observers")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Number of console observers attached to the bar.
    #[arg(long, default_value_t = 1)]
    observers: i64,
    /// Milliseconds between steps; defaults to the configured speed.
    #[arg(long)]
    speed_ms: Option<u64>,
    /// Start the same animation twice to show the second one being skipped.
    #[arg(long)]
    concurrent: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RangeArgs {
    #[arg(long, default_value_t = 0)]
    from: i64,
    #[arg(long, default_value_t = 100)]
    to: i64,
    #[arg(long)]
    step: Option<i64>,
}

#[derive(Args, Debug)]
struct ColorArgs {
    /// Comma separated color names; defaults to the configured list.
    #[arg(long)]
    colors: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ascend(RangeArgs),
    Descend(RangeArgs),
    Pulse(RangeArgs),
    Cycle(ColorArgs),
    CycleRandom(ColorArgs),
    /// List the color names the bar understands.
    Colors,
}

struct ConsoleObserver {
    id: ObserverId,
}

impl Observer for ConsoleObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn send(&self, event: BossEvent) -> Result<(), ObserverError> {
        let line = serde_json::to_string(&event).map_err(|e| ObserverError::Rejected {
            observer_id: self.id,
            reason: e.to_string(),
        })?;
        println!("observer={} {line}", self.id);
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config);
    let speed_ms = cli.speed_ms.unwrap_or(settings.speed_ms);

    let configured_colors = |override_list: Option<String>| -> Result<Vec<BarColor>> {
        let colors = match override_list {
            Some(raw) => BarColor::parse_list(&raw),
            None => settings.colors(),
        };
        colors.context("invalid color list")
    };

    let animation = match cli.command {
        Command::Colors => {
            for color in BarColor::ALL {
                println!("{:>2} {color}", color.id());
            }
            return Ok(());
        }
        Command::Ascend(range) => Animation::Ascend {
            current: range.from,
            max: range.to,
            step: range.step.unwrap_or(settings.step),
        },
        Command::Descend(range) => Animation::Descend {
            current: range.from,
            min: range.to,
            step: range.step.unwrap_or(settings.step),
        },
        Command::Pulse(range) => Animation::Pulse {
            current: range.from,
            max: range.to,
            step: range.step.unwrap_or(settings.step),
        },
        Command::Cycle(args) => Animation::CycleColor {
            colors: configured_colors(args.colors)?,
        },
        Command::CycleRandom(args) => Animation::CycleColorRandom {
            colors: configured_colors(args.colors)?,
        },
    };

    let bar = Arc::new(BossBar::new(settings.darken_screen));
    bar.set_title(settings.title.clone())
        .await
        .context("failed to set bar title")?;
    let observers: Vec<ObserverHandle> = (1..=cli.observers)
        .map(|id| Arc::new(ConsoleObserver { id: ObserverId(id) }) as ObserverHandle)
        .collect();
    bar.add_observers(&observers)
        .await
        .context("failed to attach observers")?;

    let animator = Animator::new();
    let runs = if cli.concurrent { 2 } else { 1 };
    let tasks: Vec<_> = (0..runs)
        .map(|run| {
            animator.spawn(
                Arc::clone(&bar),
                animation.clone(),
                speed_ms,
                move |value, bar: &BossBar| {
                    match value {
                        StepValue::Percentage(percentage) => {
                            info!(run, bar_id = bar.id().0, percentage, "demo: step")
                        }
                        StepValue::Color(color) => {
                            info!(run, bar_id = bar.id().0, %color, applied = %bar.color(), "demo: step")
                        }
                    }
                    Ok(())
                },
            )
        })
        .collect();

    for (run, task) in tasks.into_iter().enumerate() {
        match task.join().await? {
            AnimationOutcome::Completed => {
                info!(run, animation = animation.name(), "demo: animation completed")
            }
            AnimationOutcome::Skipped => warn!(
                run,
                animation = animation.name(),
                "demo: bar already animating, run skipped"
            ),
        }
    }

    info!("demo: {bar}");
    bar.close().await;
    Ok(())
}
