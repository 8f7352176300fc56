pub mod collectors;
pub mod config;
pub mod models;
pub mod renderer;
pub mod tracker;

use crate::collectors::{SampleError, Sampler};
use crate::config::AppConfig;
use crate::renderer::GaugeView;
use anyhow::Context;
use chrono::{DateTime, Local};
use log::{debug, error, info};
use std::fmt;
use std::io;
use tokio::time::MissedTickBehavior;

/// A changed sample, ready to be drawn.
#[derive(Debug, Clone)]
pub struct Redraw {
    pub sampled_at: DateTime<Local>,
    pub view: GaugeView,
}

impl fmt::Display for Redraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.sampled_at.format("%H:%M:%S"), self.view)
    }
}

/// Samples once and returns what to redraw, or `None` if nothing changed.
pub fn tick(sampler: &mut Sampler, config: &AppConfig) -> Result<Option<Redraw>, SampleError> {
    let result = sampler.sample()?;
    if !result.changed {
        return Ok(None);
    }
    Ok(Some(Redraw {
        sampled_at: result.sampled_at,
        view: GaugeView::build(&result.snapshot, &config.display),
    }))
}

fn on_ctrl_c(signal: io::Result<()>) -> anyhow::Result<()> {
    signal.context("Failed to listen for Ctrl-C")?;
    info!("Interrupted, shutting down");
    Ok(())
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting application");

    let mut sampler = Sampler::open(&config.source.path)
        .context(format!("Cannot sample {}", config.source.path.display()))?;

    let outcome = tokio::select! {
        result = main_loop(&config, &mut sampler) => result,
        signal = tokio::signal::ctrl_c() => on_ctrl_c(signal),
    };
    sampler.close();

    if let Err(e) = outcome {
        error!("Application error: {e:#}");
        // Print chain of error causes
        for cause in e.chain().skip(1) {
            error!("Caused by: {cause}");
        }
        return Err(e).context("Application failed to run");
    }
    Ok(())
}

async fn main_loop(config: &AppConfig, sampler: &mut Sampler) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(config.sampling.interval_duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await; // Wait for the next tick

        match tick(sampler, config) {
            Ok(Some(redraw)) => info!("{redraw}"),
            Ok(None) => debug!("No change"),
            Err(e) if config.sampling.fail_fast => {
                return Err(e).context(format!("Sampling {} failed", sampler.path().display()));
            }
            Err(e) => error!("Skipping tick: {e}"),
        }
    }
}
