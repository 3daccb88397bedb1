//! Watch command: keeps the agenda on screen and refreshes it.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, warn};

use newtab_providers::Aggregator;

use crate::cli::OutputArgs;
use crate::commands::agenda::{agenda_output, build_aggregator, render_text};
use crate::config::{ClientConfig, DisplaySettings};
use crate::error::ClientResult;
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};

/// Runs the refresh loop until Ctrl-C.
///
/// Each line read from stdin (pressing Enter) triggers an immediate refresh.
pub async fn run(config: &ClientConfig, args: OutputArgs) -> ClientResult<()> {
    let aggregator = Arc::new(build_aggregator(config)?);
    let display = Arc::new(config.display.clone());
    let interval = config.refresh.calendar_interval();

    info!(
        interval_secs = interval.as_secs(),
        sources = aggregator.source_names().len(),
        "watching calendar"
    );

    let scheduler = Scheduler::new(SchedulerConfig::new(interval));
    let handle = scheduler.handle();

    let scheduler_task = tokio::spawn(scheduler.run(move || {
        let aggregator = aggregator.clone();
        let display = display.clone();
        async move { refresh(&aggregator, &display, args).await }
    }));

    spawn_enter_listener(handle.clone())?;

    tokio::signal::ctrl_c().await?;
    info!("interrupted, stopping");

    if let Err(e) = handle.stop().await {
        warn!(error = %e, "failed to send stop command to scheduler");
    }
    // A cycle in flight is bounded by the per-source timeout.
    let grace = config.aggregator_config().source_timeout + Duration::from_secs(1);
    if tokio::time::timeout(grace, scheduler_task).await.is_err() {
        warn!("scheduler did not stop in time");
    }

    Ok(())
}

async fn refresh(aggregator: &Aggregator, display: &DisplaySettings, args: OutputArgs) {
    let aggregation = aggregator.aggregate().await;

    if args.json {
        let output = agenda_output(&aggregation, &Local, display, args.sources);
        match serde_json::to_string(&output) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "failed to serialize agenda"),
        }
    } else {
        println!("-- {} --", Local::now().format("%a %d %b %H:%M"));
        println!("{}", render_text(&aggregation, &Local, display, args.sources));
        println!();
    }
}

/// Reads stdin on a dedicated thread and requests a refresh for every line.
///
/// The thread is detached so a pending read never delays shutdown.
fn spawn_enter_listener(handle: SchedulerHandle) -> ClientResult<()> {
    std::thread::Builder::new()
        .name("newtab-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if let Err(e) = line {
                    warn!(error = %e, "failed to read stdin");
                    break;
                }
                debug!("manual refresh requested");
                if handle.blocking_refresh_now().is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}
