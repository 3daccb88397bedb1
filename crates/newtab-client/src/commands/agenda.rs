//! One-shot agenda command.

use chrono::{Local, TimeZone};
use serde::Serialize;
use tracing::debug;

use newtab_core::{AgendaFormatter, JsonAgenda, OutputFormat};
use newtab_providers::{Aggregation, Aggregator, HttpClient, SourceReport, SourceStatus};

use crate::cli::OutputArgs;
use crate::config::{ClientConfig, DisplaySettings};
use crate::error::ClientResult;

/// JSON document printed by `agenda --json`.
#[derive(Debug, Serialize)]
pub struct AgendaOutput {
    #[serde(flatten)]
    pub agenda: JsonAgenda,
    /// Per-source status, present with `--sources`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceReport>>,
}

/// Validates the configuration and builds the aggregator it describes.
pub fn build_aggregator(config: &ClientConfig) -> ClientResult<Aggregator> {
    config.validate()?;
    let http = HttpClient::new(config.http_config())?;
    let plan = config.calendar.plan();
    let aggregator = Aggregator::from_plan(&plan, &http, config.aggregator_config());
    debug!(sources = ?aggregator.source_names(), "built aggregator");
    Ok(aggregator)
}

/// Fetches today's agenda once and prints it.
pub async fn run(config: &ClientConfig, args: OutputArgs) -> ClientResult<()> {
    let aggregator = build_aggregator(config)?;
    let aggregation = aggregator.aggregate().await;
    println!("{}", render(&aggregation, &Local, &config.display, args)?);
    Ok(())
}

/// Renders an aggregation for the terminal or as pretty JSON.
pub fn render<Tz: TimeZone>(
    aggregation: &Aggregation,
    tz: &Tz,
    display: &DisplaySettings,
    args: OutputArgs,
) -> ClientResult<String>
where
    Tz::Offset: std::fmt::Display,
{
    match args.output_format() {
        OutputFormat::Json => {
            let output = agenda_output(aggregation, tz, display, args.sources);
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Text => Ok(render_text(aggregation, tz, display, args.sources)),
    }
}

/// Builds the JSON document for an aggregation.
pub fn agenda_output<Tz: TimeZone>(
    aggregation: &Aggregation,
    tz: &Tz,
    display: &DisplaySettings,
    sources: bool,
) -> AgendaOutput
where
    Tz::Offset: std::fmt::Display,
{
    let agenda = aggregation.outcome.to_agenda(tz, display.time_format);
    AgendaOutput {
        agenda: AgendaFormatter::new(display.format_options()).format_json(&agenda),
        sources: sources.then(|| aggregation.reports.clone()),
    }
}

/// Renders the agenda as text, optionally followed by one line per source.
pub fn render_text<Tz: TimeZone>(
    aggregation: &Aggregation,
    tz: &Tz,
    display: &DisplaySettings,
    sources: bool,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let agenda = aggregation.outcome.to_agenda(tz, display.time_format);
    let mut text = AgendaFormatter::new(display.format_options()).format_text(&agenda);
    if sources && !aggregation.reports.is_empty() {
        text.push('\n');
        for report in &aggregation.reports {
            text.push('\n');
            text.push_str(&format_report(report));
        }
    }
    text
}

/// One status line per source, e.g. `ics:https://... ok (3 events)`.
pub fn format_report(report: &SourceReport) -> String {
    match &report.status {
        SourceStatus::Ok { events } => format!("{} ok ({} events)", report.source, events),
        SourceStatus::Failed { code, message } => {
            format!("{} failed: {}: {}", report.source, code, message)
        }
        SourceStatus::TimedOut => format!("{} timed out", report.source),
    }
}
