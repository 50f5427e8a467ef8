use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::models::EventData;
use crate::page::{
    ResultsPage, ERROR_MARKER, EVENT_DATE_SELECTORS, EVENT_NAME_SELECTORS, TABLE_FIRST_ROW,
};
use crate::paginator::{collect_results, Paging};
use crate::parser::ColumnLayout;
use crate::writer::Checkpoint;

/// What happened to one event ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Collected this many rows and checkpointed.
    Collected(usize),
    /// Table rendered but held no result rows.
    Empty,
    /// No results table appeared.
    Missing,
    /// Loading, paging or checkpointing raised an error.
    Failed,
}

/// Counts returned after the crawl.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub visited: usize,
    pub collected: usize,
    pub empty: usize,
    pub missing: usize,
    pub failed: usize,
    pub rows: usize,
}

impl CrawlStats {
    fn record(&mut self, outcome: EventOutcome) {
        self.visited += 1;
        match outcome {
            EventOutcome::Collected(n) => {
                self.collected += 1;
                self.rows += n;
            }
            EventOutcome::Empty => self.empty += 1,
            EventOutcome::Missing => self.missing += 1,
            EventOutcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    Table,
    ErrorMarker,
}

/// Visit every configured event ID in descending order, checkpointing after
/// each event that yields rows. Per-event failures are logged and skipped.
pub async fn crawl<P: ResultsPage, C: Checkpoint>(
    page: &P,
    cfg: &CrawlConfig,
    checkpoint: &mut C,
    pb: &ProgressBar,
) -> Result<(Vec<EventData>, CrawlStats)> {
    let layout = ColumnLayout::default();
    let mut events: Vec<EventData> = Vec::new();
    let mut stats = CrawlStats::default();

    for id in cfg.event_ids() {
        pb.set_message(format!("event {}", id));
        let outcome = match scrape_event(page, cfg, &layout, id).await {
            Ok(Some(event)) if !event.results.is_empty() => {
                let rows = event.results.len();
                info!("Event {} ({}, {}): {} results", event.id, event.name, event.date, rows);
                events.push(event);
                match checkpoint.save(&events) {
                    Ok(()) => EventOutcome::Collected(rows),
                    Err(e) => {
                        warn!("Checkpoint after event {} failed: {:#}", id, e);
                        EventOutcome::Failed
                    }
                }
            }
            Ok(Some(_)) => {
                info!("Event {}: no results, skipping", id);
                EventOutcome::Empty
            }
            Ok(None) => EventOutcome::Missing,
            Err(e) => {
                warn!("Event {} failed: {:#}", id, e);
                EventOutcome::Failed
            }
        };
        stats.record(outcome);
        pb.inc(1);

        tokio::time::sleep(cfg.event_delay).await;
    }

    Ok((events, stats))
}

/// Load one event and collect its rows. `Ok(None)` when the page never
/// showed a results table.
async fn scrape_event<P: ResultsPage>(
    page: &P,
    cfg: &CrawlConfig,
    layout: &ColumnLayout,
    id: u32,
) -> Result<Option<EventData>> {
    let url = cfg.event_url(id);
    debug!("Visiting {}", url);
    page.goto(&url, cfg.navigation_timeout)
        .await
        .with_context(|| format!("Failed to load event {}", id))?;

    match wait_for_landing(page, cfg).await {
        Some(Landing::Table) => {}
        Some(Landing::ErrorMarker) => debug!("Event {}: error message shown", id),
        None => {
            info!("Event {}: neither results nor error appeared, skipping", id);
            return Ok(None);
        }
    }

    if page.wait_for(TABLE_FIRST_ROW, cfg.probe_timeout).await.is_err() {
        info!("Event {}: no results table, skipping", id);
        return Ok(None);
    }

    let name = first_text(page, EVENT_NAME_SELECTORS)
        .await
        .unwrap_or_else(|| format!("Event {}", id));
    let date = first_text(page, EVENT_DATE_SELECTORS)
        .await
        .unwrap_or_else(today);

    let paging = Paging {
        rows_timeout: cfg.rows_timeout,
        turn_delay: cfg.page_turn_delay,
    };
    let results = collect_results(page, layout, paging).await?;

    Ok(Some(EventData {
        id,
        name,
        date,
        results,
    }))
}

/// Race the results table against the error marker. `None` if both waits
/// time out.
async fn wait_for_landing<P: ResultsPage>(page: &P, cfg: &CrawlConfig) -> Option<Landing> {
    let table = page.wait_for(TABLE_FIRST_ROW, cfg.probe_timeout);
    let error = page.wait_for(ERROR_MARKER, cfg.probe_timeout);
    tokio::pin!(table, error);

    let mut table_done = false;
    let mut error_done = false;
    loop {
        tokio::select! {
            r = &mut table, if !table_done => {
                if r.is_ok() {
                    return Some(Landing::Table);
                }
                table_done = true;
            }
            r = &mut error, if !error_done => {
                if r.is_ok() {
                    return Some(Landing::ErrorMarker);
                }
                error_done = true;
            }
            else => return None,
        }
    }
}

/// First non-empty text among `selectors`; lookup errors count as empty.
async fn first_text<P: ResultsPage>(page: &P, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        match page.text_of(sel).await {
            Ok(Some(text)) if !text.trim().is_empty() => return Some(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!("Reading `{}` failed: {:#}", sel, e),
        }
    }
    None
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
