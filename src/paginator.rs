use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::CompetitionResult;
use crate::page::{ResultsPage, NEXT_PAGE, RESULT_ROWS};
use crate::parser::{parse_results, ColumnLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    MorePages,
    Done,
}

/// Timing for page turns.
#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub rows_timeout: Duration,
    pub turn_delay: Duration,
}

/// Collect result rows from the loaded event, following "Next page" until
/// the control is disabled or gone. A rows timeout aborts the whole event.
pub async fn collect_results<P: ResultsPage>(
    page: &P,
    layout: &ColumnLayout,
    paging: Paging,
) -> Result<Vec<CompetitionResult>> {
    let mut results = Vec::new();
    let mut state = State::MorePages;
    let mut page_no = 1usize;

    while state == State::MorePages {
        page.wait_for(RESULT_ROWS, paging.rows_timeout)
            .await
            .with_context(|| format!("Results page {} never rendered", page_no))?;

        let html = page.html().await?;
        let rows = parse_results(&html, layout);
        debug!("Page {}: {} rows", page_no, rows.len());
        results.extend(rows);

        if page.click_enabled(NEXT_PAGE).await? {
            tokio::time::sleep(paging.turn_delay).await;
            page.wait_for(RESULT_ROWS, paging.rows_timeout)
                .await
                .with_context(|| format!("Results page {} never rendered", page_no + 1))?;
            page_no += 1;
        } else {
            state = State::Done;
        }
    }

    Ok(results)
}
