use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

pub const BASE_URL: &str = "https://usaweightlifting.sport80.com";
pub const RESULTS_PATH: &str = "/public/rankings/results";
pub const OUTPUT_PATH: &str = "data/competitionResults.ts";

/// Highest event ID; the crawl walks down from here.
pub const START_ID: u32 = 6178;
pub const END_ID: u32 = 5652;

pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const ROWS_TIMEOUT: Duration = Duration::from_secs(30);
pub const PAGE_TURN_DELAY: Duration = Duration::from_secs(1);
pub const EVENT_DELAY: Duration = Duration::from_secs(2);

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything the crawl loop needs to know, resolved once at startup.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub start_id: u32,
    pub end_id: u32,
    pub output: PathBuf,
    pub navigation_timeout: Duration,
    pub probe_timeout: Duration,
    pub rows_timeout: Duration,
    pub page_turn_delay: Duration,
    pub event_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            start_id: START_ID,
            end_id: END_ID,
            output: PathBuf::from(OUTPUT_PATH),
            navigation_timeout: NAVIGATION_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            rows_timeout: ROWS_TIMEOUT,
            page_turn_delay: PAGE_TURN_DELAY,
            event_delay: EVENT_DELAY,
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start_id < self.end_id {
            bail!(
                "start ID {} is below end ID {}; the crawl runs from start down to end",
                self.start_id,
                self.end_id
            );
        }
        Ok(())
    }

    /// Event IDs in visiting order: `start_id` down to `end_id`, inclusive.
    pub fn event_ids(&self) -> impl Iterator<Item = u32> {
        (self.end_id..=self.start_id).rev()
    }

    pub fn event_count(&self) -> usize {
        if self.start_id < self.end_id {
            0
        } else {
            (self.start_id - self.end_id) as usize + 1
        }
    }

    pub fn event_url(&self, id: u32) -> String {
        format!("{}{}/{}", self.base_url.trim_end_matches('/'), RESULTS_PATH, id)
    }
}

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub width: u32,
    pub height: u32,
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}
