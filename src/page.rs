use std::time::Duration;

use anyhow::Result;

/// First body row of the results table.
pub const TABLE_FIRST_ROW: &str = "table tbody tr:first-child";
pub const RESULT_ROWS: &str = "table tbody tr";
pub const ERROR_MARKER: &str = ".error-message";
pub const NEXT_PAGE: &str = r#"button[aria-label="Next page"]"#;

/// Tried in order; first non-empty text wins.
pub const EVENT_NAME_SELECTORS: &[&str] = &["h1", ".event-name", ".v-card__title", ".v-toolbar__title"];
pub const EVENT_DATE_SELECTORS: &[&str] = &[".event-date", ".v-card__subtitle", "time"];

/// The browser operations the crawl relies on. Implemented over a live
/// Chrome tab, and by an in-memory page in tests.
#[allow(async_fn_in_trait)]
pub trait ResultsPage {
    /// Navigate and wait for the page to settle, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Resolve once `selector` matches something, or fail after `timeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Inner text of the first match, `None` if nothing matches.
    async fn text_of(&self, selector: &str) -> Result<Option<String>>;

    /// Serialized DOM of the current page.
    async fn html(&self) -> Result<String>;

    /// Click the first match if it exists and is not disabled. Returns
    /// whether a click happened.
    async fn click_enabled(&self, selector: &str) -> Result<bool>;
}

/// True when an element's attributes mark it as a disabled control.
pub fn is_disabled(disabled: Option<&str>, aria_disabled: Option<&str>, class: Option<&str>) -> bool {
    disabled.is_some()
        || aria_disabled.is_some_and(|v| v.eq_ignore_ascii_case("true"))
        || class.is_some_and(|c| c.split_whitespace().any(|c| c.ends_with("--disabled")))
}

/// Tracks main-frame lifecycle events after a navigation. The page counts as
/// settled at the first `networkIdle` following the new document's `init`;
/// earlier idles belong to the page being left.
#[derive(Debug, Default)]
pub struct NetworkSettle {
    started: bool,
}

impl NetworkSettle {
    /// Feed one lifecycle event name; true once the network has settled.
    pub fn observe(&mut self, name: &str) -> bool {
        match name {
            "init" => {
                self.started = true;
                false
            }
            "networkIdle" => self.started,
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::time::Duration;

    use anyhow::{anyhow, bail, Result};

    use super::*;

    /// One event as the fake site serves it.
    #[derive(Default, Clone)]
    pub struct FakeEvent {
        /// Rows per results page; each row is its cell texts.
        pub pages: Vec<Vec<Vec<String>>>,
        /// Render a "No data available" row instead of data rows.
        pub placeholder: bool,
        pub error_marker: bool,
        pub fail_navigation: bool,
        /// Selector → inner text.
        pub texts: HashMap<String, String>,
    }

    impl FakeEvent {
        pub fn with_pages(sizes: &[usize]) -> Self {
            let pages = sizes
                .iter()
                .enumerate()
                .map(|(p, &n)| (0..n).map(|i| lifter_row(&format!("Lifter {}-{}", p, i))).collect())
                .collect();
            Self {
                pages,
                ..Default::default()
            }
        }

        pub fn has_table(&self) -> bool {
            self.placeholder || self.pages.iter().any(|p| !p.is_empty())
        }
    }

    pub fn lifter_row(name: &str) -> Vec<String> {
        let mut row: Vec<String> = vec![String::new(); 16];
        row[3] = name.to_string();
        row[4] = "73.2".into();
        for (i, v) in ["80", "84", "-87", "84", "105", "100", "105", "-110"].iter().enumerate() {
            row[8 + i] = v.to_string();
        }
        row
    }

    #[derive(Default)]
    pub struct FakePage {
        pub events: HashMap<String, FakeEvent>,
        pub visited: RefCell<Vec<String>>,
        pub clicks: Cell<usize>,
        current: RefCell<Option<String>>,
        page_idx: Cell<usize>,
    }

    impl FakePage {
        pub fn new(events: impl IntoIterator<Item = (String, FakeEvent)>) -> Self {
            Self {
                events: events.into_iter().collect(),
                ..Default::default()
            }
        }

        fn current(&self) -> Option<FakeEvent> {
            let url = self.current.borrow();
            url.as_ref().and_then(|u| self.events.get(u)).cloned()
        }
    }

    impl ResultsPage for FakePage {
        async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.visited.borrow_mut().push(url.to_string());
            *self.current.borrow_mut() = Some(url.to_string());
            self.page_idx.set(0);
            match self.events.get(url) {
                Some(ev) if ev.fail_navigation => bail!("navigation to {} timed out", url),
                _ => Ok(()),
            }
        }

        async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
            let ev = self.current().unwrap_or_default();
            let present = match selector {
                TABLE_FIRST_ROW | RESULT_ROWS => ev.has_table(),
                ERROR_MARKER => ev.error_marker,
                other => ev.texts.contains_key(other),
            };
            if present {
                Ok(())
            } else {
                Err(anyhow!("timed out after {:?} waiting for `{}`", timeout, selector))
            }
        }

        async fn text_of(&self, selector: &str) -> Result<Option<String>> {
            Ok(self.current().and_then(|ev| ev.texts.get(selector).cloned()))
        }

        async fn html(&self) -> Result<String> {
            let ev = self.current().unwrap_or_default();
            let mut body = String::new();
            if ev.placeholder {
                body.push_str(r#"<tr><td colspan="16">No data available</td></tr>"#);
            } else if let Some(rows) = ev.pages.get(self.page_idx.get()) {
                for row in rows {
                    body.push_str("<tr>");
                    for cell in row {
                        body.push_str(&format!("<td>{}</td>", cell));
                    }
                    body.push_str("</tr>");
                }
            }
            Ok(format!("<html><body><table><tbody>{}</tbody></table></body></html>", body))
        }

        async fn click_enabled(&self, selector: &str) -> Result<bool> {
            if selector != NEXT_PAGE {
                return Ok(false);
            }
            let pages = self.current().map(|ev| ev.pages.len()).unwrap_or(0);
            let idx = self.page_idx.get();
            if idx + 1 < pages {
                self.page_idx.set(idx + 1);
                self.clicks.set(self.clicks.get() + 1);
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_detection() {
        assert!(is_disabled(Some(""), None, None));
        assert!(is_disabled(None, Some("true"), None));
        assert!(is_disabled(None, None, Some("v-btn v-btn--disabled")));
        assert!(!is_disabled(None, Some("false"), Some("v-btn v-btn--icon")));
        assert!(!is_disabled(None, None, None));
    }

    #[test]
    fn settles_on_idle_after_init() {
        let mut settle = NetworkSettle::default();
        let seen: Vec<bool> = ["init", "DOMContentLoaded", "load", "networkAlmostIdle", "networkIdle"]
            .iter()
            .map(|name| settle.observe(name))
            .collect();
        assert_eq!(seen, vec![false, false, false, false, true]);
    }

    #[test]
    fn idle_of_previous_document_ignored() {
        let mut settle = NetworkSettle::default();
        assert!(!settle.observe("networkIdle"));
        assert!(!settle.observe("load"));
        assert!(!settle.observe("init"));
        assert!(settle.observe("networkIdle"));
    }
}
