use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::cells::ColumnLayout;
use crate::models::CompetitionResult;

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table tbody tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Raw text of every `<td>` in every body row of the first results table.
pub fn table_cells(html: &str) -> Vec<Vec<String>> {
    let doc = Html::parse_document(html);
    doc.select(&ROW_SEL).map(row_cells).collect()
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SEL)
        .map(|td| td.text().collect::<String>())
        .collect()
}

/// Extract result records from a rendered results page. Placeholder rows
/// (e.g. "No data available") are skipped.
pub fn parse_results(html: &str, layout: &ColumnLayout) -> Vec<CompetitionResult> {
    table_cells(html)
        .iter()
        .filter_map(|cells| layout.map_row(cells))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn event_page_rows() {
        let results = parse_results(&fixture("event_page"), &ColumnLayout::LEGACY);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].lifter, "Doe, Jane");
        assert_eq!(results[0].body_weight, 81.5);
        assert_eq!(results[0].snatch3, 0.0);
        assert_eq!(results[1].lifter, "Smith, J.");
        assert_eq!(results[1].cj1, 250.0);
        assert_eq!(results[1].total, 250.0);
        // DNF row keeps its name, zeros elsewhere
        assert_eq!(results[2].lifter, "Álvarez, María");
        assert_eq!(results[2].cj, 0.0);
    }

    #[test]
    fn empty_table_placeholder() {
        let html = fixture("empty_event");
        assert_eq!(table_cells(&html).len(), 1);
        assert!(parse_results(&html, &ColumnLayout::LEGACY).is_empty());
    }

    #[test]
    fn header_cells_ignored() {
        let html = "<table><thead><tr><th>Name</th></tr></thead><tbody></tbody></table>";
        assert!(table_cells(html).is_empty());
    }
}
