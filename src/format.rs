//! Text rendering of query results
//!
//! One table shape serves both audiences: the terminal display and the
//! result text fed back to the model in the answer-synthesis prompt.

use prettytable::{Cell, Row, Table};

/// Render rows (header first) as an aligned text table with a row count
/// footer. Data rows shorter than the header are padded with empty cells.
pub fn render_table(data: &[Vec<String>]) -> String {
    if data.is_empty() {
        return "(no rows)".to_string();
    }

    let header = &data[0];
    let width = header.len();

    let mut table = Table::new();
    table.set_titles(Row::new(header.iter().map(|h| Cell::new(h)).collect()));

    for row in data.iter().skip(1) {
        let mut cells: Vec<Cell> = row.iter().map(|value| Cell::new(value)).collect();
        while cells.len() < width {
            cells.push(Cell::new(""));
        }
        table.add_row(Row::new(cells));
    }

    let row_count = data.len() - 1;
    format!(
        "{}({} {})",
        table,
        row_count,
        if row_count == 1 { "row" } else { "rows" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Vec<Vec<String>> {
        vec![
            vec!["id".to_string(), "name".to_string()],
            vec!["1".to_string(), "Alice".to_string()],
            vec!["2".to_string(), "Bob".to_string()],
        ]
    }

    #[rstest]
    fn test_renders_cells_and_row_count() {
        let rendered = render_table(&sample());
        assert!(rendered.contains("id"));
        assert!(rendered.contains("name"));
        assert!(rendered.contains("Alice"));
        assert!(rendered.contains("Bob"));
        assert!(rendered.ends_with("(2 rows)"));
    }

    #[rstest]
    fn test_singular_row_count_for_one_row() {
        let data = vec![
            vec!["count".to_string()],
            vec!["42".to_string()],
        ];
        let rendered = render_table(&data);
        assert!(rendered.contains("42"));
        assert!(rendered.ends_with("(1 row)"));
    }

    #[rstest]
    fn test_header_only_data_counts_zero_rows() {
        let data = vec![vec!["id".to_string()]];
        assert!(render_table(&data).ends_with("(0 rows)"));
    }

    #[rstest]
    fn test_empty_data_is_a_no_rows_marker() {
        assert_eq!(render_table(&[]), "(no rows)");
    }

    #[rstest]
    fn test_short_rows_are_padded_to_header_width() {
        let data = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["only-one".to_string()],
        ];
        // Must not panic, and the value still shows up.
        let rendered = render_table(&data);
        assert!(rendered.contains("only-one"));
    }
}
