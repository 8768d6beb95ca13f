use crate::ExtractError;
use calamine::{Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

const COLUMN_GAP: &str = "  ";

/// First worksheet of an xlsx/xls workbook, rendered as a table.
pub(super) fn workbook_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::Extraction(format!("spreadsheet error: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExtractError::Extraction("workbook has no worksheets".into()))?
        .map_err(|e| ExtractError::Extraction(format!("spreadsheet error: {e}")))?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    Ok(render_table(&rows))
}

/// CSV with a header row, rendered as a table.
pub(super) fn csv_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    let headers = reader
        .headers()
        .map_err(|e| ExtractError::Extraction(format!("CSV error: {e}")))?;
    rows.push(headers.iter().map(str::to_string).collect::<Vec<_>>());
    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::Extraction(format!("CSV error: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(render_table(&rows))
}

/// Right-aligned columns separated by two spaces. Short rows are padded.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = String::new();
        for (col, width) in widths.iter().enumerate() {
            if col > 0 {
                line.push_str(COLUMN_GAP);
            }
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            line.push_str(&format!("{cell:>width$}"));
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{csv_text, render_table, workbook_text};

    #[test]
    fn csv_renders_header_first_and_aligned() {
        let text = csv_text(b"name,qty\nwidget,3\nsprocket,12\n").unwrap();
        assert_eq!(text, "    name  qty\n  widget    3\nsprocket   12");
    }

    #[test]
    fn ragged_rows_are_padded() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["long".to_string()],
        ];
        assert_eq!(render_table(&rows), "   a  b\nlong");
    }

    #[test]
    fn empty_csv_is_empty_text() {
        assert_eq!(csv_text(b"").unwrap(), "");
    }

    #[test]
    fn garbage_workbook_fails_cleanly() {
        assert!(workbook_text(b"definitely not a spreadsheet").is_err());
    }
}
