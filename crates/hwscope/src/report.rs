//! Rendering of the record set to stdout.

use anyhow::{Context, Result};
use platform_windows::HardwareItem;

use crate::config::OutputFormat;

const HEADERS: [&str; 4] = ["Category", "Name", "Value", "Notes"];

pub fn render(items: &[HardwareItem], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(items)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(items).context("failed serializing records to JSON")
        }
    }
}

/// Four left-aligned columns; the last column is not padded.
pub fn render_table(items: &[HardwareItem]) -> String {
    let rows: Vec<[&str; 4]> = items
        .iter()
        .map(|i| [i.category.as_str(), i.name.as_str(), i.value.as_str(), i.notes.as_str()])
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_row(&mut out, &rule.each_ref().map(String::as_str), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[&str; 4], widths: &[usize; 4]) {
    let mut line = String::new();
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            line.push_str(&format!("{cell:<width$}"));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<HardwareItem> {
        vec![
            HardwareItem::new("BIOS", "Vendor", "American Megatrends", "SMBIOS"),
            HardwareItem::new("Disk", "SerialNumber_0", "S64ANS0T", ""),
        ]
    }

    #[test]
    fn table_aligns_columns() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Category  Name            Value"));
        assert!(lines[1].starts_with("--------  --------------"));
        let value_col = lines[0].find("Value").expect("value column");
        assert_eq!(lines[2].find("American"), Some(value_col));
        assert_eq!(lines[3].find("S64ANS0T"), Some(value_col));
        assert!(lines[3].ends_with("S64ANS0T"));
    }

    #[test]
    fn json_is_an_array_of_records() {
        let raw = render(&sample(), OutputFormat::Json).expect("json");
        let parsed: Vec<HardwareItem> = serde_json::from_str(&raw).expect("parse");
        assert_eq!(parsed, sample());
    }
}
