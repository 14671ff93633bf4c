use crate::error::{EdaError, EdaResult};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

fn ensure_parent(path: &Path) -> EdaResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| EdaError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Write rows as CSV with a header line. `None` fields become empty cells.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> EdaResult<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).map_err(|e| EdaError::csv(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| EdaError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| EdaError::io(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> EdaResult<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| EdaError::io(path, e))?;
    Ok(())
}

/// Markdown preview of the first `max_rows` rows.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_preview(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChargerTypeSummaryRow;

    #[test]
    fn preview_is_markdown_and_truncated() {
        let rows = vec![
            ChargerTypeSummaryRow {
                charger_type_name: "CHAdeMO".to_string(),
                charger_count: 4,
                ev_sales_quantity: 10.0,
            },
            ChargerTypeSummaryRow {
                charger_type_name: "GB/T AC".to_string(),
                charger_count: 1,
                ev_sales_quantity: 0.0,
            },
        ];
        let out = render_preview(&rows, 1);
        assert!(out.contains("| ChargerType"));
        assert!(out.contains("CHAdeMO"));
        assert!(!out.contains("GB/T AC"));
        assert_eq!(render_preview::<ChargerTypeSummaryRow>(&[], 3), "(no rows)");
    }
}
