use serde::Serialize;
use tracing::debug;

use crate::layout::compute_anchor;
use crate::model::{EnrichedRow, ItemRow};

pub const ZERO_AMOUNT: &str = "0.00";

/// Tax figures shown next to the anchor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryFields {
    pub taxable_value: String,
    pub igst_percent: String,
    pub igst_amount: String,
}

impl SummaryFields {
    /// Missing or empty values become `"0.00"`. Anything else is kept as-is.
    pub fn new(
        taxable_value: Option<&str>,
        igst_percent: Option<&str>,
        igst_amount: Option<&str>,
    ) -> Self {
        Self {
            taxable_value: amount_or_zero(taxable_value),
            igst_percent: amount_or_zero(igst_percent),
            igst_amount: amount_or_zero(igst_amount),
        }
    }
}

impl Default for SummaryFields {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// The goods table ready for the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub rows: Vec<EnrichedRow>,
    pub middle_row: usize,
    pub total_items: usize,
    #[serde(flatten)]
    pub summary: SummaryFields,
}

pub(crate) fn amount_or_zero(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => ZERO_AMOUNT.to_string(),
    }
}

/// Tags each item with its 1-based position and marks the anchor row.
///
/// The caller's items are left untouched; every output row owns a copy of its
/// fields.
pub fn prepare_rows(
    items: &[ItemRow],
    taxable_value: Option<&str>,
    igst_percent: Option<&str>,
    igst_amount: Option<&str>,
) -> TableData {
    let total_items = items.len();
    let middle_row = compute_anchor(i64::try_from(total_items).unwrap_or(i64::MAX));

    let rows: Vec<EnrichedRow> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let row_index = i + 1;
            EnrichedRow {
                fields: item.clone(),
                row_index,
                is_middle_row: row_index == middle_row,
            }
        })
        .collect();

    debug!(total_items, middle_row, "prepared table rows");

    TableData {
        rows,
        middle_row,
        total_items,
        summary: SummaryFields::new(taxable_value, igst_percent, igst_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: usize) -> Vec<ItemRow> {
        (1..=n)
            .map(|i| {
                ItemRow::new()
                    .with("from", (i * 10 - 9).to_string())
                    .with("to", (i * 10).to_string())
                    .with("description", format!("Item {i}"))
                    .with("quantity", "5")
            })
            .collect()
    }

    #[test]
    fn exactly_one_middle_row() {
        for n in 1..=25 {
            let table = prepare_rows(&items(n), None, None, None);
            let marked: Vec<_> = table.rows.iter().filter(|r| r.is_middle_row).collect();
            assert_eq!(marked.len(), 1, "n = {n}");
            assert_eq!(marked[0].row_index, compute_anchor(n as i64));
            assert_eq!(table.middle_row, marked[0].row_index);
        }
    }

    #[test]
    fn anchor_for_typical_sizes() {
        for (n, expected) in [(1, 1), (5, 3), (6, 3), (10, 5)] {
            assert_eq!(prepare_rows(&items(n), None, None, None).middle_row, expected);
        }
    }

    #[test]
    fn empty_items() {
        let table = prepare_rows(&[], None, None, None);
        assert!(table.rows.is_empty());
        assert_eq!(table.total_items, 0);
        assert_eq!(table.middle_row, 1);
    }

    #[test]
    fn order_and_fields_preserved() {
        let source = items(4);
        let table = prepare_rows(&source, None, None, None);

        for (i, (row, item)) in table.rows.iter().zip(&source).enumerate() {
            assert_eq!(row.row_index, i + 1);
            assert_eq!(&row.fields, item);
        }
    }

    #[test]
    fn source_items_are_not_mutated() {
        let source = items(3);
        let before = source.clone();
        let table = prepare_rows(&source, None, None, None);

        assert_eq!(source, before);
        assert!(source.iter().all(|item| item.get("row_index").is_none()));
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn summary_defaults() {
        let table = prepare_rows(&items(2), None, Some(""), Some("90.00"));
        assert_eq!(table.summary.taxable_value, "0.00");
        assert_eq!(table.summary.igst_percent, "0.00");
        assert_eq!(table.summary.igst_amount, "90.00");
    }

    #[test]
    fn summary_values_pass_through_unparsed() {
        let summary = SummaryFields::new(Some("1,000.00"), Some("18%"), Some(" "));
        assert_eq!(summary.taxable_value, "1,000.00");
        assert_eq!(summary.igst_percent, "18%");
        assert_eq!(summary.igst_amount, " ");
    }

    #[test]
    fn serializes_with_flat_summary() {
        let table = prepare_rows(&items(1), Some("1000.00"), Some("5"), Some("50.00"));
        let value = serde_json::to_value(&table).unwrap();

        assert_eq!(value["middle_row"], json!(1));
        assert_eq!(value["total_items"], json!(1));
        assert_eq!(value["taxable_value"], json!("1000.00"));
        assert_eq!(value["igst_percent"], json!("5"));
        assert_eq!(value["rows"][0]["is_middle_row"], json!(true));
        assert_eq!(value["rows"][0]["description"], json!("Item 1"));
    }
}
