use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys the row preparer derives for every row.
pub const ROW_INDEX_KEY: &str = "row_index";
pub const IS_MIDDLE_ROW_KEY: &str = "is_middle_row";

/// One line of the goods table, as entered on the invoice form.
///
/// Fields are free-form (`from`, `to`, `description`, `quantity`, ...) and kept
/// in insertion order. Nothing is validated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRow(Map<String, Value>);

impl ItemRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ItemRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An item row tagged with its table position.
///
/// Serializes as a single flat map: the source fields followed by
/// `row_index` and `is_middle_row`. Derived keys replace any source key of the
/// same name.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub fields: ItemRow,
    pub row_index: usize,
    pub is_middle_row: bool,
}

impl Serialize for EnrichedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let source = self
            .fields
            .fields()
            .iter()
            .filter(|(k, _)| k.as_str() != ROW_INDEX_KEY && k.as_str() != IS_MIDDLE_ROW_KEY);

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in source {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(ROW_INDEX_KEY, &self.row_index)?;
        map.serialize_entry(IS_MIDDLE_ROW_KEY, &self.is_middle_row)?;
        map.end()
    }
}

/// A stored export invoice. Every field is optional; the assembler fills gaps.
///
/// Scalars are read leniently: numbers are accepted where text is expected
/// and a value of the wrong shape reads as absent instead of failing the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub buyer_order_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub buyer_order_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub exporter_reference: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub iec_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub tax_registration_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub lut_arn_number: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub delivery_payment_terms: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub port_of_loading: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub port_of_discharge: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub pre_carriage_by: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub place_of_receipt: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub port_of_destination: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub destination: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub vessel_flight: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub country_of_origin: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub ad_code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub other_reference: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub hs_code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub final_destination: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub contact_person_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub contact_email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub consignee_address: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub delivery_address: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub amount_in_words: Option<String>,
    #[serde(deserialize_with = "lenient::amount")]
    pub total_export_value: Option<String>,
    #[serde(deserialize_with = "lenient::amount")]
    pub total_gst_value: Option<String>,
    #[serde(deserialize_with = "lenient::amount")]
    pub total_invoice_value: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub number_of_boxes: Option<i64>,
    #[serde(deserialize_with = "lenient::amount")]
    pub taxable_value: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub igst_percent: Option<String>,
    #[serde(deserialize_with = "lenient::amount")]
    pub igst_amount: Option<String>,
    #[serde(deserialize_with = "lenient::items")]
    pub items: Option<Vec<ItemRow>>,
}

mod lenient {
    use super::*;

    // Integers up to 2^53 survive an f64 round trip.
    const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Numeric amounts are written with two decimals, strings are kept as-is.
    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => n.as_f64().map(|v| format!("{v:.2}")),
            _ => None,
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|v| v.fract() == 0.0 && v.abs() <= MAX_EXACT_FLOAT)
                    .map(|v| v as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Non-table entries in the list are dropped.
    pub fn items<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<ItemRow>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(values) => Some(
                values
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(ItemRow(map)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enriched_row_serializes_flat() {
        let row = EnrichedRow {
            fields: ItemRow::new()
                .with("description", "Valves")
                .with("quantity", "10"),
            row_index: 2,
            is_middle_row: true,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            json!({
                "description": "Valves",
                "quantity": "10",
                "row_index": 2,
                "is_middle_row": true
            })
        );
    }

    #[test]
    fn derived_keys_override_source_keys() {
        let row = EnrichedRow {
            fields: ItemRow::new()
                .with("row_index", 99)
                .with("is_middle_row", "yes"),
            row_index: 1,
            is_middle_row: false,
        };

        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"row_index":1,"is_middle_row":false}"#);
    }

    #[test]
    fn record_parses_partial_toml() {
        let record: InvoiceRecord = toml::from_str(
            r#"
            invoice_number = "ZC/2024/017"
            number_of_boxes = 0
            unknown_field = "ignored"

            [[items]]
            from = "1"
            to = "10"
            description = "Industrial Valves"
            "#,
        )
        .unwrap();

        assert_eq!(record.invoice_number.as_deref(), Some("ZC/2024/017"));
        assert_eq!(record.number_of_boxes, Some(0));
        assert_eq!(record.currency, None);
        let items = record.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("to"), Some(&json!("10")));
    }

    #[test]
    fn item_row_keeps_insertion_order() {
        let row: ItemRow = [("to", "10"), ("from", "1"), ("amount", "1500.00")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = row.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["to", "from", "amount"]);
    }

    #[test]
    fn numeric_toml_scalars_are_accepted() {
        let record: InvoiceRecord = toml::from_str(
            r#"
            hs_code = 84818030
            total_invoice_value = 5900.00
            total_gst_value = 900
            igst_percent = 18
            number_of_boxes = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(record.hs_code.as_deref(), Some("84818030"));
        assert_eq!(record.total_invoice_value.as_deref(), Some("5900.00"));
        assert_eq!(record.total_gst_value.as_deref(), Some("900.00"));
        assert_eq!(record.igst_percent.as_deref(), Some("18"));
        assert_eq!(record.number_of_boxes, Some(30));
    }

    #[test]
    fn json_numeric_strings_are_accepted() {
        let record: InvoiceRecord = serde_json::from_str(
            r#"{"number_of_boxes": " 30 ", "taxable_value": 1500.5, "invoice_number": 17}"#,
        )
        .unwrap();

        assert_eq!(record.number_of_boxes, Some(30));
        assert_eq!(record.taxable_value.as_deref(), Some("1500.50"));
        assert_eq!(record.invoice_number.as_deref(), Some("17"));
    }

    #[test]
    fn unreadable_scalars_fall_back_to_absent() {
        let record: InvoiceRecord = serde_json::from_str(
            r#"{
                "number_of_boxes": "thirty",
                "currency": null,
                "total_export_value": {"amount": 1},
                "contact_email": ["a@b.c"],
                "invoice_date": "2024-12-09"
            }"#,
        )
        .unwrap();

        assert_eq!(record.number_of_boxes, None);
        assert_eq!(record.currency, None);
        assert_eq!(record.total_export_value, None);
        assert_eq!(record.contact_email, None);
        assert_eq!(record.invoice_date.as_deref(), Some("2024-12-09"));
    }

    #[test]
    fn malformed_items_are_skipped() {
        let record: InvoiceRecord =
            serde_json::from_str(r#"{"items": [{"from": "1"}, "stray", 4, {"from": "11"}]}"#)
                .unwrap();
        let items = record.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].get("from"), Some(&json!("11")));

        let record: InvoiceRecord = serde_json::from_str(r#"{"items": "none"}"#).unwrap();
        assert_eq!(record.items, None);
    }
}
