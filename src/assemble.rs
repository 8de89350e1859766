use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::Result;
use crate::model::{InvoiceRecord, ItemRow};
use crate::rows::{amount_or_zero, prepare_rows, TableData};

pub const DEFAULT_CURRENCY: &str = "INR";

const TEMPLATE_NAME: &str = "invoice";

/// Everything the invoice template reads, as one flat mapping.
///
/// Scalar keys are camelCase. `items` and `tableRows` both carry the raw
/// items; `rows` carries the enriched copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderData {
    pub invoice_number: String,
    pub invoice_date: String,
    pub buyer_order_number: String,
    pub buyer_order_date: String,
    pub exporter_reference: String,
    pub iec_number: String,
    pub tax_registration_number: String,
    pub lut_arn_number: String,
    pub delivery_payment_terms: String,
    pub port_of_loading: String,
    pub port_of_discharge: String,
    pub pre_carriage_by: String,
    pub place_of_receipt: String,
    pub port_of_destination: String,
    pub destination: String,
    pub currency: String,
    pub vessel_flight: String,
    pub country_of_origin: String,
    pub ad_code: String,
    pub other_reference: String,
    pub hs_code: String,
    pub final_destination: String,
    pub contact_person_name: String,
    pub contact_email: String,
    pub consignee_address: String,
    pub delivery_address: String,
    pub amount_in_words: String,
    pub total_export_value: String,
    pub total_gst_value: String,
    pub total_invoice_value: String,
    pub number_of_boxes: i64,
    pub items: Vec<ItemRow>,
    pub table_rows: Vec<ItemRow>,
    #[serde(flatten)]
    pub table: TableData,
}

impl RenderData {
    /// Hands the mapping to tera.
    pub fn to_context(&self) -> Result<Context> {
        Ok(Context::from_serialize(self)?)
    }

    /// Renders a single tera template file against this mapping.
    pub fn render_file(&self, template: &Path) -> Result<String> {
        let mut tera = Tera::default();
        tera.add_template_file(template, Some(TEMPLATE_NAME))?;
        Ok(tera.render(TEMPLATE_NAME, &self.to_context()?)?)
    }
}

fn text(value: &Option<String>) -> String {
    text_or(value, "")
}

fn text_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn money(value: &Option<String>) -> String {
    amount_or_zero(value.as_deref())
}

/// Builds the render mapping for one invoice. Missing fields never fail; they
/// come out blank, zero or `"INR"` for the currency.
pub fn assemble(record: &InvoiceRecord) -> RenderData {
    let items = record.items.clone().unwrap_or_default();
    let table = prepare_rows(
        &items,
        record.taxable_value.as_deref(),
        record.igst_percent.as_deref(),
        record.igst_amount.as_deref(),
    );

    debug!(
        invoice_number = record.invoice_number.as_deref().unwrap_or("<unset>"),
        total_items = table.total_items,
        middle_row = table.middle_row,
        "assembled invoice"
    );

    RenderData {
        invoice_number: text(&record.invoice_number),
        invoice_date: text(&record.invoice_date),
        buyer_order_number: text(&record.buyer_order_number),
        buyer_order_date: text(&record.buyer_order_date),
        exporter_reference: text(&record.exporter_reference),
        iec_number: text(&record.iec_number),
        tax_registration_number: text(&record.tax_registration_number),
        lut_arn_number: text(&record.lut_arn_number),
        delivery_payment_terms: text(&record.delivery_payment_terms),
        port_of_loading: text(&record.port_of_loading),
        port_of_discharge: text(&record.port_of_discharge),
        pre_carriage_by: text(&record.pre_carriage_by),
        place_of_receipt: text(&record.place_of_receipt),
        port_of_destination: text(&record.port_of_destination),
        destination: text(&record.destination),
        currency: text_or(&record.currency, DEFAULT_CURRENCY),
        vessel_flight: text(&record.vessel_flight),
        country_of_origin: text(&record.country_of_origin),
        ad_code: text(&record.ad_code),
        other_reference: text(&record.other_reference),
        hs_code: text(&record.hs_code),
        final_destination: text(&record.final_destination),
        contact_person_name: text(&record.contact_person_name),
        contact_email: text(&record.contact_email),
        consignee_address: text(&record.consignee_address),
        delivery_address: text(&record.delivery_address),
        amount_in_words: text(&record.amount_in_words),
        total_export_value: money(&record.total_export_value),
        total_gst_value: money(&record.total_gst_value),
        total_invoice_value: money(&record.total_invoice_value),
        // Some(0) is a real count and stays 0; only None is defaulted.
        number_of_boxes: record.number_of_boxes.unwrap_or(0),
        table_rows: items.clone(),
        items,
        table,
    }
}
