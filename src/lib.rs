//! Turns stored export invoices into the flat mapping the invoice template
//! renders, including which goods-table row carries the tax summary.

pub mod assemble;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod rows;
pub mod store;

pub use assemble::{assemble, RenderData};
pub use config::AppSettings;
pub use error::{Error, Result};
pub use layout::compute_anchor;
pub use model::{EnrichedRow, InvoiceRecord, ItemRow};
pub use rows::{prepare_rows, SummaryFields, TableData};
pub use store::RecordStore;
