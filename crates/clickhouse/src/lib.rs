//! `ClickHouse` access for photoscope: the photo row model, a read-only
//! client for the API handlers and a writer used by the ingest tool.

mod models;
mod reader;
pub mod schema;
mod writer;

pub use models::{PhotoField, PhotoRow};
pub use reader::ClickhouseReader;
pub use writer::ClickhouseWriter;
