pub mod client;
pub mod error;
pub mod query;
pub mod result;

pub use client::{HttpScreenerClient, ScreenerClient};
pub use query::{Column, Condition, Query};
pub use result::{ScanMetadata, ScanResult, Table};
