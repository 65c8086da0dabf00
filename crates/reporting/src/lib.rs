//! Read-side reporting: invoice and plan snapshots, receivables aging and
//! the dashboard KPIs.
//!
//! Everything here is a pure function over snapshot rows, so the same code
//! serves aggregates rebuilt locally and rows fetched from the API.

pub mod aging;
pub mod kpis;
pub mod snapshot;

pub use aging::{aging_buckets, AgingBucket, AgingReport};
pub use kpis::{revenue_by_month, DashboardKpis, MonthlyRevenue};
pub use snapshot::{DateRange, InvoiceSnapshot, PlanSnapshot};
