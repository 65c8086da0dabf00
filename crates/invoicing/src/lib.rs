//! Invoicing domain module (event-sourced).
//!
//! Invoices issued from orders, recurring plans or directly, their status
//! lifecycle and the amounts derived from their lines. Pure domain logic:
//! no IO, no HTTP, no storage.

pub mod invoice;
pub mod status;

pub use invoice::{
    issue_from_order, ChangeStatus, EditItems, Invoice, InvoiceCommand, InvoiceEvent, InvoiceId,
    InvoiceIssued, InvoiceItemsEdited, InvoiceStatusChanged, IssueInvoice,
};
pub use status::InvoiceStatus;
