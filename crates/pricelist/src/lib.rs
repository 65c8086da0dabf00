//! Price list domain module (event-sourced).
//!
//! Catalogue of billable items with their net unit price and VAT rate, the
//! priced document lines that reference them, and the rows of the printable
//! price-list export.

pub mod export;
pub mod item;
pub mod line;

pub use export::{export_rows, PriceListRow};
pub use item::{
    ActivateItem, ChangePrice, CreatePriceListItem, DeactivateItem, ItemActivated,
    ItemDeactivated, PriceChanged, PriceListCommand, PriceListEvent, PriceListItem,
    PriceListItemCreated, PriceListItemId,
};
pub use line::{number_lines, DocumentLine, LineDraft};
