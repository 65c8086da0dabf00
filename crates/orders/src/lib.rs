//! Orders domain module (event-sourced).
//!
//! Draft orders collect priced lines for a customer until they are turned
//! into an invoice. No IO, no HTTP, no storage.

pub mod order;

pub use order::{
    AddItem, CreateOrder, ItemAdded, ItemRemoved, ItemUpdated, MarkInvoiced, Order, OrderCommand,
    OrderCreated, OrderEvent, OrderId, OrderInvoiced, OrderStatus, RemoveItem, UpdateItem,
};
