//! `billdesk-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by every billing context: identifiers, the
//! domain error model, aggregate traits and the line-item calculator.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod line_item;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use line_item::{
    add_money, calculate_lines, mul_money, round_money, validate_items, Calculation, DocumentTotals,
    LineAmounts, LineItem,
};
pub use value_object::ValueObject;

pub use rust_decimal::Decimal;
