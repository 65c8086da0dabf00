//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity; two instances with the same attributes are
/// the same value. `LineItem` is one: two invoice lines with identical
/// quantity, price, discount and VAT produce identical amounts wherever they
/// appear. A `Customer`, by contrast, is an aggregate with an id.
///
/// Value objects are immutable. To "change" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
