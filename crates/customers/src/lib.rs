//! Customers domain module (event-sourced).
//!
//! Business rules for the customers invoices and plans are billed to,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod customer;

pub use customer::{
    BillingDetails, Customer, CustomerCommand, CustomerDeactivated, CustomerEvent, CustomerId,
    CustomerReactivated, CustomerRegistered, CustomerStatus, CustomerUpdated, DeactivateCustomer,
    ReactivateCustomer, RegisterCustomer, UpdateCustomer, DEFAULT_PAYMENT_TERMS_DAYS,
};
