use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateRoot, DomainError};
use billdesk_events::Event;

/// Payment terms applied when a customer is registered without explicit terms.
pub const DEFAULT_PAYMENT_TERMS_DAYS: u32 = 14;

typed_id!(
    /// Customer identifier.
    CustomerId
);

/// Customer status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

/// Contact and invoicing details for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Tax registration number printed on invoices.
    pub vat_number: Option<String>,
}

impl BillingDetails {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(email) = &self.email {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err(DomainError::field("email", "invalid email format"));
            }
        }
        Ok(())
    }

    /// Blank strings become `None`, the rest is trimmed.
    fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            email: clean(&self.email).map(|e| e.to_lowercase()),
            phone: clean(&self.phone),
            address: clean(&self.address),
            vat_number: clean(&self.vat_number),
        }
    }
}

/// Aggregate root: Customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    name: String,
    details: BillingDetails,
    payment_terms_days: u32,
    status: CustomerStatus,
    version: u64,
    created: bool,
}

impl Customer {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CustomerId) -> Self {
        Self {
            id,
            name: String::new(),
            details: BillingDetails::default(),
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
            status: CustomerStatus::Active,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn details(&self) -> &BillingDetails {
        &self.details
    }

    pub fn payment_terms_days(&self) -> u32 {
        self.payment_terms_days
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    /// Inactive customers receive no new orders, invoices or plan runs.
    pub fn can_be_billed(&self) -> bool {
        self.created && self.status == CustomerStatus::Active
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub customer_id: CustomerId,
    pub name: String,
    pub details: Option<BillingDetails>,
    /// Defaults to [`DEFAULT_PAYMENT_TERMS_DAYS`].
    pub payment_terms_days: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCustomer. `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub customer_id: CustomerId,
    pub name: Option<String>,
    pub details: Option<BillingDetails>,
    pub payment_terms_days: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateCustomer {
    pub customer_id: CustomerId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReactivateCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateCustomer {
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerCommand {
    RegisterCustomer(RegisterCustomer),
    UpdateCustomer(UpdateCustomer),
    DeactivateCustomer(DeactivateCustomer),
    ReactivateCustomer(ReactivateCustomer),
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub customer_id: CustomerId,
    pub name: String,
    pub details: BillingDetails,
    pub payment_terms_days: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerUpdated (carries the full resulting state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdated {
    pub customer_id: CustomerId,
    pub name: String,
    pub details: BillingDetails,
    pub payment_terms_days: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDeactivated {
    pub customer_id: CustomerId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReactivated {
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    CustomerRegistered(CustomerRegistered),
    CustomerUpdated(CustomerUpdated),
    CustomerDeactivated(CustomerDeactivated),
    CustomerReactivated(CustomerReactivated),
}

impl Event for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => "customers.customer.registered",
            CustomerEvent::CustomerUpdated(_) => "customers.customer.updated",
            CustomerEvent::CustomerDeactivated(_) => "customers.customer.deactivated",
            CustomerEvent::CustomerReactivated(_) => "customers.customer.reactivated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerRegistered(e) => e.occurred_at,
            CustomerEvent::CustomerUpdated(e) => e.occurred_at,
            CustomerEvent::CustomerDeactivated(e) => e.occurred_at,
            CustomerEvent::CustomerReactivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Customer {
    type Command = CustomerCommand;
    type Event = CustomerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CustomerEvent::CustomerRegistered(e) => {
                self.id = e.customer_id;
                self.name = e.name.clone();
                self.details = e.details.clone();
                self.payment_terms_days = e.payment_terms_days;
                self.status = CustomerStatus::Active;
                self.created = true;
            }
            CustomerEvent::CustomerUpdated(e) => {
                self.name = e.name.clone();
                self.details = e.details.clone();
                self.payment_terms_days = e.payment_terms_days;
            }
            CustomerEvent::CustomerDeactivated(_) => {
                self.status = CustomerStatus::Inactive;
            }
            CustomerEvent::CustomerReactivated(_) => {
                self.status = CustomerStatus::Active;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomerCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            CustomerCommand::UpdateCustomer(cmd) => self.handle_update(cmd),
            CustomerCommand::DeactivateCustomer(cmd) => self.handle_deactivate(cmd),
            CustomerCommand::ReactivateCustomer(cmd) => self.handle_reactivate(cmd),
        }
    }
}

impl Customer {
    fn ensure_existing(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != customer_id {
            return Err(DomainError::invariant("customer_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(
        &self,
        cmd: &RegisterCustomer,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("customer already exists"));
        }

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::field("name", "cannot be empty"));
        }

        let details = cmd.details.clone().unwrap_or_default();
        details.validate()?;

        Ok(vec![CustomerEvent::CustomerRegistered(CustomerRegistered {
            customer_id: cmd.customer_id,
            name: name.to_string(),
            details: details.normalized(),
            payment_terms_days: cmd.payment_terms_days.unwrap_or(DEFAULT_PAYMENT_TERMS_DAYS),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateCustomer) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_existing(cmd.customer_id)?;

        let name = cmd
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(self.name.as_str())
            .to_string();
        if name.is_empty() {
            return Err(DomainError::field("name", "cannot be empty"));
        }

        let details = match &cmd.details {
            Some(d) => {
                d.validate()?;
                d.normalized()
            }
            None => self.details.clone(),
        };

        Ok(vec![CustomerEvent::CustomerUpdated(CustomerUpdated {
            customer_id: cmd.customer_id,
            name,
            details,
            payment_terms_days: cmd.payment_terms_days.unwrap_or(self.payment_terms_days),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(
        &self,
        cmd: &DeactivateCustomer,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_existing(cmd.customer_id)?;

        if self.status == CustomerStatus::Inactive {
            return Err(DomainError::conflict("customer is already inactive"));
        }

        Ok(vec![CustomerEvent::CustomerDeactivated(CustomerDeactivated {
            customer_id: cmd.customer_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reactivate(
        &self,
        cmd: &ReactivateCustomer,
    ) -> Result<Vec<CustomerEvent>, DomainError> {
        self.ensure_existing(cmd.customer_id)?;

        if self.status == CustomerStatus::Active {
            return Err(DomainError::conflict("customer is already active"));
        }

        Ok(vec![CustomerEvent::CustomerReactivated(CustomerReactivated {
            customer_id: cmd.customer_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
