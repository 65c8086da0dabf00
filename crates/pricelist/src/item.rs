use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateRoot, DomainError, LineItem};
use billdesk_events::Event;

typed_id!(
    /// Price list item identifier.
    PriceListItemId
);

/// Aggregate root: PriceListItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceListItem {
    id: PriceListItemId,
    code: String,
    name: String,
    unit: String,
    unit_price_net: Decimal,
    vat_rate: Decimal,
    active: bool,
    version: u64,
    created: bool,
}

impl PriceListItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PriceListItemId) -> Self {
        Self {
            id,
            code: String::new(),
            name: String::new(),
            unit: String::new(),
            unit_price_net: Decimal::ZERO,
            vat_rate: Decimal::ZERO,
            active: false,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PriceListItemId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price_net(&self) -> Decimal {
        self.unit_price_net
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inactive items stay on old documents but cannot be added to new ones.
    pub fn can_be_sold(&self) -> bool {
        self.created && self.active
    }

    /// A document line for `quantity` units at the current list price.
    pub fn to_line_item(&self, quantity: Decimal) -> LineItem {
        LineItem::new(quantity, self.unit_price_net).with_vat_rate(self.vat_rate)
    }
}

impl AggregateRoot for PriceListItem {
    type Id = PriceListItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePriceListItem. New items start active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePriceListItem {
    pub item_id: PriceListItemId,
    pub code: String,
    pub name: String,
    /// Unit label shown on documents ("h", "pcs", "month").
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangePrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePrice {
    pub item_id: PriceListItemId,
    pub unit_price_net: Decimal,
    /// `None` keeps the current rate.
    pub vat_rate: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateItem {
    pub item_id: PriceListItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateItem {
    pub item_id: PriceListItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceListCommand {
    CreatePriceListItem(CreatePriceListItem),
    ChangePrice(ChangePrice),
    ActivateItem(ActivateItem),
    DeactivateItem(DeactivateItem),
}

/// Event: PriceListItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListItemCreated {
    pub item_id: PriceListItemId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PriceChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChanged {
    pub item_id: PriceListItemId,
    pub previous_price_net: Decimal,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemActivated {
    pub item_id: PriceListItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeactivated {
    pub item_id: PriceListItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceListEvent {
    PriceListItemCreated(PriceListItemCreated),
    PriceChanged(PriceChanged),
    ItemActivated(ItemActivated),
    ItemDeactivated(ItemDeactivated),
}

impl Event for PriceListEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PriceListEvent::PriceListItemCreated(_) => "pricelist.item.created",
            PriceListEvent::PriceChanged(_) => "pricelist.item.price_changed",
            PriceListEvent::ItemActivated(_) => "pricelist.item.activated",
            PriceListEvent::ItemDeactivated(_) => "pricelist.item.deactivated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PriceListEvent::PriceListItemCreated(e) => e.occurred_at,
            PriceListEvent::PriceChanged(e) => e.occurred_at,
            PriceListEvent::ItemActivated(e) => e.occurred_at,
            PriceListEvent::ItemDeactivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PriceListItem {
    type Command = PriceListCommand;
    type Event = PriceListEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PriceListEvent::PriceListItemCreated(e) => {
                self.id = e.item_id;
                self.code = e.code.clone();
                self.name = e.name.clone();
                self.unit = e.unit.clone();
                self.unit_price_net = e.unit_price_net;
                self.vat_rate = e.vat_rate;
                self.active = true;
                self.created = true;
            }
            PriceListEvent::PriceChanged(e) => {
                self.unit_price_net = e.unit_price_net;
                self.vat_rate = e.vat_rate;
            }
            PriceListEvent::ItemActivated(_) => {
                self.active = true;
            }
            PriceListEvent::ItemDeactivated(_) => {
                self.active = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PriceListCommand::CreatePriceListItem(cmd) => self.handle_create(cmd),
            PriceListCommand::ChangePrice(cmd) => self.handle_change_price(cmd),
            PriceListCommand::ActivateItem(cmd) => self.handle_activate(cmd),
            PriceListCommand::DeactivateItem(cmd) => self.handle_deactivate(cmd),
        }
    }
}

fn validate_pricing(unit_price_net: Decimal, vat_rate: Decimal) -> Result<(), DomainError> {
    LineItem::new(Decimal::ONE, unit_price_net)
        .with_vat_rate(vat_rate)
        .validate()
}

impl PriceListItem {
    fn ensure_existing(&self, item_id: PriceListItemId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePriceListItem,
    ) -> Result<Vec<PriceListEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("price list item already exists"));
        }

        let code = cmd.code.trim();
        if code.is_empty() {
            return Err(DomainError::field("code", "cannot be empty"));
        }
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::field("name", "cannot be empty"));
        }
        validate_pricing(cmd.unit_price_net, cmd.vat_rate)?;

        // Code uniqueness is the backend's concern; the aggregate only sees itself.
        Ok(vec![PriceListEvent::PriceListItemCreated(PriceListItemCreated {
            item_id: cmd.item_id,
            code: code.to_uppercase(),
            name: name.to_string(),
            unit: cmd.unit.trim().to_string(),
            unit_price_net: cmd.unit_price_net,
            vat_rate: cmd.vat_rate,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_price(
        &self,
        cmd: &ChangePrice,
    ) -> Result<Vec<PriceListEvent>, DomainError> {
        self.ensure_existing(cmd.item_id)?;

        let vat_rate = cmd.vat_rate.unwrap_or(self.vat_rate);
        validate_pricing(cmd.unit_price_net, vat_rate)?;

        if cmd.unit_price_net == self.unit_price_net && vat_rate == self.vat_rate {
            return Err(DomainError::conflict("price is unchanged"));
        }

        Ok(vec![PriceListEvent::PriceChanged(PriceChanged {
            item_id: cmd.item_id,
            previous_price_net: self.unit_price_net,
            unit_price_net: cmd.unit_price_net,
            vat_rate,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateItem) -> Result<Vec<PriceListEvent>, DomainError> {
        self.ensure_existing(cmd.item_id)?;

        if self.active {
            return Err(DomainError::conflict("item is already active"));
        }

        Ok(vec![PriceListEvent::ItemActivated(ItemActivated {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(
        &self,
        cmd: &DeactivateItem,
    ) -> Result<Vec<PriceListEvent>, DomainError> {
        self.ensure_existing(cmd.item_id)?;

        if !self.active {
            return Err(DomainError::conflict("item is already inactive"));
        }

        Ok(vec![PriceListEvent::ItemDeactivated(ItemDeactivated {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
