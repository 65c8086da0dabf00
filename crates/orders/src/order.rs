use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateId, AggregateRoot, Calculation, DocumentTotals, DomainError};
use billdesk_customers::CustomerId;
use billdesk_events::Event;
use billdesk_pricelist::line::{self, validate_draft};
use billdesk_pricelist::{DocumentLine, LineDraft};

typed_id!(
    /// Order identifier.
    OrderId
);

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Invoiced,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer_id: Option<CustomerId>,
    order_date: Option<NaiveDate>,
    note: Option<String>,
    status: OrderStatus,
    lines: Vec<DocumentLine>,
    next_line_no: u32,
    invoice_id: Option<AggregateId>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            customer_id: None,
            order_date: None,
            note: None,
            status: OrderStatus::Draft,
            lines: Vec::new(),
            next_line_no: 1,
            invoice_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn order_date(&self) -> Option<NaiveDate> {
        self.order_date
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    /// Invoice created from this order, once invoiced.
    pub fn invoice_id(&self) -> Option<AggregateId> {
        self.invoice_id
    }

    pub fn is_modifiable(&self) -> bool {
        self.created && self.status == OrderStatus::Draft
    }

    pub fn totals(&self) -> Result<DocumentTotals, DomainError> {
        line::totals(&self.lines)
    }

    pub fn calculation(&self) -> Result<Calculation, DomainError> {
        line::calculate(&self.lines)
    }

    /// Lines in editable form, e.g. to seed an invoice.
    pub fn drafts(&self) -> Vec<LineDraft> {
        self.lines.iter().map(DocumentLine::to_draft).collect()
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    pub note: Option<String>,
    /// Optional initial lines.
    pub items: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub order_id: OrderId,
    pub line: LineDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateItem (replaces the line with the same number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub order_id: OrderId,
    pub line_no: u32,
    pub line: LineDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub order_id: OrderId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkInvoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoiced {
    pub order_id: OrderId,
    pub invoice_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    CreateOrder(CreateOrder),
    AddItem(AddItem),
    UpdateItem(UpdateItem),
    RemoveItem(RemoveItem),
    MarkInvoiced(MarkInvoiced),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    pub note: Option<String>,
    pub lines: Vec<DocumentLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub order_id: OrderId,
    pub line: DocumentLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub order_id: OrderId,
    pub line: DocumentLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub order_id: OrderId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderInvoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInvoiced {
    pub order_id: OrderId,
    pub invoice_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    ItemAdded(ItemAdded),
    ItemUpdated(ItemUpdated),
    ItemRemoved(ItemRemoved),
    OrderInvoiced(OrderInvoiced),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "orders.order.created",
            OrderEvent::ItemAdded(_) => "orders.order.item_added",
            OrderEvent::ItemUpdated(_) => "orders.order.item_updated",
            OrderEvent::ItemRemoved(_) => "orders.order.item_removed",
            OrderEvent::OrderInvoiced(_) => "orders.order.invoiced",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::ItemAdded(e) => e.occurred_at,
            OrderEvent::ItemUpdated(e) => e.occurred_at,
            OrderEvent::ItemRemoved(e) => e.occurred_at,
            OrderEvent::OrderInvoiced(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.customer_id = Some(e.customer_id);
                self.order_date = Some(e.order_date);
                self.note = e.note.clone();
                self.status = OrderStatus::Draft;
                self.lines = e.lines.clone();
                self.next_line_no = next_after(&self.lines);
                self.created = true;
            }
            OrderEvent::ItemAdded(e) => {
                self.next_line_no = self.next_line_no.max(e.line.line_no + 1);
                self.lines.push(e.line.clone());
            }
            OrderEvent::ItemUpdated(e) => {
                if let Some(existing) = self.lines.iter_mut().find(|l| l.line_no == e.line.line_no) {
                    *existing = e.line.clone();
                }
            }
            OrderEvent::ItemRemoved(e) => {
                self.lines.retain(|l| l.line_no != e.line_no);
            }
            OrderEvent::OrderInvoiced(e) => {
                self.status = OrderStatus::Invoiced;
                self.invoice_id = Some(e.invoice_id);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            OrderCommand::AddItem(cmd) => self.handle_add_item(cmd),
            OrderCommand::UpdateItem(cmd) => self.handle_update_item(cmd),
            OrderCommand::RemoveItem(cmd) => self.handle_remove_item(cmd),
            OrderCommand::MarkInvoiced(cmd) => self.handle_mark_invoiced(cmd),
        }
    }
}

fn next_after(lines: &[DocumentLine]) -> u32 {
    lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1
}

impl Order {
    fn ensure_existing(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant("cannot modify order once it is invoiced"));
        }
        Ok(())
    }

    fn line_index(&self, line_no: u32) -> Result<usize, DomainError> {
        self.lines
            .iter()
            .position(|l| l.line_no == line_no)
            .ok_or_else(|| DomainError::field("lineNo", format!("no line {line_no}")))
    }

    /// The order total must stay representable after replacing or adding `line`.
    fn ensure_total_fits(&self, line: &DocumentLine) -> Result<(), DomainError> {
        let mut lines: Vec<DocumentLine> = self
            .lines
            .iter()
            .filter(|l| l.line_no != line.line_no)
            .cloned()
            .collect();
        lines.push(line.clone());
        line::totals(&lines).map(|_| ())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        let lines = billdesk_pricelist::number_lines(&cmd.items)?;

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            order_date: cmd.order_date,
            note: cmd.note.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_existing(cmd.order_id)?;
        self.ensure_modifiable()?;
        validate_draft(self.lines.len(), &cmd.line)?;
        let line = DocumentLine::from_draft(self.next_line_no, &cmd.line);
        self.ensure_total_fits(&line)?;

        Ok(vec![OrderEvent::ItemAdded(ItemAdded {
            order_id: cmd.order_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_item(&self, cmd: &UpdateItem) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_existing(cmd.order_id)?;
        self.ensure_modifiable()?;
        let idx = self.line_index(cmd.line_no)?;
        validate_draft(idx, &cmd.line)?;
        let line = DocumentLine::from_draft(cmd.line_no, &cmd.line);
        self.ensure_total_fits(&line)?;

        Ok(vec![OrderEvent::ItemUpdated(ItemUpdated {
            order_id: cmd.order_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveItem) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_existing(cmd.order_id)?;
        self.ensure_modifiable()?;
        self.line_index(cmd.line_no)?;

        Ok(vec![OrderEvent::ItemRemoved(ItemRemoved {
            order_id: cmd.order_id,
            line_no: cmd.line_no,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_invoiced(&self, cmd: &MarkInvoiced) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_existing(cmd.order_id)?;

        if self.status != OrderStatus::Draft {
            return Err(DomainError::conflict("order is already invoiced"));
        }

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot invoice order without items"));
        }

        Ok(vec![OrderEvent::OrderInvoiced(OrderInvoiced {
            order_id: cmd.order_id,
            invoice_id: cmd.invoice_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use billdesk_core::{Decimal, LineItem};
    use proptest::prelude::*;

    fn draft_strategy() -> impl Strategy<Value = LineDraft> {
        (0u32..50, 0u32..100_000, 0u32..=100).prop_map(|(qty, cents, discount)| {
            LineDraft::new(
                "Item",
                LineItem::new(Decimal::from(qty), Decimal::new(cents as i64, 2))
                    .with_discount(Decimal::from(discount))
                    .with_vat_rate(Decimal::new(19, 2)),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn totals_match_sum_of_added_lines(drafts in prop::collection::vec(draft_strategy(), 0..12)) {
            let order_id = OrderId::generate();
            let mut order = Order::empty(order_id);
            order.execute(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: CustomerId::generate(),
                order_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                note: None,
                items: vec![],
                occurred_at: Utc::now(),
            })).unwrap();

            for draft in &drafts {
                order.execute(&OrderCommand::AddItem(AddItem {
                    order_id,
                    line: draft.clone(),
                    occurred_at: Utc::now(),
                })).unwrap();
            }

            let expected = billdesk_pricelist::line::draft_totals(&drafts).unwrap();
            let totals = order.totals().unwrap();
            prop_assert_eq!(totals, expected);
            prop_assert_eq!(totals.net + totals.vat, totals.gross);
            prop_assert_eq!(order.lines().len(), drafts.len());
        }
    }
}
