use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateId, AggregateRoot, Calculation, Decimal, DocumentTotals, DomainError};
use billdesk_customers::CustomerId;
use billdesk_events::Event;
use billdesk_orders::{Order, OrderId, OrderStatus};
use billdesk_pricelist::line;
use billdesk_pricelist::{number_lines, DocumentLine, LineDraft};

use crate::status::InvoiceStatus;

typed_id!(
    /// Invoice identifier.
    InvoiceId
);

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    number: String,
    customer_id: Option<CustomerId>,
    order_id: Option<OrderId>,
    plan_id: Option<AggregateId>,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    status: InvoiceStatus,
    lines: Vec<DocumentLine>,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            number: String::new(),
            customer_id: None,
            order_id: None,
            plan_id: None,
            issue_date: None,
            due_date: None,
            status: InvoiceStatus::Issued,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    /// Recurring plan that generated this invoice, if any.
    pub fn plan_id(&self) -> Option<AggregateId> {
        self.plan_id
    }

    pub fn issue_date(&self) -> Option<NaiveDate> {
        self.issue_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn totals(&self) -> Result<DocumentTotals, DomainError> {
        line::totals(&self.lines)
    }

    pub fn calculation(&self) -> Result<Calculation, DomainError> {
        line::calculate(&self.lines)
    }

    /// Gross amount still owed; zero once paid or returned.
    pub fn outstanding(&self) -> Result<Decimal, DomainError> {
        if self.status.is_open() {
            Ok(self.totals()?.gross)
        } else {
            Ok(Decimal::ZERO)
        }
    }

    /// Marked OVERDUE, or ISSUED/SENT with the due date behind `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.status {
            InvoiceStatus::Overdue => true,
            InvoiceStatus::Issued | InvoiceStatus::Sent => {
                self.due_date.is_some_and(|due| today > due)
            }
            InvoiceStatus::Paid | InvoiceStatus::Returned => false,
        }
    }

    pub fn days_past_due(&self, today: NaiveDate) -> i64 {
        self.due_date
            .map(|due| (today - due).num_days().max(0))
            .unwrap_or(0)
    }

    /// Invariant: line items may only change before the invoice leaves ISSUED.
    pub fn is_editable(&self) -> bool {
        self.created && self.status == InvoiceStatus::Issued
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IssueInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInvoice {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub plan_id: Option<AggregateId>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditItems (replaces the full item set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditItems {
    pub invoice_id: InvoiceId,
    pub items: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub invoice_id: InvoiceId,
    pub status: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    IssueInvoice(IssueInvoice),
    EditItems(EditItems),
    ChangeStatus(ChangeStatus),
}

/// Event: InvoiceIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub plan_id: Option<AggregateId>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<DocumentLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceItemsEdited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItemsEdited {
    pub invoice_id: InvoiceId,
    pub lines: Vec<DocumentLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStatusChanged {
    pub invoice_id: InvoiceId,
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceIssued(InvoiceIssued),
    InvoiceItemsEdited(InvoiceItemsEdited),
    InvoiceStatusChanged(InvoiceStatusChanged),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceIssued(_) => "invoicing.invoice.issued",
            InvoiceEvent::InvoiceItemsEdited(_) => "invoicing.invoice.items_edited",
            InvoiceEvent::InvoiceStatusChanged(_) => "invoicing.invoice.status_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceIssued(e) => e.occurred_at,
            InvoiceEvent::InvoiceItemsEdited(e) => e.occurred_at,
            InvoiceEvent::InvoiceStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceIssued(e) => {
                self.id = e.invoice_id;
                self.number = e.number.clone();
                self.customer_id = Some(e.customer_id);
                self.order_id = e.order_id;
                self.plan_id = e.plan_id;
                self.issue_date = Some(e.issue_date);
                self.due_date = Some(e.due_date);
                self.status = InvoiceStatus::Issued;
                self.lines = e.lines.clone();
                self.created = true;
            }
            InvoiceEvent::InvoiceItemsEdited(e) => {
                self.lines = e.lines.clone();
            }
            InvoiceEvent::InvoiceStatusChanged(e) => {
                self.status = e.to;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::IssueInvoice(cmd) => self.handle_issue(cmd),
            InvoiceCommand::EditItems(cmd) => self.handle_edit_items(cmd),
            InvoiceCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl Invoice {
    fn ensure_existing(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_issue(&self, cmd: &IssueInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        let number = cmd.number.trim();
        if number.is_empty() {
            return Err(DomainError::field("number", "cannot be empty"));
        }

        if cmd.due_date < cmd.issue_date {
            return Err(DomainError::field("dueDate", "cannot be before the issue date"));
        }

        if cmd.items.is_empty() {
            return Err(DomainError::field("items", "invoice must have at least one item"));
        }

        let lines = number_lines(&cmd.items)?;

        Ok(vec![InvoiceEvent::InvoiceIssued(InvoiceIssued {
            invoice_id: cmd.invoice_id,
            number: number.to_string(),
            customer_id: cmd.customer_id,
            order_id: cmd.order_id,
            plan_id: cmd.plan_id,
            issue_date: cmd.issue_date,
            due_date: cmd.due_date,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit_items(&self, cmd: &EditItems) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_existing(cmd.invoice_id)?;

        if !self.is_editable() {
            return Err(DomainError::invariant(format!(
                "cannot edit items of a {} invoice",
                self.status
            )));
        }

        if cmd.items.is_empty() {
            return Err(DomainError::field("items", "invoice must have at least one item"));
        }

        let lines = number_lines(&cmd.items)?;
        if lines == self.lines {
            return Err(DomainError::conflict("items unchanged"));
        }

        Ok(vec![InvoiceEvent::InvoiceItemsEdited(InvoiceItemsEdited {
            invoice_id: cmd.invoice_id,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<InvoiceEvent>, DomainError> {
        self.ensure_existing(cmd.invoice_id)?;

        if self.status == cmd.status {
            return Err(DomainError::conflict(format!("invoice is already {}", self.status)));
        }

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invariant(format!(
                "invalid status transition {} -> {}",
                self.status, cmd.status
            )));
        }

        Ok(vec![InvoiceEvent::InvoiceStatusChanged(InvoiceStatusChanged {
            invoice_id: cmd.invoice_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Build the command that invoices a draft order with its current lines.
pub fn issue_from_order(
    order: &Order,
    invoice_id: InvoiceId,
    number: impl Into<String>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    occurred_at: DateTime<Utc>,
) -> Result<IssueInvoice, DomainError> {
    if order.status() != OrderStatus::Draft {
        return Err(DomainError::conflict("order is already invoiced"));
    }
    let customer_id = order.customer_id().ok_or_else(DomainError::not_found)?;

    Ok(IssueInvoice {
        invoice_id,
        number: number.into(),
        customer_id,
        order_id: Some(order.id_typed()),
        plan_id: None,
        issue_date,
        due_date,
        items: order.drafts(),
        occurred_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::LineItem;
    use billdesk_orders::{CreateOrder, OrderCommand};
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn consulting() -> LineDraft {
        LineDraft::new(
            "Consulting",
            LineItem::new(dec!(2), dec!(100))
                .with_discount(dec!(10))
                .with_vat_rate(dec!(0.19)),
        )
    }

    fn issue_cmd(invoice_id: InvoiceId, items: Vec<LineDraft>) -> IssueInvoice {
        IssueInvoice {
            invoice_id,
            number: " INV-2024-001 ".to_string(),
            customer_id: CustomerId::generate(),
            order_id: None,
            plan_id: None,
            issue_date: date(2024, 3, 1),
            due_date: date(2024, 3, 15),
            items,
            occurred_at: test_time(),
        }
    }

    fn issued_invoice() -> Invoice {
        let invoice_id = InvoiceId::generate();
        let mut invoice = Invoice::empty(invoice_id);
        invoice
            .execute(&InvoiceCommand::IssueInvoice(issue_cmd(invoice_id, vec![consulting()])))
            .unwrap();
        invoice
    }

    fn change(invoice: &mut Invoice, status: InvoiceStatus) -> Result<Vec<InvoiceEvent>, DomainError> {
        let invoice_id = invoice.id_typed();
        invoice.execute(&InvoiceCommand::ChangeStatus(ChangeStatus {
            invoice_id,
            status,
            occurred_at: test_time(),
        }))
    }

    #[test]
    fn issue_invoice_computes_totals() {
        let invoice = issued_invoice();
        assert_eq!(invoice.number(), "INV-2024-001");
        assert_eq!(invoice.status(), InvoiceStatus::Issued);

        let totals = invoice.totals().unwrap();
        assert_eq!(totals.net, dec!(180));
        assert_eq!(totals.vat, dec!(34.2));
        assert_eq!(totals.gross, dec!(214.2));
        assert_eq!(invoice.outstanding().unwrap(), dec!(214.2));
    }

    #[test]
    fn issue_rejects_empty_items() {
        let invoice_id = InvoiceId::generate();
        let err = Invoice::empty(invoice_id)
            .handle(&InvoiceCommand::IssueInvoice(issue_cmd(invoice_id, vec![])))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("at least one item")));
    }

    #[test]
    fn issue_rejects_due_date_before_issue_date() {
        let invoice_id = InvoiceId::generate();
        let mut cmd = issue_cmd(invoice_id, vec![consulting()]);
        cmd.due_date = date(2024, 2, 28);
        let err = Invoice::empty(invoice_id)
            .handle(&InvoiceCommand::IssueInvoice(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("dueDate")));
    }

    #[test]
    fn issue_reports_invalid_line_position() {
        let invoice_id = InvoiceId::generate();
        let bad = LineDraft::new("Bad", LineItem::new(dec!(1), dec!(10)).with_vat_rate(dec!(19)));
        let err = Invoice::empty(invoice_id)
            .handle(&InvoiceCommand::IssueInvoice(issue_cmd(invoice_id, vec![consulting(), bad])))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("items[1].vatRate")));
    }

    #[test]
    fn issue_rejects_items_whose_total_overflows() {
        let invoice_id = InvoiceId::generate();
        let huge = LineDraft::new("Huge", LineItem::new(Decimal::MAX, Decimal::ONE));
        let err = Invoice::empty(invoice_id)
            .handle(&InvoiceCommand::IssueInvoice(issue_cmd(invoice_id, vec![huge.clone(), huge])))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("amount: exceeds the supported range".to_string())
        );
    }

    #[test]
    fn duplicate_issue_conflicts() {
        let invoice = issued_invoice();
        let err = invoice
            .handle(&InvoiceCommand::IssueInvoice(issue_cmd(invoice.id_typed(), vec![consulting()])))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn edit_items_only_while_issued() {
        let mut invoice = issued_invoice();
        let invoice_id = invoice.id_typed();

        invoice
            .execute(&InvoiceCommand::EditItems(EditItems {
                invoice_id,
                items: vec![consulting(), LineDraft::new("Travel", LineItem::new(dec!(1), dec!(20)))],
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(invoice.totals().unwrap().gross, dec!(234.2));

        change(&mut invoice, InvoiceStatus::Sent).unwrap();
        let err = invoice
            .handle(&InvoiceCommand::EditItems(EditItems {
                invoice_id,
                items: vec![consulting()],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(m) if m.contains("SENT")));
    }

    #[test]
    fn unchanged_items_conflict() {
        let invoice = issued_invoice();
        let err = invoice
            .handle(&InvoiceCommand::EditItems(EditItems {
                invoice_id: invoice.id_typed(),
                items: vec![consulting()],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn status_follows_transition_table() {
        let mut invoice = issued_invoice();
        change(&mut invoice, InvoiceStatus::Overdue).unwrap();
        change(&mut invoice, InvoiceStatus::Sent).unwrap();
        change(&mut invoice, InvoiceStatus::Paid).unwrap();
        assert_eq!(invoice.outstanding().unwrap(), Decimal::ZERO);

        let err = change(&mut invoice, InvoiceStatus::Sent).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(m) if m.contains("PAID -> SENT")));

        change(&mut invoice, InvoiceStatus::Returned).unwrap();
        for target in InvoiceStatus::ALL {
            assert!(change(&mut invoice, target).is_err());
        }
        assert_eq!(invoice.version(), 5);
    }

    #[test]
    fn same_status_is_a_conflict() {
        let mut invoice = issued_invoice();
        let err = change(&mut invoice, InvoiceStatus::Issued).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn overdue_detection() {
        let mut invoice = issued_invoice();
        assert!(!invoice.is_overdue(date(2024, 3, 15)));
        assert!(invoice.is_overdue(date(2024, 3, 16)));
        assert_eq!(invoice.days_past_due(date(2024, 3, 20)), 5);
        assert_eq!(invoice.days_past_due(date(2024, 3, 1)), 0);

        change(&mut invoice, InvoiceStatus::Paid).unwrap();
        assert!(!invoice.is_overdue(date(2024, 4, 1)));
    }

    #[test]
    fn explicit_overdue_status_counts_before_due_date() {
        let mut invoice = issued_invoice();
        change(&mut invoice, InvoiceStatus::Overdue).unwrap();
        assert!(invoice.is_overdue(date(2024, 3, 2)));
    }

    #[test]
    fn unknown_invoice_is_not_found() {
        let invoice_id = InvoiceId::generate();
        let err = Invoice::empty(invoice_id)
            .handle(&InvoiceCommand::ChangeStatus(ChangeStatus {
                invoice_id,
                status: InvoiceStatus::Sent,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn issue_from_order_copies_lines() {
        let order_id = OrderId::generate();
        let mut order = Order::empty(order_id);
        order
            .execute(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: CustomerId::generate(),
                order_date: date(2024, 3, 1),
                note: None,
                items: vec![consulting()],
                occurred_at: test_time(),
            }))
            .unwrap();

        let invoice_id = InvoiceId::generate();
        let cmd = issue_from_order(
            &order,
            invoice_id,
            "INV-7",
            date(2024, 3, 2),
            date(2024, 3, 16),
            test_time(),
        )
        .unwrap();
        assert_eq!(cmd.order_id, Some(order_id));
        assert_eq!(cmd.customer_id, order.customer_id().unwrap());

        let mut invoice = Invoice::empty(invoice_id);
        invoice.execute(&InvoiceCommand::IssueInvoice(cmd)).unwrap();
        assert_eq!(invoice.totals().unwrap(), order.totals().unwrap());
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let invoice = issued_invoice();
        let before = invoice.clone();
        let cmd = InvoiceCommand::ChangeStatus(ChangeStatus {
            invoice_id: invoice.id_typed(),
            status: InvoiceStatus::Sent,
            occurred_at: test_time(),
        });

        let events1 = invoice.handle(&cmd).unwrap();
        let events2 = invoice.handle(&cmd).unwrap();
        assert_eq!(invoice, before);
        assert_eq!(events1, events2);
    }
}
