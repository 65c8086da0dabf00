use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateRoot, Decimal, DocumentTotals, DomainError};
use billdesk_customers::{Customer, CustomerId};
use billdesk_events::Event;
use billdesk_invoicing::{InvoiceId, IssueInvoice};
use billdesk_pricelist::line;
use billdesk_pricelist::{number_lines, DocumentLine, LineDraft};

use crate::schedule::Frequency;

typed_id!(
    /// Recurring plan identifier.
    RecurringPlanId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Active,
    Paused,
    Expired,
}

/// Aggregate root: RecurringPlan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringPlan {
    id: RecurringPlanId,
    customer_id: Option<CustomerId>,
    name: String,
    frequency: Frequency,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    next_run_date: Option<NaiveDate>,
    status: PlanStatus,
    lines: Vec<DocumentLine>,
    invoices_generated: u32,
    last_invoice_id: Option<InvoiceId>,
    version: u64,
    created: bool,
}

impl RecurringPlan {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: RecurringPlanId) -> Self {
        Self {
            id,
            customer_id: None,
            name: String::new(),
            frequency: Frequency::Monthly,
            start_date: None,
            end_date: None,
            next_run_date: None,
            status: PlanStatus::Active,
            lines: Vec::new(),
            invoices_generated: 0,
            last_invoice_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RecurringPlanId {
        self.id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn next_run_date(&self) -> Option<NaiveDate> {
        self.next_run_date
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn invoices_generated(&self) -> u32 {
        self.invoices_generated
    }

    pub fn last_invoice_id(&self) -> Option<InvoiceId> {
        self.last_invoice_id
    }

    /// Totals of one generated invoice.
    pub fn amount_per_period(&self) -> Result<DocumentTotals, DomainError> {
        line::totals(&self.lines)
    }

    /// Net amount per period normalised to one month.
    pub fn monthly_equivalent(&self) -> Result<Decimal, DomainError> {
        self.frequency.monthly_equivalent(self.amount_per_period()?.net)
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.created
            && self.status == PlanStatus::Active
            && self.next_run_date.is_some_and(|next| next <= today)
    }

    /// Build the invoice for the current run.
    ///
    /// Due date is the run date plus the customer's payment terms. The
    /// caller issues the invoice and then records the run on the plan.
    pub fn draft_invoice(
        &self,
        customer: &Customer,
        invoice_id: InvoiceId,
        number: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<IssueInvoice, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.status != PlanStatus::Active {
            return Err(DomainError::invariant("only active plans generate invoices"));
        }
        let customer_id = self.customer_id.ok_or_else(DomainError::not_found)?;
        if customer.id_typed() != customer_id {
            return Err(DomainError::invariant("customer_id mismatch"));
        }
        if !customer.can_be_billed() {
            return Err(DomainError::invariant("customer cannot be billed"));
        }

        let run_date = self.next_run_date.ok_or_else(DomainError::not_found)?;
        let due_date = run_date
            .checked_add_days(Days::new(u64::from(customer.payment_terms_days())))
            .ok_or_else(|| DomainError::field("dueDate", "out of range"))?;

        Ok(IssueInvoice {
            invoice_id,
            number: number.into(),
            customer_id,
            order_id: None,
            plan_id: Some(self.id.0),
            issue_date: run_date,
            due_date,
            items: self.lines.iter().map(DocumentLine::to_draft).collect(),
            occurred_at,
        })
    }
}

impl AggregateRoot for RecurringPlan {
    type Id = RecurringPlanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: CreatePlan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlan {
    pub plan_id: RecurringPlanId,
    pub customer_id: CustomerId,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub items: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdatePlanItems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlanItems {
    pub plan_id: RecurringPlanId,
    pub items: Vec<LineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PausePlan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausePlan {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResumePlan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePlan {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordRun (an invoice was generated for the current run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRun {
    pub plan_id: RecurringPlanId,
    pub invoice_id: InvoiceId,
    pub run_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ExpirePlan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirePlan {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanCommand {
    CreatePlan(CreatePlan),
    UpdatePlanItems(UpdatePlanItems),
    PausePlan(PausePlan),
    ResumePlan(ResumePlan),
    RecordRun(RecordRun),
    ExpirePlan(ExpirePlan),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event: PlanCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCreated {
    pub plan_id: RecurringPlanId,
    pub customer_id: CustomerId,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub lines: Vec<DocumentLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanItemsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItemsUpdated {
    pub plan_id: RecurringPlanId,
    pub lines: Vec<DocumentLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanPaused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPaused {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanResumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResumed {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanRunRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRunRecorded {
    pub plan_id: RecurringPlanId,
    pub invoice_id: InvoiceId,
    pub run_date: NaiveDate,
    /// `None` when the schedule has run past chrono's date range.
    pub next_run_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanExpired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanExpired {
    pub plan_id: RecurringPlanId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanEvent {
    PlanCreated(PlanCreated),
    PlanItemsUpdated(PlanItemsUpdated),
    PlanPaused(PlanPaused),
    PlanResumed(PlanResumed),
    PlanRunRecorded(PlanRunRecorded),
    PlanExpired(PlanExpired),
}

impl Event for PlanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlanEvent::PlanCreated(_) => "billing.plan.created",
            PlanEvent::PlanItemsUpdated(_) => "billing.plan.items_updated",
            PlanEvent::PlanPaused(_) => "billing.plan.paused",
            PlanEvent::PlanResumed(_) => "billing.plan.resumed",
            PlanEvent::PlanRunRecorded(_) => "billing.plan.run_recorded",
            PlanEvent::PlanExpired(_) => "billing.plan.expired",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlanEvent::PlanCreated(e) => e.occurred_at,
            PlanEvent::PlanItemsUpdated(e) => e.occurred_at,
            PlanEvent::PlanPaused(e) => e.occurred_at,
            PlanEvent::PlanResumed(e) => e.occurred_at,
            PlanEvent::PlanRunRecorded(e) => e.occurred_at,
            PlanEvent::PlanExpired(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for RecurringPlan {
    type Command = PlanCommand;
    type Event = PlanEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PlanEvent::PlanCreated(e) => {
                self.id = e.plan_id;
                self.customer_id = Some(e.customer_id);
                self.name = e.name.clone();
                self.frequency = e.frequency;
                self.start_date = Some(e.start_date);
                self.end_date = e.end_date;
                self.next_run_date = Some(e.start_date);
                self.status = PlanStatus::Active;
                self.lines = e.lines.clone();
                self.created = true;
            }
            PlanEvent::PlanItemsUpdated(e) => {
                self.lines = e.lines.clone();
            }
            PlanEvent::PlanPaused(_) => {
                self.status = PlanStatus::Paused;
            }
            PlanEvent::PlanResumed(_) => {
                self.status = PlanStatus::Active;
            }
            PlanEvent::PlanRunRecorded(e) => {
                self.invoices_generated += 1;
                self.last_invoice_id = Some(e.invoice_id);
                self.next_run_date = e.next_run_date;
            }
            PlanEvent::PlanExpired(_) => {
                self.status = PlanStatus::Expired;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PlanCommand::CreatePlan(cmd) => self.handle_create(cmd),
            PlanCommand::UpdatePlanItems(cmd) => self.handle_update_items(cmd),
            PlanCommand::PausePlan(cmd) => self.handle_pause(cmd),
            PlanCommand::ResumePlan(cmd) => self.handle_resume(cmd),
            PlanCommand::RecordRun(cmd) => self.handle_record_run(cmd),
            PlanCommand::ExpirePlan(cmd) => self.handle_expire(cmd),
        }
    }
}

impl RecurringPlan {
    fn ensure_existing(&self, plan_id: RecurringPlanId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != plan_id {
            return Err(DomainError::invariant("plan_id mismatch"));
        }
        Ok(())
    }

    fn ensure_not_expired(&self) -> Result<(), DomainError> {
        if self.status == PlanStatus::Expired {
            return Err(DomainError::invariant("plan has expired"));
        }
        Ok(())
    }

    /// Numbered lines whose per-period and monthly figures are representable.
    fn items_to_lines(
        items: &[LineDraft],
        frequency: Frequency,
    ) -> Result<Vec<DocumentLine>, DomainError> {
        if items.is_empty() {
            return Err(DomainError::field("items", "plan must have at least one item"));
        }
        let lines = number_lines(items)?;
        frequency.monthly_equivalent(line::totals(&lines)?.net)?;
        Ok(lines)
    }

    fn handle_create(&self, cmd: &CreatePlan) -> Result<Vec<PlanEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("plan already exists"));
        }

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::field("name", "cannot be empty"));
        }

        if let Some(end) = cmd.end_date {
            if end < cmd.start_date {
                return Err(DomainError::field("endDate", "cannot be before the start date"));
            }
        }

        let lines = Self::items_to_lines(&cmd.items, cmd.frequency)?;

        Ok(vec![PlanEvent::PlanCreated(PlanCreated {
            plan_id: cmd.plan_id,
            customer_id: cmd.customer_id,
            name: name.to_string(),
            frequency: cmd.frequency,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_items(&self, cmd: &UpdatePlanItems) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_existing(cmd.plan_id)?;
        self.ensure_not_expired()?;

        let lines = Self::items_to_lines(&cmd.items, self.frequency)?;
        if lines == self.lines {
            return Err(DomainError::conflict("items unchanged"));
        }

        Ok(vec![PlanEvent::PlanItemsUpdated(PlanItemsUpdated {
            plan_id: cmd.plan_id,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pause(&self, cmd: &PausePlan) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_existing(cmd.plan_id)?;
        self.ensure_not_expired()?;

        if self.status == PlanStatus::Paused {
            return Err(DomainError::conflict("plan is already paused"));
        }

        Ok(vec![PlanEvent::PlanPaused(PlanPaused {
            plan_id: cmd.plan_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_resume(&self, cmd: &ResumePlan) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_existing(cmd.plan_id)?;
        self.ensure_not_expired()?;

        if self.status == PlanStatus::Active {
            return Err(DomainError::conflict("plan is already active"));
        }

        Ok(vec![PlanEvent::PlanResumed(PlanResumed {
            plan_id: cmd.plan_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_run(&self, cmd: &RecordRun) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_existing(cmd.plan_id)?;

        if self.status != PlanStatus::Active {
            return Err(DomainError::invariant("only active plans can run"));
        }

        if !self.is_due(cmd.run_date) {
            return Err(DomainError::invariant(format!("plan is not due on {}", cmd.run_date)));
        }

        let start = self.start_date.ok_or_else(DomainError::not_found)?;
        let next_run_date = self
            .frequency
            .nth_run(start, self.invoices_generated.saturating_add(1));

        let mut events = vec![PlanEvent::PlanRunRecorded(PlanRunRecorded {
            plan_id: cmd.plan_id,
            invoice_id: cmd.invoice_id,
            run_date: cmd.run_date,
            next_run_date,
            occurred_at: cmd.occurred_at,
        })];

        let past_end = match (next_run_date, self.end_date) {
            (None, _) => true,
            (Some(next), Some(end)) => next > end,
            (Some(_), None) => false,
        };
        if past_end {
            events.push(PlanEvent::PlanExpired(PlanExpired {
                plan_id: cmd.plan_id,
                occurred_at: cmd.occurred_at,
            }));
        }

        Ok(events)
    }

    fn handle_expire(&self, cmd: &ExpirePlan) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_existing(cmd.plan_id)?;

        if self.status == PlanStatus::Expired {
            return Err(DomainError::conflict("plan has already expired"));
        }

        Ok(vec![PlanEvent::PlanExpired(PlanExpired {
            plan_id: cmd.plan_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::LineItem;
    use billdesk_customers::{
        CustomerCommand, DeactivateCustomer, RegisterCustomer, DEFAULT_PAYMENT_TERMS_DAYS,
    };
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hosting() -> LineDraft {
        LineDraft::new(
            "Hosting",
            LineItem::new(dec!(1), dec!(50)).with_vat_rate(dec!(0.2)),
        )
    }

    fn customer() -> Customer {
        let customer_id = CustomerId::generate();
        let mut customer = Customer::empty(customer_id);
        customer
            .execute(&CustomerCommand::RegisterCustomer(RegisterCustomer {
                customer_id,
                name: "Acme".to_string(),
                details: None,
                payment_terms_days: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        customer
    }

    fn plan_for(customer_id: CustomerId, start: NaiveDate, end: Option<NaiveDate>) -> RecurringPlan {
        let plan_id = RecurringPlanId::generate();
        let mut plan = RecurringPlan::empty(plan_id);
        plan.execute(&PlanCommand::CreatePlan(CreatePlan {
            plan_id,
            customer_id,
            name: " Hosting ".to_string(),
            frequency: Frequency::Monthly,
            start_date: start,
            end_date: end,
            items: vec![hosting()],
            occurred_at: test_time(),
        }))
        .unwrap();
        plan
    }

    fn run(plan: &mut RecurringPlan, run_date: NaiveDate) -> Result<Vec<PlanEvent>, DomainError> {
        let plan_id = plan.id_typed();
        plan.execute(&PlanCommand::RecordRun(RecordRun {
            plan_id,
            invoice_id: InvoiceId::generate(),
            run_date,
            occurred_at: test_time(),
        }))
    }

    #[test]
    fn create_plan_schedules_first_run_on_start_date() {
        let plan = plan_for(CustomerId::generate(), date(2024, 1, 31), None);
        assert_eq!(plan.name(), "Hosting");
        assert_eq!(plan.status(), PlanStatus::Active);
        assert_eq!(plan.next_run_date(), Some(date(2024, 1, 31)));
        assert!(!plan.is_due(date(2024, 1, 30)));
        assert!(plan.is_due(date(2024, 1, 31)));
    }

    #[test]
    fn create_rejects_end_before_start() {
        let plan_id = RecurringPlanId::generate();
        let err = RecurringPlan::empty(plan_id)
            .handle(&PlanCommand::CreatePlan(CreatePlan {
                plan_id,
                customer_id: CustomerId::generate(),
                name: "Hosting".to_string(),
                frequency: Frequency::Monthly,
                start_date: date(2024, 2, 1),
                end_date: Some(date(2024, 1, 1)),
                items: vec![hosting()],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("endDate")));
    }

    #[test]
    fn amounts_use_the_calculator() {
        let plan = plan_for(CustomerId::generate(), date(2024, 1, 1), None);
        let totals = plan.amount_per_period().unwrap();
        assert_eq!(totals.net, dec!(50));
        assert_eq!(totals.gross, dec!(60));
        assert_eq!(plan.monthly_equivalent().unwrap(), dec!(50));
    }

    #[test]
    fn weekly_plan_whose_monthly_figure_overflows_is_rejected() {
        let plan_id = RecurringPlanId::generate();
        let price = Decimal::MAX / dec!(10);
        let cmd = |frequency| {
            PlanCommand::CreatePlan(CreatePlan {
                plan_id,
                customer_id: CustomerId::generate(),
                name: "Fleet".to_string(),
                frequency,
                start_date: date(2024, 1, 1),
                end_date: None,
                items: vec![LineDraft::new("Fleet", LineItem::new(dec!(1), price))],
                occurred_at: test_time(),
            })
        };

        let plan = RecurringPlan::empty(plan_id);
        assert!(plan.handle(&cmd(Frequency::Monthly)).is_ok());
        let err = plan.handle(&cmd(Frequency::Weekly)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.starts_with("amount")));
    }

    #[test]
    fn record_run_advances_schedule_with_month_end_clamping() {
        let mut plan = plan_for(CustomerId::generate(), date(2024, 1, 31), None);
        run(&mut plan, date(2024, 1, 31)).unwrap();
        assert_eq!(plan.next_run_date(), Some(date(2024, 2, 29)));
        run(&mut plan, date(2024, 2, 29)).unwrap();
        assert_eq!(plan.next_run_date(), Some(date(2024, 3, 31)));
        assert_eq!(plan.invoices_generated(), 2);
    }

    #[test]
    fn record_run_before_due_is_rejected() {
        let mut plan = plan_for(CustomerId::generate(), date(2024, 1, 31), None);
        let err = run(&mut plan, date(2024, 1, 30)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(m) if m.contains("not due")));
    }

    #[test]
    fn last_run_before_end_date_expires_plan() {
        let mut plan = plan_for(CustomerId::generate(), date(2024, 1, 1), Some(date(2024, 2, 15)));
        let events = run(&mut plan, date(2024, 1, 1)).unwrap();
        assert_eq!(events.len(), 1);

        let events = run(&mut plan, date(2024, 2, 1)).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], PlanEvent::PlanExpired(_)));
        assert_eq!(plan.status(), PlanStatus::Expired);
        assert!(!plan.is_due(date(2024, 3, 1)));
    }

    #[test]
    fn pause_and_resume() {
        let mut plan = plan_for(CustomerId::generate(), date(2024, 1, 1), None);
        let plan_id = plan.id_typed();

        plan.execute(&PlanCommand::PausePlan(PausePlan { plan_id, occurred_at: test_time() }))
            .unwrap();
        assert!(!plan.is_due(date(2024, 6, 1)));
        assert!(run(&mut plan, date(2024, 6, 1)).is_err());

        let err = plan
            .handle(&PlanCommand::PausePlan(PausePlan { plan_id, occurred_at: test_time() }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        plan.execute(&PlanCommand::ResumePlan(ResumePlan { plan_id, occurred_at: test_time() }))
            .unwrap();
        assert!(plan.is_due(date(2024, 6, 1)));
    }

    #[test]
    fn expired_plan_is_frozen() {
        let mut plan = plan_for(CustomerId::generate(), date(2024, 1, 1), None);
        let plan_id = plan.id_typed();
        plan.execute(&PlanCommand::ExpirePlan(ExpirePlan { plan_id, occurred_at: test_time() }))
            .unwrap();

        assert!(plan
            .handle(&PlanCommand::ResumePlan(ResumePlan { plan_id, occurred_at: test_time() }))
            .is_err());
        assert!(plan
            .handle(&PlanCommand::UpdatePlanItems(UpdatePlanItems {
                plan_id,
                items: vec![hosting(), hosting()],
                occurred_at: test_time(),
            }))
            .is_err());
    }

    #[test]
    fn draft_invoice_uses_payment_terms() {
        let customer = customer();
        let plan = plan_for(customer.id_typed(), date(2024, 3, 1), None);

        let cmd = plan
            .draft_invoice(&customer, InvoiceId::generate(), "INV-100", test_time())
            .unwrap();
        assert_eq!(cmd.issue_date, date(2024, 3, 1));
        assert_eq!(
            cmd.due_date,
            date(2024, 3, 1) + Days::new(u64::from(DEFAULT_PAYMENT_TERMS_DAYS))
        );
        assert_eq!(cmd.plan_id, Some(plan.id_typed().0));
        assert_eq!(cmd.items, vec![hosting()]);
    }

    #[test]
    fn draft_invoice_refuses_inactive_customer() {
        let mut customer = customer();
        let customer_id = customer.id_typed();
        customer
            .execute(&CustomerCommand::DeactivateCustomer(DeactivateCustomer {
                customer_id,
                reason: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        let plan = plan_for(customer_id, date(2024, 3, 1), None);

        let err = plan
            .draft_invoice(&customer, InvoiceId::generate(), "INV-101", test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn draft_invoice_refuses_other_customer() {
        let plan = plan_for(CustomerId::generate(), date(2024, 3, 1), None);
        let err = plan
            .draft_invoice(&customer(), InvoiceId::generate(), "INV-102", test_time())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(m) if m.contains("customer_id")));
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use billdesk_core::LineItem;
    use proptest::prelude::*;

    fn frequency_strategy() -> impl Strategy<Value = Frequency> {
        prop::sample::select(vec![
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Quarterly,
            Frequency::Yearly,
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// Run dates strictly increase and never exceed the end date.
        #[test]
        fn runs_are_increasing_and_bounded(
            frequency in frequency_strategy(),
            start_offset in 0u64..3650,
            span in 0u64..1500,
        ) {
            let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
            let start = base + Days::new(start_offset);
            let end = start + Days::new(span);

            let plan_id = RecurringPlanId::generate();
            let mut plan = RecurringPlan::empty(plan_id);
            plan.execute(&PlanCommand::CreatePlan(CreatePlan {
                plan_id,
                customer_id: CustomerId::generate(),
                name: "Plan".to_string(),
                frequency,
                start_date: start,
                end_date: Some(end),
                items: vec![LineDraft::new("Item", LineItem::new(Decimal::ONE, Decimal::TEN))],
                occurred_at: Utc::now(),
            })).unwrap();

            let mut last: Option<NaiveDate> = None;
            while plan.status() == PlanStatus::Active {
                let Some(next) = plan.next_run_date() else { break };
                prop_assert!(next <= end);
                if let Some(prev) = last {
                    prop_assert!(next > prev);
                }
                plan.execute(&PlanCommand::RecordRun(RecordRun {
                    plan_id,
                    invoice_id: InvoiceId::generate(),
                    run_date: next,
                    occurred_at: Utc::now(),
                })).unwrap();
                last = Some(next);
            }

            prop_assert_eq!(plan.status(), PlanStatus::Expired);
            prop_assert!(plan.invoices_generated() >= 1);
        }
    }
}
