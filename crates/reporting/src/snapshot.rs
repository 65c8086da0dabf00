use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billdesk_billing::{Frequency, PlanStatus, RecurringPlan, RecurringPlanId};
use billdesk_core::{Decimal, DomainError};
use billdesk_customers::CustomerId;
use billdesk_invoicing::{Invoice, InvoiceId, InvoiceStatus};

/// Flat invoice row used by the reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub id: InvoiceId,
    pub number: String,
    pub customer_id: CustomerId,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub net: Decimal,
    pub gross: Decimal,
}

impl InvoiceSnapshot {
    /// `Ok(None)` for an aggregate that was never issued.
    pub fn from_invoice(invoice: &Invoice) -> Result<Option<Self>, DomainError> {
        let (Some(customer_id), Some(issue_date), Some(due_date)) =
            (invoice.customer_id(), invoice.issue_date(), invoice.due_date())
        else {
            return Ok(None);
        };
        let totals = invoice.totals()?;
        Ok(Some(Self {
            id: invoice.id_typed(),
            number: invoice.number().to_string(),
            customer_id,
            status: invoice.status(),
            issue_date,
            due_date,
            net: totals.net,
            gross: totals.gross,
        }))
    }

    pub fn outstanding(&self) -> Decimal {
        if self.status.is_open() {
            self.gross
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.status {
            InvoiceStatus::Overdue => true,
            InvoiceStatus::Issued | InvoiceStatus::Sent => today > self.due_date,
            InvoiceStatus::Paid | InvoiceStatus::Returned => false,
        }
    }

    /// Zero until the due date has passed.
    pub fn days_past_due(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }
}

/// Flat recurring-plan row used by the KPIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub id: RecurringPlanId,
    pub status: PlanStatus,
    pub frequency: Frequency,
    pub net_per_period: Decimal,
}

impl PlanSnapshot {
    pub fn from_plan(plan: &RecurringPlan) -> Result<Self, DomainError> {
        Ok(Self {
            id: plan.id_typed(),
            status: plan.status(),
            frequency: plan.frequency(),
            net_per_period: plan.amount_per_period()?.net,
        })
    }

    pub fn monthly_equivalent(&self) -> Result<Decimal, DomainError> {
        self.frequency.monthly_equivalent(self.net_per_period)
    }
}

/// Inclusive date range; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub const ALL: DateRange = DateRange { from: None, to: None };

    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, DomainError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::field("range", "start is after end"));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}
