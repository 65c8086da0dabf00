use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use billdesk_billing::PlanStatus;
use billdesk_core::{add_money, round_money, Decimal, DomainError};
use billdesk_invoicing::InvoiceStatus;

use crate::snapshot::{DateRange, InvoiceSnapshot, PlanSnapshot};

/// Headline figures for the dashboard.
///
/// Invoice figures cover invoices whose issue date falls in the range; plan
/// figures reflect the plans as they are now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub invoice_count: usize,
    pub invoiced_net: Decimal,
    pub invoiced_gross: Decimal,
    pub paid_gross: Decimal,
    pub outstanding_gross: Decimal,
    pub overdue_count: usize,
    pub overdue_amount: Decimal,
    pub status_counts: BTreeMap<InvoiceStatus, usize>,
    pub active_plans: usize,
    pub monthly_recurring_revenue: Decimal,
}

impl DashboardKpis {
    pub fn compute(
        invoices: &[InvoiceSnapshot],
        plans: &[PlanSnapshot],
        range: DateRange,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        let mut kpis = Self {
            invoice_count: 0,
            invoiced_net: Decimal::ZERO,
            invoiced_gross: Decimal::ZERO,
            paid_gross: Decimal::ZERO,
            outstanding_gross: Decimal::ZERO,
            overdue_count: 0,
            overdue_amount: Decimal::ZERO,
            status_counts: InvoiceStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            active_plans: 0,
            monthly_recurring_revenue: Decimal::ZERO,
        };

        for invoice in invoices.iter().filter(|i| range.contains(i.issue_date)) {
            kpis.invoice_count += 1;
            kpis.invoiced_net = add_money(kpis.invoiced_net, invoice.net)?;
            kpis.invoiced_gross = add_money(kpis.invoiced_gross, invoice.gross)?;
            *kpis.status_counts.entry(invoice.status).or_default() += 1;

            if invoice.status == InvoiceStatus::Paid {
                kpis.paid_gross = add_money(kpis.paid_gross, invoice.gross)?;
            }
            kpis.outstanding_gross = add_money(kpis.outstanding_gross, invoice.outstanding())?;
            if invoice.is_overdue(today) {
                kpis.overdue_count += 1;
                kpis.overdue_amount = add_money(kpis.overdue_amount, invoice.outstanding())?;
            }
        }

        for plan in plans.iter().filter(|p| p.status == PlanStatus::Active) {
            kpis.active_plans += 1;
            kpis.monthly_recurring_revenue =
                add_money(kpis.monthly_recurring_revenue, plan.monthly_equivalent()?)?;
        }

        Ok(kpis)
    }

    /// Copy with every amount rounded for display.
    pub fn rounded(&self, dp: u32) -> Self {
        let round = |d: Decimal| round_money(d, dp);
        Self {
            invoiced_net: round(self.invoiced_net),
            invoiced_gross: round(self.invoiced_gross),
            paid_gross: round(self.paid_gross),
            outstanding_gross: round(self.outstanding_gross),
            overdue_amount: round(self.overdue_amount),
            monthly_recurring_revenue: round(self.monthly_recurring_revenue),
            ..self.clone()
        }
    }
}

/// Invoiced amounts per calendar month of issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub net: Decimal,
    pub gross: Decimal,
}

/// Months with at least one invoice in the range, in chronological order.
/// Returned invoices are excluded.
pub fn revenue_by_month(
    invoices: &[InvoiceSnapshot],
    range: DateRange,
) -> Result<Vec<MonthlyRevenue>, DomainError> {
    let mut months: BTreeMap<(i32, u32), MonthlyRevenue> = BTreeMap::new();
    for invoice in invoices
        .iter()
        .filter(|i| i.status != InvoiceStatus::Returned && range.contains(i.issue_date))
    {
        let key = (invoice.issue_date.year(), invoice.issue_date.month());
        let entry = months.entry(key).or_insert(MonthlyRevenue {
            year: key.0,
            month: key.1,
            net: Decimal::ZERO,
            gross: Decimal::ZERO,
        });
        entry.net = add_money(entry.net, invoice.net)?;
        entry.gross = add_money(entry.gross, invoice.gross)?;
    }
    Ok(months.into_values().collect())
}
