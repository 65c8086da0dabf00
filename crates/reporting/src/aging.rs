//! Receivables aging.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billdesk_core::{add_money, Decimal, DomainError};

use crate::snapshot::InvoiceSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucket {
    pub count: usize,
    pub amount: Decimal,
}

impl AgingBucket {
    fn add(&mut self, amount: Decimal) -> Result<(), DomainError> {
        self.amount = add_money(self.amount, amount)?;
        self.count += 1;
        Ok(())
    }
}

/// Outstanding gross by days past due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    /// Not yet due.
    pub current: AgingBucket,
    pub days_1_30: AgingBucket,
    pub days_31_60: AgingBucket,
    pub days_61_90: AgingBucket,
    pub days_over_90: AgingBucket,
}

impl AgingReport {
    pub fn total(&self) -> Result<AgingBucket, DomainError> {
        [
            self.current,
            self.days_1_30,
            self.days_31_60,
            self.days_61_90,
            self.days_over_90,
        ]
        .into_iter()
        .try_fold(AgingBucket::default(), |acc, b| {
            Ok(AgingBucket {
                count: acc.count + b.count,
                amount: add_money(acc.amount, b.amount)?,
            })
        })
    }

    fn bucket_mut(&mut self, days_past_due: i64) -> &mut AgingBucket {
        match days_past_due {
            i64::MIN..=0 => &mut self.current,
            1..=30 => &mut self.days_1_30,
            31..=60 => &mut self.days_31_60,
            61..=90 => &mut self.days_61_90,
            _ => &mut self.days_over_90,
        }
    }
}

/// Bucket every unpaid, unreturned invoice by how far past due it is on `today`.
///
/// An invoice explicitly marked OVERDUE before its due date still lands in
/// `current`; the buckets follow the calendar, not the status.
pub fn aging_buckets(
    rows: &[InvoiceSnapshot],
    today: NaiveDate,
) -> Result<AgingReport, DomainError> {
    let mut report = AgingReport::default();
    for row in rows.iter().filter(|r| r.status.is_open()) {
        report.bucket_mut(row.days_past_due(today)).add(row.outstanding())?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_customers::CustomerId;
    use billdesk_invoicing::{InvoiceId, InvoiceStatus};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(status: InvoiceStatus, due: NaiveDate, gross: Decimal) -> InvoiceSnapshot {
        InvoiceSnapshot {
            id: InvoiceId::generate(),
            number: "INV".to_string(),
            customer_id: CustomerId::generate(),
            status,
            issue_date: date(2024, 1, 1),
            due_date: due,
            net: gross,
            gross,
        }
    }

    #[test]
    fn buckets_by_days_past_due() {
        let today = date(2024, 6, 30);
        let rows = vec![
            row(InvoiceStatus::Issued, date(2024, 7, 10), dec!(10)),
            row(InvoiceStatus::Sent, date(2024, 6, 30), dec!(1)),
            row(InvoiceStatus::Sent, date(2024, 6, 29), dec!(20)),
            row(InvoiceStatus::Overdue, date(2024, 5, 31), dec!(30)),
            row(InvoiceStatus::Overdue, date(2024, 5, 30), dec!(40)),
            row(InvoiceStatus::Issued, date(2024, 4, 1), dec!(60)),
            row(InvoiceStatus::Issued, date(2024, 1, 1), dec!(90)),
            row(InvoiceStatus::Paid, date(2024, 1, 1), dec!(1000)),
            row(InvoiceStatus::Returned, date(2024, 1, 1), dec!(1000)),
        ];

        let report = aging_buckets(&rows, today).unwrap();
        assert_eq!(report.current, AgingBucket { count: 2, amount: dec!(11) });
        assert_eq!(report.days_1_30, AgingBucket { count: 2, amount: dec!(50) });
        assert_eq!(report.days_31_60, AgingBucket { count: 1, amount: dec!(40) });
        assert_eq!(report.days_61_90, AgingBucket { count: 1, amount: dec!(60) });
        assert_eq!(report.days_over_90, AgingBucket { count: 1, amount: dec!(90) });
        assert_eq!(report.total().unwrap(), AgingBucket { count: 7, amount: dec!(251) });
    }

    #[test]
    fn empty_input_gives_empty_report() {
        assert_eq!(aging_buckets(&[], date(2024, 1, 1)).unwrap(), AgingReport::default());
    }

    #[test]
    fn bucket_overflow_is_an_error() {
        let today = date(2024, 6, 30);
        let rows = vec![
            row(InvoiceStatus::Sent, date(2024, 6, 20), Decimal::MAX),
            row(InvoiceStatus::Sent, date(2024, 6, 25), Decimal::MAX),
        ];
        assert!(aging_buckets(&rows, today).is_err());

        let split = vec![
            row(InvoiceStatus::Sent, date(2024, 7, 10), Decimal::MAX),
            row(InvoiceStatus::Sent, date(2024, 6, 25), Decimal::MAX),
        ];
        let report = aging_buckets(&split, today).unwrap();
        assert!(report.total().is_err());
    }
}
