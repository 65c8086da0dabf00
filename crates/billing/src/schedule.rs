//! Billing frequencies and run-date arithmetic.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use billdesk_core::{mul_money, Decimal, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Date of the `n`-th run counted from `start` (run 0 is `start` itself).
    ///
    /// Always computed from the anchor so month-end dates do not drift:
    /// a plan starting on Jan 31 runs on Feb 29, Mar 31, Apr 30, ...
    /// `None` if the date leaves chrono's range.
    pub fn nth_run(self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
            Frequency::Monthly => start.checked_add_months(Months::new(n)),
            Frequency::Quarterly => start.checked_add_months(Months::new(n.checked_mul(3)?)),
            Frequency::Yearly => start.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// Runs per year.
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Weekly => 52,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Yearly => 1,
        }
    }

    /// One period's amount spread over a month.
    pub fn monthly_equivalent(self, per_period: Decimal) -> Result<Decimal, DomainError> {
        match self {
            Frequency::Monthly => Ok(per_period),
            other => {
                let yearly = mul_money(per_period, Decimal::from(other.periods_per_year()))?;
                Ok(yearly / Decimal::from(12))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_end_is_clamped_without_drift() {
        let start = date(2024, 1, 31);
        let runs: Vec<_> = (0..4).map(|n| Frequency::Monthly.nth_run(start, n).unwrap()).collect();
        assert_eq!(
            runs,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
    }

    #[test]
    fn quarterly_and_yearly_steps() {
        let start = date(2023, 11, 30);
        assert_eq!(Frequency::Quarterly.nth_run(start, 1), Some(date(2024, 2, 29)));
        assert_eq!(Frequency::Yearly.nth_run(date(2024, 2, 29), 1), Some(date(2025, 2, 28)));
        assert_eq!(Frequency::Weekly.nth_run(start, 2), Some(date(2023, 12, 14)));
    }

    #[test]
    fn monthly_equivalents() {
        let amount = Decimal::from(1200);
        assert_eq!(Frequency::Monthly.monthly_equivalent(amount), Ok(Decimal::from(1200)));
        assert_eq!(Frequency::Quarterly.monthly_equivalent(amount), Ok(Decimal::from(400)));
        assert_eq!(Frequency::Yearly.monthly_equivalent(amount), Ok(Decimal::from(100)));
        assert_eq!(Frequency::Weekly.monthly_equivalent(amount), Ok(Decimal::from(5200)));
    }

    #[test]
    fn monthly_equivalent_reports_overflow() {
        assert_eq!(Frequency::Monthly.monthly_equivalent(Decimal::MAX), Ok(Decimal::MAX));
        assert!(Frequency::Weekly.monthly_equivalent(Decimal::MAX).is_err());
        assert!(Frequency::Yearly.monthly_equivalent(Decimal::MAX).is_ok());
    }
}
