//! Line-item monetary calculator.
//!
//! One pure function set shared by orders, invoices, recurring plans and the
//! price-list export:
//!
//! ```text
//! line_net   = quantity * unit_price_net * (1 - discount_percent / 100)
//! line_vat   = line_net * vat_rate
//! line_gross = line_net + line_vat
//! ```
//!
//! The calculator does not validate. Negative quantities or prices flow
//! through the arithmetic unchanged; callers that accept user input run
//! [`LineItem::validate`] first. The only normalisation is clamping the
//! discount to `[0, 100]`.
//!
//! Arithmetic is checked: a result outside `Decimal`'s range is reported as
//! an error instead of panicking.

use core::iter::Sum;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

fn out_of_range() -> DomainError {
    DomainError::field("amount", "exceeds the supported range")
}

/// Checked `a + b` for money figures.
pub fn add_money(a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_add(b).ok_or_else(out_of_range)
}

/// Checked `a * b` for money figures.
pub fn mul_money(a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_mul(b).ok_or_else(out_of_range)
}

/// A priced line as it appears on an order, invoice or plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub quantity: Decimal,
    /// Unit price before tax, in currency units (minor-unit precision).
    pub unit_price_net: Decimal,
    /// Percentage in `[0, 100]`; absent means no discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
    /// Fraction, e.g. `0.19` for 19 %; absent means untaxed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<Decimal>,
}

impl ValueObject for LineItem {}

impl LineItem {
    pub fn new(quantity: Decimal, unit_price_net: Decimal) -> Self {
        Self {
            quantity,
            unit_price_net,
            discount_percent: None,
            vat_rate: None,
        }
    }

    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.discount_percent = Some(percent);
        self
    }

    pub fn with_vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = Some(rate);
        self
    }

    /// Discount actually used by the arithmetic: missing ⇒ 0, clamped to `[0, 100]`.
    pub fn effective_discount(&self) -> Decimal {
        self.discount_percent
            .unwrap_or(Decimal::ZERO)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }

    /// VAT rate used by the arithmetic: missing ⇒ 0.
    pub fn effective_vat_rate(&self) -> Decimal {
        self.vat_rate.unwrap_or(Decimal::ZERO)
    }

    pub fn line_net(&self) -> DomainResult<Decimal> {
        let kept = Decimal::ONE - self.effective_discount() / Decimal::ONE_HUNDRED;
        mul_money(mul_money(self.quantity, self.unit_price_net)?, kept)
    }

    /// Net, VAT and gross for this line.
    pub fn amounts(&self) -> DomainResult<LineAmounts> {
        let line_net = self.line_net()?;
        let line_vat = mul_money(line_net, self.effective_vat_rate())?;
        Ok(LineAmounts {
            line_net,
            line_vat,
            line_gross: add_money(line_net, line_vat)?,
        })
    }

    /// Input validation used by editing paths before any arithmetic.
    ///
    /// Quantity and unit price must not be negative, a present discount must
    /// lie in `[0, 100]` and a present VAT rate in `[0, 1]`. The line's
    /// amounts must also be representable.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < Decimal::ZERO {
            return Err(DomainError::field("quantity", "must not be negative"));
        }
        if self.unit_price_net < Decimal::ZERO {
            return Err(DomainError::field("unitPriceNet", "must not be negative"));
        }
        if let Some(discount) = self.discount_percent {
            if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
                return Err(DomainError::field(
                    "discountPercent",
                    format!("{discount} is outside 0..=100"),
                ));
            }
        }
        if let Some(rate) = self.vat_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(DomainError::field(
                    "vatRate",
                    format!("{rate} is outside 0..=1"),
                ));
            }
        }
        self.amounts().map(|_| ())
    }
}

/// Validate every item, reporting the first failure with its position.
///
/// Also rejects an item set whose document total is not representable.
pub fn validate_items(items: &[LineItem]) -> DomainResult<()> {
    for (idx, item) in items.iter().enumerate() {
        item.validate().map_err(|e| match e {
            DomainError::Validation(msg) => DomainError::Validation(format!("items[{idx}].{msg}")),
            other => other,
        })?;
    }
    calculate_lines(items).map(|_| ())
}

/// Derived per-line figures. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAmounts {
    pub line_net: Decimal,
    pub line_vat: Decimal,
    pub line_gross: Decimal,
}

impl ValueObject for LineAmounts {}

/// Document-level sum of line amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

impl ValueObject for DocumentTotals {}

impl DocumentTotals {
    pub const ZERO: Self = Self {
        net: Decimal::ZERO,
        vat: Decimal::ZERO,
        gross: Decimal::ZERO,
    };

    pub fn from_items(items: &[LineItem]) -> DomainResult<Self> {
        calculate_lines(items).map(|calc| calc.totals)
    }

    pub fn from_lines(lines: &[LineAmounts]) -> DomainResult<Self> {
        lines.iter().copied().sum()
    }

    pub fn checked_add(self, rhs: Self) -> DomainResult<Self> {
        Ok(Self {
            net: add_money(self.net, rhs.net)?,
            vat: add_money(self.vat, rhs.vat)?,
            gross: add_money(self.gross, rhs.gross)?,
        })
    }

    /// Round each figure to `dp` decimal places, half away from zero.
    ///
    /// Presentation only; the unrounded totals stay authoritative.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            net: round_money(self.net, dp),
            vat: round_money(self.vat, dp),
            gross: round_money(self.gross, dp),
        }
    }
}

/// Display rounding used for every monetary figure: `dp` places, half away from zero.
pub fn round_money(amount: Decimal, dp: u32) -> Decimal {
    amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

impl From<LineAmounts> for DocumentTotals {
    fn from(line: LineAmounts) -> Self {
        Self {
            net: line.line_net,
            vat: line.line_vat,
            gross: line.line_gross,
        }
    }
}

impl Sum<LineAmounts> for DomainResult<DocumentTotals> {
    fn sum<I: Iterator<Item = LineAmounts>>(iter: I) -> Self {
        iter.map(DocumentTotals::from).sum()
    }
}

impl Sum<DocumentTotals> for DomainResult<DocumentTotals> {
    fn sum<I: Iterator<Item = DocumentTotals>>(mut iter: I) -> Self {
        iter.try_fold(DocumentTotals::ZERO, DocumentTotals::checked_add)
    }
}

/// Result of running the calculator over a document's items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Calculation {
    /// Same length and order as the input.
    pub lines: Vec<LineAmounts>,
    pub totals: DocumentTotals,
}

/// Compute per-line amounts and the document total for an ordered item list.
pub fn calculate_lines(items: &[LineItem]) -> DomainResult<Calculation> {
    let lines = items
        .iter()
        .map(LineItem::amounts)
        .collect::<DomainResult<Vec<_>>>()?;
    let totals = DocumentTotals::from_lines(&lines)?;
    Ok(Calculation { lines, totals })
}
