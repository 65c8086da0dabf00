//! Rows of the printable price list.
//!
//! Rendering (PDF, HTML) happens elsewhere; this module decides what is
//! listed and computes the per-unit figures through the shared calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billdesk_core::DomainError;

use crate::item::{PriceListItem, PriceListItemId};

/// One line of the exported price list, priced for a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListRow {
    pub item_id: PriceListItemId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub unit_vat: Decimal,
    pub unit_price_gross: Decimal,
}

/// Active items only, sorted by code.
pub fn export_rows(items: &[PriceListItem]) -> Result<Vec<PriceListRow>, DomainError> {
    let mut rows = items
        .iter()
        .filter(|item| item.can_be_sold())
        .map(|item| {
            let amounts = item.to_line_item(Decimal::ONE).amounts()?;
            Ok(PriceListRow {
                item_id: item.id_typed(),
                code: item.code().to_string(),
                name: item.name().to_string(),
                unit: item.unit().to_string(),
                unit_price_net: amounts.line_net,
                vat_rate: item.vat_rate(),
                unit_vat: amounts.line_vat,
                unit_price_gross: amounts.line_gross,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;
    rows.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(rows)
}
