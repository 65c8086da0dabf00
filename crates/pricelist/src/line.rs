//! Priced document lines shared by orders, invoices and recurring plans.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billdesk_core::{calculate_lines, Calculation, DocumentTotals, DomainError, LineItem};

use crate::item::{PriceListItem, PriceListItemId};

/// Line as submitted by an editor, before numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    pub description: String,
    /// Catalogue entry the line was picked from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_list_item_id: Option<PriceListItemId>,
    #[serde(flatten)]
    pub item: LineItem,
}

impl LineDraft {
    pub fn new(description: impl Into<String>, item: LineItem) -> Self {
        Self {
            description: description.into(),
            price_list_item_id: None,
            item,
        }
    }

    /// `quantity` units of a catalogue item at its current price and VAT.
    pub fn from_price_list(entry: &PriceListItem, quantity: Decimal) -> Self {
        Self {
            description: entry.name().to_string(),
            price_list_item_id: Some(entry.id_typed()),
            item: entry.to_line_item(quantity),
        }
    }

    pub fn with_discount(mut self, percent: Decimal) -> Self {
        self.item = self.item.with_discount(percent);
        self
    }
}

/// Numbered line stored on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub line_no: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_list_item_id: Option<PriceListItemId>,
    #[serde(flatten)]
    pub item: LineItem,
}

impl DocumentLine {
    pub fn from_draft(line_no: u32, draft: &LineDraft) -> Self {
        Self {
            line_no,
            description: draft.description.trim().to_string(),
            price_list_item_id: draft.price_list_item_id,
            item: draft.item,
        }
    }

    pub fn to_draft(&self) -> LineDraft {
        LineDraft {
            description: self.description.clone(),
            price_list_item_id: self.price_list_item_id,
            item: self.item,
        }
    }
}

/// Validate drafts and number them from 1.
///
/// Every line needs a description and must pass [`LineItem::validate`], and
/// the document total must be representable.
pub fn number_lines(drafts: &[LineDraft]) -> Result<Vec<DocumentLine>, DomainError> {
    let lines = drafts
        .iter()
        .enumerate()
        .map(|(idx, draft)| {
            validate_draft(idx, draft)?;
            Ok(DocumentLine::from_draft(idx as u32 + 1, draft))
        })
        .collect::<Result<Vec<_>, DomainError>>()?;
    totals(&lines)?;
    Ok(lines)
}

pub fn validate_draft(idx: usize, draft: &LineDraft) -> Result<(), DomainError> {
    if draft.description.trim().is_empty() {
        return Err(DomainError::Validation(format!(
            "items[{idx}].description: cannot be empty"
        )));
    }
    draft.item.validate().map_err(|e| match e {
        DomainError::Validation(msg) => DomainError::Validation(format!("items[{idx}].{msg}")),
        other => other,
    })
}

/// Calculator input for a set of lines, in line order.
pub fn line_items(lines: &[DocumentLine]) -> Vec<LineItem> {
    lines.iter().map(|l| l.item).collect()
}

pub fn calculate(lines: &[DocumentLine]) -> Result<Calculation, DomainError> {
    calculate_lines(&line_items(lines))
}

pub fn totals(lines: &[DocumentLine]) -> Result<DocumentTotals, DomainError> {
    calculate(lines).map(|calc| calc.totals)
}

/// Totals of a set of drafts, e.g. as received over the wire.
pub fn draft_totals(drafts: &[LineDraft]) -> Result<DocumentTotals, DomainError> {
    let items: Vec<LineItem> = drafts.iter().map(|d| d.item).collect();
    DocumentTotals::from_items(&items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::created_item;
    use rust_decimal_macros::dec;

    #[test]
    fn number_lines_assigns_sequential_numbers() {
        let drafts = vec![
            LineDraft::new(" Setup ", LineItem::new(dec!(1), dec!(250))),
            LineDraft::new("Support", LineItem::new(dec!(3), dec!(80))),
        ];
        let lines = number_lines(&drafts).unwrap();
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].description, "Setup");
        assert_eq!(lines[1].line_no, 2);
        assert_eq!(totals(&lines).unwrap().net, dec!(490));
    }

    #[test]
    fn number_lines_rejects_blank_description_and_bad_amounts() {
        let err = number_lines(&[LineDraft::new("", LineItem::new(dec!(1), dec!(1)))]).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("items[0].description: cannot be empty".to_string())
        );

        let drafts = vec![
            LineDraft::new("ok", LineItem::new(dec!(1), dec!(1))),
            LineDraft::new("bad", LineItem::new(dec!(1), dec!(1)).with_discount(dec!(101))),
        ];
        let err = number_lines(&drafts).unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.starts_with("items[1].discountPercent")));
    }

    #[test]
    fn from_price_list_links_the_catalogue_entry() {
        let entry = created_item("HOST", dec!(20), dec!(0.19));
        let draft = LineDraft::from_price_list(&entry, dec!(3)).with_discount(dec!(50));
        assert_eq!(draft.price_list_item_id, Some(entry.id_typed()));
        assert_eq!(draft.description, "Item HOST");
        assert_eq!(draft.item.amounts().unwrap().line_net, dec!(30));
    }

    #[test]
    fn calculate_and_totals_agree() {
        let lines = number_lines(&[
            LineDraft::new("a", LineItem::new(dec!(2), dec!(100)).with_discount(dec!(10)).with_vat_rate(dec!(0.19))),
            LineDraft::new("b", LineItem::new(dec!(1), dec!(5))),
        ])
        .unwrap();
        let calc = calculate(&lines).unwrap();
        assert_eq!(calc.lines.len(), 2);
        assert_eq!(calc.totals, totals(&lines).unwrap());
        assert_eq!(calc.totals.gross, dec!(219.2));
        assert_eq!(draft_totals(&[lines[0].to_draft(), lines[1].to_draft()]).unwrap(), calc.totals);
    }

    #[test]
    fn number_lines_rejects_a_total_that_overflows() {
        let big = LineDraft::new("big", LineItem::new(Decimal::MAX, Decimal::ONE));
        assert!(number_lines(std::slice::from_ref(&big)).is_ok());

        let err = number_lines(&[big.clone(), big]).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("amount: exceeds the supported range".to_string())
        );
    }
}
