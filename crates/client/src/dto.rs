//! JSON shapes exchanged with the API (camelCase, SCREAMING_SNAKE_CASE statuses).
//!
//! Line items travel as [`LineDraft`]s; totals are never read from the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billdesk_auth::{Role, UserId, UserStatus};
use billdesk_billing::{Frequency, PlanStatus, RecurringPlanId};
use billdesk_core::{validate_items, Decimal, DocumentTotals, DomainError};
use billdesk_customers::{CustomerId, CustomerStatus};
use billdesk_invoicing::{InvoiceId, InvoiceStatus};
use billdesk_orders::{OrderId, OrderStatus};
use billdesk_pricelist::{LineDraft, PriceListItemId};
use billdesk_reporting::{InvoiceSnapshot, PlanSnapshot};

fn totals_of(items: &[LineDraft]) -> Result<DocumentTotals, DomainError> {
    let raw: Vec<_> = items.iter().map(|line| line.item).collect();
    DocumentTotals::from_items(&raw)
}

/// Reject a line set before it is sent, with the offending position in the message.
pub fn validate_lines(items: &[LineDraft]) -> Result<(), DomainError> {
    for (idx, line) in items.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(DomainError::field(&format!("items[{idx}].description"), "cannot be empty"));
        }
    }
    let raw: Vec<_> = items.iter().map(|line| line.item).collect();
    validate_items(&raw)
}

/// Spring-style page envelope returned by the paged endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    #[serde(alias = "number")]
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.content.is_empty() || self.page.saturating_add(1) >= self.total_pages
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    pub payment_terms_days: u32,
    pub status: CustomerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms_days: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Price list
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListItemDto {
    pub id: PriceListItemId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListItemInput {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFlag {
    pub active: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    pub status: OrderStatus,
    pub items: Vec<LineDraft>,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
}

impl OrderDto {
    pub fn totals(&self) -> Result<DocumentTotals, DomainError> {
        totals_of(&self.items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<LineDraft>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Invoices
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: InvoiceId,
    pub number: String,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub plan_id: Option<RecurringPlanId>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub items: Vec<LineDraft>,
}

impl InvoiceDto {
    pub fn totals(&self) -> Result<DocumentTotals, DomainError> {
        totals_of(&self.items)
    }

    pub fn to_snapshot(&self) -> Result<InvoiceSnapshot, DomainError> {
        let totals = self.totals()?;
        Ok(InvoiceSnapshot {
            id: self.id,
            number: self.number.clone(),
            customer_id: self.customer_id,
            status: self.status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            net: totals.net,
            gross: totals.gross,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    pub customer_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<LineDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsUpdate {
    pub items: Vec<LineDraft>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: InvoiceStatus,
}

// ─────────────────────────────────────────────────────────────────────────────
// Recurring plans
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: RecurringPlanId,
    pub customer_id: CustomerId,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_run_date: Option<NaiveDate>,
    pub status: PlanStatus,
    pub items: Vec<LineDraft>,
}

impl PlanDto {
    pub fn amount_per_period(&self) -> Result<DocumentTotals, DomainError> {
        totals_of(&self.items)
    }

    pub fn to_snapshot(&self) -> Result<PlanSnapshot, DomainError> {
        Ok(PlanSnapshot {
            id: self.id,
            status: self.status,
            frequency: self.frequency,
            net_per_period: self.amount_per_period()?.net,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub customer_id: CustomerId,
    pub name: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub items: Vec<LineDraft>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users & roles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDto {
    pub name: Role,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::LineItem;
    use rust_decimal_macros::dec;

    #[test]
    fn invoice_totals_come_from_items() {
        let json = r#"{
            "id": "0190a5a4-7c2e-7000-8000-000000000001",
            "number": "INV-1",
            "customerId": "0190a5a4-7c2e-7000-8000-000000000002",
            "issueDate": "2024-03-01",
            "dueDate": "2024-03-15",
            "status": "SENT",
            "items": [
                {"description": "Consulting", "quantity": 2, "unitPriceNet": 100, "discountPercent": 10, "vatRate": 0.19}
            ],
            "total": 999
        }"#;

        let dto: InvoiceDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.status, InvoiceStatus::Sent);
        assert_eq!(dto.order_id, None);

        let snapshot = dto.to_snapshot().unwrap();
        assert_eq!(snapshot.net, dec!(180));
        assert_eq!(snapshot.gross, dec!(214.2));
    }

    #[test]
    fn page_detects_last_page() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"content":[1,2],"number":1,"size":2,"totalElements":4,"totalPages":2}"#,
        )
        .unwrap();
        assert_eq!(page.page, 1);
        assert!(page.is_last());
    }

    #[test]
    fn page_index_at_the_top_of_the_range_is_last() {
        let page = Page {
            content: vec![1],
            page: u32::MAX,
            size: 1,
            total_elements: 1,
            total_pages: 1,
        };
        assert!(page.is_last());
    }

    #[test]
    fn oversized_payload_totals_are_errors() {
        let json = r#"{
            "id": "0190a5a4-7c2e-7000-8000-000000000001",
            "number": "INV-1",
            "customerId": "0190a5a4-7c2e-7000-8000-000000000002",
            "issueDate": "2024-03-01",
            "dueDate": "2024-03-15",
            "status": "SENT",
            "items": [
                {"description": "A", "quantity": "1000000000000000", "unitPriceNet": "100000000000000"}
            ]
        }"#;

        let dto: InvoiceDto = serde_json::from_str(json).unwrap();
        assert!(dto.totals().is_err());
        assert!(dto.to_snapshot().is_err());
    }

    #[test]
    fn wire_amounts_keep_every_digit() {
        let json = r#"{
            "id": "0190a5a4-7c2e-7000-8000-000000000001",
            "number": "INV-1",
            "customerId": "0190a5a4-7c2e-7000-8000-000000000002",
            "issueDate": "2024-03-01",
            "dueDate": "2024-03-15",
            "status": "SENT",
            "items": [
                {"description": "A", "quantity": 1, "unitPriceNet": "12345678901234567.89", "vatRate": 0}
            ]
        }"#;

        let dto: InvoiceDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.totals().unwrap().net, dec!(12345678901234567.89));

        let back = serde_json::to_value(&dto).unwrap();
        assert_eq!(back["items"][0]["unitPriceNet"], "12345678901234567.89");
    }

    #[test]
    fn validate_lines_reports_position() {
        let items = vec![
            LineDraft::new("ok", LineItem::new(dec!(1), dec!(1))),
            LineDraft::new("bad", LineItem::new(dec!(1), dec!(1)).with_discount(dec!(120))),
        ];
        let err = validate_lines(&items).unwrap_err();
        assert!(err.to_string().contains("items[1].discountPercent"));

        let blank = vec![LineDraft::new(" ", LineItem::new(dec!(1), dec!(1)))];
        assert!(validate_lines(&blank).unwrap_err().to_string().contains("items[0].description"));
    }

    #[test]
    fn customer_input_skips_missing_fields() {
        let input = CustomerInput {
            name: "Acme".to_string(),
            vat_number: Some("DE123".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Acme", "vatNumber": "DE123"}));
    }
}
