use serde::{Deserialize, Serialize};

/// Invoice status lifecycle.
///
/// Transitions are a fixed lookup table, see [`InvoiceStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Issued,
    Sent,
    Paid,
    Returned,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Issued,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Returned,
        InvoiceStatus::Overdue,
    ];

    /// Wire name, as used in the `status` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "ISSUED",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Returned => "RETURNED",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }

    pub fn allowed_targets(self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;
        match self {
            Issued => &[Sent, Paid, Returned, Overdue],
            Sent => &[Paid, Returned, Overdue],
            Overdue => &[Sent, Paid, Returned],
            Paid => &[Returned],
            Returned => &[],
        }
    }

    pub fn can_transition_to(self, target: InvoiceStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Still expecting money from the customer.
    pub fn is_open(self) -> bool {
        !matches!(self, InvoiceStatus::Paid | InvoiceStatus::Returned)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = billdesk_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| billdesk_core::DomainError::field("status", format!("unknown status '{s}'")))
    }
}
