use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - designed to be **append-only**
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "invoicing.invoice.issued").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32 {
        1
    }

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Split `event_type` into its context/aggregate/action parts.
    fn name(&self) -> EventName {
        EventName::parse(self.event_type())
    }
}

/// Parsed `context.aggregate.action` event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventName {
    pub context: &'static str,
    pub aggregate: &'static str,
    pub action: &'static str,
}

impl EventName {
    /// Names with fewer than three segments leave the missing parts empty.
    pub fn parse(event_type: &'static str) -> Self {
        let mut parts = event_type.splitn(3, '.');
        Self {
            context: parts.next().unwrap_or_default(),
            aggregate: parts.next().unwrap_or_default(),
            action: parts.next().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_names() {
        let name = EventName::parse("billing.plan.run_recorded");
        assert_eq!(name.context, "billing");
        assert_eq!(name.aggregate, "plan");
        assert_eq!(name.action, "run_recorded");
    }

    #[test]
    fn short_names_leave_parts_empty() {
        let name = EventName::parse("heartbeat");
        assert_eq!(name.context, "heartbeat");
        assert_eq!(name.aggregate, "");
        assert_eq!(name.action, "");
    }
}
