//! # Block Output
//!
//! Events (key/value tagged records for observability) and validator-set
//! deltas returned to the consensus collaborator.

use serde::{Deserialize, Serialize};

use crate::entities::Address;

/// A single key/value attribute on an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// An opaque, typed record emitted by a hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, e.g. `"transfer"`.
    pub kind: String,
    /// Ordered attributes.
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Create an event with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute (builder style).
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// Look up the first attribute with `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// A change to the consensus validator set. `power == 0` removes the validator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub address: Address,
    pub power: u64,
}

impl ValidatorUpdate {
    /// Create an update.
    pub fn new(address: Address, power: u64) -> Self {
        Self { address, power }
    }

    /// Whether this update removes the validator.
    pub fn is_removal(&self) -> bool {
        self.power == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder_keeps_attribute_order() {
        let event = Event::new("transfer")
            .attr("sender", "a")
            .attr("recipient", "b")
            .attr("amount", 10);

        let keys: Vec<_> = event.attributes.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["sender", "recipient", "amount"]);
        assert_eq!(event.attribute("amount"), Some("10"));
        assert_eq!(event.attribute("missing"), None);
    }

    #[test]
    fn test_zero_power_is_removal() {
        assert!(ValidatorUpdate::new(Address::default(), 0).is_removal());
        assert!(!ValidatorUpdate::new(Address::default(), 1).is_removal());
    }
}
