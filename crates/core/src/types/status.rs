//! Shipment lifecycle.

use serde::{Deserialize, Serialize};

/// Where a shipment is in the quote → label workflow.
///
/// ```text
/// Requested ──quote──▶ Quoted ──claim──▶ LabelPending ──update──▶ Labeled
///                        ▲                   │
///                        └──failed purchase──┘
/// ```
///
/// A record only exists from `Quoted` onwards: `Requested` is the in-flight
/// create command. `LabelPending` marks a record whose label purchase is
/// under way, so a second purchase for it is refused. Nothing leaves
/// `Labeled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Requested,
    Quoted,
    LabelPending,
    Labeled,
}

impl ShipmentStatus {
    /// Whether `next` directly follows `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Quoted)
                | (Self::Quoted, Self::LabelPending)
                | (Self::LabelPending, Self::Labeled | Self::Quoted)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Quoted => "quoted",
            Self::LabelPending => "label_pending",
            Self::Labeled => "labeled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ShipmentStatus; 4] = [
        ShipmentStatus::Requested,
        ShipmentStatus::Quoted,
        ShipmentStatus::LabelPending,
        ShipmentStatus::Labeled,
    ];

    #[test]
    fn test_forward_transitions() {
        assert!(ShipmentStatus::Requested.can_transition_to(ShipmentStatus::Quoted));
        assert!(ShipmentStatus::Quoted.can_transition_to(ShipmentStatus::LabelPending));
        assert!(ShipmentStatus::LabelPending.can_transition_to(ShipmentStatus::Labeled));
    }

    #[test]
    fn test_failed_purchase_releases_claim() {
        assert!(ShipmentStatus::LabelPending.can_transition_to(ShipmentStatus::Quoted));
    }

    #[test]
    fn test_labeled_is_terminal() {
        for next in ALL {
            assert!(!ShipmentStatus::Labeled.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!ShipmentStatus::Requested.can_transition_to(ShipmentStatus::Labeled));
        assert!(!ShipmentStatus::Quoted.can_transition_to(ShipmentStatus::Labeled));
        assert!(!ShipmentStatus::Quoted.can_transition_to(ShipmentStatus::Requested));
        assert!(!ShipmentStatus::LabelPending.can_transition_to(ShipmentStatus::LabelPending));
    }

    #[test]
    fn test_only_quoted_can_be_claimed() {
        let claimable: Vec<_> = ALL
            .into_iter()
            .filter(|s| s.can_transition_to(ShipmentStatus::LabelPending))
            .collect();
        assert_eq!(claimable, vec![ShipmentStatus::Quoted]);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ShipmentStatus::LabelPending).unwrap_or_default();
        assert_eq!(json, "\"label_pending\"");
    }
}
