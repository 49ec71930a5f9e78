//! Protocol feature negotiation.
//!
//! Client and server agree on a protocol revision during the handshake
//! (the minimum of both sides). Every optional wire structure is gated on a
//! minimum revision; a revision below the threshold means the feature is
//! absent.
//!
//! # Example
//!
//! ```
//! use ch_proto::protocol::Feature;
//!
//! assert!(Feature::BlockInfo.in_revision(54451));
//! assert!(!Feature::BlockInfo.in_revision(0));
//! ```

use std::fmt;

/// Revision sent by this client in its hello.
pub const DEFAULT_REVISION: u32 = 54451;

/// Optional protocol feature with its minimum revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Blocks start with a tagged `BlockInfo` record.
    BlockInfo,
    /// Server hello carries the server time zone.
    TimezoneInServerHello,
    /// Server hello carries a display name.
    DisplayName,
    /// Server hello carries the patch version.
    VersionPatch,
    /// Server may send log blocks.
    ServerLogs,
    /// Server sends column defaults before insert.
    ColumnDefaults,
    /// Client info carries write info.
    ClientWriteInfo,
    /// Settings are sent as strings.
    SettingsSerializedAsStrings,
    /// Inter-server secret in the query packet.
    InterServerSecret,
    /// OpenTelemetry trace context in client info.
    OpenTelemetry,
    /// Server may send profile event blocks.
    ProfileEvents,
}

impl Feature {
    /// All known features, in ascending revision order.
    pub const ALL: [Feature; 11] = [
        Feature::BlockInfo,
        Feature::TimezoneInServerHello,
        Feature::DisplayName,
        Feature::VersionPatch,
        Feature::ServerLogs,
        Feature::ColumnDefaults,
        Feature::ClientWriteInfo,
        Feature::SettingsSerializedAsStrings,
        Feature::InterServerSecret,
        Feature::OpenTelemetry,
        Feature::ProfileEvents,
    ];

    /// Minimum revision that supports this feature.
    pub const fn min_revision(self) -> u32 {
        match self {
            Feature::BlockInfo => 51903,
            Feature::TimezoneInServerHello => 54058,
            Feature::DisplayName => 54372,
            Feature::VersionPatch => 54401,
            Feature::ServerLogs => 54406,
            Feature::ColumnDefaults => 54410,
            Feature::ClientWriteInfo => 54420,
            Feature::SettingsSerializedAsStrings => 54429,
            Feature::InterServerSecret => 54441,
            Feature::OpenTelemetry => 54442,
            Feature::ProfileEvents => 54451,
        }
    }

    /// Check if this feature is available in the given revision.
    #[inline]
    pub const fn in_revision(self, revision: u32) -> bool {
        revision >= self.min_revision()
    }

    /// Wire-independent name, for logging.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::BlockInfo => "block info",
            Feature::TimezoneInServerHello => "timezone in server hello",
            Feature::DisplayName => "display name",
            Feature::VersionPatch => "version patch",
            Feature::ServerLogs => "server logs",
            Feature::ColumnDefaults => "column defaults",
            Feature::ClientWriteInfo => "client write info",
            Feature::SettingsSerializedAsStrings => "settings serialized as strings",
            Feature::InterServerSecret => "inter-server secret",
            Feature::OpenTelemetry => "opentelemetry",
            Feature::ProfileEvents => "profile events",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check if `feature` is supported by `revision` (standalone function).
#[inline]
pub fn supports(feature: Feature, revision: u32) -> bool {
    feature.in_revision(revision)
}

/// List every feature enabled by `revision`.
pub fn features(revision: u32) -> Vec<Feature> {
    Feature::ALL
        .iter()
        .copied()
        .filter(|f| f.in_revision(revision))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(Feature::BlockInfo.in_revision(51903));
        assert!(!Feature::BlockInfo.in_revision(51902));
    }

    #[test]
    fn test_old_revision_has_no_features() {
        assert!(features(0).is_empty());
        assert!(!supports(Feature::BlockInfo, 1));
    }

    #[test]
    fn test_default_revision_has_all_features() {
        assert_eq!(features(DEFAULT_REVISION).len(), Feature::ALL.len());
    }

    #[test]
    fn test_all_is_sorted_by_revision() {
        let revisions: Vec<u32> = Feature::ALL.iter().map(|f| f.min_revision()).collect();
        let mut sorted = revisions.clone();
        sorted.sort_unstable();
        assert_eq!(revisions, sorted);
    }

    #[test]
    fn test_partial_revision() {
        let enabled = features(54401);
        assert!(enabled.contains(&Feature::VersionPatch));
        assert!(!enabled.contains(&Feature::ServerLogs));
        assert_eq!(Feature::ServerLogs.to_string(), "server logs");
    }
}
