//! # Domain Types
//!
//! Id aliases and the closed enums stored as text in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Campaign row id.
pub type CampaignId = i64;

/// Gang row id.
pub type GangId = i64;

/// Asset row id.
pub type AssetId = i64;

/// Trade offer row id.
pub type OfferId = i64;

/// A stored enum label did not match any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// =============================================================================
// ASSET TYPE
// =============================================================================

/// Kind of gang asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
    /// A held territory, usually with an income roll.
    Territory,
    /// A hanger-on attached to the gang.
    #[serde(rename = "Hanger-On")]
    HangerOn,
    /// A learned skill.
    Skill,
    /// Wargear held in the stash.
    Equipment,
    /// A captured enemy fighter.
    Captive,
    /// Anything else.
    Other,
}

impl AssetType {
    /// Every variant, in display order.
    pub const ALL: [Self; 6] = [
        Self::Territory,
        Self::HangerOn,
        Self::Skill,
        Self::Equipment,
        Self::Captive,
        Self::Other,
    ];

    /// The label stored in the database and shown to players.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Territory => "Territory",
            Self::HangerOn => "Hanger-On",
            Self::Skill => "Skill",
            Self::Equipment => "Equipment",
            Self::Captive => "Captive",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.as_str()
                    .chars()
                    .filter(|c| *c != '-')
                    .collect::<String>()
                    .eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| ParseEnumError {
                kind: "asset type",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// OFFER STATUS
// =============================================================================

/// Lifecycle of a trade offer. `Accepted` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    /// Waiting for the destination gang's owner.
    #[default]
    Pending,
    /// Assets and credits have changed hands.
    Accepted,
}

impl OfferStatus {
    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    /// Whether the offer can still be accepted.
    #[must_use]
    pub const fn is_open(self) -> bool {
        match self {
            Self::Pending => true,
            Self::Accepted => false,
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseEnumError {
                kind: "offer status",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_labels_round_trip() {
        for t in AssetType::ALL {
            assert_eq!(t.as_str().parse::<AssetType>(), Ok(t));
        }
    }

    #[test]
    fn test_asset_type_parse_is_lenient() {
        assert_eq!("hanger on".parse::<AssetType>(), Ok(AssetType::HangerOn));
        assert_eq!("HANGER_ON".parse::<AssetType>(), Ok(AssetType::HangerOn));
        assert_eq!(" territory ".parse::<AssetType>(), Ok(AssetType::Territory));
        assert!("Vehicle".parse::<AssetType>().is_err());
    }

    #[test]
    fn test_offer_status() {
        assert_eq!("Pending".parse::<OfferStatus>(), Ok(OfferStatus::Pending));
        assert_eq!("accepted".parse::<OfferStatus>(), Ok(OfferStatus::Accepted));
        assert!("rejected".parse::<OfferStatus>().is_err());
        assert!(OfferStatus::Pending.is_open());
        assert!(!OfferStatus::Accepted.is_open());
    }
}
