// Access Card Codec - Identity payloads carried on physical cards
// Three lifecycles share one compact JSON encoding, discriminated by "t":
// voter ("voter"), poll worker ("pollworker"), county clerk ("clerk").
//
// A card is written by an external encoding authority and physically
// re-read across sessions, so the round trip through encode/decode must be
// exact. The voter card's "uz" used marker is the only field this system
// ever asks to be rewritten.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// The scanned payload is not a well-formed card of any known lifecycle.
/// Recoverable: the caller prompts for a re-scan.
#[derive(Debug, Error)]
#[error("malformed access card payload: {0}")]
pub struct CardFormatError(#[from] serde_json::Error);

// ============================================================================
// CARD PAYLOADS
// ============================================================================

/// Voter card: binds the holder to one ballot style and precinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoterCardData {
    /// Ballot style id.
    pub bs: String,
    /// Precinct id.
    pub pr: String,
    /// Used marker. Opaque to this system beyond "set means consumed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uz: Option<u64>,
}

impl VoterCardData {
    pub fn is_used(&self) -> bool {
        self.uz.is_some()
    }

    /// Mark the card consumed. Touches only the used marker; every other
    /// field survives re-encode unchanged.
    pub fn mark_used(&mut self, marker: u64) {
        self.uz = Some(marker);
    }
}

/// Poll worker card: carries the hash of the election configuration the
/// card was provisioned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollworkerCardData {
    /// Security hash.
    pub h: String,
}

/// County clerk card. Same shape as the poll worker card, higher privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClerkCardData {
    /// Security hash.
    pub h: String,
}

/// Access card payload, discriminated by the "t" field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum CardData {
    #[serde(rename = "voter")]
    Voter(VoterCardData),
    #[serde(rename = "pollworker")]
    Pollworker(PollworkerCardData),
    #[serde(rename = "clerk")]
    Clerk(ClerkCardData),
}

impl CardData {
    pub fn voter(ballot_style_id: impl Into<String>, precinct_id: impl Into<String>) -> CardData {
        CardData::Voter(VoterCardData {
            bs: ballot_style_id.into(),
            pr: precinct_id.into(),
            uz: None,
        })
    }

    pub fn pollworker(hash: impl Into<String>) -> CardData {
        CardData::Pollworker(PollworkerCardData { h: hash.into() })
    }

    pub fn clerk(hash: impl Into<String>) -> CardData {
        CardData::Clerk(ClerkCardData { h: hash.into() })
    }

    /// Decode a raw card payload. The discriminant is recovered first and
    /// selects the variant's field set; an unknown discriminant or a
    /// missing required field fails.
    pub fn decode(raw: &str) -> Result<CardData, CardFormatError> {
        let card = serde_json::from_str(raw).map_err(|e| {
            log::warn!("card decode failed: {}", e);
            CardFormatError(e)
        })?;
        Ok(card)
    }

    /// Encode for the card writer. Exact inverse of `decode`.
    pub fn encode(&self) -> Result<String, CardFormatError> {
        serde_json::to_string(self).map_err(CardFormatError)
    }

    /// Discriminant as it appears on the wire.
    pub fn card_type(&self) -> &'static str {
        match self {
            CardData::Voter(_) => "voter",
            CardData::Pollworker(_) => "pollworker",
            CardData::Clerk(_) => "clerk",
        }
    }

    pub fn as_voter(&self) -> Option<&VoterCardData> {
        match self {
            CardData::Voter(v) => Some(v),
            _ => None,
        }
    }

    /// Security hash of an admin (poll worker or clerk) card. Compared
    /// against the catalog's election hash before unlocking admin screens.
    pub fn admin_hash(&self) -> Option<&str> {
        match self {
            CardData::Voter(_) => None,
            CardData::Pollworker(c) => Some(&c.h),
            CardData::Clerk(c) => Some(&c.h),
        }
    }

    /// Mark a voter card consumed. Returns false (and changes nothing) for
    /// admin cards, which have no used marker.
    pub fn mark_used(&mut self, marker: u64) -> bool {
        match self {
            CardData::Voter(v) => {
                v.mark_used(marker);
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
