// Voting Session - Activation and per-voter mutable state
// One session serves one voter: bind a (ballot style, precinct) pair,
// collect validated votes, hand off a cast ballot record, reset.
//
// The election catalog stays shared and read-only; everything a voter can
// change lives here and is owned by exactly one session.

use crate::ballot::{validate_vote, Vote, VoteError, VotesDict};
use crate::card::CardData;
use crate::catalog::ElectionCatalog;
use crate::election::Contest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ACTIVATION
// ============================================================================

/// Activation attempted with ids the catalog cannot vouch for.
/// Recoverable: the caller re-prompts for a valid style/precinct or card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("unknown ballot style: {0}")]
    UnknownBallotStyle(String),

    #[error("unknown precinct: {0}")]
    UnknownPrecinct(String),

    #[error("precinct {precinct_id} is not covered by ballot style {ballot_style_id}")]
    PrecinctNotInBallotStyle {
        ballot_style_id: String,
        precinct_id: String,
    },

    #[error("card is not a voter card")]
    NotAVoterCard,

    #[error("voter card has already been used")]
    VoterCardUsed,

    #[error("no ballot has been activated")]
    NotActivated,
}

/// The immutable binding of one session to one (ballot style, precinct)
/// pair. Only `activate` produces one, so holding an `ActivationData`
/// means the pair was checked against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationData {
    ballot_style_id: String,
    precinct_id: String,
}

impl ActivationData {
    pub fn ballot_style_id(&self) -> &str {
        &self.ballot_style_id
    }

    pub fn precinct_id(&self) -> &str {
        &self.precinct_id
    }
}

/// Resolve a (ballot style, precinct) pair into an activation record.
///
/// Both ids must exist in the catalog and the style's precinct set must
/// contain the precinct.
pub fn activate(
    catalog: &ElectionCatalog,
    ballot_style_id: &str,
    precinct_id: &str,
) -> Result<ActivationData, ActivationError> {
    let style = catalog
        .ballot_style(ballot_style_id)
        .ok_or_else(|| ActivationError::UnknownBallotStyle(ballot_style_id.to_string()))?;

    if catalog.precinct(precinct_id).is_none() {
        return Err(ActivationError::UnknownPrecinct(precinct_id.to_string()));
    }

    if !style.covers_precinct(precinct_id) {
        return Err(ActivationError::PrecinctNotInBallotStyle {
            ballot_style_id: ballot_style_id.to_string(),
            precinct_id: precinct_id.to_string(),
        });
    }

    Ok(ActivationData {
        ballot_style_id: ballot_style_id.to_string(),
        precinct_id: precinct_id.to_string(),
    })
}

// ============================================================================
// USER SETTINGS
// ============================================================================

/// Text size step, smallest to largest. Serialized as 0 through 3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl TryFrom<u8> for TextSize {
    type Error = String;

    fn try_from(value: u8) -> Result<TextSize, String> {
        match value {
            0 => Ok(TextSize::Small),
            1 => Ok(TextSize::Medium),
            2 => Ok(TextSize::Large),
            3 => Ok(TextSize::ExtraLarge),
            other => Err(format!("text size out of range: {}", other)),
        }
    }
}

impl From<TextSize> for u8 {
    fn from(size: TextSize) -> u8 {
        match size {
            TextSize::Small => 0,
            TextSize::Medium => 1,
            TextSize::Large => 2,
            TextSize::ExtraLarge => 3,
        }
    }
}

/// Ambient per-session display settings. Opaque passthrough for the UI
/// layer; carries no election-integrity meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub text_size: TextSize,
}

// ============================================================================
// CAST BALLOT
// ============================================================================

/// The canonical hand-off record for printing, tallying and card marking:
/// the validated votes plus the election and ballot style identity.
/// Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastBallot {
    pub ballot_id: Uuid,
    pub election_hash: String,
    pub ballot_style_id: String,
    pub precinct_id: String,
    pub votes: VotesDict,
    pub cast_at: DateTime<Utc>,
}

// ============================================================================
// SESSION
// ============================================================================

/// One voter's session on the device.
///
/// Strictly sequential: callers serialize access, the session never shares
/// its mutable state. Every failing operation leaves the session untouched.
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    activation: Option<ActivationData>,
    votes: VotesDict,
    settings: UserSettings,
}

impl Session {
    pub fn new() -> Session {
        Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            activation: None,
            votes: VotesDict::new(),
            settings: UserSettings::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn activation(&self) -> Option<&ActivationData> {
        self.activation.as_ref()
    }

    pub fn is_activated(&self) -> bool {
        self.activation.is_some()
    }

    pub fn votes(&self) -> &VotesDict {
        &self.votes
    }

    pub fn settings(&self) -> UserSettings {
        self.settings
    }

    pub fn set_text_size(&mut self, size: TextSize) {
        self.settings.text_size = size;
    }

    /// Bind this session to a (ballot style, precinct) pair.
    ///
    /// Re-activation replaces the previous binding entirely and discards
    /// any in-progress votes: votes are meaningless outside the ballot
    /// style they were validated against.
    pub fn activate(
        &mut self,
        catalog: &ElectionCatalog,
        ballot_style_id: &str,
        precinct_id: &str,
    ) -> Result<&ActivationData, ActivationError> {
        let activation = activate(catalog, ballot_style_id, precinct_id)?;

        if self.activation.is_some() {
            log::info!(
                "re-activation: replacing ballot {} / precinct {}, discarding {} vote(s)",
                ballot_style_id,
                precinct_id,
                self.votes.len()
            );
        }

        self.votes.clear();
        Ok(&*self.activation.insert(activation))
    }

    /// Activate from a scanned voter card. A card whose used marker is set
    /// has already produced a ballot and cannot activate again.
    pub fn activate_from_card(
        &mut self,
        catalog: &ElectionCatalog,
        card: &CardData,
    ) -> Result<&ActivationData, ActivationError> {
        let voter = card.as_voter().ok_or(ActivationError::NotAVoterCard)?;
        if voter.is_used() {
            return Err(ActivationError::VoterCardUsed);
        }
        self.activate(catalog, &voter.bs, &voter.pr)
    }

    /// The ordered contest list for the active ballot style.
    pub fn contests<'a>(
        &self,
        catalog: &'a ElectionCatalog,
    ) -> Result<Vec<&'a Contest>, ActivationError> {
        let activation = self.activation.as_ref().ok_or(ActivationError::NotActivated)?;
        catalog
            .contests_for_ballot_style(activation.ballot_style_id())
            .map_err(|_| {
                // Only reachable when the caller pairs this session with a
                // different catalog than the one it was activated against
                ActivationError::UnknownBallotStyle(activation.ballot_style_id().to_string())
            })
    }

    /// Replace, insert or remove (None) the vote for one contest.
    ///
    /// The contest must be on the active ballot style's contest list and a
    /// present vote must pass validation. Atomic: a rejected update leaves
    /// the existing entry exactly as it was.
    pub fn update_vote(
        &mut self,
        catalog: &ElectionCatalog,
        contest_id: &str,
        vote: Option<Vote>,
    ) -> Result<(), VoteError> {
        let contest = self
            .active_contest(catalog, contest_id)
            .ok_or_else(|| VoteError::NotFound(contest_id.to_string()))?;

        match vote {
            Some(vote) => {
                validate_vote(contest, &vote)?;
                self.votes.set(contest_id, vote);
            }
            None => self.votes.remove(contest_id),
        }
        Ok(())
    }

    /// Produce the cast ballot record and end the voter's session state.
    pub fn cast(&mut self, catalog: &ElectionCatalog) -> Result<CastBallot, ActivationError> {
        let activation = self.activation.as_ref().ok_or(ActivationError::NotActivated)?;

        let ballot = CastBallot {
            ballot_id: Uuid::new_v4(),
            election_hash: catalog.election_hash().to_string(),
            ballot_style_id: activation.ballot_style_id().to_string(),
            precinct_id: activation.precinct_id().to_string(),
            votes: self.votes.clone(),
            cast_at: Utc::now(),
        };

        log::info!(
            "ballot {} cast: style {}, {} vote(s)",
            ballot.ballot_id,
            ballot.ballot_style_id,
            ballot.votes.len()
        );

        self.reset();
        Ok(ballot)
    }

    /// Discard the activation and all votes together, and return settings
    /// to defaults. The only lifecycle-ending action.
    pub fn reset(&mut self) {
        log::info!(
            "session {} reset (activated: {}, {} vote(s) discarded)",
            self.id,
            self.activation.is_some(),
            self.votes.len()
        );
        self.activation = None;
        self.votes.clear();
        self.settings = UserSettings::default();
    }

    fn active_contest<'a>(
        &self,
        catalog: &'a ElectionCatalog,
        contest_id: &str,
    ) -> Option<&'a Contest> {
        let activation = self.activation.as_ref()?;
        let contests = catalog
            .contests_for_ballot_style(activation.ballot_style_id())
            .ok()?;
        contests.into_iter().find(|c| c.id() == contest_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
