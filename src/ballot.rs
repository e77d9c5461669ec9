// Vote Model - Cast votes and the rules that accept or reject them
// A vote is either an ordered candidate selection or a yes/no literal.
// Validation never mutates anything: it answers acceptable or not, with
// the reason, and the caller decides what to do.

use crate::election::{Candidate, CandidateContest, Contest};
use serde::{Deserialize, Serialize};
use std::collections::{hash_map, HashMap, HashSet};
use thiserror::Error;

/// The two legal yes/no literals.
pub const YES: &str = "yes";
pub const NO: &str = "no";

// ============================================================================
// VOTE
// ============================================================================

/// One cast vote for one contest.
///
/// The yes/no arm carries the raw literal from the caller. The validator,
/// not the deserializer, decides whether the literal is legal, so a bad
/// value is reported as a rejection rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Vote {
    /// Ordered candidate selection for a candidate contest.
    Candidates(Vec<Candidate>),
    /// Literal answer for a yes/no contest.
    YesNo(String),
}

impl Vote {
    pub fn yes() -> Vote {
        Vote::YesNo(YES.to_string())
    }

    pub fn no() -> Vote {
        Vote::YesNo(NO.to_string())
    }

    pub fn candidates(candidates: impl IntoIterator<Item = Candidate>) -> Vote {
        Vote::Candidates(candidates.into_iter().collect())
    }

    /// Number of selections this vote represents.
    pub fn selection_count(&self) -> usize {
        match self {
            Vote::Candidates(c) => c.len(),
            Vote::YesNo(_) => 1,
        }
    }
}

// ============================================================================
// REJECTION REASONS
// ============================================================================

/// Why a vote was not accepted for a contest. Surfaced to the voter-facing
/// layer; the vote store is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("vote shape does not match the contest type")]
    TypeMismatch,

    #[error("yes/no contests only accept \"yes\" or \"no\", got {0:?}")]
    InvalidValue(String),

    #[error("this contest does not allow write-ins")]
    WriteInNotAllowed,

    #[error("candidate {0} is not on this contest")]
    UnknownCandidate(String),

    #[error("{got} selections for {seats} available seats")]
    TooManySelections { seats: u32, got: usize },

    #[error("candidate {0} selected more than once")]
    DuplicateSelection(String),
}

/// Failure of a vote update against the active ballot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("contest {0} is not on the active ballot")]
    NotFound(String),

    #[error(transparent)]
    Rejected(#[from] VoteRejection),
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Check one vote against one contest.
///
/// Pure and deterministic. An absent vote (undervote) is always acceptable
/// and is expressed by not calling this at all, or by removing the entry.
pub fn validate_vote(contest: &Contest, vote: &Vote) -> Result<(), VoteRejection> {
    match (contest, vote) {
        (Contest::YesNo(_), Vote::YesNo(literal)) => {
            if literal == YES || literal == NO {
                Ok(())
            } else {
                Err(VoteRejection::InvalidValue(literal.clone()))
            }
        }
        (Contest::Candidate(contest), Vote::Candidates(selection)) => {
            validate_candidate_selection(contest, selection)
        }
        _ => Err(VoteRejection::TypeMismatch),
    }
}

fn validate_candidate_selection(
    contest: &CandidateContest,
    selection: &[Candidate],
) -> Result<(), VoteRejection> {
    for candidate in selection {
        let declared = contest.candidates.iter().any(|c| c.id == candidate.id);
        if declared {
            continue;
        }
        if candidate.is_write_in {
            if !contest.allow_write_ins {
                return Err(VoteRejection::WriteInNotAllowed);
            }
        } else {
            return Err(VoteRejection::UnknownCandidate(candidate.id.clone()));
        }
    }

    if selection.len() > contest.seats as usize {
        return Err(VoteRejection::TooManySelections {
            seats: contest.seats,
            got: selection.len(),
        });
    }

    let mut seen = HashSet::new();
    for candidate in selection {
        if !seen.insert(candidate.id.as_str()) {
            return Err(VoteRejection::DuplicateSelection(candidate.id.clone()));
        }
    }

    Ok(())
}

// ============================================================================
// VOTES DICT
// ============================================================================

/// The votes entered so far in one session, keyed by contest id.
///
/// At most one entry per contest. Mutation goes through the session's
/// `update_vote`, which validates first; once a ballot is cast the snapshot
/// handed downstream is read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotesDict {
    #[serde(flatten)]
    entries: HashMap<String, Vote>,
}

impl VotesDict {
    pub fn new() -> VotesDict {
        VotesDict::default()
    }

    pub fn get(&self, contest_id: &str) -> Option<&Vote> {
        self.entries.get(contest_id)
    }

    pub fn contains(&self, contest_id: &str) -> bool {
        self.entries.contains_key(contest_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vote> {
        self.entries.iter()
    }

    /// Replace or insert an entry. Callers validate first; see
    /// `Session::update_vote`.
    pub(crate) fn set(&mut self, contest_id: &str, vote: Vote) {
        self.entries.insert(contest_id.to_string(), vote);
    }

    /// Remove an entry (undervote).
    pub(crate) fn remove(&mut self, contest_id: &str) {
        self.entries.remove(contest_id);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::YesNoContest;

    fn declared(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: format!("Candidate {}", id),
            party_id: None,
            is_write_in: false,
        }
    }

    fn council_contest(seats: u32, allow_write_ins: bool) -> Contest {
        Contest::Candidate(CandidateContest {
            id: "council".to_string(),
            district_id: "d1".to_string(),
            party_id: None,
            section: "City".to_string(),
            title: "City Council".to_string(),
            seats,
            candidates: vec![declared("alice"), declared("bob"), declared("carol")],
            allow_write_ins,
        })
    }

    fn measure_contest() -> Contest {
        Contest::YesNo(YesNoContest {
            id: "q1".to_string(),
            district_id: "d1".to_string(),
            party_id: None,
            section: "Measures".to_string(),
            title: "Measure 1".to_string(),
            description: "Shall it pass?".to_string(),
            short_title: "M1".to_string(),
        })
    }

    #[test]
    fn test_yesno_accepts_yes_and_no() {
        let contest = measure_contest();

        assert!(validate_vote(&contest, &Vote::yes()).is_ok());
        assert!(validate_vote(&contest, &Vote::no()).is_ok());
    }

    #[test]
    fn test_yesno_rejects_other_literals() {
        let contest = measure_contest();

        let err = validate_vote(&contest, &Vote::YesNo("maybe".to_string())).unwrap_err();
        assert_eq!(err, VoteRejection::InvalidValue("maybe".to_string()));

        // Case matters: the wire literals are lowercase
        let err = validate_vote(&contest, &Vote::YesNo("Yes".to_string())).unwrap_err();
        assert_eq!(err, VoteRejection::InvalidValue("Yes".to_string()));
    }

    #[test]
    fn test_type_mismatch_both_ways() {
        let measure = measure_contest();
        let council = council_contest(1, false);

        let err = validate_vote(&measure, &Vote::candidates([declared("alice")])).unwrap_err();
        assert_eq!(err, VoteRejection::TypeMismatch);

        let err = validate_vote(&council, &Vote::yes()).unwrap_err();
        assert_eq!(err, VoteRejection::TypeMismatch);
    }

    #[test]
    fn test_declared_candidates_accepted() {
        let contest = council_contest(2, false);

        let vote = Vote::candidates([declared("alice"), declared("bob")]);
        assert!(validate_vote(&contest, &vote).is_ok());
    }

    #[test]
    fn test_unknown_candidate_rejected() {
        let contest = council_contest(2, true);

        // Not declared and not flagged as a write-in
        let vote = Vote::candidates([declared("mallory")]);
        let err = validate_vote(&contest, &vote).unwrap_err();
        assert_eq!(err, VoteRejection::UnknownCandidate("mallory".to_string()));
    }

    #[test]
    fn test_write_in_policy() {
        let write_in = Candidate::write_in("write-in-0", "Zebra Zulu");

        // Accepted when the contest allows write-ins
        let open = council_contest(1, true);
        assert!(validate_vote(&open, &Vote::candidates([write_in.clone()])).is_ok());

        // Rejected when it does not, regardless of seats remaining
        let closed = council_contest(3, false);
        let err = validate_vote(&closed, &Vote::candidates([write_in])).unwrap_err();
        assert_eq!(err, VoteRejection::WriteInNotAllowed);
    }

    #[test]
    fn test_seat_count_boundary() {
        let contest = council_contest(2, false);

        assert!(validate_vote(&contest, &Vote::candidates([])).is_ok());
        assert!(validate_vote(&contest, &Vote::candidates([declared("alice")])).is_ok());
        assert!(
            validate_vote(&contest, &Vote::candidates([declared("alice"), declared("bob")]))
                .is_ok()
        );

        let over = Vote::candidates([declared("alice"), declared("bob"), declared("carol")]);
        let err = validate_vote(&contest, &over).unwrap_err();
        assert_eq!(err, VoteRejection::TooManySelections { seats: 2, got: 3 });
    }

    #[test]
    fn test_duplicate_selection_rejected() {
        let contest = council_contest(2, false);

        let vote = Vote::candidates([declared("alice"), declared("alice")]);
        let err = validate_vote(&contest, &vote).unwrap_err();
        assert_eq!(err, VoteRejection::DuplicateSelection("alice".to_string()));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let contest = council_contest(1, false);
        let vote = Vote::candidates([declared("alice")]);

        let first = validate_vote(&contest, &vote);
        let second = validate_vote(&contest, &vote);
        assert_eq!(first, second);

        let bad = Vote::candidates([declared("alice"), declared("bob")]);
        assert_eq!(
            validate_vote(&contest, &bad),
            validate_vote(&contest, &bad)
        );
    }

    #[test]
    fn test_votes_dict_basics() {
        let mut votes = VotesDict::new();
        assert!(votes.is_empty());

        votes.set("q1", Vote::yes());
        assert_eq!(votes.len(), 1);
        assert!(votes.contains("q1"));
        assert_eq!(votes.get("q1"), Some(&Vote::yes()));

        votes.set("q1", Vote::no());
        assert_eq!(votes.len(), 1);
        assert_eq!(votes.get("q1"), Some(&Vote::no()));

        votes.remove("q1");
        assert!(votes.is_empty());
    }

    #[test]
    fn test_vote_json_shapes() {
        // A yes/no vote serializes as a bare literal
        let json = serde_json::to_string(&Vote::yes()).unwrap();
        assert_eq!(json, r#""yes""#);

        // A candidate vote serializes as an array of candidates
        let vote = Vote::candidates([declared("alice")]);
        let json = serde_json::to_string(&vote).unwrap();
        let back: Vote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vote);
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_selection_count() {
        assert_eq!(Vote::yes().selection_count(), 1);
        assert_eq!(Vote::candidates([]).selection_count(), 0);
        assert_eq!(
            Vote::candidates([declared("alice"), declared("bob")]).selection_count(),
            2
        );
    }
}
