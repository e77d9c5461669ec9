// Election Catalog - Validated, indexed election definition
// All-or-nothing referential integrity check at load, then O(1) lookups.
//
// The catalog is built once from a trusted election definition and treated
// as read-only for the lifetime of the voting session. Every dangling
// reference is a load-time error, never a runtime surprise.

use crate::election::{
    BallotStyle, Contest, County, District, Election, Party, Precinct,
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// A single referential-integrity violation in an election definition.
/// Catalog construction reports every violation found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate {collection} id: {id}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("{referrer} references unknown party {party_id}")]
    DanglingPartyRef { referrer: String, party_id: String },

    #[error("{referrer} references unknown district {district_id}")]
    DanglingDistrictRef { referrer: String, district_id: String },

    #[error("ballot style {ballot_style_id} references unknown precinct {precinct_id}")]
    DanglingPrecinctRef {
        ballot_style_id: String,
        precinct_id: String,
    },

    #[error("contest {contest_id} has {seats} seats, at least 1 required")]
    InvalidSeats { contest_id: String, seats: u32 },

    #[error("contest {contest_id} declares candidate {candidate_id} more than once")]
    DuplicateCandidate {
        contest_id: String,
        candidate_id: String,
    },

    #[error("contest {contest_id} declares candidate {candidate_id} as a write-in")]
    AuthoredWriteIn {
        contest_id: String,
        candidate_id: String,
    },

    #[error("tracker URL template needs exactly one <tracker_id> placeholder, found {found}: {template}")]
    BadTrackerTemplate { template: String, found: usize },

    #[error("election definition is not serializable: {0}")]
    Unserializable(String),
}

/// Lookup against an already-valid catalog failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("ballot style not found: {0}")]
    BallotStyle(String),

    #[error("contest not found: {0}")]
    Contest(String),
}

// ============================================================================
// ELECTION CATALOG
// ============================================================================

/// Immutable, id-indexed view over a validated election definition.
///
/// Safe to share freely across readers: nothing mutates after construction.
#[derive(Debug)]
pub struct ElectionCatalog {
    election: Election,
    election_hash: String,

    // Indexes into the election's vectors, keyed by id
    parties: HashMap<String, usize>,
    precincts: HashMap<String, usize>,
    districts: HashMap<String, usize>,
    contests: HashMap<String, usize>,
    ballot_styles: HashMap<String, usize>,
}

impl ElectionCatalog {
    /// Validate an election definition and build the catalog.
    ///
    /// Fails with the complete list of violations when any referential
    /// integrity rule is broken. There is no lenient mode: either the whole
    /// definition is consistent or nothing is returned.
    pub fn new(election: Election) -> Result<ElectionCatalog, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let parties = index_by_id(
            election.parties.iter().map(|p| p.id.as_str()),
            "party",
            &mut errors,
        );
        let precincts = index_by_id(
            election.precincts.iter().map(|p| p.id.as_str()),
            "precinct",
            &mut errors,
        );
        let districts = index_by_id(
            election.districts.iter().map(|d| d.id.as_str()),
            "district",
            &mut errors,
        );
        let contests = index_by_id(
            election.contests.iter().map(|c| c.id()),
            "contest",
            &mut errors,
        );
        let ballot_styles = index_by_id(
            election.ballot_styles.iter().map(|b| b.id.as_str()),
            "ballot style",
            &mut errors,
        );

        check_contests(&election, &parties, &districts, &mut errors);
        check_ballot_styles(&election, &parties, &precincts, &districts, &mut errors);
        check_tracker_config(&election, &mut errors);

        let election_hash = match serde_json::to_string(&election) {
            Ok(canonical) => {
                let mut hasher = Sha256::new();
                hasher.update(canonical.as_bytes());
                format!("{:x}", hasher.finalize())
            }
            Err(e) => {
                errors.push(ValidationError::Unserializable(e.to_string()));
                String::new()
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        log::info!(
            "election catalog built: {:?} ({} contests, {} ballot styles, hash {})",
            election.title,
            election.contests.len(),
            election.ballot_styles.len(),
            &election_hash[..12]
        );

        Ok(ElectionCatalog {
            election,
            election_hash,
            parties,
            precincts,
            districts,
            contests,
            ballot_styles,
        })
    }

    /// The underlying election definition.
    pub fn election(&self) -> &Election {
        &self.election
    }

    /// SHA-256 of the canonical election serialization. Doubles as the
    /// election identifier on cast ballot records and admin access cards.
    pub fn election_hash(&self) -> &str {
        &self.election_hash
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn party(&self, id: &str) -> Option<&Party> {
        self.parties.get(id).map(|&i| &self.election.parties[i])
    }

    pub fn precinct(&self, id: &str) -> Option<&Precinct> {
        self.precincts.get(id).map(|&i| &self.election.precincts[i])
    }

    pub fn district(&self, id: &str) -> Option<&District> {
        self.districts.get(id).map(|&i| &self.election.districts[i])
    }

    pub fn contest(&self, id: &str) -> Option<&Contest> {
        self.contests.get(id).map(|&i| &self.election.contests[i])
    }

    pub fn ballot_style(&self, id: &str) -> Option<&BallotStyle> {
        self.ballot_styles
            .get(id)
            .map(|&i| &self.election.ballot_styles[i])
    }

    pub fn county(&self) -> &County {
        &self.election.county
    }

    // ------------------------------------------------------------------
    // Contest enumeration
    // ------------------------------------------------------------------

    /// The ordered contest list for one ballot style. This is the canonical
    /// ballot sequence: the election's authored order, filtered to the
    /// style's districts and (for partisan primaries) its party.
    ///
    /// Yes/no and non-partisan contests are never excluded on party grounds.
    pub fn contests_for_ballot_style(
        &self,
        ballot_style_id: &str,
    ) -> Result<Vec<&Contest>, NotFound> {
        let style = self
            .ballot_style(ballot_style_id)
            .ok_or_else(|| NotFound::BallotStyle(ballot_style_id.to_string()))?;

        Ok(self
            .election
            .contests
            .iter()
            .filter(|contest| style.covers_district(contest.district_id()))
            .filter(|contest| match (contest, style.party_id.as_deref()) {
                (Contest::Candidate(c), Some(style_party)) => match c.party_id.as_deref() {
                    Some(contest_party) => contest_party == style_party,
                    None => true,
                },
                _ => true,
            })
            .collect())
    }
}

// ============================================================================
// VALIDATION PASSES
// ============================================================================

fn index_by_id<'a>(
    ids: impl Iterator<Item = &'a str>,
    collection: &'static str,
    errors: &mut Vec<ValidationError>,
) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.to_string(), i).is_some() {
            errors.push(ValidationError::DuplicateId {
                collection,
                id: id.to_string(),
            });
        }
    }
    index
}

fn check_contests(
    election: &Election,
    parties: &HashMap<String, usize>,
    districts: &HashMap<String, usize>,
    errors: &mut Vec<ValidationError>,
) {
    for contest in &election.contests {
        let referrer = format!("contest {}", contest.id());

        if !districts.contains_key(contest.district_id()) {
            errors.push(ValidationError::DanglingDistrictRef {
                referrer: referrer.clone(),
                district_id: contest.district_id().to_string(),
            });
        }

        if let Some(party_id) = contest.party_id() {
            if !parties.contains_key(party_id) {
                errors.push(ValidationError::DanglingPartyRef {
                    referrer: referrer.clone(),
                    party_id: party_id.to_string(),
                });
            }
        }

        let Contest::Candidate(contest) = contest else {
            continue;
        };

        if contest.seats < 1 {
            errors.push(ValidationError::InvalidSeats {
                contest_id: contest.id.clone(),
                seats: contest.seats,
            });
        }

        let mut seen = HashMap::new();
        for candidate in &contest.candidates {
            if seen.insert(candidate.id.as_str(), ()).is_some() {
                errors.push(ValidationError::DuplicateCandidate {
                    contest_id: contest.id.clone(),
                    candidate_id: candidate.id.clone(),
                });
            }

            if candidate.is_write_in {
                errors.push(ValidationError::AuthoredWriteIn {
                    contest_id: contest.id.clone(),
                    candidate_id: candidate.id.clone(),
                });
            }

            if let Some(party_id) = candidate.party_id.as_deref() {
                if !parties.contains_key(party_id) {
                    errors.push(ValidationError::DanglingPartyRef {
                        referrer: format!(
                            "candidate {} on contest {}",
                            candidate.id, contest.id
                        ),
                        party_id: party_id.to_string(),
                    });
                }
            }
        }
    }
}

fn check_ballot_styles(
    election: &Election,
    parties: &HashMap<String, usize>,
    precincts: &HashMap<String, usize>,
    districts: &HashMap<String, usize>,
    errors: &mut Vec<ValidationError>,
) {
    for style in &election.ballot_styles {
        for precinct_id in &style.precincts {
            if !precincts.contains_key(precinct_id) {
                errors.push(ValidationError::DanglingPrecinctRef {
                    ballot_style_id: style.id.clone(),
                    precinct_id: precinct_id.clone(),
                });
            }
        }

        for district_id in &style.districts {
            if !districts.contains_key(district_id) {
                errors.push(ValidationError::DanglingDistrictRef {
                    referrer: format!("ballot style {}", style.id),
                    district_id: district_id.clone(),
                });
            }
        }

        if let Some(party_id) = style.party_id.as_deref() {
            if !parties.contains_key(party_id) {
                errors.push(ValidationError::DanglingPartyRef {
                    referrer: format!("ballot style {}", style.id),
                    party_id: party_id.to_string(),
                });
            }
        }
    }
}

fn check_tracker_config(election: &Election, errors: &mut Vec<ValidationError>) {
    if let Some(config) = &election.ballot_tracker_config {
        let found = config.placeholder_count();
        if found != 1 {
            errors.push(ValidationError::BadTrackerTemplate {
                template: config.tracker_url_template.clone(),
                found,
            });
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
