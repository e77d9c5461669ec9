// Election Definition - Authoritative data model
// The shape of one election: parties, precincts, districts, contests,
// ballot styles, plus global device configuration.
//
// This mirrors the JSON election definition produced by the county's
// election management system. Field names on the wire are camelCase;
// contests are discriminated by their "type" field.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// IDENTITY RECORDS
// ============================================================================

/// A political party. `id` is the stable key referenced by candidates,
/// contests and ballot styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub abbrev: String,
}

/// A polling precinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precinct {
    pub id: String,
    pub name: String,
}

/// An electoral district. Contests belong to exactly one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
}

/// The county running the election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub id: String,
    pub name: String,
}

// ============================================================================
// CANDIDATES & CONTESTS
// ============================================================================

/// A candidate on a contest.
///
/// `is_write_in` is false for every candidate in the authored definition.
/// It is only ever true on synthetic entries created at vote time for
/// voter-supplied names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,

    /// Party affiliation. Must resolve to a declared party when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_write_in: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Candidate {
    /// Build a synthetic write-in entry for a voter-supplied name.
    pub fn write_in(id: impl Into<String>, name: impl Into<String>) -> Self {
        Candidate {
            id: id.into(),
            name: name.into(),
            party_id: None,
            is_write_in: true,
        }
    }
}

/// A contest where voters pick up to `seats` candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateContest {
    pub id: String,
    pub district_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    pub section: String,
    pub title: String,

    /// Number of seats to fill. At least 1.
    pub seats: u32,

    /// Declared candidates, in ballot order. Ids unique within the contest.
    pub candidates: Vec<Candidate>,

    pub allow_write_ins: bool,
}

/// A ballot measure answered with "yes" or "no".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YesNoContest {
    pub id: String,
    pub district_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    pub section: String,
    pub title: String,
    pub description: String,
    pub short_title: String,
}

/// Contest - one of the two authored contest kinds.
///
/// The "type" discriminant on the wire selects the variant; every consumer
/// matches exhaustively, there are no field-presence checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Contest {
    #[serde(rename = "candidate")]
    Candidate(CandidateContest),
    #[serde(rename = "yesno")]
    YesNo(YesNoContest),
}

impl Contest {
    pub fn id(&self) -> &str {
        match self {
            Contest::Candidate(c) => &c.id,
            Contest::YesNo(c) => &c.id,
        }
    }

    pub fn district_id(&self) -> &str {
        match self {
            Contest::Candidate(c) => &c.district_id,
            Contest::YesNo(c) => &c.district_id,
        }
    }

    pub fn party_id(&self) -> Option<&str> {
        match self {
            Contest::Candidate(c) => c.party_id.as_deref(),
            Contest::YesNo(c) => c.party_id.as_deref(),
        }
    }

    pub fn section(&self) -> &str {
        match self {
            Contest::Candidate(c) => &c.section,
            Contest::YesNo(c) => &c.section,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Contest::Candidate(c) => &c.title,
            Contest::YesNo(c) => &c.title,
        }
    }

    /// Discriminant as it appears on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            Contest::Candidate(_) => "candidate",
            Contest::YesNo(_) => "yesno",
        }
    }
}

// ============================================================================
// BALLOT STYLES
// ============================================================================

/// A named subset of the election's contests, applicable to a group of
/// precincts. The effective contest list is every contest whose district id
/// is in `districts`, narrowed by `party_id` for partisan primaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotStyle {
    pub id: String,
    pub precincts: Vec<String>,
    pub districts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
}

impl BallotStyle {
    /// Whether this style covers the given precinct.
    pub fn covers_precinct(&self, precinct_id: &str) -> bool {
        self.precincts.iter().any(|p| p == precinct_id)
    }

    /// Whether contests of the given district appear on this style.
    pub fn covers_district(&self, district_id: &str) -> bool {
        self.districts.iter().any(|d| d == district_id)
    }
}

// ============================================================================
// DEVICE CONFIGURATION
// ============================================================================

/// Per-election overrides for device behavior. Absent flags fall back to
/// the defaults in `BmdSettings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BmdConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_activation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_help_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_settings_page: Option<bool>,
}

/// Fully resolved device configuration (overrides applied over defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmdSettings {
    pub require_activation: bool,
    pub show_help_page: bool,
    pub show_settings_page: bool,
}

impl Default for BmdSettings {
    fn default() -> Self {
        BmdSettings {
            require_activation: true,
            show_help_page: true,
            show_settings_page: true,
        }
    }
}

// ============================================================================
// BALLOT TRACKER
// ============================================================================

/// Placeholder the external receipt display substitutes with the tracker id.
pub const TRACKER_ID_PLACEHOLDER: &str = "<tracker_id>";

/// Supported tracker backends. Currently only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotTrackerType {
    #[serde(rename = "electionguard")]
    ElectionGuard,
}

impl BallotTrackerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BallotTrackerType::ElectionGuard => "electionguard",
        }
    }
}

/// Ballot tracker configuration, carried through to the receipt display.
/// This core only checks its shape; substitution happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotTrackerConfig {
    pub tracker_type: BallotTrackerType,
    pub tracker_site_display: String,
    /// URL template containing exactly one `<tracker_id>` placeholder,
    /// e.g. "https://example.org/track?tracker=<tracker_id>".
    pub tracker_url_template: String,
}

impl BallotTrackerConfig {
    /// Number of placeholder occurrences in the URL template. Exactly one
    /// is required for the config to be valid.
    pub fn placeholder_count(&self) -> usize {
        self.tracker_url_template
            .matches(TRACKER_ID_PLACEHOLDER)
            .count()
    }
}

// ============================================================================
// ELECTION
// ============================================================================

/// One complete election definition. The aggregate root: every party,
/// district and precinct reference in the tree must resolve within this
/// structure.
///
/// Loaded once per voting session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub ballot_styles: Vec<BallotStyle>,
    pub county: County,
    pub demo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_tracker_config: Option<BallotTrackerConfig>,
    pub parties: Vec<Party>,
    pub precincts: Vec<Precinct>,
    pub districts: Vec<District>,
    pub contests: Vec<Contest>,

    /// Election day, "YYYY-MM-DD".
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal: Option<String>,
    #[serde(rename = "sealURL", default, skip_serializing_if = "Option::is_none")]
    pub seal_url: Option<String>,

    pub state: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmd_config: Option<BmdConfig>,
}

impl Election {
    /// Parse an election definition from its JSON form.
    pub fn from_json(json: &str) -> Result<Election> {
        serde_json::from_str(json).context("failed to parse election definition")
    }

    /// Load an election definition from a JSON file.
    pub fn from_file(path: &Path) -> Result<Election> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Election::from_json(&json)
    }

    /// Election day as a date, when well-formed.
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .with_context(|| format!("bad election date: {:?}", self.date))
    }

    /// Device configuration with election overrides applied over defaults.
    pub fn bmd_settings(&self) -> BmdSettings {
        let defaults = BmdSettings::default();
        match &self.bmd_config {
            None => defaults,
            Some(cfg) => BmdSettings {
                require_activation: cfg
                    .require_activation
                    .unwrap_or(defaults.require_activation),
                show_help_page: cfg.show_help_page.unwrap_or(defaults.show_help_page),
                show_settings_page: cfg
                    .show_settings_page
                    .unwrap_or(defaults.show_settings_page),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_election_json() -> String {
        serde_json::json!({
            "title": "General Election",
            "state": "State of Hamilton",
            "county": { "id": "c1", "name": "Franklin County" },
            "date": "2020-11-03",
            "demo": false,
            "parties": [
                { "id": "fed", "name": "Federalist", "abbrev": "FED" }
            ],
            "districts": [
                { "id": "d1", "name": "District 1" }
            ],
            "precincts": [
                { "id": "p1", "name": "Downtown" }
            ],
            "ballotStyles": [
                { "id": "bs1", "precincts": ["p1"], "districts": ["d1"] }
            ],
            "contests": [
                {
                    "type": "candidate",
                    "id": "mayor",
                    "districtId": "d1",
                    "section": "City",
                    "title": "Mayor",
                    "seats": 1,
                    "allowWriteIns": true,
                    "candidates": [
                        { "id": "alice", "name": "Alice Adams", "partyId": "fed" }
                    ]
                },
                {
                    "type": "yesno",
                    "id": "q1",
                    "districtId": "d1",
                    "section": "City",
                    "title": "Measure 1",
                    "shortTitle": "M1",
                    "description": "Shall the city issue bonds?"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_minimal_election() {
        let election = Election::from_json(&minimal_election_json()).unwrap();

        assert_eq!(election.title, "General Election");
        assert_eq!(election.county.id, "c1");
        assert_eq!(election.parties.len(), 1);
        assert_eq!(election.ballot_styles.len(), 1);
        assert_eq!(election.contests.len(), 2);
    }

    #[test]
    fn test_contest_discriminant() {
        let election = Election::from_json(&minimal_election_json()).unwrap();

        match &election.contests[0] {
            Contest::Candidate(c) => {
                assert_eq!(c.id, "mayor");
                assert_eq!(c.seats, 1);
                assert!(c.allow_write_ins);
                assert_eq!(c.candidates.len(), 1);
            }
            other => panic!("expected candidate contest, got {}", other.type_name()),
        }

        match &election.contests[1] {
            Contest::YesNo(c) => {
                assert_eq!(c.id, "q1");
                assert_eq!(c.short_title, "M1");
            }
            other => panic!("expected yesno contest, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_contest_header_accessors() {
        let election = Election::from_json(&minimal_election_json()).unwrap();

        let mayor = &election.contests[0];
        assert_eq!(mayor.id(), "mayor");
        assert_eq!(mayor.district_id(), "d1");
        assert_eq!(mayor.party_id(), None);
        assert_eq!(mayor.section(), "City");
        assert_eq!(mayor.title(), "Mayor");
        assert_eq!(mayor.type_name(), "candidate");
    }

    #[test]
    fn test_unknown_contest_type_rejected() {
        let json = serde_json::json!({
            "type": "ranked",
            "id": "x",
            "districtId": "d1",
            "section": "s",
            "title": "t"
        })
        .to_string();

        assert!(serde_json::from_str::<Contest>(&json).is_err());
    }

    #[test]
    fn test_candidate_write_in_default() {
        let json = r#"{ "id": "alice", "name": "Alice Adams" }"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();

        assert!(!candidate.is_write_in);
        assert!(candidate.party_id.is_none());
    }

    #[test]
    fn test_write_in_constructor() {
        let write_in = Candidate::write_in("write-in-0", "Zebra Zulu");

        assert!(write_in.is_write_in);
        assert!(write_in.party_id.is_none());
        assert_eq!(write_in.id, "write-in-0");
    }

    #[test]
    fn test_ballot_style_coverage() {
        let style = BallotStyle {
            id: "bs1".to_string(),
            precincts: vec!["p1".to_string(), "p2".to_string()],
            districts: vec!["d1".to_string()],
            party_id: None,
        };

        assert!(style.covers_precinct("p1"));
        assert!(style.covers_precinct("p2"));
        assert!(!style.covers_precinct("p3"));
        assert!(style.covers_district("d1"));
        assert!(!style.covers_district("d2"));
    }

    #[test]
    fn test_election_date() {
        let election = Election::from_json(&minimal_election_json()).unwrap();
        let date = election.parsed_date().unwrap();

        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 11, 3).unwrap());
    }

    #[test]
    fn test_bad_election_date() {
        let mut election = Election::from_json(&minimal_election_json()).unwrap();
        election.date = "November 3".to_string();

        assert!(election.parsed_date().is_err());
    }

    #[test]
    fn test_bmd_settings_defaults() {
        let election = Election::from_json(&minimal_election_json()).unwrap();
        let settings = election.bmd_settings();

        assert!(settings.require_activation);
        assert!(settings.show_help_page);
        assert!(settings.show_settings_page);
    }

    #[test]
    fn test_bmd_settings_overrides() {
        let mut election = Election::from_json(&minimal_election_json()).unwrap();
        election.bmd_config = Some(BmdConfig {
            require_activation: Some(false),
            show_help_page: None,
            show_settings_page: Some(false),
        });

        let settings = election.bmd_settings();
        assert!(!settings.require_activation);
        assert!(settings.show_help_page); // unset override keeps the default
        assert!(!settings.show_settings_page);
    }

    #[test]
    fn test_tracker_placeholder_count() {
        let config = BallotTrackerConfig {
            tracker_type: BallotTrackerType::ElectionGuard,
            tracker_site_display: "example.org".to_string(),
            tracker_url_template: "https://example.org/track?tracker=<tracker_id>".to_string(),
        };
        assert_eq!(config.placeholder_count(), 1);

        let missing = BallotTrackerConfig {
            tracker_url_template: "https://example.org/track".to_string(),
            ..config.clone()
        };
        assert_eq!(missing.placeholder_count(), 0);

        let doubled = BallotTrackerConfig {
            tracker_url_template: "<tracker_id>/<tracker_id>".to_string(),
            ..config
        };
        assert_eq!(doubled.placeholder_count(), 2);
    }

    #[test]
    fn test_tracker_type_wire_name() {
        let json = serde_json::to_string(&BallotTrackerType::ElectionGuard).unwrap();
        assert_eq!(json, r#""electionguard""#);
        assert_eq!(BallotTrackerType::ElectionGuard.as_str(), "electionguard");
    }

    #[test]
    fn test_election_round_trip() {
        let election = Election::from_json(&minimal_election_json()).unwrap();
        let json = serde_json::to_string(&election).unwrap();
        let reparsed = Election::from_json(&json).unwrap();

        assert_eq!(election, reparsed);
    }

    #[test]
    fn test_seal_url_wire_name() {
        let mut election = Election::from_json(&minimal_election_json()).unwrap();
        election.seal_url = Some("https://example.org/seal.png".to_string());

        let json = serde_json::to_string(&election).unwrap();
        assert!(json.contains("\"sealURL\""));
    }
}
