// Ballot Station - Core Library
// Ballot definition and vote-validation model for an electronic
// ballot-marking device. Exposes all modules for use in the device
// firmware, tooling and tests.

pub mod ballot;
pub mod card;
pub mod catalog;
pub mod election;
pub mod session;

// Re-export commonly used types
pub use ballot::{validate_vote, Vote, VoteError, VoteRejection, VotesDict, NO, YES};
pub use card::{CardData, CardFormatError, ClerkCardData, PollworkerCardData, VoterCardData};
pub use catalog::{ElectionCatalog, NotFound, ValidationError};
pub use election::{
    BallotStyle, BallotTrackerConfig, BallotTrackerType, BmdConfig, BmdSettings, Candidate,
    CandidateContest, Contest, County, District, Election, Party, Precinct, YesNoContest,
    TRACKER_ID_PLACEHOLDER,
};
pub use session::{
    activate, ActivationData, ActivationError, CastBallot, Session, TextSize, UserSettings,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
