// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A candidate registered for a position.
///
/// The engine only needs the identifier. The name is used for reporting and
/// for ordering candidates that are otherwise equal.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub id: String,
    pub name: String,
}

impl Candidate {
    pub fn new(id: &str, name: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// One position (contest) of an election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contest {
    pub id: String,
    pub name: String,
    pub vacancies: u32,
    pub candidates: Vec<Candidate>,
    /// Candidate ids, most preferred first.
    pub ballots: Vec<Vec<String>>,
    /// Candidates withdrawn from this position. They are removed from the
    /// roster and from every ballot before counting.
    pub excluded: Vec<String>,
    /// Winners fixed by an administrator. Tallies are still reported.
    pub manual_winners: Option<Vec<String>>,
}

// ******** Output data structures *********

/// How the votes of a decided candidate moved during one round.
#[derive(PartialEq, Debug, Clone)]
pub struct TransferStats {
    pub name: String,
    /// The tally of the candidate when it was decided.
    pub tally: f64,
    pub transfer_value: f64,
    /// Weight received by each continuing candidate, in input order.
    pub transfers: Vec<(String, f64)>,
    /// Weight dropped by ballots with no continuing preference.
    pub exhausted: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RoundDecision {
    Elected(TransferStats),
    Eliminated(TransferStats),
    /// All the undecided candidates had the same tally. Counting stopped.
    Tie(Vec<String>),
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Tallies of the undecided candidates at the start of the round.
    pub tally: Vec<(String, f64)>,
    pub decision: RoundDecision,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TabulationResult {
    /// Elected candidates, in the order of election, followed by the
    /// candidates still undecided when counting stopped.
    pub elected: Vec<String>,
    /// Counting stopped because of a tie. `elected` may then hold more or
    /// fewer candidates than there are vacancies.
    pub tie_detected: bool,
    /// The candidates that were tied, in input order. Empty without a tie.
    pub tied: Vec<String>,
    pub quota: f64,
    /// Tally of every candidate when it was decided, or its current tally if
    /// it never was. Input order.
    pub final_tallies: Vec<(String, f64)>,
    /// Total weight dropped by exhausted ballots.
    pub exhausted: f64,
    pub round_stats: Vec<RoundStats>,
}

impl TabulationResult {
    pub fn final_tally(&self, candidate: &str) -> Option<f64> {
        self.final_tallies
            .iter()
            .find(|(name, _)| name == candidate)
            .map(|(_, t)| *t)
    }
}

/// A candidate in the final standings of a contest.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedCandidate {
    pub id: String,
    pub name: String,
    pub ranking: u32,
    pub total_points: f64,
    pub borda_points: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ContestResult {
    pub position_id: String,
    pub position_name: String,
    pub vacancies: u32,
    pub winners: Vec<RankedCandidate>,
    pub candidates: Vec<RankedCandidate>,
    /// Absent when no count was needed (no ballots or no candidates).
    pub tabulation: Option<TabulationResult>,
}

impl ContestResult {
    pub fn tie_detected(&self) -> bool {
        self.tabulation
            .as_ref()
            .map(|t| t.tie_detected)
            .unwrap_or(false)
    }
}

/// Problems with the input of a count. They are all detected before the
/// first round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InputError {
    NoCandidates,
    DuplicateCandidate(String),
    InvalidVacancies { vacancies: u32, candidates: usize },
    /// Ballot index and the unknown candidate id.
    UnknownCandidate { ballot: usize, candidate: String },
    /// Ballot index and the repeated candidate id.
    RepeatedPreference { ballot: usize, candidate: String },
}

impl Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NoCandidates => write!(f, "no candidates"),
            InputError::DuplicateCandidate(c) => write!(f, "candidate {} is listed twice", c),
            InputError::InvalidVacancies {
                vacancies,
                candidates,
            } => write!(
                f,
                "{} vacancies for {} candidates: expected between 1 and the number of candidates",
                vacancies, candidates
            ),
            InputError::UnknownCandidate { ballot, candidate } => {
                write!(f, "ballot {} ranks unknown candidate {}", ballot, candidate)
            }
            InputError::RepeatedPreference { ballot, candidate } => {
                write!(f, "ballot {} ranks candidate {} twice", ballot, candidate)
            }
        }
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabulationError {
    InvalidInput(InputError),
    /// A candidate with no votes was about to be elected.
    DegenerateZeroTallyWinner(String),
}

impl Error for InputError {}

impl Error for TabulationError {}

impl Display for TabulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabulationError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            TabulationError::DegenerateZeroTallyWinner(c) => {
                write!(f, "candidate {} would be elected with no votes", c)
            }
        }
    }
}

impl From<InputError> for TabulationError {
    fn from(e: InputError) -> Self {
        TabulationError::InvalidInput(e)
    }
}

// ********* Configuration **********

/// What to do with the candidates left when counting stops on a tie.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Return the count as is: every tied candidate is listed as elected.
    Report,
    /// Fill the remaining seats with the tied candidates in input order.
    UseCandidateOrder,
    // Note: the order is a hash of the seed and the candidate id, not a random
    // number generator, so that the outcome can be checked by anyone.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestRules {
    pub tiebreak_mode: TieBreakMode,
}

impl ContestRules {
    pub const DEFAULT_RULES: ContestRules = ContestRules {
        tiebreak_mode: TieBreakMode::Report,
    };
}
