use crate::stv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
}

/// A CSV file with ballots for one position.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotFile {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    _count_column_index: Option<JSValue>,
}

impl BallotFile {
    /// A file with one ballot per row and no other column.
    pub fn plain(file_path: &str) -> BallotFile {
        BallotFile {
            file_path: file_path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            _count_column_index: None,
        }
    }

    /// The column of the first preference, starting at 0.
    pub fn first_vote_column_index(&self) -> StvResult<usize> {
        match self._first_vote_column_index {
            Some(_) => Ok(read_js_int(&self._first_vote_column_index)? - 1),
            None => Ok(0),
        }
    }

    /// The number of rows before the first ballot.
    pub fn first_vote_row_index(&self) -> StvResult<usize> {
        match self._first_vote_row_index {
            Some(_) => Ok(read_js_int(&self._first_vote_row_index)? - 1),
            None => Ok(0),
        }
    }

    /// The column holding the number of copies of the ballot, starting at 0.
    pub fn count_column_index(&self) -> StvResult<Option<usize>> {
        match self._count_column_index {
            Some(_) => read_js_int(&self._count_column_index).map(|x| Some(x - 1)),
            None => Ok(None),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub id: String,
    pub name: Option<String>,
    pub excluded: Option<bool>,
}

impl CandidateEntry {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => self.id.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub name: String,
    pub vacancies: u32,
    pub candidates: Vec<CandidateEntry>,
    pub ballots: Option<Vec<Vec<String>>>,
    #[serde(rename = "ballotFiles")]
    pub ballot_files: Option<Vec<BallotFile>>,
    #[serde(rename = "manualWinners")]
    pub manual_winners: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub rules: Option<StvRules>,
    pub positions: Vec<Position>,
}

pub fn read_config(path: &str) -> StvResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> StvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

/// Reads the tie-break rules. Without rules, ties are reported.
pub fn validate_rules(rules: &Option<StvRules>) -> StvResult<ContestRules> {
    let rules = match rules {
        Some(r) => r,
        None => return Ok(ContestRules::DEFAULT_RULES),
    };
    let seed = match &rules.random_seed {
        Some(_) => Some(read_seed(&rules.random_seed)?),
        None => None,
    };
    let tiebreak_mode = parse_tiebreak_mode(rules.tiebreak_mode.as_deref(), seed)?;
    Ok(ContestRules { tiebreak_mode })
}

pub fn parse_tiebreak_mode(mode: Option<&str>, seed: Option<u32>) -> StvResult<TieBreakMode> {
    match (mode, seed) {
        (None, _) | (Some("report"), _) => Ok(TieBreakMode::Report),
        (Some("useCandidateOrder"), _) => Ok(TieBreakMode::UseCandidateOrder),
        (Some("random"), Some(s)) => Ok(TieBreakMode::Random(s)),
        (Some("random"), None) => whatever!("tiebreak mode random requires a seed"),
        (Some(x), _) => whatever!("unknown tiebreak mode: {}", x),
    }
}

// Numbers, numeric strings and spreadsheet column letters are accepted.
// The result starts at 1.
fn read_js_int(x: &Option<JSValue>) -> StvResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().and_then(|x| usize::try_from(x).ok()),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase().chars().try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add((c as usize) - ('a' as usize) + 1)
            })
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(i) if i >= 1 => Ok(i),
        _ => ParsingJsonNumberSnafu {
            value: format!("{:?}", x),
        }
        .fail(),
    }
}

// Any value that fits in a u32, zero included.
fn read_seed(x: &Option<JSValue>) -> StvResult<u32> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64(),
        Some(JSValue::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match res.and_then(|v| u32::try_from(v).ok()) {
        Some(seed) => Ok(seed),
        None => ParsingJsonNumberSnafu {
            value: format!("{:?}", x),
        }
        .fail(),
    }
}
