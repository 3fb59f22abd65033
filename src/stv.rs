use log::{debug, info, warn};

use hare_clark::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::stv::config_reader::*;
use crate::stv::io_csv::{read_csv_ballots, resolve_ballots};

pub mod config_reader;
pub mod io_csv;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a number, found {value}"))]
    ParsingJsonNumber { value: String },
    #[snafu(display("Error writing the summary: {source}"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file {path}: {source}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Line {lineno} of {path}: {value:?} is not a ballot count"))]
    CsvCount {
        path: String,
        lineno: usize,
        value: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StvResult<T> = Result<T, StvError>;

fn fmt_weight(w: f64) -> String {
    format!("{:.4}", w)
}

fn round_stats_to_json(rounds: &[RoundStats], names: &HashMap<String, String>) -> Vec<JSValue> {
    let display = |cid: &String| -> String { names.get(cid).unwrap_or(cid).clone() };
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (cid, count) in round_stat.tally.iter() {
            tally.insert(display(cid), json!(fmt_weight(*count)));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        let mut tied: Option<Vec<String>> = None;
        match &round_stat.decision {
            RoundDecision::Elected(stats) | RoundDecision::Eliminated(stats) => {
                let mut transfers: JSMap<String, JSValue> = JSMap::new();
                for (cid, w) in stats.transfers.iter() {
                    transfers.insert(display(cid), json!(fmt_weight(*w)));
                }
                if stats.exhausted > 0.0 {
                    transfers.insert(
                        "exhausted".to_string(),
                        json!(fmt_weight(stats.exhausted)),
                    );
                }
                let key = match round_stat.decision {
                    RoundDecision::Elected(_) => "elected",
                    _ => "eliminated",
                };
                let mut tr: JSMap<String, JSValue> = JSMap::new();
                tr.insert(key.to_string(), json!(display(&stats.name)));
                tr.insert("transfers".to_string(), JSValue::Object(transfers));
                tally_results.push(JSValue::Object(tr));
            }
            RoundDecision::Tie(cids) => {
                tied = Some(cids.iter().map(display).collect());
            }
        }

        let mut js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        if let Some(t) = tied {
            js["tied"] = json!(t);
        }
        l.push(js);
    }
    l
}

fn ranked_to_json(c: &RankedCandidate) -> JSValue {
    json!({
        "id": c.id,
        "name": c.name,
        "ranking": c.ranking,
        "totalPoints": fmt_weight(c.total_points),
        "bordaPoints": c.borda_points,
    })
}

fn position_to_json(position: &Position, res: &Result<ContestResult, TabulationError>) -> JSValue {
    let cr = match res {
        Ok(cr) => cr,
        Err(e) => {
            return json!({
                "positionId": position.id,
                "positionName": position.name,
                "error": e.to_string(),
            });
        }
    };
    let names: HashMap<String, String> = position
        .candidates
        .iter()
        .map(|c| (c.id.clone(), c.display_name()))
        .collect();
    let (threshold, rounds) = match &cr.tabulation {
        Some(t) => (
            json!(fmt_weight(t.quota)),
            round_stats_to_json(&t.round_stats, &names),
        ),
        None => (JSValue::Null, Vec::new()),
    };
    json!({
        "positionId": cr.position_id,
        "positionName": cr.position_name,
        "vacancies": cr.vacancies,
        "threshold": threshold,
        "tieDetected": cr.tie_detected(),
        "winners": cr.winners.iter().map(ranked_to_json).collect::<Vec<JSValue>>(),
        "candidates": cr.candidates.iter().map(ranked_to_json).collect::<Vec<JSValue>>(),
        "rounds": rounds,
    })
}

fn build_summary_js(
    config: &ElectionConfig,
    results: &[Result<ContestResult, TabulationError>],
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
    };
    let positions: Vec<JSValue> = config
        .positions
        .iter()
        .zip(results.iter())
        .map(|(p, r)| position_to_json(p, r))
        .collect();
    json!({
        "config": c,
        "results": positions })
}

fn build_contest(position: &Position, root: &Path) -> StvResult<Contest> {
    let mut ballots: Vec<Vec<String>> = position.ballots.clone().unwrap_or_default();
    for bf in position.ballot_files.iter().flatten() {
        let p: PathBuf = root.join(&bf.file_path);
        let p2 = p.as_path().display().to_string();
        info!("Attempting to read ballot file {:?}", p2);
        let parsed = read_csv_ballots(&p2, bf)?;
        let mut file_ballots = resolve_ballots(&parsed, &position.candidates);
        info!("Read {} ballots from {}", file_ballots.len(), p2);
        ballots.append(&mut file_ballots);
    }
    Ok(Contest {
        id: position.id.clone(),
        name: position.name.clone(),
        vacancies: position.vacancies,
        candidates: position
            .candidates
            .iter()
            .map(|c| Candidate::new(&c.id, &c.display_name()))
            .collect(),
        ballots,
        excluded: position
            .candidates
            .iter()
            .filter(|c| c.excluded.unwrap_or(false))
            .map(|c| c.id.clone())
            .collect(),
        manual_winners: position.manual_winners.clone(),
    })
}

// A single position read from one CSV file, with no header and one ballot
// per row.
fn quick_election(
    input: &str,
    vacancies: u32,
    candidates: &Option<Vec<String>>,
) -> StvResult<ElectionConfig> {
    let bf = BallotFile::plain(input);
    let parsed = read_csv_ballots(input, &bf)?;
    let candidate_ids: Vec<String> = match candidates {
        Some(cs) => cs.iter().map(|c| c.trim().to_string()).collect(),
        None => {
            let mut seen: Vec<String> = Vec::new();
            for c in parsed.iter().flat_map(|pb| pb.choices.iter()) {
                if !seen.contains(c) {
                    seen.push(c.clone());
                }
            }
            seen
        }
    };
    let entries: Vec<CandidateEntry> = candidate_ids
        .into_iter()
        .map(|id| CandidateEntry {
            id,
            name: None,
            excluded: None,
        })
        .collect();
    let ballots = resolve_ballots(&parsed, &entries);
    let stem = Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| input.to_string());
    Ok(ElectionConfig {
        output_settings: OutputSettings {
            contest_name: stem.clone(),
            output_directory: None,
            contest_date: None,
            contest_jurisdiction: None,
            contest_office: None,
        },
        rules: None,
        positions: vec![Position {
            id: "contest".to_string(),
            name: stem,
            vacancies,
            candidates: entries,
            ballots: Some(ballots),
            ballot_files: None,
            manual_winners: None,
        }],
    })
}

// The command line wins over the election file.
fn apply_overrides(rules: ContestRules, args: &Args) -> StvResult<ContestRules> {
    let seed = args.seed.or(match rules.tiebreak_mode {
        TieBreakMode::Random(s) => Some(s),
        _ => None,
    });
    let tiebreak_mode = match &args.tiebreak {
        Some(m) => parse_tiebreak_mode(Some(m.as_str()), seed)?,
        None => match (rules.tiebreak_mode, args.seed) {
            (TieBreakMode::Random(_), Some(s)) => TieBreakMode::Random(s),
            (m, _) => m,
        },
    };
    Ok(ContestRules { tiebreak_mode })
}

fn write_summary(out: Option<PathBuf>, pretty_js: &str) -> StvResult<()> {
    match out {
        None => {
            println!("{}", pretty_js);
        }
        Some(p) => {
            let path = p.display().to_string();
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context(WritingOutputSnafu { path: path.clone() })?;
            }
            info!("Writing summary to {}", path);
            fs::write(&p, pretty_js).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

pub fn run_election(args: &Args) -> StvResult<()> {
    let (config, root) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        (None, Some(input)) => {
            let vacancies = match args.vacancies {
                Some(v) => v,
                None => whatever!("--vacancies is required with --input"),
            };
            (
                quick_election(input, vacancies, &args.candidates)?,
                PathBuf::new(),
            )
        }
        (None, None) => {
            whatever!("Either --config or --input must be provided")
        }
    };
    debug!("config: {:?}", config);

    let rules = apply_overrides(validate_rules(&config.rules)?, args)?;
    info!("rules: {:?}", rules);

    let mut contests: Vec<Contest> = Vec::new();
    for position in config.positions.iter() {
        contests.push(build_contest(position, &root)?);
    }

    let results = tabulate_contests(&contests, &rules);

    // Assemble the final json
    let result_js = build_summary_js(&config, &results);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;

    let out: Option<PathBuf> = match args.out.as_deref() {
        Some("stdout") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root.join(d).join("summary.json")),
    };
    write_summary(out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
    }

    fn test_args() -> Args {
        Args {
            config: None,
            reference: None,
            out: None,
            input: None,
            vacancies: None,
            candidates: None,
            tiebreak: None,
            seed: None,
            verbose: false,
        }
    }

    fn out_path(test_name: &str) -> String {
        std::env::temp_dir()
            .join(format!("hctab-{}-summary.json", test_name))
            .display()
            .to_string()
    }

    fn test_wrapper(test_name: &str) {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir().join(test_name);
        let args = Args {
            config: Some(
                dir.join(format!("{}_config.json", test_name))
                    .display()
                    .to_string(),
            ),
            reference: Some(
                dir.join(format!("{}_expected_summary.json", test_name))
                    .display()
                    .to_string(),
            ),
            out: Some(out_path(test_name)),
            ..test_args()
        };
        if let Err(e) = run_election(&args) {
            panic!("test {} failed: {}", test_name, e);
        }
    }

    #[test]
    fn committee() {
        test_wrapper("committee");
    }

    #[test]
    fn withdrawals() {
        test_wrapper("withdrawals");
    }

    #[test]
    fn quick_input() {
        let dir = test_dir().join("quick");
        let args = Args {
            input: Some(dir.join("quick_ballots.csv").display().to_string()),
            vacancies: Some(1),
            reference: Some(
                dir.join("quick_expected_summary.json")
                    .display()
                    .to_string(),
            ),
            out: Some(out_path("quick")),
            ..test_args()
        };
        assert!(run_election(&args).is_ok());

        // Same ballots, tie broken by roster order.
        let out = out_path("quick-ordered");
        let args = Args {
            tiebreak: Some("useCandidateOrder".to_string()),
            reference: None,
            out: Some(out.clone()),
            ..args
        };
        run_election(&args).unwrap();
        let js = read_summary(&out).unwrap();
        let position = &js["results"][0];
        assert_eq!(position["tieDetected"], json!(true));
        let ids = |key: &str| -> Vec<String> {
            position[key]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|c| c["id"].as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default()
        };
        assert_eq!(ids("winners"), vec!["a".to_string()]);
        // b and c stay tied at one vote, b has more Borda points.
        assert_eq!(
            ids("candidates"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn written_summary_is_json() {
        let dir = test_dir().join("committee");
        let out = out_path("written");
        let args = Args {
            config: Some(dir.join("committee_config.json").display().to_string()),
            out: Some(out.clone()),
            ..test_args()
        };
        run_election(&args).unwrap();
        let js = read_summary(&out).unwrap();
        assert_eq!(js["results"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(js["config"]["contest"], json!("Club committee 2024"));
    }

    #[test]
    fn missing_input() {
        assert!(run_election(&test_args()).is_err());
        let args = Args {
            input: Some("ballots.csv".to_string()),
            ..test_args()
        };
        assert!(run_election(&args).is_err());
    }

    #[test]
    fn rule_overrides() {
        let rules = ContestRules {
            tiebreak_mode: TieBreakMode::Random(3),
        };
        let args = Args {
            seed: Some(9),
            ..test_args()
        };
        assert_eq!(
            apply_overrides(rules.clone(), &args).unwrap().tiebreak_mode,
            TieBreakMode::Random(9)
        );
        let args = Args {
            tiebreak: Some("useCandidateOrder".to_string()),
            ..test_args()
        };
        assert_eq!(
            apply_overrides(rules.clone(), &args).unwrap().tiebreak_mode,
            TieBreakMode::UseCandidateOrder
        );
        let args = Args {
            tiebreak: Some("random".to_string()),
            ..test_args()
        };
        assert_eq!(
            apply_overrides(ContestRules::DEFAULT_RULES, &args)
                .map(|r| r.tiebreak_mode)
                .ok(),
            None
        );
    }

    #[test]
    fn four_decimals() {
        assert_eq!(fmt_weight(10.0 / 3.0 + 1.0), "4.3333");
        assert_eq!(fmt_weight(2.0), "2.0000");
        assert_eq!(fmt_weight(0.66666), "0.6667");
    }
}
