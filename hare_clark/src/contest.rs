use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::{get_quota, run_hare_clark};
use crate::tiebreak::resolve_tie;

/// Borda points of each candidate: on a ballot ranking `n` candidates, the
/// candidate at position `i` (starting at 0) receives `n - i` points.
pub fn borda_scores(ballots: &[Vec<String>]) -> HashMap<String, u64> {
    let mut scores: HashMap<String, u64> = HashMap::new();
    for ballot in ballots.iter() {
        let n = ballot.len();
        for (i, cid) in ballot.iter().enumerate() {
            *scores.entry(cid.clone()).or_insert(0) += (n - i) as u64;
        }
    }
    scores
}

/// Counts one position and produces its standings.
pub fn tabulate_contest(
    contest: &Contest,
    rules: &ContestRules,
) -> Result<ContestResult, TabulationError> {
    info!(
        "Tabulating position {} ({}): {} candidates, {} ballots, {} vacancies",
        contest.id,
        contest.name,
        contest.candidates.len(),
        contest.ballots.len(),
        contest.vacancies
    );
    let excluded: HashSet<&str> = contest.excluded.iter().map(|s| s.as_str()).collect();
    let roster: Vec<&Candidate> = contest
        .candidates
        .iter()
        .filter(|c| !excluded.contains(c.id.as_str()))
        .collect();

    let mut res = ContestResult {
        position_id: contest.id.clone(),
        position_name: contest.name.clone(),
        vacancies: contest.vacancies,
        winners: Vec::new(),
        candidates: Vec::new(),
        tabulation: None,
    };
    if roster.is_empty() {
        warn!("Position {} has no candidates", contest.id);
        return Ok(res);
    }
    if contest.vacancies == 0 {
        return Err(TabulationError::InvalidInput(
            InputError::InvalidVacancies {
                vacancies: contest.vacancies,
                candidates: roster.len(),
            },
        ));
    }
    // Not enough candidates left: all of them are elected and some seats
    // stay empty.
    let seats = (contest.vacancies as usize).min(roster.len()) as u32;
    if seats < contest.vacancies {
        warn!(
            "Position {}: {} candidates for {} vacancies, {} seats left unfilled",
            contest.id,
            roster.len(),
            contest.vacancies,
            contest.vacancies - seats
        );
    }

    let ballots: Vec<Vec<String>> = contest
        .ballots
        .iter()
        .map(|b| {
            b.iter()
                .filter(|cid| !excluded.contains(cid.as_str()))
                .cloned()
                .collect()
        })
        .collect();

    let manual_winners: Option<Vec<String>> = contest
        .manual_winners
        .as_ref()
        .filter(|m| !m.is_empty())
        .map(|m| {
            let mut seen: HashSet<&str> = HashSet::new();
            m.iter()
                .filter(|cid| {
                    let known = roster.iter().any(|c| c.id == **cid);
                    if !known {
                        warn!(
                            "Position {}: manual winner {} is not a candidate",
                            contest.id, cid
                        );
                    }
                    known && seen.insert(cid.as_str())
                })
                .cloned()
                .collect()
        });

    if ballots.is_empty() {
        // Nothing to count: the roster order decides, unless manual winners
        // are given. Then the others follow by name.
        let by_name = manual_winners.is_some();
        let winner_ids: Vec<String> = manual_winners.unwrap_or_else(|| {
            roster
                .iter()
                .take(contest.vacancies as usize)
                .map(|c| c.id.clone())
                .collect()
        });
        let no_points = (HashMap::new(), HashMap::new());
        let scores = if by_name {
            Some((&no_points.0, &no_points.1))
        } else {
            None
        };
        res.candidates = rank_candidates(&roster, &winner_ids, scores);
        res.winners = res.candidates[..winner_ids.len()].to_vec();
        return Ok(res);
    }

    let ids: Vec<String> = roster.iter().map(|c| c.id.clone()).collect();
    let mut tabulation = run_hare_clark(&ids, &ballots, seats)?;
    if seats < contest.vacancies {
        tabulation.quota = get_quota(ballots.len(), contest.vacancies);
    }
    let winner_ids: Vec<String> = match manual_winners {
        Some(m) => {
            info!("Position {}: using manual winners {:?}", contest.id, m);
            m
        }
        None => resolve_tie(&tabulation, contest.vacancies, rules.tiebreak_mode),
    };

    let tallies: HashMap<String, f64> = tabulation.final_tallies.iter().cloned().collect();
    // Withdrawn candidates still take up a place on the ballot.
    let borda = borda_scores(&contest.ballots);
    res.candidates = rank_candidates(&roster, &winner_ids, Some((&tallies, &borda)));
    res.winners = res.candidates[..winner_ids.len()].to_vec();
    res.tabulation = Some(tabulation);
    debug!("Position {} standings: {:?}", contest.id, res.candidates);
    Ok(res)
}

/// Counts several positions. A failure in one position does not affect the
/// others.
pub fn tabulate_contests(
    contests: &[Contest],
    rules: &ContestRules,
) -> Vec<Result<ContestResult, TabulationError>> {
    contests
        .iter()
        .map(|c| {
            let r = tabulate_contest(c, rules);
            if let Err(e) = &r {
                warn!("Position {} could not be tabulated: {}", c.id, e);
            }
            r
        })
        .collect()
}

// Winners come first, in the given order. The others follow by decreasing
// tally, then decreasing Borda points, then name. Without scores they keep
// the roster order.
fn rank_candidates(
    roster: &[&Candidate],
    winner_ids: &[String],
    scores: Option<(&HashMap<String, f64>, &HashMap<String, u64>)>,
) -> Vec<RankedCandidate> {
    let points = |c: &Candidate| -> (f64, u64) {
        match scores {
            Some((tallies, borda)) => (
                tallies.get(&c.id).cloned().unwrap_or(0.0),
                borda.get(&c.id).cloned().unwrap_or(0),
            ),
            None => (0.0, 0),
        }
    };

    let mut ordered: Vec<&Candidate> = winner_ids
        .iter()
        .filter_map(|wid| roster.iter().find(|c| c.id == *wid).copied())
        .collect();
    let mut others: Vec<&Candidate> = roster
        .iter()
        .filter(|c| !winner_ids.contains(&c.id))
        .copied()
        .collect();
    if scores.is_some() {
        others.sort_by(|a, b| {
            let (ta, ba) = points(*a);
            let (tb, bb) = points(*b);
            tb.total_cmp(&ta)
                .then(bb.cmp(&ba))
                .then_with(|| a.name.cmp(&b.name))
        });
    }
    ordered.extend(others);

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, c)| {
            let (total_points, borda_points) = points(c);
            RankedCandidate {
                id: c.id.clone(),
                name: c.name.clone(),
                ranking: idx as u32 + 1,
                total_points,
                borda_points,
            }
        })
        .collect()
}
