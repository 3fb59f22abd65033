pub mod builder;
mod config;
mod contest;
pub mod manual;
mod tiebreak;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::contest::{borda_scores, tabulate_contest, tabulate_contests};
pub use crate::tiebreak::resolve_tie;

// **** Private structures ****

type RoundId = u32;

/// Position of the candidate in the input roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum CandidateStatus {
    Active(f64),
    Eliminated,
    Elected,
}

impl CandidateStatus {
    fn tally(&self) -> Option<f64> {
        match self {
            CandidateStatus::Active(t) => Some(*t),
            _ => None,
        }
    }
}

// The preferences are never modified. Everything before the cursor has been
// decided; the preference under the cursor is the one the ballot counts for.
#[derive(PartialEq, Debug, Clone)]
struct WeightedBallot {
    preferences: Vec<CandidateId>,
    cursor: usize,
    weight: f64,
}

impl WeightedBallot {
    fn new(preferences: Vec<CandidateId>) -> WeightedBallot {
        WeightedBallot {
            preferences,
            cursor: 0,
            weight: 1.0,
        }
    }

    fn current(&self) -> Option<CandidateId> {
        self.preferences.get(self.cursor).copied()
    }

    /// Moves the cursor past all the decided candidates.
    /// Returns the new current preference, or None if the ballot is exhausted.
    fn advance(&mut self, statuses: &[CandidateStatus]) -> Option<CandidateId> {
        while let Some(cid) = self.current() {
            if let CandidateStatus::Active(_) = statuses[cid.idx()] {
                return Some(cid);
            }
            self.cursor += 1;
        }
        None
    }
}

fn add_weight(statuses: &mut [CandidateStatus], cid: CandidateId, weight: f64) {
    if let CandidateStatus::Active(t) = &mut statuses[cid.idx()] {
        *t += weight;
    }
}

/// All the state of one count. It is built from a copy of the input and
/// dropped at the end of the count.
struct ElectionState {
    names: Vec<String>,
    statuses: Vec<CandidateStatus>,
    // The tally of each candidate at the moment it was decided.
    decision_tallies: Vec<Option<f64>>,
    ballots: Vec<WeightedBallot>,
    elected: Vec<CandidateId>,
    vacancies: u32,
    quota: f64,
    exhausted: f64,
}

impl ElectionState {
    fn new(names: Vec<String>, ballots: Vec<Vec<CandidateId>>, vacancies: u32) -> ElectionState {
        let quota = get_quota(ballots.len(), vacancies);
        let mut statuses = vec![CandidateStatus::Active(0.0); names.len()];
        let ballots: Vec<WeightedBallot> = ballots.into_iter().map(WeightedBallot::new).collect();
        let mut exhausted = 0.0;
        for b in ballots.iter() {
            match b.current() {
                Some(cid) => add_weight(&mut statuses, cid, b.weight),
                None => exhausted += b.weight,
            }
        }
        ElectionState {
            decision_tallies: vec![None; names.len()],
            names,
            statuses,
            ballots,
            elected: Vec::new(),
            vacancies,
            quota,
            exhausted,
        }
    }

    fn name(&self, cid: CandidateId) -> String {
        self.names[cid.idx()].clone()
    }

    /// The undecided candidates, in input order.
    fn undecided(&self) -> Vec<CandidateId> {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.tally().map(|_| CandidateId(idx as u32)))
            .collect()
    }

    fn named_tallies(&self) -> Vec<(String, f64)> {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.tally().map(|t| (self.names[idx].clone(), t)))
            .collect()
    }

    /// Finds the candidates with the highest and the lowest tallies.
    ///
    /// Among equal highest tallies, the last candidate in input order wins.
    /// Among equal lowest tallies, the first one loses.
    fn scan(&self) -> Option<((CandidateId, f64), (CandidateId, f64))> {
        let mut winner: Option<(CandidateId, f64)> = None;
        let mut loser: Option<(CandidateId, f64)> = None;
        for (idx, status) in self.statuses.iter().enumerate() {
            if let CandidateStatus::Active(tally) = *status {
                let cid = CandidateId(idx as u32);
                match winner {
                    Some((_, best)) if tally < best => {}
                    _ => winner = Some((cid, tally)),
                }
                match loser {
                    Some((_, worst)) if tally >= worst => {}
                    _ => loser = Some((cid, tally)),
                }
            }
        }
        winner.zip(loser)
    }

    /// Marks the candidate as decided and moves the ballots it holds to
    /// their next continuing preference, scaled by the transfer value.
    fn process_candidate(
        &mut self,
        cid: CandidateId,
        status: CandidateStatus,
        transfer_value: f64,
    ) -> TransferStats {
        let tally = self.statuses[cid.idx()].tally().unwrap_or(0.0);
        self.statuses[cid.idx()] = status;
        self.decision_tallies[cid.idx()] = Some(tally);

        let statuses = &mut self.statuses;
        let mut transfers: HashMap<CandidateId, f64> = HashMap::new();
        let mut exhausted = 0.0;
        for ballot in self
            .ballots
            .iter_mut()
            .filter(|b| b.current() == Some(cid))
        {
            ballot.weight *= transfer_value;
            match ballot.advance(statuses) {
                Some(next) => {
                    add_weight(statuses, next, ballot.weight);
                    *transfers.entry(next).or_insert(0.0) += ballot.weight;
                }
                None => {
                    exhausted += ballot.weight;
                }
            }
        }
        self.exhausted += exhausted;

        let mut sorted_transfers: Vec<(CandidateId, f64)> = transfers.into_iter().collect();
        sorted_transfers.sort_by_key(|(cid, _)| *cid);
        debug!(
            "process_candidate: {:?} tally {} transfer value {} transfers {:?} exhausted {}",
            cid, tally, transfer_value, sorted_transfers, exhausted
        );
        TransferStats {
            name: self.name(cid),
            tally,
            transfer_value,
            transfers: sorted_transfers
                .into_iter()
                .map(|(cid, w)| (self.name(cid), w))
                .collect(),
            exhausted,
        }
    }

    fn final_tallies(&self) -> Vec<(String, f64)> {
        self.statuses
            .iter()
            .zip(self.decision_tallies.iter())
            .zip(self.names.iter())
            .map(|((s, dt), name)| (name.clone(), dt.or_else(|| s.tally()).unwrap_or(0.0)))
            .collect()
    }
}

/// The winning threshold: a candidate must have strictly more than this to
/// be elected. This is not floored.
fn get_quota(num_ballots: usize, vacancies: u32) -> f64 {
    num_ballots as f64 / (vacancies as f64 + 1.0) + 1.0
}

fn exceeds_quota(tally: f64, quota: f64) -> bool {
    tally > quota
}

/// Runs the Hare-Clark count for one position.
///
/// Arguments:
/// * `candidates` the candidate ids, in the order used to break ties
/// * `ballots` the preferences of each voter, most preferred first
/// * `vacancies` the number of seats to fill
///
/// The input is copied: the same ballots can be counted again, or counted
/// concurrently for other positions.
pub fn run_hare_clark(
    candidates: &[String],
    ballots: &[Vec<String>],
    vacancies: u32,
) -> Result<TabulationResult, TabulationError> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, vacancies: {:?}",
        ballots.len(),
        candidates,
        vacancies
    );

    let checked_ballots = checks(candidates, ballots, vacancies)?;
    let mut state = ElectionState::new(candidates.to_vec(), checked_ballots, vacancies);
    info!("Quota: {}", state.quota);

    let mut round_stats: Vec<RoundStats> = Vec::new();
    let mut tied: Vec<CandidateId> = Vec::new();

    while (state.vacancies as usize) < state.undecided().len() {
        let round_id: RoundId = round_stats.len() as u32 + 1;
        let tally = state.named_tallies();
        debug!("Round {}: tally {:?}", round_id, tally);

        let ((winner, winner_tally), (loser, loser_tally)) = match state.scan() {
            Some(p) => p,
            None => break,
        };

        let decision = if winner_tally == loser_tally {
            tied = state.undecided();
            let names: Vec<String> = tied.iter().map(|cid| state.name(*cid)).collect();
            warn!(
                "Round {}: all the remaining candidates are tied at {}: {:?}",
                round_id, winner_tally, names
            );
            RoundDecision::Tie(names)
        } else if exceeds_quota(winner_tally, state.quota) {
            if winner_tally <= 0.0 {
                return Err(TabulationError::DegenerateZeroTallyWinner(
                    state.name(winner),
                ));
            }
            let surplus = winner_tally - state.quota;
            let transfer_value = surplus / winner_tally;
            let stats = state.process_candidate(winner, CandidateStatus::Elected, transfer_value);
            state.elected.push(winner);
            state.vacancies = state.vacancies.saturating_sub(1);
            info!(
                "Round {}: {} elected with {} (surplus {})",
                round_id, stats.name, winner_tally, surplus
            );
            RoundDecision::Elected(stats)
        } else {
            let stats = state.process_candidate(loser, CandidateStatus::Eliminated, 1.0);
            info!(
                "Round {}: {} eliminated with {}",
                round_id, stats.name, loser_tally
            );
            RoundDecision::Eliminated(stats)
        };

        let is_tie = matches!(decision, RoundDecision::Tie(_));
        round_stats.push(RoundStats {
            round: round_id,
            tally,
            decision,
        });
        if is_tie {
            break;
        }
    }

    // The candidates still undecided take the remaining seats in input
    // order. After a tie this may be more candidates than seats.
    let mut elected: Vec<String> = state.elected.iter().map(|cid| state.name(*cid)).collect();
    elected.extend(state.undecided().iter().map(|cid| state.name(*cid)));
    info!("Elected: {:?}", elected);

    Ok(TabulationResult {
        elected,
        tie_detected: !tied.is_empty(),
        tied: tied.iter().map(|cid| state.name(*cid)).collect(),
        quota: state.quota,
        final_tallies: state.final_tallies(),
        exhausted: state.exhausted,
        round_stats,
    })
}

// Ballots are returned in the same order.
fn checks(
    candidates: &[String],
    ballots: &[Vec<String>],
    vacancies: u32,
) -> Result<Vec<Vec<CandidateId>>, InputError> {
    if candidates.is_empty() {
        return Err(InputError::NoCandidates);
    }
    let mut ids: HashMap<&str, CandidateId> = HashMap::new();
    for (idx, c) in candidates.iter().enumerate() {
        if ids.insert(c.as_str(), CandidateId(idx as u32)).is_some() {
            return Err(InputError::DuplicateCandidate(c.clone()));
        }
    }
    if vacancies == 0 || vacancies as usize > candidates.len() {
        return Err(InputError::InvalidVacancies {
            vacancies,
            candidates: candidates.len(),
        });
    }

    let mut res: Vec<Vec<CandidateId>> = Vec::with_capacity(ballots.len());
    for (bidx, ballot) in ballots.iter().enumerate() {
        let mut seen: HashSet<CandidateId> = HashSet::new();
        let mut preferences: Vec<CandidateId> = Vec::with_capacity(ballot.len());
        for c in ballot.iter() {
            let cid = *ids
                .get(c.as_str())
                .ok_or_else(|| InputError::UnknownCandidate {
                    ballot: bidx,
                    candidate: c.clone(),
                })?;
            if !seen.insert(cid) {
                return Err(InputError::RepeatedPreference {
                    ballot: bidx,
                    candidate: c.clone(),
                });
            }
            preferences.push(cid);
        }
        res.push(preferences);
    }
    debug!("checks: {} ballots validated", res.len());
    Ok(res)
}
