use log::{debug, info};

use crate::config::*;

/// Applies a tie-break policy to the outcome of a count.
///
/// When the count stopped on a tie, the engine lists every tied candidate
/// as elected. This keeps the candidates elected before the tie and fills
/// the seats left, if any, with tied candidates in the order given by the
/// policy. Counts without a tie are returned unchanged.
pub fn resolve_tie(result: &TabulationResult, vacancies: u32, mode: TieBreakMode) -> Vec<String> {
    if !result.tie_detected {
        return result.elected.clone();
    }
    let ordered_tied: Vec<String> = match mode {
        TieBreakMode::Report => {
            return result.elected.clone();
        }
        TieBreakMode::UseCandidateOrder => result.tied.clone(),
        TieBreakMode::Random(seed) => candidate_permutation_crypto(&result.tied, seed),
    };

    let mut winners: Vec<String> = result
        .elected
        .iter()
        .filter(|c| !result.tied.contains(c))
        .cloned()
        .collect();
    let seats_left = (vacancies as usize).saturating_sub(winners.len());
    debug!(
        "resolve_tie: {} seats left for tied candidates {:?}",
        seats_left, ordered_tied
    );
    winners.extend(ordered_tied.into_iter().take(seats_left));
    info!("Tie resolved with {:?}: {:?}", mode, winners);
    winners
}

/// Generates a "random" permutation of the candidates. Random in this context
/// means hard to guess in advance but reproducible by anyone with the seed.
fn candidate_permutation_crypto(candidates: &[String], seed: u32) -> Vec<String> {
    let mut data: Vec<(String, String)> = candidates
        .iter()
        .map(|c| (sha256::digest(format!("{:08}{}", seed, c)), c.clone()))
        .collect();
    data.sort();
    data.into_iter().map(|p| p.1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cs: &[&str]) -> Vec<String> {
        cs.iter().map(|s| s.to_string()).collect()
    }

    fn tied_result(elected: &[&str], tied: &[&str]) -> TabulationResult {
        TabulationResult {
            elected: names(elected),
            tie_detected: !tied.is_empty(),
            tied: names(tied),
            quota: 1.0,
            final_tallies: vec![],
            exhausted: 0.0,
            round_stats: vec![],
        }
    }

    #[test]
    fn report_keeps_raw_result() {
        let r = tied_result(&["A", "B"], &["A", "B"]);
        assert_eq!(resolve_tie(&r, 1, TieBreakMode::Report), names(&["A", "B"]));
    }

    #[test]
    fn no_tie_is_unchanged() {
        let r = tied_result(&["A", "C"], &[]);
        assert_eq!(
            resolve_tie(&r, 2, TieBreakMode::UseCandidateOrder),
            names(&["A", "C"])
        );
    }

    #[test]
    fn candidate_order_fills_remaining_seats() {
        let r = tied_result(&["A", "B", "C", "D"], &["B", "C", "D"]);
        assert_eq!(
            resolve_tie(&r, 3, TieBreakMode::UseCandidateOrder),
            names(&["A", "B", "C"])
        );
    }

    #[test]
    fn random_uses_seeded_hash_order() {
        let r = tied_result(&["A", "B", "C", "D"], &["B", "C", "D"]);
        assert_eq!(
            resolve_tie(&r, 3, TieBreakMode::Random(42)),
            names(&["A", "B", "D"])
        );
        assert_eq!(
            resolve_tie(&r, 3, TieBreakMode::Random(7)),
            names(&["A", "B", "C"])
        );
    }

    #[test]
    fn tie_after_seats_filled_drops_tied() {
        let r = tied_result(&["A", "B", "C"], &["B", "C"]);
        assert_eq!(
            resolve_tie(&r, 1, TieBreakMode::UseCandidateOrder),
            names(&["A"])
        );
    }
}
