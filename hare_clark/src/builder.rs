use crate::*;

/// A builder for adding ballots to a count.
///
/// ```
/// pub use hare_clark::builder::Builder;
/// # use hare_clark::TabulationError;
///
/// let mut builder = Builder::new(1)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot(&["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_ballots(&["Bob".to_string()], 2)?;
///
/// let result = builder.tabulate()?;
/// assert_eq!(result.elected, vec!["Bob".to_string()]);
/// assert!(!result.tie_detected);
///
/// # Ok::<(), TabulationError>(())
/// ```
pub struct Builder {
    pub(crate) _vacancies: u32,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Vec<String>>,
}

impl Builder {
    pub fn new(vacancies: u32) -> Result<Builder, TabulationError> {
        if vacancies == 0 {
            return Err(TabulationError::InvalidInput(
                InputError::InvalidVacancies {
                    vacancies,
                    candidates: 0,
                },
            ));
        }
        Ok(Builder {
            _vacancies: vacancies,
            _candidates: None,
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidates. Their order is the order used to break
    /// ties during the count. Ballots added before are discarded.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, TabulationError> {
        if cands.is_empty() {
            return Err(TabulationError::InvalidInput(InputError::NoCandidates));
        }
        Ok(Builder {
            _vacancies: self._vacancies,
            _candidates: Some(cands.to_vec()),
            _ballots: Vec::new(),
        })
    }

    /// Adds one ballot, most preferred candidate first.
    pub fn add_ballot(&mut self, preferences: &[String]) -> Result<(), TabulationError> {
        self.add_ballots(preferences, 1)
    }

    /// Adds `count` identical ballots.
    ///
    /// If the candidates are registered, the preferences are checked against
    /// them right away.
    pub fn add_ballots(&mut self, preferences: &[String], count: u32) -> Result<(), TabulationError> {
        if let Some(valid_candidates) = self._candidates.as_deref() {
            if let Some(unknown) = preferences.iter().find(|p| !valid_candidates.contains(p)) {
                return Err(TabulationError::InvalidInput(
                    InputError::UnknownCandidate {
                        ballot: self._ballots.len(),
                        candidate: unknown.clone(),
                    },
                ));
            }
        }
        for _ in 0..count {
            self._ballots.push(preferences.to_vec());
        }
        Ok(())
    }

    /// Runs the count. Without registered candidates, the candidates are the
    /// ones found on the ballots, in order of first appearance.
    pub fn tabulate(&self) -> Result<TabulationResult, TabulationError> {
        let candidates: Vec<String> = match &self._candidates {
            Some(cands) => cands.clone(),
            None => {
                let mut seen: Vec<String> = Vec::new();
                for c in self._ballots.iter().flatten() {
                    if !seen.contains(c) {
                        seen.push(c.clone());
                    }
                }
                seen
            }
        };
        run_hare_clark(&candidates, &self._ballots, self._vacancies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cs: &[&str]) -> Vec<String> {
        cs.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn infers_candidates_from_ballots() {
        let mut b = Builder::new(1).unwrap();
        b.add_ballots(&s(&["B", "A"]), 2).unwrap();
        b.add_ballot(&s(&["A"])).unwrap();
        let res = b.tabulate().unwrap();
        assert_eq!(res.elected, s(&["B"]));
        assert_eq!(res.final_tallies[0].0, "B");
    }

    #[test]
    fn rejects_unknown_candidates_early() {
        let mut b = Builder::new(1).unwrap().candidates(&s(&["A", "B"])).unwrap();
        b.add_ballot(&s(&["A"])).unwrap();
        assert_eq!(
            b.add_ballot(&s(&["A", "C"])),
            Err(TabulationError::InvalidInput(InputError::UnknownCandidate {
                ballot: 1,
                candidate: "C".to_string()
            }))
        );
    }

    #[test]
    fn rejects_zero_vacancies() {
        assert!(Builder::new(0).is_err());
    }
}
