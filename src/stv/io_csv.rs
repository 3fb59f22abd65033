// Primitives for reading CSV ballot files.

use std::fs::File;

use crate::stv::config_reader::BallotFile;
use crate::stv::*;

/// A row of a ballot file, before the cells are matched to candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub lineno: usize,
    pub count: u64,
    pub choices: Vec<String>,
}

pub fn read_csv_ballots(path: &str, bf: &BallotFile) -> StvResult<Vec<ParsedBallot>> {
    let choices_start_col = bf.first_vote_column_index()?;
    let count_idx_o = bf.count_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, bf)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;

        let count: u64 = if let Some(count_idx) = count_idx_o {
            let cell = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { path, lineno })?;
            cell.trim().parse::<u64>().ok().context(CsvCountSnafu {
                path,
                lineno,
                value: cell,
            })?
        } else {
            1
        };

        let choices: Vec<String> = line
            .iter()
            .enumerate()
            .skip(choices_start_col)
            .filter(|(col, _)| Some(*col) != count_idx_o)
            .map(|(_, s)| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        debug!(
            "read_csv_ballots: lineno: {:?} count: {} row: {:?}",
            lineno, count, &choices
        );

        res.push(ParsedBallot {
            lineno,
            count,
            choices,
        });
    }
    Ok(res)
}

fn get_records(path: &str, bf: &BallotFile) -> StvResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let skipped_rows = bf.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..skipped_rows {
        _ = records.next();
    }
    Ok((records, skipped_rows))
}

/// Expands the parsed rows into ballots of candidate ids. A cell may hold
/// the id or the name of a candidate. Unknown cells are kept as they are.
pub fn resolve_ballots(parsed: &[ParsedBallot], candidates: &[CandidateEntry]) -> Vec<Vec<String>> {
    let mut res: Vec<Vec<String>> = Vec::new();
    for pb in parsed.iter() {
        let ballot: Vec<String> = pb
            .choices
            .iter()
            .map(|cell| {
                candidates
                    .iter()
                    .find(|c| c.id == *cell)
                    .or_else(|| candidates.iter().find(|c| c.name.as_deref() == Some(cell)))
                    .map(|c| c.id.clone())
                    .unwrap_or_else(|| cell.clone())
            })
            .collect();
        if pb.count == 0 {
            debug!("resolve_ballots: line {} has a count of 0", pb.lineno);
        }
        for _ in 0..pb.count {
            res.push(ballot.clone());
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> CandidateEntry {
        CandidateEntry {
            id: id.to_string(),
            name: Some(name.to_string()),
            excluded: None,
        }
    }

    #[test]
    fn names_and_ids_are_resolved() {
        let parsed = vec![
            ParsedBallot {
                lineno: 2,
                count: 2,
                choices: vec!["Alice".to_string(), "c2".to_string()],
            },
            ParsedBallot {
                lineno: 3,
                count: 0,
                choices: vec!["c2".to_string()],
            },
            ParsedBallot {
                lineno: 4,
                count: 1,
                choices: vec!["Zoe".to_string()],
            },
        ];
        let candidates = vec![entry("c1", "Alice"), entry("c2", "Bob")];
        let ballots = resolve_ballots(&parsed, &candidates);
        assert_eq!(
            ballots,
            vec![
                vec!["c1".to_string(), "c2".to_string()],
                vec!["c1".to_string(), "c2".to_string()],
                vec!["Zoe".to_string()],
            ]
        );
    }

    #[test]
    fn reads_fixture_with_header_and_count() {
        let path = format!(
            "{}/tests/data/committee/chair_ballots.csv",
            env!("CARGO_MANIFEST_DIR")
        );
        let bf: BallotFile = serde_json::from_value(serde_json::json!({
            "filePath": "chair_ballots.csv",
            "firstVoteColumnIndex": 3,
            "firstVoteRowIndex": 2,
            "countColumnIndex": 2
        }))
        .unwrap();
        let parsed = read_csv_ballots(&path, &bf).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0].lineno, 2);
        assert_eq!(parsed[0].count, 5);
        assert_eq!(parsed[0].choices, vec!["a".to_string(), "Bob".to_string()]);
        assert_eq!(parsed.iter().map(|pb| pb.count).sum::<u64>(), 10);
    }
}
