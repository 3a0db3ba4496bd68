use serde::Deserialize;

use std::collections::{HashMap, HashSet};

pub const REQUIRED_COLUMNS: [&str; 13] = [
    "match_id",
    "player_name",
    "final_score_a",
    "final_score_b",
    "flag_captures",
    "flag_returns",
    "bc_kills",
    "dbs_kills",
    "dfa_kills",
    "overall_kills",
    "overall_deaths",
    "flaghold_time",
    "impact",
];

/// Upper bound for scores and per-match stat values. Keeps every lifetime and
/// team total far from `i32` overflow.
pub const MAX_STAT_VALUE: i32 = 1_000_000;

/// One data row of a match sheet exactly as uploaded. Nothing is interpreted
/// until `validate`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawStatsRow {
    pub match_id: String,
    pub player_name: String,
    pub final_score_a: String,
    pub final_score_b: String,
    pub flag_captures: String,
    pub flag_returns: String,
    pub bc_kills: String,
    pub dbs_kills: String,
    pub dfa_kills: String,
    pub overall_kills: String,
    pub overall_deaths: String,
    pub flaghold_time: String,
    pub impact: String,
}

/// Per-match impact rating, one of 1, 2 or 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Impact(i32);

impl Impact {
    pub fn new(value: i32) -> Option<Impact> {
        (1..=3).contains(&value).then_some(Impact(value))
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatLine {
    pub flag_captures: i32,
    pub flag_returns: i32,
    pub bc_kills: i32,
    pub dbs_kills: i32,
    pub dfa_kills: i32,
    pub overall_kills: i32,
    pub overall_deaths: i32,
    pub flaghold_time: i32,
    pub impact: Impact,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerLine {
    pub player_id: i64,
    pub player_name: String,
    pub stats: StatLine,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub match_id: i64,
    pub score_a: i32,
    pub score_b: i32,
    pub rows: Vec<PlayerLine>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub details: Vec<String>,
    pub missing_players: Vec<String>,
}

impl ValidationReport {
    fn is_empty(&self) -> bool {
        self.details.is_empty() && self.missing_players.is_empty()
    }

    fn missing(&mut self, name: &str) {
        if !self.missing_players.iter().any(|n| n == name) {
            self.missing_players.push(name.to_owned());
        }
    }
}

fn row_number(index: usize) -> usize {
    // Line 1 is the header.
    index + 2
}

/// Splits the upload into typed raw rows. Every problem found is reported, so
/// the caller gets the complete list in one round trip.
pub fn parse(content: &str) -> Result<Vec<RawStatsRow>, Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => return Err(vec![format!("Failed to read CSV header: {e}")]),
    };
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(vec![format!(
            "Missing required columns: {}",
            missing.join(", ")
        )]);
    }
    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for (i, record) in reader.deserialize::<RawStatsRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => errors.push(format!("Row {}: {e}", row_number(i))),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    if rows.is_empty() {
        return Err(vec!["CSV file contains no data rows".to_owned()]);
    }
    Ok(rows)
}

struct RowChecker<'a> {
    row: usize,
    details: &'a mut Vec<String>,
}

impl RowChecker<'_> {
    fn stat(&mut self, column: &str, value: &str) -> Option<i32> {
        let v = self.int::<i32>(column, value)?;
        if !(0..=MAX_STAT_VALUE).contains(&v) {
            self.details.push(format!(
                "Row {}: {column} must be between 0 and {MAX_STAT_VALUE}, got {v}",
                self.row
            ));
            return None;
        }
        Some(v)
    }

    fn int<T: std::str::FromStr>(&mut self, column: &str, value: &str) -> Option<T> {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.details.push(format!(
                    "Row {}: {column} must be an integer, got '{value}'",
                    self.row
                ));
                None
            }
        }
    }
}

/// Checks every row against the first row and against the roster. `players`
/// maps exact player names to ids.
pub fn validate(
    rows: &[RawStatsRow],
    players: &HashMap<String, i64>,
) -> Result<ValidatedUpload, ValidationReport> {
    let mut report = ValidationReport::default();
    let mut header: Option<(Option<i64>, Option<i32>, Option<i32>)> = None;
    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(rows.len());

    for (i, raw) in rows.iter().enumerate() {
        let row = row_number(i);
        let mut check = RowChecker {
            row,
            details: &mut report.details,
        };
        let match_id = check.int::<i64>("match_id", &raw.match_id);
        let score_a = check.stat("final_score_a", &raw.final_score_a);
        let score_b = check.stat("final_score_b", &raw.final_score_b);
        let flag_captures = check.stat("flag_captures", &raw.flag_captures);
        let flag_returns = check.stat("flag_returns", &raw.flag_returns);
        let bc_kills = check.stat("bc_kills", &raw.bc_kills);
        let dbs_kills = check.stat("dbs_kills", &raw.dbs_kills);
        let dfa_kills = check.stat("dfa_kills", &raw.dfa_kills);
        let overall_kills = check.stat("overall_kills", &raw.overall_kills);
        let overall_deaths = check.stat("overall_deaths", &raw.overall_deaths);
        let flaghold_time = check.stat("flaghold_time", &raw.flaghold_time);
        let impact = check.int::<i32>("impact", &raw.impact).and_then(|v| {
            let impact = Impact::new(v);
            if impact.is_none() {
                report
                    .details
                    .push(format!("Row {row}: impact must be 1, 2 or 3, got {v}"));
            }
            impact
        });

        match header {
            None => header = Some((match_id, score_a, score_b)),
            Some((first_match, first_a, first_b)) => {
                for (column, first, this) in [
                    ("match_id", first_match, match_id),
                    ("final_score_a", first_a.map(i64::from), score_a.map(i64::from)),
                    ("final_score_b", first_b.map(i64::from), score_b.map(i64::from)),
                ] {
                    if let (Some(first), Some(this)) = (first, this) {
                        if first != this {
                            report.details.push(format!(
                                "Row {row}: {column} {this} differs from {first} in row 2"
                            ));
                        }
                    }
                }
            }
        }

        let player_id = if raw.player_name.is_empty() {
            report
                .details
                .push(format!("Row {row}: player_name must not be empty"));
            None
        } else if !seen.insert(raw.player_name.as_str()) {
            report.details.push(format!(
                "Row {row}: player '{}' appears more than once",
                raw.player_name
            ));
            None
        } else {
            let id = players.get(&raw.player_name).copied();
            if id.is_none() {
                report.missing(&raw.player_name);
            }
            id
        };

        if let (
            Some(player_id),
            Some(flag_captures),
            Some(flag_returns),
            Some(bc_kills),
            Some(dbs_kills),
            Some(dfa_kills),
            Some(overall_kills),
            Some(overall_deaths),
            Some(flaghold_time),
            Some(impact),
        ) = (
            player_id,
            flag_captures,
            flag_returns,
            bc_kills,
            dbs_kills,
            dfa_kills,
            overall_kills,
            overall_deaths,
            flaghold_time,
            impact,
        ) {
            lines.push(PlayerLine {
                player_id,
                player_name: raw.player_name.clone(),
                stats: StatLine {
                    flag_captures,
                    flag_returns,
                    bc_kills,
                    dbs_kills,
                    dfa_kills,
                    overall_kills,
                    overall_deaths,
                    flaghold_time,
                    impact,
                },
            });
        }
    }

    match header {
        Some((Some(match_id), Some(score_a), Some(score_b))) if report.is_empty() => {
            Ok(ValidatedUpload {
                match_id,
                score_a,
                score_b,
                rows: lines,
            })
        }
        None => {
            report.details.push("No data rows".to_owned());
            Err(report)
        }
        _ => Err(report),
    }
}

#[derive(Debug)]
pub enum UploadError {
    Parse(Vec<String>),
    Invalid(ValidationReport),
}

pub fn parse_and_validate(
    content: &str,
    players: &HashMap<String, i64>,
) -> Result<ValidatedUpload, UploadError> {
    let rows = parse(content).map_err(UploadError::Parse)?;
    validate(&rows, players).map_err(UploadError::Invalid)
}

#[cfg(test)]
pub mod test {
    use super::*;

    pub const HEADER: &str = "match_id,player_name,final_score_a,final_score_b,flag_captures,flag_returns,bc_kills,dbs_kills,dfa_kills,overall_kills,overall_deaths,flaghold_time,impact";

    pub fn sheet(rows: &[&str]) -> String {
        let mut s = HEADER.to_owned();
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s.push('\n');
        s
    }

    fn roster() -> HashMap<String, i64> {
        [("Alice", 1), ("Bob", 2), ("Carol", 3)]
            .into_iter()
            .map(|(n, id)| (n.to_owned(), id))
            .collect()
    }

    #[test]
    fn test_valid_sheet() {
        let csv = sheet(&[
            "5, Alice ,7,3,2,1,4,3,2,9,4,120,3",
            "5,Bob,7,3,0,2,1,1,0,2,8,0,1",
        ]);
        let upload = parse_and_validate(&csv, &roster()).expect("Expected a valid upload");
        assert_eq!(upload.match_id, 5);
        assert_eq!((upload.score_a, upload.score_b), (7, 3));
        assert_eq!(upload.rows.len(), 2);
        assert_eq!(upload.rows[0].player_id, 1);
        assert_eq!(upload.rows[0].stats.impact.get(), 3);
        assert_eq!(upload.rows[0].stats.flaghold_time, 120);
        assert_eq!(upload.rows[1].stats.overall_deaths, 8);
    }

    #[test]
    fn test_missing_column() {
        let csv = "match_id,player_name,final_score_a\n5,Alice,7\n";
        let errors = parse(csv).expect_err("Expected a parse failure");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("final_score_b"));
        assert!(errors[0].contains("impact"));
    }

    #[test]
    fn test_no_data_rows() {
        let errors = parse(&sheet(&[])).expect_err("Expected a parse failure");
        assert_eq!(errors, vec!["CSV file contains no data rows".to_owned()]);
    }

    #[test]
    fn test_unequal_field_count() {
        let csv = sheet(&["5,Alice,7,3,2,1,4,3,2,9,4,120,3", "5,Bob,7,3"]);
        let errors = parse(&csv).expect_err("Expected a parse failure");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Row 3:"), "{errors:?}");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let csv = format!(
            "{HEADER}\n\n5,Alice,7,3,2,1,4,3,2,9,4,120,3\n\n5,Bob,7,3,0,2,1,1,0,2,8,0,1\n"
        );
        let rows = parse(&csv).expect("Expected rows");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_inconsistent_header_values() {
        let csv = sheet(&[
            "5,Alice,7,3,2,1,4,3,2,9,4,120,3",
            "6,Bob,7,4,0,2,1,1,0,2,8,0,1",
        ]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert_eq!(
            report.details,
            vec![
                "Row 3: match_id 6 differs from 5 in row 2".to_owned(),
                "Row 3: final_score_b 4 differs from 3 in row 2".to_owned(),
            ]
        );
        assert!(report.missing_players.is_empty());
    }

    #[test]
    fn test_numeric_equality_not_textual() {
        let csv = sheet(&[
            "5,Alice,7,3,2,1,4,3,2,9,4,120,3",
            "05,Bob,7,03,0,2,1,1,0,2,8,0,1",
        ]);
        assert!(parse_and_validate(&csv, &roster()).is_ok());
    }

    #[test]
    fn test_errors_accumulate() {
        let csv = sheet(&[
            "5,Alice,7,3,x,1,4,3,2,9,4,120,4",
            "5,Dave,7,3,0,2,1,y,0,2,8,0,1",
            "5,Eve,7,3,0,2,1,1,0,2,8,0,2",
            "5,Dave,7,3,0,2,1,1,0,2,8,0,2",
        ]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert_eq!(
            report.details,
            vec![
                "Row 2: flag_captures must be an integer, got 'x'".to_owned(),
                "Row 2: impact must be 1, 2 or 3, got 4".to_owned(),
                "Row 3: dbs_kills must be an integer, got 'y'".to_owned(),
                "Row 5: player 'Dave' appears more than once".to_owned(),
            ]
        );
        assert_eq!(report.missing_players, vec!["Dave".to_owned(), "Eve".to_owned()]);
    }

    #[test]
    fn test_missing_players_deduplicated() {
        let csv = sheet(&[
            "5,Zed,7,3,2,1,4,3,2,9,4,120,3",
            "5,Alice,7,3,0,2,1,1,0,2,8,0,1",
            "5,Yan,7,3,0,2,1,1,0,2,8,0,1",
        ]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert!(report.details.is_empty());
        assert_eq!(report.missing_players, vec!["Zed".to_owned(), "Yan".to_owned()]);
    }

    #[test]
    fn test_empty_player_name() {
        let csv = sheet(&["5,,7,3,2,1,4,3,2,9,4,120,3"]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert_eq!(report.details, vec!["Row 2: player_name must not be empty".to_owned()]);
    }

    #[test]
    fn test_stat_range() {
        let csv = sheet(&[
            "5,Alice,7,3,2,1,4,3,2,2147483647,4,120,3",
            "5,Bob,7,3,-1,2,1,1,0,2,8,1000000,1",
            "5,Carol,7,3,0,2,1,1,0,2,8,1000001,1",
        ]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert_eq!(
            report.details,
            vec![
                "Row 2: overall_kills must be between 0 and 1000000, got 2147483647".to_owned(),
                "Row 3: flag_captures must be between 0 and 1000000, got -1".to_owned(),
                "Row 4: flaghold_time must be between 0 and 1000000, got 1000001".to_owned(),
            ]
        );
    }

    #[test]
    fn test_negative_score_rejected() {
        let csv = sheet(&["5,Alice,-7,3,2,1,4,3,2,9,4,120,3"]);
        let report = validate(&parse(&csv).unwrap(), &roster()).expect_err("Expected failure");
        assert_eq!(
            report.details,
            vec!["Row 2: final_score_a must be between 0 and 1000000, got -7".to_owned()]
        );
    }

    #[test]
    fn test_impact_bounds() {
        assert!(Impact::new(0).is_none());
        assert_eq!(Impact::new(1).map(|i| i.get()), Some(1));
        assert_eq!(Impact::new(3).map(|i| i.get()), Some(3));
        assert!(Impact::new(4).is_none());
    }
}
