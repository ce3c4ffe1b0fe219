use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{SourceTable, find_column, require_column};
use crate::config::{PrimaryColumns, SecondaryColumns};
use crate::error::ReconcileError;
use crate::models::{FighterRecord, MasterRecord};
use crate::normalize::{clean_attribute, parse_birth_date};

pub const PRIMARY: &str = "primary";
pub const SECONDARY: &str = "secondary";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryLoadOptions {
    /// Drop rows identical to an earlier row in every column.
    pub drop_duplicates: bool,
    /// Append absent reach/stance/id columns instead of failing.
    pub add_missing_columns: bool,
}

fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn headers_of<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<String>, ReconcileError> {
    Ok(rdr.headers()?.iter().map(|h| h.to_string()).collect())
}

fn cell<'r>(rec: &'r csv::StringRecord, idx: usize) -> &'r str {
    rec.get(idx).unwrap_or("")
}

pub fn load_primary(
    path: &Path,
    cols: &PrimaryColumns,
    opts: PrimaryLoadOptions,
) -> Result<SourceTable<FighterRecord>, ReconcileError> {
    let file = File::open(path)?;
    let table = read_primary(BufReader::new(file), cols, opts)?;
    info!("Loaded {} fighter rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn read_primary<R: Read>(
    rdr: R,
    cols: &PrimaryColumns,
    opts: PrimaryLoadOptions,
) -> Result<SourceTable<FighterRecord>, ReconcileError> {
    let mut rdr = reader(rdr);
    let mut headers = headers_of(&mut rdr)?;
    let name_idx = require_column(&headers, PRIMARY, &cols.name)?;
    let birth_idx = require_column(&headers, PRIMARY, &cols.birth_date)?;

    let mut enrichment = Vec::with_capacity(3);
    for column in [&cols.reach, &cols.stance, &cols.external_id] {
        let idx = match find_column(&headers, column) {
            Some(i) => i,
            None if opts.add_missing_columns => {
                info!("Primary table has no '{}' column; adding it", column);
                headers.push(column.clone());
                headers.len() - 1
            }
            None => {
                return Err(ReconcileError::MalformedInput {
                    table: PRIMARY.to_string(),
                    column: column.clone(),
                });
            }
        };
        enrichment.push(idx);
    }
    let (reach_idx, stance_idx, id_idx) = (enrichment[0], enrichment[1], enrichment[2]);
    let typed: HashSet<usize> = [name_idx, birth_idx, reach_idx, stance_idx, id_idx].into();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut dropped = 0usize;
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if opts.drop_duplicates {
            let sig: Vec<String> = rec.iter().map(str::to_string).collect();
            if !seen.insert(sig) {
                dropped += 1;
                continue;
            }
        }
        let birth_date_raw = cell(&rec, birth_idx).to_string();
        let mut extra_fields = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            if !typed.contains(&i) {
                extra_fields.insert(h.clone(), cell(&rec, i).to_string());
            }
        }
        rows.push(FighterRecord {
            display_name: cell(&rec, name_idx).to_string(),
            birth_date: parse_birth_date(&birth_date_raw),
            birth_date_raw,
            reach: clean_attribute(cell(&rec, reach_idx)),
            stance: clean_attribute(cell(&rec, stance_idx)),
            external_id: clean_attribute(cell(&rec, id_idx)),
            extra_fields,
        });
    }
    if dropped > 0 {
        info!("Dropped {} duplicate rows from the primary table", dropped);
    }
    Ok(SourceTable::new(PRIMARY, headers, rows))
}

pub fn load_secondary(
    path: &Path,
    cols: &SecondaryColumns,
) -> Result<SourceTable<MasterRecord>, ReconcileError> {
    let file = File::open(path)?;
    let table = read_secondary(BufReader::new(file), cols)?;
    info!("Loaded {} master rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn read_secondary<R: Read>(
    rdr: R,
    cols: &SecondaryColumns,
) -> Result<SourceTable<MasterRecord>, ReconcileError> {
    let mut rdr = reader(rdr);
    let headers = headers_of(&mut rdr)?;
    let name_idx = require_column(&headers, SECONDARY, &cols.name)?;
    let birth_idx = require_column(&headers, SECONDARY, &cols.birth_date)?;
    let reach_idx = require_column(&headers, SECONDARY, &cols.reach)?;
    let stance_idx = require_column(&headers, SECONDARY, &cols.stance)?;
    let url_idx = require_column(&headers, SECONDARY, &cols.url)?;

    let mut rows = Vec::new();
    let mut without_id = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        let m = MasterRecord::new(
            cell(&rec, name_idx),
            parse_birth_date(cell(&rec, birth_idx)),
            clean_attribute(cell(&rec, reach_idx)),
            clean_attribute(cell(&rec, stance_idx)),
            cell(&rec, url_idx),
        );
        if m.external_id.is_none() {
            without_id += 1;
        }
        rows.push(m);
    }
    if without_id > 0 {
        warn!(
            "{} master rows have no fighter-details id in their URL and cannot be matched",
            without_id
        );
    }
    Ok(SourceTable::new(SECONDARY, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PRIMARY_CSV: &str = "\
Fighter,Nickname,Birth Date,Nationality,Reach,Stance,Fighter_ID_UFCStats
 Jon Jones ,Bones,1987-07-19,United States,--,,
Jon Jones,Bones,1987-07-19,United States,--,,
B.J. Penn,The Prodigy,-,United States,70,Orthodox,abc123
";

    const MASTER_CSV: &str = "\
FIGHTER,HEIGHT,REACH,STANCE,DOB,URL
Jon Jones,\"6' 4\"\"\",\"84\"\"\",Orthodox,\"Jul 19, 1987\",http://ufcstats.com/fighter-details/07f72a2a7591b409
Nobody,--,--,--,--,http://ufcstats.com/broken
";

    #[test]
    fn primary_rows_parse_and_dedupe() {
        let opts = PrimaryLoadOptions {
            drop_duplicates: true,
            add_missing_columns: false,
        };
        let t = read_primary(PRIMARY_CSV.as_bytes(), &PrimaryColumns::default(), opts).unwrap();
        assert_eq!(t.len(), 2);
        let jon = &t.rows()[0];
        assert_eq!(jon.display_name, "Jon Jones");
        assert_eq!(jon.birth_date, NaiveDate::from_ymd_opt(1987, 7, 19));
        assert_eq!(jon.reach, None);
        assert_eq!(jon.external_id, None);
        assert_eq!(jon.extra_fields.get("Nickname").map(String::as_str), Some("Bones"));
        let bj = &t.rows()[1];
        assert_eq!(bj.birth_date, None);
        assert_eq!(bj.external_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn duplicates_kept_without_cleaning() {
        let t = read_primary(
            PRIMARY_CSV.as_bytes(),
            &PrimaryColumns::default(),
            PrimaryLoadOptions::default(),
        )
        .unwrap();
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn missing_primary_column_is_malformed() {
        let csv = "Fighter,Birth Date,Reach,Stance\nA,-,,\n";
        let err = read_primary(csv.as_bytes(), &PrimaryColumns::default(), PrimaryLoadOptions::default())
            .unwrap_err();
        match err {
            ReconcileError::MalformedInput { table, column } => {
                assert_eq!(table, "primary");
                assert_eq!(column, "Fighter_ID_UFCStats");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_enrichment_columns_can_be_added() {
        let csv = "Fighter,Birth Date\nA,-\n";
        let opts = PrimaryLoadOptions {
            drop_duplicates: false,
            add_missing_columns: true,
        };
        let t = read_primary(csv.as_bytes(), &PrimaryColumns::default(), opts).unwrap();
        assert_eq!(t.headers().len(), 5);
        assert_eq!(t.headers()[4], "Fighter_ID_UFCStats");
        assert_eq!(t.rows()[0].external_id, None);
    }

    #[test]
    fn secondary_rows_parse_sentinels_and_ids() {
        let t = read_secondary(MASTER_CSV.as_bytes(), &SecondaryColumns::default()).unwrap();
        assert_eq!(t.len(), 2);
        let jon = &t.rows()[0];
        assert_eq!(jon.normalized_key, "jon jones");
        assert_eq!(jon.reach.as_deref(), Some("84\""));
        assert_eq!(jon.birth_date, NaiveDate::from_ymd_opt(1987, 7, 19));
        assert_eq!(jon.external_id.as_deref(), Some("07f72a2a7591b409"));
        let nobody = &t.rows()[1];
        assert_eq!(nobody.reach, None);
        assert_eq!(nobody.stance, None);
        assert_eq!(nobody.external_id, None);
    }

    #[test]
    fn missing_secondary_column_is_malformed() {
        let csv = "FIGHTER,DOB,REACH,STANCE\nA,--,--,--\n";
        assert!(matches!(
            read_secondary(csv.as_bytes(), &SecondaryColumns::default()),
            Err(ReconcileError::MalformedInput { .. })
        ));
    }
}
