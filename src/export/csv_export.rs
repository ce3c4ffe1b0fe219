use anyhow::Result;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::PrimaryColumns;
use crate::models::{FighterRecord, MatchResult};
use crate::table::SourceTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    BirthDate,
    Reach,
    Stance,
    ExternalId,
    Extra,
}

fn same_column(header: &str, column: &str) -> bool {
    header.trim().eq_ignore_ascii_case(column.trim())
}

fn field_layout(headers: &[String], cols: &PrimaryColumns) -> Vec<Field> {
    headers
        .iter()
        .map(|h| {
            if same_column(h, &cols.name) {
                Field::Name
            } else if same_column(h, &cols.birth_date) {
                Field::BirthDate
            } else if same_column(h, &cols.reach) {
                Field::Reach
            } else if same_column(h, &cols.stance) {
                Field::Stance
            } else if same_column(h, &cols.external_id) {
                Field::ExternalId
            } else {
                Field::Extra
            }
        })
        .collect()
}

/// Write the primary table back with its original column order. Absent
/// values become empty cells.
pub fn write_primary_table(
    table: &SourceTable<FighterRecord>,
    cols: &PrimaryColumns,
    path: &Path,
) -> Result<()> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(256 * 1024, file);
    write_primary_to(table, cols, buf_writer)
}

pub fn write_primary_to<W: Write>(
    table: &SourceTable<FighterRecord>,
    cols: &PrimaryColumns,
    out: W,
) -> Result<()> {
    let mut w = WriterBuilder::new().from_writer(out);
    let layout = field_layout(table.headers(), cols);
    w.write_record(table.headers())?;
    for row in table.iter() {
        let record: Vec<&str> = table
            .headers()
            .iter()
            .zip(&layout)
            .map(|(h, field)| match field {
                Field::Name => row.display_name.as_str(),
                Field::BirthDate => row.birth_date_raw.as_str(),
                Field::Reach => row.reach.as_deref().unwrap_or(""),
                Field::Stance => row.stance.as_deref().unwrap_or(""),
                Field::ExternalId => row.external_id.as_deref().unwrap_or(""),
                Field::Extra => row.extra_fields.get(h).map(String::as_str).unwrap_or(""),
            })
            .collect();
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Audit export of every match a run made, one row per assignment.
pub fn export_audit_csv<'a, I>(results: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a MatchResult>,
{
    let file = File::create(path)?;
    let mut w = WriterBuilder::new().from_writer(BufWriter::new(file));
    write_audit(&mut w, results)?;
    w.flush()?;
    Ok(())
}

fn write_audit<'a, W, I>(w: &mut Writer<W>, results: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a MatchResult>,
{
    w.write_record([
        "Pass",
        "Row",
        "Original_Name",
        "Matched_Name",
        "Assigned_ID",
        "Score",
    ])?;
    for r in results {
        let row = (r.primary_index + 1).to_string();
        let score = r.score.map(|s| format!("{:.4}", s)).unwrap_or_default();
        w.write_record([
            r.pass.as_str(),
            row.as_str(),
            r.original_name.as_str(),
            r.matched_name.as_str(),
            r.external_id.as_str(),
            score.as_str(),
        ])?;
    }
    Ok(())
}
