//! Coverage of the enrichment columns after a run.

use log::info;

use crate::models::FighterRecord;
use crate::table::SourceTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub rows: usize,
    pub reach: usize,
    pub stance: usize,
    pub external_id: usize,
}

impl Coverage {
    pub fn of(table: &SourceTable<FighterRecord>) -> Self {
        table.iter().fold(
            Self {
                rows: table.len(),
                ..Default::default()
            },
            |mut c, r| {
                c.reach += usize::from(r.reach.is_some());
                c.stance += usize::from(r.stance.is_some());
                c.external_id += usize::from(r.external_id.is_some());
                c
            },
        )
    }

    pub fn log(&self, label: &str) {
        info!(
            "{} - Reach merged: {}, missing: {}",
            label,
            self.reach,
            self.rows - self.reach
        );
        info!(
            "{} - Stance merged: {}, missing: {}",
            label,
            self.stance,
            self.rows - self.stance
        );
        info!(
            "{} - External id merged: {}, missing: {}",
            label,
            self.external_id,
            self.rows - self.external_id
        );
    }

    pub fn write_to<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "Coverage ({} rows)", self.rows)?;
        for (name, n) in [
            ("Reach", self.reach),
            ("Stance", self.stance),
            ("External id", self.external_id),
        ] {
            writeln!(w, "  {:<12} merged {:>6}  missing {:>6}", name, n, self.rows - n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_present_values() {
        let rows = vec![
            FighterRecord {
                display_name: "A".into(),
                reach: Some("70\"".into()),
                external_id: Some("a".into()),
                ..Default::default()
            },
            FighterRecord {
                display_name: "B".into(),
                stance: Some("Southpaw".into()),
                ..Default::default()
            },
        ];
        let t = SourceTable::new("primary", vec![], rows);
        assert_eq!(
            Coverage::of(&t),
            Coverage {
                rows: 2,
                reach: 1,
                stance: 1,
                external_id: 1
            }
        );
    }
}
