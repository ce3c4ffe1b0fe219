use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Column names of the primary ("fighter info") table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct PrimaryColumns {
    pub name: String,
    pub birth_date: String,
    pub reach: String,
    pub stance: String,
    pub external_id: String,
}

impl Default for PrimaryColumns {
    fn default() -> Self {
        Self {
            name: "Fighter".into(),
            birth_date: "Birth Date".into(),
            reach: "Reach".into(),
            stance: "Stance".into(),
            external_id: "Fighter_ID_UFCStats".into(),
        }
    }
}

/// Column names of the secondary (UFC-stats master) table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct SecondaryColumns {
    pub name: String,
    pub birth_date: String,
    pub reach: String,
    pub stance: String,
    pub url: String,
}

impl Default for SecondaryColumns {
    fn default() -> Self {
        Self {
            name: "FIGHTER".into(),
            birth_date: "DOB".into(),
            reach: "REACH".into(),
            stance: "STANCE".into(),
            url: "URL".into(),
        }
    }
}

/// Hand-verified pairing of a scraped name with a master-table name.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ManualOverride {
    pub scraped_name: String,
    pub master_name: String,
}

/// A fuzzy pairing found to be wrong on audit: the fighter with this
/// normalized key must never receive this external id from the fuzzy pass.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FuzzyExclusion {
    pub normalized_key: String,
    pub external_id: String,
}

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

const DEFAULT_OVERRIDES: [(&str, &str); 18] = [
    ("Steve Erceg", "Stephen Erceg"),
    ("Ateba Abega Gautier", "Ateba Gautier"),
    ("Mick Parkin", "Michael Parkin"),
    ("Kangjie Zhu", "Zhu Kangjie"),
    ("Jingliang Li", "Li Jingliang"),
    ("Shuai Yin", "Shuai Yin"),
    ("Yunfeng Li", "Li Yunfeng"),
    ("Kait Blink' Kara-France", "Kai Kara-France"),
    ("Yana Santos", "Yana Kunitskaya"),
    ("Rayanne dos Santos", "Rayanne Amanda"),
    ("Josefine Lindgren Knutsson", "Josefine Knutsson"),
    ("Niushiyue Ji", "Ji Niushiyue"),
    ("Nathan Maness", "Nate Maness"),
    ("Abusupiyan Magomedov", "Abus Magomedov"),
    ("Kaiwen Li", "Li Kaiwen"),
    ("Valentine Woodburn", "Val Woodburn"),
    ("Jiahefu Wuziazibieke", "Wuziazibieke Jiahefu"),
    ("KyleArce Knight' Daukaus", "Kyle Daukaus"),
];

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ReconcileConfig {
    pub primary_columns: PrimaryColumns,
    pub secondary_columns: SecondaryColumns,
    /// Inclusive lower bound on the normalized Levenshtein ratio.
    pub fuzzy_threshold: f64,
    pub fuzzy_exclusions: Vec<FuzzyExclusion>,
    pub manual_overrides: Vec<ManualOverride>,
    /// Drop exact duplicate rows of the primary table on load.
    pub clean_primary: bool,
    /// Append empty reach/stance/id columns when the primary table lacks them.
    pub add_missing_columns: bool,
    /// Written by `propagate` for values the source table does not have.
    pub propagate_placeholder: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            primary_columns: PrimaryColumns::default(),
            secondary_columns: SecondaryColumns::default(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_exclusions: vec![FuzzyExclusion {
                normalized_key: "yana santos".into(),
                external_id: "5078e1dacf9d25f4".into(),
            }],
            manual_overrides: DEFAULT_OVERRIDES
                .iter()
                .map(|(s, m)| ManualOverride {
                    scraped_name: s.to_string(),
                    master_name: m.to_string(),
                })
                .collect(),
            clean_primary: true,
            add_missing_columns: false,
            propagate_placeholder: "-".into(),
        }
    }
}

impl ReconcileConfig {
    /// Load a JSON config file; fields it omits keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "fuzzy_threshold",
                reason: format!("{} is outside (0, 1]", self.fuzzy_threshold),
            });
        }
        for o in &self.manual_overrides {
            if o.scraped_name.trim().is_empty() || o.master_name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "manual_overrides",
                    reason: format!("empty name in pair {:?} -> {:?}", o.scraped_name, o.master_name),
                });
            }
        }
        for e in &self.fuzzy_exclusions {
            if e.external_id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "fuzzy_exclusions",
                    reason: format!("empty external id for key {:?}", e.normalized_key),
                });
            }
        }
        let cols = [
            &self.primary_columns.name,
            &self.primary_columns.birth_date,
            &self.primary_columns.reach,
            &self.primary_columns.stance,
            &self.primary_columns.external_id,
            &self.secondary_columns.name,
            &self.secondary_columns.birth_date,
            &self.secondary_columns.reach,
            &self.secondary_columns.stance,
            &self.secondary_columns.url,
        ];
        if cols.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "columns",
                reason: "column names must not be empty".into(),
            });
        }
        if self.propagate_placeholder.trim() == "--" {
            return Err(ConfigError::InvalidValue {
                field: "propagate_placeholder",
                reason: "\"--\" is reserved as the master-table sentinel".into(),
            });
        }
        Ok(())
    }
}
