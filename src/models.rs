use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::normalize::normalize_name;

/// A row of the primary ("fighter info") table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterRecord {
    pub display_name: String,
    /// Birth date exactly as scraped; written back untouched.
    pub birth_date_raw: String,
    pub birth_date: Option<NaiveDate>,
    pub reach: Option<String>,
    pub stance: Option<String>,
    pub external_id: Option<String>,
    /// Profile columns the pipeline carries through (Nationality, Hometown,
    /// Association, Weight Class, Height, win/loss breakdowns, ...).
    #[serde(default)]
    pub extra_fields: HashMap<String, String>,
}

impl FighterRecord {
    pub fn is_matched(&self) -> bool {
        self.external_id.is_some()
    }
}

/// A row of the secondary (UFC-stats master) table. Read-only during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub display_name: String,
    pub normalized_key: String,
    pub birth_date: Option<NaiveDate>,
    pub reach: Option<String>,
    pub stance: Option<String>,
    pub source_url: String,
    /// `None` when the URL does not carry a `fighter-details/<id>` segment.
    pub external_id: Option<String>,
}

impl MasterRecord {
    pub fn new(
        display_name: &str,
        birth_date: Option<NaiveDate>,
        reach: Option<String>,
        stance: Option<String>,
        source_url: &str,
    ) -> Self {
        Self {
            display_name: display_name.to_string(),
            normalized_key: normalize_name(display_name),
            birth_date,
            reach,
            stance,
            source_url: source_url.to_string(),
            external_id: crate::normalize::extract_external_id(source_url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassName {
    ExactKey,
    Substring,
    Fuzzy,
    BirthDate,
    ManualOverride,
}

impl PassName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactKey => "exact_key",
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
            Self::BirthDate => "birth_date",
            Self::ManualOverride => "manual_override",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ExactKey => "Pass 1: Normalized name equality",
            Self::Substring => "Pass 2: Unique substring containment",
            Self::Fuzzy => "Pass 3: Fuzzy name similarity",
            Self::BirthDate => "Pass 4: Unique date of birth",
            Self::ManualOverride => "Manual overrides",
        }
    }
}

impl std::fmt::Display for PassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved identity, produced by a pass and applied by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub primary_index: usize,
    pub external_id: String,
    pub reach: Option<String>,
    pub stance: Option<String>,
    pub pass: PassName,
    pub original_name: String,
    pub matched_name: String,
    /// Similarity ratio; only the fuzzy pass scores.
    pub score: Option<f64>,
}

impl MatchResult {
    pub fn new(
        pass: PassName,
        primary_index: usize,
        fighter: &FighterRecord,
        master: &MasterRecord,
        external_id: &str,
    ) -> Self {
        Self {
            primary_index,
            external_id: external_id.to_string(),
            reach: master.reach.clone(),
            stance: master.stance.clone(),
            pass,
            original_name: fighter.display_name.clone(),
            matched_name: master.display_name.clone(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}
