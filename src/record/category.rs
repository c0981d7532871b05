/// Directory category definitions
///
/// A category names one listing page of the directory. Its label is used
/// verbatim in the configuration, the database and every export.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of personnel categories published by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Full-time faculty; the only category whose profile pages carry rich sections
    Regular,

    Adjunct,

    #[serde(rename = "International Adjunct")]
    InternationalAdjunct,

    #[serde(rename = "Professor of Practice")]
    ProfessorOfPractice,

    Distinguished,
}

impl Default for Category {
    fn default() -> Self {
        Self::Regular
    }
}

impl Category {
    /// Returns the human-readable label used in config, storage and exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Adjunct => "Adjunct",
            Self::InternationalAdjunct => "International Adjunct",
            Self::ProfessorOfPractice => "Professor of Practice",
            Self::Distinguished => "Distinguished",
        }
    }

    /// Parses a category from its label
    ///
    /// Returns None if the label doesn't match any known category.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Regular" => Some(Self::Regular),
            "Adjunct" => Some(Self::Adjunct),
            "International Adjunct" => Some(Self::InternationalAdjunct),
            "Professor of Practice" => Some(Self::ProfessorOfPractice),
            "Distinguished" => Some(Self::Distinguished),
            _ => None,
        }
    }

    /// Returns all categories in directory order
    pub fn all() -> [Self; 5] {
        [
            Self::Regular,
            Self::Adjunct,
            Self::InternationalAdjunct,
            Self::ProfessorOfPractice,
            Self::Distinguished,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown category '{}'", s))
    }
}
