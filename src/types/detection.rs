//! Smell catalogue and detection labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::analyzer;

/// Level at which a smell is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Package,
    Class,
}

/// Which analyzer table carries the ground-truth verdicts for a smell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerTable {
    Architecture,
    Design,
}

impl AnalyzerTable {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Architecture => analyzer::ARCHITECTURE_SMELLS_FILE,
            Self::Design => analyzer::DESIGN_SMELLS_FILE,
        }
    }
}

/// The four architectural smells under evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SmellKind {
    #[serde(rename = "god_component")]
    GodComponent,
    #[serde(rename = "insufficient_modularization")]
    InsufficientModularization,
    #[serde(rename = "unstable_dependency")]
    UnstableDependency,
    #[serde(rename = "hublike_modularization")]
    HubLikeModularization,
}

impl SmellKind {
    pub const ALL: [SmellKind; 4] = [
        Self::GodComponent,
        Self::InsufficientModularization,
        Self::UnstableDependency,
        Self::HubLikeModularization,
    ];

    /// Directory and file-name slug
    pub fn slug(&self) -> &'static str {
        match self {
            Self::GodComponent => "god_component",
            Self::InsufficientModularization => "insufficient_modularization",
            Self::UnstableDependency => "unstable_dependency",
            Self::HubLikeModularization => "hublike_modularization",
        }
    }

    /// Name as it appears in prompts and in the analyzer's smell tables
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GodComponent => "God Component",
            Self::InsufficientModularization => "Insufficient Modularization",
            Self::UnstableDependency => "Unstable Dependency",
            Self::HubLikeModularization => "Hub-like Modularization",
        }
    }

    pub fn definition(&self) -> &'static str {
        match self {
            Self::GodComponent => {
                "This smell arises when a component is excessively large either in terms of \
                 lines of code or number of classes."
            }
            Self::InsufficientModularization => {
                "This smell arises when an abstraction exists that has not been completely \
                 decomposed, and a further decomposition could reduce its size, implementation \
                 complexity, or both."
            }
            Self::UnstableDependency => {
                "This smell arises when a component depends on other components that are less \
                 stable than itself."
            }
            Self::HubLikeModularization => {
                "This smell arises when an abstraction has dependencies (both incoming and \
                 outgoing) with a large number of other abstractions."
            }
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::GodComponent | Self::UnstableDependency => Granularity::Package,
            Self::InsufficientModularization | Self::HubLikeModularization => Granularity::Class,
        }
    }

    pub fn analyzer_table(&self) -> AnalyzerTable {
        match self.granularity() {
            Granularity::Package => AnalyzerTable::Architecture,
            Granularity::Class => AnalyzerTable::Design,
        }
    }

    /// Prompt template file name
    pub fn template_file(&self) -> String {
        format!("detection_{}.tpl", self.slug())
    }
}

impl fmt::Display for SmellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for SmellKind {
    type Err = String;

    /// Accepts slugs, display names and compact spellings (`godcomponent`, `hub-like`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match compact.as_str() {
            "godcomponent" | "gc" => Ok(Self::GodComponent),
            "insufficientmodularization" | "im" => Ok(Self::InsufficientModularization),
            "unstabledependency" | "ud" => Ok(Self::UnstableDependency),
            "hublikemodularization" | "hl" => Ok(Self::HubLikeModularization),
            _ => Err(format!("Unknown smell: {}", s)),
        }
    }
}

/// One label: was this entity flagged for the smell?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Package name or `package.class`
    #[serde(alias = "package")]
    pub identifier: String,
    #[serde(default)]
    pub detection: bool,
    /// Advisory only, never used in scoring
    #[serde(default)]
    pub justification: Option<String>,
}

impl DetectionRecord {
    pub fn new(identifier: impl Into<String>, detection: bool) -> Self {
        Self {
            identifier: identifier.into(),
            detection,
            justification: None,
        }
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smell_from_str() {
        assert_eq!(
            "God Component".parse::<SmellKind>().unwrap(),
            SmellKind::GodComponent
        );
        assert_eq!(
            "hublike_modularization".parse::<SmellKind>().unwrap(),
            SmellKind::HubLikeModularization
        );
        assert_eq!(
            "Hub-like Modularization".parse::<SmellKind>().unwrap(),
            SmellKind::HubLikeModularization
        );
        assert_eq!("ud".parse::<SmellKind>().unwrap(), SmellKind::UnstableDependency);
        assert!("cyclic".parse::<SmellKind>().is_err());
    }

    #[test]
    fn test_slug_round_trips_through_from_str() {
        for smell in SmellKind::ALL {
            assert_eq!(smell.slug().parse::<SmellKind>().unwrap(), smell);
            assert_eq!(smell.display_name().parse::<SmellKind>().unwrap(), smell);
        }
    }

    #[test]
    fn test_smell_routing() {
        assert_eq!(SmellKind::GodComponent.granularity(), Granularity::Package);
        assert_eq!(
            SmellKind::UnstableDependency.analyzer_table(),
            AnalyzerTable::Architecture
        );
        assert_eq!(
            SmellKind::HubLikeModularization.analyzer_table().file_name(),
            "DesignSmells.csv"
        );
        assert_eq!(
            SmellKind::InsufficientModularization.template_file(),
            "detection_insufficient_modularization.tpl"
        );
    }

    #[test]
    fn test_detection_record_accepts_package_key() {
        let record: DetectionRecord =
            serde_json::from_str(r#"{"package": "org.demo", "detection": true}"#).unwrap();
        assert_eq!(record.identifier, "org.demo");
        assert!(record.detection);
        assert!(record.justification.is_none());
    }

    #[test]
    fn test_detection_record_serialized_keys() {
        let record = DetectionRecord::new("a.X", false).with_justification("small class");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["identifier"], "a.X");
        assert_eq!(json["detection"], false);
        assert_eq!(json["justification"], "small class");
    }
}
