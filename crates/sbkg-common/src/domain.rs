//! Closed vocabularies shared by every stage: entity types and relation
//! predicates. Kept in one place so NER, RE, Resolver, Aligner, and
//! GraphLoader can't drift on spelling or serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Gene,
    Protein,
    Disease,
    Chemical,
    Stressor,
    Phenotype,
    Organism,
    CellType,
    Intervention,
}

impl EntityType {
    pub fn all() -> [EntityType; 9] {
        [
            EntityType::Gene,
            EntityType::Protein,
            EntityType::Disease,
            EntityType::Chemical,
            EntityType::Stressor,
            EntityType::Phenotype,
            EntityType::Organism,
            EntityType::CellType,
            EntityType::Intervention,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Gene => "GENE",
            EntityType::Protein => "PROTEIN",
            EntityType::Disease => "DISEASE",
            EntityType::Chemical => "CHEMICAL",
            EntityType::Stressor => "STRESSOR",
            EntityType::Phenotype => "PHENOTYPE",
            EntityType::Organism => "ORGANISM",
            EntityType::CellType => "CELL_TYPE",
            EntityType::Intervention => "INTERVENTION",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GENE" => Ok(EntityType::Gene),
            "PROTEIN" => Ok(EntityType::Protein),
            "DISEASE" => Ok(EntityType::Disease),
            "CHEMICAL" => Ok(EntityType::Chemical),
            "STRESSOR" => Ok(EntityType::Stressor),
            "PHENOTYPE" => Ok(EntityType::Phenotype),
            "ORGANISM" => Ok(EntityType::Organism),
            "CELL_TYPE" | "CELLTYPE" => Ok(EntityType::CellType),
            "INTERVENTION" => Ok(EntityType::Intervention),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    Upregulates,
    Downregulates,
    Causes,
    Treats,
    Prevents,
    InteractsWith,
    PartOf,
    AssociatedWith,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Predicate::Upregulates => "UPREGULATES",
            Predicate::Downregulates => "DOWNREGULATES",
            Predicate::Causes => "CAUSES",
            Predicate::Treats => "TREATS",
            Predicate::Prevents => "PREVENTS",
            Predicate::InteractsWith => "INTERACTS_WITH",
            Predicate::PartOf => "PART_OF",
            Predicate::AssociatedWith => "ASSOCIATED_WITH",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Predicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UPREGULATES" => Ok(Predicate::Upregulates),
            "DOWNREGULATES" => Ok(Predicate::Downregulates),
            "CAUSES" => Ok(Predicate::Causes),
            "TREATS" => Ok(Predicate::Treats),
            "PREVENTS" => Ok(Predicate::Prevents),
            "INTERACTS_WITH" => Ok(Predicate::InteractsWith),
            "PART_OF" => Ok(Predicate::PartOf),
            "ASSOCIATED_WITH" => Ok(Predicate::AssociatedWith),
            other => Err(format!("unknown predicate: {other}")),
        }
    }
}

/// Casing- and whitespace-canonical key used as an entity's stable
/// identifier (§4.4 step 4, GLOSSARY "Canonical name (normalized)").
/// Lowercases, collapses internal whitespace, ASCII-folds everything except
/// Greek letters and hyphens.
pub fn normalize_key(surface: &str) -> String {
    let collapsed = surface.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else if is_greek(c) {
                c
            } else {
                c.to_lowercase().next().unwrap_or(c)
            }
        })
        .collect()
}

fn is_greek(c: char) -> bool {
    ('\u{0370}'..='\u{03FF}').contains(&c) || ('\u{1F00}'..='\u{1FFF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_roundtrip() {
        for et in EntityType::all() {
            assert_eq!(et.to_string().parse::<EntityType>().unwrap(), et);
        }
    }

    #[test]
    fn normalize_key_collapses_and_lowercases() {
        assert_eq!(normalize_key("  MYOD1   gene "), "myod1 gene");
    }

    #[test]
    fn normalize_key_keeps_greek() {
        assert_eq!(normalize_key("TNF-\u{3b1}"), "tnf-\u{3b1}");
    }
}
