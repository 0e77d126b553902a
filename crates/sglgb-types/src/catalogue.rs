//! Indicator catalogue: governance areas and their indicators
//!
//! The catalogue is read-only reference data. Activating a period copies the
//! current catalogue into each new assessment so later catalogue edits never
//! change an assessment in flight.

use crate::{GovernanceAreaId, IndicatorId, LifecycleError, LifecycleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Core areas must all pass; Essential areas are subject to a configured minimum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Core,
    Essential,
}

/// A single governance indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    /// Display code, e.g. "1.1.1"
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technical_notes: String,
    pub governance_area_id: GovernanceAreaId,
    /// Shown to BLGU users. Submission gating ignores it: every "yes"
    /// answer needs at least one MOV.
    #[serde(default = "default_true")]
    pub requires_evidence: bool,
}

fn default_true() -> bool {
    true
}

/// A thematic grouping of indicators
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceArea {
    pub id: GovernanceAreaId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: AreaKind,
    pub indicators: Vec<Indicator>,
}

impl GovernanceArea {
    pub fn is_core(&self) -> bool {
        self.kind == AreaKind::Core
    }
}

/// The full, validated set of governance areas
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GovernanceArea>", into = "Vec<GovernanceArea>")]
pub struct IndicatorCatalogue {
    areas: Vec<GovernanceArea>,
}

impl IndicatorCatalogue {
    /// Build a catalogue, rejecting duplicate ids, empty areas and indicators
    /// whose `governance_area_id` disagrees with the area that lists them.
    pub fn new(areas: Vec<GovernanceArea>) -> LifecycleResult<Self> {
        if areas.is_empty() {
            return Err(LifecycleError::InvalidCatalogue(
                "catalogue has no governance areas".into(),
            ));
        }

        let mut area_ids = HashSet::new();
        let mut indicator_ids = HashSet::new();
        for area in &areas {
            if !area_ids.insert(area.id.clone()) {
                return Err(LifecycleError::InvalidCatalogue(format!(
                    "duplicate governance area: {}",
                    area.id
                )));
            }
            if area.indicators.is_empty() {
                return Err(LifecycleError::InvalidCatalogue(format!(
                    "governance area {} has no indicators",
                    area.id
                )));
            }
            for indicator in &area.indicators {
                if indicator.governance_area_id != area.id {
                    return Err(LifecycleError::InvalidCatalogue(format!(
                        "indicator {} is listed under {} but belongs to {}",
                        indicator.id, area.id, indicator.governance_area_id
                    )));
                }
                if !indicator_ids.insert(indicator.id.clone()) {
                    return Err(LifecycleError::InvalidCatalogue(format!(
                        "duplicate indicator: {}",
                        indicator.id
                    )));
                }
            }
        }

        Ok(Self { areas })
    }

    pub fn areas(&self) -> &[GovernanceArea] {
        &self.areas
    }

    pub fn area(&self, id: &GovernanceAreaId) -> Option<&GovernanceArea> {
        self.areas.iter().find(|a| &a.id == id)
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.areas.iter().flat_map(|a| a.indicators.iter())
    }

    pub fn indicator(&self, id: &IndicatorId) -> Option<&Indicator> {
        self.indicators().find(|i| &i.id == id)
    }

    pub fn indicator_count(&self) -> usize {
        self.areas.iter().map(|a| a.indicators.len()).sum()
    }

    /// The six SGLGB governance areas, three Core and three Essential,
    /// with one starter indicator each (two for Financial Administration).
    pub fn builtin() -> Self {
        fn indicator(area: &str, id: &str, code: &str, name: &str, description: &str, notes: &str) -> Indicator {
            Indicator {
                id: IndicatorId::new(id),
                code: code.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                technical_notes: notes.to_string(),
                governance_area_id: GovernanceAreaId::new(area),
                requires_evidence: true,
            }
        }

        fn area(id: &str, code: &str, name: &str, description: &str, kind: AreaKind, indicators: Vec<Indicator>) -> GovernanceArea {
            GovernanceArea {
                id: GovernanceAreaId::new(id),
                code: code.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                kind,
                indicators,
            }
        }

        let areas = vec![
            area(
                "financial-admin",
                "FA",
                "Financial Administration and Sustainability",
                "Financial management and sustainability practices",
                AreaKind::Core,
                vec![
                    indicator(
                        "financial-admin",
                        "fa-1",
                        "1.1.1",
                        "Structure: Organized BADAC",
                        "The barangay has an organized Barangay Anti-Drug Abuse Council (BADAC) with proper documentation.",
                        "BADAC must be established through a barangay resolution and have regular meetings documented.",
                    ),
                    indicator(
                        "financial-admin",
                        "fa-2",
                        "1.1.2",
                        "Budget Planning and Execution",
                        "The barangay has a comprehensive budget plan that is properly executed and monitored.",
                        "Budget documents must include detailed breakdown of income and expenditures with proper accounting.",
                    ),
                ],
            ),
            area(
                "disaster-preparedness",
                "DP",
                "Disaster Preparedness",
                "Disaster risk reduction and management capabilities",
                AreaKind::Core,
                vec![indicator(
                    "disaster-preparedness",
                    "dp-1",
                    "2.1.1",
                    "Disaster Risk Reduction Plan",
                    "The barangay has a comprehensive disaster risk reduction and management plan.",
                    "Plan must be approved by the Sangguniang Barangay and include evacuation procedures.",
                )],
            ),
            area(
                "peace-order",
                "PO",
                "Safety, Peace and Order",
                "Public safety and peace maintenance",
                AreaKind::Core,
                vec![indicator(
                    "peace-order",
                    "po-1",
                    "3.1.1",
                    "Peace and Order Committee",
                    "The barangay has an active peace and order committee with regular activities.",
                    "Committee must have documented meetings and community engagement activities.",
                )],
            ),
            area(
                "social-protection",
                "SP",
                "Social Protection and Sensitivity",
                "Social welfare and community sensitivity programs",
                AreaKind::Essential,
                vec![indicator(
                    "social-protection",
                    "sp-1",
                    "4.1.1",
                    "Social Welfare Programs",
                    "The barangay implements social welfare programs for vulnerable sectors.",
                    "Programs must be documented with beneficiary lists and impact assessments.",
                )],
            ),
            area(
                "business-friendliness",
                "BF",
                "Business-Friendliness and Competitiveness",
                "Support for local business development",
                AreaKind::Essential,
                vec![indicator(
                    "business-friendliness",
                    "bf-1",
                    "5.1.1",
                    "Business Support Services",
                    "The barangay provides support services for local businesses and entrepreneurs.",
                    "Services must be documented and accessible to all business owners in the barangay.",
                )],
            ),
            area(
                "environmental-management",
                "EM",
                "Environmental Management",
                "Environmental protection and sustainability",
                AreaKind::Essential,
                vec![indicator(
                    "environmental-management",
                    "em-1",
                    "6.1.1",
                    "Environmental Programs",
                    "The barangay implements environmental protection and sustainability programs.",
                    "Programs must include waste management, tree planting, or similar environmental initiatives.",
                )],
            ),
        ];

        Self { areas }
    }
}

impl TryFrom<Vec<GovernanceArea>> for IndicatorCatalogue {
    type Error = LifecycleError;

    fn try_from(areas: Vec<GovernanceArea>) -> Result<Self, Self::Error> {
        Self::new(areas)
    }
}

impl From<IndicatorCatalogue> for Vec<GovernanceArea> {
    fn from(catalogue: IndicatorCatalogue) -> Self {
        catalogue.areas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_is_valid() {
        let builtin = IndicatorCatalogue::builtin();
        let rebuilt = IndicatorCatalogue::new(builtin.areas().to_vec()).unwrap();
        assert_eq!(rebuilt.areas().len(), 6);
        assert_eq!(rebuilt.indicator_count(), 7);
        assert_eq!(rebuilt.areas().iter().filter(|a| a.is_core()).count(), 3);
    }

    #[test]
    fn test_duplicate_indicator_rejected() {
        let mut areas = IndicatorCatalogue::builtin().areas().to_vec();
        let dup = areas[0].indicators[0].clone();
        areas[0].indicators.push(dup);
        assert!(matches!(
            IndicatorCatalogue::new(areas),
            Err(LifecycleError::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn test_misfiled_indicator_rejected() {
        let mut areas = IndicatorCatalogue::builtin().areas().to_vec();
        areas[1].indicators[0].governance_area_id = GovernanceAreaId::new("financial-admin");
        assert!(IndicatorCatalogue::new(areas).is_err());
    }

    #[test]
    fn test_catalogue_deserialization_validates() {
        let json = r#"[{"id":"a","code":"A","name":"Area","kind":"core","indicators":[]}]"#;
        assert!(serde_json::from_str::<IndicatorCatalogue>(json).is_err());

        let json = r#"[{"id":"a","code":"A","name":"Area","kind":"essential","indicators":[
            {"id":"a-1","code":"1","name":"One","governance_area_id":"a"}]}]"#;
        let catalogue: IndicatorCatalogue = serde_json::from_str(json).unwrap();
        let indicator = catalogue.indicator(&IndicatorId::new("a-1")).unwrap();
        assert!(indicator.requires_evidence);
    }
}
