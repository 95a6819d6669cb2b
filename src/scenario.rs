//! What-if editing of building emissions
//!
//! A `Scenario` owns a copy of the editable building fields (category,
//! emissions, green roof). Edits are applied in batches over a selection of
//! building positions and never touch the authoritative `BuildingSet`.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::estimate::{BuildingSet, EmissionFactors, UsageTier};

/// Emission reduction per unit of proportional area for a green roof
pub const GREEN_ROOF_REDUCTION: f64 = 0.0035;

/// How reassignment recomputes emissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReassignPolicy {
    /// proportional_area × coefficient, without the load-time age adjustment
    #[default]
    OmitAgeAdjustment,
    /// Same formula as the load-time estimate
    ReapplyAgeAdjustment,
}

/// Green-roof state of a building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreenRoof {
    #[default]
    Off,
    On,
}

impl GreenRoof {
    pub fn is_on(self) -> bool {
        self == GreenRoof::On
    }

    /// Next state and the emission change per unit of proportional area.
    /// Requests that don't change state are no-ops.
    fn transition(self, apply: bool) -> (GreenRoof, f64) {
        match (self, apply) {
            (GreenRoof::Off, true) => (GreenRoof::On, -GREEN_ROOF_REDUCTION),
            (GreenRoof::On, false) => (GreenRoof::Off, GREEN_ROOF_REDUCTION),
            (state, _) => (state, 0.0),
        }
    }
}

impl From<bool> for GreenRoof {
    fn from(on: bool) -> Self {
        if on {
            GreenRoof::On
        } else {
            GreenRoof::Off
        }
    }
}

/// Editable copy of one building
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableBuilding {
    pub index: usize,
    pub category: String,
    pub proportional_area: f64,
    pub age_adjustment: f64,
    pub emissions: f64,
    pub green_roof: GreenRoof,
}

/// Number of buildings per usage tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    #[serde(rename = "Green Usage")]
    pub green: usize,
    #[serde(rename = "Red Usage")]
    pub red: usize,
    #[serde(rename = "Black Usage")]
    pub black: usize,
}

impl TierCounts {
    pub fn from_emissions(values: impl IntoIterator<Item = f64>) -> Self {
        let mut counts = Self::default();
        for value in values {
            match UsageTier::classify(value) {
                UsageTier::Green => counts.green += 1,
                UsageTier::Red => counts.red += 1,
                UsageTier::Black => counts.black += 1,
            }
        }
        counts
    }

    pub fn get(&self, tier: UsageTier) -> usize {
        match tier {
            UsageTier::Green => self.green,
            UsageTier::Red => self.red,
            UsageTier::Black => self.black,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.red + self.black
    }
}

/// Totals after a batch of edits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub total_emissions: f64,
    pub tier_counts: TierCounts,
}

impl ScenarioSummary {
    /// Display text for the running total
    pub fn total_label(&self) -> String {
        format!("Total Carbon Emissions: {:.2} units", self.total_emissions)
    }
}

/// One batch edit, as read from an edit script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioEdit {
    Reassign { category: String, selection: Vec<usize> },
    GreenRoof { apply: bool, selection: Vec<usize> },
}

/// Read a JSON array of edits
pub fn read_edit_script(path: &Path) -> Result<Vec<ScenarioEdit>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read: {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse edit script: {:?}", path))
}

/// Interactive editing session over a copy of the buildings
#[derive(Debug, Clone)]
pub struct Scenario {
    records: Vec<EditableBuilding>,
    factors: EmissionFactors,
    policy: ReassignPolicy,
}

impl Scenario {
    pub fn new(set: &BuildingSet, policy: ReassignPolicy) -> Self {
        let records = set
            .buildings
            .iter()
            .map(|b| EditableBuilding {
                index: b.index,
                category: b.category.clone(),
                proportional_area: b.proportional_area,
                age_adjustment: b.age_adjustment,
                emissions: b.emissions,
                green_roof: GreenRoof::from(b.green_roof),
            })
            .collect();

        Self {
            records,
            factors: set.factors.clone(),
            policy,
        }
    }

    pub fn records(&self) -> &[EditableBuilding] {
        &self.records
    }

    pub fn policy(&self) -> ReassignPolicy {
        self.policy
    }

    /// Move the selected buildings to a new usage category
    pub fn reassign(&mut self, selection: &[usize], category: &str) -> Result<ScenarioSummary> {
        self.check_selection(selection)?;
        let coefficient = self.factors.coefficient(category);

        for &pos in selection {
            let record = &mut self.records[pos];
            let mut emissions = record.proportional_area * coefficient;
            if self.policy == ReassignPolicy::ReapplyAgeAdjustment {
                emissions *= 1.0 + record.age_adjustment;
            }
            if record.green_roof.is_on() {
                emissions -= GREEN_ROOF_REDUCTION * record.proportional_area;
            }

            record.category = category.to_string();
            record.emissions = emissions;
        }

        Ok(self.summary())
    }

    /// Apply (`true`) or remove (`false`) a green roof on the selected buildings
    pub fn set_green_roof(&mut self, selection: &[usize], apply: bool) -> Result<ScenarioSummary> {
        self.check_selection(selection)?;

        for &pos in selection {
            let record = &mut self.records[pos];
            let (next, rate) = record.green_roof.transition(apply);
            record.emissions += rate * record.proportional_area;
            record.green_roof = next;
        }

        Ok(self.summary())
    }

    pub fn apply(&mut self, edit: &ScenarioEdit) -> Result<ScenarioSummary> {
        match edit {
            ScenarioEdit::Reassign { category, selection } => self.reassign(selection, category),
            ScenarioEdit::GreenRoof { apply, selection } => self.set_green_roof(selection, *apply),
        }
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            total_emissions: self.records.iter().map(|r| r.emissions).sum(),
            tier_counts: TierCounts::from_emissions(self.records.iter().map(|r| r.emissions)),
        }
    }

    fn check_selection(&self, selection: &[usize]) -> Result<()> {
        if let Some(&bad) = selection.iter().find(|&&pos| pos >= self.records.len()) {
            bail!(
                "Selection index {} is out of range ({} buildings)",
                bad,
                self.records.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::{assign_emissions, RawBuilding};

    fn building_set() -> BuildingSet {
        let raw = |category: &str, area: f64, above: f64, date: &str| RawBuilding {
            category: Some(category.to_string()),
            gross_area: area,
            floors_above: above,
            construction_date: Some(date.to_string()),
            ..Default::default()
        };
        assign_emissions(
            vec![
                raw("공동주택", 100.0, 3.0, "2015-01-01"),
                raw("의료시설", 500.0, 5.0, "1995-01-01"),
                raw("종교시설", 50.0, 1.0, "2005-01-01"),
            ],
            EmissionFactors::standard(),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_initial_summary_matches_load() {
        let set = building_set();
        let scenario = Scenario::new(&set, ReassignPolicy::default());
        let summary = scenario.summary();

        assert!(close(summary.total_emissions, set.total_emissions()));
        assert_eq!(summary.tier_counts.total(), 3);
        assert_eq!(summary.tier_counts.green, 2);
        assert_eq!(summary.tier_counts.black, 1);
    }

    #[test]
    fn test_reassign_omits_age_adjustment() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::OmitAgeAdjustment);
        scenario.reassign(&[0], "업무시설").unwrap();

        let r = &scenario.records()[0];
        assert_eq!(r.category, "업무시설");
        assert!(close(r.emissions, 300.0 * 0.060));
    }

    #[test]
    fn test_reassign_reapplies_age_adjustment() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::ReapplyAgeAdjustment);
        scenario.reassign(&[0], "업무시설").unwrap();
        assert!(close(scenario.records()[0].emissions, 300.0 * 0.060 * 1.005));

        // reassigning to the original category restores the load-time value
        scenario.reassign(&[1], "의료시설").unwrap();
        assert!(close(scenario.records()[1].emissions, set.buildings[1].emissions));
    }

    #[test]
    fn test_reassign_unknown_category_uses_default() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        scenario.reassign(&[2], "ZZZ").unwrap();
        assert!(close(scenario.records()[2].emissions, 50.0 * 0.080));
    }

    #[test]
    fn test_green_roof_round_trip() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        let before = scenario.records()[1].emissions;

        scenario.set_green_roof(&[1], true).unwrap();
        let r = &scenario.records()[1];
        assert_eq!(r.green_roof, GreenRoof::On);
        assert!(close(r.emissions, before - 0.0035 * 2500.0));

        scenario.set_green_roof(&[1], false).unwrap();
        let r = &scenario.records()[1];
        assert_eq!(r.green_roof, GreenRoof::Off);
        assert!(close(r.emissions, before));
    }

    #[test]
    fn test_green_roof_double_apply_is_noop() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());

        scenario.set_green_roof(&[0, 0], true).unwrap();
        let once = scenario.records()[0].emissions;
        scenario.set_green_roof(&[0], true).unwrap();
        assert_eq!(scenario.records()[0].emissions, once);
        assert!(close(once, set.buildings[0].emissions - 0.0035 * 300.0));

        // removing from a building without a green roof changes nothing
        let untouched = scenario.records()[2].emissions;
        scenario.set_green_roof(&[2], false).unwrap();
        assert_eq!(scenario.records()[2].emissions, untouched);
    }

    #[test]
    fn test_reassign_keeps_green_roof_reduction() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        scenario.set_green_roof(&[0], true).unwrap();
        scenario.reassign(&[0], "공장").unwrap();

        let r = &scenario.records()[0];
        assert_eq!(r.green_roof, GreenRoof::On);
        assert!(close(r.emissions, 300.0 * 0.065 - 0.0035 * 300.0));
    }

    #[test]
    fn test_summary_after_batch() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        let summary = scenario.reassign(&[1], "종교시설").unwrap();

        // 2500 × 0.032 = 80 moves the hospital into the green tier
        assert_eq!(summary.tier_counts.green, 3);
        assert_eq!(summary.tier_counts.black, 0);
        let expected: f64 = scenario.records().iter().map(|r| r.emissions).sum();
        assert!(close(summary.total_emissions, expected));
        assert!(summary.total_label().starts_with("Total Carbon Emissions: "));

        let per_tier: usize = UsageTier::ALL.iter().map(|t| summary.tier_counts.get(*t)).sum();
        assert_eq!(per_tier, summary.tier_counts.total());
        assert_eq!(summary.tier_counts.get(UsageTier::Green), 3);
    }

    #[test]
    fn test_out_of_range_selection_mutates_nothing() {
        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        let err = scenario.reassign(&[0, 9], "공장").unwrap_err();

        assert!(err.to_string().contains("out of range"));
        assert_eq!(scenario.records()[0].category, "공동주택");
        assert!(scenario.set_green_roof(&[3], true).is_err());
    }

    #[test]
    fn test_authoritative_set_untouched() {
        let set = building_set();
        let original = set.buildings.clone();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        scenario.reassign(&[0, 1, 2], "공장").unwrap();
        scenario.set_green_roof(&[0, 1], true).unwrap();

        assert_eq!(set.buildings, original);
    }

    #[test]
    fn test_edit_script_format() {
        let edits: Vec<ScenarioEdit> = serde_json::from_str(
            r#"[
                {"action": "reassign", "category": "공장", "selection": [0, 2]},
                {"action": "green_roof", "apply": true, "selection": [1]}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            edits[1],
            ScenarioEdit::GreenRoof {
                apply: true,
                selection: vec![1]
            }
        );

        let set = building_set();
        let mut scenario = Scenario::new(&set, ReassignPolicy::default());
        for edit in &edits {
            scenario.apply(edit).unwrap();
        }
        assert_eq!(scenario.records()[2].category, "공장");
        assert!(scenario.records()[1].green_roof.is_on());
    }
}
