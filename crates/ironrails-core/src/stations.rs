use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::components::Inventory;

/// Position on the map grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssociationId(pub usize);

/// What an industry or house block does with resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssociationKind {
    HouseBlock {
        consumable: Vec<String>,
        produced: Vec<String>,
    },
    PrimaryIndustry {
        produced: Vec<String>,
    },
    TransformingIndustry {
        primary_resources: Vec<String>,
        transformed: Vec<String>,
    },
    MixedIndustry {
        produced: Vec<String>,
        exported: Vec<String>,
        primary_resources: Vec<String>,
        transformed: Vec<String>,
    },
}

/// A scenario instance of an industry or house block served by stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub id: AssociationId,
    pub name: String,
    /// Catalog template this instance was spawned from
    pub template: String,
    pub position: Position,
    pub inventory: Inventory,
    pub kind: AssociationKind,
}

impl AssociationKind {
    /// Rank when several associations at a station take the same delivery, lowest first.
    pub fn unload_priority(&self) -> u8 {
        match self {
            AssociationKind::HouseBlock { .. } => 0,
            AssociationKind::TransformingIndustry { .. } => 1,
            AssociationKind::MixedIndustry { .. } => 2,
            AssociationKind::PrimaryIndustry { .. } => 3,
        }
    }

    /// Resource types a train may unload here.
    pub fn needed_resource_types(&self) -> Vec<String> {
        match self {
            AssociationKind::HouseBlock { consumable, .. } => consumable.clone(),
            AssociationKind::PrimaryIndustry { .. } => Vec::new(),
            AssociationKind::TransformingIndustry { primary_resources, .. } => {
                primary_resources.clone()
            }
            AssociationKind::MixedIndustry {
                exported,
                primary_resources,
                ..
            } => merge(exported, primary_resources),
        }
    }

    /// Resource types generated or transformed here.
    pub fn produced_resource_types(&self) -> Vec<String> {
        match self {
            AssociationKind::HouseBlock { produced, .. }
            | AssociationKind::PrimaryIndustry { produced } => produced.clone(),
            AssociationKind::TransformingIndustry { transformed, .. } => transformed.clone(),
            AssociationKind::MixedIndustry {
                produced,
                transformed,
                ..
            } => merge(produced, transformed),
        }
    }

    /// Primary (generated from nothing) resource types.
    pub fn generated_resource_types(&self) -> &[String] {
        match self {
            AssociationKind::HouseBlock { produced, .. }
            | AssociationKind::PrimaryIndustry { produced }
            | AssociationKind::MixedIndustry { produced, .. } => produced,
            AssociationKind::TransformingIndustry { .. } => &[],
        }
    }

    pub fn transformed_resource_types(&self) -> &[String] {
        match self {
            AssociationKind::TransformingIndustry { transformed, .. }
            | AssociationKind::MixedIndustry { transformed, .. } => transformed,
            _ => &[],
        }
    }

    /// Resource types that leave the economy here (consumed or exported).
    pub fn exported_resource_types(&self) -> &[String] {
        match self {
            AssociationKind::HouseBlock { consumable, .. } => consumable,
            AssociationKind::MixedIndustry { exported, .. } => exported,
            _ => &[],
        }
    }
}

impl Association {
    pub fn needed_resource_types(&self) -> Vec<String> {
        self.kind.needed_resource_types()
    }

    pub fn produced_resource_types(&self) -> Vec<String> {
        self.kind.produced_resource_types()
    }

    pub fn generated_resource_types(&self) -> &[String] {
        self.kind.generated_resource_types()
    }

    pub fn transformed_resource_types(&self) -> &[String] {
        self.kind.transformed_resource_types()
    }

    pub fn exported_resource_types(&self) -> &[String] {
        self.kind.exported_resource_types()
    }

    pub fn needs(&self, resource_type: &str) -> bool {
        self.needed_resource_types().iter().any(|t| t == resource_type)
    }
}

fn merge(a: &[String], b: &[String]) -> Vec<String> {
    let mut merged = a.to_vec();
    for item in b {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Per-station price multiplier for one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub resource_type: String,
    pub booster: f64,
}

impl Demand {
    pub fn new(resource_type: &str, booster: f64) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            booster,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub position: Position,
    pub catchment_radius: f32,
    /// Associations served by this station, in id order
    pub associations: Vec<AssociationId>,
    pub demand_list: Vec<Demand>,
    pub requested_resources: Vec<String>,
}

impl Station {
    pub fn new(id: StationId, name: &str, position: Position, catchment_radius: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            catchment_radius,
            associations: Vec::new(),
            demand_list: Vec::new(),
            requested_resources: Vec::new(),
        }
    }

    /// Re-resolves which associations lie inside the catchment radius.
    pub fn assign_generation_posts(&mut self, associations: &BTreeMap<AssociationId, Association>) {
        let served: Vec<AssociationId> = associations
            .values()
            .filter(|a| self.position.distance_to(&a.position) <= self.catchment_radius)
            .map(|a| a.id)
            .collect();

        if served != self.associations {
            log::debug!(
                "Station {} now serves {} association(s)",
                self.name,
                served.len()
            );
            self.associations = served;
        }
    }

    /// Recomputes the resource types this station asks trains to bring.
    pub fn refresh_requested_resources(&mut self, associations: &BTreeMap<AssociationId, Association>) {
        let requested: BTreeSet<String> = self
            .associations
            .iter()
            .filter_map(|id| associations.get(id))
            .flat_map(|a| a.needed_resource_types())
            .collect();
        self.requested_resources = requested.into_iter().collect();
    }

    /// Price booster for `resource_type`, 1.0 when the station has no demand entry.
    pub fn booster_for(&self, resource_type: &str) -> f64 {
        self.demand_list
            .iter()
            .find(|d| d.resource_type == resource_type)
            .map(|d| d.booster)
            .unwrap_or(1.0)
    }

    pub fn set_demand(&mut self, resource_type: &str, booster: f64) {
        match self
            .demand_list
            .iter_mut()
            .find(|d| d.resource_type == resource_type)
        {
            Some(demand) => demand.booster = booster,
            None => self.demand_list.push(Demand::new(resource_type, booster)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn association(id: usize, x: i32, kind: AssociationKind) -> Association {
        Association {
            id: AssociationId(id),
            name: format!("assoc-{id}"),
            template: "test".to_string(),
            position: Position::new(x, 0),
            inventory: Inventory::new(100),
            kind,
        }
    }

    fn sample() -> BTreeMap<AssociationId, Association> {
        let mut map = BTreeMap::new();
        map.insert(
            AssociationId(0),
            association(
                0,
                1,
                AssociationKind::HouseBlock {
                    consumable: vec!["goods".to_string()],
                    produced: vec!["passengers".to_string()],
                },
            ),
        );
        map.insert(
            AssociationId(1),
            association(
                1,
                2,
                AssociationKind::MixedIndustry {
                    produced: vec!["coal".to_string()],
                    exported: vec!["passengers".to_string()],
                    primary_resources: vec!["iron_ore".to_string(), "coal".to_string()],
                    transformed: vec!["steel".to_string()],
                },
            ),
        );
        map.insert(
            AssociationId(2),
            association(
                2,
                50,
                AssociationKind::PrimaryIndustry {
                    produced: vec!["wood".to_string()],
                },
            ),
        );
        map
    }

    #[test]
    fn test_capabilities_by_kind() {
        let associations = sample();
        let mixed = &associations[&AssociationId(1)];
        assert_eq!(
            mixed.needed_resource_types(),
            vec!["passengers", "iron_ore", "coal"]
        );
        assert_eq!(mixed.produced_resource_types(), vec!["coal", "steel"]);
        assert!(associations[&AssociationId(2)].needed_resource_types().is_empty());
        assert!(associations[&AssociationId(0)].needs("goods"));
    }

    #[test]
    fn test_unload_priority_by_kind() {
        let associations = sample();
        let house = associations[&AssociationId(0)].kind.unload_priority();
        let mixed = associations[&AssociationId(1)].kind.unload_priority();
        let transforming = AssociationKind::TransformingIndustry {
            primary_resources: Vec::new(),
            transformed: Vec::new(),
        }
        .unload_priority();
        assert!(house < transforming && transforming < mixed);
    }

    #[test]
    fn test_assign_generation_posts_uses_radius() {
        let associations = sample();
        let mut station = Station::new(StationId(0), "Central", Position::new(0, 0), 5.0);

        station.assign_generation_posts(&associations);
        assert_eq!(station.associations, vec![AssociationId(0), AssociationId(1)]);

        // Idempotent
        station.assign_generation_posts(&associations);
        assert_eq!(station.associations.len(), 2);
    }

    #[test]
    fn test_requested_resources_are_deduplicated() {
        let associations = sample();
        let mut station = Station::new(StationId(0), "Central", Position::new(0, 0), 5.0);
        station.assign_generation_posts(&associations);
        station.refresh_requested_resources(&associations);
        assert_eq!(
            station.requested_resources,
            vec!["coal", "goods", "iron_ore", "passengers"]
        );
    }

    #[test]
    fn test_booster_defaults_to_one() {
        let mut station = Station::new(StationId(0), "Central", Position::new(0, 0), 5.0);
        assert_eq!(station.booster_for("coal"), 1.0);
        station.set_demand("coal", 1.5);
        station.set_demand("coal", 2.0);
        assert_eq!(station.booster_for("coal"), 2.0);
        assert_eq!(station.demand_list.len(), 1);
    }
}
