use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::{Carriage, FuelType, Locomotive, ResourceType};
use crate::error::{SimError, SimResult};
use crate::stations::AssociationKind;

/// Static game catalog loaded from data files. Never mutated by the engine.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub resources: BTreeMap<String, ResourceType>,
    pub industries: BTreeMap<String, IndustryTemplate>,
    pub locomotives: BTreeMap<String, Locomotive>,
    pub carriages: BTreeMap<String, Carriage>,
    pub history: Vec<HistoricalEntry>,
    pub simulation: SimulationSettings,
}

/// Blueprint that scenario associations are spawned from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub name: String,
    pub inventory_capacity: u32,
    pub kind: AssociationKind,
}

/// Dated flavor message shown once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEntry {
    pub title: String,
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub start_year: u32,
    pub start_money: i64,
    /// Seed for flavor text selection
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            start_year: 1830,
            start_money: 50_000,
            seed: 1830,
        }
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
            industries: BTreeMap::new(),
            locomotives: BTreeMap::new(),
            carriages: BTreeMap::new(),
            history: Vec::new(),
            simulation: SimulationSettings::default(),
        }
    }

    pub fn resource_type(&self, name: &str) -> SimResult<&ResourceType> {
        self.resources
            .get(name)
            .ok_or_else(|| SimError::UnknownResourceType(name.to_string()))
    }

    pub fn template(&self, name: &str) -> SimResult<&IndustryTemplate> {
        self.industries
            .get(name)
            .ok_or_else(|| SimError::UnknownTemplate(name.to_string()))
    }

    pub fn add_resource(&mut self, resource: ResourceType) {
        self.resources.insert(resource.name.clone(), resource);
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Catalog {
    fn default() -> Self {
        let mut catalog = Self::empty();

        // Default resources
        catalog.add_resource(ResourceType::primary("passengers", 12, 7));
        catalog.add_resource(ResourceType::primary("mail", 4, 7));
        catalog.add_resource(ResourceType::primary("coal", 20, 5));
        catalog.add_resource(ResourceType::primary("iron_ore", 15, 5));
        catalog.add_resource(ResourceType::primary("wood", 18, 4));
        catalog.add_resource(ResourceType::transformed("steel", &["iron_ore", "coal"], 10, 6));
        catalog.add_resource(ResourceType::transformed("lumber", &["wood"], 12, 3));
        catalog.add_resource(ResourceType::transformed("goods", &["steel", "lumber"], 8, 10));

        // Default industries
        let industries = [
            IndustryTemplate {
                name: "Coal mine".to_string(),
                inventory_capacity: 200,
                kind: AssociationKind::PrimaryIndustry {
                    produced: strings(&["coal"]),
                },
            },
            IndustryTemplate {
                name: "Iron mine".to_string(),
                inventory_capacity: 200,
                kind: AssociationKind::PrimaryIndustry {
                    produced: strings(&["iron_ore"]),
                },
            },
            IndustryTemplate {
                name: "Forest".to_string(),
                inventory_capacity: 150,
                kind: AssociationKind::PrimaryIndustry {
                    produced: strings(&["wood"]),
                },
            },
            IndustryTemplate {
                name: "Steel mill".to_string(),
                inventory_capacity: 300,
                kind: AssociationKind::TransformingIndustry {
                    primary_resources: strings(&["iron_ore", "coal"]),
                    transformed: strings(&["steel"]),
                },
            },
            IndustryTemplate {
                name: "Sawmill".to_string(),
                inventory_capacity: 150,
                kind: AssociationKind::TransformingIndustry {
                    primary_resources: strings(&["wood"]),
                    transformed: strings(&["lumber"]),
                },
            },
            IndustryTemplate {
                name: "Factory".to_string(),
                inventory_capacity: 300,
                kind: AssociationKind::MixedIndustry {
                    produced: Vec::new(),
                    exported: strings(&["coal"]),
                    primary_resources: strings(&["steel", "lumber"]),
                    transformed: strings(&["goods"]),
                },
            },
            IndustryTemplate {
                name: "Town block".to_string(),
                inventory_capacity: 120,
                kind: AssociationKind::HouseBlock {
                    consumable: strings(&["goods", "mail", "passengers"]),
                    produced: strings(&["passengers", "mail"]),
                },
            },
        ];
        let ids = [
            "coal_mine",
            "iron_mine",
            "forest",
            "steel_mill",
            "sawmill",
            "factory",
            "town_block",
        ];
        for (id, template) in ids.into_iter().zip(industries) {
            catalog.industries.insert(id.to_string(), template);
        }

        // Default rolling stock
        for locomotive in [
            Locomotive {
                name: "Rocket".to_string(),
                fuel_type: FuelType::Steam,
                acceleration: 8.0,
                top_speed: 40.0,
                price: 8_000,
                start_year: 1830,
            },
            Locomotive {
                name: "Class 08".to_string(),
                fuel_type: FuelType::Diesel,
                acceleration: 12.0,
                top_speed: 60.0,
                price: 25_000,
                start_year: 1953,
            },
            Locomotive {
                name: "Electra".to_string(),
                fuel_type: FuelType::Electricity,
                acceleration: 20.0,
                top_speed: 120.0,
                price: 60_000,
                start_year: 1960,
            },
        ] {
            catalog.locomotives.insert(locomotive.name.clone(), locomotive);
        }

        for carriage in [
            Carriage {
                name: "Open wagon".to_string(),
                capacity: 20,
                price: 500,
                start_year: 1830,
            },
            Carriage {
                name: "Hopper".to_string(),
                capacity: 40,
                price: 1_200,
                start_year: 1870,
            },
            Carriage {
                name: "Container flat".to_string(),
                capacity: 60,
                price: 3_000,
                start_year: 1960,
            },
        ] {
            catalog.carriages.insert(carriage.name.clone(), carriage);
        }

        catalog.history = vec![
            HistoricalEntry {
                title: "Liverpool and Manchester".to_string(),
                year: 1830,
                month: 9,
                day: 15,
                message: "The first inter-city passenger line opens between Liverpool and Manchester."
                    .to_string(),
            },
            HistoricalEntry {
                title: "Underground".to_string(),
                year: 1863,
                month: 1,
                day: 10,
                message: "The Metropolitan Railway carries its first passengers beneath London."
                    .to_string(),
            },
            HistoricalEntry {
                title: "Golden spike".to_string(),
                year: 1869,
                month: 5,
                day: 10,
                message: "A golden spike joins the rails of a transcontinental line.".to_string(),
            },
        ];

        catalog
    }
}
