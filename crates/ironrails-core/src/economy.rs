use std::collections::{BTreeMap, BTreeSet};

use crate::components::{FuelType, Resource};
use crate::config::Catalog;
use crate::stations::Station;

/// Price of one delivered unit before the station's demand booster
pub const BASE_UNIT_PRICE: f64 = 1.0;

impl FuelType {
    /// Cost per distance unit in tenths of a coin
    fn tenths_per_km(&self) -> u64 {
        match self {
            FuelType::Electricity => 1,
            FuelType::Diesel => 2,
            FuelType::Steam => 4,
        }
    }

    pub fn cost_per_km(&self) -> f64 {
        self.tenths_per_km() as f64 / 10.0
    }
}

/// Fuel spent covering `distance`, rounded down.
pub fn fuel_cost(fuel_type: FuelType, distance: u64) -> i64 {
    (distance.saturating_mul(fuel_type.tenths_per_km()) / 10) as i64
}

/// Income for delivering one resource at `station`.
pub fn delivery_revenue(resource: &Resource, station: &Station) -> i64 {
    let booster = station.booster_for(&resource.resource_type);
    (resource.quantity as f64 * BASE_UNIT_PRICE * booster).round() as i64
}

pub fn revenue(unloaded: &[Resource], station: &Station) -> i64 {
    unloaded.iter().map(|r| delivery_revenue(r, station)).sum()
}

/// Inspects the catalog's transformation graph
pub struct CatalogAnalyzer<'a> {
    catalog: &'a Catalog,
}

#[derive(Debug, Default)]
pub struct CatalogAnalysis {
    /// Transformed resource -> its inputs
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Resource types made from nothing
    pub sources: Vec<String>,
    /// Resource types no transformation consumes
    pub sinks: Vec<String>,
    /// Inputs referenced but absent from the catalog
    pub unknown_inputs: Vec<String>,
    pub cycles: Vec<Vec<String>>,
}

impl CatalogAnalysis {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.cycles.is_empty() && self.unknown_inputs.is_empty()
    }
}

impl<'a> CatalogAnalyzer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn analyze(&self) -> CatalogAnalysis {
        let mut analysis = CatalogAnalysis::default();

        for resource in self.catalog.resources.values() {
            let inputs: BTreeSet<String> = resource.inputs().iter().cloned().collect();
            if inputs.is_empty() {
                analysis.sources.push(resource.name.clone());
            } else {
                for input in &inputs {
                    if !self.catalog.resources.contains_key(input)
                        && !analysis.unknown_inputs.contains(input)
                    {
                        analysis.unknown_inputs.push(input.clone());
                    }
                }
                analysis.dependencies.insert(resource.name.clone(), inputs);
            }
        }

        let consumed: BTreeSet<&String> = analysis.dependencies.values().flatten().collect();
        analysis.sinks = self
            .catalog
            .resources
            .keys()
            .filter(|name| !consumed.contains(name))
            .cloned()
            .collect();

        analysis.cycles = detect_cycles(&analysis.dependencies);
        analysis
    }
}

fn detect_cycles(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut visited = BTreeSet::new();

    for resource in dependencies.keys() {
        if !visited.contains(resource) {
            let mut path = Vec::new();
            dfs_cycle_detection(resource, dependencies, &mut visited, &mut path, &mut cycles);
        }
    }

    cycles
}

fn dfs_cycle_detection(
    resource: &str,
    dependencies: &BTreeMap<String, BTreeSet<String>>,
    visited: &mut BTreeSet<String>,
    path: &mut Vec<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(resource.to_string());
    path.push(resource.to_string());

    if let Some(inputs) = dependencies.get(resource) {
        for input in inputs {
            if let Some(cycle_start) = path.iter().position(|r| r == input) {
                cycles.push(path[cycle_start..].to_vec());
            } else if !visited.contains(input) {
                dfs_cycle_detection(input, dependencies, visited, path, cycles);
            }
        }
    }

    path.pop();
}
