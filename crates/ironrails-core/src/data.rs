use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::calendar::TimeDate;
use crate::components::{Carriage, Locomotive, ResourceType};
use crate::config::{Catalog, HistoricalEntry, IndustryTemplate, SimulationSettings};
use crate::economy::CatalogAnalyzer;

pub const RESOURCES_FILE: &str = "resources.toml";
pub const INDUSTRIES_FILE: &str = "industries.toml";
pub const LOCOMOTIVES_FILE: &str = "locomotives.toml";
pub const CARRIAGES_FILE: &str = "carriages.toml";
pub const HISTORY_FILE: &str = "history.toml";
pub const SIMULATION_FILE: &str = "simulation.toml";

/// `history.toml` layout: a list of `[[events]]` tables
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryFile {
    pub events: Vec<HistoricalEntry>,
}

/// Data loader for game catalog files
pub struct DataLoader {
    catalog: Catalog,
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::default(),
        }
    }

    /// Load all data from a directory. Missing files keep the built-in entries.
    pub fn load_from_directory<P: AsRef<Path>>(data_dir: P) -> Result<Catalog> {
        let mut loader = Self::new();
        let data_path = data_dir.as_ref();

        if !data_path.is_dir() {
            return Err(anyhow::anyhow!(
                "Data directory {} does not exist",
                data_path.display()
            ));
        }

        if let Some(resources) = read_file::<BTreeMap<String, ResourceType>>(data_path, RESOURCES_FILE)? {
            loader.load_resources(resources)?;
        }
        if let Some(industries) = read_file::<BTreeMap<String, IndustryTemplate>>(data_path, INDUSTRIES_FILE)? {
            loader.load_industries(industries)?;
        }
        if let Some(locomotives) = read_file::<BTreeMap<String, Locomotive>>(data_path, LOCOMOTIVES_FILE)? {
            loader.load_locomotives(locomotives)?;
        }
        if let Some(carriages) = read_file::<BTreeMap<String, Carriage>>(data_path, CARRIAGES_FILE)? {
            loader.load_carriages(carriages)?;
        }
        if let Some(history) = read_file::<HistoryFile>(data_path, HISTORY_FILE)? {
            loader.load_history(history)?;
        }
        if let Some(settings) = read_file::<SimulationSettings>(data_path, SIMULATION_FILE)? {
            validate_settings(&settings)?;
            loader.catalog.simulation = settings;
            log::info!("Loaded simulation settings");
        }

        loader.validate_references()?;
        Ok(loader.catalog)
    }

    fn load_resources(&mut self, resources: BTreeMap<String, ResourceType>) -> Result<()> {
        for (id, resource) in &resources {
            validate_resource(id, resource)?;
        }
        self.catalog.resources = resources;

        log::info!("Loaded {} resource types", self.catalog.resources.len());
        Ok(())
    }

    fn load_industries(&mut self, industries: BTreeMap<String, IndustryTemplate>) -> Result<()> {
        for (id, industry) in &industries {
            if industry.name.is_empty() {
                return Err(anyhow::anyhow!("Industry {} has an empty name", id));
            }
            if industry.inventory_capacity == 0 {
                return Err(anyhow::anyhow!(
                    "Industry {} inventory capacity must be positive",
                    id
                ));
            }
        }
        self.catalog.industries = industries;

        log::info!("Loaded {} industry templates", self.catalog.industries.len());
        Ok(())
    }

    fn load_locomotives(&mut self, locomotives: BTreeMap<String, Locomotive>) -> Result<()> {
        for (id, locomotive) in &locomotives {
            if locomotive.name != *id {
                return Err(anyhow::anyhow!(
                    "Locomotive key {} does not match its name {}",
                    id,
                    locomotive.name
                ));
            }
            if locomotive.acceleration <= 0.0 || locomotive.top_speed <= 0.0 {
                return Err(anyhow::anyhow!(
                    "Locomotive {} acceleration and top speed must be positive",
                    id
                ));
            }
            if locomotive.price < 0 {
                return Err(anyhow::anyhow!("Locomotive {} price cannot be negative", id));
            }
        }
        self.catalog.locomotives = locomotives;

        log::info!("Loaded {} locomotives", self.catalog.locomotives.len());
        Ok(())
    }

    fn load_carriages(&mut self, carriages: BTreeMap<String, Carriage>) -> Result<()> {
        for (id, carriage) in &carriages {
            if carriage.name != *id {
                return Err(anyhow::anyhow!(
                    "Carriage key {} does not match its name {}",
                    id,
                    carriage.name
                ));
            }
            if carriage.capacity == 0 {
                return Err(anyhow::anyhow!("Carriage {} capacity must be positive", id));
            }
        }
        self.catalog.carriages = carriages;

        log::info!("Loaded {} carriages", self.catalog.carriages.len());
        Ok(())
    }

    fn load_history(&mut self, history: HistoryFile) -> Result<()> {
        for entry in &history.events {
            TimeDate::new(entry.year, entry.month, entry.day)
                .with_context(|| format!("Historical event {}", entry.title))?;
        }
        self.catalog.history = history.events;

        log::info!("Loaded {} historical events", self.catalog.history.len());
        Ok(())
    }

    /// Industries may only mention known resource types, and the
    /// transformation graph must be acyclic.
    fn validate_references(&self) -> Result<()> {
        let analysis = CatalogAnalyzer::new(&self.catalog).analyze();
        if !analysis.unknown_inputs.is_empty() {
            return Err(anyhow::anyhow!(
                "Unknown transformation inputs: {}",
                analysis.unknown_inputs.join(", ")
            ));
        }
        if let Some(cycle) = analysis.cycles.first() {
            return Err(anyhow::anyhow!(
                "Transformation cycle detected: {}",
                cycle.join(" -> ")
            ));
        }

        for (id, industry) in &self.catalog.industries {
            let mentioned = industry
                .kind
                .needed_resource_types()
                .into_iter()
                .chain(industry.kind.produced_resource_types());
            for resource_type in mentioned {
                if !self.catalog.resources.contains_key(&resource_type) {
                    return Err(anyhow::anyhow!(
                        "Industry {} references unknown resource type {}",
                        id,
                        resource_type
                    ));
                }
            }
            for resource_type in industry.kind.transformed_resource_types() {
                if self.catalog.resources[resource_type].inputs().is_empty() {
                    return Err(anyhow::anyhow!(
                        "Industry {} transforms {} which has no inputs",
                        id,
                        resource_type
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Option<T>> {
    let path = dir.join(file);
    if !path.exists() {
        log::warn!("{} not found, using built-in defaults", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let parsed = toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(parsed))
}

fn validate_resource(id: &str, resource: &ResourceType) -> Result<()> {
    if resource.name != id {
        return Err(anyhow::anyhow!(
            "Resource key {} does not match its name {}",
            id,
            resource.name
        ));
    }

    if resource.quantity_produced == 0 {
        return Err(anyhow::anyhow!("Resource {} batch size must be positive", id));
    }

    if resource.interval == 0 {
        return Err(anyhow::anyhow!("Resource {} interval must be positive", id));
    }

    Ok(())
}

fn validate_settings(settings: &SimulationSettings) -> Result<()> {
    TimeDate::new_year(settings.start_year).context("Invalid start year")?;
    Ok(())
}

/// Create default data files for a new project
pub fn create_default_data_files<P: AsRef<Path>>(data_dir: P) -> Result<()> {
    let data_path = data_dir.as_ref();
    fs::create_dir_all(data_path)?;

    let default_catalog = Catalog::default();

    let resources_content = toml::to_string_pretty(&default_catalog.resources)?;
    fs::write(data_path.join(RESOURCES_FILE), resources_content)?;

    let industries_content = toml::to_string_pretty(&default_catalog.industries)?;
    fs::write(data_path.join(INDUSTRIES_FILE), industries_content)?;

    let locomotives_content = toml::to_string_pretty(&default_catalog.locomotives)?;
    fs::write(data_path.join(LOCOMOTIVES_FILE), locomotives_content)?;

    let carriages_content = toml::to_string_pretty(&default_catalog.carriages)?;
    fs::write(data_path.join(CARRIAGES_FILE), carriages_content)?;

    let history_content = toml::to_string_pretty(&HistoryFile {
        events: default_catalog.history.clone(),
    })?;
    fs::write(data_path.join(HISTORY_FILE), history_content)?;

    let simulation_content = toml::to_string_pretty(&default_catalog.simulation)?;
    fs::write(data_path.join(SIMULATION_FILE), simulation_content)?;

    log::info!("Created default data files in {:?}", data_path);
    Ok(())
}
