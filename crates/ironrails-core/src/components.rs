use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::Day;

/// How a resource type comes into existence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Produced from nothing by a primary industry or house block
    Primary,
    /// Produced by consuming one batch of each input type
    Transformed { inputs: Vec<String> },
}

/// Catalog entry describing a tradeable resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    pub name: String,
    /// Size of one production batch
    pub quantity_produced: u32,
    /// Days between production cycles
    pub interval: Day,
    pub kind: ResourceKind,
}

impl ResourceType {
    pub fn primary(name: &str, quantity_produced: u32, interval: Day) -> Self {
        Self {
            name: name.to_string(),
            quantity_produced,
            interval,
            kind: ResourceKind::Primary,
        }
    }

    pub fn transformed(name: &str, inputs: &[&str], quantity_produced: u32, interval: Day) -> Self {
        Self {
            name: name.to_string(),
            quantity_produced,
            interval,
            kind: ResourceKind::Transformed {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn inputs(&self) -> &[String] {
        match &self.kind {
            ResourceKind::Primary => &[],
            ResourceKind::Transformed { inputs } => inputs,
        }
    }

    pub fn batch(&self) -> Resource {
        Resource::new(&self.name, self.quantity_produced)
    }
}

/// A quantity of one resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub resource_type: String,
    pub quantity: u32,
}

impl Resource {
    pub fn new(resource_type: &str, quantity: u32) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            quantity,
        }
    }
}

/// Bounded resource storage owned by trains and station associations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: u32,
    pub items: BTreeMap<String, u32>,
    /// Set whenever the content changes, cleared by whoever presents it
    pub updated: bool,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            items: BTreeMap::new(),
            updated: false,
        }
    }

    pub fn total_items(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn available_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total_items())
    }

    pub fn is_full(&self) -> bool {
        self.available_space() == 0
    }

    /// Share of the capacity in use, 0.0 to 1.0 (or above after unbounded adds).
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.total_items() as f64 / self.capacity as f64
    }

    /// Stores as much of `resource` as fits and returns the stored amount.
    pub fn add_resource(&mut self, resource: &Resource) -> u32 {
        let to_add = resource.quantity.min(self.available_space());
        if to_add > 0 {
            *self.items.entry(resource.resource_type.clone()).or_insert(0) += to_add;
        }
        to_add
    }

    pub fn add_resource_without_limit(&mut self, resource: &Resource) {
        if resource.quantity > 0 {
            *self.items.entry(resource.resource_type.clone()).or_insert(0) += resource.quantity;
        }
    }

    /// Removes up to `resource.quantity` and returns the removed amount.
    pub fn remove_resource(&mut self, resource: &Resource) -> u32 {
        let current = self.quantity_of(&resource.resource_type);
        let to_remove = resource.quantity.min(current);
        if to_remove > 0 {
            let new_amount = current - to_remove;
            if new_amount == 0 {
                self.items.remove(&resource.resource_type);
            } else {
                self.items.insert(resource.resource_type.clone(), new_amount);
            }
        }
        to_remove
    }

    pub fn quantity_of(&self, resource_type: &str) -> u32 {
        self.items.get(resource_type).copied().unwrap_or(0)
    }

    pub fn resource_by_type(&self, resource_type: &str) -> Option<Resource> {
        self.items
            .get(resource_type)
            .map(|&quantity| Resource::new(resource_type, quantity))
    }

    /// Every stored resource, ordered by type name.
    pub fn all_resources(&self) -> Vec<Resource> {
        self.items
            .iter()
            .map(|(resource_type, &quantity)| Resource::new(resource_type, quantity))
            .collect()
    }

    pub fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Electricity,
    Diesel,
    Steam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locomotive {
    pub name: String,
    pub fuel_type: FuelType,
    /// Speed gained per service hour
    pub acceleration: f64,
    pub top_speed: f64,
    pub price: i64,
    /// Year the model becomes purchasable
    pub start_year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carriage {
    pub name: String,
    pub capacity: u32,
    pub price: i64,
    pub start_year: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrainId(pub usize);

/// A locomotive hauling carriages; cargo capacity comes from the carriages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub name: String,
    pub locomotive: Locomotive,
    pub carriages: Vec<Carriage>,
    pub inventory: Inventory,
}

impl Train {
    pub fn new(id: TrainId, name: &str, locomotive: Locomotive, carriages: Vec<Carriage>) -> Self {
        let capacity = carriages.iter().map(|c| c.capacity).sum();
        Self {
            id,
            name: name.to_string(),
            locomotive,
            carriages,
            inventory: Inventory::new(capacity),
        }
    }

    pub fn carriage_count(&self) -> usize {
        self.carriages.len()
    }

    /// Daily distance after the per-carriage speed penalty.
    pub fn debuffed_max_daily_distance(&self) -> u64 {
        crate::physics::debuffed_max_daily_distance(
            self.locomotive.acceleration,
            self.locomotive.top_speed,
            self.carriage_count(),
        )
    }
}
