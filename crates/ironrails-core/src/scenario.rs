use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::{Carriage, Inventory, Locomotive, Train, TrainId};
use crate::config::Catalog;
use crate::error::{SimError, SimResult};
use crate::route::{CargoMode, LineId, PointOfRoute, RailwayLine, Route};
use crate::stations::{Association, AssociationId, Position, Station, StationId};

/// Runtime world the events operate on
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub stations: BTreeMap<StationId, Station>,
    pub associations: BTreeMap<AssociationId, Association>,
    pub lines: BTreeMap<LineId, RailwayLine>,
    pub trains: BTreeMap<TrainId, Train>,
}

fn next_index<K, V>(map: &BTreeMap<K, V>, index: impl Fn(&K) -> usize) -> usize {
    map.keys().next_back().map(|k| index(k) + 1).unwrap_or(0)
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates a runtime industry or house block from a catalog template.
    pub fn spawn_association(
        &mut self,
        catalog: &Catalog,
        template_id: &str,
        name: &str,
        position: Position,
    ) -> SimResult<AssociationId> {
        let template = catalog.template(template_id)?;
        let id = AssociationId(next_index(&self.associations, |k| k.0));
        self.associations.insert(
            id,
            Association {
                id,
                name: name.to_string(),
                template: template_id.to_string(),
                position,
                inventory: Inventory::new(template.inventory_capacity),
                kind: template.kind.clone(),
            },
        );

        log::debug!("Spawned {} ({}) at {:?}", name, template.name, position);
        Ok(id)
    }

    pub fn add_station(&mut self, name: &str, position: Position, catchment_radius: f32) -> StationId {
        let id = StationId(next_index(&self.stations, |k| k.0));
        let mut station = Station::new(id, name, position, catchment_radius);
        station.assign_generation_posts(&self.associations);
        station.refresh_requested_resources(&self.associations);
        self.stations.insert(id, station);
        id
    }

    pub fn add_line(&mut self, from: StationId, to: StationId, length: u64) -> SimResult<LineId> {
        self.station(from)?;
        self.station(to)?;
        let id = LineId(next_index(&self.lines, |k| k.0));
        self.lines.insert(id, RailwayLine { id, from, to, length });
        Ok(id)
    }

    pub fn add_train(&mut self, name: &str, locomotive: Locomotive, carriages: Vec<Carriage>) -> TrainId {
        let id = TrainId(next_index(&self.trains, |k| k.0));
        self.trains.insert(id, Train::new(id, name, locomotive, carriages));
        id
    }

    pub fn station(&self, id: StationId) -> SimResult<&Station> {
        self.stations.get(&id).ok_or(SimError::UnknownStation(id))
    }

    pub fn station_mut(&mut self, id: StationId) -> SimResult<&mut Station> {
        self.stations.get_mut(&id).ok_or(SimError::UnknownStation(id))
    }

    pub fn association_mut(&mut self, id: AssociationId) -> SimResult<&mut Association> {
        self.associations
            .get_mut(&id)
            .ok_or(SimError::UnknownAssociation(id))
    }

    pub fn train(&self, id: TrainId) -> SimResult<&Train> {
        self.trains.get(&id).ok_or(SimError::UnknownTrain(id))
    }

    pub fn train_mut(&mut self, id: TrainId) -> SimResult<&mut Train> {
        self.trains.get_mut(&id).ok_or(SimError::UnknownTrain(id))
    }

    /// Re-resolves a station's associations and requested resources.
    pub fn refresh_station(&mut self, id: StationId) -> SimResult<()> {
        let station = self.stations.get_mut(&id).ok_or(SimError::UnknownStation(id))?;
        station.assign_generation_posts(&self.associations);
        station.refresh_requested_resources(&self.associations);
        Ok(())
    }

    pub fn refresh_all_stations(&mut self) {
        for station in self.stations.values_mut() {
            station.assign_generation_posts(&self.associations);
            station.refresh_requested_resources(&self.associations);
        }
    }
}

/// Small deterministic world with two routes, used by the headless driver.
pub fn build_demo(catalog: &Catalog) -> SimResult<(Scenario, Vec<Route>)> {
    let mut scenario = Scenario::new("Demo valley");

    scenario.spawn_association(catalog, "coal_mine", "Blackpit Colliery", Position::new(1, 1))?;
    scenario.spawn_association(catalog, "iron_mine", "Redrock Mine", Position::new(-1, 2))?;
    scenario.spawn_association(catalog, "steel_mill", "Ironford Works", Position::new(31, 1))?;
    scenario.spawn_association(catalog, "town_block", "Ironford", Position::new(32, -1))?;
    scenario.spawn_association(catalog, "factory", "Kingsport Assembly", Position::new(29, 24))?;
    scenario.spawn_association(catalog, "town_block", "Kingsport", Position::new(31, 26))?;

    let millbrook = scenario.add_station("Millbrook", Position::new(0, 0), 4.0);
    let ironford = scenario.add_station("Ironford", Position::new(30, 0), 4.0);
    let kingsport = scenario.add_station("Kingsport", Position::new(30, 25), 4.0);

    scenario.station_mut(ironford)?.set_demand("coal", 1.2);
    scenario.station_mut(ironford)?.set_demand("iron_ore", 1.1);
    scenario.station_mut(kingsport)?.set_demand("steel", 1.5);
    scenario.station_mut(kingsport)?.set_demand("passengers", 1.3);

    let valley_line = scenario.add_line(millbrook, ironford, 30)?;
    let coast_line = scenario.add_line(ironford, kingsport, 25)?;

    let rocket = catalog
        .locomotives
        .get("Rocket")
        .cloned()
        .ok_or_else(|| SimError::UnknownTemplate("Rocket".to_string()))?;
    let wagon = catalog
        .carriages
        .get("Open wagon")
        .cloned()
        .ok_or_else(|| SimError::UnknownTemplate("Open wagon".to_string()))?;

    let mineral_train = scenario.add_train("Mineral 1", rocket.clone(), vec![wagon.clone(); 3]);
    let coast_train = scenario.add_train("Coaster", rocket, vec![wagon; 2]);

    let mut mineral = Route::new(
        "Valley minerals",
        vec![
            PointOfRoute::new(millbrook, &["coal", "iron_ore"], CargoMode::Half),
            PointOfRoute::new(ironford, &[], CargoMode::Available),
        ],
        vec![valley_line, valley_line],
    )?;
    mineral.activate(mineral_train);

    let mut coast = Route::new(
        "Coast express",
        vec![
            PointOfRoute::new(ironford, &["steel", "passengers", "mail"], CargoMode::Available),
            PointOfRoute::new(kingsport, &["goods", "passengers", "mail"], CargoMode::Available),
        ],
        vec![coast_line, coast_line],
    )?;
    coast.activate(coast_train);

    log::info!(
        "Built demo scenario with {} stations and {} associations",
        scenario.stations.len(),
        scenario.associations.len()
    );
    Ok((scenario, vec![mineral, coast]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_from_template() {
        let catalog = Catalog::default();
        let mut scenario = Scenario::new("test");
        let id = scenario
            .spawn_association(&catalog, "steel_mill", "Works", Position::new(0, 0))
            .unwrap();
        let works = &scenario.associations[&id];
        assert_eq!(works.template, "steel_mill");
        assert_eq!(works.inventory.capacity, 300);
        assert!(works.needs("coal"));

        assert!(scenario
            .spawn_association(&catalog, "castle", "Nope", Position::new(0, 0))
            .is_err());
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let catalog = Catalog::default();
        let mut scenario = Scenario::new("test");
        let a = scenario
            .spawn_association(&catalog, "coal_mine", "A", Position::new(0, 0))
            .unwrap();
        let b = scenario
            .spawn_association(&catalog, "coal_mine", "B", Position::new(5, 0))
            .unwrap();
        scenario
            .association_mut(a)
            .unwrap()
            .inventory
            .add_resource(&crate::components::Resource::new("coal", 10));
        assert_eq!(scenario.associations[&b].inventory.total_items(), 0);
    }

    #[test]
    fn test_line_requires_known_stations() {
        let mut scenario = Scenario::new("test");
        let a = scenario.add_station("A", Position::new(0, 0), 2.0);
        assert_eq!(
            scenario.add_line(a, StationId(9), 10),
            Err(SimError::UnknownStation(StationId(9)))
        );
    }

    #[test]
    fn test_station_picks_up_new_association_on_refresh() {
        let catalog = Catalog::default();
        let mut scenario = Scenario::new("test");
        let station = scenario.add_station("A", Position::new(0, 0), 3.0);
        assert!(scenario.stations[&station].associations.is_empty());

        scenario
            .spawn_association(&catalog, "forest", "Woods", Position::new(1, 1))
            .unwrap();
        scenario.refresh_station(station).unwrap();
        assert_eq!(scenario.stations[&station].associations.len(), 1);
    }

    #[test]
    fn test_demo_scenario() {
        let catalog = Catalog::default();
        let (scenario, routes) = build_demo(&catalog).unwrap();
        assert_eq!(scenario.stations.len(), 3);
        assert_eq!(scenario.trains.len(), 2);
        assert_eq!(routes.len(), 2);
        assert!(routes.iter().all(|r| r.is_running()));

        let millbrook = &scenario.stations[&StationId(0)];
        assert_eq!(millbrook.associations.len(), 2);
    }
}
