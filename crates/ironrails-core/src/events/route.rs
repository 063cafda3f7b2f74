//! Train movement along a route.
//!
//! Each trigger handles the stop the train currently stands at:
//!
//! 1. refresh the station's associations and requested resources,
//! 2. unload, if the train just arrived, into the first association that
//!    needs each resource (house blocks, then transforming, then mixed
//!    industries),
//! 3. load the stop's cargo from associations producing it,
//! 4. hold the train for another day while the cargo mode is not satisfied,
//! 5. otherwise depart: settle revenue for the cargo delivered here, pay
//!    fuel for the next leg and schedule the arrival.
//!
//! The leg's travel time is resolved before anything is moved, so a
//! misconfigured train fails the trigger without touching any inventory.

use serde::{Deserialize, Serialize};

use super::{EventContext, EventHeader};
use crate::calendar::Day;
use crate::components::{Resource, TrainId};
use crate::economy;
use crate::error::{SimError, SimResult};
use crate::physics;
use crate::resources::UnloadCargoLog;
use crate::route::{build_complete_path, leg_distance, PathSegment, PointOfRoute, Route};
use crate::scenario::Scenario;
use crate::stations::{AssociationId, StationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEvent {
    pub header: EventHeader,
    pub route: Route,
    pub complete_path: Vec<PathSegment>,
    /// Cargo delivered at the current stop, paid out on departure
    pub pending_settlement: Vec<Resource>,
}

/// Everything needed about the leg about to be travelled
struct Leg {
    train: TrainId,
    train_name: String,
    distance: u64,
    travel_time: Day,
    fuel_cost: i64,
}

impl RouteEvent {
    pub fn new(route: Route, scenario: &Scenario, current_day: Day) -> SimResult<Self> {
        let complete_path = build_complete_path(&route, &scenario.lines)?;
        for point in &route.points {
            scenario.station(point.station)?;
        }

        Ok(Self {
            header: EventHeader::new(format!("Route: {}", route.name), 1, current_day),
            route,
            complete_path,
            pending_settlement: Vec::new(),
        })
    }

    /// Pauses or resumes the route. A paused train stays where it is with its cargo.
    pub fn set_active(&mut self, active: bool) {
        self.route.active = active;
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        let now = ctx.now();
        self.route.check_position()?;

        let train = match self.route.assigned_train {
            Some(train) if self.route.active => train,
            _ => {
                self.header.next_generation_date = now + 1;
                return Ok(Vec::new());
            }
        };

        let point = self.route.current_point().clone();
        let leg = self.plan_leg(ctx.scenario, train)?;
        let mut logs = Vec::new();

        ctx.scenario.refresh_station(point.station)?;

        if self.route.transferring {
            let unloaded = self.unload(ctx, &leg, point.station, &mut logs)?;
            self.pending_settlement.extend(unloaded);
        }

        load(ctx.scenario, &leg, &point, &mut logs)?;

        let fill_ratio = ctx.scenario.train(train)?.inventory.fill_ratio();
        if point.cargo_mode.blocks_departure(fill_ratio) {
            log::debug!(
                "{} waits at stop {} of {} ({:.0}% loaded, {:?})",
                leg.train_name,
                self.route.position,
                self.route.name,
                fill_ratio * 100.0,
                point.cargo_mode
            );
            self.header.next_generation_date = now + 1;
            self.route.transferring = false;
            return Ok(logs);
        }

        self.depart(ctx, &leg, point.station, &mut logs)?;
        Ok(logs)
    }

    fn plan_leg(&self, scenario: &Scenario, train_id: TrainId) -> SimResult<Leg> {
        let train = scenario.train(train_id)?;
        let distance = leg_distance(&self.complete_path, self.route.position, &scenario.lines)?;
        let travel_time = physics::travel_time(&train.name, distance, train.debuffed_max_daily_distance())?;

        Ok(Leg {
            train: train_id,
            train_name: train.name.clone(),
            distance,
            travel_time,
            fuel_cost: economy::fuel_cost(train.locomotive.fuel_type, distance),
        })
    }

    fn unload(
        &self,
        ctx: &mut EventContext,
        leg: &Leg,
        station_id: StationId,
        logs: &mut Vec<String>,
    ) -> SimResult<Vec<Resource>> {
        let now = ctx.now();
        let scenario = &mut *ctx.scenario;
        let station = scenario.station(station_id)?;
        let station_name = station.name.clone();
        let served = station.associations.clone();
        let cargo = scenario.train(leg.train)?.inventory.all_resources();

        let mut unloaded = Vec::new();
        for resource in cargo {
            let Some(target) = first_consumer(scenario, &served, &resource.resource_type) else {
                continue;
            };

            let train = scenario.train_mut(leg.train)?;
            let quantity = train.inventory.remove_resource(&resource);
            train.inventory.set_updated(true);

            let association = scenario.association_mut(target)?;
            let delivered = Resource::new(&resource.resource_type, quantity);
            association.inventory.add_resource_without_limit(&delivered);
            association.inventory.set_updated(true);

            logs.push(format!(
                "{} unloaded {} {} for {} at {}",
                leg.train_name, quantity, resource.resource_type, association.name, station_name
            ));
            ctx.simulation.record_unload(UnloadCargoLog {
                day: now,
                route: self.route.name.clone(),
                station: station_name.clone(),
                association: association.name.clone(),
                resource_type: resource.resource_type.clone(),
                quantity,
            });
            unloaded.push(delivered);
        }

        Ok(unloaded)
    }

    fn depart(
        &mut self,
        ctx: &mut EventContext,
        leg: &Leg,
        station_id: StationId,
        logs: &mut Vec<String>,
    ) -> SimResult<()> {
        let now = ctx.now();
        self.header.next_generation_date = now + leg.travel_time;
        self.route.advance_position();
        self.route.transferring = true;

        let station = ctx.scenario.station(station_id)?;
        let next_station = ctx.scenario.station(self.route.current_point().station)?;
        logs.push(format!(
            "{} departs {} for {}, arriving in {} day(s)",
            leg.train_name, station.name, next_station.name, leg.travel_time
        ));

        if !self.pending_settlement.is_empty() {
            let income = economy::revenue(&self.pending_settlement, station);
            self.pending_settlement.clear();
            if income != 0 {
                logs.push(format!("{} earned {} at {}", leg.train_name, income, station.name));
                ctx.simulation.add_money(income);
                ctx.simulation.actual_financial_result().earning += income;
            }
        }

        if leg.fuel_cost > 0 {
            logs.push(format!(
                "{} burns {} worth of fuel over {} km",
                leg.train_name, leg.fuel_cost, leg.distance
            ));
            ctx.simulation.add_money(-leg.fuel_cost);
            ctx.simulation.actual_financial_result().fuel_cost -= leg.fuel_cost;
        }

        Ok(())
    }
}

/// Association that takes `resource_type`: house blocks first, then
/// transforming and mixed industries, station order within a kind.
fn first_consumer(scenario: &Scenario, served: &[AssociationId], resource_type: &str) -> Option<AssociationId> {
    served
        .iter()
        .filter_map(|id| scenario.associations.get(id))
        .filter(|a| a.needs(resource_type))
        .min_by_key(|a| a.kind.unload_priority())
        .map(|a| a.id)
}

fn load(scenario: &mut Scenario, leg: &Leg, point: &PointOfRoute, logs: &mut Vec<String>) -> SimResult<()> {
    let served = scenario.station(point.station)?.associations.clone();
    let train = scenario
        .trains
        .get_mut(&leg.train)
        .ok_or(SimError::UnknownTrain(leg.train))?;

    'cargo: for resource_type in &point.cargo_to_pick {
        for id in &served {
            let space = train.inventory.available_space();
            if space == 0 {
                break 'cargo;
            }

            let Some(association) = scenario.associations.get_mut(id) else {
                continue;
            };
            if !association
                .produced_resource_types()
                .iter()
                .any(|t| t == resource_type)
            {
                continue;
            }

            let taken = association
                .inventory
                .remove_resource(&Resource::new(resource_type, space));
            if taken == 0 {
                continue;
            }
            association.inventory.set_updated(true);
            train.inventory.add_resource(&Resource::new(resource_type, taken));
            train.inventory.set_updated(true);

            logs.push(format!(
                "{} loaded {} {} from {}",
                leg.train_name, taken, resource_type, association.name
            ));
        }
    }

    Ok(())
}
