//! Builds the event list from a catalog and a scenario.
//!
//! Every builder pushes through [`EventList::push_unique`], so running a
//! scan again after the scenario changed only adds what is new.

use super::{
    EventList, ExportEvent, GenerationEvent, HistoricalEvent, RouteEvent, SimEvent,
    StartCarriageOperationEvent, StartLocomotiveOperationEvent, TransformingEvent,
};
use crate::calendar::{Day, TimeDate};
use crate::components::Resource;
use crate::config::Catalog;
use crate::error::SimResult;
use crate::resources::Simulation;
use crate::route::Route;
use crate::scenario::Scenario;
use crate::stations::{Association, AssociationId};

fn event_name(action: &str, resource_type: &str, association: &Association) -> String {
    format!("{} {} at {} #{}", action, resource_type, association.name, association.id.0)
}

/// Production events for every association served by at least one station.
pub fn create_association_events(
    scenario: &Scenario,
    catalog: &Catalog,
    current_day: Day,
    events: &mut EventList,
) -> SimResult<usize> {
    let served: Vec<AssociationId> = {
        let mut ids: Vec<AssociationId> = scenario
            .stations
            .values()
            .flat_map(|s| s.associations.iter().copied())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    };

    let mut added = 0;
    for id in served {
        let Some(association) = scenario.associations.get(&id) else {
            log::warn!("Station references missing association {:?}", id);
            continue;
        };

        for resource_type in association.generated_resource_types() {
            let rt = catalog.resource_type(resource_type)?;
            let event = GenerationEvent::new(
                event_name("Generate", resource_type, association),
                rt.interval,
                current_day,
                id,
                rt.batch(),
            );
            added += events.push_unique(SimEvent::Generation(event)) as usize;
        }

        for resource_type in association.transformed_resource_types() {
            let rt = catalog.resource_type(resource_type)?;
            let inputs = rt
                .inputs()
                .iter()
                .map(|input| catalog.resource_type(input).map(|t| t.batch()))
                .collect::<SimResult<Vec<Resource>>>()?;
            let event = TransformingEvent::new(
                event_name("Transform", resource_type, association),
                rt.interval,
                current_day,
                id,
                inputs,
                rt.batch(),
            );
            added += events.push_unique(SimEvent::Transforming(event)) as usize;
        }

        for resource_type in association.exported_resource_types() {
            let rt = catalog.resource_type(resource_type)?;
            let event = ExportEvent::new(
                event_name("Export", resource_type, association),
                rt.interval,
                current_day,
                id,
                resource_type,
            );
            added += events.push_unique(SimEvent::Export(event)) as usize;
        }
    }

    if added > 0 {
        log::debug!("Created {} production event(s)", added);
    }
    Ok(added)
}

/// One-shot availability events for rolling stock not yet on sale.
pub fn create_availability_events(
    catalog: &Catalog,
    simulation: &Simulation,
    events: &mut EventList,
) -> SimResult<usize> {
    let mut added = 0;

    for locomotive in catalog.locomotives.values() {
        if simulation
            .available_locomotives
            .iter()
            .any(|l| l.name == locomotive.name)
        {
            continue;
        }
        let event = StartLocomotiveOperationEvent::new(locomotive.clone(), locomotive.start_year)?;
        added += events.push_unique(SimEvent::LocomotiveAvailable(event)) as usize;
    }

    for carriage in catalog.carriages.values() {
        if simulation
            .available_carriages
            .iter()
            .any(|c| c.name == carriage.name)
        {
            continue;
        }
        let event = StartCarriageOperationEvent::new(carriage.clone(), carriage.start_year)?;
        added += events.push_unique(SimEvent::CarriageAvailable(event)) as usize;
    }

    Ok(added)
}

/// Historical events dated today or later.
pub fn create_historical_events(catalog: &Catalog, current_day: Day, events: &mut EventList) -> SimResult<usize> {
    let mut added = 0;
    for entry in &catalog.history {
        let date = TimeDate::new(entry.year, entry.month, entry.day)?.total_days();
        if date < current_day {
            continue;
        }
        let event = HistoricalEvent::new(&entry.title, &entry.message, date);
        added += events.push_unique(SimEvent::Historical(event)) as usize;
    }
    Ok(added)
}

/// Wraps `route` in a route event. Returns false if one with that name exists.
pub fn create_route_event(
    route: Route,
    scenario: &Scenario,
    current_day: Day,
    events: &mut EventList,
) -> SimResult<bool> {
    let name = route.name.clone();
    let event = RouteEvent::new(route, scenario, current_day)?;
    let added = events.push_unique(SimEvent::Route(event));
    if added {
        log::info!("Route {} scheduled", name);
    } else {
        log::warn!("Route {} already scheduled", name);
    }
    Ok(added)
}
