use bevy::prelude::{Event, Resource};
use serde::{Deserialize, Serialize};

use crate::calendar::{Day, TimeDate};
use crate::config::Catalog;
use crate::error::SimResult;
use crate::events::factory;
use crate::events::{EventContext, EventList, RouteEvent, SimEvent};
use crate::resources::Simulation;
use crate::route::Route;
use crate::scenario::Scenario;

/// Everything that happened on one simulated day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub day: Day,
    pub date: TimeDate,
    /// Number of events that fired
    pub triggered: usize,
    pub lines: Vec<String>,
}

/// Sent once per completed day by the tick systems
#[derive(Event, Debug, Clone)]
pub struct DayCompletedEvent {
    pub report: DayReport,
}

/// Owns the event list and fires whatever is due
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScheduler {
    pub events: EventList,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers every due event once, in list order.
    ///
    /// One-shot events are dropped after they fire. The first configuration
    /// error aborts the day; events already triggered keep their effects.
    pub fn run_day(&mut self, simulation: &mut Simulation, scenario: &mut Scenario) -> SimResult<DayReport> {
        let now = simulation.current_time();
        let mut report = DayReport {
            day: now,
            date: simulation.current_date(),
            triggered: 0,
            lines: Vec::new(),
        };

        for event in self.events.iter_mut() {
            if !event.is_due(now) {
                continue;
            }

            let mut ctx = EventContext {
                simulation: &mut *simulation,
                scenario: &mut *scenario,
            };
            let lines = event.trigger(&mut ctx)?;
            for line in &lines {
                log::debug!("[{}] {}", report.date, line);
            }
            report.triggered += 1;
            report.lines.extend(lines);
        }

        self.events
            .retain(|e| !(e.is_one_shot() && e.next_generation_date() <= now));
        Ok(report)
    }

    /// Creates events for everything in the scenario and catalog that has none yet.
    pub fn sync_with_scenario(
        &mut self,
        catalog: &Catalog,
        simulation: &Simulation,
        scenario: &mut Scenario,
    ) -> SimResult<usize> {
        let now = simulation.current_time();
        scenario.refresh_all_stations();

        let added = factory::create_association_events(scenario, catalog, now, &mut self.events)?
            + factory::create_availability_events(catalog, simulation, &mut self.events)?
            + factory::create_historical_events(catalog, now, &mut self.events)?;

        log::info!("Scheduler holds {} event(s), {} new", self.events.len(), added);
        Ok(added)
    }

    pub fn add_route(&mut self, route: Route, scenario: &Scenario, current_day: Day) -> SimResult<bool> {
        factory::create_route_event(route, scenario, current_day, &mut self.events)
    }

    pub fn route_events(&self) -> impl Iterator<Item = &RouteEvent> {
        self.events.iter().filter_map(|e| match e {
            SimEvent::Route(route) => Some(route),
            _ => None,
        })
    }

    pub fn route_event_mut(&mut self, route_name: &str) -> Option<&mut RouteEvent> {
        self.events.iter_mut().find_map(|e| match e {
            SimEvent::Route(route) if route.route.name == route_name => Some(route),
            _ => None,
        })
    }

    /// Earliest day anything is scheduled for.
    pub fn next_due(&self) -> Option<Day> {
        self.events.iter().map(|e| e.next_generation_date()).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ExportEvent, HistoricalEvent};
    use crate::stations::{AssociationId, Position};

    fn world() -> (Catalog, Simulation, Scenario) {
        let catalog = Catalog::default();
        let simulation = Simulation::new(TimeDate::new(1830, 1, 1).unwrap(), 1_000, 5);
        let mut scenario = Scenario::new("test");
        scenario
            .spawn_association(&catalog, "town_block", "Town", Position::new(0, 0))
            .unwrap();
        scenario.add_station("Central", Position::new(0, 0), 2.0);
        (catalog, simulation, scenario)
    }

    #[test]
    fn test_only_due_events_fire() {
        let (_, mut simulation, mut scenario) = world();
        let now = simulation.current_time();
        let mut scheduler = EventScheduler::new();
        scheduler.events.push_unique(SimEvent::Export(ExportEvent::new(
            "soon".to_string(),
            1,
            now,
            AssociationId(0),
            "goods",
        )));
        scheduler.events.push_unique(SimEvent::Export(ExportEvent::new(
            "later".to_string(),
            3,
            now,
            AssociationId(0),
            "goods",
        )));

        let mut fired = Vec::new();
        for _ in 0..3 {
            simulation.advance_day();
            let report = scheduler.run_day(&mut simulation, &mut scenario).unwrap();
            fired.push(report.triggered);
        }
        assert_eq!(fired, vec![1, 1, 2]);
    }

    #[test]
    fn test_one_shot_retired_after_firing() {
        let (_, mut simulation, mut scenario) = world();
        let now = simulation.current_time();
        let mut scheduler = EventScheduler::new();
        scheduler
            .events
            .push_unique(SimEvent::Historical(HistoricalEvent::new("h", "Hello", now)));
        scheduler
            .events
            .push_unique(SimEvent::Historical(HistoricalEvent::new("later", "Bye", now + 10)));

        let report = scheduler.run_day(&mut simulation, &mut scenario).unwrap();
        assert_eq!(report.lines, vec!["1830-01-01: Hello".to_string()]);
        assert_eq!(scheduler.events.len(), 1);
        assert_eq!(scheduler.next_due(), Some(now + 10));
    }

    #[test]
    fn test_error_aborts_day() {
        let (_, mut simulation, mut scenario) = world();
        let mut scheduler = EventScheduler::new();
        scheduler.events.push_unique(SimEvent::Export(ExportEvent::new(
            "ghost".to_string(),
            0,
            simulation.current_time(),
            AssociationId(42),
            "goods",
        )));

        assert!(scheduler.run_day(&mut simulation, &mut scenario).is_err());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (catalog, simulation, mut scenario) = world();
        let mut scheduler = EventScheduler::new();

        let first = scheduler
            .sync_with_scenario(&catalog, &simulation, &mut scenario)
            .unwrap();
        assert!(first > 0);
        assert!(scheduler.events.contains("Generate passengers at Town #0"));
        assert!(scheduler.events.contains("Locomotive available: Rocket"));
        assert_eq!(
            scheduler
                .sync_with_scenario(&catalog, &simulation, &mut scenario)
                .unwrap(),
            0
        );
    }
}
