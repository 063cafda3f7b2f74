//! Scheduled simulation events.
//!
//! Every event carries an [`EventHeader`] with its name, recurrence interval
//! and the absolute day it fires next. Triggering an event mutates the
//! simulation through an [`EventContext`] and returns human readable log
//! lines; an empty list means nothing happened this time. Recurring events
//! reschedule themselves before returning, one-shot events are retired by
//! the scheduler.

use serde::{Deserialize, Serialize};

use crate::calendar::Day;
use crate::error::SimResult;
use crate::resources::Simulation;
use crate::scenario::Scenario;

pub mod availability;
pub mod factory;
pub mod production;
pub mod route;

pub use availability::{HistoricalEvent, StartCarriageOperationEvent, StartLocomotiveOperationEvent};
pub use production::{ExportEvent, GenerationEvent, TransformingEvent};
pub use route::RouteEvent;

/// Scheduling data shared by every event kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Unique name, used to avoid creating the same event twice
    pub name: String,
    /// Days between recurrences, 0 for one-shot events
    pub interval: Day,
    pub next_generation_date: Day,
}

impl EventHeader {
    pub fn new(name: String, interval: Day, current_day: Day) -> Self {
        Self {
            name,
            interval,
            next_generation_date: current_day + interval,
        }
    }

    /// Header for an event firing once on `date`.
    pub fn one_shot(name: String, date: Day) -> Self {
        Self {
            name,
            interval: 0,
            next_generation_date: date,
        }
    }

    pub fn is_due(&self, now: Day) -> bool {
        self.next_generation_date <= now
    }

    pub fn advance_by_interval(&mut self) {
        self.next_generation_date += self.interval;
    }
}

/// Mutable state an event may touch while triggering
pub struct EventContext<'a> {
    pub simulation: &'a mut Simulation,
    pub scenario: &'a mut Scenario,
}

impl EventContext<'_> {
    pub fn now(&self) -> Day {
        self.simulation.current_time()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Route(RouteEvent),
    Generation(GenerationEvent),
    Transforming(TransformingEvent),
    Export(ExportEvent),
    LocomotiveAvailable(StartLocomotiveOperationEvent),
    CarriageAvailable(StartCarriageOperationEvent),
    Historical(HistoricalEvent),
}

impl SimEvent {
    pub fn header(&self) -> &EventHeader {
        match self {
            SimEvent::Route(e) => &e.header,
            SimEvent::Generation(e) => &e.header,
            SimEvent::Transforming(e) => &e.header,
            SimEvent::Export(e) => &e.header,
            SimEvent::LocomotiveAvailable(e) => &e.header,
            SimEvent::CarriageAvailable(e) => &e.header,
            SimEvent::Historical(e) => &e.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn next_generation_date(&self) -> Day {
        self.header().next_generation_date
    }

    pub fn is_due(&self, now: Day) -> bool {
        self.header().is_due(now)
    }

    /// One-shot events are retired by the scheduler after firing.
    pub fn is_one_shot(&self) -> bool {
        match self {
            SimEvent::LocomotiveAvailable(_)
            | SimEvent::CarriageAvailable(_)
            | SimEvent::Historical(_) => true,
            _ => self.header().interval == 0,
        }
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        match self {
            SimEvent::Route(e) => e.trigger(ctx),
            SimEvent::Generation(e) => e.trigger(ctx),
            SimEvent::Transforming(e) => e.trigger(ctx),
            SimEvent::Export(e) => e.trigger(ctx),
            SimEvent::LocomotiveAvailable(e) => e.trigger(ctx),
            SimEvent::CarriageAvailable(e) => e.trigger(ctx),
            SimEvent::Historical(e) => e.trigger(ctx),
        }
    }
}

/// Ordered event collection that refuses duplicate names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    events: Vec<SimEvent>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `event` unless one with the same name exists. Returns whether it was added.
    pub fn push_unique(&mut self, event: SimEvent) -> bool {
        if self.contains(event.name()) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&SimEvent> {
        self.events.iter().find(|e| e.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SimEvent> {
        self.events.iter_mut().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SimEvent> {
        self.events.iter_mut()
    }

    pub fn retain(&mut self, keep: impl FnMut(&SimEvent) -> bool) {
        self.events.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::AssociationId;

    fn export(name: &str) -> SimEvent {
        SimEvent::Export(ExportEvent::new(name.to_string(), 3, 10, AssociationId(0), "coal"))
    }

    #[test]
    fn test_header_schedules_first_trigger() {
        let header = EventHeader::new("x".to_string(), 7, 100);
        assert_eq!(header.next_generation_date, 107);
        assert!(!header.is_due(106));
        assert!(header.is_due(107));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut list = EventList::new();
        assert!(list.push_unique(export("drain coal")));
        assert!(!list.push_unique(export("drain coal")));
        assert!(list.push_unique(export("drain coal ")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_one_shot_detection() {
        assert!(!export("e").is_one_shot());
        let history = SimEvent::Historical(HistoricalEvent::new("h", "msg", 5));
        assert!(history.is_one_shot());
    }
}
