use bevy::prelude::*;

use crate::resources::{EventLog, Simulation, SimulationFault};
use crate::scenario::Scenario;
use crate::scheduler::{DayCompletedEvent, EventScheduler};

/// Fires every event due today. A failure is parked in [`SimulationFault`].
pub fn trigger_due_events_system(
    mut scheduler: ResMut<EventScheduler>,
    mut simulation: ResMut<Simulation>,
    mut scenario: ResMut<Scenario>,
    mut fault: ResMut<SimulationFault>,
    mut completed: EventWriter<DayCompletedEvent>,
) {
    if fault.0.is_some() {
        return;
    }

    match scheduler.run_day(&mut simulation, &mut scenario) {
        Ok(report) => {
            completed.send(DayCompletedEvent { report });
        }
        Err(err) => {
            log::error!("Simulation halted on {}: {}", simulation.current_date(), err);
            fault.0 = Some(err);
        }
    }
}

/// Copies the day's log lines into the bounded [`EventLog`].
pub fn record_day_system(mut reader: EventReader<DayCompletedEvent>, mut event_log: ResMut<EventLog>) {
    for event in reader.read() {
        let report = &event.report;
        for line in &report.lines {
            event_log.push(report.day, line.clone());
        }

        if report.date.month() == 1 && report.date.day() == 1 {
            log::info!("Entering {}", report.date.year());
        }
    }
}

pub fn advance_day_system(mut simulation: ResMut<Simulation>, fault: Res<SimulationFault>) {
    if fault.0.is_none() {
        simulation.advance_day();
    }
}
