use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::calendar::{year_of, Day, TimeDate};
use crate::components::{Carriage, Locomotive};
use crate::config::SimulationSettings;
use crate::error::{SimError, SimResult};

/// Earnings and fuel spending of one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearFinancialResult {
    pub year: u32,
    pub earning: i64,
    /// Accumulated as a negative amount
    pub fuel_cost: i64,
}

impl YearFinancialResult {
    pub fn new(year: u32) -> Self {
        Self {
            year,
            earning: 0,
            fuel_cost: 0,
        }
    }

    pub fn balance(&self) -> i64 {
        self.earning + self.fuel_cost
    }
}

/// One delivery made by a train at a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnloadCargoLog {
    pub day: Day,
    pub route: String,
    pub station: String,
    pub association: String,
    pub resource_type: String,
    pub quantity: u32,
}

/// Simulation clock and ledger mutated by every event
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub current_time: Day,
    pub actual_money: i64,
    pub financial_results: Vec<YearFinancialResult>,
    pub unload_cargo_logs: Vec<UnloadCargoLog>,
    pub available_locomotives: Vec<Locomotive>,
    pub available_carriages: Vec<Carriage>,
    pub seed: u64,
}

impl Simulation {
    pub fn new(start: TimeDate, money: i64, seed: u64) -> Self {
        Self {
            current_time: start.total_days(),
            actual_money: money,
            financial_results: vec![YearFinancialResult::new(start.year())],
            unload_cargo_logs: Vec::new(),
            available_locomotives: Vec::new(),
            available_carriages: Vec::new(),
            seed,
        }
    }

    pub fn from_settings(settings: &SimulationSettings) -> SimResult<Self> {
        let start = TimeDate::new_year(settings.start_year)?;
        Ok(Self::new(start, settings.start_money, settings.seed))
    }

    pub fn current_time(&self) -> Day {
        self.current_time
    }

    pub fn current_date(&self) -> TimeDate {
        TimeDate::from_total_days(self.current_time)
    }

    pub fn advance_day(&mut self) {
        self.current_time += 1;
    }

    pub fn add_money(&mut self, amount: i64) {
        self.actual_money += amount;
    }

    pub fn set_actual_money(&mut self, amount: i64) {
        self.actual_money = amount;
    }

    /// Ledger of the current calendar year, opened on first use.
    pub fn actual_financial_result(&mut self) -> &mut YearFinancialResult {
        let year = year_of(self.current_time);
        let is_current = self
            .financial_results
            .last()
            .map(|r| r.year == year)
            .unwrap_or(false);
        if !is_current {
            log::info!("Opening financial year {}", year);
            self.financial_results.push(YearFinancialResult::new(year));
        }
        let last = self.financial_results.len() - 1;
        &mut self.financial_results[last]
    }

    pub fn unload_cargo_logs(&self) -> &[UnloadCargoLog] {
        &self.unload_cargo_logs
    }

    pub fn record_unload(&mut self, log: UnloadCargoLog) {
        self.unload_cargo_logs.push(log);
    }

    /// Registers a locomotive model, returns false if already available.
    pub fn register_locomotive(&mut self, locomotive: &Locomotive) -> bool {
        if self
            .available_locomotives
            .iter()
            .any(|l| l.name == locomotive.name)
        {
            return false;
        }
        self.available_locomotives.push(locomotive.clone());
        true
    }

    /// Registers a carriage model, returns false if already available.
    pub fn register_carriage(&mut self, carriage: &Carriage) -> bool {
        if self
            .available_carriages
            .iter()
            .any(|c| c.name == carriage.name)
        {
            return false;
        }
        self.available_carriages.push(carriage.clone());
        true
    }
}

/// Fatal configuration error that stopped the simulation
#[derive(Resource, Debug, Default)]
pub struct SimulationFault(pub Option<SimError>);

/// Log lines produced by triggered events, most recent last
#[derive(Resource, Debug, Default)]
pub struct EventLog {
    pub entries: Vec<LogEntry>,
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub day: Day,
    pub line: String,
}

impl EventLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn push(&mut self, day: Day, line: String) {
        if self.max_entries > 0 && self.entries.len() >= self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(LogEntry { day, line });
    }
}
