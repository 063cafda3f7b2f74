use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{EventContext, EventHeader};
use crate::calendar::{Day, TimeDate};
use crate::components::{Carriage, Locomotive};
use crate::error::SimResult;

const LOCOMOTIVE_FLAVOR: [&str; 8] = [
    "Engineers unveil the {name}, ready for service this year.",
    "The {name} leaves the works to cheers from the crowd.",
    "Newspapers praise the {name} as the future of the railways.",
    "Rival companies scramble to order the new {name}.",
    "Drivers queue up to take the {name} out on its first run.",
    "The {name} sets a speed record on its trial journey.",
    "Investors are abuzz: the {name} is now on sale.",
    "A brass band greets the arrival of the {name}.",
];

const CARRIAGE_FLAVOR: [&str; 8] = [
    "The {name} rolls off the production line.",
    "Shippers welcome the roomy new {name}.",
    "Yards across the country make room for the {name}.",
    "The {name} promises more cargo per trip.",
    "Merchants are eager to load the first {name}.",
    "Builders deliver the {name} ahead of schedule.",
    "Freight agents start booking space on the {name}.",
    "The {name} joins the catalog of available rolling stock.",
];

/// Deterministic flavor line for `name` on `day`.
fn flavor(templates: &[&str], seed: u64, day: Day, name: &str) -> String {
    let mixed = name
        .bytes()
        .fold(seed ^ day, |acc, b| acc.rotate_left(5) ^ b as u64);
    let mut rng = ChaCha8Rng::seed_from_u64(mixed);
    let template = templates[rng.gen_range(0..templates.len())];
    template.replace("{name}", name)
}

/// Makes a locomotive model purchasable from January 1st of its start year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartLocomotiveOperationEvent {
    pub header: EventHeader,
    pub locomotive: Locomotive,
}

impl StartLocomotiveOperationEvent {
    pub fn new(locomotive: Locomotive, year: u32) -> SimResult<Self> {
        let date = TimeDate::new_year(year)?.total_days();
        Ok(Self {
            header: EventHeader::one_shot(format!("Locomotive available: {}", locomotive.name), date),
            locomotive,
        })
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        if !ctx.simulation.register_locomotive(&self.locomotive) {
            log::debug!("Locomotive {} already available", self.locomotive.name);
            return Ok(Vec::new());
        }

        log::info!("Locomotive {} is now available", self.locomotive.name);
        Ok(vec![flavor(
            &LOCOMOTIVE_FLAVOR,
            ctx.simulation.seed,
            ctx.now(),
            &self.locomotive.name,
        )])
    }
}

/// Makes a carriage model purchasable from January 1st of its start year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCarriageOperationEvent {
    pub header: EventHeader,
    pub carriage: Carriage,
}

impl StartCarriageOperationEvent {
    pub fn new(carriage: Carriage, year: u32) -> SimResult<Self> {
        let date = TimeDate::new_year(year)?.total_days();
        Ok(Self {
            header: EventHeader::one_shot(format!("Carriage available: {}", carriage.name), date),
            carriage,
        })
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        if !ctx.simulation.register_carriage(&self.carriage) {
            log::debug!("Carriage {} already available", self.carriage.name);
            return Ok(Vec::new());
        }

        log::info!("Carriage {} is now available", self.carriage.name);
        Ok(vec![flavor(
            &CARRIAGE_FLAVOR,
            ctx.simulation.seed,
            ctx.now(),
            &self.carriage.name,
        )])
    }
}

/// Dated news item with no effect on the economy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub header: EventHeader,
    pub message: String,
}

impl HistoricalEvent {
    pub fn new(title: &str, message: &str, date: Day) -> Self {
        Self {
            header: EventHeader::one_shot(format!("History: {}", title), date),
            message: message.to_string(),
        }
    }

    pub fn trigger(&mut self, ctx: &mut EventContext) -> SimResult<Vec<String>> {
        Ok(vec![format!("{}: {}", ctx.simulation.current_date(), self.message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FuelType;
    use crate::resources::Simulation;
    use crate::scenario::Scenario;

    fn locomotive() -> Locomotive {
        Locomotive {
            name: "Comet".to_string(),
            fuel_type: FuelType::Diesel,
            acceleration: 10.0,
            top_speed: 50.0,
            price: 1_000,
            start_year: 1900,
        }
    }

    #[test]
    fn test_fires_on_new_year() {
        let event = StartLocomotiveOperationEvent::new(locomotive(), 1900).unwrap();
        assert_eq!(
            event.header.next_generation_date,
            TimeDate::new(1900, 1, 1).unwrap().total_days()
        );
        assert_eq!(event.header.interval, 0);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut simulation = Simulation::new(TimeDate::new(1900, 1, 1).unwrap(), 0, 3);
        let mut scenario = Scenario::new("test");
        let mut event = StartLocomotiveOperationEvent::new(locomotive(), 1900).unwrap();
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };

        let first = event.trigger(&mut ctx).unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].contains("Comet"));
        assert!(event.trigger(&mut ctx).unwrap().is_empty());
        assert_eq!(simulation.available_locomotives.len(), 1);
    }

    #[test]
    fn test_flavor_is_deterministic() {
        let a = flavor(&CARRIAGE_FLAVOR, 42, 1000, "Hopper");
        let b = flavor(&CARRIAGE_FLAVOR, 42, 1000, "Hopper");
        assert_eq!(a, b);
        assert!(a.contains("Hopper"));
        assert!(!a.contains("{name}"));
    }

    #[test]
    fn test_historical_message() {
        let day = TimeDate::new(1869, 5, 10).unwrap().total_days();
        let mut simulation = Simulation::new(TimeDate::from_total_days(day), 0, 3);
        let mut scenario = Scenario::new("test");
        let mut event = HistoricalEvent::new("Golden spike", "Rails joined.", day);
        let mut ctx = EventContext {
            simulation: &mut simulation,
            scenario: &mut scenario,
        };
        assert_eq!(
            event.trigger(&mut ctx).unwrap(),
            vec!["1869-05-10: Rails joined.".to_string()]
        );
    }
}
