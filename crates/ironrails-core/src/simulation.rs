use bevy::prelude::*;

use crate::calendar::{Day, TimeDate};
use crate::config::Catalog;
use crate::error::{SimError, SimResult};
use crate::events::factory;
use crate::resources::{EventLog, Simulation, SimulationFault};
use crate::route::Route;
use crate::scenario::{build_demo, Scenario};
use crate::scheduler::{DayCompletedEvent, EventScheduler};
use crate::systems::*;

/// Log lines kept in memory for inspection
const EVENT_LOG_CAPACITY: usize = 5_000;

/// Main simulation app that runs headless, one day per update
pub struct SimulationApp {
    app: App,
}

impl SimulationApp {
    pub fn new(catalog: Catalog) -> SimResult<Self> {
        let simulation = Simulation::from_settings(&catalog.simulation)?;

        let mut scheduler = EventScheduler::new();
        factory::create_availability_events(&catalog, &simulation, &mut scheduler.events)?;
        factory::create_historical_events(&catalog, simulation.current_time(), &mut scheduler.events)?;

        let mut app = App::new();

        // Add minimal Bevy plugins for ECS
        app.add_plugins(MinimalPlugins);

        app.insert_resource(catalog)
            .insert_resource(simulation)
            .insert_resource(scheduler)
            .insert_resource(EventLog::new(EVENT_LOG_CAPACITY))
            .init_resource::<Scenario>()
            .init_resource::<SimulationFault>();

        app.add_event::<DayCompletedEvent>();

        app.add_systems(
            Update,
            (trigger_due_events_system, record_day_system, advance_day_system).chain(),
        );

        Ok(Self { app })
    }

    /// Initialize the simulation with the built-in demo scenario
    pub fn initialize_demo(&mut self) -> SimResult<()> {
        let (scenario, routes) = build_demo(self.catalog())?;
        self.load_scenario(scenario, routes)?;
        log::info!("Demo simulation initialized");
        Ok(())
    }

    /// Replaces the scenario and schedules its production and routes.
    pub fn load_scenario(&mut self, mut scenario: Scenario, routes: Vec<Route>) -> SimResult<()> {
        let world = self.app.world_mut();
        let catalog = world.resource::<Catalog>().clone();
        let simulation = world.resource::<Simulation>().clone();

        let mut scheduler = world.resource::<EventScheduler>().clone();
        scheduler.sync_with_scenario(&catalog, &simulation, &mut scenario)?;
        for route in routes {
            scheduler.add_route(route, &scenario, simulation.current_time())?;
        }

        world.insert_resource(scenario);
        world.insert_resource(scheduler);
        Ok(())
    }

    /// Adds a route to the running simulation. Returns false if the name is taken.
    pub fn add_route(&mut self, route: Route) -> SimResult<bool> {
        self.app
            .world_mut()
            .resource_scope(|world, mut scheduler: Mut<EventScheduler>| {
                let day = world.resource::<Simulation>().current_time();
                scheduler.add_route(route, world.resource::<Scenario>(), day)
            })
    }

    /// Pauses or resumes a running route by name.
    pub fn set_route_active(&mut self, route_name: &str, active: bool) -> SimResult<()> {
        let mut scheduler = self.app.world_mut().resource_mut::<EventScheduler>();
        let event = scheduler
            .route_event_mut(route_name)
            .ok_or_else(|| SimError::UnknownRoute(route_name.to_string()))?;
        event.set_active(active);

        log::info!(
            "Route {} {}",
            route_name,
            if active { "resumed" } else { "paused" }
        );
        Ok(())
    }

    /// Rescans the scenario after stations or associations changed.
    pub fn sync_scenario(&mut self) -> SimResult<usize> {
        let world = self.app.world_mut();
        let catalog = world.resource::<Catalog>().clone();
        let simulation = world.resource::<Simulation>().clone();
        world.resource_scope(|world, mut scheduler: Mut<EventScheduler>| {
            let mut scenario = world.resource_mut::<Scenario>();
            scheduler.sync_with_scenario(&catalog, &simulation, &mut scenario)
        })
    }

    /// Run a single simulated day
    pub fn tick(&mut self) -> SimResult<()> {
        self.check_fault()?;
        self.app.update();
        self.check_fault()
    }

    /// Run the simulation for `days` days, stopping at the first error
    pub fn run_days(&mut self, days: u64) -> SimResult<()> {
        for _ in 0..days {
            self.tick()?;
        }
        Ok(())
    }

    fn check_fault(&self) -> SimResult<()> {
        match &self.app.world().resource::<SimulationFault>().0 {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn current_day(&self) -> Day {
        self.simulation().current_time()
    }

    pub fn current_date(&self) -> TimeDate {
        self.simulation().current_date()
    }

    pub fn money(&self) -> i64 {
        self.simulation().actual_money
    }

    pub fn simulation(&self) -> &Simulation {
        self.app.world().resource::<Simulation>()
    }

    pub fn scenario(&self) -> &Scenario {
        self.app.world().resource::<Scenario>()
    }

    pub fn scheduler(&self) -> &EventScheduler {
        self.app.world().resource::<EventScheduler>()
    }

    pub fn catalog(&self) -> &Catalog {
        self.app.world().resource::<Catalog>()
    }

    pub fn event_log(&self) -> &EventLog {
        self.app.world().resource::<EventLog>()
    }

    pub fn fault(&self) -> Option<&SimError> {
        self.app.world().resource::<SimulationFault>().0.as_ref()
    }

    /// Get a resource from the simulation
    pub fn get_resource<T: Resource>(&self) -> Option<&T> {
        self.app.world().get_resource::<T>()
    }

    /// Get a mutable resource from the simulation
    pub fn get_resource_mut<T: Resource>(&mut self) -> Option<Mut<T>> {
        self.app.world_mut().get_resource_mut::<T>()
    }

    /// Calculate state hash for determinism verification
    pub fn calculate_state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        // Every container in the state is ordered, so the debug dump is stable
        format!("{:?}", self.simulation()).hash(&mut hasher);
        format!("{:?}", self.scenario()).hash(&mut hasher);
        format!("{:?}", self.scheduler()).hash(&mut hasher);

        hasher.finish()
    }

    /// Save current state to file
    pub fn save_state(&self, filename: &str) -> anyhow::Result<()> {
        crate::save::save_game_state(self.app.world(), filename)
    }

    /// Load state from file
    pub fn load_state(&mut self, filename: &str) -> anyhow::Result<()> {
        crate::save::load_game_state(self.app.world_mut(), filename)
    }
}
