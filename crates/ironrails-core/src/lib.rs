// Iron Rails - Core simulation engine
// MIT License

pub mod calendar;
pub mod components;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod events;
pub mod physics;
pub mod resources;
pub mod route;
pub mod save;
pub mod scenario;
pub mod scheduler;
pub mod simulation;
pub mod stations;
pub mod systems;

pub use simulation::SimulationApp;

// Re-export commonly used types
pub use calendar::{Day, TimeDate};
pub use components::*;
pub use config::Catalog;
pub use error::{SimError, SimResult};
pub use events::{EventList, SimEvent};
pub use resources::*;
pub use route::{CargoMode, LineId, PointOfRoute, Route};
pub use scenario::Scenario;
pub use scheduler::{DayReport, EventScheduler};
pub use stations::{AssociationId, Position, StationId};
