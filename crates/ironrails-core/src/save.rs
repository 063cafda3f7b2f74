use anyhow::{Context, Result};
use bevy::prelude::*;
use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::resources::{Simulation, SimulationFault};
use crate::scenario::Scenario;
use crate::scheduler::EventScheduler;

/// Serializable game state for save/load
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: String,
    pub simulation: Simulation,
    pub scenario: Scenario,
    pub scheduler: EventScheduler,
}

impl SaveGame {
    pub fn from_world(world: &World) -> Result<Self> {
        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            simulation: world
                .get_resource::<Simulation>()
                .context("world has no simulation ledger")?
                .clone(),
            scenario: world
                .get_resource::<Scenario>()
                .context("world has no scenario")?
                .clone(),
            scheduler: world
                .get_resource::<EventScheduler>()
                .context("world has no event scheduler")?
                .clone(),
        })
    }
}

/// Save game state to file
pub fn save_game_state(world: &World, filename: &str) -> Result<()> {
    let game_state = SaveGame::from_world(world)?;

    let serialized = to_string_pretty(&game_state, PrettyConfig::default())?;
    fs::write(filename, serialized).with_context(|| format!("writing save file {}", filename))?;

    log::info!(
        "Game state saved to {} ({})",
        filename,
        game_state.simulation.current_date()
    );
    Ok(())
}

/// Read a save file without touching any world.
pub fn read_save(filename: &str) -> Result<SaveGame> {
    let content =
        fs::read_to_string(filename).with_context(|| format!("reading save file {}", filename))?;
    let game_state: SaveGame =
        ron::from_str(&content).with_context(|| format!("parsing save file {}", filename))?;

    if game_state.version != env!("CARGO_PKG_VERSION") {
        log::warn!(
            "Save {} was written by version {}, running {}",
            filename,
            game_state.version,
            env!("CARGO_PKG_VERSION")
        );
    }

    for event in game_state.scheduler.route_events() {
        event
            .route
            .check_position()
            .with_context(|| format!("invalid route in save file {}", filename))?;
    }
    Ok(game_state)
}

/// Load game state from file, replacing the ledger, scenario and schedule
pub fn load_game_state(world: &mut World, filename: &str) -> Result<()> {
    let game_state = read_save(filename)?;
    let date = game_state.simulation.current_date();

    world.insert_resource(game_state.simulation);
    world.insert_resource(game_state.scenario);
    world.insert_resource(game_state.scheduler);
    world.insert_resource(SimulationFault::default());

    log::info!("Game state loaded from {} ({})", filename, date);
    Ok(())
}
