use thiserror::Error;

use crate::components::TrainId;
use crate::route::LineId;
use crate::stations::{AssociationId, StationId};

/// Errors raised by the simulation engine.
///
/// Everything here is either a configuration error or a broken caller
/// contract. Expected no-ops (missing transformation inputs, empty station
/// stock, absent demand) are never reported through this type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimError {
    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: u32, month: u32, day: u32 },

    #[error("route '{route}' has {stops} stop(s), at least 2 are required")]
    RouteTooShort { route: String, stops: usize },

    #[error("route '{route}' path is broken at railway line {line:?}")]
    DisconnectedPath { route: String, line: LineId },

    #[error("route '{route}' path does not visit every stop and return to the first one")]
    UnclosedPath { route: String },

    #[error("train '{train}' cannot cover any distance in a day (check acceleration, top speed and carriages)")]
    ZeroDailyDistance { train: String },

    #[error("unknown station {0:?}")]
    UnknownStation(StationId),

    #[error("unknown station association {0:?}")]
    UnknownAssociation(AssociationId),

    #[error("unknown railway line {0:?}")]
    UnknownLine(LineId),

    #[error("unknown train {0:?}")]
    UnknownTrain(TrainId),

    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    #[error("unknown industry template '{0}'")]
    UnknownTemplate(String),

    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    #[error("route '{route}' is at stop {position} but has only {stops} stop(s)")]
    RoutePositionOutOfRange {
        route: String,
        position: usize,
        stops: usize,
    },
}

pub type SimResult<T> = Result<T, SimError>;
