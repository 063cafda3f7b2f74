use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::TrainId;
use crate::error::{SimError, SimResult};
use crate::stations::StationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(pub usize);

/// Railway track between two stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailwayLine {
    pub id: LineId,
    pub from: StationId,
    pub to: StationId,
    /// Number of map positions the track occupies
    pub length: u64,
}

impl RailwayLine {
    /// The station at the other end, if `station` is one of the ends.
    pub fn other_end(&self, station: StationId) -> Option<StationId> {
        if self.from == station {
            Some(self.to)
        } else if self.to == station {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Departure policy at a stop, based on how full the train is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CargoMode {
    /// Wait until the train is completely full
    Full,
    /// Wait until the train is at least half full
    Half,
    /// Leave with whatever is on board
    Available,
}

impl CargoMode {
    pub fn blocks_departure(&self, fill_ratio: f64) -> bool {
        match self {
            CargoMode::Full => fill_ratio < 1.0,
            CargoMode::Half => fill_ratio < 0.5,
            CargoMode::Available => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfRoute {
    pub station: StationId,
    /// Resource types to load at this stop
    pub cargo_to_pick: Vec<String>,
    pub cargo_mode: CargoMode,
}

impl PointOfRoute {
    pub fn new(station: StationId, cargo_to_pick: &[&str], cargo_mode: CargoMode) -> Self {
        Self {
            station,
            cargo_to_pick: cargo_to_pick.iter().map(|s| s.to_string()).collect(),
            cargo_mode,
        }
    }
}

/// Cyclic tour of stops served by one train
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub points: Vec<PointOfRoute>,
    /// Lines walked in order, from the first stop around back to it
    pub path: Vec<LineId>,
    pub assigned_train: Option<TrainId>,
    pub active: bool,
    /// Index of the stop the train is currently at
    pub position: usize,
    /// True right after arriving (cargo to unload), false while waiting for cargo
    pub transferring: bool,
}

impl Route {
    pub fn new(name: &str, points: Vec<PointOfRoute>, path: Vec<LineId>) -> SimResult<Self> {
        if points.len() < 2 {
            return Err(SimError::RouteTooShort {
                route: name.to_string(),
                stops: points.len(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            points,
            path,
            assigned_train: None,
            active: false,
            position: 0,
            transferring: false,
        })
    }

    pub fn activate(&mut self, train: TrainId) {
        self.assigned_train = Some(train);
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Active with a train to run.
    pub fn is_running(&self) -> bool {
        self.active && self.assigned_train.is_some()
    }

    /// Panics if `position` is out of range; see [`Route::check_position`].
    pub fn current_point(&self) -> &PointOfRoute {
        &self.points[self.position]
    }

    /// Rejects a stop cursor that does not point into the stop list.
    pub fn check_position(&self) -> SimResult<()> {
        if self.position >= self.points.len() {
            return Err(SimError::RoutePositionOutOfRange {
                route: self.name.clone(),
                position: self.position,
                stops: self.points.len(),
            });
        }
        Ok(())
    }

    pub fn next_position(&self) -> usize {
        (self.position + 1) % self.points.len()
    }

    pub fn advance_position(&mut self) {
        self.position = self.next_position();
    }
}

/// One step of a route's complete path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Arrival at the stop with this index in the route's point list
    Stop(usize),
    Line(LineId),
}

/// Walks `route.path` from the first stop and marks every stop it reaches.
///
/// The result begins with `Stop(0)` and ends with a closing `Stop(0)`, so
/// each leg `i -> i+1` sits between two consecutive stop markers.
pub fn build_complete_path(
    route: &Route,
    lines: &BTreeMap<LineId, RailwayLine>,
) -> SimResult<Vec<PathSegment>> {
    let stops = route.points.len();
    let mut segments = vec![PathSegment::Stop(0)];
    let mut current = route.points[0].station;
    let mut next_stop = 1;

    for line_id in &route.path {
        let line = lines.get(line_id).ok_or(SimError::UnknownLine(*line_id))?;
        current = line.other_end(current).ok_or_else(|| SimError::DisconnectedPath {
            route: route.name.clone(),
            line: *line_id,
        })?;
        segments.push(PathSegment::Line(*line_id));

        if next_stop <= stops && current == route.points[next_stop % stops].station {
            segments.push(PathSegment::Stop(next_stop % stops));
            next_stop += 1;
        }
    }

    if next_stop <= stops {
        return Err(SimError::UnclosedPath {
            route: route.name.clone(),
        });
    }
    Ok(segments)
}

/// Lines travelled between stop `from` and the following stop.
pub fn leg_lines(complete_path: &[PathSegment], from: usize) -> Vec<LineId> {
    let start = complete_path
        .iter()
        .position(|s| *s == PathSegment::Stop(from))
        .unwrap_or(complete_path.len());

    complete_path
        .iter()
        .skip(start + 1)
        .take_while(|s| matches!(s, PathSegment::Line(_)))
        .filter_map(|s| match s {
            PathSegment::Line(id) => Some(*id),
            PathSegment::Stop(_) => None,
        })
        .collect()
}

/// Length of the leg starting at stop `from`.
pub fn leg_distance(
    complete_path: &[PathSegment],
    from: usize,
    lines: &BTreeMap<LineId, RailwayLine>,
) -> SimResult<u64> {
    leg_lines(complete_path, from)
        .into_iter()
        .map(|id| lines.get(&id).map(|l| l.length).ok_or(SimError::UnknownLine(id)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> BTreeMap<LineId, RailwayLine> {
        let mut lines = BTreeMap::new();
        for (id, from, to, length) in [(0, 0, 1, 30), (1, 1, 2, 20), (2, 2, 0, 50), (3, 1, 3, 5)] {
            lines.insert(
                LineId(id),
                RailwayLine {
                    id: LineId(id),
                    from: StationId(from),
                    to: StationId(to),
                    length,
                },
            );
        }
        lines
    }

    fn point(station: usize) -> PointOfRoute {
        PointOfRoute::new(StationId(station), &[], CargoMode::Available)
    }

    #[test]
    fn test_route_needs_two_stops() {
        let err = Route::new("solo", vec![point(0)], vec![]).unwrap_err();
        assert_eq!(
            err,
            SimError::RouteTooShort {
                route: "solo".to_string(),
                stops: 1
            }
        );
    }

    #[test]
    fn test_position_wraps_around() {
        let mut route = Route::new("r", vec![point(0), point(1), point(2)], vec![]).unwrap();
        route.position = 2;
        route.advance_position();
        assert_eq!(route.position, 0);
        route.advance_position();
        assert_eq!(route.position, 1);
    }

    #[test]
    fn test_position_out_of_range_rejected() {
        let mut route = Route::new("r", vec![point(0), point(1)], vec![]).unwrap();
        assert!(route.check_position().is_ok());

        route.position = 2;
        assert_eq!(
            route.check_position(),
            Err(SimError::RoutePositionOutOfRange {
                route: "r".to_string(),
                position: 2,
                stops: 2,
            })
        );
    }

    #[test]
    fn test_cargo_mode_gate() {
        assert!(CargoMode::Full.blocks_departure(0.99));
        assert!(!CargoMode::Full.blocks_departure(1.0));
        assert!(CargoMode::Half.blocks_departure(0.49));
        assert!(!CargoMode::Half.blocks_departure(0.5));
        assert!(!CargoMode::Available.blocks_departure(0.0));
    }

    #[test]
    fn test_complete_path_for_out_and_back() {
        let route = Route::new("shuttle", vec![point(0), point(1)], vec![LineId(0), LineId(0)]).unwrap();
        let path = build_complete_path(&route, &lines()).unwrap();
        assert_eq!(
            path,
            vec![
                PathSegment::Stop(0),
                PathSegment::Line(LineId(0)),
                PathSegment::Stop(1),
                PathSegment::Line(LineId(0)),
                PathSegment::Stop(0),
            ]
        );
        assert_eq!(leg_distance(&path, 0, &lines()).unwrap(), 30);
        assert_eq!(leg_distance(&path, 1, &lines()).unwrap(), 30);
    }

    #[test]
    fn test_leg_distance_with_pass_through_station() {
        // 0 -> 2 passing through station 1, then back on the direct line
        let route = Route::new(
            "loop",
            vec![point(0), point(2)],
            vec![LineId(0), LineId(1), LineId(2)],
        )
        .unwrap();
        let path = build_complete_path(&route, &lines()).unwrap();
        assert_eq!(leg_lines(&path, 0), vec![LineId(0), LineId(1)]);
        assert_eq!(leg_distance(&path, 0, &lines()).unwrap(), 50);
        assert_eq!(leg_distance(&path, 1, &lines()).unwrap(), 50);
    }

    #[test]
    fn test_revisited_station_is_resolved_by_stop_index() {
        // 0 -> 1 -> 3 -> 1 -> 0 where station 1 is visited twice
        let route = Route::new(
            "branch",
            vec![point(0), point(1), point(3), point(1)],
            vec![LineId(0), LineId(3), LineId(3), LineId(0)],
        )
        .unwrap();
        let path = build_complete_path(&route, &lines()).unwrap();
        assert_eq!(leg_distance(&path, 2, &lines()).unwrap(), 5);
        assert_eq!(leg_distance(&path, 3, &lines()).unwrap(), 30);
    }

    #[test]
    fn test_disconnected_path_rejected() {
        let route = Route::new("broken", vec![point(0), point(1)], vec![LineId(1)]).unwrap();
        assert!(matches!(
            build_complete_path(&route, &lines()),
            Err(SimError::DisconnectedPath { .. })
        ));
    }

    #[test]
    fn test_unclosed_path_rejected() {
        let route = Route::new("oneway", vec![point(0), point(1)], vec![LineId(0)]).unwrap();
        assert!(matches!(
            build_complete_path(&route, &lines()),
            Err(SimError::UnclosedPath { .. })
        ));
    }
}
