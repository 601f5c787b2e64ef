// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Query services over a constructed [Engine].
//!
//! Every service runs synchronously on the calling thread and returns an
//! OSRM-style JSON result tree on success, or a [ServiceError] carrying the
//! machine-readable `code` and human-readable `message` of the failure.

use serde_json::{json, Value};

use super::params::{
    Annotations, BaseParameters, Bearing, Coordinate, MatchParameters, NearestParameters,
    RouteParameters, TableParameters, TripDestination, TripParameters, TripSource,
};
use super::Engine;
use crate::{earth_distance, initial_bearing, shortest_path, Graph, Node, DEFAULT_STEP_LIMIT};

/// A structured, non-exceptional query failure, mirroring the `code` and
/// `message` members of the engine's error result trees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: String,
    pub message: String,
}

impl ServiceError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn no_segment(index: usize) -> Self {
        Self::new(
            "NoSegment",
            format!("could not snap coordinate {} to the road network", index),
        )
    }

    fn no_route() -> Self {
        Self::new("NoRoute", "Impossible route between points")
    }

    fn invalid_options(message: impl Into<String>) -> Self {
        Self::new("InvalidOptions", message)
    }

    fn invalid_value(message: impl Into<String>) -> Self {
        Self::new("InvalidValue", message)
    }

    fn no_match() -> Self {
        Self::new("NoMatch", "could not match the trace to the road network")
    }
}

/// One input coordinate resolved onto the road network.
#[derive(Debug, Clone, Copy)]
struct Snapped {
    node: Node,
    distance: f32,
}

/// The street name a snapped node is reported under: the name of its first
/// named outgoing road, or an empty string.
fn node_name<'a>(g: &'a Graph, id: i64) -> &'a str {
    g.get_edges(id)
        .iter()
        .find_map(|e| g.name(e.name))
        .unwrap_or_default()
}

fn bearing_matches(heading: f32, bearing: Bearing) -> bool {
    let diff = (heading - bearing.value as f32).rem_euclid(360.0);
    let range = bearing.range as f32;
    diff <= range || diff >= 360.0 - range
}

fn waypoint_json(g: &Graph, snapped: &Snapped) -> Value {
    json!({
        "name": node_name(g, snapped.node.id),
        "location": [snapped.node.lon, snapped.node.lat],
        "distance": snapped.distance,
    })
}

/// Sums a node path into per-leg metrics and the optional `steps` and
/// `annotation` members.
fn leg_json(g: &Graph, path: &[i64], annotations: Annotations, steps: bool) -> Value {
    let mut distance = 0.0f32;
    let mut duration = 0.0f32;
    let mut annotation_distance = Vec::new();
    let mut annotation_duration = Vec::new();
    let mut step_list: Vec<Value> = Vec::new();

    for pair in path.windows(2) {
        // Path nodes come from the search, so the edge must exist.
        let edge = g.get_edge(pair[0], pair[1]).expect("path edge must exist");
        distance += edge.distance;
        duration += edge.duration;

        if annotations.distance {
            annotation_distance.push(edge.distance);
        }
        if annotations.duration {
            annotation_duration.push(edge.duration);
        }

        if steps {
            let name = g.name(edge.name).unwrap_or_default();
            // Consecutive edges along the same street collapse into one step.
            match step_list.last_mut() {
                Some(last) if last["name"] == name => {
                    let d = last["distance"].as_f64().unwrap_or(0.0) + edge.distance as f64;
                    let t = last["duration"].as_f64().unwrap_or(0.0) + edge.duration as f64;
                    last["distance"] = json!(d);
                    last["duration"] = json!(t);
                }
                _ => step_list.push(json!({
                    "name": name,
                    "distance": edge.distance,
                    "duration": edge.duration,
                })),
            }
        }
    }

    let mut leg = json!({
        "distance": distance,
        "duration": duration,
    });
    if annotations.distance || annotations.duration {
        let mut annotation = serde_json::Map::new();
        if annotations.distance {
            annotation.insert("distance".to_string(), json!(annotation_distance));
        }
        if annotations.duration {
            annotation.insert("duration".to_string(), json!(annotation_duration));
        }
        leg["annotation"] = Value::Object(annotation);
    }
    if steps {
        leg["steps"] = json!(step_list);
    }
    leg
}

fn leg_metrics(leg: &Value) -> (f64, f64) {
    (
        leg["distance"].as_f64().unwrap_or(0.0),
        leg["duration"].as_f64().unwrap_or(0.0),
    )
}

/// Visits the snapped coordinates greedily by crow-flies distance, starting
/// from `start` and keeping `pinned_end` for last.
fn greedy_order(snapped: &[Snapped], start: usize, pinned_end: Option<usize>) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..snapped.len())
        .filter(|&i| i != start && Some(i) != pinned_end)
        .collect();
    let mut order = vec![start];
    while !remaining.is_empty() {
        let cur = snapped[*order.last().unwrap()].node;
        let (pos, _) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| {
                let da = earth_distance(cur.lat, cur.lon, snapped[a].node.lat, snapped[a].node.lon);
                let db = earth_distance(cur.lat, cur.lon, snapped[b].node.lat, snapped[b].node.lon);
                da.partial_cmp(&db).unwrap()
            })
            .map(|(pos, &i)| (pos, i))
            .unwrap();
        order.push(remaining.swap_remove(pos));
    }
    if let Some(end) = pinned_end {
        order.push(end);
    }
    order
}

/// Total crow-flies length of a visiting order, used to compare candidate
/// tours before any road routing happens.
fn crow_flies_length(snapped: &[Snapped], order: &[usize], roundtrip: bool) -> f32 {
    let mut total: f32 = order
        .windows(2)
        .map(|w| {
            let a = snapped[w[0]].node;
            let b = snapped[w[1]].node;
            earth_distance(a.lat, a.lon, b.lat, b.lon)
        })
        .sum();
    if roundtrip {
        let first = snapped[order[0]].node;
        let last = snapped[*order.last().unwrap()].node;
        total += earth_distance(last.lat, last.lon, first.lat, first.lon);
    }
    total
}

impl Engine {
    /// Snaps a single input coordinate, honoring its radius and bearing
    /// constraints.
    fn snap_one(
        &self,
        index: usize,
        coordinate: Coordinate,
        radius: Option<f32>,
        bearing: Option<Bearing>,
    ) -> Result<Snapped, ServiceError> {
        let kd = self.index().ok_or_else(|| ServiceError::no_segment(index))?;
        let (node, distance) = kd.find_nearest_node(coordinate.latitude, coordinate.longitude);

        if let Some(radius) = radius {
            if distance > radius {
                return Err(ServiceError::no_segment(index));
            }
        }

        if let Some(bearing) = bearing {
            let g = self.graph();
            let matches = g.get_edges(node.id).iter().any(|e| {
                g.get_node(e.to).is_some_and(|to| {
                    bearing_matches(
                        initial_bearing(node.lat, node.lon, to.lat, to.lon),
                        bearing,
                    )
                })
            });
            if !matches {
                return Err(ServiceError::no_segment(index));
            }
        }

        Ok(Snapped { node, distance })
    }

    fn snap_all(&self, base: &BaseParameters) -> Result<Vec<Snapped>, ServiceError> {
        base.coordinates
            .iter()
            .enumerate()
            .map(|(i, &c)| self.snap_one(i, c, base.radiuses[i], base.bearings[i]))
            .collect()
    }

    /// Finds the fastest node path between two snapped points.
    /// Any search failure surfaces as `NoRoute`.
    fn path_between(&self, from: i64, to: i64) -> Result<Vec<i64>, ServiceError> {
        let path = shortest_path(self.graph(), from, to, DEFAULT_STEP_LIMIT)
            .map_err(|e| ServiceError::new("NoRoute", e.to_string()))?;
        if path.is_empty() && from != to {
            return Err(ServiceError::no_route());
        }
        Ok(path)
    }

    /// Computes the fastest route through the parameter coordinates, in
    /// order. The result tree holds one `routes[0]` entry and one waypoint
    /// per input coordinate.
    pub fn route(&self, params: &RouteParameters) -> Result<Value, ServiceError> {
        let snapped = self.snap_all(&params.base)?;
        if snapped.len() < 2 {
            return Err(ServiceError::invalid_options(
                "the route service needs at least two coordinates",
            ));
        }

        let g = self.graph();
        let mut legs = Vec::with_capacity(snapped.len() - 1);
        let mut distance = 0.0f64;
        let mut duration = 0.0f64;
        for pair in snapped.windows(2) {
            let path = self.path_between(pair[0].node.id, pair[1].node.id)?;
            let leg = leg_json(g, &path, params.annotations, params.steps);
            let (d, t) = leg_metrics(&leg);
            distance += d;
            duration += t;
            legs.push(leg);
        }

        // A single optimal route; the `alternatives` flag does not grow the array.
        Ok(json!({
            "code": "Ok",
            "routes": [{
                "distance": distance,
                "duration": duration,
                "legs": legs,
            }],
            "waypoints": snapped.iter().map(|s| waypoint_json(g, s)).collect::<Vec<_>>(),
        }))
    }

    /// Computes a travel-time (and optionally distance) matrix between the
    /// parameter coordinates. Unroutable cells are `null`.
    pub fn table(&self, params: &TableParameters) -> Result<Value, ServiceError> {
        let snapped = self.snap_all(&params.base)?;
        if snapped.len() < 2 {
            return Err(ServiceError::invalid_options(
                "the table service needs at least two coordinates",
            ));
        }
        if !params.annotations.duration && !params.annotations.distance {
            return Err(ServiceError::invalid_options(
                "the table service needs at least one annotation",
            ));
        }

        let resolve = |indices: &[usize]| -> Result<Vec<usize>, ServiceError> {
            if indices.is_empty() {
                return Ok((0..snapped.len()).collect());
            }
            for &i in indices {
                if i >= snapped.len() {
                    return Err(ServiceError::invalid_value(format!(
                        "coordinate index {} is out of range",
                        i
                    )));
                }
            }
            Ok(indices.to_vec())
        };
        let sources = resolve(&params.sources)?;
        let destinations = resolve(&params.destinations)?;

        let g = self.graph();
        let mut durations: Vec<Vec<Value>> = Vec::with_capacity(sources.len());
        let mut distances: Vec<Vec<Value>> = Vec::with_capacity(sources.len());
        for &from in &sources {
            let mut duration_row = Vec::with_capacity(destinations.len());
            let mut distance_row = Vec::with_capacity(destinations.len());
            for &to in &destinations {
                match self.matrix_cell(snapped[from].node.id, snapped[to].node.id) {
                    Some((d, t)) => {
                        duration_row.push(json!(t));
                        distance_row.push(json!(d));
                    }
                    None => {
                        duration_row.push(Value::Null);
                        distance_row.push(Value::Null);
                    }
                }
            }
            durations.push(duration_row);
            distances.push(distance_row);
        }

        let mut out = json!({
            "code": "Ok",
            "sources": sources.iter().map(|&i| waypoint_json(g, &snapped[i])).collect::<Vec<_>>(),
            "destinations": destinations.iter().map(|&i| waypoint_json(g, &snapped[i])).collect::<Vec<_>>(),
        });
        if params.annotations.duration {
            out["durations"] = json!(durations);
        }
        if params.annotations.distance {
            out["distances"] = json!(distances);
        }
        Ok(out)
    }

    /// One table cell: total (distance, duration) of the fastest path, or
    /// `None` when no route exists.
    fn matrix_cell(&self, from: i64, to: i64) -> Option<(f32, f32)> {
        if from == to {
            return Some((0.0, 0.0));
        }
        let path = shortest_path(self.graph(), from, to, DEFAULT_STEP_LIMIT).ok()?;
        if path.is_empty() {
            return None;
        }
        let g = self.graph();
        let mut distance = 0.0;
        let mut duration = 0.0;
        for pair in path.windows(2) {
            let edge = g.get_edge(pair[0], pair[1])?;
            distance += edge.distance;
            duration += edge.duration;
        }
        Some((distance, duration))
    }

    /// Computes an optimized visiting order over the parameter coordinates
    /// (greedy nearest-neighbor), then routes along that order.
    pub fn trip(&self, params: &TripParameters) -> Result<Value, ServiceError> {
        let snapped = self.snap_all(&params.base)?;
        if snapped.len() < 2 {
            return Err(ServiceError::invalid_options(
                "the trip service needs at least two coordinates",
            ));
        }

        // TripSource::First pins the first coordinate as the start; with
        // TripSource::Any every coordinate is a candidate start and the
        // shortest greedy tour wins. TripDestination::Last pins the final
        // coordinate to the end of the visiting order.
        let n = snapped.len();
        let pinned_end = match params.destination {
            TripDestination::Last => Some(n - 1),
            TripDestination::Any => None,
        };
        let starts: Vec<usize> = match params.source {
            TripSource::First => vec![0],
            TripSource::Any => (0..n).filter(|&i| Some(i) != pinned_end).collect(),
        };

        let mut order = greedy_order(&snapped, starts[0], pinned_end);
        let mut order_length = crow_flies_length(&snapped, &order, params.roundtrip);
        for &start in &starts[1..] {
            let candidate = greedy_order(&snapped, start, pinned_end);
            let candidate_length = crow_flies_length(&snapped, &candidate, params.roundtrip);
            if candidate_length < order_length {
                order = candidate;
                order_length = candidate_length;
            }
        }

        let g = self.graph();
        let mut legs = Vec::new();
        let mut distance = 0.0f64;
        let mut duration = 0.0f64;
        let mut pairs: Vec<(usize, usize)> =
            order.windows(2).map(|w| (w[0], w[1])).collect();
        if params.roundtrip {
            pairs.push((*order.last().unwrap(), order[0]));
        }
        for (from, to) in pairs {
            let path = self.path_between(snapped[from].node.id, snapped[to].node.id)?;
            let leg = leg_json(g, &path, params.annotations, false);
            let (d, t) = leg_metrics(&leg);
            distance += d;
            duration += t;
            legs.push(leg);
        }

        let waypoints: Vec<Value> = snapped
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut w = waypoint_json(g, s);
                w["trips_index"] = json!(0);
                w["waypoint_index"] = json!(order.iter().position(|&o| o == i).unwrap());
                w
            })
            .collect();

        Ok(json!({
            "code": "Ok",
            "trips": [{
                "distance": distance,
                "duration": duration,
                "legs": legs,
            }],
            "waypoints": waypoints,
        }))
    }

    /// Finds the closest road-network points to the single input coordinate.
    pub fn nearest(&self, params: &NearestParameters) -> Result<Value, ServiceError> {
        if params.base.coordinates.len() != 1 {
            return Err(ServiceError::invalid_options(
                "the nearest service needs exactly one coordinate",
            ));
        }
        if params.number_of_results == 0 {
            return Err(ServiceError::invalid_value(
                "number_of_results must be at least 1",
            ));
        }

        let coordinate = params.base.coordinates[0];
        let radius = params.base.radiuses[0];
        let g = self.graph();

        let mut candidates: Vec<(f32, Node)> = g
            .iter()
            .map(|&n| {
                (
                    earth_distance(coordinate.latitude, coordinate.longitude, n.lat, n.lon),
                    n,
                )
            })
            .filter(|&(d, _)| radius.map_or(true, |r| d <= r))
            .collect();
        candidates.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap());
        candidates.truncate(params.number_of_results as usize);

        if candidates.is_empty() {
            return Err(ServiceError::no_segment(0));
        }

        Ok(json!({
            "code": "Ok",
            "waypoints": candidates
                .iter()
                .map(|&(distance, node)| waypoint_json(g, &Snapped { node, distance }))
                .collect::<Vec<_>>(),
        }))
    }

    /// Matches a recorded trace onto the road network: every point snaps
    /// individually (failures become `null` tracepoints), and consecutive
    /// snapped points are joined by fastest paths.
    pub fn match_trace(&self, params: &MatchParameters) -> Result<Value, ServiceError> {
        let coordinates = &params.base.coordinates;
        if coordinates.len() < 2 {
            return Err(ServiceError::invalid_options(
                "the match service needs at least two coordinates",
            ));
        }
        if !params.timestamps.is_empty() {
            if params.timestamps.len() != coordinates.len() {
                return Err(ServiceError::invalid_options(
                    "the number of timestamps must match the number of coordinates",
                ));
            }
            if params.timestamps.windows(2).any(|w| w[0] > w[1]) {
                return Err(ServiceError::invalid_value(
                    "timestamps must be monotonically non-decreasing",
                ));
            }
        }

        let snapped: Vec<Option<Snapped>> = coordinates
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                self.snap_one(i, c, params.base.radiuses[i], params.base.bearings[i])
                    .ok()
            })
            .collect();
        let matched = snapped.iter().flatten().copied().collect::<Vec<_>>();
        if matched.len() < 2 {
            return Err(ServiceError::no_match());
        }

        let g = self.graph();
        let mut distance = 0.0f64;
        let mut duration = 0.0f64;
        for pair in matched.windows(2) {
            let path = self
                .path_between(pair[0].node.id, pair[1].node.id)
                .map_err(|_| ServiceError::no_match())?;
            let leg = leg_json(g, &path, Annotations::default(), false);
            let (d, t) = leg_metrics(&leg);
            distance += d;
            duration += t;
        }

        let confidence = matched.len() as f64 / coordinates.len() as f64;
        let tracepoints: Vec<Value> = snapped
            .iter()
            .map(|s| match s {
                Some(s) => {
                    let mut w = waypoint_json(g, s);
                    w["matchings_index"] = json!(0);
                    w
                }
                None => Value::Null,
            })
            .collect();

        Ok(json!({
            "code": "Ok",
            "matchings": [{
                "distance": distance,
                "duration": duration,
                "confidence": confidence,
            }],
            "tracepoints": tracepoints,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Dataset, TripSource};
    use crate::network;

    const GRID: &[u8] = include_bytes!("../network/test_fixtures/grid.via.xml");

    fn engine() -> Engine {
        let graph = network::load_from_buffer(network::Format::Xml, GRID).unwrap();
        Engine::from_dataset(Dataset::from_graph(graph))
    }

    fn base(points: &[(f32, f32)]) -> BaseParameters {
        let mut base = BaseParameters::default();
        for &(lon, lat) in points {
            base.add_coordinate(lon, lat);
        }
        base
    }

    // Fixture nodes: 1 (21.00, 52.23), 3 (21.02, 52.23), 5 (21.00, 52.24),
    // 6 (21.01, 52.235; reachable from nowhere, one-way out).
    const NEAR_1: (f32, f32) = (21.0001, 52.2301);
    const NEAR_3: (f32, f32) = (21.0199, 52.2299);
    const NEAR_5: (f32, f32) = (21.0001, 52.2399);
    const NEAR_6: (f32, f32) = (21.0099, 52.2349);

    #[test]
    fn route_has_one_waypoint_per_coordinate_in_order() {
        let e = engine();
        let params = RouteParameters {
            base: base(&[NEAR_1, NEAR_3]),
            ..Default::default()
        };
        let out = e.route(&params).unwrap();

        assert_eq!(out["code"], "Ok");
        let waypoints = out["waypoints"].as_array().unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0]["name"], "Main Street");
        let loc = waypoints[0]["location"].as_array().unwrap();
        assert!((loc[0].as_f64().unwrap() - 21.0).abs() < 1e-4);

        let route = &out["routes"][0];
        assert!(route["distance"].as_f64().unwrap() > 0.0);
        assert!(route["duration"].as_f64().unwrap() > 0.0);
        assert_eq!(route["legs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn route_steps_and_annotations() {
        let e = engine();
        let params = RouteParameters {
            base: base(&[NEAR_1, NEAR_3]),
            steps: true,
            annotations: Annotations {
                duration: true,
                distance: true,
            },
            ..Default::default()
        };
        let out = e.route(&params).unwrap();

        let leg = &out["routes"][0]["legs"][0];
        let steps = leg["steps"].as_array().unwrap();
        // 1 -> 2 -> 3 is all Main Street, collapsed into a single step
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["name"], "Main Street");
        assert_eq!(leg["annotation"]["distance"].as_array().unwrap().len(), 2);
        assert_eq!(leg["annotation"]["duration"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn route_to_unreachable_node_is_no_route() {
        let e = engine();
        let params = RouteParameters {
            base: base(&[NEAR_5, NEAR_6]),
            ..Default::default()
        };
        let err = e.route(&params).unwrap_err();
        assert_eq!(err.code, "NoRoute");
    }

    #[test]
    fn snap_respects_radius() {
        let e = engine();
        let mut b = BaseParameters::default();
        // ~1 km away from everything with a 10 m tolerance
        b.add_coordinate_with(21.05, 52.25, 10.0, Bearing { value: 0, range: 180 });
        b.add_coordinate(NEAR_1.0, NEAR_1.1);
        let params = RouteParameters {
            base: b,
            ..Default::default()
        };
        let err = e.route(&params).unwrap_err();
        assert_eq!(err.code, "NoSegment");
    }

    #[test]
    fn snap_respects_bearing() {
        let e = engine();

        // Node 1 has roads heading east (Main Street) and north (River Lane)
        let mut ok = BaseParameters::default();
        ok.add_coordinate_with(NEAR_1.0, NEAR_1.1, 100.0, Bearing { value: 90, range: 30 });
        ok.add_coordinate(NEAR_3.0, NEAR_3.1);
        assert!(e
            .route(&RouteParameters {
                base: ok,
                ..Default::default()
            })
            .is_ok());

        // ... but nothing heading south
        let mut bad = BaseParameters::default();
        bad.add_coordinate_with(NEAR_1.0, NEAR_1.1, 100.0, Bearing { value: 180, range: 10 });
        bad.add_coordinate(NEAR_3.0, NEAR_3.1);
        let err = e
            .route(&RouteParameters {
                base: bad,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code, "NoSegment");
    }

    #[test]
    fn table_nulls_unreachable_cells() {
        let e = engine();
        let params = TableParameters {
            base: base(&[NEAR_1, NEAR_3, NEAR_6]),
            ..Default::default()
        };
        let out = e.table(&params).unwrap();

        let durations = out["durations"].as_array().unwrap();
        assert_eq!(durations.len(), 3);
        assert_eq!(durations[0].as_array().unwrap().len(), 3);
        assert_eq!(durations[0][0], json!(0.0));
        assert!(durations[0][1].as_f64().unwrap() > 0.0);
        // Node 6 can be left but never entered
        assert!(durations[0][2].is_null());
        assert!(durations[2][0].as_f64().unwrap() > 0.0);

        // distances only appear when requested
        assert!(out.get("distances").is_none());
    }

    #[test]
    fn table_subset_and_distances() {
        let e = engine();
        let params = TableParameters {
            base: base(&[NEAR_1, NEAR_3, NEAR_5]),
            sources: vec![0],
            destinations: vec![1, 2],
            annotations: Annotations {
                duration: true,
                distance: true,
            },
        };
        let out = e.table(&params).unwrap();

        assert_eq!(out["durations"].as_array().unwrap().len(), 1);
        assert_eq!(out["durations"][0].as_array().unwrap().len(), 2);
        assert_eq!(out["distances"].as_array().unwrap().len(), 1);
        assert!(out["distances"][0][0].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn table_rejects_bad_index() {
        let e = engine();
        let params = TableParameters {
            base: base(&[NEAR_1, NEAR_3]),
            sources: vec![5],
            ..Default::default()
        };
        assert_eq!(e.table(&params).unwrap_err().code, "InvalidValue");
    }

    #[test]
    fn trip_visits_every_coordinate() {
        let e = engine();
        let near_4 = (21.0199, 52.2401);
        let params = TripParameters {
            base: base(&[NEAR_1, NEAR_3, near_4, NEAR_5]),
            roundtrip: true,
            source: TripSource::First,
            destination: TripDestination::Any,
            ..Default::default()
        };
        let out = e.trip(&params).unwrap();

        assert_eq!(out["code"], "Ok");
        assert!(out["trips"][0]["distance"].as_f64().unwrap() > 0.0);
        // Closing leg included
        assert_eq!(out["trips"][0]["legs"].as_array().unwrap().len(), 4);

        let waypoints = out["waypoints"].as_array().unwrap();
        assert_eq!(waypoints.len(), 4);
        let mut indices: Vec<u64> = waypoints
            .iter()
            .map(|w| w["waypoint_index"].as_u64().unwrap())
            .collect();
        assert_eq!(indices[0], 0);
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn trip_pins_destination_last_and_picks_best_start() {
        let e = engine();
        // Nodes 1, 5 and 3 form a bent chain with 5 - 1 - 3 as its cheapest
        // open walk; with an Any source, the tour must not start in the
        // middle just because the middle came first.
        let params = TripParameters {
            base: base(&[NEAR_1, NEAR_5, NEAR_3]),
            roundtrip: false,
            destination: TripDestination::Last,
            ..Default::default()
        };
        let out = e.trip(&params).unwrap();
        let waypoints = out["waypoints"].as_array().unwrap();
        assert_eq!(waypoints[1]["waypoint_index"].as_u64().unwrap(), 0);
        assert_eq!(waypoints[0]["waypoint_index"].as_u64().unwrap(), 1);
        assert_eq!(waypoints[2]["waypoint_index"].as_u64().unwrap(), 2);
        // Open tour: no closing leg
        assert_eq!(out["trips"][0]["legs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn trip_source_first_overrides_the_start_choice() {
        let e = engine();
        let params = TripParameters {
            base: base(&[NEAR_1, NEAR_5, NEAR_3]),
            roundtrip: false,
            source: TripSource::First,
            destination: TripDestination::Last,
            ..Default::default()
        };
        let out = e.trip(&params).unwrap();
        let waypoints = out["waypoints"].as_array().unwrap();
        assert_eq!(waypoints[0]["waypoint_index"].as_u64().unwrap(), 0);
    }

    #[test]
    fn trip_defaults_to_roundtrip() {
        assert!(TripParameters::default().roundtrip);

        let e = engine();
        let params = TripParameters {
            base: base(&[NEAR_1, NEAR_3]),
            ..Default::default()
        };
        let out = e.trip(&params).unwrap();
        // Two coordinates, two legs: out and back
        assert_eq!(out["trips"][0]["legs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn nearest_returns_k_closest() {
        let e = engine();
        let mut params = NearestParameters::default();
        params.base.add_coordinate(NEAR_6.0, NEAR_6.1);
        params.number_of_results = 2;
        let out = e.nearest(&params).unwrap();

        let waypoints = out["waypoints"].as_array().unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0]["name"], "Short Street");
        assert!(
            waypoints[0]["distance"].as_f64().unwrap()
                <= waypoints[1]["distance"].as_f64().unwrap()
        );
    }

    #[test]
    fn nearest_needs_exactly_one_coordinate() {
        let e = engine();
        let params = NearestParameters {
            base: base(&[NEAR_1, NEAR_3]),
            number_of_results: 1,
        };
        assert_eq!(e.nearest(&params).unwrap_err().code, "InvalidOptions");
    }

    #[test]
    fn match_trace_along_main_street() {
        let e = engine();
        let params = MatchParameters {
            base: base(&[NEAR_1, (21.0101, 52.2301), NEAR_3]),
            timestamps: vec![0, 30, 60],
        };
        let out = e.match_trace(&params).unwrap();

        assert_eq!(out["code"], "Ok");
        assert!(out["matchings"][0]["distance"].as_f64().unwrap() > 0.0);
        assert_eq!(out["matchings"][0]["confidence"], json!(1.0));
        assert_eq!(out["tracepoints"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn match_trace_validates_timestamps() {
        let e = engine();

        let short = MatchParameters {
            base: base(&[NEAR_1, NEAR_3]),
            timestamps: vec![0],
        };
        assert_eq!(e.match_trace(&short).unwrap_err().code, "InvalidOptions");

        let decreasing = MatchParameters {
            base: base(&[NEAR_1, NEAR_3]),
            timestamps: vec![60, 0],
        };
        assert_eq!(e.match_trace(&decreasing).unwrap_err().code, "InvalidValue");
    }
}
