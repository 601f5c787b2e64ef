// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// A query position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f32,
    pub latitude: f32,
}

/// A direction filter for snapping: the snapped node must have an outgoing
/// road heading within `value ± range` degrees (clockwise from true north).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bearing {
    pub value: i16,
    pub range: i16,
}

/// Selection of optional per-leg outputs a query should compute.
///
/// Defaults to duration-only. The fields are plain state: setting one to the
/// value it already has is a no-op, so toggling is idempotent by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotations {
    pub duration: bool,
    pub distance: bool,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            duration: true,
            distance: false,
        }
    }
}

/// Request fields shared by every service: the coordinate list and the
/// per-coordinate snapping controls.
///
/// The `radiuses` and `bearings` vectors are always kept index-aligned with
/// `coordinates`; appending a plain coordinate pushes `None` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseParameters {
    pub coordinates: Vec<Coordinate>,
    pub radiuses: Vec<Option<f32>>,
    pub bearings: Vec<Option<Bearing>>,
}

impl BaseParameters {
    /// Appends a `(longitude, latitude)` pair with no snapping constraints.
    pub fn add_coordinate(&mut self, longitude: f32, latitude: f32) {
        self.coordinates.push(Coordinate {
            longitude,
            latitude,
        });
        self.radiuses.push(None);
        self.bearings.push(None);
    }

    /// Appends a `(longitude, latitude)` pair with a snap radius (meters)
    /// and a [Bearing] filter.
    pub fn add_coordinate_with(
        &mut self,
        longitude: f32,
        latitude: f32,
        radius: f32,
        bearing: Bearing,
    ) {
        self.coordinates.push(Coordinate {
            longitude,
            latitude,
        });
        self.radiuses.push(Some(radius));
        self.bearings.push(Some(bearing));
    }
}

/// Parameters for the route service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParameters {
    pub base: BaseParameters,
    pub steps: bool,
    pub alternatives: bool,
    pub annotations: Annotations,
}

/// Parameters for the travel-time/distance table service.
///
/// `sources` and `destinations` index into the coordinate list; empty lists
/// mean "all coordinates".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableParameters {
    pub base: BaseParameters,
    pub sources: Vec<usize>,
    pub destinations: Vec<usize>,
    pub annotations: Annotations,
}

/// Parameters for the nearest-point service.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestParameters {
    pub base: BaseParameters,
    pub number_of_results: u32,
}

impl Default for NearestParameters {
    fn default() -> Self {
        Self {
            base: BaseParameters::default(),
            number_of_results: 1,
        }
    }
}

/// Parameters for the map-matching service. Timestamps, when supplied, must
/// be index-aligned with the coordinates and non-decreasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchParameters {
    pub base: BaseParameters,
    pub timestamps: Vec<u32>,
}

/// Where an optimized trip must start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TripSource {
    /// Any coordinate may start the trip.
    #[default]
    Any,

    /// The first coordinate starts the trip.
    First,
}

/// Where an optimized trip must end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TripDestination {
    /// Any coordinate may end the trip.
    #[default]
    Any,

    /// The last coordinate ends the trip.
    Last,
}

/// Parameters for the trip (optimized visiting order) service.
///
/// `roundtrip` defaults to `true`: the trip closes back onto its starting
/// coordinate unless explicitly disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct TripParameters {
    pub base: BaseParameters,
    pub roundtrip: bool,
    pub source: TripSource,
    pub destination: TripDestination,
    pub annotations: Annotations,
}

impl Default for TripParameters {
    fn default() -> Self {
        Self {
            base: BaseParameters::default(),
            roundtrip: true,
            source: TripSource::default(),
            destination: TripDestination::default(),
            annotations: Annotations::default(),
        }
    }
}
