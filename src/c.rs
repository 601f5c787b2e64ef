// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Stable C ABI over the `via` engine.
//!
//! Every handle is a `Box`-allocated Rust value behind a per-kind opaque
//! marker type. Fallible functions take a `*mut *mut viac_error_t` as their
//! last argument; it is written only on failure (a null out-pointer drops the
//! error), and the caller frees it with [viac_error_destruct]. Scalar
//! accessors return `INFINITY` on every error path.

use std::ffi::{c_char, c_int, c_uint, c_ulong, c_void, CStr, CString, OsStr};
use std::fmt::Display;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::ptr::null_mut;

use serde_json::Value;

use crate::engine::{
    Annotations, Bearing, Engine, EngineConfig, MatchParameters, NearestParameters,
    RouteParameters, ServiceError, TableParameters, TripDestination, TripParameters, TripSource,
};

pub const VIAC_VERSION_MAJOR: c_uint = 1;
pub const VIAC_VERSION_MINOR: c_uint = 0;

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_error_t {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_config_t {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_engine_t {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_params_t {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_annotations_t {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct viac_response_t {
    _private: [u8; 0],
}

/// Called once per waypoint by the `_with` dispatchers with the handler's
/// `data` pointer, the waypoint street name, longitude and latitude. The
/// return value is ignored.
#[allow(non_camel_case_types)]
pub type viac_waypoint_handler_t =
    Option<unsafe extern "C" fn(*mut c_void, *const c_char, f32, f32) -> c_int>;

struct ErrorCarrier {
    code: CString,
    message: CString,
}

/// One params handle kind serves all five services; the dispatchers check
/// the variant and report an `"Exception"` on a mismatch instead of
/// reinterpreting memory.
enum ParamsInner {
    Route(RouteParameters),
    Table(TableParameters),
    Nearest(NearestParameters),
    Match(MatchParameters),
    Trip(TripParameters),
}

impl ParamsInner {
    fn base_mut(&mut self) -> &mut crate::engine::BaseParameters {
        match self {
            ParamsInner::Route(p) => &mut p.base,
            ParamsInner::Table(p) => &mut p.base,
            ParamsInner::Nearest(p) => &mut p.base,
            ParamsInner::Match(p) => &mut p.base,
            ParamsInner::Trip(p) => &mut p.base,
        }
    }
}

unsafe fn error_out(error: *mut *mut viac_error_t, code: &str, message: &str) {
    if !error.is_null() {
        let carrier = Box::new(ErrorCarrier {
            code: CString::new(code).unwrap_or_default(),
            message: CString::new(message).unwrap_or_default(),
        });
        *error = Box::into_raw(carrier).cast();
    }
}

unsafe fn exception_out(error: *mut *mut viac_error_t, cause: impl Display) {
    error_out(error, "Exception", &cause.to_string());
}

unsafe fn service_error_out(error: *mut *mut viac_error_t, cause: &ServiceError) {
    let code = if cause.code.is_empty() {
        "Unknown"
    } else {
        &cause.code
    };
    error_out(error, code, &cause.message);
}

unsafe fn engine_ref<'a>(engine: *const viac_engine_t) -> Option<&'a Engine> {
    engine.cast::<Engine>().as_ref()
}

unsafe fn params_ref<'a>(params: *const viac_params_t) -> Option<&'a ParamsInner> {
    params.cast::<ParamsInner>().as_ref()
}

unsafe fn params_mut<'a>(params: *mut viac_params_t) -> Option<&'a mut ParamsInner> {
    params.cast::<ParamsInner>().as_mut()
}

unsafe fn response_ref<'a>(response: *const viac_response_t) -> Option<&'a Value> {
    response.cast::<Value>().as_ref()
}

unsafe fn run_service(
    engine: *const viac_engine_t,
    error: *mut *mut viac_error_t,
    query: impl FnOnce(&Engine) -> Result<Value, ServiceError>,
) -> *mut viac_response_t {
    let Some(engine) = engine_ref(engine) else {
        error_out(error, "Exception", "engine handle is null");
        return null_mut();
    };

    match query(engine) {
        Ok(value) => Box::into_raw(Box::new(value)).cast(),
        Err(cause) => {
            service_error_out(error, &cause);
            null_mut()
        }
    }
}

fn wrong_params_kind(service: &str) -> ServiceError {
    ServiceError {
        code: "Exception".to_string(),
        message: format!("not a {} params handle", service),
    }
}

/// Reads `<array>[0].<field>` out of a result tree. The shared shape of the
/// route, trip and match scalar accessors.
unsafe fn response_scalar(
    response: *const viac_response_t,
    array: &str,
    field: &str,
    error: *mut *mut viac_error_t,
) -> f32 {
    let Some(value) = response_ref(response) else {
        error_out(error, "Exception", "response handle is null");
        return f32::INFINITY;
    };

    match value[array][0][field].as_f64() {
        Some(scalar) => scalar as f32,
        None => {
            error_out(
                error,
                "Exception",
                &format!("response carries no {}", array),
            );
            f32::INFINITY
        }
    }
}

unsafe fn invoke_waypoint_handler(
    value: &Value,
    handler: viac_waypoint_handler_t,
    data: *mut c_void,
) {
    let Some(handler) = handler else { return };
    let Some(waypoints) = value["waypoints"].as_array() else {
        return;
    };

    for waypoint in waypoints {
        let name =
            CString::new(waypoint["name"].as_str().unwrap_or_default()).unwrap_or_default();
        let longitude = waypoint["location"][0].as_f64().unwrap_or_default() as f32;
        let latitude = waypoint["location"][1].as_f64().unwrap_or_default() as f32;
        handler(data, name.as_ptr(), longitude, latitude);
    }
}

// Versioning

#[unsafe(no_mangle)]
pub extern "C" fn viac_get_version() -> c_uint {
    (VIAC_VERSION_MAJOR << 16) | VIAC_VERSION_MINOR
}

#[unsafe(no_mangle)]
pub extern "C" fn viac_is_abi_compatible() -> c_int {
    (viac_get_version() >> 16 == VIAC_VERSION_MAJOR) as c_int
}

// Error handling

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_error_code(error: *const viac_error_t) -> *const c_char {
    match error.cast::<ErrorCarrier>().as_ref() {
        Some(carrier) => carrier.code.as_ptr(),
        None => std::ptr::null(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_error_message(error: *const viac_error_t) -> *const c_char {
    match error.cast::<ErrorCarrier>().as_ref() {
        Some(carrier) => carrier.message.as_ptr(),
        None => std::ptr::null(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_error_destruct(error: *mut viac_error_t) {
    if !error.is_null() {
        drop(Box::from_raw(error.cast::<ErrorCarrier>()));
    }
}

// Config and engine

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_config_construct(
    base_path: *const c_char,
    _error: *mut *mut viac_error_t,
) -> *mut viac_config_t {
    let storage_path = if base_path.is_null() {
        None
    } else {
        let bytes = CStr::from_ptr(base_path).to_bytes();
        Some(PathBuf::from(OsStr::from_bytes(bytes)))
    };

    Box::into_raw(Box::new(EngineConfig::from_path(storage_path))).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_config_destruct(config: *mut viac_config_t) {
    if !config.is_null() {
        drop(Box::from_raw(config.cast::<EngineConfig>()));
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_engine_construct(
    config: *const viac_config_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_engine_t {
    let Some(config) = config.cast::<EngineConfig>().as_ref() else {
        error_out(error, "Exception", "config handle is null");
        return null_mut();
    };

    match Engine::new(config) {
        Ok(engine) => Box::into_raw(Box::new(engine)).cast(),
        Err(cause) => {
            exception_out(error, cause);
            null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_engine_destruct(engine: *mut viac_engine_t) {
    if !engine.is_null() {
        drop(Box::from_raw(engine.cast::<Engine>()));
    }
}

// Coordinate appending, shared by all params kinds

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_params_add_coordinate(
    params: *mut viac_params_t,
    longitude: f32,
    latitude: f32,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(params) => params.base_mut().add_coordinate(longitude, latitude),
        None => error_out(error, "Exception", "params handle is null"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_params_add_coordinate_with(
    params: *mut viac_params_t,
    longitude: f32,
    latitude: f32,
    radius: f32,
    bearing: c_int,
    range: c_int,
    error: *mut *mut viac_error_t,
) {
    let Some(params) = params_mut(params) else {
        error_out(error, "Exception", "params handle is null");
        return;
    };

    let (Ok(value), Ok(range)) = (i16::try_from(bearing), i16::try_from(range)) else {
        error_out(error, "Exception", "bearing out of range");
        return;
    };

    params
        .base_mut()
        .add_coordinate_with(longitude, latitude, radius, Bearing { value, range });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_params_destruct(params: *mut viac_params_t) {
    if !params.is_null() {
        drop(Box::from_raw(params.cast::<ParamsInner>()));
    }
}

// Annotation selectors

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_annotations_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_annotations_t {
    Box::into_raw(Box::new(Annotations::default())).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_annotations_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_annotations_t {
    Box::into_raw(Box::new(Annotations::default())).cast()
}

/// Sets the distance annotation to the given state. Calling this repeatedly
/// with the same argument is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_annotations_enable_distance(
    annotations: *mut viac_annotations_t,
    on: c_int,
    error: *mut *mut viac_error_t,
) {
    match annotations.cast::<Annotations>().as_mut() {
        Some(annotations) => annotations.distance = on != 0,
        None => error_out(error, "Exception", "annotations handle is null"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_annotations_destruct(annotations: *mut viac_annotations_t) {
    if !annotations.is_null() {
        drop(Box::from_raw(annotations.cast::<Annotations>()));
    }
}

unsafe fn copy_annotations(
    annotations: *const viac_annotations_t,
    error: *mut *mut viac_error_t,
) -> Option<Annotations> {
    match annotations.cast::<Annotations>().as_ref() {
        Some(&annotations) => Some(annotations),
        None => {
            error_out(error, "Exception", "annotations handle is null");
            None
        }
    }
}

// Route service

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_params_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_params_t {
    Box::into_raw(Box::new(ParamsInner::Route(RouteParameters::default()))).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_params_add_steps(
    params: *mut viac_params_t,
    on: c_int,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Route(params)) => params.steps = on != 0,
        _ => error_out(error, "Exception", "not a route params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_params_add_alternatives(
    params: *mut viac_params_t,
    on: c_int,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Route(params)) => params.alternatives = on != 0,
        _ => error_out(error, "Exception", "not a route params handle"),
    }
}

/// Captures the selector state by value; later changes to the annotations
/// handle do not affect these params.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_params_set_annotations(
    params: *mut viac_params_t,
    annotations: *const viac_annotations_t,
    error: *mut *mut viac_error_t,
) {
    let Some(annotations) = copy_annotations(annotations, error) else {
        return;
    };
    match params_mut(params) {
        Some(ParamsInner::Route(params)) => params.annotations = annotations,
        _ => error_out(error, "Exception", "not a route params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_response_t {
    run_service(engine, error, |engine| match params_ref(params) {
        Some(ParamsInner::Route(params)) => engine.route(params),
        _ => Err(wrong_params_kind("route")),
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_with(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    handler: viac_waypoint_handler_t,
    data: *mut c_void,
    error: *mut *mut viac_error_t,
) {
    let response = viac_route(engine, params, error);
    if let Some(value) = response_ref(response) {
        invoke_waypoint_handler(value, handler, data);
    }
    viac_response_destruct(response);
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_response_distance(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "routes", "distance", error)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_route_response_duration(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "routes", "duration", error)
}

// Table service

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_params_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_params_t {
    Box::into_raw(Box::new(ParamsInner::Table(TableParameters::default()))).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_params_add_source(
    params: *mut viac_params_t,
    index: c_ulong,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Table(params)) => params.sources.push(index as usize),
        _ => error_out(error, "Exception", "not a table params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_params_add_destination(
    params: *mut viac_params_t,
    index: c_ulong,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Table(params)) => params.destinations.push(index as usize),
        _ => error_out(error, "Exception", "not a table params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_params_set_annotations(
    params: *mut viac_params_t,
    annotations: *const viac_annotations_t,
    error: *mut *mut viac_error_t,
) {
    let Some(annotations) = copy_annotations(annotations, error) else {
        return;
    };
    match params_mut(params) {
        Some(ParamsInner::Table(params)) => params.annotations = annotations,
        _ => error_out(error, "Exception", "not a table params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_response_t {
    run_service(engine, error, |engine| match params_ref(params) {
        Some(ParamsInner::Table(params)) => engine.table(params),
        _ => Err(wrong_params_kind("table")),
    })
}

/// One matrix cell: `"NoTable"` when the annotation was never requested,
/// `"NoRoute"` for an unreachable (null) cell, `"Exception"` for everything
/// else.
unsafe fn table_cell(
    response: *const viac_response_t,
    key: &str,
    from: c_ulong,
    to: c_ulong,
    error: *mut *mut viac_error_t,
) -> f32 {
    let Some(value) = response_ref(response) else {
        error_out(error, "Exception", "response handle is null");
        return f32::INFINITY;
    };

    let Some(matrix) = value.get(key) else {
        error_out(
            error,
            "NoTable",
            &format!("the {} annotation was not requested", key),
        );
        return f32::INFINITY;
    };

    let Some(cell) = matrix
        .get(from as usize)
        .and_then(|row| row.get(to as usize))
    else {
        error_out(error, "Exception", "table cell index out of range");
        return f32::INFINITY;
    };

    if cell.is_null() {
        error_out(error, "NoRoute", "Impossible route between points");
        return f32::INFINITY;
    }
    match cell.as_f64() {
        Some(scalar) => scalar as f32,
        None => {
            error_out(error, "Exception", "table cell is not a number");
            f32::INFINITY
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_response_duration(
    response: *const viac_response_t,
    from: c_ulong,
    to: c_ulong,
    error: *mut *mut viac_error_t,
) -> f32 {
    table_cell(response, "durations", from, to, error)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_table_response_distance(
    response: *const viac_response_t,
    from: c_ulong,
    to: c_ulong,
    error: *mut *mut viac_error_t,
) -> f32 {
    table_cell(response, "distances", from, to, error)
}

// Nearest service

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_nearest_params_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_params_t {
    Box::into_raw(Box::new(ParamsInner::Nearest(NearestParameters::default()))).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_nearest_params_set_number_of_results(
    params: *mut viac_params_t,
    number_of_results: c_uint,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Nearest(params)) => params.number_of_results = number_of_results,
        _ => error_out(error, "Exception", "not a nearest params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_nearest(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_response_t {
    run_service(engine, error, |engine| match params_ref(params) {
        Some(ParamsInner::Nearest(params)) => engine.nearest(params),
        _ => Err(wrong_params_kind("nearest")),
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_nearest_with(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    handler: viac_waypoint_handler_t,
    data: *mut c_void,
    error: *mut *mut viac_error_t,
) {
    let response = viac_nearest(engine, params, error);
    if let Some(value) = response_ref(response) {
        invoke_waypoint_handler(value, handler, data);
    }
    viac_response_destruct(response);
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_nearest_response_distance(
    response: *const viac_response_t,
    index: c_ulong,
    error: *mut *mut viac_error_t,
) -> f32 {
    let Some(value) = response_ref(response) else {
        error_out(error, "Exception", "response handle is null");
        return f32::INFINITY;
    };

    match value["waypoints"][index as usize]["distance"].as_f64() {
        Some(scalar) => scalar as f32,
        None => {
            error_out(error, "Exception", "waypoint index out of range");
            f32::INFINITY
        }
    }
}

// Match service

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_match_params_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_params_t {
    Box::into_raw(Box::new(ParamsInner::Match(MatchParameters::default()))).cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_match_params_add_timestamp(
    params: *mut viac_params_t,
    timestamp: c_uint,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Match(params)) => params.timestamps.push(timestamp),
        _ => error_out(error, "Exception", "not a match params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_match(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_response_t {
    run_service(engine, error, |engine| match params_ref(params) {
        Some(ParamsInner::Match(params)) => engine.match_trace(params),
        _ => Err(wrong_params_kind("match")),
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_match_response_distance(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "matchings", "distance", error)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_match_response_duration(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "matchings", "duration", error)
}

// Trip service

/// Fresh trip params default to a round trip; pass zero to
/// [viac_trip_params_add_roundtrip] for an open tour.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_params_construct(
    _error: *mut *mut viac_error_t,
) -> *mut viac_params_t {
    Box::into_raw(Box::new(ParamsInner::Trip(TripParameters::default()))).cast()
}

/// Pins the first appended coordinate as the trip start when `first` is
/// non-zero; zero lets any coordinate start the trip again.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_params_add_source(
    params: *mut viac_params_t,
    first: c_int,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Trip(params)) => {
            params.source = if first != 0 {
                TripSource::First
            } else {
                TripSource::Any
            }
        }
        _ => error_out(error, "Exception", "not a trip params handle"),
    }
}

/// Pins the last appended coordinate as the trip end when `last` is
/// non-zero; zero lets any coordinate end the trip again.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_params_add_destination(
    params: *mut viac_params_t,
    last: c_int,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Trip(params)) => {
            params.destination = if last != 0 {
                TripDestination::Last
            } else {
                TripDestination::Any
            }
        }
        _ => error_out(error, "Exception", "not a trip params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_params_add_roundtrip(
    params: *mut viac_params_t,
    on: c_int,
    error: *mut *mut viac_error_t,
) {
    match params_mut(params) {
        Some(ParamsInner::Trip(params)) => params.roundtrip = on != 0,
        _ => error_out(error, "Exception", "not a trip params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_params_set_annotations(
    params: *mut viac_params_t,
    annotations: *const viac_annotations_t,
    error: *mut *mut viac_error_t,
) {
    let Some(annotations) = copy_annotations(annotations, error) else {
        return;
    };
    match params_mut(params) {
        Some(ParamsInner::Trip(params)) => params.annotations = annotations,
        _ => error_out(error, "Exception", "not a trip params handle"),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip(
    engine: *const viac_engine_t,
    params: *const viac_params_t,
    error: *mut *mut viac_error_t,
) -> *mut viac_response_t {
    run_service(engine, error, |engine| match params_ref(params) {
        Some(ParamsInner::Trip(params)) => engine.trip(params),
        _ => Err(wrong_params_kind("trip")),
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_response_distance(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "trips", "distance", error)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_trip_response_duration(
    response: *const viac_response_t,
    error: *mut *mut viac_error_t,
) -> f32 {
    response_scalar(response, "trips", "duration", error)
}

// Responses

#[unsafe(no_mangle)]
pub unsafe extern "C" fn viac_response_destruct(response: *mut viac_response_t) {
    if !response.is_null() {
        drop(Box::from_raw(response.cast::<Value>()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packs_major_and_minor() {
        let version = viac_get_version();
        assert_eq!(version >> 16, VIAC_VERSION_MAJOR);
        assert_eq!(version & 0xffff, VIAC_VERSION_MINOR);
        assert_eq!(viac_is_abi_compatible(), 1);
    }

    #[test]
    fn errors_carry_code_and_message() {
        let mut error: *mut viac_error_t = null_mut();
        unsafe {
            error_out(&mut error, "NoRoute", "Impossible route between points");
            assert!(!error.is_null());
            assert_eq!(
                CStr::from_ptr(viac_error_code(error)).to_str().unwrap(),
                "NoRoute"
            );
            assert_eq!(
                CStr::from_ptr(viac_error_message(error)).to_str().unwrap(),
                "Impossible route between points"
            );
            viac_error_destruct(error);
        }
    }

    #[test]
    fn empty_service_code_defaults_to_unknown() {
        let mut error: *mut viac_error_t = null_mut();
        unsafe {
            service_error_out(
                &mut error,
                &ServiceError {
                    code: String::new(),
                    message: "something broke".to_string(),
                },
            );
            assert_eq!(
                CStr::from_ptr(viac_error_code(error)).to_str().unwrap(),
                "Unknown"
            );
            viac_error_destruct(error);
        }
    }

    #[test]
    fn null_error_out_pointer_is_tolerated() {
        unsafe {
            error_out(null_mut(), "Exception", "dropped on the floor");
            viac_error_destruct(null_mut());
            viac_response_destruct(null_mut());
            viac_params_destruct(null_mut());
        }
    }

    #[test]
    fn mismatched_params_kind_is_an_exception() {
        unsafe {
            let params = viac_nearest_params_construct(null_mut());
            let mut error: *mut viac_error_t = null_mut();
            viac_route_params_add_steps(params, 1, &mut error);
            assert_eq!(
                CStr::from_ptr(viac_error_code(error)).to_str().unwrap(),
                "Exception"
            );
            viac_error_destruct(error);
            viac_params_destruct(params);
        }
    }
}
