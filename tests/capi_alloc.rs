// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Verifies that a full construct/dispatch/destruct cycle over the C surface
//! returns every allocation it made. Kept in its own test binary so no other
//! test touches the allocation counter.

use std::alloc::{GlobalAlloc, Layout, System};
use std::ffi::CString;
use std::ptr::null_mut;
use std::sync::atomic::{AtomicI64, Ordering};

use via::c::{
    viac_config_construct, viac_config_destruct, viac_engine_construct, viac_engine_destruct,
    viac_engine_t, viac_error_destruct, viac_error_t, viac_params_add_coordinate,
    viac_params_destruct, viac_response_destruct, viac_route, viac_route_params_add_steps,
    viac_route_params_construct, viac_route_response_distance,
};

struct CountingAllocator;

static LIVE_ALLOCATIONS: AtomicI64 = AtomicI64::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            LIVE_ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        LIVE_ALLOCATIONS.fetch_sub(1, Ordering::SeqCst);
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

const GRID_XML: &str = include_str!("../src/network/test_fixtures/grid.via.xml");

/// One full C-surface cycle: params, a successful query with accessors, a
/// failing query with its error object, and every matching destructor.
unsafe fn run_cycle(engine: *mut viac_engine_t) {
    let mut error: *mut viac_error_t = null_mut();

    let params = viac_route_params_construct(&mut error);
    viac_params_add_coordinate(params, 21.0001, 52.2301, &mut error);
    viac_params_add_coordinate(params, 21.0199, 52.2299, &mut error);
    viac_route_params_add_steps(params, 1, &mut error);
    let response = viac_route(engine, params, &mut error);
    assert!(!response.is_null());
    assert!(viac_route_response_distance(response, &mut error) > 0.0);
    assert!(error.is_null());
    viac_response_destruct(response);
    viac_params_destruct(params);

    // Error objects are allocations too: route into the unreachable node 6
    let params = viac_route_params_construct(&mut error);
    viac_params_add_coordinate(params, 21.0001, 52.2399, &mut error);
    viac_params_add_coordinate(params, 21.0099, 52.2349, &mut error);
    let response = viac_route(engine, params, &mut error);
    assert!(response.is_null());
    assert!(!error.is_null());
    viac_error_destruct(error);
    viac_params_destruct(params);
}

#[test]
fn capi_cycle_leaves_no_live_allocations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("grid.via.xml");
    std::fs::write(&path, GRID_XML).expect("write fixture");
    let path = CString::new(path.to_string_lossy().to_string()).expect("path cstr");

    unsafe {
        let mut error: *mut viac_error_t = null_mut();
        let config = viac_config_construct(path.as_ptr(), &mut error);
        let engine = viac_engine_construct(config, &mut error);
        assert!(!engine.is_null());

        // Warm up one-time allocations before taking the baseline
        run_cycle(engine);

        let baseline = LIVE_ALLOCATIONS.load(Ordering::SeqCst);
        run_cycle(engine);
        assert_eq!(
            LIVE_ALLOCATIONS.load(Ordering::SeqCst),
            baseline,
            "a C-surface cycle must free everything it allocates"
        );

        viac_engine_destruct(engine);
        viac_config_destruct(config);
    }
}
