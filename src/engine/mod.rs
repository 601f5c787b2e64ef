// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Engine construction and query services.
//!
//! An [Engine] owns a loaded [Dataset] and answers route, table, trip,
//! nearest and map-matching queries, returning OSRM-style JSON result trees.
//! Construction is the expensive operation (it reads the whole dataset and
//! builds the snapping index) and is expected to happen once per process
//! per dataset; queries take `&self` and are cheap by comparison.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock, RwLock};

use crate::{network, Graph, KDTree};

mod params;
mod services;

pub use params::{
    Annotations, BaseParameters, Bearing, Coordinate, MatchParameters, NearestParameters,
    RouteParameters, TableParameters, TripDestination, TripParameters, TripSource,
};
pub use services::ServiceError;

/// A loaded road network: the [Graph] plus the nearest-node snapping index.
#[derive(Debug)]
pub struct Dataset {
    pub graph: Graph,
    pub index: Option<KDTree>,
}

impl Dataset {
    /// Reads a [network dataset](crate::network) from disk and builds the
    /// snapping index. This is I/O- and memory-heavy.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, network::Error> {
        let graph = network::load_from_file(path)?;
        Ok(Self::from_graph(graph))
    }

    /// Wraps an already-built [Graph] into a dataset.
    pub fn from_graph(graph: Graph) -> Self {
        let index = KDTree::build_from_graph(&graph);
        log::info!("dataset ready: {} nodes", graph.len());
        Self { graph, index }
    }
}

/// Slot for a process-wide shared [Dataset], the in-process analog of
/// attaching to an externally managed shared-memory region.
pub mod shared {
    use super::*;

    fn slot() -> &'static RwLock<Option<Arc<Dataset>>> {
        static SLOT: OnceLock<RwLock<Option<Arc<Dataset>>>> = OnceLock::new();
        SLOT.get_or_init(|| RwLock::new(None))
    }

    /// Publishes a dataset for the whole process. Engines configured with
    /// `use_shared_memory` attach to it instead of loading from disk.
    /// Replaces any previously published dataset; engines already attached
    /// keep their reference.
    pub fn publish(dataset: Dataset) {
        let mut guard = slot().write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(dataset));
    }

    /// Attaches to the published dataset, if any.
    pub fn attach() -> Option<Arc<Dataset>> {
        let guard = slot().read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }
}

/// Selects where an [Engine] gets its dataset from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base path of an on-disk dataset. Unset when attaching to a
    /// shared dataset.
    pub storage_path: Option<PathBuf>,

    /// Attach to the process-wide [shared] dataset instead of loading
    /// from `storage_path`.
    pub use_shared_memory: bool,
}

impl EngineConfig {
    /// Builds a configuration from an optional dataset path: a path selects
    /// a disk-backed load, no path selects the shared-dataset attach.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self {
                storage_path: Some(p),
                use_shared_memory: false,
            },
            None => Self {
                storage_path: None,
                use_shared_memory: true,
            },
        }
    }
}

/// Error conditions which may occur during [Engine] construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load dataset: {0}")]
    Dataset(#[from] network::Error),

    #[error("shared-memory attach requested, but no dataset has been published")]
    NoSharedDataset,

    #[error("configuration has neither a storage path nor shared memory enabled")]
    NoStorage,
}

/// A constructed routing engine, bound to one [Dataset].
///
/// All query services take `&self`; the engine holds no interior mutability,
/// so queries may run from multiple threads if the caller arranges it.
#[derive(Debug)]
pub struct Engine {
    dataset: Arc<Dataset>,
}

impl Engine {
    /// Constructs an engine as per the provided [EngineConfig]: either
    /// attaching to the [shared] dataset or loading one from disk.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let dataset = if config.use_shared_memory {
            log::debug!("attaching to the shared dataset");
            shared::attach().ok_or(EngineError::NoSharedDataset)?
        } else {
            let path = config.storage_path.as_ref().ok_or(EngineError::NoStorage)?;
            Arc::new(Dataset::load(path)?)
        };

        Ok(Self { dataset })
    }

    /// Constructs an engine directly over a dataset, bypassing configuration.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.dataset.graph
    }

    fn index(&self) -> Option<&KDTree> {
        self.dataset.index.as_ref()
    }
}
