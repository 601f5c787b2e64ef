// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in
/// [shortest_path](crate::shortest_path) before
/// [SearchError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during [shortest_path](crate::shortest_path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The start or end nodes don't exist in a graph.
    #[error("invalid node: {0}")]
    InvalidReference(i64),

    /// Route search has exceeded its limit of steps.
    /// Either the nodes are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing the whole graph,
    /// which can result in a denial-of-service. The step limit protects
    /// against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}
