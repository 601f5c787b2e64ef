// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod astar;
mod error;

pub use astar::shortest_path;
pub use error::{SearchError, DEFAULT_STEP_LIMIT};
