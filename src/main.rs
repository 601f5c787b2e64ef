// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use via::engine::Dataset;

#[derive(Parser)]
struct Cli {
    /// The path to the road network file (.via.xml or .via.xml.gz)
    network_file: PathBuf,

    /// Latitude of the start point
    start_lat: f32,

    /// Longitude of the start point
    start_lon: f32,

    /// Latitude of the end point
    end_lat: f32,

    /// Longitude of the end point
    end_lon: f32,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let dataset = Dataset::load(&cli.network_file)?;
    let index = dataset
        .index
        .as_ref()
        .ok_or("the road network file contains no nodes")?;

    let (start, _) = index.find_nearest_node(cli.start_lat, cli.start_lon);
    let (end, _) = index.find_nearest_node(cli.end_lat, cli.end_lon);

    let route = via::shortest_path(&dataset.graph, start.id, end.id, via::DEFAULT_STEP_LIMIT)?;
    if route.is_empty() {
        return Err("no route between the given points".into());
    }

    let coordinates: Vec<_> = route
        .iter()
        .filter_map(|&node_id| dataset.graph.get_node(node_id))
        .map(|node| json!([node.lon, node.lat]))
        .collect();
    let feature_collection = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
        }],
    });
    println!("{:#}", feature_collection);

    Ok(())
}
