use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Stub length pushed out of a terminal before the first orthogonal
    /// bend, in unscaled units.
    pub jetty_size: f32,
    /// Horizontal clearance the entity-relation router keeps next to each
    /// terminal, in unscaled units.
    pub entity_segment: f32,
    /// Distance a self-loop swings away from its vertex, in unscaled
    /// units.
    pub loop_size: f32,
    /// Waypoints closer than this to an axis of the previous point are
    /// snapped onto it by the segment router.
    pub segment_snap: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            jetty_size: 20.0,
            entity_segment: 30.0,
            loop_size: 40.0,
            segment_snap: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Recompute every style snapshot on each geometry pass instead of
    /// only when a state is invalidated.
    pub always_update_style: bool,
    /// Routing strategy applied to self-loops that carry no explicit
    /// waypoints and no anchor constraints.
    pub default_loop_routing: String,
    /// Minimum width/height of a published edge bounding box.
    pub min_edge_extent: f32,
    pub routing: RoutingConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            always_update_style: false,
            default_loop_routing: "loop".to_string(),
            min_edge_extent: 1.0,
            routing: RoutingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub view: ViewConfig,
}

/// Read a config file, JSON first with a JSON5 fallback for hand-written
/// files. `None` yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(json_err) => json5::from_str(&contents)
            .map_err(|_| anyhow::anyhow!("{}: invalid config: {json_err}", path.display()))?,
    };
    Ok(config)
}
