#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry_dump;
pub mod model;
pub mod scene;
pub mod style;
pub mod view;

pub use config::{Config, RoutingConfig, ViewConfig, load_config};
pub use model::{Cell, CellId, CellKind, CellTree, Geometry, ModelError};
pub use scene::{Scene, load_scene, parse_scene};
pub use style::{Style, StyleValue};
pub use view::{Bounds, CellState, GraphView, RenderListener};

#[cfg(feature = "cli")]
pub use cli::run;
