pub mod bound;
pub mod clusters;
pub mod color;
pub mod config;
pub mod error;
pub mod image;
pub mod layout;
pub mod orchestrator;
pub mod path;
pub mod pipeline;
pub mod point;
pub mod raster;
pub mod report;
pub mod stage;
pub mod tiles;
pub mod vector;

pub use bound::{BoundingRect, Extent};
pub use clusters::{Cluster, Clusters};
pub use color::*;
pub use config::*;
pub use error::*;
pub use image::*;
pub use layout::{Census, Layout};
pub use orchestrator::run_pipeline;
pub use path::*;
pub use point::*;
pub use raster::*;
pub use report::*;
pub use stage::*;
pub use tiles::*;
pub use vector::*;
