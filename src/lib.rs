//! tsuchi is the terrain core of a small real-time 3D engine: heightmap
//! ingestion, mesh/normal/tangent generation, barycentric height queries for
//! collision, and the tag-keyed resource cache that owns every GPU buffer
//! behind them.
//!
//! The graphics device itself is the application's business; it hands the
//! engine a [`gpu::GpuBackend`] and consumes terrains through the
//! [`render::RenderEngine`] facade:
//!
//! ```no_run
//! use tsuchi::render::{RenderEngine, RenderEngineInfo};
//! use tsuchi::terrain::TerrainInfo;
//!
//! let mut engine = RenderEngine::new(&RenderEngineInfo {
//!     application_path: "assets".to_string(),
//!     headless: true,
//! })
//! .unwrap();
//!
//! engine
//!     .register_terrain(&TerrainInfo {
//!         tag: "island".to_string(),
//!         heightmap: "island.png".to_string(),
//!         level: 25.0,
//!         square_size: 1.0,
//!         origin: glam::Vec3::ZERO,
//!         bounds: None,
//!     })
//!     .unwrap();
//!
//! let ground = engine.height_at("island", 12.0, -7.5, 0.0);
//! # let _ = ground;
//! ```

pub mod gpu;
pub mod render;
pub mod terrain;

pub use render::{RenderEngine, RenderEngineInfo};
pub use terrain::{Terrain, TerrainInfo, WorldBounds};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the default log subscriber. Applications embedding the engine
/// typically call this once at startup; calling it again is a no-op.
pub fn init_logging() {
    // a builder for `FmtSubscriber`.
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::INFO)
        // completes the builder.
        .finish();

    // Keep whatever subscriber got there first.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
