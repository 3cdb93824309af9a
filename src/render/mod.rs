//! Render engine facade: owns the GPU backend, the resource cache, and the
//! loaded terrains, and exposes the bind/push/render and height-query
//! boundaries the rest of the application consumes.

pub mod cache;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gpu::{GpuBackend, HeadlessBackend};
use crate::terrain::{Error as TerrainError, Terrain, TerrainInfo, WorldBounds};
use cache::{Error as CacheError, ResourceCache};

#[derive(Debug)]
pub enum RenderError {
    Terrain(TerrainError),
    Cache(CacheError),
    ManifestRead(std::io::Error),
    ManifestParse(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Terrain(err) => write!(f, "terrain error: {err}"),
            RenderError::Cache(err) => write!(f, "cache error: {err}"),
            RenderError::ManifestRead(err) => {
                write!(f, "failed to read terrain manifest: {err}")
            }
            RenderError::ManifestParse(err) => {
                write!(f, "failed to parse terrain manifest: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Terrain(err) => Some(err),
            RenderError::Cache(err) => Some(err),
            RenderError::ManifestRead(err) => Some(err),
            RenderError::ManifestParse(err) => Some(err),
        }
    }
}

impl From<TerrainError> for RenderError {
    fn from(value: TerrainError) -> Self {
        RenderError::Terrain(value)
    }
}

impl From<CacheError> for RenderError {
    fn from(value: CacheError) -> Self {
        RenderError::Cache(value)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        RenderError::ManifestRead(value)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(value: serde_json::Error) -> Self {
        RenderError::ManifestParse(value)
    }
}

/// Terrain manifest file layout, `{"terrains": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TerrainManifest {
    pub terrains: Vec<TerrainInfo>,
}

pub struct RenderEngineInfo {
    /// Directory heightmaps and manifests are resolved against.
    pub application_path: String,
    /// Run without a device. Windowed applications instead inject their
    /// backend through [`RenderEngine::with_backend`].
    pub headless: bool,
}

impl Default for RenderEngineInfo {
    fn default() -> Self {
        RenderEngineInfo {
            application_path: ".".to_string(),
            headless: true,
        }
    }
}

pub struct RenderEngine {
    application_path: PathBuf,
    backend: Box<dyn GpuBackend>,
    cache: ResourceCache,
    terrains: HashMap<String, Terrain>,
}

impl RenderEngine {
    pub fn new(info: &RenderEngineInfo) -> Result<Self, RenderError> {
        if !info.headless {
            warn!("No backend injected, falling back to headless rendering");
        }
        Ok(Self::with_backend(info, Box::new(HeadlessBackend::new())))
    }

    /// Build the engine around a caller-owned device backend. All GPU work
    /// runs on the calling thread.
    pub fn with_backend(info: &RenderEngineInfo, backend: Box<dyn GpuBackend>) -> Self {
        info!("--INITIALIZING RENDER ENGINE--");
        info!("Application Dir: '{}'", info.application_path);
        RenderEngine {
            application_path: PathBuf::from(&info.application_path),
            backend,
            cache: ResourceCache::new(),
            terrains: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    /// Load a terrain and register it under its tag. The heightmap path is
    /// resolved relative to the application directory. A tag that already
    /// owns cache entries reuses them instead of re-uploading.
    pub fn register_terrain(&mut self, info: &TerrainInfo) -> Result<(), RenderError> {
        let path = self.application_path.join(&info.heightmap);
        let terrain = Terrain::load(info, &path, self.backend.as_mut(), &mut self.cache)?;
        info!("Registered terrain asset: {}", info.tag);
        self.terrains.insert(info.tag.clone(), terrain);
        Ok(())
    }

    /// Load every terrain listed in a JSON manifest in the application
    /// directory.
    pub fn load_manifest(&mut self, file: &str) -> Result<(), RenderError> {
        let path = self.application_path.join(file);
        info!("Loading terrain manifest {}", path.display());
        let json = fs::read_to_string(&path)?;
        let manifest: TerrainManifest = serde_json::from_str(&json)?;
        for info in &manifest.terrains {
            self.register_terrain(info)?;
        }
        Ok(())
    }

    pub fn terrain(&self, tag: &str) -> Option<&Terrain> {
        self.terrains.get(tag)
    }

    pub fn terrain_mut(&mut self, tag: &str) -> Option<&mut Terrain> {
        self.terrains.get_mut(tag)
    }

    /// Terrain height under `(x, z)` for the named terrain. An unknown tag
    /// falls back to flat ground.
    pub fn height_at(&self, tag: &str, world_x: f32, world_z: f32, offset: f32) -> f32 {
        match self.terrains.get(tag) {
            Some(terrain) => terrain.height_at(world_x, world_z, offset),
            None => {
                warn!("Height query against unknown terrain '{}'", tag);
                offset
            }
        }
    }

    pub fn bounds(&self, tag: &str) -> Option<WorldBounds> {
        self.terrains.get(tag).map(|t| t.bounds())
    }

    /// Draw every registered terrain, one non-indexed draw per tag.
    pub fn render(&mut self) {
        for terrain in self.terrains.values() {
            self.cache.render_non_indexed(
                self.backend.as_mut(),
                terrain.tag(),
                terrain.vertex_count(),
            );
        }
    }

    /// Release every GPU resource. Call exactly once at shutdown; rendering
    /// afterward is not guarded against.
    pub fn shutdown(&mut self) {
        self.cache.unload_all(self.backend.as_mut());
        self.terrains.clear();
    }

    pub fn application_path(&self) -> &Path {
        &self.application_path
    }
}
