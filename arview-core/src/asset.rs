//! Asset loading seam
//!
//! The viewer only needs two things from a loaded model: an opaque handle to
//! attach transforms to, and the model's bounding box for preview framing.

use crate::error::ArError;
use crate::math::Aabb;
use anyhow::{Context, Result};
use async_trait::async_trait;
use glam::Mat4;
use gltf::Gltf;
use std::path::{Path, PathBuf};

/// A model ready to be framed and placed
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset<H> {
    /// Provider-specific handle to the scene graph
    pub handle: H,
    /// World-space bounds of the whole scene
    pub bounds: Aabb,
}

/// Loads models by URL or identifier
#[async_trait(?Send)]
pub trait AssetProvider {
    /// Scene handle type
    type Handle;

    /// Load a model
    async fn load(&self, url: &str) -> Result<LoadedAsset<Self::Handle>, ArError>;
}

/// Summary of a glTF scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GltfScene {
    /// Scene name, or the file stem
    pub name: String,
    /// Nodes visited in the default scene
    pub node_count: usize,
    /// Mesh primitives contributing to the bounds
    pub primitive_count: usize,
}

/// Reads glTF/GLB files from a local directory
#[derive(Debug, Clone)]
pub struct GltfAssetProvider {
    root: PathBuf,
}

impl GltfAssetProvider {
    /// Serve models from `root`; URLs are resolved relative to it
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

#[async_trait(?Send)]
impl AssetProvider for GltfAssetProvider {
    type Handle = GltfScene;

    async fn load(&self, url: &str) -> Result<LoadedAsset<GltfScene>, ArError> {
        let path = self.resolve(url);
        let (handle, bounds) = load_gltf_bounds(&path)?;
        log::info!(
            "Loaded {} ({} nodes), bounds {:?}..{:?}",
            handle.name,
            handle.node_count,
            bounds.min,
            bounds.max
        );
        Ok(LoadedAsset { handle, bounds })
    }
}

/// Compute the bounds of a glTF file's default scene.
///
/// Uses the accessor min/max that glTF requires on POSITION attributes, so
/// no buffer data is read.
pub fn load_gltf_bounds<P: AsRef<Path>>(path: P) -> Result<(GltfScene, Aabb)> {
    let path = path.as_ref();
    let gltf = Gltf::open(path)
        .with_context(|| format!("Failed to open glTF file: {}", path.display()))?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .context("glTF file has no scenes")?;

    let name = scene
        .name()
        .map(str::to_string)
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_else(|| "Imported".to_string());

    let mut summary = GltfScene {
        name,
        node_count: 0,
        primitive_count: 0,
    };
    let mut bounds = Aabb::EMPTY;
    for node in scene.nodes() {
        visit_node(&node, Mat4::IDENTITY, &mut bounds, &mut summary);
    }

    if bounds.is_empty() {
        anyhow::bail!("glTF scene '{}' has no geometry", summary.name);
    }
    Ok((summary, bounds))
}

fn visit_node(node: &gltf::Node, parent: Mat4, bounds: &mut Aabb, summary: &mut GltfScene) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    summary.node_count += 1;

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let bb = primitive.bounding_box();
            let local = Aabb::new(bb.min.into(), bb.max.into());
            *bounds = bounds.union(&local.transformed(&world));
            summary.primitive_count += 1;
        }
    }

    for child in node.children() {
        visit_node(&child, world, bounds, summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Write;

    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "name": "Chair", "nodes": [0] } ],
        "nodes": [
            { "translation": [0.0, 1.0, 0.0], "children": [1] },
            { "mesh": 0, "scale": [2.0, 2.0, 2.0] }
        ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
        "buffers": [ { "byteLength": 36, "uri": "triangle.bin" } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "accessors": [ {
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [-1.0, 0.0, -0.5],
            "max": [1.0, 1.0, 0.5]
        } ]
    }"#;

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_bounds_follow_node_transforms() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "chair.gltf", TRIANGLE);

        let (scene, bounds) = load_gltf_bounds(&path).unwrap();
        assert_eq!(scene.name, "Chair");
        assert_eq!(scene.node_count, 2);
        assert_eq!(scene.primitive_count, 1);
        assert!(bounds.min.abs_diff_eq(Vec3::new(-2.0, 1.0, -1.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(2.0, 3.0, 1.0), 1e-6));
    }

    #[test]
    fn test_provider_resolves_site_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("models")).unwrap();
        write_fixture(&dir.path().join("models"), "chair.gltf", TRIANGLE);

        let provider = GltfAssetProvider::new(dir.path());
        let asset = pollster::block_on(provider.load("/models/chair.gltf")).unwrap();
        assert_eq!(asset.handle.name, "Chair");
        assert_eq!(asset.bounds.center(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_missing_file_is_asset_error() {
        let provider = GltfAssetProvider::new("/nonexistent");
        let err = pollster::block_on(provider.load("model.glb")).unwrap_err();
        assert!(matches!(err, ArError::AssetLoad(_)));
    }
}
