pub mod loader;

use std::path::Path;

use glam::{Quat, Vec3};

use crate::{error::LoadError, model::Model};

/// A decoded glTF scene, detached from the scene graph so it can be built on a
/// worker thread and spawned later on the main thread.
pub struct SceneAsset {
    pub name: String,
    pub meshes: Vec<Model>,
    /// Root nodes of the scene, in document order.
    pub nodes: Vec<AssetNode>,
}

pub struct AssetNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Index into [`SceneAsset::meshes`].
    pub mesh: Option<usize>,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn new(name: impl Into<String>, translation: Vec3) -> Self {
        Self {
            name: name.into(),
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }
    }
}

impl SceneAsset {
    pub fn import(path: &Path) -> Result<SceneAsset, LoadError> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| LoadError::Import {
                path: path.to_path_buf(),
                source,
            })?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| LoadError::NoScene {
                path: path.to_path_buf(),
            })?;

        let meshes = document
            .meshes()
            .map(|mesh| {
                let name = mesh
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("Mesh {}", mesh.index()));
                Model::from_gltf(name, mesh, &buffers)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let nodes = scene.nodes().map(|node| Self::convert_node(&node)).collect();

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(SceneAsset {
            name,
            meshes,
            nodes,
        })
    }

    fn convert_node(node: &gltf::Node) -> AssetNode {
        let (translation, rotation, scale) = node.transform().decomposed();

        AssetNode {
            name: node.name().unwrap_or("Unnamed").to_string(),
            translation: translation.into(),
            rotation: Quat::from_array(rotation),
            scale: scale.into(),
            mesh: node.mesh().map(|mesh| mesh.index()),
            children: node
                .children()
                .map(|child| Self::convert_node(&child))
                .collect(),
        }
    }
}
