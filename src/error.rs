use std::path::PathBuf;

use thiserror::Error;

/// Failure while decoding an asset into a [`crate::assets::SceneAsset`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to import {}: {source}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{} contains no scenes", path.display())]
    NoScene { path: PathBuf },

    #[error("mesh {mesh} cannot be loaded: {reason}")]
    Mesh { mesh: String, reason: String },
}

/// The base frame asset does not have the shape the placement controller needs.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame object {name} is missing from the scene")]
    DetachedObject { name: &'static str },

    #[error("frame asset has {found} edge parts, expected 4 (top, bottom, left, right)")]
    MissingEdges { found: usize },
}

/// A transom insertion could not be completed. The marker is left ready for
/// another attempt when the load itself failed.
#[derive(Debug, Error)]
pub enum InsertionError {
    #[error("transom for marker {marker} failed to load")]
    Load {
        marker: usize,
        #[source]
        source: LoadError,
    },

    #[error("marker {marker} has no insertion pending")]
    NotPending { marker: usize },

    #[error(transparent)]
    Frame(#[from] FrameError),
}
