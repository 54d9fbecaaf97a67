use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::{assets::SceneAsset, error::LoadError};

pub struct LoadCompletion<T> {
    pub tag: T,
    pub path: PathBuf,
    pub result: Result<SceneAsset, LoadError>,
}

/// Decodes assets on a worker pool. Every request decodes its file again;
/// results are collected on the calling thread with [`AssetLoader::drain`].
pub struct AssetLoader<T> {
    runtime: tokio::runtime::Runtime,
    sender: UnboundedSender<LoadCompletion<T>>,
    receiver: UnboundedReceiver<LoadCompletion<T>>,
    in_flight: usize,
}

impl<T: Send + 'static> AssetLoader<T> {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("asset-loader")
            .build()
            .context("Failed to start asset loader runtime")?;

        let (sender, receiver) = mpsc::unbounded_channel();

        Ok(Self {
            runtime,
            sender,
            receiver,
            in_flight: 0,
        })
    }

    pub fn request(&mut self, path: impl AsRef<Path>, tag: T) {
        let path = path.as_ref().to_path_buf();
        let sender = self.sender.clone();

        log::debug!("Requesting asset {}", path.display());
        self.in_flight += 1;

        self.runtime.spawn_blocking(move || {
            let result = SceneAsset::import(&path);
            // The receiver only goes away together with the loader itself
            let _ = sender.send(LoadCompletion { tag, path, result });
        });
    }

    /// Every completion that has arrived since the last call, in arrival order.
    pub fn drain(&mut self) -> Vec<LoadCompletion<T>> {
        let mut completions = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(completion) => {
                    self.in_flight -= 1;
                    completions.push(completion);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        completions
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Blocks until the next completion. `None` when nothing is in flight.
    #[cfg(test)]
    pub fn wait(&mut self) -> Option<LoadCompletion<T>> {
        if self.in_flight == 0 {
            return None;
        }

        let completion = self.receiver.blocking_recv()?;
        self.in_flight -= 1;
        Some(completion)
    }
}
