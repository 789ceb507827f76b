// src/scene.rs - 3D scene side: camera, tracked object, asynchronous model load
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info};

use crate::projection::{SceneCamera, TrackedObject};

/// A model load running on the tokio runtime; resolves once.
pub struct ModelLoad {
    path: PathBuf,
    receiver: oneshot::Receiver<Result<TrackedObject>>,
}

impl ModelLoad {
    pub fn spawn(runtime: &Handle, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (sender, receiver) = oneshot::channel();

        let task_path = path.clone();
        runtime.spawn(async move {
            let result = load_model(&task_path).await;
            // Nobody is waiting any more if the scene was dropped
            let _ = sender.send(result);
        });

        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load_model(path: &Path) -> Result<TrackedObject> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read model {}", path.display()))?;

    if bytes.is_empty() {
        anyhow::bail!("Model file {} is empty", path.display());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    Ok(TrackedObject::new(name, bytes.len()))
}

/// Owns the camera and, once its load finishes, the object the overlay moves.
pub struct Scene {
    camera: SceneCamera,
    tracked: Option<TrackedObject>,
    pending: Option<ModelLoad>,
    last_error: Option<String>,
}

impl Scene {
    pub fn new(camera: SceneCamera) -> Self {
        Self {
            camera,
            tracked: None,
            pending: None,
            last_error: None,
        }
    }

    pub fn camera(&self) -> SceneCamera {
        self.camera
    }

    /// Starts loading a model. Any object already in the scene stays until the new one arrives.
    pub fn begin_load(&mut self, runtime: &Handle, path: impl AsRef<Path>) {
        let load = ModelLoad::spawn(runtime, path);
        info!("Loading model from {}", load.path().display());
        self.pending = Some(load);
        self.last_error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Checks the pending load without blocking. Returns true when a new
    /// object was placed in the scene.
    pub fn poll_load(&mut self) -> bool {
        let Some(load) = self.pending.as_mut() else {
            return false;
        };

        let outcome = match load.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err(anyhow::anyhow!(
                "Model load for {} was abandoned",
                load.path.display()
            )),
        };
        self.pending = None;

        match outcome {
            Ok(object) => {
                info!("✓ Model '{}' loaded ({} bytes)", object.name, object.asset_bytes);
                self.tracked = Some(object);
                true
            }
            Err(e) => {
                error!("✗ Model load failed: {:#}", e);
                self.last_error = Some(format!("{:#}", e));
                false
            }
        }
    }

    pub fn tracked(&self) -> Option<&TrackedObject> {
        self.tracked.as_ref()
    }

    pub fn tracked_mut(&mut self) -> Option<&mut TrackedObject> {
        self.tracked.as_mut()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_file(contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("hand_overlay_{}.glb", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn wait_for(scene: &mut Scene) {
        for _ in 0..200 {
            scene.poll_load();
            if !scene.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("model load never finished");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_places_object() {
        let path = temp_file(b"glTF-binary");
        let mut scene = Scene::new(SceneCamera::default());
        assert!(scene.tracked().is_none());

        scene.begin_load(&Handle::current(), &path);
        wait_for(&mut scene).await;

        let object = scene.tracked().unwrap();
        assert_eq!(object.asset_bytes, 11);
        assert!(object.name.starts_with("hand_overlay_"));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_model_reports_error() {
        let mut scene = Scene::new(SceneCamera::default());
        scene.begin_load(&Handle::current(), "/nonexistent/bangle.glb");
        wait_for(&mut scene).await;

        assert!(scene.tracked().is_none());
        assert!(scene.last_error().unwrap().contains("bangle.glb"));
    }

    #[test]
    fn test_poll_without_load_is_noop() {
        let mut scene = Scene::new(SceneCamera::default());
        assert!(!scene.poll_load());
        assert!(scene.tracked_mut().is_none());
    }
}
