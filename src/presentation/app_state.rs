// Application state for HTTP handlers
use crate::application::session::{ControlBatch, ViewerSession};
use crate::domain::error::ConfigError;
use crate::domain::scene::Scene;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

pub struct AppState {
    /// Serializes control batches; one rebuild runs at a time
    pub session: Mutex<ViewerSession>,
    /// Latest scene for stream subscribers
    pub scene_tx: watch::Sender<Arc<Scene>>,
}

impl AppState {
    pub fn new(session: ViewerSession) -> Self {
        let (scene_tx, _) = watch::channel(session.scene());
        Self {
            session: Mutex::new(session),
            scene_tx,
        }
    }

    /// Applies a batch and publishes the rebuilt scene.
    /// The session lock is held until the scene is published, so subscribers
    /// always end on the scene the session holds.
    pub async fn apply_controls(&self, batch: ControlBatch) -> Result<Arc<Scene>, ConfigError> {
        let mut session = self.session.lock().await;
        let scene = session.apply(batch)?;
        self.scene_tx.send_replace(scene.clone());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scene_composer::SceneSources;
    use crate::application::session::Control;
    use crate::domain::render_config::{LayoutConfig, SceneConfig};

    fn state() -> Arc<AppState> {
        let session = ViewerSession::new(SceneSources::default(), SceneConfig::new(LayoutConfig::interactive("Viewer")));
        Arc::new(AppState::new(session))
    }

    fn title_batch(title: String) -> ControlBatch {
        ControlBatch {
            changes: vec![Control::Title(title)],
            camera: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_publish_the_session_scene() {
        let state = state();
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move { state.apply_controls(title_batch(format!("Title {}", i))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let session = state.session.lock().await;
        assert_eq!(session.rebuild_count(), 33);
        assert!(Arc::ptr_eq(&state.scene_tx.borrow(), &session.scene()));
    }

    #[tokio::test]
    async fn test_rejected_batch_publishes_nothing() {
        let state = state();
        let rx = state.scene_tx.subscribe();
        let batch = ControlBatch {
            changes: vec![Control::FiberColorscale("rainbow".to_string())],
            camera: None,
        };
        assert!(state.apply_controls(batch).await.is_err());
        assert!(!rx.has_changed().unwrap());
    }
}
