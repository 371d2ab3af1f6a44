// Server-sent event streaming of rebuilt scenes
use crate::domain::scene::Scene;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;

/// Current scene first, then every scene published after it.
///
/// Scenes published faster than the client reads are skipped; only the
/// latest one is delivered.
pub fn scene_updates(mut rx: watch::Receiver<Arc<Scene>>) -> impl Stream<Item = Arc<Scene>> {
    async_stream::stream! {
        let current = rx.borrow_and_update().clone();
        yield current;
        while rx.changed().await.is_ok() {
            let next = rx.borrow_and_update().clone();
            yield next;
        }
    }
}

/// SSE response carrying each scene as a `scene` event
pub fn scene_event_stream(
    rx: watch::Receiver<Arc<Scene>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = scene_updates(rx).filter_map(|scene| async move {
        match Event::default().event("scene").json_data(&*scene) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Failed to encode scene event: {}", e);
                None
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scene_composer::{SceneSources, compose};
    use crate::domain::render_config::{LayoutConfig, SceneConfig};

    fn scene(title: &str) -> Arc<Scene> {
        let config = SceneConfig::new(LayoutConfig::interactive(title));
        Arc::new(compose(&SceneSources::default(), &config, None))
    }

    #[tokio::test]
    async fn test_stream_starts_with_current_scene_then_follows_updates() {
        let (tx, rx) = watch::channel(scene("first"));
        let updates = scene_updates(rx);
        futures::pin_mut!(updates);

        assert_eq!(updates.next().await.unwrap().layout.title.text, "first");
        tx.send_replace(scene("second"));
        assert_eq!(updates.next().await.unwrap().layout.title.text, "second");

        drop(tx);
        assert!(updates.next().await.is_none());
    }
}
