use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::{SurfaceBinding, SyncCoordinator, SyncStats};
use crate::actor::messages::SyncMsg;
use crate::actor::watcher::ChangeWatcher;
use crate::engine::RenderEngine;
use crate::remote::{RemoteClient, StrokeDispatcher, SurfaceRegistrar};
use crate::stroke::SurfaceDescriptor;

const CHANNEL_BUFFER: usize = 32;
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Surface strokes are synced to.
pub enum SurfaceTarget {
    /// Already registered.
    Existing(String),
    /// Register before watching.
    Create(SurfaceDescriptor),
}

/// Everything a watch session needs, constructed by the caller.
pub struct SyncSession {
    pub client: Arc<RemoteClient>,
    pub file: PathBuf,
    pub surface: SurfaceTarget,
    pub engine: Box<dyn RenderEngine>,
    pub attribution: Option<String>,
}

/// Run a watch session until `shutdown_rx` fires.
///
/// Order: resolve surface → bind → show engine → start watcher. On shutdown
/// the watcher stops first, then in-flight sends drain, then the engine
/// unloads.
pub async fn run_sync(session: SyncSession, shutdown_rx: Receiver<()>) -> Result<SyncStats> {
    let SyncSession {
        client,
        file,
        surface,
        mut engine,
        attribution,
    } = session;

    let uid = match surface {
        SurfaceTarget::Existing(uid) => uid,
        SurfaceTarget::Create(descriptor) => {
            let uid = SurfaceRegistrar::new(Arc::clone(&client))
                .create_surface(&descriptor)
                .await
                .with_context(|| format!("failed to register surface {}", descriptor.local_id))?;
            crate::log!("surface"; "{} -> {}", descriptor.local_id, uid);
            uid
        }
    };

    let mut coordinator =
        SyncCoordinator::new(StrokeDispatcher::new(client), Arc::new(SurfaceBinding::new()));
    if let Some(name) = &attribution {
        coordinator = coordinator.with_attribution(name);
    }
    // Binding happens before the watcher can produce a batch.
    coordinator.bind(&uid);

    if let Err(e) = engine.show().and_then(|()| engine.clear_all()) {
        crate::log!("engine"; "{}: {}", engine.name(), e);
    }

    let (sync_tx, sync_rx) = mpsc::channel::<SyncMsg>(CHANNEL_BUFFER);
    let coordinator_handle = tokio::spawn(coordinator.run(sync_rx));

    let watcher = ChangeWatcher::new(file, sync_tx.clone());
    if let Err(e) = watcher.start() {
        unload(engine).await;
        return Err(e).with_context(|| format!("failed to watch {}", watcher.file().display()));
    }
    crate::logger::status_success(&format!(
        "watching {} for surface {}",
        watcher.file().display(),
        uid
    ));

    loop {
        if shutdown_rx.try_recv().is_ok() || coordinator_handle.is_finished() {
            crate::debug!("sync"; "shutdown signal received");
            break;
        }
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }

    watcher.stop();
    let _ = sync_tx.send(SyncMsg::Shutdown).await;
    let stats = coordinator_handle
        .await
        .context("sync coordinator panicked")?;

    unload(engine).await;
    Ok(stats)
}

/// Unload on the blocking pool: a process engine may wait for its child.
async fn unload(mut engine: Box<dyn RenderEngine>) {
    let name = engine.name();
    if let Err(e) = tokio::task::spawn_blocking(move || engine.unload()).await {
        crate::log!("engine"; "{}: unload failed: {}", name, e);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use std::thread::{self, ThreadId};

    use parking_lot::Mutex;

    use super::*;
    use crate::engine::{EngineError, NoopEngine};
    use crate::remote::Credentials;
    use crate::remote::stub::{Reply, StubServer};
    use crate::stroke::{Vec2, Vec3};

    fn client(server: &StubServer) -> Arc<RemoteClient> {
        let client = RemoteClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        client.set_credentials(Credentials::new("tok", "user-7"));
        Arc::new(client)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_session_registers_then_syncs_existing_file() {
        let server = StubServer::start(vec![
            Reply::json("POST", "/surface", 200, json!({"surface": {"uid": ""}})),
            Reply::json(
                "GET",
                "/surface/all",
                200,
                json!({"surfaces": [{"uid": "srv-99", "surface_local_id": "arkit-plane-4821"}]}),
            ),
            Reply::json("POST", "/surface/strokes/user", 200, json!({})),
        ]);
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("strokes.json");
        std::fs::write(&file, r#"{"color":"Blue","x":30,"y":50,"z":50}"#).unwrap();

        let session = SyncSession {
            client: client(&server),
            file,
            surface: SurfaceTarget::Create(SurfaceDescriptor::new(
                "arkit-plane-4821",
                Vec3::new(30.0, 50.0, 60.0),
                Vec2::new(50.0, 20.0),
                Vec3::new(10.0, 20.0, 40.0),
            )),
            engine: Box::new(NoopEngine),
            attribution: None,
        };

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
        let handle = tokio::spawn(run_sync(session, shutdown_rx));

        // Wait for the initial check to reach the server.
        for _ in 0..100 {
            if !server.requests_to("/surface/strokes/user").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        shutdown_tx.send(()).unwrap();

        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.sent, 1);

        let posts = server.requests_to("/surface/strokes/user");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].json()["surface_id"], "srv-99");
    }

    #[tokio::test]
    async fn test_registration_failure_aborts_session() {
        let server = StubServer::start(vec![
            Reply::json("POST", "/surface", 200, json!({})),
            Reply::json("GET", "/surface/all", 200, json!({"surfaces": []})),
        ]);
        let dir = TempDir::new().unwrap();

        let session = SyncSession {
            client: client(&server),
            file: dir.path().join("strokes.json"),
            surface: SurfaceTarget::Create(SurfaceDescriptor::new(
                "arkit-plane-1",
                Vec3::new(0.0, 0.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )),
            engine: Box::new(NoopEngine),
            attribution: None,
        };

        let (_shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
        let err = run_sync(session, shutdown_rx).await.unwrap_err();
        assert!(format!("{err:#}").contains("arkit-plane-1"));
        assert!(server.requests_to("/surface/strokes/user").is_empty());
    }

    /// Remembers which thread released it.
    struct UnloadRecorder(Arc<Mutex<Option<ThreadId>>>);

    impl RenderEngine for UnloadRecorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn show(&mut self) -> Result<(), EngineError> {
            Ok(())
        }

        fn unload(&mut self) {
            *self.0.lock() = Some(thread::current().id());
        }

        fn send(
            &mut self,
            _object: &str,
            _method: &str,
            _message: &str,
        ) -> Result<(), EngineError> {
            Ok(())
        }

        fn is_running(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_engine_unloads_off_the_async_thread() {
        let server = StubServer::start(vec![]);
        let dir = TempDir::new().unwrap();
        let unloaded_on = Arc::new(Mutex::new(None));

        let session = SyncSession {
            client: client(&server),
            file: dir.path().join("strokes.json"),
            surface: SurfaceTarget::Existing("srv-1".into()),
            engine: Box::new(UnloadRecorder(Arc::clone(&unloaded_on))),
            attribution: None,
        };

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
        shutdown_tx.send(()).unwrap();
        let stats = run_sync(session, shutdown_rx).await.unwrap();
        assert_eq!(stats.sent, 0);

        let unloaded_on = (*unloaded_on.lock()).expect("engine was unloaded");
        assert_ne!(unloaded_on, thread::current().id());
    }
}
