//! `stroke send` and `stroke list`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::{StrokeCommand, StrokeInput};
use crate::actor::{SurfaceBinding, SyncCoordinator, SyncStats};
use crate::logger::{status_success, status_warning};
use crate::remote::{RemoteClient, StrokeDispatcher};
use crate::stroke::{Decoded, Geometry, StrokeRecord, decode};

pub async fn run(client: &Arc<RemoteClient>, action: &StrokeCommand) -> Result<()> {
    let dispatcher = StrokeDispatcher::new(Arc::clone(client));

    match action {
        StrokeCommand::Send {
            surface,
            input,
            name,
        } => {
            let decoded = read_input(input)?;
            for entry in &decoded.malformed {
                crate::log!("sync"; "skipped entry {}: {}", entry.index, entry.reason);
            }
            let stats = send_all(dispatcher, surface, decoded, name.as_deref()).await;
            if stats.failed > 0 {
                bail!("{stats}");
            }
            status_success(&stats.to_string());
        }
        StrokeCommand::List { surface, user } => {
            let strokes = dispatcher.user_strokes(surface, user.as_deref()).await?;
            for stroke in &strokes {
                println!("{}", format_row(stroke));
            }
            if strokes.is_empty() {
                status_warning(&format!("no strokes on {surface}"));
            } else {
                status_success(&format!("{} stroke(s) on {}", strokes.len(), surface));
            }
        }
    }
    Ok(())
}

fn read_input(input: &StrokeInput) -> Result<Decoded> {
    let bytes = match (&input.json, &input.file) {
        (Some(json), _) => json.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("pass --json or --file"),
    };
    Ok(decode(&bytes)?)
}

/// One-shot send through a coordinator bound to `surface`, waiting for all.
async fn send_all(
    dispatcher: StrokeDispatcher,
    surface: &str,
    decoded: Decoded,
    attribution: Option<&str>,
) -> SyncStats {
    let mut coordinator = SyncCoordinator::new(dispatcher, Arc::new(SurfaceBinding::new()));
    if let Some(name) = attribution {
        coordinator = coordinator.with_attribution(name);
    }
    coordinator.bind(surface);
    coordinator.on_batch(decoded);
    coordinator.drain().await;
    coordinator.stats()
}

fn format_row(stroke: &StrokeRecord) -> String {
    let uid = stroke.server_uid.as_deref().unwrap_or("-");
    let color = stroke.color_or_default();
    match &stroke.geometry {
        Geometry::Point(p) => format!("{uid}  {color}  point ({}, {}, {})", p.x, p.y, p.z),
        Geometry::Polyline(points) => format!("{uid}  {color}  polyline {} pts", points.len()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::remote::Credentials;
    use crate::remote::stub::{Reply, StubServer};
    use crate::stroke::Vec3;

    fn dispatcher(server: &StubServer) -> StrokeDispatcher {
        let client = RemoteClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        client.set_credentials(Credentials::new("tok", "user-7"));
        StrokeDispatcher::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_send_all_waits_for_every_stroke() {
        let server = StubServer::start(vec![Reply::json(
            "POST",
            "/surface/strokes/user",
            200,
            json!({}),
        )]);
        let decoded = decode(
            br#"[{"x":1,"y":2,"z":3},{"points":[{"x":0,"y":0,"z":0},{"x":1,"y":1,"z":1}]},{"color":"Red"}]"#,
        )
        .unwrap();

        let stats = send_all(dispatcher(&server), "srv-1", decoded, Some("Ada")).await;
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.malformed, 1);

        let posts = server.requests_to("/surface/strokes/user");
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.json()["name"] == "Ada"));
        assert!(posts.iter().all(|p| p.json()["surface_id"] == "srv-1"));
    }

    #[test]
    fn test_read_input_inline() {
        let input = StrokeInput {
            json: Some(r#"{"color":"Blue","x":30,"y":50,"z":50}"#.into()),
            file: None,
        };
        assert_eq!(read_input(&input).unwrap().records.len(), 1);
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("strokes.json");
        std::fs::write(&path, r#"[{"x":1,"y":2,"z":3},{"x":4,"y":5,"z":6}]"#).unwrap();

        let input = StrokeInput {
            json: None,
            file: Some(path),
        };
        assert_eq!(read_input(&input).unwrap().records.len(), 2);
    }

    #[test]
    fn test_read_input_unrecognized() {
        let input = StrokeInput {
            json: Some("42".into()),
            file: None,
        };
        assert!(read_input(&input).is_err());
    }

    #[test]
    fn test_format_row() {
        let mut point = StrokeRecord::point(None, Vec3::new(1.0, 2.0, 3.0));
        point.server_uid = Some("s-1".into());
        assert_eq!(format_row(&point), "s-1  Blue  point (1, 2, 3)");

        let line = StrokeRecord::polyline(
            Some("#FF0000".into()),
            vec![Vec3::new(0.0, 0.0, 0.0)],
            None,
        );
        assert_eq!(format_row(&line), "-  #FF0000  polyline 1 pts");
    }
}
