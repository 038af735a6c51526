//! Replay a scripted interaction against a dataset file.
//!
//! ```text
//! RUST_LOG=scatter_map=debug cargo run --example replay -- path/to/dataset.json
//! ```
//!
//! Without an argument a small built-in dataset is used.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use scatter_map::{
    DatasetSource, InputEvent, LazyDataset, MapConfig, MapSession, RenderCommand, Size,
    SourceError, StaticSource, build_scene,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE: &str = r#"{
    "clusters": [
        {"cluster_id": "1", "cluster": "Housing", "arguments": [
            {"arg_id": "A1_0", "x": 0.0, "y": 0.0, "agrees": 14, "disagrees": 3},
            {"arg_id": "A1_1", "x": 10.0, "y": 0.0, "agrees": 2, "disagrees": 2}
        ]},
        {"cluster_id": "2", "cluster": "Transit", "arguments": [
            {"arg_id": "A2_0", "x": 5.0, "y": 10.0}
        ]}
    ]
}"#;

struct FileSource {
    path: PathBuf,
    location: String,
}

impl DatasetSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn read(&self) -> Result<Option<String>, SourceError> {
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|err| SourceError::read(&self.location, err.to_string()))
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dataset = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let location = path.display().to_string();
            LazyDataset::new(FileSource { path, location })
                .get()
                .context("loading dataset file")?
        }
        None => LazyDataset::new(StaticSource::new("builtin://sample", SAMPLE))
            .get()
            .context("loading built-in dataset")?,
    };
    info!(
        points = dataset.total_points(),
        clusters = dataset.clusters().len(),
        has_votes = dataset.has_votes(),
        "dataset loaded"
    );

    let size = Size::new(400.0, 400.0);
    let mut session = MapSession::new(MapConfig::default(), Arc::clone(&dataset), size)
        .context("creating session")?;
    if let Some(err) = session.fit_error() {
        info!(%err, "using fallback viewport");
    }

    let script = [
        InputEvent::Move { x: 40.0, y: 40.0 },
        InputEvent::Click { x: 40.0, y: 40.0 },
        InputEvent::Click { x: 40.0, y: 40.0 },
        InputEvent::Drag { dx: 25.0, dy: 5.0 },
        InputEvent::Pinch { factor: 1.5 },
        InputEvent::Resize {
            width: 800.0,
            height: 600.0,
        },
    ];
    for event in script {
        let update = session.handle(event);
        info!(
            ?event,
            viewport_changed = update.viewport,
            selection_changed = update.selection,
            selected = session.selection().map(|s| s.point_id.as_str()),
            expanded = session.is_expanded(),
            zoom = session.viewport().zoom,
            "event applied"
        );
    }

    session.set_filter(10, 60);
    let report = session.filter_report();
    info!(
        passing = report.passing_count,
        total = report.total_count,
        "filter applied"
    );

    for command in build_scene(&session).commands() {
        match command {
            RenderCommand::Circle {
                point_id,
                center,
                radius,
                ..
            } => info!(%point_id, x = center.x, y = center.y, radius, "circle"),
            RenderCommand::Label { text, position, .. } => {
                info!(%text, x = position.x, y = position.y, "label")
            }
        }
    }
    Ok(())
}
