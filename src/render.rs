//! Backend-agnostic scene description.
//!
//! [`build_scene`] turns the session state into positioned primitives that a
//! rendering surface (SVG, canvas, GPU) draws as-is.

use crate::dataset::{ClusterId, PointId};
use crate::fit::DisplayMode;
use crate::geom::ScreenPoint;
use crate::session::MapSession;
use crate::style::Color;
use crate::transform::Transform;

/// A drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// A point marker.
    Circle {
        /// Point the marker stands for.
        point_id: PointId,
        /// Marker center.
        center: ScreenPoint,
        /// Marker radius in pixels.
        radius: f32,
        /// Fill color.
        color: Color,
        /// Opacity in 0..=1.
        opacity: f32,
    },
    /// A cluster label centered at the cluster centroid.
    Label {
        /// Cluster the label names.
        cluster_id: ClusterId,
        /// Label center.
        position: ScreenPoint,
        /// Label text.
        text: String,
        /// Text color.
        color: Color,
        /// Opacity in 0..=1.
        opacity: f32,
    },
}

/// Aggregated render commands, markers first.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    commands: Vec<RenderCommand>,
}

impl RenderList {
    /// Create an empty render list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a render command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Access all render commands.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Build the scene for the current session state.
pub fn build_scene(session: &MapSession) -> RenderList {
    let mut list = RenderList::new();
    let Some(transform) = Transform::new(session.viewport()) else {
        return list;
    };
    let config = session.config();
    let palette = session.palette();
    let dataset = session.dataset();
    let filter = session.filter();
    let focus = session.focus();
    let selected = session.selection();
    let expanded = session.is_expanded();

    for (index, cluster) in dataset.clusters().iter().enumerate() {
        let color = palette.color(index, &cluster.id, focus);
        for point in cluster.points.iter().filter(|point| filter.passes(point)) {
            let is_selected = selected.is_some_and(|s| s.point_id == point.id);
            list.push(RenderCommand::Circle {
                point_id: point.id.clone(),
                center: transform.data_to_screen(point.position),
                radius: if is_selected {
                    config.selected_radius_px
                } else {
                    config.point_radius_px
                },
                color,
                opacity: if expanded && !is_selected {
                    config.dimmed_opacity
                } else {
                    1.0
                },
            });
        }
    }

    // Cluster labels only appear on the full-screen map.
    if session.display_mode() != DisplayMode::FullScreen
        || !session.show_labels()
        || session.is_dragging()
    {
        return list;
    }
    for (index, cluster) in dataset.clusters().iter().enumerate() {
        let Some(centroid) = cluster.centroid() else {
            continue;
        };
        let mut text = cluster.label.clone();
        if session.show_ratio() {
            if let Some(share) = dataset.cluster_share(&cluster.id) {
                text.push_str(&format!(" ({share}%)"));
            }
        }
        let opacity = if expanded {
            config.dimmed_opacity
        } else if selected.is_some_and(|s| s.cluster_id == cluster.id) {
            0.0
        } else {
            config.label_opacity
        };
        list.push(RenderCommand::Label {
            cluster_id: cluster.id.clone(),
            position: transform.data_to_screen(centroid),
            text,
            color: palette.color(index, &cluster.id, focus),
            opacity,
        });
    }
    list
}
