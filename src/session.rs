//! Interactive map session.
//!
//! A [`MapSession`] is the single owner of the mutable map state: the
//! viewport, filter thresholds, cluster focus, and tooltip selection. Every
//! input event is applied to completion by [`MapSession::handle`] before the
//! next one; the caller reads the derived state afterwards.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{ConfigError, MapConfig};
use crate::dataset::{ClusterId, Dataset, MapPoint, PointId};
use crate::filter::{FilterReport, FilterState, evaluate_with};
use crate::fit::{DisplayMode, FitCache, FitError, Refit};
use crate::geom::{ScreenPoint, Size};
use crate::interaction::{is_vertical_drag, pan_viewport, set_zoom, tooltip_anchor, zoom_viewport};
use crate::locate::{GridKey, PointGrid, PointMatch, is_visible};
use crate::style::Palette;
use crate::view::{Bounds, Viewport};

/// Normalized input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to a container position.
    Move {
        /// Pointer X in pixels.
        x: f64,
        /// Pointer Y in pixels.
        y: f64,
    },
    /// Pointer clicked or tapped at a container position.
    Click {
        /// Pointer X in pixels.
        x: f64,
        /// Pointer Y in pixels.
        y: f64,
    },
    /// Drag by a pixel delta since the previous drag event.
    Drag {
        /// Horizontal delta.
        dx: f64,
        /// Vertical delta.
        dy: f64,
    },
    /// Pinch by a multiplicative factor.
    Pinch {
        /// Zoom factor relative to the current zoom.
        factor: f64,
    },
    /// Pointer left the container.
    Leave,
    /// Container was resized.
    Resize {
        /// New width in pixels.
        width: f64,
        /// New height in pixels.
        height: f64,
    },
    /// Tooltip close button pressed.
    Close,
}

/// Point shown in the tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected point.
    pub point_id: PointId,
    /// Cluster of the selected point.
    pub cluster_id: ClusterId,
    /// Tooltip anchor, kept inside the container.
    pub anchor: ScreenPoint,
}

/// What an event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
    /// The viewport moved or zoomed.
    pub viewport: bool,
    /// The selection or its expanded state changed.
    pub selection: bool,
}

impl Update {
    /// Whether anything changed.
    pub fn any(&self) -> bool {
        self.viewport || self.selection
    }
}

/// Owner of all interactive map state.
#[derive(Debug)]
pub struct MapSession {
    config: MapConfig,
    palette: Palette,
    dataset: Arc<Dataset>,
    size: Size,
    mode: DisplayMode,
    filter: FilterState,
    focus: Option<ClusterId>,
    viewport: Viewport,
    home: Viewport,
    fitted: Option<Viewport>,
    fit_cache: FitCache,
    fit_error: Option<FitError>,
    grid: Option<PointGrid>,
    selection: Option<Selection>,
    expanded: bool,
    dragging: bool,
    gestures_enabled: bool,
    show_labels: bool,
    show_ratio: bool,
}

impl MapSession {
    /// Start a session over a dataset in a container of the given size.
    pub fn new(config: MapConfig, dataset: Arc<Dataset>, size: Size) -> Result<Self, ConfigError> {
        config.validate()?;
        let mode = config.display_mode;
        let mut session = Self {
            config,
            palette: Palette::default(),
            dataset,
            size,
            mode,
            filter: FilterState::default(),
            focus: None,
            viewport: Viewport::identity(size),
            home: Viewport::identity(size),
            fitted: None,
            fit_cache: FitCache::new(),
            fit_error: None,
            grid: None,
            selection: None,
            expanded: false,
            dragging: false,
            gestures_enabled: true,
            show_labels: true,
            show_ratio: false,
        };
        session.refit();
        Ok(session)
    }

    /// Replace the palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: InputEvent) -> Update {
        let before_viewport = self.viewport;
        let before_selection = (self.selection.clone(), self.expanded);
        trace!(?event, "map event");

        match event {
            InputEvent::Move { x, y } => self.on_move(ScreenPoint::new(x, y)),
            InputEvent::Click { x, y } => self.on_click(ScreenPoint::new(x, y)),
            InputEvent::Drag { dx, dy } => self.on_drag(ScreenPoint::new(dx, dy)),
            InputEvent::Pinch { factor } => self.on_pinch(factor),
            InputEvent::Leave => {
                self.dragging = false;
                if !self.expanded {
                    self.selection = None;
                }
            }
            InputEvent::Resize { width, height } => {
                self.size = Size::new(width, height);
                self.refit();
            }
            InputEvent::Close => self.close_tooltip(),
        }

        Update {
            viewport: self.viewport != before_viewport,
            selection: (self.selection.clone(), self.expanded) != before_selection,
        }
    }

    fn on_move(&mut self, pointer: ScreenPoint) {
        self.dragging = false;
        if self.expanded {
            return;
        }
        self.select_at(pointer);
    }

    fn on_click(&mut self, pointer: ScreenPoint) {
        self.dragging = false;
        if self.expanded {
            self.close_tooltip();
        } else if self.selection.is_some() {
            self.expanded = true;
        } else {
            self.select_at(pointer);
        }
    }

    fn on_drag(&mut self, delta: ScreenPoint) {
        if !self.gestures_enabled {
            return;
        }
        if self.config.vertical_drag_scrolls && is_vertical_drag(delta) {
            trace!(dx = delta.x, dy = delta.y, "vertical drag left to page scroll");
            return;
        }
        self.dragging = true;
        if !self.expanded {
            self.selection = None;
        }
        self.viewport = pan_viewport(self.viewport, delta);
    }

    fn on_pinch(&mut self, factor: f64) {
        if !self.gestures_enabled {
            return;
        }
        self.dragging = false;
        let requested = self.viewport.zoom * factor;
        self.viewport = zoom_viewport(
            self.viewport,
            factor,
            self.size.center(),
            self.config.zoom_limits,
        );
        if requested != self.viewport.zoom {
            debug!(requested, zoom = self.viewport.zoom, "zoom clamped");
        }
    }

    fn select_at(&mut self, pointer: ScreenPoint) {
        self.selection = self.locate(pointer).map(|hit| Selection {
            point_id: hit.point_id,
            cluster_id: hit.cluster_id,
            anchor: tooltip_anchor(
                pointer,
                self.size.width,
                self.config.tooltip_width_px,
                self.config.tooltip_edge_px,
            ),
        });
    }

    fn close_tooltip(&mut self) {
        self.selection = None;
        self.expanded = false;
    }

    /// Find the visible point under a pointer position.
    pub fn locate(&mut self, pointer: ScreenPoint) -> Option<PointMatch> {
        let key = GridKey::new(&self.dataset, &self.filter, self.focus.as_ref(), &self.viewport);
        if !self.grid.as_ref().is_some_and(|grid| grid.is_current(&key)) {
            self.grid = PointGrid::build(
                &self.dataset,
                &self.filter,
                self.focus.as_ref(),
                &self.viewport,
                self.config.grid_cell_px,
            );
            trace!(
                points = self.grid.as_ref().map_or(0, PointGrid::len),
                "hit-test grid rebuilt"
            );
        }
        self.grid
            .as_ref()?
            .locate(pointer, &self.viewport, self.config.tolerance_px)
    }

    fn refit(&mut self) {
        let params = self.config.fit_params(self.mode);
        match self.fit_cache.update(&self.dataset, self.size, params) {
            Refit::Unchanged(_) | Refit::Failed { cached: true, .. } => {}
            Refit::Recomputed(viewport) => {
                self.viewport = viewport;
                self.home = viewport;
                self.fitted = Some(viewport);
                self.fit_error = None;
            }
            Refit::Failed { error, cached: false } => {
                warn!(%error, "viewport fit failed, falling back to unit scale");
                let fallback = self.fallback_viewport();
                self.viewport = fallback;
                self.home = fallback;
                self.fitted = None;
                self.fit_error = Some(error);
            }
        }
    }

    fn fallback_viewport(&self) -> Viewport {
        let center = self.size.center();
        let translate = match Bounds::from_points(self.dataset.points().map(|p| p.position)) {
            Some(bounds) => ScreenPoint::new(
                center.x - (bounds.x.min + bounds.x.max) * 0.5,
                center.y - (bounds.y.min + bounds.y.max) * 0.5,
            ),
            None => ScreenPoint::new(0.0, 0.0),
        };
        Viewport::new(1.0, 1.0, translate, self.size)
    }

    /// Swap in a new dataset. Clears the selection and refits.
    pub fn replace_dataset(&mut self, dataset: Arc<Dataset>) {
        debug!(generation = dataset.generation(), "dataset replaced");
        self.dataset = dataset;
        self.grid = None;
        if self
            .focus
            .as_ref()
            .is_some_and(|focus| self.dataset.cluster(focus).is_none())
        {
            self.focus = None;
        }
        self.close_tooltip();
        self.refit();
    }

    /// Switch display mode and refit.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        self.refit();
    }

    /// Restore the fitted viewport, or the unit-scale fallback when the
    /// last fit failed.
    pub fn reset_zoom(&mut self) -> Update {
        let before = self.viewport;
        self.viewport = self.home;
        Update {
            viewport: self.viewport != before,
            selection: false,
        }
    }

    /// Set an absolute zoom around the container center.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.viewport = set_zoom(self.viewport, zoom, self.size.center(), self.config.zoom_limits);
        self.viewport.zoom
    }

    /// Update the filter thresholds (clamped). Hides the tooltip when its
    /// point is filtered out.
    pub fn set_filter(&mut self, min_votes: i64, min_consensus: i64) -> FilterState {
        self.filter = FilterState::new(min_votes, min_consensus);
        self.drop_hidden_selection();
        self.filter
    }

    /// Restrict hit testing and coloring to one cluster.
    pub fn set_focus(&mut self, focus: Option<ClusterId>) {
        self.focus = focus;
        self.drop_hidden_selection();
    }

    fn drop_hidden_selection(&mut self) {
        let hidden = self.selection.as_ref().is_some_and(|selection| {
            self.dataset
                .point(&selection.point_id)
                .is_none_or(|point| !self.is_visible(point))
        });
        if hidden {
            self.close_tooltip();
        }
    }

    /// Enable or disable drag and pinch handling.
    pub fn set_gestures_enabled(&mut self, enabled: bool) {
        self.gestures_enabled = enabled;
    }

    /// Show or hide cluster labels.
    pub fn set_show_labels(&mut self, show: bool) {
        self.show_labels = show;
    }

    /// Show or hide cluster share percentages on labels.
    pub fn set_show_ratio(&mut self, show: bool) {
        self.show_ratio = show;
    }

    /// Whether a point is drawn and can be hit.
    pub fn is_visible(&self, point: &MapPoint) -> bool {
        is_visible(point, &self.filter, self.focus.as_ref())
    }

    /// Evaluate the current filter over the dataset.
    pub fn filter_report(&self) -> FilterReport {
        evaluate_with(self.dataset.points(), &self.filter)
    }

    /// Session configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Cluster palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current dataset.
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Container size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Current display mode.
    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Viewport produced by the last successful fit.
    pub fn fitted_viewport(&self) -> Option<Viewport> {
        self.fitted
    }

    /// Error from the last fit, if it failed.
    pub fn fit_error(&self) -> Option<FitError> {
        self.fit_error
    }

    /// Current filter thresholds.
    pub fn filter(&self) -> FilterState {
        self.filter
    }

    /// Focused cluster.
    pub fn focus(&self) -> Option<&ClusterId> {
        self.focus.as_ref()
    }

    /// Tooltip selection.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Whether the tooltip is expanded.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Whether the last event was a pan.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether labels are shown.
    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    /// Whether cluster shares are shown.
    pub fn show_ratio(&self) -> bool {
        self.show_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cluster, VoteMetrics};
    use crate::transform::Transform;

    fn dataset() -> Arc<Dataset> {
        let voted = MapPoint::new("a3", 5.0, 0.0, ClusterId::new("a"))
            .with_votes(VoteMetrics::new(3, 90.0));
        Arc::new(
            Dataset::new(vec![
                Cluster::new("a", "Housing")
                    .with_point("a1", 0.0, 0.0)
                    .with_point("a2", 10.0, 0.0)
                    .with_map_point(voted),
                Cluster::new("b", "Transit").with_point("b1", 5.0, 10.0),
            ])
            .unwrap(),
        )
    }

    fn single_point() -> Arc<Dataset> {
        let cluster = Cluster::new("a", "A").with_point("p", 3.0, 4.0);
        Arc::new(Dataset::new(vec![cluster]).unwrap())
    }

    fn session() -> MapSession {
        MapSession::new(MapConfig::default(), dataset(), Size::new(400.0, 400.0)).unwrap()
    }

    fn screen_of(session: &MapSession, x: f64, y: f64) -> ScreenPoint {
        Transform::new(session.viewport())
            .unwrap()
            .data_to_screen(crate::geom::DataPoint::new(x, y))
    }

    fn click(session: &mut MapSession, at: ScreenPoint) -> Update {
        session.handle(InputEvent::Click { x: at.x, y: at.y })
    }

    #[test]
    fn starts_fitted() {
        let session = session();
        let viewport = session.viewport();
        assert!((viewport.scale_x - 32.0).abs() < 1e-9);
        assert_eq!(session.fitted_viewport(), Some(viewport));
        assert!(session.fit_error().is_none());
    }

    #[test]
    fn hover_then_click_expands_then_collapses() {
        let mut session = session();
        let b1 = screen_of(&session, 5.0, 10.0);

        let update = session.handle(InputEvent::Move { x: b1.x, y: b1.y });
        assert!(update.selection);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "b1");

        click(&mut session, b1);
        assert!(session.is_expanded());

        // Moving while expanded keeps the tooltip.
        session.handle(InputEvent::Move { x: 0.0, y: 0.0 });
        assert!(session.selection().is_some());
        session.handle(InputEvent::Leave);
        assert!(session.selection().is_some());

        click(&mut session, ScreenPoint::new(0.0, 0.0));
        assert!(!session.is_expanded());
        assert!(session.selection().is_none());
    }

    #[test]
    fn click_on_empty_space_clears() {
        let mut session = session();
        let update = click(&mut session, ScreenPoint::new(5.0, 395.0));
        assert!(!update.any());
        assert!(session.selection().is_none());

        let a1 = screen_of(&session, 0.0, 0.0);
        click(&mut session, a1);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "a1");
        assert!(!session.is_expanded());
    }

    #[test]
    fn drag_pans_and_hides_tooltip() {
        let mut session = session();
        let a2 = screen_of(&session, 10.0, 0.0);
        session.handle(InputEvent::Move { x: a2.x, y: a2.y });
        assert!(session.selection().is_some());

        let before = session.viewport();
        let update = session.handle(InputEvent::Drag { dx: 15.0, dy: 4.0 });
        assert!(update.viewport && update.selection);
        assert!(session.is_dragging());
        assert_eq!(session.viewport().translate.x, before.translate.x + 15.0);
        assert_eq!(session.viewport().translate.y, before.translate.y + 4.0);

        let vertical = session.handle(InputEvent::Drag { dx: 1.0, dy: 20.0 });
        assert!(!vertical.any());
    }

    #[test]
    fn pan_does_not_refit() {
        let mut session = session();
        session.handle(InputEvent::Drag { dx: 30.0, dy: 0.0 });
        let panned = session.viewport();
        session.handle(InputEvent::Resize {
            width: 400.0,
            height: 400.0,
        });
        assert_eq!(session.viewport(), panned);

        session.handle(InputEvent::Resize {
            width: 800.0,
            height: 400.0,
        });
        assert_ne!(session.viewport(), panned);
        assert_eq!(session.fitted_viewport(), Some(session.viewport()));
    }

    #[test]
    fn pinch_clamps_zoom_and_reset_restores() {
        let mut session = session();
        for factor in [3.0, 3.0, 0.01, f64::NAN] {
            session.handle(InputEvent::Pinch { factor });
            let zoom = session.viewport().zoom;
            assert!((0.5..=4.0).contains(&zoom));
        }
        assert_eq!(session.viewport().zoom, 0.5);
        assert!(session.reset_zoom().viewport);
        assert_eq!(session.viewport().zoom, 1.0);
        assert_eq!(session.set_zoom(12.0), 4.0);
    }

    #[test]
    fn pinch_invalidates_hit_grid() {
        let mut session = session();
        session.handle(InputEvent::Pinch { factor: 2.0 });
        let b1 = screen_of(&session, 5.0, 10.0);
        click(&mut session, b1);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "b1");
    }

    #[test]
    fn gestures_can_be_disabled() {
        let mut session = session();
        session.set_gestures_enabled(false);
        assert!(!session.handle(InputEvent::Drag { dx: 10.0, dy: 0.0 }).any());
        assert!(!session.handle(InputEvent::Pinch { factor: 2.0 }).any());
    }

    #[test]
    fn filter_hides_selected_point() {
        let mut session = session();
        let a3 = screen_of(&session, 5.0, 0.0);
        click(&mut session, a3);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "a3");

        let report = session.filter_report();
        assert_eq!((report.passing_count, report.total_count), (4, 4));

        let applied = session.set_filter(10, 20);
        assert_eq!(applied.min_consensus(), 50);
        assert!(session.selection().is_none());
        assert_eq!(session.filter_report().passing_count, 3);

        click(&mut session, a3);
        assert!(session.selection().is_none());
    }

    #[test]
    fn focus_limits_hit_testing() {
        let mut session = session();
        let b1 = screen_of(&session, 5.0, 10.0);
        session.set_focus(Some(ClusterId::new("a")));
        click(&mut session, b1);
        assert!(session.selection().is_none());
        session.set_focus(None);
        click(&mut session, b1);
        assert!(session.selection().is_some());
    }

    #[test]
    fn tooltip_anchor_is_clamped() {
        let mut session = session();
        let a2 = screen_of(&session, 10.0, 0.0);
        session.handle(InputEvent::Move { x: a2.x, y: a2.y });
        let anchor = session.selection().unwrap().anchor;
        assert_eq!(anchor, ScreenPoint::new(400.0 - 200.0 - 10.0, a2.y));
    }

    #[test]
    fn degenerate_dataset_reports_error() {
        let single = single_point();
        let mut session = session();
        session.handle(InputEvent::Move { x: 0.0, y: 0.0 });
        session.replace_dataset(single);
        assert!(matches!(session.fit_error(), Some(FitError::Degenerate { .. })));
        assert!(session.fitted_viewport().is_none());
        let center = screen_of(&session, 3.0, 4.0);
        assert_eq!(center, ScreenPoint::new(200.0, 200.0));
        click(&mut session, center);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "p");
    }

    #[test]
    fn full_screen_mode_refits() {
        let mut session = session();
        session.set_display_mode(DisplayMode::FullScreen);
        assert!((session.viewport().scale_x - 14.4).abs() < 1e-9);
        assert_eq!(session.display_mode(), DisplayMode::FullScreen);
    }

    #[test]
    fn degenerate_session_keeps_pan_on_same_size_resize() {
        let mut session =
            MapSession::new(MapConfig::default(), single_point(), Size::new(400.0, 400.0)).unwrap();
        let home = session.viewport();
        session.handle(InputEvent::Drag { dx: 50.0, dy: 0.0 });
        session.handle(InputEvent::Pinch { factor: 2.0 });
        let moved = session.viewport();
        assert_eq!(moved.zoom, 2.0);

        let update = session.handle(InputEvent::Resize {
            width: 400.0,
            height: 400.0,
        });
        assert!(!update.viewport);
        assert_eq!(session.viewport(), moved);
        session.set_display_mode(DisplayMode::Embedded);
        assert_eq!(session.viewport(), moved);
        assert!(matches!(session.fit_error(), Some(FitError::Degenerate { .. })));

        assert!(session.reset_zoom().viewport);
        assert_eq!(session.viewport(), home);
        assert_eq!(home.translate, ScreenPoint::new(197.0, 196.0));
    }

    #[test]
    fn close_collapses_expanded_tooltip() {
        let mut session = session();
        let b1 = screen_of(&session, 5.0, 10.0);
        session.handle(InputEvent::Move { x: b1.x, y: b1.y });
        click(&mut session, b1);
        assert!(session.is_expanded());

        let update = session.handle(InputEvent::Close);
        assert!(update.selection);
        assert!(!update.viewport);
        assert!(!session.is_expanded());
        assert!(session.selection().is_none());

        // Hovering works again once the tooltip is closed.
        session.handle(InputEvent::Move { x: b1.x, y: b1.y });
        assert_eq!(session.selection().unwrap().point_id.as_str(), "b1");
    }

    #[test]
    fn replace_dataset_drops_missing_focus() {
        let mut session = session();
        session.set_focus(Some(ClusterId::new("a")));
        let kept = Arc::new(
            Dataset::new(vec![
                Cluster::new("a", "A")
                    .with_point("x1", 0.0, 0.0)
                    .with_point("x2", 4.0, 4.0),
            ])
            .unwrap(),
        );
        session.replace_dataset(kept);
        assert_eq!(session.focus(), Some(&ClusterId::new("a")));

        session.set_focus(Some(ClusterId::new("b")));
        let without_b = Arc::new(
            Dataset::new(vec![
                Cluster::new("c", "C")
                    .with_point("c1", 0.0, 0.0)
                    .with_point("c2", 4.0, 4.0),
            ])
            .unwrap(),
        );
        session.replace_dataset(without_b);
        assert!(session.focus().is_none());
        assert!(session.fit_error().is_none());
        let c2 = screen_of(&session, 4.0, 4.0);
        click(&mut session, c2);
        assert_eq!(session.selection().unwrap().point_id.as_str(), "c2");
    }
}
