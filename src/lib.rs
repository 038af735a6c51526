//! scatter_map is the geometry and interaction core of an interactive,
//! clustered scatter map: coordinate mapping, viewport fitting, pointer hit
//! testing, and vote/consensus filtering.
//! Rendering, gesture recognition, and localization stay with the host.

#![forbid(unsafe_code)]

pub mod config;
pub mod dataset;
pub mod filter;
pub mod fit;
pub mod geom;
pub mod interaction;
pub mod locate;
pub mod render;
pub mod session;
pub mod source;
pub mod style;
pub mod transform;
pub mod view;

pub use config::{ConfigError, MapConfig};
pub use dataset::{Cluster, ClusterId, Dataset, DatasetError, MapPoint, PointId, VoteMetrics};
pub use filter::{FilterReport, FilterState, evaluate};
pub use fit::{DisplayMode, FitCache, FitError, FitParams, Refit, fit, fit_with_params};
pub use geom::{DataPoint, ScreenPoint, ScreenRect, Size};
pub use locate::{PointGrid, PointMatch, locate, locate_in};
pub use render::{RenderCommand, RenderList, build_scene};
pub use session::{InputEvent, MapSession, Selection, Update};
pub use source::{DatasetSource, LazyDataset, SourceError, StaticSource};
pub use style::{Color, Palette};
pub use transform::{Transform, to_data, to_screen};
pub use view::{Bounds, Range, Viewport, ZoomLimits};
