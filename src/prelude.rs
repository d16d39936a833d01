// 1. Traits
pub use crate::data::columns::TableColumn;
pub use crate::polars_ext::{DataFrameExt, ExprExt};
pub use crate::view::binder::RenderSurface;

// 2. The Core "Loop" Types
pub use crate::data::dataset::{Dataset, RawTables};
pub use crate::engine::{AggregatedView, ViewRequest, filter_and_aggregate};
pub use crate::view::session::{ControlChange, ControlPanel, Session};

// 3. Domain Types
pub use crate::data::columns::{CryptoNewsCol, HeadlineCol, PriceCol, Table};
pub use crate::derive::PointColor;
pub use crate::derive::sentiment::{SentimentClass, SentimentReading};
pub use crate::engine::filter::{Choice, FilterState, ValueRange};
pub use crate::engine::scatter::ScatterSource;

// 4. Render Surfaces
pub use crate::view::binder::{ChartFrame, ChartKind, JsonSurface, MemorySurface, SeriesStyle};

// 5. Errors
pub use crate::error::{BoardError, BoardResult, ConfigError, DataError, IoError};

// 6. Configs
pub use crate::config::{AxisSelection, DashboardConfig, DateColumns, PriceColorRule};
