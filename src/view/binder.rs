use std::{
    io::Write,
    path::{Path, PathBuf},
};

use polars::frame::DataFrame;
use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::{Display, IntoEnumIterator};
use tracing::debug;

use crate::{
    data::columns::Table,
    derive::sentiment::SentimentClass,
    engine::{AggregatedView, ViewRequest, aggregate, filter::FilterState},
    error::{BoardResult, IoError},
    io,
    polars_ext::DataFrameExt,
};

const SENTIMENT_TITLE: &str = "Sentiment Distribution of Crypto News Per Day";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    StackedBar,
    Scatter,
}

/// A column drawn as its own bar series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesStyle {
    pub column: String,
    pub color: String,
}

/// Everything a render surface needs to draw one chart.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub kind: ChartKind,
    pub title: String,
    /// Active controls, e.g. `source = CoinDesk`. `None` when nothing is selected.
    pub subtitle: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub row_count: usize,
    pub series: Vec<SeriesStyle>,
    pub description: Option<String>,
    pub data: DataFrame,
}

impl ChartFrame {
    /// Builds the frame for `view` and the selection that produced it.
    pub fn bind(view: &AggregatedView, state: &FilterState, description: Option<&str>) -> Self {
        let rows = view.height();
        let (kind, title, x_label, y_label, series) = match view.request() {
            ViewRequest::CountByDate { table } => (
                ChartKind::Bar,
                format!("{} Per Day ({})", table_title(*table), counted(rows, "day")),
                aggregate::FORMATTED_DATE.to_string(),
                aggregate::COUNT.to_string(),
                vec![SeriesStyle {
                    column: aggregate::COUNT.to_string(),
                    color: "steelblue".to_string(),
                }],
            ),
            ViewRequest::SentimentPivot => (
                ChartKind::StackedBar,
                format!("{SENTIMENT_TITLE} ({})", counted(rows, "day")),
                aggregate::FORMATTED_DATE.to_string(),
                aggregate::COUNT.to_string(),
                SentimentClass::iter()
                    .map(|c| SeriesStyle {
                        column: c.as_str().to_string(),
                        color: c.color().as_str().to_string(),
                    })
                    .collect(),
            ),
            ViewRequest::Scatter { source, axes } => (
                ChartKind::Scatter,
                format!(
                    "{} vs {} in {source} ({})",
                    axes.y,
                    axes.x,
                    counted(rows, "point")
                ),
                axes.x.clone(),
                axes.y.clone(),
                Vec::new(),
            ),
        };

        Self {
            kind,
            title,
            subtitle: selection_summary(state),
            x_label,
            y_label,
            row_count: rows,
            series,
            description: description.map(str::to_string),
            data: view.as_df().clone(),
        }
    }

    /// The frame as one JSON document; `rows` holds the data row by row.
    pub fn to_json(&self) -> BoardResult<Value> {
        let rows = self
            .data
            .to_json_rows()?
            .into_iter()
            .map(Value::Object)
            .collect::<Vec<_>>();

        let mut doc = Map::new();
        doc.insert("kind".into(), json!(self.kind));
        doc.insert("title".into(), json!(self.title));
        doc.insert("subtitle".into(), json!(self.subtitle));
        doc.insert("x_label".into(), json!(self.x_label));
        doc.insert("y_label".into(), json!(self.y_label));
        doc.insert("row_count".into(), json!(self.row_count));
        doc.insert("series".into(), json!(self.series));
        doc.insert("columns".into(), json!(column_names(&self.data)));
        doc.insert("description".into(), json!(self.description));
        doc.insert("rows".into(), Value::Array(rows));
        Ok(Value::Object(doc))
    }
}

/// Backing store of a chart.
///
/// Implementors swap the whole frame at once; a reader never observes a
/// mix of the old and the new frame.
pub trait RenderSurface {
    fn replace(&mut self, frame: ChartFrame) -> BoardResult<()>;
}

/// Keeps the latest frame in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    current: Option<ChartFrame>,
    replacements: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ChartFrame> {
        self.current.as_ref()
    }

    /// Number of frames pushed so far.
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl RenderSurface for MemorySurface {
    fn replace(&mut self, frame: ChartFrame) -> BoardResult<()> {
        self.current = Some(frame);
        self.replacements += 1;
        Ok(())
    }
}

/// Writes every frame as a JSON document to a fixed path.
///
/// The document is written to a sibling temp file first and renamed over
/// the target.
#[derive(Debug, Clone)]
pub struct JsonSurface {
    path: PathBuf,
    buffer_size: usize,
}

impl JsonSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer_size: 64 * 1024,
        }
    }

    pub fn with_buffer_size(self, buffer_size: usize) -> Self {
        Self {
            buffer_size,
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RenderSurface for JsonSurface {
    fn replace(&mut self, frame: ChartFrame) -> BoardResult<()> {
        let doc = frame.to_json()?;
        let staging = self.staging_path();

        let landed = write_document(&staging, self.buffer_size, &doc).and_then(|()| {
            std::fs::rename(&staging, &self.path).map_err(|e| {
                IoError::WriteFailed(format!(
                    "Failed to move {} to {}: {e}",
                    staging.display(),
                    self.path.display()
                ))
                .into()
            })
        });
        if let Err(e) = landed {
            // the target keeps its previous frame
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }

        debug!(path = %self.path.display(), rows = frame.row_count, "Frame written");
        Ok(())
    }
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn write_document(path: &Path, buffer_size: usize, doc: &Value) -> BoardResult<()> {
    let mut writer = io::writer(path, buffer_size)?;
    serde_json::to_writer_pretty(&mut writer, doc).map_err(IoError::Json)?;
    writer.flush().map_err(IoError::Io)?;
    Ok(())
}

fn table_title(table: Table) -> &'static str {
    match table {
        Table::Prices => "Price Records",
        Table::Headlines => "Headlines",
        Table::CryptoNews => "Crypto News",
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Human-readable list of the active controls.
fn selection_summary(state: &FilterState) -> Option<String> {
    let mut parts = Vec::new();

    let choices = [
        ("sentiment", &state.sentiment),
        ("source", &state.source),
        ("subject", &state.subject),
        ("date", &state.date),
    ];
    for (label, choice) in choices {
        if let Some(value) = choice.value() {
            parts.push(format!("{label} = {value}"));
        }
    }

    let ranges = [
        ("polarity", state.polarity),
        ("subjectivity", state.subjectivity),
    ];
    for (label, range) in ranges {
        if let Some(r) = range {
            parts.push(format!("{label} in [{}, {}]", r.min(), r.max()));
        }
    }

    let substrings = [
        ("title", &state.title_contains),
        ("url", &state.url_contains),
        ("text", &state.text_contains),
    ];
    for (label, needle) in substrings {
        if !needle.is_empty() {
            parts.push(format!("{label} contains \"{needle}\""));
        }
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn counted(n: usize, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
