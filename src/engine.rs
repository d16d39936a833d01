pub mod aggregate;
pub mod filter;
pub mod scatter;

use polars::{frame::DataFrame, prelude::IntoLazy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::AxisSelection,
    data::{
        columns::{CryptoNewsCol, Table, TableColumn},
        dataset::Dataset,
    },
    engine::{filter::FilterState, scatter::ScatterSource},
    error::{BoardResult, DataError},
};

/// What the current chart shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewRequest {
    /// Rows per day of one table.
    CountByDate { table: Table },
    /// Crypto news per day split by sentiment class.
    #[default]
    SentimentPivot,
    /// One point per row of `source`, placed by two user-chosen columns.
    Scatter {
        source: ScatterSource,
        #[serde(flatten)]
        axes: AxisSelection,
    },
}

impl ViewRequest {
    pub fn scatter(source: ScatterSource, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self::Scatter {
            source,
            axes: AxisSelection::new(x, y),
        }
    }

    pub fn count_by_date(table: Table) -> Self {
        Self::CountByDate { table }
    }
}

/// Result of one filter-and-aggregate pass, ready to be bound to a chart.
///
/// Always well-formed: an empty selection yields zero rows with the same
/// columns a non-empty one would have.
#[derive(Debug, Clone)]
pub struct AggregatedView {
    request: ViewRequest,
    df: DataFrame,
}

impl AggregatedView {
    pub(crate) fn new(request: ViewRequest, df: DataFrame) -> Self {
        Self { request, df }
    }

    pub fn request(&self) -> &ViewRequest {
        &self.request
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}

/// Narrows the dataset by `state` and shapes the result for `request`.
///
/// Pure: the dataset is only read, and equal inputs give equal outputs.
///
/// # Errors
/// A scatter axis that is not a column of its source, a pivot over a table
/// without `sentiment_class`, or a failing frame operation.
pub fn filter_and_aggregate(
    state: &FilterState,
    dataset: &Dataset,
    request: &ViewRequest,
) -> BoardResult<AggregatedView> {
    let df = match request {
        ViewRequest::CountByDate { table } => {
            let columns = dataset.column_names(*table);
            let lf = state.apply(dataset.table(*table).clone().lazy(), &columns);
            aggregate::count_by_date(lf)?
        }
        ViewRequest::SentimentPivot => {
            let columns = dataset.column_names(Table::CryptoNews);
            let class = CryptoNewsCol::SentimentClass.as_str();
            if !columns.iter().any(|c| c == class) {
                return Err(DataError::MissingColumn {
                    table: Table::CryptoNews.to_string(),
                    column: class.to_string(),
                }
                .into());
            }
            let lf = state.apply(dataset.crypto_news().clone().lazy(), &columns);
            aggregate::sentiment_pivot(lf)?
        }
        ViewRequest::Scatter { source, axes } => {
            let rows = scatter::source_frame(dataset, *source, state)?;
            scatter::points(&rows, *source, &axes.x, &axes.y)?
        }
    };

    debug!(
        ?request,
        rows = df.height(),
        unrestricted = state.is_unrestricted(),
        "View aggregated"
    );

    Ok(AggregatedView::new(request.clone(), df))
}
