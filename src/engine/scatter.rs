use polars::{
    frame::DataFrame,
    prelude::{Expr, IntoLazy, LazyFrame, SortMultipleOptions, col},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    data::{
        columns::{DATE, Table},
        dataset::Dataset,
    },
    engine::filter::FilterState,
    error::{BoardResult, DataError, polars_err},
};

pub const HEADLINE_PREFIX: &str = "headline_";
pub const CRYPTO_PREFIX: &str = "crypto_";

/// Output column names of a scatter view.
pub const X: &str = "x";
pub const Y: &str = "y";

/// Visual encodings carried through to the chart when the source has them.
const ENCODINGS: [&str; 3] = ["color", "size", "alpha"];

/// Table a scatter chart draws its points from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScatterSource {
    #[default]
    Prices,
    Headlines,
    CryptoNews,
    /// Prices, headlines and crypto news inner-joined on `date`.
    Joined,
}

impl ScatterSource {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The base table, or `None` for the joined view.
    pub fn table(&self) -> Option<Table> {
        match self {
            Self::Prices => Some(Table::Prices),
            Self::Headlines => Some(Table::Headlines),
            Self::CryptoNews => Some(Table::CryptoNews),
            Self::Joined => None,
        }
    }
}

/// Inner join of all three tables on `date`, unfiltered.
///
/// Price columns keep their names; headline and crypto news columns are
/// prefixed with `headline_` and `crypto_`. Rows without a date never match.
pub fn join_all(dataset: &Dataset) -> BoardResult<DataFrame> {
    joined(dataset, &FilterState::default())
}

/// Like [`join_all`], with `state` applied to every table before joining.
pub fn joined(dataset: &Dataset, state: &FilterState) -> BoardResult<DataFrame> {
    let filtered = |table: Table| {
        let columns = dataset.column_names(table);
        state.apply(dataset.table(table).clone().lazy(), &columns)
    };

    let headlines = prefixed(
        filtered(Table::Headlines),
        &dataset.column_names(Table::Headlines),
        HEADLINE_PREFIX,
    );
    let crypto = prefixed(
        filtered(Table::CryptoNews),
        &dataset.column_names(Table::CryptoNews),
        CRYPTO_PREFIX,
    );

    join_frames(filtered(Table::Prices), headlines, crypto)
        .collect()
        .map_err(|e| polars_err("Failed to join tables", e))
}

/// Columns of the joined view, in output order.
pub fn joined_columns(dataset: &Dataset) -> Vec<String> {
    let with_prefix = |table: Table, prefix: &str| {
        dataset
            .column_names(table)
            .into_iter()
            .filter(|c| c != DATE)
            .map(|c| format!("{prefix}{c}"))
            .collect::<Vec<_>>()
    };

    let mut columns = dataset.column_names(Table::Prices);
    columns.extend(with_prefix(Table::Headlines, HEADLINE_PREFIX));
    columns.extend(with_prefix(Table::CryptoNews, CRYPTO_PREFIX));
    columns
}

/// Columns a user may put on either axis of `source`.
pub fn axis_columns(dataset: &Dataset, source: ScatterSource) -> Vec<String> {
    match source.table() {
        Some(table) => dataset.column_names(table),
        None => joined_columns(dataset),
    }
}

/// Filtered rows of `source`, before projection onto the axes.
pub fn source_frame(
    dataset: &Dataset,
    source: ScatterSource,
    state: &FilterState,
) -> BoardResult<DataFrame> {
    match source.table() {
        Some(table) => {
            let columns = dataset.column_names(table);
            state
                .apply(dataset.table(table).clone().lazy(), &columns)
                .collect()
                .map_err(|e| polars_err(&format!("Failed to filter {table}"), e))
        }
        None => joined(dataset, state),
    }
}

/// Projects `df` onto `[x, y]` plus any of `color`, `size`, `alpha` it has.
///
/// Every row is kept; a missing coordinate stays null for the surface to skip.
///
/// # Errors
/// Returns [`DataError::UnknownAxisColumn`] if `x` or `y` is not a column
/// of `df`.
pub fn points(df: &DataFrame, source: ScatterSource, x: &str, y: &str) -> BoardResult<DataFrame> {
    let columns = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();

    for axis in [x, y] {
        if !columns.iter().any(|c| c == axis) {
            return Err(DataError::UnknownAxisColumn {
                source_name: source.to_string(),
                column: axis.to_string(),
                available: columns.join(", "),
            }
            .into());
        }
    }

    let mut selection: Vec<Expr> = vec![col(x).alias(X), col(y).alias(Y)];
    selection.extend(
        ENCODINGS
            .iter()
            .filter(|name| columns.iter().any(|c| c.as_str() == **name))
            .map(|name| col(*name)),
    );

    df.clone()
        .lazy()
        .select(selection)
        .collect()
        .map_err(|e| polars_err("Failed to project scatter points", e))
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn prefixed(lf: LazyFrame, columns: &[String], prefix: &str) -> LazyFrame {
    let renamed = columns
        .iter()
        .map(|c| {
            if c == DATE {
                col(DATE)
            } else {
                col(c.as_str()).alias(format!("{prefix}{c}"))
            }
        })
        .collect::<Vec<_>>();
    lf.select(renamed)
}

fn join_frames(prices: LazyFrame, headlines: LazyFrame, crypto: LazyFrame) -> LazyFrame {
    prices
        .inner_join(headlines, col(DATE), col(DATE))
        .inner_join(crypto, col(DATE), col(DATE))
        .sort(
            [DATE],
            SortMultipleOptions::default().with_maintain_order(true),
        )
}

#[cfg(test)]
mod tests {
    use polars::{df, prelude::AnyValue};

    use super::*;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn join_keeps_only_shared_dates() {
        let prices = df![
            "date" => &["2021-01-01", "2021-01-02"],
            "close" => &[1.0, 2.0]
        ]
        .expect("Failed to create DF");
        let headlines = df![
            "date" => &["2021-01-02", "2021-01-03"],
            "title" => &["h1", "h2"]
        ]
        .expect("Failed to create DF");
        let crypto = df![
            "date" => &[Some("2021-01-02"), Some("2021-01-03"), None],
            "title" => &["c1", "c2", "c3"]
        ]
        .expect("Failed to create DF");

        let out = join_frames(
            prices.lazy(),
            prefixed(headlines.lazy(), &["date".into(), "title".into()], HEADLINE_PREFIX),
            prefixed(crypto.lazy(), &["date".into(), "title".into()], CRYPTO_PREFIX),
        )
        .collect()
        .expect("join failed");

        assert_eq!(out.height(), 1);
        assert_eq!(
            names(&out),
            vec!["date", "close", "headline_title", "crypto_title"]
        );
        assert_eq!(
            out.column("date").expect("missing date").get(0).expect("row 0"),
            AnyValue::String("2021-01-02")
        );
    }

    #[test]
    fn points_carry_available_encodings() {
        let df = df![
            "date" => &[Some("2021-01-01"), None, Some("2021-01-03")],
            "marketcap" => &[1.0, 2.0, 3.0],
            "color" => &["grey", "green", "red"],
            "alpha" => &[0.2, 0.6, 1.0]
        ]
        .expect("Failed to create DF");

        let out = points(&df, ScatterSource::Prices, "date", "marketcap").expect("points failed");
        assert_eq!(names(&out), vec!["x", "y", "color", "alpha"]);
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn points_keep_rows_with_missing_coordinates() {
        let df = df![
            "date" => &[Some("2021-01-01"), None, Some("2021-01-03")],
            "sentiment_polarity" => &[None, Some(0.4), None]
        ]
        .expect("Failed to create DF");

        let out = points(&df, ScatterSource::CryptoNews, "date", "sentiment_polarity")
            .expect("points failed");
        assert_eq!(out.height(), df.height());
        assert_eq!(out.column("x").expect("missing x").null_count(), 1);
        assert_eq!(out.column("y").expect("missing y").null_count(), 2);
    }

    #[test]
    fn unknown_axis_is_reported_with_alternatives() {
        let df = df!["date" => &["2021-01-01"], "score" => &[1i64]].expect("Failed to create DF");

        let err = points(&df, ScatterSource::Headlines, "date", "marketcap")
            .expect_err("must fail");
        let msg = err.to_string();
        assert!(msg.contains("marketcap"));
        assert!(msg.contains("headlines"));
        assert!(msg.contains("score"));
    }

    #[test]
    fn same_column_on_both_axes_is_allowed() {
        let df = df!["score" => &[1i64, 2]].expect("Failed to create DF");
        let out = points(&df, ScatterSource::Headlines, "score", "score").expect("points failed");
        assert_eq!(names(&out), vec!["x", "y"]);
    }
}
