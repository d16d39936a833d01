use itertools::Itertools;
use polars::{
    frame::DataFrame,
    prelude::{DataType, Expr, IntoLazy, col, lit},
};
use tracing::{info, warn};

use crate::{
    config::{DashboardConfig, DateColumns, PriceColorRule},
    data::columns::{CryptoNewsCol, DATE, HeadlineCol, PriceCol, Table, TableColumn},
    derive::{price::with_price_attributes, sentiment::with_sentiment_attributes},
    error::{BoardResult, DataError, polars_err},
    io,
    polars_ext::ExprExt,
};

/// The three base tables of a session, cleaned and enriched once at startup.
///
/// A `Dataset` is never mutated after construction. Every redraw reads it by
/// reference.
#[derive(Debug, Clone)]
pub struct Dataset {
    prices: DataFrame,
    headlines: DataFrame,
    crypto_news: DataFrame,
    description: Option<String>,
    price_color_rule: PriceColorRule,
}

/// Raw tables as read from disk, before any cleaning.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub prices: DataFrame,
    pub headlines: DataFrame,
    pub crypto_news: DataFrame,
}

impl Dataset {
    /// Reads, cleans and enriches all inputs named by `cfg`.
    ///
    /// # Errors
    /// Any missing or unreadable input file, a malformed CSV, or a table
    /// lacking a column the derivations need.
    #[tracing::instrument(skip(cfg), fields(rule = %cfg.price_color_rule))]
    pub fn load(cfg: &DashboardConfig) -> BoardResult<Self> {
        cfg.validate()?;

        let raw = RawTables {
            prices: io::read_csv(&cfg.prices, cfg.infer_schema_length)?,
            headlines: io::read_csv(&cfg.headlines, cfg.infer_schema_length)?,
            crypto_news: io::read_csv(&cfg.crypto_news, cfg.infer_schema_length)?,
        };

        let description = cfg
            .description
            .as_deref()
            .map(io::read_description)
            .transpose()?;

        let dataset = Self::from_raw(raw, &cfg.date_columns, cfg.price_color_rule)?;
        Ok(Self {
            description,
            ..dataset
        })
    }

    /// Cleans and enriches already-read tables.
    pub fn from_raw(
        raw: RawTables,
        date_columns: &DateColumns,
        price_color_rule: PriceColorRule,
    ) -> BoardResult<Self> {
        let prices = prepare::<PriceCol>(raw.prices, Table::Prices, date_columns)?;
        let prices = with_price_attributes(prices, price_color_rule)?;

        let headlines = prepare::<HeadlineCol>(raw.headlines, Table::Headlines, date_columns)?;
        let headlines = with_long_date(headlines, HeadlineCol::FormattedDate.as_str())?;

        let crypto_news =
            prepare::<CryptoNewsCol>(raw.crypto_news, Table::CryptoNews, date_columns)?;
        let crypto_news = with_sentiment_attributes(crypto_news)?;
        let crypto_news = with_long_date(crypto_news, CryptoNewsCol::FormattedDate.as_str())?;

        Ok(Self {
            prices,
            headlines,
            crypto_news,
            description: None,
            price_color_rule,
        })
    }

    pub fn table(&self, table: Table) -> &DataFrame {
        match table {
            Table::Prices => &self.prices,
            Table::Headlines => &self.headlines,
            Table::CryptoNews => &self.crypto_news,
        }
    }

    pub fn prices(&self) -> &DataFrame {
        &self.prices
    }

    pub fn headlines(&self) -> &DataFrame {
        &self.headlines
    }

    pub fn crypto_news(&self) -> &DataFrame {
        &self.crypto_news
    }

    /// The static HTML description panel, if one was configured.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price_color_rule(&self) -> PriceColorRule {
        self.price_color_rule
    }

    /// All column names of `table`, in table order.
    pub fn column_names(&self, table: Table) -> Vec<String> {
        self.table(table)
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Sorted distinct non-empty values of a text column.
    pub fn distinct_values(&self, table: Table, column: &str) -> BoardResult<Vec<String>> {
        let df = self.table(table);
        let values = df
            .column(column)
            .map_err(|_| DataError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?
            .cast(&DataType::String)
            .map_err(|e| polars_err(&format!("Column '{column}' is not text"), e))?;

        let distinct = values
            .str()
            .map_err(|e| polars_err(&format!("Column '{column}' is not text"), e))?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_empty())
            .unique()
            .sorted()
            .map(str::to_string)
            .collect();
        Ok(distinct)
    }
}

// ================================================================================================
// Cleaning
// ================================================================================================

/// Renames headers, fills missing values and normalizes the date column.
fn prepare<C: TableColumn>(
    df: DataFrame,
    table: Table,
    date_columns: &DateColumns,
) -> BoardResult<DataFrame> {
    let df = normalize_headers::<C>(df, date_columns.for_table(table))?;

    if df.column(DATE).is_err() {
        return Err(DataError::MissingColumn {
            table: table.to_string(),
            column: date_columns.for_table(table).to_string(),
        }
        .into());
    }

    let mut exprs = fill_missing_exprs(&df, DATE);
    exprs.push(col(DATE).iso_date().alias(DATE));

    let out = df
        .lazy()
        .with_columns(exprs)
        .collect()
        .map_err(|e| polars_err(&format!("Failed to clean {table}"), e))?;

    let unparseable = out.column(DATE).map(|c| c.null_count()).unwrap_or_default();
    if unparseable > 0 {
        warn!(%table, unparseable, "Unparseable dates kept as missing");
    }
    info!(%table, rows = out.height(), columns = out.width(), "Table loaded");

    Ok(out)
}

/// Maps raw headers onto canonical names, case-insensitively.
///
/// A header that already carries the canonical name always wins. Headers with
/// no canonical counterpart are kept as they are.
fn normalize_headers<C: TableColumn>(mut df: DataFrame, date_header: &str) -> BoardResult<DataFrame> {
    let existing = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();

    for canonical in C::iter().filter(|c| !c.is_derived()) {
        let target = canonical.as_str();
        if existing.iter().any(|e| e == target) {
            continue;
        }

        let mut candidates = vec![target.to_string()];
        if target == DATE {
            candidates.insert(0, date_header.to_lowercase());
        }
        candidates.extend(canonical.aliases().iter().map(|a| a.to_string()));

        let found = candidates
            .iter()
            .find_map(|cand| existing.iter().find(|e| e.to_lowercase() == *cand));

        if let Some(old) = found {
            df.rename(old, target.into())
                .map_err(|e| polars_err(&format!("Failed to rename '{old}'"), e))?;
        }
    }

    Ok(df)
}

/// Numeric columns default to 0, text columns to the empty string.
fn fill_missing_exprs(df: &DataFrame, skip: &str) -> Vec<Expr> {
    df.get_columns()
        .iter()
        .filter(|c| c.name().as_str() != skip)
        .filter_map(|c| {
            let name = c.name().as_str();
            let dtype = c.dtype();
            if is_numeric(dtype) {
                Some(col(name).fill_null(lit(0).cast(dtype.clone())))
            } else if matches!(dtype, DataType::String) {
                Some(col(name).fill_null(lit("")))
            } else {
                None
            }
        })
        .collect()
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn with_long_date(df: DataFrame, alias: &str) -> BoardResult<DataFrame> {
    df.lazy()
        .with_column(col(DATE).long_date().alias(alias))
        .collect()
        .map_err(|e| polars_err("Failed to format dates", e))
}
