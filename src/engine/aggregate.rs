use std::sync::Arc;

use polars::{
    frame::DataFrame,
    prelude::{
        DataType, Expr, Field, LazyFrame, Schema, SchemaRef, SortMultipleOptions, col, len, lit,
    },
};
use strum::IntoEnumIterator;

use crate::{
    data::columns::{CryptoNewsCol, DATE, TableColumn},
    derive::sentiment::SentimentClass,
    error::{BoardResult, polars_err},
    polars_ext::ExprExt,
};

pub const FORMATTED_DATE: &str = "formatted_date";
pub const COUNT: &str = "count";

/// `[formatted_date: str, count: u32]`
pub fn count_schema() -> SchemaRef {
    let fields = vec![
        Field::new(FORMATTED_DATE.into(), DataType::String),
        Field::new(COUNT.into(), DataType::UInt32),
    ];
    Arc::new(Schema::from_iter(fields))
}

/// `[formatted_date: str, positive: u32, neutral: u32, negative: u32]`
pub fn pivot_schema() -> SchemaRef {
    let fields: Vec<Field> = std::iter::once(Field::new(FORMATTED_DATE.into(), DataType::String))
        .chain(SentimentClass::iter().map(|c| Field::new(c.as_str().into(), DataType::UInt32)))
        .collect();
    Arc::new(Schema::from_iter(fields))
}

/// Number of rows per calendar day, oldest day first.
///
/// Rows without a date are not counted.
pub fn count_by_date(lf: LazyFrame) -> BoardResult<DataFrame> {
    let counts = vec![len().cast(DataType::UInt32).alias(COUNT)];
    let out = by_day(lf, counts, &[COUNT])
        .collect()
        .map_err(|e| polars_err("Failed to count rows per day", e))?;

    Ok(or_empty(out, &count_schema()))
}

/// Rows per calendar day broken down by sentiment class.
///
/// Every class column is present even when no row carries that class, and
/// missing combinations count as zero.
pub fn sentiment_pivot(lf: LazyFrame) -> BoardResult<DataFrame> {
    let class = CryptoNewsCol::SentimentClass.as_str();
    let counts = SentimentClass::iter()
        .map(|c| {
            col(class)
                .eq(lit(c.as_str()))
                .cast(DataType::UInt32)
                .sum()
                .cast(DataType::UInt32)
                .alias(c.as_str())
        })
        .collect::<Vec<_>>();
    let outputs = SentimentClass::iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>();

    let out = by_day(lf, counts, &outputs)
        .collect()
        .map_err(|e| polars_err("Failed to pivot sentiment per day", e))?;

    Ok(or_empty(out, &pivot_schema()))
}

// ================================================================================================
// Helper Functions
// ================================================================================================

/// Groups on the ISO date, sorts chronologically and swaps the key for its
/// long form.
fn by_day(lf: LazyFrame, aggs: Vec<Expr>, outputs: &[&str]) -> LazyFrame {
    let selection: Vec<Expr> = std::iter::once(col(FORMATTED_DATE))
        .chain(outputs.iter().map(|name| col(*name)))
        .collect();

    lf.filter(col(DATE).is_not_null())
        .group_by([col(DATE)])
        .agg(aggs)
        .sort([DATE], SortMultipleOptions::default())
        .with_column(col(DATE).long_date().alias(FORMATTED_DATE))
        .select(selection)
}

fn or_empty(df: DataFrame, schema: &SchemaRef) -> DataFrame {
    if df.height() == 0 {
        DataFrame::empty_with_schema(schema)
    } else {
        df
    }
}
