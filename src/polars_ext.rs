use polars::prelude::{DataFrame, DataType, Expr, Field, JsonFormat, JsonWriter, SerWriter, lit, when};
use serde_json::{Map, Value};

use crate::{
    data::dates::{iso_date_udf, long_date_udf},
    error::{BoardResult, IoError, polars_err},
};

pub trait ExprExt {
    /// Safely divides two expressions, protecting against division-by-zero.
    ///
    /// If the denominator is zero, returns `fallback`.
    fn safe_div(self, other: Expr, fallback: f64) -> Expr;

    /// Case-insensitive substring test on a string column.
    ///
    /// `needle` is matched literally; null cells never match.
    fn contains_ignore_case(self, needle: &str) -> Expr;

    /// Parses a date-like column permissively into `YYYY-MM-DD` strings.
    /// Unparseable cells become null.
    fn iso_date(self) -> Expr;

    /// Renders an ISO date column as "January 01, 2021".
    fn long_date(self) -> Expr;
}

impl ExprExt for Expr {
    fn safe_div(self, other: Expr, fallback: f64) -> Expr {
        when(other.clone().eq(lit(0.0)))
            .then(lit(fallback))
            .otherwise(self / other)
    }

    fn contains_ignore_case(self, needle: &str) -> Expr {
        self.cast(DataType::String)
            .str()
            .to_lowercase()
            .str()
            .contains_literal(lit(needle.to_lowercase()))
    }

    fn iso_date(self) -> Expr {
        self.map(iso_date_udf, |_, _| Ok(string_field()))
    }

    fn long_date(self) -> Expr {
        self.map(long_date_udf, |_, _| Ok(string_field()))
    }
}

pub trait DataFrameExt {
    fn to_json_rows(&self) -> BoardResult<Vec<Map<String, Value>>>;
}

impl DataFrameExt for DataFrame {
    fn to_json_rows(&self) -> BoardResult<Vec<Map<String, Value>>> {
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf)
            .with_json_format(JsonFormat::JsonLines)
            .finish(&mut self.clone())
            .map_err(|e| polars_err("Failed to serialize rows", e))?;

        // one object per line, nothing at all for an empty frame
        serde_json::Deserializer::from_slice(&buf)
            .into_iter::<Map<String, Value>>()
            .collect::<Result<_, _>>()
            .map_err(|e| IoError::Json(e).into())
    }
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn string_field() -> Field {
    Field {
        name: "tmp".into(),
        dtype: DataType::String,
    }
}

#[cfg(test)]
mod tests {
    use polars::{
        df,
        prelude::{IntoLazy, col},
    };

    use super::*;

    #[test]
    fn contains_ignore_case_matches_literally() {
        let df = df![
            "title" => &["Bitcoin hits ATH", "ETH (merge) done", "nothing"]
        ]
        .expect("Failed to create DF");

        let out = df
            .lazy()
            .filter(col("title").contains_ignore_case("BITCOIN"))
            .collect()
            .expect("filter failed");
        assert_eq!(out.height(), 1);

        let df = df!["title" => &["ETH (merge) done", "merge"]].expect("Failed to create DF");
        let out = df
            .lazy()
            .filter(col("title").contains_ignore_case("(Merge)"))
            .collect()
            .expect("filter failed");
        assert_eq!(out.height(), 1, "parentheses must not be read as a pattern");
    }

    #[test]
    fn contains_ignore_case_never_matches_nulls() {
        let df = df![
            "url" => &[Some("https://coindesk.com/BTC"), None, Some("https://decrypt.co")]
        ]
        .expect("Failed to create DF");

        let out = df
            .lazy()
            .filter(col("url").contains_ignore_case("/btc"))
            .collect()
            .expect("filter failed");
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn safe_div_falls_back_on_zero() {
        let df = df![
            "a" => &[1.0, 4.0],
            "b" => &[0.0, 2.0]
        ]
        .expect("Failed to create DF");

        let out = df
            .lazy()
            .select([col("a").safe_div(col("b"), 1.0).alias("q")])
            .collect()
            .expect("select failed");
        let q: Vec<Option<f64>> = out
            .column("q")
            .expect("missing q")
            .f64()
            .expect("not f64")
            .into_iter()
            .collect();
        assert_eq!(q, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn rows_serialize_in_order_with_nulls() {
        let df = df![
            "x" => &[Some("2021-01-01"), None],
            "y" => &[1.5, 2.0]
        ]
        .expect("Failed to create DF");

        let rows = df.to_json_rows().expect("to_json_rows failed");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["x"], "2021-01-01");
        assert_eq!(rows[0]["y"], 1.5);
        assert_eq!(rows[1]["x"], Value::Null);
        assert_eq!(rows[1].keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn empty_frame_serializes_to_no_rows() {
        let df = DataFrame::empty();
        assert!(df.to_json_rows().expect("to_json_rows failed").is_empty());
    }
}
