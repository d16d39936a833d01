pub mod price;
pub mod sentiment;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Fill color of a rendered point or bar.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PointColor {
    Green,
    Red,
    Grey,
}

impl PointColor {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Typed access to whole columns for the row-wise derivations.
pub(crate) mod column_values {
    use polars::{frame::DataFrame, prelude::DataType};

    use crate::{
        data::columns::Table,
        error::{BoardError, BoardResult, DataError, polars_err},
    };

    fn missing(table: Table, name: &str) -> BoardError {
        DataError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        }
        .into()
    }

    pub fn floats(df: &DataFrame, table: Table, name: &str) -> BoardResult<Vec<Option<f64>>> {
        let column = df
            .column(name)
            .map_err(|_| missing(table, name))?
            .cast(&DataType::Float64)
            .map_err(|e| polars_err(&format!("Column '{name}' is not numeric"), e))?;
        let values = column
            .f64()
            .map_err(|e| polars_err(&format!("Column '{name}' is not numeric"), e))?
            .into_iter()
            .collect();
        Ok(values)
    }

    pub fn strings(df: &DataFrame, table: Table, name: &str) -> BoardResult<Vec<Option<String>>> {
        let column = df
            .column(name)
            .map_err(|_| missing(table, name))?
            .cast(&DataType::String)
            .map_err(|e| polars_err(&format!("Column '{name}' is not text"), e))?;
        let values = column
            .str()
            .map_err(|e| polars_err(&format!("Column '{name}' is not text"), e))?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(values)
    }
}
