use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    data::columns::{PriceCol, Table, TableColumn},
    error::{BoardResult, ConfigError},
};

/// Which price movement decides a point's color.
///
/// Exactly one rule applies per session; the rules are never combined.
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
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriceColorRule {
    /// **Default.** `close` rose → green, fell → red, otherwise grey.
    #[default]
    Close,

    /// `high` rose → green; else `low` fell → red; otherwise grey.
    ///
    /// The `high` comparison takes precedence, so a bar that widens in
    /// both directions is green.
    HighLow,
}

/// Initial axis selection of a scatter chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSelection {
    pub x: String,
    pub y: String,
}

impl AxisSelection {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl Default for AxisSelection {
    fn default() -> Self {
        Self::new(PriceCol::Date.as_str(), PriceCol::Marketcap.as_str())
    }
}

/// Raw header of the date column in each input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateColumns {
    pub prices: String,
    pub headlines: String,
    pub crypto_news: String,
}

impl Default for DateColumns {
    fn default() -> Self {
        Self {
            prices: "Date".to_string(),
            headlines: "timestamp".to_string(),
            crypto_news: "date".to_string(),
        }
    }
}

impl DateColumns {
    pub fn for_table(&self, table: Table) -> &str {
        match table {
            Table::Prices => &self.prices,
            Table::Headlines => &self.headlines,
            Table::CryptoNews => &self.crypto_news,
        }
    }
}

/// Everything a dashboard session needs before the first render.
///
/// # Example
/// ```
/// # use coinboard::prelude::*;
/// let cfg = DashboardConfig::default()
///     .with_prices("data/coin_Bitcoin.csv")
///     .with_headlines("data/bitcoin_news.csv")
///     .with_crypto_news("data/cryptonews.csv")
///     .with_price_color_rule(PriceColorRule::Close);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub prices: PathBuf,
    pub headlines: PathBuf,
    pub crypto_news: PathBuf,

    /// Optional HTML fragment shown as a static description panel.
    pub description: Option<PathBuf>,

    pub date_columns: DateColumns,
    pub price_color_rule: PriceColorRule,

    /// Rows scanned to infer CSV column types. `None` scans the whole file.
    pub infer_schema_length: Option<usize>,

    pub scatter_axes: AxisSelection,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            prices: PathBuf::from("src/coin_Bitcoin.csv"),
            headlines: PathBuf::from("src/Bitcoin.csv"),
            crypto_news: PathBuf::from("src/cryptonews.csv"),
            description: None,
            date_columns: DateColumns::default(),
            price_color_rule: PriceColorRule::default(),
            infer_schema_length: Some(1000),
            scatter_axes: AxisSelection::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> BoardResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> BoardResult<()> {
        if self.infer_schema_length == Some(0) {
            return Err(ConfigError::Invalid(
                "infer_schema_length must be positive (use null to scan the whole file)"
                    .to_string(),
            )
            .into());
        }

        for table in [Table::Prices, Table::Headlines, Table::CryptoNews] {
            if self.date_columns.for_table(table).trim().is_empty() {
                return Err(
                    ConfigError::Invalid(format!("date column for {table} is empty")).into(),
                );
            }
        }

        if self.scatter_axes.x.is_empty() || self.scatter_axes.y.is_empty() {
            return Err(ConfigError::Invalid("scatter axes must name a column".to_string()).into());
        }

        Ok(())
    }

    pub fn with_prices(self, path: impl Into<PathBuf>) -> Self {
        Self {
            prices: path.into(),
            ..self
        }
    }

    pub fn with_headlines(self, path: impl Into<PathBuf>) -> Self {
        Self {
            headlines: path.into(),
            ..self
        }
    }

    pub fn with_crypto_news(self, path: impl Into<PathBuf>) -> Self {
        Self {
            crypto_news: path.into(),
            ..self
        }
    }

    pub fn with_description(self, path: impl Into<PathBuf>) -> Self {
        Self {
            description: Some(path.into()),
            ..self
        }
    }

    pub fn with_date_columns(self, date_columns: DateColumns) -> Self {
        Self {
            date_columns,
            ..self
        }
    }

    pub fn with_price_color_rule(self, price_color_rule: PriceColorRule) -> Self {
        Self {
            price_color_rule,
            ..self
        }
    }

    pub fn with_infer_schema_length(self, infer_schema_length: Option<usize>) -> Self {
        Self {
            infer_schema_length,
            ..self
        }
    }

    pub fn with_scatter_axes(self, scatter_axes: AxisSelection) -> Self {
        Self {
            scatter_axes,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_config_uses_defaults_for_missing_fields() {
        let cfg: DashboardConfig = serde_json::from_str(
            r#"{ "prices": "p.csv", "price_color_rule": "high_low" }"#,
        )
        .expect("Failed to parse config");

        assert_eq!(cfg.prices, PathBuf::from("p.csv"));
        assert_eq!(cfg.price_color_rule, PriceColorRule::HighLow);
        assert_eq!(cfg.date_columns, DateColumns::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_inference_length_is_rejected() {
        let cfg = DashboardConfig::default().with_infer_schema_length(Some(0));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = DashboardConfig::from_json_file("/definitely/not/here.json")
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("not/here.json"));
    }
}
