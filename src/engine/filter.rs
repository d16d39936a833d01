use polars::prelude::{Expr, LazyFrame, col, lit};
use serde::{Deserialize, Serialize};

use crate::{
    data::{
        columns::{CryptoNewsCol, DATE, TableColumn},
        dates::to_iso_date,
    },
    error::{BoardError, BoardResult, DataError},
    polars_ext::ExprExt,
};

/// Value of a categorical select control.
///
/// `"All"` and the empty string both mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

pub const ALL: &str = "All";

impl Choice {
    pub fn only(value: impl Into<String>) -> Self {
        Self::from(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }
}

impl From<String> for Choice {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Choice> for String {
    fn from(value: Choice) -> Self {
        match value {
            Choice::All => ALL.to_string(),
            Choice::Only(v) => v,
        }
    }
}

/// Inclusive `[min, max]` bounds of a slider control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct ValueRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RangeBounds {
    min: f64,
    max: f64,
}

impl TryFrom<RangeBounds> for ValueRange {
    type Error = BoardError;

    fn try_from(bounds: RangeBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.min, bounds.max)
    }
}

impl ValueRange {
    /// # Errors
    /// Returns an error if either bound is not finite or `min > max`.
    pub fn new(min: f64, max: f64) -> BoardResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(DataError::InvalidRange { min, max }.into());
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn as_expr(&self, column: &str) -> Expr {
        col(column)
            .gt_eq(lit(self.min))
            .and(col(column).lt_eq(lit(self.max)))
    }
}

/// Snapshot of every control value of the dashboard.
///
/// A default `FilterState` restricts nothing. Each active control narrows the
/// working set independently and all active controls combine with AND, so
/// the order in which they were set never matters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Exact match on `sentiment_class`.
    pub sentiment: Choice,
    /// Exact match on `source`.
    pub source: Choice,
    /// Exact match on `subject`.
    pub subject: Choice,
    /// Exact match on the ISO `date`. Any parseable date spelling is accepted.
    pub date: Choice,
    /// Inclusive bounds on `sentiment_polarity`. Rows without a polarity never match.
    pub polarity: Option<ValueRange>,
    /// Inclusive bounds on `sentiment_subjectivity`.
    pub subjectivity: Option<ValueRange>,
    /// Case-insensitive substring of `title`.
    pub title_contains: String,
    /// Case-insensitive substring of `url`.
    pub url_contains: String,
    /// Case-insensitive substring of `text`.
    pub text_contains: String,
}

impl FilterState {
    /// Returns true if no control is active.
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    /// One predicate per active control whose column exists in `columns`.
    ///
    /// Controls targeting a column the table does not have are skipped.
    pub fn predicates(&self, columns: &[String]) -> Vec<Expr> {
        let has = |name: &str| columns.iter().any(|c| c == name);
        let mut out = Vec::new();

        let exact = [
            (CryptoNewsCol::SentimentClass.as_str(), &self.sentiment),
            (CryptoNewsCol::Source.as_str(), &self.source),
            (CryptoNewsCol::Subject.as_str(), &self.subject),
        ];
        for (name, choice) in exact {
            if let Some(value) = choice.value().filter(|_| has(name)) {
                out.push(col(name).eq(lit(value.to_string())));
            }
        }

        if let Some(raw) = self.date.value().filter(|_| has(DATE)) {
            let iso = to_iso_date(raw).unwrap_or_else(|| raw.to_string());
            out.push(col(DATE).eq(lit(iso)));
        }

        let ranges = [
            (CryptoNewsCol::SentimentPolarity.as_str(), self.polarity),
            (CryptoNewsCol::SentimentSubjectivity.as_str(), self.subjectivity),
        ];
        for (name, range) in ranges {
            if let Some(range) = range.filter(|_| has(name)) {
                out.push(range.as_expr(name));
            }
        }

        let substrings = [
            (CryptoNewsCol::Title.as_str(), &self.title_contains),
            (CryptoNewsCol::Url.as_str(), &self.url_contains),
            (CryptoNewsCol::Text.as_str(), &self.text_contains),
        ];
        for (name, needle) in substrings {
            if !needle.is_empty() && has(name) {
                out.push(col(name).contains_ignore_case(needle));
            }
        }

        out
    }

    /// All active predicates combined with AND, or `None` when nothing applies.
    pub fn predicate(&self, columns: &[String]) -> Option<Expr> {
        self.predicates(columns).into_iter().reduce(|acc, p| acc.and(p))
    }

    /// Narrows `lf` to the rows matching every active control.
    pub fn apply(&self, lf: LazyFrame, columns: &[String]) -> LazyFrame {
        match self.predicate(columns) {
            Some(p) => lf.filter(p),
            None => lf,
        }
    }
}

#[cfg(test)]
mod tests {
    use polars::{
        df,
        prelude::{DataFrame, IntoLazy},
    };

    use super::*;

    fn news() -> DataFrame {
        df![
            "date" => &["2021-01-01", "2021-01-01", "2021-01-02", "2021-01-03"],
            "sentiment_class" => &["positive", "negative", "positive", "neutral"],
            "sentiment_polarity" => &[Some(0.5), Some(-0.2), Some(0.1), None],
            "sentiment_subjectivity" => &[Some(0.9), Some(0.1), Some(0.4), None],
            "source" => &["CoinDesk", "CoinDesk", "Decrypt", "CoinDesk"],
            "subject" => &["bitcoin", "altcoin", "bitcoin", "bitcoin"],
            "title" => &["Bitcoin Rallies", "Alts slump", "BITCOIN flat", "Quiet day"],
            "url" => &["https://a/btc", "https://a/alt", "https://d/btc", "https://a/q"],
            "text" => &["up", "down", "flat", "nothing"]
        ]
        .expect("Failed to create DF")
    }

    fn run(state: &FilterState, df: &DataFrame) -> DataFrame {
        let columns = df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        state
            .apply(df.clone().lazy(), &columns)
            .collect()
            .expect("filter failed")
    }

    #[test]
    fn default_state_keeps_everything() {
        let state = FilterState::default();
        assert!(state.is_unrestricted());
        assert_eq!(run(&state, &news()).height(), 4);
    }

    #[test]
    fn all_and_empty_choices_are_inactive() {
        assert_eq!(Choice::from("All"), Choice::All);
        assert_eq!(Choice::from(""), Choice::All);
        assert_eq!(Choice::from("bitcoin"), Choice::Only("bitcoin".to_string()));
        assert_eq!(String::from(Choice::All), "All");
    }

    #[test]
    fn active_filters_combine_with_and() {
        let state = FilterState {
            sentiment: Choice::only("positive"),
            source: Choice::only("CoinDesk"),
            ..Default::default()
        };
        let out = run(&state, &news());
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn substring_filters_ignore_case() {
        let state = FilterState {
            title_contains: "bitcoin".to_string(),
            ..Default::default()
        };
        assert_eq!(run(&state, &news()).height(), 2);

        let state = FilterState {
            url_contains: "/BTC".to_string(),
            text_contains: "FL".to_string(),
            ..Default::default()
        };
        assert_eq!(run(&state, &news()).height(), 1);
    }

    #[test]
    fn date_choice_accepts_any_spelling() {
        let state = FilterState {
            date: Choice::only("01/01/2021"),
            ..Default::default()
        };
        assert_eq!(run(&state, &news()).height(), 2);
    }

    #[test]
    fn ranges_are_inclusive_and_skip_missing_scores() {
        let state = FilterState {
            polarity: Some(ValueRange::new(0.1, 1.0).expect("valid range")),
            ..Default::default()
        };
        assert_eq!(run(&state, &news()).height(), 2);

        let state = FilterState {
            subjectivity: Some(ValueRange::new(0.0, 1.0).expect("valid range")),
            ..Default::default()
        };
        assert_eq!(run(&state, &news()).height(), 3);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(ValueRange::new(1.0, 0.0).is_err());
        assert!(ValueRange::new(f64::NAN, 1.0).is_err());
        assert!(serde_json::from_str::<ValueRange>(r#"{ "min": 1.0, "max": -1.0 }"#).is_err());
    }

    #[test]
    fn controls_without_a_column_are_skipped() {
        let prices = df![
            "date" => &["2021-01-01", "2021-01-02"],
            "close" => &[1.0, 2.0]
        ]
        .expect("Failed to create DF");
        let state = FilterState {
            sentiment: Choice::only("positive"),
            date: Choice::only("2021-01-02"),
            ..Default::default()
        };
        assert_eq!(run(&state, &prices).height(), 1);
    }

    #[test]
    fn filtering_is_order_independent_and_idempotent() {
        let state = FilterState {
            subject: Choice::only("bitcoin"),
            title_contains: "bitcoin".to_string(),
            ..Default::default()
        };
        let once = run(&state, &news());
        let twice = run(&state, &once);
        assert!(once.equals_missing(&twice));

        let columns = news()
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        let reversed = state
            .predicates(&columns)
            .into_iter()
            .rev()
            .fold(news().lazy(), |lf, p| lf.filter(p))
            .collect()
            .expect("filter failed");
        assert!(once.equals_missing(&reversed));
    }

    #[test]
    fn filter_state_round_trips_through_json() {
        let state: FilterState =
            serde_json::from_str(r#"{ "sentiment": "All", "source": "CoinDesk" }"#)
                .expect("Failed to parse state");
        assert_eq!(state.sentiment, Choice::All);
        assert_eq!(state.source, Choice::only("CoinDesk"));
    }
}
