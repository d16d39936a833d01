use std::{str::FromStr, sync::LazyLock};

use polars::{frame::DataFrame, prelude::Column};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::warn;

use crate::{
    data::columns::{CryptoNewsCol, Table, TableColumn},
    derive::{PointColor, column_values},
    error::{BoardResult, polars_err},
};

/// Three-way sentiment category used for pivots and filters.
///
/// Iteration order (`positive`, `neutral`, `negative`) is the column order of
/// every sentiment pivot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn color(&self) -> PointColor {
        match self {
            Self::Positive => PointColor::Green,
            Self::Negative => PointColor::Red,
            Self::Neutral => PointColor::Grey,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            Self::Positive => SIZE_GOOD,
            Self::Negative => SIZE_BAD,
            Self::Neutral => SIZE_NEUTRAL,
        }
    }
}

const SIZE_GOOD: u32 = 10;
const SIZE_BAD: u32 = 5;
const SIZE_NEUTRAL: u32 = 7;

/// Sign of the polarity decides the class; exactly zero is neutral.
pub fn classify_polarity(polarity: f64) -> SentimentClass {
    if polarity > 0.0 {
        SentimentClass::Positive
    } else if polarity < 0.0 {
        SentimentClass::Negative
    } else {
        SentimentClass::Neutral
    }
}

/// `good` → green, `bad` → red, anything else → grey. Matching is exact.
pub fn sentiment_color(label: &str) -> PointColor {
    match label {
        "good" => PointColor::Green,
        "bad" => PointColor::Red,
        _ => PointColor::Grey,
    }
}

/// `good` → 10, `bad` → 5, anything else → 7. Matching is exact.
pub fn sentiment_size(label: &str) -> u32 {
    match label {
        "good" => SIZE_GOOD,
        "bad" => SIZE_BAD,
        _ => SIZE_NEUTRAL,
    }
}

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]class['"]\s*:\s*['"]([^'"]*)['"]"#).expect("valid class pattern")
});

static POLARITY_RE: LazyLock<Regex> = LazyLock::new(|| score_pattern("polarity"));

static SUBJECTIVITY_RE: LazyLock<Regex> = LazyLock::new(|| score_pattern("subjectivity"));

fn score_pattern(key: &str) -> Regex {
    Regex::new(&format!(
        r#"['"]{key}['"]\s*:\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)"#
    ))
    .expect("valid score pattern")
}

/// One parsed cell of the raw `sentiment` column.
#[derive(Debug, Clone, PartialEq)]
pub enum SentimentReading {
    /// A plain label such as `good` or `bad`.
    Label(String),
    /// A structured record; the class follows the sign of `polarity`.
    Scores {
        class: SentimentClass,
        polarity: f64,
        subjectivity: Option<f64>,
    },
    /// A structured record without a usable polarity.
    Malformed,
}

impl SentimentReading {
    /// Parses a cell without ever evaluating it.
    ///
    /// Cells starting with `{` are read as `{'class': .., 'polarity': ..,
    /// 'subjectivity': ..}` records (either quote style); everything else is a
    /// label. Records without a finite polarity are [`Self::Malformed`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.starts_with('{') {
            return Self::Label(raw.to_string());
        }

        let score = |re: &Regex| {
            re.captures(raw)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        match score(&POLARITY_RE) {
            Some(polarity) => Self::Scores {
                class: classify_polarity(polarity),
                polarity,
                subjectivity: score(&SUBJECTIVITY_RE),
            },
            None => Self::Malformed,
        }
    }

    /// Labels `good` and `bad` give positive and negative, an exact class name
    /// gives itself, anything else is neutral.
    ///
    /// Color and size do not follow this mapping for labels: see [`Self::color`].
    pub fn class(&self) -> SentimentClass {
        match self {
            Self::Label(label) => match label.as_str() {
                "good" => SentimentClass::Positive,
                "bad" => SentimentClass::Negative,
                other => SentimentClass::from_str(other).unwrap_or(SentimentClass::Neutral),
            },
            Self::Scores { class, .. } => *class,
            Self::Malformed => SentimentClass::Neutral,
        }
    }

    /// Labels are colored by [`sentiment_color`], which only knows `good` and
    /// `bad`. A `positive` label therefore counts as positive but is drawn
    /// grey at size 7, exactly like an unknown label.
    pub fn color(&self) -> PointColor {
        match self {
            Self::Label(label) => sentiment_color(label),
            Self::Scores { class, .. } => class.color(),
            Self::Malformed => PointColor::Grey,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            Self::Label(label) => sentiment_size(label),
            Self::Scores { class, .. } => class.size(),
            Self::Malformed => SIZE_NEUTRAL,
        }
    }

    pub fn polarity(&self) -> Option<f64> {
        match self {
            Self::Scores { polarity, .. } => Some(*polarity),
            _ => None,
        }
    }

    pub fn subjectivity(&self) -> Option<f64> {
        match self {
            Self::Scores { subjectivity, .. } => *subjectivity,
            _ => None,
        }
    }

    /// The `class` field written in the record, if any. Informational only:
    /// [`Self::class`] always follows the polarity sign.
    pub fn declared_class(raw: &str) -> Option<String> {
        CLASS_RE
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// True if `raw` is a record whose declared class names a class other
    /// than the one its polarity gives. Unknown declared classes never count.
    pub fn contradicts_declared_class(&self, raw: &str) -> bool {
        match self {
            Self::Scores { class, .. } => Self::declared_class(raw)
                .and_then(|declared| SentimentClass::from_str(declared.trim()).ok())
                .is_some_and(|declared| declared != *class),
            _ => false,
        }
    }
}

/// Number of records whose declared class disagrees with their polarity sign.
pub(crate) fn declared_class_conflicts(
    raw: &[Option<String>],
    readings: &[SentimentReading],
) -> usize {
    raw.iter()
        .zip(readings)
        .filter(|(cell, reading)| {
            reading.contradicts_declared_class(cell.as_deref().unwrap_or_default())
        })
        .count()
}

/// Adds `sentiment_class`, `sentiment_polarity`, `sentiment_subjectivity`,
/// `color` and `size` to the crypto-news table.
pub fn with_sentiment_attributes(mut df: DataFrame) -> BoardResult<DataFrame> {
    let raw = column_values::strings(&df, Table::CryptoNews, CryptoNewsCol::Sentiment.as_str())?;

    let readings = raw
        .iter()
        .map(|cell| SentimentReading::parse(cell.as_deref().unwrap_or_default()))
        .collect::<Vec<_>>();

    let malformed = readings
        .iter()
        .filter(|r| matches!(r, SentimentReading::Malformed))
        .count();
    if malformed > 0 {
        warn!(
            malformed,
            rows = readings.len(),
            "Malformed structured sentiment cells defaulted to neutral"
        );
    }

    let conflicts = declared_class_conflicts(&raw, &readings);
    if conflicts > 0 {
        warn!(
            conflicts,
            rows = readings.len(),
            "Declared sentiment class overridden by polarity sign"
        );
    }

    let class = readings.iter().map(|r| r.class().as_str()).collect::<Vec<_>>();
    let polarity = readings.iter().map(|r| r.polarity()).collect::<Vec<_>>();
    let subjectivity = readings.iter().map(|r| r.subjectivity()).collect::<Vec<_>>();
    let color = readings.iter().map(|r| r.color().as_str()).collect::<Vec<_>>();
    let size = readings.iter().map(|r| r.size()).collect::<Vec<_>>();

    let derived = [
        Column::new(CryptoNewsCol::SentimentClass.name(), class),
        Column::new(CryptoNewsCol::SentimentPolarity.name(), polarity),
        Column::new(CryptoNewsCol::SentimentSubjectivity.name(), subjectivity),
        Column::new(CryptoNewsCol::Color.name(), color),
        Column::new(CryptoNewsCol::Size.name(), size),
    ];

    for column in derived {
        df.with_column(column)
            .map_err(|e| polars_err("Failed to attach sentiment attributes", e))?;
    }

    Ok(df)
}
