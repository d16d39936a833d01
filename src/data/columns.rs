use polars::prelude::PlSmallStr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Canonical name of the date column shared by every base table.
pub const DATE: &str = "date";

/// The three base tables a dashboard session works on.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Historical price records, one row per (symbol, date).
    Prices,
    /// Scored news headlines.
    Headlines,
    /// News articles annotated with sentiment.
    CryptoNews,
}

/// A canonical column of one of the base tables.
///
/// Raw CSV headers are matched against [`TableColumn::aliases`]
/// case-insensitively and renamed to [`TableColumn::as_str`].
pub trait TableColumn: Copy + IntoEnumIterator + Into<&'static str> {
    fn as_str(self) -> &'static str {
        self.into()
    }

    fn name(self) -> PlSmallStr {
        self.as_str().into()
    }

    /// Alternative raw header spellings, lowercase.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Derived columns never come from the input file.
    fn is_derived(self) -> bool {
        false
    }
}

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
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PriceCol {
    Date,
    Name,
    Symbol,
    Open,
    High,
    Low,
    Close,
    Volume,
    Marketcap,

    // === Derived ===
    /// `green`, `red` or `grey` relative to the previous row.
    Color,
    /// Point opacity in (0, 1] scaled by volume.
    Alpha,
}

impl TableColumn for PriceCol {
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Marketcap => &["market_cap", "market cap"],
            _ => &[],
        }
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::Color | Self::Alpha)
    }
}

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
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum HeadlineCol {
    Date,
    Title,
    Score,
    Url,
    CommentCount,
    Body,

    // === Derived ===
    FormattedDate,
}

impl TableColumn for HeadlineCol {
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Date => &["timestamp"],
            Self::CommentCount => &["comms_num", "comments"],
            _ => &[],
        }
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::FormattedDate)
    }
}

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
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum CryptoNewsCol {
    Date,
    /// Either a plain label (`good`, `bad`, ...) or a structured
    /// `{'class': .., 'polarity': .., 'subjectivity': ..}` record.
    Sentiment,
    Source,
    Subject,
    Text,
    Title,
    Url,

    // === Derived ===
    SentimentClass,
    SentimentPolarity,
    SentimentSubjectivity,
    Color,
    Size,
    FormattedDate,
}

impl TableColumn for CryptoNewsCol {
    fn is_derived(self) -> bool {
        matches!(
            self,
            Self::SentimentClass
                | Self::SentimentPolarity
                | Self::SentimentSubjectivity
                | Self::Color
                | Self::Size
                | Self::FormattedDate
        )
    }
}
