use polars::{
    frame::DataFrame,
    prelude::{Column, DataType, IntoLazy, col, lit},
};

use crate::{
    config::PriceColorRule,
    data::columns::{PriceCol, Table, TableColumn},
    derive::{PointColor, column_values},
    error::{BoardResult, polars_err},
    polars_ext::ExprExt,
};

/// Lowest opacity a price point is drawn with.
pub const ALPHA_FLOOR: f64 = 0.2;

/// Colors each row against the row before it, in file order.
///
/// Row 0 is always grey. A missing value on either side is ambiguous and
/// also grey.
pub fn close_colors(close: &[Option<f64>]) -> Vec<PointColor> {
    let mut colors = Vec::with_capacity(close.len());
    for (i, current) in close.iter().enumerate() {
        let color = match (i.checked_sub(1).and_then(|p| close[p]), current) {
            (Some(prev), Some(cur)) if *cur > prev => PointColor::Green,
            (Some(prev), Some(cur)) if *cur < prev => PointColor::Red,
            _ => PointColor::Grey,
        };
        colors.push(color);
    }
    colors
}

/// `high` rose → green; otherwise `low` fell → red; otherwise grey.
///
/// Both slices must have the same length.
pub fn high_low_colors(high: &[Option<f64>], low: &[Option<f64>]) -> Vec<PointColor> {
    let prev_of = |values: &[Option<f64>], i: usize| i.checked_sub(1).and_then(|p| values[p]);

    high.iter()
        .zip(low)
        .enumerate()
        .map(|(i, (h, l))| {
            let rose = matches!((prev_of(high, i), h), (Some(prev), Some(cur)) if *cur > prev);
            let fell = matches!((prev_of(low, i), l), (Some(prev), Some(cur)) if *cur < prev);
            if rose {
                PointColor::Green
            } else if fell {
                PointColor::Red
            } else {
                PointColor::Grey
            }
        })
        .collect()
}

pub fn price_colors(df: &DataFrame, rule: PriceColorRule) -> BoardResult<Vec<PointColor>> {
    let colors = match rule {
        PriceColorRule::Close => {
            let close = column_values::floats(df, Table::Prices, PriceCol::Close.as_str())?;
            close_colors(&close)
        }
        PriceColorRule::HighLow => {
            let high = column_values::floats(df, Table::Prices, PriceCol::High.as_str())?;
            let low = column_values::floats(df, Table::Prices, PriceCol::Low.as_str())?;
            high_low_colors(&high, &low)
        }
    };
    Ok(colors)
}

/// Adds `color` (by `rule`) and `alpha` (scaled by `volume`) to the price table.
///
/// `alpha = 0.2 + 0.8 * (volume - min) / (max - min)`; a constant volume
/// column yields `1.0` everywhere. Missing volume also yields `1.0`.
pub fn with_price_attributes(df: DataFrame, rule: PriceColorRule) -> BoardResult<DataFrame> {
    let colors = price_colors(&df, rule)?;
    let colors = colors.iter().map(PointColor::as_str).collect::<Vec<_>>();

    // volume is required
    column_values::floats(&df, Table::Prices, PriceCol::Volume.as_str())?;

    let volume = col(PriceCol::Volume.as_str()).cast(DataType::Float64);
    let span = volume.clone().max() - volume.clone().min();
    let alpha = (lit(ALPHA_FLOOR)
        + lit(1.0 - ALPHA_FLOOR) * (volume.clone() - volume.min()).safe_div(span, 1.0))
    .fill_null(lit(1.0))
    .alias(PriceCol::Alpha.as_str());

    let mut out = df
        .lazy()
        .with_column(alpha)
        .collect()
        .map_err(|e| polars_err("Failed to derive price alpha", e))?;

    out.with_column(Column::new(PriceCol::Color.name(), colors))
        .map_err(|e| polars_err("Failed to attach price colors", e))?;

    Ok(out)
}
