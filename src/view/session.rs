use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    data::{
        columns::{CryptoNewsCol, Table, TableColumn},
        dataset::Dataset,
    },
    engine::{
        AggregatedView, ViewRequest,
        filter::{ALL, Choice, FilterState, ValueRange},
        filter_and_aggregate,
        scatter::{self, ScatterSource},
    },
    error::{BoardError, BoardResult, ConfigError},
    view::binder::{ChartFrame, RenderSurface},
};

/// A single user interaction with one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum ControlChange {
    Sentiment(Choice),
    Source(Choice),
    Subject(Choice),
    Date(Choice),
    Polarity(Option<ValueRange>),
    Subjectivity(Option<ValueRange>),
    TitleContains(String),
    UrlContains(String),
    TextContains(String),
    /// Only valid while a scatter view is shown.
    XAxis(String),
    /// Only valid while a scatter view is shown.
    YAxis(String),
    /// Switches to another chart.
    View(ViewRequest),
    /// Back to the unrestricted state.
    Reset,
}

/// Option lists of the select controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlPanel {
    pub sentiment: Vec<String>,
    pub source: Vec<String>,
    pub subject: Vec<String>,
    /// Columns selectable on either scatter axis of the current source.
    pub axis_columns: Vec<String>,
}

/// One interactive dashboard.
///
/// Changes are handled one at a time, each running filter, aggregate and
/// bind to completion. A change is committed only after its frame reached
/// the surface; a failing change leaves state, view and surface untouched.
pub struct Session<'a, S: RenderSurface> {
    dataset: &'a Dataset,
    state: FilterState,
    request: ViewRequest,
    view: AggregatedView,
    surface: S,
}

impl<'a, S: RenderSurface> Session<'a, S> {
    /// Renders the first, unrestricted frame of `request`.
    pub fn new(dataset: &'a Dataset, request: ViewRequest, mut surface: S) -> BoardResult<Self> {
        let state = FilterState::default();
        let view = render(dataset, &state, &request, &mut surface)?;
        info!(?request, rows = view.height(), "Session started");

        Ok(Self {
            dataset,
            state,
            request,
            view,
            surface,
        })
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn request(&self) -> &ViewRequest {
        &self.request
    }

    pub fn view(&self) -> &AggregatedView {
        &self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Applies one control change and redraws.
    pub fn dispatch(&mut self, change: ControlChange) -> BoardResult<&AggregatedView> {
        let mut state = self.state.clone();
        let mut request = self.request.clone();

        match change {
            ControlChange::Sentiment(c) => state.sentiment = c,
            ControlChange::Source(c) => state.source = c,
            ControlChange::Subject(c) => state.subject = c,
            ControlChange::Date(c) => state.date = c,
            ControlChange::Polarity(r) => state.polarity = r,
            ControlChange::Subjectivity(r) => state.subjectivity = r,
            ControlChange::TitleContains(s) => state.title_contains = s,
            ControlChange::UrlContains(s) => state.url_contains = s,
            ControlChange::TextContains(s) => state.text_contains = s,
            ControlChange::XAxis(column) => match &mut request {
                ViewRequest::Scatter { axes, .. } => axes.x = column,
                _ => return Err(no_scatter("x")),
            },
            ControlChange::YAxis(column) => match &mut request {
                ViewRequest::Scatter { axes, .. } => axes.y = column,
                _ => return Err(no_scatter("y")),
            },
            ControlChange::View(next) => request = next,
            ControlChange::Reset => state = FilterState::default(),
        }

        self.update(state, request)
    }

    /// Replaces the whole filter state at once and redraws.
    pub fn apply(&mut self, state: FilterState) -> BoardResult<&AggregatedView> {
        let request = self.request.clone();
        self.update(state, request)
    }

    /// "All" followed by the sorted distinct values of each select control.
    pub fn controls(&self) -> BoardResult<ControlPanel> {
        let source = match &self.request {
            ViewRequest::Scatter { source, .. } => *source,
            _ => ScatterSource::default(),
        };

        Ok(ControlPanel {
            sentiment: self.options(CryptoNewsCol::SentimentClass)?,
            source: self.options(CryptoNewsCol::Source)?,
            subject: self.options(CryptoNewsCol::Subject)?,
            axis_columns: scatter::axis_columns(self.dataset, source),
        })
    }

    #[tracing::instrument(skip(self, state), fields(unrestricted = state.is_unrestricted()))]
    fn update(&mut self, state: FilterState, request: ViewRequest) -> BoardResult<&AggregatedView> {
        let view = render(self.dataset, &state, &request, &mut self.surface)?;

        self.state = state;
        self.request = request;
        self.view = view;
        Ok(&self.view)
    }

    fn options(&self, column: CryptoNewsCol) -> BoardResult<Vec<String>> {
        let mut options = vec![ALL.to_string()];
        let present = self
            .dataset
            .column_names(Table::CryptoNews)
            .iter()
            .any(|c| c == column.as_str());
        if present {
            options.extend(self.dataset.distinct_values(Table::CryptoNews, column.as_str())?);
        }
        Ok(options)
    }
}

fn render<S: RenderSurface>(
    dataset: &Dataset,
    state: &FilterState,
    request: &ViewRequest,
    surface: &mut S,
) -> BoardResult<AggregatedView> {
    let view = filter_and_aggregate(state, dataset, request)?;
    surface.replace(ChartFrame::bind(&view, state, dataset.description()))?;
    Ok(view)
}

fn no_scatter(axis: &str) -> BoardError {
    ConfigError::Invalid(format!(
        "Cannot set the {axis} axis: the current view is not a scatter"
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;
    use crate::{
        config::{DateColumns, PriceColorRule},
        data::dataset::RawTables,
        view::binder::MemorySurface,
    };

    fn dataset() -> Dataset {
        let prices = df![
            "Date" => &["2021-01-01", "2021-01-02"],
            "High" => &[2.0, 3.0],
            "Low" => &[1.0, 1.5],
            "Open" => &[1.0, 1.5],
            "Close" => &[1.5, 2.5],
            "Volume" => &[10.0, 20.0],
            "Marketcap" => &[100.0, 200.0]
        ]
        .expect("Failed to create prices");
        let headlines = df![
            "title" => &["h1"],
            "score" => &[3i64],
            "timestamp" => &["2021-01-02 10:00:00"]
        ]
        .expect("Failed to create headlines");
        let crypto_news = df![
            "date" => &["2021-01-01", "2021-01-01", "2021-01-02"],
            "sentiment" => &["good", "bad", "good"],
            "source" => &["CoinDesk", "Decrypt", "CoinDesk"],
            "subject" => &["bitcoin", "bitcoin", ""],
            "title" => &["ETF approved", "Hack", "Rally"]
        ]
        .expect("Failed to create crypto news");

        Dataset::from_raw(
            RawTables {
                prices,
                headlines,
                crypto_news,
            },
            &DateColumns::default(),
            PriceColorRule::Close,
        )
        .expect("Failed to build dataset")
    }

    #[test]
    fn new_session_renders_the_first_frame() {
        let ds = dataset();
        let session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");

        assert_eq!(session.surface().replacements(), 1);
        assert_eq!(session.view().height(), 2);
        assert!(session.state().is_unrestricted());
    }

    #[test]
    fn every_change_replaces_the_whole_frame() {
        let ds = dataset();
        let mut session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");

        let rows = session
            .dispatch(ControlChange::Source(Choice::only("Decrypt")))
            .expect("dispatch failed")
            .height();
        assert_eq!(rows, 1);

        session
            .dispatch(ControlChange::TitleContains("etf".to_string()))
            .expect("dispatch failed");
        assert!(session.view().is_empty(), "Decrypt has no ETF title");

        let frame = session.surface().current().expect("no frame");
        assert_eq!(frame.row_count, 0);
        assert_eq!(frame.data.width(), 4);
        assert_eq!(session.surface().replacements(), 3);
    }

    #[test]
    fn same_state_twice_gives_the_same_view() {
        let ds = dataset();
        let mut session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");
        let state = FilterState {
            source: Choice::only("CoinDesk"),
            ..Default::default()
        };

        let first = session.apply(state.clone()).expect("apply failed").as_df().clone();
        let second = session.apply(state).expect("apply failed").as_df().clone();
        assert!(first.equals_missing(&second));
    }

    #[test]
    fn failing_change_keeps_the_previous_view() {
        let ds = dataset();
        let request = ViewRequest::scatter(ScatterSource::Prices, "date", "marketcap");
        let mut session =
            Session::new(&ds, request, MemorySurface::new()).expect("Failed to start session");

        let err = session
            .dispatch(ControlChange::YAxis("nope".to_string()))
            .expect_err("must fail");
        assert!(err.to_string().contains("nope"));
        assert_eq!(
            session.request(),
            &ViewRequest::scatter(ScatterSource::Prices, "date", "marketcap")
        );
        assert_eq!(session.surface().replacements(), 1);
    }

    #[test]
    fn axis_change_requires_a_scatter_view() {
        let ds = dataset();
        let mut session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");
        assert!(session.dispatch(ControlChange::XAxis("date".to_string())).is_err());
    }

    #[test]
    fn controls_start_with_all() {
        let ds = dataset();
        let session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");
        let panel = session.controls().expect("controls failed");

        assert_eq!(panel.sentiment, vec!["All", "negative", "positive"]);
        assert_eq!(panel.source, vec!["All", "CoinDesk", "Decrypt"]);
        assert_eq!(panel.subject, vec!["All", "bitcoin"]);
        assert!(panel.axis_columns.contains(&"marketcap".to_string()));
    }

    #[test]
    fn reset_clears_every_control() {
        let ds = dataset();
        let mut session = Session::new(&ds, ViewRequest::SentimentPivot, MemorySurface::new())
            .expect("Failed to start session");
        session
            .dispatch(ControlChange::Sentiment(Choice::only("negative")))
            .expect("dispatch failed");
        session.dispatch(ControlChange::Reset).expect("dispatch failed");

        assert!(session.state().is_unrestricted());
        assert_eq!(session.view().height(), 2);
    }

    #[test]
    fn change_parses_from_json() {
        let change: ControlChange =
            serde_json::from_str(r#"{ "control": "source", "value": "CoinDesk" }"#)
                .expect("Failed to parse change");
        assert_eq!(change, ControlChange::Source(Choice::only("CoinDesk")));
    }
}
