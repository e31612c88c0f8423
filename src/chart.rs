//! Chart bundles handed to the rendering layer.
//!
//! Each builder produces one typed chart; [`ChartOutcome`] wraps either a
//! ready chart or a placeholder message, so no error reaches the renderer.

use serde::Serialize;

use crate::error::DashError;
use crate::series::{
    age::AgeChart, choropleth::ChoroplethChart, ranking::RankingChart, survival::SurvivalChart,
    trend::TrendChart,
};

// ── Chart kinds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Trend,
    RegionalMap,
    AgeDistribution,
    TopCancers,
    Survival,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Trend,
        ChartKind::RegionalMap,
        ChartKind::AgeDistribution,
        ChartKind::TopCancers,
        ChartKind::Survival,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Trend => "trend",
            ChartKind::RegionalMap => "regional_map",
            ChartKind::AgeDistribution => "age_distribution",
            ChartKind::TopCancers => "top_cancers",
            ChartKind::Survival => "survival",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == raw.trim())
    }
}

// ── Styling ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DashStyle {
    #[serde(rename = "solid")]
    Solid,
    #[serde(rename = "dash")]
    Dash,
    #[serde(rename = "dot")]
    Dot,
    #[serde(rename = "3,3")]
    ShortDash,
    #[serde(rename = "10,3")]
    LongDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    Circle,
    Square,
    Diamond,
    TriangleUp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
    pub dash: DashStyle,
    pub width: u8,
    pub marker: Option<Marker>,
}

impl LineStyle {
    pub fn new(color: &str, dash: DashStyle, width: u8) -> Self {
        Self {
            color: color.to_string(),
            dash,
            width,
            marker: None,
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }
}

// ── Series ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<XyPoint>,
    pub style: LineStyle,
    pub show_in_legend: bool,
}

impl LineSeries {
    pub fn new(name: impl Into<String>, points: Vec<XyPoint>, style: LineStyle) -> Self {
        Self {
            name: name.into(),
            points,
            style,
            show_in_legend: true,
        }
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub name: String,
    pub color: String,
    pub points: Vec<CategoryPoint>,
}

impl CategorySeries {
    pub fn categories(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.category.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// `[0, 1.1 × max]`, the headroom every bar and line chart uses.
    pub fn padded(max: f64) -> Self {
        Self {
            min: 0.0,
            max: max * 1.1,
        }
    }
}

// ── Bundles ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum ChartBundle {
    Trend(TrendChart),
    RegionalMap(ChoroplethChart),
    AgeDistribution(AgeChart),
    TopCancers(RankingChart),
    Survival(SurvivalChart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    MissingCriteria,
    InvalidCriteria,
    EmptySelection,
    InsufficientData,
    DataUnavailable,
    Failed,
}

/// What the renderer shows instead of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub reason: PlaceholderReason,
    pub message: String,
}

impl From<DashError> for Placeholder {
    fn from(err: DashError) -> Self {
        let reason = match &err {
            DashError::MissingCriteria(_) => PlaceholderReason::MissingCriteria,
            DashError::InvalidCriteria(_) => PlaceholderReason::InvalidCriteria,
            DashError::EmptySelection => PlaceholderReason::EmptySelection,
            DashError::InsufficientData(_) => PlaceholderReason::InsufficientData,
            DashError::TableUnavailable { .. } | DashError::DataLoad { .. } => {
                PlaceholderReason::DataUnavailable
            }
            _ => PlaceholderReason::Failed,
        };
        Self {
            reason,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartOutcome {
    Ready(ChartBundle),
    Placeholder(Placeholder),
}

impl ChartOutcome {
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match self {
            ChartOutcome::Placeholder(p) => Some(p),
            ChartOutcome::Ready(_) => None,
        }
    }

    pub fn bundle(&self) -> Option<&ChartBundle> {
        match self {
            ChartOutcome::Ready(b) => Some(b),
            ChartOutcome::Placeholder(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_become_placeholders_with_messages() {
        let p = Placeholder::from(DashError::MissingCriteria("a cancer type".into()));
        assert_eq!(p.reason, PlaceholderReason::MissingCriteria);
        assert_eq!(p.message, "Please select a cancer type");

        let p = Placeholder::from(DashError::InsufficientData(1));
        assert_eq!(p.reason, PlaceholderReason::InsufficientData);
    }

    #[test]
    fn dash_styles_serialize_as_renderer_values() {
        assert_eq!(serde_json::to_string(&DashStyle::ShortDash).unwrap(), r#""3,3""#);
        assert_eq!(serde_json::to_string(&Marker::TriangleUp).unwrap(), r#""triangle-up""#);
        assert_eq!(ChartKind::parse("top_cancers"), Some(ChartKind::TopCancers));
    }
}
