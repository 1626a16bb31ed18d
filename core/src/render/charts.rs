use crate::model::{AnalysisResult, DetectionMode, RiskLevel, TimeRange};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Upper bound on points per time series.
const MAX_SERIES_POINTS: u32 = 24;

/// Total emissions split across the carbon impact bars, in tonnes CO₂.
const CARBON_TOTAL_TONNES: u32 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    RiskDistribution,
    Trend,
    Impact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            title: title.into(),
            labels,
            values,
        }
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Risk distribution straight from the result counts.
pub fn risk_distribution(result: &AnalysisResult) -> ChartSeries {
    let labels = RiskLevel::ALL
        .iter()
        .map(|level| format!("{} Risk", capitalize(level.as_str())))
        .collect();
    let values = RiskLevel::ALL
        .iter()
        .map(|level| result.count_for(*level) as f64)
        .collect();
    ChartSeries::new("Risk Distribution", labels, values)
}

/// `HH:MM` labels from `hours` ago up to `now`, sampled down to at most
/// [`MAX_SERIES_POINTS`] + 1 points. Instants before the earliest
/// representable date are skipped.
pub fn time_labels<Tz: TimeZone>(hours: u32, now: DateTime<Tz>) -> Vec<String>
where
    Tz::Offset: std::fmt::Display,
{
    let step = hours.div_ceil(MAX_SERIES_POINTS).max(1);
    (0..=hours)
        .rev()
        .step_by(step as usize)
        .filter_map(|offset| {
            now.clone()
                .checked_sub_signed(ChronoDuration::hours(offset as i64))
        })
        .map(|instant| instant.format("%H:%M").to_string())
        .collect()
}

/// Carbon impact split into high / medium / low bars (40 % / 35 % / rest).
pub fn carbon_impact() -> ChartSeries {
    let high = (CARBON_TOTAL_TONNES as f64 * 0.40).round();
    let medium = (CARBON_TOTAL_TONNES as f64 * 0.35).round();
    let low = CARBON_TOTAL_TONNES as f64 - (CARBON_TOTAL_TONNES as f64 * 0.75).round();
    ChartSeries::new(
        "Carbon Impact (t CO₂)",
        vec!["High Impact".into(), "Medium Impact".into(), "Low Impact".into()],
        vec![high, medium, low],
    )
}

/// Produces the placeholder trend and impact series for each detection mode.
pub struct ChartFeed {
    rng: StdRng,
}

impl ChartFeed {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn trend<Tz: TimeZone>(
        &mut self,
        mode: DetectionMode,
        range: &TimeRange,
        now: DateTime<Tz>,
    ) -> ChartSeries
    where
        Tz::Offset: std::fmt::Display,
    {
        let labels = time_labels(range.hours(), now);
        let points = labels.len();
        let (title, values) = match mode {
            DetectionMode::Deforestation => ("Deforestation Rate", self.uniform(points, 100.0)),
            DetectionMode::Biodiversity => ("Biodiversity Index", self.uniform(points, 100.0)),
            DetectionMode::Carbon => ("Carbon Emissions (t CO₂)", self.carbon_trend(points)),
            DetectionMode::Water => ("Water Level (m)", self.water_trend(points)),
        };
        ChartSeries::new(title, labels, values)
    }

    pub fn impact<Tz: TimeZone>(
        &mut self,
        mode: DetectionMode,
        range: &TimeRange,
        now: DateTime<Tz>,
    ) -> ChartSeries
    where
        Tz::Offset: std::fmt::Display,
    {
        if mode == DetectionMode::Carbon {
            return carbon_impact();
        }
        let labels = time_labels(range.hours(), now);
        let values = self.uniform(labels.len(), 100.0);
        ChartSeries::new("Biodiversity Impact", labels, values)
    }

    fn uniform(&mut self, points: usize, max: f64) -> Vec<f64> {
        (0..points).map(|_| self.rng.gen::<f64>() * max).collect()
    }

    /// Declining emissions from 1000 t, 15 t per step, ±25 t noise.
    fn carbon_trend(&mut self, points: usize) -> Vec<f64> {
        let mut current = 1000.0;
        (0..points)
            .map(|_| {
                current -= 15.0;
                (current + (self.rng.gen::<f64>() - 0.5) * 50.0).max(0.0)
            })
            .collect()
    }

    /// Water level from 30 m, falling 0.2 m per step, ±25 % noise.
    fn water_trend(&mut self, points: usize) -> Vec<f64> {
        let mut current = 30.0;
        (0..points)
            .map(|_| {
                current -= 0.2;
                let factor = 1.0 + (self.rng.gen::<f64>() - 0.5) * 0.5;
                (current * factor).max(0.0)
            })
            .collect()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
