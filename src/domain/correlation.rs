//! Pearson correlation between sentiment and price variation per offset.

use crate::domain::sentiment::{SentimentScores, SentimentVariant};
use crate::domain::window::{offset_label, EventWindow, OffsetSlot};
use std::fmt;
use std::str::FromStr;

pub const MIN_SAMPLES: usize = 3;
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// How [`rank`] orders results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationOrdering {
    /// Largest `|r|` first, positive or negative.
    #[default]
    Magnitude,
    /// Largest `r` first; strong negative correlations sort last.
    Signed,
}

impl FromStr for CorrelationOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "magnitude" | "abs" => Ok(CorrelationOrdering::Magnitude),
            "signed" => Ok(CorrelationOrdering::Signed),
            other => Err(format!(
                "unknown correlation ordering '{other}' (expected magnitude or signed)"
            )),
        }
    }
}

impl fmt::Display for CorrelationOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationOrdering::Magnitude => write!(f, "magnitude"),
            CorrelationOrdering::Signed => write!(f, "signed"),
        }
    }
}

/// Which per-offset price variation is correlated against sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceMetric {
    #[default]
    PctChangePrevClose,
    IntradayPct,
}

impl PriceMetric {
    pub fn value(&self, slot: &OffsetSlot) -> Option<f64> {
        match self {
            PriceMetric::PctChangePrevClose => slot.pct_change_prev_close,
            PriceMetric::IntradayPct => slot.intraday_pct,
        }
    }
}

impl FromStr for PriceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pct_change_prev_close" => Ok(PriceMetric::PctChangePrevClose),
            "intraday_pct" => Ok(PriceMetric::IntradayPct),
            other => Err(format!(
                "unknown price metric '{other}' (expected pct_change_prev_close or intraday_pct)"
            )),
        }
    }
}

impl fmt::Display for PriceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceMetric::PctChangePrevClose => write!(f, "pct_change_prev_close"),
            PriceMetric::IntradayPct => write!(f, "intraday_pct"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSettings {
    pub min_samples: usize,
    pub significance: f64,
    pub metric: PriceMetric,
    pub ordering: CorrelationOrdering,
    pub top_n: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            min_samples: MIN_SAMPLES,
            significance: DEFAULT_SIGNIFICANCE,
            metric: PriceMetric::PctChangePrevClose,
            ordering: CorrelationOrdering::Magnitude,
            top_n: 5,
        }
    }
}

/// An event window joined with the sentiment of its article.
#[derive(Debug, Clone, Copy)]
pub struct ScoredWindow<'a> {
    pub window: &'a EventWindow,
    pub scores: SentimentScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub variant: SentimentVariant,
    pub offset: i64,
    pub metric: PriceMetric,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub significant: bool,
}

impl CorrelationResult {
    pub fn label(&self) -> String {
        offset_label(self.offset)
    }
}

/// Rows whose metric is present at every offset.
pub fn complete_rows<'a, 'b>(
    rows: &'b [ScoredWindow<'a>],
    metric: PriceMetric,
) -> Vec<&'b ScoredWindow<'a>> {
    rows.iter()
        .filter(|row| {
            !row.window.slots.is_empty()
                && row.window.slots.iter().all(|s| metric.value(s).is_some())
        })
        .collect()
}

/// One result per sentiment variant and offset, over complete rows only.
/// Pairs with too few samples or zero variance are left out.
pub fn compute_correlations(
    rows: &[ScoredWindow<'_>],
    offsets: impl IntoIterator<Item = i64> + Clone,
    settings: &CorrelationSettings,
) -> Vec<CorrelationResult> {
    let complete = complete_rows(rows, settings.metric);
    let mut results = Vec::new();

    for variant in SentimentVariant::ALL {
        for offset in offsets.clone() {
            let (x, y): (Vec<f64>, Vec<f64>) = complete
                .iter()
                .filter_map(|row| {
                    let slot = row.window.slot(offset)?;
                    let v = settings.metric.value(slot)?;
                    Some((row.scores.get(variant), v))
                })
                .unzip();

            if x.len() < settings.min_samples {
                continue;
            }
            let Some(r) = pearson(&x, &y) else {
                tracing::debug!(%variant, offset, "zero variance, correlation skipped");
                continue;
            };
            let p_value = p_value(r, x.len()).unwrap_or(f64::NAN);

            results.push(CorrelationResult {
                variant,
                offset,
                metric: settings.metric,
                r,
                p_value,
                n: x.len(),
                significant: p_value < settings.significance,
            });
        }
    }

    results
}

/// Top `top_n` results under `ordering`. Ties keep input order.
pub fn rank(
    results: &[CorrelationResult],
    ordering: CorrelationOrdering,
    top_n: usize,
) -> Vec<&CorrelationResult> {
    let mut sorted: Vec<&CorrelationResult> = results.iter().collect();
    let key = |r: &CorrelationResult| match ordering {
        CorrelationOrdering::Magnitude => r.r.abs(),
        CorrelationOrdering::Signed => r.r,
    };
    sorted.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
    sorted.truncate(top_n);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantSummary {
    pub variant: SentimentVariant,
    pub mean_r: Option<f64>,
    pub significant: usize,
    pub computed: usize,
}

pub fn summarize(results: &[CorrelationResult]) -> Vec<VariantSummary> {
    SentimentVariant::ALL
        .iter()
        .map(|&variant| {
            let rs: Vec<&CorrelationResult> =
                results.iter().filter(|r| r.variant == variant).collect();
            let mean_r = (!rs.is_empty())
                .then(|| rs.iter().map(|r| r.r).sum::<f64>() / rs.len() as f64);
            VariantSummary {
                variant,
                mean_r,
                significant: rs.iter().filter(|r| r.significant).count(),
                computed: rs.len(),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation coefficient. `None` for mismatched lengths, fewer
/// than two points, or a constant series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Two-sided p-value for `r` over `n` samples, from Student's t with
/// `n - 2` degrees of freedom.
pub fn p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 || !r.is_finite() {
        return None;
    }
    if r.abs() >= 1.0 {
        return Some(0.0);
    }
    let df = (n - 2) as f64;
    let t2 = r * r * df / (1.0 - r * r);
    Some(regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t2)))
}

fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

// Lentz's method.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

// Lanczos approximation, g = 7.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
