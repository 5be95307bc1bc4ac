use std::collections::BTreeMap;

use cardio_ml_data::{Column, DataFrame};
use serde::Serialize;

/// Descriptive statistics of one column. Numeric fields are `None` for
/// text columns and the frequency fields are `None` for numeric ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// `describe` output: one summary per frame column, in frame order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub columns: Vec<(String, ColumnSummary)>,
}

/// Linear-interpolated percentile of sorted values, `q` in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn numeric_summary(values: &[f64]) -> ColumnSummary {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mean = (n > 0).then(|| sorted.iter().sum::<f64>() / n as f64);
    let std = mean.filter(|_| n > 1).map(|m| {
        let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });
    ColumnSummary {
        count: n,
        mean,
        std,
        min: sorted.first().copied(),
        p25: percentile(&sorted, 0.25),
        p50: percentile(&sorted, 0.5),
        p75: percentile(&sorted, 0.75),
        max: sorted.last().copied(),
        ..Default::default()
    }
}

fn text_summary(values: &[String]) -> ColumnSummary {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for v in values.iter().filter(|v| !v.is_empty()) {
        let c = counts.entry(v.as_str()).or_insert(0);
        if *c == 0 {
            first_seen.push(v);
        }
        *c += 1;
    }
    // most frequent, earliest seen on ties
    let mut top: Option<(&str, usize)> = None;
    for v in first_seen {
        let c = counts[v];
        if top.map_or(true, |(_, best)| c > best) {
            top = Some((v, c));
        }
    }
    ColumnSummary {
        count: counts.values().sum(),
        unique: Some(counts.len()),
        top: top.map(|(v, _)| v.to_string()),
        freq: top.map(|(_, c)| c),
        ..Default::default()
    }
}

/// Summary statistics of every column, numeric and text alike.
pub fn describe(frame: &DataFrame) -> Summary {
    Summary {
        columns: frame
            .iter()
            .map(|(name, column)| {
                let s = match column {
                    Column::Numeric(v) => numeric_summary(v),
                    Column::Text(v) => text_summary(v),
                };
                (name.to_string(), s)
            })
            .collect(),
    }
}

impl Summary {
    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Statistic names as rows, columns as columns. Frequency rows appear
    /// only when some column is text, numeric rows only when some column
    /// is numeric. Missing cells are blank.
    pub fn to_table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header = vec![String::new()];
        header.extend(self.columns.iter().map(|(n, _)| n.clone()));

        let has_text = self.columns.iter().any(|(_, s)| s.unique.is_some());
        let has_numeric = self.columns.iter().any(|(_, s)| s.unique.is_none());

        let mut stats = vec!["count"];
        if has_text {
            stats.extend(["unique", "top", "freq"]);
        }
        if has_numeric {
            stats.extend(["mean", "std", "min", "25%", "50%", "75%", "max"]);
        }

        let rows = stats
            .into_iter()
            .map(|stat| {
                let mut row = vec![stat.to_string()];
                row.extend(self.columns.iter().map(|(_, s)| s.cell(stat)));
                row
            })
            .collect();
        (header, rows)
    }
}

impl ColumnSummary {
    fn cell(&self, stat: &str) -> String {
        let f = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let u = |v: Option<usize>| v.map(|x| x.to_string()).unwrap_or_default();
        match stat {
            "count" => self.count.to_string(),
            "unique" => u(self.unique),
            "top" => self.top.clone().unwrap_or_default(),
            "freq" => u(self.freq),
            "mean" => f(self.mean),
            "std" => f(self.std),
            "min" => f(self.min),
            "25%" => f(self.p25),
            "50%" => f(self.p50),
            "75%" => f(self.p75),
            "max" => f(self.max),
            _ => String::new(),
        }
    }
}
