//! Vega-Lite v5 chart specifications for the exploratory report.
//!
//! Builders return plain JSON; rendering is left to any Vega-Lite viewer.

use std::collections::BTreeMap;

use cardio_ml_core::MlResult;
use cardio_ml_data::{Column, DataFrame};
use serde_json::{json, Map, Value};

use crate::correlation::CorrelationMatrix;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

const TARGET_TITLE: &str = "Heart Disease";

/// Inline data records for the named columns.
fn records(frame: &DataFrame, columns: &[&str]) -> MlResult<Vec<Value>> {
    let selected: Vec<(&str, &Column)> = columns
        .iter()
        .map(|&name| Ok((name, frame.column(name)?)))
        .collect::<MlResult<_>>()?;
    Ok((0..frame.n_rows())
        .map(|i| {
            let mut row = Map::new();
            for (name, column) in &selected {
                let value = match column {
                    Column::Numeric(v) => json!(v[i]),
                    Column::Text(v) => json!(v[i]),
                };
                row.insert(name.to_string(), value);
            }
            Value::Object(row)
        })
        .collect())
}

/// Lay charts out two per row.
fn grid(charts: Vec<Value>, data: Vec<Value>) -> Value {
    let rows: Vec<Value> = charts
        .chunks(2)
        .map(|pair| json!({ "hconcat": pair }))
        .collect();
    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "data": { "values": data },
        "vconcat": rows,
        "config": { "legend": { "orient": "top" } }
    })
}

fn target_color(target: &str) -> Value {
    json!({ "field": target, "type": "nominal", "title": TARGET_TITLE })
}

/// Bar chart of class counts with the count printed above each bar.
pub fn target_distribution(frame: &DataFrame, target: &str) -> MlResult<Value> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in frame.column(target)?.to_strings() {
        *counts.entry(label).or_insert(0) += 1;
    }
    let values: Vec<Value> = counts
        .into_iter()
        .map(|(label, count)| json!({ target: label, "count": count }))
        .collect();

    let encoding = json!({
        "x": { "field": target, "type": "nominal", "title": TARGET_TITLE },
        "y": { "field": "count", "type": "quantitative", "title": "Count" },
        "color": target_color(target),
        "tooltip": [{ "field": "count", "type": "quantitative", "title": "Count" }]
    });
    Ok(json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": format!("Cases of {}", TARGET_TITLE),
        "width": 300,
        "height": 300,
        "data": { "values": values },
        "encoding": encoding,
        "layer": [
            { "mark": { "type": "bar", "stroke": "black", "strokeWidth": 1 } },
            {
                "mark": { "type": "text", "dy": -5, "size": 14 },
                "encoding": { "text": { "field": "count", "type": "quantitative" } }
            }
        ]
    }))
}

/// One histogram (at most 30 bins) per numeric column.
pub fn numeric_distributions(frame: &DataFrame, columns: &[String]) -> MlResult<Value> {
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let data = records(frame, &names)?;
    let charts = names
        .iter()
        .map(|col| {
            json!({
                "title": format!("Distribution of {}", col),
                "width": 300,
                "height": 250,
                "mark": "bar",
                "encoding": {
                    "x": { "field": col, "type": "quantitative", "bin": { "maxbins": 30 } },
                    "y": { "aggregate": "count", "type": "quantitative", "title": "Count" },
                    "tooltip": [
                        { "field": col, "type": "quantitative", "title": col },
                        { "aggregate": "count", "type": "quantitative", "title": "Count" }
                    ]
                }
            })
        })
        .collect();
    Ok(grid(charts, data))
}

/// Horizontal boxplots of each numeric column split by target class.
pub fn boxplots(frame: &DataFrame, columns: &[String], target: &str) -> MlResult<Value> {
    let mut names: Vec<&str> = columns.iter().map(String::as_str).collect();
    names.push(target);
    let data = records(frame, &names)?;
    let charts = columns
        .iter()
        .map(|col| {
            json!({
                "title": format!("{} vs {}", col, TARGET_TITLE),
                "width": 300,
                "height": 250,
                "mark": { "type": "boxplot", "size": 20 },
                "encoding": {
                    "x": { "field": col, "type": "quantitative", "title": col },
                    "y": { "field": target, "type": "nominal", "title": TARGET_TITLE },
                    "color": target_color(target)
                }
            })
        })
        .collect();
    Ok(grid(charts, data))
}

/// Grouped bar counts of each categorical column, bars offset by target
/// class. `axis_titles` pairs a column with its x-axis title.
pub fn categorical_vs_target(
    frame: &DataFrame,
    axis_titles: &[(String, String)],
    target: &str,
) -> MlResult<Value> {
    let mut names: Vec<&str> = axis_titles.iter().map(|(c, _)| c.as_str()).collect();
    names.push(target);
    let data = records(frame, &names)?;
    let charts = axis_titles
        .iter()
        .map(|(col, title)| {
            json!({
                "title": format!("{} vs {}", col, TARGET_TITLE),
                "width": 300,
                "height": 250,
                "mark": { "type": "bar", "size": 30 },
                "encoding": {
                    "x": {
                        "field": col,
                        "type": "nominal",
                        "title": title,
                        "scale": { "paddingInner": 0.5, "paddingOuter": 0.5 }
                    },
                    "xOffset": { "field": target, "type": "nominal" },
                    "y": { "aggregate": "count", "type": "quantitative", "title": "Count" },
                    "color": target_color(target),
                    "tooltip": [{ "aggregate": "count", "type": "quantitative", "title": "Count" }]
                }
            })
        })
        .collect();
    Ok(grid(charts, data))
}

/// Heatmap of a correlation matrix with values printed to two decimals.
pub fn correlation_heatmap(matrix: &CorrelationMatrix) -> Value {
    let values: Vec<Value> = matrix
        .to_long()
        .into_iter()
        .map(|(x, y, r)| json!({ "feature_x": x, "feature_y": y, "correlation": r }))
        .collect();
    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": "Correlation Heatmap of All Features with Target",
        "width": 600,
        "height": 600,
        "data": { "values": values },
        "encoding": {
            "x": { "field": "feature_x", "type": "nominal", "title": "Feature" },
            "y": { "field": "feature_y", "type": "nominal", "title": "Feature" }
        },
        "layer": [
            {
                "mark": "rect",
                "encoding": {
                    "color": {
                        "field": "correlation",
                        "type": "quantitative",
                        "scale": { "scheme": "redblue", "domain": [-1, 1] }
                    },
                    "tooltip": [
                        { "field": "feature_x", "type": "nominal" },
                        { "field": "feature_y", "type": "nominal" },
                        { "field": "correlation", "type": "quantitative" }
                    ]
                }
            },
            {
                "mark": { "type": "text", "fontSize": 12, "color": "black" },
                "encoding": {
                    "text": { "field": "correlation", "type": "quantitative", "format": ".2f" }
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::correlation_matrix;

    fn frame() -> DataFrame {
        let target: Vec<String> = ["Heart Disease", "No Heart Disease", "Heart Disease"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        DataFrame::new(vec![
            ("age".to_string(), Column::Numeric(vec![63.0, 37.0, f64::NAN])),
            ("resting_bp".to_string(), Column::Numeric(vec![145.0, 130.0, 120.0])),
            ("old_peak".to_string(), Column::Numeric(vec![2.3, 3.5, 1.4])),
            ("chest_pain".to_string(), Column::Numeric(vec![3.0, 2.0, 1.0])),
            ("target".to_string(), Column::Text(target)),
        ])
        .unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_target_distribution_counts() {
        let chart = target_distribution(&frame(), "target").unwrap();
        assert_eq!(chart["$schema"], VEGA_LITE_SCHEMA);
        let values = chart["data"]["values"].as_array().unwrap();
        assert_eq!(values[0], json!({ "target": "Heart Disease", "count": 2 }));
        assert_eq!(values[1]["count"], 1);
        assert_eq!(chart["layer"][1]["mark"]["type"], "text");
    }

    #[test]
    fn test_histograms_in_rows_of_two() {
        let chart = numeric_distributions(&frame(), &cols(&["age", "resting_bp", "old_peak"])).unwrap();
        let rows = chart["vconcat"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["hconcat"].as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["hconcat"].as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["hconcat"][0]["encoding"]["x"]["bin"]["maxbins"], 30);
        assert!(chart["data"]["values"][2]["age"].is_null());
    }

    #[test]
    fn test_boxplots_and_categorical() {
        let box_chart = boxplots(&frame(), &cols(&["age"]), "target").unwrap();
        assert_eq!(box_chart["vconcat"][0]["hconcat"][0]["mark"]["type"], "boxplot");
        assert_eq!(box_chart["data"]["values"][0]["target"], "Heart Disease");

        let titles = vec![("chest_pain".to_string(), "Chest Pain Type".to_string())];
        let cat = categorical_vs_target(&frame(), &titles, "target").unwrap();
        let enc = &cat["vconcat"][0]["hconcat"][0]["encoding"];
        assert_eq!(enc["x"]["title"], "Chest Pain Type");
        assert_eq!(enc["xOffset"]["field"], "target");

        assert!(boxplots(&frame(), &cols(&["cholesterol"]), "target").is_err());
    }

    #[test]
    fn test_heatmap() {
        let m = correlation_matrix(&frame(), &cols(&["resting_bp", "target"]), "Heart Disease").unwrap();
        let chart = correlation_heatmap(&m);
        assert_eq!(chart["data"]["values"].as_array().unwrap().len(), 4);
        let color = &chart["layer"][0]["encoding"]["color"]["scale"];
        assert_eq!(color["scheme"], "redblue");
        assert_eq!(color["domain"], json!([-1, 1]));
        assert_eq!(chart["layer"][1]["encoding"]["text"]["format"], ".2f");
    }
}
