//! cardio-ml command-line workflow.
//!
//! Exploratory analysis, baseline cross-validation and hyperparameter
//! tuning for the heart-disease dataset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use cardio_ml::eda::{
    boxplots, categorical_vs_target, correlation_heatmap, correlation_matrix, describe,
    numeric_distributions, target_distribution,
};
use cardio_ml::io::{
    load_param_dists, load_preprocessor_spec, read_frame_csv, save_model_card, write_json,
    write_table_csv, ModelCard,
};
use cardio_ml::model_selection::{CvStrategy, SearchOptions};
use cardio_ml::workflow::{evaluate_defaults, tune_models, ScoreSettings, TrainingSet};

const NUMERIC_COLUMNS: [&str; 5] = [
    "age",
    "resting_bp",
    "serum_cholesterol",
    "max_heart_rate",
    "old_peak",
];

const CATEGORICAL_TITLES: [(&str, &str); 7] = [
    ("gender", "Gender (0 = Female, 1 = Male)"),
    ("chest_pain", "Chest Pain Type"),
    ("fasting_blood_sugar", "Fasting Blood Sugar"),
    ("resting_electro", "Resting ECG"),
    ("exercise_angia", "Exercise-Induced Angina"),
    ("slope", "Slope of ST Segment"),
    ("num_major_vessels", "Number of Major Vessels"),
];

#[derive(Parser)]
#[command(name = "cardio-ml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heart-disease classification workflow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary statistics and Vega-Lite charts of a dataset
    Eda {
        /// Processed training data CSV
        #[arg(long)]
        data: PathBuf,

        /// Directory for the summary table and chart specs
        #[arg(long)]
        output_dir: PathBuf,

        /// Target column name
        #[arg(long, default_value = "target")]
        target_col: String,

        /// Target value counted as positive in correlations
        #[arg(long, default_value = "Heart Disease")]
        pos_label: String,
    },

    /// Cross-validate every catalog model with default hyperparameters
    EvaluateDefaults {
        /// Training data CSV
        #[arg(long)]
        train_data: PathBuf,

        /// Target column name
        #[arg(long)]
        target_col: String,

        /// Preprocessor spec (JSON)
        #[arg(long)]
        preprocessor_path: PathBuf,

        /// Positive class label for the F-beta score
        #[arg(long, default_value = "Heart Disease")]
        pos_label: String,

        /// Beta of the F-beta score
        #[arg(long, default_value = "2.0")]
        beta: f64,

        /// Random state for seeded classifiers
        #[arg(long, default_value = "123")]
        random_state: u64,

        /// Number of stratified folds
        #[arg(long, default_value = "5")]
        cv: usize,

        /// Output CSV, e.g. results/cv_scores_default_parameters.csv
        #[arg(long)]
        results: PathBuf,
    },

    /// Tune the catalog models named in a distribution file and select the best
    Tune {
        /// Training data CSV
        #[arg(long)]
        train_data: PathBuf,

        /// Target column name
        #[arg(long)]
        target_col: String,

        /// Preprocessor spec (JSON)
        #[arg(long)]
        preprocessor_path: PathBuf,

        /// Parameter distributions per model (JSON)
        #[arg(long)]
        param_dists: PathBuf,

        /// Positive class label for the F-beta score
        #[arg(long, default_value = "Heart Disease")]
        pos_label: String,

        /// Beta of the F-beta score
        #[arg(long, default_value = "2.0")]
        beta: f64,

        /// Seed for sampling, folds and seeded classifiers
        #[arg(long, default_value = "123")]
        seed: u64,

        /// Configurations sampled per model
        #[arg(long, default_value = "10")]
        n_iter: usize,

        /// Number of stratified folds
        #[arg(long, default_value = "5")]
        cv: usize,

        /// Output CSV of best score and params per model
        #[arg(long)]
        results: PathBuf,

        /// Optional JSON model card of the selected model
        #[arg(long)]
        model_card: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardio_ml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eda {
            data,
            output_dir,
            target_col,
            pos_label,
        } => cmd_eda(&data, &output_dir, &target_col, &pos_label),
        Commands::EvaluateDefaults {
            train_data,
            target_col,
            preprocessor_path,
            pos_label,
            beta,
            random_state,
            cv,
            results,
        } => cmd_evaluate_defaults(
            &train_data,
            &target_col,
            &preprocessor_path,
            ScoreSettings { pos_label, beta },
            random_state,
            cv,
            &results,
        ),
        Commands::Tune {
            train_data,
            target_col,
            preprocessor_path,
            param_dists,
            pos_label,
            beta,
            seed,
            n_iter,
            cv,
            results,
            model_card,
        } => cmd_tune(
            &train_data,
            &target_col,
            &preprocessor_path,
            &param_dists,
            ScoreSettings { pos_label, beta },
            SearchOptions::new(seed)
                .with_n_iter(n_iter)
                .with_cv(CvStrategy::stratified(cv)),
            &results,
            model_card.as_deref(),
        ),
    }
}

fn load_training_set(path: &Path, target_col: &str) -> anyhow::Result<TrainingSet> {
    let frame = read_frame_csv(path)
        .with_context(|| format!("reading training data {}", path.display()))?;
    Ok(TrainingSet::from_frame(&frame, target_col)?)
}

fn cmd_eda(data: &Path, output_dir: &Path, target: &str, pos_label: &str) -> anyhow::Result<()> {
    let frame =
        read_frame_csv(data).with_context(|| format!("reading dataset {}", data.display()))?;
    fs::create_dir_all(output_dir)?;

    let (header, rows) = describe(&frame).to_table();
    write_table_csv(output_dir.join("summary_statistics.csv"), &header, &rows)?;

    let present = |name: &str| frame.column(name).is_ok();
    let num_cols: Vec<String> = NUMERIC_COLUMNS
        .iter()
        .filter(|&&c| present(c))
        .map(|c| c.to_string())
        .collect();
    let axis_titles: Vec<(String, String)> = CATEGORICAL_TITLES
        .iter()
        .filter(|&&(c, _)| present(c))
        .map(|(c, t)| (c.to_string(), t.to_string()))
        .collect();

    write_json(
        output_dir.join("heart_disease_counts.vl.json"),
        &target_distribution(&frame, target)?,
    )?;
    write_json(
        output_dir.join("numerical_feature_distributions.vl.json"),
        &numeric_distributions(&frame, &num_cols)?,
    )?;
    write_json(
        output_dir.join("boxplots_vs_target.vl.json"),
        &boxplots(&frame, &num_cols, target)?,
    )?;
    write_json(
        output_dir.join("categorical_vs_target.vl.json"),
        &categorical_vs_target(&frame, &axis_titles, target)?,
    )?;

    let mut corr_cols = num_cols.clone();
    corr_cols.extend(axis_titles.iter().map(|(c, _)| c.clone()));
    corr_cols.push(target.to_string());
    let corr = correlation_matrix(&frame, &corr_cols, pos_label)?;
    write_json(output_dir.join("correlation_heatmap.vl.json"), &correlation_heatmap(&corr))?;

    info!(output_dir = %output_dir.display(), rows = frame.n_rows(), "EDA written");
    Ok(())
}

fn cmd_evaluate_defaults(
    train_data: &Path,
    target_col: &str,
    preprocessor_path: &Path,
    score: ScoreSettings,
    random_state: u64,
    cv: usize,
    results: &Path,
) -> anyhow::Result<()> {
    let data = load_training_set(train_data, target_col)?;
    let spec = load_preprocessor_spec(preprocessor_path)
        .with_context(|| format!("reading preprocessor {}", preprocessor_path.display()))?;

    let scores = evaluate_defaults(&data, &spec, &score, random_state, cv)?;

    let header: Vec<String> = ["", "fit_time", "score_time", "test_score", "train_score"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = scores
        .iter()
        .map(|(name, summary)| {
            let mut row = vec![name.clone()];
            row.extend(
                header[1..]
                    .iter()
                    .map(|k| summary.get(k).cloned().unwrap_or_default()),
            );
            row
        })
        .collect();
    write_table_csv(results, &header, &rows)?;
    println!("Wrote {} model scores to {}", rows.len(), results.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_tune(
    train_data: &Path,
    target_col: &str,
    preprocessor_path: &Path,
    param_dists: &Path,
    score: ScoreSettings,
    options: SearchOptions,
    results: &Path,
    model_card: Option<&Path>,
) -> anyhow::Result<()> {
    let data = load_training_set(train_data, target_col)?;
    let spec = load_preprocessor_spec(preprocessor_path)
        .with_context(|| format!("reading preprocessor {}", preprocessor_path.display()))?;
    let dists = load_param_dists(param_dists)
        .with_context(|| format!("reading parameter distributions {}", param_dists.display()))?;

    let (_, selection) = tune_models(&data, &spec, &dists, &score, options)?;

    let header: Vec<String> = ["model", "best_score", "best_params"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = selection
        .summary
        .iter()
        .map(|s| {
            Ok(vec![
                s.name.clone(),
                s.score.to_string(),
                serde_json::to_string(&s.params)?,
            ])
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    write_table_csv(results, &header, &rows)?;

    if let Some(path) = model_card {
        let params = selection
            .summary_for(&selection.best_name)
            .map(|s| s.params.clone())
            .unwrap_or_default();
        save_model_card(
            path,
            &ModelCard {
                name: selection.best_name.clone(),
                score: selection.best_score,
                params,
            },
        )?;
    }
    println!(
        "Best model: {} (F{} = {:.3})",
        selection.best_name, score.beta, selection.best_score
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio_ml::io::load_model_card;

    fn write_dataset(dir: &Path) -> PathBuf {
        let mut csv = String::from("age,gender,chest_pain,max_heart_rate,target\n");
        for i in 0..20 {
            csv.push_str(&format!("{},{},{},{},No Heart Disease\n", 35 + i, i % 2, i % 3, 185 - i));
            csv.push_str(&format!("{},{},{},{},Heart Disease\n", 52 + i, (i + 1) % 2, 3, 150 - i));
        }
        let path = dir.join("train.csv");
        fs::write(&path, csv).unwrap();
        path
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "cardio-ml", "tune", "--train-data", "t.csv", "--target-col", "target",
            "--preprocessor-path", "p.json", "--param-dists", "d.json", "--results", "r.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Tune { beta, seed, n_iter, cv, model_card, .. } => {
                assert_eq!(beta, 2.0);
                assert_eq!(seed, 123);
                assert_eq!(n_iter, 10);
                assert_eq!(cv, 5);
                assert!(model_card.is_none());
            }
            _ => panic!("expected tune"),
        }
        assert!(Cli::try_parse_from(["cardio-ml", "evaluate-defaults"]).is_err());
    }

    #[test]
    fn test_eda_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path());
        let out = dir.path().join("eda");
        cmd_eda(&data, &out, "target", "Heart Disease").unwrap();
        for file in [
            "summary_statistics.csv",
            "heart_disease_counts.vl.json",
            "numerical_feature_distributions.vl.json",
            "boxplots_vs_target.vl.json",
            "categorical_vs_target.vl.json",
            "correlation_heatmap.vl.json",
        ] {
            assert!(out.join(file).exists(), "missing {}", file);
        }
        let heatmap: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("correlation_heatmap.vl.json")).unwrap())
                .unwrap();
        // age, max_heart_rate, gender, chest_pain, target
        assert_eq!(heatmap["data"]["values"].as_array().unwrap().len(), 25);
    }

    #[test]
    fn test_tune_writes_results_and_card() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path());
        let spec = dir.path().join("preprocessor.json");
        fs::write(
            &spec,
            r#"{"numeric": ["age", "max_heart_rate"], "categorical": ["gender", "chest_pain"]}"#,
        )
        .unwrap();
        let dists = dir.path().join("dists.json");
        fs::write(
            &dists,
            r#"{"Logistic Regression": {"logisticregression__C": [0.1, 1.0]},
                "dummy clf": {"dummyclassifier__strategy": ["most_frequent", "prior"]}}"#,
        )
        .unwrap();
        let results = dir.path().join("results").join("tuned.csv");
        let card = dir.path().join("results").join("best.json");

        cmd_tune(
            &data,
            "target",
            &spec,
            &dists,
            ScoreSettings::default(),
            SearchOptions::new(1).with_cv(CvStrategy::stratified(4)),
            &results,
            Some(&card),
        )
        .unwrap();

        let text = fs::read_to_string(&results).unwrap();
        assert!(text.starts_with("model,best_score,best_params\n"));
        assert_eq!(text.lines().count(), 3);
        let card = load_model_card(&card).unwrap();
        assert!(card.name == "dummy clf" || card.name == "Logistic Regression");
    }
}
