use std::fs;
use std::path::Path;

use cardio_ml::eda::{correlation_matrix, describe, target_distribution};
use cardio_ml::io::{
    load_model_card, load_param_dists, load_preprocessor_spec, read_frame_csv, save_model_card,
    write_table_csv, ModelCard,
};
use cardio_ml::model_selection::{CvStrategy, SearchOptions};
use cardio_ml::workflow::{evaluate_defaults, tune_models, ScoreSettings, TrainingSet};

fn write_patients(path: &Path) {
    let mut csv = String::from("age,gender,serum_cholesterol,max_heart_rate,target\n");
    for i in 0..24 {
        let t = i as f64;
        let gender = i % 2;
        csv.push_str(&format!(
            "{},{},{},{},No Heart Disease\n",
            34.0 + t,
            gender,
            190.0 + 1.5 * t,
            185.0 - t
        ));
        csv.push_str(&format!(
            "{},{},{},{},Heart Disease\n",
            50.0 + t,
            1 - gender,
            230.0 + 1.5 * t,
            150.0 - t
        ));
    }
    fs::write(path, csv).unwrap();
}

#[test]
fn test_blank_cells_rejected_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let header = "age,serum_cholesterol,target\n";
    let rows = "40,200,No Heart Disease\n61,250,Heart Disease\n45,210,No Heart Disease\n";

    let blank_feature = dir.path().join("blank_feature.csv");
    fs::write(&blank_feature, format!("{}{}58,,Heart Disease\n", header, rows)).unwrap();
    let frame = read_frame_csv(&blank_feature).unwrap();
    let err = TrainingSet::from_frame(&frame, "target").err().unwrap();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("serum_cholesterol"));

    let blank_target = dir.path().join("blank_target.csv");
    fs::write(&blank_target, format!("{}{}58,240,\n", header, rows)).unwrap();
    let frame = read_frame_csv(&blank_target).unwrap();
    let err = TrainingSet::from_frame(&frame, "target").err().unwrap();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("row 3"));
}

#[test]
fn test_end_to_end_tuning() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("train.csv");
    write_patients(&data_path);
    fs::write(
        dir.path().join("preprocessor.json"),
        r#"{"numeric": ["age", "serum_cholesterol", "max_heart_rate"], "categorical": ["gender"]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("dists.json"),
        r#"{
            "Logistic Regression": {"logisticregression__C": [0.01, 0.1, 1.0, 10.0]},
            "RBF SVM": {"svc__C": [0.1, 1.0, 10.0], "svc__gamma": ["scale", 0.1]},
            "decision tree": {"decisiontreeclassifier__max_depth": [2, 4, null]}
        }"#,
    )
    .unwrap();

    let frame = read_frame_csv(&data_path).unwrap();
    let data = TrainingSet::from_frame(&frame, "target").unwrap();
    let spec = load_preprocessor_spec(dir.path().join("preprocessor.json")).unwrap();
    let dists = load_param_dists(dir.path().join("dists.json")).unwrap();

    let options = SearchOptions::new(123).with_n_iter(4).with_cv(CvStrategy::stratified(4));
    let (candidates, selection) =
        tune_models(&data, &spec, &dists, &ScoreSettings::default(), options).unwrap();
    assert_eq!(candidates.len(), 3);
    for (name, entry) in candidates.iter() {
        assert!((0.0..=1.0).contains(&entry.score), "{} scored {}", name, entry.score);
        assert!(entry.search.cv_results.len() <= 4);
    }
    let best = candidates.get(&selection.best_name).unwrap();
    assert!(candidates.iter().all(|(_, e)| e.score <= best.score));
    assert!(selection.estimator.is_fitted());

    let card = ModelCard {
        name: selection.best_name.clone(),
        score: selection.best_score,
        params: best.params.clone(),
    };
    let card_path = dir.path().join("results").join("best_model.json");
    save_model_card(&card_path, &card).unwrap();
    assert_eq!(load_model_card(&card_path).unwrap(), card);
}

#[test]
fn test_end_to_end_defaults_and_eda() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("train.csv");
    write_patients(&data_path);
    let frame = read_frame_csv(&data_path).unwrap();

    let summary = describe(&frame);
    assert_eq!(summary.get("age").unwrap().count, 48);
    assert_eq!(summary.get("target").unwrap().unique, Some(2));
    let chart = target_distribution(&frame, "target").unwrap();
    assert_eq!(chart["data"]["values"][0]["count"], 24);
    let cols: Vec<String> = ["age", "target"].iter().map(|s| s.to_string()).collect();
    let corr = correlation_matrix(&frame, &cols, "Heart Disease").unwrap();
    assert!(corr.get("age", "target").unwrap() > 0.5);

    let data = TrainingSet::from_frame(&frame, "target").unwrap();
    let spec = cardio_ml::preprocessing::PreprocessorSpec {
        numeric: vec!["age".into(), "serum_cholesterol".into(), "max_heart_rate".into()],
        passthrough: vec!["gender".into()],
        ..Default::default()
    };
    let rows = evaluate_defaults(&data, &spec, &ScoreSettings::default(), 123, 5).unwrap();
    assert_eq!(rows.len(), 4);

    let header: Vec<String> = ["", "fit_time", "score_time", "test_score", "train_score"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|(name, scores)| {
            let mut row = vec![name.clone()];
            row.extend(scores.values().cloned());
            row
        })
        .collect();
    let out = dir.path().join("results").join("cv_scores.csv");
    write_table_csv(&out, &header, &table).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("RBF SVM,"));
}
