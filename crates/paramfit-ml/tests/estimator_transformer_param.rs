#![allow(clippy::unwrap_used)]

use paramfit_ml::prelude::*;

fn session() -> MlSession {
    MlSession::builder()
        .app_name("EstimatorTransformerParamTest")
        .build()
        .unwrap()
}

fn training(spark: &MlSession) -> Dataset {
    spark
        .create_dataset(
            vec![
                vec![1.0.into(), Vectors::dense([0.0, 1.1, 0.1]).into()],
                vec![0.0.into(), Vectors::dense([2.0, 1.0, -1.0]).into()],
                vec![0.0.into(), Vectors::dense([2.0, 1.3, 1.0]).into()],
                vec![1.0.into(), Vectors::dense([0.0, 1.2, -0.5]).into()],
            ],
            &["label", "features"],
        )
        .unwrap()
}

fn test_data(spark: &MlSession) -> Dataset {
    spark
        .create_dataset(
            vec![
                vec![1.0.into(), Vectors::dense([-1.0, 1.5, 1.3]).into()],
                vec![0.0.into(), Vectors::dense([3.0, 2.0, -0.1]).into()],
                vec![1.0.into(), Vectors::dense([0.0, 2.2, -1.5]).into()],
            ],
            &["label", "features"],
        )
        .unwrap()
}

fn predictions(dataset: &Dataset) -> Vec<f64> {
    dataset
        .collect()
        .unwrap()
        .iter()
        .map(|row| row.get("prediction").and_then(Value::as_double).unwrap())
        .collect()
}

#[test]
fn test_estimator_transformer_param() {
    let spark = session();
    let training = training(&spark);

    let lr = LogisticRegression::new()
        .with_max_iter(10)
        .unwrap()
        .with_reg_param(0.01)
        .unwrap();
    let explained = lr.explain_params();
    assert!(explained.contains("maxIter: max number of iterations (>= 0) (default: 100, current: 10)"));
    assert!(explained.contains("regParam: regularization parameter (>= 0) (default: 0.0, current: 0.01)"));
    assert!(explained.contains(
        "weightCol: weight column name. If this is not set or empty, we treat all instance weights as 1.0 (undefined)"
    ));

    let model1 = lr.fit(&training).unwrap();
    assert_eq!(model1.parent(), lr.uid());
    assert_eq!(model1.num_features(), 3);
    let map1 = model1.extract_param_map();
    assert_eq!(map1.get(model1.max_iter()), Some(10));
    assert_eq!(map1.get(model1.reg_param()), Some(0.01));
    assert_eq!(predictions(&model1.transform(&training).unwrap()), vec![1.0, 0.0, 0.0, 1.0]);

    let mut param_map = ParamMap::new();
    param_map.put(lr.max_iter(), 20).unwrap();
    param_map.put(lr.max_iter(), 30).unwrap();
    param_map
        .put(lr.reg_param(), 0.1)
        .unwrap()
        .put(lr.threshold(), 0.55)
        .unwrap();
    let mut param_map2 = ParamMap::new();
    param_map2.put(lr.probability_col(), "myProbability").unwrap();
    let param_map_combined = param_map.merge(&param_map2);
    assert_eq!(param_map_combined.len(), 4);
    assert_eq!(param_map.len(), 3);

    let model2 = lr.fit_with(&training, &param_map_combined).unwrap();
    let map2 = model2.extract_param_map();
    assert_eq!(map2.get(model2.max_iter()), Some(30));
    assert_eq!(map2.get(model2.reg_param()), Some(0.1));
    assert_eq!(map2.get(model2.threshold()), Some(0.55));
    assert_eq!(
        map2.get(model2.probability_col()),
        Some("myProbability".to_string())
    );
    let printed = map2.to_string();
    assert!(printed.starts_with("{\n\t"));
    assert!(printed.contains(&format!("\t{}-maxIter: 30,", lr.uid())));
    assert!(printed.contains(&format!("\t{}-probabilityCol: myProbability,", lr.uid())));

    // The estimator keeps its own values.
    assert_eq!(lr.get_max_iter().unwrap(), 10);
    assert_eq!(lr.get_reg_param().unwrap(), 0.01);
    assert_eq!(lr.get_threshold().unwrap(), 0.5);
    let refit = lr.fit(&training).unwrap();
    assert_eq!(refit.extract_param_map(), map1);
    assert_eq!(refit.coefficients(), model1.coefficients());
    assert_eq!(refit.intercept(), model1.intercept());

    let test = test_data(&spark);
    let prediction = model2.transform(&test).unwrap();
    assert_eq!(
        prediction.columns(),
        vec!["label", "features", "rawPrediction", "myProbability", "prediction"]
    );
    let result = prediction
        .select(&["features", "label", "myProbability", "prediction"])
        .unwrap();
    let rows = result.collect().unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        let probability = row.get("myProbability").and_then(Value::as_vector).unwrap();
        assert_eq!(probability.size(), 2);
        assert!((probability.values().iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let expected = if probability.values()[1] > 0.55 { 1.0 } else { 0.0 };
        assert_eq!(row.get("prediction"), Some(&Value::Double(expected)));
    }
    assert_eq!(predictions(&result), vec![1.0, 0.0, 1.0]);
    assert!(rows[0].to_string().starts_with("Row(features=[-1.0,1.5,1.3], label=1.0, myProbability=["));

    spark.stop();
}

#[test]
fn test_objective_history_decreases() {
    let spark = session();
    let training = training(&spark);
    let model = LogisticRegression::new()
        .with_max_iter(20)
        .unwrap()
        .with_reg_param(0.1)
        .unwrap()
        .fit(&training)
        .unwrap();
    let history = model.summary().objective_history();
    assert_eq!(history.len(), model.summary().total_iterations() + 1);
    assert!(model.summary().total_iterations() > 0);
    assert!(history.windows(2).all(|w| w[1] <= w[0]));
    spark.stop();
}

#[test]
fn test_fit_multiple() {
    let spark = session();
    let training = training(&spark);
    let lr = LogisticRegression::new();
    let mut a = ParamMap::new();
    a.put(lr.max_iter(), 0).unwrap();
    let mut b = ParamMap::new();
    b.put(lr.max_iter(), 5).unwrap();
    let models = lr.fit_multiple(&training, &[a, b]).unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].summary().total_iterations(), 0);
    assert!(models[0].coefficients().values().iter().all(|c| *c == 0.0));
    assert!((models[0].intercept() - 0.0).abs() < 1e-12);
    assert_eq!(models[1].get_max_iter().unwrap(), 5);
    spark.stop();
}

#[test]
fn test_single_class_gives_infinite_intercept() {
    let spark = session();
    let training = spark
        .create_dataset(
            vec![
                vec![1.0.into(), Vectors::dense([0.0, 1.1]).into()],
                vec![1.0.into(), Vectors::dense([2.0, 1.0]).into()],
            ],
            &["label", "features"],
        )
        .unwrap();
    let model = LogisticRegression::new().fit(&training).unwrap();
    assert_eq!(model.intercept(), f64::INFINITY);
    assert_eq!(model.coefficients().values(), &[0.0, 0.0]);
    assert_eq!(predictions(&model.transform(&training).unwrap()), vec![1.0, 1.0]);

    let model = LogisticRegression::new()
        .with_fit_intercept(true)
        .unwrap()
        .fit(&training.select(&["features"]).unwrap());
    assert!(matches!(model, Err(MlError::SchemaError(_))));
    spark.stop();
}

#[test]
fn test_strong_l1_zeroes_coefficients() {
    let spark = session();
    let training = training(&spark);
    let model = LogisticRegression::new()
        .with_reg_param(10.0)
        .unwrap()
        .with_elastic_net_param(1.0)
        .unwrap()
        .fit(&training)
        .unwrap();
    assert_eq!(model.coefficients().values(), &[0.0, 0.0, 0.0]);
    assert!(model.intercept().abs() < 1e-9);
    spark.stop();
}

#[test]
fn test_zero_weights_are_ignored() {
    let spark = session();
    let rows = |extra: bool| {
        let mut rows = vec![
            vec![1.0.into(), 1.0.into(), Vectors::dense([0.0, 1.1, 0.1]).into()],
            vec![0.0.into(), 1.0.into(), Vectors::dense([2.0, 1.0, -1.0]).into()],
            vec![0.0.into(), 2.0.into(), Vectors::dense([2.0, 1.3, 1.0]).into()],
            vec![1.0.into(), 1.0.into(), Vectors::dense([0.0, 1.2, -0.5]).into()],
        ];
        if extra {
            rows.push(vec![0.0.into(), 0.0.into(), Vectors::dense([0.0, 9.0, 9.0]).into()]);
            rows.push(vec![1.0.into(), 0.0.into(), Vectors::dense([9.0, -9.0, 0.0]).into()]);
        }
        spark
            .create_dataset(rows, &["label", "weight", "features"])
            .unwrap()
    };
    let lr = LogisticRegression::new()
        .with_weight_col("weight")
        .unwrap()
        .with_reg_param(0.1)
        .unwrap();
    let a = lr.fit(&rows(false)).unwrap();
    let b = lr.fit(&rows(true)).unwrap();
    for (x, y) in a.coefficients().values().iter().zip(b.coefficients().values()) {
        assert!((x - y).abs() < 1e-4, "{x} vs {y}");
    }
    assert!((a.intercept() - b.intercept()).abs() < 1e-4);
    spark.stop();
}

#[test]
fn test_invalid_training_data() {
    let spark = session();
    let multiclass = spark
        .create_dataset(
            vec![
                vec![0.0.into(), Vectors::dense([0.0]).into()],
                vec![2.0.into(), Vectors::dense([1.0]).into()],
            ],
            &["label", "features"],
        )
        .unwrap();
    assert!(matches!(
        LogisticRegression::new().fit(&multiclass),
        Err(MlError::InvalidArgument(_))
    ));

    let huge_label = spark
        .create_dataset(
            vec![
                vec![0.0.into(), Vectors::dense([0.0]).into()],
                vec![1e20.into(), Vectors::dense([1.0]).into()],
            ],
            &["label", "features"],
        )
        .unwrap();
    assert!(matches!(
        LogisticRegression::new().fit(&huge_label),
        Err(MlError::InvalidArgument(_))
    ));

    let negative_weight = spark
        .create_dataset(
            vec![vec![1.0.into(), (-1.0).into(), Vectors::dense([0.0]).into()]],
            &["label", "weight", "features"],
        )
        .unwrap();
    let lr = LogisticRegression::new().with_weight_col("weight").unwrap();
    assert!(matches!(
        lr.fit(&negative_weight),
        Err(MlError::InvalidArgument(_))
    ));

    let mut invalid = ParamMap::new();
    assert!(invalid.put(lr.threshold(), 1.5).is_err());
    assert!(invalid.is_empty());
    spark.stop();
}
