use std::io::Write;

use log::info;
use paramfit_common::config::AppConfig;
use paramfit_ml::prelude::*;

/// Fits a logistic regression twice, the second time with call-scoped parameter overrides,
/// and prints the parameters and the predictions on a small test set.
pub fn run_estimator_transformer_param(
    config: AppConfig,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let spark = MlSession::builder()
        .app_name("EstimatorTransformerParamExample")
        .config(config)
        .build()?;

    let training = spark.create_dataset(
        vec![
            vec![1.0.into(), Vectors::dense([0.0, 1.1, 0.1]).into()],
            vec![0.0.into(), Vectors::dense([2.0, 1.0, -1.0]).into()],
            vec![0.0.into(), Vectors::dense([2.0, 1.3, 1.0]).into()],
            vec![1.0.into(), Vectors::dense([0.0, 1.2, -0.5]).into()],
        ],
        &["label", "features"],
    )?;

    let lr = LogisticRegression::new()
        .with_max_iter(10)?
        .with_reg_param(0.01)?;
    writeln!(out, "LogisticRegression parameters:\n{}\n", lr.explain_params())?;

    let model1 = lr.fit(&training)?;
    // Param names are qualified by the uid of the estimator that produced the model.
    writeln!(out, "Model 1 was fit using parameters: ")?;
    writeln!(out, "{}", model1.extract_param_map())?;

    let mut param_map = ParamMap::new();
    param_map.put(lr.max_iter(), 20)?;
    param_map.put(lr.max_iter(), 30)?;
    param_map.put(lr.reg_param(), 0.1)?.put(lr.threshold(), 0.55)?;

    let mut param_map2 = ParamMap::new();
    param_map2.put(lr.probability_col(), "myProbability")?;
    let param_map_combined = param_map.merge(&param_map2);

    let model2 = lr.fit_with(&training, &param_map_combined)?;
    writeln!(out, "Model 2 was fit using parameters: ")?;
    writeln!(out, "{}", model2.extract_param_map())?;

    let test = spark.create_dataset(
        vec![
            vec![1.0.into(), Vectors::dense([-1.0, 1.5, 1.3]).into()],
            vec![0.0.into(), Vectors::dense([3.0, 2.0, -0.1]).into()],
            vec![1.0.into(), Vectors::dense([0.0, 2.2, -1.5]).into()],
        ],
        &["label", "features"],
    )?;

    let prediction = model2.transform(&test)?;
    let result = prediction
        .select(&["features", "label", "myProbability", "prediction"])?
        .collect()?;
    info!("collected {} prediction rows", result.len());
    for row in result {
        writeln!(out, "{row}")?;
    }

    spark.stop();
    Ok(())
}
