use bosque::forest::{self, ForestParamsBuilder};
use bosque::test_data::setup_data_housing;
use bosque::tree::FeatureKind;
use bosque::FittedModel;
use ndarray::s;

#[test]
fn forest_beats_single_tree_baseline_on_held_out_rows() {
    let (x, y) = setup_data_housing();
    let x_train = x.slice(s![..380, ..]);
    let y_train = y.slice(s![..380]);
    let x_test = x.slice(s![380.., ..]);
    let y_test = y.slice(s![380..]);

    let params = ForestParamsBuilder::new()
        .n_trees(80)
        .min_node_size(5)
        .mtry(Some(4))
        .seed(42)
        .build();
    let (fit_res, model) =
        forest::fit(x_train, y_train, &FeatureKind::all_numeric(13), &params).unwrap();

    let mean = y_test.mean().unwrap();
    let base_err = y_test.map(|v| v - mean).powi(2).mean().unwrap();
    let preds = model.predict(x_test);
    let test_err = (&y_test - &preds).powi(2).mean().unwrap();
    assert!(fit_res.err < base_err);
    assert!(test_err < base_err);
}

#[test]
fn oob_fraction_near_one_over_e_across_trees() {
    let (x, y) = setup_data_housing();
    let x_train = x.slice(s![..300, ..]);
    let y_train = y.slice(s![..300]);

    let params = ForestParamsBuilder::new()
        .n_trees(40)
        .min_node_size(10)
        .seed(42)
        .build();
    let (_, model) =
        forest::fit(x_train, y_train, &FeatureKind::all_numeric(13), &params).unwrap();

    let mean_frac: f64 = model
        .oob_sets()
        .iter()
        .map(|oob| oob.len() as f64 / 300.0)
        .sum::<f64>()
        / 40.0;
    assert!(
        (0.30..=0.43).contains(&mean_frac),
        "mean oob fraction {mean_frac}"
    );
}

#[test]
fn oob_error_close_to_held_out_error() {
    let (x, y) = setup_data_housing();
    let x_train = x.slice(s![..380, ..]);
    let y_train = y.slice(s![..380]);

    let params = ForestParamsBuilder::new()
        .n_trees(100)
        .min_node_size(5)
        .seed(42)
        .build();
    let (_, model) =
        forest::fit(x_train, y_train, &FeatureKind::all_numeric(13), &params).unwrap();
    let oob_rmse = model.oob_error(x_train, y_train).unwrap();

    // OOB RMSE estimates generalization error; on this easy signal it must
    // land well below the baseline standard deviation.
    let mean = y_train.mean().unwrap();
    let base_rmse = y_train.map(|v| v - mean).powi(2).mean().unwrap().sqrt();
    assert!(oob_rmse > 0.0);
    assert!(oob_rmse < base_rmse, "oob {oob_rmse} vs baseline {base_rmse}");
}

#[test]
fn more_trees_shrink_prediction_variance() {
    let (x, y) = setup_data_housing();
    let x_train = x.slice(s![..200, ..]);
    let y_train = y.slice(s![..200]);
    let probe = x.slice(s![400..401, ..]);

    let predict_with = |n_trees: usize, seed: u64| -> f64 {
        let params = ForestParamsBuilder::new()
            .n_trees(n_trees)
            .min_node_size(5)
            .mtry(Some(4))
            .max_depth(8)
            .seed(seed)
            .build();
        let (_, model) =
            forest::fit(x_train, y_train, &FeatureKind::all_numeric(13), &params).unwrap();
        model.predict(probe)[0]
    };

    let variance = |preds: &[f64]| -> f64 {
        let mean = preds.iter().sum::<f64>() / preds.len() as f64;
        preds.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / preds.len() as f64
    };

    let small: Vec<f64> = (0..12).map(|s| predict_with(10, 100 + s)).collect();
    let large: Vec<f64> = (0..12).map(|s| predict_with(120, 200 + s)).collect();
    assert!(
        variance(&large) < variance(&small),
        "averaging more trees failed to stabilize the prediction"
    );
}

#[test]
fn importances_dominated_by_step_feature() {
    let (x, y) = setup_data_housing();
    let x_train = x.slice(s![..380, ..]);
    let y_train = y.slice(s![..380]);

    let params = ForestParamsBuilder::new()
        .n_trees(50)
        .min_node_size(5)
        .mtry(Some(6))
        .seed(42)
        .build();
    let (_, model) =
        forest::fit(x_train, y_train, &FeatureKind::all_numeric(13), &params).unwrap();

    let importances = model.feature_importances();
    assert_eq!(importances.len(), 13);
    let top = importances
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(top, 5);
}
