use std::{ops::Div, time::SystemTime};

use bosque::{
    forest::{self, ForestParamsBuilder},
    tree::{self, prune, FeatureKind, TreeParamsBuilder},
    FittedModel,
};
use ndarray::s;
use rand::{rngs::StdRng, SeedableRng};

fn main() {
    println!("Running main");
    let (x, y) = bosque::test_data::setup_data_housing();
    let n = y.len();
    println!("Fitting and testing on {} samples", n / 2);
    let x_train = x.slice(s![..n / 2, ..]);
    let y_train = y.slice(s![..n / 2]);

    let x_test = x.slice(s![n / 2.., ..]);
    let y_test = y.slice(s![n / 2..]);

    let kinds = FeatureKind::all_numeric(x.ncols());

    let tree_params = TreeParamsBuilder::new().min_node_size(10).build();
    let mut rng = StdRng::seed_from_u64(42);
    let (tree_fit, root) =
        tree::fit(x_train, y_train, &kinds, &tree_params, &mut rng).expect("tree fit failed");
    println!(
        "Tree: {} leaves, depth {}, training error {:?}",
        root.n_leaves(),
        root.depth(),
        tree_fit.err
    );
    let pruned = prune::prune(&root, x_train, y_train, 1.0).expect("prune failed");
    println!("Pruned at alpha=1.0: {} leaves", pruned.n_leaves());

    let start = SystemTime::now();
    let params = ForestParamsBuilder::new()
        .n_trees(200)
        .min_node_size(5)
        .mtry(Some(4))
        .seed(42)
        .build();
    let (fr, model) = forest::fit(x_train, y_train, &kinds, &params).expect("forest fit failed");
    let elapsed = start.elapsed().unwrap();
    println!("Time elapsed: {:?}", elapsed);

    let mean = y_test.mean().unwrap();
    let base_err = y_test.view().map(|v| v - mean).powi(2).mean().unwrap();
    let preds = model.predict(x_test.view());
    let test_err: f64 = y_test
        .indexed_iter()
        .map(|(i, v)| (v - preds[i]).powi(2).div(y_test.len() as f64))
        .sum();
    println! {"Base error: {:?}, Training Error: {:?}, Test Error: {:?}", base_err, fr.err, test_err};

    match model.oob_error(x_train, y_train) {
        Ok(rmse) => println!("OOB RMSE: {rmse:?}"),
        Err(e) => println!("OOB error unavailable: {e}"),
    }
    let importances = model.feature_importances();
    println!("Feature importances: {importances:?}");
}
