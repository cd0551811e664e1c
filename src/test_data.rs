use csv::ReaderBuilder;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Small two-feature regression set with a linear signal, generated from a
/// fixed seed.
pub fn setup_data_simple() -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 120;
    let mut x_data = Vec::with_capacity(n * 2);
    let mut y_data = Vec::with_capacity(n);
    for _ in 0..n {
        let a: f64 = rng.gen_range(-2.0..2.0);
        let b: f64 = rng.gen_range(-2.0..2.0);
        x_data.extend([a, b]);
        y_data.push(3.0 * a - 2.0 * b + rng.gen_range(-0.3..0.3));
    }
    let x = Array2::from_shape_vec((n, 2), x_data).expect("Failed to create Array2");
    (x, Array1::from(y_data))
}

/// Housing-style benchmark set: 506 rows, 13 numeric features, one dominant
/// step signal on feature 5 plus a mild linear term. Deterministic, so tests
/// that compare against independently computed splits are stable.
pub fn setup_data_housing() -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 506;
    let p = 13;
    let mut x_data = Vec::with_capacity(n * p);
    let mut y_data = Vec::with_capacity(n);
    for _ in 0..n {
        let row: Vec<f64> = (0..p).map(|_| rng.gen_range(0.0..10.0)).collect();
        let step = if row[5] >= 5.0 { 30.0 } else { 18.0 };
        let y = step + 0.3 * row[0] + rng.gen_range(-0.5..0.5);
        x_data.extend(row);
        y_data.push(y);
    }
    let x = Array2::from_shape_vec((n, p), x_data).expect("Failed to create Array2");
    (x, Array1::from(y_data))
}

/// Reads a dataset where the first column is the target and the remaining
/// columns are numeric features.
pub fn from_csv(path: &str) -> (Array2<f64>, Array1<f64>) {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .expect("Failed to open file");

    let mut x_data = Vec::new();
    let mut y_data = Vec::new();
    let mut width = 0;
    for result in rdr.records() {
        let record = result.expect("Failed to read record");
        let y: f64 = record[0].parse().expect("Failed to parse y");
        let row: Vec<f64> = (1..record.len())
            .map(|j| record[j].parse().expect("Failed to parse feature"))
            .collect();
        width = row.len();
        y_data.push(y);
        x_data.extend(row);
    }
    let x = Array2::from_shape_vec((y_data.len(), width), x_data)
        .expect("Failed to create Array2");
    let y = Array1::from(y_data);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn housing_shape_and_determinism() {
        let (x, y) = setup_data_housing();
        assert_eq!(x.shape(), &[506, 13]);
        assert_eq!(y.len(), 506);
        let (x2, y2) = setup_data_housing();
        assert_eq!(x, x2);
        assert_eq!(y, y2);
    }

    #[test]
    fn csv_roundtrip_through_temp_file() {
        let path = std::env::temp_dir().join("bosque_test_data.csv");
        let mut contents = String::from("y,x1,x2\n");
        for (y, (a, b)) in [(1.5, (0.1, 0.2)), (-0.5, (0.3, 0.4)), (2.0, (0.5, 0.6))] {
            contents.push_str(&format!("{y},{a},{b}\n"));
        }
        std::fs::write(&path, contents).unwrap();

        let (x, y) = from_csv(path.to_str().unwrap());
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(y[0], 1.5);
        assert_eq!(x[[2, 1]], 0.6);

        std::fs::remove_file(&path).ok();
    }
}
