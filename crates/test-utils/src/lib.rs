//! Test helpers shared by the airmap crates.
//!
//! - [`generators`]: reanalysis-shaped fields and simple polygons
//! - [`fixtures`]: the regions, dates and grids the map workflows use
//! - [`paths`]: scratch directories and optional real data files

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use generators::*;
pub use paths::*;

/// Return early from a test when a real data file is not available.
///
/// ```ignore
/// let path = test_utils::require_test_file!("air.2m.gauss.1980.nc");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("skipping: {} not found (set {})", $name, $crate::TEST_DATA_ENV);
                return;
            }
        }
    }};
}

/// `assert!((left - right).abs() <= epsilon)` with a readable message.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= epsilon,
            "values differ: left {:?}, right {:?}, |diff| {:?} > {:?}",
            left,
            right,
            diff,
            epsilon
        );
    }};
}
