//! Test support for the BAYSENSE workspace.
//!
//! Backend payloads live in [`fixtures`], larger synthetic inputs come from
//! [`generators`], and [`StubBackend`] serves an `axum::Router` locally so
//! HTTP code can be exercised without a real backend.
//!
//! ```ignore
//! use test_utils::{fixtures, StubBackend};
//!
//! let backend = StubBackend::start(router).await;
//! let client = BackendClient::new(ClientConfig {
//!     base_url: backend.base_url().to_string(),
//!     ..Default::default()
//! })?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod stub;

pub use fixtures::*;
pub use generators::*;
pub use stub::StubBackend;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of lon/lat pairs.
///
/// ```ignore
/// use test_utils::assert_lonlat_approx_eq;
///
/// assert_lonlat_approx_eq!((121.3301, 14.0781), (121.33, 14.078), 0.001);
/// ```
#[macro_export]
macro_rules! assert_lonlat_approx_eq {
    (($lon1:expr, $lat1:expr), ($lon2:expr, $lat2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($lon1, $lon2, $epsilon);
        $crate::assert_approx_eq!($lat1, $lat2, $epsilon);
    }};
}
