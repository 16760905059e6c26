//! CIE xy chromaticity.

use serde::{Deserialize, Serialize};

/// A CIE 1931 chromaticity coordinate.
///
/// Serializes as a two-element array, `[x, y]`, the way the generic light
/// API carries it.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Xy(pub f64, pub f64);

impl Xy {
    pub fn new(x: f64, y: f64) -> Self {
        Xy(x, y)
    }

    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }
}

impl From<(f64, f64)> for Xy {
    fn from((x, y): (f64, f64)) -> Self {
        Xy(x, y)
    }
}
