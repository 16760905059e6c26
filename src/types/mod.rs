//! Value types for light control parameters.

mod calibration;
mod color;
mod mode;
mod power;
mod xy;

pub use calibration::Calibration;
pub use color::Color;
pub use mode::{Alert, ColorMode};
pub use power::PowerState;
pub use xy::Xy;
