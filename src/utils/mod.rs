pub mod constants;
pub mod logging;
pub mod progress;
pub mod units;

pub use constants::*;
pub use logging::init_logging;
pub use progress::ProgressReporter;
pub use units::{height_to_cm, parse_height, pounds_to_kg, round_to, Height};
