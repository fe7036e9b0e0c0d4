mod hc_sr04;
mod timestamp_logger;

pub use hc_sr04::*;
pub use timestamp_logger::*;
