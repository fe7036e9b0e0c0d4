pub mod clock;
pub mod esp32_timing_error;
pub mod timer_driver;
#[cfg(target_os = "espidf")]
pub(crate) mod error_text_parser;
