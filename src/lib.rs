//! Timing demos for the ESP32-C6: a periodic esp_timer logger and an
//! interrupt driven HC-SR04 ultrasonic distance sensor.
//!
//! Hardware drivers are only built for `target_os = "espidf"`; the timing and
//! measurement logic they rely on builds everywhere.

mod utils;
mod microcontroller_src;

pub mod gpio;
pub mod sensors;

pub use microcontroller_src::peripherals;
#[cfg(target_os = "espidf")]
pub use microcontroller_src::Microcontroller;
pub use utils::clock;
pub use utils::timer_driver;
pub use utils::esp32_timing_error;
