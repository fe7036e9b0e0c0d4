//! Example using the HC-SR04 sensor with pin GPIO5 as trigger and GPIO6 as echo.
//! The trigger pulse is ended by a one shot timer and the echo is timed by an
//! interrupt on both edges. Every second it prints the distance of the object
//! in front, or why there is none.

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp32timing::esp32_timing_error::Esp32TimingError> {
    use esp32timing::{sensors::{Reading, SonarConfig}, Microcontroller};

    let mut micro = Microcontroller::new();
    let mut sensor = micro.set_pins_for_hc_sr04(SonarConfig::default())?;
    log::info!("HC-SR04 initialized");

    loop {
        let reading = sensor.measure()?;
        if let Reading::NoEcho = reading {
            log::warn!("Echo pin saw no complete pulse, check the sensor wiring");
        }
        println!("{}", reading);
        micro.sleep(sensor.config().report_interval_ms);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    panic!("hc_sr04_interrupt only runs on an esp-idf target");
}
