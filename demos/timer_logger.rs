//! Example reading the esp_timer every half second. Each line shows the time
//! since boot and the time since the previous reading, in microseconds.

#[cfg(target_os = "espidf")]
fn main() {
    use esp32timing::{sensors::{LoggerConfig, TimestampLogger}, Microcontroller};

    let micro = Microcontroller::new();
    let config = LoggerConfig::default();
    let mut logger = TimestampLogger::new(micro.clock());

    loop {
        let sample = logger.sample();
        println!("{}", sample);
        micro.sleep(config.interval_ms);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    panic!("timer_logger only runs on an esp-idf target");
}
