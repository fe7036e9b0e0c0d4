use std::fmt;
use std::sync::{atomic::{AtomicBool, AtomicU64, Ordering}, Arc, PoisonError};

use crate::{gpio::DigitalOutError, utils::clock::MonotonicClock};

#[cfg(target_os = "espidf")]
use std::sync::Mutex;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::delay::FreeRtos;
#[cfg(target_os = "espidf")]
use crate::{
    gpio::{DigitalIn, DigitalOut, InterruptType},
    utils::{clock::EspClock, esp32_timing_error::Esp32TimingError, timer_driver::{OneShotTimer, TimerDriver}},
};

const TRIGGER_PIN: usize = 5;
const ECHO_PIN: usize = 6;
const TRIGGER_PULSE_US: u64 = 10;
const ECHO_WAIT_MS: u32 = 60;
const REPORT_INTERVAL_MS: u32 = 1000;

// 2 cm to 400 cm, the sensor's rated range
const MIN_PULSE_US: u64 = 116;
const MAX_PULSE_US: u64 = 23200;

/// Empirical microseconds of echo per centimetre of distance
const PULSE_US_PER_CM: f64 = 58.3;
const CM_PER_INCH: f64 = 2.54;

/// Marks the pulse slot as holding no completed pulse
const NO_PULSE: u64 = u64::MAX;

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    InvalidPulseWindow { min_pulse_us: u64, max_pulse_us: u64 },
    InvalidCmDivisor(f64),
    TriggerAndEchoOnSamePin(usize),
}

/// Wiring and timing of an HC-SR04
#[derive(Debug, Clone, PartialEq)]
pub struct SonarConfig {
    pub trigger_pin: usize,
    pub echo_pin: usize,
    /// How long the trigger line is held High
    pub trigger_pulse_us: u64,
    /// How long to wait for the echo after triggering
    pub echo_wait_ms: u32,
    pub report_interval_ms: u32,
    pub min_pulse_us: u64,
    pub max_pulse_us: u64,
    pub cm_divisor: f64,
}

impl Default for SonarConfig {
    fn default() -> Self {
        SonarConfig {
            trigger_pin: TRIGGER_PIN,
            echo_pin: ECHO_PIN,
            trigger_pulse_us: TRIGGER_PULSE_US,
            echo_wait_ms: ECHO_WAIT_MS,
            report_interval_ms: REPORT_INTERVAL_MS,
            min_pulse_us: MIN_PULSE_US,
            max_pulse_us: MAX_PULSE_US,
            cm_divisor: PULSE_US_PER_CM,
        }
    }
}

impl SonarConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pulse_us > self.max_pulse_us {
            return Err(ConfigError::InvalidPulseWindow { min_pulse_us: self.min_pulse_us, max_pulse_us: self.max_pulse_us })
        }
        if !(self.cm_divisor > 0.0 && self.cm_divisor.is_finite()) {
            return Err(ConfigError::InvalidCmDivisor(self.cm_divisor))
        }
        if self.trigger_pin == self.echo_pin {
            return Err(ConfigError::TriggerAndEchoOnSamePin(self.trigger_pin))
        }
        Ok(())
    }

    /// Classifies a pulse width against the accepted window, converting it to a
    /// distance when it is inside (bounds included)
    pub fn classify_pulse(&self, pulse_width_us: u64) -> Reading {
        if pulse_width_us < self.min_pulse_us || pulse_width_us > self.max_pulse_us {
            return Reading::OutOfRange(pulse_width_us)
        }
        Reading::Distance(Distance::from_cm(pulse_width_us as f64 / self.cm_divisor))
    }

    /// Takes the pulse completed during the last echo wait and classifies it
    pub fn reading(&self, pulse: &EchoPulse) -> Reading {
        match pulse.take() {
            Some(width_us) => self.classify_pulse(width_us),
            None => Reading::NoEcho,
        }
    }
}

/// Distance to the object in front of the sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    cm: f64,
}

impl Distance {
    pub fn from_cm(cm: f64) -> Self {
        Distance { cm }
    }

    pub fn cm(&self) -> f64 {
        self.cm
    }

    pub fn inches(&self) -> f64 {
        self.cm / CM_PER_INCH
    }
}

/// Outcome of one measurement cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Distance(Distance),
    /// Raw pulse width in microseconds
    OutOfRange(u64),
    /// No echo pulse completed since the previous measurement
    NoEcho,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Distance(distance) => write!(f, "Distance: {:.2} cm, {:.2} inches", distance.cm(), distance.inches()),
            Reading::OutOfRange(pulse_width_us) => write!(f, "Out of range (pulse width: {} us)", pulse_width_us),
            Reading::NoEcho => write!(f, "No echo received"),
        }
    }
}

/// Two phase capture of the echo pulse. Edges alternate rise, fall, rise...
/// so the phase is tracked here instead of reading the pin level in the ISR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeCapture {
    #[default]
    AwaitingRise,
    AwaitingFall { rise_us: i64 },
}

impl EdgeCapture {
    /// Advances the capture with an edge seen at "now_us". Returns the pulse
    /// width when the edge closes a pulse
    pub fn on_edge(&mut self, now_us: i64) -> Option<u64> {
        match *self {
            EdgeCapture::AwaitingRise => {
                *self = EdgeCapture::AwaitingFall { rise_us: now_us };
                None
            },
            EdgeCapture::AwaitingFall { rise_us } => {
                *self = EdgeCapture::AwaitingRise;
                Some(pulse_width(rise_us, now_us))
            },
        }
    }
}

/// Time between both edges, clamped to zero if the fall is seen before the rise
pub fn pulse_width(rise_us: i64, fall_us: i64) -> u64 {
    fall_us.saturating_sub(rise_us).max(0) as u64
}

/// Last completed echo pulse, written from the echo ISR and taken by the
/// measurement loop. Single writer, single reader.
#[derive(Clone)]
pub struct EchoPulse {
    width_us: Arc<AtomicU64>,
    resync: Arc<AtomicBool>,
}

impl EchoPulse {
    pub fn new() -> Self {
        EchoPulse {
            width_us: Arc::new(AtomicU64::new(NO_PULSE)),
            resync: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stores a completed pulse, replacing any pulse not taken yet
    pub fn store(&self, width_us: u64) {
        self.width_us.store(width_us.min(NO_PULSE - 1), Ordering::Release);
    }

    /// Takes the last completed pulse, leaving the slot empty
    pub fn take(&self) -> Option<u64> {
        match self.width_us.swap(NO_PULSE, Ordering::AcqRel) {
            NO_PULSE => None,
            width_us => Some(width_us),
        }
    }

    /// Asks the ISR to treat the next edge as a rising one
    pub fn request_resync(&self) {
        self.resync.store(true, Ordering::Release);
    }

    fn take_resync_request(&self) -> bool {
        self.resync.swap(false, Ordering::AcqRel)
    }
}

impl Default for EchoPulse {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the echo interrupt handler
pub struct EchoIsr<C: MonotonicClock> {
    capture: EdgeCapture,
    pulse: EchoPulse,
    clock: C,
}

impl<C: MonotonicClock> EchoIsr<C> {
    pub fn new(pulse: EchoPulse, clock: C) -> Self {
        EchoIsr { capture: EdgeCapture::AwaitingRise, pulse, clock }
    }

    /// Body of the echo ISR. Must stay free of blocking calls and logging
    pub fn on_edge(&mut self) {
        let now_us = self.clock.now_us();
        if self.pulse.take_resync_request() {
            self.capture = EdgeCapture::AwaitingRise;
        }
        if let Some(width_us) = self.capture.on_edge(now_us) {
            self.pulse.store(width_us);
        }
    }

    pub fn capture(&self) -> EdgeCapture {
        self.capture
    }
}

/// A poisoned trigger lock leaves the trigger level unknown
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn trigger_lock_error<T>(_: PoisonError<T>) -> DigitalOutError {
    DigitalOutError::CannotSetLevel
}

/// HC-SR04 driven by a one shot timer for the trigger pulse and an any edge
/// interrupt on the echo pin
#[cfg(target_os = "espidf")]
pub struct HCSR04<'a> {
    trig: Arc<Mutex<DigitalOut<'static>>>,
    _echo: DigitalIn<'a>,
    trigger_timer: OneShotTimer,
    trigger_fault: Arc<AtomicBool>,
    pulse: EchoPulse,
    config: SonarConfig,
}

#[cfg(target_os = "espidf")]
impl <'a>HCSR04<'a> {
    pub fn new(trig: DigitalOut<'static>, mut echo: DigitalIn<'a>, timer_driver: &TimerDriver, config: SonarConfig) -> Result<HCSR04<'a>, Esp32TimingError> {
        config.validate()?;
        let trig = Arc::new(Mutex::new(trig));
        let trigger_fault = Arc::new(AtomicBool::new(false));

        let trig_ref = trig.clone();
        let trigger_fault_ref = trigger_fault.clone();
        let trigger_timer = timer_driver.interrupt_after(config.trigger_pulse_us, move || {
            let lowered = trig_ref.lock().map_err(trigger_lock_error).and_then(|mut trig| trig.set_low());
            if lowered.is_err() {
                trigger_fault_ref.store(true, Ordering::Release);
            }
        })?;

        let pulse = EchoPulse::new();
        let mut isr = EchoIsr::new(pulse.clone(), EspClock);
        echo.trigger_on_every_interrupt(move || isr.on_edge(), InterruptType::AnyEdge)?;
        log::debug!("HC-SR04 ready, trigger on gpio{} echo on gpio{}", config.trigger_pin, config.echo_pin);

        Ok(HCSR04 { trig, _echo: echo, trigger_timer, trigger_fault, pulse, config })
    }

    /// Fires the trigger pulse, waits for the echo and classifies it
    pub fn measure(&mut self) -> Result<Reading, Esp32TimingError> {
        self.pulse.request_resync();
        self.raise_trigger()?;
        self.trigger_timer.enable()?;

        FreeRtos::delay_ms(self.config.echo_wait_ms);

        if self.trigger_fault.swap(false, Ordering::AcqRel) {
            return Err(DigitalOutError::CannotSetLevel.into())
        }
        Ok(self.config.reading(&self.pulse))
    }

    pub fn config(&self) -> &SonarConfig {
        &self.config
    }

    fn raise_trigger(&self) -> Result<(), Esp32TimingError> {
        let mut trig = self.trig.lock().map_err(trigger_lock_error)?;
        trig.set_high()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    struct FakeClock {
        now: Cell<i64>,
    }

    impl FakeClock {
        fn at(now: i64) -> Self {
            FakeClock { now: Cell::new(now) }
        }

        fn set(&self, now: i64) {
            self.now.set(now)
        }
    }

    impl MonotonicClock for FakeClock {
        fn now_us(&self) -> i64 {
            self.now.get()
        }
    }

    fn assert_distance(reading: Reading, expected_cm: f64) {
        match reading {
            Reading::Distance(distance) => assert!((distance.cm() - expected_cm).abs() < 1e-9, "{} != {}", distance.cm(), expected_cm),
            other => panic!("expected a distance, got {other:?}"),
        }
    }

    #[test]
    fn width_is_fall_minus_rise() {
        assert_eq!(pulse_width(1000, 1500), 500);
    }

    #[test]
    fn fall_before_rise_is_clamped_to_zero() {
        assert_eq!(pulse_width(1500, 1000), 0);
        assert_eq!(pulse_width(i64::MAX, i64::MIN), 0);
    }

    #[test]
    fn edge_capture_alternates_rise_and_fall() {
        let mut capture = EdgeCapture::default();
        assert_eq!(capture.on_edge(1000), None);
        assert_eq!(capture, EdgeCapture::AwaitingFall { rise_us: 1000 });
        assert_eq!(capture.on_edge(1500), Some(500));
        assert_eq!(capture, EdgeCapture::AwaitingRise);
        assert_eq!(capture.on_edge(2000), None);
        assert_eq!(capture.on_edge(1900), Some(0));
    }

    #[test]
    fn pulse_widths_inside_window_become_distances() {
        let config = SonarConfig::default();
        assert_distance(config.classify_pulse(116), 116.0 / 58.3);
        assert_distance(config.classify_pulse(583), 10.0);
        assert_distance(config.classify_pulse(23200), 23200.0 / 58.3);
    }

    #[test]
    fn pulse_widths_outside_window_are_out_of_range() {
        let config = SonarConfig::default();
        assert_eq!(config.classify_pulse(0), Reading::OutOfRange(0));
        assert_eq!(config.classify_pulse(115), Reading::OutOfRange(115));
        assert_eq!(config.classify_pulse(23201), Reading::OutOfRange(23201));
    }

    #[test]
    fn taking_twice_without_new_pulse_is_no_echo() {
        let pulse = EchoPulse::new();
        assert_eq!(pulse.take(), None);
        pulse.store(583);
        assert_eq!(pulse.take(), Some(583));
        assert_eq!(pulse.take(), None);
    }

    #[test]
    fn isr_stores_completed_pulses() {
        let pulse = EchoPulse::new();
        let clock = FakeClock::at(1000);
        let mut isr = EchoIsr::new(pulse.clone(), &clock);

        isr.on_edge();
        assert_eq!(pulse.take(), None);
        clock.set(1500);
        isr.on_edge();
        assert_eq!(pulse.take(), Some(500));
    }

    #[test]
    fn resync_discards_half_captured_pulse() {
        let pulse = EchoPulse::new();
        let clock = FakeClock::at(1000);
        let mut isr = EchoIsr::new(pulse.clone(), &clock);

        // Rise without fall, the echo of this cycle was lost
        isr.on_edge();
        assert_eq!(isr.capture(), EdgeCapture::AwaitingFall { rise_us: 1000 });

        pulse.request_resync();
        clock.set(70_000);
        isr.on_edge();
        assert_eq!(isr.capture(), EdgeCapture::AwaitingFall { rise_us: 70_000 });
        assert_eq!(pulse.take(), None);

        clock.set(70_583);
        isr.on_edge();
        assert_eq!(pulse.take(), Some(583));
    }

    #[test]
    fn readings_are_printed_for_the_console() {
        let config = SonarConfig::default();
        assert_eq!(config.classify_pulse(583).to_string(), "Distance: 10.00 cm, 3.94 inches");
        assert_eq!(config.classify_pulse(50).to_string(), "Out of range (pulse width: 50 us)");
        assert_eq!(Reading::NoEcho.to_string(), "No echo received");
    }

    #[test]
    fn distance_in_inches() {
        assert!((Distance::from_cm(25.4).inches() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn reading_takes_the_last_pulse() {
        let config = SonarConfig::default();
        let pulse = EchoPulse::new();
        assert_eq!(config.reading(&pulse), Reading::NoEcho);

        pulse.store(583);
        assert_distance(config.reading(&pulse), 10.0);
        assert_eq!(config.reading(&pulse), Reading::NoEcho);

        pulse.store(50);
        assert_eq!(config.reading(&pulse), Reading::OutOfRange(50));
        pulse.store(23201);
        assert_eq!(config.reading(&pulse), Reading::OutOfRange(23201));
    }

    #[test]
    fn cycle_reads_pulse_captured_after_resync() {
        let config = SonarConfig::default();
        let pulse = EchoPulse::new();
        let clock = FakeClock::at(0);
        let mut isr = EchoIsr::new(pulse.clone(), &clock);

        // Stray rise left over from a cycle whose echo was lost
        isr.on_edge();

        pulse.request_resync();
        clock.set(100_000);
        isr.on_edge();
        clock.set(101_166);
        isr.on_edge();
        assert_distance(config.reading(&pulse), 1166.0 / 58.3);

        // Next cycle: no edges during the wait
        pulse.request_resync();
        assert_eq!(config.reading(&pulse), Reading::NoEcho);
    }

    #[test]
    fn default_config_matches_sensor_timing() {
        let config = SonarConfig::default();
        assert_eq!(config.trigger_pin, 5);
        assert_eq!(config.echo_pin, 6);
        assert_eq!(config.trigger_pulse_us, 10);
        assert_eq!(config.echo_wait_ms, 60);
        assert_eq!(config.report_interval_ms, 1000);
        assert_eq!(config.min_pulse_us, 116);
        assert_eq!(config.max_pulse_us, 23200);
        assert_eq!(config.cm_divisor, 58.3);
    }

    #[test]
    fn poisoned_trigger_lock_cannot_set_level() {
        let trig = Arc::new(std::sync::Mutex::new(false));
        let trig_ref = trig.clone();
        let _ = std::thread::spawn(move || {
            let _guard = trig_ref.lock();
            panic!("poison the trigger lock");
        }).join();

        assert!(matches!(trig.lock().map_err(trigger_lock_error), Err(DigitalOutError::CannotSetLevel)));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SonarConfig::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let inverted = SonarConfig { min_pulse_us: 200, max_pulse_us: 100, ..SonarConfig::default() };
        assert_eq!(inverted.validate(), Err(ConfigError::InvalidPulseWindow { min_pulse_us: 200, max_pulse_us: 100 }));

        let zero_divisor = SonarConfig { cm_divisor: 0.0, ..SonarConfig::default() };
        assert_eq!(zero_divisor.validate(), Err(ConfigError::InvalidCmDivisor(0.0)));

        let same_pin = SonarConfig { echo_pin: 5, ..SonarConfig::default() };
        assert_eq!(same_pin.validate(), Err(ConfigError::TriggerAndEchoOnSamePin(5)));
    }
}
