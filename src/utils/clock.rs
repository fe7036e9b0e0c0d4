/// Source of monotonic time in microseconds since boot
pub trait MonotonicClock {
    fn now_us(&self) -> i64;
}

/// Clock backed by the esp_timer, which keeps counting through light sleep
/// and is safe to read from ISR context
#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

#[cfg(target_os = "espidf")]
impl MonotonicClock for EspClock {
    fn now_us(&self) -> i64 {
        unsafe { esp_idf_svc::sys::esp_timer_get_time() }
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }
}
