#[cfg(target_os = "espidf")]
use std::time::Duration;

#[cfg(target_os = "espidf")]
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer, EspTimerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDriverError {
    CannotCreateTimerService,
    SubscriptionError,
    CouldNotSetTimer,
    CouldNotCancelTimer,
    ErrorReadingTimer,
}

/// Driver for handing out esp_timer backed interrupts. Callbacks run on the
/// esp_timer task, not in ISR context, so they may lock mutexes.
#[cfg(target_os = "espidf")]
pub struct TimerDriver {
    service: EspTaskTimerService,
}

/// An interrupt that triggers its callback once, "after" the moment it was
/// enabled. After triggering it stays inactive until enable() is called again.
#[cfg(target_os = "espidf")]
pub struct OneShotTimer {
    timer: EspTimer<'static>,
    after: Duration,
}

#[cfg(target_os = "espidf")]
impl TimerDriver {
    pub fn new() -> Result<TimerDriver, TimerDriverError> {
        let service = EspTimerService::new().map_err(|_| TimerDriverError::CannotCreateTimerService)?;
        Ok(TimerDriver { service })
    }

    /// Sets an interrupt that triggers once after "micro_seconds". For this to start working enable()
    /// must be called. After the interrupt has been triggered it can be reset by calling enable()
    pub fn interrupt_after<F: FnMut() + Send + 'static>(&self, micro_seconds: u64, callback: F) -> Result<OneShotTimer, TimerDriverError> {
        let timer = self.service.timer(callback).map_err(|_| TimerDriverError::SubscriptionError)?;
        Ok(OneShotTimer { timer, after: Duration::from_micros(micro_seconds) })
    }
}

#[cfg(target_os = "espidf")]
impl OneShotTimer {
    /// Arms the timer. If it was still pending, the pending alarm is dropped
    /// and the countdown starts again from now
    pub fn enable(&self) -> Result<(), TimerDriverError> {
        if self.is_pending()? {
            self.disable()?;
        }
        self.timer.after(self.after).map_err(|_| TimerDriverError::CouldNotSetTimer)
    }

    pub fn disable(&self) -> Result<(), TimerDriverError> {
        self.timer.cancel().map(|_| ()).map_err(|_| TimerDriverError::CouldNotCancelTimer)
    }

    /// Checks if the timer was enabled and has not triggered yet
    pub fn is_pending(&self) -> Result<bool, TimerDriverError> {
        self.timer.is_scheduled().map_err(|_| TimerDriverError::ErrorReadingTimer)
    }
}
