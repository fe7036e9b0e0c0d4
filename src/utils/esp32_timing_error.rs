use crate::{
    utils::timer_driver::TimerDriverError,
    gpio::{
        DigitalInError,
        DigitalOutError,
    },
    microcontroller_src::peripherals::PeripheralError,
    sensors::ConfigError,
};

/// Error returned by every fallible operation of the crate, wrapping the error
/// of the driver that failed
#[derive(Debug)]
pub enum Esp32TimingError{
    ConfigError(ConfigError),
    DigitalInError(DigitalInError),
    DigitalOutError(DigitalOutError),
    PeripheralError(PeripheralError),
    TimerDriverError(TimerDriverError),
}

impl From<ConfigError> for Esp32TimingError {
    fn from(value: ConfigError) -> Self {
        Esp32TimingError::ConfigError(value)
    }
}

impl From<DigitalInError> for Esp32TimingError {
    fn from(value: DigitalInError) -> Self {
        Esp32TimingError::DigitalInError(value)
    }
}

impl From<DigitalOutError> for Esp32TimingError {
    fn from(value: DigitalOutError) -> Self {
        Esp32TimingError::DigitalOutError(value)
    }
}

impl From<PeripheralError> for Esp32TimingError {
    fn from(value: PeripheralError) -> Self {
        Esp32TimingError::PeripheralError(value)
    }
}

impl From<TimerDriverError> for Esp32TimingError {
    fn from(value: TimerDriverError) -> Self {
        Esp32TimingError::TimerDriverError(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fails_with_peripheral_error() -> Result<(), Esp32TimingError> {
        let pin: Result<(), PeripheralError> = Err(PeripheralError::PinAlreadyTaken(5));
        pin?;
        Ok(())
    }

    #[test]
    fn driver_errors_convert_with_question_mark() {
        match fails_with_peripheral_error() {
            Err(Esp32TimingError::PeripheralError(PeripheralError::PinAlreadyTaken(5))) => {},
            other => panic!("unexpected result {other:?}"),
        }
    }
}
