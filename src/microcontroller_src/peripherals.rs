use std::mem;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio::AnyIOPin;

const PIN_COUNT: usize = 24;
const DIGITAL_PINS_BOUNDS: (usize, usize) = (0,23);
/// GPIO14 is not bonded out on the ESP32-C6
const UNAVAILABLE_PIN: usize = 14;

#[derive(Debug, PartialEq, Eq)]
pub enum PeripheralError {
    NotAPin,
    PinOutOfBounds(usize),
    PinAlreadyTaken(usize),
}

/// Represents an esp32 Peripheral that can be turned into a driver exactly once
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Peripheral{
    Pin(u8),
    #[default]
    None
}

impl Peripheral {
    fn take(&mut self) -> Peripheral {
        mem::take(self)
    }

    /// Returns the gpio number if the Peripheral is a Pin
    pub fn pin_number(&self) -> Result<u8, PeripheralError> {
        match self {
            Peripheral::Pin(pin_num) => Ok(*pin_num),
            Peripheral::None => Err(PeripheralError::NotAPin),
        }
    }

    /// If the Peripheral is a Pin returns the corresponding AnyIOPin.
    /// If not it returns PeripheralError::NotAPin
    #[cfg(target_os = "espidf")]
    pub fn into_any_io_pin(self) -> Result<AnyIOPin, PeripheralError> {
        let pin_num = self.pin_number()?;
        // Safety: Peripherals hands out each pin number at most once
        Ok(unsafe { AnyIOPin::new(pin_num as i32) })
    }
}

/// Keeps track of which gpios were already handed out. Subsequent gets of the
/// same pin fail with PeripheralError::PinAlreadyTaken.
pub struct Peripherals {
    pins: [Peripheral; PIN_COUNT],
}

impl Peripherals {
    pub fn new() -> Peripherals {
        let pins: [Peripheral; PIN_COUNT] = std::array::from_fn(|pin_num| {
            if pin_num == UNAVAILABLE_PIN {
                Peripheral::None
            } else {
                Peripheral::Pin(pin_num as u8)
            }
        });
        Peripherals { pins }
    }

    pub fn get_digital_pin(&mut self, pin_num: usize) -> Result<Peripheral, PeripheralError> {
        if pin_num < DIGITAL_PINS_BOUNDS.0 || pin_num > DIGITAL_PINS_BOUNDS.1 {
            return Err(PeripheralError::PinOutOfBounds(pin_num))
        }
        if pin_num == UNAVAILABLE_PIN {
            return Err(PeripheralError::NotAPin)
        }
        match self.pins[pin_num].take() {
            Peripheral::None => Err(PeripheralError::PinAlreadyTaken(pin_num)),
            pin => Ok(pin),
        }
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}
