#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio::*;
#[cfg(target_os = "espidf")]
pub use esp_idf_svc::hal::gpio::{InterruptType, Pull};
#[cfg(target_os = "espidf")]
use crate::utils::error_text_parser::map_enable_disable_errors;
#[cfg(target_os = "espidf")]
use crate::microcontroller_src::peripherals::Peripheral;

#[derive(Debug)]
pub enum DigitalInError {
    CannotSetPullForPin,
    CannotSetPinAsInput,
    CannotSetInterruptType,
    StateAlreadySet,
    InvalidPin,
    InvalidPeripheral,
}

/// Driver for receiving digital inputs from a particular Pin
#[cfg(target_os = "espidf")]
pub struct DigitalIn<'a>{
    pin_driver: PinDriver<'a, AnyIOPin, Input>,
}

#[cfg(target_os = "espidf")]
impl <'a>DigitalIn<'a> {
    /// Creates a new DigitalIn for a Pin, pulled down by default
    pub fn new(per: Peripheral) -> Result<DigitalIn<'a>, DigitalInError> {
        let gpio = per.into_any_io_pin().map_err(|_| DigitalInError::InvalidPeripheral)?;
        let pin_driver = PinDriver::input(gpio).map_err(|_| DigitalInError::CannotSetPinAsInput)?;

        let mut digital_in = DigitalIn { pin_driver };

        digital_in.set_pull(Pull::Down)?;
        Ok(digital_in)
    }

    /// Set the pin Pull either to Pull Up or Down
    pub fn set_pull(&mut self, pull_type: Pull)-> Result<(), DigitalInError>{
        self.pin_driver.set_pull(pull_type).map_err(|_| DigitalInError::CannotSetPullForPin)
    }

    /// Changes the interrupt type
    pub fn change_interrupt_type(&mut self, interrupt_type: InterruptType)-> Result<(), DigitalInError>{
        self.pin_driver.set_interrupt_type(interrupt_type).map_err(|_| DigitalInError::CannotSetInterruptType)
    }

    /// Subscribes "callback" to every interrupt of the received type and enables it. 
    /// 
    /// The callback runs in ISR context: it must not block, allocate or log. 
    /// ESP-IDF disables the pin interrupt each time it fires, so the
    /// interrupt is re-enabled from the ISR itself right after the callback.
    pub fn trigger_on_every_interrupt<F: FnMut() + Send + 'static>(&mut self, mut callback: F, interrupt_type: InterruptType) -> Result<(), DigitalInError>{
        self.change_interrupt_type(interrupt_type)?;
        let pin = self.pin_driver.pin();
        let rearming_callback = move || {
            callback();
            unsafe { esp_idf_svc::sys::gpio_intr_enable(pin) };
        };
        unsafe {
            self.pin_driver.subscribe(rearming_callback).map_err(map_enable_disable_errors)?;
        }
        self.pin_driver.enable_interrupt().map_err(map_enable_disable_errors)
    }
}
