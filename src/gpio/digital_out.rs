#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio::*;
#[cfg(target_os = "espidf")]
use crate::microcontroller_src::peripherals::Peripheral;
#[cfg(target_os = "espidf")]
use crate::utils::error_text_parser::map_set_level_errors;

#[derive(Debug)]
pub enum DigitalOutError{
    CannotSetPinAsOutput,
    CannotSetLevel,
    InvalidPin,
    InvalidPeripheral,
}

/// Driver to handle a digital output for a particular Pin
#[cfg(target_os = "espidf")]
pub struct DigitalOut<'a>{
    pin_driver: PinDriver<'a, AnyIOPin, Output>,
}

#[cfg(target_os = "espidf")]
impl <'a>DigitalOut<'a> {
    /// Creates a new DigitalOut for a Pin. The pin starts driven Low
    pub fn new(per: Peripheral) -> Result<DigitalOut<'a>, DigitalOutError>{
        let gpio = per.into_any_io_pin().map_err(|_| DigitalOutError::InvalidPeripheral)?;
        let pin_driver = PinDriver::output(gpio).map_err(|_| DigitalOutError::CannotSetPinAsOutput)?;

        let mut digital_out = DigitalOut { pin_driver };
        digital_out.set_low()?;
        Ok(digital_out)
    }

    /// Sets the pin level either to High or Low
    pub fn set_level(&mut self, level: Level)->Result<(), DigitalOutError>{
        self.pin_driver.set_level(level).map_err(map_set_level_errors)
    }

    /// Sets the pin level to High
    pub fn set_high(&mut self)->Result<(), DigitalOutError>{
        self.set_level(Level::High)
    }

    /// Sets the pin level to Low
    pub fn set_low(&mut self)->Result<(), DigitalOutError>{
        self.set_level(Level::Low)
    }
}
