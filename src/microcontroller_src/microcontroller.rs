use esp_idf_svc::hal::delay::FreeRtos;
use crate::{
    gpio::*,
    microcontroller_src::peripherals::Peripherals,
    sensors::{HCSR04, SonarConfig},
    utils::{
        clock::EspClock,
        esp32_timing_error::Esp32TimingError,
        timer_driver::{TimerDriver, TimerDriverError},
    },
};

/// Primary abstraction for interacting with the microcontroller, providing access to peripherals and drivers
/// required for configuring pins and timers.
/// 
/// - `peripherals`: Bookkeeping of the gpios already handed out.
/// - `timer_driver`: esp_timer service, created the first time a timer is needed.
pub struct Microcontroller {
    peripherals: Peripherals,
    timer_driver: Option<TimerDriver>,
}

impl Microcontroller {

    /// Creates a new Microcontroller instance, applying the esp-idf runtime patches and
    /// routing the `log` facade to the esp-idf console
    /// 
    /// # Returns
    /// 
    /// The new Microcontroller
    pub fn new() -> Self{
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        
        Microcontroller{
            peripherals: Peripherals::new(),
            timer_driver: None,
        }
    }

    /// Retrieves the TimerDriver, creating it on first use.
    pub fn get_timer_driver(&mut self)-> Result<&TimerDriver, TimerDriverError>{
        if self.timer_driver.is_none(){
            self.timer_driver = Some(TimerDriver::new()?);
        }
        self.timer_driver.as_ref().ok_or(TimerDriverError::CannotCreateTimerService)
    }

    /// Creates a DigitalIn on the ESP pin with number 'pin_num' to read digital inputs.
    /// 
    /// # Errors
    ///
    /// Fails if the pin was already handed out, does not exist or cannot be configured as an input.
    pub fn set_pin_as_digital_in(&mut self, pin_num: usize) -> Result<DigitalIn<'static>, Esp32TimingError>  {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num)?;
        Ok(DigitalIn::new(pin_peripheral)?)
    }
    
    /// Creates a DigitalOut, driven Low, on the ESP pin with number 'pin_num' to write digital outputs.
    /// 
    /// # Errors
    ///
    /// Fails if the pin was already handed out, does not exist or cannot be configured as an output.
    pub fn set_pin_as_digital_out(&mut self, pin_num: usize) -> Result<DigitalOut<'static>, Esp32TimingError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num)?;
        Ok(DigitalOut::new(pin_peripheral)?)
    }

    /// Sets up an HC-SR04 on the pins named in "config"
    pub fn set_pins_for_hc_sr04(&mut self, config: SonarConfig) -> Result<HCSR04<'static>, Esp32TimingError> {
        config.validate()?;
        let trig = self.set_pin_as_digital_out(config.trigger_pin)?;
        let echo = self.set_pin_as_digital_in(config.echo_pin)?;
        let timer_driver = self.get_timer_driver()?;
        HCSR04::new(trig, echo, timer_driver, config)
    }

    /// Monotonic microsecond clock of the microcontroller
    pub fn clock(&self) -> EspClock {
        EspClock
    }

    pub fn sleep(&self, miliseconds:u32){
        FreeRtos::delay_ms(miliseconds)
    }
}

impl Default for Microcontroller {
    fn default() -> Self {
        Self::new()
    }
}
