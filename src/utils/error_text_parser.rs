use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_ARG, ESP_ERR_INVALID_STATE};

use crate::gpio::{DigitalInError, DigitalOutError};

pub fn map_enable_disable_errors(err: EspError)-> DigitalInError{
    match err.code() {
        ESP_ERR_INVALID_STATE => DigitalInError::StateAlreadySet,
        _ => DigitalInError::InvalidPin,
    }
}

pub fn map_set_level_errors(err: EspError)-> DigitalOutError{
    match err.code() {
        ESP_ERR_INVALID_ARG => DigitalOutError::InvalidPin,
        _ => DigitalOutError::CannotSetLevel,
    }
}
