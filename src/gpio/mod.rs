mod digital_in;
mod digital_out;

pub use{
    digital_in::*,
    digital_out::*,
};
