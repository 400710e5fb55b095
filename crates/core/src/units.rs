use crate::errors::CircuitError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Resistance(f64);

impl Resistance {
    pub fn new(r: f64) -> Result<Self, CircuitError> {
        match r > 0.0 && r.is_finite() {
            true => Ok(Self(r)),
            false => Err(CircuitError::InvalidResistance(r)),
        }
    }
}

impl From<Resistance> for f64 {
    fn from(value: Resistance) -> f64 {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Capacitance(f64);

impl Capacitance {
    pub fn new(c: f64) -> Result<Self, CircuitError> {
        match c > 0.0 && c.is_finite() {
            true => Ok(Self(c)),
            false => Err(CircuitError::InvalidCapacitance(c)),
        }
    }
}

impl From<Capacitance> for f64 {
    fn from(value: Capacitance) -> f64 {
        value.0
    }
}

/// A source voltage. Zero and negative values are legal; NaN and infinities are not.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Voltage(f64);

impl Voltage {
    pub fn new(v: f64) -> Result<Self, CircuitError> {
        match v.is_finite() {
            true => Ok(Self(v)),
            false => Err(CircuitError::InvalidVoltage(v)),
        }
    }
}

impl From<Voltage> for f64 {
    fn from(value: Voltage) -> f64 {
        value.0
    }
}

/// True when both terminal voltages came out of the last solve.
pub fn both_defined(a: f64, b: f64) -> bool {
    !a.is_nan() && !b.is_nan()
}
