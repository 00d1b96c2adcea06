use metfor::{Celsius, HectoPascal, Meters, MetersPSec, WindSpdDir};
use optional::Optioned;

/// A copy of a row of the sounding data.
#[derive(Clone, Default, Copy, Debug, PartialEq)]
pub struct DataRow {
    /// Pressure in hPa
    pub pressure: Optioned<HectoPascal>,
    /// Temperature in C
    pub temperature: Optioned<Celsius>,
    /// Dew point in C
    pub dew_point: Optioned<Celsius>,
    /// Relative humidity as a fraction in the range 0.0 to 1.0
    pub relative_humidity: Optioned<f64>,
    /// Geometric height of the balloon in meters
    pub height: Optioned<Meters>,
    /// Wind in m/s
    pub wind: Optioned<WindSpdDir<MetersPSec>>,
}
