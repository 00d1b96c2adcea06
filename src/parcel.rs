//! Definition of an air parcel used for the convective analysis.

use crate::{
    error::{AnalysisError, Result},
    sounding::Sounding,
};
use metfor::{Celsius, HectoPascal, Kelvin};

/// Variables defining a parcel as used in parcel analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Temperature in C
    pub temperature: Celsius,
    /// Pressure in hPa
    pub pressure: HectoPascal,
    /// Dew point in C
    pub dew_point: Celsius,
}

impl Parcel {
    /// Get the potential temperature of the parcel.
    pub fn theta(&self) -> Kelvin {
        metfor::potential_temperature(self.pressure, self.temperature)
    }

    /// Get the equivalent potential temperature of the parcel.
    pub fn theta_e(&self) -> Result<Kelvin> {
        metfor::equiv_pot_temperature(self.temperature, self.dew_point, self.pressure)
            .ok_or(AnalysisError::MetForError)
    }

    /// Get the mixing ratio of the parcel.
    pub fn mixing_ratio(&self) -> Result<f64> {
        metfor::mixing_ratio(self.dew_point, self.pressure).ok_or(AnalysisError::MetForError)
    }

    /// Get the virtual temperature of the parcel.
    pub fn virtual_temperature(&self) -> Result<Kelvin> {
        metfor::virtual_temperature(self.temperature, self.dew_point, self.pressure)
            .ok_or(AnalysisError::MetForError)
    }
}

/// Get the surface parcel, the lowest level with pressure, temperature, and dew point.
///
/// For a quality controlled Skysonde sounding this is simply the first sample of the
/// flight.
pub fn surface_parcel(snd: &Sounding) -> Result<Parcel> {
    snd.bottom_up()
        .find_map(|row| {
            let pressure = row.pressure.into_option()?;
            let temperature = row.temperature.into_option()?;
            let dew_point = row.dew_point.into_option()?;

            Some(Parcel {
                temperature,
                pressure,
                dew_point,
            })
        })
        .ok_or(AnalysisError::NoDataProfile)
}
