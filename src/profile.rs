//! Create profiles derived from a sounding.
//!
//! The output of each function is at the same levels as the sounding, so it is suitable
//! to be set back on the sounding as a profile. If one of the input profiles required
//! for the calculation is missing, the result is an empty vector. Levels where the
//! calculation is not possible hold a missing value.

use crate::sounding::Sounding;
use itertools::izip;
use metfor::{Celsius, HectoPascal, MetersPSec, Quantity, WindUV};
use optional::Optioned;

/// Given a sounding, calculate a profile of dew point from temperature and relative
/// humidity.
///
/// The humidity is a fraction in the range 0.0 to 1.0. The actual vapor pressure is
/// recovered from the saturation vapor pressure at the ambient temperature and inverted
/// through the mixing ratio form, so a fraction of exactly 1.0 reproduces the ambient
/// temperature.
pub fn dew_point_from_relative_humidity(snd: &Sounding) -> Vec<Optioned<Celsius>> {
    let p_profile = snd.pressure_profile();
    let t_profile = snd.temperature_profile();
    let rh_profile = snd.relative_humidity_profile();

    if p_profile
        .len()
        .min(t_profile.len())
        .min(rh_profile.len())
        == 0
    {
        return vec![];
    }

    izip!(p_profile, t_profile, rh_profile)
        .map(|(p_opt, t_opt, rh_opt)| {
            let value = if p_opt.is_some() && t_opt.is_some() && rh_opt.is_some() {
                dew_point_at(p_opt.unpack(), t_opt.unpack(), rh_opt.unpack())
            } else {
                None
            };

            Optioned::from(value)
        })
        .collect()
}

/// Dew point for a single sample.
pub fn dew_point_at(pressure: HectoPascal, temperature: Celsius, rh: f64) -> Option<Celsius> {
    if !(rh > 0.0 && rh <= 1.0) {
        return None;
    }

    let sat_vp = metfor::vapor_pressure_water(temperature)?;
    let vp = HectoPascal(sat_vp.unpack() * rh);

    // Guard against vanishing dry partial pressure, impossible in real data.
    if (pressure - vp).unpack() <= 0.0 {
        return None;
    }

    let mw = metfor::epsilon * vp.unpack() / (pressure - vp).unpack();
    metfor::dew_point_from_p_and_mw(pressure, mw)
}

/// Given a sounding, decompose the wind profile into orthogonal (u, v) components.
///
/// Uses the standard meteorological convention, so a wind blowing *from* the west
/// (direction 270\u{00b0}) has a positive, eastward u component.
pub fn wind_components(snd: &Sounding) -> Vec<Optioned<WindUV<MetersPSec>>> {
    let wind_profile = snd.wind_profile();

    if wind_profile.is_empty() {
        return vec![];
    }

    wind_profile
        .iter()
        .map(|w_opt| {
            let value = w_opt.into_option().map(WindUV::<MetersPSec>::from);
            Optioned::from(value)
        })
        .collect()
}
