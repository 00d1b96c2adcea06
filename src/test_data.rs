//! Synthetic soundings used in tests.

use crate::sounding::Sounding;
use metfor::{Celsius, HectoPascal, Meters};
use optional::{some, Optioned};

// Standard-atmosphere-ish height for a pressure level, good enough for test profiles.
fn height_for(p_hpa: f64) -> f64 {
    44_330.0 * (1.0 - (p_hpa / 1013.25).powf(0.190_3))
}

fn sounding_from_triples(levels: &[(f64, f64, f64)]) -> Sounding {
    let pressure: Vec<Optioned<HectoPascal>> = levels
        .iter()
        .map(|&(p, _, _)| some(HectoPascal(p)))
        .collect();
    let temperature: Vec<Optioned<Celsius>> =
        levels.iter().map(|&(_, t, _)| some(Celsius(t))).collect();
    let dew_point: Vec<Optioned<Celsius>> = levels
        .iter()
        .map(|&(_, _, dp)| some(Celsius(dp)))
        .collect();
    let height: Vec<Optioned<Meters>> = levels
        .iter()
        .map(|&(p, _, _)| some(Meters(height_for(p))))
        .collect();

    Sounding::new()
        .with_pressure_profile(pressure)
        .with_temperature_profile(temperature)
        .with_dew_point_profile(dew_point)
        .with_height_profile(height)
}

/// A warm, moist boundary layer under a steep lapse rate. Surface parcels find plenty
/// of buoyancy in this one.
pub fn make_unstable_sounding() -> Sounding {
    let levels: Vec<(f64, f64, f64)> = (0..37)
        .map(|i| {
            let p = 1000.0 - 25.0 * f64::from(i);
            let h_km = height_for(p) / 1000.0;
            let t = (30.0 - 7.0 * h_km).max(-60.0);
            let spread = if p > 700.0 { 6.0 } else { 20.0 };
            (p, t, t - spread)
        })
        .collect();

    sounding_from_triples(&levels)
}

/// A cool, dry profile with a surface inversion. Lifted surface parcels stay colder
/// than the environment the whole way up.
pub fn make_stable_sounding() -> Sounding {
    let levels: Vec<(f64, f64, f64)> = (0..37)
        .map(|i| {
            let p = 1000.0 - 25.0 * f64::from(i);
            let h_km = height_for(p) / 1000.0;
            let t = if h_km < 1.0 {
                10.0 + 5.0 * h_km
            } else {
                (15.0 - 5.0 * (h_km - 1.0)).max(-60.0)
            };
            (p, t, t - 15.0)
        })
        .collect();

    sounding_from_triples(&levels)
}
