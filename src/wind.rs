//! Select the sounding levels to draw wind barbs at.
//!
//! Soundings carry far more levels than a readable skew-T can hold barbs for, so barbs
//! are drawn only at the sample nearest each of a ladder of evenly spaced target
//! pressures.

use crate::sounding::Sounding;
use metfor::{HectoPascal, MetersPSec, Quantity, WindUV};

/// The ladder of target pressure levels for wind barbs.
///
/// Targets run from `upper` up to but not including `lower` in steps of `step`, all in
/// hPa. The defaults place a barb about every 25 hPa over the depth of a typical
/// flight.
#[derive(Debug, Clone, Copy)]
pub struct BarbSpacing {
    /// Topmost target level (hPa), inclusive.
    pub upper: u32,
    /// Bottom of the ladder (hPa), exclusive.
    pub lower: u32,
    /// Distance between targets (hPa).
    pub step: u32,
}

impl Default for BarbSpacing {
    fn default() -> Self {
        BarbSpacing {
            upper: 100,
            lower: 1000,
            step: 25,
        }
    }
}

/// A single selected barb: the sample pressure and the wind components there.
#[derive(Debug, Clone, Copy)]
pub struct BarbPoint {
    /// Pressure of the selected sample, not of the target level.
    pub pressure: HectoPascal,
    /// Wind at the selected sample.
    pub wind: WindUV<MetersPSec>,
}

/// Pick the sounding levels to draw barbs at.
///
/// For each target level the sample whose pressure is numerically closest wins, with
/// the first such sample kept on ties. Two targets that resolve to the same sample
/// produce a single barb, so the result holds at most one point per target and no
/// duplicate samples, in the order the targets first claimed them.
pub fn barb_points(snd: &Sounding, spacing: BarbSpacing) -> Vec<BarbPoint> {
    let pressure = snd.pressure_profile();
    let wind = snd.wind_profile();

    // Only levels with both a pressure and a wind can hold a barb.
    let candidates: Vec<(usize, f64)> = pressure
        .iter()
        .zip(wind.iter())
        .enumerate()
        .filter_map(|(i, (p_opt, w_opt))| {
            if p_opt.is_some() && w_opt.is_some() {
                Some((i, p_opt.unpack().unpack()))
            } else {
                None
            }
        })
        .collect();

    if candidates.is_empty() || spacing.step == 0 {
        return vec![];
    }

    let mut selected: Vec<usize> = Vec::new();
    for target in (spacing.upper..spacing.lower).step_by(spacing.step as usize) {
        let target = f64::from(target);

        // first minimum wins
        let nearest = candidates
            .iter()
            .fold(None, |best: Option<(usize, f64)>, &(i, p)| {
                let dist = (p - target).abs();
                match best {
                    Some((_, best_dist)) if best_dist <= dist => best,
                    _ => Some((i, dist)),
                }
            })
            .map(|(i, _)| i);

        if let Some(i) = nearest {
            if !selected.contains(&i) {
                selected.push(i);
            }
        }
    }

    selected
        .into_iter()
        .map(|i| BarbPoint {
            pressure: pressure[i].unpack(),
            wind: WindUV::from(wind[i].unpack()),
        })
        .collect()
}
