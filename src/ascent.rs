//! Find the ascent phase of a radiosonde flight.
//!
//! A flight rises until the balloon bursts, then the payload falls back down. On the
//! way up the pressure decreases monotonically, so the first level where it stops
//! decreasing marks the burst. Only the ascent is physically meaningful for a skew-T.

use crate::{
    error::{AnalysisError, Result},
    sounding::Sounding,
};
use itertools::Itertools;
use metfor::HectoPascal;
use optional::Optioned;

/// Leading samples discarded before plotting, while the sonde is still spinning up on
/// the ground and clearing the launch site.
pub const SURFACE_SPIN_UP: usize = 2;

/// Find the first index where pressure stops decreasing, which is where the payload
/// starts to drop.
///
/// Returns the smallest index `i >= 1` such that `pressure[i] >= pressure[i - 1]`.
/// Levels with a missing pressure do not exist for this scan; quality controlled
/// soundings have none. A profile that decreases all the way to the end never descends
/// and yields [`AnalysisError::NoDescent`]; profiles shorter than two levels are
/// [`AnalysisError::NotEnoughData`].
pub fn descent_onset_index(pressure: &[Optioned<HectoPascal>]) -> Result<usize> {
    if pressure.iter().filter(|p| p.is_some()).count() < 2 {
        return Err(AnalysisError::NotEnoughData);
    }

    pressure
        .iter()
        .enumerate()
        .filter_map(|(i, p_opt)| p_opt.into_option().map(|p| (i, p)))
        .tuple_windows::<(_, _)>()
        .find_map(|((_, p0), (i1, p1))| if p1 >= p0 { Some(i1) } else { None })
        .ok_or(AnalysisError::NoDescent)
}

/// Cut a sounding down to its usable ascent phase.
///
/// Drops the [`SURFACE_SPIN_UP`] leading samples and everything from the descent onset
/// up. The result keeps the strictly decreasing part of the pressure profile, which
/// downstream parcel analysis and plotting rely on.
pub fn truncate_to_ascent(snd: &Sounding) -> Result<Sounding> {
    let burst = descent_onset_index(snd.pressure_profile())?;

    if burst <= SURFACE_SPIN_UP {
        return Err(AnalysisError::NotEnoughData);
    }

    Ok(snd.sliced(SURFACE_SPIN_UP..burst))
}

#[cfg(test)]
mod test {
    use super::*;
    use metfor::Quantity;
    use optional::some;

    fn pressures(vals: &[f64]) -> Vec<Optioned<HectoPascal>> {
        vals.iter().map(|&v| some(HectoPascal(v))).collect()
    }

    #[test]
    fn finds_first_non_decreasing_level() {
        // strictly decreasing for rows 0-14, increasing afterwards
        let vals: Vec<f64> = (0..15)
            .map(|i| 1000.0 - 10.0 * i as f64)
            .chain((0..5).map(|i| 860.0 + 10.0 * i as f64))
            .collect();
        assert_eq!(vals.len(), 20);

        let idx = descent_onset_index(&pressures(&vals)).unwrap();
        assert_eq!(idx, 15);

        // the ascent phase slice [2, 15) holds 13 samples
        assert_eq!(idx - SURFACE_SPIN_UP, 13);
    }

    #[test]
    fn equal_pressures_count_as_descent_onset() {
        let idx = descent_onset_index(&pressures(&[1000.0, 990.0, 990.0, 980.0])).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn strictly_decreasing_profile_has_no_descent() {
        let result = descent_onset_index(&pressures(&[1000.0, 990.0, 980.0, 970.0]));
        assert_eq!(result, Err(AnalysisError::NoDescent));
    }

    #[test]
    fn too_short_profile_is_not_enough_data() {
        let result = descent_onset_index(&pressures(&[1000.0]));
        assert_eq!(result, Err(AnalysisError::NotEnoughData));
    }

    #[test]
    fn truncation_drops_spin_up_and_descent() {
        let vals = [1013.0, 1010.0, 1005.0, 999.0, 992.0, 995.0, 1001.0];
        let snd = Sounding::new().with_pressure_profile(pressures(&vals));

        let ascent = truncate_to_ascent(&snd).unwrap();
        let got: Vec<f64> = ascent
            .pressure_profile()
            .iter()
            .map(|p| p.unpack().unpack())
            .collect();

        assert_eq!(got, vec![1005.0, 999.0, 992.0]);
    }
}
