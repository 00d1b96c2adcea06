//! Lift a parcel through the sounding and analyze the result.

use crate::{
    error::{AnalysisError, Result},
    interpolation::{linear_interp, linear_interpolate_sounding},
    parcel::Parcel,
    sounding::Sounding,
};
use itertools::{izip, Itertools};
use metfor::{self, Celsius, CelsiusDiff, HectoPascal, JpKg, Kelvin, Meters, Quantity};
use optional::{none, some, Optioned};
use std::cmp::Ordering;

/// Hold profiles for a parcel and its environment.
///
/// The parcel and environment temperatures are virtual temperatures, since the profile
/// exists for buoyancy analysis.
#[derive(Debug, Clone)]
pub struct ParcelProfile {
    /// Pressure profile
    pub pressure: Vec<HectoPascal>,
    /// Height profile
    pub height: Vec<Meters>,
    /// Parcel virtual temperature profile
    pub parcel_t: Vec<Celsius>,
    /// Environment virtual temperature profile
    pub environment_t: Vec<Celsius>,
}

/// The result of lifting a parcel through a sounding.
#[derive(Debug, Clone)]
pub struct ParcelAscentAnalysis {
    // The original parcel and the profile from lifting it
    parcel: Parcel,
    profile: ParcelProfile,

    // Values derived while lifting
    cape: Optioned<JpKg>,
    cin: Optioned<JpKg>,
    lcl_pressure: Optioned<HectoPascal>,
    lcl_temperature: Optioned<Celsius>,
    lfc_pressure: Optioned<HectoPascal>,
    el_pressure: Optioned<HectoPascal>,
}

impl ParcelAscentAnalysis {
    /// Get the CAPE.
    pub fn cape(&self) -> Optioned<JpKg> {
        self.cape
    }

    /// Get the CIN. Zero or negative by convention.
    pub fn cin(&self) -> Optioned<JpKg> {
        self.cin
    }

    /// Get the LCL pressure level.
    pub fn lcl_pressure(&self) -> Optioned<HectoPascal> {
        self.lcl_pressure
    }

    /// Get the temperature at the LCL.
    pub fn lcl_temperature(&self) -> Optioned<Celsius> {
        self.lcl_temperature
    }

    /// Get the pressure at the level of free convection.
    pub fn lfc_pressure(&self) -> Optioned<HectoPascal> {
        self.lfc_pressure
    }

    /// Get the pressure at the equilibrium level.
    pub fn el_pressure(&self) -> Optioned<HectoPascal> {
        self.el_pressure
    }

    /// Retrieve the parcel's profile.
    #[inline]
    pub fn profile(&self) -> &ParcelProfile {
        &self.profile
    }

    /// Retrieve the original parcel.
    #[inline]
    pub fn parcel(&self) -> &Parcel {
        &self.parcel
    }
}

// A level in the analysis.
#[derive(Clone, Copy)]
struct AnalLevel {
    pressure: HectoPascal,
    height: Meters,
    pcl_virt_t: Celsius,
    env_virt_t: Celsius,
}

enum AnalLevelType {
    Normal(AnalLevel),
    Lfc(AnalLevel),
    Lcl(AnalLevel),
    El(AnalLevel),
}

/// Lift a parcel for a convective parcel analysis.
///
/// The resulting [`ParcelProfile`] and analysis are based off of virtual temperatures
/// and the idea that if there is no *moist* convection, or convective cloud, then there
/// is no CAPE or CIN.
pub fn lift_parcel(parcel: Parcel, snd: &Sounding) -> Result<ParcelAscentAnalysis> {
    // Find the LCL
    let (pcl_lcl, lcl_temperature) = parcel_lcl(&parcel, snd)?;

    // The starting level to lift the parcel from
    let parcel_start_data = linear_interpolate_sounding(snd, parcel.pressure)?;

    // How to calculate a parcel temperature for a given pressure level
    let parcel_calc_t = create_parcel_calc_t(parcel, pcl_lcl)?;

    // Get the environment data to iterate over. The parcel profile gets all the same
    // pressure levels as the environmental sounding, plus a few special ones.
    let snd_pressure = snd.pressure_profile();
    let hgt = snd.height_profile();
    let env_t = snd.temperature_profile();
    let env_dp = snd.dew_point_profile();

    // Allocate some buffers to hold the return values.
    let mut pressure: Vec<HectoPascal> = Vec::with_capacity(snd_pressure.len() + 5);
    let mut height: Vec<Meters> = Vec::with_capacity(snd_pressure.len() + 5);
    let mut parcel_t: Vec<Celsius> = Vec::with_capacity(snd_pressure.len() + 5);
    let mut environment_t: Vec<Celsius> = Vec::with_capacity(snd_pressure.len() + 5);

    // Start by adding the parcel level
    let p0 = parcel.pressure;
    let h0 = parcel_start_data
        .height
        .into_option()
        .ok_or(AnalysisError::InvalidInput)?;
    let pcl_t0 = parcel.virtual_temperature().map(Celsius::from)?;
    let env_t0 = parcel_start_data
        .dew_point
        .into_option()
        .ok_or(AnalysisError::InvalidInput)
        .and_then(|dp| {
            let t = parcel_start_data
                .temperature
                .into_option()
                .ok_or(AnalysisError::InterpolationError)?;
            metfor::virtual_temperature(t, dp, p0)
                .map(Celsius::from)
                .ok_or(AnalysisError::MetForError)
        })?;

    pressure.push(p0);
    height.push(h0);
    parcel_t.push(pcl_t0);
    environment_t.push(env_t0);

    let start_level = AnalLevel {
        pressure: p0,
        height: h0,
        pcl_virt_t: pcl_t0,
        env_virt_t: env_t0,
    };

    // If the parcel is buoyant right away, free convection starts at the surface.
    let initial_lfc: Option<AnalLevel> = if pcl_t0 >= env_t0 {
        Some(start_level)
    } else {
        None
    };

    // Construct an iterator that selects the environment values and calculates the
    // corresponding parcel values, then keeps track of the special levels.
    let (lfc, el): (Option<AnalLevel>, Option<AnalLevel>) = izip!(snd_pressure, hgt, env_t, env_dp)
        // Remove rows with missing data
        .filter(|(p, h, t, dp)| p.is_some() && h.is_some() && t.is_some() && dp.is_some())
        // Unpack from the `Optioned` type
        .map(|(p, h, t, dp)| (p.unpack(), h.unpack(), t.unpack(), dp.unpack()))
        // Remove rows at or below the parcel level
        .filter(move |(p, _, _, _)| *p < p0)
        // Calculate the parcel temperature, skip this level if there is an error
        .filter_map(|(p, h, env_t, env_dp)| {
            parcel_calc_t(p).map(|pcl_virt_t| (p, h, env_t, env_dp, pcl_virt_t))
        })
        // Calculate the environment virtual temperature, skip levels with errors
        .filter_map(|(p, h, env_t, env_dp, pcl_virt_t)| {
            metfor::virtual_temperature(env_t, env_dp, p)
                .map(|env_vt| (p, h, Celsius::from(env_vt), pcl_virt_t))
        })
        // Wrap in the AnalLevel type
        .map(|(pressure, height, env_virt_t, pcl_virt_t)| AnalLevel {
            pressure,
            height,
            pcl_virt_t,
            env_virt_t,
        })
        // Look at them two levels at a time to check for crossing any special levels
        .tuple_windows::<(_, _)>()
        // Find the level type and insert special levels if needed.
        .flat_map(|(lvl0, lvl1)| classify_levels(lvl0, lvl1, pcl_lcl))
        // Add every level to the profile vectors.
        .inspect(|anal_level_type| {
            use AnalLevelType::*;

            let level_data: &AnalLevel = match anal_level_type {
                Normal(data) | Lfc(data) | Lcl(data) | El(data) => data,
            };

            pressure.push(level_data.pressure);
            height.push(level_data.height);
            parcel_t.push(level_data.pcl_virt_t);
            environment_t.push(level_data.env_virt_t);
        })
        // Analyze the levels to find the LFC and EL.
        .fold((initial_lfc, None), |acc, anal_level_type| {
            use AnalLevelType::*;

            let (mut lfc, mut el) = acc;

            match anal_level_type {
                Normal(_) | Lcl(_) => {}
                Lfc(level_data) => {
                    if el.is_some() {
                        el = None;
                    }
                    lfc = Some(level_data);
                }
                El(level_data) => {
                    if lfc.is_some() {
                        el = Some(level_data);
                    }
                }
            };

            (lfc, el)
        });

    // Wrap the vectors into the ParcelProfile
    let profile = ParcelProfile {
        pressure,
        height,
        parcel_t,
        environment_t,
    };

    // Finalize the LCL variables.
    let lcl_pressure = some(pcl_lcl.pressure);
    let lcl_temperature = some(lcl_temperature);

    // Finalize the LFC and EL levels.
    let lfc_pressure: Optioned<HectoPascal> =
        Optioned::from(lfc.map(|lfc_level| lfc_level.pressure));
    let el_pressure: Optioned<HectoPascal> = Optioned::from(el.map(|el_level| el_level.pressure));

    // Get the CAPE/CIN values.
    let (cape, cin) = match cape_cin(&profile, lcl_pressure, lfc_pressure, el_pressure) {
        Ok((cape, cin)) => (some(cape), some(cin)),
        Err(_) => (none(), none()),
    };

    Ok(ParcelAscentAnalysis {
        parcel,
        profile,
        cape,
        cin,
        lcl_pressure,
        lcl_temperature,
        lfc_pressure,
        el_pressure,
    })
}

fn parcel_lcl(parcel: &Parcel, snd: &Sounding) -> Result<(AnalLevel, Celsius)> {
    let (pressure, temperature) = metfor::pressure_and_temperature_at_lcl(
        parcel.temperature,
        parcel.dew_point,
        parcel.pressure,
    )
    .ok_or(AnalysisError::MetForError)?;

    let temperature = Celsius::from(temperature);
    let lcl_env = linear_interpolate_sounding(snd, pressure)?;
    let height = lcl_env
        .height
        .into_option()
        .ok_or(AnalysisError::InterpolationError)?;
    let lcl_env_temperature = lcl_env
        .temperature
        .into_option()
        .ok_or(AnalysisError::InterpolationError)?;
    let lcl_env_dp = lcl_env
        .dew_point
        .into_option()
        .ok_or(AnalysisError::InterpolationError)?;

    let env_virt_t = Celsius::from(
        metfor::virtual_temperature(lcl_env_temperature, lcl_env_dp, pressure)
            .ok_or(AnalysisError::MetForError)?,
    );
    let pcl_virt_t = Celsius::from(
        metfor::virtual_temperature(temperature, temperature, pressure)
            .ok_or(AnalysisError::MetForError)?,
    );

    Ok((
        AnalLevel {
            pressure,
            height,
            pcl_virt_t,
            env_virt_t,
        },
        temperature,
    ))
}

// Below the LCL the parcel follows a dry adiabat while conserving its mixing ratio,
// above it a saturated adiabat. Either way the returned value is a virtual temperature.
fn create_parcel_calc_t(
    parcel: Parcel,
    lcl: AnalLevel,
) -> Result<impl Fn(HectoPascal) -> Option<Celsius>> {
    let theta = parcel.theta();
    let theta_e = parcel.theta_e()?;
    let dry_mw = parcel.mixing_ratio()?;

    Ok(move |tgt_pres| {
        if tgt_pres > lcl.pressure {
            // Dry adiabatic lifting
            let t_k = metfor::temperature_from_pot_temp(theta, tgt_pres);
            metfor::virtual_temperature(
                t_k,
                metfor::dew_point_from_p_and_mw(tgt_pres, dry_mw)?,
                tgt_pres,
            )
            .map(Celsius::from)
        } else {
            // Moist adiabatic lifting
            metfor::temperature_from_equiv_pot_temp_saturated_and_pressure(tgt_pres, theta_e)
                .and_then(|t_c| metfor::virtual_temperature(t_c, t_c, tgt_pres))
                .map(Celsius::from)
        }
    })
}

// Emit lvl0 plus any special levels crossed between lvl0 and lvl1, in decreasing
// pressure order. The last level of the sounding is only ever a window end, so the
// topmost level is dropped, which does not matter for a buoyancy integration that ends
// at the EL.
fn classify_levels(lvl0: AnalLevel, lvl1: AnalLevel, lcl_info: AnalLevel) -> LevelIter {
    let mut iter = LevelIter::default();
    let mut next_idx = 0usize;

    iter.vals[next_idx] = Some(AnalLevelType::Normal(lvl0));
    next_idx += 1;

    let AnalLevel {
        pcl_virt_t: pt0,
        env_virt_t: et0,
        pressure: p0,
        height: h0,
    } = lvl0;

    let AnalLevel {
        pcl_virt_t: pt1,
        env_virt_t: et1,
        pressure: p1,
        height: h1,
    } = lvl1;

    // Check to see if the parcel profile crossed over the environmental profile. Note
    // that this demarks a change in stability, either to stable or unstable.
    if (pt0 <= et0 && pt1 >= et1) || (pt0 >= et0 && pt1 <= et1) {
        let tgt_p = linear_interp(CelsiusDiff(0.0), pt0 - et0, pt1 - et1, p0, p1);
        let tgt_t = linear_interp(CelsiusDiff(0.0), pt0 - et0, pt1 - et1, pt0, pt1);
        let tgt_h = linear_interp(CelsiusDiff(0.0), pt0 - et0, pt1 - et1, h0, h1);

        let tgt_level = AnalLevel {
            pressure: tgt_p,
            height: tgt_h,
            pcl_virt_t: tgt_t,
            env_virt_t: tgt_t,
        };

        let tgt_level_type = if pt0 <= et0 && pt1 >= et1 {
            AnalLevelType::Lfc(tgt_level)
        } else {
            AnalLevelType::El(tgt_level)
        };

        iter.vals[next_idx] = Some(tgt_level_type);
        next_idx += 1;
    }

    // Check for the LCL, add it
    let AnalLevel {
        pressure: lcl_p, ..
    } = lcl_info;
    if p0 >= lcl_p && p1 < lcl_p {
        iter.vals[next_idx] = Some(AnalLevelType::Lcl(lcl_info));
    }

    // Sort the vals array in decreasing order by pressure
    iter.vals.sort_by(|a, b| {
        use AnalLevelType::*;

        let pa = match a {
            Some(Normal(p)) | Some(Lcl(p)) | Some(Lfc(p)) | Some(El(p)) => p.pressure,
            None => HectoPascal(0.0),
        };

        let pb = match b {
            Some(Normal(p)) | Some(Lcl(p)) | Some(Lfc(p)) | Some(El(p)) => p.pressure,
            None => HectoPascal(0.0),
        };

        // swap order of b and a to get a decreasing sort
        pb.partial_cmp(&pa).unwrap_or(Ordering::Equal)
    });

    iter
}

struct LevelIter {
    vals: [Option<AnalLevelType>; 3],
    next: usize,
}

impl Default for LevelIter {
    fn default() -> Self {
        LevelIter {
            vals: [None, None, None],
            next: 0,
        }
    }
}

impl Iterator for LevelIter {
    type Item = AnalLevelType;

    fn next(&mut self) -> Option<Self::Item> {
        let item = if self.next >= 3 {
            None
        } else {
            self.vals[self.next].take()
        };

        self.next += 1;
        item
    }
}

/// Convective available potential energy and convective inhibition of a parcel, J/kg.
///
/// Assumes the profile has virtual temperatures in it. The integration runs over
/// height with the trapezoid rule, accumulating positive buoyancy above the LFC as
/// CAPE and negative buoyancy below the EL as CIN.
fn cape_cin(
    profile: &ParcelProfile,
    lcl: Optioned<HectoPascal>,
    lfc: Optioned<HectoPascal>,
    el: Optioned<HectoPascal>,
) -> Result<(JpKg, JpKg)> {
    let (lfc, el) = if let (Some(lcl), Some(lfc), Some(el)) =
        (lcl.into_option(), lfc.into_option(), el.into_option())
    {
        if el < lcl {
            (lfc, el)
        } else {
            // No cloud, no moist convection
            return Ok((JpKg(0.0), JpKg(0.0)));
        }
    } else {
        return Err(AnalysisError::MissingValue);
    };

    let pressure = &profile.pressure;
    let height = &profile.height;
    let parcel_t = &profile.parcel_t;
    let env_t = &profile.environment_t;

    let (cape, cin) = izip!(pressure, height, parcel_t, env_t)
        .take_while(|(&p, _h, _pt, _et)| p >= el)
        .fold(
            ((0.0, 0.0), Meters(std::f64::MAX), Kelvin(0.0), Kelvin(0.0)),
            |acc, (&p, &h, &pt, &et)| {
                let ((mut cape, mut cin), prev_h, prev_pt, prev_et) = acc;

                let (pt, et) = (Kelvin::from(pt), Kelvin::from(et));

                let dz = h - prev_h;

                if dz <= Meters(0.0) {
                    // Must be just starting out, save the previous layer and move on
                    ((cape, cin), h, pt, et)
                } else {
                    let bouyancy = ((pt - et).unpack() / et.unpack()
                        + (prev_pt - prev_et).unpack() / prev_et.unpack())
                        * dz.unpack();
                    if bouyancy > 0.0 && p <= lfc {
                        cape += bouyancy;
                    } else if bouyancy < 0.0 {
                        cin += bouyancy;
                    }
                    ((cape, cin), h, pt, et)
                }
            },
        )
        .0;

    // 2.0 for the trapezoid rule, gravity to turn buoyancy into energy per mass.
    Ok((JpKg(cape / 2.0 * -metfor::g), JpKg(cin / 2.0 * -metfor::g)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parcel::surface_parcel;
    use crate::test_data::{make_stable_sounding, make_unstable_sounding};
    use metfor::Quantity;

    #[test]
    fn lcl_is_above_the_surface() {
        let snd = make_unstable_sounding();
        let pcl = surface_parcel(&snd).unwrap();

        let anal = lift_parcel(pcl, &snd).unwrap();

        let lcl = anal.lcl_pressure().unpack();
        assert!(lcl < pcl.pressure);
        assert!(lcl > HectoPascal(500.0));
    }

    #[test]
    fn unstable_sounding_has_positive_cape() {
        let snd = make_unstable_sounding();
        let pcl = surface_parcel(&snd).unwrap();

        let anal = lift_parcel(pcl, &snd).unwrap();

        let cape = anal.cape().unpack();
        let cin = anal.cin().unpack();

        assert!(cape > JpKg(0.0), "expected positive CAPE, got {:?}", cape);
        assert!(cin <= JpKg(0.0), "expected CIN <= 0, got {:?}", cin);
        assert!(anal.lfc_pressure().is_some());
        assert!(anal.el_pressure().is_some());
    }

    #[test]
    fn stable_sounding_has_no_cape() {
        let snd = make_stable_sounding();
        let pcl = surface_parcel(&snd).unwrap();

        let anal = lift_parcel(pcl, &snd).unwrap();

        let cape = anal.cape();
        if cape.is_some() {
            assert!(cape.unpack().unpack() < 1.0);
        }
    }

    #[test]
    fn profile_stays_sorted_by_decreasing_pressure() {
        let snd = make_unstable_sounding();
        let pcl = surface_parcel(&snd).unwrap();

        let anal = lift_parcel(pcl, &snd).unwrap();
        let profile = anal.profile();

        for pair in profile.pressure.windows(2) {
            assert!(pair[0] >= pair[1]);
        }

        assert_eq!(profile.pressure.len(), profile.height.len());
        assert_eq!(profile.pressure.len(), profile.parcel_t.len());
        assert_eq!(profile.pressure.len(), profile.environment_t.len());
    }
}
