//! The end-to-end analysis pipeline: one pure function from a cleaned sounding to
//! everything the skew-T needs.

use crate::{
    ascent::truncate_to_ascent,
    error::{AnalysisError, PipelineError, Result},
    parcel::surface_parcel,
    parcel_profile::{lift_parcel, ParcelAscentAnalysis},
    profile::dew_point_from_relative_humidity,
    skysonde::{load_file, SkysondeFormat},
    sounding::Sounding,
    wind::{barb_points, BarbPoint, BarbSpacing},
};
use metfor::{Celsius, HectoPascal, Quantity};
use std::path::Path;

/// Tuning knobs for the analysis pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Keep every Nth sample before plotting, to thin the very dense raw record.
    pub thin_step: usize,
    /// Target levels for wind barbs.
    pub barb_spacing: BarbSpacing,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            thin_step: 5,
            barb_spacing: BarbSpacing::default(),
        }
    }
}

/// Everything computed for one flight.
#[derive(Debug, Clone)]
pub struct SkewTAnalysis {
    /// The quality controlled sounding at full resolution, dew point attached.
    pub sounding: Sounding,
    /// The thinned, ascent-only sounding that actually gets plotted.
    pub ascent: Sounding,
    /// The surface parcel lifted through the ascent sounding, with CAPE/CIN.
    pub parcel_ascent: ParcelAscentAnalysis,
    /// LCL pressure from the first sample of the full-resolution sounding.
    pub lcl_pressure: HectoPascal,
    /// LCL temperature from the first sample of the full-resolution sounding.
    pub lcl_temperature: Celsius,
    /// Wind barbs selected from the ascent sounding.
    pub barbs: Vec<BarbPoint>,
}

/// Run the full analysis on a cleaned sounding.
///
/// Stages: derive the dew point profile, find the LCL of the surface sample, thin,
/// truncate to the ascent phase, lift the surface parcel, and pick barb levels. The
/// input sounding is expected to already be quality controlled, see
/// [`skysonde`](crate::skysonde).
pub fn analyze(snd: Sounding, options: &AnalysisOptions) -> Result<SkewTAnalysis> {
    if snd.is_empty() {
        return Err(AnalysisError::NoDataProfile);
    }
    tracing::debug!(source = snd.source_description(), "analyzing sounding");

    // Attach the derived dew point profile.
    let dew_point = dew_point_from_relative_humidity(&snd);
    if dew_point.is_empty() {
        return Err(AnalysisError::MissingProfile);
    }
    let snd = snd.with_dew_point_profile(dew_point);

    // The LCL comes from the first sample of the cleaned series, before any thinning
    // or truncation.
    let sfc = surface_parcel(&snd)?;
    let (lcl_pressure, lcl_temperature) = metfor::pressure_and_temperature_at_lcl(
        sfc.temperature,
        sfc.dew_point,
        sfc.pressure,
    )
    .ok_or(AnalysisError::MetForError)?;
    let lcl_temperature = Celsius::from(lcl_temperature);

    // Thin for plotting, then keep the ascent only.
    let ascent = truncate_to_ascent(&snd.thinned(options.thin_step))?;
    tracing::debug!(
        full_levels = snd.len(),
        ascent_levels = ascent.len(),
        "reduced sounding for plotting"
    );

    // Parcel analysis over the ascent phase.
    let parcel_ascent = lift_parcel(surface_parcel(&ascent)?, &ascent)?;
    tracing::info!(
        lcl_hpa = lcl_pressure.unpack(),
        cape_jpkg = parcel_ascent.cape().into_option().map(|c| c.unpack()),
        cin_jpkg = parcel_ascent.cin().into_option().map(|c| c.unpack()),
        "parcel analysis complete"
    );

    let barbs = barb_points(&ascent, options.barb_spacing);

    Ok(SkewTAnalysis {
        sounding: snd,
        ascent,
        parcel_ascent,
        lcl_pressure,
        lcl_temperature,
        barbs,
    })
}

/// Load a Skysonde CSV file and run the full analysis on it.
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    format: &SkysondeFormat,
    options: &AnalysisOptions,
) -> std::result::Result<SkewTAnalysis, PipelineError> {
    let snd = load_file(path, format)?;
    let anl = analyze(snd, options)?;
    Ok(anl)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::make_unstable_sounding;
    use metfor::{MetersPSec, WindSpdDir};
    use optional::{none, some, Optioned};

    // The synthetic soundings carry dew point directly. The pipeline derives it from
    // relative humidity, so convert one and bolt on wind and a descent tail.
    fn make_pipeline_sounding() -> Sounding {
        let snd = make_unstable_sounding();

        let rh: Vec<Optioned<f64>> = snd
            .temperature_profile()
            .iter()
            .zip(snd.dew_point_profile().iter())
            .map(|(t, dp)| {
                if t.is_some() && dp.is_some() {
                    Optioned::from(metfor::rh(t.unpack(), dp.unpack()))
                } else {
                    none()
                }
            })
            .collect();

        let wind: Vec<Optioned<WindSpdDir<MetersPSec>>> = (0..snd.len())
            .map(|i| {
                some(WindSpdDir {
                    speed: MetersPSec(5.0 + 0.5 * i as f64),
                    direction: 270.0,
                })
            })
            .collect();

        // a short descent tail so the truncation has something to find
        let mut pressure = snd.pressure_profile().to_vec();
        pressure.push(some(metfor::HectoPascal(150.0)));
        pressure.push(some(metfor::HectoPascal(200.0)));

        let mut temperature = snd.temperature_profile().to_vec();
        temperature.extend_from_slice(&[none(), none()]);
        let mut rh = rh;
        rh.extend_from_slice(&[none(), none()]);
        let mut height = snd.height_profile().to_vec();
        height.extend_from_slice(&[none(), none()]);
        let mut wind = wind;
        wind.extend_from_slice(&[none(), none()]);

        Sounding::new()
            .with_pressure_profile(pressure)
            .with_temperature_profile(temperature)
            .with_relative_humidity_profile(rh)
            .with_height_profile(height)
            .with_wind_profile(wind)
    }

    #[test]
    fn pipeline_produces_a_complete_analysis() {
        let snd = make_pipeline_sounding();

        let options = AnalysisOptions {
            thin_step: 1,
            ..AnalysisOptions::default()
        };
        let anl = analyze(snd, &options).unwrap();

        assert!(anl.lcl_pressure < metfor::HectoPascal(1000.0));
        assert!(anl.parcel_ascent.cape().is_some());
        assert!(!anl.barbs.is_empty());

        // ascent sounding lost the spin-up samples and the descent tail
        assert!(anl.ascent.len() < anl.sounding.len());
        for pair in anl
            .ascent
            .pressure_profile()
            .windows(2)
            .map(|w| (w[0], w[1]))
        {
            assert!(pair.0.unpack() > pair.1.unpack());
        }
    }

    #[test]
    fn empty_sounding_is_rejected() {
        let result = analyze(Sounding::new(), &AnalysisOptions::default());
        assert_eq!(result.unwrap_err(), AnalysisError::NoDataProfile);
    }
}
