//! End-to-end test: a synthetic Skysonde CSV through ingest, analysis, and rendering.

use metfor::Quantity;
use skysonde_skewt::{
    analysis::{analyze, AnalysisOptions},
    plot::{draw_skew_t, SkewTStyle},
    skysonde::{read_sounding, SkysondeFormat},
};
use plotters::prelude::*;

const PREAMBLE_ROWS: usize = 105;
const TOTAL_COLS: usize = 36;

// Build a CSV in the real station layout: a long preamble, 36 columns, the six
// interesting ones at their production indices, sentinels and duplicate pressures
// sprinkled in, and a descent tail after the burst.
fn synthetic_flight_csv() -> String {
    let format = SkysondeFormat::default();
    let mut out = String::new();

    for i in 0..PREAMBLE_ROWS {
        out.push_str(&format!("preamble,{},config\n", i));
    }

    let mut push_row = |height_km: f64, p: f64, t: f64, rh: f64, dir: f64, spd: f64| {
        let mut fields = vec!["0".to_string(); TOTAL_COLS];
        fields[format.height_col] = format!("{:.3}", height_km);
        fields[format.pressure_col] = if p < 0.0 {
            format.missing.clone()
        } else {
            format!("{:.1}", p)
        };
        fields[format.temperature_col] = format!("{:.2}", t);
        fields[format.humidity_col] = format!("{:.1}", rh);
        fields[format.direction_col] = format!("{:.1}", dir);
        fields[format.speed_col] = format!("{:.2}", spd);
        out.push_str(&fields.join(","));
        out.push('\n');
    };

    // ascent: 1010 hPa down to 110 hPa
    for i in 0..226 {
        let p = 1010.0 - 4.0 * f64::from(i);
        let h_km = 44.33 * (1.0 - (p / 1013.25).powf(0.190_3));
        let t = (29.0 - 6.8 * h_km).max(-60.0);
        let rh = if p > 750.0 { 82.0 } else { 38.0 };
        let dir = (150.0 + f64::from(i)) % 360.0;
        let spd = 3.0 + 0.08 * f64::from(i);

        push_row(h_km, p, t, rh, dir, spd);

        // a duplicated pressure and a sentinel dropout early in the flight
        if i == 10 {
            push_row(h_km, p, t - 0.2, rh, dir, spd);
        }
        if i == 20 {
            push_row(h_km, -1.0, t, rh, dir, spd);
        }
    }

    // burst: the payload falls and pressure rises again; the half-hPa offset keeps
    // these rows clear of the pressures already seen on the way up
    for i in 0..30 {
        let p = 110.5 + 12.0 * f64::from(i);
        let h_km = 44.33 * (1.0 - (p / 1013.25).powf(0.190_3));
        push_row(h_km, p, -55.0, 30.0, 200.0, 10.0);
    }

    out
}

#[test]
fn full_pipeline_from_csv_to_chart() {
    let csv = synthetic_flight_csv();
    let snd = read_sounding(csv.as_bytes(), &SkysondeFormat::default()).unwrap();

    // quality control dropped the sentinel row and the duplicate pressure
    let pressures: Vec<f64> = snd
        .pressure_profile()
        .iter()
        .map(|p| p.unpack().unpack())
        .collect();
    assert_eq!(pressures.len(), 256);
    for (i, p) in pressures.iter().enumerate() {
        assert!(
            !pressures[(i + 1)..].contains(p),
            "duplicate pressure {} survived cleaning",
            p
        );
    }

    let anl = analyze(snd, &AnalysisOptions::default()).unwrap();

    // LCL from the warm moist surface sample sits below the surface pressure level
    assert!(anl.lcl_pressure.unpack() < 1010.0);
    assert!(anl.lcl_pressure.unpack() > 700.0);

    // the ascent sounding is strictly decreasing in pressure, descent tail gone
    let ascent_p: Vec<f64> = anl
        .ascent
        .pressure_profile()
        .iter()
        .map(|p| p.unpack().unpack())
        .collect();
    assert!(ascent_p.len() > 10);
    for w in ascent_p.windows(2) {
        assert!(w[0] > w[1]);
    }
    assert!(*ascent_p.last().unwrap() >= 110.0);

    // a warm moist surface under a steep lapse rate has CAPE
    let cape = anl.parcel_ascent.cape();
    assert!(cape.is_some());
    assert!(cape.unpack().unpack() > 0.0);

    let cin = anl.parcel_ascent.cin();
    assert!(cin.is_some());
    assert!(cin.unpack().unpack() <= 0.0);

    // barbs: no duplicate levels, and no more than one per target
    let barb_p: Vec<f64> = anl.barbs.iter().map(|b| b.pressure.unpack()).collect();
    assert!(!barb_p.is_empty());
    assert!(barb_p.len() <= 36);
    for (i, p) in barb_p.iter().enumerate() {
        assert!(!barb_p[(i + 1)..].contains(p));
    }

    // rendering smoke test against an in-memory SVG backend
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (1000, 800)).into_drawing_area();
        draw_skew_t(&root, &anl, &SkewTStyle::default()).unwrap();
    }
    assert!(svg.contains("<svg"));
    assert!(svg.contains("polyline") || svg.contains("path"));
}

#[test]
fn thinning_preserves_the_analysis_shape() {
    let csv = synthetic_flight_csv();
    let snd = read_sounding(csv.as_bytes(), &SkysondeFormat::default()).unwrap();

    let dense = analyze(
        snd.clone(),
        &AnalysisOptions {
            thin_step: 1,
            ..AnalysisOptions::default()
        },
    )
    .unwrap();
    let thin = analyze(snd, &AnalysisOptions::default()).unwrap();

    // thinning must not move the LCL, it comes from the full-resolution series
    assert!((dense.lcl_pressure - thin.lcl_pressure).unpack().abs() < 1.0e-9);

    // CAPE estimates agree loosely between resolutions
    let cape_dense = dense.parcel_ascent.cape().unpack().unpack();
    let cape_thin = thin.parcel_ascent.cape().unpack().unpack();
    assert!((cape_dense - cape_thin).abs() < 0.5 * cape_dense.max(cape_thin));
}
