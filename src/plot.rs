//! Render an analyzed sounding as a skew-T log-P chart.
//!
//! The chart is drawn onto any plotters [`DrawingArea`], so it can target an SVG file,
//! an in-memory string, or anything else with a plotters backend. All series and
//! annotations come from a finished [`SkewTAnalysis`]; this module only maps data to
//! drawing primitives.
//!
//! Skew-T coordinates: the vertical axis is `ln(p_bottom / p)`, so pressure decreases
//! logarithmically upward. The horizontal axis is temperature sheared with height,
//! `x = t + slope * y`, which leans the isotherms 45 degrees to the right. At the
//! bottom edge the skewed coordinate equals the plain temperature, so the default
//! bottom axis labels read directly in degrees Celsius.

use crate::analysis::SkewTAnalysis;
use metfor::{Celsius, HectoPascal, Kelvin, Knots, Quantity, WindSpdDir};
use plotters::coord::{types::RangedCoordf64, Shift};
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

/// Visual parameters for the chart.
#[derive(Debug, Clone)]
pub struct SkewTStyle {
    /// Chart title.
    pub title: String,
    /// Pressure at the bottom edge of the chart.
    pub pressure_bottom: HectoPascal,
    /// Pressure at the top edge of the chart.
    pub pressure_top: HectoPascal,
    /// Temperature at the left edge of the bottom of the chart.
    pub t_min: Celsius,
    /// Temperature at the right edge of the bottom of the chart.
    pub t_max: Celsius,
    /// Mixing ratio guide lines to draw, in kg/kg.
    pub mixing_ratios: Vec<f64>,
}

impl Default for SkewTStyle {
    fn default() -> Self {
        SkewTStyle {
            title: "Sounding".to_owned(),
            pressure_bottom: HectoPascal(1000.0),
            pressure_top: HectoPascal(50.0),
            t_min: Celsius(-60.0),
            t_max: Celsius(40.0),
            mixing_ratios: vec![0.028, 0.024, 0.020, 0.016, 0.012, 0.008, 0.004],
        }
    }
}

// Maps (temperature, pressure) data onto the skewed chart plane and knows the visible
// window, so series can be clipped in data space before they reach the backend.
#[derive(Debug, Clone, Copy)]
struct SkewTCoords {
    p_bottom: f64,
    x_min: f64,
    x_max: f64,
    y_max: f64,
    slope: f64,
}

impl SkewTCoords {
    fn new(style: &SkewTStyle) -> Self {
        let p_bottom = style.pressure_bottom.unpack();
        let y_max = (p_bottom / style.pressure_top.unpack()).ln();
        // one full temperature span over the full height leans isotherms 45 degrees
        let slope = (style.t_max - style.t_min).unpack() / y_max;

        SkewTCoords {
            p_bottom,
            x_min: style.t_min.unpack(),
            x_max: style.t_max.unpack(),
            y_max,
            slope,
        }
    }

    fn y(&self, p: HectoPascal) -> f64 {
        (self.p_bottom / p.unpack()).ln()
    }

    fn x(&self, t: Celsius, p: HectoPascal) -> f64 {
        t.unpack() + self.slope * self.y(p)
    }

    fn point(&self, t: Celsius, p: HectoPascal) -> (f64, f64) {
        (self.x(t, p), self.y(p))
    }

    // plotters does not clip series to the axes, so everything gets filtered through
    // this before drawing
    fn visible(&self, (x, y): &(f64, f64)) -> bool {
        *x >= self.x_min && *x <= self.x_max && *y >= 0.0 && *y <= self.y_max
    }
}

type SkewTChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Draw the skew-T chart for `anl` onto `root`.
pub fn draw_skew_t<DB>(
    root: &DrawingArea<DB, Shift>,
    anl: &SkewTAnalysis,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let coords = SkewTCoords::new(style);

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(32)
        .y_label_area_size(0)
        .build_cartesian_2d(coords.x_min..coords.x_max, 0.0..coords.y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(11)
        .x_desc("Temperature (\u{00b0}C)")
        .label_style(("sans-serif", 14))
        .draw()?;

    draw_isotherms(&mut chart, &coords, style)?;
    draw_isobars(&mut chart, &coords, style)?;
    draw_dry_adiabats(&mut chart, &coords, style)?;
    draw_moist_adiabats(&mut chart, &coords, style)?;
    draw_mixing_ratio_lines(&mut chart, &coords, style)?;

    draw_shading(&mut chart, &coords, anl)?;
    draw_traces(&mut chart, &coords, anl)?;
    draw_barbs(&mut chart, &coords, anl)?;
    draw_lcl_marker(&mut chart, &coords, anl)?;
    draw_summary_text(&mut chart, &coords, anl)?;

    root.present()?;

    Ok(())
}

/// Render the chart to an SVG file.
pub fn render_svg<P: AsRef<Path>>(
    path: P,
    anl: &SkewTAnalysis,
    style: &SkewTStyle,
    dimensions: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path.as_ref(), dimensions).into_drawing_area();
    draw_skew_t(&root, anl, style)
}

// Pressures to sample background curves at, dense enough to look smooth on a log axis.
fn pressure_samples(style: &SkewTStyle) -> Vec<HectoPascal> {
    let bottom = style.pressure_bottom.unpack() as i64;
    let top = style.pressure_top.unpack() as i64;

    (top..=bottom)
        .rev()
        .step_by(10)
        .map(|p| HectoPascal(p as f64))
        .collect()
}

fn draw_isotherms<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor(210, 210, 210);
    let samples = pressure_samples(style);

    let mut t = -120.0;
    while t <= style.t_max.unpack() {
        let line: Vec<(f64, f64)> = samples
            .iter()
            .map(|&p| coords.point(Celsius(t), p))
            .filter(|pt| coords.visible(pt))
            .collect();
        chart.draw_series(LineSeries::new(line.into_iter(), &color))?;
        t += 10.0;
    }

    Ok(())
}

fn draw_isobars<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor(210, 210, 210);
    let label_style = ("sans-serif", 13).into_font().color(&RGBColor(90, 90, 90));

    let mut p = 1000.0;
    while p >= style.pressure_top.unpack() {
        let pressure = HectoPascal(p);
        if pressure <= style.pressure_bottom {
            let y = coords.y(pressure);
            chart.draw_series(LineSeries::new(
                vec![(coords.x_min, y), (coords.x_max, y)],
                &color,
            ))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.0}", p),
                (coords.x_min + 0.5, y),
                label_style.clone(),
            )))?;
        }
        p -= 100.0;
    }

    Ok(())
}

fn draw_dry_adiabats<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor(230, 190, 170);
    let samples = pressure_samples(style);

    let mut theta = 230.0;
    while theta <= 440.0 {
        let series: Vec<(f64, f64)> = samples
            .iter()
            .map(|&p| {
                let t = Celsius::from(metfor::temperature_from_pot_temp(Kelvin(theta), p));
                coords.point(t, p)
            })
            .filter(|pt| coords.visible(pt))
            .collect();
        chart.draw_series(LineSeries::new(series.into_iter(), &color))?;
        theta += 10.0;
    }

    Ok(())
}

fn draw_moist_adiabats<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor(170, 210, 190);
    let samples = pressure_samples(style);

    let mut theta_e = 250.0;
    while theta_e <= 400.0 {
        let series: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|&p| {
                metfor::temperature_from_equiv_pot_temp_saturated_and_pressure(p, Kelvin(theta_e))
                    .map(|t| coords.point(t, p))
            })
            .filter(|pt| coords.visible(pt))
            .collect();
        chart.draw_series(LineSeries::new(series.into_iter(), &color))?;
        theta_e += 10.0;
    }

    Ok(())
}

fn draw_mixing_ratio_lines<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    style: &SkewTStyle,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = RGBColor(110, 170, 110);
    let label_style = ("sans-serif", 13).into_font().color(&color);

    // Guide lines only span the lower troposphere where moisture matters.
    let samples: Vec<HectoPascal> = pressure_samples(style)
        .into_iter()
        .filter(|p| *p >= HectoPascal(600.0))
        .collect();

    for &mw in &style.mixing_ratios {
        let series: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|&p| metfor::dew_point_from_p_and_mw(p, mw).map(|dp| coords.point(dp, p)))
            .filter(|pt| coords.visible(pt))
            .collect();
        chart.draw_series(LineSeries::new(series.into_iter(), &color))?;
    }

    // Label every other line at the foot of the chart, in g/kg.
    for &mw in style.mixing_ratios.iter().step_by(2) {
        if let Some(dp) = metfor::dew_point_from_p_and_mw(style.pressure_bottom, mw) {
            let pt = coords.point(dp, style.pressure_bottom);
            if coords.visible(&pt) {
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.0}", mw * 1000.0),
                    (pt.0, 0.012),
                    label_style.clone(),
                )))?;
            }
        }
    }

    Ok(())
}

fn draw_traces<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    anl: &SkewTAnalysis,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let temperature = series_from_profiles(
        anl.ascent.pressure_profile(),
        anl.ascent.temperature_profile(),
        coords,
    );
    let dew_point = series_from_profiles(
        anl.ascent.pressure_profile(),
        anl.ascent.dew_point_profile(),
        coords,
    );

    chart.draw_series(LineSeries::new(temperature.into_iter(), RED.stroke_width(2)))?;
    chart.draw_series(LineSeries::new(dew_point.into_iter(), BLUE.stroke_width(2)))?;

    let profile = anl.parcel_ascent.profile();
    let parcel_series: Vec<(f64, f64)> = profile
        .pressure
        .iter()
        .zip(profile.parcel_t.iter())
        .map(|(&p, &t)| coords.point(t, p))
        .filter(|pt| coords.visible(pt))
        .collect();
    chart.draw_series(LineSeries::new(
        parcel_series.into_iter(),
        BLACK.stroke_width(2),
    ))?;

    Ok(())
}

fn series_from_profiles(
    pressure: &[optional::Optioned<HectoPascal>],
    values: &[optional::Optioned<Celsius>],
    coords: &SkewTCoords,
) -> Vec<(f64, f64)> {
    pressure
        .iter()
        .zip(values.iter())
        .filter_map(|(p_opt, v_opt)| {
            if p_opt.is_some() && v_opt.is_some() {
                Some(coords.point(v_opt.unpack(), p_opt.unpack()))
            } else {
                None
            }
        })
        .filter(|pt| coords.visible(pt))
        .collect()
}

// Shade CIN in blue from the bottom of the profile up to the LFC, and CAPE in red
// between the LFC and the EL. The lifted profile includes the crossing levels, so each
// region closes cleanly on the environment curve.
fn draw_shading<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    anl: &SkewTAnalysis,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let profile = anl.parcel_ascent.profile();

    let lfc = anl.parcel_ascent.lfc_pressure();
    let el = anl.parcel_ascent.el_pressure();

    if lfc.is_some() {
        let lfc = lfc.unpack();

        let bottom = profile
            .pressure
            .first()
            .copied()
            .unwrap_or(HectoPascal(0.0));
        shade_region(chart, coords, profile, lfc, bottom, BLUE.mix(0.25))?;

        if el.is_some() {
            shade_region(chart, coords, profile, el.unpack(), lfc, RED.mix(0.25))?;
        }
    }

    Ok(())
}

fn shade_region<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    profile: &crate::parcel_profile::ParcelProfile,
    p_top: HectoPascal,
    p_bottom: HectoPascal,
    color: RGBAColor,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let in_range = |p: &HectoPascal| *p <= p_bottom && *p >= p_top;

    let parcel_pts = profile
        .pressure
        .iter()
        .zip(profile.parcel_t.iter())
        .filter(|(p, _)| in_range(p))
        .map(|(&p, &t)| coords.point(t, p));

    let env_pts = profile
        .pressure
        .iter()
        .zip(profile.environment_t.iter())
        .filter(|(p, _)| in_range(p))
        .map(|(&p, &t)| coords.point(t, p))
        .rev();

    let polygon: Vec<(f64, f64)> = parcel_pts
        .chain(env_pts)
        .filter(|pt| coords.visible(pt))
        .collect();

    if polygon.len() >= 3 {
        chart.draw_series(std::iter::once(Polygon::new(polygon, color.filled())))?;
    }

    Ok(())
}

fn draw_barbs<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    anl: &SkewTAnalysis,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // Barbs stack along a fixed column near the right edge.
    let barb_x = coords.x_max - 3.0;

    for barb in &anl.barbs {
        let y = coords.y(barb.pressure);
        if !coords.visible(&(barb_x, y)) {
            continue;
        }

        let wind = WindSpdDir::<Knots>::from(barb.wind);
        let glyph = barb_polylines(wind.speed.unpack(), wind.direction);

        if glyph.is_empty() {
            // calm wind, draw a small open circle
            chart.draw_series(std::iter::once(
                EmptyElement::<(f64, f64), DB>::at((barb_x, y))
                    + Circle::new((0, 0), 3, BLACK.stroke_width(1)),
            ))?;
        } else {
            for polyline in glyph {
                chart.draw_series(std::iter::once(
                    EmptyElement::<(f64, f64), DB>::at((barb_x, y))
                        + PathElement::new(polyline, BLACK.stroke_width(1)),
                ))?;
            }
        }
    }

    Ok(())
}

// Build the polylines of a wind barb in pixel offsets around the station point.
// Standard convention: pennants are 50 kt, full barbs 10 kt, half barbs 5 kt, and the
// staff points toward the direction the wind blows from.
fn barb_polylines(speed_kt: f64, direction_deg: f64) -> Vec<Vec<(i32, i32)>> {
    let mut remaining = (speed_kt / 5.0).round() * 5.0;
    if remaining < 2.5 {
        return vec![];
    }

    let staff_len = 28.0;
    let tick_len = 9.0;
    let tick_space = 5.0;

    // screen coordinates: x right, y down; direction is degrees clockwise from north
    let dir = direction_deg.to_radians();
    let (ux, uy) = (dir.sin(), -dir.cos());
    // ticks extend clockwise off the staff
    let (tx, ty) = (-uy, ux);

    let at = |d: f64| (ux * d, uy * d);
    let px = |(x, y): (f64, f64)| (x.round() as i32, y.round() as i32);

    let mut lines = vec![vec![px((0.0, 0.0)), px(at(staff_len))]];

    let mut pos = staff_len;
    while remaining >= 50.0 {
        let base = at(pos);
        let next = at(pos - tick_space);
        let tip = (base.0 + tx * tick_len, base.1 + ty * tick_len);
        lines.push(vec![px(base), px(tip), px(next)]);
        remaining -= 50.0;
        pos -= tick_space + 2.0;
    }
    while remaining >= 10.0 {
        let base = at(pos);
        let tip = (base.0 + tx * tick_len, base.1 + ty * tick_len);
        lines.push(vec![px(base), px(tip)]);
        remaining -= 10.0;
        pos -= tick_space;
    }
    if remaining >= 5.0 {
        // half barbs never sit at the very tip of the staff
        if (pos - staff_len).abs() < f64::EPSILON {
            pos -= tick_space;
        }
        let base = at(pos);
        let tip = (base.0 + tx * tick_len * 0.5, base.1 + ty * tick_len * 0.5);
        lines.push(vec![px(base), px(tip)]);
    }

    lines
}

fn draw_lcl_marker<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    anl: &SkewTAnalysis,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let pt = coords.point(anl.lcl_temperature, anl.lcl_pressure);
    if coords.visible(&pt) {
        chart.draw_series(std::iter::once(Circle::new(pt, 4, BLACK.filled())))?;
    }

    Ok(())
}

fn draw_summary_text<DB>(
    chart: &mut SkewTChart<DB>,
    coords: &SkewTCoords,
    anl: &SkewTAnalysis,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let text_style = ("sans-serif", 15).into_font().color(&BLACK);

    let format_energy = |value: optional::Optioned<metfor::JpKg>| {
        value
            .into_option()
            .map(|v| format!("{:.1}", v.unpack()))
            .unwrap_or_else(|| "n/a".to_owned())
    };

    let lines = [
        format!(
            "LCL: {:.1} \u{00b0}C, {:.1} hPa",
            anl.lcl_temperature.unpack(),
            anl.lcl_pressure.unpack()
        ),
        format!("CAPE: {} J/kg", format_energy(anl.parcel_ascent.cape())),
        format!("CIN: {} J/kg", format_energy(anl.parcel_ascent.cin())),
    ];

    let x = coords.x_min + 2.0;
    for (i, line) in lines.iter().enumerate() {
        let y = coords.y_max * (0.97 - 0.025 * i as f64);
        chart.draw_series(std::iter::once(Text::new(
            line.clone(),
            (x, y),
            text_style.clone(),
        )))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skewed_x_equals_temperature_at_the_bottom() {
        let style = SkewTStyle::default();
        let coords = SkewTCoords::new(&style);

        let (x, y) = coords.point(Celsius(20.0), style.pressure_bottom);
        assert!((x - 20.0).abs() < 1.0e-12);
        assert!(y.abs() < 1.0e-12);
    }

    #[test]
    fn isotherms_lean_right_with_height() {
        let style = SkewTStyle::default();
        let coords = SkewTCoords::new(&style);

        let bottom = coords.x(Celsius(0.0), style.pressure_bottom);
        let top = coords.x(Celsius(0.0), style.pressure_top);
        assert!(top > bottom);
    }

    #[test]
    fn calm_wind_has_no_barb_lines() {
        assert!(barb_polylines(1.0, 180.0).is_empty());
    }

    #[test]
    fn barb_tick_counts_follow_the_convention() {
        // 65 kt -> one pennant, one full barb, one half barb, plus the staff
        let lines = barb_polylines(65.0, 270.0);
        assert_eq!(lines.len(), 4);

        // 20 kt -> two full barbs plus the staff
        let lines = barb_polylines(20.0, 90.0);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn points_outside_the_window_are_not_visible() {
        let style = SkewTStyle::default();
        let coords = SkewTCoords::new(&style);

        assert!(coords.visible(&(0.0, 1.0)));
        assert!(!coords.visible(&(-100.0, 1.0)));
        assert!(!coords.visible(&(0.0, coords.y_max + 1.0)));
    }
}
