//! Pressure-coordinate interpolation within a sounding.

use crate::{
    error::{AnalysisError, Result},
    sounding::{DataRow, Sounding},
};
use itertools::{izip, Itertools};
use metfor::{HectoPascal, MetersPSec, Quantity, WindSpdDir, WindUV};
use optional::Optioned;
use std::ops::Sub;

/// Interpolate values from the vertical sounding using pressure as the primary coordinate.
///
/// Returns a `DataRow` with all scalar values interpolated linearly in pressure and the
/// wind interpolated component-wise.
pub fn linear_interpolate_sounding(snd: &Sounding, tgt_p: HectoPascal) -> Result<DataRow> {
    let pressure: &[Optioned<HectoPascal>] = snd.pressure_profile();

    // Assumes the pressure profile is sorted in descending order, which holds for the
    // ascent phase of a flight.
    let bracket = pressure
        .iter()
        .enumerate()
        .filter_map(|(i, p_opt)| p_opt.into_option().map(|p| (i, p)))
        .tuple_windows::<(_, _)>()
        .find_map(|((i0, p0), (i1, p1))| {
            if (p0 - tgt_p).unpack().abs() < std::f64::EPSILON {
                Some((i0, i0))
            } else if (p1 - tgt_p).unpack().abs() < std::f64::EPSILON {
                Some((i1, i1))
            } else if p0 > tgt_p && p1 < tgt_p {
                Some((i0, i1))
            } else {
                None
            }
        });

    bracket
        .and_then(|(i0, i1)| {
            if i0 == i1 {
                snd.data_row(i0)
            } else {
                let row0 = snd.data_row(i0)?;
                let row1 = snd.data_row(i1)?;
                linear_interp_data_rows(row0, row1, tgt_p)
            }
        })
        .ok_or(AnalysisError::InterpolationError)
}

/// Interpolate values given two parallel vectors of data and a target value.
///
/// Assumes that `xs` is monotonic. Levels with a missing value on either side are
/// skipped, so the interpolation happens between the closest valid neighbors.
#[inline]
pub fn linear_interpolate<X, Y>(xs: &[Optioned<X>], ys: &[Optioned<Y>], target_x: X) -> Optioned<Y>
where
    X: Quantity + optional::Noned + PartialOrd + Sub<X>,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + optional::Noned + Sub<Y>,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_eq!(xs.len(), ys.len());

    let value_opt = izip!(xs, ys)
        .filter(|(x, y)| x.is_some() && y.is_some())
        .map(|(x, y)| (x.unpack(), y.unpack()))
        .tuple_windows::<(_, _)>()
        .find_map(|((x0, y0), (x1, y1))| {
            if (x0 - target_x).unpack().abs() < std::f64::EPSILON {
                Some(y0)
            } else if (x1 - target_x).unpack().abs() < std::f64::EPSILON {
                Some(y1)
            } else if (x0 < target_x && x1 > target_x) || (x0 > target_x && x1 < target_x) {
                Some(linear_interp(target_x, x0, x1, y0, y1))
            } else {
                None
            }
        });

    Optioned::from(value_opt)
}

#[inline]
pub(crate) fn linear_interp<X, Y>(x_val: X, x1: X, x2: X, y1: Y, y2: Y) -> Y
where
    X: Sub<X> + Copy + std::fmt::Debug + std::cmp::PartialEq,
    <X as Sub<X>>::Output: Quantity,
    Y: Quantity + Sub<Y>,
    <Y as Sub<Y>>::Output: Quantity,
{
    debug_assert_ne!(x1, x2);

    let run = (x2 - x1).unpack();
    let rise = (y2 - y1).unpack();
    let dx = (x_val - x1).unpack();

    Y::pack(y1.unpack() + dx * (rise / run))
}

#[inline]
fn linear_interp_data_rows(row0: DataRow, row1: DataRow, tgt_p: HectoPascal) -> Option<DataRow> {
    let p0 = row0.pressure.into_option()?;
    let p1 = row1.pressure.into_option()?;

    let run = p1 - p0;
    let dp = tgt_p - p0;

    let mut result = DataRow::default();
    result.pressure = Optioned::from(tgt_p);

    result.temperature = eval_linear_interp(row0.temperature, row1.temperature, run, dp);
    result.dew_point = eval_linear_interp(row0.dew_point, row1.dew_point, run, dp);
    result.height = eval_linear_interp(row0.height, row1.height, run, dp);

    // Relative humidity is a bare fraction, interpolate it directly.
    if let (Some(rh0), Some(rh1)) = (
        row0.relative_humidity.into_option(),
        row1.relative_humidity.into_option(),
    ) {
        result.relative_humidity =
            Optioned::from(rh0 + (rh1 - rh0) * (dp.unpack() / run.unpack()));
    }

    // Winds interpolate component-wise, not in speed/direction space.
    if let (Some(w_below), Some(w_above)) = (row0.wind.into_option(), row1.wind.into_option()) {
        let WindUV::<MetersPSec> {
            u: u_below,
            v: v_below,
        } = WindUV::from(w_below);
        let WindUV::<MetersPSec> {
            u: u_above,
            v: v_above,
        } = WindUV::from(w_above);

        let frac = dp.unpack() / run.unpack();
        let u = u_below + (u_above - u_below) * frac;
        let v = v_below + (v_above - v_below) * frac;

        let interped_wind = WindSpdDir::from(WindUV { u, v });

        result.wind = interped_wind.into();
    }

    Some(result)
}

#[inline]
fn eval_linear_interp<QX, Y>(
    low_val: Optioned<Y>,
    high_val: Optioned<Y>,
    run: QX,
    dp: QX,
) -> Optioned<Y>
where
    QX: Quantity + optional::Noned,
    Y: Quantity + optional::Noned,
{
    if low_val.is_some() && high_val.is_some() {
        let (val_below, val_above) = (low_val.unpack().unpack(), high_val.unpack().unpack());
        let rise = val_above - val_below;
        let run: f64 = run.unpack();
        let dp: f64 = dp.unpack();
        Optioned::from(Y::pack(val_below + dp * rise / run))
    } else {
        Optioned::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use metfor::Celsius;
    use optional::some;

    #[test]
    fn test_linear_interp() {
        let t = linear_interp(
            HectoPascal(900.0),
            HectoPascal(1000.0),
            HectoPascal(800.0),
            Celsius(20.0),
            Celsius(10.0),
        );
        assert!((t - Celsius(15.0)).unpack().abs() < 1.0e-12);
    }

    #[test]
    fn test_linear_interpolate_skips_missing() {
        let xs = vec![
            some(HectoPascal(1000.0)),
            optional::none(),
            some(HectoPascal(800.0)),
        ];
        let ys = vec![some(Celsius(20.0)), optional::none(), some(Celsius(10.0))];

        let y = linear_interpolate(&xs, &ys, HectoPascal(900.0));
        assert!((y.unpack() - Celsius(15.0)).unpack().abs() < 1.0e-12);
    }

    #[test]
    fn test_linear_interpolate_exact_level() {
        let xs = vec![some(HectoPascal(1000.0)), some(HectoPascal(800.0))];
        let ys = vec![some(Celsius(20.0)), some(Celsius(10.0))];

        let y = linear_interpolate(&xs, &ys, HectoPascal(800.0));
        assert_eq!(y.unpack(), Celsius(10.0));
    }
}
