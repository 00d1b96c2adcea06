//! Data type and methods to store a radiosonde sounding.

use metfor::{Celsius, HectoPascal, Meters, MetersPSec, WindSpdDir};
use optional::Optioned;

pub use self::data_row::DataRow;

mod data_row;

/// A single radiosonde flight.
///
/// The profile variables are stored in parallel vectors, all of the same length and
/// index-aligned to the same sample. A missing value at a level is a `none` in the
/// corresponding vector. Quality controlled soundings produced by the
/// [`skysonde`](crate::skysonde) module have no missing values and no duplicate pressures,
/// but that is not an invariant of this type itself.
#[derive(Clone, Debug, Default)]
pub struct Sounding {
    // Description of the source of the sounding, eg a file name.
    source: Option<String>,

    // Profiles
    pressure: Vec<Optioned<HectoPascal>>,
    temperature: Vec<Optioned<Celsius>>,
    dew_point: Vec<Optioned<Celsius>>,
    relative_humidity: Vec<Optioned<f64>>,
    height: Vec<Optioned<Meters>>,
    wind: Vec<Optioned<WindSpdDir<MetersPSec>>>,
}

macro_rules! make_profile_accessors {
    ($(#[$set_attr:meta])* => $setter:tt, $(#[$get_attr:meta])* => $getter:tt,
     $inner_type:ty, $p_var:ident) => {
        $(#[$set_attr])*
        #[inline]
        pub fn $setter(self, profile: Vec<Optioned<$inner_type>>) -> Self {
            Self { $p_var: profile, ..self }
        }

        $(#[$get_attr])*
        #[inline]
        pub fn $getter(&self) -> &[Optioned<$inner_type>] {
            &self.$p_var
        }
    };
}

impl Sounding {
    /// Create a new sounding with empty profiles. This is a proxy for default with a
    /// clearer name.
    #[inline]
    pub fn new() -> Self {
        Sounding::default()
    }

    /// Add a source description to this sounding.
    #[inline]
    pub fn with_source_description<S>(mut self, desc: S) -> Self
    where
        Option<String>: From<S>,
    {
        self.source = Option::from(desc);
        self
    }

    /// Retrieve the source description for this sounding.
    #[inline]
    pub fn source_description(&self) -> Option<&str> {
        self.source.as_deref()
    }

    make_profile_accessors!(
        /// Builder method for the pressure profile.
        => with_pressure_profile,
        /// Get the pressure profile.
        => pressure_profile,
        HectoPascal, pressure
    );

    make_profile_accessors!(
        /// Builder method for the temperature profile.
        => with_temperature_profile,
        /// Get the temperature profile.
        => temperature_profile,
        Celsius, temperature
    );

    make_profile_accessors!(
        /// Builder method for the dew point profile.
        => with_dew_point_profile,
        /// Get the dew point profile.
        => dew_point_profile,
        Celsius, dew_point
    );

    make_profile_accessors!(
        /// Builder method for the relative humidity profile, fractions in 0.0 to 1.0.
        => with_relative_humidity_profile,
        /// Get the relative humidity profile.
        => relative_humidity_profile,
        f64, relative_humidity
    );

    make_profile_accessors!(
        /// Builder method for the height profile.
        => with_height_profile,
        /// Get the height profile.
        => height_profile,
        Meters, height
    );

    make_profile_accessors!(
        /// Builder method for the wind profile.
        => with_wind_profile,
        /// Get the wind profile.
        => wind_profile,
        WindSpdDir<MetersPSec>, wind
    );

    /// Number of levels in the sounding.
    ///
    /// This is the length of the longest profile vector, since profiles that were never
    /// supplied are left empty rather than filled with missing values.
    #[inline]
    pub fn len(&self) -> usize {
        self.pressure
            .len()
            .max(self.temperature.len())
            .max(self.dew_point.len())
            .max(self.relative_humidity.len())
            .max(self.height.len())
            .max(self.wind.len())
    }

    /// `true` if there are no levels at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a row of data values from this sounding.
    #[inline]
    pub fn data_row(&self, idx: usize) -> Option<DataRow> {
        if idx >= self.len() {
            return None;
        }

        fn copy_opt<T: Copy + optional::Noned>(vec: &[Optioned<T>], idx: usize) -> Optioned<T> {
            vec.get(idx).copied().unwrap_or_else(optional::none)
        }

        Some(DataRow {
            pressure: copy_opt(&self.pressure, idx),
            temperature: copy_opt(&self.temperature, idx),
            dew_point: copy_opt(&self.dew_point, idx),
            relative_humidity: copy_opt(&self.relative_humidity, idx),
            height: copy_opt(&self.height, idx),
            wind: copy_opt(&self.wind, idx),
        })
    }

    /// Get an iterator over the data rows of this sounding starting at the surface.
    #[inline]
    pub fn bottom_up(&self) -> impl Iterator<Item = DataRow> + '_ {
        (0..self.len()).filter_map(move |idx| self.data_row(idx))
    }

    /// Build a new sounding from a contiguous range of levels of this one.
    ///
    /// Profiles that were never supplied stay empty. The source description and launch
    /// date carry over. Ranges that reach past the end are clipped.
    pub fn sliced(&self, range: std::ops::Range<usize>) -> Self {
        fn slice_of<T: Copy + optional::Noned>(
            vec: &[Optioned<T>],
            range: &std::ops::Range<usize>,
        ) -> Vec<Optioned<T>> {
            let start = range.start.min(vec.len());
            let end = range.end.min(vec.len());
            vec[start..end].to_vec()
        }

        Sounding {
            source: self.source.clone(),
            pressure: slice_of(&self.pressure, &range),
            temperature: slice_of(&self.temperature, &range),
            dew_point: slice_of(&self.dew_point, &range),
            relative_humidity: slice_of(&self.relative_humidity, &range),
            height: slice_of(&self.height, &range),
            wind: slice_of(&self.wind, &range),
        }
    }

    /// Build a new sounding keeping only every `step`th level of this one.
    ///
    /// The first level is always kept. A `step` of zero or one returns a plain clone.
    pub fn thinned(&self, step: usize) -> Self {
        if step <= 1 {
            return self.clone();
        }

        fn thin_of<T: Copy + optional::Noned>(
            vec: &[Optioned<T>],
            step: usize,
        ) -> Vec<Optioned<T>> {
            vec.iter().step_by(step).copied().collect()
        }

        Sounding {
            source: self.source.clone(),
            pressure: thin_of(&self.pressure, step),
            temperature: thin_of(&self.temperature, step),
            dew_point: thin_of(&self.dew_point, step),
            relative_humidity: thin_of(&self.relative_humidity, step),
            height: thin_of(&self.height, step),
            wind: thin_of(&self.wind, step),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use metfor::{Celsius, HectoPascal};
    use optional::some;

    fn make_test_sounding() -> Sounding {
        let pressure = vec![1000.0, 925.0, 850.0, 700.0, 500.0]
            .into_iter()
            .map(HectoPascal)
            .map(some)
            .collect();
        let temperature = vec![20.0, 15.0, 10.0, 0.0, -15.0]
            .into_iter()
            .map(Celsius)
            .map(some)
            .collect();

        Sounding::new()
            .with_pressure_profile(pressure)
            .with_temperature_profile(temperature)
    }

    #[test]
    fn data_row_is_index_aligned() {
        let snd = make_test_sounding();

        let row = snd.data_row(2).unwrap();
        assert_eq!(row.pressure, some(HectoPascal(850.0)));
        assert_eq!(row.temperature, some(Celsius(10.0)));
        assert!(row.dew_point.is_none());

        assert!(snd.data_row(5).is_none());
    }

    #[test]
    fn sliced_clips_to_available_levels() {
        let snd = make_test_sounding();

        let sub = snd.sliced(2..10);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.pressure_profile()[0], some(HectoPascal(850.0)));
    }

    #[test]
    fn thinned_keeps_first_level() {
        let snd = make_test_sounding();

        let thin = snd.thinned(2);
        assert_eq!(thin.len(), 3);
        assert_eq!(thin.pressure_profile()[0], some(HectoPascal(1000.0)));
        assert_eq!(thin.pressure_profile()[1], some(HectoPascal(850.0)));
        assert_eq!(thin.pressure_profile()[2], some(HectoPascal(500.0)));
    }
}
