//! Ingest and quality control for Skysonde ground-station CSV files.
//!
//! The ground station writes one very wide CSV per flight with a long preamble of
//! configuration lines before the data section. Only six of the columns matter for a
//! skew-T analysis, and the station writes a sentinel token instead of leaving a field
//! blank when a sensor dropped out. This module turns that file into a [`Sounding`]:
//!
//!  1. skip the preamble, select the six columns, map the sentinel to missing,
//!  2. drop every record with a missing value in a selected column,
//!  3. drop records that repeat an already-seen pressure, keeping the first occurrence,
//!  4. attach units and pack the survivors into parallel profiles.
//!
//! Record order is never changed, so the profiles remain in launch-time order.

use crate::{
    error::LoadError,
    sounding::Sounding,
};
use metfor::{Celsius, HectoPascal, Km, Meters, MetersPSec, WindSpdDir};
use optional::{some, Optioned};
use std::{collections::HashSet, fs::File, io::Read, path::Path};

/// Layout of a Skysonde CSV file.
///
/// The defaults match the UPRM ground station. All column indices are zero-based
/// positions in the raw file.
#[derive(Debug, Clone)]
pub struct SkysondeFormat {
    /// Number of preamble lines before the data section.
    pub skip_rows: usize,
    /// Column with the balloon height in km.
    pub height_col: usize,
    /// Column with the pressure in hPa.
    pub pressure_col: usize,
    /// Column with the temperature in \u{00b0}C.
    pub temperature_col: usize,
    /// Column with the relative humidity in percent.
    pub humidity_col: usize,
    /// Column with the wind direction in degrees.
    pub direction_col: usize,
    /// Column with the wind speed in m/s.
    pub speed_col: usize,
    /// Token the station writes for a missing value.
    pub missing: String,
}

impl Default for SkysondeFormat {
    fn default() -> Self {
        SkysondeFormat {
            skip_rows: 105,
            height_col: 5,
            pressure_col: 6,
            temperature_col: 7,
            humidity_col: 9,
            direction_col: 34,
            speed_col: 33,
            missing: "99999".to_owned(),
        }
    }
}

impl SkysondeFormat {
    fn max_col(&self) -> usize {
        self.height_col
            .max(self.pressure_col)
            .max(self.temperature_col)
            .max(self.humidity_col)
            .max(self.direction_col)
            .max(self.speed_col)
    }
}

// One data record with the selected columns parsed, before quality control.
#[derive(Debug, Clone, Copy, Default)]
struct RawRecord {
    height_km: Option<f64>,
    pressure_hpa: Option<f64>,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
    direction_deg: Option<f64>,
    speed_mps: Option<f64>,
}

impl RawRecord {
    fn is_complete(&self) -> bool {
        self.height_km.is_some()
            && self.pressure_hpa.is_some()
            && self.temperature_c.is_some()
            && self.humidity_pct.is_some()
            && self.direction_deg.is_some()
            && self.speed_mps.is_some()
    }
}

/// Load a sounding from a Skysonde CSV file on disk.
///
/// The file name becomes the sounding's source description.
pub fn load_file<P: AsRef<Path>>(path: P, format: &SkysondeFormat) -> Result<Sounding, LoadError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let snd = read_sounding(file, format)?;

    Ok(snd.with_source_description(path.to_string_lossy().into_owned()))
}

/// Read a sounding from anything readable in the Skysonde CSV layout.
pub fn read_sounding<R: Read>(rdr: R, format: &SkysondeFormat) -> Result<Sounding, LoadError> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);

    let mut raw: Vec<RawRecord> = Vec::new();
    for (rec_num, record) in csv_rdr.records().skip(format.skip_rows).enumerate() {
        let record = record?;
        raw.push(parse_record(&record, rec_num, format)?);
    }

    let total = raw.len();
    let cleaned = quality_control(raw);
    tracing::debug!(
        total,
        kept = cleaned.len(),
        "quality controlled sounding records"
    );

    Ok(build_sounding(cleaned))
}

fn parse_record(
    record: &csv::StringRecord,
    rec_num: usize,
    format: &SkysondeFormat,
) -> Result<RawRecord, LoadError> {
    if record.len() <= format.max_col() {
        return Err(LoadError::ShortRecord(rec_num, format.max_col() + 1));
    }

    let field = |col: usize| -> Result<Option<f64>, LoadError> {
        let text = record.get(col).unwrap_or("").trim();

        if text.is_empty() || text == format.missing {
            return Ok(None);
        }

        text.parse::<f64>()
            .map(Some)
            .map_err(|_| LoadError::BadValue {
                record: rec_num,
                column: col,
                value: text.to_owned(),
            })
    };

    Ok(RawRecord {
        height_km: field(format.height_col)?,
        pressure_hpa: field(format.pressure_col)?,
        temperature_c: field(format.temperature_col)?,
        humidity_pct: field(format.humidity_col)?,
        direction_deg: field(format.direction_col)?,
        speed_mps: field(format.speed_col)?,
    })
}

// Drop records with any missing selected value, then drop records repeating an
// already-seen pressure. First occurrence wins and order is preserved.
fn quality_control(raw: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen_pressures: HashSet<u64> = HashSet::new();

    raw.into_iter()
        .filter(RawRecord::is_complete)
        .filter(|rec| {
            let key = rec.pressure_hpa.unwrap_or(f64::NAN).to_bits();
            seen_pressures.insert(key)
        })
        .collect()
}

// Attach units and pack the records into parallel profiles. Relative humidity comes in
// as a percent and is stored as a fraction.
fn build_sounding(records: Vec<RawRecord>) -> Sounding {
    let mut pressure: Vec<Optioned<HectoPascal>> = Vec::with_capacity(records.len());
    let mut temperature: Vec<Optioned<Celsius>> = Vec::with_capacity(records.len());
    let mut relative_humidity: Vec<Optioned<f64>> = Vec::with_capacity(records.len());
    let mut height: Vec<Optioned<Meters>> = Vec::with_capacity(records.len());
    let mut wind: Vec<Optioned<WindSpdDir<MetersPSec>>> = Vec::with_capacity(records.len());

    for rec in records {
        // quality_control only lets complete records through
        let (h, p, t, rh, dir, spd) = match (
            rec.height_km,
            rec.pressure_hpa,
            rec.temperature_c,
            rec.humidity_pct,
            rec.direction_deg,
            rec.speed_mps,
        ) {
            (Some(h), Some(p), Some(t), Some(rh), Some(dir), Some(spd)) => {
                (h, p, t, rh, dir, spd)
            }
            _ => continue,
        };

        pressure.push(some(HectoPascal(p)));
        temperature.push(some(Celsius(t)));
        relative_humidity.push(some(rh / 100.0));
        height.push(some(Meters::from(Km(h))));
        wind.push(some(WindSpdDir {
            speed: MetersPSec(spd),
            direction: dir,
        }));
    }

    Sounding::new()
        .with_pressure_profile(pressure)
        .with_temperature_profile(temperature)
        .with_relative_humidity_profile(relative_humidity)
        .with_height_profile(height)
        .with_wind_profile(wind)
}
