#![warn(missing_docs)]
//! Ingest, analyze, and plot Skysonde radiosonde soundings.
//!
//! The crate takes one CSV file produced by a Skysonde ground station and turns it into
//! a skew-T log-P chart: quality control, unit tagging, derived dew point and wind
//! components, a surface parcel ascent with CAPE/CIN and the LCL, and rendering with
//! wind barbs and summary annotations.
//!
//! The stages are plain functions over a [`Sounding`], so they can be used separately:
//!
//! ```no_run
//! use skysonde_skewt::{
//!     analysis::{analyze_file, AnalysisOptions},
//!     plot::{render_svg, SkewTStyle},
//!     skysonde::SkysondeFormat,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let anl = analyze_file(
//!     "uprm033.csv",
//!     &SkysondeFormat::default(),
//!     &AnalysisOptions::default(),
//! )?;
//!
//! render_svg("uprm033.svg", &anl, &SkewTStyle::default(), (1000, 800))?;
//! # Ok(())
//! # }
//! ```

//
// API
//
pub use crate::{
    analysis::{analyze, analyze_file, AnalysisOptions, SkewTAnalysis},
    error::{AnalysisError, LoadError, PipelineError, Result},
    parcel::{surface_parcel, Parcel},
    parcel_profile::{lift_parcel, ParcelAscentAnalysis, ParcelProfile},
    sounding::{DataRow, Sounding},
};

pub mod analysis;
pub mod ascent;
mod error;
pub mod interpolation;
pub mod parcel;
pub mod parcel_profile;
pub mod plot;
pub mod profile;
pub mod skysonde;
pub mod sounding;
pub mod wind;

#[cfg(test)]
mod test_data;
