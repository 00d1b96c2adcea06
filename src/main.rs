//! Command line front-end: one Skysonde CSV in, one skew-T PNG out.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use skysonde_skewt::{
    analysis::{analyze_file, AnalysisOptions},
    plot::{render_svg, SkewTStyle},
    skysonde::SkysondeFormat,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "skysonde-skewt", about = "Plot a Skysonde radiosonde CSV as a skew-T")]
struct Cli {
    /// Path to the Skysonde CSV file.
    csv: PathBuf,

    /// Where to write the rendered chart.
    #[arg(short, long, default_value = "skewt.svg")]
    output: PathBuf,

    /// Station name for the chart title.
    #[arg(long, default_value = "UPRM")]
    station: String,

    /// Sounding number for the chart title.
    #[arg(long)]
    number: Option<u32>,

    /// Launch date for the chart title, YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Keep every Nth sample when plotting.
    #[arg(long, default_value_t = 5)]
    thin: usize,

    /// Width of the output image in pixels.
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Height of the output image in pixels.
    #[arg(long, default_value_t = 800)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let options = AnalysisOptions {
        thin_step: cli.thin,
        ..AnalysisOptions::default()
    };

    let anl = analyze_file(&cli.csv, &SkysondeFormat::default(), &options)
        .with_context(|| format!("analyzing {}", cli.csv.display()))?;

    let style = SkewTStyle {
        title: title_for(&cli),
        ..SkewTStyle::default()
    };

    render_svg(&cli.output, &anl, &style, (cli.width, cli.height))
        .map_err(|err| anyhow::anyhow!("rendering {}: {}", cli.output.display(), err))?;

    tracing::info!(output = %cli.output.display(), "chart written");
    println!("wrote {}", cli.output.display());

    Ok(())
}

fn title_for(cli: &Cli) -> String {
    let mut title = format!("{} Sounding", cli.station);
    if let Some(number) = cli.number {
        title.push_str(&format!(" #{}", number));
    }
    if let Some(date) = cli.date {
        title.push_str(&format!(" on {}", date.format("%m/%d/%Y")));
    }
    title
}
