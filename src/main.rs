//! Command-line tool for Ocean Optics USB spectrometers.
//!
//! Usage:
//!   ocean_spectro list                 # list attached vendor devices
//!   ocean_spectro status [--json]      # print the device status snapshot
//!   ocean_spectro info                 # dump the calibration record
//!   ocean_spectro acquire -n 10        # acquire spectra and print summaries

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ocean_spectro::{usb, Acquisition, Calibration};

#[derive(Parser)]
#[command(name = "ocean_spectro", about = "Ocean Optics USB spectrometer tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List attached vendor devices
    List,
    /// Print the device status snapshot
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump the calibration record
    Info,
    /// Acquire spectra and print per-frame summaries
    Acquire {
        /// Integration time in microseconds
        #[arg(long, default_value_t = 100_000)]
        integration_time_us: u64,
        /// Number of spectra to acquire
        #[arg(short = 'n', long, default_value_t = 1)]
        frames: u32,
        /// Attempts per frame before giving up on rejected packets
        #[arg(long, default_value_t = 10)]
        max_rejects: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::List => {
            let lines = usb::list_devices()?;
            if lines.is_empty() {
                println!("no vendor devices found");
            }
            for line in lines {
                println!("{line}");
            }
        }
        Command::Status { json } => {
            let mut spectrometer = usb::open_first()?;
            let status = spectrometer.query_status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{status:#?}");
            }
        }
        Command::Info => {
            let mut spectrometer = usb::open_first()?;
            println!("Model: {}", spectrometer.profile().model_name);
            let calibration = spectrometer.read_calibration()?;
            print_calibration(&calibration)?;
        }
        Command::Acquire {
            integration_time_us,
            frames,
            max_rejects,
        } => {
            let mut spectrometer = usb::open_first()?;
            println!("Model: {}", spectrometer.profile().model_name);

            spectrometer.init()?;
            spectrometer
                .set_integration_time(Duration::from_micros(integration_time_us))
                .context("invalid integration time")?;
            let actual = spectrometer.integration_time()?;
            println!("Integration time: {} us", actual.as_micros());

            for frame in 0..frames {
                let pixels = acquire_one(&mut spectrometer, max_rejects)?;
                let max = pixels.iter().copied().max().unwrap_or(0);
                let min = pixels.iter().copied().min().unwrap_or(0);
                let mean = pixels.iter().map(|&p| u64::from(p)).sum::<u64>() / pixels.len() as u64;
                println!(
                    "frame {frame}: {} pixels, min {min}, max {max}, mean {mean}",
                    pixels.len()
                );
            }
        }
    }

    Ok(())
}

/// Request spectra until one passes validation.
///
/// The driver treats a rejected packet as an ordinary outcome; the retry
/// policy lives here, at the caller.
fn acquire_one(
    spectrometer: &mut ocean_spectro::Spectrometer<usb::UsbTransport>,
    max_rejects: u32,
) -> Result<Vec<u16>> {
    for _ in 0..max_rejects {
        match spectrometer.request_spectrum()? {
            Acquisition::Spectrum(pixels) => return Ok(pixels),
            Acquisition::Rejected(reason) => {
                warn!(?reason, "spectrum packet rejected, retrying");
            }
        }
    }
    bail!("no valid spectrum packet after {max_rejects} attempts")
}

fn print_calibration(calibration: &Calibration) -> Result<()> {
    println!("Serial number: {}", calibration.serial_number.as_text()?);
    println!("Wavelength calibration coefficients:");
    for value in &calibration.wavelength_coefficients {
        println!("  {}", value.as_f64()?);
    }
    println!(
        "Stray light constant: {}",
        calibration.stray_light_constant.as_f64()?
    );
    println!("Non-linearity coefficients:");
    for value in &calibration.nonlinearity_coefficients {
        println!("  {}", value.as_f64()?);
    }
    println!(
        "Non-linearity polynomial order: {}",
        calibration.polynomial_order.as_text()?
    );

    // Address 15 packs grating ID, filter wavelength and slit size into
    // one space-separated string.
    let grating = calibration.grating_filter_slit.as_text()?;
    let mut parts = grating.split_whitespace();
    println!("Grating ID: {}", parts.next().unwrap_or("?"));
    println!("Filter wavelength: {}", parts.next().unwrap_or("?"));
    println!("Slit size: {}", parts.next().unwrap_or("?"));

    // Address 16 packs detector details into fixed character positions.
    let detector = calibration.detector_info.as_text()?;
    let at = |i| detector.get(i..i + 1).unwrap_or("?");
    println!("Array coating manufacturer: {}", at(0));
    println!("Array range: {}", at(1));
    println!("L2 lens installed: {}", at(2));
    println!("CPLD version: {}", at(4));

    Ok(())
}
