use std::{
    ffi::OsString,
    io::{self, Write},
    process::ExitCode,
};

use constants::{EXIT_FAILURE, EXIT_SUCCESS};
use cpal::traits::{DeviceTrait, HostTrait};
use error::Error;
use log::{debug, error, info, warn};

use audio_system::AudioSystem;
use cli::Invocation;

mod audio_system;
mod cli;
mod constants;
#[cfg(target_os = "macos")]
mod coreaudio;
mod device_config;
mod error;

// Informational only: names the device through cpal so the log says more than a numeric id.
fn log_default_output_device_name() {
    let host = cpal::default_host();

    match host.default_output_device().map(|device| device.name()) {
        Some(Ok(name)) => info!("Default output device ({}): {}", host.id().name(), name),
        Some(Err(err)) => warn!("Could not read default output device name: {}", err),
        None => warn!("{} reports no default output device", host.id().name()),
    }
}

fn open_default_system() -> Result<Box<dyn AudioSystem>, Error> {
    let system = audio_system::default_system()?;
    log_default_output_device_name();
    Ok(system)
}

fn print_usage_to_stderr() {
    eprintln!("{}", cli::build_command().render_help());
}

/// Parse, resolve the default output device, apply the format. Returns the process exit status.
/// The audio system is only opened once the command line is known to be valid. Help and format
/// warnings are written to `out`, diagnostics to stderr.
fn run<I, T, F, W>(args: I, open_system: F, out: &mut W) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce() -> Result<Box<dyn AudioSystem>, Error>,
    W: Write,
{
    let overrides = match cli::parse_args(args) {
        Ok(Invocation::Apply(overrides)) => overrides,
        Ok(Invocation::Help) => {
            return match writeln!(out, "{}", cli::build_command().render_long_help()) {
                Ok(()) => EXIT_SUCCESS,
                Err(err) => {
                    error!("Could not write help: {}", err);
                    EXIT_FAILURE
                }
            };
        }
        Err(Error::Usage(err)) => {
            let _ = err.print();
            return EXIT_FAILURE;
        }
        Err(Error::NoOptions) => {
            eprintln!("{}\n", Error::NoOptions);
            print_usage_to_stderr();
            return EXIT_FAILURE;
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            return EXIT_FAILURE;
        }
    };

    info!("Requested overrides: {:?}", overrides);

    let result = open_system().and_then(|system| {
        let device = system
            .default_output_device()
            .map_err(Error::DefaultDevice)?;

        info!("Using default output device {}", device);

        device_config::apply_format(system.as_ref(), device, &overrides)
    });

    match result {
        Ok(report) => {
            debug!("Submitted format: {:?}", report.requested);
            info!("Device now reports: {:?}", report.actual);

            for mismatch in &report.mismatches {
                if let Err(err) = writeln!(out, "{}", mismatch) {
                    warn!("Could not write format warning: {}", err);
                }
            }
            EXIT_SUCCESS
        }
        Err(err) => {
            if err.is_os_error() {
                error!("Audio subsystem call failed: {:?}", err);
            }
            eprintln!("{}", err);
            EXIT_FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    ExitCode::from(run(
        std::env::args_os(),
        open_default_system,
        &mut io::stdout().lock(),
    ))
}
