use std::ffi::OsString;

use clap::{arg, ArgAction, ArgMatches, Command};

use crate::{
    constants::{MAX_CHANNELS, MIN_CHANNELS, SUPPORTED_BIT_DEPTHS},
    device_config::FormatOverrides,
    error::{Error, Result},
};

/// What the command line asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Invocation {
    Help,
    Apply(FormatOverrides),
}

pub fn build_command() -> Command {
    Command::new("set-audio-format")
        .about("Set audio format parameters for the default output device.")
        .disable_help_flag(true)
        .arg(
            arg!(-r --rate <RATE> "Set the sample rate in Hz")
                .action(ArgAction::Append)
                .allow_negative_numbers(true),
        )
        .arg(
            arg!(-b --bits <BITS> "Set the bit depth (16, 20, or 24)")
                .action(ArgAction::Append)
                .allow_negative_numbers(true),
        )
        .arg(
            arg!(-c --channels <NUM> "Set the number of channels (between 1 and 8, inclusive)")
                .action(ArgAction::Append)
                .allow_negative_numbers(true),
        )
        .arg(arg!(-h --help "Display this help message").action(ArgAction::Count))
        .after_help(
            "Examples:\n  \
             set-audio-format --rate=44100 --bits=16 --channels=2\n  \
             set-audio-format -r 48000 -b 24 -c 8",
        )
}

/// Parses the command line. Unknown options and missing values come back as `Error::Usage`, a
/// command line without any override as `Error::NoOptions`.
pub fn parse_args<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    let overrides = parse_overrides(&matches)?;

    if matches.get_count("help") > 0 {
        return Ok(Invocation::Help);
    }

    if overrides.is_empty() {
        return Err(Error::NoOptions);
    }

    Ok(Invocation::Apply(overrides))
}

/// Validates every occurrence of every option in command-line order, stopping at `--help`. The
/// last occurrence of an option wins.
pub fn parse_overrides(matches: &ArgMatches) -> Result<FormatOverrides> {
    let mut occurrences: Vec<(usize, &str, &str)> = Vec::new();

    for id in ["rate", "bits", "channels"] {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            occurrences.extend(indices.zip(values).map(|(index, value)| (index, id, value.as_str())));
        }
    }

    occurrences.sort_by_key(|(index, _, _)| *index);

    let help_index = if matches.get_count("help") > 0 {
        matches.index_of("help").unwrap_or(usize::MAX)
    } else {
        usize::MAX
    };

    let mut overrides = FormatOverrides::default();

    for (_, id, value) in occurrences
        .into_iter()
        .take_while(|(index, _, _)| *index < help_index)
    {
        match id {
            "rate" => overrides.rate = Some(parse_rate(value)?),
            "bits" => overrides.bits = Some(parse_bits(value)?),
            _ => overrides.channels = Some(parse_channels(value)?),
        }
    }

    Ok(overrides)
}

pub fn parse_rate(input: &str) -> Result<f64> {
    match input.parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(Error::InvalidArgument(
            "Sample rate must be a positive number".to_string(),
        )),
    }
}

pub fn parse_bits(input: &str) -> Result<u32> {
    match input.parse::<u32>() {
        Ok(bits) if SUPPORTED_BIT_DEPTHS.contains(&bits) => Ok(bits),
        _ => Err(Error::InvalidArgument(
            "Bit depth must be 16, 20, or 24".to_string(),
        )),
    }
}

pub fn parse_channels(input: &str) -> Result<u32> {
    match input.parse::<u32>() {
        Ok(channels) if (MIN_CHANNELS..=MAX_CHANNELS).contains(&channels) => Ok(channels),
        _ => Err(Error::InvalidArgument(format!(
            "Channel count must be between {} and {}, inclusive",
            MIN_CHANNELS, MAX_CHANNELS
        ))),
    }
}
