use std::fmt;

use log::{debug, info, warn};

use crate::{
    audio_system::{AudioSystem, DeviceId},
    error::{Error, Result},
};

/// Physical stream format of a device, laid out like the OS record it is exchanged as.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamFormat {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
    pub reserved: u32,
}

impl StreamFormat {
    /// Recomputes the frame and packet sizes from the bit depth and channel count.
    ///
    /// The frame size is `(bits / 8) * channels + channels`: one byte per channel more than the
    /// packed sample bytes.
    pub fn recompute_layout(&mut self) {
        let channels = self.channels_per_frame;

        self.bytes_per_frame = (self.bits_per_channel / 8)
            .saturating_mul(channels)
            .saturating_add(channels);
        self.bytes_per_packet = self.bytes_per_frame.saturating_mul(self.frames_per_packet);
    }
}

/// The fields the user asked to change. A `None` rate or channel count leaves the device's value
/// alone; the bit depth is always written.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormatOverrides {
    pub rate: Option<f64>,
    pub bits: Option<u32>,
    pub channels: Option<u32>,
}

impl FormatOverrides {
    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.bits.is_none() && self.channels.is_none()
    }

    fn apply_to(&self, format: &mut StreamFormat) {
        if let Some(rate) = self.rate {
            format.sample_rate = rate;
        }

        if let Some(channels) = self.channels {
            format.channels_per_frame = channels;
        }

        // Unlike rate and channels, the bit depth is always written: without an override the
        // device is handed 0.
        format.bits_per_channel = self.bits.unwrap_or(0);

        format.recompute_layout();
    }
}

/// A requested value the device did not take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mismatch {
    SampleRate { desired: f64, actual: f64 },
    BitDepth { desired: u32, actual: u32 },
    ChannelCount { desired: u32, actual: u32 },
}

impl Mismatch {
    fn field_name(&self) -> &'static str {
        match self {
            Mismatch::SampleRate { .. } => "sample rate",
            Mismatch::BitDepth { .. } => "bit depth",
            Mismatch::ChannelCount { .. } => "channel count",
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Warning: New {} was not applied.", self.field_name())?;
        writeln!(
            f,
            "   Value may be invalid for this device, or the device does not support the resulting format."
        )?;

        match self {
            Mismatch::SampleRate { desired, actual } => {
                write!(f, "   Desired: {:.0}, Actual: {:.0}", desired, actual)
            }
            Mismatch::BitDepth { desired, actual } | Mismatch::ChannelCount { desired, actual } => {
                write!(f, "   Desired: {}, Actual: {}", desired, actual)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatReport {
    pub requested: StreamFormat,
    pub actual: StreamFormat,
    pub mismatches: Vec<Mismatch>,
}

/// Compares the overridden fields against what the device reports after the write.
pub fn find_mismatches(overrides: &FormatOverrides, actual: &StreamFormat) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    if let Some(desired) = overrides.rate {
        if actual.sample_rate != desired {
            mismatches.push(Mismatch::SampleRate {
                desired,
                actual: actual.sample_rate,
            });
        }
    }

    if let Some(desired) = overrides.bits {
        if actual.bits_per_channel != desired {
            mismatches.push(Mismatch::BitDepth {
                desired,
                actual: actual.bits_per_channel,
            });
        }
    }

    if let Some(desired) = overrides.channels {
        if actual.channels_per_frame != desired {
            mismatches.push(Mismatch::ChannelCount {
                desired,
                actual: actual.channels_per_frame,
            });
        }
    }

    mismatches
}

/// Read-modify-write of the device's physical format, followed by a read back to see what the
/// device actually accepted. Any OS failure aborts the sequence; values the device silently
/// rejected only show up as mismatches in the report.
pub fn apply_format(
    system: &dyn AudioSystem,
    device: DeviceId,
    overrides: &FormatOverrides,
) -> Result<FormatReport> {
    let current = system
        .physical_format(device)
        .map_err(Error::ReadFormat)?;

    debug!("Current format for device {}: {:?}", device, current);

    let mut requested = current;
    overrides.apply_to(&mut requested);

    info!("Setting format for device {}: {:?}", device, requested);

    system
        .set_physical_format(device, &requested)
        .map_err(Error::WriteFormat)?;

    let actual = system
        .physical_format(device)
        .map_err(Error::VerifyFormat)?;

    debug!("Format reported after write: {:?}", actual);

    let mismatches = find_mismatches(overrides, &actual);

    for mismatch in &mismatches {
        warn!("{:?}", mismatch);
    }

    Ok(FormatReport {
        requested,
        actual,
        mismatches,
    })
}
