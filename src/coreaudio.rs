//! CoreAudio implementation of [`AudioSystem`], talking to the HAL through the raw
//! `AudioObject*PropertyData*` calls.

use std::{mem, os::raw::c_void, ptr};

use coreaudio_sys::{
    kAudioHardwarePropertyDefaultOutputDevice, kAudioObjectPropertyElementMaster,
    kAudioObjectPropertyScopeGlobal, kAudioObjectPropertyScopeOutput, kAudioObjectSystemObject,
    kAudioStreamPropertyPhysicalFormat, AudioDeviceID, AudioObjectGetPropertyData,
    AudioObjectGetPropertyDataSize, AudioObjectID, AudioObjectPropertyAddress,
    AudioObjectSetPropertyData, AudioStreamBasicDescription, OSStatus, UInt32,
};
use log::debug;

use crate::{
    audio_system::{AudioSystem, DeviceId},
    constants::STREAM_FORMAT_SIZE_IN_BYTES,
    device_config::StreamFormat,
    error::OsError,
};

const NO_ERR: OSStatus = 0;

// `kAudioObjectPropertyElementMaster` is the pre-macOS 12 name of the main element (0) and the
// only one present in every SDK the bindings may be generated from.
const DEFAULT_OUTPUT_DEVICE_ADDRESS: AudioObjectPropertyAddress = AudioObjectPropertyAddress {
    mSelector: kAudioHardwarePropertyDefaultOutputDevice,
    mScope: kAudioObjectPropertyScopeGlobal,
    mElement: kAudioObjectPropertyElementMaster,
};

const PHYSICAL_FORMAT_ADDRESS: AudioObjectPropertyAddress = AudioObjectPropertyAddress {
    mSelector: kAudioStreamPropertyPhysicalFormat,
    mScope: kAudioObjectPropertyScopeOutput,
    mElement: kAudioObjectPropertyElementMaster,
};

/// Handle on the process-wide CoreAudio system object.
pub struct CoreAudioSystem {
    system_object: AudioObjectID,
}

impl CoreAudioSystem {
    pub fn new() -> Self {
        CoreAudioSystem {
            system_object: kAudioObjectSystemObject as AudioObjectID,
        }
    }
}

impl Default for CoreAudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn check(call: &'static str, status: OSStatus) -> Result<(), OsError> {
    if status == NO_ERR {
        Ok(())
    } else {
        Err(OsError::Status { call, status })
    }
}

fn property_size(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<usize, OsError> {
    let mut data_size: UInt32 = 0;

    let status = unsafe {
        AudioObjectGetPropertyDataSize(object, address, 0, ptr::null(), &mut data_size)
    };
    check("AudioObjectGetPropertyDataSize", status)?;

    Ok(data_size as usize)
}

/// Reads a fixed-size property into `T`. The size the HAL reports for the property has to match
/// `T` exactly, both before and after the read.
fn read_property<T: Copy>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    expected: usize,
) -> Result<T, OsError> {
    let size = property_size(object, address)?;
    if size != expected || size != mem::size_of::<T>() {
        return Err(OsError::UnexpectedSize {
            call: "AudioObjectGetPropertyDataSize",
            expected,
            actual: size,
        });
    }

    let mut value = mem::MaybeUninit::<T>::zeroed();
    let mut data_size = size as UInt32;

    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut data_size,
            value.as_mut_ptr() as *mut c_void,
        )
    };
    check("AudioObjectGetPropertyData", status)?;

    if data_size as usize != size {
        return Err(OsError::UnexpectedSize {
            call: "AudioObjectGetPropertyData",
            expected: size,
            actual: data_size as usize,
        });
    }

    // The buffer was zero-initialised and the HAL filled all of it.
    Ok(unsafe { value.assume_init() })
}

impl From<AudioStreamBasicDescription> for StreamFormat {
    fn from(asbd: AudioStreamBasicDescription) -> Self {
        StreamFormat {
            sample_rate: asbd.mSampleRate,
            format_id: asbd.mFormatID,
            format_flags: asbd.mFormatFlags,
            bytes_per_packet: asbd.mBytesPerPacket,
            frames_per_packet: asbd.mFramesPerPacket,
            bytes_per_frame: asbd.mBytesPerFrame,
            channels_per_frame: asbd.mChannelsPerFrame,
            bits_per_channel: asbd.mBitsPerChannel,
            reserved: asbd.mReserved,
        }
    }
}

impl From<&StreamFormat> for AudioStreamBasicDescription {
    fn from(format: &StreamFormat) -> Self {
        AudioStreamBasicDescription {
            mSampleRate: format.sample_rate,
            mFormatID: format.format_id,
            mFormatFlags: format.format_flags,
            mBytesPerPacket: format.bytes_per_packet,
            mFramesPerPacket: format.frames_per_packet,
            mBytesPerFrame: format.bytes_per_frame,
            mChannelsPerFrame: format.channels_per_frame,
            mBitsPerChannel: format.bits_per_channel,
            mReserved: format.reserved,
        }
    }
}

impl AudioSystem for CoreAudioSystem {
    fn default_output_device(&self) -> Result<DeviceId, OsError> {
        let device: AudioDeviceID = read_property(
            self.system_object,
            &DEFAULT_OUTPUT_DEVICE_ADDRESS,
            mem::size_of::<AudioDeviceID>(),
        )?;

        debug!("Default output device id: {}", device);
        Ok(DeviceId(device))
    }

    fn physical_format(&self, device: DeviceId) -> Result<StreamFormat, OsError> {
        let asbd: AudioStreamBasicDescription =
            read_property(device.0, &PHYSICAL_FORMAT_ADDRESS, STREAM_FORMAT_SIZE_IN_BYTES)?;

        Ok(StreamFormat::from(asbd))
    }

    fn set_physical_format(&self, device: DeviceId, format: &StreamFormat) -> Result<(), OsError> {
        let asbd = AudioStreamBasicDescription::from(format);

        let status = unsafe {
            AudioObjectSetPropertyData(
                device.0,
                &PHYSICAL_FORMAT_ADDRESS,
                0,
                ptr::null(),
                mem::size_of::<AudioStreamBasicDescription>() as UInt32,
                &asbd as *const AudioStreamBasicDescription as *const c_void,
            )
        };
        check("AudioObjectSetPropertyData", status)
    }
}
