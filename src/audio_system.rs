use std::fmt;

use crate::device_config::StreamFormat;
use crate::error::{Error, OsError};

/// Opaque identifier of an audio device, as handed out by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three calls this tool needs from the OS audio subsystem. All of them block until the OS
/// answers; none of them are retried.
pub trait AudioSystem {
    fn default_output_device(&self) -> Result<DeviceId, OsError>;

    /// Physical format of the device's output stream (output scope, main element).
    fn physical_format(&self, device: DeviceId) -> Result<StreamFormat, OsError>;

    fn set_physical_format(&self, device: DeviceId, format: &StreamFormat) -> Result<(), OsError>;
}

#[cfg(target_os = "macos")]
pub fn default_system() -> Result<Box<dyn AudioSystem>, Error> {
    Ok(Box::new(crate::coreaudio::CoreAudioSystem::new()))
}

#[cfg(not(target_os = "macos"))]
pub fn default_system() -> Result<Box<dyn AudioSystem>, Error> {
    Err(Error::Unsupported(format!(
        "setting the physical stream format is only implemented for CoreAudio, not {}",
        std::env::consts::OS
    )))
}

/// In-memory device used by the tests.
#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Call {
        DefaultOutputDevice,
        PhysicalFormat,
        SetPhysicalFormat,
    }

    pub struct FakeAudioSystem {
        pub device: DeviceId,
        pub format: RefCell<StreamFormat>,
        pub calls: RefCell<Vec<Call>>,
        /// Every format submitted through `set_physical_format`, before the device adjusts it.
        pub submitted: RefCell<Vec<StreamFormat>>,
        /// Fail the n-th call (0-based) of the given kind with the given status.
        pub fail: Option<(Call, usize, i32)>,
        /// Lets a test model a device that clamps what it is given.
        pub adjust: fn(&mut StreamFormat),
    }

    impl FakeAudioSystem {
        pub fn new(format: StreamFormat) -> Self {
            FakeAudioSystem {
                device: DeviceId(73),
                format: RefCell::new(format),
                calls: RefCell::new(Vec::new()),
                submitted: RefCell::new(Vec::new()),
                fail: None,
                adjust: |_| {},
            }
        }

        pub fn failing(mut self, call: Call, nth: usize, status: i32) -> Self {
            self.fail = Some((call, nth, status));
            self
        }

        pub fn adjusting(mut self, adjust: fn(&mut StreamFormat)) -> Self {
            self.adjust = adjust;
            self
        }

        pub fn count(&self, call: Call) -> usize {
            self.calls.borrow().iter().filter(|c| **c == call).count()
        }

        fn record(&self, call: Call, name: &'static str) -> Result<(), OsError> {
            let nth = self.count(call);
            self.calls.borrow_mut().push(call);

            match self.fail {
                Some((failing, n, status)) if failing == call && n == nth => {
                    Err(OsError::Status { call: name, status })
                }
                _ => Ok(()),
            }
        }
    }

    impl AudioSystem for FakeAudioSystem {
        fn default_output_device(&self) -> Result<DeviceId, OsError> {
            self.record(Call::DefaultOutputDevice, "AudioObjectGetPropertyData")?;
            Ok(self.device)
        }

        fn physical_format(&self, device: DeviceId) -> Result<StreamFormat, OsError> {
            assert_eq!(device, self.device);
            self.record(Call::PhysicalFormat, "AudioObjectGetPropertyData")?;
            Ok(*self.format.borrow())
        }

        fn set_physical_format(
            &self,
            device: DeviceId,
            format: &StreamFormat,
        ) -> Result<(), OsError> {
            assert_eq!(device, self.device);
            self.record(Call::SetPhysicalFormat, "AudioObjectSetPropertyData")?;
            self.submitted.borrow_mut().push(*format);

            let mut accepted = *format;
            (self.adjust)(&mut accepted);
            *self.format.borrow_mut() = accepted;
            Ok(())
        }
    }
}
