// Accepted override ranges. Anything outside these is rejected before the device is touched.
pub const SUPPORTED_BIT_DEPTHS: [u32; 3] = [16, 20, 24];
pub const MIN_CHANNELS: u32 = 1;
pub const MAX_CHANNELS: u32 = 8;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

// Size of the physical format record exchanged with the device (f64 + 8 x u32).
pub const STREAM_FORMAT_SIZE_IN_BYTES: usize = size_of::<f64>() + 8 * size_of::<u32>();
