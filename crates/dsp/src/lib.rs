pub mod channel_conversion;
mod channel_format;
pub mod circular_buffer;
#[cfg(test)]
mod close_floats;
pub mod spectral;

pub use channel_conversion::ChannelConverter;
pub use channel_format::*;
pub use circular_buffer::CircularBuffer;
