use std::num::NonZeroUsize;

/// A format for planar audio data.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::IsVariant)]
pub enum ChannelFormat {
    /// This is single-channel mono audio.
    Mono,

    /// This is stereo audio: 2 channels [l r].
    Stereo,

    /// Anything wider than stereo.  Only the first two channels are ever heard.
    Raw { channels: NonZeroUsize },
}

impl ChannelFormat {
    /// Work out the format of a block with the given number of channels, or `None` if there aren't any.
    pub fn from_channel_count(channels: usize) -> Option<ChannelFormat> {
        match channels {
            0 => None,
            1 => Some(ChannelFormat::Mono),
            2 => Some(ChannelFormat::Stereo),
            n => Some(ChannelFormat::Raw {
                channels: NonZeroUsize::new(n)?,
            }),
        }
    }

    pub fn get_channel_count(&self) -> NonZeroUsize {
        match self {
            ChannelFormat::Mono => NonZeroUsize::MIN,
            ChannelFormat::Stereo => NonZeroUsize::MIN.saturating_add(1),
            ChannelFormat::Raw { channels, .. } => *channels,
        }
    }
}
