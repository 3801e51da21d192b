use crate::ChannelFormat;

/// A converter from planar blocks of any channel layout to a pair of planar stereo buffers.
///
/// The rules are as follows:
///
/// - Mono to stereo broadcasts the mono channel equally to both stereo channels.
/// - Stereo is copied through.
/// - Anything wider keeps the first two channels and drops the rest.
/// - A block with no channels at all becomes silence.
///
/// Conversion never allocates, so this is safe to use from the audio thread.
#[derive(Clone, Debug)]
pub struct ChannelConverter {
    input_format: Option<ChannelFormat>,
}

impl ChannelConverter {
    /// Get a converter for blocks with the given number of channels.
    pub fn new(input_channels: usize) -> ChannelConverter {
        ChannelConverter {
            input_format: ChannelFormat::from_channel_count(input_channels),
        }
    }

    pub fn input_format(&self) -> Option<&ChannelFormat> {
        self.input_format.as_ref()
    }

    /// Convert `left.len()` frames starting at `offset` of every input channel into `left` and `right`.
    ///
    /// Input channels shorter than `offset + left.len()` are treated as silent past their end.  `left` and `right`
    /// must be the same length.
    #[inline(always)]
    pub fn convert(&self, input: &[&[f32]], offset: usize, left: &mut [f32], right: &mut [f32]) {
        assert_eq!(left.len(), right.len());

        match &self.input_format {
            None => {
                left.fill(0.0);
                right.fill(0.0);
            }
            Some(ChannelFormat::Mono) => {
                copy_window(input[0], offset, left);
                right.copy_from_slice(left);
            }
            Some(_) => {
                copy_window(input[0], offset, left);
                copy_window(input[1], offset, right);
            }
        }
    }
}

/// Copy `dest.len()` samples from `src` starting at `offset`, zeroing whatever `src` doesn't cover.
fn copy_window(src: &[f32], offset: usize, dest: &mut [f32]) {
    let available = src.len().saturating_sub(offset).min(dest.len());
    if available > 0 {
        dest[..available].copy_from_slice(&src[offset..offset + available]);
    }
    dest[available..].fill(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_to_stereo() {
        let input: [f32; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut left = [0.0f32; 5];
        let mut right = [0.0f32; 5];

        let converter = ChannelConverter::new(1);
        converter.convert(&[&input[..]], 0, &mut left, &mut right);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn test_stereo_copies_through() {
        let l: [f32; 3] = [1.0, 2.0, 3.0];
        let r: [f32; 3] = [4.0, 5.0, 6.0];
        let mut left = [0.0f32; 3];
        let mut right = [0.0f32; 3];

        ChannelConverter::new(2).convert(&[&l[..], &r[..]], 0, &mut left, &mut right);
        assert_eq!(left, l);
        assert_eq!(right, r);
    }

    #[test]
    fn test_raw_truncation() {
        let a: [f32; 2] = [1.0, 2.0];
        let b: [f32; 2] = [3.0, 4.0];
        let c: [f32; 2] = [5.0, 6.0];
        let mut left = [0.0f32; 2];
        let mut right = [0.0f32; 2];

        let converter = ChannelConverter::new(3);
        assert!(converter.input_format().unwrap().is_raw());
        converter.convert(&[&a[..], &b[..], &c[..]], 0, &mut left, &mut right);
        assert_eq!(left, a);
        assert_eq!(right, b);
    }

    #[test]
    fn test_no_channels_is_silence() {
        let mut left = [1.0f32; 4];
        let mut right = [1.0f32; 4];

        ChannelConverter::new(0).convert(&[], 0, &mut left, &mut right);
        assert_eq!(left, [0.0; 4]);
        assert_eq!(right, [0.0; 4]);
    }

    #[test]
    fn test_offset_and_short_input() {
        let input: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut left = [9.0f32; 4];
        let mut right = [9.0f32; 4];

        ChannelConverter::new(1).convert(&[&input[..]], 4, &mut left, &mut right);
        assert_eq!(left, [5.0, 6.0, 0.0, 0.0]);
        assert_eq!(right, [5.0, 6.0, 0.0, 0.0]);
    }
}
