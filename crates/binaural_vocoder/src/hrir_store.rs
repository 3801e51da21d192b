//! The measured HRIRs, loaded once before processing.
use std::borrow::Cow;
use std::io::Cursor;
use std::path::PathBuf;

use crate::error::{DatasetError, Result};

/// One measured impulse response, as planar channels of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImpulseResponse {
    channels: Vec<Vec<f32>>,
}

static EMPTY_IMPULSE_RESPONSE: ImpulseResponse = ImpulseResponse {
    channels: Vec::new(),
};

impl ImpulseResponse {
    /// Build an impulse response from planar channels.
    ///
    /// Channels shorter than the longest are zero-padded to match it.
    pub fn from_channels(mut channels: Vec<Vec<f32>>) -> ImpulseResponse {
        let frames = channels.iter().map(|c| c.len()).max().unwrap_or(0);
        for c in channels.iter_mut() {
            c.resize(frames, 0.0);
        }
        ImpulseResponse { channels }
    }

    /// The impulse response of an empty slot.  Blending it gives silence.
    pub fn empty() -> &'static ImpulseResponse {
        &EMPTY_IMPULSE_RESPONSE
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples of channel `index`, or an empty slice if there is no such channel.
    pub fn channel(&self, index: usize) -> &[f32] {
        self.channels.get(index).map(|c| &c[..]).unwrap_or(&[])
    }
}

/// Where the store gets its encoded HRIRs from.
///
/// Resource `i` is the HRIR with id `i`.
pub trait HrirResourceProvider {
    fn resource_count(&self) -> usize;

    /// The encoded bytes of resource `id`, or `None` if they can't be had.
    fn resource(&self, id: usize) -> Option<Cow<'_, [u8]>>;
}

/// Resources already in memory, for example embedded with `include_bytes!`.
#[derive(Clone, Debug, Default)]
pub struct MemoryResourceProvider {
    resources: Vec<Cow<'static, [u8]>>,
}

impl MemoryResourceProvider {
    pub fn new(resources: Vec<Cow<'static, [u8]>>) -> Self {
        Self { resources }
    }

    pub fn from_vecs(resources: Vec<Vec<u8>>) -> Self {
        Self::new(resources.into_iter().map(Cow::Owned).collect())
    }
}

impl HrirResourceProvider for MemoryResourceProvider {
    fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn resource(&self, id: usize) -> Option<Cow<'_, [u8]>> {
        self.resources.get(id).map(|r| Cow::Borrowed(&r[..]))
    }
}

/// Resources read from files, one path per id.
#[derive(Clone, Debug, Default)]
pub struct FsResourceProvider {
    paths: Vec<PathBuf>,
}

impl FsResourceProvider {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl HrirResourceProvider for FsResourceProvider {
    fn resource_count(&self) -> usize {
        self.paths.len()
    }

    fn resource(&self, id: usize) -> Option<Cow<'_, [u8]>> {
        let path = self.paths.get(id)?;
        match std::fs::read(path) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(e) => {
                log::warn!("Unable to read HRIR {} from {}: {}", id, path.display(), e);
                None
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DecodeError {
    #[error("Resource unavailable")]
    Unavailable,

    #[error(transparent)]
    Wav(#[from] hound::Error),

    #[error("WAV declares zero channels")]
    NoChannels,

    #[error("WAV contains no samples")]
    NoSamples,
}

/// How a [HrirStore::build] went.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BuildSummary {
    pub loaded: usize,
    pub failed: usize,
}

/// The HRIRs, indexed by id.
///
/// Slots whose resource failed to decode stay empty.  [HrirStore::get] hands out the empty impulse response for them,
/// so the audio thread never has to care.
#[derive(Debug, Default)]
pub struct HrirStore {
    slots: Vec<Option<ImpulseResponse>>,
}

impl HrirStore {
    /// Decode every resource the provider has.
    ///
    /// This allocates and may perform I/O; do it before processing starts.
    pub fn build(provider: &dyn HrirResourceProvider) -> Result<(HrirStore, BuildSummary)> {
        let count = provider.resource_count();
        if count == 0 {
            return Err(DatasetError::NoResources.into());
        }

        let mut slots = Vec::with_capacity(count);
        let mut failed = 0;

        for id in 0..count {
            let decoded = provider
                .resource(id)
                .ok_or(DecodeError::Unavailable)
                .and_then(|bytes| decode_wav(&bytes));

            match decoded {
                Ok(ir) => slots.push(Some(ir)),
                Err(e) => {
                    log::warn!("HRIR {} could not be loaded and will be silent: {}", id, e);
                    failed += 1;
                    slots.push(None);
                }
            }
        }

        if failed == count {
            return Err(DatasetError::NothingDecoded(count).into());
        }

        let summary = BuildSummary {
            loaded: count - failed,
            failed,
        };
        log::info!(
            "Loaded {} HRIRs ({} failed)",
            summary.loaded,
            summary.failed
        );

        Ok((HrirStore { slots }, summary))
    }

    /// Build a store from already decoded impulse responses; `None` marks an empty slot.
    pub fn from_impulse_responses(slots: Vec<Option<ImpulseResponse>>) -> HrirStore {
        HrirStore { slots }
    }

    /// Number of slots, filled or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn try_get(&self, id: usize) -> Option<&ImpulseResponse> {
        self.slots.get(id)?.as_ref()
    }

    /// The impulse response for `id`, or the empty one if that slot is empty or doesn't exist.
    pub fn get(&self, id: usize) -> &ImpulseResponse {
        self.try_get(id).unwrap_or(ImpulseResponse::empty())
    }

    /// The longest impulse response in the store, in frames.
    pub fn max_len(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|ir| ir.len())
            .max()
            .unwrap_or(0)
    }
}

fn decode_wav(bytes: &[u8]) -> Result<ImpulseResponse, DecodeError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(DecodeError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if interleaved.is_empty() {
        return Err(DecodeError::NoSamples);
    }

    Ok(ImpulseResponse::from_channels(to_planar(&interleaved, channels)))
}

fn to_planar(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len().div_ceil(channels);
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks(channels) {
        for (ch, s) in frame.iter().enumerate() {
            planar[ch].push(*s);
        }
    }
    planar
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn wav_i16(channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn wav_f32(channels: u16, samples: &[f32]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_int_wavs_are_normalized_and_planar() {
        let bytes = wav_i16(2, &[16384, -32768, 0, 8192]);
        let ir = decode_wav(&bytes).unwrap();
        assert_eq!(ir.channel_count(), 2);
        assert_eq!(ir.len(), 2);
        assert_eq!(ir.channel(0), &[0.5, 0.0]);
        assert_eq!(ir.channel(1), &[-1.0, 0.25]);
    }

    #[test]
    fn test_float_wavs_are_taken_as_is() {
        let bytes = wav_f32(1, &[1.0, -0.5, 0.125]);
        let ir = decode_wav(&bytes).unwrap();
        assert_eq!(ir.channel_count(), 1);
        assert_eq!(ir.channel(0), &[1.0, -0.5, 0.125]);
        assert_eq!(ir.channel(1), &[] as &[f32]);
    }

    #[test]
    fn test_failed_slots_are_empty() {
        let provider = MemoryResourceProvider::from_vecs(vec![
            wav_f32(1, &[1.0]),
            b"not a wave file".to_vec(),
            wav_i16(2, &[1, 2, 3, 4]),
        ]);

        let (store, summary) = HrirStore::build(&provider).unwrap();
        assert_eq!(
            summary,
            BuildSummary {
                loaded: 2,
                failed: 1
            }
        );
        assert_eq!(store.len(), 3);
        assert!(store.try_get(0).is_some());
        assert!(store.try_get(1).is_none());
        assert!(store.get(1).is_empty());
        assert!(store.get(100).is_empty());
        assert_eq!(store.get(2).channel_count(), 2);
        assert_eq!(store.max_len(), 2);
    }

    #[test]
    fn test_whole_dataset_failures() {
        let err = HrirStore::build(&MemoryResourceProvider::default()).unwrap_err();
        assert_eq!(err.as_dataset_error(), Some(&DatasetError::NoResources));

        let provider = MemoryResourceProvider::from_vecs(vec![vec![], vec![1, 2, 3]]);
        let err = HrirStore::build(&provider).unwrap_err();
        assert_eq!(err.as_dataset_error(), Some(&DatasetError::NothingDecoded(2)));
    }

    #[test]
    fn test_missing_files_leave_slots_empty() {
        let dir = std::env::temp_dir().join(format!("binaural_vocoder_hrir_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let present = dir.join("present.wav");
        std::fs::write(&present, wav_f32(1, &[0.5, 0.25])).unwrap();

        let provider = FsResourceProvider::new(vec![dir.join("missing.wav"), present]);
        let (store, summary) = HrirStore::build(&provider).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(store.get(0).is_empty());
        assert_eq!(store.get(1).channel(0), &[0.5, 0.25]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_ragged_channels_are_padded() {
        let ir = ImpulseResponse::from_channels(vec![vec![1.0], vec![1.0, 2.0, 3.0]]);
        assert_eq!(ir.len(), 3);
        assert_eq!(ir.channel(0), &[1.0, 0.0, 0.0]);
    }
}
