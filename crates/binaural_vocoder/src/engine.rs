//! The engine: the lifecycle and the per-block signal flow that joins every other module.
use binaural_vocoder_dsp::ChannelConverter;

use crate::blender::{BlendedImpulseResponse, SpectralBlender};
use crate::config::{EngineConfig, HRIR_LENGTH};
use crate::controls::{Controls, Corrections};
use crate::convolution::{Convolver, DirectConvolver};
use crate::direction;
use crate::error::{PrepareError, Result};
use crate::hrir_store::{BuildSummary, HrirResourceProvider, HrirStore};
use crate::is_audio_thread::mark_audio_thread;
use crate::itd::InterauralDelayLines;
use crate::logging::ensure_forwarder;
use crate::reverb::{reverb_wet_level, Reverberator};
use crate::vocoder::PhaseVocoder;

/// Everything allocated by [BinauralEngine::prepare].
#[derive(Debug)]
struct Prepared {
    sample_rate: f64,
    block_size: usize,
    blender: SpectralBlender,
    blended: BlendedImpulseResponse,
    vocoder: PhaseVocoder,
    delay_lines: InterauralDelayLines,
    left: Vec<f32>,
    right: Vec<f32>,
}

/// The binaural renderer.
///
/// Per block, the input is converted to stereo, optionally reverberated, run through the phase vocoder, and split into
/// interaurally delayed ears.  Meanwhile the four HRIRs around the source are blended into one impulse response, which
/// the [Convolver] then applies to both ears.
///
/// Lifecycle: [BinauralEngine::load_hrir_dataset] and [BinauralEngine::prepare] in any order on a control thread, then
/// [BinauralEngine::process] on the audio thread, then [BinauralEngine::release].  `process` never allocates, blocks,
/// or panics on bad input.
#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct BinauralEngine {
    config: EngineConfig,
    store: HrirStore,

    #[derivative(Debug = "ignore")]
    convolver: Option<Box<dyn Convolver>>,

    #[derivative(Debug = "ignore")]
    reverb: Option<Box<dyn Reverberator>>,

    prepared: Option<Prepared>,

    /// What sanitizing the last block's controls changed, so that repeats aren't logged every block.
    last_corrections: Corrections,
    warned_unprepared: bool,
}

impl BinauralEngine {
    /// A new engine with the bundled [DirectConvolver] and no reverb.
    pub fn new(config: EngineConfig) -> BinauralEngine {
        // Hosts may call `process` before `prepare`, and the warning that produces must not start a thread.
        ensure_forwarder();

        BinauralEngine {
            config,
            store: HrirStore::default(),
            convolver: Some(Box::new(DirectConvolver::new())),
            reverb: None,
            prepared: None,
            last_corrections: Corrections::default(),
            warned_unprepared: false,
        }
    }

    /// Replace the convolver.  The engine has to be prepared again afterwards.
    pub fn with_convolver(mut self, convolver: Box<dyn Convolver>) -> BinauralEngine {
        self.convolver = Some(convolver);
        self.prepared = None;
        self
    }

    /// Skip convolution entirely: output is the delayed vocoder output.
    pub fn without_convolver(mut self) -> BinauralEngine {
        self.convolver = None;
        self
    }

    /// Add a distance reverb.  The engine has to be prepared again afterwards.
    pub fn with_reverb(mut self, reverb: Box<dyn Reverberator>) -> BinauralEngine {
        self.reverb = Some(reverb);
        self.prepared = None;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hrir_store(&self) -> &HrirStore {
        &self.store
    }

    /// Load the HRIRs from `provider`, replacing any loaded before.
    ///
    /// Resources that fail to decode leave their slot silent.  Fails only if nothing could be loaded, in which case the
    /// previous store is kept.
    pub fn load_hrir_dataset(&mut self, provider: &dyn HrirResourceProvider) -> Result<BuildSummary> {
        let (store, summary) = HrirStore::build(provider)?;
        self.store = store;
        Ok(summary)
    }

    /// Use an already built store.
    pub fn set_hrir_store(&mut self, store: HrirStore) {
        self.store = store;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Output delay in samples.
    pub fn latency(&self) -> usize {
        self.config.vocoder_transform_size
    }

    /// Allocate everything processing needs, for blocks of up to `block_size` frames at `sample_rate`.
    ///
    /// `block_size` must be a power of two.  Preparing again discards all buffered audio.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) -> Result<()> {
        ensure_forwarder();

        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(PrepareError::InvalidBlockSize(block_size).into());
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(PrepareError::InvalidSampleRate(sample_rate).into());
        }

        let vocoder = PhaseVocoder::new(
            self.config.vocoder_transform_size,
            2,
            self.config.whisper_seed,
        )?;
        let delay_lines = InterauralDelayLines::new(sample_rate, self.config.delay_line_seconds)?;

        if let Some(c) = self.convolver.as_mut() {
            c.prepare(sample_rate, block_size, HRIR_LENGTH);
        }
        if let Some(r) = self.reverb.as_mut() {
            r.prepare(sample_rate);
        }

        self.prepared = Some(Prepared {
            sample_rate,
            block_size,
            blender: SpectralBlender::new(HRIR_LENGTH),
            blended: BlendedImpulseResponse::new(HRIR_LENGTH),
            vocoder,
            delay_lines,
            left: vec![0.0; block_size],
            right: vec![0.0; block_size],
        });
        self.last_corrections = Corrections::default();
        self.warned_unprepared = false;

        log::info!(
            "Prepared for {} Hz in blocks of {}, latency {} samples",
            sample_rate,
            block_size,
            self.latency()
        );
        Ok(())
    }

    /// Forget all buffered audio, keeping everything [BinauralEngine::prepare] allocated.
    ///
    /// For hosts that jump around the timeline.  Output restarts after the usual latency.
    pub fn reset(&mut self) {
        if let Some(p) = self.prepared.as_mut() {
            p.vocoder.reset();
            p.delay_lines.clear();
        }
        if let Some(c) = self.convolver.as_mut() {
            c.reset();
        }
        if let Some(r) = self.reverb.as_mut() {
            r.reset();
        }
    }

    /// Free everything [BinauralEngine::prepare] allocated.  Safe to call any number of times.
    pub fn release(&mut self) {
        self.reset();
        if self.prepared.take().is_some() {
            log::debug!("Released processing buffers");
        }
    }

    /// Render one block.
    ///
    /// `input` is planar: one channel is heard in both ears, two are used as left and right, more are ignored past the
    /// second, and none gives silence.  Input channels shorter than the output are treated as silent past their end.
    /// Output length is the shorter of the two output slices; blocks longer than the prepared block size are processed
    /// in pieces.
    ///
    /// With `bypass` set, or before [BinauralEngine::prepare], the input is copied to the output unchanged.
    pub fn process(&mut self, input: &[&[f32]], output: [&mut [f32]; 2], controls: Controls) {
        mark_audio_thread();

        let [out_left, out_right] = output;
        let frames = out_left.len().min(out_right.len());
        let out_left = &mut out_left[..frames];
        let out_right = &mut out_right[..frames];
        let converter = ChannelConverter::new(input.len());

        if controls.bypass {
            converter.convert(input, 0, out_left, out_right);
            return;
        }

        let Some(prepared) = self.prepared.as_mut() else {
            if !self.warned_unprepared {
                rt_warn!("process called before prepare; passing input through");
                self.warned_unprepared = true;
            }
            converter.convert(input, 0, out_left, out_right);
            return;
        };

        let (controls, corrections) = controls.sanitized();
        if corrections != self.last_corrections {
            if corrections.azimuth {
                rt_warn!("Azimuth outside (-pi, pi]; using 0 until it comes back into range");
            }
            if corrections.elevation || corrections.distance || corrections.gain {
                rt_debug!(
                    "Out of range controls replaced: elevation {}, distance {}, gain {}",
                    corrections.elevation,
                    corrections.distance,
                    corrections.gain
                );
            }
            if !corrections.any() {
                rt_debug!("Controls back in range");
            }
            self.last_corrections = corrections;
        }

        // The HRIRs only depend on the controls, so one blend serves every piece of this block.
        let quad = direction::select(controls.azimuth, controls.elevation);
        let irs = quad.ids().map(|id| self.store.get(id));
        prepared.blender.blend_stereo(irs, &mut prepared.blended);
        if let Some(c) = self.convolver.as_mut() {
            c.load_impulse_response(&prepared.blended, prepared.sample_rate);
        }

        let mut offset = 0;
        while offset < frames {
            let n = prepared.block_size.min(frames - offset);
            let left = &mut prepared.left[..n];
            let right = &mut prepared.right[..n];
            converter.convert(input, offset, left, right);

            if let Some(r) = self.reverb.as_mut() {
                r.set_wet_level(reverb_wet_level(controls.distance));
                r.process_stereo(left, right);
            }

            prepared
                .vocoder
                .process(0, left, controls.distance, controls.effect_mode);
            prepared
                .vocoder
                .process(1, right, controls.distance, controls.effect_mode);

            prepared
                .delay_lines
                .process(left, right, controls.azimuth, controls.gain);

            if let Some(c) = self.convolver.as_mut() {
                c.process_replacing(0, left);
                c.process_replacing(1, right);
            }

            out_left[offset..offset + n].copy_from_slice(left);
            out_right[offset..offset + n].copy_from_slice(right);
            offset += n;
        }
    }
}

impl Default for BinauralEngine {
    fn default() -> Self {
        BinauralEngine::new(EngineConfig::default())
    }
}
