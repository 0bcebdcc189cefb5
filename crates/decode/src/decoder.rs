//! Runtime probability decoding conditioned on the current dialog state.

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView3};

use floorcast_dialog::{dialog_states, last_speaker, DialogState, LastSpeaker};
use floorcast_projection::{ClassIndex, Codebook, ProjectionConfig};

use crate::registry::SubsetRegistry;
use crate::{DecodeError, Result};

/// Per-frame probabilities decoded from one batch of model output.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    /// `(batch, time)` probability that speaker A is the next speaker,
    /// renormalized over the silence subsets. Speaker B's probability is
    /// the complement `1 - silence`, never derived from a separate subset.
    pub silence: Array2<f32>,
    /// `(batch, time, 2)` per-speaker probability of becoming the next
    /// speaker, each direction renormalized against the opposite
    /// direction's hold mass.
    pub prediction: Array3<f32>,
    /// `(batch, time, 2)` per-speaker probability of an upcoming short
    /// backchannel. Raw subset mass, deliberately not renormalized: this
    /// is an absolute event probability, not a forced choice.
    pub backchannel: Array3<f32>,
    /// `(batch, time, 2)` next-speaker probability pair selected per frame
    /// by the dialog state branch that applies there.
    pub next_speaker: Array3<f32>,
    /// `(batch, time)` dialog state driving the branch selection.
    pub states: Array2<DialogState>,
}

/// Zero-shot decoder for a fixed projection-window geometry.
///
/// Owns the codebook and the subset registry; both are immutable after
/// construction, so one decoder can serve arbitrarily many decode calls.
#[derive(Debug, Clone)]
pub struct ProbabilityDecoder {
    codebook: Codebook,
    registry: SubsetRegistry,
}

impl ProbabilityDecoder {
    pub fn new(config: &ProjectionConfig) -> Result<Self> {
        Self::from_codebook(config.codebook()?)
    }

    pub fn from_codebook(codebook: Codebook) -> Result<Self> {
        let registry = SubsetRegistry::new(&codebook)?;
        Ok(Self { codebook, registry })
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    pub fn registry(&self) -> &SubsetRegistry {
        &self.registry
    }

    /// Decode per-frame class probabilities against the aligned activity
    /// signal.
    ///
    /// `probs` is `(batch, time, n_classes)` with each frame a categorical
    /// distribution; `activity` is `(batch, time', 2)` with `time' >=
    /// time` (extra trailing frames are clipped). Zero-mass denominators
    /// surface as [`DecodeError::DegenerateMass`] instead of NaN.
    pub fn decode(
        &self,
        probs: ArrayView3<f32>,
        activity: ArrayView3<f32>,
    ) -> Result<DecodeOutput> {
        let (batch, time, classes) = probs.dim();
        if classes != self.codebook.n_classes() {
            return Err(DecodeError::ClassCount {
                expected: self.codebook.n_classes(),
                got: classes,
            });
        }
        let (act_batch, act_time, _) = activity.dim();
        if act_batch != batch {
            return Err(DecodeError::BatchMismatch {
                probs: batch,
                activity: act_batch,
            });
        }
        if act_time < time {
            return Err(DecodeError::ActivityTooShort {
                needed: time,
                got: act_time,
            });
        }
        if act_time > time {
            tracing::warn!(
                activity_frames = act_time,
                decoded_frames = time,
                "clipping activity signal to the probability stream"
            );
        }
        let activity = activity.slice(s![.., ..time, ..]);
        let states = dialog_states(activity)?;

        let mut silence = Array2::zeros((batch, time));
        let mut prediction = Array3::zeros((batch, time, 2));
        let mut backchannel = Array3::zeros((batch, time, 2));
        let mut next_speaker = Array3::zeros((batch, time, 2));

        for b in 0..batch {
            for t in 0..time {
                let frame = probs.slice(s![b, t, ..]);

                let sil_a = subset_mass(frame, self.registry.silence().toward(0));
                let sil_b = subset_mass(frame, self.registry.silence().toward(1));
                let pred_a = subset_mass(frame, self.registry.prediction().toward(0));
                let pred_b = subset_mass(frame, self.registry.prediction().toward(1));

                let sil_den = sil_a + sil_b;
                if sil_den == 0.0 {
                    return Err(DecodeError::DegenerateMass {
                        batch: b,
                        frame: t,
                        quantity: "silence",
                    });
                }
                silence[[b, t]] = sil_a / sil_den;

                // The hold mass for each direction is the opposite silence
                // subset (the swapped-view hold classes).
                let hold_a = subset_mass(frame, self.registry.hold(0));
                let hold_b = subset_mass(frame, self.registry.hold(1));
                let pred_a_den = pred_a + hold_a;
                let pred_b_den = pred_b + hold_b;
                if pred_a_den == 0.0 || pred_b_den == 0.0 {
                    return Err(DecodeError::DegenerateMass {
                        batch: b,
                        frame: t,
                        quantity: "prediction",
                    });
                }
                prediction[[b, t, 0]] = pred_a / pred_a_den;
                prediction[[b, t, 1]] = pred_b / pred_b_den;

                backchannel[[b, t, 0]] = subset_mass(frame, self.registry.backchannel().toward(0));
                backchannel[[b, t, 1]] = subset_mass(frame, self.registry.backchannel().toward(1));

                let (p_a, p_b) = match states[[b, t]] {
                    DialogState::Silence => {
                        let p_a = silence[[b, t]];
                        (p_a, 1.0 - p_a)
                    }
                    DialogState::OnlyA => {
                        // A holds the floor: decode how likely B takes over.
                        let p_b = prediction[[b, t, 1]];
                        (1.0 - p_b, p_b)
                    }
                    DialogState::OnlyB => {
                        let p_a = prediction[[b, t, 0]];
                        (p_a, 1.0 - p_a)
                    }
                    DialogState::Overlap => {
                        // Both are speaking, so the all-silent hypothesis is
                        // meaningless: compare the raw shift masses against
                        // each other.
                        let den = pred_a + pred_b;
                        if den == 0.0 {
                            return Err(DecodeError::DegenerateMass {
                                batch: b,
                                frame: t,
                                quantity: "overlap",
                            });
                        }
                        (pred_a / den, pred_b / den)
                    }
                };
                next_speaker[[b, t, 0]] = p_a;
                next_speaker[[b, t, 1]] = p_b;
            }
        }

        Ok(DecodeOutput {
            silence,
            prediction,
            backchannel,
            next_speaker,
            states,
        })
    }

    /// Decode raw class logits: applies a numerically stable softmax over
    /// the class axis, then decodes as [`ProbabilityDecoder::decode`].
    pub fn decode_logits(
        &self,
        logits: ArrayView3<f32>,
        activity: ArrayView3<f32>,
    ) -> Result<DecodeOutput> {
        let probs = softmax_classes(logits);
        self.decode(probs.view(), activity)
    }

    /// Backchannel probabilities with the floor holder masked out.
    ///
    /// A speaker's backchannel probability is only meaningful while the
    /// other speaker holds the floor; frames where the speaker was itself
    /// the last active one (or no single last speaker exists) are zeroed.
    pub fn masked_backchannel(
        &self,
        output: &DecodeOutput,
        activity: ArrayView3<f32>,
    ) -> Result<Array3<f32>> {
        let (batch, time, _) = output.backchannel.dim();
        let (act_batch, act_time, _) = activity.dim();
        if act_batch != batch {
            return Err(DecodeError::BatchMismatch {
                probs: batch,
                activity: act_batch,
            });
        }
        if act_time < time {
            return Err(DecodeError::ActivityTooShort {
                needed: time,
                got: act_time,
            });
        }
        let ls = last_speaker(activity.slice(s![.., ..time, ..]))?;
        let mut masked = Array3::zeros((batch, time, 2));
        for b in 0..batch {
            for t in 0..time {
                if ls[[b, t]] == LastSpeaker::B {
                    masked[[b, t, 0]] = output.backchannel[[b, t, 0]];
                }
                if ls[[b, t]] == LastSpeaker::A {
                    masked[[b, t, 1]] = output.backchannel[[b, t, 1]];
                }
            }
        }
        Ok(masked)
    }
}

fn subset_mass(frame: ArrayView1<f32>, indices: &[ClassIndex]) -> f32 {
    indices.iter().map(|&i| frame[i]).sum()
}

fn softmax_classes(logits: ArrayView3<f32>) -> Array3<f32> {
    let mut probs = logits.to_owned();
    for mut frame in probs.rows_mut() {
        let max = frame.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for v in frame.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in frame.iter_mut() {
            *v /= sum;
        }
    }
    probs
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn decoder() -> ProbabilityDecoder {
        ProbabilityDecoder::new(&ProjectionConfig::default()).unwrap()
    }

    fn uniform_probs(batch: usize, time: usize, classes: usize) -> Array3<f32> {
        Array3::from_elem((batch, time, classes), 1.0 / classes as f32)
    }

    #[test]
    fn test_class_count_mismatch() {
        let d = decoder();
        let probs = uniform_probs(1, 2, 128);
        let activity = Array3::<f32>::zeros((1, 2, 2));
        assert!(matches!(
            d.decode(probs.view(), activity.view()),
            Err(DecodeError::ClassCount { expected: 256, got: 128 })
        ));
    }

    #[test]
    fn test_batch_mismatch() {
        let d = decoder();
        let probs = uniform_probs(2, 2, 256);
        let activity = Array3::<f32>::zeros((1, 2, 2));
        assert!(matches!(
            d.decode(probs.view(), activity.view()),
            Err(DecodeError::BatchMismatch { .. })
        ));
    }

    #[test]
    fn test_short_activity_rejected() {
        let d = decoder();
        let probs = uniform_probs(1, 4, 256);
        let activity = Array3::<f32>::zeros((1, 3, 2));
        assert!(matches!(
            d.decode(probs.view(), activity.view()),
            Err(DecodeError::ActivityTooShort { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn test_long_activity_clipped() {
        let d = decoder();
        let probs = uniform_probs(1, 2, 256);
        let activity = Array3::<f32>::zeros((1, 10, 2));
        let out = d.decode(probs.view(), activity.view()).unwrap();
        assert_eq!(out.next_speaker.dim(), (1, 2, 2));
    }

    #[test]
    fn test_softmax_of_constant_logits_is_uniform() {
        let logits = Array3::<f32>::zeros((1, 1, 4));
        let probs = softmax_classes(logits.view());
        for &p in probs.iter() {
            assert!((p - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_is_shift_invariant() {
        let mut logits = Array3::<f32>::zeros((1, 1, 3));
        logits[[0, 0, 0]] = 1000.0;
        logits[[0, 0, 1]] = 1001.0;
        logits[[0, 0, 2]] = 1002.0;
        let probs = softmax_classes(logits.view());
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[[0, 0, 2]] > probs[[0, 0, 1]]);
    }
}
