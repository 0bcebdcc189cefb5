//! Zero-shot decoding of voice-activity-projection model output.
//!
//! A projection model emits, per frame, a categorical distribution over
//! every joint future-activity pattern of two speakers. This crate turns
//! that distribution into interpretable probabilities without any further
//! training: fixed combinatorial subsets of the class space stand in for
//! "speaker X takes the floor next" and "speaker X backchannels soon", and
//! state-dependent renormalization conditions them on what is happening in
//! the dialog right now.

mod align;
mod decoder;
mod registry;

pub use align::{align, AlignedBatch, AlignedPairs};
pub use decoder::{DecodeOutput, ProbabilityDecoder};
pub use registry::{SubsetPair, SubsetRegistry};

pub use floorcast_dialog::{DialogState, LastSpeaker};
pub use floorcast_events::{EventBatch, EventInterval, EventKind, MetricGroup};

use floorcast_dialog::DialogError;
use floorcast_projection::ProjectionError;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("backchannel subsets are only defined for 4 bins, got {0}")]
    UnsupportedBinCount(usize),
    #[error("probability distribution has {got} classes, codebook has {expected}")]
    ClassCount { expected: usize, got: usize },
    #[error("activity batch size {activity} does not match probability batch size {probs}")]
    BatchMismatch { probs: usize, activity: usize },
    #[error("activity signal has {got} frames, probability stream needs {needed}")]
    ActivityTooShort { needed: usize, got: usize },
    #[error("subset mass sums to zero at (batch {batch}, frame {frame}) in the {quantity} branch")]
    DegenerateMass {
        batch: usize,
        frame: usize,
        quantity: &'static str,
    },
    #[error("{kind:?} interval [{start}, {end}) outside {frames} decoded frames (batch {batch})")]
    EventOutOfRange {
        kind: EventKind,
        batch: usize,
        start: usize,
        end: usize,
        frames: usize,
    },
    #[error("{kind:?} interval attributed to speaker {speaker}, channels are 0 and 1")]
    EventSpeaker { kind: EventKind, speaker: usize },
    #[error("{kind:?} events carry {got} batch entries, decoder output has {expected}")]
    EventBatchSize {
        kind: EventKind,
        expected: usize,
        got: usize,
    },
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Dialog(#[from] DialogError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
