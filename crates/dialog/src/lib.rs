//! Per-frame dialog state derived from two-channel voice activity.
//!
//! Classifies every frame of a two-speaker activity signal into one of
//! four states (silence, A only, B only, overlap), run-length encodes the
//! state track, and propagates "who spoke last" forward through silences.

use ndarray::{Array2, ArrayView3};

/// Activity threshold for continuous-valued signals.
pub const ACTIVITY_THRESHOLD: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("activity shape mismatch: expected (batch, time, 2), got ({0}, {1}, {2})")]
    ActivityShape(usize, usize, usize),
    #[error("activity value {value} at (batch {batch}, frame {frame}) outside [0, 1]")]
    ActivityRange {
        value: f32,
        batch: usize,
        frame: usize,
    },
}

pub type Result<T> = std::result::Result<T, DialogError>;

/// Joint activity state of both speakers at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    Silence,
    OnlyA,
    OnlyB,
    Overlap,
}

impl DialogState {
    fn from_pair(a: bool, b: bool) -> Self {
        match (a, b) {
            (false, false) => DialogState::Silence,
            (true, false) => DialogState::OnlyA,
            (false, true) => DialogState::OnlyB,
            (true, true) => DialogState::Overlap,
        }
    }
}

/// The most recent floor holder at one frame.
///
/// `Undetermined` covers frames before any speech and frames whose most
/// recent activity was an overlap, where neither speaker can be singled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LastSpeaker {
    A,
    B,
    Undetermined,
}

/// A maximal run of identical consecutive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Island<T> {
    pub start: usize,
    pub len: usize,
    pub value: T,
}

/// Run-length encode a sequence into maximal constant islands.
pub fn islands<T: PartialEq + Copy>(values: &[T]) -> Vec<Island<T>> {
    let mut runs = Vec::new();
    let mut iter = values.iter().enumerate();
    let Some((_, &first)) = iter.next() else {
        return runs;
    };
    let mut current = Island {
        start: 0,
        len: 1,
        value: first,
    };
    for (i, &v) in iter {
        if v == current.value {
            current.len += 1;
        } else {
            runs.push(current);
            current = Island {
                start: i,
                len: 1,
                value: v,
            };
        }
    }
    runs.push(current);
    runs
}

/// Classify every frame of a `(batch, time, 2)` activity signal.
///
/// Continuous values are thresholded at [`ACTIVITY_THRESHOLD`]; values
/// outside `[0, 1]` are rejected.
pub fn dialog_states(activity: ArrayView3<f32>) -> Result<Array2<DialogState>> {
    let (batch, time, channels) = activity.dim();
    if channels != 2 {
        return Err(DialogError::ActivityShape(batch, time, channels));
    }
    let mut states = Array2::from_elem((batch, time), DialogState::Silence);
    for b in 0..batch {
        for t in 0..time {
            let a = checked_activity(activity[[b, t, 0]], b, t)?;
            let bb = checked_activity(activity[[b, t, 1]], b, t)?;
            states[[b, t]] = DialogState::from_pair(a, bb);
        }
    }
    Ok(states)
}

fn checked_activity(value: f32, batch: usize, frame: usize) -> Result<bool> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DialogError::ActivityRange {
            value,
            batch,
            frame,
        });
    }
    Ok(value >= ACTIVITY_THRESHOLD)
}

/// Derive the per-frame last active speaker for a `(batch, time, 2)` signal.
pub fn last_speaker(activity: ArrayView3<f32>) -> Result<Array2<LastSpeaker>> {
    let states = dialog_states(activity)?;
    let (batch, time) = states.dim();
    let mut out = Array2::from_elem((batch, time), LastSpeaker::Undetermined);
    for b in 0..batch {
        let row: Vec<DialogState> = states.row(b).to_vec();
        for (t, &ls) in last_speaker_track(&row).iter().enumerate() {
            out[[b, t]] = ls;
        }
    }
    Ok(out)
}

/// Expand a single state sequence into its per-frame last-speaker track.
///
/// Walks the state islands in order: a silent run inherits the speaker of
/// the run before it, a leading silent run and overlap runs resolve to
/// `Undetermined`. The final run is bounded by the sequence length, so the
/// output always has exactly as many entries as the input.
pub fn last_speaker_track(states: &[DialogState]) -> Vec<LastSpeaker> {
    let mut track = Vec::with_capacity(states.len());
    let mut previous = LastSpeaker::Undetermined;
    for island in islands(states) {
        let resolved = match island.value {
            DialogState::OnlyA => LastSpeaker::A,
            DialogState::OnlyB => LastSpeaker::B,
            DialogState::Overlap => LastSpeaker::Undetermined,
            DialogState::Silence => previous,
        };
        let remaining = states.len() - island.start;
        track.extend(std::iter::repeat_n(resolved, island.len.min(remaining)));
        previous = resolved;
    }
    track
}
