//! Alignment of labeled event intervals with decoded probabilities.

use ndarray::Array3;

use floorcast_events::{EventBatch, EventInterval, EventKind, MetricGroup};

use crate::decoder::DecodeOutput;
use crate::{DecodeError, Result};

/// A flat prediction sequence and its matching {0, 1} targets, concatenated
/// across every event of one metric group in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPairs {
    pub preds: Vec<f32>,
    pub targets: Vec<f32>,
}

impl AlignedPairs {
    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }
}

/// Aligned prediction/target pairs per metric group. A group with no
/// events anywhere in the batch is `None` rather than an empty pair.
#[derive(Debug, Clone, Default)]
pub struct AlignedBatch {
    pub hold_shift: Option<AlignedPairs>,
    pub predictive_shift: Option<AlignedPairs>,
    pub predictive_backchannel: Option<AlignedPairs>,
    pub long_short: Option<AlignedPairs>,
}

impl AlignedBatch {
    pub fn group(&self, group: MetricGroup) -> Option<&AlignedPairs> {
        match group {
            MetricGroup::HoldShift => self.hold_shift.as_ref(),
            MetricGroup::PredictiveShift => self.predictive_shift.as_ref(),
            MetricGroup::PredictiveBackchannel => self.predictive_backchannel.as_ref(),
            MetricGroup::LongShort => self.long_short.as_ref(),
        }
    }
}

/// Map every labeled interval onto the decoder output, producing one
/// prediction/target pair per metric group.
///
/// Hold/shift, predictive shift and long/short read the state-conditioned
/// next-speaker track; predictive backchannel reads the backchannel track.
/// Negative-polarity kinds either flip the prediction to its complement or
/// keep the raw (expected-low) probability, per [`EventKind`]; targets are
/// always 1.0 for positive kinds and 0.0 for negative ones.
pub fn align(output: &DecodeOutput, events: &EventBatch) -> Result<AlignedBatch> {
    let (batch, time, _) = output.next_speaker.dim();
    for kind in EventKind::ALL {
        let stream = events.stream(kind);
        if !stream.is_empty() && stream.len() != batch {
            return Err(DecodeError::EventBatchSize {
                kind,
                expected: batch,
                got: stream.len(),
            });
        }
    }

    let mut aligned = AlignedBatch::default();
    for group in MetricGroup::ALL {
        let source = match group {
            MetricGroup::PredictiveBackchannel => &output.backchannel,
            _ => &output.next_speaker,
        };
        let pairs = align_group(source, events, group, batch, time)?;
        let slot = match group {
            MetricGroup::HoldShift => &mut aligned.hold_shift,
            MetricGroup::PredictiveShift => &mut aligned.predictive_shift,
            MetricGroup::PredictiveBackchannel => &mut aligned.predictive_backchannel,
            MetricGroup::LongShort => &mut aligned.long_short,
        };
        *slot = (!pairs.is_empty()).then_some(pairs);
    }
    Ok(aligned)
}

fn align_group(
    source: &Array3<f32>,
    events: &EventBatch,
    group: MetricGroup,
    batch: usize,
    time: usize,
) -> Result<AlignedPairs> {
    let mut pairs = AlignedPairs::default();
    for b in 0..batch {
        for kind in group.kinds() {
            let stream = events.stream(kind);
            let Some(intervals) = stream.get(b) else {
                continue;
            };
            for interval in intervals {
                check_interval(kind, b, interval, time)?;
                let target = if kind.is_positive() { 1.0 } else { 0.0 };
                for t in interval.start..interval.end {
                    let p = source[[b, t, interval.speaker]];
                    let pred = if kind.uses_complement() { 1.0 - p } else { p };
                    pairs.preds.push(pred);
                    pairs.targets.push(target);
                }
            }
        }
    }
    Ok(pairs)
}

fn check_interval(
    kind: EventKind,
    batch: usize,
    interval: &EventInterval,
    time: usize,
) -> Result<()> {
    if interval.speaker > 1 {
        return Err(DecodeError::EventSpeaker {
            kind,
            speaker: interval.speaker,
        });
    }
    if interval.start > interval.end || interval.end > time {
        return Err(DecodeError::EventOutOfRange {
            kind,
            batch,
            start: interval.start,
            end: interval.end,
            frames: time,
        });
    }
    Ok(())
}
