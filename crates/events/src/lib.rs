//! Shared contracts for labeled turn-taking events.
//!
//! This crate defines the formal contracts (DTOs) for event intervals
//! produced by external annotation pipelines and consumed by the decoder's
//! alignment stage. Using shared types prevents runtime deserialization
//! errors from mismatched field names, and the closed [`EventKind`]
//! enumeration makes adding or removing an event family a compile-checked
//! change instead of a stringly-keyed one.

use serde::{Deserialize, Serialize};

/// Behavioral label of a tagged conversational interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The floor passes to the other speaker.
    Shift,
    /// The current speaker retains the floor.
    Hold,
    /// An upcoming shift, tagged before the floor changes.
    #[serde(rename = "pred_shift")]
    PredictiveShift,
    /// Negative counterpart of a predictive shift (the floor is kept).
    #[serde(rename = "pred_shift_neg")]
    PredictiveShiftNeg,
    /// An upcoming backchannel by the non-floor-holding speaker.
    #[serde(rename = "pred_backchannel")]
    PredictiveBackchannel,
    /// Negative counterpart of a predictive backchannel.
    #[serde(rename = "pred_backchannel_neg")]
    PredictiveBackchannelNeg,
    /// The tagged utterance develops into a full turn.
    Long,
    /// The tagged utterance stays short (a backchannel-like burst).
    Short,
}

/// Metric family an event kind is scored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricGroup {
    HoldShift,
    PredictiveShift,
    PredictiveBackchannel,
    LongShort,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 4] = [
        MetricGroup::HoldShift,
        MetricGroup::PredictiveShift,
        MetricGroup::PredictiveBackchannel,
        MetricGroup::LongShort,
    ];

    /// The kinds scored under this group, positive class first.
    pub fn kinds(self) -> [EventKind; 2] {
        match self {
            MetricGroup::HoldShift => [EventKind::Shift, EventKind::Hold],
            MetricGroup::PredictiveShift => {
                [EventKind::PredictiveShift, EventKind::PredictiveShiftNeg]
            }
            MetricGroup::PredictiveBackchannel => [
                EventKind::PredictiveBackchannel,
                EventKind::PredictiveBackchannelNeg,
            ],
            MetricGroup::LongShort => [EventKind::Long, EventKind::Short],
        }
    }

    /// Short metric label, stable across serialized results.
    pub fn label(self) -> &'static str {
        match self {
            MetricGroup::HoldShift => "hs",
            MetricGroup::PredictiveShift => "pred_shift",
            MetricGroup::PredictiveBackchannel => "pred_backchannel",
            MetricGroup::LongShort => "ls",
        }
    }
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Shift,
        EventKind::Hold,
        EventKind::PredictiveShift,
        EventKind::PredictiveShiftNeg,
        EventKind::PredictiveBackchannel,
        EventKind::PredictiveBackchannelNeg,
        EventKind::Long,
        EventKind::Short,
    ];

    pub fn group(self) -> MetricGroup {
        match self {
            EventKind::Shift | EventKind::Hold => MetricGroup::HoldShift,
            EventKind::PredictiveShift | EventKind::PredictiveShiftNeg => {
                MetricGroup::PredictiveShift
            }
            EventKind::PredictiveBackchannel | EventKind::PredictiveBackchannelNeg => {
                MetricGroup::PredictiveBackchannel
            }
            EventKind::Long | EventKind::Short => MetricGroup::LongShort,
        }
    }

    /// Whether intervals of this kind carry the positive class label (1.0).
    pub fn is_positive(self) -> bool {
        match self {
            EventKind::Shift
            | EventKind::PredictiveShift
            | EventKind::PredictiveBackchannel
            | EventKind::Long => true,
            EventKind::Hold
            | EventKind::PredictiveShiftNeg
            | EventKind::PredictiveBackchannelNeg
            | EventKind::Short => false,
        }
    }

    /// Whether the aligned prediction is the complement `1 - p`.
    ///
    /// Holds and predictive-shift negatives score how low the shift
    /// probability stayed, so the probability is flipped while the target
    /// stays in the uniform {0, 1} convention. Backchannel negatives and
    /// shorts keep the raw probability, which should itself be low.
    pub fn uses_complement(self) -> bool {
        matches!(self, EventKind::Hold | EventKind::PredictiveShiftNeg)
    }
}

/// A labeled half-open frame interval `[start, end)` attributed to one
/// speaker channel (0 = A, 1 = B). Frame indices live on the decoder's
/// time axis.
///
/// Producers: external event annotation
/// Consumers: decoder alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInterval {
    pub start: usize,
    pub end: usize,
    pub speaker: usize,
}

impl EventInterval {
    pub fn new(start: usize, end: usize, speaker: usize) -> Self {
        Self { start, end, speaker }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Event intervals for a whole decoded batch, one stream per kind, each
/// stream holding one ordered interval list per batch element.
///
/// A kind with no events anywhere may leave its stream empty; otherwise a
/// stream must carry exactly one (possibly empty) list per batch element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBatch {
    #[serde(default)]
    pub shift: Vec<Vec<EventInterval>>,
    #[serde(default)]
    pub hold: Vec<Vec<EventInterval>>,
    #[serde(default, rename = "pred_shift")]
    pub predictive_shift: Vec<Vec<EventInterval>>,
    #[serde(default, rename = "pred_shift_neg")]
    pub predictive_shift_neg: Vec<Vec<EventInterval>>,
    #[serde(default, rename = "pred_backchannel")]
    pub predictive_backchannel: Vec<Vec<EventInterval>>,
    #[serde(default, rename = "pred_backchannel_neg")]
    pub predictive_backchannel_neg: Vec<Vec<EventInterval>>,
    #[serde(default)]
    pub long: Vec<Vec<EventInterval>>,
    #[serde(default)]
    pub short: Vec<Vec<EventInterval>>,
}

impl EventBatch {
    /// Stream for one kind.
    pub fn stream(&self, kind: EventKind) -> &[Vec<EventInterval>] {
        match kind {
            EventKind::Shift => &self.shift,
            EventKind::Hold => &self.hold,
            EventKind::PredictiveShift => &self.predictive_shift,
            EventKind::PredictiveShiftNeg => &self.predictive_shift_neg,
            EventKind::PredictiveBackchannel => &self.predictive_backchannel,
            EventKind::PredictiveBackchannelNeg => &self.predictive_backchannel_neg,
            EventKind::Long => &self.long,
            EventKind::Short => &self.short,
        }
    }

    /// Append an interval to one batch element's list, growing the stream
    /// as needed.
    pub fn push(&mut self, kind: EventKind, batch_idx: usize, interval: EventInterval) {
        let stream = match kind {
            EventKind::Shift => &mut self.shift,
            EventKind::Hold => &mut self.hold,
            EventKind::PredictiveShift => &mut self.predictive_shift,
            EventKind::PredictiveShiftNeg => &mut self.predictive_shift_neg,
            EventKind::PredictiveBackchannel => &mut self.predictive_backchannel,
            EventKind::PredictiveBackchannelNeg => &mut self.predictive_backchannel_neg,
            EventKind::Long => &mut self.long,
            EventKind::Short => &mut self.short,
        };
        if stream.len() <= batch_idx {
            stream.resize_with(batch_idx + 1, Vec::new);
        }
        stream[batch_idx].push(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_are_exhaustive() {
        for group in MetricGroup::ALL {
            let [pos, neg] = group.kinds();
            assert_eq!(pos.group(), group);
            assert_eq!(neg.group(), group);
            assert!(pos.is_positive());
            assert!(!neg.is_positive());
        }
    }

    #[test]
    fn test_complement_rule() {
        assert!(EventKind::Hold.uses_complement());
        assert!(EventKind::PredictiveShiftNeg.uses_complement());
        assert!(!EventKind::PredictiveBackchannelNeg.uses_complement());
        assert!(!EventKind::Short.uses_complement());
        assert!(!EventKind::Shift.uses_complement());
    }

    #[test]
    fn test_event_kind_wire_names() {
        let json = serde_json::to_string(&EventKind::PredictiveShiftNeg).unwrap();
        assert_eq!(json, "\"pred_shift_neg\"");
        let back: EventKind = serde_json::from_str("\"pred_backchannel\"").unwrap();
        assert_eq!(back, EventKind::PredictiveBackchannel);
    }

    #[test]
    fn test_event_batch_deserialize() {
        let json = r#"{
            "shift": [[{"start": 10, "end": 20, "speaker": 1}]],
            "pred_shift": [[]]
        }"#;
        let batch: EventBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.shift[0][0], EventInterval::new(10, 20, 1));
        assert!(batch.hold.is_empty());
        assert_eq!(batch.predictive_shift.len(), 1);
    }

    #[test]
    fn test_event_batch_push_grows_stream() {
        let mut batch = EventBatch::default();
        batch.push(EventKind::Hold, 2, EventInterval::new(0, 5, 0));
        assert_eq!(batch.hold.len(), 3);
        assert!(batch.hold[0].is_empty());
        assert_eq!(batch.stream(EventKind::Hold)[2].len(), 1);
    }

    #[test]
    fn test_interval_len() {
        assert_eq!(EventInterval::new(3, 7, 0).len(), 4);
        assert!(EventInterval::new(5, 5, 0).is_empty());
    }
}
