//! Event subsets of the projection class space.
//!
//! Each subset is a fixed set of class indices whose future-activity
//! patterns satisfy one semantic predicate, built once from the pattern
//! generators and the codebook, then kept as plain sorted index lists.

use floorcast_projection::patterns::{
    activity_onset, all_patterns, cross_product, end_of_segment, DirectionalPatterns,
};
use floorcast_projection::{ClassIndex, Codebook};

use crate::{DecodeError, Result};

/// Minimum trailing active bins for a pattern to count as the next
/// speaker genuinely taking (or keeping) the floor, rather than a short
/// ambiguous burst.
const MIN_ONSET_ACTIVE: usize = 2;

/// Latest bin by which the current speaker must stop for a pattern to
/// count toward an upcoming floor change.
const EOS_MAX_RUN: usize = 2;

/// The backchannel predicate is defined over exactly this many bins.
const BACKCHANNEL_BINS: usize = 4;

/// A speaker-directional pair of class-index sets: `toward(0)` collects
/// the patterns where speaker A is the hypothesized event owner,
/// `toward(1)` the channel-swapped image for speaker B.
#[derive(Debug, Clone)]
pub struct SubsetPair {
    a: Vec<ClassIndex>,
    b: Vec<ClassIndex>,
}

impl SubsetPair {
    fn from_patterns(codebook: &Codebook, patterns: &DirectionalPatterns) -> Self {
        let mut a: Vec<ClassIndex> = patterns
            .forward
            .iter()
            .map(|&w| codebook.encode_pattern(w))
            .collect();
        let mut b: Vec<ClassIndex> = patterns
            .swapped
            .iter()
            .map(|&w| codebook.encode_pattern(w))
            .collect();
        a.sort_unstable();
        b.sort_unstable();
        debug_assert!(a.iter().all(|i| !b.contains(i)), "directional sets overlap");
        Self { a, b }
    }

    /// Index set for one speaker channel.
    pub fn toward(&self, speaker: usize) -> &[ClassIndex] {
        match speaker {
            0 => &self.a,
            _ => &self.b,
        }
    }
}

/// All event subsets for one codebook geometry.
///
/// Built once at decoder initialization and immutable afterwards; safe to
/// share read-only across any number of concurrent decode calls.
#[derive(Debug, Clone)]
pub struct SubsetRegistry {
    silence: SubsetPair,
    prediction: SubsetPair,
    backchannel: SubsetPair,
}

impl SubsetRegistry {
    pub fn new(codebook: &Codebook) -> Result<Self> {
        let n = codebook.n_bins();
        // The backchannel predicate fixes the whole registry to 4 bins.
        if n != BACKCHANNEL_BINS {
            return Err(DecodeError::UnsupportedBinCount(n));
        }

        // During mutual silence the candidate next speaker shows a genuine
        // onset while the other channel stays fully inactive.
        let onset = activity_onset(n, MIN_ONSET_ACTIVE);
        let silence_patterns = cross_product(&onset, &[0], true);
        let silence = SubsetPair::from_patterns(codebook, &silence_patterns);

        // While one speaker holds the floor, a shift pairs the silent
        // speaker's onset with the current speaker stopping early.
        let eos = end_of_segment(n, EOS_MAX_RUN);
        let prediction_patterns = cross_product(&onset, &eos, true);
        let prediction = SubsetPair::from_patterns(codebook, &prediction_patterns);

        let backchannel = Self::backchannel_subsets(codebook);

        let registry = Self {
            silence,
            prediction,
            backchannel,
        };
        tracing::debug!(
            n_bins = n,
            silence = registry.silence.toward(0).len(),
            prediction = registry.prediction.toward(0).len(),
            backchannel = registry.backchannel.toward(0).len(),
            "built event subset registry"
        );
        Ok(registry)
    }

    /// A brief burst that does not persist: at least one of the first
    /// three bins active and the final bin inactive, against a floor
    /// holder active through the final bin.
    fn backchannel_subsets(codebook: &Codebook) -> SubsetPair {
        let lead = BACKCHANNEL_BINS - 1;
        let burst: Vec<u8> = all_patterns(lead, 1).iter().map(|&p| p << 1).collect();
        let holder: Vec<u8> = all_patterns(lead, 0)
            .iter()
            .map(|&p| (p << 1) | 1)
            .collect();
        let patterns = cross_product(&burst, &holder, true);
        SubsetPair::from_patterns(codebook, &patterns)
    }

    /// Classes where one speaker takes the floor out of mutual silence.
    pub fn silence(&self) -> &SubsetPair {
        &self.silence
    }

    /// Classes where the floor shifts away from the current speaker.
    pub fn prediction(&self) -> &SubsetPair {
        &self.prediction
    }

    /// Classes where one speaker backchannels while the other continues.
    pub fn backchannel(&self) -> &SubsetPair {
        &self.backchannel
    }

    /// Hold-oriented view: the classes where `speaker` keeps the floor are
    /// exactly the silence-subset classes of the opposite direction, so
    /// the hold sets are a swapped view rather than a second stored pair.
    pub fn hold(&self, speaker: usize) -> &[ClassIndex] {
        self.silence.toward(1 - speaker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorcast_projection::ProjectionConfig;
    use std::collections::HashSet;

    fn registry() -> (Codebook, SubsetRegistry) {
        let codebook = ProjectionConfig::default().codebook().unwrap();
        let registry = SubsetRegistry::new(&codebook).unwrap();
        (codebook, registry)
    }

    fn as_set(indices: &[ClassIndex]) -> HashSet<ClassIndex> {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_silence_subsets() {
        let (_, registry) = registry();
        // Onsets 0011, 0111, 1011, 1111 on one channel, silence on the other.
        assert_eq!(registry.silence().toward(0), &[48, 112, 176, 240]);
        assert_eq!(registry.silence().toward(1), &[3, 7, 11, 15]);
    }

    #[test]
    fn test_prediction_subset_size() {
        let (_, registry) = registry();
        // 4 onsets x 3 end-of-segment patterns per direction.
        assert_eq!(registry.prediction().toward(0).len(), 12);
        assert_eq!(registry.prediction().toward(1).len(), 12);
    }

    #[test]
    fn test_directional_subsets_disjoint() {
        let (_, registry) = registry();
        for pair in [
            registry.silence(),
            registry.prediction(),
            registry.backchannel(),
        ] {
            let a = as_set(pair.toward(0));
            let b = as_set(pair.toward(1));
            assert!(a.is_disjoint(&b));
        }
    }

    #[test]
    fn test_backchannel_subsets_mirrored() {
        let (codebook, registry) = registry();
        let a = registry.backchannel().toward(0);
        let b = registry.backchannel().toward(1);
        assert_eq!(a.len(), 56);
        assert_eq!(b.len(), 56);

        // Channel-swapping every pattern of one set yields exactly the other.
        let swapped: HashSet<ClassIndex> = a
            .iter()
            .map(|&i| codebook.encode_pattern(codebook.decode(i).unwrap().swapped()))
            .collect();
        assert_eq!(swapped, as_set(b));
    }

    #[test]
    fn test_mirror_symmetry_holds_for_all_pairs() {
        let (codebook, registry) = registry();
        for pair in [registry.silence(), registry.prediction()] {
            let swapped: HashSet<ClassIndex> = pair
                .toward(0)
                .iter()
                .map(|&i| codebook.encode_pattern(codebook.decode(i).unwrap().swapped()))
                .collect();
            assert_eq!(swapped, as_set(pair.toward(1)));
        }
    }

    #[test]
    fn test_hold_view_is_swapped_silence() {
        let (_, registry) = registry();
        assert_eq!(registry.hold(0), registry.silence().toward(1));
        assert_eq!(registry.hold(1), registry.silence().toward(0));
    }

    #[test]
    fn test_unsupported_bin_count() {
        let codebook = Codebook::new(vec![10, 20, 30]).unwrap();
        assert!(matches!(
            SubsetRegistry::new(&codebook),
            Err(DecodeError::UnsupportedBinCount(3))
        ));
    }

    #[test]
    fn test_indices_sorted_and_in_range() {
        let (codebook, registry) = registry();
        for pair in [
            registry.silence(),
            registry.prediction(),
            registry.backchannel(),
        ] {
            for speaker in 0..2 {
                let indices = pair.toward(speaker);
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
                assert!(indices.iter().all(|&i| i < codebook.n_classes()));
            }
        }
    }
}
