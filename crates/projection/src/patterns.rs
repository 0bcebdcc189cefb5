//! Combinatorial generators for future-activity patterns.
//!
//! A channel pattern is the activity of one speaker over the projection
//! window, packed into the low `n_bins` bits of a `u8` with bin 0 as the
//! most significant used bit (the pattern read left-to-right as a binary
//! number). Enumeration is plain integer counting over that encoding.

/// One speaker's binary activity over the projection window.
pub type ChannelPattern = u8;

/// A joint two-channel pattern: channel 0 is speaker A, channel 1 speaker B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowPattern {
    pub a: ChannelPattern,
    pub b: ChannelPattern,
}

impl WindowPattern {
    pub fn new(a: ChannelPattern, b: ChannelPattern) -> Self {
        Self { a, b }
    }

    /// The same joint pattern with the speaker channels exchanged.
    pub fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }
}

/// A speaker-directional pair of joint pattern sets: `forward` reads
/// channel 0 as the hypothesized next speaker, `swapped` is the mirror
/// image with the roles exchanged. `swapped` is empty when the caller
/// did not request mirroring.
#[derive(Debug, Clone)]
pub struct DirectionalPatterns {
    pub forward: Vec<WindowPattern>,
    pub swapped: Vec<WindowPattern>,
}

/// Every pattern of `n_bins` bins whose integer value is in `[start, 2^n_bins)`,
/// ascending.
pub fn all_patterns(n_bins: usize, start: usize) -> Vec<ChannelPattern> {
    debug_assert!(n_bins <= crate::MAX_BINS);
    (start..1 << n_bins).map(|v| v as ChannelPattern).collect()
}

/// The `max_run + 1` patterns where activity ends at bin `i`: the i-th
/// pattern has its first `i` bins active and the remainder inactive.
/// Represents a currently speaking participant stopping no later than
/// bin `max_run`.
pub fn end_of_segment(n_bins: usize, max_run: usize) -> Vec<ChannelPattern> {
    debug_assert!(max_run < n_bins);
    (0..=max_run)
        .map(|i| {
            if i == 0 {
                0
            } else {
                (((1u16 << i) - 1) << (n_bins - i)) as ChannelPattern
            }
        })
        .collect()
}

/// Every pattern whose last `min_active` bins are active, with the leading
/// bins ranging over all combinations.
///
/// The trailing-activity requirement excludes short ambiguous bursts (a
/// single active bin could be a backchannel rather than a genuine turn
/// onset) from counting as the next speaker taking over.
pub fn activity_onset(n_bins: usize, min_active: usize) -> Vec<ChannelPattern> {
    debug_assert!(min_active <= n_bins);
    let tail = ((1u16 << min_active) - 1) as ChannelPattern;
    let head_bits = n_bins - min_active;
    (0..1usize << head_bits)
        .map(|head| ((head as ChannelPattern) << min_active) | tail)
        .collect()
}

/// Cartesian product of two channel-pattern sets as joint windows,
/// channel 0 drawn from `a` and channel 1 from `b`. With `mirror`, the
/// channel-swapped image of every pair is collected into the second
/// directional set, making the result symmetric under speaker relabeling.
pub fn cross_product(
    a: &[ChannelPattern],
    b: &[ChannelPattern],
    mirror: bool,
) -> DirectionalPatterns {
    let mut forward = Vec::with_capacity(a.len() * b.len());
    for &pa in a {
        for &pb in b {
            forward.push(WindowPattern::new(pa, pb));
        }
    }
    let swapped = if mirror {
        forward.iter().map(|w| w.swapped()).collect()
    } else {
        Vec::new()
    };
    DirectionalPatterns { forward, swapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_enumerates_full_space() {
        let patterns = all_patterns(3, 0);
        assert_eq!(patterns, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_all_patterns_with_start() {
        let patterns = all_patterns(3, 1);
        assert_eq!(patterns.len(), 7);
        assert_eq!(patterns[0], 1);
    }

    #[test]
    fn test_end_of_segment_shapes() {
        // 0000, 1000, 1100 for a 4-bin window with max_run = 2.
        let patterns = end_of_segment(4, 2);
        assert_eq!(patterns, vec![0b0000, 0b1000, 0b1100]);
    }

    #[test]
    fn test_end_of_segment_full_window() {
        let patterns = end_of_segment(4, 3);
        assert_eq!(patterns, vec![0b0000, 0b1000, 0b1100, 0b1110]);
    }

    #[test]
    fn test_activity_onset_forces_tail() {
        let patterns = activity_onset(4, 2);
        assert_eq!(patterns, vec![0b0011, 0b0111, 0b1011, 0b1111]);
        for p in patterns {
            assert_eq!(p & 0b11, 0b11, "last two bins must be active");
        }
    }

    #[test]
    fn test_activity_onset_counts() {
        assert_eq!(activity_onset(4, 0).len(), 16);
        assert_eq!(activity_onset(4, 4), vec![0b1111]);
    }

    #[test]
    fn test_cross_product_counts() {
        let a = activity_onset(4, 2);
        let b = end_of_segment(4, 2);
        let set = cross_product(&a, &b, false);
        assert_eq!(set.forward.len(), 12);
        assert!(set.swapped.is_empty());
    }

    #[test]
    fn test_cross_product_mirror_swaps_channels() {
        let set = cross_product(&[0b1100], &[0b0001], true);
        assert_eq!(set.forward, vec![WindowPattern::new(0b1100, 0b0001)]);
        assert_eq!(set.swapped, vec![WindowPattern::new(0b0001, 0b1100)]);
    }
}
