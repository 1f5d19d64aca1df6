//! Frame decisions → time-bounded speech segments.

use super::SpeechSegment;

/// Run-length group an ordered frame decision sequence into segments.
///
/// Frame `k` sits at `k · hop_len / sample_rate` seconds. A false→true
/// transition opens a candidate at the current frame's timestamp; true→false
/// closes it, keeping it only if it lasted at least `min_duration_ms`. A
/// candidate still open at the end of the sequence is closed against the
/// clip's total duration under the same rule.
pub fn assemble(
    flags: &[bool],
    hop_len: usize,
    sample_rate: u32,
    total_samples: usize,
    min_duration_ms: f64,
) -> Vec<SpeechSegment> {
    let to_ms = |idx: usize| idx as f64 * hop_len as f64 / sample_rate as f64 * 1000.0;

    let mut segments = Vec::new();
    let mut in_speech = false;
    let mut start_ms = 0.0;

    for (idx, &is_speech) in flags.iter().enumerate() {
        let time_ms = to_ms(idx);
        if is_speech && !in_speech {
            start_ms = time_ms;
            in_speech = true;
        } else if !is_speech && in_speech {
            if time_ms - start_ms >= min_duration_ms {
                segments.push(SpeechSegment {
                    start_ms,
                    end_ms: time_ms,
                });
            }
            in_speech = false;
        }
    }

    // Speech that runs to the end of the clip.
    if in_speech {
        let end_ms = total_samples as f64 / sample_rate as f64 * 1000.0;
        if end_ms - start_ms >= min_duration_ms {
            segments.push(SpeechSegment { start_ms, end_ms });
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    // 25 ms hop at 8 kHz.
    const HOP: usize = 200;
    const RATE: u32 = 8000;

    #[test]
    fn empty_sequence_yields_no_segments() {
        assert!(assemble(&[], HOP, RATE, 0, 100.0).is_empty());
    }

    #[test]
    fn single_run_becomes_one_segment() {
        // Frames 2..=7 are speech: 50 ms .. 200 ms.
        let flags = [false, false, true, true, true, true, true, true, false];
        let segments = assemble(&flags, HOP, RATE, 9 * HOP, 100.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_ms, 50.0);
        assert_eq!(segments[0].end_ms, 200.0);
    }

    #[test]
    fn runs_below_minimum_duration_are_dropped() {
        // Two speech frames: 50 ms of speech, below the 100 ms minimum.
        let flags = [false, true, true, false, false];
        assert!(assemble(&flags, HOP, RATE, 5 * HOP, 100.0).is_empty());
    }

    #[test]
    fn open_run_closes_against_clip_end() {
        let flags = [false, false, true, true, true, true];
        let total_samples = 6 * HOP + 150; // clip extends past the last frame
        let segments = assemble(&flags, HOP, RATE, total_samples, 100.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_ms, 50.0);
        let expected_end = total_samples as f64 / RATE as f64 * 1000.0;
        assert_eq!(segments[0].end_ms, expected_end);
    }

    #[test]
    fn open_run_shorter_than_minimum_is_dropped_at_clip_end() {
        let flags = [false, false, false, true];
        // Clip ends one hop after the last frame: 25 ms of speech.
        let segments = assemble(&flags, HOP, RATE, 4 * HOP, 100.0);
        assert!(segments.is_empty());
    }

    #[test]
    fn multiple_runs_stay_ordered_and_disjoint() {
        let flags = [
            true, true, true, true, true, false, false, false, false, false, true, true, true,
            true, true, false,
        ];
        let segments = assemble(&flags, HOP, RATE, 16 * HOP, 100.0);
        assert_eq!(segments.len(), 2);
        for segment in &segments {
            assert!(segment.end_ms > segment.start_ms);
        }
        assert!(segments[0].end_ms <= segments[1].start_ms);
    }
}
