use crate::core::BlockHeader;
use log::info;

// Retargeting constants used by the chain state machine
pub const RETARGET_WINDOW: usize = 10;
pub const TARGET_BLOCK_TIME_SECS: u64 = 20;

const MIN_DIFFICULTY: i64 = 1;
const MIN_RATIO: f64 = 0.25;
const MAX_RATIO: f64 = 4.0;

/// Derive the next difficulty from the last `window` blocks of `headers`.
///
/// `headers` is the chain-ordered header history (oldest first). With fewer
/// than `window + 1` headers this returns the newest header's difficulty, or
/// 1 with no history at all. Otherwise the observed time over the window is
/// compared to `window * target_time_secs` and the difficulty moves by
/// `round(log2(ratio))` bits, with the ratio clamped to [0.25, 4.0] — at most
/// two bits per retarget, never below 1.
pub fn adjust_difficulty(headers: &[BlockHeader], window: usize, target_time_secs: u64) -> u32 {
    if headers.len() < window + 1 {
        return match headers.last() {
            Some(header) => header.difficulty,
            None => MIN_DIFFICULTY as u32,
        };
    }

    let old_header = &headers[headers.len() - (window + 1)];
    let new_header = &headers[headers.len() - 1];

    let actual_secs =
        new_header.timestamp_ms.saturating_sub(old_header.timestamp_ms) as f64 / 1000.0;
    let expected_secs = (window as u64 * target_time_secs) as f64;
    let ratio = (actual_secs / expected_secs).clamp(MIN_RATIO, MAX_RATIO);

    // Blocks arriving slower than the target (ratio > 1) lower the
    // difficulty; faster than the target raise it. The clamp bounds each
    // retarget to two bits either way.
    let last_bits = new_header.difficulty as i64;
    let delta = -ratio.log2().round() as i64;
    let new_bits = (last_bits + delta).max(MIN_DIFFICULTY) as u32;

    if new_bits != new_header.difficulty {
        info!(
            "Difficulty retarget: {} -> {new_bits} (actual {actual_secs:.1}s over {window} blocks, expected {expected_secs:.1}s)",
            new_header.difficulty
        );
    }

    new_bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GENESIS_PREV_HASH;

    fn headers_with_interval(count: usize, interval_secs: u64, difficulty: u32) -> Vec<BlockHeader> {
        (0..count)
            .map(|i| {
                BlockHeader::new(
                    i as u32,
                    GENESIS_PREV_HASH,
                    GENESIS_PREV_HASH,
                    i as u64 * interval_secs * 1000,
                    difficulty,
                    0,
                )
            })
            .collect()
    }

    #[test]
    fn test_no_history_defaults_to_one() {
        assert_eq!(adjust_difficulty(&[], 10, 20), 1);
    }

    #[test]
    fn test_short_history_keeps_last_difficulty() {
        let headers = headers_with_interval(5, 20, 7);
        assert_eq!(adjust_difficulty(&headers, 10, 20), 7);
    }

    #[test]
    fn test_on_target_interval_keeps_difficulty() {
        let headers = headers_with_interval(11, 20, 6);
        assert_eq!(adjust_difficulty(&headers, 10, 20), 6);
    }

    #[test]
    fn test_slow_blocks_lower_difficulty() {
        // Blocks arriving at double the target interval should get easier
        let headers = headers_with_interval(11, 40, 6);
        let adjusted = adjust_difficulty(&headers, 10, 20);
        assert!(adjusted <= 6);
        assert_eq!(adjusted, 5);
    }

    #[test]
    fn test_fast_blocks_raise_difficulty() {
        // Blocks arriving at half the target interval should get harder
        let headers = headers_with_interval(11, 10, 6);
        let adjusted = adjust_difficulty(&headers, 10, 20);
        assert!(adjusted >= 6);
        assert_eq!(adjusted, 7);
    }

    #[test]
    fn test_adjustment_clamped_to_two_bits() {
        // 100x the target interval, but the ratio clamp caps the drop at 2
        let headers = headers_with_interval(11, 2000, 8);
        assert_eq!(adjust_difficulty(&headers, 10, 20), 6);

        // Instant blocks cap the rise at 2
        let headers = headers_with_interval(11, 0, 8);
        assert_eq!(adjust_difficulty(&headers, 10, 20), 10);
    }

    #[test]
    fn test_never_below_one() {
        let headers = headers_with_interval(11, 2000, 1);
        assert_eq!(adjust_difficulty(&headers, 10, 20), 1);
    }
}
