/// Every full block of this many taps earns a bonus.
pub const BONUS_INTERVAL: u64 = 11;
/// Points added per full block on top of the taps themselves.
pub const BONUS_POINTS: u64 = 9;

/// Published score for a raw tap count: `floor(taps / 11) * 9 + taps`.
pub fn score_from_taps(taps: u64) -> u64 {
    (taps / BONUS_INTERVAL)
        .saturating_mul(BONUS_POINTS)
        .saturating_add(taps)
}
