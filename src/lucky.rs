use rand::{
    Rng,
    seq::index,
};

/// Number of distinct values a pick is drawn from: 00 through 99.
const NUMBER_SPACE: usize = 100;
pub const MAX_PICKS: usize = 99;

/// `count` distinct numbers in 00-99, ascending. The count is clamped to
/// 1..=99. Suggestions only; nothing here touches the bet form.
pub fn lucky_picks<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<u8> {
    let count = count.clamp(1, MAX_PICKS);
    let mut picks: Vec<u8> = index::sample(rng, NUMBER_SPACE, count)
        .into_iter()
        .map(|i| i as u8)
        .collect();
    picks.sort_unstable();
    picks
}

pub fn describe_picks(picks: &[u8]) -> String {
    let numbers = picks
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Lucky numbers (reference only): {numbers}")
}
