use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};

use crate::word_task::WordTask;

pub const WAVE_SIZE: usize = 5;
pub const MAX_TARGET_LETTERS: usize = 4;
pub const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Seconds shaved off the fall duration per full 100 points
pub const SPEED_UP_PER_HUNDRED: f64 = 0.5;

/// Letters for one spawn wave: the awaited letters (max 4, no repeats) padded
/// with random decoys to exactly five distinct letters, then shuffled.
pub fn build_obstacle_set<R: Rng + ?Sized>(task: &WordTask, rng: &mut R) -> Vec<char> {
    let mut obstacles: Vec<char> = task
        .remaining_letters()
        .into_iter()
        .unique()
        .take(MAX_TARGET_LETTERS)
        .collect();

    while obstacles.len() < WAVE_SIZE {
        let random = ALPHABET[rng.gen_range(0..ALPHABET.len())] as char;
        if !obstacles.contains(&random) {
            obstacles.push(random);
        }
    }

    obstacles.shuffle(rng);
    obstacles
}

/// Horizontal centre of the 1-based slot `slot` when `count` obstacles share `width`
pub fn slot_x(width: f64, count: usize, slot: usize) -> f64 {
    width / (count as f64 + 1.0) * slot as f64
}

/// Fall duration for the next wave, floored at `min`
pub fn next_obstacle_duration(current: f64, score: u32, min: f64) -> f64 {
    let speed_up = (score / 100) as f64 * SPEED_UP_PER_HUNDRED;
    (current - speed_up).max(min)
}
