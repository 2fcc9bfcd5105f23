use log::info;
use rand::{seq::index, Rng};

/// A vocabulary entry handed out by a word source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub used: bool,
}

impl Word {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            used: false,
        }
    }
}

/// A word with one or two letters blanked out, waiting to be filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTask {
    pub word: Word,
    letters: Vec<char>,
    blank_indexes: Vec<usize>,
    filled: Vec<bool>,
}

impl WordTask {
    /// Build a task from explicit blank positions.
    ///
    /// Out of range or repeated positions are dropped so the task stays winnable.
    pub fn new(word: Word, blanks: &[usize]) -> Self {
        let letters: Vec<char> = word.text.to_uppercase().chars().collect();
        let mut blank_indexes: Vec<usize> = Vec::with_capacity(blanks.len());
        for &idx in blanks {
            if idx < letters.len() && !blank_indexes.contains(&idx) {
                blank_indexes.push(idx);
            }
        }
        let filled = vec![false; blank_indexes.len()];

        Self {
            word,
            letters,
            blank_indexes,
            filled,
        }
    }

    pub fn text(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn blank_indexes(&self) -> &[usize] {
        &self.blank_indexes
    }

    /// Letters still needed, in blank order. Repeats are kept.
    pub fn remaining_letters(&self) -> Vec<char> {
        self.blank_indexes
            .iter()
            .zip(&self.filled)
            .filter(|(_, filled)| !**filled)
            .map(|(&idx, _)| self.letters[idx])
            .collect()
    }

    pub fn awaits(&self, letter: char) -> bool {
        self.remaining_letters().contains(&letter)
    }

    /// Fill the first open blank that expects `letter`. Returns false when nothing awaits it.
    pub fn fill(&mut self, letter: char) -> bool {
        let slot = self
            .blank_indexes
            .iter()
            .zip(&self.filled)
            .position(|(&idx, &filled)| !filled && self.letters[idx] == letter);

        match slot {
            Some(pos) => {
                self.filled[pos] = true;
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.filled.iter().all(|f| *f)
    }

    /// The word as shown to the player, with open blanks as `_`
    pub fn display(&self) -> String {
        self.letters
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let open = self
                    .blank_indexes
                    .iter()
                    .zip(&self.filled)
                    .any(|(&idx, &filled)| idx == i && !filled);
                if open {
                    '_'
                } else {
                    c
                }
            })
            .collect()
    }
}

/// Blank out `min(random(1..=2), len)` distinct positions of `word`.
pub fn create_new_task<R: Rng + ?Sized>(word: Word, rng: &mut R) -> WordTask {
    let text = word.text.to_uppercase();
    let len = text.chars().count();
    let blanks_count = rng.gen_range(1..=2).min(len);
    let blanks = index::sample(rng, len, blanks_count).into_vec();

    let task = WordTask::new(Word { text, ..word }, &blanks);
    info!(
        "new word: {}, blanks at: {:?}",
        task.word.text,
        task.blank_indexes()
    );
    task
}
