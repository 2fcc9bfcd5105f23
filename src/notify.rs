use std::sync::mpsc::{self, Receiver, Sender};

/// Scene events that observers outside the game loop may care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneNotice {
    GameOver { final_score: u32 },
    NewHighScore { score: u32 },
    WordCompleted { word: String },
    /// No words left, not even after resetting usage
    VocabularyExhausted,
}

/// Fan-out of [`SceneNotice`]s to any number of subscribers
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Vec<Sender<SceneNotice>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<SceneNotice> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber; dropped receivers are forgotten.
    pub fn broadcast(&mut self, notice: SceneNotice) {
        self.subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
