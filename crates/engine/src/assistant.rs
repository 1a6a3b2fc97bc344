//! Grow assistant ("Brotes").  Replies come from a [`ReplyProvider`];
//! the shipped provider picks from a fixed list and ignores the message.

use crate::error::EngineError;

pub const DEFAULT_GREETING: &str = "Hi! I'm Brotes 🌱. How can I help?";

pub fn default_replies() -> Vec<String> {
    [
        "Everything looks great! 🌟 Autopilot is keeping the pH steady.",
        "It's been warm lately. Don't worry, I bumped up the watering automatically. 💧",
        "Did you know your nasturtiums are edible? Try them in a salad! 🥗",
        "Quiet mode is on for the night. Shhh... the plants are sleeping. 😴",
        "Your roots are white and healthy, which means there's plenty of oxygen.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub trait ReplyProvider: Send + Sync {
    fn greeting(&self) -> String {
        DEFAULT_GREETING.to_string()
    }

    fn reply(&mut self, message: &str) -> String;
}

/// Uniformly random pick from a fixed, non-empty reply set.
pub struct CannedReplies {
    greeting: String,
    replies: Vec<String>,
    rng: fastrand::Rng,
}

impl CannedReplies {
    pub fn new(greeting: String, replies: Vec<String>) -> Result<Self, EngineError> {
        Self::with_rng(greeting, replies, fastrand::Rng::new())
    }

    pub fn with_seed(greeting: String, replies: Vec<String>, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(greeting, replies, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(greeting: String, replies: Vec<String>, rng: fastrand::Rng) -> Result<Self, EngineError> {
        if replies.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "assistant reply list is empty".to_string(),
            ));
        }
        Ok(Self {
            greeting,
            replies,
            rng,
        })
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            replies: default_replies(),
            rng: fastrand::Rng::new(),
        }
    }
}

impl ReplyProvider for CannedReplies {
    fn greeting(&self) -> String {
        self.greeting.clone()
    }

    fn reply(&mut self, _message: &str) -> String {
        let i = self.rng.usize(..self.replies.len());
        self.replies[i].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_comes_from_fixed_set() {
        let mut bot = CannedReplies::with_seed(DEFAULT_GREETING.into(), default_replies(), 8).unwrap();
        for msg in ["hello", "", "why is my basil yellow?"] {
            let reply = bot.reply(msg);
            assert!(default_replies().contains(&reply), "unexpected reply: {reply}");
        }
    }

    #[test]
    fn every_reply_eventually_chosen() {
        let mut bot = CannedReplies::with_seed(DEFAULT_GREETING.into(), default_replies(), 21).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(bot.reply("hi"));
        }
        assert_eq!(seen.len(), default_replies().len());
    }

    #[test]
    fn single_reply_always_returned() {
        let mut bot = CannedReplies::new("hey".into(), vec!["only this".into()]).unwrap();
        assert_eq!(bot.reply("anything"), "only this");
        assert_eq!(bot.greeting(), "hey");
    }

    #[test]
    fn empty_reply_list_rejected() {
        let err = CannedReplies::new("hi".into(), vec![]).err().unwrap();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn default_greets_as_brotes() {
        assert!(CannedReplies::default().greeting().contains("Brotes"));
    }
}
