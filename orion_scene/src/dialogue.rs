//! Two-state dialogue machine for Orion, the scene's guide. The pick handler
//! engages the guide and asks a canned topic; a future free-text input source
//! can reuse `answer` unchanged.

pub const GREETING: &str = "Hello! I'm Orion, here to help.";
pub const CRYPTO_RESPONSE: &str =
    "Ah, you're interested in cryptocurrencies! I can help with information and tips.";
pub const FINANCE_RESPONSE: &str = "Yes, I can help you with information about finance!";
pub const FALLBACK_RESPONSE: &str = "Sorry, I didn't understand your question. Please try again.";

const CRYPTO_KEYWORD: &str = "crypto";
const FINANCE_KEYWORD: &str = "finance";

/// The guide's interaction mode. There is no transition back to `Idle`;
/// clicking the cube again re-runs the same idempotent engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideMode {
    Idle,
    Engaged,
}

#[derive(Debug, Clone)]
pub struct GuideState {
    mode: GuideMode,
    message: String,
}

impl Default for GuideState {
    fn default() -> Self {
        Self::new()
    }
}

impl GuideState {
    pub fn new() -> Self {
        Self {
            mode: GuideMode::Idle,
            message: String::new(),
        }
    }

    pub fn mode(&self) -> GuideMode {
        self.mode
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unconditional mode overwrite; repeated identical calls are no-ops.
    pub fn set_mode(&mut self, mode: GuideMode) {
        if self.mode != mode {
            log::debug!("guide mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Pick the canned response for `topic` given the current mode. While
    /// idle the topic is ignored entirely; while engaged the crypto keyword
    /// wins over the finance keyword, and anything else falls through to the
    /// fallback line.
    pub fn answer(&mut self, topic: &str) {
        let response = match self.mode {
            GuideMode::Idle => GREETING,
            GuideMode::Engaged => {
                if topic.contains(CRYPTO_KEYWORD) {
                    CRYPTO_RESPONSE
                } else if topic.contains(FINANCE_KEYWORD) {
                    FINANCE_RESPONSE
                } else {
                    FALLBACK_RESPONSE
                }
            }
        };
        self.message.clear();
        self.message.push_str(response);
    }
}

#[cfg(test)]
mod dialogue_tests {
    use super::*;

    #[test]
    fn idle_answer_greets_regardless_of_topic() {
        for topic in ["crypto", "finance", "weather", ""] {
            let mut guide = GuideState::new();
            guide.answer(topic);
            assert_eq!(guide.message(), GREETING);
            assert_eq!(guide.mode(), GuideMode::Idle);
        }
    }

    #[test]
    fn engaged_answer_matches_keywords() {
        let mut guide = GuideState::new();
        guide.set_mode(GuideMode::Engaged);

        guide.answer("tell me about crypto");
        assert_eq!(guide.message(), CRYPTO_RESPONSE);

        guide.answer("what about finance?");
        assert_eq!(guide.message(), FINANCE_RESPONSE);

        guide.answer("what's for lunch");
        assert_eq!(guide.message(), FALLBACK_RESPONSE);
    }

    #[test]
    fn crypto_keyword_takes_precedence_over_finance() {
        let mut guide = GuideState::new();
        guide.set_mode(GuideMode::Engaged);
        guide.answer("crypto and finance together");
        assert_eq!(guide.message(), CRYPTO_RESPONSE);
    }

    #[test]
    fn set_mode_is_visible_to_the_next_answer() {
        let mut guide = GuideState::new();
        guide.answer("crypto");
        assert_eq!(guide.message(), GREETING);

        guide.set_mode(GuideMode::Engaged);
        guide.answer("crypto");
        assert_eq!(guide.message(), CRYPTO_RESPONSE);
    }

    #[test]
    fn answer_is_idempotent_under_repeated_calls() {
        let mut guide = GuideState::new();
        guide.set_mode(GuideMode::Engaged);
        guide.answer("crypto");
        let first = guide.message().to_string();
        guide.answer("crypto");
        assert_eq!(guide.message(), first);
    }
}
