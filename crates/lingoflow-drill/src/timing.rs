use std::time::Duration;

/// Fixed durations of a drill run
#[derive(Debug, Clone, PartialEq)]
pub struct DrillTiming {
    /// First countdown value
    pub countdown_from: u32,
    /// Delay between countdown values
    pub countdown_step: Duration,
    /// How long a card is shown before its answer is revealed
    pub card_duration: Duration,
    /// How long the revealed answer stays before advancing
    pub reveal_hold: Duration,
    /// Progress re-evaluation interval
    pub frame_interval: Duration,
    /// Language tag passed to the speaker on reveal
    pub speech_lang: String,
}

impl Default for DrillTiming {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            countdown_step: Duration::from_secs(1),
            card_duration: Duration::from_millis(5000),
            reveal_hold: Duration::from_millis(1500),
            frame_interval: Duration::from_millis(16),
            speech_lang: "zh-CN".to_string(),
        }
    }
}

impl DrillTiming {
    pub fn with_card_duration(mut self, duration: Duration) -> Self {
        self.card_duration = duration;
        self
    }

    pub fn with_reveal_hold(mut self, duration: Duration) -> Self {
        self.reveal_hold = duration;
        self
    }

    pub fn with_countdown(mut self, from: u32, step: Duration) -> Self {
        self.countdown_from = from;
        self.countdown_step = step;
        self
    }

    pub fn with_speech_lang(mut self, lang: impl Into<String>) -> Self {
        self.speech_lang = lang.into();
        self
    }
}
