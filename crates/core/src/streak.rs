//! Consecutive-correct counting and the encouragement shown for it.

/// Encouragement tier picked for a streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encouragement {
    Tier2,
    Tier3,
    Tier5,
    Tier10,
    /// Every fifth answer past ten.
    Milestone,
    KeepGoing,
}

impl Encouragement {
    /// Tier for a streak length; `None` below two.
    ///
    /// Exact tiers win over the every-five milestone, so 5 and 10 keep their own message.
    #[must_use]
    pub fn for_streak(streak: u32) -> Option<Self> {
        match streak {
            0 | 1 => None,
            2 => Some(Self::Tier2),
            3 => Some(Self::Tier3),
            5 => Some(Self::Tier5),
            10 => Some(Self::Tier10),
            n if n % 5 == 0 => Some(Self::Milestone),
            _ => Some(Self::KeepGoing),
        }
    }

    #[must_use]
    pub fn message(self, streak: u32) -> String {
        match self {
            Self::Tier2 => "Two in a row, nice start!".to_string(),
            Self::Tier3 => "Three in a row, you're warming up!".to_string(),
            Self::Tier5 => "Five in a row, on fire!".to_string(),
            Self::Tier10 => "Ten in a row, unstoppable!".to_string(),
            Self::Milestone => format!("{streak} in a row, another milestone!"),
            Self::KeepGoing => format!("{streak} in a row, keep going!"),
        }
    }
}

/// Count of trailing consecutive correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak(u32);

impl Streak {
    #[must_use]
    pub fn new() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Apply one answer outcome and return the tier it earns, if any.
    pub fn record(&mut self, correct: bool) -> Option<Encouragement> {
        self.0 = if correct { self.0.saturating_add(1) } else { 0 };
        Encouragement::for_streak(self.0)
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
