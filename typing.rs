//! Typewriter title: reveals a word one character at a time, holds it,
//! then starts over from empty.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Typing,
    Holding,
}

pub struct TypingTitle<'a> {
    text: &'a str,
    shown: usize,
    timer: f32,
    phase: Phase,
    char_delay: f32,
    hold: f32,
}

impl<'a> TypingTitle<'a> {
    pub const DEFAULT_TEXT: &'static str = "izare";

    pub fn new(text: &'a str, char_delay: f32, hold: f32) -> Self {
        let char_delay = char_delay.max(0.001);
        Self {
            text,
            shown: 0,
            timer: char_delay,
            phase: Phase::Typing,
            char_delay,
            hold: hold.max(0.0),
        }
    }

    /// Advance by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        // a stalled host should not replay more than one full cycle
        let cycle = (self.text.chars().count() + 1) as f32 * self.char_delay + self.hold;
        self.timer -= dt.min(cycle);
        while self.timer <= 0.0 {
            self.advance();
        }
    }

    fn advance(&mut self) {
        let len = self.text.chars().count();
        match self.phase {
            Phase::Typing if self.shown < len => {
                self.shown += 1;
                self.timer += self.char_delay;
            }
            Phase::Typing => {
                self.phase = Phase::Holding;
                self.timer += self.hold;
            }
            Phase::Holding => {
                self.phase = Phase::Typing;
                self.shown = 0;
                self.timer += self.char_delay;
            }
        }
    }

    /// The currently visible prefix.
    pub fn visible(&self) -> &'a str {
        match self.text.char_indices().nth(self.shown) {
            Some((end, _)) => &self.text[..end],
            None => self.text,
        }
    }
}
