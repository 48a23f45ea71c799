//! Intro screen that hides the page until the visitor enters

const FADE_OUT: f32 = 0.3;
const ENTRANCE_DELAY: f32 = 0.1;
const ENTRANCE: f32 = 0.8;
const ENTRANCE_OFFSET: f32 = 20.0;
const LEAVING_SCALE: f32 = 0.9;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SplashPhase {
    Shown,
    Leaving { elapsed: f32 },
    Entered { elapsed: f32 },
}

pub struct SplashScreen {
    phase: SplashPhase,
}

impl Default for SplashScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl SplashScreen {
    pub fn new() -> Self {
        Self {
            phase: SplashPhase::Shown,
        }
    }

    pub fn phase(&self) -> SplashPhase {
        self.phase
    }

    /// Start fading the splash out. Only the first call does anything.
    pub fn enter(&mut self) -> bool {
        if self.phase != SplashPhase::Shown {
            return false;
        }
        self.phase = SplashPhase::Leaving { elapsed: 0.0 };
        true
    }

    pub fn update(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        self.phase = match self.phase {
            SplashPhase::Shown => SplashPhase::Shown,
            SplashPhase::Leaving { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= FADE_OUT {
                    SplashPhase::Entered {
                        elapsed: elapsed - FADE_OUT,
                    }
                } else {
                    SplashPhase::Leaving { elapsed }
                }
            }
            SplashPhase::Entered { elapsed } => SplashPhase::Entered {
                // saturates well after the entrance is over
                elapsed: (elapsed + dt).min(2.0 * (ENTRANCE_DELAY + ENTRANCE)),
            },
        };
    }

    pub fn splash_visible(&self) -> bool {
        !matches!(self.phase, SplashPhase::Entered { .. })
    }

    pub fn splash_opacity(&self) -> f32 {
        match self.phase {
            SplashPhase::Shown => 1.0,
            SplashPhase::Leaving { elapsed } => 1.0 - elapsed / FADE_OUT,
            SplashPhase::Entered { .. } => 0.0,
        }
    }

    pub fn splash_scale(&self) -> f32 {
        match self.phase {
            SplashPhase::Shown => 1.0,
            SplashPhase::Leaving { elapsed } => 1.0 - (1.0 - LEAVING_SCALE) * elapsed / FADE_OUT,
            SplashPhase::Entered { .. } => LEAVING_SCALE,
        }
    }

    pub fn content_visible(&self) -> bool {
        matches!(self.phase, SplashPhase::Entered { .. })
    }

    pub fn content_opacity(&self) -> f32 {
        match self.phase {
            SplashPhase::Entered { elapsed } => ((elapsed - ENTRANCE_DELAY) / ENTRANCE).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Downward offset of the content while it slides into place.
    pub fn content_offset(&self) -> f32 {
        ENTRANCE_OFFSET * (1.0 - self.content_opacity())
    }
}
