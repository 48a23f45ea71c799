//! 3D hover tilt for cards: the card leans away from the pointer

/// Pixels of pointer travel per degree of rotation.
const TILT_DIVISOR: f32 = 10.0;
const HOVER_SCALE: f32 = 1.05;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CardRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CardRect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Rotation in degrees plus uniform scale.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tilt {
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub scale: f32,
}

impl Tilt {
    pub const REST: Tilt = Tilt {
        rotate_x: 0.0,
        rotate_y: 0.0,
        scale: 1.0,
    };

    /// Tilt for a pointer at (`px`, `py`) in the same space as `card`.
    pub fn toward(card: &CardRect, px: f32, py: f32) -> Tilt {
        let x = px - card.x;
        let y = py - card.y;
        let cx = card.width / 2.0;
        let cy = card.height / 2.0;
        Tilt {
            rotate_x: (y - cy) / TILT_DIVISOR,
            rotate_y: (cx - x) / TILT_DIVISOR,
            scale: HOVER_SCALE,
        }
    }
}

/// A card and the tilt it currently shows.
pub struct CardTilt {
    card: CardRect,
    tilt: Tilt,
}

impl CardTilt {
    pub fn new(card: CardRect) -> Self {
        Self {
            card,
            tilt: Tilt::REST,
        }
    }

    pub fn card(&self) -> CardRect {
        self.card
    }

    pub fn tilt(&self) -> Tilt {
        self.tilt
    }

    /// Pointer moved; leaving the card snaps back to rest.
    pub fn pointer_moved(&mut self, px: f32, py: f32) -> Tilt {
        self.tilt = if self.card.contains(px, py) {
            Tilt::toward(&self.card, px, py)
        } else {
            Tilt::REST
        };
        self.tilt
    }

    pub fn pointer_left(&mut self) {
        self.tilt = Tilt::REST;
    }
}
