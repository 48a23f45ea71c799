//! particle_field - Particle background animation core
//! No heap allocation, no_std compatible

#![cfg_attr(not(test), no_std)]

use heapless::Vec;
use log::{debug, warn};

pub mod music;
pub mod render;
pub mod scheduler;
pub mod splash;
pub mod theme;
pub mod tilt;
pub mod typing;

pub use music::{MusicClient, MusicResult, Transport, Unavailable};
pub use render::{Connection, Connections, Surface};
pub use scheduler::{LoopState, Reschedule, Scheduler, StopSignal};
pub use splash::{SplashPhase, SplashScreen};
pub use theme::{ParseThemeError, PreferenceStore, Theme, ThemeManager, THEME_KEY};
pub use tilt::{CardRect, CardTilt, Tilt};
pub use typing::TypingTitle;

pub const DEFAULT_PARTICLE_COUNT: usize = 30;

// All tunables live here, nothing is read from globals.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    // Field
    pub particle_count: usize,
    pub max_speed: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub opacity_min: f32,
    pub opacity_max: f32,

    // Connections
    pub connection_distance: f32,
    pub connection_opacity: f32,
    pub connection_line_width: f32,

    // Initial viewport
    pub surface_width: f32,
    pub surface_height: f32,

    // Timing
    pub target_fps: u32,
    pub typing_char_delay: f32,
    pub typing_hold: f32,

    // RNG seed
    pub rng_seed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            max_speed: 0.5,
            radius_min: 1.0,
            radius_max: 3.0,
            opacity_min: 0.1,
            opacity_max: 0.4,
            connection_distance: 100.0,
            connection_opacity: 0.1,
            connection_line_width: 1.0,
            surface_width: 640.0,
            surface_height: 360.0,
            target_fps: 60,
            typing_char_delay: 0.18,
            typing_hold: 1.2,
            rng_seed: 0x12345678,
        }
    }
}

/// Width and height of the drawable area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

/// A single animated point. Only `x`/`y` change after creation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub opacity: f32,
}

impl Particle {
    /// Advance by velocity, then wrap each axis into `[0, bounds)`.
    pub fn step(&mut self, bounds: Dimensions) {
        self.x = wrap_axis(self.x + self.vx, bounds.width);
        self.y = wrap_axis(self.y + self.vy, bounds.height);
    }

    pub fn distance_to(&self, other: &Particle) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }
}

// Discontinuous jump, not a reflection. Negative coordinates land on the
// largest value still inside the half-open range.
fn wrap_axis(v: f32, max: f32) -> f32 {
    if !(max.is_finite() && max > 0.0) {
        return 0.0;
    }
    if v < 0.0 {
        // subnormal extents have no room for the epsilon step
        let below = max - max * f32::EPSILON;
        if below < max {
            below
        } else {
            0.0
        }
    } else if v >= max {
        0.0
    } else {
        v
    }
}

// Simple PRNG (xorshift32)
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        // xorshift never leaves the all-zero state
        let state = if seed == 0 { 0x9E37_79B9 } else { seed };
        Self { state }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Fixed-count particle store. Never resized after creation.
pub type ParticleField<const N: usize> = Vec<Particle, N>;

/// Fill a field with `count` particles spread uniformly over `bounds`.
///
/// Counts above the capacity `N` are clamped. Non-positive bounds produce a
/// degenerate field (every position at zero on that axis).
pub fn create_particles<const N: usize>(
    settings: &Settings,
    bounds: Dimensions,
    rng: &mut Rng,
) -> ParticleField<N> {
    let count = if settings.particle_count > N {
        warn!(
            "particle count {} exceeds capacity {}, clamping",
            settings.particle_count, N
        );
        N
    } else {
        settings.particle_count
    };

    let width = bounds.width.max(0.0);
    let height = bounds.height.max(0.0);
    let half_speed = settings.max_speed / 2.0;

    let mut field = Vec::new();
    for _ in 0..count {
        let particle = Particle {
            x: rng.next_f32() * width,
            y: rng.next_f32() * height,
            vx: rng.range(-half_speed, half_speed),
            vy: rng.range(-half_speed, half_speed),
            radius: rng.range(settings.radius_min, settings.radius_max),
            opacity: rng.range(settings.opacity_min, settings.opacity_max),
        };
        // count <= N, cannot overflow
        let _ = field.push(particle);
    }
    field
}

/// Step every particle of `field` once inside `bounds`.
pub fn step<const N: usize>(field: &mut ParticleField<N>, bounds: Dimensions) {
    for particle in field.iter_mut() {
        particle.step(bounds);
    }
}

/// The particle background: field, viewport and drawing parameters.
pub struct ParticleBackground<const N: usize> {
    particles: ParticleField<N>,
    bounds: Dimensions,
    settings: Settings,
}

impl<const N: usize> ParticleBackground<N> {
    pub fn new(settings: Settings) -> Self {
        let bounds = Dimensions::new(settings.surface_width, settings.surface_height);
        let mut rng = Rng::new(settings.rng_seed);
        let particles = create_particles(&settings, bounds, &mut rng);
        Self {
            particles,
            bounds,
            settings,
        }
    }

    /// Build from an existing field, e.g. a hand-placed one.
    pub fn with_particles(settings: Settings, bounds: Dimensions, particles: ParticleField<N>) -> Self {
        Self {
            particles,
            bounds,
            settings,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bounds(&self) -> Dimensions {
        self.bounds
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Overwrite the surface dimensions with a new viewport snapshot.
    ///
    /// Particles are left where they are; anything now outside wraps on its
    /// next step. Invalid snapshots are dropped.
    pub fn resize(&mut self, width: f32, height: f32) {
        let next = Dimensions::new(width, height);
        if !next.is_valid() {
            warn!("ignoring invalid resize to {}x{}", width, height);
            return;
        }
        debug!(
            "surface resized {}x{} -> {}x{}",
            self.bounds.width, self.bounds.height, width, height
        );
        self.bounds = next;
    }

    pub fn step(&mut self) {
        step(&mut self.particles, self.bounds);
    }

    /// Step and render as one frame. The stepped positions are only kept
    /// once the surface accepted the frame, so a retried frame does not
    /// advance the field twice.
    pub fn advance<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let mut next = self.particles.clone();
        step(&mut next, self.bounds);
        render::render(
            surface,
            self.bounds,
            &next,
            self.settings.connection_distance,
            self.settings.connection_opacity,
            self.settings.connection_line_width,
        )?;
        self.particles = next;
        Ok(())
    }

    pub fn connections(&self) -> Connections<'_> {
        Connections::new(
            &self.particles,
            self.settings.connection_distance,
            self.settings.connection_opacity,
        )
    }

    pub fn render<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        render::render(
            surface,
            self.bounds,
            &self.particles,
            self.settings.connection_distance,
            self.settings.connection_opacity,
            self.settings.connection_line_width,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(x: f32, y: f32, vx: f32, vy: f32) -> ParticleField<4> {
        let mut field = ParticleField::new();
        field
            .push(Particle {
                x,
                y,
                vx,
                vy,
                radius: 1.0,
                opacity: 0.2,
            })
            .unwrap();
        field
    }

    #[test]
    fn single_step_adds_velocity() {
        let mut field = single(5.0, 5.0, 2.0, 0.0);
        step(&mut field, Dimensions::new(100.0, 100.0));
        assert_eq!((field[0].x, field[0].y), (7.0, 5.0));
    }

    #[test]
    fn exiting_right_edge_wraps_to_zero() {
        let mut field = single(99.0, 50.0, 5.0, 0.0);
        step(&mut field, Dimensions::new(100.0, 100.0));
        assert_eq!(field[0].x, 0.0);
        assert_eq!(field[0].y, 50.0);
        assert_eq!(field[0].vx, 5.0);
    }

    #[test]
    fn exiting_left_edge_wraps_just_inside_max() {
        let mut field = single(1.0, 50.0, -3.0, 0.0);
        step(&mut field, Dimensions::new(100.0, 100.0));
        assert!(field[0].x < 100.0);
        assert!(field[0].x > 99.99);
        assert_eq!(field[0].vx, -3.0);
    }

    #[test]
    fn landing_exactly_on_edge_wraps() {
        let mut field = single(98.0, 0.0, 2.0, 0.0);
        step(&mut field, Dimensions::new(100.0, 100.0));
        assert_eq!(field[0].x, 0.0);
    }

    #[test]
    fn shrink_wraps_on_next_step_not_on_resize() {
        let settings = Settings::default();
        let field = single(150.0, 150.0, 0.1, 0.1);
        let mut bg = ParticleBackground::with_particles(settings, Dimensions::new(200.0, 200.0), field);

        bg.resize(50.0, 50.0);
        assert_eq!(bg.particles()[0].x, 150.0);

        bg.step();
        assert_eq!(bg.particles()[0].x, 0.0);
        assert_eq!(bg.particles()[0].y, 0.0);
    }

    #[test]
    fn wrap_invariant_holds_over_many_frames() {
        let settings = Settings {
            max_speed: 12.0,
            ..Settings::default()
        };
        let mut bg: ParticleBackground<32> = ParticleBackground::new(settings);
        for frame in 0..2_000 {
            if frame == 700 {
                bg.resize(120.0, 80.0);
            }
            bg.step();
            let b = bg.bounds();
            for p in bg.particles() {
                assert!(p.x >= 0.0 && p.x < b.width, "x={} w={}", p.x, b.width);
                assert!(p.y >= 0.0 && p.y < b.height, "y={} h={}", p.y, b.height);
            }
        }
    }

    #[test]
    fn count_is_constant_across_resizes() {
        let mut bg: ParticleBackground<64> = ParticleBackground::new(Settings::default());
        assert_eq!(bg.particles().len(), DEFAULT_PARTICLE_COUNT);
        for (w, h) in [(10.0, 10.0), (0.0, 0.0), (1920.0, 1080.0)] {
            bg.resize(w, h);
            bg.step();
            assert_eq!(bg.particles().len(), DEFAULT_PARTICLE_COUNT);
        }
    }

    #[test]
    fn created_particles_respect_ranges() {
        let settings = Settings::default();
        let bounds = Dimensions::new(300.0, 200.0);
        let mut rng = Rng::new(7);
        let field: ParticleField<32> = create_particles(&settings, bounds, &mut rng);
        assert_eq!(field.len(), 30);
        for p in &field {
            assert!(p.x >= 0.0 && p.x < 300.0);
            assert!(p.y >= 0.0 && p.y < 200.0);
            assert!(p.vx >= -0.25 && p.vx <= 0.25);
            assert!(p.vy >= -0.25 && p.vy <= 0.25);
            assert!(p.radius >= 1.0 && p.radius <= 3.0);
            assert!(p.opacity >= 0.1 && p.opacity <= 0.4);
        }
    }

    #[test]
    fn count_above_capacity_is_clamped() {
        let settings = Settings {
            particle_count: 100,
            ..Settings::default()
        };
        let bg: ParticleBackground<16> = ParticleBackground::new(settings);
        assert_eq!(bg.particles().len(), 16);
    }

    #[test]
    fn degenerate_bounds_do_not_panic() {
        let settings = Settings {
            surface_width: 0.0,
            surface_height: -5.0,
            ..Settings::default()
        };
        let mut bg: ParticleBackground<32> = ParticleBackground::new(settings);
        bg.step();
        for p in bg.particles() {
            assert_eq!((p.x, p.y), (0.0, 0.0));
        }
    }

    #[test]
    fn invalid_resize_is_ignored() {
        let mut bg: ParticleBackground<32> = ParticleBackground::new(Settings::default());
        bg.resize(f32::NAN, 10.0);
        bg.resize(-1.0, 10.0);
        assert_eq!(bg.bounds(), Dimensions::new(640.0, 360.0));
    }

    #[test]
    fn same_seed_same_field() {
        let a: ParticleBackground<32> = ParticleBackground::new(Settings::default());
        let b: ParticleBackground<32> = ParticleBackground::new(Settings::default());
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn subnormal_extent_keeps_left_wrap_inside() {
        let mut field = single(0.0, 0.0, -1.0, -1.0);
        step(&mut field, Dimensions::new(1e-40, 1e-40));
        assert!(field[0].x >= 0.0 && field[0].x < 1e-40);
        assert!(field[0].y >= 0.0 && field[0].y < 1e-40);
    }

    #[test]
    fn advance_matches_step_then_render() {
        let mut stepped: ParticleBackground<32> = ParticleBackground::new(Settings::default());
        let mut advanced: ParticleBackground<32> = ParticleBackground::new(Settings::default());

        stepped.step();
        let mut expected = render::tests::Recorder::default();
        stepped.render(&mut expected).unwrap();

        let mut actual = render::tests::Recorder::default();
        advanced.advance(&mut actual).unwrap();

        assert_eq!(stepped.particles(), advanced.particles());
        assert_eq!(expected.calls, actual.calls);
    }

    #[test]
    fn drawn_lines_are_the_listed_connections() {
        let settings = Settings {
            connection_distance: 250.0,
            ..Settings::default()
        };
        let bg: ParticleBackground<32> = ParticleBackground::new(settings);
        assert_eq!(bg.settings().connection_distance, 250.0);

        let mut surface = render::tests::Recorder::default();
        bg.render(&mut surface).unwrap();
        let drawn: std::vec::Vec<(f32, f32, f32)> = surface
            .calls
            .iter()
            .filter_map(|call| match call {
                render::tests::Call::Line { from, opacity, .. } => Some((from.0, from.1, *opacity)),
                _ => None,
            })
            .collect();
        let listed: std::vec::Vec<(f32, f32, f32)> = bg
            .connections()
            .map(|c| {
                let a = bg.particles()[c.a];
                (a.x, a.y, c.opacity)
            })
            .collect();

        assert!(!listed.is_empty());
        assert_eq!(drawn, listed);
    }

    #[test]
    fn zero_seed_still_produces_variety() {
        let mut rng = Rng::new(0);
        let first = rng.next_f32();
        let second = rng.next_f32();
        assert_ne!(first, second);
        assert!((0.0..1.0).contains(&first));
    }
}
