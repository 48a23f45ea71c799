//! Drawing the field onto a host surface

use crate::{Dimensions, Particle};

/// A 2D drawable region. Everything is drawn in white; `opacity` is the
/// alpha the host composites it with.
pub trait Surface {
    type Error;

    fn clear(&mut self, bounds: Dimensions) -> Result<(), Self::Error>;

    fn fill_disc(&mut self, x: f32, y: f32, radius: f32, opacity: f32) -> Result<(), Self::Error>;

    fn stroke_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        opacity: f32,
        width: f32,
    ) -> Result<(), Self::Error>;
}

/// A line between two particles closer than the connection distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub opacity: f32,
}

/// Visits every unordered pair `(a, b)` with `a < b` exactly once and yields
/// the ones closer than the threshold.
pub struct Connections<'a> {
    particles: &'a [Particle],
    threshold: f32,
    max_opacity: f32,
    a: usize,
    b: usize,
}

impl<'a> Connections<'a> {
    pub fn new(particles: &'a [Particle], threshold: f32, max_opacity: f32) -> Self {
        Self {
            particles,
            threshold,
            max_opacity,
            a: 0,
            b: 1,
        }
    }
}

impl Iterator for Connections<'_> {
    type Item = Connection;

    fn next(&mut self) -> Option<Connection> {
        if !(self.threshold > 0.0) {
            return None;
        }
        // PERF: O(n^2 / 2) pair checks, fine for a few dozen particles
        while self.a < self.particles.len() {
            if self.b >= self.particles.len() {
                self.a += 1;
                self.b = self.a + 1;
                continue;
            }
            let (a, b) = (self.a, self.b);
            self.b += 1;

            let distance = self.particles[a].distance_to(&self.particles[b]);
            if distance < self.threshold {
                let opacity = (1.0 - distance / self.threshold) * self.max_opacity;
                return Some(Connection {
                    a,
                    b,
                    distance,
                    opacity,
                });
            }
        }
        None
    }
}

/// Clear, draw every particle as a disc, then draw the connections.
/// Particle data is only read.
pub fn render<S: Surface>(
    surface: &mut S,
    bounds: Dimensions,
    particles: &[Particle],
    connection_distance: f32,
    connection_opacity: f32,
    line_width: f32,
) -> Result<(), S::Error> {
    surface.clear(bounds)?;

    for particle in particles {
        surface.fill_disc(particle.x, particle.y, particle.radius, particle.opacity)?;
    }

    for connection in Connections::new(particles, connection_distance, connection_opacity) {
        let a = &particles[connection.a];
        let b = &particles[connection.b];
        surface.stroke_line((a.x, a.y), (b.x, b.y), connection.opacity, line_width)?;
    }

    Ok(())
}
