//! Frame scheduling for the particle background
//!
//! The host drives the loop: on every display refresh it calls
//! [`Scheduler::frame`] and keeps calling while the answer is
//! [`Reschedule::NextFrame`]. Teardown goes through a [`StopSignal`] the host
//! owns, so any callback holding a shared reference can end the loop.

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::{ParticleBackground, Surface};

/// Cancellation flag checked before every reschedule.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: AtomicBool,
}

impl StopSignal {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reschedule {
    NextFrame,
    Halt,
}

pub struct Scheduler<'a> {
    signal: &'a StopSignal,
    state: LoopState,
    frames: u64,
}

impl<'a> Scheduler<'a> {
    pub fn new(signal: &'a StopSignal) -> Self {
        Self {
            signal,
            state: LoopState::Idle,
            frames: 0,
        }
    }

    /// Idle -> Running. There is no way back out of Stopped.
    pub fn start(&mut self) -> LoopState {
        if self.state == LoopState::Idle {
            if self.signal.is_raised() {
                self.state = LoopState::Stopped;
            } else {
                info!("particle loop started");
                self.state = LoopState::Running;
            }
        }
        self.state
    }

    pub fn stop(&self) {
        self.signal.raise();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of step+render passes completed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one step+render pass and decide whether another frame is wanted.
    ///
    /// Outside of Running nothing is touched. A surface error is returned
    /// as-is and leaves both the state and the particles unchanged, so the
    /// host may retry on the next refresh.
    pub fn frame<const N: usize, S: Surface>(
        &mut self,
        background: &mut ParticleBackground<N>,
        surface: &mut S,
    ) -> Result<Reschedule, S::Error> {
        if self.state != LoopState::Running {
            return Ok(Reschedule::Halt);
        }
        if self.halt_if_signalled() {
            return Ok(Reschedule::Halt);
        }

        background.advance(surface)?;
        self.frames += 1;

        if self.halt_if_signalled() {
            return Ok(Reschedule::Halt);
        }
        Ok(Reschedule::NextFrame)
    }

    fn halt_if_signalled(&mut self) -> bool {
        if self.signal.is_raised() {
            info!("particle loop stopped after {} frames", self.frames);
            self.state = LoopState::Stopped;
            return true;
        }
        false
    }
}
