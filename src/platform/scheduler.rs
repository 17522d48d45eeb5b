//! Frame and clock scheduling
//!
//! The driver asks its scheduler for the next display frame and for a
//! one-second clock. On the web this is `requestAnimationFrame` plus
//! `setInterval`; tests and the native runner step it by hand.

use crate::error::{ArcadeError, Result};

/// Host timing services
pub trait FrameScheduler {
    /// Ask for one more frame callback
    fn request_frame(&mut self) -> Result<()>;

    /// Drop a pending frame callback, if any
    fn cancel_frame(&mut self);

    /// Start the once-per-second clock (no-op when running)
    fn start_clock(&mut self) -> Result<()>;

    /// Stop the clock (no-op when stopped)
    fn stop_clock(&mut self);
}

/// Scheduler stepped by the caller
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    frame_pending: bool,
    clock_running: bool,
    frames_requested: u64,
    refuse: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler that refuses every request
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Consume the pending frame request; true if there was one
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn clock_running(&self) -> bool {
        self.clock_running
    }

    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Result<()> {
        if self.refuse {
            return Err(ArcadeError::Scheduler("frame request refused".into()));
        }
        self.frame_pending = true;
        self.frames_requested += 1;
        Ok(())
    }

    fn cancel_frame(&mut self) {
        self.frame_pending = false;
    }

    fn start_clock(&mut self) -> Result<()> {
        if self.refuse {
            return Err(ArcadeError::Scheduler("interval refused".into()));
        }
        self.clock_running = true;
        Ok(())
    }

    fn stop_clock(&mut self) {
        self.clock_running = false;
    }
}
