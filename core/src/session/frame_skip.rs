//! Frame skipping state shared with the presentation path

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkipState {
    frames_to_skip: u32,
    counter: u32,
    rendering: bool,
}

/// Skip counter plus the rendering flag the presenter consults.
///
/// Lives behind its own lock so the per-tick update never contends with
/// session transitions.
#[derive(Debug)]
pub struct FrameSkip {
    state: Mutex<SkipState>,
}

impl Default for FrameSkip {
    fn default() -> Self {
        Self {
            state: Mutex::new(SkipState {
                frames_to_skip: 0,
                counter: 0,
                rendering: true,
            }),
        }
    }
}

impl FrameSkip {
    fn with<R>(&self, f: impl FnOnce(&mut SkipState) -> R) -> R {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Skip `frames` out of every `frames + 1`; zero turns skipping off
    pub fn set(&self, frames: u32) {
        self.with(|state| {
            state.frames_to_skip = frames;
            state.counter = 0;
            if frames == 0 {
                state.rendering = true;
            }
        });
    }

    /// Per-tick update; `allowed` is false while skipping would desync a movie
    pub fn step(&self, allowed: bool) {
        self.with(|state| {
            if state.frames_to_skip == 0 || !allowed {
                return;
            }
            state.counter += 1;
            if state.counter > state.frames_to_skip {
                state.counter = 0;
            }
            state.rendering = state.counter == 0;
        });
    }

    /// Restart the cycle so the next frame is drawn
    pub fn restart(&self) {
        self.with(|state| state.counter = state.frames_to_skip);
    }

    pub fn frames_to_skip(&self) -> u32 {
        self.with(|state| state.frames_to_skip)
    }

    /// Whether the presenter should draw the current frame
    pub fn rendering(&self) -> bool {
        self.with(|state| state.rendering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_cycle() {
        let skip = FrameSkip::default();
        skip.set(2);

        let mut drawn = Vec::new();
        for _ in 0..6 {
            skip.step(true);
            drawn.push(skip.rendering());
        }
        assert_eq!(drawn, [false, false, true, false, false, true]);
    }

    #[test]
    fn test_disabled_restores_rendering() {
        let skip = FrameSkip::default();
        skip.set(1);
        skip.step(true);
        assert!(!skip.rendering());

        skip.set(0);
        assert!(skip.rendering());
        skip.step(true);
        assert!(skip.rendering());
    }

    #[test]
    fn test_not_allowed_freezes_state() {
        let skip = FrameSkip::default();
        skip.set(3);
        skip.step(false);
        skip.step(false);
        assert!(skip.rendering());
    }
}
