//! Tracks the terminal's current column count and the pending-redraw
//! state driven by window-resize notifications.
//!
//! A `SIGWINCH` handler sets a one-bit dirty flag and arms a short
//! (100 ms) interval timer (`SIGALRM`); the timer's own handler is a
//! deliberate no-op whose only purpose is to interrupt a blocking read so
//! the main loop observes the dirty flag promptly even though `SIGWINCH`
//! itself is delivered with restartable semantics. Both handlers do only
//! async-signal-safe work: storing into an atomic and arming a timer.
//! Everything else (querying the terminal, deciding how much of the
//! screen is now stale) happens later, polled from the main loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use signal_hook::consts::{SIGALRM, SIGWINCH};
use signal_hook::low_level::{SigId, register, unregister};

/// Fallback column count used when the terminal doesn't report a size
/// (or reports one of zero).
pub const DEFAULT_COLUMNS: u16 = 80;

/// Current window width plus the resize-notification plumbing.
pub struct Window {
    cols: u16,
    default_cols: u16,
    dirty: Arc<AtomicBool>,
    winch_id: Option<SigId>,
    alrm_id: Option<SigId>,
}

/// The effect of a resize discovered by [`Window::refresh`]: the column
/// counts observed before and after, handed to the caller so it can
/// recompute how much of a wrapped line is now stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub old_cols: u16,
    pub new_cols: u16,
}

impl Window {
    /// Query the current size, install the `SIGWINCH`/`SIGALRM` handlers,
    /// and return the tracker. `default_cols` is used whenever the
    /// terminal fails to report a size.
    pub fn install(default_cols: u16) -> Result<Self> {
        let cols = query_columns(default_cols);
        let dirty = Arc::new(AtomicBool::new(false));

        let dirty_for_winch = Arc::clone(&dirty);
        // SAFETY: the closure only stores into an atomic and arms an
        // interval timer via `setitimer`, both of which the reference
        // implementation this is ported from also performs directly in
        // its SIGWINCH handler.
        let winch_id = unsafe {
            register(SIGWINCH, move || {
                dirty_for_winch.store(true, Ordering::SeqCst);
                arm_interrupt_timer();
            })
        }
        .context("failed to install SIGWINCH handler")?;

        // SAFETY: no-op handler; its only job is to make a blocking read
        // return EINTR so the main loop can poll the dirty flag.
        let alrm_id =
            unsafe { register(SIGALRM, || {}) }.context("failed to install SIGALRM handler")?;

        Ok(Self {
            cols,
            default_cols,
            dirty,
            winch_id: Some(winch_id),
            alrm_id: Some(alrm_id),
        })
    }

    pub fn columns(&self) -> u16 {
        self.cols
    }

    /// True if a resize was signalled since the last `refresh`.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Re-query the terminal size and clear the dirty flag. Returns the
    /// old/new column counts so the caller can compute how much of a
    /// wrapped line needs erasing.
    pub fn refresh(&mut self) -> Resize {
        self.dirty.store(false, Ordering::SeqCst);
        let old_cols = self.cols;
        self.cols = query_columns(self.default_cols);
        tracing::trace!(target: "rline::window", old_cols, new_cols = self.cols, "window resized");
        Resize {
            old_cols,
            new_cols: self.cols,
        }
    }

    /// Number of trailing blank cells to emit when redrawing after a
    /// resize, so cells orphaned by a column-count *decrease* in a
    /// wrapped multi-row line are blanked rather than left stale.
    pub fn redraw_tail_len(resize: Resize, prompt_width: usize, length: usize) -> usize {
        if resize.old_cols == 0 {
            return 0;
        }
        let wrapped_rows = (prompt_width + length) as i64 / i64::from(resize.old_cols);
        let tail = (1 + i64::from(resize.new_cols) - i64::from(resize.old_cols)) * wrapped_rows;
        tail.max(0) as usize
    }
}

fn query_columns(default_cols: u16) -> u16 {
    match crossterm::terminal::size() {
        Ok((cols, _rows)) if cols > 0 => cols,
        _ => default_cols,
    }
}

/// Arm a one-shot ~100ms `SIGALRM`. Async-signal-safe: `setitimer` only
/// touches kernel timer state, no allocation, no locks.
fn arm_interrupt_timer() {
    let value = libc::itimerval {
        it_interval: libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        it_value: libc::timeval {
            tv_sec: 0,
            tv_usec: 100_000,
        },
    };
    unsafe {
        libc::setitimer(libc::ITIMER_REAL, &value, std::ptr::null_mut());
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Some(id) = self.winch_id.take() {
            unregister(id);
        }
        if let Some(id) = self.alrm_id.take() {
            unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redraw_tail_is_zero_when_width_unchanged() {
        let resize = Resize {
            old_cols: 80,
            new_cols: 80,
        };
        assert_eq!(Window::redraw_tail_len(resize, 4, 100), 0);
    }

    #[test]
    fn redraw_tail_grows_when_window_widens_on_wrapped_line() {
        let resize = Resize {
            old_cols: 40,
            new_cols: 80,
        };
        // prompt_width + length = 100, wraps once at 40 cols; widening to
        // 80 leaves a now-unused former row that must be blanked.
        let tail = Window::redraw_tail_len(resize, 4, 96);
        assert_eq!(tail, (1 + 80 - 40) * (100 / 40));
    }

    #[test]
    fn redraw_tail_clamps_to_zero_when_window_shrinks() {
        let resize = Resize {
            old_cols: 80,
            new_cols: 40,
        };
        let tail = Window::redraw_tail_len(resize, 4, 96);
        assert_eq!(tail, 0);
    }

    #[test]
    fn redraw_tail_never_negative() {
        let resize = Resize {
            old_cols: 40,
            new_cols: 41,
        };
        let tail = Window::redraw_tail_len(resize, 0, 10);
        assert_eq!(tail, 0);
    }

    #[test]
    fn zero_old_cols_is_treated_as_no_wrap() {
        let resize = Resize {
            old_cols: 0,
            new_cols: 80,
        };
        assert_eq!(Window::redraw_tail_len(resize, 4, 10), 0);
    }
}
