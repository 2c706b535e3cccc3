//! Raw-mode lifecycle, the buffered output path, and the wrap-aware
//! [`Screen`](rline_buffer::Screen) implementation used to turn the edit
//! buffer's glyph-level writes and moves into actual terminal bytes.
//!
//! Output is never written a byte at a time: every write/move primitive
//! appends to an in-process arena, and [`Terminal::purge`] is the one
//! place bytes actually reach the terminal. Callers flush at dispatch
//! boundaries (once per keypress), not after every primitive.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use rline_buffer::Screen;
use rline_codec::{Glyph, encode_all};
use rline_window::Window;

const CUR_LEFT: &[u8] = b"\x08";
const CR: &[u8] = b"\r";
const SET_WRAP_MODE: &[u8] = b"\x1b[?7h";

static ATEXIT_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Owns the output arena and the current column width used for wrap math.
/// Implements [`Screen`] so an [`rline_buffer::EditBuffer`] can drive it
/// directly.
pub struct Terminal {
    out: Vec<u8>,
    cols: u16,
    raw: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            out: Vec::with_capacity(4096),
            cols: rline_window::DEFAULT_COLUMNS,
            raw: false,
        }
    }

    /// Enable raw mode. On first call, installs a process-exit hook (via
    /// `libc::atexit`) so raw mode is restored even if the process exits
    /// through a path that skips destructors, e.g. [`Terminal::fatal_exit`].
    pub fn enter_raw(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode().context("failed to enable raw mode")?;
        self.raw = true;
        if !ATEXIT_INSTALLED.swap(true, Ordering::SeqCst) {
            // SAFETY: `restore_raw_mode_atexit` only calls
            // `disable_raw_mode`, which crossterm implements as a plain
            // ioctl against the previously-saved termios; no allocation,
            // no access to `self`.
            unsafe {
                libc::atexit(restore_raw_mode_atexit);
            }
        }
        Ok(())
    }

    pub fn leave_raw(&mut self) -> Result<()> {
        if self.raw {
            crossterm::terminal::disable_raw_mode().context("failed to disable raw mode")?;
            self.raw = false;
        }
        Ok(())
    }

    pub fn set_columns(&mut self, cols: u16) {
        self.cols = cols;
    }

    pub fn columns(&self) -> u16 {
        self.cols
    }

    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// Turn on terminal autowrap (`ESC[?7h`). The `move_by` row/column
    /// decomposition presupposes the terminal wraps a full row on its own;
    /// the session calls this once, right after entering raw mode.
    pub fn enable_autowrap(&mut self) {
        self.out.extend_from_slice(SET_WRAP_MODE);
    }

    /// Return the cursor to column 0 of the current row without moving to
    /// a different row (`\r`). Used to end a line on submission/EOF.
    pub fn carriage_return(&mut self) {
        self.out.extend_from_slice(CR);
    }

    /// Flush the arena to stdout, retrying on interrupted writes. A
    /// persistent write failure is returned to the caller rather than
    /// handled here; the session driver decides whether it's fatal.
    pub fn purge(&mut self) -> Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        safe_write(&self.out)?;
        self.out.clear();
        Ok(())
    }

    /// Restore the terminal and exit the process immediately. Used on the
    /// top-level fatal-I/O path; bypasses `Drop` so this is the only
    /// correct way to abort with raw mode active.
    pub fn fatal_exit(&mut self, code: i32) -> ! {
        let _ = self.leave_raw();
        std::process::exit(code);
    }

    /// Block for the next input byte, retrying on `EINTR` and polling
    /// `window` between retries so a `SIGWINCH` arriving mid-read is
    /// observed as soon as the interrupt timer wakes the read back up.
    /// Returns `Ok(None)` on EOF.
    pub fn read_byte(&self, stdin: &mut impl Read, window: &Window) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match stdin.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    let _ = window.is_dirty();
                    continue;
                }
                Err(e) => return Err(e).context("stdin read failed"),
            }
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for Terminal {
    fn write_glyphs(&mut self, glyphs: &[Glyph]) {
        self.out.extend_from_slice(&encode_all(glyphs));
    }

    fn write_spaces(&mut self, count: usize) {
        self.out.resize(self.out.len() + count, b' ');
    }

    fn move_by(&mut self, from_abs_glyph_pos: usize, delta: i64) {
        if self.cols == 0 {
            if delta < 0 {
                move_left_n(&mut self.out, (-delta) as usize);
            }
            return;
        }

        let cols = i64::from(self.cols);
        let pos = from_abs_glyph_pos as i64;
        let row = pos / cols;
        let col = pos % cols;
        let to_pos = pos + delta;
        let to_row = to_pos / cols;
        let to_col = to_pos % cols;

        if to_col < col {
            move_left_n(&mut self.out, (col - to_col) as usize);
        } else if to_col > col {
            move_right_n(&mut self.out, (to_col - col) as usize);
        }
        if to_row < row {
            move_up_n(&mut self.out, (row - to_row) as usize);
        } else if to_row > row {
            move_down_n(&mut self.out, (to_row - row) as usize);
        }
    }
}

fn move_left_n(out: &mut Vec<u8>, n: usize) {
    if n == 0 {
        return;
    }
    if n == 1 {
        out.extend_from_slice(CUR_LEFT);
    } else {
        out.extend_from_slice(format!("\x1b[{n}D").as_bytes());
    }
}

fn move_right_n(out: &mut Vec<u8>, n: usize) {
    if n > 0 {
        out.extend_from_slice(format!("\x1b[{n}C").as_bytes());
    }
}

fn move_up_n(out: &mut Vec<u8>, n: usize) {
    if n > 0 {
        out.extend_from_slice(format!("\x1b[{n}A").as_bytes());
    }
}

fn move_down_n(out: &mut Vec<u8>, n: usize) {
    if n > 0 {
        out.extend_from_slice(format!("\x1b[{n}B").as_bytes());
    }
}

fn safe_write(mut data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    while !data.is_empty() {
        match stdout.write(data) {
            Ok(0) => return Err(anyhow::anyhow!("stdout write returned 0")),
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("stdout write failed"),
        }
    }
    stdout.flush().context("stdout flush failed")
}

extern "C" fn restore_raw_mode_atexit() {
    let _ = crossterm::terminal::disable_raw_mode();
}
