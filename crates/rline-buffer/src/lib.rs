//! The glyph-level edit buffer: the line under construction, its cursor,
//! and the primitive mutations that keep the on-screen representation in
//! sync with the in-memory glyph sequence.
//!
//! Mutations never touch bytes directly; [`rline_codec`] is the only
//! byte/glyph bridge, applied at the session boundary. Every mutation here
//! drives a [`Screen`] to redraw exactly the cells that changed, following
//! the tail-redraw discipline: whenever the suffix from the cursor
//! changes, write the new suffix, write `afterspace` blanks to erase
//! overrun, then retreat the cursor by `suffix_len + afterspace`. That is
//! the only way stale cells get erased.

use rline_codec::Glyph;

/// The write-side of the terminal as seen by the edit buffer: able to
/// print glyphs/blanks (which advance the terminal's own cursor) and to
/// move the cursor by a glyph delta without printing anything.
///
/// `move_by` receives the *absolute* glyph column the cursor currently
/// occupies (prompt width plus in-line offset) so an implementation can
/// derive row/column deltas against the current window width without the
/// edit buffer needing to know about wrapping at all.
pub trait Screen {
    fn write_glyphs(&mut self, glyphs: &[Glyph]);
    fn write_spaces(&mut self, count: usize);
    fn move_by(&mut self, from_abs_glyph_pos: usize, delta: i64);
}

/// Line capacity used when a caller doesn't override it.
pub const DEFAULT_MAX_LEN: usize = 1024;

/// The line under construction: glyphs, cursor, capacity, and the prompt
/// that precedes it on screen (needed for absolute column math).
#[derive(Debug)]
pub struct EditBuffer {
    line: Vec<Glyph>,
    cursor: usize,
    max_len: usize,
    prompt: Vec<Glyph>,
}

impl EditBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            line: Vec::new(),
            cursor: 0,
            max_len,
            prompt: Vec::new(),
        }
    }

    /// Record the prompt glyphs and their width, used by every absolute
    /// column computation from here on. Does not draw anything; the
    /// caller is expected to have printed the prompt itself.
    pub fn set_prompt(&mut self, prompt: Vec<Glyph>) {
        self.prompt = prompt;
    }

    pub fn prompt_width(&self) -> usize {
        self.prompt.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.line
    }

    /// The cursor's absolute column: prompt width plus in-line offset.
    pub fn abs_pos(&self) -> usize {
        self.prompt_width() + self.cursor
    }

    /// Invariant checked by callers (and by every test): `0 <= cursor <=
    /// length <= max_len`.
    pub fn check_invariant(&self) {
        debug_assert!(self.cursor <= self.line.len());
        debug_assert!(self.line.len() <= self.max_len);
    }

    pub fn cursor_home(&mut self, screen: &mut impl Screen) {
        screen.move_by(self.abs_pos(), -(self.cursor as i64));
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self, screen: &mut impl Screen) {
        let tail = self.line[self.cursor..].to_vec();
        screen.write_glyphs(&tail);
        self.cursor = self.line.len();
    }

    pub fn cursor_left(&mut self, screen: &mut impl Screen) {
        if self.cursor > 0 {
            screen.move_by(self.abs_pos(), -1);
            self.cursor -= 1;
        }
    }

    pub fn cursor_right(&mut self, screen: &mut impl Screen) {
        if self.cursor < self.line.len() {
            let glyph = [self.line[self.cursor]];
            screen.write_glyphs(&glyph);
            self.cursor += 1;
        }
    }

    /// Skip contiguous spaces to the left, then non-spaces to the left.
    pub fn word_left(&mut self, screen: &mut impl Screen) {
        if self.cursor == 0 {
            return;
        }
        let mut pos = self.cursor;
        while pos > 0 && self.line[pos - 1] == b' ' as Glyph {
            pos -= 1;
        }
        while pos > 0 && self.line[pos - 1] != b' ' as Glyph {
            pos -= 1;
        }
        let delta = pos as i64 - self.cursor as i64;
        screen.move_by(self.abs_pos(), delta);
        self.cursor = pos;
    }

    /// Skip non-spaces then spaces forward. A "word" is a maximal run of
    /// non-space glyphs.
    fn next_word_boundary(&self) -> usize {
        let len = self.line.len();
        let mut pos = self.cursor;
        while pos < len && self.line[pos] != b' ' as Glyph {
            pos += 1;
        }
        while pos < len && self.line[pos] == b' ' as Glyph {
            pos += 1;
        }
        pos
    }

    pub fn word_right(&mut self, screen: &mut impl Screen) {
        if self.cursor >= self.line.len() {
            return;
        }
        let pos = self.next_word_boundary();
        let run = self.line[self.cursor..pos].to_vec();
        screen.write_glyphs(&run);
        self.cursor = pos;
    }

    /// Remove up to `count` glyphs starting at the cursor; if fewer
    /// remain, delete what exists. Returns the number actually removed.
    pub fn delete_n(&mut self, screen: &mut impl Screen, count: usize) -> usize {
        if count == 0 || self.cursor >= self.line.len() {
            return 0;
        }
        let tail = self.line.len() - self.cursor;
        let count = count.min(tail);
        self.line.drain(self.cursor..self.cursor + count);
        self.update_tail(screen, count);
        count
    }

    pub fn backspace(&mut self, screen: &mut impl Screen) {
        if self.cursor > 0 {
            screen.move_by(self.abs_pos(), -1);
            self.cursor -= 1;
            self.delete_n(screen, 1);
        }
    }

    pub fn delete_word_forward(&mut self, screen: &mut impl Screen) -> usize {
        let end = self.next_word_boundary();
        self.delete_n(screen, end - self.cursor)
    }

    pub fn delete_word_backward(&mut self, screen: &mut impl Screen) -> usize {
        let end = self.cursor;
        self.word_left(screen);
        self.delete_n(screen, end - self.cursor)
    }

    pub fn delete_to_home(&mut self, screen: &mut impl Screen) -> usize {
        let len = self.cursor;
        self.cursor_home(screen);
        self.delete_n(screen, len)
    }

    pub fn delete_to_end(&mut self, screen: &mut impl Screen) -> usize {
        let count = self.line.len() - self.cursor;
        self.delete_n(screen, count)
    }

    /// Splice a glyph sequence at the cursor, truncating to available
    /// capacity. Returns the number of glyphs actually inserted.
    pub fn insert(&mut self, screen: &mut impl Screen, seq: &[Glyph]) -> usize {
        let max_count = self.max_len.saturating_sub(self.line.len());
        let count = seq.len().min(max_count);
        if count == 0 {
            return 0;
        }
        self.line
            .splice(self.cursor..self.cursor, seq[..count].iter().copied());
        let written = self.line[self.cursor..self.cursor + count].to_vec();
        screen.write_glyphs(&written);
        self.cursor += count;
        self.update_tail(screen, 0);
        count
    }

    /// Replace the entire line with `glyphs`; cursor moves to the end.
    /// When `redraw` is set, the old line is erased first (cursor moved
    /// home) and the new line plus any shrinkage blanks are drawn.
    pub fn set_text(&mut self, screen: &mut impl Screen, glyphs: &[Glyph], redraw: bool) {
        if redraw {
            self.cursor_home(screen);
        }

        let old_len = self.line.len();
        let new_len = glyphs.len().min(self.max_len);
        self.line = glyphs[..new_len].to_vec();
        self.cursor = new_len;

        if redraw {
            let content = self.line.clone();
            screen.write_glyphs(&content);
            if old_len > new_len {
                self.update_tail(screen, old_len - new_len);
            }
        }
    }

    /// Redraw the prompt and the line from scratch (used for window
    /// resize and after a completion menu/hint is printed below the
    /// line). When `inplace`, the cursor is first walked back to column 0
    /// before reprinting; `tail_spaces` blanks are appended past the line
    /// to clear any vestigial cells.
    pub fn redraw(&mut self, screen: &mut impl Screen, inplace: bool, tail_spaces: usize) {
        if inplace {
            let abs = self.abs_pos();
            screen.move_by(abs, -(abs as i64));
        }
        let prompt = self.prompt.clone();
        screen.write_glyphs(&prompt);
        let head = self.line[..self.cursor].to_vec();
        screen.write_glyphs(&head);
        self.update_tail(screen, tail_spaces);
    }

    /// Write the suffix from the cursor to the end of the line, then
    /// `afterspace` blanks to erase overrun, then retreat the cursor by
    /// `suffix_len + afterspace` glyphs. This is the only place stale
    /// cells get erased.
    fn update_tail(&mut self, screen: &mut impl Screen, afterspace: usize) {
        let suffix = self.line[self.cursor..].to_vec();
        screen.write_glyphs(&suffix);
        screen.write_spaces(afterspace);

        let back = suffix.len() + afterspace;
        if back > 0 {
            let hypothetical_abs = self.prompt_width() + self.cursor + back;
            screen.move_by(hypothetical_abs, -(back as i64));
        }
    }
}
