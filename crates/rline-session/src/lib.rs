//! Ties the lower crates together into the single public entry point:
//! [`Session::readline`]. Owns the edit buffer, the terminal, the window
//! tracker, and the history, and runs the byte-read / recognize / dispatch
//! loop described by the reference's state machine.

pub mod config;

use std::io::{self, BufRead, IsTerminal, Read};

use anyhow::{Context, Result};
use rline_buffer::{EditBuffer, Screen};
use rline_codec::{decode_all, encode_all};
use rline_completion::{Completer, MenuSink};
use rline_history::History;
use rline_keymap::{Dispatch, Operation, SeqStatus, SequenceAccumulator, dispatch, sequence_status};
use rline_terminal::Terminal;
use rline_window::Window;

pub use config::Config;

/// Ties terminal, window, edit buffer, history and completion together for
/// one or more [`readline`](Session::readline) calls. Only one `Session`
/// should be live per process: the terminal and its signal dispositions are
/// process-global resources.
pub struct Session {
    config: Config,
    terminal: Terminal,
    window: Window,
    history: History,
    completer: Box<dyn Completer>,
}

impl Session {
    /// Create session state: install the resize handler and restore history
    /// from `config.history_file` if set (a missing or unreadable file is
    /// not an error — the session just starts with empty history).
    pub fn new(config: Config, completer: Box<dyn Completer>) -> Result<Self> {
        let window = Window::install(config.window_width).context("installing window tracker")?;
        let mut history = History::new(config.history_depth);
        if let Some(path) = &config.history_file {
            if let Err(err) = history.restore(path) {
                tracing::debug!(target: "rline::session", %err, "no history restored");
            }
        }
        Ok(Self {
            config,
            terminal: Terminal::new(),
            window,
            history,
            completer,
        })
    }

    /// Persist history to `config.history_file` if set. Failure is logged
    /// and otherwise ignored; the caller is always free to drop the
    /// session regardless.
    pub fn shutdown(&mut self) {
        if let Some(path) = &self.config.history_file {
            if let Err(err) = self.history.save(path) {
                tracing::debug!(target: "rline::session", %err, "history not saved");
            }
        }
    }

    /// Run one editing cycle. If standard input is not a terminal, this
    /// degrades to reading a single line from standard input without
    /// entering raw mode. Returns `Ok(None)` on end-of-input.
    pub fn readline(&mut self, prompt: &str, seed: Option<&str>) -> Result<Option<String>> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return read_line_cooked(stdin.lock());
        }
        self.readline_interactive(prompt, seed, &mut stdin.lock())
    }

    fn readline_interactive(
        &mut self,
        prompt: &str,
        seed: Option<&str>,
        input: &mut impl Read,
    ) -> Result<Option<String>> {
        let mut buffer = EditBuffer::new(self.config.max_len);
        let prompt_glyphs = decode_all(prompt.as_bytes());
        buffer.set_prompt(prompt_glyphs.clone());

        self.terminal.enter_raw()?;
        self.terminal.enable_autowrap();
        self.terminal.write_glyphs(&prompt_glyphs);
        if let Some(seed) = seed {
            let seed_glyphs = decode_all(seed.as_bytes());
            buffer.set_text(&mut self.terminal, &seed_glyphs, true);
        }
        if self.terminal.purge().is_err() {
            self.terminal.fatal_exit(1);
        }

        let mut acc = SequenceAccumulator::new();
        let result = loop {
            if self.window.is_dirty() {
                self.handle_resize(&mut buffer);
            }

            let byte = match self.terminal.read_byte(input, &self.window) {
                Ok(Some(b)) => b,
                Ok(None) => break None,
                Err(_) => self.terminal.fatal_exit(1),
            };
            acc.push(byte);

            if sequence_status(acc.as_slice()) == SeqStatus::Incomplete {
                continue;
            }

            let finish = self.dispatch_token(&mut buffer, acc.as_slice());
            acc.clear();
            if let Err(_err) = self.terminal.purge() {
                self.terminal.fatal_exit(1);
            }
            if finish {
                break Some(());
            }
        };

        buffer.cursor_end(&mut self.terminal);
        let line_bytes = encode_all(buffer.glyphs());
        let _ = self.terminal.leave_raw();
        self.terminal.carriage_return();
        self.terminal.push_raw(b"\n");
        let _ = self.terminal.purge();

        match result {
            Some(()) => {
                let line = String::from_utf8_lossy(&line_bytes).into_owned();
                self.history.add(&line);
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    fn handle_resize(&mut self, buffer: &mut EditBuffer) {
        let resize = self.window.refresh();
        self.terminal.set_columns(resize.new_cols);
        let tail = Window::redraw_tail_len(resize, buffer.prompt_width(), buffer.len());
        buffer.redraw(&mut self.terminal, true, tail);
        let _ = self.terminal.purge();
    }

    /// Dispatch one complete input token. Returns `true` if the editing
    /// loop should end (the user submitted the line).
    fn dispatch_token(&mut self, buffer: &mut EditBuffer, token: &[u8]) -> bool {
        match dispatch(token) {
            Dispatch::Operation(op) => self.dispatch_operation(buffer, op),
            Dispatch::InsertText(bytes) => {
                let glyphs = decode_all(bytes);
                buffer.insert(&mut self.terminal, &glyphs);
                false
            }
            Dispatch::Discard => false,
        }
    }

    fn dispatch_operation(&mut self, buffer: &mut EditBuffer, op: Operation) -> bool {
        match op {
            Operation::CursorHome => buffer.cursor_home(&mut self.terminal),
            Operation::CursorEnd => buffer.cursor_end(&mut self.terminal),
            Operation::CursorLeft => buffer.cursor_left(&mut self.terminal),
            Operation::CursorRight => buffer.cursor_right(&mut self.terminal),
            Operation::WordLeft => buffer.word_left(&mut self.terminal),
            Operation::WordRight => buffer.word_right(&mut self.terminal),
            Operation::Backspace => buffer.backspace(&mut self.terminal),
            Operation::DeleteForward => {
                buffer.delete_n(&mut self.terminal, 1);
            }
            Operation::DeleteWordBackward => {
                buffer.delete_word_backward(&mut self.terminal);
            }
            Operation::DeleteWordForward => {
                buffer.delete_word_forward(&mut self.terminal);
            }
            Operation::DeleteToEnd => {
                buffer.delete_to_end(&mut self.terminal);
            }
            Operation::DeleteToHome => {
                buffer.delete_to_home(&mut self.terminal);
            }
            Operation::Autocomplete => self.complete(buffer),
            Operation::HistoryBack => self.history_navigate(buffer, HistoryStep::Back),
            Operation::HistoryForward => self.history_navigate(buffer, HistoryStep::Forward),
            Operation::HistoryBegin => self.history_navigate(buffer, HistoryStep::Begin),
            Operation::HistoryEnd => self.history_navigate(buffer, HistoryStep::End),
            Operation::Submit => return true,
        }
        false
    }

    fn complete(&mut self, buffer: &mut EditBuffer) {
        let line_bytes = encode_all(buffer.glyphs());
        let cursor_bytes = encode_all(&buffer.glyphs()[..buffer.cursor()]).len();
        let mut menu = TerminalMenu {
            terminal: &mut self.terminal,
            sort_hints: self.config.sort_hints,
            printed: false,
        };
        let insertion = self
            .completer
            .complete(&line_bytes, cursor_bytes, &mut menu);
        let printed = menu.printed;

        if let Some(text) = insertion {
            if !text.is_empty() {
                let glyphs = decode_all(text.as_bytes());
                buffer.insert(&mut self.terminal, &glyphs);
            }
        }
        if printed {
            self.terminal.carriage_return();
            self.terminal.push_raw(b"\n");
            buffer.redraw(&mut self.terminal, false, 0);
        }
    }

    fn history_navigate(&mut self, buffer: &mut EditBuffer, step: HistoryStep) {
        let current_bytes = encode_all(buffer.glyphs());
        let current = String::from_utf8_lossy(&current_bytes).into_owned();
        let recalled = match step {
            HistoryStep::Back => self.history.back(&current).map(str::to_string),
            HistoryStep::Forward => self.history.forward().map(str::to_string),
            HistoryStep::Begin => self.history.begin(&current).map(str::to_string),
            HistoryStep::End => self.history.end().map(str::to_string),
        };
        if let Some(line) = recalled {
            let glyphs = decode_all(line.as_bytes());
            buffer.set_text(&mut self.terminal, &glyphs, true);
        }
    }
}

enum HistoryStep {
    Back,
    Forward,
    Begin,
    End,
}

/// Adapts [`Terminal`] to the completion crate's rendering contract: print
/// menu/hint lines below the line in progress. `printed` records whether
/// anything was drawn, so the session knows whether a final redraw of the
/// prompt and line is needed afterward.
struct TerminalMenu<'a> {
    terminal: &'a mut Terminal,
    sort_hints: bool,
    printed: bool,
}

impl MenuSink for TerminalMenu<'_> {
    fn columns(&self) -> u16 {
        self.terminal.columns()
    }

    fn sort_hints(&self) -> bool {
        self.sort_hints
    }

    fn print_lines(&mut self, lines: &[String]) {
        for line in lines {
            self.terminal.carriage_return();
            self.terminal.push_raw(b"\n");
            self.terminal.push_raw(line.as_bytes());
        }
        self.printed = true;
    }
}

fn read_line_cooked(mut reader: impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).context("reading from stdin")?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}
