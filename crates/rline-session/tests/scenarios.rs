//! End-to-end scenarios over the editing state machine: edit buffer,
//! recognizer/dispatcher, history and completion wired together exactly as
//! [`rline_session::Session`] wires them, driven against a recording
//! in-process screen instead of a real terminal (raw mode needs an actual
//! tty, which a test process doesn't have).

use rline_buffer::{EditBuffer, Screen};
use rline_codec::{Glyph, decode_all, encode_all};
use rline_completion::{Completer, MenuSink};
use rline_history::History;
use rline_keymap::{Dispatch, Operation, SeqStatus, SequenceAccumulator, dispatch, sequence_status};

#[derive(Debug, Default)]
struct Recorder {
    written: Vec<Glyph>,
}

impl Screen for Recorder {
    fn write_glyphs(&mut self, glyphs: &[Glyph]) {
        self.written.extend_from_slice(glyphs);
    }
    fn write_spaces(&mut self, count: usize) {
        self.written.extend(std::iter::repeat(b' ' as Glyph).take(count));
    }
    fn move_by(&mut self, _from_abs_glyph_pos: usize, _delta: i64) {}
}

#[derive(Default)]
struct NullMenu;

impl MenuSink for NullMenu {
    fn columns(&self) -> u16 {
        80
    }
    fn sort_hints(&self) -> bool {
        false
    }
    fn print_lines(&mut self, _lines: &[String]) {}
}

/// Feeds `input` through the recognizer/dispatcher exactly as
/// `Session::readline_interactive` does, returning the submitted line once
/// `Operation::Submit` fires.
fn run(
    buffer: &mut EditBuffer,
    screen: &mut Recorder,
    history: &mut History,
    completer: &mut dyn Completer,
    input: &[u8],
) -> String {
    let mut acc = SequenceAccumulator::new();
    for &byte in input {
        acc.push(byte);
        if sequence_status(acc.as_slice()) == SeqStatus::Incomplete {
            continue;
        }
        let token = acc.as_slice().to_vec();
        acc.clear();

        match dispatch(&token) {
            Dispatch::InsertText(bytes) => {
                let glyphs = decode_all(bytes);
                buffer.insert(screen, &glyphs);
            }
            Dispatch::Discard => {}
            Dispatch::Operation(Operation::Submit) => break,
            Dispatch::Operation(op) => apply(op, buffer, screen, history, completer),
        }
        buffer.check_invariant();
    }

    buffer.cursor_end(screen);
    String::from_utf8(encode_all(buffer.glyphs())).unwrap()
}

fn apply(
    op: Operation,
    buffer: &mut EditBuffer,
    screen: &mut Recorder,
    history: &mut History,
    completer: &mut dyn Completer,
) {
    match op {
        Operation::CursorHome => buffer.cursor_home(screen),
        Operation::CursorEnd => buffer.cursor_end(screen),
        Operation::CursorLeft => buffer.cursor_left(screen),
        Operation::CursorRight => buffer.cursor_right(screen),
        Operation::WordLeft => buffer.word_left(screen),
        Operation::WordRight => buffer.word_right(screen),
        Operation::Backspace => buffer.backspace(screen),
        Operation::DeleteForward => {
            buffer.delete_n(screen, 1);
        }
        Operation::DeleteWordBackward => {
            buffer.delete_word_backward(screen);
        }
        Operation::DeleteWordForward => {
            buffer.delete_word_forward(screen);
        }
        Operation::DeleteToEnd => {
            buffer.delete_to_end(screen);
        }
        Operation::DeleteToHome => {
            buffer.delete_to_home(screen);
        }
        Operation::Autocomplete => {
            let line = encode_all(buffer.glyphs());
            let cursor = encode_all(&buffer.glyphs()[..buffer.cursor()]).len();
            let mut menu = NullMenu;
            if let Some(text) = completer.complete(&line, cursor, &mut menu) {
                if !text.is_empty() {
                    buffer.insert(screen, &decode_all(text.as_bytes()));
                }
            }
        }
        Operation::HistoryBack | Operation::HistoryForward | Operation::HistoryBegin
        | Operation::HistoryEnd => {
            let current = String::from_utf8(encode_all(buffer.glyphs())).unwrap();
            let recalled = match op {
                Operation::HistoryBack => history.back(&current).map(str::to_string),
                Operation::HistoryForward => history.forward().map(str::to_string),
                Operation::HistoryBegin => history.begin(&current).map(str::to_string),
                Operation::HistoryEnd => history.end().map(str::to_string),
                _ => unreachable!(),
            };
            if let Some(line) = recalled {
                buffer.set_text(screen, &decode_all(line.as_bytes()), true);
            }
        }
        Operation::Submit => unreachable!("handled by the caller"),
    }
}

struct NoopCompleter;
impl Completer for NoopCompleter {
    fn complete(&mut self, _line: &[u8], _cursor: usize, _menu: &mut dyn MenuSink) -> Option<String> {
        None
    }
}

#[test]
fn e1_plain_text_and_submit() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    let mut completer = NoopCompleter;

    let line = run(&mut buffer, &mut screen, &mut history, &mut completer, b"hi\r");
    assert_eq!(line, "hi");

    history.add(&line);
    assert_eq!(history.back(""), Some("hi"));
}

#[test]
fn e2_backspace_past_empty_is_noop() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    let mut completer = NoopCompleter;

    let line = run(
        &mut buffer,
        &mut screen,
        &mut history,
        &mut completer,
        b"\x7f\x7fa\r",
    );
    assert_eq!(line, "a");
}

#[test]
fn e3_delete_word_backward() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    let mut completer = NoopCompleter;

    buffer.set_text(&mut screen, &decode_all(b"foo bar baz"), true);
    let line = run(&mut buffer, &mut screen, &mut history, &mut completer, b"\x17\r");
    assert_eq!(line, "foo bar ");
}

#[test]
fn e4_history_recall_two_prior_submissions() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    history.add("one");
    history.add("two");
    let mut completer = NoopCompleter;

    // two C-p (\x10) then submit.
    let line = run(
        &mut buffer,
        &mut screen,
        &mut history,
        &mut completer,
        b"\x10\x10\r",
    );
    assert_eq!(line, "one");
}

#[test]
fn e5_utf8_round_trip() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    let mut completer = NoopCompleter;

    let line = run(
        &mut buffer,
        &mut screen,
        &mut history,
        &mut completer,
        &[0xC3, 0xA9, b'\r'],
    );
    assert_eq!(line.as_bytes(), [0xC3, 0xA9]);
    assert_eq!(buffer.len(), 1);
}

#[test]
fn e6_completion_inserts_verbatim_at_cursor() {
    struct StatusCompleter;
    impl Completer for StatusCompleter {
        fn complete(
            &mut self,
            line: &[u8],
            cursor: usize,
            _menu: &mut dyn MenuSink,
        ) -> Option<String> {
            assert_eq!(line, b"sys");
            assert_eq!(cursor, 3);
            Some("status ".to_string())
        }
    }

    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    let mut completer = StatusCompleter;

    buffer.set_text(&mut screen, &decode_all(b"sys"), true);
    let line = run(&mut buffer, &mut screen, &mut history, &mut completer, b"\t\r");
    assert_eq!(line, "sysstatus ");
}

#[test]
fn history_scratch_is_preserved_across_navigation() {
    let mut buffer = EditBuffer::new(1024);
    let mut screen = Recorder::default();
    let mut history = History::new(10);
    history.add("committed");

    buffer.set_text(&mut screen, &decode_all(b"in progress"), true);
    let current = String::from_utf8(encode_all(buffer.glyphs())).unwrap();
    let recalled = history.back(&current).unwrap().to_string();
    buffer.set_text(&mut screen, &decode_all(recalled.as_bytes()), true);
    assert_eq!(buffer.glyphs(), decode_all(b"committed").as_slice());

    let restored = history.forward().unwrap().to_string();
    buffer.set_text(&mut screen, &decode_all(restored.as_bytes()), true);
    assert_eq!(buffer.glyphs(), decode_all(b"in progress").as_slice());
}
