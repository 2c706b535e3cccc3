//! The command table and the input key-sequence recognizer/dispatcher.
//!
//! Input bytes accumulate in a [`SequenceAccumulator`]. After each byte,
//! [`sequence_status`] decides whether the accumulated bytes form a
//! complete token (a control byte, a printable byte, a multi-byte glyph, or
//! a closed ANSI escape sequence) or an incomplete prefix. Once complete,
//! [`dispatch`] looks the bytes up in the static [`Operation`] table;
//! misses fall back to text insertion or are discarded, per the byte's
//! leading bits.

use smallvec::SmallVec;

/// Capacity of the pending-sequence accumulator, matching the reference's
/// `seq[12]`.
pub const SEQUENCE_CAPACITY: usize = 12;

/// A named editing operation bound to one or more input byte sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CursorHome,
    CursorEnd,
    CursorLeft,
    CursorRight,
    WordLeft,
    WordRight,
    Backspace,
    DeleteForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteToEnd,
    DeleteToHome,
    Autocomplete,
    HistoryBack,
    HistoryForward,
    HistoryBegin,
    HistoryEnd,
    Submit,
}

/// Static association from exact input byte sequence to operation. Several
/// distinct sequences may map to the same operation: different terminal
/// emulators encode the same logical key differently.
const COMMANDS: &[(&[u8], Operation)] = &[
    (b"\x01", Operation::CursorHome),
    (b"\x1b[1~", Operation::CursorHome),
    (b"\x1b[H", Operation::CursorHome),
    (b"\x1bOH", Operation::CursorHome),
    (b"\x1bH", Operation::CursorHome),
    (b"\x05", Operation::CursorEnd),
    (b"\x1b[4~", Operation::CursorEnd),
    (b"\x1b[K", Operation::CursorEnd),
    (b"\x1bOF", Operation::CursorEnd),
    (b"\x02", Operation::CursorLeft),
    (b"\x1b[D", Operation::CursorLeft),
    (b"\x1bD", Operation::CursorLeft),
    (b"\x06", Operation::CursorRight),
    (b"\x1b[C", Operation::CursorRight),
    (b"\x1bC", Operation::CursorRight),
    (b"\x1bb", Operation::WordLeft),
    (b"\x1b[1;5D", Operation::WordLeft),
    (b"\x1bOD", Operation::WordLeft),
    (b"\x1bf", Operation::WordRight),
    (b"\x1b[1;5C", Operation::WordRight),
    (b"\x1bOC", Operation::WordRight),
    (b"\x08", Operation::Backspace),
    (b"\x7f", Operation::Backspace),
    (b"\x04", Operation::DeleteForward),
    (b"\x1b[3~", Operation::DeleteForward),
    (b"\x17", Operation::DeleteWordBackward),
    (b"\x1bd", Operation::DeleteWordForward),
    (b"\x0b", Operation::DeleteToEnd),
    (b"\x1bK", Operation::DeleteToEnd),
    (b"\x15", Operation::DeleteToHome),
    (b"\t", Operation::Autocomplete),
    (b"\x10", Operation::HistoryBack),
    (b"\x1b[A", Operation::HistoryBack),
    (b"\x1bA", Operation::HistoryBack),
    (b"\x0e", Operation::HistoryForward),
    (b"\x1b[B", Operation::HistoryForward),
    (b"\x1bB", Operation::HistoryForward),
    (b"\x1b<", Operation::HistoryBegin),
    (b"\x1b>", Operation::HistoryEnd),
    (b"\n", Operation::Submit),
    (b"\r", Operation::Submit),
];

/// Whether an accumulated input buffer forms a complete token yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStatus {
    /// More bytes are required before the buffer can be classified.
    Incomplete,
    /// The buffer is a complete token; dispatch it and start a fresh one.
    Ready,
}

/// Outcome of dispatching a complete token against the command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// The bytes exactly matched a bound operation.
    Operation(Operation),
    /// No binding matched; the bytes are text to insert verbatim.
    InsertText(&'a [u8]),
    /// No binding matched and the leading byte is a control byte with no
    /// text meaning; discard the token.
    Discard,
}

/// Classify the accumulated bytes in `buf` (non-empty) as complete or not.
///
/// Recognizes, in order: a plain control or printable byte, a multi-byte
/// UTF-8 glyph, an SS3 (`ESC O <final>`) or two-byte `ESC <letter>`
/// sequence, and a CSI (`ESC [ <digits/;>* <final>`) sequence. Anything
/// that cannot possibly complete (a stray continuation byte, an
/// unsupported 4-byte UTF-8 lead, an unterminated escape whose next byte
/// is itself not part of any recognized grammar) is also reported
/// `Ready` so the caller can dispatch it as a miss rather than stall
/// forever accumulating bytes that will never form a token.
pub fn sequence_status(buf: &[u8]) -> SeqStatus {
    debug_assert!(!buf.is_empty());
    let b0 = buf[0];

    if b0 != 0x1b {
        return match rline_codec::decode_one(buf) {
            Some(_) => SeqStatus::Ready,
            None => {
                if needs_more_codec_bytes(buf) {
                    SeqStatus::Incomplete
                } else {
                    SeqStatus::Ready
                }
            }
        };
    }

    // ESC alone: wait for the byte that decides the sequence shape.
    let Some(&b1) = buf.get(1) else {
        return SeqStatus::Incomplete;
    };

    if b1 == b'[' || b1 == b'O' {
        let mut i = 2;
        while let Some(&b) = buf.get(i) {
            if b.is_ascii_digit() || b == b';' {
                i += 1;
                continue;
            }
            return if (0x40..=0x7e).contains(&b) {
                SeqStatus::Ready
            } else {
                SeqStatus::Ready // not a valid final byte; give up on this token
            };
        }
        SeqStatus::Incomplete
    } else if (0x20..=0x7f).contains(&b1) {
        SeqStatus::Ready
    } else {
        // Byte after ESC is outside the recognized range; nothing further
        // would make this a valid token.
        SeqStatus::Ready
    }
}

/// True if `buf`'s leading byte starts a multi-byte UTF-8 form that simply
/// hasn't received all of its continuation bytes yet.
fn needs_more_codec_bytes(buf: &[u8]) -> bool {
    let b0 = buf[0];
    if b0 & 0xE0 == 0xC0 {
        buf.len() < 2
    } else if b0 & 0xF0 == 0xE0 {
        buf.len() < 3
    } else {
        false
    }
}

/// Look up a complete token and decide what to do with it.
pub fn dispatch(buf: &[u8]) -> Dispatch<'_> {
    debug_assert!(!buf.is_empty());
    if let Some((_, op)) = COMMANDS.iter().find(|(seq, _)| *seq == buf) {
        return Dispatch::Operation(*op);
    }
    if buf[0] >= 0x20 {
        Dispatch::InsertText(buf)
    } else {
        Dispatch::Discard
    }
}

/// Accumulates bytes of the input token currently being recognized.
#[derive(Debug, Default)]
pub struct SequenceAccumulator {
    buf: SmallVec<[u8; SEQUENCE_CAPACITY]>,
}

impl SequenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte, resetting first if the accumulator was already at
    /// capacity (a pathological, unrecognizable sequence).
    pub fn push(&mut self, byte: u8) {
        if self.buf.len() >= SEQUENCE_CAPACITY {
            tracing::trace!(target: "rline::keymap", "sequence accumulator overflow, resetting");
            self.buf.clear();
        }
        self.buf.push(byte);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_control_byte_is_ready() {
        assert_eq!(sequence_status(b"\x01"), SeqStatus::Ready);
    }

    #[test]
    fn printable_byte_is_ready() {
        assert_eq!(sequence_status(b"h"), SeqStatus::Ready);
    }

    #[test]
    fn esc_alone_is_incomplete() {
        assert_eq!(sequence_status(b"\x1b"), SeqStatus::Incomplete);
    }

    #[test]
    fn csi_prefix_with_digits_is_incomplete_until_final_byte() {
        assert_eq!(sequence_status(b"\x1b[1;5"), SeqStatus::Incomplete);
        assert_eq!(sequence_status(b"\x1b[1;5D"), SeqStatus::Ready);
    }

    #[test]
    fn ss3_sequence_is_ready_once_final_byte_arrives() {
        assert_eq!(sequence_status(b"\x1bO"), SeqStatus::Incomplete);
        assert_eq!(sequence_status(b"\x1bOH"), SeqStatus::Ready);
    }

    #[test]
    fn two_byte_esc_letter_is_ready() {
        assert_eq!(sequence_status(b"\x1bb"), SeqStatus::Ready);
    }

    #[test]
    fn multibyte_utf8_glyph_waits_for_continuation_bytes() {
        assert_eq!(sequence_status(&[0xE2]), SeqStatus::Incomplete);
        assert_eq!(sequence_status(&[0xE2, 0x82]), SeqStatus::Incomplete);
        assert_eq!(sequence_status(&[0xE2, 0x82, 0xAC]), SeqStatus::Ready);
    }

    #[test]
    fn dispatch_finds_exact_table_match() {
        assert_eq!(dispatch(b"\x01"), Dispatch::Operation(Operation::CursorHome));
        assert_eq!(
            dispatch(b"\x1b[1;5D"),
            Dispatch::Operation(Operation::WordLeft)
        );
        assert_eq!(dispatch(b"\r"), Dispatch::Operation(Operation::Submit));
    }

    #[test]
    fn dispatch_miss_on_printable_inserts_text() {
        assert_eq!(dispatch(b"h"), Dispatch::InsertText(b"h"));
    }

    #[test]
    fn dispatch_miss_on_control_byte_discards() {
        // \x1c (file separator) is a control byte bound to nothing.
        assert_eq!(dispatch(b"\x1c"), Dispatch::Discard);
    }

    #[test]
    fn accumulator_resets_on_overflow() {
        let mut acc = SequenceAccumulator::new();
        for _ in 0..SEQUENCE_CAPACITY {
            acc.push(b'\x1b');
        }
        assert_eq!(acc.as_slice().len(), SEQUENCE_CAPACITY);
        acc.push(b'x');
        assert_eq!(acc.as_slice(), b"x");
    }
}
