//! The completion bridge: the callback contract the session invokes on the
//! completion key, plus the two auxiliary rendering services (`print_options`,
//! `print_hint`) a callback can use to draw a menu or a hint line below the
//! line being edited.

/// What a [`Completer`] needs to draw below the edited line. `columns` and
/// `sort_hints` mirror the session's window width and `SORT_HINTS`
/// configuration; `print_lines` is the only required method, the other two
/// are convenience wrappers around [`dump_options`]/[`dump_hint`].
pub trait MenuSink {
    fn columns(&self) -> u16;
    fn sort_hints(&self) -> bool;
    fn print_lines(&mut self, lines: &[String]);

    fn print_options(&mut self, options: &mut [String]) {
        let lines = dump_options(self.columns(), options, self.sort_hints());
        self.print_lines(&lines);
    }

    fn print_hint(&mut self, text: &str) {
        self.print_lines(&dump_hint(text));
    }
}

/// Application-supplied completion logic. Given the line in byte form and
/// the cursor's byte offset, it either returns a string to insert verbatim
/// at the cursor, or prints a menu/hint through `menu` and returns `None`.
/// An empty string is treated the same as `None`: no insertion.
pub trait Completer {
    fn complete(&mut self, line: &[u8], cursor: usize, menu: &mut dyn MenuSink) -> Option<String>;
}

impl<F> Completer for F
where
    F: FnMut(&[u8], usize, &mut dyn MenuSink) -> Option<String>,
{
    fn complete(&mut self, line: &[u8], cursor: usize, menu: &mut dyn MenuSink) -> Option<String> {
        self(line, cursor, menu)
    }
}

/// Render `options` as evenly sized left-justified columns that fit
/// `columns` characters of width, row-major, one string per row.
///
/// Column width is the longest option plus two; the column count is
/// `columns / col_width`, floored to at least one so a single
/// wider-than-the-window option still gets its own row.
///
/// When `sort` is set, `options` is sorted in place — the caller's slice is
/// left sorted afterward, not just the rendered rows.
pub fn dump_options(columns: u16, options: &mut [String], sort: bool) -> Vec<String> {
    if options.is_empty() {
        return Vec::new();
    }
    if sort {
        options.sort();
    }

    let col_width = options.iter().map(|s| s.chars().count()).max().unwrap_or(0) + 2;
    let cols = (columns as usize / col_width).max(1);

    options
        .chunks(cols)
        .map(|row| {
            let mut line = String::with_capacity(col_width * row.len());
            for opt in row {
                line.push_str(opt);
                let pad = col_width.saturating_sub(opt.chars().count());
                line.extend(std::iter::repeat(' ').take(pad));
            }
            line
        })
        .collect()
}

/// Render a single arbitrary hint line.
pub fn dump_hint(text: &str) -> Vec<String> {
    vec![text.to_string()]
}
