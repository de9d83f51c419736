// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Source context for diagnostics.

const SOURCE_UNAVAILABLE: &str = "<source unavailable>";

/// Mark the character at the 1-based `column` in red, or append a caret when
/// the column is past the end of the line.
pub fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let col = match column {
        Some(c) if c > 0 => c,
        _ => return line.to_string(),
    };
    let idx = col - 1;
    if idx >= line.len() || !line.is_char_boundary(idx) {
        if use_color {
            return format!("{line}\x1b[31m^\x1b[0m");
        }
        return format!("{line}^");
    }
    let (head, tail) = line.split_at(idx);
    let ch = tail.chars().next().unwrap_or(' ');
    let rest = &tail[ch.len_utf8()..];
    if use_color {
        format!("{head}\x1b[31m{ch}\x1b[0m{rest}")
    } else {
        format!("{head}{ch}{rest}")
    }
}

/// A caret line pointing at `column`, for output without colour.
pub fn caret_line(line: &str, column: usize) -> String {
    let idx = column.saturating_sub(1);
    let pad: String = line
        .chars()
        .take(idx)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let missing = idx.saturating_sub(pad.chars().count());
    format!("{pad}{}^", " ".repeat(missing))
}

/// `line | text` context for a diagnostic, with a caret line when colour is off.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    use_color: bool,
) -> Vec<String> {
    let line_idx = line_num.saturating_sub(1) as usize;
    let Some(line) = lines.and_then(|lines| lines.get(line_idx)) else {
        return vec![format!("{:>5} | {SOURCE_UNAVAILABLE}", line_num)];
    };

    let mut out = vec![format!(
        "{:>5} | {}",
        line_num,
        highlight_line(line, column, use_color)
    )];
    if let Some(col) = column.filter(|c| *c > 0 && !use_color) {
        out.push(format!("      | {}", caret_line(line, col)));
    }
    out
}
