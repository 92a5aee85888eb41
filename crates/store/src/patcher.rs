use crate::error::{Result, StoreError};

/// Replace the 1-indexed inclusive line range `start_line..=end_line` of
/// `text` with `replacement`.
///
/// Lines keep their original terminators. The replacement gets a trailing
/// newline appended when it lacks one, so the line after the patched range is
/// never merged into it. Validation happens before any splicing, so a failed
/// patch leaves nothing half-applied.
pub fn splice_lines(
    text: &str,
    start_line: usize,
    end_line: usize,
    replacement: &str,
) -> Result<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let line_count = lines.len();

    if start_line < 1 || end_line > line_count || start_line > end_line {
        return Err(StoreError::InvalidRange {
            start: start_line,
            end: end_line,
            line_count,
        });
    }

    let mut patched = String::with_capacity(text.len() + replacement.len() + 1);
    for line in &lines[..start_line - 1] {
        patched.push_str(line);
    }
    patched.push_str(replacement);
    if !replacement.ends_with('\n') {
        patched.push('\n');
    }
    for line in &lines[end_line..] {
        patched.push_str(line);
    }
    Ok(patched)
}
