use anyhow::{Context, Result};
use memchr::memchr_iter;
use std::ops::Range;

/// A run of whole lines from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based number of the batch's first line.
    pub first_line: usize,
    pub line_count: usize,
    pub range: Range<usize>,
}

/// Splits `bytes` into newline-aligned batches of at most `lines_per_batch`
/// lines. A final line without a trailing newline is kept.
pub fn line_batches(bytes: &[u8], lines_per_batch: usize) -> Vec<Batch> {
    let lines_per_batch = lines_per_batch.max(1);
    let mut batches = Vec::new();
    let mut start = 0usize;
    let mut first_line = 1usize;
    let mut lines = 0usize;

    for nl in memchr_iter(b'\n', bytes) {
        lines += 1;
        if lines == lines_per_batch {
            batches.push(Batch {
                first_line,
                line_count: lines,
                range: start..nl + 1,
            });
            start = nl + 1;
            first_line += lines;
            lines = 0;
        }
    }
    if start < bytes.len() {
        let trailing = usize::from(bytes.last() != Some(&b'\n'));
        batches.push(Batch {
            first_line,
            line_count: lines + trailing,
            range: start..bytes.len(),
        });
    }
    batches
}

pub fn batch_text<'a>(bytes: &'a [u8], batch: &Batch) -> Result<&'a str> {
    std::str::from_utf8(&bytes[batch.range.clone()]).with_context(|| {
        format!(
            "lines {}..{} are not valid UTF-8",
            batch.first_line,
            batch.first_line + batch.line_count
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple() {
        let input = b"a\nb\nc\nd\n";
        let batches = line_batches(input, 2);
        assert_eq!(
            batches,
            vec![
                Batch { first_line: 1, line_count: 2, range: 0..4 },
                Batch { first_line: 3, line_count: 2, range: 4..8 },
            ]
        );
    }

    #[test]
    fn trailing_line_without_newline() {
        let input = b"a\nb\nc";
        let batches = line_batches(input, 2);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], Batch { first_line: 3, line_count: 1, range: 4..5 });
        assert_eq!(batch_text(input, &batches[1]).unwrap(), "c");
    }

    #[test]
    fn partial_last_batch() {
        let input = b"a\nb\nc\n";
        let batches = line_batches(input, 2);
        assert_eq!(batches[1], Batch { first_line: 3, line_count: 1, range: 4..6 });
    }

    #[test]
    fn empty_input_and_zero_batch_size() {
        assert!(line_batches(b"", 10).is_empty());
        assert_eq!(line_batches(b"a\nb\n", 0).len(), 2);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let input = b"ok\n\xff\xfe\n";
        let batches = line_batches(input, 1);
        assert!(batch_text(input, &batches[0]).is_ok());
        let err = batch_text(input, &batches[1]).unwrap_err();
        assert!(err.to_string().contains("lines 2..3"));
    }
}
