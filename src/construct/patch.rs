use std::ops::Range;

/// A set of byte-range replacements against one text.
/// Edits are applied back to front, so ranges always
/// refer to the original, unedited text.
#[derive(Debug, Default)]
pub struct Patch {
    edits: Vec<(Range<usize>, String)>,
}

impl Patch {
    pub fn new() -> Patch {
        Patch { edits: vec![] }
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.push((range, text.into()));
    }

    pub fn remove(&mut self, range: Range<usize>) {
        self.replace(range, String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies all edits. Overlapping edits keep the one starting first.
    pub fn apply(mut self, text: &str) -> String {
        self.edits.sort_by_key(|(range, _)| (range.start, range.end));

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (range, replacement) in self.edits {
            if range.start < cursor {
                continue;
            }
            output.push_str(&text[cursor..range.start]);
            output.push_str(&replacement);
            cursor = range.end;
        }
        output.push_str(&text[cursor..]);
        output
    }
}
