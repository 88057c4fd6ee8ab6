use crate::construct::line::{physical_lines, Script};

/// Width of one indentation level in generated code.
pub const INDENT: usize = 4;

/// Accumulates generated program text, tracking the nesting depth
/// of the block currently being written.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    depth: usize,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    pub fn enter_scope(&mut self) {
        self.depth += 1;
    }

    pub fn exit_scope(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn prefix(&self) -> String {
        " ".repeat(self.depth * INDENT)
    }

    /// Writes one line at the current depth.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            self.out.push_str(&self.prefix());
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Writes a header line, then runs `body` one level deeper.
    pub fn block(&mut self, header: &str, body: impl FnOnce(&mut Emitter)) {
        self.line(header);
        self.enter_scope();
        body(self);
        self.exit_scope();
    }

    /// Writes generated text, which never contains multi-line strings,
    /// shifting each of its lines to the current depth.
    pub fn text(&mut self, text: &str) {
        for line in physical_lines(text) {
            self.line(line);
        }
    }

    /// Splices user code at the current depth.
    /// Lines that begin inside a string literal are kept as they are.
    pub fn script(&mut self, script: &Script) {
        let indented = script.indent(self.depth * INDENT);
        let trimmed = indented.trim_end_matches('\n');
        if !trimmed.trim().is_empty() {
            self.out.push_str(trimmed);
            self.out.push('\n');
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}
