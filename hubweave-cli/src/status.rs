use colored::*;

/// Tags are right-aligned to this width; continuation lines start past it.
const TAG_WIDTH: usize = 12;

pub enum Kind {
    Info,
    Done,
    Skipped,
    Warn,
    Fatal,
}

/// A tagged line of operator output, always on stderr
/// so generated programs can be piped from stdout.
pub struct Status(pub Kind, pub &'static str);

impl Status {
    pub fn info() -> Status {
        Status(Kind::Info, "Info")
    }
    pub fn created() -> Status {
        Status(Kind::Done, "Created")
    }
    pub fn generated() -> Status {
        Status(Kind::Done, "Generated")
    }
    pub fn sent() -> Status {
        Status(Kind::Done, "Sent")
    }
    /// A source file a build leaves out.
    pub fn skipped() -> Status {
        Status(Kind::Skipped, "Skipped")
    }
    pub fn warn() -> Status {
        Status(Kind::Warn, "Warning")
    }
    pub fn fatal() -> Status {
        Status(Kind::Fatal, "Fatal")
    }

    fn tag(&self) -> ColoredString {
        match self.0 {
            Kind::Info => self.1.blue(),
            Kind::Done => self.1.green(),
            Kind::Skipped => self.1.dimmed(),
            Kind::Warn => self.1.yellow(),
            Kind::Fatal => self.1.red(),
        }
        .bold()
    }

    /// The first line follows the tag, the rest line up beneath it,
    /// so listings of runs and missions read as one block.
    fn render(&self, message: &str) -> String {
        let mut lines = message.lines();
        let mut out = format!("{:>width$} {}\n", self.tag(), lines.next().unwrap_or(""), width = TAG_WIDTH);
        for line in lines {
            out.push_str(&format!("{:width$} {}\n", "", line, width = TAG_WIDTH));
        }
        out
    }

    pub fn log(&self, message: &str) {
        eprint!("{}", self.render(message));
    }

    /// A heading followed by one item per line, e.g. the runs a
    /// build found.
    pub fn report<T: AsRef<str>>(&self, heading: &str, items: &[T]) {
        let mut message = heading.to_string();
        for item in items {
            message.push_str("\n  ");
            message.push_str(item.as_ref());
        }
        self.log(&message);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn continuation_lines_align_with_the_message() {
        colored::control::set_override(false);
        let text = Status::generated().render("hub_main.py\nrun01\nrun02");
        assert_eq!(text, "   Generated hub_main.py\n             run01\n             run02\n");
    }

    #[test]
    fn empty_message_still_shows_the_tag() {
        colored::control::set_override(false);
        assert_eq!(Status::skipped().render(""), "     Skipped \n");
    }
}
