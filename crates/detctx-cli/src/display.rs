//! Terminal rendering of the widget's slots.

use detctx_widget::Slot;

/// Prints every render of one slot to stdout under a header.
pub struct TerminalSlot {
    name: &'static str,
}

impl TerminalSlot {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Slot for TerminalSlot {
    fn set_content(&self, html: &str) {
        let body = compact(html);
        if body.is_empty() {
            return;
        }
        println!("── {} ──", self.name);
        println!("{body}");
    }
}

/// Drop blank lines and indentation so fragments read well in a terminal.
pub fn compact(html: &str) -> String {
    html.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
