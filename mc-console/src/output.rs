use std::{
    io::Write,
    sync::Arc,
};

pub type SharedPane = Arc<tokio::sync::Mutex<OutputPane>>;

/// The single output pane.
///
/// Polling replaces its contents wholesale, push appends, and dispatch
/// clears. Printing covers only text the operator has not seen yet,
/// the terminal stand-in for scrolling the output region to the
/// bottom; a snapshot that rewrote already-shown text is reprinted in
/// full after a blank line.
#[derive(Default)]
pub struct OutputPane {
    text: String,
    printed: usize,
}

impl OutputPane {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// New run dispatched: drop everything. The terminal keeps its
    /// scrollback, nothing is reprinted.
    pub fn clear(&mut self) {
        self.text.clear();
        self.printed = 0;
    }

    /// Snapshot semantics: the pane becomes exactly `snapshot`.
    pub fn replace(&mut self, snapshot: &str) {
        let extends = snapshot.starts_with(&self.text[..self.printed]);
        let start = if extends { self.printed } else { 0 };
        if !extends && self.printed > 0 {
            print_chunk("\n");
        }
        self.text.clear();
        self.text.push_str(snapshot);
        if start < self.text.len() {
            print_chunk(&self.text[start..]);
        }
        self.printed = self.text.len();
    }

    /// Append semantics: used by push delivery and by the fixed error
    /// marker lines of both variants.
    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        print_chunk(chunk);
        self.printed = self.text.len();
    }
}

fn print_chunk(chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(chunk.as_bytes());
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_substitutes_the_whole_snapshot() {
        let mut pane = OutputPane::default();
        pane.replace("scanning...");
        assert_eq!(pane.text(), "scanning...");
        pane.replace("scan completed");
        assert_eq!(pane.text(), "scan completed");
    }

    #[test]
    fn append_concatenates_in_arrival_order() {
        let mut pane = OutputPane::default();
        pane.append("line 1\n");
        pane.append("line 2\n");
        assert_eq!(pane.text(), "line 1\nline 2\n");
    }

    #[test]
    fn clear_empties_the_pane() {
        let mut pane = OutputPane::default();
        pane.append("stale output");
        pane.clear();
        assert!(pane.is_empty());
        assert_eq!(pane.printed, 0);
    }

    #[test]
    fn error_marker_appends_after_replace() {
        let mut pane = OutputPane::default();
        pane.replace("partial log");
        pane.append("\n[!] Output polling failed.");
        assert_eq!(pane.text(), "partial log\n[!] Output polling failed.");
    }

    #[test]
    fn growing_snapshot_tracks_printed_prefix() {
        let mut pane = OutputPane::default();
        pane.replace("one\n");
        assert_eq!(pane.printed, 4);
        pane.replace("one\ntwo\n");
        assert_eq!(pane.printed, 8);
        assert_eq!(pane.text(), "one\ntwo\n");
    }

    #[test]
    fn rewritten_snapshot_still_wins() {
        let mut pane = OutputPane::default();
        pane.replace("first pass");
        pane.replace("different text");
        assert_eq!(pane.text(), "different text");
        assert_eq!(pane.printed, pane.text().len());
    }
}
