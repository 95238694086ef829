/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render output buffer.
//!
//! Output is collected as a list of fragments rather than one string so the
//! head block can be placed where a template asked for it while its content
//! is still being aggregated. The slot is filled in once, after the whole
//! composition tree has run.

/// A piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    /// Literal text.
    Text(String),
    /// Placeholder for the aggregated head markup.
    HeadSlot,
}

/// Append-only buffer for one template body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OutputBuffer {
    fragments: Vec<Fragment>,
}

impl OutputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append text, merging with a trailing text fragment.
    pub(crate) fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.fragments.last_mut() {
            Some(Fragment::Text(last)) => last.push_str(text),
            _ => self.fragments.push(Fragment::Text(text.to_string())),
        }
    }

    pub(crate) fn push_head_slot(&mut self) {
        self.fragments.push(Fragment::HeadSlot);
    }

    /// Move everything from a finished child body into this buffer.
    pub(crate) fn append(&mut self, child: OutputBuffer) {
        for fragment in child.fragments {
            match fragment {
                Fragment::Text(text) => self.push_str(&text),
                Fragment::HeadSlot => self.push_head_slot(),
            }
        }
    }

    /// Produce the final string, substituting `head` into every slot.
    pub(crate) fn finish(self, head: &str) -> String {
        let mut out = String::new();
        for fragment in self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(&text),
                Fragment::HeadSlot => out.push_str(head),
            }
        }
        out
    }
}
