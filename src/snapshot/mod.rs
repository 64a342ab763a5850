// Output capture and per-statement execution trace

use crate::memory::stack::Stack;
use crate::parser::ast::SourceLocation;

/// Mock terminal capturing `print` output
#[derive(Debug, Clone)]
pub struct MockTerminal {
    pub lines: Vec<TerminalLine>,
    /// Whether the last line is still waiting for its newline
    line_open: bool,
}

impl MockTerminal {
    pub fn new() -> Self {
        MockTerminal {
            lines: Vec::new(),
            line_open: false,
        }
    }

    /// Write text; every `\n` ends the current line
    pub fn print(&mut self, text: &str, location: SourceLocation) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                if !self.line_open {
                    self.lines.push(TerminalLine {
                        text: String::new(),
                        location,
                    });
                }
                self.line_open = false;
            }
            if piece.is_empty() {
                continue;
            }
            match self.lines.last_mut() {
                Some(last) if self.line_open => last.text.push_str(piece),
                _ => {
                    self.lines.push(TerminalLine {
                        text: piece.to_string(),
                        location,
                    });
                    self.line_open = true;
                }
            }
        }
    }

    /// Get all lines as a vector of strings
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(|tl| tl.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}

/// A line of terminal output with source location tracking
#[derive(Debug, Clone)]
pub struct TerminalLine {
    pub text: String,
    pub location: SourceLocation,
}

/// A binding as shown in the bindings pane
#[derive(Debug, Clone, PartialEq)]
pub struct BindingView {
    pub name: String,
    pub type_name: String,
    pub value: String,
    pub is_mutable: bool,
}

impl BindingView {
    /// Capture every binding visible on `stack`
    pub fn collect(stack: &Stack) -> Vec<BindingView> {
        stack
            .visible_bindings()
            .into_iter()
            .map(|(name, binding)| BindingView {
                name: name.to_string(),
                type_name: binding.declared_type.to_string(),
                value: binding.value.render_nested(),
                is_mutable: binding.is_mutable,
            })
            .collect()
    }
}

/// State after one executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source_location: SourceLocation,
    /// Number of output lines printed so far
    pub output_len: usize,
    pub bindings: Vec<BindingView>,
    /// Sidebar text for the statement (its value, or what it printed)
    pub result: Option<String>,
    /// Innermost function being executed, `None` at the top level
    pub function: Option<String>,
    pub call_depth: usize,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        let bindings: usize = self
            .bindings
            .iter()
            .map(|b| b.name.len() + b.type_name.len() + b.value.len() + 8)
            .sum();
        let result = self.result.as_ref().map_or(0, String::len);
        let function = self.function.as_ref().map_or(0, String::len);
        std::mem::size_of::<Snapshot>() + bindings + result + function
    }
}

/// Bounded execution history for the viewer
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
    truncated: bool,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
            truncated: false,
        }
    }

    /// Add a snapshot to history. Once the memory limit is hit, further
    /// snapshots are dropped and the history is marked truncated.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), String> {
        if self.truncated {
            return Ok(());
        }

        let snapshot_size = snapshot.estimated_size();
        if self.current_memory + snapshot_size > self.max_memory {
            self.truncated = true;
            return Err(format!(
                "Snapshot memory limit exceeded: {} + {} > {}",
                self.current_memory, snapshot_size, self.max_memory
            ));
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }
}
