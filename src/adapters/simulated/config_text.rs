//! Block-structured configuration text used by the simulated drivers.
//!
//! A configuration is a list of top-level statements, each optionally
//! followed by indented child statements:
//!
//! ```text
//! hostname leaf1
//! interface Ethernet1
//!    description uplink
//!    no shutdown
//! ```
//!
//! Lines starting with `!` or `#` are comments and blank lines are ignored.

use crate::model::LoadMode;

const CHILD_INDENT: &str = "   ";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    header: String,
    children: Vec<String>,
}

/// Parsed device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigText {
    blocks: Vec<Block>,
}

impl ConfigText {
    /// Parses configuration text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut blocks: Vec<Block> = Vec::new();
        for raw in text.lines() {
            let line = raw.trim_end();
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('#') {
                continue;
            }
            let indented = line.len() != trimmed.len();
            match blocks.last_mut() {
                Some(block) if indented => block.children.push(trimmed.to_string()),
                _ => blocks.push(Block { header: trimmed.to_string(), children: Vec::new() }),
            }
        }
        Self { blocks }
    }

    /// True when there are no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Builds the candidate produced by loading `text` onto `self`.
    #[must_use]
    pub fn stage(&self, text: &str, mode: LoadMode) -> Self {
        let incoming = Self::parse(text);
        match mode {
            LoadMode::Replace => incoming,
            LoadMode::Merge => self.merged_with(&incoming),
        }
    }

    /// Merges `incoming` into a copy of `self`.
    ///
    /// Blocks with the same header merge their children. A statement whose
    /// key occurs exactly once on both sides (`hostname`, `description`,
    /// `shutdown`/`no shutdown`) replaces the existing one in place; anything
    /// else is appended.
    #[must_use]
    pub fn merged_with(&self, incoming: &Self) -> Self {
        let mut merged = self.blocks.clone();
        let incoming_headers: Vec<&str> = incoming
            .blocks
            .iter()
            .filter(|b| b.children.is_empty())
            .map(|b| b.header.as_str())
            .collect();

        for block in &incoming.blocks {
            if let Some(existing) = merged.iter_mut().find(|b| b.header == block.header) {
                merge_children(&mut existing.children, &block.children);
                continue;
            }
            if block.children.is_empty() && is_singleton(&incoming_headers, &block.header) {
                let existing: Vec<&str> = merged
                    .iter()
                    .filter(|b| b.children.is_empty())
                    .map(|b| b.header.as_str())
                    .collect();
                if is_singleton(&existing, &block.header) {
                    let key = statement_key(&block.header);
                    if let Some(slot) = merged
                        .iter_mut()
                        .find(|b| b.children.is_empty() && statement_key(&b.header) == key)
                    {
                        slot.header.clone_from(&block.header);
                        continue;
                    }
                }
            }
            merged.push(block.clone());
        }

        Self { blocks: merged }
    }

    /// Describes how to get from `self` (running) to `candidate`.
    ///
    /// Removed lines start with `-`, added lines with `+`, and a header with
    /// changed children is repeated with a leading space for context. Returns
    /// an empty string when nothing differs.
    #[must_use]
    pub fn diff(&self, candidate: &Self) -> String {
        let mut out = Vec::new();

        for block in &self.blocks {
            if candidate.find(&block.header).is_none() {
                out.push(format!("-{}", block.header));
                out.extend(block.children.iter().map(|c| format!("-{CHILD_INDENT}{c}")));
            }
        }

        for block in &candidate.blocks {
            match self.find(&block.header) {
                None => {
                    out.push(format!("+{}", block.header));
                    out.extend(block.children.iter().map(|c| format!("+{CHILD_INDENT}{c}")));
                }
                Some(running) => {
                    let removed: Vec<&String> =
                        running.children.iter().filter(|c| !block.children.contains(c)).collect();
                    let added: Vec<&String> =
                        block.children.iter().filter(|c| !running.children.contains(c)).collect();
                    if removed.is_empty() && added.is_empty() {
                        continue;
                    }
                    out.push(format!(" {}", block.header));
                    out.extend(removed.iter().map(|c| format!("-{CHILD_INDENT}{c}")));
                    out.extend(added.iter().map(|c| format!("+{CHILD_INDENT}{c}")));
                }
            }
        }

        out.join("\n")
    }

    /// Returns the argument of the first top-level `keyword` statement.
    #[must_use]
    pub fn value_of(&self, keyword: &str) -> Option<&str> {
        self.blocks.iter().find_map(|b| {
            b.header
                .strip_prefix(keyword)
                .filter(|rest| rest.starts_with(' '))
                .map(str::trim)
        })
    }

    /// Renders the configuration back to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push_str(&block.header);
            out.push('\n');
            for child in &block.children {
                out.push_str(CHILD_INDENT);
                out.push_str(child);
                out.push('\n');
            }
        }
        out
    }

    fn find(&self, header: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.header == header)
    }
}

fn merge_children(existing: &mut Vec<String>, incoming: &[String]) {
    let incoming_refs: Vec<&str> = incoming.iter().map(String::as_str).collect();
    for child in incoming {
        if existing.contains(child) {
            continue;
        }
        let existing_refs: Vec<&str> = existing.iter().map(String::as_str).collect();
        if is_singleton(&incoming_refs, child) && is_singleton(&existing_refs, child) {
            let key = statement_key(child);
            if let Some(slot) = existing.iter_mut().find(|c| statement_key(c) == key) {
                slot.clone_from(child);
                continue;
            }
        }
        existing.push(child.clone());
    }
}

/// True when exactly one statement in `lines` shares `line`'s key.
fn is_singleton(lines: &[&str], line: &str) -> bool {
    let key = statement_key(line);
    lines.iter().filter(|l| statement_key(l) == key).count() == 1
}

/// The leading keyword of a statement, ignoring a `no` negation.
fn statement_key(line: &str) -> &str {
    let line = line.strip_prefix("no ").unwrap_or(line);
    line.split_whitespace().next().unwrap_or("")
}
