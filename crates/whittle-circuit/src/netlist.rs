//! Netlist artifact handles.

use serde::{Deserialize, Serialize};

/// An opaque netlist artifact: a named module plus its source text.
///
/// The engine only ever concatenates these and hands them to tool
/// backends; nothing outside the tooling layer inspects the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    /// Top module name.
    pub module: String,
    /// Source text.
    pub text: String,
}

impl Netlist {
    pub fn new(module: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            text: text.into(),
        }
    }

    /// Concatenate the shared top-level wiring with a set of partition
    /// modules into one assembled circuit. The assembly keeps the top
    /// module's name; partition order is the caller's.
    pub fn assemble<'a>(top: &Netlist, parts: impl IntoIterator<Item = &'a Netlist>) -> Netlist {
        let mut text = String::with_capacity(top.text.len());
        text.push_str(&top.text);
        for part in parts {
            if !text.ends_with('\n') && !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&part.text);
        }
        Netlist {
            module: top.module.clone(),
            text,
        }
    }
}

/// Scan source text for the first `module <name>` declaration.
///
/// Returns `None` when no module declaration is present.
pub fn parse_module_name(text: &str) -> Option<String> {
    for line in text.lines() {
        let mut tokens = line.split(|c: char| c.is_whitespace() || c == '(');
        while let Some(tok) = tokens.next() {
            if tok == "module" {
                let name = tokens.find(|t| !t.is_empty())?;
                return Some(name.trim_end_matches(';').to_string());
            }
        }
    }
    None
}
