//! Port scanning for generated Verilog modules.
//!
//! The stimulus generator needs each partition's input and output widths
//! to size its vectors. Partition files come out of the partitioner's
//! writer, so the declarations are regular; this scanner handles both
//! body-style (`input [3:0] a, b;`) and ANSI-header declarations without
//! pulling in a Verilog frontend.

use whittle_circuit::Netlist;

use crate::ToolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub width: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortList {
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

impl PortList {
    pub fn input_bits(&self) -> usize {
        self.inputs.iter().map(|p| p.width).sum()
    }

    pub fn output_bits(&self) -> usize {
        self.outputs.iter().map(|p| p.width).sum()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    None,
    Input,
    Output,
}

/// Scan a netlist's declarations for its input and output ports.
pub fn scan_ports(netlist: &Netlist) -> Result<PortList, ToolError> {
    let mut list = PortList::default();
    let mut direction = Direction::None;
    let mut width = 1usize;

    for token in tokenize(&strip_comments(&netlist.text)) {
        match token.as_str() {
            "input" => {
                direction = Direction::Input;
                width = 1;
            }
            "output" => {
                direction = Direction::Output;
                width = 1;
            }
            // A declaration ends at the statement or header boundary.
            ";" | ")" => direction = Direction::None,
            "wire" | "reg" | "logic" | "signed" => {}
            t if t.starts_with('[') => {
                width = parse_range(t).ok_or_else(|| {
                    ToolError::unparsable(
                        "port scan",
                        format!("bad range '{t}' in module {}", netlist.module),
                    )
                })?;
            }
            name => match direction {
                Direction::Input => list.inputs.push(Port {
                    name: name.to_string(),
                    width,
                }),
                Direction::Output => list.outputs.push(Port {
                    name: name.to_string(),
                    width,
                }),
                Direction::None => {}
            },
        }
    }
    Ok(list)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(idx) = rest.find("//") {
            let block = rest.find("/*");
            if block.map_or(true, |b| idx < b) {
                out.push_str(&rest[..idx]);
                rest = rest[idx..].split_once('\n').map_or("", |(_, r)| r);
                out.push('\n');
                continue;
            }
        }
        if let Some(idx) = rest.find("/*") {
            out.push_str(&rest[..idx]);
            rest = rest[idx..].split_once("*/").map_or("", |(_, r)| r);
            continue;
        }
        out.push_str(rest);
        break;
    }
    out
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                flush(&mut current, &mut tokens);
                let mut range = String::from('[');
                for n in chars.by_ref() {
                    if !n.is_whitespace() {
                        range.push(n);
                    }
                    if n == ']' {
                        break;
                    }
                }
                tokens.push(range);
            }
            ';' | ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() || c == ',' || c == '(' => {
                flush(&mut current, &mut tokens);
            }
            _ => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// `[hi:lo]` -> bit width; `None` when the bounds are not integers.
fn parse_range(token: &str) -> Option<usize> {
    let inner = token.strip_prefix('[')?.strip_suffix(']')?;
    let (hi, lo) = inner.split_once(':')?;
    let hi: i64 = hi.trim().parse().ok()?;
    let lo: i64 = lo.trim().parse().ok()?;
    Some((hi - lo).unsigned_abs() as usize + 1)
}
