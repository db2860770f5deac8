//! Flow CSV reader.
//!
//! Accepts `source,target,value` records, one per line, as used by Sankey diagram sources:
//!
//! ```text
//! sankey-beta
//! %% energy flows
//! Coal,"Heating and cooling, homes",12.5
//! """Biomass"" imports",Solid,35
//! ```
//!
//! The `sankey`/`sankey-beta` header is optional, `%%` lines and blank lines are skipped, fields
//! may be quoted (with `""` as an escaped quote) and nodes are created in first-appearance order.

use crate::model::{FlowGraph, FlowLink, FlowNode};
use crate::{Error, Result};
use indexmap::IndexSet;

pub fn parse_flow_csv(text: &str) -> Result<FlowGraph> {
    let mut p = CsvParser::new(text);
    let mut ids: IndexSet<String> = IndexSet::new();
    let mut links: Vec<FlowLink> = Vec::new();
    let mut first = true;

    loop {
        p.skip_ignorable_lines();
        if p.eof() {
            break;
        }
        if first {
            first = false;
            if is_sankey_header(p.current_line()) {
                p.skip_line();
                continue;
            }
        }

        let line = p.line;
        let source = p.parse_field()?;
        p.consume_char(',')?;
        let target = p.parse_field()?;
        p.consume_char(',')?;
        let value_raw = p.parse_field()?;
        p.end_record()?;

        if source.is_empty() || target.is_empty() {
            return Err(Error::Csv {
                line,
                message: "empty node id".to_string(),
            });
        }
        let value = value_raw.parse::<f64>().map_err(|_| Error::Csv {
            line,
            message: format!("invalid value: {value_raw:?}"),
        })?;

        ids.insert(source.clone());
        ids.insert(target.clone());
        links.push(FlowLink::new(source, target, value));
    }

    tracing::trace!(nodes = ids.len(), links = links.len(), "parsed flow csv");
    Ok(FlowGraph {
        nodes: ids.into_iter().map(FlowNode::new).collect(),
        links,
    })
}

fn is_sankey_header(line: &str) -> bool {
    let h = line.trim().to_ascii_lowercase();
    h == "sankey" || h == "sankey-beta"
}

struct CsvParser<'a> {
    input: &'a str,
    pos: usize,
    /// 1-based line of `pos`.
    line: usize,
}

impl<'a> CsvParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Csv {
            line: self.line,
            message: message.into(),
        }
    }

    fn current_line(&self) -> &'a str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r')
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek_char() {
            self.bump(ch);
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_ignorable_lines(&mut self) {
        while !self.eof() {
            let line = self.current_line().trim();
            if line.is_empty() || line.starts_with("%%") {
                self.skip_line();
            } else {
                break;
            }
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == ' ' || ch == '\t' {
                self.bump(ch);
            } else {
                break;
            }
        }
    }

    fn consume_char(&mut self, ch: char) -> Result<()> {
        if self.rest().starts_with(ch) {
            self.bump(ch);
            Ok(())
        } else {
            Err(self.error(format!("expected '{ch}'")))
        }
    }

    fn end_record(&mut self) -> Result<()> {
        self.skip_inline_whitespace();
        match self.peek_char() {
            None => Ok(()),
            Some('\n') => {
                self.bump('\n');
                Ok(())
            }
            Some('\r') => {
                self.bump('\r');
                if self.peek_char() == Some('\n') {
                    self.bump('\n');
                }
                Ok(())
            }
            Some(_) => Err(self.error("expected end of record")),
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        self.skip_inline_whitespace();
        match self.peek_char() {
            Some('"') => {
                let field = self.parse_quoted_field()?;
                self.skip_inline_whitespace();
                Ok(field)
            }
            _ => Ok(self.parse_unquoted_field()),
        }
    }

    fn parse_unquoted_field(&mut self) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ',' || ch == '\n' || ch == '\r' {
                break;
            }
            out.push(ch);
            self.bump(ch);
        }
        out.trim().to_string()
    }

    fn parse_quoted_field(&mut self) -> Result<String> {
        let start_line = self.line;
        self.consume_char('"')?;
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            self.bump(ch);
            if ch == '"' {
                if self.peek_char() == Some('"') {
                    self.bump('"');
                    out.push('"');
                    continue;
                }
                return Ok(out);
            }
            out.push(ch);
        }
        Err(Error::Csv {
            line: start_line,
            message: "unterminated quoted field".to_string(),
        })
    }
}
