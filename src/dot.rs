//! Automata to and from DOT (Graphviz).
//!
//! # DOT Format
//!
//! The generated DOT output follows these conventions:
//! - the context is stored in the graph attribute `vcsn_context`;
//! - **states** are circles named by their number;
//! - **initial and final weights** are edges from the invisible `I<n>` node
//!   and to the invisible `F<n>` node;
//! - **edge labels** read `<w>l`, the weight omitted when it is one; all
//!   the transitions between two states share one edge, their labels joined
//!   with `, `.
//!
//! The reader accepts this output back, and the usual hand-written
//! variations: bare `I` and `F` nodes, edge chains such as `I -> 0 -> F`,
//! attribute lists, `;` separators and comments.
//!
//! # Examples
//!
//! ```
//! use wfa_rs::automaton::Automaton;
//!
//! let aut = Automaton::from_dot(r#"digraph {
//!     vcsn_context = "lal_char(ab), z"
//!     I -> 0
//!     0 -> 1 [label = "a, <2>b"]
//!     1 -> F
//! }"#)
//! .unwrap();
//! assert_eq!(aut.num_states(), 2);
//! assert_eq!(aut.num_transitions(), 2);
//!
//! let dot = aut.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.contains(r#"0 -> 1 [label = "a, <2>b"]"#));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::automaton::{Automaton, StateId};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::printer::{format_weight, Format};
use crate::weightset::{Semiring, Weight};

/// Configuration options for DOT output generation.
///
/// Use `DotConfig::default()` for the standard settings.
///
/// # Examples
///
/// ```
/// use wfa_rs::automaton::Automaton;
/// use wfa_rs::context::Context;
/// use wfa_rs::dot::DotConfig;
///
/// let aut = Automaton::new(Context::parse("lal_char(ab), b").unwrap());
/// let config = DotConfig {
///     rankdir: "TB",
///     ..DotConfig::default()
/// };
/// let dot = aut.to_dot_with_config(&config).unwrap();
/// assert!(dot.contains("rankdir = TB"));
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Layout direction (default: "LR")
    pub rankdir: &'static str,
    /// Shape for states (default: "circle")
    pub state_shape: &'static str,
    /// Style for states (default: "rounded")
    pub state_style: &'static str,
    /// Attributes shared by all edges (default: "arrowhead = vee, arrowsize = .6")
    pub edge_attributes: &'static str,
    /// Rendering of expression weights (default: text)
    pub format: Format,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            rankdir: "LR",
            state_shape: "circle",
            state_style: "rounded",
            edge_attributes: "arrowhead = vee, arrowsize = .6",
            format: Format::Text,
        }
    }
}

fn quote(text: &str) -> String {
    let mut res = String::with_capacity(text.len() + 2);
    res.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            res.push('\\');
        }
        res.push(c);
    }
    res.push('"');
    res
}

impl Automaton {
    /// Converts the automaton to DOT format.
    pub fn to_dot(&self) -> std::result::Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    fn entry(&self, label: Option<String>, weight: &Weight, config: &DotConfig) -> String {
        let w = if weight.is_one() {
            String::new()
        } else {
            format!("<{}>", format_weight(weight, config.format))
        };
        match label {
            Some(l) => format!("{}{}", w, l),
            None => w,
        }
    }

    /// Converts the automaton to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> std::result::Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph")?;
        writeln!(dot, "{{")?;
        writeln!(dot, "  vcsn_context = {}", quote(&self.context().to_string()))?;
        writeln!(dot, "  rankdir = {}", config.rankdir)?;
        writeln!(dot, "  edge [{}]", config.edge_attributes)?;

        // Pre-initial and post-final pseudo nodes
        writeln!(dot, "  {{")?;
        writeln!(dot, "    node [shape = point, width = 0]")?;
        for s in self.initial_states() {
            writeln!(dot, "    I{}", s)?;
        }
        for s in self.final_states() {
            writeln!(dot, "    F{}", s)?;
        }
        writeln!(dot, "  }}")?;

        writeln!(dot, "  {{")?;
        writeln!(
            dot,
            "    node [shape = {}, style = {}, width = 0.5]",
            config.state_shape, config.state_style
        )?;
        for s in self.states() {
            writeln!(dot, "    {}", s)?;
        }
        writeln!(dot, "  }}")?;

        for s in self.initial_states() {
            match self.entry(None, &self.initial_weight(s), config) {
                w if w.is_empty() => writeln!(dot, "  I{} -> {}", s, s)?,
                w => writeln!(dot, "  I{} -> {} [label = {}]", s, s, quote(&w))?,
            }
        }
        for s in self.states() {
            if self.is_final(s) {
                match self.entry(None, &self.final_weight(s), config) {
                    w if w.is_empty() => writeln!(dot, "  {} -> F{}", s, s)?,
                    w => writeln!(dot, "  {} -> F{} [label = {}]", s, s, quote(&w))?,
                }
            }
            // One edge per destination, labels in order
            let mut edges = BTreeMap::<StateId, Vec<_>>::new();
            for t in self.out(s) {
                edges
                    .entry(self.dst_of(t))
                    .or_default()
                    .push((self.label_of(t), self.weight_of(t)));
            }
            for (d, mut entries) in edges {
                entries.sort();
                let labels: Vec<String> = entries
                    .into_iter()
                    .map(|(l, w)| self.entry(Some(l.to_string()), w, config))
                    .collect();
                writeln!(dot, "  {} -> {} [label = {}]", s, d, quote(&labels.join(", ")))?;
            }
        }
        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Read an automaton in DOT format.
    ///
    /// The graph must set `vcsn_context` before its first node. Nodes whose
    /// name starts with `I` (resp. `F`) stand for the pre-initial (resp.
    /// post-final) state; every other node is a state, numbered in order of
    /// appearance.
    pub fn from_dot(text: &str) -> Result<Automaton> {
        let tokens = tokenize(text)?;
        let mut reader = DotReader {
            tokens,
            pos: 0,
            end: text.len(),
            aut: None,
            names: HashMap::new(),
        };
        reader.graph()?;
        match reader.aut {
            Some(aut) => Ok(aut),
            None => Err(Error::syntax(0..text.len(), "missing vcsn_context")),
        }
    }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Identifier or number.
    Id(String),
    /// Double-quoted string, unescaped.
    Str(String),
    Arrow,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equal,
    Semi,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<(Token, Range<usize>)>> {
    let bytes = text.as_bytes();
    let mut res = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => match text[i + 2..].find("*/") {
                Some(n) => i += n + 4,
                None => return Err(Error::syntax(start..text.len(), "unterminated comment")),
            },
            b'-' if bytes.get(i + 1) == Some(&b'>') => {
                i += 2;
                res.push((Token::Arrow, start..i));
            }
            b'{' | b'}' | b'[' | b']' | b'=' | b';' | b',' => {
                i += 1;
                let token = match c {
                    b'{' => Token::LBrace,
                    b'}' => Token::RBrace,
                    b'[' => Token::LBracket,
                    b']' => Token::RBracket,
                    b'=' => Token::Equal,
                    b';' => Token::Semi,
                    _ => Token::Comma,
                };
                res.push((token, start..i));
            }
            b'"' => {
                let mut value = String::new();
                let mut chars = text[i + 1..].char_indices();
                let mut closed = None;
                while let Some((k, ch)) = chars.next() {
                    match ch {
                        '"' => {
                            closed = Some(i + 1 + k + 1);
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, e @ ('"' | '\\'))) => value.push(e),
                            Some((_, e)) => {
                                value.push('\\');
                                value.push(e);
                            }
                            None => value.push('\\'),
                        },
                        other => value.push(other),
                    }
                }
                match closed {
                    Some(end) => {
                        i = end;
                        res.push((Token::Str(value), start..i));
                    }
                    None => return Err(Error::syntax(start..text.len(), "unterminated string")),
                }
            }
            _ if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.') {
                    i += 1;
                }
                res.push((Token::Id(text[start..i].to_string()), start..i));
            }
            _ => {
                let len = text[i..].chars().next().map_or(1, char::len_utf8);
                return Err(Error::syntax(
                    start..start + len,
                    format!("unexpected `{}`", &text[start..start + len]),
                ));
            }
        }
    }
    Ok(res)
}

/// A node of an edge chain.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Endpoint {
    Pre,
    Post,
    State(StateId),
}

struct DotReader {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    end: usize,
    aut: Option<Automaton>,
    names: HashMap<String, StateId>,
}

impl DotReader {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn span(&self) -> Range<usize> {
        self.tokens.get(self.pos).map_or(self.end..self.end, |(_, r)| r.clone())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.span(), message)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    /// An identifier or a string.
    fn name(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Id(s)) | Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn graph(&mut self) -> Result<()> {
        if self.peek() == Some(&Token::Id("strict".to_string())) {
            self.pos += 1;
        }
        match self.name()?.as_str() {
            "digraph" => {}
            _ => {
                self.pos -= 1;
                return Err(self.error("expected `digraph`"));
            }
        }
        if matches!(self.peek(), Some(Token::Id(_)) | Some(Token::Str(_))) {
            self.pos += 1;
        }
        self.expect(Token::LBrace, "`{`")?;
        self.statements()?;
        if self.pos < self.tokens.len() {
            return Err(self.error("trailing input after the graph"));
        }
        Ok(())
    }

    /// Statements up to and including the closing brace.
    fn statements(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                None => return Err(self.error("expected `}`")),
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Token::Semi) => self.pos += 1,
                Some(Token::LBrace) => {
                    self.pos += 1;
                    self.statements()?;
                }
                Some(_) => self.statement()?,
            }
        }
    }

    fn statement(&mut self) -> Result<()> {
        let start = self.span();
        let first = self.name()?;
        match first.as_str() {
            "graph" | "node" | "edge" if self.peek() == Some(&Token::LBracket) => {
                self.attributes()?;
                return Ok(());
            }
            "subgraph" => {
                if matches!(self.peek(), Some(Token::Id(_)) | Some(Token::Str(_))) {
                    self.pos += 1;
                }
                self.expect(Token::LBrace, "`{`")?;
                return self.statements();
            }
            _ => {}
        }
        if self.eat(&Token::Equal) {
            let value_span = self.span();
            let value = self.name()?;
            if first == "vcsn_context" {
                let ctx = Context::parse(&value).map_err(|e| match e {
                    Error::SyntaxError { .. } => Error::syntax(value_span, e.to_string()),
                    other => other,
                })?;
                self.aut = Some(Automaton::new(ctx));
            }
            return Ok(());
        }

        let mut chain = vec![(first, start.clone())];
        while self.eat(&Token::Arrow) {
            let span = self.span();
            chain.push((self.name()?, span));
        }
        let attrs = if self.peek() == Some(&Token::LBracket) {
            self.attributes()?
        } else {
            Vec::new()
        };
        let endpoints = chain
            .iter()
            .map(|(name, span)| self.endpoint(name, span))
            .collect::<Result<Vec<_>>>()?;
        let label = attrs.iter().find(|(k, _)| k == "label").map(|(_, v)| v.as_str());
        for pair in endpoints.windows(2) {
            self.edge(pair[0], pair[1], label, &start)?;
        }
        Ok(())
    }

    /// `[k = v, k = v; ...]`, several lists in a row allowed.
    fn attributes(&mut self) -> Result<Vec<(String, String)>> {
        let mut res = Vec::new();
        while self.eat(&Token::LBracket) {
            loop {
                if self.eat(&Token::RBracket) {
                    break;
                }
                let key = self.name()?;
                let value = if self.eat(&Token::Equal) {
                    self.name()?
                } else {
                    "true".to_string()
                };
                res.push((key, value));
                if !self.eat(&Token::Comma) {
                    self.eat(&Token::Semi);
                }
            }
        }
        Ok(res)
    }

    fn automaton(&mut self, span: &Range<usize>) -> Result<&mut Automaton> {
        self.aut
            .as_mut()
            .ok_or_else(|| Error::syntax(span.clone(), "vcsn_context must come before the first node"))
    }

    fn endpoint(&mut self, name: &str, span: &Range<usize>) -> Result<Endpoint> {
        self.automaton(span)?;
        if name.starts_with('I') {
            return Ok(Endpoint::Pre);
        }
        if name.starts_with('F') {
            return Ok(Endpoint::Post);
        }
        if let Some(&s) = self.names.get(name) {
            return Ok(Endpoint::State(s));
        }
        let s = self.automaton(span)?.new_state();
        self.names.insert(name.to_string(), s);
        Ok(Endpoint::State(s))
    }

    fn edge(&mut self, src: Endpoint, dst: Endpoint, label: Option<&str>, span: &Range<usize>) -> Result<()> {
        let aut = self.automaton(span)?;
        let ctx = aut.context().clone();
        let entries = match label {
            Some(text) => split_entries(text),
            None => vec![String::new()],
        };
        for entry in entries {
            let (weight, rest) = split_weight(&entry);
            let weight = match weight {
                Some(w) => ctx.parse_weight(w)?,
                None => ctx.weightset().one(),
            };
            match (src, dst) {
                (Endpoint::Pre, Endpoint::State(s)) => {
                    aut.add_initial(s, weight);
                }
                (Endpoint::State(s), Endpoint::Post) => {
                    aut.add_final(s, weight);
                }
                (Endpoint::State(s), Endpoint::State(d)) => {
                    if rest.is_empty() {
                        return Err(Error::syntax(span.clone(), "missing transition label"));
                    }
                    let label = ctx.parse_label(rest)?;
                    aut.add_transition(s, d, label, weight);
                }
                _ => return Err(Error::syntax(span.clone(), "invalid edge between pseudo nodes")),
            }
        }
        Ok(())
    }
}

/// Split `l1, <w>l2, ...` on the commas outside weights.
fn split_entries(text: &str) -> Vec<String> {
    let mut res = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '<' {
            depth += 1;
        } else if c == '>' {
            depth = depth.saturating_sub(1);
        } else if c == ',' && depth == 0 {
            res.push(current.trim().to_string());
            current.clear();
            continue;
        }
        current.push(c);
    }
    res.push(current.trim().to_string());
    res
}

/// Split a leading `<w>` off `entry`.
fn split_weight(entry: &str) -> (Option<&str>, &str) {
    if !entry.starts_with('<') {
        return (None, entry.trim());
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in entry.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '<' {
            depth += 1;
        } else if c == '>' {
            depth -= 1;
            if depth == 0 {
                return (Some(&entry[1..i]), entry[i + 1..].trim());
            }
        }
    }
    (None, entry.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::proper::ProperConfig;

    #[test]
    fn test_to_dot_basic() {
        let ctx = Context::parse("lal_char(ab), b").unwrap();
        let aut = Expression::parse(&ctx, "(a+b)*a").unwrap().derived_term().unwrap().strip();
        let dot = aut.to_dot().unwrap();
        assert!(dot.starts_with("digraph\n{\n"));
        assert!(dot.contains("vcsn_context = \"letterset<char_letters(ab)>, b\""));
        assert!(dot.contains("I0 -> 0\n"));
        assert!(dot.contains("0 -> 0 [label = \"a, b\"]"));
        assert!(dot.contains("1 -> F1\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_to_dot_with_config() {
        let ctx = Context::parse("lal_char(a), z").unwrap();
        let aut = Automaton::new(ctx);
        let config = DotConfig {
            state_shape: "box",
            ..DotConfig::default()
        };
        let dot = aut.to_dot_with_config(&config).unwrap();
        assert!(dot.contains("shape = box"));
    }

    #[test]
    fn test_round_trip() {
        for (ctx, text) in [
            ("lal_char(ab), z", "(<2>a+b)*<3>a"),
            ("law_char(ab), q", "(<1/2>ab)*b"),
            ("lat<lan_char(ab), lan_char(xy)>, b", "'a|x'*'b|\\e'"),
        ] {
            let ctx = Context::parse(ctx).unwrap();
            let aut = Expression::parse(&ctx, text).unwrap().derived_term().unwrap().strip();
            let dot = aut.to_dot().unwrap();
            let back = Automaton::from_dot(&dot).unwrap();
            assert!(back.is_isomorphic(&aut), "{}", dot);
        }
    }

    #[test]
    fn test_from_dot_chain() {
        let aut = Automaton::from_dot(
            r#"digraph
{
  vcsn_context = "law_char(ab), r"
  I -> 0 -> F
  0 -> 0 [label = "<.5>\\e"]
}"#,
        )
        .unwrap();
        assert_eq!(aut.num_states(), 1);
        assert_eq!(aut.num_eps_transitions(), 1);
        let res = aut.proper(&ProperConfig::default()).unwrap();
        let s = res.states().next().unwrap();
        assert_eq!(res.final_weight(s).to_string(), "2");
    }

    #[test]
    fn test_from_dot_comments_and_separators() {
        let aut = Automaton::from_dot(
            "/* header */ digraph g { vcsn_context = \"lal_char(ab), z\"; // states\n\
             node [shape = circle]; p; q; I0 -> p [label = \"<4>\"]; p -> q [label = \"a\", color = red]; # end\n\
             q -> F0 }",
        )
        .unwrap();
        assert_eq!(aut.num_states(), 2);
        let p = aut.initial_states()[0];
        assert_eq!(aut.initial_weight(p).to_string(), "4");
        assert_eq!(aut.eval("a").unwrap().to_string(), "4");
    }

    #[test]
    fn test_from_dot_errors() {
        assert!(matches!(
            Automaton::from_dot("digraph { 0 -> 1 [label = \"a\"] }"),
            Err(Error::SyntaxError { .. })
        ));
        assert!(matches!(
            Automaton::from_dot("digraph { vcsn_context = \"lal_char(ab), b\" 0 -> 1 [label = \"c\"] }"),
            Err(Error::BadLabel { .. })
        ));
        assert!(matches!(
            Automaton::from_dot("digraph { vcsn_context = \"lal_char(ab), b\" 0 -> 1 }"),
            Err(Error::SyntaxError { .. })
        ));
        match Automaton::from_dot("digraph { vcsn_context = \"lal_char(ab), b\" 0 @ }") {
            Err(Error::SyntaxError { position, .. }) => assert_eq!(position, 45..46),
            other => panic!("unexpected {:?}", other),
        }
    }
}
