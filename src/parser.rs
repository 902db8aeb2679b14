//! Expression parsers.
//!
//! Three input syntaxes map onto the same trees:
//!
//! - [`Syntax::Default`], the canonical syntax printed by [`crate::printer`]
//!   (also accepting its utf8 symbols);
//! - [`Syntax::Ere`], a POSIX-like extended regular expression dialect;
//! - [`Syntax::Bre`], its basic counterpart.
//!
//! Canonical operators, loosest first: `+`, `|` (tapes), `&` and `%`, `:`,
//! juxtaposition (or `.`), weights `<w>E` and `E<w>`, then postfix `*`, `?`,
//! `{n}`, `{m,n}`, `{m,}`, `{,n}`, `{c}` and `{T}`.
//!
//! Errors carry the character range of the offending input.

use crate::error::{Error, Result};
use crate::expression::{Exp, ExpressionSet};
use crate::labelset::{decode_hex_letter, Label, LabelSet};
use crate::weightset::Semiring;

/// Input syntax of [`parse`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Default,
    Ere,
    /// POSIX basic syntax, as read by `grep`: `\|`, `\(`, `\)` and
    /// `\{m,n\}` are operators, while `+`, `?`, `|` and braces are letters.
    Bre,
}

/// Parse `text` into an expression of `set`.
pub fn parse(set: &ExpressionSet, text: &str, syntax: Syntax) -> Result<Exp> {
    let mut p = Parser {
        chars: text.chars().collect(),
        pos: 0,
    };
    let e = match syntax {
        Syntax::Default => p.sum(set)?,
        Syntax::Ere | Syntax::Bre => p.ere_alternation(set, syntax)?,
    };
    p.skip_ws(syntax);
    match p.peek() {
        None => Ok(e),
        Some(c) => Err(p.unexpected(c)),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self, syntax: Syntax) {
        if syntax == Syntax::Default {
            while self.peek().is_some_and(char::is_whitespace) {
                self.pos += 1;
            }
        }
    }

    fn unexpected(&self, c: char) -> Error {
        Error::syntax(self.pos..self.pos + 1, format!("unexpected `{}`", c))
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_ws(Syntax::Default);
        match self.peek() {
            Some(d) if d == c => {
                self.pos += 1;
                Ok(())
            }
            Some(d) => Err(Error::syntax(
                self.pos..self.pos + 1,
                format!("expected `{}`, got `{}`", c, d),
            )),
            None => Err(Error::syntax(self.pos..self.pos + 1, format!("expected `{}`", c))),
        }
    }

    /// Text up to the delimiter matching an already consumed `open`,
    /// honoring nesting and escapes. The closing delimiter is consumed.
    fn delimited(&mut self, open: char, close: char) -> Result<(String, usize)> {
        let start = self.pos;
        let mut depth = 0;
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                depth += 1;
            } else if c == close {
                if depth == 0 {
                    let body = self.chars[start..self.pos].iter().collect();
                    self.pos += 1;
                    return Ok((body, start));
                }
                depth -= 1;
            }
            self.pos += 1;
        }
        Err(Error::syntax(start - 1..self.chars.len(), format!("missing `{}`", close)))
    }

    // ─── Canonical syntax ──────────────────────────────────────────────────────

    fn sum(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let mut res = self.tuple(set)?;
        loop {
            self.skip_ws(Syntax::Default);
            if self.peek() != Some('+') {
                return Ok(res);
            }
            self.pos += 1;
            let rhs = self.tuple(set)?;
            res = set.add(&res, &rhs);
        }
    }

    fn tuple(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let n = match set.labelset() {
            LabelSet::Tuple(tapes) => tapes.len(),
            _ => return self.conjunction(set),
        };
        // Either `E1|...|En` with one operand per tape, or an operation on
        // parenthesized tuples such as `(a|x)(b|y)*`.
        let start = self.pos;
        let by_tapes = self.tapes(set, n);
        if by_tapes.is_ok() {
            return by_tapes;
        }
        let tape_pos = self.pos;
        self.pos = start;
        match (by_tapes, self.conjunction(set)) {
            (_, Ok(e)) => Ok(e),
            (Err(e1), Err(e2)) => Err(if error_start(&e2) > error_start(&e1).max(tape_pos) {
                e2
            } else {
                e1
            }),
            (Ok(e), Err(_)) => Ok(e),
        }
    }

    fn tapes(&mut self, set: &ExpressionSet, n: usize) -> Result<Exp> {
        let mut tapes = Vec::with_capacity(n);
        for i in 0..n {
            if i > 0 {
                self.expect('|')?;
            }
            let tape = set
                .tape(i)
                .ok_or_else(|| Error::syntax(self.pos..self.pos + 1, "invalid tape"))?;
            tapes.push(self.conjunction(&tape)?);
        }
        set.tuple(&tapes)
    }

    fn conjunction(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let mut res = self.shuffle(set)?;
        loop {
            self.skip_ws(Syntax::Default);
            match self.peek() {
                Some('&') => {
                    self.pos += 1;
                    let rhs = self.shuffle(set)?;
                    res = set.conjunction(&res, &rhs);
                }
                Some('%') => {
                    self.pos += 1;
                    let rhs = self.shuffle(set)?;
                    res = set.difference(&res, &rhs)?;
                }
                _ => return Ok(res),
            }
        }
    }

    fn shuffle(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let mut res = self.product(set)?;
        loop {
            self.skip_ws(Syntax::Default);
            if self.peek() != Some(':') {
                return Ok(res);
            }
            self.pos += 1;
            let rhs = self.product(set)?;
            res = set.shuffle(&res, &rhs);
        }
    }

    fn starts_operand(&self) -> bool {
        match self.peek() {
            None => false,
            Some(c) => !matches!(c, '+' | '|' | '&' | '%' | ':' | ')' | '*' | '?' | '{' | '>' | '⟩' | 'ᶜ' | 'ᵗ'),
        }
    }

    fn product(&mut self, set: &ExpressionSet) -> Result<Exp> {
        self.skip_ws(Syntax::Default);
        if !self.starts_operand() {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => Error::syntax(self.pos..self.pos + 1, "unexpected end of input"),
            });
        }
        let mut res = self.weighted(set)?;
        loop {
            self.skip_ws(Syntax::Default);
            if self.peek() == Some('.') {
                self.pos += 1;
                self.skip_ws(Syntax::Default);
            } else if !self.starts_operand() {
                return Ok(res);
            }
            let rhs = self.weighted(set)?;
            res = set.mul(&res, &rhs);
        }
    }

    fn weight_open(&self) -> Option<char> {
        match self.peek() {
            Some('<') => Some('>'),
            Some('⟨') => Some('⟩'),
            _ => None,
        }
    }

    fn weight(&mut self, set: &ExpressionSet, close: char) -> Result<crate::weightset::Weight> {
        let open = self.chars[self.pos];
        self.pos += 1;
        let (body, start) = self.delimited(open, close)?;
        set.weightset().parse(&body).map_err(|e| e.shifted(start))
    }

    fn weighted(&mut self, set: &ExpressionSet) -> Result<Exp> {
        self.skip_ws(Syntax::Default);
        let mut lweights = Vec::new();
        while let Some(close) = self.weight_open() {
            lweights.push(self.weight(set, close)?);
            self.skip_ws(Syntax::Default);
        }
        let mut res = self.postfix(set)?;
        while let Some(close) = self.weight_open() {
            let w = self.weight(set, close)?;
            res = set.rweight(&res, &w);
        }
        for w in lweights.iter().rev() {
            res = set.lweight(w, &res);
        }
        Ok(res)
    }

    fn postfix(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let mut res = self.primary(set)?;
        loop {
            let start = self.pos;
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    res = set.star(&res);
                }
                Some('?') => {
                    self.pos += 1;
                    res = set.power(&res, 0, Some(1))?;
                }
                Some('ᶜ') => {
                    self.pos += 1;
                    res = set.complement(&res)?;
                }
                Some('ᵗ') => {
                    self.pos += 1;
                    res = set.transposition(&res);
                }
                Some('{') => {
                    self.pos += 1;
                    let (body, _) = self.delimited('{', '}')?;
                    res = match body.as_str() {
                        "c" => set.complement(&res)?,
                        "T" => set.transposition(&res),
                        _ => {
                            let (min, max) = repetition(&body, start..self.pos)?;
                            set.power(&res, min, max)?
                        }
                    };
                }
                _ => return Ok(res),
            }
        }
    }

    fn primary(&mut self, set: &ExpressionSet) -> Result<Exp> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Err(Error::syntax(start..start + 1, "unexpected end of input")),
        };
        match c {
            '(' => {
                self.pos += 1;
                let e = self.sum(set)?;
                self.expect(')')?;
                Ok(e)
            }
            '∅' => {
                self.pos += 1;
                Ok(set.zero())
            }
            'ε' => {
                self.pos += 1;
                Ok(set.one())
            }
            '[' => {
                self.pos += 1;
                self.class(set, start)
            }
            '\'' => {
                self.pos += 1;
                let (body, body_start) = self.delimited('\u{0}', '\'')?;
                let label = set
                    .labelset()
                    .parse_label(&body)
                    .map_err(|e| e.shifted(body_start))?;
                Ok(set.atom(label))
            }
            '\\' => match self.peek_at(1) {
                Some('z') => {
                    self.pos += 2;
                    Ok(set.zero())
                }
                Some('e') => {
                    self.pos += 2;
                    Ok(set.one())
                }
                _ => {
                    let l = self.escaped_letter()?;
                    self.letter_atom(set, l, start)
                }
            },
            c => {
                self.pos += 1;
                self.letter_atom(set, c, start)
            }
        }
    }

    /// Decode `\xHH` or `\c` at the current position.
    fn escaped_letter(&mut self) -> Result<char> {
        let start = self.pos;
        self.pos += 1;
        match self.peek() {
            Some('x') => {
                let hex: String = self.chars[self.pos + 1..(self.pos + 3).min(self.chars.len())].iter().collect();
                self.pos = (self.pos + 3).min(self.chars.len());
                let text: String = self.chars[start..self.pos].iter().collect();
                decode_hex_letter(&hex, &text)
            }
            Some(c) => {
                self.pos += 1;
                Ok(c)
            }
            None => Err(Error::syntax(start..start + 1, "trailing backslash")),
        }
    }

    fn letter_atom(&self, set: &ExpressionSet, c: char, start: usize) -> Result<Exp> {
        let ls = set.labelset();
        if ls.is_tuple() {
            return Err(Error::syntax(start..self.pos, "expected a tuple, as in `a|x`"));
        }
        let label = ls.letter(c);
        ls.check(&label)?;
        Ok(set.atom(label))
    }

    /// Letter class `[abc]`, `[a-c]`, `[^a]` or `[^]`, as a sum of atoms.
    fn class(&mut self, set: &ExpressionSet, start: usize) -> Result<Exp> {
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }
        let mut letters = Vec::new();
        loop {
            let c = match self.peek() {
                None => return Err(Error::syntax(start..self.pos, "missing `]`")),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => self.escaped_letter()?,
                Some(c) => {
                    self.pos += 1;
                    c
                }
            };
            if self.peek() == Some('-') && self.peek_at(1).is_some_and(|d| d != ']') {
                self.pos += 1;
                let end = match self.peek() {
                    Some('\\') => self.escaped_letter()?,
                    Some(d) => {
                        self.pos += 1;
                        d
                    }
                    None => return Err(Error::syntax(start..self.pos, "missing `]`")),
                };
                if end < c {
                    return Err(Error::syntax(
                        start..self.pos,
                        format!("invalid letter interval: {}-{}", c, end),
                    ));
                }
                letters.extend(c..=end);
            } else {
                letters.push(c);
            }
        }
        let ls = set.labelset();
        let alphabet = match ls {
            LabelSet::Letters(a) | LabelSet::Nullable(a) | LabelSet::Words(a) => a,
            LabelSet::Tuple(_) => return Err(Error::syntax(start..self.pos, "letter class in a multi-tape context")),
        };
        let chosen: Vec<char> = if negated {
            if alphabet.is_open() {
                return Err(Error::syntax(start..self.pos, "negated class over an open alphabet"));
            }
            alphabet.letters().filter(|c| !letters.contains(c)).collect()
        } else {
            letters
        };
        let mut res = set.zero();
        for c in chosen {
            let label = ls.letter(c);
            ls.check(&label)?;
            res = set.add(&res, &set.atom(label));
        }
        if set.is_zero(&res) {
            return Err(Error::syntax(start..self.pos, "invalid empty letter class"));
        }
        Ok(res)
    }

    // ─── ERE and BRE dialects ──────────────────────────────────────────────────

    /// Length of the operator `op` at the cursor: `op` itself in ERE,
    /// `\op` in BRE.
    fn regex_op(&self, syntax: Syntax, op: char) -> Option<usize> {
        match syntax {
            Syntax::Bre => (self.peek() == Some('\\') && self.peek_at(1) == Some(op)).then_some(2),
            _ => (self.peek() == Some(op)).then_some(1),
        }
    }

    fn ere_alternation(&mut self, set: &ExpressionSet, syntax: Syntax) -> Result<Exp> {
        let mut res = self.ere_concat(set, syntax)?;
        while let Some(n) = self.regex_op(syntax, '|') {
            self.pos += n;
            let rhs = self.ere_concat(set, syntax)?;
            res = set.add(&res, &rhs);
        }
        Ok(res)
    }

    fn ere_concat(&mut self, set: &ExpressionSet, syntax: Syntax) -> Result<Exp> {
        let mut res = set.one();
        while self.peek().is_some() {
            if self.regex_op(syntax, '|').is_some() || self.regex_op(syntax, ')').is_some() {
                break;
            }
            let rhs = self.ere_repeat(set, syntax)?;
            res = set.mul(&res, &rhs);
        }
        Ok(res)
    }

    /// The body of a BRE interval `\{...\}`, the cursor being after `\{`.
    fn bre_interval(&mut self, start: usize) -> Result<String> {
        let mut body = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' && self.peek_at(1) == Some('}') {
                self.pos += 2;
                return Ok(body);
            }
            body.push(c);
            self.pos += 1;
        }
        Err(Error::syntax(start..self.pos, "missing `\\}`"))
    }

    fn ere_repeat(&mut self, set: &ExpressionSet, syntax: Syntax) -> Result<Exp> {
        let mut res = self.ere_atom(set, syntax)?;
        loop {
            let start = self.pos;
            match (syntax, self.peek()) {
                (_, Some('*')) => {
                    self.pos += 1;
                    res = set.star(&res);
                }
                (Syntax::Ere, Some('+')) => {
                    self.pos += 1;
                    res = set.power(&res, 1, None)?;
                }
                (Syntax::Ere, Some('?')) => {
                    self.pos += 1;
                    res = set.power(&res, 0, Some(1))?;
                }
                (Syntax::Ere, Some('{')) => {
                    self.pos += 1;
                    let (body, _) = self.delimited('{', '}')?;
                    let (min, max) = repetition(&body, start..self.pos)?;
                    res = set.power(&res, min, max)?;
                }
                (Syntax::Bre, Some('\\')) if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    let body = self.bre_interval(start)?;
                    let (min, max) = repetition(&body, start..self.pos)?;
                    res = set.power(&res, min, max)?;
                }
                _ => return Ok(res),
            }
        }
    }

    fn ere_atom(&mut self, set: &ExpressionSet, syntax: Syntax) -> Result<Exp> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Err(Error::syntax(start..start + 1, "unexpected end of input")),
        };
        if let Some(n) = self.regex_op(syntax, '(') {
            self.pos += n;
            let e = self.ere_alternation(set, syntax)?;
            match self.regex_op(syntax, ')') {
                Some(n) => self.pos += n,
                None => return Err(Error::syntax(self.pos..self.pos + n, "expected closing group")),
            }
            return Ok(e);
        }
        match c {
            '[' => {
                self.pos += 1;
                self.class(set, start)
            }
            '.' => {
                self.pos += 1;
                let gens = set
                    .labelset()
                    .generators()
                    .ok_or_else(|| Error::syntax(start..start + 1, "`.` needs a closed alphabet"))?;
                let mut res = set.zero();
                for g in gens {
                    let label = match (set.labelset(), g) {
                        (LabelSet::Words(_), Label::Letter(c)) => Label::Word(c.to_string()),
                        (_, g) => g,
                    };
                    res = set.add(&res, &set.atom(label));
                }
                Ok(res)
            }
            '^' | '$' => Err(Error::UnsupportedOperator {
                position: start..start + 1,
                operator: c.to_string(),
            }),
            '*' => Err(self.unexpected(c)),
            '+' | '?' | '{' if syntax == Syntax::Ere => Err(self.unexpected(c)),
            '\\' => match self.peek_at(1) {
                Some(op @ ('b' | 'B' | '<' | '>' | '`' | '\'')) => Err(Error::UnsupportedOperator {
                    position: start..start + 2,
                    operator: format!("\\{}", op),
                }),
                Some('{') if syntax == Syntax::Bre => Err(Error::syntax(start..start + 2, "unexpected `\\{`")),
                _ => {
                    let l = self.escaped_letter()?;
                    self.letter_atom(set, l, start)
                }
            },
            c => {
                self.pos += 1;
                self.letter_atom(set, c, start)
            }
        }
    }
}

fn error_start(e: &Error) -> usize {
    match e {
        Error::SyntaxError { position, .. } | Error::UnsupportedOperator { position, .. } => position.start,
        _ => 0,
    }
}

/// Bounds of `{n}`, `{m,n}`, `{m,}` and `{,n}`.
fn repetition(body: &str, position: std::ops::Range<usize>) -> Result<(usize, Option<usize>)> {
    let bad = || Error::syntax(position.clone(), format!("invalid repetition: {{{}}}", body));
    let number = |s: &str| -> Result<usize> { s.trim().parse::<usize>().map_err(|_| bad()) };
    let (min, max) = match body.split_once(',') {
        None => {
            let n = number(body)?;
            (n, Some(n))
        }
        Some((m, n)) => {
            let min = if m.trim().is_empty() { 0 } else { number(m)? };
            let max = match n.trim() {
                "" | "-1" => None,
                n => Some(number(n)?),
            };
            (min, max)
        }
    };
    if max.is_some_and(|max| max < min) {
        return Err(Error::syntax(
            position,
            format!("invalid repetition bounds: {{{}}}", body),
        ));
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::expression::{Expression, Identities};

    fn set(ctx: &str) -> ExpressionSet {
        ExpressionSet::new(Context::parse(ctx).unwrap(), Identities::Linear)
    }

    fn show(ctx: &str, text: &str, syntax: Syntax) -> String {
        let set = set(ctx);
        let e = parse(&set, text, syntax).unwrap();
        Expression::new(set, e).to_string()
    }

    #[test]
    fn test_precedence() {
        let c = "lal_char(abc), b";
        assert_eq!(show(c, "a+bc*", Syntax::Default), "a+bc*");
        assert_eq!(show(c, "(a+b)(c)", Syntax::Default), "(a+b)c");
        assert_eq!(show(c, "a&b+c", Syntax::Default), "c");
        assert_eq!(show(c, "a.b", Syntax::Default), "ab");
        assert_eq!(show(c, " a + b ", Syntax::Default), "a+b");
    }

    #[test]
    fn test_classes() {
        let c = "lal_char(abcd), b";
        assert_eq!(show(c, "[a-c]", Syntax::Default), "a+b+c");
        assert_eq!(show(c, "[^ab]", Syntax::Default), "c+d");
        assert_eq!(show(c, "[^]", Syntax::Default), "a+b+c+d");
        assert!(parse(&set(c), "[c-a]", Syntax::Default).is_err());
    }

    #[test]
    fn test_quoted_and_escapes() {
        assert_eq!(show("law_char(ab), b", "'ab'", Syntax::Default), "ab");
        assert_eq!(show("lat<lan_char(ab), lan_char(xy)>, b", "'a|\\e'", Syntax::Default), "a|\\e");
        assert_eq!(show("lal_char(...), b", "\\+\\x41", Syntax::Default), "\\+A");
        let err = parse(&set("lal_char(...), b"), "\\x00", Syntax::Default);
        assert!(matches!(err, Err(Error::BadLabel { .. })));
    }

    #[test]
    fn test_syntax_errors() {
        let s = set("lal_char(abc), b");
        match parse(&s, "a+(b", Syntax::Default) {
            Err(Error::SyntaxError { position, .. }) => assert_eq!(position, 4..5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse(&s, "a+", Syntax::Default), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse(&s, "*a", Syntax::Default), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse(&s, "a)", Syntax::Default), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse(&s, "d", Syntax::Default), Err(Error::BadLabel { .. })));
        match parse(&s, "a{3,1}", Syntax::Default) {
            Err(Error::SyntaxError { position, .. }) => assert_eq!(position, 1..6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_weights() {
        let c = "lal_char(abc), q";
        assert_eq!(show(c, "<1/2>a", Syntax::Default), "<1/2>a");
        assert_eq!(show(c, "⟨2⟩a", Syntax::Default), "<2>a");
        let s = set(c);
        assert!(matches!(parse(&s, "<x>a", Syntax::Default), Err(Error::SyntaxError { .. })));

        let nested = "lal_char(ab), expressionset<lal_char(xy), b>";
        assert_eq!(show(nested, "<x*>a", Syntax::Default), "<x*>a");
    }

    #[test]
    fn test_ere() {
        let c = "lal_char(abc), b";
        assert_eq!(show(c, "a|bc", Syntax::Ere), "a+bc");
        assert_eq!(show(c, "a+", Syntax::Ere), "aa*");
        assert_eq!(show(c, "()", Syntax::Ere), "\\e");
        assert_eq!(show(c, ".", Syntax::Ere), "a+b+c");
        assert_eq!(show("lal_char(a&!), b", "a&!", Syntax::Ere), "a\\&\\!");
        let s = set(c);
        match parse(&s, "^a", Syntax::Ere) {
            Err(Error::UnsupportedOperator { position, operator }) => {
                assert_eq!(position, 0..1);
                assert_eq!(operator, "^");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse(&s, "a\\b", Syntax::Ere), Err(Error::UnsupportedOperator { .. })));
        assert!(matches!(parse(&s, "a$", Syntax::Ere), Err(Error::UnsupportedOperator { .. })));
    }

    #[test]
    fn test_bre() {
        let c = "lal_char(abc), b";
        assert_eq!(show(c, "a\\|bc", Syntax::Bre), "a+bc");
        assert_eq!(show(c, "\\(a\\|b\\)c*", Syntax::Bre), "(a+b)c*");
        assert_eq!(show(c, "a\\{2\\}", Syntax::Bre), "aa");
        assert_eq!(show("lal_char(a+?|), b", "a+?|", Syntax::Bre), "a\\+\\?\\|");
        let s = set(c);
        assert!(matches!(parse(&s, "\\(a", Syntax::Bre), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse(&s, "a\\{2", Syntax::Bre), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse(&s, "^a", Syntax::Bre), Err(Error::UnsupportedOperator { .. })));
    }
}
