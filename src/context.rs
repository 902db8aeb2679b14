//! Contexts: a labelset paired with a weightset.
//!
//! A context is described by a *descriptor*, accepted in three dialects:
//!
//! - legacy: `lal_char(abc), b`, `lan_char(a-c) -> z`, `law_char(ab)_q`,
//!   `lat<lal_char(ab), lan_char(xy)>, zmin`;
//! - canonical: `letterset<char_letters(abc)>, b`, `nullableset<letterset<...>>`,
//!   `wordset<char_letters(...)>`, `lat<...>`;
//! - short: `[abc] -> b`, `[a-c]? -> z`, `[ab]* -> q`, `[ab] x [xy] -> b`,
//!   `[...]` for an open alphabet, `RatE[[xy] -> b]` for expression weights.
//!
//! Contexts always print in the canonical dialect.
//!
//! # Examples
//!
//! ```
//! use wfa_rs::context::Context;
//!
//! let ctx: Context = "lal_char(abc), z".parse().unwrap();
//! assert_eq!(ctx.to_string(), "letterset<char_letters(abc)>, z");
//! assert_eq!(ctx, Context::parse("[abc] -> Z").unwrap());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expression::{ExpressionSet, Identities};
use crate::labelset::{Alphabet, Label, LabelSet};
use crate::weightset::{Semiring, Weight, WeightSet};

#[derive(PartialEq, Eq, Hash)]
struct ContextInner {
    labelset: LabelSet,
    weightset: WeightSet,
}

/// An immutable `(labelset, weightset)` pair, cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Context(Arc<ContextInner>);

impl Context {
    pub fn new(labelset: LabelSet, weightset: WeightSet) -> Self {
        Context(Arc::new(ContextInner { labelset, weightset }))
    }

    /// Parse a context descriptor in any of the accepted dialects.
    pub fn parse(text: &str) -> Result<Context> {
        let mut p = DescriptorParser::new(text);
        let ctx = p.context()?;
        p.skip_ws();
        if !p.at_end() {
            return Err(p.error("unexpected trailing characters"));
        }
        Ok(ctx)
    }

    pub fn labelset(&self) -> &LabelSet {
        &self.0.labelset
    }

    pub fn weightset(&self) -> &WeightSet {
        &self.0.weightset
    }

    pub fn with_labelset(&self, labelset: LabelSet) -> Context {
        Context::new(labelset, self.weightset().clone())
    }

    pub fn with_weightset(&self, weightset: WeightSet) -> Context {
        Context::new(self.labelset().clone(), weightset)
    }

    pub fn parse_label(&self, text: &str) -> Result<Label> {
        self.labelset().parse_label(text)
    }

    pub fn parse_weight(&self, text: &str) -> Result<Weight> {
        self.weightset().parse(text)
    }

    pub fn weight_add(&self, lhs: &Weight, rhs: &Weight) -> Weight {
        self.weightset().add(lhs, rhs)
    }

    pub fn weight_mul(&self, lhs: &Weight, rhs: &Weight) -> Weight {
        self.weightset().mul(lhs, rhs)
    }

    pub fn weight_star(&self, value: &Weight) -> Result<Weight> {
        self.weightset().star(value)
    }

    /// Total order on labels, used for canonical iteration.
    pub fn label_order(&self, lhs: &Label, rhs: &Label) -> Ordering {
        lhs.cmp(rhs)
    }

    /// Total order on weights.
    pub fn weight_order(&self, lhs: &Weight, rhs: &Weight) -> Ordering {
        lhs.cmp(rhs)
    }

    /// The context with the empty word removed from the labelset.
    pub fn proper(&self) -> Context {
        self.with_labelset(self.labelset().proper())
    }

    /// The context with the empty word added to the labelset.
    pub fn nullable(&self) -> Context {
        self.with_labelset(self.labelset().nullable())
    }

    /// Multi-tape context over the labelsets of `contexts`, with their
    /// weightsets joined.
    pub fn product(contexts: &[Context]) -> Result<Context> {
        let mut iter = contexts.iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::precondition("product", "needs at least one context"))?;
        let mut weightset = first.weightset().clone();
        for ctx in iter {
            weightset = weightset
                .join(ctx.weightset())
                .ok_or_else(|| Error::incompatible(&weightset, ctx.weightset()))?;
        }
        let labelset = LabelSet::Tuple(contexts.iter().map(|c| c.labelset().clone()).collect());
        Ok(Context::new(labelset, weightset))
    }

    /// The smallest context both `self` and `other` embed into.
    pub fn join(&self, other: &Context) -> Result<Context> {
        let labelset = if self.labelset().embeds_into(other.labelset()) {
            other.labelset().clone()
        } else if other.labelset().embeds_into(self.labelset()) {
            self.labelset().clone()
        } else {
            return Err(Error::incompatible(self, other));
        };
        let weightset = self
            .weightset()
            .join(other.weightset())
            .ok_or_else(|| Error::incompatible(self, other))?;
        Ok(Context::new(labelset, weightset))
    }

    /// Fail with `IncompatibleContext` unless `other` is this context.
    pub fn require_same(&self, other: &Context) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(Error::incompatible(self, other))
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.labelset(), self.weightset())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({})", self)
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Context::parse(s)
    }
}

/// Recursive-descent parser for context descriptors.
struct DescriptorParser<'a> {
    chars: Vec<char>,
    pos: usize,
    text: &'a str,
}

impl<'a> DescriptorParser<'a> {
    fn new(text: &'a str) -> Self {
        DescriptorParser {
            chars: text.chars().collect(),
            pos: 0,
            text,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.pos..self.pos + 1, format!("{}: {}", message.into(), self.text))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn rest_starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn eat(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.rest_starts_with(s) {
            self.pos += s.chars().count();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", s)))
        }
    }

    /// Identifier made of alphanumerics and underscores.
    fn ident(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Raw text up to the unescaped `close` delimiter, which is consumed.
    fn until(&mut self, close: char) -> Result<String> {
        let start = self.pos;
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == close {
                let body = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(body);
            }
            self.pos += 1;
        }
        self.pos = start;
        Err(self.error(format!("missing `{}`", close)))
    }

    fn alphabet(&mut self, close: char) -> Result<Alphabet> {
        let start = self.pos;
        let body = self.until(close)?;
        Alphabet::parse(&body).map_err(|e| e.shifted(start))
    }

    fn context(&mut self) -> Result<Context> {
        let labelset = self.labelset()?;
        self.skip_ws();
        if !(self.eat("->") || self.eat(",") || self.eat("_")) {
            return Err(self.error("expected `,` or `->`"));
        }
        let weightset = self.weightset()?;
        Ok(Context::new(labelset, weightset))
    }

    fn labelset(&mut self) -> Result<LabelSet> {
        let ls = self.single_labelset()?;
        // Short tuples: `[ab] x [xy]`.
        let mut tapes = vec![ls];
        loop {
            let save = self.pos;
            self.skip_ws();
            if self.peek() == Some('x') && self.chars.get(self.pos + 1).is_some_and(|c| c.is_whitespace()) {
                self.pos += 1;
                self.skip_ws();
                if self.peek() == Some('[') {
                    tapes.push(self.single_labelset()?);
                    continue;
                }
            }
            self.pos = save;
            break;
        }
        Ok(if tapes.len() == 1 {
            tapes.remove(0)
        } else {
            LabelSet::Tuple(tapes)
        })
    }

    fn single_labelset(&mut self) -> Result<LabelSet> {
        self.skip_ws();
        if self.eat("[") {
            let alphabet = self.alphabet(']')?;
            return Ok(if self.rest_starts_with("?") {
                self.pos += 1;
                LabelSet::Nullable(alphabet)
            } else if self.rest_starts_with("*") {
                self.pos += 1;
                LabelSet::Words(alphabet)
            } else {
                LabelSet::Letters(alphabet)
            });
        }
        let start = self.pos;
        let name = self.ident();
        match name.as_str() {
            "lal_char" | "lan_char" | "law_char" => {
                self.expect("(")?;
                let alphabet = self.alphabet(')')?;
                Ok(match name.as_str() {
                    "lal_char" => LabelSet::Letters(alphabet),
                    "lan_char" => LabelSet::Nullable(alphabet),
                    _ => LabelSet::Words(alphabet),
                })
            }
            "letterset" | "wordset" => {
                self.expect("<")?;
                self.expect("char_letters")?;
                self.expect("(")?;
                let alphabet = self.alphabet(')')?;
                self.expect(">")?;
                Ok(if name == "letterset" {
                    LabelSet::Letters(alphabet)
                } else {
                    LabelSet::Words(alphabet)
                })
            }
            "nullableset" => {
                self.expect("<")?;
                let inner = self.labelset()?;
                self.expect(">")?;
                match inner {
                    LabelSet::Letters(a) | LabelSet::Nullable(a) => Ok(LabelSet::Nullable(a)),
                    other => Ok(other.nullable()),
                }
            }
            "lat" => {
                self.expect("<")?;
                let mut tapes = vec![self.labelset()?];
                while self.eat(",") {
                    tapes.push(self.labelset()?);
                }
                self.expect(">")?;
                Ok(LabelSet::Tuple(tapes))
            }
            _ => {
                self.pos = start;
                Err(self.error(format!("unknown labelset `{}`", name)))
            }
        }
    }

    fn weightset(&mut self) -> Result<WeightSet> {
        let start = {
            self.skip_ws();
            self.pos
        };
        let name = self.ident();
        match name.as_str() {
            "expressionset" | "ratexpset" | "seriesset" => {
                self.expect("<")?;
                let ctx = self.context()?;
                self.expect(">")?;
                let mut ids = Identities::default();
                if self.eat("(") {
                    let start = self.pos;
                    let body = self.until(')')?;
                    ids = body.parse().map_err(|e: Error| e.shifted(start))?;
                }
                Ok(WeightSet::Expressions(Box::new(ExpressionSet::new(ctx, ids))))
            }
            "RatE" => {
                self.expect("[")?;
                let ctx = self.context()?;
                self.expect("]")?;
                Ok(WeightSet::Expressions(Box::new(ExpressionSet::new(ctx, Identities::default()))))
            }
            _ => WeightSet::from_name(&name).ok_or_else(|| {
                self.pos = start;
                self.error(format!("unknown weightset `{}`", name))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(s: &str) -> Context {
        Context::parse(s).unwrap()
    }

    #[test]
    fn test_dialects_agree() {
        let canonical = ctx("letterset<char_letters(abc)>, b");
        assert_eq!(ctx("lal_char(abc), b"), canonical);
        assert_eq!(ctx("lal_char(a-c)_b"), canonical);
        assert_eq!(ctx("[abc] -> B"), canonical);
        assert_eq!(ctx("[a-c] -> b"), canonical);
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "lal_char(abc), b",
            "lan_char(ab), z",
            "law_char(ab), q",
            "lat<lal_char(ab), lan_char(xy)>, zmin",
            "lal_char(ab), expressionset<lal_char(xy), b>",
            "[...] -> zmax",
            "[ab] x [xy]? -> r",
        ] {
            let c = ctx(text);
            assert_eq!(ctx(&c.to_string()), c, "{}", text);
        }
    }

    #[test]
    fn test_short_forms() {
        let c = ctx("[ab]? -> z");
        assert!(matches!(c.labelset(), LabelSet::Nullable(_)));
        let c = ctx("[ab]* -> q");
        assert!(c.labelset().is_wordset());
        let c = ctx("[ab] x [xy] -> b");
        assert_eq!(c.labelset().num_tapes(), 2);
        let c = ctx("[ab] -> RatE[[xy] -> b]");
        assert!(matches!(c.weightset(), WeightSet::Expressions(_)));
        let c = ctx("[...] -> b");
        assert!(c.parse_label("z").is_ok());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(Context::parse("lal_foo(ab), b"), Err(Error::SyntaxError { .. })));
        assert!(matches!(Context::parse("lal_char(ab), w"), Err(Error::SyntaxError { .. })));
        assert!(matches!(Context::parse("lal_char(ab"), Err(Error::SyntaxError { .. })));
    }

    #[test]
    fn test_product() {
        let c = Context::product(&[ctx("[ab] -> b"), ctx("[xy]? -> z")]).unwrap();
        assert_eq!(c.weightset(), &WeightSet::Z);
        assert_eq!(c.labelset().num_tapes(), 2);
        let err = Context::product(&[ctx("[ab] -> zmin"), ctx("[xy] -> z")]);
        assert!(matches!(err, Err(Error::IncompatibleContext { .. })));
    }

    #[test]
    fn test_join() {
        let j = ctx("[ab] -> b").join(&ctx("[abc]? -> q")).unwrap();
        assert_eq!(j, ctx("[abc]? -> q"));
        assert!(ctx("[ab]* -> b").join(&ctx("[ab] x [ab] -> b")).is_err());
    }

    #[test]
    fn test_proper() {
        assert_eq!(ctx("lan_char(ab), b").proper(), ctx("lal_char(ab), b"));
        assert_eq!(ctx("law_char(ab), b").proper(), ctx("law_char(ab), b"));
    }
}
