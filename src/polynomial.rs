//! Polynomials: finite weighted sums of labels.
//!
//! Terms are kept in a `BTreeMap` ordered by label, so iteration is canonical,
//! and no term ever has a zero weight.
//!
//! # Examples
//!
//! ```
//! use wfa_rs::context::Context;
//! use wfa_rs::polynomial::Polynomial;
//!
//! let ctx = Context::parse("law_char(abcd), z").unwrap();
//! let p = Polynomial::parse(&ctx, "<2>ab").unwrap();
//! let q = Polynomial::parse(&ctx, "<4>abc+<6>abd").unwrap();
//! let r = p.ldiv(&q).unwrap();
//! assert_eq!(r.to_string(), "<2>c + <3>d");
//! assert_eq!(p.mul(&r).unwrap(), q);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::labelset::{Label, LabelSet};
use crate::printer::{format_weight, Format};
use crate::weightset::{Semiring, Weight, WeightSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Polynomial {
    ctx: Context,
    terms: BTreeMap<Label, Weight>,
}

impl Polynomial {
    pub fn zero(ctx: &Context) -> Self {
        Polynomial {
            ctx: ctx.clone(),
            terms: BTreeMap::new(),
        }
    }

    /// `<w>l`, or zero when `w` is zero.
    pub fn monomial(ctx: &Context, label: Label, weight: Weight) -> Self {
        let mut res = Polynomial::zero(ctx);
        res.add_term(label, weight);
        res
    }

    /// Parse `\z`, or monomials `<w>label` separated by `+`.
    pub fn parse(ctx: &Context, text: &str) -> Result<Self> {
        let mut res = Polynomial::zero(ctx);
        if text.trim() == "\\z" || text.trim() == "∅" {
            return Ok(res);
        }
        for (start, part) in split_monomials(text) {
            let (weight, label) = parse_monomial(ctx, part).map_err(|e| e.shifted(start))?;
            res.add_term(label, weight);
        }
        Ok(res)
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn weightset(&self) -> &WeightSet {
        self.ctx.weightset()
    }

    fn labelset(&self) -> &LabelSet {
        self.ctx.labelset()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, label: &Label) -> Option<&Weight> {
        self.terms.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Weight)> {
        self.terms.iter()
    }

    /// Add `<w>l` in place, dropping the term if its weight becomes zero.
    pub fn add_term(&mut self, label: Label, weight: Weight) {
        if weight.is_zero() {
            return;
        }
        let sum = match self.terms.get(&label) {
            Some(w) => self.weightset().add(w, &weight),
            None => weight,
        };
        if sum.is_zero() {
            self.terms.remove(&label);
        } else {
            self.terms.insert(label, sum);
        }
    }

    fn check(&self, other: &Polynomial) -> Result<()> {
        self.ctx.require_same(&other.ctx)
    }

    pub fn add(&self, other: &Polynomial) -> Result<Polynomial> {
        self.check(other)?;
        let mut res = self.clone();
        for (l, w) in &other.terms {
            res.add_term(l.clone(), w.clone());
        }
        Ok(res)
    }

    /// `<w>P`.
    pub fn lmul_weight(&self, w: &Weight) -> Polynomial {
        let mut res = Polynomial::zero(&self.ctx);
        for (l, v) in &self.terms {
            res.add_term(l.clone(), self.weightset().mul(w, v));
        }
        res
    }

    /// `P<w>`.
    pub fn rmul_weight(&self, w: &Weight) -> Polynomial {
        let mut res = Polynomial::zero(&self.ctx);
        for (l, v) in &self.terms {
            res.add_term(l.clone(), self.weightset().mul(v, w));
        }
        res
    }

    /// Product, concatenating labels.
    pub fn mul(&self, other: &Polynomial) -> Result<Polynomial> {
        self.check(other)?;
        let mut res = Polynomial::zero(&self.ctx);
        for (l1, w1) in &self.terms {
            for (l2, w2) in &other.terms {
                let l = self.labelset().mul(l1, l2)?;
                res.add_term(l, self.weightset().mul(w1, w2));
            }
        }
        Ok(res)
    }

    /// Left quotient: the polynomial `R` such that `self · R = rhs`.
    ///
    /// Fails with [`Error::NotDivisible`] when no such `R` exists.
    pub fn ldiv(&self, rhs: &Polynomial) -> Result<Polynomial> {
        self.check(rhs)?;
        let ls = self.labelset();
        let ws = self.weightset();
        if ls.is_tuple() {
            return Err(Error::not_divisible("multi-tape polynomials"));
        }
        let (lead, lead_weight) = match self.terms.iter().next() {
            Some((l, w)) => (l.clone(), w.clone()),
            None => return Err(Error::not_divisible("division by zero")),
        };
        let max_len = |p: &Polynomial| p.terms.keys().map(Label::len).max().unwrap_or(0);
        let (lhs_len, rhs_len) = (max_len(self), max_len(rhs));
        if !rhs.is_zero() && lhs_len > rhs_len {
            return Err(Error::not_divisible(format!("{} is longer than {}", self, rhs)));
        }
        let bound = rhs_len.saturating_sub(lhs_len);
        let is_ring = ws.sub(&ws.one(), &ws.one()).is_some();

        let mut quotient = Polynomial::zero(&self.ctx);
        let mut remainder = rhs.clone();
        while let Some((label, weight)) = remainder.terms.iter().next().map(|(l, w)| (l.clone(), w.clone())) {
            let suffix = strip_label_prefix(ls, &lead, &label)
                .ok_or_else(|| Error::not_divisible(format!("{} is not a prefix of {}", lead, label)))?;
            if suffix.len() > bound {
                return Err(Error::not_divisible(format!("quotient of {} by {} is unbounded", rhs, self)));
            }
            let w = ws
                .ldiv(&lead_weight, &weight)
                .ok_or_else(|| Error::not_divisible(format!("{} does not divide {}", lead_weight, weight)))?;
            debug!("ldiv: {} by {}: term <{}>{}", label, lead, w, suffix);
            let term = Polynomial::monomial(&self.ctx, suffix, w);
            let product = self.mul(&term)?;
            if is_ring {
                for (l, v) in &product.terms {
                    let neg = ws.sub(&ws.zero(), v).unwrap_or_else(|| ws.zero());
                    remainder.add_term(l.clone(), neg);
                }
            } else {
                for l in product.terms.keys() {
                    remainder.terms.remove(l);
                }
            }
            quotient = quotient.add(&term)?;
        }
        if self.mul(&quotient)? != *rhs {
            return Err(Error::not_divisible(format!("{} does not divide {}", self, rhs)));
        }
        Ok(quotient)
    }

    /// Greatest common left divisor.
    ///
    /// When one operand divides the other it is the result. Otherwise the
    /// result is the longest label prefix common to every term of both
    /// operands, weighted by the gcd of all their weights; `\e` with weight
    /// one when there is no common prefix.
    pub fn lgcd(&self, rhs: &Polynomial) -> Result<Polynomial> {
        self.check(rhs)?;
        if self.is_zero() {
            return Ok(rhs.clone());
        }
        if rhs.is_zero() || self == rhs || self.ldiv(rhs).is_ok() {
            return Ok(self.clone());
        }
        if rhs.ldiv(self).is_ok() {
            return Ok(rhs.clone());
        }
        let ls = self.labelset();
        let ws = self.weightset();
        let mut labels = self.terms.keys().chain(rhs.terms.keys());
        let mut prefix: Vec<char> = labels.next().map(Label::letters).unwrap_or_default();
        for l in labels {
            let letters = l.letters();
            let common = prefix.iter().zip(&letters).take_while(|(a, b)| a == b).count();
            prefix.truncate(common);
        }
        let mut weights = self.terms.values().chain(rhs.terms.values());
        let first = weights.next().cloned().unwrap_or_else(|| ws.one());
        let gcd = weights.fold(first, |acc, w| ws.gcd(&acc, w));
        let label = if prefix.is_empty() {
            ls.one()
        } else {
            ls.word(&prefix)?
        };
        let gcd = if gcd.is_zero() { ws.one() } else { gcd };
        Ok(Polynomial::monomial(&self.ctx, label, gcd))
    }

    /// Render with the given weight style.
    pub fn format(&self, format: Format) -> String {
        if self.terms.is_empty() {
            return if format == Format::Utf8 { "∅".into() } else { "\\z".into() };
        }
        let mut parts = Vec::new();
        for (l, w) in &self.terms {
            let label = match (format, l) {
                (Format::Utf8, Label::One) => "ε".to_string(),
                _ => l.to_string(),
            };
            if w.is_one() {
                parts.push(label);
            } else if format == Format::Utf8 {
                parts.push(format!("⟨{}⟩{}", format_weight(w, format), label));
            } else {
                parts.push(format!("<{}>{}", format_weight(w, format), label));
            }
        }
        parts.join(" + ")
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(Format::Text))
    }
}

/// The rest of `label` after `prefix`, if `prefix` is one.
fn strip_label_prefix(ls: &LabelSet, prefix: &Label, label: &Label) -> Option<Label> {
    let p = prefix.letters();
    let l = label.letters();
    if l.len() < p.len() || l[..p.len()] != p[..] {
        return None;
    }
    ls.word(&l[p.len()..]).ok()
}

/// Split on top-level `+`, outside weights and escapes, with each part's
/// character offset.
fn split_monomials(text: &str) -> Vec<(usize, &str)> {
    let mut res = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start_byte = 0;
    let mut start_char = 0;
    for (n, (i, c)) in text.char_indices().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '<' | '⟨' => depth += 1,
            '>' | '⟩' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => {
                res.push((start_char, &text[start_byte..i]));
                start_byte = i + c.len_utf8();
                start_char = n + 1;
            }
            _ => {}
        }
    }
    res.push((start_char, &text[start_byte..]));
    res
}

fn parse_monomial(ctx: &Context, text: &str) -> Result<(Weight, Label)> {
    let trimmed = text.trim_start();
    let offset = text.chars().count() - trimmed.chars().count();
    let (open, close) = if trimmed.starts_with('<') {
        ('<', '>')
    } else if trimmed.starts_with('⟨') {
        ('⟨', '⟩')
    } else {
        return Ok((ctx.weightset().one(), ctx.parse_label(trimmed)?));
    };
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in trimmed.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                end = Some(i);
                break;
            }
        }
    }
    let end = end.ok_or_else(|| Error::syntax(offset..offset + 1, format!("missing `{}`", close)))?;
    let weight = ctx
        .parse_weight(&trimmed[open.len_utf8()..end])
        .map_err(|e| e.shifted(offset + 1))?;
    let rest = trimmed[end + close.len_utf8()..].trim();
    let label = if rest.is_empty() {
        ctx.labelset().word(&[])?
    } else {
        ctx.parse_label(rest)?
    };
    Ok((weight, label))
}
