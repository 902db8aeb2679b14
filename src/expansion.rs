//! Expansions: first-order symbolic derivatives of expressions.
//!
//! The expansion of `E` is its constant term plus, for every first label `l`,
//! a polynomial of expressions `d_l(E)` such that
//! `E = c(E) + Σ l·d_l(E)`. Derived-term automata are built by closing
//! expressions under expansion.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::expression::{Exp, ExpNode, ExpressionSet};
use crate::labelset::{Label, LabelSet};
use crate::printer::{format_exp, format_weight, Format};
use crate::weightset::{Semiring, Weight};

/// A finite weighted sum of expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpPolynomial {
    terms: BTreeMap<Exp, Weight>,
}

impl ExpPolynomial {
    pub fn new() -> Self {
        ExpPolynomial::default()
    }

    pub fn monomial(rs: &ExpressionSet, e: Exp, w: Weight) -> Self {
        let mut res = ExpPolynomial::new();
        res.add_term(rs, e, w);
        res
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

    pub fn iter(&self) -> impl Iterator<Item = (&Exp, &Weight)> {
        self.terms.iter()
    }

    /// Add `<w>e`; a left weight on `e` is moved into the coefficient.
    pub fn add_term(&mut self, rs: &ExpressionSet, e: Exp, w: Weight) {
        let ws = rs.weightset();
        let (e, w) = match &*e {
            ExpNode::LWeight(k, sub) => (sub.clone(), ws.mul(&w, k)),
            _ => (e, w),
        };
        if w.is_zero() || rs.is_zero(&e) {
            return;
        }
        let sum = match self.terms.remove(&e) {
            Some(v) => ws.add(&v, &w),
            None => w,
        };
        if !sum.is_zero() {
            self.terms.insert(e, sum);
        }
    }

    pub fn add_assign(&mut self, rs: &ExpressionSet, other: &ExpPolynomial) {
        for (e, w) in &other.terms {
            self.add_term(rs, e.clone(), w.clone());
        }
    }

    pub fn lmul_weight(&self, rs: &ExpressionSet, k: &Weight) -> ExpPolynomial {
        let mut res = ExpPolynomial::new();
        for (e, w) in &self.terms {
            res.add_term(rs, e.clone(), rs.weightset().mul(k, w));
        }
        res
    }

    /// `P<k>`: weights scale on the right, inside the expressions when the
    /// weightset does not commute.
    pub fn rmul_weight(&self, rs: &ExpressionSet, k: &Weight) -> ExpPolynomial {
        let ws = rs.weightset();
        let mut res = ExpPolynomial::new();
        for (e, w) in &self.terms {
            if ws.is_commutative() {
                res.add_term(rs, e.clone(), ws.mul(w, k));
            } else {
                res.add_term(rs, rs.rweight(e, k), w.clone());
            }
        }
        res
    }

    /// Apply `f` to every expression, keeping the coefficients.
    pub fn map(&self, rs: &ExpressionSet, f: impl Fn(&Exp) -> Exp) -> ExpPolynomial {
        let mut res = ExpPolynomial::new();
        for (e, w) in &self.terms {
            res.add_term(rs, f(e), w.clone());
        }
        res
    }

    /// Product of two polynomials, with `f` combining the expressions.
    pub fn zip_with(&self, rs: &ExpressionSet, other: &ExpPolynomial, f: impl Fn(&Exp, &Exp) -> Exp) -> ExpPolynomial {
        let mut res = ExpPolynomial::new();
        for (e, v) in &self.terms {
            for (g, w) in &other.terms {
                res.add_term(rs, f(e, g), rs.weightset().mul(v, w));
            }
        }
        res
    }

    /// The sum `Σ <w>e` as an expression.
    pub fn to_exp(&self, rs: &ExpressionSet) -> Exp {
        self.terms
            .iter()
            .fold(rs.zero(), |acc, (e, w)| rs.add(&acc, &rs.lweight(w, e)))
    }

    pub fn format(&self, format: Format) -> String {
        if self.terms.is_empty() {
            return if format == Format::Utf8 { "∅".into() } else { "\\z".into() };
        }
        self.terms
            .iter()
            .map(|(e, w)| {
                let e = format_exp(e, format);
                match (w.is_one(), format) {
                    (true, _) => e,
                    (false, Format::Utf8) => format!("⟨{}⟩{}", format_weight(w, format), e),
                    (false, Format::Text) => format!("<{}>{}", format_weight(w, format), e),
                }
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl fmt::Display for ExpPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(Format::Text))
    }
}

/// `c + Σ l·[P_l]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub constant: Weight,
    pub polynomials: BTreeMap<Label, ExpPolynomial>,
}

impl Expansion {
    pub fn zero(rs: &ExpressionSet) -> Self {
        Expansion {
            constant: rs.weightset().zero(),
            polynomials: BTreeMap::new(),
        }
    }

    pub fn one(rs: &ExpressionSet) -> Self {
        Expansion {
            constant: rs.weightset().one(),
            polynomials: BTreeMap::new(),
        }
    }

    fn add_polynomial(&mut self, rs: &ExpressionSet, label: Label, p: ExpPolynomial) {
        if p.is_zero() {
            return;
        }
        let entry = self.polynomials.entry(label.clone()).or_default();
        entry.add_assign(rs, &p);
        if entry.is_zero() {
            self.polynomials.remove(&label);
        }
    }

    fn add_assign(&mut self, rs: &ExpressionSet, other: Expansion) {
        self.constant = rs.weightset().add(&self.constant, &other.constant);
        for (l, p) in other.polynomials {
            self.add_polynomial(rs, l, p);
        }
    }

    fn lmul_weight(&self, rs: &ExpressionSet, k: &Weight) -> Expansion {
        Expansion {
            constant: rs.weightset().mul(k, &self.constant),
            polynomials: self
                .polynomials
                .iter()
                .map(|(l, p)| (l.clone(), p.lmul_weight(rs, k)))
                .filter(|(_, p)| !p.is_zero())
                .collect(),
        }
    }

    fn rmul_weight(&self, rs: &ExpressionSet, k: &Weight) -> Expansion {
        Expansion {
            constant: rs.weightset().mul(&self.constant, k),
            polynomials: self
                .polynomials
                .iter()
                .map(|(l, p)| (l.clone(), p.rmul_weight(rs, k)))
                .filter(|(_, p)| !p.is_zero())
                .collect(),
        }
    }

    /// Right-multiply every derivative by `e`, dropping the constant.
    fn rmul_exp(&self, rs: &ExpressionSet, e: &Exp) -> Expansion {
        let mut res = Expansion::zero(rs);
        for (l, p) in &self.polynomials {
            res.add_polynomial(rs, l.clone(), p.map(rs, |f| rs.mul(f, e)));
        }
        res
    }

    /// Whether there is no derivative and the constant is zero.
    pub fn is_zero(&self) -> bool {
        self.constant.is_zero() && self.polynomials.is_empty()
    }

    pub fn format(&self, format: Format) -> String {
        let mut parts = Vec::new();
        if !self.constant.is_zero() {
            parts.push(match format {
                Format::Text => format!("<{}>", format_weight(&self.constant, format)),
                Format::Utf8 => format!("⟨{}⟩", format_weight(&self.constant, format)),
            });
        }
        for (l, p) in &self.polynomials {
            let label = match (l, format) {
                (Label::One, Format::Utf8) => "ε".to_string(),
                _ => l.to_string(),
            };
            parts.push(match format {
                Format::Text => format!("{}.[{}]", label, p.format(format)),
                Format::Utf8 => format!("{}⊙[{}]", label, p.format(format)),
            });
        }
        if parts.is_empty() {
            return if format == Format::Utf8 { "∅".into() } else { "\\z".into() };
        }
        parts.join(" + ")
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(Format::Text))
    }
}

/// Compute the expansion of `e`.
pub fn to_expansion(rs: &ExpressionSet, e: &Exp) -> Result<Expansion> {
    let ws = rs.weightset();
    Ok(match &**e {
        ExpNode::Zero => Expansion::zero(rs),
        ExpNode::One => Expansion::one(rs),
        ExpNode::Atom(l) => {
            let mut res = Expansion::zero(rs);
            if l.is_one() {
                res.constant = ws.one();
            } else {
                res.add_polynomial(rs, l.clone(), ExpPolynomial::monomial(rs, rs.one(), ws.one()));
            }
            res
        }
        ExpNode::Sum(es) => {
            let mut res = Expansion::zero(rs);
            for sub in es {
                res.add_assign(rs, to_expansion(rs, sub)?);
            }
            res
        }
        ExpNode::Prod(es) => product(rs, es)?,
        ExpNode::Star(sub) => {
            let x = to_expansion(rs, sub)?;
            let c = ws.star(&x.constant)?;
            let mut res = Expansion {
                constant: c.clone(),
                polynomials: BTreeMap::new(),
            };
            for (l, p) in &x.polynomials {
                let p = p.lmul_weight(rs, &c).map(rs, |f| rs.mul(f, e));
                res.add_polynomial(rs, l.clone(), p);
            }
            res
        }
        ExpNode::LWeight(k, sub) => to_expansion(rs, sub)?.lmul_weight(rs, k),
        ExpNode::RWeight(sub, k) => to_expansion(rs, sub)?.rmul_weight(rs, k),
        ExpNode::Conjunction(es) => {
            let mut it = es.iter();
            let mut res = match it.next() {
                Some(first) => to_expansion(rs, first)?,
                None => return Ok(Expansion::zero(rs)),
            };
            for sub in it {
                let rhs = to_expansion(rs, sub)?;
                let mut next = Expansion {
                    constant: ws.mul(&res.constant, &rhs.constant),
                    polynomials: BTreeMap::new(),
                };
                for (l, p) in &res.polynomials {
                    if let Some(q) = rhs.polynomials.get(l) {
                        next.add_polynomial(rs, l.clone(), p.zip_with(rs, q, |a, b| rs.conjunction(a, b)));
                    }
                }
                res = next;
            }
            res
        }
        ExpNode::Shuffle(es) => {
            let mut it = es.iter();
            let (mut acc, mut res) = match it.next() {
                Some(first) => (first.clone(), to_expansion(rs, first)?),
                None => return Ok(Expansion::zero(rs)),
            };
            for sub in it {
                let rhs = to_expansion(rs, sub)?;
                let mut next = Expansion {
                    constant: ws.mul(&res.constant, &rhs.constant),
                    polynomials: BTreeMap::new(),
                };
                for (l, p) in &res.polynomials {
                    next.add_polynomial(rs, l.clone(), p.map(rs, |f| rs.shuffle(f, sub)));
                }
                for (l, q) in &rhs.polynomials {
                    next.add_polynomial(rs, l.clone(), q.map(rs, |g| rs.shuffle(&acc, g)));
                }
                acc = rs.shuffle(&acc, sub);
                res = next;
            }
            res
        }
        ExpNode::Complement(sub) => complement(rs, sub)?,
        ExpNode::Transposition(sub) => to_expansion(rs, &rs.transpose(sub)?)?,
        ExpNode::Tuple(tapes) => tuple(rs, tapes)?,
    })
}

/// `E1...En`, left to right.
fn product(rs: &ExpressionSet, es: &[Exp]) -> Result<Expansion> {
    let ws = rs.weightset();
    let mut res = Expansion::one(rs);
    for (i, sub) in es.iter().enumerate() {
        if res.constant.is_zero() {
            let rest = es[i..].iter().skip(1).fold(sub.clone(), |acc, f| rs.mul(&acc, f));
            return Ok(res.rmul_exp(rs, &rest));
        }
        let c = res.constant.clone();
        let mut next = res.rmul_exp(rs, sub);
        let x = to_expansion(rs, sub)?;
        next.add_assign(rs, x.lmul_weight(rs, &c));
        next.constant = ws.mul(&c, &x.constant);
        res = next;
    }
    Ok(res)
}

fn complement(rs: &ExpressionSet, sub: &Exp) -> Result<Expansion> {
    let ls = rs.labelset();
    let generators = match ls.generators() {
        Some(g) if ls.is_free() => g,
        _ => {
            return Err(Error::precondition(
                "complement",
                format!("a free labelset with a closed alphabet, not {}", ls),
            ))
        }
    };
    let ws = rs.weightset();
    let x = to_expansion(rs, sub)?;
    let mut res = Expansion::zero(rs);
    res.constant = ws.from_bool(x.constant.is_zero());
    for l in generators {
        let inner = x.polynomials.get(&l).map(|p| p.to_exp(rs)).unwrap_or_else(|| rs.zero());
        let p = ExpPolynomial::monomial(rs, rs.complement(&inner)?, ws.one());
        res.add_polynomial(rs, l, p);
    }
    Ok(res)
}

/// Cartesian product of the tapes' moves.
fn tuple(rs: &ExpressionSet, tapes: &[Exp]) -> Result<Expansion> {
    let tape_sets: Vec<LabelSet> = match rs.labelset() {
        LabelSet::Tuple(ls) => ls.clone(),
        other => return Err(Error::incompatible("a multi-tape context", other)),
    };
    let ws = rs.weightset();
    // Per tape: (label, expressions with weights); `Label::One` stands for
    // the tape having finished.
    let mut moves: Vec<Vec<(Label, Vec<(Exp, Weight)>)>> = Vec::new();
    for (i, e) in tapes.iter().enumerate() {
        let ts = rs
            .tape(i)
            .ok_or_else(|| Error::incompatible(format!("{} tapes", tape_sets.len()), rs.context()))?;
        let x = to_expansion(&ts, e)?;
        let mut tape_moves = Vec::new();
        if !x.constant.is_zero() {
            tape_moves.push((Label::One, vec![(ts.one(), x.constant.clone())]));
        }
        for (l, p) in &x.polynomials {
            tape_moves.push((l.clone(), p.iter().map(|(e, w)| (e.clone(), w.clone())).collect()));
        }
        moves.push(tape_moves);
    }

    let mut res = Expansion::zero(rs);
    let mut combos: Vec<(Vec<Label>, Vec<(Vec<Exp>, Weight)>)> = vec![(Vec::new(), vec![(Vec::new(), ws.one())])];
    for tape_moves in &moves {
        let mut next = Vec::new();
        for (labels, terms) in &combos {
            for (l, mono) in tape_moves {
                let mut labels = labels.clone();
                labels.push(l.clone());
                let mut new_terms = Vec::new();
                for (es, w) in terms {
                    for (e, v) in mono {
                        let mut es = es.clone();
                        es.push(e.clone());
                        new_terms.push((es, ws.mul(w, v)));
                    }
                }
                next.push((labels, new_terms));
            }
        }
        combos = next;
    }
    for (labels, terms) in combos {
        if labels.iter().all(Label::is_one) {
            for (_, w) in terms {
                res.constant = ws.add(&res.constant, &w);
            }
            continue;
        }
        let label = Label::Tuple(labels);
        if !rs.labelset().contains(&label) {
            continue;
        }
        let mut p = ExpPolynomial::new();
        for (es, w) in terms {
            p.add_term(rs, rs.tuple(&es)?, w);
        }
        res.add_polynomial(rs, label, p);
    }
    Ok(res)
}

/// The weight of the empty word in `e`.
pub fn constant_term(rs: &ExpressionSet, e: &Exp) -> Result<Weight> {
    Ok(to_expansion(rs, e)?.constant)
}

/// Develop `e` into a sum of weighted monomials.
///
/// Sums and products are distributed, weights scale, conjunctions and
/// shuffles distribute pairwise; any other node is its own monomial.
pub fn expand(rs: &ExpressionSet, e: &Exp) -> Exp {
    expand_polynomial(rs, e).to_exp(rs)
}

fn expand_polynomial(rs: &ExpressionSet, e: &Exp) -> ExpPolynomial {
    let ws = rs.weightset();
    let pairwise = |es: &[Exp], f: &dyn Fn(&Exp, &Exp) -> Exp| -> ExpPolynomial {
        let mut it = es.iter();
        let first = match it.next() {
            Some(first) => expand_polynomial(rs, first),
            None => return ExpPolynomial::new(),
        };
        it.fold(first, |acc, sub| acc.zip_with(rs, &expand_polynomial(rs, sub), f))
    };
    match &**e {
        ExpNode::Zero => ExpPolynomial::new(),
        ExpNode::Sum(es) => {
            let mut res = ExpPolynomial::new();
            for sub in es {
                res.add_assign(rs, &expand_polynomial(rs, sub));
            }
            res
        }
        ExpNode::Prod(es) => pairwise(es, &|a, b| rs.mul(a, b)),
        ExpNode::Conjunction(es) => pairwise(es, &|a, b| rs.conjunction(a, b)),
        ExpNode::Shuffle(es) => pairwise(es, &|a, b| rs.shuffle(a, b)),
        ExpNode::LWeight(k, sub) => expand_polynomial(rs, sub).lmul_weight(rs, k),
        ExpNode::RWeight(sub, k) => expand_polynomial(rs, sub).rmul_weight(rs, k),
        _ => ExpPolynomial::monomial(rs, e.clone(), ws.one()),
    }
}
