//! Rational expressions.
//!
//! Expressions are immutable trees of [`ExpNode`]s shared through [`Exp`]
//! (an `Arc`). They are never built directly: every node goes through an
//! [`ExpressionSet`], which applies the rewriting rules of its [`Identities`]
//! level while building, so that an expression is always in normal form for
//! the set that produced it.
//!
//! [`Expression`] bundles an expression with its set and checks contexts on
//! binary operations.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::labelset::{Label, LabelSet};
use crate::parser::Syntax;
use crate::weightset::{Semiring, Weight, WeightSet};

/// A shared expression node.
pub type Exp = Arc<ExpNode>;

/// One node of a rational expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpNode {
    Zero,
    One,
    Atom(Label),
    Sum(Vec<Exp>),
    Prod(Vec<Exp>),
    Conjunction(Vec<Exp>),
    Shuffle(Vec<Exp>),
    Star(Exp),
    Transposition(Exp),
    LWeight(Weight, Exp),
    RWeight(Exp, Weight),
    Complement(Exp),
    /// One expression per tape.
    Tuple(Vec<Exp>),
}

impl ExpNode {
    fn rank(&self) -> u8 {
        match self {
            ExpNode::Zero => 0,
            ExpNode::One => 1,
            ExpNode::Atom(_) => 2,
            ExpNode::Sum(_) => 3,
            ExpNode::Prod(_) => 4,
            ExpNode::Conjunction(_) => 5,
            ExpNode::Shuffle(_) => 6,
            ExpNode::Star(_) => 7,
            ExpNode::Transposition(_) => 8,
            ExpNode::LWeight(..) => 9,
            ExpNode::RWeight(..) => 10,
            ExpNode::Complement(_) => 11,
            ExpNode::Tuple(_) => 12,
        }
    }

    /// Name of the node kind, as used by info reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExpNode::Zero => "zero",
            ExpNode::One => "one",
            ExpNode::Atom(_) => "atom",
            ExpNode::Sum(_) => "sum",
            ExpNode::Prod(_) => "prod",
            ExpNode::Conjunction(_) => "conjunction",
            ExpNode::Shuffle(_) => "shuffle",
            ExpNode::Star(_) => "star",
            ExpNode::Transposition(_) => "transposition",
            ExpNode::LWeight(..) => "lweight",
            ExpNode::RWeight(..) => "rweight",
            ExpNode::Complement(_) => "complement",
            ExpNode::Tuple(_) => "tuple",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ExpNode::Zero | ExpNode::One | ExpNode::Atom(_))
    }

    /// Direct sub-expressions, in order.
    pub fn children(&self) -> Vec<&Exp> {
        match self {
            ExpNode::Zero | ExpNode::One | ExpNode::Atom(_) => Vec::new(),
            ExpNode::Sum(es) | ExpNode::Prod(es) | ExpNode::Conjunction(es) | ExpNode::Shuffle(es) | ExpNode::Tuple(es) => {
                es.iter().collect()
            }
            ExpNode::Star(e)
            | ExpNode::Transposition(e)
            | ExpNode::Complement(e)
            | ExpNode::LWeight(_, e)
            | ExpNode::RWeight(e, _) => vec![e],
        }
    }

    /// Number of nodes of the tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }
}

impl Ord for ExpNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size()
            .cmp(&other.size())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (ExpNode::Atom(a), ExpNode::Atom(b)) => a.cmp(b),
                (ExpNode::LWeight(v, e), ExpNode::LWeight(w, f)) => e.cmp(f).then_with(|| v.cmp(w)),
                (ExpNode::RWeight(e, v), ExpNode::RWeight(f, w)) => e.cmp(f).then_with(|| v.cmp(w)),
                _ => self.children().cmp(&other.children()),
            })
    }
}

impl PartialOrd for ExpNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The rewriting rules applied while building expressions, weakest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Identities {
    /// Nodes are built as written.
    None,
    /// Neutral and absorbing elements, weights of weights.
    Trivial,
    /// Trivial, plus flattening of variadic operators.
    Associative,
    /// Associative, plus sorted sums merging like terms and weights lifted
    /// out of products.
    #[default]
    Linear,
    /// Linear, plus distribution of products over sums.
    Distributive,
}

impl fmt::Display for Identities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Identities::None => "none",
            Identities::Trivial => "trivial",
            Identities::Associative => "associative",
            Identities::Linear => "linear",
            Identities::Distributive => "distributive",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Identities {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "none" => Ok(Identities::None),
            "trivial" => Ok(Identities::Trivial),
            "associative" => Ok(Identities::Associative),
            "linear" | "series" => Ok(Identities::Linear),
            "distributive" => Ok(Identities::Distributive),
            other => Err(Error::syntax(0..s.len().max(1), format!("invalid identities: {}", other))),
        }
    }
}

/// The builder of expressions over a context, at some identity level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionSet {
    ctx: Context,
    ids: Identities,
}

impl ExpressionSet {
    pub fn new(ctx: Context, ids: Identities) -> Self {
        ExpressionSet { ctx, ids }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn identities(&self) -> Identities {
        self.ids
    }

    pub fn labelset(&self) -> &LabelSet {
        self.ctx.labelset()
    }

    pub fn weightset(&self) -> &WeightSet {
        self.ctx.weightset()
    }

    /// The set of expressions of tape `i` of a multi-tape context.
    pub fn tape(&self, i: usize) -> Option<ExpressionSet> {
        match self.labelset() {
            LabelSet::Tuple(tapes) => tapes
                .get(i)
                .map(|ls| ExpressionSet::new(self.ctx.with_labelset(ls.clone()), self.ids)),
            _ => None,
        }
    }

    fn trivial(&self) -> bool {
        self.ids >= Identities::Trivial
    }

    fn associative(&self) -> bool {
        self.ids >= Identities::Associative
    }

    fn linear(&self) -> bool {
        self.ids >= Identities::Linear
    }

    fn distributive(&self) -> bool {
        self.ids >= Identities::Distributive
    }

    pub fn zero(&self) -> Exp {
        Arc::new(ExpNode::Zero)
    }

    pub fn one(&self) -> Exp {
        Arc::new(ExpNode::One)
    }

    pub fn atom(&self, label: Label) -> Exp {
        if label.is_one() {
            self.one()
        } else {
            Arc::new(ExpNode::Atom(label))
        }
    }

    pub fn is_zero(&self, e: &Exp) -> bool {
        matches!(**e, ExpNode::Zero)
    }

    pub fn is_one(&self, e: &Exp) -> bool {
        matches!(**e, ExpNode::One)
    }

    /// Append `e` to `res`, spreading it if it is a `kind` node and
    /// flattening is on.
    fn gather(&self, res: &mut Vec<Exp>, e: &Exp, kind: fn(&ExpNode) -> Option<&Vec<Exp>>) {
        match kind(e) {
            Some(es) if self.associative() => res.extend(es.iter().cloned()),
            _ => res.push(e.clone()),
        }
    }

    /// The weight and expression of `<k>E`, or `(1, E)`.
    fn split_lweight<'a>(&self, e: &'a Exp) -> (Weight, &'a Exp) {
        match &**e {
            ExpNode::LWeight(w, sub) => (w.clone(), sub),
            _ => (self.weightset().one(), e),
        }
    }

    fn unwrap_lweight<'a>(&self, e: &'a Exp) -> &'a Exp {
        match &**e {
            ExpNode::LWeight(_, sub) => sub,
            _ => e,
        }
    }

    // ─── Sum ───────────────────────────────────────────────────────────────────

    pub fn add(&self, l: &Exp, r: &Exp) -> Exp {
        if !self.trivial() {
            return Arc::new(ExpNode::Sum(vec![l.clone(), r.clone()]));
        }
        if self.is_zero(l) {
            return r.clone();
        }
        if self.is_zero(r) {
            return l.clone();
        }
        if self.linear() {
            return self.add_linear(l, r);
        }
        let mut es = Vec::new();
        self.gather(&mut es, l, as_sum);
        self.gather(&mut es, r, as_sum);
        Arc::new(ExpNode::Sum(es))
    }

    /// Insert the terms of `r` into the sorted terms of `l`, merging terms
    /// that differ only by their left weight.
    fn add_linear(&self, l: &Exp, r: &Exp) -> Exp {
        let ws = self.weightset();
        let mut terms: Vec<Exp> = match &**l {
            ExpNode::Sum(es) => es.clone(),
            _ => vec![l.clone()],
        };
        let addends: Vec<Exp> = match &**r {
            ExpNode::Sum(es) => es.clone(),
            _ => vec![r.clone()],
        };
        for t in addends {
            let (tw, tn) = self.split_lweight(&t);
            let pos = terms.binary_search_by(|x| self.unwrap_lweight(x).cmp(tn));
            match pos {
                Ok(i) => {
                    let (iw, _) = self.split_lweight(&terms[i]);
                    let w = ws.add(&iw, &tw);
                    if w.is_zero() {
                        terms.remove(i);
                    } else {
                        terms[i] = self.lweight(&w, tn);
                    }
                }
                Err(i) => terms.insert(i, t.clone()),
            }
        }
        match terms.len() {
            0 => self.zero(),
            1 => terms.remove(0),
            _ => Arc::new(ExpNode::Sum(terms)),
        }
    }

    // ─── Product ───────────────────────────────────────────────────────────────

    pub fn mul(&self, l: &Exp, r: &Exp) -> Exp {
        if !self.trivial() {
            return self.nontrivial_mul(l, r);
        }
        if self.is_zero(l) {
            return l.clone();
        }
        if self.is_zero(r) {
            return r.clone();
        }
        // E(<k>\e) = E<k>, (<k>\e)E = <k>E.
        let (rw, rn) = self.split_lweight(r);
        if self.is_one(rn) {
            return self.rweight(l, &rw);
        }
        let (lw, ln) = self.split_lweight(l);
        if self.is_one(ln) {
            return self.lweight(&lw, r);
        }
        if self.distributive() {
            if let ExpNode::Sum(es) = &**l {
                return es.iter().fold(self.zero(), |acc, e| self.add(&acc, &self.mul(e, r)));
            }
            if let ExpNode::Sum(es) = &**r {
                return es.iter().fold(self.zero(), |acc, e| self.add(&acc, &self.mul(l, e)));
            }
        }
        if self.linear() {
            if self.weightset().is_commutative() {
                let w = self.weightset().mul(&lw, &rw);
                return self.lweight(&w, &self.nontrivial_mul(ln, rn));
            }
            return self.lweight(&lw, &self.nontrivial_mul(ln, r));
        }
        self.nontrivial_mul(l, r)
    }

    /// Product node, merging adjacent atoms into words in wordsets.
    fn nontrivial_mul(&self, l: &Exp, r: &Exp) -> Exp {
        let mut ls = Vec::new();
        let mut rs = Vec::new();
        self.gather(&mut ls, l, as_prod);
        self.gather(&mut rs, r, as_prod);
        if self.labelset().is_wordset() {
            if let (Some(ExpNode::Atom(a)), Some(ExpNode::Atom(b))) =
                (ls.last().map(|e| &**e), rs.first().map(|e| &**e))
            {
                if let Ok(word) = self.labelset().mul(a, b) {
                    let merged = self.atom(word);
                    ls.pop();
                    ls.push(merged);
                    rs.remove(0);
                }
            }
        }
        ls.extend(rs);
        if ls.len() == 1 {
            ls.remove(0)
        } else {
            Arc::new(ExpNode::Prod(ls))
        }
    }

    // ─── Other operators ───────────────────────────────────────────────────────

    pub fn conjunction(&self, l: &Exp, r: &Exp) -> Exp {
        if self.trivial() {
            if self.is_zero(l) {
                return l.clone();
            }
            if self.is_zero(r) {
                return r.clone();
            }
            let (lw, ln) = self.split_lweight(l);
            let (rw, rn) = self.split_lweight(r);
            match (&**ln, &**rn) {
                (ExpNode::One, ExpNode::One) => {
                    return self.lweight(&self.weightset().mul(&lw, &rw), &self.one());
                }
                (ExpNode::Atom(a), ExpNode::Atom(b)) => {
                    return if a == b { self.rweight(l, &rw) } else { self.zero() };
                }
                (ExpNode::One, ExpNode::Atom(_)) | (ExpNode::Atom(_), ExpNode::One) => return self.zero(),
                _ => {}
            }
        }
        let mut es = Vec::new();
        self.gather(&mut es, l, as_conjunction);
        self.gather(&mut es, r, as_conjunction);
        Arc::new(ExpNode::Conjunction(es))
    }

    pub fn shuffle(&self, l: &Exp, r: &Exp) -> Exp {
        if self.trivial() {
            if self.is_zero(l) {
                return l.clone();
            }
            if self.is_zero(r) {
                return r.clone();
            }
            if self.is_one(l) {
                return r.clone();
            }
            if self.is_one(r) {
                return l.clone();
            }
        }
        let mut es = Vec::new();
        self.gather(&mut es, l, as_shuffle);
        self.gather(&mut es, r, as_shuffle);
        Arc::new(ExpNode::Shuffle(es))
    }

    pub fn star(&self, e: &Exp) -> Exp {
        if self.trivial() && self.is_zero(e) {
            return self.one();
        }
        Arc::new(ExpNode::Star(e.clone()))
    }

    /// `E{c}`, only meaningful over Boolean weights.
    pub fn complement(&self, e: &Exp) -> Result<Exp> {
        if !self.weightset().is_boolean() {
            return Err(Error::UnsupportedWeightset {
                operation: "complement",
                weightset: self.weightset().to_string(),
            });
        }
        if self.trivial() {
            if let ExpNode::LWeight(_, sub) | ExpNode::RWeight(sub, _) = &**e {
                return self.complement(sub);
            }
        }
        Ok(Arc::new(ExpNode::Complement(e.clone())))
    }

    /// `E%F`, that is `E&F{c}`.
    pub fn difference(&self, l: &Exp, r: &Exp) -> Result<Exp> {
        Ok(self.conjunction(l, &self.complement(r)?))
    }

    pub fn transposition(&self, e: &Exp) -> Exp {
        if self.trivial() {
            match &**e {
                ExpNode::Zero | ExpNode::One => return e.clone(),
                ExpNode::Atom(l) => return self.atom(self.labelset().transpose(l)),
                _ => {}
            }
        }
        Arc::new(ExpNode::Transposition(e.clone()))
    }

    /// `<w>E`.
    pub fn lweight(&self, w: &Weight, e: &Exp) -> Exp {
        if !self.trivial() {
            return Arc::new(ExpNode::LWeight(w.clone(), e.clone()));
        }
        if self.is_zero(e) || w.is_one() {
            return e.clone();
        }
        if w.is_zero() {
            return self.zero();
        }
        match &**e {
            ExpNode::LWeight(h, sub) => self.lweight(&self.weightset().mul(w, h), sub),
            ExpNode::Sum(es) if self.linear() => es
                .iter()
                .fold(self.zero(), |acc, t| self.add(&acc, &self.lweight(w, t))),
            _ => Arc::new(ExpNode::LWeight(w.clone(), e.clone())),
        }
    }

    /// `E<w>`.
    pub fn rweight(&self, e: &Exp, w: &Weight) -> Exp {
        if !self.trivial() {
            return Arc::new(ExpNode::RWeight(e.clone(), w.clone()));
        }
        if w.is_zero() {
            return self.zero();
        }
        if w.is_one() {
            return e.clone();
        }
        if e.is_leaf() {
            return self.lweight(w, e);
        }
        match &**e {
            ExpNode::LWeight(k, sub) => self.lweight(k, &self.rweight(sub, w)),
            ExpNode::RWeight(sub, k) => self.rweight(sub, &self.weightset().mul(k, w)),
            ExpNode::Sum(es) if self.linear() => es
                .iter()
                .fold(self.zero(), |acc, t| self.add(&acc, &self.rweight(t, w))),
            _ if self.linear() && self.weightset().is_commutative() => self.lweight(w, e),
            _ => Arc::new(ExpNode::RWeight(e.clone(), w.clone())),
        }
    }

    /// `E{n}`: the n-fold product, `\e` when `n = 0`.
    pub fn power_n(&self, e: &Exp, n: usize) -> Exp {
        match n {
            0 => self.one(),
            1 => e.clone(),
            _ => (1..n).fold(e.clone(), |acc, _| self.mul(&acc, e)),
        }
    }

    /// Bounded iteration `E{m,n}`, with `n = None` for `E{m,}`.
    ///
    /// `E{m,n} = E{m}(\e+E){n-m}` and `E{m,} = E{m}E*`.
    pub fn power(&self, e: &Exp, min: usize, max: Option<usize>) -> Result<Exp> {
        let base = self.power_n(e, min);
        match max {
            None => Ok(self.mul(&base, &self.star(e))),
            Some(max) if max < min => Err(Error::syntax(
                0..1,
                format!("invalid repetition bounds: {{{},{}}}", min, max),
            )),
            Some(max) if max == min => Ok(base),
            Some(max) => {
                let opt = self.add(&self.one(), e);
                Ok(self.mul(&base, &self.power_n(&opt, max - min)))
            }
        }
    }

    /// Multi-tape expression `E1|...|En`, folded into an atom when every tape
    /// is a label and the tuple is a label of the context. `\e|...|\e` is `\e`.
    pub fn tuple(&self, tapes: &[Exp]) -> Result<Exp> {
        let n = match self.labelset() {
            LabelSet::Tuple(ls) => ls.len(),
            _ => return Err(Error::incompatible("a multi-tape context", &self.ctx)),
        };
        if tapes.len() != n {
            return Err(Error::incompatible(
                format!("{} tapes", n),
                format!("{} tapes in {}", tapes.len(), self.ctx),
            ));
        }
        let labels: Option<Vec<Label>> = tapes
            .iter()
            .map(|e| match &**e {
                ExpNode::Atom(l) => Some(l.clone()),
                ExpNode::One => Some(Label::One),
                _ => None,
            })
            .collect();
        if let Some(labels) = labels {
            let label = Label::Tuple(labels);
            if label.is_one() {
                return Ok(self.one());
            }
            // Lettersets have no `\e`: `\e|x` stays a tuple node.
            if self.labelset().check(&label).is_ok() {
                return Ok(self.atom(label));
            }
        }
        if self.trivial() && tapes.iter().any(|e| self.is_zero(e)) {
            return Ok(self.zero());
        }
        Ok(Arc::new(ExpNode::Tuple(tapes.to_vec())))
    }

    /// Rebuild `e` bottom-up with this set's identities.
    pub fn normalize(&self, e: &Exp) -> Result<Exp> {
        let fold = |es: &Vec<Exp>, f: &dyn Fn(&Exp, &Exp) -> Exp| -> Result<Exp> {
            let mut it = es.iter();
            let first = match it.next() {
                Some(first) => self.normalize(first)?,
                None => return Ok(self.zero()),
            };
            it.try_fold(first, |acc, x| Ok(f(&acc, &self.normalize(x)?)))
        };
        Ok(match &**e {
            ExpNode::Zero => self.zero(),
            ExpNode::One => self.one(),
            ExpNode::Atom(l) => self.atom(l.clone()),
            ExpNode::Sum(es) => fold(es, &|a, b| self.add(a, b))?,
            ExpNode::Prod(es) => fold(es, &|a, b| self.mul(a, b))?,
            ExpNode::Conjunction(es) => fold(es, &|a, b| self.conjunction(a, b))?,
            ExpNode::Shuffle(es) => fold(es, &|a, b| self.shuffle(a, b))?,
            ExpNode::Star(sub) => self.star(&self.normalize(sub)?),
            ExpNode::Transposition(sub) => self.transposition(&self.normalize(sub)?),
            ExpNode::Complement(sub) => self.complement(&self.normalize(sub)?)?,
            ExpNode::LWeight(w, sub) => self.lweight(w, &self.normalize(sub)?),
            ExpNode::RWeight(sub, w) => self.rweight(&self.normalize(sub)?, w),
            ExpNode::Tuple(es) => {
                let tapes = es
                    .iter()
                    .enumerate()
                    .map(|(i, t)| match self.tape(i) {
                        Some(rs) => rs.normalize(t),
                        None => Err(Error::incompatible("a multi-tape context", &self.ctx)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.tuple(&tapes)?
            }
        })
    }

    /// Parse an expression in the canonical syntax.
    pub fn parse(&self, text: &str) -> Result<Exp> {
        crate::parser::parse(self, text, Syntax::Default)
    }

    /// Transpose `e`, pushing the transposition down to the leaves.
    pub fn transpose(&self, e: &Exp) -> Result<Exp> {
        let rev = |es: &Vec<Exp>, f: &dyn Fn(&Exp, &Exp) -> Exp| -> Result<Exp> {
            let mut acc: Option<Exp> = None;
            for x in es.iter().rev() {
                let t = self.transpose(x)?;
                acc = Some(match acc {
                    None => t,
                    Some(a) => f(&a, &t),
                });
            }
            Ok(acc.unwrap_or_else(|| self.zero()))
        };
        let map = |es: &Vec<Exp>, f: &dyn Fn(&Exp, &Exp) -> Exp| -> Result<Exp> {
            let ts = es.iter().map(|x| self.transpose(x)).collect::<Result<Vec<_>>>()?;
            let mut it = ts.into_iter();
            let first = it.next().unwrap_or_else(|| self.zero());
            Ok(it.fold(first, |a, b| f(&a, &b)))
        };
        Ok(match &**e {
            ExpNode::Zero | ExpNode::One => e.clone(),
            ExpNode::Atom(l) => self.atom(self.labelset().transpose(l)),
            ExpNode::Sum(es) => map(es, &|a, b| self.add(a, b))?,
            ExpNode::Prod(es) => rev(es, &|a, b| self.mul(a, b))?,
            ExpNode::Conjunction(es) => map(es, &|a, b| self.conjunction(a, b))?,
            ExpNode::Shuffle(es) => map(es, &|a, b| self.shuffle(a, b))?,
            ExpNode::Star(sub) => self.star(&self.transpose(sub)?),
            ExpNode::Complement(sub) => self.complement(&self.transpose(sub)?)?,
            ExpNode::Transposition(sub) => sub.clone(),
            ExpNode::LWeight(w, sub) => self.rweight(&self.transpose(sub)?, &self.transpose_weight(w)?),
            ExpNode::RWeight(sub, w) => self.lweight(&self.transpose_weight(w)?, &self.transpose(sub)?),
            ExpNode::Tuple(es) => {
                let tapes = es
                    .iter()
                    .enumerate()
                    .map(|(i, t)| match self.tape(i) {
                        Some(rs) => rs.transpose(t),
                        None => Err(Error::incompatible("a multi-tape context", &self.ctx)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.tuple(&tapes)?
            }
        })
    }

    fn transpose_weight(&self, w: &Weight) -> Result<Weight> {
        match (self.weightset(), w) {
            (WeightSet::Expressions(rs), Weight::Exp(e)) => Ok(Weight::Exp(rs.transpose(e)?)),
            _ => Ok(w.clone()),
        }
    }
}

fn as_sum(e: &ExpNode) -> Option<&Vec<Exp>> {
    match e {
        ExpNode::Sum(es) => Some(es),
        _ => None,
    }
}

fn as_prod(e: &ExpNode) -> Option<&Vec<Exp>> {
    match e {
        ExpNode::Prod(es) => Some(es),
        _ => None,
    }
}

fn as_conjunction(e: &ExpNode) -> Option<&Vec<Exp>> {
    match e {
        ExpNode::Conjunction(es) => Some(es),
        _ => None,
    }
}

fn as_shuffle(e: &ExpNode) -> Option<&Vec<Exp>> {
    match e {
        ExpNode::Shuffle(es) => Some(es),
        _ => None,
    }
}

/// An expression together with the set that built it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    set: ExpressionSet,
    exp: Exp,
}

impl Expression {
    pub fn new(set: ExpressionSet, exp: Exp) -> Self {
        Expression { set, exp }
    }

    /// Parse `text` in the canonical syntax, with linear identities.
    ///
    /// # Examples
    ///
    /// ```
    /// use wfa_rs::context::Context;
    /// use wfa_rs::expression::Expression;
    ///
    /// let ctx = Context::parse("lal_char(abc), z").unwrap();
    /// let e = Expression::parse(&ctx, "a+b+a").unwrap();
    /// assert_eq!(e.to_string(), "<2>a+b");
    /// ```
    pub fn parse(ctx: &Context, text: &str) -> Result<Expression> {
        Expression::parse_with(ctx, text, Identities::default(), Syntax::Default)
    }

    pub fn parse_with(ctx: &Context, text: &str, ids: Identities, syntax: Syntax) -> Result<Expression> {
        let set = ExpressionSet::new(ctx.clone(), ids);
        let exp = crate::parser::parse(&set, text, syntax)?;
        Ok(Expression { set, exp })
    }

    pub fn set(&self) -> &ExpressionSet {
        &self.set
    }

    pub fn exp(&self) -> &Exp {
        &self.exp
    }

    pub fn context(&self) -> &Context {
        self.set.context()
    }

    pub fn identities(&self) -> Identities {
        self.set.identities()
    }

    fn with(&self, exp: Exp) -> Expression {
        Expression {
            set: self.set.clone(),
            exp,
        }
    }

    fn check(&self, other: &Expression) -> Result<()> {
        self.context().require_same(other.context())
    }

    pub fn add(&self, other: &Expression) -> Result<Expression> {
        self.check(other)?;
        Ok(self.with(self.set.add(&self.exp, &other.exp)))
    }

    pub fn mul(&self, other: &Expression) -> Result<Expression> {
        self.check(other)?;
        Ok(self.with(self.set.mul(&self.exp, &other.exp)))
    }

    pub fn conjunction(&self, other: &Expression) -> Result<Expression> {
        self.check(other)?;
        Ok(self.with(self.set.conjunction(&self.exp, &other.exp)))
    }

    pub fn shuffle(&self, other: &Expression) -> Result<Expression> {
        self.check(other)?;
        Ok(self.with(self.set.shuffle(&self.exp, &other.exp)))
    }

    pub fn difference(&self, other: &Expression) -> Result<Expression> {
        self.check(other)?;
        Ok(self.with(self.set.difference(&self.exp, &other.exp)?))
    }

    pub fn complement(&self) -> Result<Expression> {
        Ok(self.with(self.set.complement(&self.exp)?))
    }

    /// `E{T}`, kept as a transposition node.
    pub fn transposition(&self) -> Expression {
        self.with(self.set.transposition(&self.exp))
    }

    /// The mirror expression, with the transposition applied.
    pub fn transpose(&self) -> Result<Expression> {
        Ok(self.with(self.set.transpose(&self.exp)?))
    }

    pub fn star(&self) -> Expression {
        self.with(self.set.star(&self.exp))
    }

    pub fn lweight(&self, w: &Weight) -> Result<Expression> {
        self.check_weight(w)?;
        Ok(self.with(self.set.lweight(w, &self.exp)))
    }

    pub fn rweight(&self, w: &Weight) -> Result<Expression> {
        self.check_weight(w)?;
        Ok(self.with(self.set.rweight(&self.exp, w)))
    }

    fn check_weight(&self, w: &Weight) -> Result<()> {
        if self.set.weightset().contains(w) {
            Ok(())
        } else {
            Err(Error::incompatible(self.set.weightset(), format!("weight {}", w)))
        }
    }

    /// `E{min,max}`, `max = None` meaning unbounded.
    pub fn power(&self, min: usize, max: Option<usize>) -> Result<Expression> {
        Ok(self.with(self.set.power(&self.exp, min, max)?))
    }

    /// Multi-tape expression over the context `ctx`, one operand per tape.
    pub fn tuple(ctx: &Context, tapes: &[Expression]) -> Result<Expression> {
        let ids = tapes.first().map(Expression::identities).unwrap_or_default();
        let set = ExpressionSet::new(ctx.clone(), ids);
        for (i, t) in tapes.iter().enumerate() {
            if let Some(rs) = set.tape(i) {
                rs.context().require_same(t.context())?;
            }
        }
        let exps: Vec<Exp> = tapes.iter().map(|t| t.exp.clone()).collect();
        let exp = set.tuple(&exps)?;
        Ok(Expression { set, exp })
    }

    /// Rebuild with another identity level.
    pub fn normalize(&self, ids: Identities) -> Result<Expression> {
        let set = ExpressionSet::new(self.context().clone(), ids);
        let exp = set.normalize(&self.exp)?;
        Ok(Expression { set, exp })
    }

    pub fn format(&self, format: crate::printer::Format) -> String {
        crate::printer::format_exp(&self.exp, format)
    }

    pub fn size(&self) -> usize {
        self.exp.size()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(crate::printer::Format::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(s: &str) -> Context {
        Context::parse(s).unwrap()
    }

    fn exp(c: &str, ids: Identities, text: &str) -> String {
        Expression::parse_with(&ctx(c), text, ids, Syntax::Default).unwrap().to_string()
    }

    #[test]
    fn test_identities_parse() {
        assert_eq!("series".parse::<Identities>().unwrap(), Identities::Linear);
        assert_eq!("none".parse::<Identities>().unwrap(), Identities::None);
        assert!("foo".parse::<Identities>().is_err());
        assert!(Identities::Trivial < Identities::Distributive);
    }

    #[test]
    fn test_trivial_identities() {
        let c = "lal_char(abc), z";
        let t = Identities::Trivial;
        assert_eq!(exp(c, t, "\\z+a"), "a");
        assert_eq!(exp(c, t, "a\\z"), "\\z");
        assert_eq!(exp(c, t, "\\ea"), "a");
        assert_eq!(exp(c, t, "<0>a"), "\\z");
        assert_eq!(exp(c, t, "<2><3>a"), "<6>a");
        assert_eq!(exp(c, t, "a<2>"), "<2>a");
        assert_eq!(exp(c, t, "\\z*"), "\\e");
        assert_eq!(exp(c, t, "a&b"), "\\z");
        assert_eq!(exp(c, t, "<2>a&<3>a"), "<6>a");
    }

    #[test]
    fn test_none_keeps_structure() {
        let c = "lal_char(abc), b";
        assert_eq!(exp(c, Identities::None, "\\z+a"), "\\z+a");
        assert_eq!(exp(c, Identities::None, "a+b+c"), "(a+b)+c");
    }

    #[test]
    fn test_associative() {
        let c = "lal_char(abc), b";
        assert_eq!(exp(c, Identities::Associative, "(a+b)+c"), "a+b+c");
        assert_eq!(exp(c, Identities::Associative, "c+a"), "c+a");
        assert_eq!(exp(c, Identities::Associative, "(ab)c"), "abc");
    }

    #[test]
    fn test_linear() {
        let c = "lal_char(abc), z";
        let l = Identities::Linear;
        assert_eq!(exp(c, l, "c+a"), "a+c");
        assert_eq!(exp(c, l, "a+b+a"), "<2>a+b");
        assert_eq!(exp(c, l, "a+<-1>a"), "\\z");
        assert_eq!(exp(c, l, "<2>(a+b)"), "<2>a+<2>b");
        assert_eq!(exp(c, l, "(<5>a)b"), "<5>(ab)");
        assert_eq!(exp(c, l, "(a+a)*"), "(<2>a)*");
        assert_eq!(exp(c, l, "<3>(b+a+b+a)<5>"), "<30>a+<30>b");
    }

    #[test]
    fn test_distributive() {
        let c = "lal_char(abcd), z";
        assert_eq!(exp(c, Identities::Distributive, "a+b(c+<2>d)"), "a+bc+<2>(bd)");
        assert_eq!(exp(c, Identities::Linear, "a+b(c+<2>d)"), "a+b(c+<2>d)");
    }

    #[test]
    fn test_wordset_merges_atoms() {
        let c = "law_char(abc), b";
        assert_eq!(exp(c, Identities::None, "abc"), "abc");
        let e = Expression::parse(&ctx(c), "ab").unwrap();
        assert!(matches!(&**e.exp(), ExpNode::Atom(Label::Word(w)) if w == "ab"));
    }

    #[test]
    fn test_power() {
        let c = "lal_char(abc), b";
        let l = Identities::Linear;
        assert_eq!(exp(c, l, "a{3}"), "aaa");
        assert_eq!(exp(c, l, "a{0}"), "\\e");
        assert_eq!(exp(c, l, "a{2,}"), "aaa*");
        assert_eq!(exp(c, l, "a{1,2}"), "a(\\e+a)");
        assert!(Expression::parse(&ctx(c), "a{3,2}").is_err());
    }

    #[test]
    fn test_complement_requires_boolean() {
        let e = Expression::parse(&ctx("lal_char(ab), z"), "a").unwrap();
        assert!(matches!(e.complement(), Err(Error::UnsupportedWeightset { .. })));
        let e = Expression::parse(&ctx("lal_char(ab), b"), "a").unwrap();
        assert_eq!(e.complement().unwrap().to_string(), "a{c}");
    }

    #[test]
    fn test_tuple_folds_atoms() {
        let c = ctx("lat<lan_char(ab), lal_char(xy)>, b");
        let e = Expression::parse(&c, "a|x").unwrap();
        assert!(matches!(&**e.exp(), ExpNode::Atom(Label::Tuple(_))));
        let e = Expression::parse(&c, "\\e|x").unwrap();
        assert!(matches!(&**e.exp(), ExpNode::Atom(Label::Tuple(_))));
        let c = ctx("lat<lal_char(ab), lal_char(xy)>, b");
        let rs = ExpressionSet::new(c.clone(), Identities::Linear);
        assert_eq!(rs.tuple(&[rs.one(), rs.one()]).unwrap(), rs.one());
        let e = Expression::parse(&c, "\\e|x").unwrap();
        assert!(matches!(&**e.exp(), ExpNode::Tuple(_)));
        assert_eq!(e.to_string(), "\\e|x");
        let e = Expression::parse(&c, "(a+b)|x").unwrap();
        assert!(matches!(&**e.exp(), ExpNode::Tuple(_)));
    }

    #[test]
    fn test_mismatched_contexts() {
        let a = Expression::parse(&ctx("lal_char(ab), b"), "a").unwrap();
        let b = Expression::parse(&ctx("lal_char(ab), z"), "a").unwrap();
        assert!(matches!(a.add(&b), Err(Error::IncompatibleContext { .. })));
    }

    #[test]
    fn test_normalize_idempotent() {
        let c = ctx("lal_char(abc), q");
        let e = Expression::parse(&c, "<1/2>(a+b)*c+c").unwrap();
        let once = e.normalize(Identities::Trivial).unwrap();
        let twice = once.normalize(Identities::Trivial).unwrap();
        assert_eq!(once, twice);
        assert_eq!(e.normalize(Identities::Linear).unwrap(), e);
    }

    #[test]
    fn test_transpose() {
        let c = ctx("law_char(abc), z");
        let e = Expression::parse(&c, "<2>(ab)c*").unwrap();
        assert_eq!(e.transpose().unwrap().to_string(), "<2>(c*ba)");
    }

    #[test]
    fn test_order_by_size() {
        let c = ctx("lal_char(abc), b");
        let a = Expression::parse(&c, "b").unwrap();
        let b = Expression::parse(&c, "ab").unwrap();
        assert!(a.exp() < b.exp());
    }
}
