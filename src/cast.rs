//! Conversions between contexts.
//!
//! Labels cast along letters → nullable → words, with the target alphabet
//! containing the source letters. Weights cast along `B → Z → Q → R`, and
//! into expression weightsets as `<w>\e`.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::automaton::Automaton;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::expression::{Exp, ExpNode, Expression, ExpressionSet, Identities};
use crate::labelset::{Label, LabelSet};
use crate::weightset::{Rational, Weight, WeightSet};

/// Whether labels of `from` have a counterpart in `to`, alphabets aside.
fn label_kinds_embed(from: &LabelSet, to: &LabelSet) -> bool {
    match (from, to) {
        (LabelSet::Letters(_), LabelSet::Letters(_) | LabelSet::Nullable(_) | LabelSet::Words(_))
        | (LabelSet::Nullable(_), LabelSet::Nullable(_) | LabelSet::Words(_))
        | (LabelSet::Words(_), LabelSet::Words(_)) => true,
        (LabelSet::Tuple(ls), LabelSet::Tuple(rs)) => {
            ls.len() == rs.len() && ls.iter().zip(rs).all(|(l, r)| label_kinds_embed(l, r))
        }
        _ => false,
    }
}

/// Cast `label` of `from` into `to`.
pub fn cast_label(from: &LabelSet, to: &LabelSet, label: &Label) -> Result<Label> {
    if !label_kinds_embed(from, to) {
        return Err(Error::incompatible(to, from));
    }
    to.convert(from, label)
}

/// Cast `w` of `from` into `to`.
pub fn cast_weight(from: &WeightSet, to: &WeightSet, w: &Weight) -> Result<Weight> {
    if from == to {
        return Ok(w.clone());
    }
    let res = match (to, w) {
        (WeightSet::Expressions(to_rs), Weight::Exp(e)) => match from {
            WeightSet::Expressions(from_rs) => Weight::Exp(cast_exp(from_rs, to_rs, e)?),
            _ => return Err(Error::incompatible(to, from)),
        },
        (WeightSet::Expressions(rs), _) => {
            let inner = cast_weight(from, rs.weightset(), w)?;
            Weight::Exp(rs.lweight(&inner, &rs.one()))
        }
        (WeightSet::Z, Weight::Bool(b)) => Weight::Int(BigInt::from(*b as i64)),
        (WeightSet::Q, Weight::Bool(b)) => Weight::Rat(Rational::from_integer(BigInt::from(*b as i64))),
        (WeightSet::R, Weight::Bool(b)) => Weight::Real(if *b { 1.0 } else { 0.0 }),
        (WeightSet::Q, Weight::Int(i)) => Weight::Rat(Rational::from_integer(i.clone())),
        (WeightSet::R, Weight::Int(i)) => Weight::Real(i.to_f64().unwrap_or(f64::NAN)),
        (WeightSet::R, Weight::Rat(q)) => Weight::Real(q.to_f64().unwrap_or(f64::NAN)),
        _ => return Err(Error::incompatible(to, from)),
    };
    Ok(res)
}

/// Rebuild `e` of `from` with the set `to`.
pub fn cast_exp(from: &ExpressionSet, to: &ExpressionSet, e: &Exp) -> Result<Exp> {
    let fold = |es: &Vec<Exp>, f: &dyn Fn(&Exp, &Exp) -> Exp| -> Result<Exp> {
        let mut it = es.iter();
        let first = match it.next() {
            Some(first) => cast_exp(from, to, first)?,
            None => return Ok(to.zero()),
        };
        it.try_fold(first, |acc, x| Ok(f(&acc, &cast_exp(from, to, x)?)))
    };
    let weight = |w: &Weight| cast_weight(from.weightset(), to.weightset(), w);
    Ok(match &**e {
        ExpNode::Zero => to.zero(),
        ExpNode::One => to.one(),
        ExpNode::Atom(l) => to.atom(cast_label(from.labelset(), to.labelset(), l)?),
        ExpNode::Sum(es) => fold(es, &|a, b| to.add(a, b))?,
        ExpNode::Prod(es) => fold(es, &|a, b| to.mul(a, b))?,
        ExpNode::Conjunction(es) => fold(es, &|a, b| to.conjunction(a, b))?,
        ExpNode::Shuffle(es) => fold(es, &|a, b| to.shuffle(a, b))?,
        ExpNode::Star(sub) => to.star(&cast_exp(from, to, sub)?),
        ExpNode::Transposition(sub) => to.transposition(&cast_exp(from, to, sub)?),
        ExpNode::Complement(sub) => to.complement(&cast_exp(from, to, sub)?)?,
        ExpNode::LWeight(w, sub) => to.lweight(&weight(w)?, &cast_exp(from, to, sub)?),
        ExpNode::RWeight(sub, w) => to.rweight(&cast_exp(from, to, sub)?, &weight(w)?),
        ExpNode::Tuple(es) => {
            let tapes = es
                .iter()
                .enumerate()
                .map(|(i, t)| match (from.tape(i), to.tape(i)) {
                    (Some(f), Some(g)) => cast_exp(&f, &g, t),
                    _ => Err(Error::incompatible(to.context(), from.context())),
                })
                .collect::<Result<Vec<_>>>()?;
            to.tuple(&tapes)?
        }
    })
}

impl Expression {
    /// This expression over `ctx`, rebuilt with the identities `ids`.
    pub fn cast(&self, ctx: &Context, ids: Identities) -> Result<Expression> {
        let to = ExpressionSet::new(ctx.clone(), ids);
        let exp = cast_exp(self.set(), &to, self.exp())?;
        Ok(Expression::new(to, exp))
    }
}

impl Automaton {
    /// A copy of this automaton over `ctx`.
    pub fn cast(&self, ctx: &Context) -> Result<Automaton> {
        let (from_ls, from_ws) = (self.labelset().clone(), self.weightset().clone());
        let (to_ls, to_ws) = (ctx.labelset().clone(), ctx.weightset().clone());
        let convert = |l: &Label, w: &Weight| -> Result<(Label, Weight)> {
            Ok((cast_label(&from_ls, &to_ls, l)?, cast_weight(&from_ws, &to_ws, w)?))
        };
        let (res, _) = self.copy_into(ctx.clone(), |_| true, convert)?;
        Ok(res)
    }

    /// Keep only tape `tape` of a multi-tape automaton.
    ///
    /// Transitions whose labels agree on that tape are merged, their weights
    /// summed.
    pub fn blind(&self, tape: usize) -> Result<Automaton> {
        let ls = match self.labelset() {
            LabelSet::Tuple(tapes) => tapes.get(tape).cloned().ok_or_else(|| {
                Error::precondition("blind", format!("tape {} out of range for {}", tape, self.labelset()))
            })?,
            other => return Err(Error::precondition("blind", format!("{} is not a tuple labelset", other))),
        };
        let ctx = Context::new(ls, self.weightset().clone());
        let project = |l: &Label, w: &Weight| -> Result<(Label, Weight)> {
            let label = match l {
                Label::Special => Label::Special,
                Label::Tuple(tapes) => tapes
                    .get(tape)
                    .cloned()
                    .ok_or_else(|| Error::bad_label(l.to_string(), "missing tape"))?,
                _ => return Err(Error::bad_label(l.to_string(), "not a tuple")),
            };
            Ok((label, w.clone()))
        };
        let (res, _) = self.copy_into(ctx, |_| true, project)?;
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weightset::Semiring;

    fn ctx(s: &str) -> Context {
        Context::parse(s).unwrap()
    }

    #[test]
    fn test_weight_chain() {
        let w = WeightSet::B.one();
        let z = cast_weight(&WeightSet::B, &WeightSet::Z, &w).unwrap();
        assert_eq!(z.to_string(), "1");
        let q = cast_weight(&WeightSet::Z, &WeightSet::Q, &WeightSet::Z.from_int(3)).unwrap();
        assert_eq!(q.to_string(), "3");
        let r = cast_weight(&WeightSet::Q, &WeightSet::R, &ctx("lal_char(a), q").parse_weight("1/2").unwrap()).unwrap();
        assert_eq!(r.to_string(), "0.5");
        let r = cast_weight(&WeightSet::B, &WeightSet::R, &w).unwrap();
        assert!(r.is_one());
        assert!(matches!(
            cast_weight(&WeightSet::Q, &WeightSet::Z, &q),
            Err(Error::IncompatibleContext { .. })
        ));
        assert!(cast_weight(&WeightSet::Z, &WeightSet::Zmin, &z).is_err());
    }

    #[test]
    fn test_weight_into_expressions() {
        let c = ctx("lal_char(a), expressionset<lal_char(xy), z>");
        let one = cast_weight(&WeightSet::Z, c.weightset(), &WeightSet::Z.from_int(1)).unwrap();
        assert!(one.is_one());
        let also_one = cast_weight(&WeightSet::B, c.weightset(), &WeightSet::B.one()).unwrap();
        assert!(also_one.is_one());
        let three = cast_weight(&WeightSet::Z, c.weightset(), &WeightSet::Z.from_int(3)).unwrap();
        assert!(matches!(&three, Weight::Exp(e) if matches!(**e, ExpNode::LWeight(..))));
    }

    #[test]
    fn test_labels() {
        let lal = ctx("lal_char(ab), b");
        let law = ctx("law_char(abc), b");
        let l = cast_label(lal.labelset(), law.labelset(), &Label::Letter('a')).unwrap();
        assert_eq!(l, Label::Word("a".to_string()));
        assert!(matches!(
            cast_label(law.labelset(), lal.labelset(), &Label::Word("a".to_string())),
            Err(Error::IncompatibleContext { .. })
        ));
        let small = ctx("lal_char(a), b");
        assert!(matches!(
            cast_label(lal.labelset(), small.labelset(), &Label::Letter('b')),
            Err(Error::BadLabel { .. })
        ));
    }

    #[test]
    fn test_expression_cast() {
        let e = Expression::parse(&ctx("lal_char(ab), z"), "a+<2>b").unwrap();
        let target = ctx("law_char(abc), q");
        let res = e.cast(&target, Identities::Linear).unwrap();
        assert_eq!(res.context(), &target);
        assert_eq!(res.to_string(), "a+<2>b");
        let narrow = ctx("lal_char(a), z");
        assert!(matches!(e.cast(&narrow, Identities::Linear), Err(Error::BadLabel { .. })));
    }

    #[test]
    fn test_automaton_cast() {
        let aut = Expression::parse(&ctx("lal_char(ab), b"), "(a+b)*")
            .unwrap()
            .derived_term()
            .unwrap()
            .strip();
        let target = ctx("lan_char(abc), z");
        let res = aut.cast(&target).unwrap();
        assert_eq!(res.context(), &target);
        assert_eq!(res.eval("ab").unwrap().to_string(), "1");
        assert_eq!(res.num_states(), aut.num_states());
        assert!(aut.cast(&ctx("lal_char(ab), zmin")).is_err());
    }

    #[test]
    fn test_blind() {
        let c = ctx("lat<lal_char(abc), lal_char(efg), lal_char(xyz)>, b");
        let aut = Expression::parse(&c, "(a|e|x):(b|f|y):(c|g|z)")
            .unwrap()
            .derived_term()
            .unwrap()
            .strip();
        let first = aut.blind(0).unwrap();
        assert_eq!(first.context(), &ctx("lal_char(abc), b"));
        assert_eq!(first.num_states(), aut.num_states());
        for w in ["abc", "acb", "bac", "bca", "cab", "cba"] {
            assert_eq!(first.eval(w).unwrap().to_string(), "1", "{}", w);
        }
        assert_eq!(first.eval("aab").unwrap().to_string(), "0");
        let last = aut.blind(2).unwrap();
        assert_eq!(last.eval("zyx").unwrap().to_string(), "1");
        assert_eq!(last.eval("xyx").unwrap().to_string(), "0");

        assert!(matches!(aut.blind(3), Err(Error::PreconditionViolation { .. })));
        assert!(matches!(first.blind(0), Err(Error::PreconditionViolation { .. })));
    }

    #[test]
    fn test_blind_sums_weights() {
        let aut = Automaton::from_dot(
            r#"digraph
{
  vcsn_context = "lat<lan_char(ab), lan_char(xy)>, z"
  I -> 0
  0 -> 1 [label = "<2>a|x, <3>a|y"]
  1 -> 2 [label = "\\e|x"]
  2 -> F
}"#,
        )
        .unwrap();
        let first = aut.blind(0).unwrap();
        assert_eq!(first.num_transitions(), 2);
        assert!(!first.is_proper());
        let t = first.transitions().find(|&t| *first.label_of(t) == Label::Letter('a')).unwrap();
        assert_eq!(first.weight_of(t).to_string(), "5");

        let second = aut.blind(1).unwrap();
        assert_eq!(second.num_transitions(), 3);
        assert_eq!(second.eval("yx").unwrap().to_string(), "3");
        assert_eq!(second.eval("xx").unwrap().to_string(), "2");
    }
}
