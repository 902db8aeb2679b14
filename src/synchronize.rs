//! Synchronization of multi-tape automata.
//!
//! A transition is synchronous when all its tapes read words of the same
//! length. `synchronize` delays the longer tapes in a buffer so that every
//! transition becomes synchronous, except the last one of each accepted
//! path, which flushes what remains.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::automaton::{Automaton, StateId};
use crate::error::{Error, Result};
use crate::labelset::{Label, LabelSet};
use crate::scc::sccs;
use crate::weightset::Semiring;

/// Pending letters, one word per tape.
type Buffer = Vec<Vec<char>>;

fn tape_letters(label: &Label, tapes: usize) -> Vec<Vec<char>> {
    match label {
        Label::Tuple(ls) => ls.iter().map(Label::letters).collect(),
        _ => vec![Vec::new(); tapes],
    }
}

/// Length of each tape, relative to the first one.
fn delay_of(label: &Label, tapes: usize) -> Vec<i64> {
    let lens: Vec<i64> = tape_letters(label, tapes).iter().map(|w| w.len() as i64).collect();
    lens.iter().map(|l| l - lens[0]).collect()
}

fn tuple_label(tapes: &[LabelSet], words: &[Vec<char>]) -> Result<Label> {
    Ok(Label::Tuple(
        tapes
            .iter()
            .zip(words)
            .map(|(t, w)| t.word(w))
            .collect::<Result<_>>()?,
    ))
}

impl Automaton {
    fn require_tuple(&self, operation: &'static str) -> Result<Vec<LabelSet>> {
        match self.labelset() {
            LabelSet::Tuple(tapes) => Ok(tapes.clone()),
            ls => Err(Error::precondition(operation, format!("a multi-tape labelset, not {}", ls))),
        }
    }

    /// Fail unless every cycle reads as many letters on each tape.
    fn check_bounded_delay(&self, tapes: usize) -> Result<()> {
        for component in sccs(self) {
            let mut delays: HashMap<StateId, Vec<i64>> = HashMap::new();
            let mut queue = VecDeque::new();
            delays.insert(component[0], vec![0; tapes]);
            queue.push_back(component[0]);
            while let Some(s) = queue.pop_front() {
                let here = delays[&s].clone();
                for t in self.out(s) {
                    let d = self.dst_of(t);
                    if !component.contains(&d) {
                        continue;
                    }
                    let step = delay_of(self.label_of(t), tapes);
                    let there: Vec<i64> = here.iter().zip(&step).map(|(a, b)| a + b).collect();
                    match delays.get(&d) {
                        Some(known) if *known != there => {
                            return Err(Error::precondition(
                                "synchronize",
                                format!("a bounded delay, but a cycle through state {} has a non-zero delay", d),
                            ));
                        }
                        Some(_) => {}
                        None => {
                            delays.insert(d, there);
                            queue.push_back(d);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// An equivalent automaton whose transitions are synchronous, except
    /// the ones leading to a flushing final state.
    ///
    /// The result is labelled by words on every tape. Fails with
    /// [`Error::PreconditionViolation`] on single-tape automata, or when
    /// the delay between tapes is unbounded.
    pub fn synchronize(&self) -> Result<Automaton> {
        let tapes: Vec<LabelSet> = self.require_tuple("synchronize")?.iter().map(LabelSet::words).collect();
        let num_tapes = tapes.len();
        self.check_bounded_delay(num_tapes)?;
        let ctx = self.context().with_labelset(LabelSet::Tuple(tapes.clone()));
        let ws = self.weightset().clone();
        let mut res = Automaton::new(ctx);
        let mut map: HashMap<(StateId, Buffer), StateId> = HashMap::new();
        let mut todo: VecDeque<(StateId, Buffer, StateId)> = VecDeque::new();
        let mut state = |res: &mut Automaton, todo: &mut VecDeque<(StateId, Buffer, StateId)>, q: StateId, buffer: Buffer| {
            *map.entry((q, buffer.clone())).or_insert_with(|| {
                let s = res.new_state();
                todo.push_back((q, buffer, s));
                s
            })
        };

        for &t in self.initial_transitions() {
            let s = state(&mut res, &mut todo, self.dst_of(t), vec![Vec::new(); num_tapes]);
            res.add_initial(s, self.weight_of(t).clone());
        }
        while let Some((q, buffer, s)) = todo.pop_front() {
            for t in self.out(q) {
                let mut pending = buffer.clone();
                for (acc, w) in pending.iter_mut().zip(tape_letters(self.label_of(t), num_tapes)) {
                    acc.extend(w);
                }
                let n = pending.iter().map(Vec::len).min().unwrap_or(0);
                let emitted: Vec<Vec<char>> = pending.iter().map(|w| w[..n].to_vec()).collect();
                let rest: Buffer = pending.iter().map(|w| w[n..].to_vec()).collect();
                let label = tuple_label(&tapes, &emitted)?;
                let d = state(&mut res, &mut todo, self.dst_of(t), rest);
                res.add_transition(s, d, label, self.weight_of(t).clone());
            }
            if self.is_final(q) {
                let w = self.final_weight(q);
                if buffer.iter().all(Vec::is_empty) {
                    res.set_final(s, w);
                } else {
                    let f = res.new_state();
                    res.add_transition(s, f, tuple_label(&tapes, &buffer)?, w);
                    res.set_final(f, ws.one());
                }
            }
        }
        debug!(
            "synchronize: {} states, {} transitions",
            res.num_states(),
            res.num_transitions()
        );
        Ok(res)
    }

    /// Whether every transition is synchronous, or leads to a state that
    /// can only end the path.
    pub fn is_synchronized(&self) -> Result<bool> {
        let num_tapes = self.require_tuple("is_synchronized")?.len();
        Ok(self.transitions().all(|t| {
            let lens: Vec<usize> = tape_letters(self.label_of(t), num_tapes).iter().map(Vec::len).collect();
            lens.iter().all(|&l| l == lens[0])
                || self.all_out(self.dst_of(t)).iter().all(|&u| self.dst_of(u) == StateId::POST)
        }))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::context::Context;

    fn word(w: &str) -> Label {
        if w.is_empty() {
            Label::One
        } else {
            Label::Word(w.to_string())
        }
    }

    fn pair(l: &str, r: &str) -> Label {
        Label::Tuple(vec![word(l), word(r)])
    }

    #[test]
    fn test_synchronize() {
        let ctx = Context::parse("lat<law_char(ab), law_char(xy)>, b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        let r = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, q, pair("ab", "x"), one.clone());
        aut.add_transition(q, r, pair("a", "y"), one.clone());
        aut.set_final(r, one);
        assert!(!aut.is_synchronized().unwrap());

        let res = aut.synchronize().unwrap();
        assert_eq!(res.num_states(), 4);
        assert_eq!(res.num_transitions(), 3);
        assert!(res.is_synchronized().unwrap());
        let labels: Vec<String> = res.transitions().map(|t| res.label_of(t).to_string()).collect();
        assert!(labels.contains(&"a|x".to_string()));
        assert!(labels.contains(&"b|y".to_string()));
        assert!(labels.contains(&"a|\\e".to_string()));
    }

    #[test]
    fn test_already_synchronous() {
        let ctx = Context::parse("lat<law_char(ab), law_char(xy)>, b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, p, pair("ab", "xy"), one.clone());
        aut.set_final(p, one);
        let res = aut.synchronize().unwrap();
        assert_eq!(res.num_states(), 1);
        assert!(res.is_isomorphic(&aut));
    }

    #[test]
    fn test_unbounded_delay() {
        let ctx = Context::parse("lat<law_char(a), law_char(x)>, b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, p, pair("a", ""), one.clone());
        aut.set_final(p, one);
        assert!(matches!(aut.synchronize(), Err(Error::PreconditionViolation { .. })));
    }

    #[test]
    fn test_single_tape() {
        let ctx = Context::parse("law_char(ab), b").unwrap();
        let aut = Automaton::new(ctx);
        assert!(matches!(aut.synchronize(), Err(Error::PreconditionViolation { .. })));
        assert!(aut.is_synchronized().is_err());
    }
}
