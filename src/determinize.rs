//! Determinization, completion and complement of Boolean automata.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::automaton::{Automaton, StateId};
use crate::error::{Error, Result};
use crate::labelset::{Label, LabelSet};
use crate::weightset::Semiring;

impl Automaton {
    fn require_boolean(&self, operation: &'static str) -> Result<()> {
        if self.weightset().is_boolean() {
            Ok(())
        } else {
            Err(Error::UnsupportedWeightset {
                operation,
                weightset: self.weightset().to_string(),
            })
        }
    }

    /// The accessible part of the subset automaton.
    ///
    /// Each state of the result stands for the set of states reachable by
    /// some word; it is final when one of them is.
    pub fn determinize(&self) -> Result<Automaton> {
        self.require_free("determinize")?;
        self.require_boolean("determinize")?;
        let one = self.weightset().one();
        let mut res = Automaton::new(self.context().clone());
        let mut map: HashMap<BTreeSet<StateId>, StateId> = HashMap::new();
        let mut worklist: Vec<BTreeSet<StateId>> = Vec::new();

        let start: BTreeSet<StateId> = self.initial_states().into_iter().collect();
        if start.is_empty() {
            return Ok(res);
        }
        let s0 = res.new_state();
        res.set_initial(s0, one.clone());
        map.insert(start.clone(), s0);
        worklist.push(start);

        while let Some(current) = worklist.pop() {
            let src = map[&current];
            if current.iter().any(|&s| self.is_final(s)) {
                res.set_final(src, one.clone());
            }
            let mut targets: BTreeMap<Label, BTreeSet<StateId>> = BTreeMap::new();
            for &s in &current {
                for t in self.out(s) {
                    targets.entry(self.label_of(t).clone()).or_default().insert(self.dst_of(t));
                }
            }
            for (label, target) in targets {
                let dst = match map.get(&target) {
                    Some(&d) => d,
                    None => {
                        let d = res.new_state();
                        map.insert(target.clone(), d);
                        worklist.push(target);
                        d
                    }
                };
                res.set_transition(src, dst, label, one.clone());
            }
        }
        debug!("determinize: {} states into {}", self.num_states(), res.num_states());
        Ok(res)
    }

    /// A copy with an outgoing transition for every letter from every
    /// state, the missing ones leading to a sink.
    ///
    /// An initial state is added when there is none.
    pub fn complete(&self) -> Result<Automaton> {
        self.require_free("complete")?;
        let generators = self
            .labelset()
            .generators()
            .ok_or_else(|| Error::precondition("complete", format!("a closed alphabet, not {}", self.labelset())))?;
        let one = self.weightset().one();
        let mut res = self.clone();
        let mut sink = None;
        if res.initial_transitions().is_empty() {
            let s = res.new_state();
            res.set_initial(s, one.clone());
        }
        let states: Vec<StateId> = res.states().collect();
        for s in states {
            let present: BTreeSet<Label> = res.out(s).into_iter().map(|t| res.label_of(t).clone()).collect();
            for g in &generators {
                if present.contains(g) {
                    continue;
                }
                let k = *sink.get_or_insert_with(|| res.new_state());
                res.set_transition(s, k, g.clone(), one.clone());
            }
        }
        if let Some(k) = sink {
            for g in generators {
                res.set_transition(k, k, g, one.clone());
            }
        }
        Ok(res)
    }

    /// The automaton accepting the words this one rejects.
    pub fn complement(&self) -> Result<Automaton> {
        if !matches!(self.labelset(), LabelSet::Letters(_)) {
            return Err(Error::precondition(
                "complement",
                format!("a letterset, not {}", self.labelset()),
            ));
        }
        self.require_boolean("complement")?;
        if !self.is_deterministic()? || !self.is_complete()? {
            return Err(Error::precondition("complement", "a deterministic and complete automaton"));
        }
        let one = self.weightset().one();
        let mut res = self.clone();
        let states: Vec<StateId> = res.states().collect();
        for s in states {
            if self.is_final(s) {
                res.set_final(s, self.weightset().zero());
            } else {
                res.set_final(s, one.clone());
            }
        }
        Ok(res)
    }
}
