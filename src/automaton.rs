//! Mutable weighted automata.
//!
//! States and transitions live in two tables indexed by [`StateId`] and
//! [`TransitionId`]. Deleting leaves a tombstone, so ids stay valid and are
//! never reused.
//!
//! Two sentinel states are always present: [`StateId::PRE`] and
//! [`StateId::POST`]. A state `s` is initial with weight `w` iff there is a
//! transition `PRE --w--> s`, and final iff there is a transition
//! `s --w--> POST`; both carry the [`Label::Special`] label. This way initial
//! and final weights are handled by the same code as ordinary transitions.
//!
//! There is at most one transition per `(src, label, dst)`: adding onto an
//! existing one sums the weights, and removes it when the sum is zero.
//!
//! # Examples
//!
//! ```
//! use wfa_rs::automaton::Automaton;
//! use wfa_rs::context::Context;
//! use wfa_rs::labelset::Label;
//!
//! let ctx = Context::parse("lal_char(ab), z").unwrap();
//! let mut aut = Automaton::new(ctx.clone());
//! let p = aut.new_state();
//! let q = aut.new_state();
//! aut.set_initial(p, ctx.weightset().from_int(1));
//! aut.add_transition(p, q, Label::Letter('a'), ctx.weightset().from_int(2));
//! aut.add_transition(p, q, Label::Letter('a'), ctx.weightset().from_int(3));
//! aut.set_final(q, ctx.weightset().from_int(1));
//!
//! assert_eq!(aut.num_states(), 2);
//! assert_eq!(aut.num_transitions(), 1);
//! let t = aut.get_transition(p, &Label::Letter('a'), q).unwrap();
//! assert_eq!(aut.weight_of(t).to_string(), "5");
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::context::Context;
use crate::labelset::{Label, LabelSet};
use crate::weightset::{Semiring, Weight, WeightSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub usize);

impl StateId {
    /// The pre-initial sentinel.
    pub const PRE: StateId = StateId(0);
    /// The post-final sentinel.
    pub const POST: StateId = StateId(1);

    pub fn is_sentinel(self) -> bool {
        self.0 < 2
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StateId::PRE => write!(f, "pre"),
            StateId::POST => write!(f, "post"),
            StateId(s) => write!(f, "{}", s - 2),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub src: StateId,
    pub dst: StateId,
    pub label: Label,
    pub weight: Weight,
}

#[derive(Debug, Clone, Default)]
struct StateData {
    out: Vec<TransitionId>,
    inc: Vec<TransitionId>,
}

#[derive(Debug, Clone)]
pub struct Automaton {
    ctx: Context,
    states: Vec<Option<StateData>>,
    transitions: Vec<Option<Transition>>,
    index: HashMap<(StateId, Label, StateId), TransitionId>,
}

impl Automaton {
    /// An automaton with no state besides the sentinels.
    pub fn new(ctx: Context) -> Self {
        Automaton {
            ctx,
            states: vec![Some(StateData::default()), Some(StateData::default())],
            transitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn labelset(&self) -> &LabelSet {
        self.ctx.labelset()
    }

    pub fn weightset(&self) -> &WeightSet {
        self.ctx.weightset()
    }

    // ─── States ────────────────────────────────────────────────────────────────

    pub fn new_state(&mut self) -> StateId {
        self.states.push(Some(StateData::default()));
        StateId(self.states.len() - 1)
    }

    pub fn has_state(&self, s: StateId) -> bool {
        matches!(self.states.get(s.0), Some(Some(_)))
    }

    /// Delete `s` and every transition touching it. Sentinels are kept.
    pub fn del_state(&mut self, s: StateId) {
        if s.is_sentinel() || !self.has_state(s) {
            return;
        }
        let mut ts = self.all_out(s).to_vec();
        ts.extend_from_slice(self.all_in(s));
        for t in ts {
            self.del_transition(t);
        }
        self.states[s.0] = None;
    }

    /// Live states, sentinels excluded, by increasing id.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.all_states().filter(|s| !s.is_sentinel())
    }

    /// Live states, sentinels included.
    pub fn all_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some())
            .map(|(i, _)| StateId(i))
    }

    pub fn num_states(&self) -> usize {
        self.states().count()
    }

    /// One past the largest state id ever allocated.
    pub fn state_capacity(&self) -> usize {
        self.states.len()
    }

    fn data(&self, s: StateId) -> Option<&StateData> {
        self.states.get(s.0).and_then(Option::as_ref)
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    pub fn transition(&self, t: TransitionId) -> &Transition {
        match self.transitions.get(t.0) {
            Some(Some(tr)) => tr,
            _ => panic!("no transition {:?}", t),
        }
    }

    pub fn src_of(&self, t: TransitionId) -> StateId {
        self.transition(t).src
    }

    pub fn dst_of(&self, t: TransitionId) -> StateId {
        self.transition(t).dst
    }

    pub fn label_of(&self, t: TransitionId) -> &Label {
        &self.transition(t).label
    }

    pub fn weight_of(&self, t: TransitionId) -> &Weight {
        &self.transition(t).weight
    }

    pub fn get_transition(&self, src: StateId, label: &Label, dst: StateId) -> Option<TransitionId> {
        self.index.get(&(src, label.clone(), dst)).copied()
    }

    /// Set the transition `src --label--> dst` to `weight`, replacing any
    /// previous one. A zero weight removes it.
    pub fn set_transition(&mut self, src: StateId, dst: StateId, label: Label, weight: Weight) -> Option<TransitionId> {
        if let Some(t) = self.get_transition(src, &label, dst) {
            return self.set_weight(t, weight);
        }
        if weight.is_zero() {
            return None;
        }
        let t = TransitionId(self.transitions.len());
        self.index.insert((src, label.clone(), dst), t);
        self.transitions.push(Some(Transition {
            src,
            dst,
            label,
            weight,
        }));
        if let Some(Some(d)) = self.states.get_mut(src.0) {
            d.out.push(t);
        }
        if let Some(Some(d)) = self.states.get_mut(dst.0) {
            d.inc.push(t);
        }
        Some(t)
    }

    /// Add `weight` to the transition `src --label--> dst`, creating it if
    /// needed. Returns the transition if it still exists.
    pub fn add_transition(&mut self, src: StateId, dst: StateId, label: Label, weight: Weight) -> Option<TransitionId> {
        match self.get_transition(src, &label, dst) {
            Some(t) => {
                let sum = self.weightset().add(self.weight_of(t), &weight);
                self.set_weight(t, sum)
            }
            None => self.set_transition(src, dst, label, weight),
        }
    }

    /// Change the weight of `t`, deleting it when zero.
    pub fn set_weight(&mut self, t: TransitionId, weight: Weight) -> Option<TransitionId> {
        if weight.is_zero() {
            self.del_transition(t);
            return None;
        }
        if let Some(Some(tr)) = self.transitions.get_mut(t.0) {
            tr.weight = weight;
        }
        Some(t)
    }

    pub fn del_transition(&mut self, t: TransitionId) {
        let tr = match self.transitions.get_mut(t.0).and_then(Option::take) {
            Some(tr) => tr,
            None => return,
        };
        self.index.remove(&(tr.src, tr.label, tr.dst));
        if let Some(Some(d)) = self.states.get_mut(tr.src.0) {
            d.out.retain(|&x| x != t);
        }
        if let Some(Some(d)) = self.states.get_mut(tr.dst.0) {
            d.inc.retain(|&x| x != t);
        }
    }

    /// Transitions leaving `s`, including the final one.
    pub fn all_out(&self, s: StateId) -> &[TransitionId] {
        self.data(s).map(|d| d.out.as_slice()).unwrap_or(&[])
    }

    /// Transitions entering `s`, including the initial one.
    pub fn all_in(&self, s: StateId) -> &[TransitionId] {
        self.data(s).map(|d| d.inc.as_slice()).unwrap_or(&[])
    }

    /// Transitions leaving `s` to a real state.
    pub fn out(&self, s: StateId) -> Vec<TransitionId> {
        self.all_out(s)
            .iter()
            .copied()
            .filter(|&t| self.dst_of(t) != StateId::POST)
            .collect()
    }

    /// Transitions entering `s` from a real state.
    pub fn inc(&self, s: StateId) -> Vec<TransitionId> {
        self.all_in(s)
            .iter()
            .copied()
            .filter(|&t| self.src_of(t) != StateId::PRE)
            .collect()
    }

    /// Live transitions, initial and final ones included.
    pub fn all_transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_some())
            .map(|(i, _)| TransitionId(i))
    }

    /// Live transitions between real states.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.all_transitions()
            .filter(|&t| self.src_of(t) != StateId::PRE && self.dst_of(t) != StateId::POST)
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions().count()
    }

    // ─── Initial and final weights ─────────────────────────────────────────────

    pub fn set_initial(&mut self, s: StateId, weight: Weight) -> Option<TransitionId> {
        self.set_transition(StateId::PRE, s, Label::Special, weight)
    }

    pub fn add_initial(&mut self, s: StateId, weight: Weight) -> Option<TransitionId> {
        self.add_transition(StateId::PRE, s, Label::Special, weight)
    }

    pub fn set_final(&mut self, s: StateId, weight: Weight) -> Option<TransitionId> {
        self.set_transition(s, StateId::POST, Label::Special, weight)
    }

    pub fn add_final(&mut self, s: StateId, weight: Weight) -> Option<TransitionId> {
        self.add_transition(s, StateId::POST, Label::Special, weight)
    }

    pub fn initial_weight(&self, s: StateId) -> Weight {
        self.get_transition(StateId::PRE, &Label::Special, s)
            .map(|t| self.weight_of(t).clone())
            .unwrap_or_else(|| self.weightset().zero())
    }

    pub fn final_weight(&self, s: StateId) -> Weight {
        self.get_transition(s, &Label::Special, StateId::POST)
            .map(|t| self.weight_of(t).clone())
            .unwrap_or_else(|| self.weightset().zero())
    }

    pub fn is_initial(&self, s: StateId) -> bool {
        self.get_transition(StateId::PRE, &Label::Special, s).is_some()
    }

    pub fn is_final(&self, s: StateId) -> bool {
        self.get_transition(s, &Label::Special, StateId::POST).is_some()
    }

    pub fn initial_transitions(&self) -> &[TransitionId] {
        self.all_out(StateId::PRE)
    }

    pub fn final_transitions(&self) -> &[TransitionId] {
        self.all_in(StateId::POST)
    }

    pub fn initial_states(&self) -> Vec<StateId> {
        self.initial_transitions().iter().map(|&t| self.dst_of(t)).collect()
    }

    pub fn final_states(&self) -> Vec<StateId> {
        self.final_transitions().iter().map(|&t| self.src_of(t)).collect()
    }

    // ─── Copies ────────────────────────────────────────────────────────────────

    /// Copy the states satisfying `keep`, and the transitions between them,
    /// into a fresh automaton over `ctx`, converting labels and weights
    /// with `convert`. Returns the copy and the map from old to new states.
    pub fn copy_into<E>(
        &self,
        ctx: Context,
        keep: impl Fn(StateId) -> bool,
        mut convert: impl FnMut(&Label, &Weight) -> Result<(Label, Weight), E>,
    ) -> Result<(Automaton, HashMap<StateId, StateId>), E> {
        let mut res = Automaton::new(ctx);
        let mut map = HashMap::from([(StateId::PRE, StateId::PRE), (StateId::POST, StateId::POST)]);
        for s in self.states() {
            if keep(s) {
                map.insert(s, res.new_state());
            }
        }
        for t in self.all_transitions() {
            let tr = self.transition(t);
            if let (Some(&src), Some(&dst)) = (map.get(&tr.src), map.get(&tr.dst)) {
                let (label, weight) = if tr.label.is_special() {
                    (Label::Special, convert(&Label::Special, &tr.weight)?.1)
                } else {
                    convert(&tr.label, &tr.weight)?
                };
                res.add_transition(src, dst, label, weight);
            }
        }
        Ok((res, map))
    }

    /// The sub-automaton of the states satisfying `keep`.
    pub fn restrict(&self, keep: impl Fn(StateId) -> bool) -> Automaton {
        let copy: Result<_, std::convert::Infallible> =
            self.copy_into(self.ctx.clone(), keep, |l, w| Ok((l.clone(), w.clone())));
        match copy {
            Ok((res, _)) => res,
            Err(never) => match never {},
        }
    }

    /// The mirror automaton: transitions reversed, labels transposed,
    /// initial and final weights swapped.
    pub fn transpose(&self) -> Automaton {
        let mut res = Automaton::new(self.ctx.clone());
        let mut map = HashMap::from([(StateId::PRE, StateId::POST), (StateId::POST, StateId::PRE)]);
        for s in self.states() {
            map.insert(s, res.new_state());
        }
        let rs = match self.weightset() {
            WeightSet::Expressions(rs) => Some(rs.clone()),
            _ => None,
        };
        for t in self.all_transitions() {
            let tr = self.transition(t);
            let label = if tr.label.is_special() {
                Label::Special
            } else {
                self.labelset().transpose(&tr.label)
            };
            let weight = match (&rs, &tr.weight) {
                (Some(rs), Weight::Exp(e)) => rs.transpose(e).map(Weight::Exp).unwrap_or_else(|_| tr.weight.clone()),
                _ => tr.weight.clone(),
            };
            res.add_transition(map[&tr.dst], map[&tr.src], label, weight);
        }
        res
    }

    /// Whether both automata are equal up to a renaming of their states.
    pub fn is_isomorphic(&self, other: &Automaton) -> bool {
        if self.ctx != other.ctx
            || self.num_states() != other.num_states()
            || self.all_transitions().count() != other.all_transitions().count()
        {
            return false;
        }
        let signature = |a: &Automaton, s: StateId| {
            let mut out: Vec<(Label, Weight)> = a
                .all_out(s)
                .iter()
                .map(|&t| (a.label_of(t).clone(), a.weight_of(t).clone()))
                .collect();
            let mut inc: Vec<(Label, Weight)> = a
                .all_in(s)
                .iter()
                .map(|&t| (a.label_of(t).clone(), a.weight_of(t).clone()))
                .collect();
            out.sort();
            inc.sort();
            (out, inc)
        };
        let mine = self.bfs_order();
        let sigs: HashMap<StateId, _> = other.states().map(|s| (s, signature(other, s))).collect();
        let candidates: Vec<Vec<StateId>> = mine
            .iter()
            .map(|&s| {
                let sig = signature(self, s);
                other.states().filter(|t| sigs[t] == sig).collect()
            })
            .collect();
        let mut map = HashMap::from([(StateId::PRE, StateId::PRE), (StateId::POST, StateId::POST)]);
        let mut used = HashSet::new();
        self.match_states(other, &mine, &candidates, 0, &mut map, &mut used)
    }

    /// States in breadth-first order from the initial states, then the rest.
    fn bfs_order(&self) -> Vec<StateId> {
        let mut seen = HashSet::new();
        let mut res = Vec::new();
        let mut queue: VecDeque<StateId> = VecDeque::from(vec![StateId::PRE]);
        let mut roots = self.states();
        loop {
            while let Some(s) = queue.pop_front() {
                for &t in self.all_out(s) {
                    let d = self.dst_of(t);
                    if !d.is_sentinel() && seen.insert(d) {
                        res.push(d);
                        queue.push_back(d);
                    }
                }
            }
            let next = roots.by_ref().find(|s| !seen.contains(s));
            match next {
                Some(s) => {
                    seen.insert(s);
                    res.push(s);
                    queue.push_back(s);
                }
                None => break,
            }
        }
        res
    }

    fn match_states(
        &self,
        other: &Automaton,
        order: &[StateId],
        candidates: &[Vec<StateId>],
        i: usize,
        map: &mut HashMap<StateId, StateId>,
        used: &mut HashSet<StateId>,
    ) -> bool {
        let s = match order.get(i) {
            Some(&s) => s,
            None => return true,
        };
        for &t in &candidates[i] {
            if used.contains(&t) {
                continue;
            }
            map.insert(s, t);
            let consistent = self.all_out(s).iter().chain(self.all_in(s)).all(|&tr| {
                let x = self.transition(tr);
                match (map.get(&x.src), map.get(&x.dst)) {
                    (Some(&src), Some(&dst)) => other
                        .get_transition(src, &x.label, dst)
                        .is_some_and(|u| *other.weight_of(u) == x.weight),
                    _ => true,
                }
            });
            if consistent {
                used.insert(t);
                if self.match_states(other, order, candidates, i + 1, map, used) {
                    return true;
                }
                used.remove(&t);
            }
            map.remove(&s);
        }
        false
    }
}
