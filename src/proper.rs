//! Epsilon-elimination.
//!
//! Spontaneous transitions (labelled by the empty word) are removed one state
//! at a time. In the backward direction, eliminating `s` removes the
//! spontaneous transitions entering `s` and copies every transition leaving
//! `s` onto each of their sources; a spontaneous loop on `s` contributes the
//! star of its weight. The forward direction works the same way on the
//! mirror image.

use log::debug;

use crate::automaton::{Automaton, StateId, TransitionId};
use crate::error::{Error, Result};
use crate::labelset::Label;
use crate::weightset::{Semiring, Weight};

/// Which side of the spontaneous transitions is kept.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Direction {
    /// Copy the outgoing transitions onto the spontaneous predecessors.
    #[default]
    Backward,
    /// Copy the incoming transitions onto the spontaneous successors.
    Forward,
}

/// Configuration for [`Automaton::proper`].
#[derive(Debug, Clone)]
pub struct ProperConfig {
    pub direction: Direction,
    /// Delete eliminated states left without incoming (backward) or
    /// outgoing (forward) transitions.
    pub prune: bool,
}

impl Default for ProperConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Backward,
            prune: true,
        }
    }
}

impl ProperConfig {
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }
}

struct Eliminator {
    aut: Automaton,
    forward: bool,
    prune: bool,
}

impl Eliminator {
    fn is_eps(&self, t: TransitionId) -> bool {
        let l = self.aut.label_of(t);
        !l.is_special() && l.is_one()
    }

    /// Transitions on the eliminated side of `s`.
    fn near(&self, s: StateId) -> &[TransitionId] {
        if self.forward {
            self.aut.all_out(s)
        } else {
            self.aut.all_in(s)
        }
    }

    /// Transitions on the kept side of `s`.
    fn far(&self, s: StateId) -> &[TransitionId] {
        if self.forward {
            self.aut.all_in(s)
        } else {
            self.aut.all_out(s)
        }
    }

    fn count_eps(&self, ts: &[TransitionId]) -> usize {
        ts.iter().filter(|&&t| self.is_eps(t)).count()
    }

    /// The next state to eliminate: fewest spontaneous transitions on the
    /// kept side, then fewest transitions on the kept side, then fewest
    /// spontaneous transitions to remove, then smallest id.
    fn next_state(&self) -> Option<StateId> {
        self.aut
            .states()
            .filter(|&s| self.count_eps(self.near(s)) > 0)
            .min_by_key(|&s| {
                let far = self.far(s);
                (self.count_eps(far), far.len(), self.count_eps(self.near(s)), s)
            })
    }

    fn eliminate(&mut self, s: StateId) -> Result<()> {
        let ws = self.aut.weightset().clone();
        let one_label = self.aut.labelset().one();
        let star = match self.aut.get_transition(s, &one_label, s) {
            Some(l) => {
                let w = self.aut.weight_of(l).clone();
                self.aut.del_transition(l);
                ws.star(&w).map_err(|_| Error::InvalidEpsilonCycle {
                    state: s.0 - 2,
                    weight: w.to_string(),
                })?
            }
            None => ws.one(),
        };

        let eps: Vec<TransitionId> = self.near(s).iter().copied().filter(|&t| self.is_eps(t)).collect();
        let mut removed: Vec<(StateId, Weight)> = Vec::new();
        for t in eps {
            let other = if self.forward { self.aut.dst_of(t) } else { self.aut.src_of(t) };
            removed.push((other, self.aut.weight_of(t).clone()));
            self.aut.del_transition(t);
        }
        debug!("proper: eliminating {} ({} spontaneous transitions)", s, removed.len());

        for t in self.far(s).to_vec() {
            let tr = self.aut.transition(t).clone();
            let k = if star.is_one() {
                tr.weight.clone()
            } else if self.forward {
                ws.mul(&tr.weight, &star)
            } else {
                ws.mul(&star, &tr.weight)
            };
            self.aut.set_weight(t, k.clone());
            for (other, h) in &removed {
                if self.forward {
                    self.aut.add_transition(tr.src, *other, tr.label.clone(), ws.mul(&k, h));
                } else {
                    self.aut.add_transition(*other, tr.dst, tr.label.clone(), ws.mul(h, &k));
                }
            }
        }

        if self.prune && self.near(s).is_empty() {
            debug!("proper: pruning {}", s);
            self.aut.del_state(s);
        }
        Ok(())
    }
}

impl Automaton {
    /// Remove the spontaneous transitions.
    ///
    /// The result is over the proper context. Fails with
    /// [`Error::InvalidEpsilonCycle`] when a spontaneous cycle has a weight
    /// whose star is not defined.
    pub fn proper(&self, config: &ProperConfig) -> Result<Automaton> {
        let mut elim = Eliminator {
            aut: self.clone(),
            forward: config.direction == Direction::Forward,
            prune: config.prune,
        };
        while let Some(s) = elim.next_state() {
            elim.eliminate(s)?;
        }
        let ls = self.labelset().clone();
        let proper_ctx = self.context().proper();
        let proper_ls = proper_ctx.labelset().clone();
        let convert = |l: &Label, w: &Weight| -> Result<(Label, Weight)> { Ok((proper_ls.convert(&ls, l)?, w.clone())) };
        let (res, _) = elim.aut.copy_into(proper_ctx, |_| true, convert)?;
        Ok(res)
    }

    /// Whether `proper` would succeed.
    pub fn is_valid(&self) -> bool {
        self.is_proper() || self.proper(&ProperConfig::default()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::context::Context;

    fn looped(ctx: &str, weight: &str) -> (Automaton, StateId) {
        let ctx = Context::parse(ctx).unwrap();
        let ws = ctx.weightset().clone();
        let mut aut = Automaton::new(ctx.clone());
        let p = aut.new_state();
        aut.set_initial(p, ws.one());
        aut.add_transition(p, p, Label::One, ctx.parse_weight(weight).unwrap());
        aut.set_final(p, ws.one());
        (aut, p)
    }

    #[test]
    fn test_loop_star() {
        let (aut, _) = looped("law_char(ab), r", "0.5");
        let res = aut.proper(&ProperConfig::default()).unwrap();
        assert!(res.is_proper());
        let s = res.states().next().unwrap();
        assert_eq!(res.final_weight(s).to_string(), "2");
    }

    #[test]
    fn test_invalid_cycles() {
        let (aut, _) = looped("lan_char(ab), z", "1");
        assert!(matches!(
            aut.proper(&ProperConfig::default()),
            Err(Error::InvalidEpsilonCycle { state: 0, .. })
        ));
        assert!(!aut.is_valid());
        let (aut, _) = looped("lan_char(ab), zmin", "-1");
        assert!(matches!(
            aut.proper(&ProperConfig::default()),
            Err(Error::InvalidEpsilonCycle { .. })
        ));
        let (aut, _) = looped("lan_char(ab), zmin", "1");
        assert!(aut.is_valid());
    }

    fn chain() -> Automaton {
        let ctx = Context::parse("lan_char(ab), z").unwrap();
        let ws = ctx.weightset().clone();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        let r = aut.new_state();
        aut.set_initial(p, ws.one());
        aut.add_transition(p, q, Label::One, ws.from_int(2));
        aut.add_transition(q, r, Label::Letter('a'), ws.from_int(3));
        aut.set_final(r, ws.one());
        aut
    }

    #[test]
    fn test_backward() {
        let aut = chain();
        let res = aut.proper(&ProperConfig::default()).unwrap();
        assert_eq!(res.context().to_string(), Context::parse("lal_char(ab), z").unwrap().to_string());
        assert_eq!(res.num_states(), 2);
        assert_eq!(res.num_transitions(), 1);
        assert_eq!(res.eval("a").unwrap().to_string(), "6");
    }

    #[test]
    fn test_forward() {
        let aut = chain();
        let res = aut
            .proper(&ProperConfig::default().with_direction(Direction::Forward))
            .unwrap();
        assert_eq!(res.num_states(), 2);
        let init = res.initial_states()[0];
        assert_eq!(res.initial_weight(init).to_string(), "2");
        assert_eq!(res.eval("a").unwrap().to_string(), "6");
    }

    #[test]
    fn test_keeps_inaccessible_states() {
        let ctx = Context::parse("lan_char(ab), z").unwrap();
        let ws = ctx.weightset().clone();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        let z = aut.new_state();
        aut.set_initial(p, ws.one());
        aut.add_transition(p, q, Label::Letter('a'), ws.one());
        aut.set_final(q, ws.one());
        aut.add_transition(z, q, Label::One, ws.from_int(2));
        assert!(!aut.accessible_states().contains(&z));

        let res = aut.proper(&ProperConfig::default()).unwrap();
        assert!(res.is_proper());
        assert_eq!(res.num_states(), 3);
        assert_eq!(res.final_states().len(), 2);
        assert_eq!(res.accessible_states().len(), 2);
        assert_eq!(res.eval("a").unwrap().to_string(), "1");
    }

    #[test]
    fn test_no_prune() {
        let aut = chain();
        let res = aut.proper(&ProperConfig::default().with_prune(false)).unwrap();
        assert_eq!(res.num_states(), 3);
        assert!(!res.is_trim());
    }
}
