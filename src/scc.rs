//! Strongly connected components, by Tarjan's algorithm.
//!
//! Components come out in reverse topological order: a component is listed
//! before every component that can reach it.

use std::collections::HashMap;
use std::hash::Hash;

use crate::automaton::{Automaton, StateId};

struct TarjanState<N> {
    index: usize,
    indices: HashMap<N, usize>,
    low_links: HashMap<N, usize>,
    stack: Vec<N>,
    on_stack: HashMap<N, bool>,
    result: Vec<Vec<N>>,
}

/// The components of the graph over `nodes` with edges given by `succ`.
pub fn tarjan<N, F>(nodes: impl IntoIterator<Item = N>, succ: F) -> Vec<Vec<N>>
where
    N: Copy + Eq + Hash,
    F: Fn(N) -> Vec<N>,
{
    let mut state = TarjanState {
        index: 0,
        indices: HashMap::new(),
        low_links: HashMap::new(),
        stack: Vec::new(),
        on_stack: HashMap::new(),
        result: Vec::new(),
    };
    for v in nodes {
        if !state.indices.contains_key(&v) {
            visit(v, &succ, &mut state);
        }
    }
    state.result
}

fn visit<N, F>(v: N, succ: &F, state: &mut TarjanState<N>)
where
    N: Copy + Eq + Hash,
    F: Fn(N) -> Vec<N>,
{
    let index = state.index;
    state.indices.insert(v, index);
    state.low_links.insert(v, index);
    state.index += 1;
    state.stack.push(v);
    state.on_stack.insert(v, true);

    for w in succ(v) {
        if !state.indices.contains_key(&w) {
            visit(w, succ, state);
            let low = state.low_links[&v].min(state.low_links[&w]);
            state.low_links.insert(v, low);
        } else if state.on_stack.get(&w).copied().unwrap_or(false) {
            let low = state.low_links[&v].min(state.indices[&w]);
            state.low_links.insert(v, low);
        }
    }

    if state.low_links[&v] == state.indices[&v] {
        let mut component = Vec::new();
        while let Some(w) = state.stack.pop() {
            state.on_stack.insert(w, false);
            component.push(w);
            if w == v {
                break;
            }
        }
        state.result.push(component);
    }
}

/// The strongly connected components of an automaton, sentinels excluded.
pub fn sccs(aut: &Automaton) -> Vec<Vec<StateId>> {
    tarjan(aut.states(), |s| aut.out(s).into_iter().map(|t| aut.dst_of(t)).collect())
}

/// The component index of every state.
pub fn component_map(components: &[Vec<StateId>]) -> HashMap<StateId, usize> {
    components
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.iter().map(move |&s| (s, i)))
        .collect()
}

impl Automaton {
    pub fn num_sccs(&self) -> usize {
        sccs(self).len()
    }
}
