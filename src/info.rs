//! Summaries of automata and expressions.

use std::fmt;

use crate::automaton::Automaton;
use crate::error::Result;
use crate::expression::{Exp, ExpNode, Expression};

/// One value of an [`Info`] report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    Count(usize),
    Flag(bool),
    Text(String),
    /// The property is not defined for this automaton.
    NotApplicable,
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Count(n) => write!(f, "{}", n),
            InfoValue::Flag(b) => write!(f, "{}", b),
            InfoValue::Text(s) => write!(f, "{}", s),
            InfoValue::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl From<usize> for InfoValue {
    fn from(n: usize) -> Self {
        InfoValue::Count(n)
    }
}

impl From<bool> for InfoValue {
    fn from(b: bool) -> Self {
        InfoValue::Flag(b)
    }
}

impl<T: Into<InfoValue>> From<Result<T>> for InfoValue {
    fn from(r: Result<T>) -> Self {
        r.map_or(InfoValue::NotApplicable, Into::into)
    }
}

/// An ordered report of named properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    entries: Vec<(&'static str, InfoValue)>,
}

impl Info {
    fn push(&mut self, name: &'static str, value: impl Into<InfoValue>) {
        self.entries.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &InfoValue)> + '_ {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

impl Automaton {
    /// Sizes and properties of the automaton.
    ///
    /// Determinism and ambiguity are `N/A` unless the labelset is free;
    /// ambiguity also requires Boolean weights. Synchronization is `N/A`
    /// unless the automaton is multi-tape.
    pub fn info(&self) -> Info {
        let free = self.labelset().is_free();
        let boolean = self.weightset().is_boolean();
        let mut info = Info::default();
        info.push("type", InfoValue::Text(format!("mutable_automaton<{}>", self.context())));
        info.push("number of states", self.num_states());
        info.push("number of initial states", self.initial_transitions().len());
        info.push("number of final states", self.final_transitions().len());
        info.push("number of transitions", self.num_transitions());
        info.push("number of eps transitions", self.num_eps_transitions());
        info.push("number of accessible states", self.accessible_states().len());
        info.push("number of coaccessible states", self.coaccessible_states().len());
        info.push("number of useful states", self.useful_states().len());
        info.push("number of strongly connected components", self.num_sccs());
        info.push("number of deterministic states", self.num_deterministic_states());
        info.push("number of codeterministic states", self.num_codeterministic_states());
        if free && boolean {
            info.push("is ambiguous", self.is_ambiguous());
            info.push("is cycle ambiguous", self.is_cycle_ambiguous());
        } else {
            info.push("is ambiguous", InfoValue::NotApplicable);
            info.push("is cycle ambiguous", InfoValue::NotApplicable);
        }
        info.push("is complete", self.is_complete());
        info.push("is deterministic", self.is_deterministic());
        info.push("is codeterministic", self.is_codeterministic());
        info.push("is empty", self.is_empty());
        info.push("is eps-acyclic", self.is_eps_acyclic());
        info.push("is normalized", self.is_normalized());
        info.push("is proper", self.is_proper());
        info.push("is standard", self.is_standard());
        info.push("is synchronized", self.is_synchronized());
        info.push("is trim", self.is_trim());
        info.push("is useless", self.is_useless());
        info.push("is valid", self.is_valid());
        info
    }
}

const KINDS: [&str; 13] = [
    "zero",
    "one",
    "atom",
    "sum",
    "prod",
    "conjunction",
    "shuffle",
    "star",
    "transposition",
    "lweight",
    "rweight",
    "complement",
    "tuple",
];

fn count_kinds(e: &Exp, counts: &mut [usize; 13]) {
    let name = e.kind_name();
    if let Some(i) = KINDS.iter().position(|k| *k == name) {
        counts[i] += 1;
    }
    for c in e.children() {
        count_kinds(c, counts);
    }
}

fn depth(e: &ExpNode) -> usize {
    1 + e.children().iter().map(|c| depth(c)).max().unwrap_or(0)
}

impl Expression {
    /// Size, depth, and the number of nodes of each kind.
    pub fn info(&self) -> Info {
        let mut counts = [0; 13];
        count_kinds(self.exp(), &mut counts);
        let mut info = Info::default();
        info.push(
            "type",
            InfoValue::Text(format!("expressionset<{}>({})", self.context(), self.identities())),
        );
        info.push("size", self.size());
        info.push("depth", depth(self.exp()));
        for (kind, n) in KINDS.into_iter().zip(counts) {
            info.push(kind, n);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn derive(ctx: &str, text: &str) -> Automaton {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse(&ctx, text).unwrap().derived_term().unwrap().strip()
    }

    #[test]
    fn test_automaton_info() {
        let info = derive("lal_char(ab), b", "(a+b)*a(a+b)").info();
        assert_eq!(info.get("number of states"), Some(&InfoValue::Count(3)));
        assert_eq!(info.get("number of transitions"), Some(&InfoValue::Count(5)));
        assert_eq!(info.get("is deterministic"), Some(&InfoValue::Flag(false)));
        assert_eq!(info.get("is ambiguous"), Some(&InfoValue::Flag(false)));
        assert_eq!(info.get("is synchronized"), Some(&InfoValue::NotApplicable));
        assert_eq!(info.get("is valid"), Some(&InfoValue::Flag(true)));
        assert_eq!(info.len(), 26);
        let text = info.to_string();
        assert!(text.starts_with("type: mutable_automaton<letterset<char_letters(ab)>, b>\n"));
        assert!(text.contains("is synchronized: N/A\n"));
    }

    #[test]
    fn test_not_applicable() {
        let info = derive("law_char(ab), z", "(ab)*").info();
        assert_eq!(info.get("is ambiguous"), Some(&InfoValue::NotApplicable));
        assert_eq!(info.get("is deterministic"), Some(&InfoValue::NotApplicable));
        assert_eq!(info.get("number of deterministic states"), Some(&InfoValue::NotApplicable));
        assert_eq!(info.get("is proper"), Some(&InfoValue::Flag(true)));
        let info = derive("lal_char(ab), z", "a*").info();
        assert_eq!(info.get("is ambiguous"), Some(&InfoValue::NotApplicable));
        assert_eq!(info.get("is deterministic"), Some(&InfoValue::Flag(true)));
    }

    #[test]
    fn test_expression_info() {
        let ctx = Context::parse("lal_char(ab), z").unwrap();
        let info = Expression::parse(&ctx, "(a+<2>b)*a").unwrap().info();
        assert_eq!(info.get("atom"), Some(&InfoValue::Count(3)));
        assert_eq!(info.get("star"), Some(&InfoValue::Count(1)));
        assert_eq!(info.get("lweight"), Some(&InfoValue::Count(1)));
        assert_eq!(info.get("size"), Some(&InfoValue::Count(7)));
        assert_eq!(info.get("depth"), Some(&InfoValue::Count(5)));
    }
}
