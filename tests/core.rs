//! End-to-end tests for wfa-rs.
//!
//! Tests cover contexts, expressions, polynomials, derived terms and the
//! automaton algorithms working together.

use wfa_rs::automaton::Automaton;
use wfa_rs::context::Context;
use wfa_rs::error::Error;
use wfa_rs::expression::{Expression, Identities};
use wfa_rs::labelset::Label;
use wfa_rs::parser::Syntax;
use wfa_rs::polynomial::Polynomial;
use wfa_rs::proper::{Direction, ProperConfig};
use wfa_rs::weightset::Semiring;

fn ctx(text: &str) -> Context {
    Context::parse(text).unwrap()
}

fn exp(context: &str, text: &str) -> Expression {
    Expression::parse(&ctx(context), text).unwrap()
}

fn derive(context: &str, text: &str) -> Automaton {
    exp(context, text).derived_term().unwrap().strip()
}

/// Every word over `letters` of length at most `n`, `\e` first.
fn words(letters: &str, n: usize) -> Vec<String> {
    let mut res = vec![String::new()];
    let mut last = vec![String::new()];
    for _ in 0..n {
        last = last
            .iter()
            .flat_map(|w| letters.chars().map(move |c| format!("{}{}", w, c)))
            .collect();
        res.extend(last.iter().cloned());
    }
    res
}

fn eval(aut: &Automaton, word: &str) -> String {
    let w = if word.is_empty() { "\\e" } else { word };
    aut.eval(w).unwrap().to_string()
}

// ─── Contexts ──────────────────────────────────────────────────────────────────

#[test]
fn context_descriptors_round_trip() {
    for text in [
        "lal_char(abc), b",
        "lan_char(ab), q",
        "law_char(a-d), zmax",
        "lat<lal_char(ab), law_char(xy)>, z",
        "lal_char(ab), expressionset<lal_char(xy), q>",
        "[ab]? -> R",
    ] {
        let c = ctx(text);
        let again: Context = c.to_string().parse().unwrap();
        assert_eq!(again, c, "{}", text);
    }
}

#[test]
fn context_errors() {
    assert!(matches!(Context::parse("lal_char(ab), nope"), Err(Error::SyntaxError { .. })));
    assert!(matches!(Context::parse("lol_char(ab), b"), Err(Error::SyntaxError { .. })));
}

// ─── Expressions ───────────────────────────────────────────────────────────────

#[test]
fn expression_print_parse_round_trip() {
    let corpus = [
        ("lal_char(abc), b", ["(a+b)*c", "(ab)*", "a&b*", "(a:b)c"]),
        ("lal_char(abc), z", ["a+b", "<2>(ab)", "<-3>a*b", "(<2>a)*"]),
    ];
    for (c, texts) in corpus {
        for text in texts {
            let e = exp(c, text);
            let again = Expression::parse(e.context(), &e.to_string()).unwrap();
            assert_eq!(again, e, "{}", text);
        }
    }
}

#[test]
fn expression_identities() {
    let c = ctx("lal_char(abcd), z");
    let dist = |text: &str| {
        Expression::parse_with(&c, text, Identities::Distributive, Syntax::Default)
            .unwrap()
            .to_string()
    };
    assert_eq!(dist("a+b(c+<2>d)"), "a+bc+<2>(bd)");
    assert_eq!(dist("(<5>a)b"), "<5>(ab)");
    assert_eq!(exp("lal_char(a), z", "(a+a)*").to_string(), "(<2>a)*");
}

#[test]
fn expand_distributes_and_is_idempotent() {
    let c = "lal_char(abc), z";
    let lhs = exp(c, "a(b+c)").expand();
    let rhs = exp(c, "ab+ac").expand();
    assert_eq!(lhs, rhs);
    assert_eq!(lhs.expand(), lhs);
}

// ─── Polynomials ───────────────────────────────────────────────────────────────

#[test]
fn polynomial_division_laws() {
    let c = ctx("law_char(abcd), z");
    let p = |text: &str| Polynomial::parse(&c, text).unwrap();

    // The divisor is the receiver: `q.ldiv(p)` solves `q · x = p`.
    let (q, target) = (p("<2>a"), p("<4>a"));
    let x = q.ldiv(&target).unwrap();
    assert_eq!(x, p("<2>\\e"));
    assert_eq!(q.mul(&x).unwrap(), target);

    let (q, target) = (p("ab"), p("<2>abc+<3>abd"));
    assert_eq!(q.mul(&q.ldiv(&target).unwrap()).unwrap(), target);

    assert!(matches!(p("b").ldiv(&p("ab+bb")), Err(Error::NotDivisible { .. })));
}

#[test]
fn polynomial_gcd_laws() {
    let c = ctx("law_char(abcd), z");
    let p = |text: &str| Polynomial::parse(&c, text).unwrap();
    for text in ["a", "<2>ab", "a+b"] {
        assert_eq!(p(text).lgcd(&p(text)).unwrap(), p(text));
    }
    assert_eq!(p("<2>a").lgcd(&p("<4>a")).unwrap(), p("<2>a"));
}

// ─── Derived terms ─────────────────────────────────────────────────────────────

#[test]
fn derived_term_matches_expression() {
    let aut = derive("lal_char(ab), b", "(a+b)*a(a+b)");
    assert_eq!(aut.num_states(), 3);
    for w in words("ab", 4) {
        let expected = w.len() >= 2 && w.as_bytes()[w.len() - 2] == b'a';
        assert_eq!(eval(&aut, &w), if expected { "1" } else { "0" }, "{}", w);
    }

    let aut = derive("lal_char(ab), zmin", "(<1>a+<2>b)*");
    assert_eq!(eval(&aut, "abba"), "6");
}

// ─── Standard automata ─────────────────────────────────────────────────────────

#[test]
fn standard_agrees_with_derived_term() {
    for (c, text) in [
        ("lal_char(ab), b", "(a+b)*a(a+b)"),
        ("lal_char(ab), z", "(a+<2>b)*(<3>\\e+a)"),
        ("lal_char(ab), zmin", "(<1>a+<2>b)*<3>a"),
    ] {
        let e = exp(c, text);
        let std = e.standard().unwrap();
        assert!(std.is_standard(), "{}", text);
        let dt = e.derived_term().unwrap().strip();
        for w in words("ab", 4) {
            assert_eq!(eval(&std, &w), eval(&dt, &w), "{}: {}", text, w);
        }
    }
}

// ─── Epsilon-elimination ───────────────────────────────────────────────────────

fn spontaneous_chain() -> Automaton {
    let c = ctx("lan_char(ab), z");
    let ws = c.weightset().clone();
    let mut aut = Automaton::new(c);
    let p = aut.new_state();
    let q = aut.new_state();
    aut.set_initial(p, ws.one());
    aut.add_transition(p, q, Label::One, ws.from_int(2));
    aut.add_transition(p, q, Label::Letter('b'), ws.one());
    aut.add_transition(q, q, Label::Letter('a'), ws.from_int(3));
    aut.set_final(q, ws.one());
    aut
}

#[test]
fn proper_preserves_weights() {
    let aut = spontaneous_chain();
    for direction in [Direction::Backward, Direction::Forward] {
        let res = aut.proper(&ProperConfig::default().with_direction(direction)).unwrap();
        assert!(res.is_proper());
        assert_eq!(eval(&res, ""), "2");
        assert_eq!(eval(&res, "aa"), "18");
        assert_eq!(eval(&res, "ba"), "3");
        assert_eq!(eval(&res, "ab"), "0");
    }
}

#[test]
fn proper_rejects_divergent_cycles() {
    let aut = Automaton::from_dot(
        r#"digraph
{
  vcsn_context = "lan_char(ab), q"
  I -> 0 -> F
  0 -> 1 [label = "\\e"]
  1 -> 0 [label = "<2>\\e"]
}"#,
    )
    .unwrap();
    assert!(matches!(
        aut.proper(&ProperConfig::default()),
        Err(Error::InvalidEpsilonCycle { .. })
    ));
    assert!(!aut.is_valid());
}

// ─── Ambiguity ─────────────────────────────────────────────────────────────────

#[test]
fn ambiguity_scenario() {
    let c = ctx("lal_char(ab), b");
    let one = c.weightset().one();
    let mut aut = Automaton::new(c);
    let s0 = aut.new_state();
    let s1 = aut.new_state();
    let s2 = aut.new_state();
    aut.set_initial(s0, one.clone());
    aut.add_transition(s0, s1, Label::Letter('a'), one.clone());
    aut.add_transition(s0, s2, Label::Letter('a'), one.clone());
    aut.set_final(s1, one.clone());
    assert!(!aut.is_ambiguous().unwrap());
    assert!(matches!(aut.ambiguous_word(), Err(Error::Unambiguous)));

    aut.set_final(s2, one);
    assert!(aut.is_ambiguous().unwrap());
    assert_eq!(aut.ambiguous_word().unwrap().to_string(), "a");
}

#[test]
fn deterministic_automata_are_unambiguous() {
    let aut = derive("lal_char(ab), b", "(a+b)*a(a+b)").determinize().unwrap();
    assert!(aut.is_deterministic().unwrap());
    assert!(!aut.is_ambiguous().unwrap());
}

// ─── Complement ────────────────────────────────────────────────────────────────

#[test]
fn complement_is_involutive() {
    let aut = derive("lal_char(ab), b", "(a+b)*ab")
        .determinize()
        .unwrap()
        .complete()
        .unwrap();
    let co = aut.complement().unwrap();
    let coco = co.complement().unwrap();
    for w in words("ab", 4) {
        assert_eq!(eval(&coco, &w), eval(&aut, &w), "{}", w);
        assert_ne!(eval(&co, &w), eval(&aut, &w), "{}", w);
    }
}

// ─── Synchronization ───────────────────────────────────────────────────────────

#[test]
fn synchronize_yields_synchronized() {
    let aut = Automaton::from_dot(
        r#"digraph
{
  vcsn_context = "lat<law_char(abc), law_char(xyz)>, z"
  I -> 0
  0 -> 1 [label = "<2>abc|x"]
  1 -> 1 [label = "a|y"]
  1 -> 2 [label = "\\e|yz"]
  2 -> F
}"#,
    )
    .unwrap();
    assert!(!aut.is_synchronized().unwrap());
    let res = aut.synchronize().unwrap();
    assert!(res.is_synchronized().unwrap());
    assert_eq!(res.initial_states().len(), 1);
}

// ─── Dot ───────────────────────────────────────────────────────────────────────

#[test]
fn dot_round_trip() {
    for (c, text) in [
        ("lal_char(ab), b", "(a+b)*a(a+b)"),
        ("lal_char(abc), zmin", "(<1>a+<2>b)*<3>c"),
        ("lan_char(ab), r", "(<0.5>a)*b"),
        ("lal_char(ab), expressionset<lal_char(xy), q>", "(<x>a+<y*>b)*"),
    ] {
        let aut = derive(c, text);
        let dot = aut.to_dot().unwrap();
        let back = Automaton::from_dot(&dot).unwrap();
        assert!(back.is_isomorphic(&aut), "{}\n{}", text, dot);
    }
}

// ─── Info and casts ────────────────────────────────────────────────────────────

#[test]
fn info_report() {
    let info = derive("lal_char(ab), b", "a*a*").info();
    assert_eq!(info.get("is ambiguous").unwrap().to_string(), "true");
    assert_eq!(info.get("is synchronized").unwrap().to_string(), "N/A");
    let text = info.to_string();
    assert!(text.contains("number of states: 2\n"));
}

#[test]
fn cast_between_contexts() {
    let aut = derive("lal_char(ab), b", "(a+b)*b");
    let res = aut.cast(&ctx("law_char(abc), q")).unwrap();
    assert_eq!(res.context(), &ctx("law_char(abc), q"));
    let e = exp("lal_char(ab), z", "<2>a+b")
        .cast(&ctx("lal_char(abc), r"), Identities::Linear)
        .unwrap();
    assert_eq!(e.to_string(), "<2>a+b");
    assert!(matches!(
        aut.cast(&ctx("lal_char(a), b")),
        Err(Error::BadLabel { .. })
    ));
}
