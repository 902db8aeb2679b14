//! Rendering of expressions in the canonical syntax.
//!
//! Parentheses are emitted only where needed for [`crate::parser`] to read
//! the same tree back, so that printing then parsing at the same identity
//! level is the identity.

use std::fmt::Write as _;

use crate::expression::{Exp, ExpNode};
use crate::labelset::Label;
use crate::weightset::Weight;

/// Output style.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Format {
    /// Canonical ASCII syntax: `\z`, `\e`, `<w>`, `{c}`, `{T}`.
    #[default]
    Text,
    /// Same structure with `∅`, `ε`, `⟨w⟩`, `ᶜ`, `ᵗ`.
    Utf8,
}

// Binding strength, loosest first.
const SUM: u8 = 0;
const TUPLE: u8 = 1;
const CONJUNCTION: u8 = 2;
const SHUFFLE: u8 = 3;
const PROD: u8 = 4;
const WEIGHT: u8 = 5;
const POSTFIX: u8 = 6;
const LEAF: u8 = 7;

fn precedence(e: &ExpNode) -> u8 {
    match e {
        ExpNode::Sum(_) => SUM,
        ExpNode::Tuple(_) => TUPLE,
        ExpNode::Conjunction(_) => CONJUNCTION,
        ExpNode::Shuffle(_) => SHUFFLE,
        ExpNode::Prod(_) => PROD,
        ExpNode::LWeight(..) | ExpNode::RWeight(..) => WEIGHT,
        ExpNode::Star(_) | ExpNode::Complement(_) | ExpNode::Transposition(_) => POSTFIX,
        ExpNode::Atom(Label::Tuple(_)) => TUPLE,
        ExpNode::Atom(Label::Word(w)) if w.chars().count() > 1 => PROD,
        ExpNode::Zero | ExpNode::One | ExpNode::Atom(_) => LEAF,
    }
}

/// Render `e` in the given style.
pub fn format_exp(e: &Exp, format: Format) -> String {
    let mut out = String::new();
    Printer { format, out: &mut out }.print(e);
    out
}

/// Render a weight for use inside `<...>`.
pub fn format_weight(w: &Weight, format: Format) -> String {
    match w {
        Weight::Exp(e) => format_exp(e, format),
        other => other.to_string(),
    }
}

struct Printer<'a> {
    format: Format,
    out: &'a mut String,
}

impl Printer<'_> {
    fn utf8(&self) -> bool {
        self.format == Format::Utf8
    }

    fn weight(&mut self, w: &Weight) {
        let text = format_weight(w, self.format);
        if self.utf8() {
            let _ = write!(self.out, "⟨{}⟩", text);
        } else {
            let _ = write!(self.out, "<{}>", text);
        }
    }

    /// Print `child`, in parentheses when it binds looser than `min`.
    fn child(&mut self, child: &Exp, min: u8) {
        if precedence(child) < min {
            self.out.push('(');
            self.print(child);
            self.out.push(')');
        } else {
            self.print(child);
        }
    }

    /// Print the operands of a variadic node; nested nodes of the same
    /// precedence are parenthesized.
    fn variadic(&mut self, es: &[Exp], prec: u8, sep: &str) {
        for (i, e) in es.iter().enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            self.child(e, prec + 1);
        }
    }

    fn print(&mut self, e: &Exp) {
        match &**e {
            ExpNode::Zero => self.out.push_str(if self.utf8() { "∅" } else { "\\z" }),
            ExpNode::One => self.out.push_str(if self.utf8() { "ε" } else { "\\e" }),
            ExpNode::Atom(l) => self.label(l),
            ExpNode::Sum(es) => self.variadic(es, SUM, "+"),
            ExpNode::Tuple(es) => self.variadic(es, TUPLE, "|"),
            ExpNode::Conjunction(es) => self.variadic(es, CONJUNCTION, "&"),
            ExpNode::Shuffle(es) => self.variadic(es, SHUFFLE, ":"),
            ExpNode::Prod(es) => {
                let last = es.len().saturating_sub(1);
                for (i, c) in es.iter().enumerate() {
                    // `a<2>b` reads as `(a<2>)b`: only a leading left weight
                    // and a trailing right weight can go bare.
                    let bare = match &**c {
                        ExpNode::LWeight(..) => i == 0,
                        ExpNode::RWeight(..) => i == last,
                        ExpNode::Prod(_) => false,
                        _ => true,
                    };
                    if bare {
                        self.child(c, PROD);
                    } else {
                        self.child(c, LEAF);
                    }
                }
            }
            ExpNode::LWeight(w, sub) => {
                self.weight(w);
                self.child(sub, WEIGHT);
            }
            ExpNode::RWeight(sub, w) => {
                let min = if matches!(**sub, ExpNode::LWeight(..)) { POSTFIX } else { WEIGHT };
                self.child(sub, min);
                self.weight(w);
            }
            ExpNode::Star(sub) => {
                self.child(sub, POSTFIX);
                self.out.push('*');
            }
            ExpNode::Complement(sub) => {
                self.child(sub, POSTFIX);
                self.out.push_str(if self.utf8() { "ᶜ" } else { "{c}" });
            }
            ExpNode::Transposition(sub) => {
                self.child(sub, POSTFIX);
                self.out.push_str(if self.utf8() { "ᵗ" } else { "{T}" });
            }
        }
    }

    fn label(&mut self, l: &Label) {
        match l {
            Label::One => self.out.push_str(if self.utf8() { "ε" } else { "\\e" }),
            Label::Tuple(tapes) => {
                for (i, t) in tapes.iter().enumerate() {
                    if i > 0 {
                        self.out.push('|');
                    }
                    self.label(t);
                }
            }
            other => {
                let _ = write!(self.out, "{}", other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::expression::{Expression, Identities};
    use crate::parser::Syntax;

    fn print(ctx: &str, ids: Identities, text: &str, format: Format) -> String {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse_with(&ctx, text, ids, Syntax::Default).unwrap().format(format)
    }

    #[test]
    fn test_text() {
        let c = "lal_char(abc), z";
        let l = Identities::Linear;
        assert_eq!(print(c, l, "(a+b)*c", Format::Text), "(a+b)*c");
        assert_eq!(print(c, l, "<2>(ab)", Format::Text), "<2>(ab)");
        assert_eq!(print(c, l, "(ab)*", Format::Text), "(ab)*");
        assert_eq!(print(c, l, "a&b*", Format::Text), "a&b*");
        assert_eq!(print(c, l, "(a:b)c", Format::Text), "(a:b)c");
        assert_eq!(print(c, Identities::None, "a(bc)", Format::Text), "a(bc)");
    }

    #[test]
    fn test_utf8() {
        let c = "lal_char(abc), z";
        assert_eq!(print(c, Identities::Trivial, "<2>\\e+\\z", Format::Utf8), "⟨2⟩ε");
        assert_eq!(print("lal_char(abc), b", Identities::Linear, "a{c}{T}", Format::Utf8), "aᶜᵗ");
    }

    #[test]
    fn test_tuples() {
        let c = "lat<lal_char(ab), lal_char(xy)>, b";
        assert_eq!(print(c, Identities::Linear, "(a|x)(b|y)", Format::Text), "(a|x)(b|y)");
        assert_eq!(print(c, Identities::Linear, "a*|x", Format::Text), "a*|x");
    }

    #[test]
    fn test_round_trip() {
        let c = Context::parse("lal_char(abc), q").unwrap();
        for ids in [Identities::None, Identities::Trivial, Identities::Linear] {
            for text in [
                "a+b",
                "(a+b)*c<1/2>",
                "<3>a(b+c)*",
                "a*&b",
                "(a:b:c)*",
                "a*{T}",
                "(<2>a)<3>",
            ] {
                let e = Expression::parse_with(&c, text, ids, Syntax::Default).unwrap();
                let again = Expression::parse_with(&c, &e.to_string(), ids, Syntax::Default).unwrap();
                assert_eq!(again, e, "{} at {}", text, ids);
            }
        }
    }

    #[test]
    fn test_escapes_round_trip() {
        let c = Context::parse("lal_char(...), b").unwrap();
        for ids in [Identities::None, Identities::Linear] {
            for code in 0x01..=0xfe {
                let text = format!("\\x{:02x}b", code);
                let e = Expression::parse_with(&c, &text, ids, Syntax::Default).unwrap();
                let again = Expression::parse_with(&c, &e.to_string(), ids, Syntax::Default).unwrap();
                assert_eq!(again, e, "{} printed as {}", text, e);
            }
        }
    }
}
