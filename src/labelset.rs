//! Labelsets: the alphabet models labelling transitions and expression atoms.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};

/// A label of some labelset.
///
/// A labelset admits only some of the variants: lettersets hold `Letter`s,
/// nullable sets add `One`, wordsets hold `One` and (non-empty) `Word`s, and
/// tuple labelsets hold `Tuple`s of their tapes' labels. `Special` labels only
/// the transitions from the pre-initial and to the post-final states.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    One,
    Letter(char),
    Word(String),
    Tuple(Vec<Label>),
    Special,
}

impl Label {
    fn rank(&self) -> u8 {
        match self {
            Label::One => 0,
            Label::Letter(_) => 1,
            Label::Word(_) => 2,
            Label::Tuple(_) => 3,
            Label::Special => 4,
        }
    }

    /// Whether this is the empty word, on every tape.
    pub fn is_one(&self) -> bool {
        match self {
            Label::One => true,
            Label::Tuple(tapes) => tapes.iter().all(Label::is_one),
            _ => false,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Label::Special)
    }

    /// Number of letters of the label; for tuples, of its longest tape.
    pub fn len(&self) -> usize {
        match self {
            Label::One | Label::Special => 0,
            Label::Letter(_) => 1,
            Label::Word(w) => w.chars().count(),
            Label::Tuple(tapes) => tapes.iter().map(Label::len).max().unwrap_or(0),
        }
    }

    /// The letters of a single-tape label.
    pub fn letters(&self) -> Vec<char> {
        match self {
            Label::Letter(c) => vec![*c],
            Label::Word(w) => w.chars().collect(),
            _ => Vec::new(),
        }
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Letter(a), Label::Letter(b)) => a.cmp(b),
            (Label::Word(a), Label::Word(b)) => a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)),
            (Label::Tuple(a), Label::Tuple(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::One => write!(f, "\\e"),
            Label::Letter(c) => write!(f, "{}", escape_letter(*c)),
            Label::Word(w) => {
                for c in w.chars() {
                    write!(f, "{}", escape_letter(c))?;
                }
                Ok(())
            }
            Label::Tuple(tapes) => {
                for (i, t) in tapes.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", t)?;
                }
                Ok(())
            }
            Label::Special => write!(f, "$"),
        }
    }
}

/// Characters that must be escaped with a backslash in the canonical syntaxes.
const SPECIAL_CHARS: &str = "\\()[]{}<>+*?&:%|.,'!^$# \"";

/// Render a letter for the canonical syntaxes: `\c` for operators, `\xHH` for
/// non-printable characters.
pub fn escape_letter(c: char) -> String {
    if SPECIAL_CHARS.contains(c) {
        format!("\\{}", c)
    } else if (c as u32) < 0x20 || (0x7f..=0xff).contains(&(c as u32)) {
        format!("\\x{:02x}", c as u32)
    } else {
        c.to_string()
    }
}

/// Decode the letters of `text`, resolving `\xHH` and `\c` escapes.
///
/// `\x00` and `\xff` are reserved for internal use and rejected.
pub fn unescape_letters(text: &str) -> Result<Vec<char>> {
    let mut res = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push(c);
            continue;
        }
        match chars.next() {
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                res.push(decode_hex_letter(&hex, text)?);
            }
            Some(e) => res.push(e),
            None => return Err(Error::bad_label(text, "trailing backslash")),
        }
    }
    Ok(res)
}

/// Decode the two hex digits following `\x`.
pub(crate) fn decode_hex_letter(hex: &str, label: &str) -> Result<char> {
    if hex.len() != 2 {
        return Err(Error::bad_label(label, "invalid escape"));
    }
    let code = u8::from_str_radix(hex, 16).map_err(|_| Error::bad_label(label, "invalid escape"))?;
    if code == 0x00 || code == 0xff {
        return Err(Error::bad_label(label, format!("reserved letter \\x{:02x}", code)));
    }
    Ok(char::from(code))
}

/// A set of letters, either closed or open (accepting any letter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Alphabet {
    letters: BTreeSet<char>,
    open: bool,
}

impl Alphabet {
    pub fn new(letters: impl IntoIterator<Item = char>) -> Self {
        Alphabet {
            letters: letters.into_iter().collect(),
            open: false,
        }
    }

    /// An alphabet accepting every letter, listing `letters` as its known ones.
    pub fn open(letters: impl IntoIterator<Item = char>) -> Self {
        Alphabet {
            letters: letters.into_iter().collect(),
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn contains(&self, c: char) -> bool {
        self.open || self.letters.contains(&c)
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.letters.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Whether every letter of `self` is accepted by `other`.
    pub fn is_subset(&self, other: &Alphabet) -> bool {
        other.open || (!self.open && self.letters.is_subset(&other.letters))
    }

    /// Parse the body of `char_letters(...)` or `[...]`: letters, ranges
    /// `a-z`, escapes, and a trailing `...` for an open alphabet.
    pub fn parse(text: &str) -> Result<Alphabet> {
        let (body, open) = match text.strip_suffix("...") {
            Some(body) => (body, true),
            None => (text, false),
        };
        let chars = unescape_spans(body)?;
        let mut letters = BTreeSet::new();
        let mut i = 0;
        while i < chars.len() {
            let (c, _) = chars[i];
            if i + 2 < chars.len() && chars[i + 1] == ('-', false) {
                let (end, _) = chars[i + 2];
                if end < c {
                    return Err(Error::syntax(0..text.len(), format!("invalid letter range: {}-{}", c, end)));
                }
                letters.extend(c..=end);
                i += 3;
            } else {
                letters.insert(c);
                i += 1;
            }
        }
        Ok(Alphabet { letters, open })
    }
}

/// Letters of `text` with a flag telling whether each was escaped.
fn unescape_spans(text: &str) -> Result<Vec<(char, bool)>> {
    let mut res = Vec::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push((c, false));
            continue;
        }
        match chars.next() {
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                res.push((decode_hex_letter(&hex, text)?, true));
            }
            Some(e) => res.push((e, true)),
            None => return Err(Error::bad_label(text, "trailing backslash")),
        }
    }
    Ok(res)
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.letters {
            match c {
                '(' | ')' | '-' | ',' | '\\' | '[' | ']' | '<' | '>' | '.' => write!(f, "\\{}", c)?,
                c if (*c as u32) < 0x20 || (0x7f..=0xff).contains(&(*c as u32)) => {
                    write!(f, "\\x{:02x}", *c as u32)?
                }
                c => write!(f, "{}", c)?,
            }
        }
        if self.open {
            write!(f, "...")?;
        }
        Ok(())
    }
}

/// The runtime selection of a labelset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelSet {
    /// Single letters.
    Letters(Alphabet),
    /// Single letters or the empty word.
    Nullable(Alphabet),
    /// Words over the alphabet, including the empty word.
    Words(Alphabet),
    /// One sub-labelset per tape.
    Tuple(Vec<LabelSet>),
}

impl LabelSet {
    /// Whether the empty word is a label.
    pub fn has_one(&self) -> bool {
        match self {
            LabelSet::Letters(_) => false,
            LabelSet::Nullable(_) | LabelSet::Words(_) => true,
            LabelSet::Tuple(tapes) => tapes.iter().all(LabelSet::has_one),
        }
    }

    /// Whether labels are exactly the letters (of each tape).
    pub fn is_free(&self) -> bool {
        match self {
            LabelSet::Letters(_) => true,
            LabelSet::Tuple(tapes) => tapes.iter().all(|t| matches!(t, LabelSet::Letters(_))),
            _ => false,
        }
    }

    /// Whether labels are at most one letter long (per tape).
    pub fn is_letterized(&self) -> bool {
        match self {
            LabelSet::Letters(_) | LabelSet::Nullable(_) => true,
            LabelSet::Words(_) => false,
            LabelSet::Tuple(tapes) => tapes.iter().all(LabelSet::is_letterized),
        }
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, LabelSet::Tuple(_))
    }

    pub fn is_wordset(&self) -> bool {
        matches!(self, LabelSet::Words(_))
    }

    /// Number of tapes: 1 unless a tuple.
    pub fn num_tapes(&self) -> usize {
        match self {
            LabelSet::Tuple(tapes) => tapes.len(),
            _ => 1,
        }
    }

    /// The empty word of this labelset (meaningful when [`has_one`](Self::has_one)).
    pub fn one(&self) -> Label {
        match self {
            LabelSet::Tuple(tapes) => Label::Tuple(tapes.iter().map(LabelSet::one).collect()),
            _ => Label::One,
        }
    }

    /// The label for letter `c` (a one-letter word in wordsets).
    pub fn letter(&self, c: char) -> Label {
        match self {
            LabelSet::Words(_) => Label::Word(c.to_string()),
            _ => Label::Letter(c),
        }
    }

    /// Build a label from a sequence of letters: `One` when empty.
    pub fn word(&self, letters: &[char]) -> Result<Label> {
        match (self, letters.len()) {
            (LabelSet::Tuple(_), _) => Err(Error::bad_label(letters.iter().collect::<String>(), "not a tuple")),
            (_, 0) if self.has_one() => Ok(Label::One),
            (_, 0) => Err(Error::bad_label("\\e", format!("{} has no empty word", self))),
            (LabelSet::Words(_), _) => Ok(Label::Word(letters.iter().collect())),
            (_, 1) => Ok(Label::Letter(letters[0])),
            _ => Err(Error::bad_label(
                letters.iter().collect::<String>(),
                "labelset does not support words",
            )),
        }
    }

    /// Whether `label` is a valid label of this labelset.
    pub fn contains(&self, label: &Label) -> bool {
        match (self, label) {
            (LabelSet::Letters(a), Label::Letter(c)) | (LabelSet::Nullable(a), Label::Letter(c)) => a.contains(*c),
            (LabelSet::Nullable(_), Label::One) | (LabelSet::Words(_), Label::One) => true,
            (LabelSet::Words(a), Label::Word(w)) => !w.is_empty() && w.chars().all(|c| a.contains(c)),
            (LabelSet::Tuple(tapes), Label::Tuple(ls)) => {
                tapes.len() == ls.len() && tapes.iter().zip(ls).all(|(t, l)| t.contains(l))
            }
            _ => false,
        }
    }

    /// Check `label` belongs to this labelset.
    pub fn check(&self, label: &Label) -> Result<()> {
        if self.contains(label) {
            Ok(())
        } else {
            Err(Error::bad_label(label.to_string(), format!("not a label of {}", self)))
        }
    }

    /// The generators of a free labelset with a closed alphabet.
    pub fn generators(&self) -> Option<Vec<Label>> {
        match self {
            LabelSet::Letters(a) if !a.is_open() => Some(a.letters().map(Label::Letter).collect()),
            LabelSet::Tuple(tapes) => {
                let mut res = vec![Vec::new()];
                for tape in tapes {
                    let gens = match tape {
                        LabelSet::Letters(a) if !a.is_open() => a.letters().map(Label::Letter).collect::<Vec<_>>(),
                        _ => return None,
                    };
                    res = res
                        .into_iter()
                        .flat_map(|prefix: Vec<Label>| {
                            gens.iter().map(move |g| {
                                let mut v = prefix.clone();
                                v.push(g.clone());
                                v
                            })
                        })
                        .collect();
                }
                Some(res.into_iter().map(Label::Tuple).collect())
            }
            _ => None,
        }
    }

    /// Concatenate two labels.
    pub fn mul(&self, lhs: &Label, rhs: &Label) -> Result<Label> {
        match (self, lhs, rhs) {
            (LabelSet::Tuple(tapes), Label::Tuple(ls), Label::Tuple(rs)) => Ok(Label::Tuple(
                tapes
                    .iter()
                    .zip(ls.iter().zip(rs))
                    .map(|(t, (l, r))| t.mul(l, r))
                    .collect::<Result<_>>()?,
            )),
            (_, Label::One, r) => Ok(r.clone()),
            (_, l, Label::One) => Ok(l.clone()),
            (LabelSet::Words(_), l, r) => {
                let mut w = l.letters();
                w.extend(r.letters());
                Ok(Label::Word(w.into_iter().collect()))
            }
            _ => Err(Error::incompatible(
                "a labelset with words",
                format!("{} (cannot concatenate {} and {})", self, lhs, rhs),
            )),
        }
    }

    /// Mirror a label.
    pub fn transpose(&self, label: &Label) -> Label {
        match label {
            Label::Word(w) => Label::Word(w.chars().rev().collect()),
            Label::Tuple(ls) => Label::Tuple(ls.iter().map(|l| self.transpose(l)).collect()),
            other => other.clone(),
        }
    }

    /// Parse a label: `\e`, a letter or word (with escapes), or `l1|l2|...`
    /// for tuples.
    pub fn parse_label(&self, text: &str) -> Result<Label> {
        let text = text.trim();
        let label = match self {
            LabelSet::Tuple(tapes) => {
                let parts = split_tapes(text);
                if parts.len() != tapes.len() {
                    return Err(Error::bad_label(
                        text,
                        format!("expected {} tapes, got {}", tapes.len(), parts.len()),
                    ));
                }
                Label::Tuple(
                    tapes
                        .iter()
                        .zip(parts)
                        .map(|(t, p)| t.parse_label(p))
                        .collect::<Result<_>>()?,
                )
            }
            _ if text == "\\e" || text == "ε" => self.word(&[])?,
            _ => {
                let letters = unescape_letters(text)?;
                if letters.is_empty() {
                    return Err(Error::bad_label(text, "empty label"));
                }
                self.word(&letters).map_err(|_| Error::bad_label(text, format!("not a label of {}", self)))?
            }
        };
        self.check(&label)?;
        Ok(label)
    }

    /// The labelset of automata without spontaneous transitions.
    ///
    /// Tuples are unchanged: a proper multi-tape automaton may still read
    /// nothing on some of its tapes.
    pub fn proper(&self) -> LabelSet {
        match self {
            LabelSet::Nullable(a) => LabelSet::Letters(a.clone()),
            other => other.clone(),
        }
    }

    /// The labelset with the empty word added (per tape).
    pub fn nullable(&self) -> LabelSet {
        match self {
            LabelSet::Letters(a) => LabelSet::Nullable(a.clone()),
            LabelSet::Tuple(tapes) => LabelSet::Tuple(tapes.iter().map(LabelSet::nullable).collect()),
            other => other.clone(),
        }
    }

    /// The wordset over the same letters (per tape).
    pub fn words(&self) -> LabelSet {
        match self {
            LabelSet::Letters(a) | LabelSet::Nullable(a) => LabelSet::Words(a.clone()),
            LabelSet::Tuple(tapes) => LabelSet::Tuple(tapes.iter().map(LabelSet::words).collect()),
            other => other.clone(),
        }
    }

    /// Whether labels of `self` are labels of `other` unchanged (up to the
    /// letter/word representation).
    pub fn embeds_into(&self, other: &LabelSet) -> bool {
        match (self, other) {
            (LabelSet::Letters(a), LabelSet::Letters(b))
            | (LabelSet::Letters(a), LabelSet::Nullable(b))
            | (LabelSet::Nullable(a), LabelSet::Nullable(b))
            | (LabelSet::Letters(a), LabelSet::Words(b))
            | (LabelSet::Nullable(a), LabelSet::Words(b))
            | (LabelSet::Words(a), LabelSet::Words(b)) => a.is_subset(b),
            (LabelSet::Tuple(ls), LabelSet::Tuple(rs)) => {
                ls.len() == rs.len() && ls.iter().zip(rs).all(|(l, r)| l.embeds_into(r))
            }
            _ => false,
        }
    }

    /// Convert `label` of `from` into this labelset.
    pub fn convert(&self, from: &LabelSet, label: &Label) -> Result<Label> {
        let res = match (self, from, label) {
            (LabelSet::Tuple(tapes), LabelSet::Tuple(froms), Label::Tuple(ls)) => Label::Tuple(
                tapes
                    .iter()
                    .zip(froms.iter().zip(ls))
                    .map(|(t, (f, l))| t.convert(f, l))
                    .collect::<Result<_>>()?,
            ),
            (_, _, Label::One) => self.word(&[])?,
            (_, _, Label::Letter(_)) | (_, _, Label::Word(_)) => self.word(&label.letters())?,
            (_, _, Label::Special) => return Ok(Label::Special),
            _ => return Err(Error::incompatible(self, from)),
        };
        self.check(&res)?;
        Ok(res)
    }
}

/// Split `a|b|c` on unescaped bars, outside quotes.
pub(crate) fn split_tapes(text: &str) -> Vec<&str> {
    let mut res = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '|' {
            res.push(&text[start..i]);
            start = i + 1;
        }
    }
    res.push(&text[start..]);
    res
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSet::Letters(a) => write!(f, "letterset<char_letters({})>", a),
            LabelSet::Nullable(a) => write!(f, "nullableset<letterset<char_letters({})>>", a),
            LabelSet::Words(a) => write!(f, "wordset<char_letters({})>", a),
            LabelSet::Tuple(tapes) => {
                write!(f, "lat<")?;
                for (i, t) in tapes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ">")
            }
        }
    }
}
