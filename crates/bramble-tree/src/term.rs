//! Host values wrapped by literal nodes.

use serde::{Deserialize, Serialize};
use serde_json_any_key::any_key_map;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// An interned-by-value atom (symbol).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Atom(String);

impl Atom {
    pub fn new(name: impl Into<String>) -> Self {
        Atom(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::new(value)
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom(value)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sequence of bits. `bit_len` may be shorter than `bytes.len() * 8`;
/// trailing bits of the last byte are zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BitString {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitString {
    /// A whole-byte binary.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let bit_len = bytes.len() * 8;
        BitString { bytes, bit_len }
    }

    /// Takes the first `bit_len` bits of `bytes`, or `None` if `bytes` is too short.
    pub fn from_bits(mut bytes: Vec<u8>, bit_len: usize) -> Option<Self> {
        let needed = bit_len.div_ceil(8);
        if bytes.len() < needed {
            return None;
        }
        bytes.truncate(needed);
        let rem = bit_len % 8;
        if rem != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xffu8 << (8 - rem);
            }
        }
        Some(BitString { bytes, bit_len })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn is_binary(&self) -> bool {
        self.bit_len % 8 == 0
    }

    /// True if `bytes` holds exactly `bit_len` bits with the unused trailing
    /// bits cleared, as [`BitString::from_bits`] leaves them.
    pub fn is_canonical(&self) -> bool {
        if self.bytes.len() != self.bit_len.div_ceil(8) {
            return false;
        }
        let rem = self.bit_len % 8;
        rem == 0 || self.bytes.last().is_some_and(|last| last & (0xffu8 >> rem) == 0)
    }
}

/// Runtime objects that exist as host values but can never be literals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Handle {
    Reference(u64),
    Port(u64),
    Pid(u64),
    /// An anonymous closure; only named, exported functions are literal.
    Closure { id: u64, arity: u32 },
}

/// A host value.
///
/// Lists come in two shapes: `List` is a proper list (the empty `List` is
/// nil) and `Improper` is a non-empty prefix ending in a non-list tail. Use
/// [`Term::cons`] to build lists cell by cell; it keeps the shapes canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Term {
    Integer(i64),
    Float(f64),
    Atom(Atom),
    List(Vec<Term>),
    Improper(Vec<Term>, Box<Term>),
    Tuple(Vec<Term>),
    Map(#[serde(with = "any_key_map")] BTreeMap<Term, Term>),
    Bits(BitString),
    Fun { module: Atom, name: Atom, arity: u32 },
    Handle(Handle),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(Atom::new(name))
    }

    pub fn nil() -> Self {
        Term::List(Vec::new())
    }

    /// A string as a list of character codes.
    pub fn string(s: &str) -> Self {
        Term::List(s.chars().map(|c| Term::Integer(c as i64)).collect())
    }

    pub fn map(pairs: impl IntoIterator<Item = (Term, Term)>) -> Self {
        Term::Map(pairs.into_iter().collect())
    }

    /// Builds `[head | tail]`. Linear in the length of `tail`.
    pub fn cons(head: Term, tail: Term) -> Self {
        match tail {
            Term::List(mut items) => {
                items.insert(0, head);
                Term::List(items)
            }
            Term::Improper(mut items, rest) => {
                items.insert(0, head);
                Term::Improper(items, rest)
            }
            other => Term::Improper(vec![head], Box::new(other)),
        }
    }

    /// Builds `[e1, .., en | tail]` in one pass.
    pub fn list_with_tail(mut items: Vec<Term>, tail: Term) -> Self {
        match tail {
            Term::List(rest) => {
                items.extend(rest);
                Term::List(items)
            }
            Term::Improper(rest, end) => {
                items.extend(rest);
                Term::Improper(items, end)
            }
            other if items.is_empty() => other,
            other => Term::Improper(items, Box::new(other)),
        }
    }

    /// True if every list is in normal form (an `Improper` prefix is
    /// non-empty and ends in a non-list) and every bit string is canonical.
    /// Terms built through [`Term::cons`] and [`Term::list_with_tail`]
    /// always are; deserialized ones may not be.
    pub fn is_canonical(&self) -> bool {
        match self {
            Term::List(items) | Term::Tuple(items) => items.iter().all(Term::is_canonical),
            Term::Improper(items, tail) => {
                !items.is_empty()
                    && !matches!(**tail, Term::List(_) | Term::Improper(..))
                    && items.iter().all(Term::is_canonical)
                    && tail.is_canonical()
            }
            Term::Map(entries) => entries
                .iter()
                .all(|(k, v)| k.is_canonical() && v.is_canonical()),
            Term::Bits(bits) => bits.is_canonical(),
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::List(items) if items.is_empty())
    }

    /// Splits a non-empty list into head and tail. The tail is a copy, so
    /// walking a whole list this way is quadratic.
    pub fn split_first(&self) -> Option<(Term, Term)> {
        match self {
            Term::List(items) => {
                let (head, rest) = items.split_first()?;
                Some((head.clone(), Term::List(rest.to_vec())))
            }
            Term::Improper(items, tail) => {
                let (head, rest) = items.split_first()?;
                Some((head.clone(), Term::list_with_tail(rest.to_vec(), (**tail).clone())))
            }
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Term::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Elements of a proper list.
    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Term::Integer(_) | Term::Float(_) => 0,
            Term::Atom(_) => 1,
            Term::Handle(Handle::Reference(_)) => 2,
            Term::Fun { .. } | Term::Handle(Handle::Closure { .. }) => 3,
            Term::Handle(Handle::Port(_)) => 4,
            Term::Handle(Handle::Pid(_)) => 5,
            Term::Tuple(_) => 6,
            Term::Map(_) => 7,
            Term::List(_) | Term::Improper(..) => 8,
            Term::Bits(_) => 9,
        }
    }
}

fn cmp_numbers(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Integer(x), Term::Integer(y)) => x.cmp(y),
        (Term::Float(x), Term::Float(y)) => x.total_cmp(y),
        // Integers sort before floats of equal value.
        (Term::Integer(x), Term::Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Less),
        (Term::Float(x), Term::Integer(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Greater),
        _ => Ordering::Equal,
    }
}

fn list_parts(term: &Term) -> (&[Term], Option<&Term>) {
    match term {
        Term::List(items) => (items, None),
        Term::Improper(items, tail) => (items, Some(tail)),
        _ => (&[], None),
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a.cmp(b),
            (Term::Tuple(a), Term::Tuple(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Term::Map(a), Term::Map(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Term::Bits(a), Term::Bits(b)) => a.cmp(b),
            (Term::Handle(a), Term::Handle(b)) => a.cmp(b),
            (
                Term::Fun { module, name, arity },
                Term::Fun { module: m2, name: n2, arity: a2 },
            ) => (module, name, arity).cmp(&(m2, n2, a2)),
            (Term::Fun { .. }, Term::Handle(_)) => Ordering::Less,
            (Term::Handle(_), Term::Fun { .. }) => Ordering::Greater,
            (Term::List(_) | Term::Improper(..), Term::List(_) | Term::Improper(..)) => {
                let (xs, xt) = list_parts(self);
                let (ys, yt) = list_parts(other);
                for (x, y) in xs.iter().zip(ys) {
                    let ord = x.cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                match xs.len().cmp(&ys.len()) {
                    Ordering::Equal => xt.cmp(&yt),
                    // The shorter prefix continues with its tail; a proper
                    // list ends there and sorts first.
                    Ordering::Less => match xt {
                        None => Ordering::Less,
                        Some(tail) => tail.cmp(&ys[xs.len()]),
                    },
                    Ordering::Greater => match yt {
                        None => Ordering::Greater,
                        Some(tail) => xs[ys.len()].cmp(tail),
                    },
                }
            }
            _ => cmp_numbers(self, other),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Integer(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Integer(value as i64)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<Atom> for Term {
    fn from(value: Atom) -> Self {
        Term::Atom(value)
    }
}

impl From<Vec<Term>> for Term {
    fn from(value: Vec<Term>) -> Self {
        Term::List(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }
        match self {
            Term::Integer(n) => write!(f, "{}", n),
            Term::Float(x) => write!(f, "{:?}", x),
            Term::Atom(a) => write!(f, "{}", a),
            Term::List(items) => {
                f.write_str("[")?;
                seq(f, items)?;
                f.write_str("]")
            }
            Term::Improper(items, tail) => {
                f.write_str("[")?;
                seq(f, items)?;
                write!(f, "|{}]", tail)
            }
            Term::Tuple(items) => {
                f.write_str("{")?;
                seq(f, items)?;
                f.write_str("}")
            }
            Term::Map(map) => {
                f.write_str("#{")?;
                for (idx, (k, v)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}=>{}", k, v)?;
                }
                f.write_str("}")
            }
            Term::Bits(bits) => write!(f, "<<{} bits>>", bits.bit_len()),
            Term::Fun { module, name, arity } => write!(f, "fun {}:{}/{}", module, name, arity),
            Term::Handle(handle) => write!(f, "{:?}", handle),
        }
    }
}
