//! Map constructors and incremental folding of literal map updates.

use crate::build::c_atom;
use crate::literal::abstract_term;
use crate::node::{Expr, Map, MapPair, Node};
use crate::term::Term;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// The operator of a map pair: `K => V` inserts, `K := V` updates an
/// existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapOp {
    Assoc,
    Exact,
}

impl MapOp {
    pub fn as_str(self) -> &'static str {
        match self {
            MapOp::Assoc => "assoc",
            MapOp::Exact => "exact",
        }
    }

    pub fn from_term(term: &Term) -> Option<MapOp> {
        match term.as_atom()?.as_str() {
            "assoc" => Some(MapOp::Assoc),
            "exact" => Some(MapOp::Exact),
            _ => None,
        }
    }

    pub fn to_node(self) -> Node {
        c_atom(self.as_str())
    }
}

impl fmt::Display for MapOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn c_map_pair(op: Node, key: Node, val: Node) -> Node {
    Node::new(Expr::MapPair(MapPair { op, key, val }))
}

/// `key => val`
pub fn c_map_pair_assoc(key: Node, val: Node) -> Node {
    c_map_pair(MapOp::Assoc.to_node(), key, val)
}

/// `key := val`
pub fn c_map_pair_exact(key: Node, val: Node) -> Node {
    c_map_pair(MapOp::Exact.to_node(), key, val)
}

/// The operator of a map pair, if it is a literal `assoc` or `exact`.
pub fn map_op(pair: &MapPair) -> Option<MapOp> {
    pair.op.literal_value().and_then(MapOp::from_term)
}

pub(crate) fn empty_map() -> Node {
    abstract_term(Term::Map(BTreeMap::new()))
}

/// A map built from the empty map, folded as far as possible.
pub fn c_map(pairs: Vec<Node>) -> Node {
    c_map_update(empty_map(), pairs)
}

/// `base` updated by `pairs`.
///
/// When `base` is a literal map, leading pairs with literal operands are
/// applied to it at construction time. The result is a literal if every
/// pair folds; otherwise a map node over the literal folded so far and the
/// remaining pairs.
pub fn c_map_update(base: Node, pairs: Vec<Node>) -> Node {
    let Some(Term::Map(entries)) = base.literal_value() else {
        return c_map_skel(base, pairs);
    };
    match fold_map_pairs(entries.clone(), &pairs) {
        MapFold::Complete(folded) => abstract_term(Term::Map(folded)),
        MapFold::Partial { folded, rest } => {
            trace!(
                applied = pairs.len() - rest,
                remaining = rest,
                "map update only partially folded"
            );
            let start = pairs.len() - rest;
            let base = if start == 0 {
                base
            } else {
                abstract_term(Term::Map(folded))
            };
            c_map_skel(base, pairs[start..].to_vec())
        }
    }
}

/// A map node that is never folded.
pub fn c_map_skel(base: Node, pairs: Vec<Node>) -> Node {
    Node::new(Expr::Map(Map {
        base,
        pairs,
        is_pattern: false,
    }))
}

/// A map pattern. Patterns match against the empty base and are never
/// folded.
pub fn c_map_pattern(pairs: Vec<Node>) -> Node {
    c_map_pattern_with_base(empty_map(), pairs)
}

/// A map pattern over an explicit base, as rebuilt by a pass that rewrote
/// the base slot.
pub fn c_map_pattern_with_base(base: Node, pairs: Vec<Node>) -> Node {
    Node::new(Expr::Map(Map {
        base,
        pairs,
        is_pattern: true,
    }))
}

/// Outcome of applying map pairs to a literal map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapFold {
    /// Every pair was applied.
    Complete(BTreeMap<Term, Term>),
    /// Folding stopped with `rest` pairs left unapplied.
    Partial {
        folded: BTreeMap<Term, Term>,
        rest: usize,
    },
}

/// Applies `pairs` to `map` in order, stopping at the first pair that is
/// not a literal map pair or is an `exact` update of an absent key.
pub fn fold_map_pairs(mut map: BTreeMap<Term, Term>, pairs: &[Node]) -> MapFold {
    for (idx, pair) in pairs.iter().enumerate() {
        if !apply_pair(&mut map, pair) {
            return MapFold::Partial {
                folded: map,
                rest: pairs.len() - idx,
            };
        }
    }
    MapFold::Complete(map)
}

fn apply_pair(map: &mut BTreeMap<Term, Term>, pair: &Node) -> bool {
    let Expr::MapPair(pair) = pair.expr() else {
        return false;
    };
    let (Some(op), Some(key), Some(val)) = (
        map_op(pair),
        pair.key.literal_value(),
        pair.val.literal_value(),
    ) else {
        return false;
    };
    match op {
        MapOp::Assoc => {
            map.insert(key.clone(), val.clone());
            true
        }
        MapOp::Exact => match map.get_mut(key) {
            Some(slot) => {
                *slot = val.clone();
                true
            }
            None => false,
        },
    }
}

/// True if [`c_map_update`] would fold at least part of `pairs` into
/// `base`, i.e. it would not reproduce a map node with this exact base.
pub fn map_would_fold(base: &Node, pairs: &[Node]) -> bool {
    match base.literal_value() {
        Some(Term::Map(entries)) => match pairs.first() {
            None => true,
            Some(first) => apply_pair(&mut entries.clone(), first),
        },
        _ => false,
    }
}
