//! Literal normalization: folded vs. skeleton aggregates.
//!
//! A cons cell or tuple whose children are all literals is normally
//! collapsed into a single literal node. The `_skel` constructors keep the
//! composite shape instead, so each child can carry its own annotations.
//! [`fold_literal`] and [`unfold_literal`] convert between the two forms.

use crate::error::TreeError;
use crate::node::{Cons, Expr, Literal, Node, NodeType, Tuple, copy_ann};
use crate::term::Term;

/// Wraps a host value as a literal node. The value is not validated; gate
/// untrusted values with [`is_literal_term`].
pub fn abstract_term(value: Term) -> Node {
    Node::new(Expr::Literal(Literal { value }))
}

/// The value of a literal node.
pub fn concrete(node: &Node) -> Result<&Term, TreeError> {
    Ok(&node.as_literal()?.value)
}

/// True if `term` can be represented by a literal node.
///
/// Handles and closures cannot; neither can non-finite floats.
pub fn is_literal_term(term: &Term) -> bool {
    match term {
        Term::Integer(_) | Term::Atom(_) | Term::Bits(_) | Term::Fun { .. } => true,
        Term::Float(x) => x.is_finite(),
        Term::List(items) | Term::Tuple(items) => items.iter().all(is_literal_term),
        Term::Improper(items, tail) => items.iter().all(is_literal_term) && is_literal_term(tail),
        Term::Map(entries) => entries
            .iter()
            .all(|(k, v)| is_literal_term(k) && is_literal_term(v)),
        Term::Handle(_) => false,
    }
}

/// `[hd | tl]`, collapsed to a literal when both parts are literals.
///
/// A literal tail not shared with any other tree is reused rather than
/// copied. Prepending still shifts its elements, so growing a literal list
/// one cell at a time is quadratic; [`make_list`](crate::make_list) and
/// [`fold_literal`] collapse whole runs at once.
pub fn c_cons(hd: Node, tl: Node) -> Node {
    let Some(head) = hd.literal_value().cloned() else {
        return c_cons_skel(hd, tl);
    };
    match tl.into_literal() {
        Ok(tail) => abstract_term(Term::cons(head, tail)),
        Err(tl) => c_cons_skel(hd, tl),
    }
}

/// `[hd | tl]` as a cons node, never collapsed.
pub fn c_cons_skel(hd: Node, tl: Node) -> Node {
    Node::new(Expr::Cons(Cons { hd, tl }))
}

/// A tuple, collapsed to a literal when every element is a literal.
pub fn c_tuple(es: Vec<Node>) -> Node {
    let values: Option<Vec<Term>> = es.iter().map(|e| e.literal_value().cloned()).collect();
    match values {
        Some(values) => abstract_term(Term::Tuple(values)),
        None => c_tuple_skel(es),
    }
}

/// A tuple node, never collapsed.
pub fn c_tuple_skel(es: Vec<Node>) -> Node {
    Node::new(Expr::Tuple(Tuple { es }))
}

/// Collapses cons and tuple skeletons bottom-up. Other kinds, including
/// the children of other kinds, are left alone.
pub fn fold_literal(node: &Node) -> Node {
    match node.expr() {
        Expr::Tuple(tuple) => {
            let es = tuple.es.iter().map(fold_literal).collect();
            copy_ann(node, c_tuple(es))
        }
        Expr::Cons(_) => fold_cons_spine(node),
        _ => node.clone(),
    }
}

fn fold_cons_spine(node: &Node) -> Node {
    let mut cells = Vec::new();
    let mut current = node.clone();
    while let Expr::Cons(cons) = current.expr() {
        let cell = (fold_literal(&cons.hd), current.ann().to_vec());
        let next = cons.tl.clone();
        cells.push(cell);
        current = next;
    }

    let mut acc = fold_literal(&current);
    // Literal heads in front of a literal tail collapse in one step; each
    // pending run keeps the annotations of its outermost cell.
    let mut run: Vec<Term> = Vec::new();
    let mut run_ann = Vec::new();
    for (hd, ann) in cells.into_iter().rev() {
        let extends_run = acc.is_literal() || !run.is_empty();
        match hd.literal_value() {
            Some(value) if extends_run => {
                run.push(value.clone());
                run_ann = ann;
            }
            _ => {
                acc = flush_run(acc, &mut run, std::mem::take(&mut run_ann));
                acc = c_cons(hd, acc).with_ann(ann);
            }
        }
    }
    flush_run(acc, &mut run, run_ann)
}

fn flush_run(acc: Node, run: &mut Vec<Term>, ann: Vec<Term>) -> Node {
    if run.is_empty() {
        return acc;
    }
    let end = acc.literal_value().cloned().unwrap_or_else(Term::nil);
    let mut items = std::mem::take(run);
    items.reverse();
    abstract_term(Term::list_with_tail(items, end)).with_ann(ann)
}

/// Expands a literal tuple or non-empty list into skeleton form, down to
/// atomic leaves. Only the new top node receives the literal's annotations.
pub fn unfold_literal(node: &Node) -> Node {
    match node.literal_value() {
        Some(value @ (Term::Tuple(_) | Term::List(_) | Term::Improper(..))) if !value.is_nil() => {
            copy_ann(node, unfold_concrete(value))
        }
        _ => node.clone(),
    }
}

fn unfold_concrete(value: &Term) -> Node {
    match value {
        Term::Tuple(items) => c_tuple_skel(items.iter().map(unfold_concrete).collect()),
        Term::List(items) if !items.is_empty() => unfold_list(items, &Term::nil()),
        Term::Improper(items, tail) => unfold_list(items, tail),
        other => abstract_term(other.clone()),
    }
}

fn unfold_list(items: &[Term], tail: &Term) -> Node {
    let mut acc = unfold_concrete(tail);
    for item in items.iter().rev() {
        acc = c_cons_skel(unfold_concrete(item), acc);
    }
    acc
}

/// The shape of a data node: an atomic literal, a cons cell or a tuple,
/// regardless of whether it is stored folded or as a skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Atomic(Term),
    Cons,
    Tuple,
}

/// True for literals and for cons/tuple skeletons.
pub fn is_data(node: &Node) -> bool {
    matches!(node.kind(), NodeType::Literal | NodeType::Cons | NodeType::Tuple)
}

pub fn data_type(node: &Node) -> Result<Data, TreeError> {
    match node.expr() {
        Expr::Literal(lit) => Ok(match &lit.value {
            Term::Tuple(_) => Data::Tuple,
            Term::List(items) if !items.is_empty() => Data::Cons,
            Term::Improper(..) => Data::Cons,
            other => Data::Atomic(other.clone()),
        }),
        Expr::Cons(_) => Ok(Data::Cons),
        Expr::Tuple(_) => Ok(Data::Tuple),
        other => Err(TreeError::WrongKind {
            expected: NodeType::Literal,
            found: other.kind(),
        }),
    }
}

/// The immediate parts of a data node: `[hd, tl]` for cons, the elements
/// for tuples, nothing for atomic literals.
pub fn data_es(node: &Node) -> Result<Vec<Node>, TreeError> {
    match node.expr() {
        Expr::Literal(lit) => Ok(match &lit.value {
            Term::Tuple(items) => items.iter().cloned().map(abstract_term).collect(),
            list @ (Term::List(_) | Term::Improper(..)) => match list.split_first() {
                Some((hd, tl)) => vec![abstract_term(hd), abstract_term(tl)],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }),
        Expr::Cons(cons) => Ok(vec![cons.hd.clone(), cons.tl.clone()]),
        Expr::Tuple(tuple) => Ok(tuple.es.clone()),
        other => Err(TreeError::WrongKind {
            expected: NodeType::Literal,
            found: other.kind(),
        }),
    }
}

pub fn data_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(match data_type(node)? {
        Data::Atomic(_) => 0,
        Data::Cons => 2,
        Data::Tuple => data_es(node)?.len(),
    })
}

/// Rebuilds a data node from its shape and parts, folding literals.
pub fn make_data(data: Data, es: Vec<Node>) -> Result<Node, TreeError> {
    build_data(data, es, c_cons, c_tuple)
}

/// Like [`make_data`], but never folds.
pub fn make_data_skel(data: Data, es: Vec<Node>) -> Result<Node, TreeError> {
    build_data(data, es, c_cons_skel, c_tuple_skel)
}

fn build_data(
    data: Data,
    es: Vec<Node>,
    cons: fn(Node, Node) -> Node,
    tuple: fn(Vec<Node>) -> Node,
) -> Result<Node, TreeError> {
    match data {
        Data::Atomic(value) if es.is_empty() => Ok(abstract_term(value)),
        Data::Atomic(_) => Err(TreeError::MalformedSlots {
            kind: NodeType::Literal,
            found: vec![es.len()],
        }),
        Data::Cons => match <[Node; 2]>::try_from(es) {
            Ok([hd, tl]) => Ok(cons(hd, tl)),
            Err(es) => Err(TreeError::MalformedSlots {
                kind: NodeType::Cons,
                found: vec![es.len()],
            }),
        },
        Data::Tuple => Ok(tuple(es)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{c_atom, c_int, c_var};

    fn int_list(values: &[i64]) -> Term {
        Term::List(values.iter().map(|v| Term::Integer(*v)).collect())
    }

    #[test]
    fn test_cons_folds_unless_skeleton() {
        let skel = c_cons_skel(c_int(1), abstract_term(int_list(&[2])));
        assert_eq!(skel.kind(), NodeType::Cons);

        let folded = c_cons(c_int(1), abstract_term(int_list(&[2])));
        assert_eq!(folded, abstract_term(int_list(&[1, 2])));
        assert_eq!(fold_literal(&skel), folded);
    }

    #[test]
    fn test_cons_leaves_shared_tails_intact() {
        let tail = abstract_term(int_list(&[2, 3]));
        let shared = c_cons(c_int(1), tail.clone());
        assert_eq!(concrete(&tail).unwrap(), &int_list(&[2, 3]));
        assert_eq!(concrete(&shared).unwrap(), &int_list(&[1, 2, 3]));

        let annotated = tail.with_ann(vec![Term::atom("a")]);
        let owned = c_cons(c_int(0), annotated);
        assert_eq!(owned, abstract_term(int_list(&[0, 2, 3])));
        assert_eq!(concrete(&shared).unwrap(), &int_list(&[1, 2, 3]));
    }

    #[test]
    fn test_cons_of_two_atoms_is_improper() {
        let folded = c_cons(c_int(1), c_int(2));
        assert_eq!(
            concrete(&folded).unwrap(),
            &Term::Improper(vec![Term::Integer(1)], Box::new(Term::Integer(2)))
        );
    }

    #[test]
    fn test_tuple_folding() {
        let folded = c_tuple(vec![c_atom("a"), c_int(1)]);
        assert!(folded.is_literal());
        let open = c_tuple(vec![c_atom("a"), c_var("X")]);
        assert_eq!(open.kind(), NodeType::Tuple);
        let skel = c_tuple_skel(vec![c_atom("a"), c_int(1)]);
        assert_eq!(skel.kind(), NodeType::Tuple);
        assert_eq!(fold_literal(&skel), folded);
    }

    #[test]
    fn test_fold_unfold_roundtrip() {
        let value = Term::Tuple(vec![Term::atom("a"), int_list(&[1, 2, 3])]);
        let unfolded = unfold_literal(&abstract_term(value.clone()));
        assert_eq!(unfolded.kind(), NodeType::Tuple);
        let es = &unfolded.as_tuple().unwrap().es;
        assert_eq!(es[1].kind(), NodeType::Cons);

        let folded = fold_literal(&unfolded);
        assert_eq!(concrete(&folded).unwrap(), &value);
    }

    #[test]
    fn test_unfold_copies_annotations_to_top_only() {
        let lit = abstract_term(int_list(&[1, 2])).with_ann(vec![Term::atom("line")]);
        let unfolded = unfold_literal(&lit);
        assert_eq!(unfolded.ann(), &[Term::atom("line")]);
        let cons = unfolded.as_cons().unwrap();
        assert!(cons.hd.ann().is_empty());
        assert!(cons.tl.ann().is_empty());
    }

    #[test]
    fn test_unfold_is_noop_on_atomic_and_nil() {
        let atom = c_atom("x");
        assert_eq!(unfold_literal(&atom), atom);
        let nil = abstract_term(Term::nil());
        assert_eq!(unfold_literal(&nil), nil);
        let var = c_var("X");
        assert_eq!(unfold_literal(&var), var);
    }

    #[test]
    fn test_fold_keeps_non_literal_parts() {
        let node = c_cons_skel(
            c_int(1),
            c_cons_skel(c_var("X"), c_cons_skel(c_int(2), abstract_term(Term::nil()))),
        );
        let folded = fold_literal(&node);
        let outer = folded.as_cons().unwrap();
        assert_eq!(outer.hd, c_int(1));
        let inner = outer.tl.as_cons().unwrap();
        assert_eq!(inner.hd, c_var("X"));
        assert_eq!(inner.tl, abstract_term(int_list(&[2])));
    }

    #[test]
    fn test_fold_long_list_iteratively() {
        let values: Vec<i64> = (0..50_000).collect();
        let unfolded = unfold_literal(&abstract_term(int_list(&values)));
        let folded = fold_literal(&unfolded);
        assert_eq!(concrete(&folded).unwrap(), &int_list(&values));
    }

    #[test]
    fn test_is_literal_term() {
        assert!(is_literal_term(&Term::Tuple(vec![Term::atom("ok"), Term::from(1.5)])));
        assert!(is_literal_term(&Term::Fun {
            module: "lists".into(),
            name: "map".into(),
            arity: 2,
        }));
        assert!(!is_literal_term(&Term::List(vec![Term::Handle(
            crate::term::Handle::Pid(7)
        )])));
        assert!(!is_literal_term(&Term::Handle(crate::term::Handle::Closure {
            id: 1,
            arity: 0,
        })));
        assert!(!is_literal_term(&Term::Float(f64::NAN)));
    }

    #[test]
    fn test_concrete_rejects_non_literal() {
        assert!(concrete(&c_var("X")).is_err());
    }

    #[test]
    fn test_data_views() {
        let lit = abstract_term(int_list(&[1, 2]));
        assert_eq!(data_type(&lit).unwrap(), Data::Cons);
        let es = data_es(&lit).unwrap();
        assert_eq!(es, vec![c_int(1), abstract_term(int_list(&[2]))]);
        assert_eq!(make_data(Data::Cons, es.clone()).unwrap(), lit);
        assert_eq!(make_data_skel(Data::Cons, es).unwrap().kind(), NodeType::Cons);
        assert_eq!(data_arity(&c_atom("a")).unwrap(), 0);
        assert!(make_data(Data::Cons, vec![c_int(1)]).is_err());
        assert!(data_type(&c_var("X")).is_err());
    }
}
