//! Generic traversal: decomposing any node into slots of children and
//! rebuilding it from them.
//!
//! Passes that only need to visit or rewrite children can be written once
//! against [`subtrees`] and [`update_tree`] instead of matching every kind.
//!
//! Slot layout per kind:
//!
//! | kind | slots |
//! |---|---|
//! | values, tuple | `[es..]` |
//! | binary | `[segments..]` |
//! | bitstr | `[val] [size] [unit] [type] [flags]` |
//! | cons | `[hd] [tl]` |
//! | map | `[base] [pairs..]` |
//! | map_pair | `[op] [key] [val]` |
//! | let | `[vars..] [arg] [body]` |
//! | seq | `[arg] [body]` |
//! | apply | `[op] [args..]` |
//! | call | `[module] [name] [args..]` |
//! | primop | `[name] [args..]` |
//! | case | `[arg] [clauses..]` |
//! | clause | `[pats..] [guard] [body]` |
//! | alias | `[var] [pat]` |
//! | fun | `[vars..] [body]` |
//! | receive | `[clauses..] [timeout] [action]` |
//! | try | `[arg] [vars..] [body] [evars..] [handler]` |
//! | catch | `[body]` |
//! | letrec | `[name1 fun1 name2 fun2 ..] [body]` |
//! | module | `[name] [exports..] [key1 val1 ..] [name1 fun1 ..]` |

use crate::build::{
    c_alias, c_apply, c_binary, c_bitstr, c_call, c_case, c_catch, c_clause, c_fun, c_let,
    c_letrec, c_module, c_primop, c_receive, c_seq, c_try, c_values,
};
use crate::error::TreeError;
use crate::literal::{c_cons, c_tuple};
use crate::map::{c_map_pair, c_map_pattern_with_base, c_map_update};
use crate::node::{Expr, Node, NodeType, copy_ann};
use tracing::debug;

/// The children of `node`, grouped into slots. Empty for leaves.
pub fn subtrees(node: &Node) -> Vec<Vec<Node>> {
    fn one(node: &Node) -> Vec<Node> {
        vec![node.clone()]
    }

    match node.expr() {
        Expr::Literal(_) | Expr::Var(_) => Vec::new(),
        Expr::Values(v) => vec![v.es.clone()],
        Expr::Binary(b) => vec![b.segments.clone()],
        Expr::Bitstr(b) => vec![
            one(&b.val),
            one(&b.size),
            one(&b.unit),
            one(&b.ty),
            one(&b.flags),
        ],
        Expr::Cons(c) => vec![one(&c.hd), one(&c.tl)],
        Expr::Tuple(t) => vec![t.es.clone()],
        Expr::Map(m) => vec![one(&m.base), m.pairs.clone()],
        Expr::MapPair(p) => vec![one(&p.op), one(&p.key), one(&p.val)],
        Expr::Let(l) => vec![l.vars.clone(), one(&l.arg), one(&l.body)],
        Expr::Seq(s) => vec![one(&s.arg), one(&s.body)],
        Expr::Apply(a) => vec![one(&a.op), a.args.clone()],
        Expr::Call(c) => vec![one(&c.module), one(&c.name), c.args.clone()],
        Expr::Primop(p) => vec![one(&p.name), p.args.clone()],
        Expr::Case(c) => vec![one(&c.arg), c.clauses.clone()],
        Expr::Clause(c) => vec![c.pats.clone(), one(&c.guard), one(&c.body)],
        Expr::Alias(a) => vec![one(&a.var), one(&a.pat)],
        Expr::Fun(f) => vec![f.vars.clone(), one(&f.body)],
        Expr::Receive(r) => vec![r.clauses.clone(), one(&r.timeout), one(&r.action)],
        Expr::Try(t) => vec![
            one(&t.arg),
            t.vars.clone(),
            one(&t.body),
            t.evars.clone(),
            one(&t.handler),
        ],
        Expr::Catch(c) => vec![one(&c.body)],
        Expr::Letrec(l) => vec![unfold_pairs(&l.defs), one(&l.body)],
        Expr::Module(m) => vec![
            one(&m.name),
            m.exports.clone(),
            unfold_pairs(&m.attrs),
            unfold_pairs(&m.defs),
        ],
    }
}

fn unfold_pairs(pairs: &[(Node, Node)]) -> Vec<Node> {
    pairs
        .iter()
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .collect()
}

/// Builds a node of `kind` from slots laid out as [`subtrees`] returns them.
///
/// Cons, tuple and map nodes are built with their folding constructors.
pub fn make_tree(kind: NodeType, slots: Vec<Vec<Node>>) -> Result<Node, TreeError> {
    let shape: Vec<usize> = slots.iter().map(Vec::len).collect();
    let malformed = || {
        debug!(%kind, ?shape, "rejected malformed subtrees");
        TreeError::MalformedSlots {
            kind,
            found: shape.clone(),
        }
    };

    let mut slots = slots.into_iter();
    let mut next = || slots.next().ok_or_else(malformed);
    let single = |slot: Vec<Node>| -> Result<Node, TreeError> {
        match <[Node; 1]>::try_from(slot) {
            Ok([node]) => Ok(node),
            Err(_) => Err(malformed()),
        }
    };

    let node = match kind {
        NodeType::Literal | NodeType::Var => return Err(TreeError::LeafKind(kind)),
        NodeType::Values => c_values(next()?),
        NodeType::Binary => c_binary(next()?),
        NodeType::Bitstr => {
            let val = single(next()?)?;
            let size = single(next()?)?;
            let unit = single(next()?)?;
            let ty = single(next()?)?;
            let flags = single(next()?)?;
            c_bitstr(val, size, unit, ty, flags)
        }
        NodeType::Cons => {
            let hd = single(next()?)?;
            let tl = single(next()?)?;
            c_cons(hd, tl)
        }
        NodeType::Tuple => c_tuple(next()?),
        NodeType::Map => {
            let base = single(next()?)?;
            c_map_update(base, next()?)
        }
        NodeType::MapPair => {
            let op = single(next()?)?;
            let key = single(next()?)?;
            let val = single(next()?)?;
            c_map_pair(op, key, val)
        }
        NodeType::Let => {
            let vars = next()?;
            let arg = single(next()?)?;
            let body = single(next()?)?;
            c_let(vars, arg, body)
        }
        NodeType::Seq => {
            let arg = single(next()?)?;
            let body = single(next()?)?;
            c_seq(arg, body)
        }
        NodeType::Apply => {
            let op = single(next()?)?;
            c_apply(op, next()?)
        }
        NodeType::Call => {
            let module = single(next()?)?;
            let name = single(next()?)?;
            c_call(module, name, next()?)
        }
        NodeType::Primop => {
            let name = single(next()?)?;
            c_primop(name, next()?)
        }
        NodeType::Case => {
            let arg = single(next()?)?;
            c_case(arg, next()?)
        }
        NodeType::Clause => {
            let pats = next()?;
            let guard = single(next()?)?;
            let body = single(next()?)?;
            c_clause(pats, guard, body)
        }
        NodeType::Alias => {
            let var = single(next()?)?;
            let pat = single(next()?)?;
            c_alias(var, pat)
        }
        NodeType::Fun => {
            let vars = next()?;
            let body = single(next()?)?;
            c_fun(vars, body)
        }
        NodeType::Receive => {
            let clauses = next()?;
            let timeout = single(next()?)?;
            let action = single(next()?)?;
            c_receive(clauses, timeout, action)
        }
        NodeType::Try => {
            let arg = single(next()?)?;
            let vars = next()?;
            let body = single(next()?)?;
            let evars = next()?;
            let handler = single(next()?)?;
            c_try(arg, vars, body, evars, handler)
        }
        NodeType::Catch => c_catch(single(next()?)?),
        NodeType::Letrec => {
            let defs = fold_pairs(next()?).ok_or_else(malformed)?;
            let body = single(next()?)?;
            c_letrec(defs, body)
        }
        NodeType::Module => {
            let name = single(next()?)?;
            let exports = next()?;
            let attrs = fold_pairs(next()?).ok_or_else(malformed)?;
            let defs = fold_pairs(next()?).ok_or_else(malformed)?;
            c_module(name, exports, attrs, defs)
        }
    };

    if slots.next().is_some() {
        return Err(malformed());
    }
    Ok(node)
}

fn fold_pairs(flat: Vec<Node>) -> Option<Vec<(Node, Node)>> {
    if flat.len() % 2 != 0 {
        return None;
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut items = flat.into_iter();
    while let (Some(a), Some(b)) = (items.next(), items.next()) {
        pairs.push((a, b));
    }
    Some(pairs)
}

/// Rebuilds `old` from new slots, keeping its kind and annotations.
///
/// Map patterns stay patterns.
pub fn update_tree(old: &Node, slots: Vec<Vec<Node>>) -> Result<Node, TreeError> {
    let node = match old.expr() {
        Expr::Map(map) if map.is_pattern => match <[Vec<Node>; 2]>::try_from(slots) {
            Ok([base, pairs]) => match <[Node; 1]>::try_from(base) {
                Ok([base]) => c_map_pattern_with_base(base, pairs),
                Err(base) => {
                    return Err(TreeError::MalformedSlots {
                        kind: NodeType::Map,
                        found: vec![base.len(), pairs.len()],
                    });
                }
            },
            Err(slots) => {
                return Err(TreeError::MalformedSlots {
                    kind: NodeType::Map,
                    found: slots.iter().map(Vec::len).collect(),
                });
            }
        },
        _ => make_tree(old.kind(), slots)?,
    };
    Ok(copy_ann(old, node))
}

/// Rewrites a tree bottom-up: every child is transformed before `f` sees
/// the rebuilt parent. Leaves are passed to `f` as they are.
///
/// Children are visited left to right with an explicit stack, so long cons
/// spines do not grow the call stack.
pub fn postorder<E, F>(node: &Node, f: &mut F) -> Result<Node, E>
where
    F: FnMut(Node) -> Result<Node, E>,
    E: From<TreeError>,
{
    if node.is_leaf() {
        return f(node.clone());
    }
    let mut current = Frame::new(node.clone());
    let mut parents: Vec<Frame> = Vec::new();
    loop {
        match current.next_child() {
            Some(child) if child.is_leaf() => {
                let done = f(child)?;
                current.accept(done);
            }
            Some(child) => parents.push(std::mem::replace(&mut current, Frame::new(child))),
            None => {
                let done = f(current.rebuild()?)?;
                match parents.pop() {
                    Some(parent) => {
                        current = parent;
                        current.accept(done);
                    }
                    None => return Ok(done),
                }
            }
        }
    }
}

/// A node whose children are being rewritten by [`postorder`].
struct Frame {
    node: Node,
    slots: std::vec::IntoIter<Vec<Node>>,
    slot: std::vec::IntoIter<Node>,
    done: Vec<Vec<Node>>,
}

impl Frame {
    fn new(node: Node) -> Self {
        let slots = subtrees(&node).into_iter();
        Frame {
            node,
            slots,
            slot: Vec::new().into_iter(),
            done: Vec::new(),
        }
    }

    fn next_child(&mut self) -> Option<Node> {
        loop {
            if let Some(child) = self.slot.next() {
                return Some(child);
            }
            let slot = self.slots.next()?;
            self.done.push(Vec::with_capacity(slot.len()));
            self.slot = slot.into_iter();
        }
    }

    fn accept(&mut self, child: Node) {
        if let Some(slot) = self.done.last_mut() {
            slot.push(child);
        }
    }

    fn rebuild(&mut self) -> Result<Node, TreeError> {
        update_tree(&self.node, std::mem::take(&mut self.done))
    }
}

/// Number of nodes in the tree, counting literals as one node each.
pub fn tree_size(node: &Node) -> usize {
    let mut count = 0;
    let mut pending = vec![node.clone()];
    while let Some(current) = pending.pop() {
        count += 1;
        pending.extend(subtrees(&current).into_iter().flatten());
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{c_atom, c_fname, c_int, c_var};
    use crate::literal::{abstract_term, c_tuple_skel, unfold_literal};
    use crate::map::{c_map_pair_exact, c_map_pattern};
    use crate::node::VarName;
    use crate::term::Term;

    #[test]
    fn test_leaves_have_no_subtrees() {
        assert!(subtrees(&c_var("X")).is_empty());
        assert!(subtrees(&c_atom("a")).is_empty());
    }

    #[test]
    fn test_case_slots() {
        let clause = c_clause(vec![c_var("X")], c_atom("true"), c_var("X"));
        let case = c_case(c_var("A"), vec![clause.clone()]);
        let slots = subtrees(&case);
        assert_eq!(slots, vec![vec![c_var("A")], vec![clause]]);
    }

    #[test]
    fn test_letrec_defs_are_flattened_and_refolded() {
        let f = c_fname("f", 0);
        let fun = c_fun(vec![], c_atom("ok"));
        let letrec = c_letrec(vec![(f.clone(), fun.clone())], c_apply(f.clone(), vec![]));
        let slots = subtrees(&letrec);
        assert_eq!(slots[0], vec![f, fun]);
        assert_eq!(update_tree(&letrec, slots).unwrap(), letrec);
    }

    #[test]
    fn test_update_tree_keeps_annotations() {
        let node = c_seq(c_var("A"), c_var("B")).with_ann(vec![Term::atom("line")]);
        let rebuilt = update_tree(&node, vec![vec![c_var("C")], vec![c_var("B")]]).unwrap();
        assert_eq!(rebuilt.ann(), &[Term::atom("line")]);
        assert_eq!(rebuilt.as_seq().unwrap().arg, c_var("C"));
    }

    #[test]
    fn test_make_tree_folds_tuples() {
        let node = make_tree(NodeType::Tuple, vec![vec![c_int(1), c_int(2)]]).unwrap();
        assert!(node.is_literal());
        let skel = c_tuple_skel(vec![c_int(1), c_int(2)]);
        assert_eq!(update_tree(&skel, subtrees(&skel)).unwrap(), node);
    }

    #[test]
    fn test_make_tree_rejects_bad_shapes() {
        assert_eq!(
            make_tree(NodeType::Var, vec![]),
            Err(TreeError::LeafKind(NodeType::Var))
        );
        assert_eq!(
            make_tree(NodeType::Seq, vec![vec![c_var("A")]]),
            Err(TreeError::MalformedSlots {
                kind: NodeType::Seq,
                found: vec![1],
            })
        );
        let two_args = vec![vec![c_var("A"), c_var("B")], vec![c_var("C")]];
        assert!(make_tree(NodeType::Seq, two_args).is_err());
        assert!(make_tree(NodeType::Catch, vec![vec![c_var("A")], vec![]]).is_err());
        let odd_defs = vec![vec![c_fname("f", 0)], vec![c_var("B")]];
        assert!(make_tree(NodeType::Letrec, odd_defs).is_err());
    }

    #[test]
    fn test_update_tree_keeps_map_patterns() {
        let pattern = c_map_pattern(vec![c_map_pair_exact(c_atom("k"), c_var("V"))]);
        let rebuilt = update_tree(&pattern, subtrees(&pattern)).unwrap();
        assert_eq!(rebuilt, pattern);
    }

    #[test]
    fn test_update_tree_replaces_map_pattern_base() {
        let pairs = vec![c_map_pair_exact(c_atom("k"), c_var("V"))];
        let pattern = c_map_pattern(pairs.clone());
        let base = abstract_term(Term::map([(Term::atom("a"), Term::from(1))]));
        let rebuilt = update_tree(&pattern, vec![vec![base.clone()], pairs.clone()]).unwrap();
        let map = rebuilt.as_map().unwrap();
        assert!(map.is_pattern);
        assert_eq!(map.base, base);
        assert_eq!(map.pairs, pairs);

        assert_eq!(
            update_tree(&pattern, vec![vec![], pairs]),
            Err(TreeError::MalformedSlots {
                kind: NodeType::Map,
                found: vec![0, 1],
            })
        );
    }

    #[test]
    fn test_postorder_renames_variables() {
        let tree = c_let(
            vec![c_var("X")],
            c_int(1),
            c_tuple(vec![c_var("X"), c_var("Y")]),
        );
        let renamed = postorder(&tree, &mut |node: Node| -> Result<Node, TreeError> {
            match node.as_var() {
                Ok(var) if var.name == VarName::from("X") => Ok(copy_ann(&node, c_var("Z"))),
                _ => Ok(node),
            }
        })
        .unwrap();
        let expected = c_let(
            vec![c_var("Z")],
            c_int(1),
            c_tuple(vec![c_var("Z"), c_var("Y")]),
        );
        assert_eq!(renamed, expected);
    }

    #[test]
    fn test_postorder_long_unfolded_list() {
        let list = Term::List((0..10_000).map(Term::Integer).collect());
        let unfolded = unfold_literal(&abstract_term(list.clone()));
        let mut visited = 0;
        let rebuilt = postorder(&unfolded, &mut |node: Node| -> Result<Node, TreeError> {
            visited += 1;
            Ok(node)
        })
        .unwrap();
        assert_eq!(visited, tree_size(&unfolded));
        assert!(rebuilt == abstract_term(list));
    }

    #[test]
    fn test_postorder_stops_at_first_error() {
        let tree = c_seq(c_var("A"), c_seq(c_var("B"), c_var("C")));
        let mut seen = Vec::new();
        let result = postorder(&tree, &mut |node: Node| -> Result<Node, TreeError> {
            if let Ok(var) = node.as_var() {
                seen.push(var.name.clone());
                if var.name == VarName::from("B") {
                    return Err(TreeError::LeafKind(NodeType::Var));
                }
            }
            Ok(node)
        });
        assert!(result.is_err());
        assert_eq!(seen, vec![VarName::from("A"), VarName::from("B")]);
    }

    #[test]
    fn test_tree_size() {
        let tree = c_seq(c_var("A"), c_tuple(vec![c_var("B"), c_int(1)]));
        assert_eq!(tree_size(&tree), 5);
    }
}
