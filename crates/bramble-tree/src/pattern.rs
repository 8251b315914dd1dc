//! Variables bound by patterns.

use crate::error::TreeError;
use crate::node::{Expr, Node};

/// The variables bound by a pattern, in no particular order.
///
/// Map pair keys are expressions evaluated at match time, so their
/// variables are not bound by the pattern.
pub fn pat_vars(pattern: &Node) -> Result<Vec<Node>, TreeError> {
    let mut vars = Vec::new();
    collect(vec![pattern.clone()], &mut vars)?;
    Ok(vars)
}

/// The variables bound by a list of patterns.
pub fn pat_list_vars(patterns: &[Node]) -> Result<Vec<Node>, TreeError> {
    let mut vars = Vec::new();
    collect(patterns.to_vec(), &mut vars)?;
    Ok(vars)
}

/// The variables bound by the patterns of a clause.
pub fn clause_vars(clause: &Node) -> Result<Vec<Node>, TreeError> {
    pat_list_vars(&clause.as_clause()?.pats)
}

fn collect(mut pending: Vec<Node>, vars: &mut Vec<Node>) -> Result<(), TreeError> {
    while let Some(node) = pending.pop() {
        match node.expr() {
            Expr::Var(_) => vars.push(node.clone()),
            Expr::Literal(_) => {}
            Expr::Cons(cons) => pending.extend([cons.hd.clone(), cons.tl.clone()]),
            Expr::Tuple(tuple) => pending.extend(tuple.es.iter().cloned()),
            Expr::Map(map) => {
                pending.push(map.base.clone());
                pending.extend(map.pairs.iter().cloned());
            }
            Expr::MapPair(pair) => pending.extend([pair.op.clone(), pair.val.clone()]),
            Expr::Binary(binary) => pending.extend(binary.segments.iter().cloned()),
            Expr::Bitstr(bitstr) => pending.push(bitstr.val.clone()),
            Expr::Alias(alias) => pending.extend([alias.var.clone(), alias.pat.clone()]),
            other => return Err(TreeError::NotAPattern(other.kind())),
        }
    }
    Ok(())
}
