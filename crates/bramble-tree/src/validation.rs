//! Whole-tree validation.
//!
//! Constructors only check what they need to build a node. Trees that come
//! from outside (deserialized input, generated code) should pass
//! [`validate`] before other passes look at them.

use crate::literal::is_literal_term;
use crate::node::{Expr, Node, NodeType, VarName};
use crate::term::Term;
use crate::traverse::subtrees;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} node is not allowed in a pattern")]
    NotAPattern(NodeType),

    #[error("map in pattern position is not flagged as a pattern")]
    UnflaggedMapPattern,

    #[error("map pattern used as an expression")]
    MapPatternInExpression,

    #[error("expected a plain variable in binding position, got {0}")]
    NotABinder(String),

    #[error("expected a function name in definition position, got {0}")]
    NotAFunctionName(String),

    #[error("definition of {name} is a {found} node, expected fun")]
    DefinitionNotFun { name: VarName, found: NodeType },

    #[error("definition of {name} takes {actual} arguments")]
    ArityMismatch { name: VarName, actual: usize },

    #[error("expected a clause, got {0}")]
    NotAClause(NodeType),

    #[error("clauses disagree on pattern count: expected {expected}, got {got}")]
    ClauseArity { expected: usize, got: usize },

    #[error("expected a map pair, got {0}")]
    NotAMapPair(NodeType),

    #[error("expected a binary segment, got {0}")]
    NotASegment(NodeType),

    #[error("literal holds {0}, which has no literal form")]
    NotALiteral(String),

    #[error("literal {0} is not in normal form")]
    NonCanonicalLiteral(String),
}

enum Item {
    Expr(Node),
    Pattern(Node),
}

/// Validate a tree for structural correctness.
///
/// Checks that patterns contain only pattern kinds, that binding positions
/// hold plain variables, that function definitions are well formed, and
/// that clause, map pair and segment lists contain the right kinds.
pub fn validate(node: &Node) -> Result<(), ValidationError> {
    check(node).inspect_err(|err| debug!(%err, kind = %node.kind(), "tree failed validation"))
}

fn check(node: &Node) -> Result<(), ValidationError> {
    let mut pending = vec![Item::Expr(node.clone())];
    while let Some(item) = pending.pop() {
        match item {
            Item::Expr(node) => check_expr(&node, &mut pending)?,
            Item::Pattern(node) => check_pattern(&node, &mut pending)?,
        }
    }
    Ok(())
}

fn check_expr(node: &Node, pending: &mut Vec<Item>) -> Result<(), ValidationError> {
    match node.expr() {
        Expr::Literal(lit) => literal(&lit.value)?,
        Expr::Var(_) => {}
        Expr::Map(map) => {
            if map.is_pattern {
                return Err(ValidationError::MapPatternInExpression);
            }
            pending.push(Item::Expr(map.base.clone()));
            for pair in &map.pairs {
                let Expr::MapPair(pair) = pair.expr() else {
                    return Err(ValidationError::NotAMapPair(pair.kind()));
                };
                pending.extend([&pair.op, &pair.key, &pair.val].map(|n| Item::Expr(n.clone())));
            }
        }
        Expr::Binary(binary) => {
            for segment in &binary.segments {
                if segment.kind() != NodeType::Bitstr {
                    return Err(ValidationError::NotASegment(segment.kind()));
                }
                pending.push(Item::Expr(segment.clone()));
            }
        }
        Expr::Let(l) => {
            binders(&l.vars)?;
            pending.extend([Item::Expr(l.arg.clone()), Item::Expr(l.body.clone())]);
        }
        Expr::Fun(fun) => {
            binders(&fun.vars)?;
            pending.push(Item::Expr(fun.body.clone()));
        }
        Expr::Try(t) => {
            binders(&t.vars)?;
            binders(&t.evars)?;
            pending.extend(
                [&t.arg, &t.body, &t.handler].map(|n| Item::Expr(n.clone())),
            );
        }
        Expr::Case(case) => {
            clauses(&case.clauses, true)?;
            pending.push(Item::Expr(case.arg.clone()));
            pending.extend(case.clauses.iter().cloned().map(Item::Expr));
        }
        Expr::Receive(receive) => {
            clauses(&receive.clauses, false)?;
            pending.extend(receive.clauses.iter().cloned().map(Item::Expr));
            pending.extend([&receive.timeout, &receive.action].map(|n| Item::Expr(n.clone())));
        }
        Expr::Clause(clause) => {
            pending.extend(clause.pats.iter().cloned().map(Item::Pattern));
            pending.extend([Item::Expr(clause.guard.clone()), Item::Expr(clause.body.clone())]);
        }
        Expr::Letrec(letrec) => {
            definitions(&letrec.defs)?;
            pending.extend(letrec.defs.iter().map(|(_, fun)| Item::Expr(fun.clone())));
            pending.push(Item::Expr(letrec.body.clone()));
        }
        Expr::Module(module) => {
            for export in &module.exports {
                if !export.is_fname() {
                    return Err(ValidationError::NotAFunctionName(describe(export)));
                }
            }
            definitions(&module.defs)?;
            for (key, value) in &module.attrs {
                pending.extend([Item::Expr(key.clone()), Item::Expr(value.clone())]);
            }
            pending.extend(module.defs.iter().map(|(_, fun)| Item::Expr(fun.clone())));
            pending.push(Item::Expr(module.name.clone()));
        }
        _ => pending.extend(subtrees(node).into_iter().flatten().map(Item::Expr)),
    }
    Ok(())
}

fn check_pattern(node: &Node, pending: &mut Vec<Item>) -> Result<(), ValidationError> {
    match node.expr() {
        Expr::Literal(lit) => literal(&lit.value)?,
        Expr::Var(_) => binders(std::slice::from_ref(node))?,
        Expr::Cons(cons) => {
            pending.extend([Item::Pattern(cons.hd.clone()), Item::Pattern(cons.tl.clone())]);
        }
        Expr::Tuple(tuple) => pending.extend(tuple.es.iter().cloned().map(Item::Pattern)),
        Expr::Map(map) => {
            if !map.is_pattern {
                return Err(ValidationError::UnflaggedMapPattern);
            }
            pending.push(Item::Expr(map.base.clone()));
            for pair in &map.pairs {
                let Expr::MapPair(pair) = pair.expr() else {
                    return Err(ValidationError::NotAMapPair(pair.kind()));
                };
                pending.extend([
                    Item::Expr(pair.op.clone()),
                    Item::Expr(pair.key.clone()),
                    Item::Pattern(pair.val.clone()),
                ]);
            }
        }
        Expr::Binary(binary) => {
            for segment in &binary.segments {
                let Expr::Bitstr(bitstr) = segment.expr() else {
                    return Err(ValidationError::NotASegment(segment.kind()));
                };
                pending.push(Item::Pattern(bitstr.val.clone()));
                pending.extend(
                    [&bitstr.size, &bitstr.unit, &bitstr.ty, &bitstr.flags]
                        .map(|n| Item::Expr(n.clone())),
                );
            }
        }
        Expr::Alias(alias) => {
            binders(std::slice::from_ref(&alias.var))?;
            pending.push(Item::Pattern(alias.pat.clone()));
        }
        other => return Err(ValidationError::NotAPattern(other.kind())),
    }
    Ok(())
}

fn literal(value: &Term) -> Result<(), ValidationError> {
    if !is_literal_term(value) {
        return Err(ValidationError::NotALiteral(format!("{:?}", value)));
    }
    if !value.is_canonical() {
        return Err(ValidationError::NonCanonicalLiteral(format!("{:?}", value)));
    }
    Ok(())
}

fn binders(vars: &[Node]) -> Result<(), ValidationError> {
    for var in vars {
        if !var.is_var() || var.is_fname() {
            return Err(ValidationError::NotABinder(describe(var)));
        }
    }
    Ok(())
}

fn clauses(clauses: &[Node], same_arity: bool) -> Result<(), ValidationError> {
    let mut expected = None;
    for clause in clauses {
        let Expr::Clause(c) = clause.expr() else {
            return Err(ValidationError::NotAClause(clause.kind()));
        };
        if !same_arity {
            continue;
        }
        match expected {
            None => expected = Some(c.pats.len()),
            Some(n) if n != c.pats.len() => {
                return Err(ValidationError::ClauseArity {
                    expected: n,
                    got: c.pats.len(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn definitions(defs: &[(Node, Node)]) -> Result<(), ValidationError> {
    for (name, fun) in defs {
        let Expr::Var(var) = name.expr() else {
            return Err(ValidationError::NotAFunctionName(describe(name)));
        };
        let VarName::FName(_, arity) = &var.name else {
            return Err(ValidationError::NotAFunctionName(describe(name)));
        };
        let Expr::Fun(f) = fun.expr() else {
            return Err(ValidationError::DefinitionNotFun {
                name: var.name.clone(),
                found: fun.kind(),
            });
        };
        if f.vars.len() != *arity as usize {
            return Err(ValidationError::ArityMismatch {
                name: var.name.clone(),
                actual: f.vars.len(),
            });
        }
    }
    Ok(())
}

fn describe(node: &Node) -> String {
    match node.expr() {
        Expr::Var(var) => var.name.to_string(),
        Expr::Literal(lit) => lit.value.to_string(),
        other => format!("a {} node", other.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{
        c_alias, c_apply, c_atom, c_case, c_clause, c_fname, c_fun, c_int, c_let, c_letrec,
        c_module, c_seq, c_var,
    };
    use crate::literal::{abstract_term, c_cons, c_tuple};
    use crate::map::{c_map, c_map_pair_assoc, c_map_pair_exact, c_map_pattern};
    use crate::term::{BitString, Handle};

    fn clause(pats: Vec<Node>, body: Node) -> Node {
        c_clause(pats, c_atom("true"), body)
    }

    #[test]
    fn test_validate_case() {
        let case = c_case(
            c_var("X"),
            vec![
                clause(
                    vec![c_tuple(vec![
                        c_atom("ok"),
                        c_alias(c_var("V"), c_cons(c_var("H"), c_var("T"))),
                    ])],
                    c_var("V"),
                ),
                clause(vec![c_var("_")], c_atom("error")),
            ],
        );
        assert!(validate(&case).is_ok());
    }

    #[test]
    fn test_literals_must_be_canonical() {
        let improper = |items: Vec<Term>, tail: Term| {
            abstract_term(Term::Improper(items, Box::new(tail)))
        };
        let empty_prefix = improper(vec![], Term::from(1));
        assert!(matches!(
            validate(&empty_prefix),
            Err(ValidationError::NonCanonicalLiteral(_))
        ));
        let list_tail = improper(vec![Term::from(1)], Term::List(vec![Term::from(2)]));
        assert!(matches!(
            validate(&list_tail),
            Err(ValidationError::NonCanonicalLiteral(_))
        ));
        assert!(validate(&improper(vec![Term::from(1)], Term::from(2))).is_ok());

        let bits: BitString = serde_json::from_str(r#"{"bytes": [255], "bit_len": 3}"#).unwrap();
        let in_pattern = c_case(
            c_var("X"),
            vec![clause(vec![abstract_term(Term::Bits(bits))], c_atom("ok"))],
        );
        assert!(matches!(
            validate(&in_pattern),
            Err(ValidationError::NonCanonicalLiteral(_))
        ));
        let trimmed = BitString::from_bits(vec![255], 3).unwrap();
        assert!(validate(&abstract_term(Term::Bits(trimmed))).is_ok());

        let pid = abstract_term(Term::Handle(Handle::Pid(1)));
        assert!(matches!(validate(&pid), Err(ValidationError::NotALiteral(_))));
    }

    #[test]
    fn test_expression_in_pattern() {
        let bad = c_case(
            c_var("X"),
            vec![clause(vec![c_seq(c_var("A"), c_var("B"))], c_atom("ok"))],
        );
        assert_eq!(validate(&bad), Err(ValidationError::NotAPattern(NodeType::Seq)));
    }

    #[test]
    fn test_map_pattern_flag() {
        let flagged = c_map_pattern(vec![c_map_pair_exact(c_atom("k"), c_var("V"))]);
        let ok = c_case(c_var("M"), vec![clause(vec![flagged.clone()], c_var("V"))]);
        assert!(validate(&ok).is_ok());
        assert_eq!(validate(&flagged), Err(ValidationError::MapPatternInExpression));

        let unflagged = c_map(vec![c_map_pair_assoc(c_atom("k"), c_var("V"))]);
        let bad = c_case(c_var("M"), vec![clause(vec![unflagged], c_var("V"))]);
        assert_eq!(validate(&bad), Err(ValidationError::UnflaggedMapPattern));
    }

    #[test]
    fn test_binders_must_be_plain_vars() {
        let bad = c_let(vec![c_atom("x")], c_int(1), c_atom("ok"));
        assert!(matches!(validate(&bad), Err(ValidationError::NotABinder(_))));
        let fname = c_fun(vec![c_fname("f", 0)], c_atom("ok"));
        assert!(matches!(validate(&fname), Err(ValidationError::NotABinder(_))));
    }

    #[test]
    fn test_case_clause_counts_agree() {
        let bad = c_case(
            c_var("X"),
            vec![clause(vec![c_var("A")], c_var("A")), clause(vec![], c_atom("ok"))],
        );
        assert_eq!(
            validate(&bad),
            Err(ValidationError::ClauseArity { expected: 1, got: 0 })
        );
        let not_clause = c_case(c_var("X"), vec![c_atom("ok")]);
        assert_eq!(
            validate(&not_clause),
            Err(ValidationError::NotAClause(NodeType::Literal))
        );
    }

    #[test]
    fn test_definitions() {
        let f = c_fname("f", 1);
        let good = c_letrec(
            vec![(f.clone(), c_fun(vec![c_var("X")], c_var("X")))],
            c_apply(f.clone(), vec![c_int(1)]),
        );
        assert!(validate(&good).is_ok());

        let wrong_arity = c_letrec(vec![(f.clone(), c_fun(vec![], c_atom("ok")))], c_atom("ok"));
        assert!(matches!(
            validate(&wrong_arity),
            Err(ValidationError::ArityMismatch { actual: 0, .. })
        ));

        let module = c_module(c_atom("m"), vec![c_var("f")], vec![], vec![]);
        assert!(matches!(
            validate(&module),
            Err(ValidationError::NotAFunctionName(_))
        ));
    }
}
