//! Node constructors and small query helpers.
//!
//! Aggregate constructors that fold literals (`c_cons`, `c_tuple`) live in
//! [`crate::literal`]; the map constructors live in [`crate::map`].

use crate::error::TreeError;
use crate::literal::{abstract_term, c_cons};
use crate::node::{
    Alias, Apply, Binary, Bitstr, Call, Case, Catch, Clause, Expr, Fun, Let, Letrec, Module, Node,
    Primop, Receive, Seq, Try, Values, Var, VarName,
};
use crate::term::{Atom, Term};

pub fn c_alias(var: Node, pat: Node) -> Node {
    Node::new(Expr::Alias(Alias { var, pat }))
}

pub fn c_apply(op: Node, args: Vec<Node>) -> Node {
    Node::new(Expr::Apply(Apply { op, args }))
}

pub fn c_binary(segments: Vec<Node>) -> Node {
    Node::new(Expr::Binary(Binary { segments }))
}

pub fn c_bitstr(val: Node, size: Node, unit: Node, ty: Node, flags: Node) -> Node {
    Node::new(Expr::Bitstr(Bitstr {
        val,
        size,
        unit,
        ty,
        flags,
    }))
}

pub fn c_call(module: Node, name: Node, args: Vec<Node>) -> Node {
    Node::new(Expr::Call(Call { module, name, args }))
}

pub fn c_case(arg: Node, clauses: Vec<Node>) -> Node {
    Node::new(Expr::Case(Case { arg, clauses }))
}

pub fn c_catch(body: Node) -> Node {
    Node::new(Expr::Catch(Catch { body }))
}

pub fn c_clause(pats: Vec<Node>, guard: Node, body: Node) -> Node {
    Node::new(Expr::Clause(Clause { pats, guard, body }))
}

pub fn c_fun(vars: Vec<Node>, body: Node) -> Node {
    Node::new(Expr::Fun(Fun { vars, body }))
}

pub fn c_let(vars: Vec<Node>, arg: Node, body: Node) -> Node {
    Node::new(Expr::Let(Let { vars, arg, body }))
}

pub fn c_letrec(defs: Vec<(Node, Node)>, body: Node) -> Node {
    Node::new(Expr::Letrec(Letrec { defs, body }))
}

pub fn c_module(
    name: Node,
    exports: Vec<Node>,
    attrs: Vec<(Node, Node)>,
    defs: Vec<(Node, Node)>,
) -> Node {
    Node::new(Expr::Module(Module {
        name,
        exports,
        attrs,
        defs,
    }))
}

pub fn c_primop(name: Node, args: Vec<Node>) -> Node {
    Node::new(Expr::Primop(Primop { name, args }))
}

pub fn c_receive(clauses: Vec<Node>, timeout: Node, action: Node) -> Node {
    Node::new(Expr::Receive(Receive {
        clauses,
        timeout,
        action,
    }))
}

pub fn c_seq(arg: Node, body: Node) -> Node {
    Node::new(Expr::Seq(Seq { arg, body }))
}

pub fn c_try(arg: Node, vars: Vec<Node>, body: Node, evars: Vec<Node>, handler: Node) -> Node {
    Node::new(Expr::Try(Try {
        arg,
        vars,
        body,
        evars,
        handler,
    }))
}

pub fn c_values(es: Vec<Node>) -> Node {
    Node::new(Expr::Values(Values { es }))
}

pub fn c_var(name: impl Into<VarName>) -> Node {
    Node::new(Expr::Var(Var { name: name.into() }))
}

/// A function-name variable `name/arity`.
pub fn c_fname(name: impl Into<Atom>, arity: u32) -> Node {
    c_var(VarName::FName(name.into(), arity))
}

pub fn c_atom(name: impl Into<Atom>) -> Node {
    abstract_term(Term::Atom(name.into()))
}

pub fn c_int(value: i64) -> Node {
    abstract_term(Term::Integer(value))
}

pub fn c_float(value: f64) -> Node {
    abstract_term(Term::Float(value))
}

pub fn c_char(value: char) -> Node {
    abstract_term(Term::Integer(value as i64))
}

pub fn c_nil() -> Node {
    abstract_term(Term::nil())
}

pub fn c_string(value: &str) -> Node {
    abstract_term(Term::string(value))
}

/// Builds the list `[e1, .., en | tail]` (tail defaults to nil) with the
/// folding cons constructor.
pub fn make_list(elems: Vec<Node>, tail: Option<Node>) -> Node {
    let tail = tail.unwrap_or_else(c_nil);

    // Collapse the longest all-literal suffix in one step.
    let split = match tail.literal_value() {
        Some(_) => elems
            .iter()
            .rposition(|e| !e.is_literal())
            .map_or(0, |idx| idx + 1),
        None => elems.len(),
    };
    let mut elems = elems;
    let literal_suffix = elems.split_off(split);
    let mut acc = if literal_suffix.is_empty() {
        tail
    } else {
        let values = literal_suffix
            .iter()
            .filter_map(|e| e.literal_value().cloned())
            .collect();
        let end = tail.literal_value().cloned().unwrap_or_else(Term::nil);
        abstract_term(Term::list_with_tail(values, end))
    };

    for elem in elems.into_iter().rev() {
        acc = c_cons(elem, acc);
    }
    acc
}

/// True if the node is a proper list, either literal or built of cons cells.
pub fn is_c_list(node: &Node) -> bool {
    let mut current = node.clone();
    loop {
        match current.expr() {
            Expr::Cons(cons) => {
                let next = cons.tl.clone();
                current = next;
            }
            Expr::Literal(lit) => return matches!(lit.value, Term::List(_)),
            _ => return false,
        }
    }
}

/// Elements of a proper list node, expanding literal segments into literal
/// element nodes.
pub fn list_elements(node: &Node) -> Result<Vec<Node>, TreeError> {
    let mut out = Vec::new();
    let mut current = node.clone();
    loop {
        match current.expr() {
            Expr::Cons(cons) => {
                out.push(cons.hd.clone());
                let next = cons.tl.clone();
                current = next;
            }
            Expr::Literal(lit) => match &lit.value {
                Term::List(items) => {
                    out.extend(items.iter().cloned().map(abstract_term));
                    return Ok(out);
                }
                other => return Err(TreeError::NotAList(other.to_string())),
            },
            other => return Err(TreeError::NotAList(other.kind().to_string())),
        }
    }
}

pub fn list_length(node: &Node) -> Result<usize, TreeError> {
    let mut len = 0;
    let mut current = node.clone();
    loop {
        match current.expr() {
            Expr::Cons(cons) => {
                len += 1;
                let next = cons.tl.clone();
                current = next;
            }
            Expr::Literal(lit) => match &lit.value {
                Term::List(items) => return Ok(len + items.len()),
                other => return Err(TreeError::NotAList(other.to_string())),
            },
            other => return Err(TreeError::NotAList(other.kind().to_string())),
        }
    }
}

pub fn is_c_atom(node: &Node) -> bool {
    matches!(node.literal_value(), Some(Term::Atom(_)))
}

pub fn atom_val(node: &Node) -> Option<&Atom> {
    node.literal_value().and_then(Term::as_atom)
}

pub fn is_c_int(node: &Node) -> bool {
    matches!(node.literal_value(), Some(Term::Integer(_)))
}

pub fn int_val(node: &Node) -> Option<i64> {
    node.literal_value().and_then(Term::as_integer)
}

pub fn var_name(node: &Node) -> Result<&VarName, TreeError> {
    Ok(&node.as_var()?.name)
}

pub fn fname_id(node: &Node) -> Result<&Atom, TreeError> {
    match var_name(node)? {
        VarName::FName(id, _) => Ok(id),
        other => Err(TreeError::NotAFunctionName(other.to_string())),
    }
}

pub fn fname_arity(node: &Node) -> Result<u32, TreeError> {
    match var_name(node)? {
        VarName::FName(_, arity) => Ok(*arity),
        other => Err(TreeError::NotAFunctionName(other.to_string())),
    }
}

pub fn tuple_arity(node: &Node) -> Result<usize, TreeError> {
    match node.literal_value() {
        Some(Term::Tuple(items)) => Ok(items.len()),
        _ => Ok(node.as_tuple()?.es.len()),
    }
}

pub fn values_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_values()?.es.len())
}

pub fn let_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_let()?.vars.len())
}

pub fn fun_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_fun()?.vars.len())
}

pub fn clause_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_clause()?.pats.len())
}

pub fn apply_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_apply()?.args.len())
}

pub fn call_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_call()?.args.len())
}

pub fn primop_arity(node: &Node) -> Result<usize, TreeError> {
    Ok(node.as_primop()?.args.len())
}

/// The function names defined by a module.
pub fn module_vars(node: &Node) -> Result<Vec<Node>, TreeError> {
    Ok(node.as_module()?.defs.iter().map(|(name, _)| name.clone()).collect())
}

/// The function names defined by a letrec.
pub fn letrec_vars(node: &Node) -> Result<Vec<Node>, TreeError> {
    Ok(node.as_letrec()?.defs.iter().map(|(name, _)| name.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::c_cons_skel;
    use crate::node::NodeType;

    #[test]
    fn test_make_list_folds_literal_suffix() {
        let list = make_list(vec![c_var("X"), c_int(1), c_int(2)], None);
        let cons = list.as_cons().unwrap();
        assert_eq!(cons.hd, c_var("X"));
        assert_eq!(
            cons.tl.literal_value(),
            Some(&Term::List(vec![Term::Integer(1), Term::Integer(2)]))
        );
    }

    #[test]
    fn test_make_list_with_tail() {
        let list = make_list(vec![c_int(1)], Some(c_atom("end")));
        assert_eq!(
            list.literal_value(),
            Some(&Term::Improper(vec![Term::Integer(1)], Box::new(Term::atom("end"))))
        );

        let open = make_list(vec![c_int(1), c_int(2)], Some(c_var("T")));
        assert_eq!(open.kind(), NodeType::Cons);
        assert_eq!(list_length(&open).ok(), None);
    }

    #[test]
    fn test_make_list_of_many_literals() {
        let elems: Vec<Node> = (0..10_000).map(c_int).collect();
        let list = make_list(elems, None);
        assert_eq!(list_length(&list).unwrap(), 10_000);
    }

    #[test]
    fn test_list_elements_mixed() {
        let list = c_cons_skel(c_var("X"), abstract_term(Term::List(vec![Term::Integer(7)])));
        assert!(is_c_list(&list));
        let elems = list_elements(&list).unwrap();
        assert_eq!(elems, vec![c_var("X"), c_int(7)]);
        assert!(list_elements(&c_atom("a")).is_err());
    }

    #[test]
    fn test_fname_helpers() {
        let f = c_fname("loop", 3);
        assert!(f.is_fname());
        assert_eq!(fname_id(&f).unwrap().as_str(), "loop");
        assert_eq!(fname_arity(&f).unwrap(), 3);
        assert!(fname_arity(&c_var("X")).is_err());
    }

    #[test]
    fn test_arity_helpers() {
        let fun = c_fun(vec![c_var("A"), c_var("B")], c_var("A"));
        assert_eq!(fun_arity(&fun).unwrap(), 2);
        assert!(call_arity(&fun).is_err());
        assert_eq!(
            tuple_arity(&abstract_term(Term::Tuple(vec![Term::nil(); 3]))).unwrap(),
            3
        );
    }
}
