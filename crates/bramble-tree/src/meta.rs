//! Self-quoting: turning a tree into a tree of constructor calls that
//! rebuilds it.
//!
//! [`meta`] quotes a tree as calls into a constructor module (by default
//! `cerl`). Each call names one of this crate's constructors, so the output
//! can be fed to a code generator or evaluated back with a [`Reifier`].
//!
//! Variables annotated with the meta-variable marker are not quoted. They
//! stay as variables in the output and stand for trees supplied when the
//! generated code runs.

use crate::build::{
    c_alias, c_apply, c_atom, c_binary, c_bitstr, c_call, c_case, c_catch, c_clause, c_float,
    c_fun, c_int, c_let, c_letrec, c_module, c_nil, c_primop, c_receive, c_seq, c_try, c_values,
    c_var, make_list,
};
use crate::error::TreeError;
use crate::literal::{abstract_term, c_cons, c_cons_skel, c_tuple, c_tuple_skel};
use crate::map::{
    c_map_pair, c_map_pattern, c_map_pattern_with_base, c_map_skel, c_map_update, empty_map,
    map_would_fold,
};
use crate::node::{Expr, Node, NodeType, VarName};
use crate::term::{Atom, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Settings for [`meta`] and [`Reifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    /// Module that owns the constructor functions.
    pub module: Atom,
    /// Annotation marking a variable as a meta variable.
    pub marker: Atom,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            module: Atom::new("cerl"),
            marker: Atom::new("meta_var"),
        }
    }
}

/// Quotes `node` as a tree of constructor calls.
pub fn meta(node: &Node, config: &MetaConfig) -> Node {
    debug!(module = %config.module, kind = %node.kind(), "quoting tree");
    Quoter { config }.quote(node)
}

struct Quoter<'a> {
    config: &'a MetaConfig,
}

impl Quoter<'_> {
    fn quote(&self, node: &Node) -> Node {
        let marker = Term::Atom(self.config.marker.clone());
        if node.is_var() {
            if let Some(idx) = node.ann().iter().position(|t| *t == marker) {
                let mut ann = node.ann().to_vec();
                ann.remove(idx);
                return node.clone().with_ann(ann);
            }
        }

        let quoted = self.quote_expr(node);
        if node.ann().is_empty() {
            quoted
        } else {
            let ann = abstract_term(Term::List(node.ann().to_vec()));
            self.call("set_ann", vec![quoted, ann])
        }
    }

    fn quote_expr(&self, node: &Node) -> Node {
        match node.expr() {
            Expr::Literal(lit) => self.quote_literal(&lit.value),
            Expr::Var(var) => self.call("c_var", vec![abstract_term(var.name.to_term())]),
            Expr::Cons(_) => self.quote_cons(node),
            Expr::Tuple(tuple) => {
                let name = if tuple.es.iter().all(Node::is_literal) {
                    "c_tuple_skel"
                } else {
                    "c_tuple"
                };
                self.call(name, vec![self.list(&tuple.es)])
            }
            Expr::Map(map) if map.is_pattern => {
                if map.base == empty_map() {
                    self.call("c_map_pattern", vec![self.list(&map.pairs)])
                } else {
                    self.call(
                        "c_map_pattern_with_base",
                        vec![self.quote(&map.base), self.list(&map.pairs)],
                    )
                }
            }
            Expr::Map(map) => {
                let name = if map_would_fold(&map.base, &map.pairs) {
                    "c_map_skel"
                } else {
                    "c_map_update"
                };
                self.call(name, vec![self.quote(&map.base), self.list(&map.pairs)])
            }
            Expr::MapPair(pair) => self.call(
                "c_map_pair",
                vec![self.quote(&pair.op), self.quote(&pair.key), self.quote(&pair.val)],
            ),
            Expr::Alias(alias) => {
                self.call("c_alias", vec![self.quote(&alias.var), self.quote(&alias.pat)])
            }
            Expr::Apply(apply) => {
                self.call("c_apply", vec![self.quote(&apply.op), self.list(&apply.args)])
            }
            Expr::Binary(binary) => self.call("c_binary", vec![self.list(&binary.segments)]),
            Expr::Bitstr(bitstr) => self.call(
                "c_bitstr",
                vec![
                    self.quote(&bitstr.val),
                    self.quote(&bitstr.size),
                    self.quote(&bitstr.unit),
                    self.quote(&bitstr.ty),
                    self.quote(&bitstr.flags),
                ],
            ),
            Expr::Call(call) => self.call(
                "c_call",
                vec![
                    self.quote(&call.module),
                    self.quote(&call.name),
                    self.list(&call.args),
                ],
            ),
            Expr::Case(case) => {
                self.call("c_case", vec![self.quote(&case.arg), self.list(&case.clauses)])
            }
            Expr::Catch(catch) => self.call("c_catch", vec![self.quote(&catch.body)]),
            Expr::Clause(clause) => self.call(
                "c_clause",
                vec![
                    self.list(&clause.pats),
                    self.quote(&clause.guard),
                    self.quote(&clause.body),
                ],
            ),
            Expr::Fun(fun) => self.call("c_fun", vec![self.list(&fun.vars), self.quote(&fun.body)]),
            Expr::Let(l) => self.call(
                "c_let",
                vec![self.list(&l.vars), self.quote(&l.arg), self.quote(&l.body)],
            ),
            Expr::Letrec(letrec) => self.call(
                "c_letrec",
                vec![self.pair_list(&letrec.defs), self.quote(&letrec.body)],
            ),
            Expr::Module(module) => self.call(
                "c_module",
                vec![
                    self.quote(&module.name),
                    self.list(&module.exports),
                    self.pair_list(&module.attrs),
                    self.pair_list(&module.defs),
                ],
            ),
            Expr::Primop(primop) => self.call(
                "c_primop",
                vec![self.quote(&primop.name), self.list(&primop.args)],
            ),
            Expr::Receive(receive) => self.call(
                "c_receive",
                vec![
                    self.list(&receive.clauses),
                    self.quote(&receive.timeout),
                    self.quote(&receive.action),
                ],
            ),
            Expr::Seq(seq) => self.call("c_seq", vec![self.quote(&seq.arg), self.quote(&seq.body)]),
            Expr::Try(t) => self.call(
                "c_try",
                vec![
                    self.quote(&t.arg),
                    self.list(&t.vars),
                    self.quote(&t.body),
                    self.list(&t.evars),
                    self.quote(&t.handler),
                ],
            ),
            Expr::Values(values) => self.call("c_values", vec![self.list(&values.es)]),
        }
    }

    fn quote_literal(&self, value: &Term) -> Node {
        match value {
            Term::Atom(_) => self.call("c_atom", vec![abstract_term(value.clone())]),
            Term::Integer(_) => self.call("c_int", vec![abstract_term(value.clone())]),
            Term::Float(_) => self.call("c_float", vec![abstract_term(value.clone())]),
            Term::List(items) if items.is_empty() => self.call("c_nil", Vec::new()),
            _ => self.call("abstract", vec![abstract_term(value.clone())]),
        }
    }

    /// Quotes a cons cell, batching a run of plain cells into one
    /// `make_list` call. A cell with both parts literal would fold when
    /// rebuilt, so it ends the run and is quoted as a skeleton.
    fn quote_cons(&self, node: &Node) -> Node {
        let mut heads = Vec::new();
        let mut current = node.clone();
        loop {
            let Expr::Cons(cons) = current.expr() else {
                break;
            };
            let starts_run = heads.is_empty();
            if (!starts_run && !current.ann().is_empty()) || is_skel_cell(&current) {
                break;
            }
            heads.push(cons.hd.clone());
            let next = cons.tl.clone();
            current = next;
        }

        match heads.len() {
            0 => match node.expr() {
                Expr::Cons(cons) => self.call(
                    "c_cons_skel",
                    vec![self.quote(&cons.hd), self.quote(&cons.tl)],
                ),
                _ => self.quote_expr(node),
            },
            1 => self.call("c_cons", vec![self.quote(&heads[0]), self.quote(&current)]),
            _ => self.call("make_list", vec![self.list(&heads), self.quote(&current)]),
        }
    }

    fn list(&self, nodes: &[Node]) -> Node {
        make_list(nodes.iter().map(|n| self.quote(n)).collect(), None)
    }

    fn pair_list(&self, pairs: &[(Node, Node)]) -> Node {
        let tuples = pairs
            .iter()
            .map(|(a, b)| c_tuple(vec![self.quote(a), self.quote(b)]))
            .collect();
        make_list(tuples, None)
    }

    fn call(&self, name: &str, args: Vec<Node>) -> Node {
        c_call(c_atom(self.config.module.clone()), c_atom(name), args)
    }
}

fn is_skel_cell(node: &Node) -> bool {
    matches!(node.expr(), Expr::Cons(cons) if cons.hd.is_literal() && cons.tl.is_literal())
}

/// Errors from evaluating constructor-call trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("call into module `{found}`, expected `{expected}`")]
    ForeignModule { found: String, expected: String },

    #[error("unknown constructor: {0}")]
    UnknownConstructor(String),

    #[error("invalid argument count for {name}: expected {expected}, got {got}")]
    InvalidArgCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument for {name} at position {position}: expected {expected}")]
    InvalidArgType {
        name: String,
        position: usize,
        expected: &'static str,
    },

    #[error("unbound meta variable {0}")]
    Unbound(VarName),

    #[error("cannot evaluate a {0} node")]
    NotEvaluable(NodeType),

    #[error("improper list in constructor arguments")]
    ImproperList,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Evaluates the output of [`meta`], rebuilding the quoted tree.
///
/// Only calls into the configured module are understood. Meta variables
/// are looked up in the bindings given with [`Reifier::bind`].
#[derive(Debug, Clone)]
pub struct Reifier<'a> {
    config: &'a MetaConfig,
    bindings: HashMap<VarName, Node>,
}

#[derive(Debug, Clone)]
enum Value {
    Term(Term),
    Node(Node),
    List(Vec<Value>),
    Tuple(Vec<Value>),
}

impl<'a> Reifier<'a> {
    pub fn new(config: &'a MetaConfig) -> Self {
        Self {
            config,
            bindings: HashMap::new(),
        }
    }

    /// Binds a meta variable to the tree it stands for.
    pub fn bind(mut self, name: impl Into<VarName>, node: Node) -> Self {
        self.bindings.insert(name.into(), node);
        self
    }

    pub fn reify(&self, expr: &Node) -> Result<Node, MetaError> {
        match self.eval(expr)? {
            Value::Node(node) => Ok(node),
            _ => Err(MetaError::NotEvaluable(expr.kind())),
        }
    }

    fn eval(&self, expr: &Node) -> Result<Value, MetaError> {
        match expr.expr() {
            Expr::Literal(lit) => Ok(Value::Term(lit.value.clone())),
            Expr::Var(var) => self
                .bindings
                .get(&var.name)
                .cloned()
                .map(Value::Node)
                .ok_or_else(|| MetaError::Unbound(var.name.clone())),
            Expr::Cons(_) => self.eval_list(expr),
            Expr::Tuple(tuple) => Ok(Value::Tuple(
                tuple
                    .es
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Call(call) => {
                let module = call.module.literal_value().and_then(Term::as_atom);
                if module != Some(&self.config.module) {
                    return Err(MetaError::ForeignModule {
                        found: call.module.literal_value().map_or_else(
                            || call.module.kind().to_string(),
                            |t| t.to_string(),
                        ),
                        expected: self.config.module.to_string(),
                    });
                }
                let Some(name) = call.name.literal_value().and_then(Term::as_atom) else {
                    return Err(MetaError::UnknownConstructor(call.name.kind().to_string()));
                };
                let args = call
                    .args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                construct(name.as_str(), args).map(Value::Node)
            }
            other => Err(MetaError::NotEvaluable(other.kind())),
        }
    }

    fn eval_list(&self, expr: &Node) -> Result<Value, MetaError> {
        let mut items = Vec::new();
        let mut current = expr.clone();
        while let Expr::Cons(cons) = current.expr() {
            items.push(self.eval(&cons.hd)?);
            let next = cons.tl.clone();
            current = next;
        }
        match current.literal_value() {
            Some(Term::List(rest)) => {
                items.extend(rest.iter().cloned().map(Value::Term));
                Ok(Value::List(items))
            }
            _ => Err(MetaError::ImproperList),
        }
    }
}

/// Evaluates `expr` with no meta-variable bindings.
pub fn reify(expr: &Node, config: &MetaConfig) -> Result<Node, MetaError> {
    Reifier::new(config).reify(expr)
}

fn constructor_arity(name: &str) -> Option<usize> {
    Some(match name {
        "c_nil" => 0,
        "c_atom" | "c_int" | "c_float" | "abstract" | "c_var" | "c_tuple" | "c_tuple_skel"
        | "c_map_pattern" | "c_binary" | "c_catch" | "c_values" => 1,
        "set_ann" | "c_cons" | "c_cons_skel" | "make_list" | "c_map_update" | "c_map_skel"
        | "c_map_pattern_with_base" | "c_alias" | "c_apply" | "c_case" | "c_fun" | "c_letrec"
        | "c_primop" | "c_seq" => 2,
        "c_map_pair" | "c_call" | "c_clause" | "c_let" | "c_receive" => 3,
        "c_module" => 4,
        "c_bitstr" | "c_try" => 5,
        _ => return None,
    })
}

fn construct(name: &str, args: Vec<Value>) -> Result<Node, MetaError> {
    let expected =
        constructor_arity(name).ok_or_else(|| MetaError::UnknownConstructor(name.to_string()))?;
    if args.len() != expected {
        return Err(MetaError::InvalidArgCount {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    let mut a = Args {
        name,
        values: args.into_iter(),
        position: 0,
    };

    let node = match name {
        "c_nil" => c_nil(),
        "c_atom" => match a.term()? {
            Term::Atom(atom) => c_atom(atom),
            _ => return Err(a.invalid("an atom")),
        },
        "c_int" => match a.term()? {
            Term::Integer(n) => c_int(n),
            _ => return Err(a.invalid("an integer")),
        },
        "c_float" => match a.term()? {
            Term::Float(x) => c_float(x),
            _ => return Err(a.invalid("a float")),
        },
        "abstract" => abstract_term(a.term()?),
        "c_var" => match VarName::from_term(&a.term()?) {
            Some(name) => c_var(name),
            None => return Err(a.invalid("a variable name")),
        },
        "set_ann" => {
            let node = a.node()?;
            match a.term()? {
                Term::List(ann) => node.with_ann(ann),
                _ => return Err(a.invalid("an annotation list")),
            }
        }
        "c_cons" => c_cons(a.node()?, a.node()?),
        "c_cons_skel" => c_cons_skel(a.node()?, a.node()?),
        "make_list" => {
            let elems = a.nodes()?;
            make_list(elems, Some(a.node()?))
        }
        "c_tuple" => c_tuple(a.nodes()?),
        "c_tuple_skel" => c_tuple_skel(a.nodes()?),
        "c_map_update" => c_map_update(a.node()?, a.nodes()?),
        "c_map_skel" => c_map_skel(a.node()?, a.nodes()?),
        "c_map_pattern" => c_map_pattern(a.nodes()?),
        "c_map_pattern_with_base" => c_map_pattern_with_base(a.node()?, a.nodes()?),
        "c_map_pair" => c_map_pair(a.node()?, a.node()?, a.node()?),
        "c_alias" => c_alias(a.node()?, a.node()?),
        "c_apply" => c_apply(a.node()?, a.nodes()?),
        "c_binary" => c_binary(a.nodes()?),
        "c_bitstr" => c_bitstr(a.node()?, a.node()?, a.node()?, a.node()?, a.node()?),
        "c_call" => c_call(a.node()?, a.node()?, a.nodes()?),
        "c_case" => c_case(a.node()?, a.nodes()?),
        "c_catch" => c_catch(a.node()?),
        "c_clause" => c_clause(a.nodes()?, a.node()?, a.node()?),
        "c_fun" => c_fun(a.nodes()?, a.node()?),
        "c_let" => c_let(a.nodes()?, a.node()?, a.node()?),
        "c_letrec" => c_letrec(a.pairs()?, a.node()?),
        "c_module" => c_module(a.node()?, a.nodes()?, a.pairs()?, a.pairs()?),
        "c_primop" => c_primop(a.node()?, a.nodes()?),
        "c_receive" => c_receive(a.nodes()?, a.node()?, a.node()?),
        "c_seq" => c_seq(a.node()?, a.node()?),
        "c_try" => c_try(a.node()?, a.nodes()?, a.node()?, a.nodes()?, a.node()?),
        "c_values" => c_values(a.nodes()?),
        _ => return Err(MetaError::UnknownConstructor(name.to_string())),
    };
    Ok(node)
}

struct Args<'a> {
    name: &'a str,
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Args<'_> {
    fn invalid(&self, expected: &'static str) -> MetaError {
        MetaError::InvalidArgType {
            name: self.name.to_string(),
            position: self.position,
            expected,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<Value, MetaError> {
        self.position += 1;
        self.values.next().ok_or_else(|| self.invalid(expected))
    }

    fn term(&mut self) -> Result<Term, MetaError> {
        match self.next("a literal")? {
            Value::Term(term) => Ok(term),
            _ => Err(self.invalid("a literal")),
        }
    }

    fn node(&mut self) -> Result<Node, MetaError> {
        match self.next("a tree")? {
            Value::Node(node) => Ok(node),
            _ => Err(self.invalid("a tree")),
        }
    }

    fn nodes(&mut self) -> Result<Vec<Node>, MetaError> {
        let items = match self.next("a list of trees")? {
            Value::List(items) => items,
            Value::Term(term) if term.is_nil() => Vec::new(),
            _ => return Err(self.invalid("a list of trees")),
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Node(node) => Ok(node),
                _ => Err(self.invalid("a list of trees")),
            })
            .collect()
    }

    fn pairs(&mut self) -> Result<Vec<(Node, Node)>, MetaError> {
        let items = match self.next("a list of pairs")? {
            Value::List(items) => items,
            Value::Term(term) if term.is_nil() => Vec::new(),
            _ => return Err(self.invalid("a list of pairs")),
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::Tuple(parts) => match <[Value; 2]>::try_from(parts) {
                    Ok([Value::Node(a), Value::Node(b)]) => Ok((a, b)),
                    _ => Err(self.invalid("a list of pairs")),
                },
                _ => Err(self.invalid("a list of pairs")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::c_fname;
    use crate::map::{c_map, c_map_pair_assoc, c_map_pair_exact};

    fn roundtrip(node: &Node) -> Node {
        let config = MetaConfig::default();
        reify(&meta(node, &config), &config).unwrap()
    }

    fn callee(quoted: &Node) -> String {
        let call = quoted.as_call().unwrap();
        call.name.literal_value().unwrap().to_string()
    }

    #[test]
    fn test_atomic_literals_use_specific_constructors() {
        let config = MetaConfig::default();
        assert_eq!(callee(&meta(&c_atom("ok"), &config)), "c_atom");
        assert_eq!(callee(&meta(&c_int(3), &config)), "c_int");
        assert_eq!(callee(&meta(&c_float(1.5), &config)), "c_float");
        assert_eq!(callee(&meta(&c_nil(), &config)), "c_nil");
        let tuple = abstract_term(Term::Tuple(vec![Term::atom("a")]));
        assert_eq!(callee(&meta(&tuple, &config)), "abstract");
    }

    #[test]
    fn test_calls_target_configured_module() {
        let config = MetaConfig {
            module: Atom::new("core_ir"),
            ..MetaConfig::default()
        };
        let quoted = meta(&c_var("X"), &config);
        assert_eq!(
            quoted.as_call().unwrap().module.literal_value(),
            Some(&Term::atom("core_ir"))
        );
        assert!(reify(&quoted, &MetaConfig::default()).is_err());
        assert_eq!(reify(&quoted, &config).unwrap(), c_var("X"));
    }

    #[test]
    fn test_annotations_wrap_in_set_ann() {
        let node = c_var("X").with_ann(vec![Term::atom("line"), Term::from(3)]);
        let quoted = meta(&node, &MetaConfig::default());
        assert_eq!(callee(&quoted), "set_ann");
        assert_eq!(roundtrip(&node), node);
    }

    #[test]
    fn test_meta_variable_passes_through() {
        let config = MetaConfig::default();
        let marker = Term::atom("meta_var");
        let var = c_var("Body").with_ann(vec![marker.clone(), Term::atom("keep"), marker.clone()]);
        let quoted = meta(&c_seq(c_atom("ok"), var), &config);

        let body = &quoted.as_call().unwrap().args[1];
        assert!(body.is_var());
        assert_eq!(body.ann(), &[Term::atom("keep"), marker]);

        let reified = Reifier::new(&config)
            .bind("Body", c_int(42))
            .reify(&quoted)
            .unwrap();
        assert_eq!(reified, c_seq(c_atom("ok"), c_int(42)));
        assert_eq!(
            reify(&quoted, &config),
            Err(MetaError::Unbound(VarName::from("Body")))
        );
    }

    #[test]
    fn test_cons_runs_batch_into_make_list() {
        let list = make_list(vec![c_var("A"), c_var("B"), c_var("C")], Some(c_var("T")));
        let quoted = meta(&list, &MetaConfig::default());
        assert_eq!(callee(&quoted), "make_list");
        assert_eq!(roundtrip(&list), list);

        let single = c_cons(c_var("A"), c_var("T"));
        assert_eq!(callee(&meta(&single, &MetaConfig::default())), "c_cons");
    }

    #[test]
    fn test_skeletons_reproduce_exactly() {
        let cons = c_cons_skel(c_int(1), c_nil());
        assert_eq!(callee(&meta(&cons, &MetaConfig::default())), "c_cons_skel");
        assert_eq!(roundtrip(&cons), cons);

        let chain = c_cons_skel(c_var("X"), c_cons_skel(c_int(1), c_nil()));
        assert_eq!(roundtrip(&chain), chain);

        let tuple = c_tuple_skel(vec![c_int(1), c_atom("a")]);
        assert_eq!(roundtrip(&tuple), tuple);

        let empty = c_tuple_skel(Vec::new());
        assert_eq!(roundtrip(&empty), empty);
    }

    #[test]
    fn test_annotated_cell_interrupts_run() {
        let inner = c_cons(c_var("B"), c_var("T")).with_ann(vec![Term::atom("inner")]);
        let list = c_cons(c_var("A"), inner);
        assert_eq!(callee(&meta(&list, &MetaConfig::default())), "c_cons");
        assert_eq!(roundtrip(&list), list);
    }

    #[test]
    fn test_maps_reproduce_exactly() {
        let unfolded = c_map_skel(
            c_map(Vec::new()),
            vec![c_map_pair_assoc(c_atom("k"), c_atom("v"))],
        );
        assert_eq!(callee(&meta(&unfolded, &MetaConfig::default())), "c_map_skel");
        assert_eq!(roundtrip(&unfolded), unfolded);

        let update = c_map_update(c_var("M"), vec![c_map_pair_exact(c_atom("k"), c_var("V"))]);
        assert_eq!(roundtrip(&update), update);

        let pattern = c_map_pattern(vec![c_map_pair_exact(c_atom("k"), c_var("V"))]);
        assert_eq!(callee(&meta(&pattern, &MetaConfig::default())), "c_map_pattern");
        assert_eq!(roundtrip(&pattern), pattern);

        let based = c_map_pattern_with_base(
            c_var("B"),
            vec![c_map_pair_exact(c_atom("k"), c_var("V"))],
        );
        assert_eq!(
            callee(&meta(&based, &MetaConfig::default())),
            "c_map_pattern_with_base"
        );
        assert_eq!(roundtrip(&based), based);
    }

    #[test]
    fn test_letrec_and_module_roundtrip() {
        let f = c_fname("f", 1);
        let fun = c_fun(vec![c_var("X")], c_apply(f.clone(), vec![c_var("X")]));
        let letrec = c_letrec(vec![(f.clone(), fun.clone())], c_apply(f.clone(), vec![c_int(0)]));
        assert_eq!(roundtrip(&letrec), letrec);

        let module = c_module(
            c_atom("m"),
            vec![f.clone()],
            vec![(c_atom("vsn"), abstract_term(Term::List(vec![Term::from(1)])))],
            vec![(f, fun)],
        );
        assert_eq!(roundtrip(&module), module);
    }

    #[test]
    fn test_reify_rejects_malformed_calls() {
        let config = MetaConfig::default();
        let cerl = || c_atom("cerl");
        let unknown = c_call(cerl(), c_atom("c_frobnicate"), Vec::new());
        assert_eq!(
            reify(&unknown, &config),
            Err(MetaError::UnknownConstructor("c_frobnicate".to_string()))
        );
        let wrong_count = c_call(cerl(), c_atom("c_seq"), vec![c_nil()]);
        assert!(matches!(
            reify(&wrong_count, &config),
            Err(MetaError::InvalidArgCount { expected: 2, got: 1, .. })
        ));
        let wrong_type = c_call(cerl(), c_atom("c_atom"), vec![c_int(1)]);
        assert!(matches!(
            reify(&wrong_type, &config),
            Err(MetaError::InvalidArgType { position: 1, .. })
        ));
    }
}
