//! Node model: kinds, payloads and annotations.

use crate::error::TreeError;
use crate::term::{Atom, Term};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Alias,
    Apply,
    Binary,
    Bitstr,
    Call,
    Case,
    Catch,
    Clause,
    Cons,
    Fun,
    Let,
    Letrec,
    Literal,
    Map,
    MapPair,
    Module,
    Primop,
    Receive,
    Seq,
    Try,
    Tuple,
    Values,
    Var,
}

impl NodeType {
    pub const ALL: [NodeType; 23] = [
        NodeType::Alias,
        NodeType::Apply,
        NodeType::Binary,
        NodeType::Bitstr,
        NodeType::Call,
        NodeType::Case,
        NodeType::Catch,
        NodeType::Clause,
        NodeType::Cons,
        NodeType::Fun,
        NodeType::Let,
        NodeType::Letrec,
        NodeType::Literal,
        NodeType::Map,
        NodeType::MapPair,
        NodeType::Module,
        NodeType::Primop,
        NodeType::Receive,
        NodeType::Seq,
        NodeType::Try,
        NodeType::Tuple,
        NodeType::Values,
        NodeType::Var,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Alias => "alias",
            NodeType::Apply => "apply",
            NodeType::Binary => "binary",
            NodeType::Bitstr => "bitstr",
            NodeType::Call => "call",
            NodeType::Case => "case",
            NodeType::Catch => "catch",
            NodeType::Clause => "clause",
            NodeType::Cons => "cons",
            NodeType::Fun => "fun",
            NodeType::Let => "let",
            NodeType::Letrec => "letrec",
            NodeType::Literal => "literal",
            NodeType::Map => "map",
            NodeType::MapPair => "map_pair",
            NodeType::Module => "module",
            NodeType::Primop => "primop",
            NodeType::Receive => "receive",
            NodeType::Seq => "seq",
            NodeType::Try => "try",
            NodeType::Tuple => "tuple",
            NodeType::Values => "values",
            NodeType::Var => "var",
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, NodeType::Literal | NodeType::Var)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name of a variable.
///
/// `FName` variables name functions. They bind only in `Letrec` and
/// `Module` definition lists; elsewhere they appear as references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VarName {
    Int(i64),
    Atom(Atom),
    FName(Atom, u32),
}

impl VarName {
    /// The name as a host term: an integer, an atom or an `{Atom, Arity}` tuple.
    pub fn to_term(&self) -> Term {
        match self {
            VarName::Int(n) => Term::Integer(*n),
            VarName::Atom(a) => Term::Atom(a.clone()),
            VarName::FName(a, arity) => {
                Term::Tuple(vec![Term::Atom(a.clone()), Term::Integer(*arity as i64)])
            }
        }
    }

    pub fn from_term(term: &Term) -> Option<VarName> {
        match term {
            Term::Integer(n) => Some(VarName::Int(*n)),
            Term::Atom(a) => Some(VarName::Atom(a.clone())),
            Term::Tuple(items) => match items.as_slice() {
                [Term::Atom(a), Term::Integer(arity)] => {
                    let arity = u32::try_from(*arity).ok()?;
                    Some(VarName::FName(a.clone(), arity))
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_fname(&self) -> bool {
        matches!(self, VarName::FName(..))
    }
}

impl From<&str> for VarName {
    fn from(value: &str) -> Self {
        VarName::Atom(Atom::new(value))
    }
}

impl From<Atom> for VarName {
    fn from(value: Atom) -> Self {
        VarName::Atom(value)
    }
}

impl From<i64> for VarName {
    fn from(value: i64) -> Self {
        VarName::Int(value)
    }
}

impl From<(&str, u32)> for VarName {
    fn from((name, arity): (&str, u32)) -> Self {
        VarName::FName(Atom::new(name), arity)
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarName::Int(n) => write!(f, "_{}", n),
            VarName::Atom(a) => write!(f, "{}", a),
            VarName::FName(a, arity) => write!(f, "'{}'/{}", a, arity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub var: Node,
    pub pat: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apply {
    pub op: Node,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub segments: Vec<Node>,
}

/// One segment of a binary: value, size expression, unit, type and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitstr {
    pub val: Node,
    pub size: Node,
    pub unit: Node,
    #[serde(rename = "type")]
    pub ty: Node,
    pub flags: Node,
}

/// A remote call `module:name(args)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub module: Node,
    pub name: Node,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub arg: Node,
    pub clauses: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catch {
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub pats: Vec<Node>,
    pub guard: Node,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cons {
    pub hd: Node,
    pub tl: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fun {
    pub vars: Vec<Node>,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Let {
    pub vars: Vec<Node>,
    pub arg: Node,
    pub body: Node,
}

/// Mutually recursive local functions: `(fname var, fun)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letrec {
    pub defs: Vec<(Node, Node)>,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Term,
}

/// A map expression or pattern: `base` updated by `pairs` in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub base: Node,
    pub pairs: Vec<Node>,
    #[serde(default)]
    pub is_pattern: bool,
}

/// One map update. `op` is normally the literal atom `assoc` or `exact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPair {
    pub op: Node,
    pub key: Node,
    pub val: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: Node,
    pub exports: Vec<Node>,
    pub attrs: Vec<(Node, Node)>,
    pub defs: Vec<(Node, Node)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primop {
    pub name: Node,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receive {
    pub clauses: Vec<Node>,
    pub timeout: Node,
    pub action: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seq {
    pub arg: Node,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Try {
    pub arg: Node,
    pub vars: Vec<Node>,
    pub body: Node,
    pub evars: Vec<Node>,
    pub handler: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    pub es: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Values {
    pub es: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    pub name: VarName,
}

/// Kind-specific contents of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Alias(Alias),
    Apply(Apply),
    Binary(Binary),
    Bitstr(Bitstr),
    Call(Call),
    Case(Case),
    Catch(Catch),
    Clause(Clause),
    Cons(Cons),
    Fun(Fun),
    Let(Let),
    Letrec(Letrec),
    Literal(Literal),
    Map(Map),
    MapPair(MapPair),
    Module(Module),
    Primop(Primop),
    Receive(Receive),
    Seq(Seq),
    Try(Try),
    Tuple(Tuple),
    Values(Values),
    Var(Var),
}

impl Expr {
    pub fn kind(&self) -> NodeType {
        match self {
            Expr::Alias(_) => NodeType::Alias,
            Expr::Apply(_) => NodeType::Apply,
            Expr::Binary(_) => NodeType::Binary,
            Expr::Bitstr(_) => NodeType::Bitstr,
            Expr::Call(_) => NodeType::Call,
            Expr::Case(_) => NodeType::Case,
            Expr::Catch(_) => NodeType::Catch,
            Expr::Clause(_) => NodeType::Clause,
            Expr::Cons(_) => NodeType::Cons,
            Expr::Fun(_) => NodeType::Fun,
            Expr::Let(_) => NodeType::Let,
            Expr::Letrec(_) => NodeType::Letrec,
            Expr::Literal(_) => NodeType::Literal,
            Expr::Map(_) => NodeType::Map,
            Expr::MapPair(_) => NodeType::MapPair,
            Expr::Module(_) => NodeType::Module,
            Expr::Primop(_) => NodeType::Primop,
            Expr::Receive(_) => NodeType::Receive,
            Expr::Seq(_) => NodeType::Seq,
            Expr::Try(_) => NodeType::Try,
            Expr::Tuple(_) => NodeType::Tuple,
            Expr::Values(_) => NodeType::Values,
            Expr::Var(_) => NodeType::Var,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ann: Vec<Term>,
    expr: Expr,
}

/// An immutable tree node.
///
/// Nodes are built only through the constructor functions of this crate,
/// so every node carries a kind and an annotation list. Cloning is cheap
/// and children may be shared freely between trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn new(expr: Expr) -> Self {
        Node(Arc::new(NodeData {
            ann: Vec::new(),
            expr,
        }))
    }

    pub fn kind(&self) -> NodeType {
        self.0.expr.kind()
    }

    pub fn expr(&self) -> &Expr {
        &self.0.expr
    }

    pub fn ann(&self) -> &[Term] {
        &self.0.ann
    }

    /// Replaces the annotation list.
    pub fn with_ann(mut self, ann: Vec<Term>) -> Node {
        Arc::make_mut(&mut self.0).ann = ann;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.kind().is_leaf()
    }

    pub fn is_literal(&self) -> bool {
        self.kind() == NodeType::Literal
    }

    pub fn is_var(&self) -> bool {
        self.kind() == NodeType::Var
    }

    /// True for a variable naming a function.
    pub fn is_fname(&self) -> bool {
        matches!(self.expr(), Expr::Var(Var { name }) if name.is_fname())
    }

    /// The literal value, if this is a literal.
    pub fn literal_value(&self) -> Option<&Term> {
        match self.expr() {
            Expr::Literal(lit) => Some(&lit.value),
            _ => None,
        }
    }

    /// The literal value by value. Moved out when this is the only handle
    /// to the node, cloned otherwise. Non-literals are handed back.
    pub(crate) fn into_literal(mut self) -> Result<Term, Node> {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            if let Expr::Literal(lit) = &mut data.expr {
                return Ok(std::mem::replace(&mut lit.value, Term::nil()));
            }
        }
        match self.literal_value() {
            Some(value) => Ok(value.clone()),
            None => Err(self),
        }
    }
}

/// Structural equality over kinds, payloads and annotations. Shared
/// subtrees compare by pointer; the rest is walked with a worklist.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if Arc::ptr_eq(&a.0, &b.0) {
                continue;
            }
            if a.ann() != b.ann() || !same_payload(a.expr(), b.expr()) {
                return false;
            }
            let (left, right) = (child_slots(a.expr()), child_slots(b.expr()));
            if left.len() != right.len() {
                return false;
            }
            for (x, y) in left.into_iter().zip(right) {
                if x.len() != y.len() {
                    return false;
                }
                pending.extend(x.iter().zip(y));
            }
        }
        true
    }
}

impl Eq for Node {}

/// Compares everything except child nodes.
fn same_payload(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) => x.value == y.value,
        (Expr::Var(x), Expr::Var(y)) => x.name == y.name,
        (Expr::Map(x), Expr::Map(y)) => x.is_pattern == y.is_pattern,
        _ => a.kind() == b.kind(),
    }
}

/// Child nodes grouped so that two payloads of one kind have equal slot
/// lengths exactly when their child lists line up. Pair lists become one
/// slot per pair; module attributes and definitions are split by an empty
/// slot.
fn child_slots(expr: &Expr) -> Vec<&[Node]> {
    use std::slice::from_ref as one;

    fn pairs<'a>(out: &mut Vec<&'a [Node]>, pairs: &'a [(Node, Node)]) {
        for (a, b) in pairs {
            out.extend([one(a), one(b)]);
        }
    }

    match expr {
        Expr::Literal(_) | Expr::Var(_) => Vec::new(),
        Expr::Alias(x) => vec![one(&x.var), one(&x.pat)],
        Expr::Apply(x) => vec![one(&x.op), x.args.as_slice()],
        Expr::Binary(x) => vec![x.segments.as_slice()],
        Expr::Bitstr(x) => vec![
            one(&x.val),
            one(&x.size),
            one(&x.unit),
            one(&x.ty),
            one(&x.flags),
        ],
        Expr::Call(x) => vec![one(&x.module), one(&x.name), x.args.as_slice()],
        Expr::Case(x) => vec![one(&x.arg), x.clauses.as_slice()],
        Expr::Catch(x) => vec![one(&x.body)],
        Expr::Clause(x) => vec![x.pats.as_slice(), one(&x.guard), one(&x.body)],
        Expr::Cons(x) => vec![one(&x.hd), one(&x.tl)],
        Expr::Fun(x) => vec![x.vars.as_slice(), one(&x.body)],
        Expr::Let(x) => vec![x.vars.as_slice(), one(&x.arg), one(&x.body)],
        Expr::Letrec(x) => {
            let mut out = Vec::new();
            pairs(&mut out, &x.defs);
            out.push(one(&x.body));
            out
        }
        Expr::Map(x) => vec![one(&x.base), x.pairs.as_slice()],
        Expr::MapPair(x) => vec![one(&x.op), one(&x.key), one(&x.val)],
        Expr::Module(x) => {
            let mut out = vec![one(&x.name), x.exports.as_slice()];
            pairs(&mut out, &x.attrs);
            out.push(&[]);
            pairs(&mut out, &x.defs);
            out
        }
        Expr::Primop(x) => vec![one(&x.name), x.args.as_slice()],
        Expr::Receive(x) => vec![x.clauses.as_slice(), one(&x.timeout), one(&x.action)],
        Expr::Seq(x) => vec![one(&x.arg), one(&x.body)],
        Expr::Try(x) => vec![
            one(&x.arg),
            x.vars.as_slice(),
            one(&x.body),
            x.evars.as_slice(),
            one(&x.handler),
        ],
        Expr::Tuple(x) => vec![x.es.as_slice()],
        Expr::Values(x) => vec![x.es.as_slice()],
    }
}

// Long cons chains and let/seq spines would otherwise be dropped
// recursively, one stack frame per level.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

fn detach_children(node: &mut Node, out: &mut Vec<Node>) {
    let Some(data) = Arc::get_mut(&mut node.0) else {
        return;
    };
    let placeholder = Expr::Literal(Literal { value: Term::nil() });
    match std::mem::replace(&mut data.expr, placeholder) {
        Expr::Literal(_) | Expr::Var(_) => {}
        Expr::Alias(Alias { var, pat }) => out.extend([var, pat]),
        Expr::Apply(Apply { op, args }) => {
            out.push(op);
            out.extend(args);
        }
        Expr::Binary(Binary { segments }) => out.extend(segments),
        Expr::Bitstr(Bitstr {
            val,
            size,
            unit,
            ty,
            flags,
        }) => out.extend([val, size, unit, ty, flags]),
        Expr::Call(Call { module, name, args }) => {
            out.extend([module, name]);
            out.extend(args);
        }
        Expr::Case(Case { arg, clauses }) => {
            out.push(arg);
            out.extend(clauses);
        }
        Expr::Catch(Catch { body }) => out.push(body),
        Expr::Clause(Clause { pats, guard, body }) => {
            out.extend(pats);
            out.extend([guard, body]);
        }
        Expr::Cons(Cons { hd, tl }) => out.extend([hd, tl]),
        Expr::Fun(Fun { vars, body }) => {
            out.extend(vars);
            out.push(body);
        }
        Expr::Let(Let { vars, arg, body }) => {
            out.extend(vars);
            out.extend([arg, body]);
        }
        Expr::Letrec(Letrec { defs, body }) => {
            for (name, fun) in defs {
                out.extend([name, fun]);
            }
            out.push(body);
        }
        Expr::Map(Map { base, pairs, .. }) => {
            out.push(base);
            out.extend(pairs);
        }
        Expr::MapPair(MapPair { op, key, val }) => out.extend([op, key, val]),
        Expr::Module(Module {
            name,
            exports,
            attrs,
            defs,
        }) => {
            out.push(name);
            out.extend(exports);
            for (key, value) in attrs.into_iter().chain(defs) {
                out.extend([key, value]);
            }
        }
        Expr::Primop(Primop { name, args }) => {
            out.push(name);
            out.extend(args);
        }
        Expr::Receive(Receive {
            clauses,
            timeout,
            action,
        }) => {
            out.extend(clauses);
            out.extend([timeout, action]);
        }
        Expr::Seq(Seq { arg, body }) => out.extend([arg, body]),
        Expr::Try(Try {
            arg,
            vars,
            body,
            evars,
            handler,
        }) => {
            out.push(arg);
            out.extend(vars);
            out.push(body);
            out.extend(evars);
            out.push(handler);
        }
        Expr::Tuple(Tuple { es }) | Expr::Values(Values { es }) => out.extend(es),
    }
}

macro_rules! kind_accessors {
    ($($method:ident => $variant:ident),* $(,)?) => {
        impl Node {
            $(
                #[doc = concat!(
                    "The `", stringify!($variant), "` payload, or a `WrongKind` violation."
                )]
                pub fn $method(&self) -> Result<&$variant, TreeError> {
                    match self.expr() {
                        Expr::$variant(inner) => Ok(inner),
                        other => Err(TreeError::WrongKind {
                            expected: NodeType::$variant,
                            found: other.kind(),
                        }),
                    }
                }
            )*
        }
    };
}

kind_accessors! {
    as_alias => Alias,
    as_apply => Apply,
    as_binary => Binary,
    as_bitstr => Bitstr,
    as_call => Call,
    as_case => Case,
    as_catch => Catch,
    as_clause => Clause,
    as_cons => Cons,
    as_fun => Fun,
    as_let => Let,
    as_letrec => Letrec,
    as_literal => Literal,
    as_map => Map,
    as_map_pair => MapPair,
    as_module => Module,
    as_primop => Primop,
    as_receive => Receive,
    as_seq => Seq,
    as_try => Try,
    as_tuple => Tuple,
    as_values => Values,
    as_var => Var,
}

pub fn get_ann(node: &Node) -> &[Term] {
    node.ann()
}

pub fn set_ann(node: Node, ann: Vec<Term>) -> Node {
    node.with_ann(ann)
}

/// Prepends `terms` to the node's annotations.
pub fn add_ann(mut terms: Vec<Term>, node: Node) -> Node {
    if terms.is_empty() {
        return node;
    }
    terms.extend_from_slice(node.ann());
    node.with_ann(terms)
}

/// Replaces the annotations of `dst` with those of `src`.
pub fn copy_ann(src: &Node, dst: Node) -> Node {
    if src.ann() == dst.ann() {
        return dst;
    }
    dst.with_ann(src.ann().to_vec())
}

/// Hook for converting to an external record layout. Currently the identity.
pub fn to_records(node: Node) -> Node {
    node
}

/// Inverse of [`to_records`]. Currently the identity.
pub fn from_records(node: Node) -> Node {
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{c_atom, c_int, c_module, c_nil, c_seq, c_try, c_var};
    use crate::literal::c_cons_skel;

    #[test]
    fn test_kind_and_leaf() {
        assert_eq!(c_atom("ok").kind(), NodeType::Literal);
        assert!(c_atom("ok").is_leaf());
        assert!(c_var("X").is_leaf());
        let seq = c_seq(c_var("X"), c_int(1));
        assert_eq!(seq.kind(), NodeType::Seq);
        assert!(!seq.is_leaf());
    }

    #[test]
    fn test_add_ann_prepends() {
        let node = set_ann(c_var("X"), vec![Term::atom("old")]);
        let node = add_ann(vec![Term::atom("new1"), Term::atom("new2")], node);
        assert_eq!(
            get_ann(&node),
            &[Term::atom("new1"), Term::atom("new2"), Term::atom("old")]
        );
    }

    #[test]
    fn test_copy_ann_overwrites() {
        let src = set_ann(c_int(1), vec![Term::atom("line")]);
        let dst = set_ann(c_var("X"), vec![Term::atom("a"), Term::atom("b")]);
        let dst = copy_ann(&src, dst);
        assert_eq!(get_ann(&dst), &[Term::atom("line")]);
        assert!(dst.is_var());
    }

    #[test]
    fn test_accessor_wrong_kind() {
        let err = c_int(1).as_case().unwrap_err();
        assert_eq!(
            err,
            TreeError::WrongKind {
                expected: NodeType::Case,
                found: NodeType::Literal,
            }
        );
        assert_eq!(err.to_string(), "expected a case node, got literal");
    }

    #[test]
    fn test_var_name_terms() {
        let fname = VarName::from(("f", 2));
        let term = fname.to_term();
        assert_eq!(term, Term::Tuple(vec![Term::atom("f"), Term::Integer(2)]));
        assert_eq!(VarName::from_term(&term), Some(fname));
        assert_eq!(VarName::from_term(&Term::from(1.5)), None);
    }

    #[test]
    fn test_equality_of_long_spines() {
        let build = |last: i64| {
            let mut list = c_nil();
            for n in (0..=last).rev() {
                list = c_cons_skel(c_int(n), list);
            }
            list
        };
        let (a, b) = (build(20_000), build(20_000));
        assert!(a == b);
        assert!(a != build(19_999));
        assert!(a != c_cons_skel(c_int(-1), b));
    }

    #[test]
    fn test_equality_sees_slot_boundaries() {
        let x = || vec![c_var("X")];
        let try_vars = c_try(c_var("A"), x(), c_var("B"), vec![], c_var("C"));
        let try_evars = c_try(c_var("A"), vec![], c_var("B"), x(), c_var("C"));
        assert!(try_vars != try_evars);

        let pair = || vec![(c_atom("f"), c_atom("g"))];
        let attrs = c_module(c_atom("m"), vec![], pair(), vec![]);
        let defs = c_module(c_atom("m"), vec![], vec![], pair());
        assert!(attrs != defs);
        assert!(attrs == c_module(c_atom("m"), vec![], pair(), vec![]));
    }

    #[test]
    fn test_equality_checks_annotations_and_payloads() {
        let plain = c_seq(c_var("X"), c_int(1));
        assert_ne!(plain, plain.clone().with_ann(vec![Term::atom("a")]));
        assert_ne!(plain, c_seq(c_var("X"), c_int(2)));
        assert_ne!(c_var("X"), c_atom("X"));
        assert_eq!(plain, plain.clone());
    }

    #[test]
    fn test_all_kinds_render_distinct_names() {
        let names: std::collections::HashSet<_> =
            NodeType::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(names.len(), NodeType::ALL.len());
    }
}
