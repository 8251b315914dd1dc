//! Core IR trees for Bramble.
//!
//! This crate defines the tree representation shared by the compiler
//! passes: immutable nodes with annotations, literal folding, a generic
//! traversal protocol, pattern variable extraction and self-quoting.
//!
//! # Trees
//!
//! A [`Node`] has a kind ([`NodeType`]), an annotation list of host
//! [`Term`]s, and kind-specific children. Nodes are built with the `c_*`
//! constructor functions and inspected through [`Node::kind`] and the
//! `as_<kind>` accessors.
//!
//! Cons cells, tuples and maps whose parts are all literals are folded into
//! a single literal node when built. The `_skel` constructors keep the
//! composite shape.
//!
//! ```
//! use bramble_tree::{c_cons, c_int, c_nil, c_var, subtrees, update_tree};
//!
//! let folded = c_cons(c_int(1), c_nil());
//! assert!(folded.is_literal());
//!
//! let open = c_cons(c_var("X"), c_nil());
//! let rebuilt = update_tree(&open, subtrees(&open)).unwrap();
//! assert_eq!(rebuilt, open);
//! ```

mod build;
mod error;
mod literal;
mod map;
mod meta;
mod node;
mod pattern;
mod term;
mod traverse;
mod validation;

pub use build::{
    apply_arity, atom_val, c_alias, c_apply, c_atom, c_binary, c_bitstr, c_call, c_case, c_catch,
    c_char, c_clause, c_float, c_fname, c_fun, c_int, c_let, c_letrec, c_module, c_nil, c_primop,
    c_receive, c_seq, c_string, c_try, c_values, c_var, call_arity, clause_arity, fname_arity,
    fname_id, fun_arity, int_val, is_c_atom, is_c_int, is_c_list, let_arity, letrec_vars,
    list_elements, list_length, make_list, module_vars, primop_arity, tuple_arity, values_arity,
    var_name,
};
pub use error::TreeError;
pub use literal::{
    Data, abstract_term, c_cons, c_cons_skel, c_tuple, c_tuple_skel, concrete, data_arity,
    data_es, data_type, fold_literal, is_data, is_literal_term, make_data, make_data_skel,
    unfold_literal,
};
pub use map::{
    MapFold, MapOp, c_map, c_map_pair, c_map_pair_assoc, c_map_pair_exact, c_map_pattern,
    c_map_pattern_with_base, c_map_skel, c_map_update, fold_map_pairs, map_op, map_would_fold,
};
pub use meta::{MetaConfig, MetaError, Reifier, meta, reify};
pub use node::{
    Alias, Apply, Binary, Bitstr, Call, Case, Catch, Clause, Cons, Expr, Fun, Let, Letrec,
    Literal, Map, MapPair, Module, Node, NodeType, Primop, Receive, Seq, Try, Tuple, Values, Var,
    VarName, add_ann, copy_ann, from_records, get_ann, set_ann, to_records,
};
pub use pattern::{clause_vars, pat_list_vars, pat_vars};
pub use term::{Atom, BitString, Handle, Term};
pub use traverse::{make_tree, postorder, subtrees, tree_size, update_tree};
pub use validation::{ValidationError, validate};
