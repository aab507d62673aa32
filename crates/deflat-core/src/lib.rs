//! Control-flow unflattening for obfuscated JavaScript.
//!
//! Obfuscators hide a function's real statement order behind a dispatch
//! loop: a state variable (the *key*) selects one `case` of a `switch` per
//! iteration and each case assigns the next state. This crate rebuilds the
//! straight-line code:
//!
//! - `rename` gives every binding a unique name
//! - `normalize` rewrites syntax variants into one canonical shape
//! - `classify` finds dispatch keys and the variables masked from them
//! - `flow` turns if-chains into switches, tracks key values, merges cases
//!   along their jumps and collapses loops that are left with one case
//! - `hoist` pulls `x += n` out of `obj[x += n]`
//!
//! `deobfuscate` runs all of them between parsing and printing.

pub mod classify;
pub use classify::{DispatchClassifier, classify};

pub mod context;
pub use context::{DeobContext, DispatchVariable, KeyInfo};

pub mod error;
pub use error::{DeobError, EvalError};

pub mod eval;
pub use eval::{Evaluator, Value};

pub mod flow;

pub mod hoist;
pub use hoist::{MemberAssignHoister, hoist_member_assignments};

pub mod normalize;
pub use normalize::{Normalizer, Rule, normalize};

pub mod pipeline;
pub use pipeline::{DeobOptions, DeobOutput, deobfuscate, run_passes};

pub mod rename;
pub use rename::rename_identifiers;

pub mod walk;
