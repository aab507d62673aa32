//! Canonical-form rewrites run before control-flow reconstruction.
//!
//! Each `Rule` is one small rewrite applied over a single walk of the tree,
//! pre-order ("enter") or post-order ("exit"). A rule is repeated until a
//! walk changes nothing, and the whole rule list is repeated until a round
//! changes nothing, so normalizing normalized input is a no-op.
//!
//! After normalization the later passes can rely on:
//! - `if`/`else` and loop bodies are blocks
//! - case clauses hold exactly one block
//! - no sequence expression is used as a statement, an `if` test or a
//!   `return` argument in a statement list
//! - conditional and `&&` statements are `if` statements
//! - no block directly contains another block

mod expressions;
mod statements;

use crate::context::DeobContext;
use crate::walk::{is_attached, post_order, pre_order, run_to_fixpoint};
use deflat_common::limits::MAX_NORMALIZE_ITERATIONS;
use deflat_parser::{NodeArena, NodeIndex};
use tracing::{debug, debug_span, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkOrder {
    /// Parents before children.
    Enter,
    /// Children before parents.
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    RemoveVoid,
    ConditionalAssign,
    ConditionalIf,
    LogicalIf,
    IfBody,
    IfTestSequence,
    IfTestBinary,
    SwitchCase,
    ReturnSequence,
    Sequence,
    InlineIife,
    FlattenBlock,
}

impl Rule {
    /// Every rule, in application order.
    pub const ALL: [Rule; 12] = [
        Rule::RemoveVoid,
        Rule::ConditionalAssign,
        Rule::ConditionalIf,
        Rule::LogicalIf,
        Rule::IfBody,
        Rule::IfTestSequence,
        Rule::IfTestBinary,
        Rule::SwitchCase,
        Rule::ReturnSequence,
        Rule::Sequence,
        Rule::InlineIife,
        Rule::FlattenBlock,
    ];

    pub fn order(self) -> WalkOrder {
        match self {
            Rule::RemoveVoid
            | Rule::ConditionalIf
            | Rule::IfTestSequence
            | Rule::SwitchCase
            | Rule::ReturnSequence
            | Rule::InlineIife => WalkOrder::Enter,
            Rule::ConditionalAssign
            | Rule::LogicalIf
            | Rule::IfBody
            | Rule::IfTestBinary
            | Rule::Sequence
            | Rule::FlattenBlock => WalkOrder::Exit,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::RemoveVoid => "remove-void",
            Rule::ConditionalAssign => "conditional-assign",
            Rule::ConditionalIf => "conditional-if",
            Rule::LogicalIf => "logical-if",
            Rule::IfBody => "if-body",
            Rule::IfTestSequence => "if-test-sequence",
            Rule::IfTestBinary => "if-test-binary",
            Rule::SwitchCase => "switch-case",
            Rule::ReturnSequence => "return-sequence",
            Rule::Sequence => "sequence",
            Rule::InlineIife => "inline-iife",
            Rule::FlattenBlock => "flatten-block",
        }
    }
}

pub struct Normalizer<'a> {
    pub(crate) arena: &'a mut NodeArena,
    pub(crate) root: NodeIndex,
    pub(crate) ctx: &'a mut DeobContext,
}

impl<'a> Normalizer<'a> {
    pub fn new(arena: &'a mut NodeArena, root: NodeIndex, ctx: &'a mut DeobContext) -> Self {
        Normalizer { arena, root, ctx }
    }

    /// Apply every rule until a full round changes nothing.
    pub fn run(&mut self) -> bool {
        let _span = debug_span!("normalize").entered();
        let mut changed_any = false;
        for round in 0..MAX_NORMALIZE_ITERATIONS {
            let mut changed = false;
            for rule in Rule::ALL {
                changed |= self.run_rule(rule);
            }
            if !changed {
                debug!(rounds = round + 1, "normalization converged");
                return changed_any;
            }
            changed_any = true;
        }
        warn!("normalization did not converge after {MAX_NORMALIZE_ITERATIONS} rounds");
        changed_any
    }

    /// Apply one rule to its fixpoint.
    pub fn run_rule(&mut self, rule: Rule) -> bool {
        run_to_fixpoint(rule.name(), || self.walk(rule))
    }

    fn walk(&mut self, rule: Rule) -> bool {
        let nodes = match rule.order() {
            WalkOrder::Enter => pre_order(self.arena, self.root),
            WalkOrder::Exit => post_order(self.arena, self.root),
        };
        let mut changed = false;
        for idx in nodes {
            if !is_attached(self.arena, self.root, idx) {
                continue;
            }
            if self.apply(rule, idx) {
                changed = true;
            }
        }
        if changed {
            debug!(rule = rule.name(), "rule rewrote tree");
        }
        changed
    }

    fn apply(&mut self, rule: Rule, idx: NodeIndex) -> bool {
        match rule {
            Rule::RemoveVoid => self.remove_void(idx),
            Rule::ConditionalAssign => self.conditional_assign(idx),
            Rule::ConditionalIf => self.conditional_if(idx),
            Rule::LogicalIf => self.logical_if(idx),
            Rule::IfBody => self.if_body(idx),
            Rule::IfTestSequence => self.if_test_sequence(idx),
            Rule::IfTestBinary => self.if_test_binary(idx),
            Rule::SwitchCase => self.switch_case(idx),
            Rule::ReturnSequence => self.return_sequence(idx),
            Rule::Sequence => self.sequence(idx),
            Rule::InlineIife => self.inline_iife(idx),
            Rule::FlattenBlock => self.flatten_block(idx),
        }
    }
}

/// Normalize the tree under `root`. Returns whether anything changed.
pub fn normalize(arena: &mut NodeArena, root: NodeIndex, ctx: &mut DeobContext) -> bool {
    Normalizer::new(arena, root, ctx).run()
}
