//! If-chains over a dispatch variable become `switch` statements.
//!
//! ```text
//! if (a < 2) {                  switch (a) {
//!     if (a == 0) { x(); }          case 0: { x(); break; }
//!     else { y(); }       ==>       case 1: { y(); break; }
//! } else { z(); }                   default: { z(); break; }
//!                               }
//! ```
//!
//! The test of every link is evaluated for each value of the variable's
//! domain; a leaf branch reached by one value becomes that value's case, a
//! leaf reached by several values becomes the default.

use crate::context::DeobContext;
use crate::error::DeobError;
use crate::eval::{Evaluator, Value};
use crate::walk::{
    block_statements, find_escaping_jumps, is_attached, is_terminator, is_unlabeled_break, pre_order,
};
use deflat_common::diagnostics::diagnostic_messages;
use deflat_common::limits::MAX_DISPATCH_DOMAIN;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

/// Leaves of one chain, keyed by the value that reaches them.
#[derive(Default)]
struct ChainPlan {
    cases: BTreeMap<i64, NodeIndex>,
    default: Option<NodeIndex>,
    /// Every `if` of the chain, outermost first.
    links: Vec<NodeIndex>,
}

pub struct IfToSwitchFlattener<'a> {
    arena: &'a mut NodeArena,
    root: NodeIndex,
    ctx: &'a mut DeobContext,
    /// Chains that failed once; never retried.
    skipped: FxHashSet<NodeIndex>,
}

impl<'a> IfToSwitchFlattener<'a> {
    pub fn new(arena: &'a mut NodeArena, root: NodeIndex, ctx: &'a mut DeobContext) -> Self {
        IfToSwitchFlattener {
            arena,
            root,
            ctx,
            skipped: FxHashSet::default(),
        }
    }

    /// Flatten every chain. Returns the number of `switch`es built.
    pub fn run(&mut self) -> usize {
        let _span = debug_span!("flatten_if").entered();
        if self.ctx.dispatch_vars.is_empty() {
            return 0;
        }
        let mut flattened = 0;
        loop {
            let mut progress = false;
            for idx in self.candidates() {
                if self.skipped.contains(&idx) || !is_attached(self.arena, self.root, idx) {
                    continue;
                }
                match self.flatten(idx) {
                    Ok(true) => {
                        flattened += 1;
                        progress = true;
                    }
                    Ok(false) => {}
                    Err(DeobError::MultipleDefault { name }) => {
                        self.ctx.report(
                            self.arena,
                            &diagnostic_messages::MULTIPLE_DEFAULT_CHOICE,
                            idx,
                            &[&name],
                        );
                    }
                    Err(err) => debug!(error = %err, "if-chain left unchanged"),
                }
            }
            if !progress {
                break;
            }
        }
        debug!(flattened, "if-chains flattened");
        flattened
    }

    /// `if` statements whose test compares a dispatch variable, outermost first.
    fn candidates(&self) -> Vec<NodeIndex> {
        pre_order(self.arena, self.root)
            .into_iter()
            .filter(|&idx| !self.skipped.contains(&idx) && self.tested_variable(idx).is_some())
            .collect()
    }

    /// The dispatch variable on the left of an `if` test.
    fn tested_variable(&self, if_idx: NodeIndex) -> Option<String> {
        let arena = &*self.arena;
        let test = arena
            .get(if_idx)
            .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
            .and_then(|node| arena.get_if_statement(node))?
            .expression;
        let binary = arena.get(test).and_then(|node| arena.get_binary_expr(node))?;
        let name = arena.get_identifier_text(binary.left)?;
        self.ctx.is_dispatch_variable(name).then(|| name.to_string())
    }

    fn flatten(&mut self, if_idx: NodeIndex) -> Result<bool, DeobError> {
        let Some(name) = self.tested_variable(if_idx) else {
            return Ok(false);
        };
        let domain_size = self.ctx.dispatch_vars.get(&name).map_or(0, |var| var.domain_size);
        if domain_size > MAX_DISPATCH_DOMAIN {
            debug!(name, domain_size, "domain too large to enumerate");
            self.skipped.insert(if_idx);
            return Ok(false);
        }

        let mut plan = ChainPlan::default();
        if let Err(err) = self.partition(if_idx, &name, (0..domain_size).collect(), &mut plan) {
            self.skipped.extend(plan.links);
            return Err(err);
        }

        if !self.breaks_stay_equivalent(if_idx, &plan) {
            self.ctx
                .report(self.arena, &diagnostic_messages::ESCAPING_BREAK, if_idx, &[&name]);
            self.skipped.extend(plan.links);
            return Ok(false);
        }

        let mut clauses = Vec::with_capacity(plan.cases.len() + 1);
        for (&value, &branch) in &plan.cases {
            let label = self.arena.create_numeric_literal(value as f64);
            clauses.push(self.case_clause(label, branch));
        }
        if let Some(branch) = plan.default {
            clauses.push(self.case_clause(NodeIndex::NONE, branch));
        }
        let discriminant = self.arena.create_identifier(&name);
        let switch = self.arena.create_switch(discriminant, clauses);
        self.arena.replace_node(if_idx, switch);
        debug!(
            name,
            cases = plan.cases.len(),
            default = plan.default.is_some(),
            links = plan.links.len(),
            "if-chain flattened"
        );
        Ok(true)
    }

    /// Split `candidates` between the branches of `if_idx`.
    fn partition(
        &mut self,
        if_idx: NodeIndex,
        name: &str,
        candidates: Vec<i64>,
        plan: &mut ChainPlan,
    ) -> Result<(), DeobError> {
        plan.links.push(if_idx);
        let Some(stmt) = self
            .arena
            .get(if_idx)
            .and_then(|node| self.arena.get_if_statement(node))
            .cloned()
        else {
            return Ok(());
        };

        let mut taken = Vec::new();
        let mut rest = Vec::new();
        {
            let mut evaluator = Evaluator::new(self.arena);
            for value in candidates {
                evaluator.bind(name, Value::Number(value as f64));
                if evaluator.evaluate_condition(stmt.expression)? {
                    taken.push(value);
                } else {
                    rest.push(value);
                }
            }
        }

        self.branch(stmt.then_statement, name, taken, plan)?;
        if stmt.else_statement.is_some() {
            self.branch(stmt.else_statement, name, rest, plan)?;
        }
        Ok(())
    }

    fn branch(
        &mut self,
        branch: NodeIndex,
        name: &str,
        candidates: Vec<i64>,
        plan: &mut ChainPlan,
    ) -> Result<(), DeobError> {
        if let Some(next) = self.next_link(branch, name) {
            return self.partition(next, name, candidates, plan);
        }
        match candidates.as_slice() {
            [] => {
                self.ctx
                    .report(self.arena, &diagnostic_messages::UNREACHABLE_BRANCH, branch, &[name]);
            }
            [value] => {
                plan.cases.insert(*value, branch);
            }
            _ => {
                if plan.default.is_some() {
                    return Err(DeobError::MultipleDefault {
                        name: name.to_string(),
                    });
                }
                plan.default = Some(branch);
            }
        }
        Ok(())
    }

    /// A branch holding nothing but another `if` on the same variable.
    fn next_link(&self, branch: NodeIndex, name: &str) -> Option<NodeIndex> {
        let statements = block_statements(self.arena, branch);
        let [only] = statements.as_slice() else {
            return None;
        };
        (self.tested_variable(*only).as_deref() == Some(name)).then_some(*only)
    }

    /// An unlabeled `break` inside a branch leaves the enclosing loop or
    /// switch today; inside the new `switch` it only leaves the switch. The
    /// two agree when the chain itself is followed by `break`.
    fn breaks_stay_equivalent(&self, if_idx: NodeIndex, plan: &ChainPlan) -> bool {
        let arena = &*self.arena;
        let bodies: Vec<NodeIndex> = plan.cases.values().copied().chain(plan.default).collect();
        let escapes = find_escaping_jumps(arena, &bodies, false)
            .into_iter()
            .any(|jump| is_unlabeled_break(arena, jump));
        if !escapes {
            return true;
        }
        arena
            .statement_position(if_idx)
            .and_then(|(container, index)| arena.get_statements(container)?.nodes.get(index + 1).copied())
            .is_some_and(|next| is_unlabeled_break(arena, next))
    }

    fn case_clause(&mut self, label: NodeIndex, branch: NodeIndex) -> NodeIndex {
        let mut statements = block_statements(self.arena, branch);
        if !statements.last().is_some_and(|&last| is_terminator(self.arena, last)) {
            statements.push(self.arena.create_break());
        }
        let block = self.arena.create_block(statements);
        self.arena.create_case_clause(label, vec![block])
    }
}

/// Flatten every if-chain over a dispatch variable under `root`.
pub fn flatten_if_chains(arena: &mut NodeArena, root: NodeIndex, ctx: &mut DeobContext) -> usize {
    IfToSwitchFlattener::new(arena, root, ctx).run()
}
