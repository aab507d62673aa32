//! Dispatcher merging.
//!
//! Every tracked key goes through three steps on a private copy of its
//! dispatcher, so a failure leaves the tree untouched:
//!
//! 1. **Expansion.** Each live key value is run through the loop prelude and
//!    the dispatcher's discriminant. Cases selected by exactly one value
//!    become entries of a case table `value -> statements`; cases selected
//!    by several values must hold a nested `switch`, which is expanded with
//!    that subset.
//! 2. **Merging.** Starting from the start value, a case that ends in
//!    `K = N; break;` absorbs case `N` when nothing else jumps to `N`. Both
//!    arms of a trailing `if` are merged the same way; arms jumping to the
//!    same case share one jump after the `if`, and an arm jumping back to
//!    the start of its own case becomes a `while` loop. Sweeps repeat until
//!    nothing changes.
//! 3. **Re-emission.** The remaining table replaces the dispatcher as
//!    `switch (K) { case v: { ... } }`.

use super::collapse::collapse_loop;
use crate::context::{DeobContext, KeyInfo};
use crate::error::DeobError;
use crate::eval::{Evaluator, Value};
use crate::walk::{
    find_escaping_jumps, is_attached, is_key_exit_assignment, is_return_or_throw, is_terminator,
    is_unlabeled_break, is_unlabeled_continue, key_assignment_value, mentions_name,
};
use deflat_common::diagnostics::diagnostic_messages;
use deflat_common::limits::{MAX_MERGE_DEPTH, MAX_MERGE_SWEEPS};
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, debug_span, trace};

/// A trailing `if` with block arms on both sides.
struct IfArms {
    test: NodeIndex,
    then_block: NodeIndex,
    else_block: NodeIndex,
}

pub struct SwitchMerger<'a> {
    arena: &'a mut NodeArena,
    key: String,
    start: i64,
    prelude: Option<NodeIndex>,
    histogram: BTreeMap<i64, u32>,
    exit_values: BTreeSet<i64>,
    /// Key value to the statements run for it.
    cases: BTreeMap<i64, Vec<NodeIndex>>,
    /// Clauses no live value selects, with their label text.
    dropped: Vec<(NodeIndex, String)>,
    updated: bool,
}

impl<'a> SwitchMerger<'a> {
    pub fn new(arena: &'a mut NodeArena, key: &KeyInfo) -> Self {
        SwitchMerger {
            arena,
            key: key.key_name.clone(),
            start: key.start_value,
            prelude: key.prelude,
            histogram: key.value_histogram.clone(),
            exit_values: key.exit_values.clone(),
            cases: BTreeMap::new(),
            dropped: Vec::new(),
            updated: false,
        }
    }

    /// Key values that select a case (exit values leave the loop instead).
    pub fn live_values(&self) -> Vec<i64> {
        self.histogram
            .keys()
            .copied()
            .filter(|value| !self.exit_values.contains(value))
            .collect()
    }

    pub fn cases(&self) -> &BTreeMap<i64, Vec<NodeIndex>> {
        &self.cases
    }

    pub fn histogram(&self) -> &BTreeMap<i64, u32> {
        &self.histogram
    }

    fn count(&self, value: i64) -> u32 {
        self.histogram.get(&value).copied().unwrap_or(0)
    }

    fn mismatch(&self, reason: impl Into<String>) -> DeobError {
        DeobError::key_case_mismatch(&self.key, reason)
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Fill the case table from `switch` for the key values in `values`.
    pub fn expand(&mut self, switch: NodeIndex, values: Vec<i64>) -> Result<(), DeobError> {
        self.expand_switch(switch, values, 0)
    }

    fn expand_switch(&mut self, switch: NodeIndex, values: Vec<i64>, depth: u32) -> Result<(), DeobError> {
        if depth > MAX_MERGE_DEPTH {
            return Err(self.mismatch("dispatcher nesting is too deep"));
        }
        let Some(data) = self
            .arena
            .get(switch)
            .filter(|node| node.kind == syntax_kind_ext::SWITCH_STATEMENT)
            .and_then(|node| self.arena.get_switch(node))
            .cloned()
        else {
            return Err(self.mismatch("dispatcher is not a switch"));
        };

        let mut buckets: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        {
            let mut evaluator = Evaluator::new(self.arena);
            for value in values {
                evaluator.bind(&self.key, Value::Number(value as f64));
                if let Some(prelude) = self.prelude {
                    evaluator.evaluate_declarations(prelude)?;
                }
                let selector = evaluator.evaluate_key(data.expression)?;
                buckets.entry(selector).or_default().push(value);
            }
        }
        trace!(key = %self.key, ?buckets, "selector buckets");

        let clauses = data.clauses.nodes;
        let mut default_position = None;
        for (position, &clause) in clauses.iter().enumerate() {
            if self.arena.is_kind(clause, syntax_kind_ext::DEFAULT_CLAUSE) {
                default_position = Some(position);
                continue;
            }
            let label = self
                .arena
                .get(clause)
                .and_then(|node| self.arena.get_case_clause(node))
                .map_or(NodeIndex::NONE, |case| case.expression);
            let selector = Evaluator::new(self.arena)
                .evaluate_key(label)
                .map_err(|err| self.mismatch(format!("case label is not a key value ({err})")))?;
            match buckets.remove(&selector) {
                Some(bucket) => self.take_bucket(&clauses, position, bucket, depth)?,
                None => self.dropped.push((clause, selector.to_string())),
            }
        }

        if let Some(position) = default_position {
            match buckets.len() {
                0 => self.dropped.push((clauses[position], "default".to_string())),
                1 => {
                    if let Some((_, bucket)) = buckets.pop_first() {
                        self.take_bucket(&clauses, position, bucket, depth)?;
                    }
                }
                n => {
                    return Err(self.mismatch(format!("default clause would take {n} selector values")));
                }
            }
        }
        for (selector, values) in buckets {
            debug!(key = %self.key, selector, ?values, "values select no case");
        }
        Ok(())
    }

    fn take_bucket(
        &mut self,
        clauses: &[NodeIndex],
        position: usize,
        bucket: Vec<i64>,
        depth: u32,
    ) -> Result<(), DeobError> {
        let nested = self.nested_switch(clauses[position]);
        if let [value] = bucket.as_slice() {
            if let Some(nested) = nested
                && self.selects_by_key(nested, *value)
            {
                return self.expand_switch(nested, bucket, depth + 1);
            }
            let mut body = self.clause_body(clauses, position);
            self.terminate_trailing_if(&mut body);
            self.cases.insert(*value, body);
            return Ok(());
        }

        let Some(nested) = nested else {
            return Err(self.mismatch(format!(
                "{} values share a case without a nested switch",
                bucket.len()
            )));
        };
        self.expand_switch(nested, bucket, depth + 1)
    }

    /// The clause's `switch`, when it is all the clause holds apart from a
    /// trailing `break`.
    fn nested_switch(&self, clause: NodeIndex) -> Option<NodeIndex> {
        let statements = clause_statements(self.arena, clause);
        let nested = match statements.as_slice() {
            [switch] => *switch,
            [switch, last] if is_unlabeled_break(self.arena, *last) => *switch,
            _ => return None,
        };
        self.arena
            .is_kind(nested, syntax_kind_ext::SWITCH_STATEMENT)
            .then_some(nested)
    }

    /// The switch's discriminant is a function of the key alone.
    fn selects_by_key(&self, switch: NodeIndex, value: i64) -> bool {
        let Some(discriminant) = self
            .arena
            .get(switch)
            .and_then(|node| self.arena.get_switch(node))
            .map(|data| data.expression)
        else {
            return false;
        };
        let mut evaluator = Evaluator::new(self.arena);
        evaluator.bind(&self.key, Value::Number(value as f64));
        if let Some(prelude) = self.prelude
            && evaluator.evaluate_declarations(prelude).is_err()
        {
            return false;
        }
        evaluator.evaluate_key(discriminant).is_ok()
    }

    /// Statements of a clause, followed by copies of the clauses it falls
    /// through into.
    fn clause_body(&mut self, clauses: &[NodeIndex], position: usize) -> Vec<NodeIndex> {
        let mut body = clause_statements(self.arena, clauses[position]);
        for &next in &clauses[position + 1..] {
            if !falls_through(self.arena, &body) {
                break;
            }
            let statements = clause_statements(self.arena, next);
            let copies = self.arena.clone_statements(&statements);
            body.extend(copies);
        }
        body
    }

    /// `[..., if (t) { A } else { B }, break]` becomes
    /// `[..., if (t) { A; break; } else { B; break; }]`.
    fn terminate_trailing_if(&mut self, body: &mut Vec<NodeIndex>) {
        let n = body.len();
        if n < 2 || !is_unlabeled_break(self.arena, body[n - 1]) {
            return;
        }
        if self.if_arms(body[n - 2]).is_none() {
            return;
        }
        self.terminate_arms(body[n - 2]);
        body.pop();
    }

    fn terminate_arms(&mut self, if_idx: NodeIndex) {
        let Some(arms) = self.if_arms(if_idx) else {
            return;
        };
        for arm in [arms.then_block, arms.else_block] {
            let mut statements = block_list(self.arena, arm);
            match statements.last().copied() {
                Some(last) if self.if_arms(last).is_some() => self.terminate_arms(last),
                Some(last) if is_terminator(self.arena, last) => {}
                _ => {
                    statements.push(self.arena.create_break());
                    self.arena.set_statements(arm, statements);
                }
            }
        }
    }

    // =========================================================================
    // Merging
    // =========================================================================

    /// Merge sweeps from the start value. Returns false when the sweep limit
    /// was reached before a sweep changed nothing.
    pub fn merge(&mut self) -> bool {
        for sweep in 0..MAX_MERGE_SWEEPS {
            self.updated = false;
            let mut visited = FxHashSet::default();
            self.merge_entry(&mut visited, self.start, 0);
            if !self.updated {
                debug!(key = %self.key, sweeps = sweep + 1, cases = self.cases.len(), "merge converged");
                return true;
            }
        }
        false
    }

    fn merge_entry(&mut self, visited: &mut FxHashSet<i64>, value: i64, depth: u32) {
        if depth > MAX_MERGE_DEPTH || !visited.insert(value) {
            return;
        }
        let Some(mut body) = self.cases.remove(&value) else {
            return;
        };
        self.merge_body(visited, &mut body, value, true, depth);
        self.cases.insert(value, body);
    }

    /// Merge successors into `body` (a case body when `at_entry`, else an
    /// `if` arm inside case `value`). Returns the shared successor the body
    /// stopped at, if any.
    fn merge_body(
        &mut self,
        visited: &mut FxHashSet<i64>,
        body: &mut Vec<NodeIndex>,
        value: i64,
        at_entry: bool,
        depth: u32,
    ) -> Option<i64> {
        loop {
            let last = *body.last()?;
            if is_return_or_throw(self.arena, last) {
                return None;
            }

            if let Some(arms) = self.if_arms(last) {
                let then_target = self.merge_arm(visited, arms.then_block, value, depth);
                let else_target = self.merge_arm(visited, arms.else_block, value, depth);
                if let (Some(t0), Some(t1)) = (then_target, else_target)
                    && t0 == t1
                    && self.count(t0) > 0
                    && self.hoist_shared_jump(body, &arms, t0)
                {
                    continue;
                }
                if at_entry && body.len() == 1 {
                    if then_target == Some(value) && self.recover_loop(body, &arms, false, value) {
                        continue;
                    }
                    if else_target == Some(value) && self.recover_loop(body, &arms, true, value) {
                        continue;
                    }
                }
                return None;
            }

            let n = body.len();
            if n < 2 || !is_unlabeled_break(self.arena, last) {
                return None;
            }
            let next = key_assignment_value(self.arena, body[n - 2], &self.key)?;
            if self.exit_values.contains(&next) {
                return None;
            }
            if self.count(next) > 1 {
                self.merge_entry(visited, next, depth + 1);
                return Some(next);
            }
            if self.cases.get(&next).is_some_and(|successor| self.reenters_dispatcher(successor)) {
                debug!(key = %self.key, into = value, next, "successor re-enters the dispatcher");
                return None;
            }
            let successor = self.cases.remove(&next)?;
            body.truncate(n - 2);
            body.extend(successor);
            self.histogram.insert(next, 0);
            self.updated = true;
            trace!(key = %self.key, into = value, inlined = next, "inlined single-entry case");
        }
    }

    fn merge_arm(
        &mut self,
        visited: &mut FxHashSet<i64>,
        arm: NodeIndex,
        value: i64,
        depth: u32,
    ) -> Option<i64> {
        if depth > MAX_MERGE_DEPTH {
            return None;
        }
        let mut statements = block_list(self.arena, arm);
        let target = self.merge_body(visited, &mut statements, value, false, depth + 1);
        self.arena.set_statements(arm, statements);
        target
    }

    /// Both arms end in `K = target; break;`: keep one copy after the `if`.
    fn hoist_shared_jump(&mut self, body: &mut Vec<NodeIndex>, arms: &IfArms, target: i64) -> bool {
        let mut then_statements = block_list(self.arena, arms.then_block);
        let mut else_statements = block_list(self.arena, arms.else_block);
        if !self.ends_with_jump_to(&then_statements, target) || !self.ends_with_jump_to(&else_statements, target) {
            return false;
        }
        let tail = then_statements.split_off(then_statements.len() - 2);
        else_statements.truncate(else_statements.len() - 2);
        self.arena.set_statements(arms.then_block, then_statements);
        self.arena.set_statements(arms.else_block, else_statements);
        body.extend(tail);
        if let Some(count) = self.histogram.get_mut(&target) {
            *count -= 1;
        }
        self.updated = true;
        trace!(key = %self.key, target, "hoisted shared jump out of if");
        true
    }

    /// `case V: if (t) { A; i++; K = V; break; } else { B }` becomes
    /// `case V: while (t) { A; i++; } B`. The arm must update a name the
    /// test reads, and must not break or continue out of the new loop.
    fn recover_loop(&mut self, body: &mut Vec<NodeIndex>, arms: &IfArms, mirrored: bool, value: i64) -> bool {
        let (looping_arm, exit_arm) = if mirrored {
            (arms.else_block, arms.then_block)
        } else {
            (arms.then_block, arms.else_block)
        };
        let looping = block_list(self.arena, looping_arm);
        let n = looping.len();
        if n < 3 || !self.ends_with_jump_to(&looping, value) {
            return false;
        }
        let Some(counter) = updated_name(self.arena, looping[n - 3]) else {
            return false;
        };
        if counter == self.key || !mentions_name(self.arena, arms.test, &counter) {
            return false;
        }
        let loop_statements = looping[..n - 2].to_vec();
        if !find_escaping_jumps(self.arena, &loop_statements, true).is_empty() {
            return false;
        }

        let exit = block_list(self.arena, exit_arm);
        let test = if mirrored {
            self.arena.create_prefix_unary(SyntaxKind::ExclamationToken, arms.test)
        } else {
            arms.test
        };
        let loop_body = self.arena.create_block(loop_statements);
        let while_statement = self.arena.create_while_statement(test, loop_body);
        body.pop();
        body.push(while_statement);
        body.extend(exit);
        if let Some(count) = self.histogram.get_mut(&value) {
            *count = count.saturating_sub(1);
        }
        self.updated = true;
        debug!(key = %self.key, value, counter, "recovered while loop");
        true
    }

    /// Some jump in `statements` goes back to the dispatcher without setting
    /// the key first, re-running the case it was reached from.
    fn reenters_dispatcher(&self, statements: &[NodeIndex]) -> bool {
        find_escaping_jumps(self.arena, statements, true)
            .into_iter()
            .any(|jump| !self.jumps_after_key_update(statements, jump))
    }

    /// `jump` is an unlabeled `break` or `continue` directly preceded by an
    /// assignment of a constant to the key.
    fn jumps_after_key_update(&self, statements: &[NodeIndex], jump: NodeIndex) -> bool {
        if !is_unlabeled_break(self.arena, jump) && !is_unlabeled_continue(self.arena, jump) {
            return false;
        }
        let previous = match statements.iter().position(|&s| s == jump) {
            Some(index) => index.checked_sub(1).map(|p| statements[p]),
            None => self.arena.statement_position(jump).and_then(|(container, index)| {
                let p = index.checked_sub(1)?;
                self.arena.get_statements(container)?.nodes.get(p).copied()
            }),
        };
        previous.is_some_and(|statement| {
            key_assignment_value(self.arena, statement, &self.key).is_some()
                || is_key_exit_assignment(self.arena, statement, &self.key)
        })
    }

    fn ends_with_jump_to(&self, statements: &[NodeIndex], target: i64) -> bool {
        let n = statements.len();
        n >= 2
            && is_unlabeled_break(self.arena, statements[n - 1])
            && key_assignment_value(self.arena, statements[n - 2], &self.key) == Some(target)
    }

    fn if_arms(&self, statement: NodeIndex) -> Option<IfArms> {
        let stmt = self
            .arena
            .get(statement)
            .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
            .and_then(|node| self.arena.get_if_statement(node))?;
        let is_block = |idx| self.arena.is_kind(idx, syntax_kind_ext::BLOCK);
        (is_block(stmt.then_statement) && is_block(stmt.else_statement)).then(|| IfArms {
            test: stmt.expression,
            then_block: stmt.then_statement,
            else_block: stmt.else_statement,
        })
    }

    // =========================================================================
    // Re-emission
    // =========================================================================

    /// Build `switch (K) { case v: { ... } }` from the table, in ascending
    /// key order.
    pub fn emit(&mut self) -> NodeIndex {
        let cases = std::mem::take(&mut self.cases);
        let mut clauses = Vec::with_capacity(cases.len());
        for (value, body) in cases {
            let label = self.arena.create_numeric_literal(value as f64);
            let block = self.arena.create_block(body);
            clauses.push(self.arena.create_case_clause(label, vec![block]));
        }
        let discriminant = self.arena.create_identifier(&self.key);
        self.arena.create_switch(discriminant, clauses)
    }
}

/// Merge every tracked dispatcher under `root`. Returns the number of
/// dispatchers rewritten.
pub fn merge_dispatchers(arena: &mut NodeArena, root: NodeIndex, ctx: &mut DeobContext) -> usize {
    let _span = debug_span!("merge").entered();
    let names: Vec<String> = ctx.keys.keys().cloned().collect();
    let mut merged = 0;
    for name in names {
        let Some(key) = ctx.keys.get(&name).cloned() else {
            continue;
        };
        if key.visited || key.opaque.is_some() || key.value_histogram.is_empty() {
            continue;
        }
        let Some(dispatcher) = key.dispatcher(arena) else {
            continue;
        };
        if !is_attached(arena, root, dispatcher) {
            continue;
        }

        let copy = arena.clone_subtree(dispatcher);
        let mut merger = SwitchMerger::new(arena, &key);
        let values = merger.live_values();
        let expanded = merger.expand(copy, values);
        let dropped = std::mem::take(&mut merger.dropped);
        let outcome = match expanded {
            Ok(()) => {
                let converged = merger.merge();
                let histogram = merger.histogram.clone();
                let remaining = merger.cases.len();
                let switch = merger.emit();
                Ok((switch, histogram, remaining, converged))
            }
            Err(err) => Err(err),
        };

        for (clause, label) in &dropped {
            ctx.report(arena, &diagnostic_messages::DROP_IN_KEY, *clause, &[&name, label]);
        }
        let (switch, histogram, remaining, converged) = match outcome {
            Ok(parts) => parts,
            Err(err) => {
                let reason = match &err {
                    DeobError::KeyCaseMismatch { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                ctx.report(
                    arena,
                    &diagnostic_messages::KEY_CASE_MISMATCH,
                    dispatcher,
                    &[&name, &reason],
                );
                if let Some(info) = ctx.keys.get_mut(&name) {
                    info.visited = true;
                }
                continue;
            }
        };
        if !converged {
            ctx.report(
                arena,
                &diagnostic_messages::MERGE_LIMIT,
                dispatcher,
                &[&name, &MAX_MERGE_SWEEPS.to_string()],
            );
        }

        arena.replace_node(dispatcher, switch);
        merged += 1;
        debug!(key = %name, remaining, "dispatcher re-emitted");
        let Some(info) = ctx.keys.get_mut(&name) else {
            continue;
        };
        info.value_histogram = histogram;
        info.visited = true;
        let info = info.clone();
        if collapse_loop(arena, root, &info) {
            ctx.report(arena, &diagnostic_messages::LOOP_COLLAPSED, info.loop_node, &[&name]);
        }
    }
    merged
}

/// Statements of a case clause, looking through a single wrapping block.
fn clause_statements(arena: &NodeArena, clause: NodeIndex) -> Vec<NodeIndex> {
    let Some(list) = arena.get_statements(clause) else {
        return Vec::new();
    };
    match list.nodes.as_slice() {
        [only] if arena.is_kind(*only, syntax_kind_ext::BLOCK) => block_list(arena, *only),
        nodes => nodes.to_vec(),
    }
}

fn block_list(arena: &NodeArena, block: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get_statements(block)
        .map(|list| list.nodes.clone())
        .unwrap_or_default()
}

/// Whether control can run off the end of `statements`.
fn falls_through(arena: &NodeArena, statements: &[NodeIndex]) -> bool {
    let Some(&last) = statements.last() else {
        return true;
    };
    if is_terminator(arena, last) {
        return false;
    }
    let Some(stmt) = arena
        .get(last)
        .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
        .and_then(|node| arena.get_if_statement(node))
    else {
        return true;
    };
    if stmt.else_statement.is_none() {
        return true;
    }
    let arm = |idx: NodeIndex| match arena.get_statements(idx) {
        Some(list) if arena.is_kind(idx, syntax_kind_ext::BLOCK) => list.nodes.clone(),
        _ => vec![idx],
    };
    falls_through(arena, &arm(stmt.then_statement)) || falls_through(arena, &arm(stmt.else_statement))
}

/// `x++`, `--x`, `x += n` or `x = e` as a statement: the updated name.
fn updated_name(arena: &NodeArena, statement: NodeIndex) -> Option<String> {
    let node = arena.get(statement)?;
    if node.kind != syntax_kind_ext::EXPRESSION_STATEMENT {
        return None;
    }
    let expr = arena.get_expression_statement(node)?.expression;
    let expr_node = arena.get(expr)?;
    let target = match expr_node.kind {
        syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
            let unary = arena.get_unary_expr(expr_node)?;
            matches!(unary.operator, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
                .then_some(unary.operand)?
        }
        syntax_kind_ext::BINARY_EXPRESSION => {
            let binary = arena.get_binary_expr(expr_node)?;
            binary.operator_token.is_assignment_operator().then_some(binary.left)?
        }
        _ => return None,
    };
    arena.get_identifier_text(target).map(str::to_string)
}
