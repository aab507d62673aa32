//! Give every declared binding a globally unique name.
//!
//! Function names, parameters and variable declarators are visited in source
//! order and renamed to `_u{n}f`, `_u{n}p` and `_u{n}v` with one counter
//! starting at 1000. Declarations and references are rewritten through the
//! binder's resolution, so shadowed bindings end up with distinct names and
//! globals keep theirs.

use deflat_binder::{BinderState, SymbolId};
use deflat_common::limits::MAX_RENAME_SUFFIX;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

const FIRST_NAME_INDEX: u32 = 1000;

pub struct Renamer {
    counter: u32,
    taken: FxHashSet<String>,
    renames: IndexMap<SymbolId, String>,
}

impl Renamer {
    fn new(arena: &NodeArena, root: NodeIndex) -> Self {
        let taken = arena
            .descendants(root)
            .into_iter()
            .filter(|&idx| arena.is_kind(idx, SyntaxKind::Identifier as u16))
            .filter_map(|idx| arena.get_identifier_text(idx).map(str::to_string))
            .collect();
        Renamer {
            counter: FIRST_NAME_INDEX,
            taken,
            renames: IndexMap::new(),
        }
    }

    /// Next name for the given role suffix, avoiding every name already in
    /// the tree.
    fn fresh_name(&mut self, role: char) -> String {
        let base = format!("_u{}{}", self.counter, role);
        self.counter += 1;
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) && suffix < MAX_RENAME_SUFFIX {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    fn plan(&mut self, binder: &BinderState, declaration: NodeIndex, role: char) {
        let Some(symbol) = binder.resolve_identifier(declaration) else {
            return;
        };
        if self.renames.contains_key(&symbol) {
            return;
        }
        let name = self.fresh_name(role);
        self.renames.insert(symbol, name);
    }
}

/// Rename every binding under `root`. Returns the number of renamed bindings.
pub fn rename_identifiers(arena: &mut NodeArena, root: NodeIndex) -> usize {
    let _span = tracing::debug_span!("rename").entered();
    let binder = BinderState::bind(arena, root);
    let mut renamer = Renamer::new(arena, root);

    for idx in arena.descendants(root) {
        let Some(node) = arena.get(idx) else {
            continue;
        };
        match node.kind {
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                let Some(func) = arena.get_function(node) else {
                    continue;
                };
                if func.name.is_some() {
                    renamer.plan(&binder, func.name, 'f');
                }
                for &parameter in func.parameters.iter() {
                    renamer.plan(&binder, parameter, 'p');
                }
            }
            syntax_kind_ext::VARIABLE_DECLARATION => {
                if let Some(decl) = arena.get_variable_declaration(node) {
                    renamer.plan(&binder, decl.name, 'v');
                }
            }
            _ => {}
        }
    }

    for (&symbol_id, name) in &renamer.renames {
        let Some(symbol) = binder.get_symbol(symbol_id) else {
            continue;
        };
        debug!(from = %symbol.name, to = %name, "rename binding");
        for &site in symbol.declarations.iter().chain(symbol.references.iter()) {
            arena.set_identifier_text(site, name);
        }
    }

    let count = renamer.renames.len();
    info!(count, "renamed bindings");
    count
}
