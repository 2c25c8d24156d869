use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::nodes::BlockNode;
use crate::errors::errors::SemanticError;
use crate::library::library::{Library, SymbolId};

use super::{declarations, expressions};

/// Analyze `block`, annotating the tree in place and populating `library`
/// with every symbol the program declares.
///
/// Analysis stops at the first error; the tree and library are left
/// partially annotated in that case and must not be executed.
pub fn analyze(block: &mut BlockNode, library: &mut Library) -> Result<(), SemanticError> {
    debug!("pass A: class type declaration");
    declarations::declare_class_types(block, library)?;

    debug!("pass B: type reference resolution");
    declarations::resolve_type_references(block, library)?;

    debug!("pass C: declaration registration");
    declarations::register_declarations(block, library)?;

    debug!("pass D: name and expression resolution");
    expressions::resolve(block, library)
}

/// Lexical scope stack used by pass D. The global namespace is not a scope
/// here; lookups that miss every scope fall back to the library.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<FxHashMap<String, SymbolId>>,
}

impl ScopeStack {
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Declare `name` in the innermost scope. Redeclaring a name already in
    /// that same scope is an error; shadowing an outer scope is not.
    pub fn declare(&mut self, name: &str, id: SymbolId) -> Result<(), SemanticError> {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Err(SemanticError::SymbolNotFound(name.to_string())),
        };
        if scope.contains_key(name) {
            return Err(SemanticError::DuplicateName(name.to_string()));
        }
        scope.insert(name.to_string(), id);
        Ok(())
    }

    /// Innermost-wins lookup.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}
