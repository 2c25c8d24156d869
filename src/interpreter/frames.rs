use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::library::library::SymbolId;

use super::value::{Cell, Value};

/// One function activation: a stack of block scopes mapping symbols to
/// their storage cells. The base scope holds the parameters.
#[derive(Debug)]
pub(crate) struct ActivationFrame {
    pub function: SymbolId,
    scopes: Vec<FxHashMap<SymbolId, Cell>>,
}

impl ActivationFrame {
    pub fn new(function: SymbolId) -> Self {
        ActivationFrame {
            function,
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Create storage for `symbol` in the innermost scope.
    pub fn bind(&mut self, symbol: SymbolId, value: Value) -> Cell {
        let cell: Cell = Rc::new(RefCell::new(value.detached()));
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol, Rc::clone(&cell));
        }
        cell
    }

    /// Innermost-wins lookup across this frame's scopes only; frames never
    /// see each other's locals.
    pub fn lookup(&self, symbol: SymbolId) -> Option<Cell> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&symbol).map(Rc::clone))
    }
}

/// Storage for global variables, populated lazily on first touch.
#[derive(Debug, Default)]
pub(crate) struct GlobalFrame {
    cells: FxHashMap<SymbolId, Cell>,
}

impl GlobalFrame {
    pub fn lookup(&self, symbol: SymbolId) -> Option<Cell> {
        self.cells.get(&symbol).map(Rc::clone)
    }

    pub fn bind(&mut self, symbol: SymbolId, value: Value) -> Cell {
        let cell: Cell = Rc::new(RefCell::new(value.detached()));
        self.cells.insert(symbol, Rc::clone(&cell));
        cell
    }
}
