//! Tabla de símbolos.
//!
//! El lenguaje tiene un único ámbito global. Las variables se declaran
//! una sola vez en la sección `BAGULHOS` y a partir de ahí solo se
//! consultan. Los nombres distinguen mayúsculas de minúsculas.

use std::collections::HashMap;

use crate::{
    semantic::{Semantic, SemanticError},
    source::{Located, Position},
};

/// Una variable declarada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    name: String,
    declared_at: Position,
    initialized: bool,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_at(&self) -> Position {
        self.declared_at
    }

    /// Indica si el preámbulo del programa ya le asignó su valor inicial.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Tabla de símbolos del ámbito global, en orden de declaración.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Declara una variable, fallando si ya existía.
    pub fn declare(&mut self, name: &str, position: Position) -> Semantic<&Symbol> {
        if self.index.contains_key(name) {
            let error = SemanticError::Redeclared(name.to_owned());
            return Err(Located::at(error, position));
        }

        self.index.insert(name.to_owned(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_owned(),
            declared_at: position,
            initialized: false,
        });

        Ok(&self.symbols[self.symbols.len() - 1])
    }

    /// Busca una variable sin reportar errores.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&index| &self.symbols[index])
    }

    /// Busca una variable referenciada en `position`.
    pub fn lookup(&self, name: &str, position: Position) -> Semantic<&Symbol> {
        self.get(name).ok_or_else(|| {
            Located::at(SemanticError::Undeclared(name.to_owned()), position)
        })
    }

    /// Marca todas las variables como inicializadas.
    pub fn initialize_all(&mut self) {
        for symbol in &mut self.symbols {
            symbol.initialized = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
