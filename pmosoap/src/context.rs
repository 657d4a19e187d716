//! Contexte de décodage : namespaces + garde de profondeur

use tracing::warn;
use xmltree::Element;

use crate::errors::{Result, SoapError};
use crate::namespace::{NamespaceContext, QName};

/// Profondeur d'imbrication maximale par défaut
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Contexte passé par valeur à chaque appel récursif du décodage.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    namespaces: NamespaceContext,
    depth: usize,
    max_depth: usize,
}

impl DecodeContext {
    pub fn new(namespaces: NamespaceContext, max_depth: usize) -> Self {
        Self {
            namespaces,
            depth: 0,
            max_depth,
        }
    }

    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Contexte de `element`, un niveau plus profond
    pub fn enter(&self, element: &Element) -> Result<DecodeContext> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            warn!(
                element = %element.name,
                max_depth = self.max_depth,
                "SOAP decode rejected: nesting too deep"
            );
            return Err(SoapError::TooDeep(self.max_depth));
        }
        Ok(Self {
            namespaces: self.namespaces.enter(element),
            depth,
            max_depth: self.max_depth,
        })
    }

    pub fn element_name(&self, element: &Element) -> Result<QName> {
        self.namespaces.element_name(element)
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(NamespaceContext::new(), DEFAULT_MAX_DEPTH)
    }
}
