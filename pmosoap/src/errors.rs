//! Erreurs du codec SOAP
//!
//! Toutes les erreurs de décodage sont fatales pour l'appel en cours : aucun
//! résultat partiel n'est renvoyé. L'encodage ne produit que des erreurs
//! d'écriture XML.

use thiserror::Error;

/// Erreur SOAP (décodage structurel, parsing ou sérialisation XML)
#[derive(Debug, Error)]
pub enum SoapError {
    #[error("XML scan error: {0}")]
    Scan(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    Write(#[from] xmltree::Error),

    #[error("Serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Un champ attendu au plus une fois apparaît deux fois
    #[error("Duplicated {field} in {parent}")]
    DuplicateField {
        field: &'static str,
        parent: &'static str,
    },

    /// Attribut hors de l'ensemble autorisé sur un header item
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Enfant non classable dans le contexte courant (Body, Header, Fault)
    #[error("Unknown node name in {parent}: {name}")]
    UnknownChild { name: String, parent: &'static str },

    /// Enfant direct de l'Envelope qui n'est ni Header ni Body
    #[error("Unknown scoping element: {0}")]
    UnknownElement(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Envelope not found: root element is {0}")]
    EnvelopeNotFound(String),

    #[error("Missing SOAP Body")]
    MissingBody,

    #[error("Unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    #[error("Invalid {kind} value in {tag}: {value:?}")]
    InvalidValue {
        kind: &'static str,
        tag: String,
        value: String,
    },

    #[error("Document nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),
}

pub type Result<T> = std::result::Result<T, SoapError>;

/// Emplacement « au plus une fois » utilisé pendant le décodage.
///
/// Le premier remplissage réussit, le second échoue avec
/// [`SoapError::DuplicateField`] avant même de décoder la valeur.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    value: Option<T>,
    field: &'static str,
    parent: &'static str,
}

impl<T> Slot<T> {
    pub(crate) fn new(field: &'static str, parent: &'static str) -> Self {
        Self {
            value: None,
            field,
            parent,
        }
    }

    pub(crate) fn fill_with<F>(&mut self, decode: F) -> Result<()>
    where
        F: FnOnce() -> Result<T>,
    {
        if self.value.is_some() {
            return Err(SoapError::DuplicateField {
                field: self.field,
                parent: self.parent,
            });
        }
        self.value = Some(decode()?);
        Ok(())
    }

    pub(crate) fn into_inner(self) -> Option<T> {
        self.value
    }
}
