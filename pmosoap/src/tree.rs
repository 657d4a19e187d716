//! Parcours des enfants d'un élément XML

use xmltree::{Element, XMLNode};

/// Enfant significatif d'un élément structurel SOAP
#[derive(Debug, Clone, Copy)]
pub(crate) enum Child<'a> {
    Element(&'a Element),
    Text(&'a str),
}

/// Texte vide ou composé uniquement de blancs
pub(crate) fn is_blank_text(node: &XMLNode) -> bool {
    match node {
        XMLNode::Text(text) | XMLNode::CData(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Enfants à classer : éléments et textes non blancs.
///
/// Commentaires et instructions de traitement sont ignorés.
pub(crate) fn significant_children(element: &Element) -> impl Iterator<Item = Child<'_>> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(Child::Element(child)),
        XMLNode::Text(text) | XMLNode::CData(text) if !text.trim().is_empty() => {
            Some(Child::Text(text))
        }
        _ => None,
    })
}

/// Enfants éléments uniquement
pub(crate) fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

pub(crate) fn text_element(tag: &str, text: String) -> Element {
    let mut element = Element::new(tag);
    if !text.is_empty() {
        element.children.push(XMLNode::Text(text));
    }
    element
}

/// Extrait court d'un texte pour les messages d'erreur
pub(crate) fn text_label(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(32) {
        Some((cut, _)) => format!("#text({}...)", &trimmed[..cut]),
        None => format!("#text({})", trimmed),
    }
}
