//! En-tête SOAP : `Header` et ses entrées
//!
//! Le contenu d'une entrée n'est pas interprété : ses noeuds enfants sont
//! conservés tels quels, commentaires et CDATA compris. Au décodage, chaque
//! élément du contenu redéclare les préfixes hérités qu'il emploie, si bien
//! qu'il reste lisible une fois détaché de l'enveloppe.
//!
//! `mustUnderstand` et `encodingStyle` doivent être qualifiés par le
//! namespace de l'enveloppe ; un attribut non préfixé n'a pas de namespace.

use tracing::trace;
use xmltree::{Element, XMLNode};

use crate::context::DecodeContext;
use crate::errors::{Result, Slot, SoapError};
use crate::namespace::{NamespaceContext, QName, declaration_prefix};
use crate::tree::{Child, significant_children, text_label};

pub(crate) const ATTR_MUST_UNDERSTAND: &str = "mustUnderstand";
pub(crate) const ATTR_ENCODING_STYLE: &str = "encodingStyle";

/// Attributs reconnus sur une entrée d'en-tête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderAttribute {
    MustUnderstand,
    EncodingStyle,
    /// `xmlns` / `xmlns:p`, laissé au contexte de namespaces
    Declaration,
}

impl HeaderAttribute {
    fn classify(ns: &NamespaceContext, raw: &str) -> Option<Self> {
        if declaration_prefix(raw).is_some() {
            Some(Self::Declaration)
        } else if ns.attribute_matches(&QName::envelope(ATTR_MUST_UNDERSTAND), raw) {
            Some(Self::MustUnderstand)
        } else if ns.attribute_matches(&QName::envelope(ATTR_ENCODING_STYLE), raw) {
            Some(Self::EncodingStyle)
        } else {
            None
        }
    }
}

/// Entrée d'en-tête SOAP
///
/// Le nom est figé à la construction ; contenu, `mustUnderstand` et
/// `encodingStyle` restent modifiables avant l'encodage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeaderItem {
    namespace: String,
    name: String,

    /// Noeuds enfants bruts
    pub content: Vec<XMLNode>,

    /// Traitement obligatoire par le destinataire
    pub must_understand: bool,

    pub encoding_style: Option<String>,
}

impl SoapHeaderItem {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, content: Vec<XMLNode>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            content,
            must_understand: false,
            encoding_style: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qname(&self) -> QName {
        QName::new(self.namespace.as_str(), self.name.as_str())
    }

    /// Texte concaténé du contenu
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|node| node.as_text().or_else(|| node.as_cdata()))
            .collect()
    }

    /// Encode l'entrée ; une entrée sans nom ne produit aucun élément.
    pub fn encode(&self, ns: &NamespaceContext) -> Option<Element> {
        if self.name.is_empty() {
            trace!("Skipping SOAP header item without name");
            return None;
        }

        let mut ns = ns.clone();
        let mut element = ns.new_element(&self.qname());

        let must_understand =
            ns.attribute_name(&mut element, &QName::envelope(ATTR_MUST_UNDERSTAND));
        element.attributes.insert(
            must_understand,
            (if self.must_understand { "1" } else { "0" }).to_string(),
        );

        if let Some(style) = &self.encoding_style {
            let encoding_style =
                ns.attribute_name(&mut element, &QName::envelope(ATTR_ENCODING_STYLE));
            element.attributes.insert(encoding_style, style.clone());
        }

        element.children = self.content.clone();
        Some(element)
    }

    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        let mut must_understand = Slot::new(ATTR_MUST_UNDERSTAND, "HeaderItem");
        let mut encoding_style = Slot::new(ATTR_ENCODING_STYLE, "HeaderItem");

        for (key, value) in &element.attributes {
            match HeaderAttribute::classify(ctx.namespaces(), key) {
                Some(HeaderAttribute::MustUnderstand) => {
                    must_understand.fill_with(|| parse_must_understand(element, value))?
                }
                Some(HeaderAttribute::EncodingStyle) => {
                    encoding_style.fill_with(|| Ok(value.clone()))?
                }
                Some(HeaderAttribute::Declaration) => {}
                None => return Err(SoapError::UnknownAttribute(key.clone())),
            }
        }

        let qname = ctx.element_name(element)?;
        trace!(header = %qname, "Decoded SOAP header item");

        Ok(Self {
            namespace: qname.namespace,
            name: qname.name,
            content: element
                .children
                .iter()
                .map(|node| ctx.namespaces().detach(node))
                .collect(),
            must_understand: must_understand.into_inner().unwrap_or(false),
            encoding_style: encoding_style.into_inner(),
        })
    }
}

fn parse_must_understand(element: &Element, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(SoapError::InvalidValue {
            kind: "boolean",
            tag: format!("{}@{}", element.name, ATTR_MUST_UNDERSTAND),
            value: value.to_string(),
        }),
    }
}

/// En-tête SOAP : suite ordonnée d'entrées
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapHeader {
    items: Vec<SoapHeaderItem>,
}

impl SoapHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: SoapHeaderItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[SoapHeaderItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [SoapHeaderItem] {
        &mut self.items
    }

    /// Nombre d'entrées
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SoapHeaderItem> {
        self.items.iter()
    }

    /// Première entrée de nom (`namespace`, `name`)
    pub fn find(&self, namespace: &str, name: &str) -> Option<&SoapHeaderItem> {
        self.items
            .iter()
            .find(|item| item.namespace == namespace && item.name == name)
    }

    pub fn encode(&self, ns: &NamespaceContext) -> Element {
        let mut ns = ns.clone();
        let mut element = ns.new_element(&QName::envelope("Header"));
        element.children = self
            .items
            .iter()
            .filter_map(|item| item.encode(&ns))
            .map(XMLNode::Element)
            .collect();
        element
    }

    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        let mut header = Self::new();
        for child in significant_children(element) {
            match child {
                Child::Element(item) => {
                    let item_ctx = ctx.enter(item)?;
                    header.push(SoapHeaderItem::decode(&item_ctx, item)?);
                }
                Child::Text(text) => {
                    return Err(SoapError::UnknownChild {
                        name: text_label(text),
                        parent: "Header",
                    });
                }
            }
        }
        Ok(header)
    }
}

impl FromIterator<SoapHeaderItem> for SoapHeader {
    fn from_iter<I: IntoIterator<Item = SoapHeaderItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SoapHeader {
    type Item = &'a SoapHeaderItem;
    type IntoIter = std::slice::Iter<'a, SoapHeaderItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
