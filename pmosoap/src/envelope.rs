//! Structures de l'enveloppe SOAP

use tracing::debug;
use xmltree::{Element, XMLNode};

use crate::body::SoapBody;
use crate::context::DecodeContext;
use crate::errors::{Result, Slot, SoapError};
use crate::header::SoapHeader;
use crate::namespace::{NamespaceContext, QName};
use crate::tree::{Child, is_blank_text, significant_children, text_label};

/// Enfants autorisés de l'Envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeChild {
    Header,
    Body,
}

impl EnvelopeChild {
    fn classify(name: &QName) -> Option<Self> {
        if *name == QName::envelope("Header") {
            Some(Self::Header)
        } else if *name == QName::envelope("Body") {
            Some(Self::Body)
        } else {
            None
        }
    }
}

/// Enveloppe SOAP complète
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapEnvelope {
    /// En-tête SOAP optionnel
    pub header: Option<SoapHeader>,

    /// Corps SOAP contenant l'action, la réponse ou le fault
    pub body: SoapBody,
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP
    pub fn new(body: SoapBody) -> Self {
        Self { header: None, body }
    }

    /// Crée une nouvelle enveloppe avec header
    pub fn with_header(header: SoapHeader, body: SoapBody) -> Self {
        Self {
            header: Some(header),
            body,
        }
    }

    /// Encode l'enveloppe.
    ///
    /// Chaque liaison du contexte devient un attribut `xmlns`/`xmlns:p` de la
    /// racine. Un header vide n'est pas émis.
    pub fn encode(&self, ns: &NamespaceContext) -> Element {
        let mut ns = ns.clone();
        let mut element = ns.new_element(&QName::envelope("Envelope"));

        for (uri, prefix) in ns.bindings() {
            if prefix.is_empty() {
                if !uri.is_empty() {
                    element.attributes.insert("xmlns".to_string(), uri.to_string());
                }
            } else {
                element
                    .attributes
                    .insert(format!("xmlns:{}", prefix), uri.to_string());
            }
        }

        if let Some(header) = self.header.as_ref().filter(|h| !h.is_empty()) {
            element.children.push(XMLNode::Element(header.encode(&ns)));
        }
        element.children.push(XMLNode::Element(self.body.encode(&ns)));

        element
    }

    /// Décode un document : ses noeuds de premier niveau doivent se réduire
    /// à un unique élément `Envelope`.
    ///
    /// Commentaires, instructions de traitement et blancs de premier niveau
    /// sont ignorés.
    pub fn decode(ctx: &DecodeContext, document: &[XMLNode]) -> Result<Self> {
        let top_level: Vec<&XMLNode> = document
            .iter()
            .filter(|node| {
                !matches!(
                    node,
                    XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..)
                ) && !is_blank_text(node)
            })
            .collect();

        let root = match top_level.as_slice() {
            [XMLNode::Element(root)] => root,
            [_] => {
                return Err(SoapError::MalformedDocument(
                    "top-level node is not an element".to_string(),
                ));
            }
            nodes => {
                return Err(SoapError::MalformedDocument(format!(
                    "expected exactly one top-level element, found {} nodes",
                    nodes.len()
                )));
            }
        };

        Self::decode_element(ctx, root)
    }

    /// Décode l'élément racine `Envelope`
    pub fn decode_element(ctx: &DecodeContext, root: &Element) -> Result<Self> {
        let ctx = ctx.enter(root)?;
        let name = ctx.element_name(root)?;
        if name != QName::envelope("Envelope") {
            return Err(SoapError::EnvelopeNotFound(name.to_string()));
        }

        let mut header = Slot::new("Header", "Envelope");
        let mut body = Slot::new("Body", "Envelope");

        for child in significant_children(root) {
            let child = match child {
                Child::Element(child) => child,
                Child::Text(text) => return Err(SoapError::UnknownElement(text_label(text))),
            };

            let child_ctx = ctx.enter(child)?;
            let name = child_ctx.element_name(child)?;
            match EnvelopeChild::classify(&name) {
                Some(EnvelopeChild::Header) => {
                    header.fill_with(|| SoapHeader::decode(&child_ctx, child))?
                }
                Some(EnvelopeChild::Body) => {
                    body.fill_with(|| SoapBody::decode(&child_ctx, child))?
                }
                None => return Err(SoapError::UnknownElement(name.to_string())),
            }
        }

        let header = header.into_inner();
        let body = body.into_inner().ok_or(SoapError::MissingBody)?;
        debug!(
            header_items = header.as_ref().map_or(0, SoapHeader::len),
            fault = body.is_fault(),
            "Decoded SOAP envelope"
        );

        Ok(Self { header, body })
    }
}
