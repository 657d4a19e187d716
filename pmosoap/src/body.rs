//! Corps SOAP : un payload structuré ou un Fault

use tracing::trace;
use xmltree::{Element, XMLNode};

use crate::context::DecodeContext;
use crate::errors::{Result, SoapError};
use crate::fault::SoapFault;
use crate::header::ATTR_ENCODING_STYLE;
use crate::namespace::{ENCODING_NAMESPACE, NamespaceContext, QName};
use crate::tree::{Child, significant_children, text_label};
use crate::value::SoapElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyChild {
    Fault,
    Payload,
}

impl BodyChild {
    fn classify(name: &QName) -> Self {
        if *name == QName::envelope("Fault") {
            Self::Fault
        } else {
            Self::Payload
        }
    }
}

/// Corps SOAP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SoapBody {
    /// `<Body/>` sans contenu
    #[default]
    Empty,

    /// Requête ou réponse applicative
    Payload(SoapElement),

    Fault(SoapFault),
}

impl SoapBody {
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapBody::Fault(_))
    }

    pub fn payload(&self) -> Option<&SoapElement> {
        match self {
            SoapBody::Payload(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            SoapBody::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Encode le corps. Hors Fault, l'attribut `encodingStyle` désigne
    /// l'encodage SOAP standard.
    pub fn encode(&self, ns: &NamespaceContext) -> Element {
        let mut ns = ns.clone();
        let mut element = ns.new_element(&QName::envelope("Body"));

        if let SoapBody::Fault(fault) = self {
            element.children.push(XMLNode::Element(fault.encode(&ns)));
            return element;
        }

        let encoding_style = ns.attribute_name(&mut element, &QName::envelope(ATTR_ENCODING_STYLE));
        element
            .attributes
            .insert(encoding_style, ENCODING_NAMESPACE.to_string());
        if let SoapBody::Payload(payload) = self {
            element.children.push(XMLNode::Element(payload.encode(&ns)));
        }

        element
    }

    /// Décode le corps.
    ///
    /// Un Fault remplace le contenu déjà décodé. Les payloads à références
    /// multiples (`href`/`id`) ne sont pas résolus : un second payload est
    /// rejeté.
    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        let mut body = SoapBody::Empty;

        for child in significant_children(element) {
            let child = match child {
                Child::Element(child) => child,
                Child::Text(text) => {
                    return Err(SoapError::UnknownChild {
                        name: text_label(text),
                        parent: "Body",
                    });
                }
            };

            let child_ctx = ctx.enter(child)?;
            let name = child_ctx.element_name(child)?;
            let kind = BodyChild::classify(&name);
            trace!(child = %name, ?kind, "Classified SOAP body child");

            body = match kind {
                BodyChild::Fault => SoapBody::Fault(SoapFault::decode(&child_ctx, child)?),
                BodyChild::Payload if body == SoapBody::Empty => {
                    SoapBody::Payload(SoapElement::decode_payload(&child_ctx, child)?)
                }
                BodyChild::Payload => {
                    return Err(SoapError::UnknownChild {
                        name: name.to_string(),
                        parent: "Body",
                    });
                }
            };
        }

        Ok(body)
    }
}

impl From<SoapElement> for SoapBody {
    fn from(payload: SoapElement) -> Self {
        SoapBody::Payload(payload)
    }
}

impl From<SoapFault> for SoapBody {
    fn from(fault: SoapFault) -> Self {
        SoapBody::Fault(fault)
    }
}
