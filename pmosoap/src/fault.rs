//! SOAP Faults
//!
//! Un Fault porte un code, un message, l'acteur à l'origine de l'erreur, un
//! `detail` optionnel et des éléments supplémentaires conservés dans l'ordre
//! du document.
//!
//! Le `faultcode` est décodé comme un entier : c'est le comportement historique
//! de ce codec, même si SOAP 1.1 y place normalement un nom qualifié
//! (`SOAP-ENV:Client`). Un code non numérique est rejeté par le décodage.

use std::fmt;

use tracing::trace;
use xmltree::{Element, XMLNode};

use crate::context::DecodeContext;
use crate::errors::{Result, Slot, SoapError};
use crate::namespace::{NamespaceContext, QName};
use crate::tree::{Child, significant_children, text_label};
use crate::value::{SoapElement, SoapInteger, SoapString, SoapValue};

const FAULT_CODE: &str = "faultcode";
const FAULT_STRING: &str = "faultstring";
const FAULT_ACTOR: &str = "faultactor";
const DETAIL: &str = "detail";

/// Classement des enfants d'un Fault, par nom local
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultChild {
    Code,
    String,
    Actor,
    Detail,
    Extra,
}

impl FaultChild {
    fn classify(local_name: &str) -> Self {
        match local_name {
            FAULT_CODE => Self::Code,
            FAULT_STRING => Self::String,
            FAULT_ACTOR => Self::Actor,
            DETAIL => Self::Detail,
            _ => Self::Extra,
        }
    }
}

/// Erreur SOAP (Fault)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapFault {
    /// Code d'erreur
    pub fault_code: Option<SoapInteger>,

    /// Description de l'erreur
    pub fault_string: Option<SoapString>,

    /// Acteur à l'origine de l'erreur
    pub fault_actor: Option<SoapString>,

    /// Détail applicatif optionnel
    pub detail: Option<SoapValue>,

    /// Éléments supplémentaires, dans l'ordre du document
    pub extra_items: Vec<SoapElement>,
}

impl SoapFault {
    /// Crée un fault avec code, message et acteur
    pub fn new(fault_code: i64, fault_string: impl Into<String>, fault_actor: impl Into<String>) -> Self {
        Self {
            fault_code: Some(SoapInteger(fault_code)),
            fault_string: Some(SoapString(fault_string.into())),
            fault_actor: Some(SoapString(fault_actor.into())),
            detail: None,
            extra_items: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: SoapValue) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_extra_item(mut self, item: SoapElement) -> Self {
        self.extra_items.push(item);
        self
    }

    pub fn code(&self) -> Option<i64> {
        self.fault_code.map(|code| code.0)
    }

    pub fn string(&self) -> Option<&str> {
        self.fault_string.as_ref().map(SoapString::as_str)
    }

    pub fn actor(&self) -> Option<&str> {
        self.fault_actor.as_ref().map(SoapString::as_str)
    }

    /// Encode le fault. Aucune validation : les champs absents sont omis,
    /// les autres sont émis dans l'ordre code, message, acteur, détail, extras.
    pub fn encode(&self, ns: &NamespaceContext) -> Element {
        let mut ns = ns.clone();
        let mut element = ns.new_element(&QName::envelope("Fault"));

        if let Some(code) = &self.fault_code {
            element.children.push(XMLNode::Element(code.encode(FAULT_CODE)));
        }
        if let Some(string) = &self.fault_string {
            element
                .children
                .push(XMLNode::Element(string.encode(FAULT_STRING)));
        }
        if let Some(actor) = &self.fault_actor {
            element
                .children
                .push(XMLNode::Element(actor.encode(FAULT_ACTOR)));
        }
        if let Some(detail) = &self.detail {
            element
                .children
                .push(XMLNode::Element(detail.encode(&ns, &QName::local(DETAIL))));
        }
        for item in &self.extra_items {
            element.children.push(XMLNode::Element(item.encode(&ns)));
        }

        element
    }

    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        let mut fault_code = Slot::new(FAULT_CODE, "Fault");
        let mut fault_string = Slot::new(FAULT_STRING, "Fault");
        let mut fault_actor = Slot::new(FAULT_ACTOR, "Fault");
        let mut detail = Slot::new(DETAIL, "Fault");
        let mut extra_items = Vec::new();

        for child in significant_children(element) {
            let child = match child {
                Child::Element(child) => child,
                Child::Text(text) => {
                    return Err(SoapError::UnknownChild {
                        name: text_label(text),
                        parent: "Fault",
                    });
                }
            };

            let child_ctx = ctx.enter(child)?;
            let name = child_ctx.element_name(child)?;
            let kind = FaultChild::classify(&name.name);
            trace!(child = %name, ?kind, "Classified SOAP fault child");

            match kind {
                FaultChild::Code => fault_code.fill_with(|| SoapInteger::decode(child))?,
                FaultChild::String => fault_string.fill_with(|| SoapString::decode(child))?,
                FaultChild::Actor => fault_actor.fill_with(|| SoapString::decode(child))?,
                FaultChild::Detail => detail.fill_with(|| SoapValue::decode(&child_ctx, child))?,
                FaultChild::Extra => extra_items.push(SoapElement::decode(&child_ctx, child)?),
            }
        }

        Ok(Self {
            fault_code: fault_code.into_inner(),
            fault_string: fault_string.into_inner(),
            fault_actor: fault_actor.into_inner(),
            detail: detail.into_inner(),
            extra_items,
        })
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SOAP Fault")?;
        if let Some(code) = &self.fault_code {
            write!(f, " {}", code)?;
        }
        if let Some(string) = &self.fault_string {
            write!(f, ": {}", string)?;
        }
        if let Some(actor) = &self.fault_actor {
            write!(f, " ({})", actor)?;
        }
        Ok(())
    }
}
