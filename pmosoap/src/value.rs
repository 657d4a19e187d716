//! Valeurs SOAP portées par le Body, le Fault et les header items
//!
//! Codec minimal : scalaires typés (entier, chaîne) et structures génériques.
//! Un élément ayant des enfants éléments est une structure ; sinon son type
//! est lu dans l'attribut `xsi:type` (résolu par namespace), à défaut c'est
//! une chaîne.

use std::fmt;

use xmltree::{Element, XMLNode};

use crate::context::DecodeContext;
use crate::errors::{Result, SoapError};
use crate::namespace::{
    ENCODING_NAMESPACE, NamespaceContext, QName, XSD_NAMESPACE, XSI_NAMESPACE,
};
use crate::tree::{Child, child_elements, significant_children, text_element, text_label};

/// Types XML Schema décodés comme entiers
const INTEGER_TYPES: &[&str] = &[
    "int",
    "integer",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "negativeInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
];

/// Entier SOAP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoapInteger(pub i64);

impl SoapInteger {
    pub fn encode(&self, tag: &str) -> Element {
        text_element(tag, self.0.to_string())
    }

    pub fn decode(element: &Element) -> Result<Self> {
        let text = element.get_text().unwrap_or_default();
        text.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| SoapError::InvalidValue {
                kind: "integer",
                tag: element.name.clone(),
                value: text.to_string(),
            })
    }
}

impl From<i64> for SoapInteger {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SoapInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chaîne SOAP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapString(pub String);

impl SoapString {
    pub fn encode(&self, tag: &str) -> Element {
        text_element(tag, self.0.clone())
    }

    pub fn decode(element: &Element) -> Result<Self> {
        Ok(Self(element.get_text().unwrap_or_default().into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SoapString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SoapString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SoapString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Valeur décodée, sans nom d'élément
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapValue {
    Integer(i64),
    String(String),
    Struct(Vec<SoapElement>),
}

impl SoapValue {
    /// Décodage générique d'un élément dont le contexte a déjà été ouvert
    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        if child_elements(element).next().is_some() {
            return decode_members(ctx, element).map(SoapValue::Struct);
        }
        match value_type(ctx.namespaces(), element) {
            Some(ValueType::Integer) => SoapInteger::decode(element).map(|i| SoapValue::Integer(i.0)),
            Some(ValueType::Struct) => decode_members(ctx, element).map(SoapValue::Struct),
            Some(ValueType::String) | None => {
                SoapString::decode(element).map(|s| SoapValue::String(s.0))
            }
        }
    }

    /// Encode la valeur dans un élément nommé `name`.
    ///
    /// Les entiers portent `xsi:type="xsd:int"`. Une chaîne vide et une
    /// structure sans membres sont typées (`xsd:string`, `SOAP-ENC:Struct`)
    /// pour rester distinctes au décodage.
    pub fn encode(&self, ns: &NamespaceContext, name: &QName) -> Element {
        let mut ns = ns.clone();
        let mut element = ns.new_element(name);

        match self {
            SoapValue::Integer(value) => {
                set_type(&mut ns, &mut element, &QName::new(XSD_NAMESPACE, "int"));
                element.children.push(XMLNode::Text(value.to_string()));
            }
            SoapValue::String(value) if value.is_empty() => {
                set_type(&mut ns, &mut element, &QName::new(XSD_NAMESPACE, "string"));
            }
            SoapValue::String(value) => {
                element.children.push(XMLNode::Text(value.clone()));
            }
            SoapValue::Struct(members) if members.is_empty() => {
                set_type(&mut ns, &mut element, &QName::new(ENCODING_NAMESPACE, "Struct"));
            }
            SoapValue::Struct(members) => {
                for member in members {
                    element
                        .children
                        .push(XMLNode::Element(member.encode(&ns)));
                }
            }
        }

        element
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SoapValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SoapValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn members(&self) -> &[SoapElement] {
        match self {
            SoapValue::Struct(members) => members.as_slice(),
            _ => &[],
        }
    }
}

/// Valeur nommée : payload du Body, élément supplémentaire d'un Fault…
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapElement {
    pub name: QName,
    pub value: SoapValue,
}

impl SoapElement {
    pub fn new(name: QName, value: SoapValue) -> Self {
        Self { name, value }
    }

    /// Structure nommée
    pub fn structure(name: QName, members: Vec<SoapElement>) -> Self {
        Self::new(name, SoapValue::Struct(members))
    }

    pub fn decode(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        Ok(Self {
            name: ctx.element_name(element)?,
            value: SoapValue::decode(ctx, element)?,
        })
    }

    /// Décode le payload d'un Body.
    ///
    /// Un élément vide et non typé (`<u:Stop/>`) est une action sans
    /// arguments, donc une structure sans membres ; le reste suit le
    /// décodage générique.
    pub fn decode_payload(ctx: &DecodeContext, element: &Element) -> Result<Self> {
        let name = ctx.element_name(element)?;
        let bare = significant_children(element).next().is_none()
            && value_type(ctx.namespaces(), element).is_none();

        let value = if bare {
            SoapValue::Struct(Vec::new())
        } else {
            SoapValue::decode(ctx, element)?
        };
        Ok(Self { name, value })
    }

    pub fn encode(&self, ns: &NamespaceContext) -> Element {
        self.value.encode(ns, &self.name)
    }

    /// Premier membre de nom local `name`
    pub fn member(&self, name: &str) -> Option<&SoapValue> {
        self.value
            .members()
            .iter()
            .find(|m| m.name.name == name)
            .map(|m| &m.value)
    }
}

/// Types reconnus dans `xsi:type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Integer,
    String,
    Struct,
}

impl ValueType {
    fn classify(type_name: &QName) -> Option<Self> {
        match type_name.namespace.as_str() {
            XSD_NAMESPACE if INTEGER_TYPES.contains(&type_name.name.as_str()) => Some(Self::Integer),
            XSD_NAMESPACE if type_name.name == "string" => Some(Self::String),
            ENCODING_NAMESPACE if type_name.name == "Struct" => Some(Self::Struct),
            _ => None,
        }
    }
}

/// Type porté par l'attribut `xsi:type`, résolu par namespace
fn value_type(ns: &NamespaceContext, element: &Element) -> Option<ValueType> {
    let raw = ns.attribute(element, &QName::new(XSI_NAMESPACE, "type"))?;
    let type_name = ns.parse_qualified_name(raw.trim()).ok()?;
    ValueType::classify(&type_name)
}

fn set_type(ns: &mut NamespaceContext, element: &mut Element, type_name: &QName) {
    let type_attr = ns.attribute_name(element, &QName::new(XSI_NAMESPACE, "type"));
    let (value, declaration) = ns.declare(type_name);
    if let Some((key, uri)) = declaration {
        element.attributes.insert(key, uri);
    }
    element.attributes.insert(type_attr, value);
}

/// Membres d'une structure ; du texte à côté des membres est une erreur
fn decode_members(ctx: &DecodeContext, element: &Element) -> Result<Vec<SoapElement>> {
    significant_children(element)
        .map(|child| match child {
            Child::Element(child) => SoapElement::decode(&ctx.enter(child)?, child),
            Child::Text(text) => Err(SoapError::InvalidValue {
                kind: "struct",
                tag: element.name.clone(),
                value: text_label(text),
            }),
        })
        .collect()
}
