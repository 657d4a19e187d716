//! Noms qualifiés et contexte de namespaces
//!
//! Le [`NamespaceContext`] associe des préfixes à des URI de namespace. Il est
//! cloné à chaque descente dans l'arbre ([`NamespaceContext::enter`]) : un
//! sous-arbre ne voit jamais les déclarations de ses frères.

use std::collections::BTreeSet;
use std::fmt;

use xmltree::{Element, XMLNode};

use crate::errors::{Result, SoapError};

/// Namespace de l'enveloppe SOAP 1.1
pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace du style d'encodage SOAP 1.1
pub const ENCODING_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Préfixe réservé aux déclarations de namespace
const XMLNS: &str = "xmlns";

/// Nom qualifié : couple (URI de namespace, nom local).
///
/// Un namespace vide signifie « pas de namespace ».
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: String,
    pub name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Nom sans namespace
    pub fn local(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// Nom dans le namespace de l'enveloppe SOAP
    pub fn envelope(name: impl Into<String>) -> Self {
        Self::new(ENVELOPE_NAMESPACE, name)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Notation de Clark : `{uri}local`
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.name)
        }
    }
}

/// Contexte de résolution préfixe <-> namespace.
///
/// Chaque préfixe n'apparaît qu'une fois : une nouvelle liaison remplace
/// l'ancienne. Le préfixe vide désigne le namespace par défaut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// (préfixe, uri) dans l'ordre de déclaration
    bindings: Vec<(String, String)>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contexte standard d'une enveloppe SOAP 1.1
    pub fn soap_default() -> Self {
        let mut ns = Self::new();
        ns.bind("SOAP-ENV", ENVELOPE_NAMESPACE);
        ns.bind("SOAP-ENC", ENCODING_NAMESPACE);
        ns.bind("xsd", XSD_NAMESPACE);
        ns.bind("xsi", XSI_NAMESPACE);
        ns
    }

    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        self.bindings.retain(|(p, _)| *p != prefix);
        self.bindings.push((prefix, uri.into()));
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Dernier préfixe lié à `uri`
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Liaisons `(uri, préfixe)` dans l'ordre de déclaration
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (uri.as_str(), prefix.as_str()))
    }

    /// Contexte d'un élément enfant : copie du contexte courant enrichie des
    /// déclarations `xmlns`/`xmlns:p` portées par l'élément.
    ///
    /// `xmlns=""` annule le namespace par défaut hérité.
    pub fn enter(&self, element: &Element) -> NamespaceContext {
        let mut ns = self.clone();
        for (key, value) in &element.attributes {
            if let Some(prefix) = declaration_prefix(key) {
                ns.bind(prefix, value.as_str());
            }
        }
        ns
    }

    /// Résout un nom d'élément brut `prefixe:local` ou `local`.
    ///
    /// Un nom sans préfixe prend le namespace par défaut.
    pub fn parse_qualified_name(&self, raw: &str) -> Result<QName> {
        match raw.split_once(':') {
            Some((prefix, local)) => self.resolve_prefixed(prefix, local),
            None => Ok(QName::new(self.uri_for("").unwrap_or_default(), raw)),
        }
    }

    /// Résout un nom d'attribut brut.
    ///
    /// Le namespace par défaut ne s'applique pas aux attributs : un nom sans
    /// préfixe n'a pas de namespace.
    pub fn parse_attribute_name(&self, raw: &str) -> Result<QName> {
        match raw.split_once(':') {
            Some((prefix, local)) => self.resolve_prefixed(prefix, local),
            None => Ok(QName::local(raw)),
        }
    }

    fn resolve_prefixed(&self, prefix: &str, local: &str) -> Result<QName> {
        self.uri_for(prefix)
            .map(|uri| QName::new(uri, local))
            .ok_or_else(|| SoapError::UnboundPrefix(prefix.to_string()))
    }

    /// Nom qualifié d'un élément, résolu depuis son nom brut
    pub fn element_name(&self, element: &Element) -> Result<QName> {
        self.parse_qualified_name(&element.name)
    }

    pub fn matches(&self, qname: &QName, raw: &str) -> bool {
        self.parse_qualified_name(raw)
            .map(|parsed| parsed == *qname)
            .unwrap_or(false)
    }

    /// Comme [`matches`](Self::matches) pour un nom d'attribut
    pub fn attribute_matches(&self, qname: &QName, raw: &str) -> bool {
        self.parse_attribute_name(raw)
            .map(|parsed| parsed == *qname)
            .unwrap_or(false)
    }

    /// Valeur d'un attribut désigné par son nom qualifié
    pub fn attribute<'a>(&self, element: &'a Element, qname: &QName) -> Option<&'a str> {
        element
            .attributes
            .iter()
            .find(|(key, _)| declaration_prefix(key).is_none() && self.attribute_matches(qname, key))
            .map(|(_, value)| value.as_str())
    }

    /// Copie autonome d'un noeud décodé.
    ///
    /// Les préfixes utilisés dans le sous-arbre mais déclarés plus haut sont
    /// redéclarés sur sa racine, le namespace par défaut compris : le noeud
    /// garde son sens une fois réémis sous un autre parent.
    pub fn detach(&self, node: &XMLNode) -> XMLNode {
        let XMLNode::Element(element) = node else {
            return node.clone();
        };

        let mut prefixes = BTreeSet::new();
        collect_prefixes(element, &mut prefixes);

        let mut element = element.clone();
        for prefix in prefixes {
            let key = if prefix.is_empty() {
                XMLNS.to_string()
            } else {
                format!("{}:{}", XMLNS, prefix)
            };
            if prefix == "xml" || element.attributes.contains_key(&key) {
                continue;
            }
            match self.uri_for(&prefix) {
                Some(uri) => {
                    element.attributes.insert(key, uri.to_string());
                }
                None if prefix.is_empty() => {
                    element.attributes.insert(key, String::new());
                }
                None => {}
            }
        }
        XMLNode::Element(element)
    }

    /// Nom brut de `qname` si son namespace est lié dans ce contexte
    pub fn qualify(&self, qname: &QName) -> Option<String> {
        if qname.namespace.is_empty() {
            return match self.uri_for("") {
                Some(uri) if !uri.is_empty() => None,
                _ => Some(qname.name.clone()),
            };
        }
        match self.prefix_for(&qname.namespace)? {
            "" => Some(qname.name.clone()),
            prefix => Some(format!("{}:{}", prefix, qname.name)),
        }
    }

    /// Nom brut de `qname`, en liant un nouveau préfixe `nsN` si besoin.
    ///
    /// Retourne aussi l'attribut de déclaration à poser sur l'élément en
    /// cours de construction quand une liaison a été créée.
    pub fn declare(&mut self, qname: &QName) -> (String, Option<(String, String)>) {
        if let Some(raw) = self.qualify(qname) {
            return (raw, None);
        }

        if qname.namespace.is_empty() {
            self.bind("", "");
            return (qname.name.clone(), Some((XMLNS.to_string(), String::new())));
        }

        let prefix = self.fresh_prefix();
        self.bind(prefix.as_str(), qname.namespace.as_str());

        (
            format!("{}:{}", prefix, qname.name),
            Some((format!("{}:{}", XMLNS, prefix), qname.namespace.clone())),
        )
    }

    fn fresh_prefix(&self) -> String {
        (1..)
            .map(|n| format!("ns{}", n))
            .find(|candidate| self.uri_for(candidate).is_none())
            .unwrap_or_default()
    }

    /// Crée un élément nommé par `qname`, déclarant son namespace si besoin
    pub fn new_element(&mut self, qname: &QName) -> Element {
        let (raw, declaration) = self.declare(qname);
        let mut element = Element::new(&raw);
        if let Some((key, uri)) = declaration {
            element.attributes.insert(key, uri);
        }
        element
    }

    /// Nom brut d'un attribut à poser sur `element`.
    ///
    /// Un attribut sans namespace n'est jamais préfixé.
    pub fn attribute_name(&mut self, element: &mut Element, qname: &QName) -> String {
        if qname.namespace.is_empty() {
            return qname.name.clone();
        }
        if let Some(prefix) = self.prefix_for(&qname.namespace).filter(|p| !p.is_empty()) {
            return format!("{}:{}", prefix, qname.name);
        }

        let prefix = self.fresh_prefix();
        self.bind(prefix.as_str(), qname.namespace.as_str());
        element
            .attributes
            .insert(format!("{}:{}", XMLNS, prefix), qname.namespace.clone());
        format!("{}:{}", prefix, qname.name)
    }
}

/// Préfixe déclaré par un attribut `xmlns` (vide) ou `xmlns:p`
pub(crate) fn declaration_prefix(key: &str) -> Option<&str> {
    if key == XMLNS {
        Some("")
    } else {
        key.strip_prefix("xmlns:")
    }
}

/// Préfixes d'éléments et d'attributs employés dans un sous-arbre
fn collect_prefixes(element: &Element, prefixes: &mut BTreeSet<String>) {
    let prefix = element.name.split_once(':').map_or("", |(p, _)| p);
    prefixes.insert(prefix.to_string());

    for key in element.attributes.keys() {
        if declaration_prefix(key).is_some() {
            continue;
        }
        if let Some((prefix, _)) = key.split_once(':') {
            prefixes.insert(prefix.to_string());
        }
    }

    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect_prefixes(child, prefixes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_name() {
        let ns = NamespaceContext::soap_default();
        let qname = ns.parse_qualified_name("SOAP-ENV:Body").unwrap();
        assert_eq!(qname, QName::envelope("Body"));
    }

    #[test]
    fn test_parse_unbound_prefix() {
        let ns = NamespaceContext::new();
        let err = ns.parse_qualified_name("s:Body").unwrap_err();
        assert!(matches!(err, SoapError::UnboundPrefix(p) if p == "s"));
    }

    #[test]
    fn test_bare_name_uses_default_namespace() {
        let mut ns = NamespaceContext::new();
        assert_eq!(ns.parse_qualified_name("Body").unwrap(), QName::local("Body"));

        ns.bind("", ENVELOPE_NAMESPACE);
        assert_eq!(
            ns.parse_qualified_name("Body").unwrap(),
            QName::envelope("Body")
        );
    }

    #[test]
    fn test_bind_replaces_prefix() {
        let mut ns = NamespaceContext::new();
        ns.bind("s", "urn:a");
        ns.bind("s", "urn:b");
        assert_eq!(ns.uri_for("s"), Some("urn:b"));
        assert_eq!(ns.bindings().count(), 1);
    }

    #[test]
    fn test_enter_reads_xmlns_attributes() {
        let ns = NamespaceContext::new();
        let mut element = Element::new("u:Play");
        element
            .attributes
            .insert("xmlns:u".to_string(), "urn:av".to_string());

        let child = ns.enter(&element);
        assert_eq!(
            child.element_name(&element).unwrap(),
            QName::new("urn:av", "Play")
        );
        // le contexte parent n'est pas modifié
        assert_eq!(ns.uri_for("u"), None);
    }

    #[test]
    fn test_declare_allocates_prefix() {
        let mut ns = NamespaceContext::soap_default();
        let (raw, declaration) = ns.declare(&QName::new("urn:custom", "Auth"));
        assert_eq!(raw, "ns1:Auth");
        assert_eq!(
            declaration,
            Some(("xmlns:ns1".to_string(), "urn:custom".to_string()))
        );

        let (raw, declaration) = ns.declare(&QName::new("urn:custom", "Token"));
        assert_eq!(raw, "ns1:Token");
        assert!(declaration.is_none());
    }

    #[test]
    fn test_attribute_names_ignore_default_namespace() {
        let mut ns = NamespaceContext::soap_default();
        ns.bind("", ENVELOPE_NAMESPACE);
        let qname = QName::envelope("mustUnderstand");

        assert!(ns.attribute_matches(&qname, "SOAP-ENV:mustUnderstand"));
        assert!(!ns.attribute_matches(&qname, "mustUnderstand"));
        assert!(!ns.attribute_matches(&qname, "xsi:mustUnderstand"));
        assert!(!ns.attribute_matches(&qname, "t:mustUnderstand"));
        assert_eq!(
            ns.parse_attribute_name("mustUnderstand").unwrap(),
            QName::local("mustUnderstand")
        );
    }

    #[test]
    fn test_enter_undeclares_default_namespace() {
        let mut ns = NamespaceContext::new();
        ns.bind("", ENVELOPE_NAMESPACE);

        let mut element = Element::new("Fault");
        element.attributes.insert("xmlns".to_string(), String::new());

        let child = ns.enter(&element);
        assert_eq!(child.element_name(&element).unwrap(), QName::local("Fault"));
        assert_eq!(
            ns.element_name(&element).unwrap(),
            QName::envelope("Fault")
        );
    }

    #[test]
    fn test_attribute_lookup_by_qname() {
        let ns = NamespaceContext::soap_default();
        let mut element = Element::new("Speed");
        element
            .attributes
            .insert("type".to_string(), "xsd:string".to_string());
        element
            .attributes
            .insert("xsi:type".to_string(), "xsd:int".to_string());

        assert_eq!(
            ns.attribute(&element, &QName::new(XSI_NAMESPACE, "type")),
            Some("xsd:int")
        );
    }

    #[test]
    fn test_detach_redeclares_inherited_prefixes() {
        let mut ns = NamespaceContext::new();
        ns.bind("a", "urn:auth");
        ns.bind("s", ENVELOPE_NAMESPACE);

        let mut user = Element::new("a:User");
        user.attributes.insert("s:role".to_string(), "admin".to_string());
        user.children.push(XMLNode::Element(Element::new("Name")));

        let XMLNode::Element(detached) = ns.detach(&XMLNode::Element(user)) else {
            panic!("element expected");
        };
        assert_eq!(
            detached.attributes.get("xmlns:a").map(String::as_str),
            Some("urn:auth")
        );
        assert_eq!(
            detached.attributes.get("xmlns:s").map(String::as_str),
            Some(ENVELOPE_NAMESPACE)
        );
        assert_eq!(detached.attributes.get("xmlns").map(String::as_str), Some(""));

        // un noeud déjà autonome est inchangé
        let again = ns.detach(&XMLNode::Element(detached.clone()));
        assert_eq!(again, XMLNode::Element(detached));
    }

    #[test]
    fn test_qname_display() {
        assert_eq!(
            QName::envelope("Fault").to_string(),
            "{http://schemas.xmlsoap.org/soap/envelope/}Fault"
        );
        assert_eq!(QName::local("faultcode").to_string(), "faultcode");
    }
}
