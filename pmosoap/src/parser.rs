//! Parsing d'enveloppes SOAP depuis leur forme textuelle
//!
//! L'arbre est construit depuis les événements `quick-xml` en conservant les
//! noms tels qu'écrits (`s:Envelope`, `s:mustUnderstand`) et les déclarations
//! `xmlns`/`xmlns:p` comme attributs : la résolution des namespaces est
//! entièrement faite par [`NamespaceContext`](crate::NamespaceContext), pour
//! les éléments comme pour les attributs.

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use tracing::{debug, warn};
use xmltree::{Element, XMLNode};

use crate::config::SoapConfig;
use crate::envelope::SoapEnvelope;
use crate::errors::{Result, SoapError};

/// Parse une enveloppe SOAP avec la configuration par défaut
///
/// # Arguments
///
/// * `xml` - Document XML complet (prologue compris)
///
/// # Returns
///
/// L'enveloppe décodée, ou l'erreur de parsing / de structure rencontrée
pub fn parse_soap_envelope(xml: &[u8]) -> Result<SoapEnvelope> {
    parse_soap_envelope_with_config(xml, &SoapConfig::default())
}

/// Parse une enveloppe SOAP
///
/// Les liaisons de `config.namespaces` sont connues avant la première
/// déclaration du document, et l'imbrication est bornée par
/// `config.max_depth`.
pub fn parse_soap_envelope_with_config(xml: &[u8], config: &SoapConfig) -> Result<SoapEnvelope> {
    let nodes = parse_document(xml, config.max_depth)?;
    let envelope = SoapEnvelope::decode(&config.decode_context(), &nodes)?;

    debug!(
        bytes = xml.len(),
        fault = envelope.body.is_fault(),
        "Parsed SOAP envelope"
    );
    Ok(envelope)
}

/// Noeuds de premier niveau d'un document, noms non résolus.
///
/// Un document plus profond que `max_depth` est rejeté pendant la lecture,
/// avant toute récursion.
pub fn parse_document(xml: &[u8], max_depth: usize) -> Result<Vec<XMLNode>> {
    let mut reader = Reader::from_reader(xml);
    let decoder = reader.decoder();

    let mut buf = Vec::new();
    let mut document = Vec::new();
    let mut open: Vec<Element> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let element = start_element(decoder, &e, open.len(), max_depth)?;
                open.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(decoder, &e, open.len(), max_depth)?;
                append(&mut open, &mut document, XMLNode::Element(element));
            }
            Event::End(_) => {
                let element = open.pop().ok_or_else(|| {
                    SoapError::MalformedDocument("unexpected closing tag".to_string())
                })?;
                append(&mut open, &mut document, XMLNode::Element(element));
            }
            Event::Text(e) => {
                let text = e.decode().map_err(quick_xml::Error::Encoding)?;
                append_text(&mut open, &mut document, &text);
            }
            Event::GeneralRef(e) => {
                let text = resolve_reference(&e)?;
                append_text(&mut open, &mut document, &text);
            }
            Event::CData(e) => {
                let text = e.decode().map_err(quick_xml::Error::Encoding)?;
                append(&mut open, &mut document, XMLNode::CData(text.into_owned()));
            }
            Event::Comment(e) => {
                let text = e.decode().map_err(quick_xml::Error::Encoding)?;
                append(&mut open, &mut document, XMLNode::Comment(text.into_owned()));
            }
            Event::PI(e) => {
                let target = decoder
                    .decode(e.target())
                    .map_err(quick_xml::Error::Encoding)?
                    .into_owned();
                let content = decoder
                    .decode(e.content())
                    .map_err(quick_xml::Error::Encoding)?
                    .trim()
                    .to_string();
                let content = (!content.is_empty()).then_some(content);
                append(
                    &mut open,
                    &mut document,
                    XMLNode::ProcessingInstruction(target, content),
                );
            }
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    if let Some(element) = open.last() {
        return Err(SoapError::MalformedDocument(format!(
            "unclosed element {}",
            element.name
        )));
    }
    Ok(document)
}

fn start_element(
    decoder: Decoder,
    start: &BytesStart<'_>,
    depth: usize,
    max_depth: usize,
) -> Result<Element> {
    let qname = start.name();
    let name = decoder
        .decode(qname.as_ref())
        .map_err(quick_xml::Error::Encoding)?;

    if depth + 1 > max_depth {
        warn!(element = %name, max_depth, "SOAP document nesting exceeds the limit");
        return Err(SoapError::TooDeep(max_depth));
    }

    let mut element = Element::new(&name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = decoder
            .decode(attribute.key.as_ref())
            .map_err(quick_xml::Error::Encoding)?
            .into_owned();
        let value = attribute.decode_and_unescape_value(decoder)?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }

    let name = reference.decode().map_err(quick_xml::Error::Encoding)?;
    resolve_xml_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| SoapError::MalformedDocument(format!("unknown entity &{};", name)))
}

fn append(open: &mut [Element], document: &mut Vec<XMLNode>, node: XMLNode) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.push(node),
    }
}

/// Ajoute du texte, fusionné avec le noeud texte précédent : les références
/// d'entités arrivent en événements séparés.
fn append_text(open: &mut [Element], document: &mut Vec<XMLNode>, text: &str) {
    let nodes = match open.last_mut() {
        Some(parent) => &mut parent.children,
        None => document,
    };
    match nodes.last_mut() {
        Some(XMLNode::Text(previous)) => previous.push_str(text),
        _ => nodes.push(XMLNode::Text(text.to_string())),
    }
}

/// Premier élément d'un fragment XML, pour les tests des codecs
#[cfg(test)]
pub(crate) fn parse_element(xml: &str) -> Element {
    parse_document(xml.as_bytes(), crate::context::DEFAULT_MAX_DEPTH)
        .unwrap()
        .into_iter()
        .find_map(|node| match node {
            XMLNode::Element(element) => Some(element),
            _ => None,
        })
        .unwrap()
}
