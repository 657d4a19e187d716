//! # pmosoap - Codec d'enveloppes SOAP 1.1
//!
//! Cette crate convertit les enveloppes SOAP 1.1 entre arbres XML
//! ([`xmltree::Element`]) et structures Rust typées, dans les deux sens.
//!
//! ## Fonctionnalités
//!
//! - ✅ Encodage / décodage de l'Envelope, du Header et du Body
//! - ✅ Header items avec `mustUnderstand` et `encodingStyle`
//! - ✅ SOAP Faults (code, message, acteur, détail, éléments supplémentaires)
//! - ✅ Résolution des namespaces par contexte de préfixes, pour les éléments
//!   comme pour les attributs
//! - ✅ Parsing `quick-xml` en arbre brut (noms tels qu'écrits)
//! - ✅ Profondeur d'imbrication bornée au décodage
//! - ✅ Configuration YAML surchargeable par l'environnement
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : Enveloppe SOAP complète
//! - [`SoapHeader`] / [`SoapHeaderItem`] : En-tête et ses entrées
//! - [`SoapBody`] : Corps (payload ou fault)
//! - [`SoapFault`] : Erreur SOAP
//! - [`NamespaceContext`] / [`DecodeContext`] : Liaisons préfixe -> namespace
//! - [`SoapConfig`] : Configuration du codec
//!
//! ## Example
//!
//! ```
//! use pmosoap::{build_soap_fault, parse_soap_envelope};
//!
//! let xml = r#"<?xml version="1.0"?>
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <u:Play xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
//!       <InstanceID>0</InstanceID>
//!     </u:Play>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let envelope = parse_soap_envelope(xml.as_bytes()).unwrap();
//! let action = envelope.body.payload().unwrap();
//! assert_eq!(action.name.name, "Play");
//!
//! // Construire un fault
//! let fault = pmosoap::SoapFault::new(401, "Invalid Action", "AVTransport");
//! let response = build_soap_fault(&fault).unwrap();
//! assert!(response.contains("<faultcode>401</faultcode>"));
//! ```

mod body;
mod builder;
mod config;
mod context;
mod envelope;
mod errors;
mod fault;
mod header;
mod namespace;
mod parser;
mod tree;
mod value;

pub use body::SoapBody;
pub use builder::{build_soap_envelope, build_soap_envelope_with_config, build_soap_fault};
pub use config::{NamespaceBinding, SoapConfig};
pub use context::{DEFAULT_MAX_DEPTH, DecodeContext};
pub use envelope::SoapEnvelope;
pub use errors::{Result, SoapError};
pub use fault::SoapFault;
pub use header::{SoapHeader, SoapHeaderItem};
pub use namespace::{
    ENCODING_NAMESPACE, ENVELOPE_NAMESPACE, NamespaceContext, QName, XSD_NAMESPACE,
    XSI_NAMESPACE,
};
pub use parser::{parse_document, parse_soap_envelope, parse_soap_envelope_with_config};
pub use value::{SoapElement, SoapInteger, SoapString, SoapValue};
