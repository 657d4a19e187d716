//! Configuration du codec SOAP
//!
//! La configuration est lue depuis un fichier YAML (ou la configuration
//! intégrée), puis surchargée par les variables d'environnement préfixées
//! par `PMOSOAP_CONFIG__`.
//!
//! ```no_run
//! use pmosoap::SoapConfig;
//!
//! let config = SoapConfig::load(None)?;
//! let ctx = config.decode_context();
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use xmltree::EmitterConfig;

use crate::context::{DEFAULT_MAX_DEPTH, DecodeContext};
use crate::namespace::NamespaceContext;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmosoap.yaml");

const ENV_PREFIX: &str = "PMOSOAP_CONFIG__";

const DEFAULT_INDENT: &str = "  ";

/// Liaison préfixe -> namespace déclarée sur l'Envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoapConfig {
    /// Profondeur d'imbrication maximale acceptée au décodage
    pub max_depth: usize,

    /// Émettre `<?xml version="1.0"?>` en tête de document
    pub write_document_declaration: bool,

    pub perform_indent: bool,

    pub indent_string: String,

    /// Liaisons déclarées à l'encodage et connues au décodage
    pub namespaces: Vec<NamespaceBinding>,
}

impl Default for SoapConfig {
    fn default() -> Self {
        let namespaces = NamespaceContext::soap_default()
            .bindings()
            .map(|(uri, prefix)| NamespaceBinding {
                prefix: prefix.to_string(),
                uri: uri.to_string(),
            })
            .collect();

        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            write_document_declaration: true,
            perform_indent: false,
            indent_string: DEFAULT_INDENT.to_string(),
            namespaces,
        }
    }
}

impl SoapConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid SOAP codec configuration")
    }

    /// Charge la configuration depuis `path`, ou la configuration intégrée,
    /// puis applique les surcharges d'environnement.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading SOAP codec configuration");
                let yaml = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_yaml(&yaml)?
            }
            None => Self::from_yaml(DEFAULT_CONFIG)?,
        };

        config.apply_overrides(env::vars())?;
        Ok(config)
    }

    fn apply_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            info!(env_var = %key, value = %value, "SOAP codec configuration override");

            match field {
                "MAX_DEPTH" => {
                    self.max_depth = value
                        .parse()
                        .with_context(|| format!("Invalid value for {}: {}", key, value))?
                }
                "PERFORM_INDENT" => {
                    self.perform_indent = value
                        .parse()
                        .with_context(|| format!("Invalid value for {}: {}", key, value))?
                }
                "WRITE_DOCUMENT_DECLARATION" => {
                    self.write_document_declaration = value
                        .parse()
                        .with_context(|| format!("Invalid value for {}: {}", key, value))?
                }
                "INDENT_STRING" => self.indent_string = value,
                _ => warn!(env_var = %key, "Unknown SOAP codec configuration override"),
            }
        }
        Ok(())
    }

    pub fn namespace_context(&self) -> NamespaceContext {
        let mut ns = NamespaceContext::new();
        for binding in &self.namespaces {
            ns.bind(binding.prefix.as_str(), binding.uri.as_str());
        }
        ns
    }

    pub fn decode_context(&self) -> DecodeContext {
        DecodeContext::new(self.namespace_context(), self.max_depth)
    }

    pub(crate) fn emitter_config(&self) -> EmitterConfig {
        EmitterConfig::new()
            .write_document_declaration(self.write_document_declaration)
            .perform_indent(self.perform_indent)
            .indent_string(self.indent_string.clone())
    }
}
