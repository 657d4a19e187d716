//! Construction d'enveloppes SOAP

use tracing::debug;

use crate::config::SoapConfig;
use crate::envelope::SoapEnvelope;
use crate::errors::Result;
use crate::fault::SoapFault;

/// Sérialise une enveloppe SOAP avec la configuration par défaut
pub fn build_soap_envelope(envelope: &SoapEnvelope) -> Result<String> {
    build_soap_envelope_with_config(envelope, &SoapConfig::default())
}

/// Sérialise une enveloppe SOAP
///
/// Les liaisons de `config.namespaces` sont déclarées sur l'`Envelope` ;
/// les autres namespaces rencontrés reçoivent un préfixe `nsN` local à
/// l'élément qui les utilise.
pub fn build_soap_envelope_with_config(
    envelope: &SoapEnvelope,
    config: &SoapConfig,
) -> Result<String> {
    let element = envelope.encode(&config.namespace_context());

    let mut buf = Vec::new();
    element.write_with_config(&mut buf, config.emitter_config())?;

    debug!(bytes = buf.len(), "Built SOAP envelope");
    Ok(String::from_utf8(buf)?)
}

/// Construit une enveloppe SOAP dont le corps est le fault
pub fn build_soap_fault(fault: &SoapFault) -> Result<String> {
    build_soap_envelope(&SoapEnvelope::new(fault.clone().into()))
}
