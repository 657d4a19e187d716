use pmosoap::{
    ENVELOPE_NAMESPACE, NamespaceBinding, QName, SoapBody, SoapConfig, SoapElement,
    SoapEnvelope, SoapError, SoapFault, SoapHeader, SoapHeaderItem, SoapValue,
    build_soap_envelope, build_soap_envelope_with_config, build_soap_fault, parse_soap_envelope,
    parse_soap_envelope_with_config,
};
use xmltree::XMLNode;

const AV_TRANSPORT: &str = "urn:schemas-upnp-org:service:AVTransport:1";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("pmosoap=trace")
        .try_init();
}

/// Configuration où le namespace par défaut est celui de l'enveloppe
fn unprefixed_config() -> SoapConfig {
    SoapConfig {
        namespaces: vec![NamespaceBinding {
            prefix: String::new(),
            uri: ENVELOPE_NAMESPACE.to_string(),
        }],
        ..SoapConfig::default()
    }
}

fn sample_envelope() -> SoapEnvelope {
    let mut transaction = SoapHeaderItem::new(
        "urn:example:tx",
        "Transaction",
        vec![XMLNode::Text("5".to_string())],
    );
    transaction.must_understand = true;

    let mut locale = SoapHeaderItem::new("urn:example:i18n", "Locale", Vec::new());
    locale.encoding_style = Some("urn:example:style".to_string());

    let header: SoapHeader = [transaction, locale].into_iter().collect();

    let payload = SoapElement::structure(
        QName::new(AV_TRANSPORT, "Seek"),
        vec![
            SoapElement::new(QName::local("InstanceID"), SoapValue::Integer(0)),
            SoapElement::new(QName::local("Unit"), SoapValue::String("REL_TIME".to_string())),
            SoapElement::structure(
                QName::local("Target"),
                vec![SoapElement::new(
                    QName::local("Position"),
                    SoapValue::String("00:01:30".to_string()),
                )],
            ),
        ],
    );

    SoapEnvelope::with_header(header, payload.into())
}

#[test]
fn envelope_round_trips_through_text() -> anyhow::Result<()> {
    init_logging();
    let envelope = sample_envelope();

    let xml = build_soap_envelope(&envelope)?;
    let decoded = parse_soap_envelope(xml.as_bytes())?;

    assert_eq!(decoded, envelope);
    let header = decoded.header.as_ref().expect("header");
    assert_eq!(header.len(), 2);
    assert_eq!(header.items()[0].name(), "Transaction");
    assert!(header.items()[0].must_understand);
    assert_eq!(header.items()[0].text(), "5");
    assert_eq!(
        header.items()[1].encoding_style.as_deref(),
        Some("urn:example:style")
    );
    Ok(())
}

#[test]
fn indented_envelope_round_trips() -> anyhow::Result<()> {
    let config = SoapConfig {
        perform_indent: true,
        ..SoapConfig::default()
    };
    let envelope = sample_envelope();

    let xml = build_soap_envelope_with_config(&envelope, &config)?;
    assert!(xml.contains('\n'));

    let decoded = parse_soap_envelope_with_config(xml.as_bytes(), &config)?;
    assert_eq!(decoded, envelope);
    Ok(())
}

#[test]
fn fault_round_trips_through_text() -> anyhow::Result<()> {
    let fault = SoapFault::new(501, "Action Failed", "AVTransport")
        .with_detail(SoapValue::Struct(vec![SoapElement::new(
            QName::local("errorCode"),
            SoapValue::Integer(714),
        )]))
        .with_extra_item(SoapElement::new(
            QName::new("urn:example:trace", "requestId"),
            SoapValue::String("42".to_string()),
        ));

    let xml = build_soap_fault(&fault)?;
    let decoded = parse_soap_envelope(xml.as_bytes())?;

    assert!(decoded.body.is_fault());
    assert_eq!(decoded.body.fault(), Some(&fault));
    Ok(())
}

#[test]
fn empty_header_is_omitted() -> anyhow::Result<()> {
    let envelope = SoapEnvelope::with_header(SoapHeader::new(), SoapBody::Empty);

    let xml = build_soap_envelope(&envelope)?;
    assert!(!xml.contains("Header"));

    let decoded = parse_soap_envelope(xml.as_bytes())?;
    assert!(decoded.header.is_none());
    Ok(())
}

#[test]
fn unnamed_header_item_is_dropped() -> anyhow::Result<()> {
    let header: SoapHeader = [
        SoapHeaderItem::new("urn:example:tx", "", Vec::new()),
        SoapHeaderItem::new("urn:example:tx", "Transaction", Vec::new()),
    ]
    .into_iter()
    .collect();
    let envelope = SoapEnvelope::with_header(header, SoapBody::Empty);

    let xml = build_soap_envelope(&envelope)?;
    let decoded = parse_soap_envelope(xml.as_bytes())?;

    let header = decoded.header.expect("header");
    assert_eq!(header.len(), 1);
    assert_eq!(header.items()[0].name(), "Transaction");
    Ok(())
}

#[test]
fn duplicate_faultcode_is_rejected() {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>1</faultcode>
      <faultcode>2</faultcode>
    </s:Fault>
  </s:Body>
</s:Envelope>"#;

    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        SoapError::DuplicateField {
            field: "faultcode",
            ..
        }
    ));
    assert_eq!(err.to_string(), "Duplicated faultcode in Fault");
}

#[test]
fn duplicate_body_is_rejected() {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body/>
  <s:Body/>
</s:Envelope>"#;

    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        SoapError::DuplicateField {
            field: "Body",
            parent: "Envelope"
        }
    ));
}

#[test]
fn foreign_root_is_rejected() {
    let xml = r#"<Envelope xmlns="urn:example:not-soap"><Body/></Envelope>"#;
    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::EnvelopeNotFound(_)));

    let xml = r#"<s:Message xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"/>"#;
    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::EnvelopeNotFound(_)));
}

#[test]
fn unprefixed_fault_with_default_namespace() -> anyhow::Result<()> {
    init_logging();
    let xml = "<Envelope><Body><Fault><faultcode>1</faultcode>\
               <faultstring>bad</faultstring><faultactor>svc</faultactor>\
               </Fault></Body></Envelope>";

    let envelope = parse_soap_envelope_with_config(xml.as_bytes(), &unprefixed_config())?;

    assert!(envelope.body.is_fault());
    let fault = envelope.body.fault().expect("fault");
    assert_eq!(fault.code(), Some(1));
    assert_eq!(fault.string(), Some("bad"));
    assert_eq!(fault.actor(), Some("svc"));
    assert!(fault.detail.is_none());
    assert!(fault.extra_items.is_empty());
    Ok(())
}

#[test]
fn unprefixed_envelope_needs_a_binding() {
    let xml = "<Envelope><Body/></Envelope>";
    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::EnvelopeNotFound(_)));
}

#[test]
fn header_item_with_foreign_attribute_is_rejected() {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <t:Transaction xmlns:t="urn:example:tx" priority="high">5</t:Transaction>
  </s:Header>
  <s:Body/>
</s:Envelope>"#;

    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::UnknownAttribute(name) if name == "priority"));
}

#[test]
fn trailing_document_content_is_rejected() {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#;

    assert!(parse_soap_envelope(xml.as_bytes()).is_err());
}

#[test]
fn unprefixed_envelope_round_trips_local_members() -> anyhow::Result<()> {
    init_logging();
    let config = unprefixed_config();
    let envelope = sample_envelope();

    let xml = build_soap_envelope_with_config(&envelope, &config)?;
    assert!(xml.contains("<Envelope"));

    let decoded = parse_soap_envelope_with_config(xml.as_bytes(), &config)?;
    assert_eq!(decoded, envelope);

    let payload = decoded.body.payload().expect("payload");
    assert_eq!(payload.value.members()[1].name, QName::local("Unit"));
    Ok(())
}

#[test]
fn undeclared_default_namespace_hides_fault() -> anyhow::Result<()> {
    let xml = r#"<Envelope><Body><Fault xmlns=""><faultcode>1</faultcode></Fault></Body></Envelope>"#;

    let envelope = parse_soap_envelope_with_config(xml.as_bytes(), &unprefixed_config())?;

    assert!(!envelope.body.is_fault());
    let payload = envelope.body.payload().expect("payload");
    assert_eq!(payload.name, QName::local("Fault"));
    assert_eq!(
        payload.member("faultcode"),
        Some(&SoapValue::String("1".to_string()))
    );
    Ok(())
}

#[test]
fn scalar_payload_round_trips() -> anyhow::Result<()> {
    for value in [
        SoapValue::String("hello".to_string()),
        SoapValue::String(String::new()),
        SoapValue::Integer(-3),
        SoapValue::Struct(Vec::new()),
    ] {
        let envelope = SoapEnvelope::new(
            SoapElement::new(QName::new("urn:example:echo", "Echo"), value).into(),
        );

        let xml = build_soap_envelope(&envelope)?;
        assert_eq!(parse_soap_envelope(xml.as_bytes())?, envelope);
    }
    Ok(())
}

#[test]
fn empty_members_round_trip() -> anyhow::Result<()> {
    let payload = SoapElement::structure(
        QName::new(AV_TRANSPORT, "Seek"),
        vec![
            SoapElement::structure(QName::local("Target"), Vec::new()),
            SoapElement::new(QName::local("Unit"), SoapValue::String(String::new())),
            SoapElement::structure(
                QName::local("Range"),
                vec![SoapElement::structure(QName::local("Start"), Vec::new())],
            ),
        ],
    );
    let envelope = SoapEnvelope::new(payload.into());

    let xml = build_soap_envelope(&envelope)?;
    assert_eq!(parse_soap_envelope(xml.as_bytes())?, envelope);
    Ok(())
}

#[test]
fn unqualified_type_attribute_is_not_a_type() -> anyhow::Result<()> {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <u:SetVolume xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
      <DesiredVolume type="int">5</DesiredVolume>
    </u:SetVolume>
  </s:Body>
</s:Envelope>"#;

    let envelope = parse_soap_envelope(xml.as_bytes())?;
    let payload = envelope.body.payload().expect("payload");
    assert_eq!(
        payload.member("DesiredVolume"),
        Some(&SoapValue::String("5".to_string()))
    );
    Ok(())
}

#[test]
fn header_attributes_need_the_envelope_namespace() {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <t:Transaction xmlns:t="urn:example:tx" t:mustUnderstand="1">5</t:Transaction>
  </s:Header>
  <s:Body/>
</s:Envelope>"#;
    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::UnknownAttribute(name) if name == "t:mustUnderstand"));

    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <t:Transaction xmlns:t="urn:example:tx" s:mustUnderstand="1" mustUnderstand="0">5</t:Transaction>
  </s:Header>
  <s:Body/>
</s:Envelope>"#;
    let err = parse_soap_envelope(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, SoapError::UnknownAttribute(name) if name == "mustUnderstand"));
}

#[test]
fn decoded_header_content_survives_reencoding() -> anyhow::Result<()> {
    let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:a="urn:auth">
  <s:Header>
    <a:Auth><a:User>bob</a:User></a:Auth>
  </s:Header>
  <s:Body/>
</s:Envelope>"#;

    let decoded = parse_soap_envelope(xml.as_bytes())?;
    let again = parse_soap_envelope(build_soap_envelope(&decoded)?.as_bytes())?;
    assert_eq!(again, decoded);

    let item = &again.header.as_ref().expect("header").items()[0];
    let user = item.content[0].as_element().expect("element");
    assert_eq!(user.name, "a:User");
    Ok(())
}
