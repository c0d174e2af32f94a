//! SOAP envelopes for the partner API and decoding of its responses.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domains::catalog::{FieldDescriptor, FieldType, ObjectDescriptor, ObjectSummary};
use crate::errors::{SessionError, SessionResult};
use crate::types::{Record, Value};

const ENVELOPE_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="utf-8"?>"#,
    r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
    r#"xmlns:urn="urn:partner.soap.sforce.com">"#
);

/// Element metadata that query rows carry alongside the selected fields
const SOBJECT_TYPE_ELEMENT: &str = "type";

fn xml_error(e: impl std::fmt::Display) -> SessionError {
    SessionError::Xml(e.to_string())
}

/// Wrap an operation body, with a session header when authenticated.
pub fn envelope(session_id: Option<&str>, body: &str) -> String {
    let header = match session_id {
        Some(id) => format!(
            "<soapenv:Header><urn:SessionHeader><urn:sessionId>{}</urn:sessionId></urn:SessionHeader></soapenv:Header>",
            escape(id)
        ),
        None => String::new(),
    };
    format!("{ENVELOPE_OPEN}{header}<soapenv:Body>{body}</soapenv:Body></soapenv:Envelope>")
}

pub fn login_body(username: &str, password: &str) -> String {
    format!(
        "<urn:login><urn:username>{}</urn:username><urn:password>{}</urn:password></urn:login>",
        escape(username),
        escape(password)
    )
}

pub fn describe_global_body() -> String {
    "<urn:describeGlobal/>".to_string()
}

pub fn describe_sobjects_body(names: &[String]) -> String {
    let types: String = names
        .iter()
        .map(|n| format!("<urn:sObjectType>{}</urn:sObjectType>", escape(n.as_str())))
        .collect();
    format!("<urn:describeSObjects>{types}</urn:describeSObjects>")
}

pub fn query_body(soql: &str) -> String {
    format!("<urn:query><urn:queryString>{}</urn:queryString></urn:query>", escape(soql))
}

pub fn query_more_body(locator: &str) -> String {
    format!(
        "<urn:queryMore><urn:queryLocator>{}</urn:queryLocator></urn:queryMore>",
        escape(locator)
    )
}

/// Element of a parsed response. Names are stored without namespace prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub nil: bool,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> SessionResult<Self> {
        let mut node = XmlNode {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            if attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true" {
                node.nil = true;
            }
        }
        Ok(node)
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> SessionResult<XmlNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| SessionError::Xml("unbalanced closing tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SessionError::Xml("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| SessionError::Xml("empty document".to_string()))
    }

    fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => *root = Some(node),
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).filter(|c| !c.nil).map(|c| c.text.as_str())
    }

    pub fn child_bool(&self, name: &str) -> bool {
        self.child_text(name) == Some("true")
    }

    fn required_text(&self, name: &str) -> SessionResult<&str> {
        self.child_text(name)
            .ok_or_else(|| SessionError::protocol(format!("<{}> without <{}>", self.name, name)))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Extract the operation response from an envelope, turning a SOAP fault
/// into an error.
pub fn response_body(document: XmlNode) -> SessionResult<XmlNode> {
    let body = document
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| SessionError::protocol("response without SOAP body"))?;

    if let Some(fault) = body.child("Fault") {
        return Err(SessionError::Fault {
            code: fault.child_text("faultcode").unwrap_or("unknown").to_string(),
            message: fault.child_text("faultstring").unwrap_or_default().to_string(),
        });
    }

    body.children
        .into_iter()
        .next()
        .ok_or_else(|| SessionError::protocol("empty SOAP body"))
}

fn result_of(response: &XmlNode) -> SessionResult<&XmlNode> {
    response
        .child("result")
        .ok_or_else(|| SessionError::protocol(format!("<{}> without <result>", response.name)))
}

/// Server URL and session id from a login response
pub fn decode_login(response: &XmlNode) -> SessionResult<(String, String)> {
    let result = result_of(response)?;
    Ok((
        result.required_text("serverUrl")?.to_string(),
        result.required_text("sessionId")?.to_string(),
    ))
}

pub fn decode_global(response: &XmlNode) -> SessionResult<Vec<ObjectSummary>> {
    result_of(response)?
        .children_named("sobjects")
        .map(|node| {
            Ok(ObjectSummary {
                name: node.required_text("name")?.to_string(),
                queryable: node.child_bool("queryable"),
                createable: node.child_bool("createable"),
            })
        })
        .collect()
}

fn decode_field(node: &XmlNode) -> SessionResult<FieldDescriptor> {
    Ok(FieldDescriptor {
        name: node.required_text("name")?.to_string(),
        field_type: FieldType::from_api_name(node.child_text("type").unwrap_or_default()),
        reference_to: node
            .children_named("referenceTo")
            .filter(|c| !c.nil && !c.text.is_empty())
            .map(|c| c.text.clone())
            .collect(),
        relationship_name: node
            .child_text("relationshipName")
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        id_lookup: node.child_bool("idLookup"),
        name_pointing: node.child_bool("nameField") || node.child_bool("namePointing"),
    })
}

pub fn decode_sobjects(response: &XmlNode) -> SessionResult<Vec<ObjectDescriptor>> {
    response
        .children_named("result")
        .map(|node| {
            Ok(ObjectDescriptor {
                name: node.required_text("name")?.to_string(),
                fields: node
                    .children_named("fields")
                    .map(decode_field)
                    .collect::<SessionResult<_>>()?,
                queryable: node.child_bool("queryable"),
                createable: node.child_bool("createable"),
            })
        })
        .collect()
}

/// One page of query rows and the locator of the next page, if any
#[derive(Debug, Default)]
pub struct QueryPage {
    pub records: std::collections::VecDeque<Record>,
    pub locator: Option<String>,
}

pub fn decode_query(response: &XmlNode) -> SessionResult<QueryPage> {
    let result = result_of(response)?;
    let done = result.child_text("done").map(|d| d == "true").unwrap_or(true);

    Ok(QueryPage {
        records: result
            .children_named("records")
            .map(|node| {
                let mut record = Record::new();
                flatten_row(node, "", &mut record);
                record
            })
            .collect(),
        locator: if done {
            None
        } else {
            Some(result.required_text("queryLocator")?.to_string())
        },
    })
}

/// Fields of nested relationship rows become `Relationship.Field` keys.
fn flatten_row(node: &XmlNode, prefix: &str, record: &mut Record) {
    for child in &node.children {
        if child.name == SOBJECT_TYPE_ELEMENT {
            continue;
        }
        let key = format!("{prefix}{}", child.name);
        if child.nil {
            record.insert_if_absent(&key, Value::Null);
        } else if child.is_leaf() {
            record.insert_if_absent(&key, Value::String(child.text.clone()));
        } else {
            flatten_row(child, &format!("{key}."), record);
        }
    }
}
