//! Per-call peer attributes.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::expr::Value;

/// Well-known peer attribute names.
///
/// These are the only names an [`Expr::Attribute`](crate::Expr::Attribute)
/// or [`Expr::Present`](crate::Expr::Present) node may reference.
pub mod attributes {
    /// Remote IP address, as a string.
    pub const SOURCE_ADDRESS: &str = "source.address";
    /// Remote port.
    pub const SOURCE_PORT: &str = "source.port";
    /// Authenticated identity of the caller (e.g. a SPIFFE ID).
    pub const SOURCE_PRINCIPAL: &str = "source.principal";
    /// Local IP address the connection was accepted on.
    pub const DESTINATION_ADDRESS: &str = "destination.address";
    /// Local port the connection was accepted on.
    pub const DESTINATION_PORT: &str = "destination.port";
    /// Transport security kind (`tls`, `insecure`, ...).
    pub const AUTH_TYPE: &str = "connection.auth_type";
    /// Whether the peer presented a client certificate.
    pub const MTLS: &str = "connection.mtls";
    /// URI SANs of the peer certificate.
    pub const URI_SANS: &str = "connection.uri_sans";
    /// DNS SANs of the peer certificate.
    pub const DNS_SANS: &str = "connection.dns_sans";
    /// Subject of the peer certificate.
    pub const PEER_CERT_SUBJECT: &str = "connection.subject_peer_certificate";
    /// SNI requested by the client.
    pub const REQUESTED_SERVER_NAME: &str = "connection.requested_server_name";
    /// Full RPC method, `/package.Service/Method`.
    pub const REQUEST_PATH: &str = "request.path";
    /// `:authority` of the request.
    pub const REQUEST_HOST: &str = "request.host";
    /// Request metadata, lower-cased keys.
    pub const REQUEST_HEADERS: &str = "request.headers";
    /// Free-form attributes supplied by the server integration.
    pub const METADATA: &str = "metadata";

    /// Every attribute name a condition may reference.
    pub const ALL: &[&str] = &[
        SOURCE_ADDRESS,
        SOURCE_PORT,
        SOURCE_PRINCIPAL,
        DESTINATION_ADDRESS,
        DESTINATION_PORT,
        AUTH_TYPE,
        MTLS,
        URI_SANS,
        DNS_SANS,
        PEER_CERT_SUBJECT,
        REQUESTED_SERVER_NAME,
        REQUEST_PATH,
        REQUEST_HOST,
        REQUEST_HEADERS,
        METADATA,
    ];

    /// Whether `name` is a well-known attribute.
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// Read-only snapshot of what is known about the current RPC.
///
/// Built by the server integration once per call and handed to the
/// authorizer by reference. Attributes the integration did not supply are
/// absent, and conditions that depend on them do not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerContext {
    attributes: BTreeMap<String, Value>,
}

impl PeerContext {
    #[must_use]
    pub fn builder() -> PeerContextBuilder {
        PeerContextBuilder::default()
    }

    /// Look up a well-known attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Convenience accessor for `source.principal`.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.attribute(attributes::SOURCE_PRINCIPAL)
            .and_then(Value::as_str)
    }

    /// Convenience accessor for `request.path`.
    #[must_use]
    pub fn request_path(&self) -> Option<&str> {
        self.attribute(attributes::REQUEST_PATH)
            .and_then(Value::as_str)
    }

    /// Iterate all supplied attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Builder for [`PeerContext`].
///
/// Header keys are lower-cased; repeated headers are joined with `,`.
#[derive(Debug, Default)]
pub struct PeerContextBuilder {
    attributes: BTreeMap<String, Value>,
    headers: BTreeMap<String, String>,
    metadata: BTreeMap<String, Value>,
}

impl PeerContextBuilder {
    /// Remote socket address (`source.address`, `source.port`).
    ///
    /// IPv4-mapped IPv6 addresses are stored in their IPv4 form.
    #[must_use]
    pub fn source(mut self, addr: SocketAddr) -> Self {
        self.set(attributes::SOURCE_ADDRESS, addr.ip().to_canonical().to_string());
        self.set(attributes::SOURCE_PORT, addr.port());
        self
    }

    /// Local socket address (`destination.address`, `destination.port`).
    #[must_use]
    pub fn destination(mut self, addr: SocketAddr) -> Self {
        self.set(attributes::DESTINATION_ADDRESS, addr.ip().to_canonical().to_string());
        self.set(attributes::DESTINATION_PORT, addr.port());
        self
    }

    #[must_use]
    pub fn principal(mut self, principal: impl Into<String>) -> Self {
        self.set(attributes::SOURCE_PRINCIPAL, principal.into());
        self
    }

    #[must_use]
    pub fn auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.set(attributes::AUTH_TYPE, auth_type.into());
        self
    }

    #[must_use]
    pub fn mtls(mut self, presented: bool) -> Self {
        self.set(attributes::MTLS, presented);
        self
    }

    #[must_use]
    pub fn uri_sans(mut self, sans: Vec<String>) -> Self {
        self.set(attributes::URI_SANS, sans);
        self
    }

    #[must_use]
    pub fn dns_sans(mut self, sans: Vec<String>) -> Self {
        self.set(attributes::DNS_SANS, sans);
        self
    }

    #[must_use]
    pub fn peer_certificate_subject(mut self, subject: impl Into<String>) -> Self {
        self.set(attributes::PEER_CERT_SUBJECT, subject.into());
        self
    }

    #[must_use]
    pub fn requested_server_name(mut self, sni: impl Into<String>) -> Self {
        self.set(attributes::REQUESTED_SERVER_NAME, sni.into());
        self
    }

    /// Full RPC method name (`/package.Service/Method`).
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.set(attributes::REQUEST_PATH, path.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.set(attributes::REQUEST_HOST, host.into());
        self
    }

    /// Add one request header value.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        let key = key.to_ascii_lowercase();
        self.headers
            .entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
        self
    }

    /// Add one free-form attribute under `metadata`.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> PeerContext {
        let Self {
            attributes: mut attrs,
            headers,
            metadata,
        } = self;

        if !headers.is_empty() {
            let headers = headers
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            attrs.insert(
                attributes::REQUEST_HEADERS.to_owned(),
                Value::Map(headers),
            );
        }
        if !metadata.is_empty() {
            attrs.insert(attributes::METADATA.to_owned(), Value::Map(metadata));
        }

        PeerContext { attributes: attrs }
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_owned(), value.into());
    }
}
