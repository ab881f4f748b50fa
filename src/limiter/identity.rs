//! Client identity derivation.
//!
//! Maps a request to a stable, opaque key: the caller credential when one
//! is present, otherwise the client network address. The chosen input is
//! hashed before use so that raw tokens and addresses are never persisted
//! or logged in the clear.

use std::net::{IpAddr, SocketAddr};

use sha2::{Digest, Sha256};

/// The identity input chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// An explicit caller credential was presented.
    Credential(String),
    /// No credential; the client network address stands in.
    Address(String),
}

impl ClientIdentity {
    /// Choose the identity input for a request.
    ///
    /// `forwarded_for` is the comma-separated forwarding chain, if any;
    /// `remote_addr` is the transport-level peer address.
    pub fn from_parts(
        credential: Option<&str>,
        forwarded_for: Option<&str>,
        remote_addr: &str,
    ) -> Self {
        match credential {
            Some(cred) if !cred.is_empty() => ClientIdentity::Credential(cred.to_string()),
            _ => ClientIdentity::Address(client_address(forwarded_for, remote_addr)),
        }
    }

    /// The store key for this identity: lowercase hex SHA-256 of the input.
    pub fn key(&self) -> String {
        let input = match self {
            ClientIdentity::Credential(c) => c,
            ClientIdentity::Address(a) => a,
        };
        let digest = Sha256::digest(input.as_bytes());
        hex::encode(digest)
    }
}

/// Pick the client address, preferring the first non-private entry of the
/// forwarding chain over the connection peer.
fn client_address(forwarded_for: Option<&str>, remote_addr: &str) -> String {
    if let Some(chain) = forwarded_for {
        for entry in chain.split(',') {
            let entry = strip_port(entry.trim());
            if !entry.is_empty() && !is_private_address(&entry) {
                return entry;
            }
        }
    }

    strip_port(remote_addr)
}

/// Strip a port suffix from an address, if one is present.
fn strip_port(addr: &str) -> String {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return sock.ip().to_string();
    }
    addr.to_string()
}

/// Whether an address falls within 10.0.0.0/8, 172.16.0.0/12, or
/// 192.168.0.0/16. Unparseable entries are treated as non-private.
fn is_private_address(addr: &str) -> bool {
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let octets = v4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        _ => false,
    }
}
