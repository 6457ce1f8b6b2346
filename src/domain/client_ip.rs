use actix_web::HttpRequest;

/// Stored when the request carries no usable origin at all.
pub const UNKNOWN_IP: &str = "0.0.0.0";
/// Width of the `ip_address` column; long enough for any textual IPv6.
pub const MAX_IP_LENGTH: usize = 45;

/// Origin address of a request, as reported by the client or the socket.
///
/// Forwarding headers are taken at face value, no trusted proxy chain is checked,
/// so the value is advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(String);

impl ClientIp {
    pub fn from_request(req: &HttpRequest) -> ClientIp {
        let ip = header_value(req, "x-forwarded-for")
            .and_then(|forwarded| first_forwarded_entry(&forwarded))
            .or_else(|| header_value(req, "x-real-ip"))
            .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_IP.to_string());

        Self(ip.chars().take(MAX_IP_LENGTH).collect())
    }
}

impl AsRef<str> for ClientIp {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn first_forwarded_entry(forwarded: &str) -> Option<String> {
    forwarded
        .split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .map(String::from)
}
