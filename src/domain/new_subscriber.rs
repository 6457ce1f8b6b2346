use serde::Deserialize;

use crate::domain::client_ip::ClientIp;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub ip_address: ClientIp,
}

#[derive(Deserialize, Debug)]
pub struct NewSubscriberBody {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum NewSubscriberError {
    #[error("no data received")]
    EmptyBody,
    #[error("invalid JSON data: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("email is required")]
    MissingEmail,
    #[error("invalid email address")]
    InvalidEmail,
}

impl NewSubscriberBody {
    pub fn from_bytes(raw: &[u8]) -> Result<NewSubscriberBody, NewSubscriberError> {
        if raw.is_empty() {
            return Err(NewSubscriberError::EmptyBody);
        }

        Ok(serde_json::from_slice(raw)?)
    }
}

impl NewSubscriber {
    pub fn parse(raw: &[u8], ip_address: ClientIp) -> Result<NewSubscriber, NewSubscriberError> {
        let body = NewSubscriberBody::from_bytes(raw)?;
        let email = body
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(NewSubscriberError::MissingEmail)?;
        let email = SubscriberEmail::parse(email.to_string())
            .map_err(|_| NewSubscriberError::InvalidEmail)?;

        Ok(NewSubscriber { email, ip_address })
    }
}
