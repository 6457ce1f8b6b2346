pub mod client_ip;
pub mod new_subscriber;
pub mod stats;
pub mod subscriber;
pub mod subscriber_email;
