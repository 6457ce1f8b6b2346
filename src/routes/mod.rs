mod admin;
mod export;
mod health_check;
mod methods;
mod subscriptions;

pub use admin::*;
pub use export::*;
pub use health_check::*;
pub use methods::*;
pub use subscriptions::*;

#[derive(serde::Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}
