//! Anti-forgery token values and the cached record kept by clients.

pub mod record;
pub mod secret;
