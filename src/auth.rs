//! Auth-domain identifiers, caller identities, bearer sessions, and anti-forgery tokens.

pub mod id;
pub mod identity;
pub mod session;
#[cfg(feature = "reqwest")] pub mod supabase;
pub mod token;

pub use id::*;
pub use identity::*;
pub use session::*;
#[cfg(feature = "reqwest")] pub use supabase::*;
pub use token::{record::*, secret::*};
