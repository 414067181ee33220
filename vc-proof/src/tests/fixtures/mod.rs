mod credentials;
mod crypto;
mod identities;
mod near;
mod recording;

pub use credentials::*;
pub use crypto::*;
pub use identities::*;
pub use near::*;
pub use recording::*;
