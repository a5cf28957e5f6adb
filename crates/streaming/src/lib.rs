pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod records;
pub mod source;
pub mod store;
pub mod validate;

pub use error::*;
pub use fingerprint::*;
pub use loader::*;
pub use records::*;
pub use source::*;
pub use store::*;
pub use validate::*;
