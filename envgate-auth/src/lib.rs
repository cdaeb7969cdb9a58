/*!
    The authorization registry: writer and register public-key sets
    bootstrapped from trusted URLs, and the encrypted, persisted
    host→reader-key map mutated by the `register` command.
*/

mod bootstrap;
mod error;
mod readers;
mod registry;

pub use bootstrap::{fetch_public_keys, parse_authorized_key_line};
pub use error::{AuthError, AuthResult};
pub use readers::{READERS_GROUP, READERS_VARIABLE};
pub use registry::AuthRegistry;
