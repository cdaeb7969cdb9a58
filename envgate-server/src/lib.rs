/*!
    The SSH session engine (C5): listener lifecycle, per-connection role
    authentication, and per-channel `env`/`exec` dispatch.

    [`EnvgateServer`] owns the `russh` server configuration and the set of
    bound listeners; [`handler::ConnectionHandler`] is the `russh::server::
    Handler` implementation driving one accepted connection; [`commands`]
    dispatches the four exec commands against the crypto, auth, and store
    layers.
*/

mod commands;
mod error;
mod handler;
mod listener;
mod rsa_wire;
mod session;

pub use commands::{CommandContext, CommandOutcome};
pub use error::{ServerError, ServerResult};
pub use listener::{EnvgateServer, load_host_key};
pub use rsa_wire::rsa_public_key_wire;
pub use session::{ChannelPhase, ChannelState, Role};
