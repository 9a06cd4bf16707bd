// ABOUTME: Command module aggregator for the cutover CLI.
// ABOUTME: Re-exports deploy, status, and rollback command handlers.

mod deploy;
mod rollback;
mod setup;
mod status;

pub use deploy::deploy;
pub use rollback::rollback;
pub use status::status;
