//! CLI command handlers, one file per command.

mod add;
mod destination;
mod profiles;
mod serve;
mod show;
mod start;
mod status;
mod stop;

pub use add::run_add;
pub use destination::run_destination;
pub use profiles::run_profiles;
pub use serve::run_serve;
pub use show::run_show;
pub use start::run_start;
pub use status::run_status;
pub use stop::run_stop;
