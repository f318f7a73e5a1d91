//! Domain types for client configuration

mod resolved;
mod settings;
mod time_span;

pub use resolved::ResolvedSettings;
pub use settings::{
    ClientOAuthSettings, ClientSettings, Defaults, GlobalOAuthSettings, Keystore, Settings,
};
pub use time_span::TimeSpan;
