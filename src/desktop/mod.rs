//! Desktop host for the push bridge
//!
//! Concrete platform pieces used by the command-line client: a terminal
//! notifier, a browser-backed view host and an HTTP push service client.

mod notifier;
mod platform;
mod views;

pub use notifier::TerminalNotifier;
pub use platform::HttpPushPlatform;
pub use views::BrowserViews;
