//! Bot module - OneBot event intake and dispatch.

pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use dispatcher::AppState;
pub use runtime::run;
