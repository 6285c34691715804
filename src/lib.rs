// Sat Feb 14 2026 - Alex

pub mod config;
pub mod reflection;
pub mod scripting;
pub mod ui;
pub mod utils;

pub use config::{ConfigError, HostConfig};
pub use reflection::{Accessor, MemberCache, MemberKey};
pub use scripting::{ScriptBehaviour, ScriptEngine, ScriptLanguage, ScriptObject, ScriptValue};
