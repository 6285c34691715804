// Wed Feb 11 2026 - Alex

pub mod api;
pub mod behaviour;
pub mod builtins;
pub mod engine;
pub mod error;
pub mod javascript;
pub mod lua;
pub mod types;
pub mod value;

pub use api::{HostApi, HostEnum, HostFunction, HostModule, HostModuleBuilder};
pub use behaviour::ScriptBehaviour;
pub use builtins::{register_builtins, GameWorld, KeyCode, SharedWorld, Vector3};
pub use engine::{GlobalValue, ScriptEngine, ScriptLanguage, ScriptObject};
pub use error::{EngineInitError, ErrorChannel, HostError, ScriptError, ScriptErrorKind, SubscriptionId};
pub use javascript::JavascriptEngine;
pub use lua::LuaEngine;
pub use types::{HostType, HostValue};
pub use value::ScriptValue;
