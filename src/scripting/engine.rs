// Wed Feb 11 2026 - Alex

use crate::scripting::api::{HostApi, HostEnum, HostFunction, HostModule};
use crate::scripting::error::{EngineInitError, ErrorChannel, ScriptError};
use crate::scripting::javascript::JavascriptEngine;
use crate::scripting::lua::LuaEngine;
use crate::scripting::types::HostValue;
use crate::scripting::value::ScriptValue;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCRIPT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for a new engine. Never reset.
pub fn next_script_id() -> u64 {
    NEXT_SCRIPT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    #[serde(alias = "js")]
    #[value(alias = "js")]
    Javascript,
    Lua,
}

impl ScriptLanguage {
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptLanguage::Javascript => "js",
            ScriptLanguage::Lua => "lua",
        }
    }

    pub fn chunk_name(&self, script_id: u64) -> String {
        format!("script_{}.{}", script_id, self.extension())
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLanguage::Javascript => write!(f, "JavaScript"),
            ScriptLanguage::Lua => write!(f, "Lua"),
        }
    }
}

/// Anything that can be stored as a global.
#[derive(Debug, Clone)]
pub enum GlobalValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Data(HostValue),
    Object(HostModule),
    Function(HostFunction),
}

impl From<bool> for GlobalValue {
    fn from(b: bool) -> Self {
        GlobalValue::Boolean(b)
    }
}

impl From<f64> for GlobalValue {
    fn from(n: f64) -> Self {
        GlobalValue::Number(n)
    }
}

impl From<i32> for GlobalValue {
    fn from(n: i32) -> Self {
        GlobalValue::Number(n as f64)
    }
}

impl From<&str> for GlobalValue {
    fn from(s: &str) -> Self {
        GlobalValue::String(s.to_string())
    }
}

impl From<String> for GlobalValue {
    fn from(s: String) -> Self {
        GlobalValue::String(s)
    }
}

impl From<HostValue> for GlobalValue {
    fn from(value: HostValue) -> Self {
        GlobalValue::Data(value)
    }
}

impl From<HostModule> for GlobalValue {
    fn from(module: HostModule) -> Self {
        GlobalValue::Object(module)
    }
}

impl From<HostFunction> for GlobalValue {
    fn from(func: HostFunction) -> Self {
        GlobalValue::Function(func)
    }
}

/// Uniform contract over one embedded interpreter session.
///
/// Nothing here returns an error. Failures are classified and sent to `errors()`,
/// and the engine stays usable afterwards.
pub trait ScriptEngine {
    fn language(&self) -> ScriptLanguage;

    fn script_id(&self) -> u64;

    fn errors(&self) -> &ErrorChannel;

    /// Stores a global. Returns the failure message on error.
    fn define_global(&self, name: &str, value: GlobalValue) -> Result<(), String>;

    /// Stores an enum as a name to integer table, replacing any previous table.
    fn define_enum(&self, host_enum: &HostEnum) -> Result<(), String>;

    fn get_global(&self, name: &str) -> ScriptValue;

    fn run_code(&self, source: &str);

    fn call_with_return(&self, name: &str, args: &[HostValue]) -> ScriptValue;

    fn set_global(&self, name: &str, value: GlobalValue) {
        if let Err(message) = self.define_global(name, value) {
            self.errors().report(ScriptError::other(self.script_id(), message));
        }
    }

    fn install_enum(&self, host_enum: &HostEnum) {
        if let Err(message) = self.define_enum(host_enum) {
            self.errors().report(ScriptError::other(self.script_id(), message));
        }
    }

    fn call(&self, name: &str, args: &[HostValue]) {
        let _ = self.call_with_return(name, args);
    }

    fn has_function(&self, name: &str) -> bool {
        self.get_global(name).is_function()
    }
}

/// Installs every function, module and enum of `api`. Failures here are defects in
/// the host surface and abort construction.
pub fn install_host_api<E: ScriptEngine + ?Sized>(engine: &E, api: &HostApi) -> Result<(), EngineInitError> {
    let binding_error = |name: &str, message: String| EngineInitError::Binding {
        name: name.to_string(),
        message,
    };

    for host_enum in api.enums() {
        engine
            .define_enum(host_enum)
            .map_err(|m| binding_error(&host_enum.name, m))?;
    }
    for func in api.functions() {
        engine
            .define_global(&func.name, GlobalValue::Function(func.clone()))
            .map_err(|m| binding_error(&func.name, m))?;
    }
    for module in api.modules() {
        engine
            .define_global(&module.name, GlobalValue::Object(module.clone()))
            .map_err(|m| binding_error(&module.name, m))?;
    }

    debug!(
        "Installed host API into {} script {}: {} functions, {} modules, {} enums",
        engine.language(),
        engine.script_id(),
        api.functions().count(),
        api.modules().count(),
        api.enums().count()
    );
    Ok(())
}

/// Closed set of supported engines.
pub enum ScriptObject {
    Javascript(JavascriptEngine),
    Lua(LuaEngine),
}

impl ScriptObject {
    pub fn new(language: ScriptLanguage, api: &HostApi) -> Result<Self, EngineInitError> {
        Self::with_errors(language, api, ErrorChannel::new())
    }

    /// Builds an engine reporting into an existing channel, so subscribers can be
    /// attached before any code runs.
    pub fn with_errors(language: ScriptLanguage, api: &HostApi, errors: ErrorChannel) -> Result<Self, EngineInitError> {
        Ok(match language {
            ScriptLanguage::Javascript => ScriptObject::Javascript(JavascriptEngine::with_errors(api, errors)?),
            ScriptLanguage::Lua => ScriptObject::Lua(LuaEngine::with_errors(api, errors)?),
        })
    }

    fn inner(&self) -> &dyn ScriptEngine {
        match self {
            ScriptObject::Javascript(engine) => engine,
            ScriptObject::Lua(engine) => engine,
        }
    }
}

impl ScriptEngine for ScriptObject {
    fn language(&self) -> ScriptLanguage {
        self.inner().language()
    }

    fn script_id(&self) -> u64 {
        self.inner().script_id()
    }

    fn errors(&self) -> &ErrorChannel {
        self.inner().errors()
    }

    fn define_global(&self, name: &str, value: GlobalValue) -> Result<(), String> {
        self.inner().define_global(name, value)
    }

    fn define_enum(&self, host_enum: &HostEnum) -> Result<(), String> {
        self.inner().define_enum(host_enum)
    }

    fn get_global(&self, name: &str) -> ScriptValue {
        self.inner().get_global(name)
    }

    fn run_code(&self, source: &str) {
        self.inner().run_code(source)
    }

    fn call_with_return(&self, name: &str, args: &[HostValue]) -> ScriptValue {
        self.inner().call_with_return(name, args)
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject")
            .field("language", &self.language())
            .field("script_id", &self.script_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::error::ScriptErrorKind;
    use crate::scripting::types::HostType;
    use std::cell::RefCell;
    use std::rc::Rc;

    const LANGUAGES: [ScriptLanguage; 2] = [ScriptLanguage::Javascript, ScriptLanguage::Lua];

    fn collect(engine: &ScriptObject) -> Rc<RefCell<Vec<ScriptErrorKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.errors().subscribe(move |e| sink.borrow_mut().push(e.kind));
        seen
    }

    fn test_api() -> HostApi {
        let mut api = HostApi::new();
        api.register_function_with_meta(
            HostFunction::new("double", |args| Ok(HostValue::Number(args[0].as_float().unwrap_or(0.0) * 2.0)))
                .with_param("n", HostType::Number)
                .with_return_type(HostType::Number),
        );
        api.register_enum(HostEnum::from_pairs("Color", [("Red", 1), ("Green", 2)]));
        api
    }

    #[test]
    fn test_script_ids_are_unique() {
        let api = HostApi::new();
        let a = ScriptObject::new(ScriptLanguage::Lua, &api).unwrap();
        let b = ScriptObject::new(ScriptLanguage::Javascript, &api).unwrap();
        assert_ne!(a.script_id(), b.script_id());
        assert_eq!(ScriptLanguage::Lua.chunk_name(4), "script_4.lua");
    }

    #[test]
    fn test_syntax_error_reported_once_and_engine_survives() {
        let cases = [
            (ScriptLanguage::Javascript, "function (", "var x = 1 + 2;"),
            (ScriptLanguage::Lua, "function end end (", "x = 1 + 2"),
        ];
        for (language, bad, good) in cases {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            let seen = collect(&engine);

            engine.run_code(bad);
            assert_eq!(*seen.borrow(), vec![ScriptErrorKind::SyntaxError], "{}", language);

            engine.run_code(good);
            assert_eq!(seen.borrow().len(), 1, "{}", language);
            assert_eq!(engine.get_global("x").as_number(), Some(3.0), "{}", language);
        }
    }

    #[test]
    fn test_set_then_get_global_number() {
        for language in LANGUAGES {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            engine.set_global("X", GlobalValue::from(5));
            assert_eq!(engine.get_global("X").as_number(), Some(5.0), "{}", language);
        }
    }

    #[test]
    fn test_absent_global_is_null() {
        for language in LANGUAGES {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            let seen = collect(&engine);
            assert!(engine.get_global("nothing_here").is_null(), "{}", language);
            assert!(seen.borrow().is_empty());
        }
    }

    #[test]
    fn test_calling_absent_function_reports_once() {
        for language in LANGUAGES {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            let seen = collect(&engine);

            engine.call("DoesNotExist", &[]);
            assert_eq!(*seen.borrow(), vec![ScriptErrorKind::RuntimeError], "{}", language);
        }
    }

    #[test]
    fn test_enum_reimport_is_idempotent() {
        for language in LANGUAGES {
            let engine = ScriptObject::new(language, &test_api()).unwrap();
            let seen = collect(&engine);
            let colors = HostEnum::from_pairs("Color", [("Red", 1), ("Green", 2)]);

            engine.install_enum(&colors);
            engine.install_enum(&colors);
            assert!(seen.borrow().is_empty());
            assert_eq!(engine.get_global("Color").index_str("Green").as_number(), Some(2.0), "{}", language);
        }
    }

    #[test]
    fn test_host_function_round_trip() {
        let sources = [
            (ScriptLanguage::Javascript, "function run(n) { return double(n) + 1; }"),
            (ScriptLanguage::Lua, "function run(n) return double(n) + 1 end"),
        ];
        for (language, source) in sources {
            let engine = ScriptObject::new(language, &test_api()).unwrap();
            let seen = collect(&engine);
            engine.run_code(source);
            let result = engine.call_with_return("run", &[HostValue::Number(4.0)]);
            assert_eq!(result.as_number(), Some(9.0), "{}", language);
            assert!(seen.borrow().is_empty(), "{}", language);
        }
    }

    #[test]
    fn test_host_function_misuse_is_other_error() {
        let sources = [
            (ScriptLanguage::Javascript, "double('a', 'b');"),
            (ScriptLanguage::Lua, "double('a', 'b')"),
        ];
        for (language, source) in sources {
            let engine = ScriptObject::new(language, &test_api()).unwrap();
            let seen = collect(&engine);
            engine.run_code(source);
            assert_eq!(*seen.borrow(), vec![ScriptErrorKind::OtherError], "{}", language);
        }
    }

    #[test]
    fn test_runtime_error_in_code() {
        let sources = [
            (ScriptLanguage::Javascript, "let v = null; v.field = 1;"),
            (ScriptLanguage::Lua, "local v = nil; v.field = 1"),
        ];
        for (language, source) in sources {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            let seen = collect(&engine);
            engine.run_code(source);
            assert_eq!(*seen.borrow(), vec![ScriptErrorKind::RuntimeError], "{}", language);
        }
    }

    #[test]
    fn test_unsupported_call_argument_is_other_error() {
        let sources = [
            (ScriptLanguage::Javascript, "function f(a) { return a; }"),
            (ScriptLanguage::Lua, "function f(a) return a end"),
        ];
        for (language, source) in sources {
            let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
            let seen = collect(&engine);
            engine.run_code(source);
            let result = engine.call_with_return("f", &[HostValue::array(vec![HostValue::Integer(1)])]);
            assert!(result.is_null());
            assert_eq!(*seen.borrow(), vec![ScriptErrorKind::OtherError], "{}", language);
        }
    }
}
