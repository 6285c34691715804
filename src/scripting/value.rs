// Wed Feb 11 2026 - Alex

use crate::scripting::error::{ErrorChannel, Fault};
use crate::scripting::javascript::JsHandle;
use crate::scripting::lua::LuaHandle;
use crate::scripting::types::HostValue;
use std::fmt;

/// Operations each engine provides on its own values.
pub(crate) trait NativeValue: Sized {
    fn is_null(&self) -> bool;
    fn is_function(&self) -> bool;
    fn type_name(&self) -> String;
    fn get_key(&self, key: &str) -> Result<Self, Fault>;
    fn get_index(&self, index: i64) -> Result<Self, Fault>;
    fn to_bool(&self) -> Option<bool>;
    fn to_number(&self) -> Option<f64>;
    fn to_text(&self) -> Option<String>;
    fn length(&self) -> Option<usize>;
    fn invoke(&self, args: &[HostValue]) -> Result<Self, Fault>;
    fn to_host(&self) -> Result<HostValue, Fault>;
}

pub(crate) enum ValueRepr {
    Null,
    Javascript(JsHandle),
    Lua(LuaHandle),
}

impl From<JsHandle> for ValueRepr {
    fn from(handle: JsHandle) -> Self {
        ValueRepr::Javascript(handle)
    }
}

impl From<LuaHandle> for ValueRepr {
    fn from(handle: LuaHandle) -> Self {
        ValueRepr::Lua(handle)
    }
}

macro_rules! native {
    ($value:expr, $handle:ident => $body:expr) => {
        match &$value.repr {
            ValueRepr::Null => None,
            ValueRepr::Javascript($handle) => Some($body),
            ValueRepr::Lua($handle) => Some($body),
        }
    };
}

/// Engine value behind one uniform interface.
///
/// Failures never escape as errors: they go to the owning engine's error channel and the
/// operation yields a null value or `None`. Integer indexing follows the engine's own
/// convention, so arrays start at 0 in JavaScript and at 1 in Lua.
pub struct ScriptValue {
    repr: ValueRepr,
    errors: ErrorChannel,
    script_id: u64,
}

impl ScriptValue {
    pub(crate) fn new(repr: ValueRepr, errors: &ErrorChannel, script_id: u64) -> Self {
        Self {
            repr,
            errors: errors.clone(),
            script_id,
        }
    }

    pub(crate) fn null(errors: &ErrorChannel, script_id: u64) -> Self {
        Self::new(ValueRepr::Null, errors, script_id)
    }

    /// Wraps a fallible result, reporting the failure and returning null on error.
    pub(crate) fn from_result<H: Into<ValueRepr>>(result: Result<H, Fault>, errors: &ErrorChannel, script_id: u64) -> Self {
        match result {
            Ok(handle) => Self::new(handle.into(), errors, script_id),
            Err(fault) => {
                errors.report_fault(script_id, fault);
                Self::null(errors, script_id)
            }
        }
    }

    fn report(&self, fault: Fault) {
        self.errors.report_fault(self.script_id, fault);
    }

    fn derive<H: Into<ValueRepr>>(&self, result: Option<Result<H, Fault>>, what: &str) -> ScriptValue {
        match result {
            Some(result) => Self::from_result(result, &self.errors, self.script_id),
            None => {
                self.report(Fault::other(format!("cannot {} a null value", what)));
                Self::null(&self.errors, self.script_id)
            }
        }
    }

    pub fn script_id(&self) -> u64 {
        self.script_id
    }

    pub fn is_null(&self) -> bool {
        native!(self, h => h.is_null()).unwrap_or(true)
    }

    pub fn is_function(&self) -> bool {
        native!(self, h => h.is_function()).unwrap_or(false)
    }

    pub fn type_name(&self) -> String {
        native!(self, h => h.type_name()).unwrap_or_else(|| "null".to_string())
    }

    /// Property access on objects and tables.
    pub fn index_str(&self, key: &str) -> ScriptValue {
        match &self.repr {
            ValueRepr::Null => self.derive::<JsHandle>(None, "index"),
            ValueRepr::Javascript(h) => self.derive(Some(h.get_key(key)), "index"),
            ValueRepr::Lua(h) => self.derive(Some(h.get_key(key)), "index"),
        }
    }

    pub fn index(&self, index: i64) -> ScriptValue {
        match &self.repr {
            ValueRepr::Null => self.derive::<JsHandle>(None, "index"),
            ValueRepr::Javascript(h) => self.derive(Some(h.get_index(index)), "index"),
            ValueRepr::Lua(h) => self.derive(Some(h.get_index(index)), "index"),
        }
    }

    fn coerce<T>(&self, value: Option<Option<T>>, target: &str) -> Option<T> {
        match value {
            None => None,
            Some(None) if self.is_null() => None,
            Some(None) => {
                self.report(Fault::other(format!("cannot convert {} to {}", self.type_name(), target)));
                None
            }
            Some(converted) => converted,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.coerce(native!(self, h => h.to_bool()), "boolean")
    }

    pub fn as_number(&self) -> Option<f64> {
        self.coerce(native!(self, h => h.to_number()), "number")
    }

    /// Strings as-is. Numbers and booleans are rendered as text.
    pub fn as_string(&self) -> Option<String> {
        self.coerce(native!(self, h => h.to_text()), "string")
    }

    pub fn array_length(&self) -> Option<usize> {
        self.coerce(native!(self, h => h.length()), "array")
    }

    pub fn call_as_function(&self, args: &[HostValue]) {
        let _ = self.call_as_function_with_return(args);
    }

    pub fn call_as_function_with_return(&self, args: &[HostValue]) -> ScriptValue {
        match &self.repr {
            ValueRepr::Null => self.derive::<JsHandle>(None, "call"),
            ValueRepr::Javascript(h) => self.derive(Some(h.invoke(args)), "call"),
            ValueRepr::Lua(h) => self.derive(Some(h.invoke(args)), "call"),
        }
    }

    /// Copies the value out of the engine. Functions and other engine-only values fail.
    pub fn to_host_value(&self) -> Option<HostValue> {
        match native!(self, h => h.to_host())? {
            Ok(value) => Some(value),
            Err(fault) => {
                self.report(fault);
                None
            }
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptValue")
            .field("type", &self.type_name())
            .field("script_id", &self.script_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::scripting::api::HostApi;
    use crate::scripting::engine::{GlobalValue, ScriptEngine, ScriptLanguage, ScriptObject};
    use crate::scripting::error::ScriptErrorKind;
    use crate::scripting::types::HostValue;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_with(language: ScriptLanguage, source: &str) -> (ScriptObject, Rc<RefCell<Vec<ScriptErrorKind>>>) {
        let engine = ScriptObject::new(language, &HostApi::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.errors().subscribe(move |e| sink.borrow_mut().push(e.kind));
        engine.run_code(source);
        (engine, seen)
    }

    #[test]
    fn test_javascript_object_and_array_access() {
        let (engine, seen) = engine_with(
            ScriptLanguage::Javascript,
            "var player = { name: 'hero', hp: 12, alive: true, items: ['sword', 'shield'] };",
        );
        let player = engine.get_global("player");
        assert_eq!(player.index_str("name").as_string(), Some("hero".to_string()));
        assert_eq!(player.index_str("hp").as_number(), Some(12.0));
        assert_eq!(player.index_str("alive").as_bool(), Some(true));

        let items = player.index_str("items");
        assert_eq!(items.array_length(), Some(2));
        assert_eq!(items.index(0).as_string(), Some("sword".to_string()));
        assert!(items.index(5).is_null());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_lua_table_and_sequence_access() {
        let (engine, seen) = engine_with(
            ScriptLanguage::Lua,
            "player = { name = 'hero', hp = 12, alive = true, items = { 'sword', 'shield' } }",
        );
        let player = engine.get_global("player");
        assert_eq!(player.index_str("name").as_string(), Some("hero".to_string()));
        assert_eq!(player.index_str("hp").as_number(), Some(12.0));
        assert_eq!(player.index_str("alive").as_bool(), Some(true));

        let items = player.index_str("items");
        assert_eq!(items.array_length(), Some(2));
        assert_eq!(items.index(1).as_string(), Some("sword".to_string()));
        assert!(items.index(0).is_null());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_call_as_function() {
        let sources = [
            (ScriptLanguage::Javascript, "var lib = { add: function (a, b) { return a + b; } };"),
            (ScriptLanguage::Lua, "lib = { add = function (a, b) return a + b end }"),
        ];
        for (language, source) in sources {
            let (engine, seen) = engine_with(language, source);
            let add = engine.get_global("lib").index_str("add");
            assert!(add.is_function());
            let sum = add.call_as_function_with_return(&[HostValue::Integer(2), HostValue::Number(0.5)]);
            assert_eq!(sum.as_number(), Some(2.5), "{}", language);
            assert!(seen.borrow().is_empty(), "{}", language);
        }
    }

    #[test]
    fn test_misuse_reports_through_channel() {
        for language in [ScriptLanguage::Javascript, ScriptLanguage::Lua] {
            let (engine, seen) = engine_with(language, "");
            engine.set_global("label", GlobalValue::from("text"));

            let label = engine.get_global("label");
            assert_eq!(label.as_number(), None);
            assert!(label.call_as_function_with_return(&[]).is_null());
            assert!(engine.get_global("missing").index_str("x").is_null());
            assert_eq!(
                *seen.borrow(),
                vec![
                    ScriptErrorKind::OtherError,
                    ScriptErrorKind::RuntimeError,
                    ScriptErrorKind::OtherError
                ],
                "{}",
                language
            );
        }
    }

    #[test]
    fn test_null_coercions_are_silent() {
        for language in [ScriptLanguage::Javascript, ScriptLanguage::Lua] {
            let (engine, seen) = engine_with(language, "");
            let missing = engine.get_global("missing");
            assert!(missing.is_null());
            assert_eq!(missing.as_number(), None);
            assert_eq!(missing.as_string(), None);
            assert!(seen.borrow().is_empty());
        }
    }

    #[test]
    fn test_to_host_value() {
        let (engine, _) = engine_with(ScriptLanguage::Lua, "pos = { x = 1, y = 2.5 }");
        let pos = engine.get_global("pos").to_host_value().unwrap();
        assert_eq!(pos.get("x"), Some(&HostValue::Integer(1)));
        assert_eq!(pos.get("y"), Some(&HostValue::Number(2.5)));
    }
}
