// Thu Feb 12 2026 - Alex

use crate::scripting::api::{HostApi, HostEnum, HostFunction, HostModule};
use crate::scripting::engine::{install_host_api, next_script_id, GlobalValue, ScriptEngine, ScriptLanguage};
use crate::scripting::error::{EngineInitError, ErrorChannel, Fault, HostError};
use crate::scripting::types::HostValue;
use crate::scripting::value::{NativeValue, ScriptValue};
use indexmap::IndexMap;
use log::debug;
use mlua::{Error as LuaError, Function, Lua, MultiValue, Table, Value};

/// Lua 5.4 engine.
pub struct LuaEngine {
    lua: Lua,
    errors: ErrorChannel,
    script_id: u64,
    chunk_name: String,
}

impl LuaEngine {
    pub fn new(api: &HostApi) -> Result<Self, EngineInitError> {
        Self::with_errors(api, ErrorChannel::new())
    }

    pub fn with_errors(api: &HostApi, errors: ErrorChannel) -> Result<Self, EngineInitError> {
        let script_id = next_script_id();
        let engine = Self {
            lua: Lua::new(),
            errors,
            script_id,
            chunk_name: ScriptLanguage::Lua.chunk_name(script_id),
        };
        install_host_api(&engine, api)?;

        debug!("Created Lua engine {}", engine.chunk_name);
        Ok(engine)
    }

    fn handle(&self, value: Value) -> LuaHandle {
        LuaHandle {
            value,
            lua: self.lua.clone(),
        }
    }
}

impl ScriptEngine for LuaEngine {
    fn language(&self) -> ScriptLanguage {
        ScriptLanguage::Lua
    }

    fn script_id(&self) -> u64 {
        self.script_id
    }

    fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    fn define_global(&self, name: &str, value: GlobalValue) -> Result<(), String> {
        global_to_lua(&self.lua, value)
            .and_then(|value| self.lua.globals().set(name, value))
            .map_err(|e| e.to_string())
    }

    fn define_enum(&self, host_enum: &HostEnum) -> Result<(), String> {
        self.define_global(&host_enum.name, GlobalValue::Data(host_enum.to_value()))
    }

    fn get_global(&self, name: &str) -> ScriptValue {
        let result = self
            .lua
            .globals()
            .get::<Value>(name)
            .map(|value| self.handle(value))
            .map_err(|e| fault_from(&e));
        ScriptValue::from_result(result, &self.errors, self.script_id)
    }

    fn run_code(&self, source: &str) {
        let result = self
            .lua
            .load(source)
            .set_name(format!("={}", self.chunk_name))
            .exec();

        if let Err(err) = result {
            self.errors.report_fault(self.script_id, fault_from(&err));
        }
    }

    fn call_with_return(&self, name: &str, args: &[HostValue]) -> ScriptValue {
        let result = match self.lua.globals().get::<Value>(name) {
            Ok(Value::Function(func)) => invoke(&self.lua, &func, args).map(|value| self.handle(value)),
            Ok(other) => Err(Fault::runtime(format!(
                "{}: attempt to call a {} value (global '{}')",
                self.chunk_name,
                other.type_name(),
                name
            ))),
            Err(err) => Err(fault_from(&err)),
        };
        ScriptValue::from_result(result, &self.errors, self.script_id)
    }
}

/// A Lua value together with the state that owns it.
pub(crate) struct LuaHandle {
    value: Value,
    lua: Lua,
}

impl LuaHandle {
    fn derive(&self, value: Value) -> Self {
        Self {
            value,
            lua: self.lua.clone(),
        }
    }

    fn table(&self) -> Result<&Table, Fault> {
        match &self.value {
            Value::Table(table) => Ok(table),
            Value::Nil => Err(Fault::other("cannot index a null value")),
            other => Err(Fault::other(format!("cannot index a {} value", other.type_name()))),
        }
    }
}

impl NativeValue for LuaHandle {
    fn is_null(&self) -> bool {
        self.value.is_nil()
    }

    fn is_function(&self) -> bool {
        self.value.is_function()
    }

    fn type_name(&self) -> String {
        self.value.type_name().to_string()
    }

    fn get_key(&self, key: &str) -> Result<Self, Fault> {
        let value = self.table()?.get::<Value>(key).map_err(|e| fault_from(&e))?;
        Ok(self.derive(value))
    }

    fn get_index(&self, index: i64) -> Result<Self, Fault> {
        let value = self.table()?.get::<Value>(index).map_err(|e| fault_from(&e))?;
        Ok(self.derive(value))
    }

    fn to_bool(&self) -> Option<bool> {
        self.value.as_boolean()
    }

    fn to_number(&self) -> Option<f64> {
        match &self.value {
            Value::Integer(n) => Some(*n as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn to_text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => s.to_str().ok().map(|s| s.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn length(&self) -> Option<usize> {
        match &self.value {
            Value::Table(table) => Some(table.raw_len()),
            _ => None,
        }
    }

    fn invoke(&self, args: &[HostValue]) -> Result<Self, Fault> {
        match &self.value {
            Value::Function(func) => invoke(&self.lua, func, args).map(|value| self.derive(value)),
            other => Err(Fault::runtime(format!("attempt to call a {} value", other.type_name()))),
        }
    }

    fn to_host(&self) -> Result<HostValue, Fault> {
        Ok(to_host(&self.value)?)
    }
}

/// Maps an mlua error onto the three script error kinds. Failures raised by host
/// callbacks unwrap to their cause.
fn fault_from(err: &LuaError) -> Fault {
    match err {
        LuaError::SyntaxError { message, .. } => Fault::syntax(message.clone()),
        LuaError::RuntimeError(message) => Fault::runtime(message.clone()),
        LuaError::CallbackError { cause, .. } => fault_from(cause),
        other => Fault::other(other.to_string()),
    }
}

fn invoke(lua: &Lua, func: &Function, args: &[HostValue]) -> Result<Value, Fault> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        if !arg.is_primitive() && !arg.is_nil() {
            return Err(Fault::other(format!("unsupported argument type {}", arg.type_name())));
        }
        values.push(from_host(lua, arg).map_err(|e| fault_from(&e))?);
    }

    func.call::<Value>(MultiValue::from_vec(values))
        .map_err(|e| fault_from(&e))
}

fn to_host(value: &Value) -> Result<HostValue, HostError> {
    match value {
        Value::Nil => Ok(HostValue::Nil),
        Value::Boolean(b) => Ok(HostValue::Boolean(*b)),
        Value::Integer(n) => Ok(HostValue::Integer(*n)),
        Value::Number(n) => Ok(HostValue::Number(*n)),
        Value::String(s) => s
            .to_str()
            .map(|s| HostValue::String(s.to_string()))
            .map_err(|e| HostError::Custom(e.to_string())),
        Value::Table(table) => table_to_host(table),
        other => Err(HostError::Unsupported(format!("a Lua {}", other.type_name()))),
    }
}

/// Sequences become arrays, everything else a keyed table.
fn table_to_host(table: &Table) -> Result<HostValue, HostError> {
    let failed = |e: LuaError| HostError::Custom(e.to_string());

    let len = table.raw_len();
    if len > 0 {
        let mut items = Vec::with_capacity(len);
        for i in 1..=len {
            items.push(to_host(&table.raw_get::<Value>(i).map_err(failed)?)?);
        }
        return Ok(HostValue::Array(items));
    }

    let mut entries = IndexMap::new();
    for pair in table.clone().pairs::<Value, Value>() {
        let (key, value) = pair.map_err(failed)?;
        let key = match key {
            Value::String(s) => s.to_str().map_err(failed)?.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            other => return Err(HostError::Unsupported(format!("a Lua {} key", other.type_name()))),
        };
        entries.insert(key, to_host(&value)?);
    }
    Ok(HostValue::Table(entries))
}

fn from_host(lua: &Lua, value: &HostValue) -> mlua::Result<Value> {
    Ok(match value {
        HostValue::Nil => Value::Nil,
        HostValue::Boolean(b) => Value::Boolean(*b),
        HostValue::Integer(n) => Value::Integer(*n),
        HostValue::Number(n) => Value::Number(*n),
        HostValue::String(s) => Value::String(lua.create_string(s)?),
        HostValue::Array(items) => {
            let table = lua.create_table_with_capacity(items.len(), 0)?;
            for (i, item) in items.iter().enumerate() {
                table.raw_set(i + 1, from_host(lua, item)?)?;
            }
            Value::Table(table)
        }
        HostValue::Table(entries) => {
            let table = lua.create_table_with_capacity(0, entries.len())?;
            for (key, item) in entries {
                table.raw_set(key.as_str(), from_host(lua, item)?)?;
            }
            Value::Table(table)
        }
    })
}

fn host_function(lua: &Lua, func: HostFunction) -> mlua::Result<Function> {
    lua.create_function(move |lua, args: MultiValue| {
        let host_args = args
            .iter()
            .map(to_host)
            .collect::<Result<Vec<_>, _>>()
            .map_err(LuaError::external)?;

        let result = func.call(&host_args).map_err(LuaError::external)?;
        from_host(lua, &result)
    })
}

fn module_table(lua: &Lua, module: &HostModule) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    for func in module.functions.values() {
        table.raw_set(func.name.as_str(), host_function(lua, func.clone())?)?;
    }
    for (name, value) in &module.constants {
        table.raw_set(name.as_str(), from_host(lua, value)?)?;
    }
    Ok(table)
}

fn global_to_lua(lua: &Lua, value: GlobalValue) -> mlua::Result<Value> {
    match value {
        GlobalValue::Boolean(b) => Ok(Value::Boolean(b)),
        GlobalValue::Number(n) => Ok(Value::Number(n)),
        GlobalValue::String(s) => Ok(Value::String(lua.create_string(&s)?)),
        GlobalValue::Data(data) => from_host(lua, &data),
        GlobalValue::Object(module) => Ok(Value::Table(module_table(lua, &module)?)),
        GlobalValue::Function(func) => Ok(Value::Function(host_function(lua, func)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::api::HostModuleBuilder;
    use crate::scripting::error::ScriptErrorKind;
    use crate::scripting::types::HostType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collect(engine: &LuaEngine) -> Rc<RefCell<Vec<(ScriptErrorKind, String)>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine
            .errors()
            .subscribe(move |e| sink.borrow_mut().push((e.kind, e.message.clone())));
        seen
    }

    #[test]
    fn test_module_functions_and_constants() {
        let mut api = HostApi::new();
        api.register_module(
            HostModuleBuilder::new("Util")
                .function(
                    HostFunction::new("upper", |args| {
                        Ok(HostValue::from(args[0].as_str().unwrap_or_default().to_uppercase()))
                    })
                    .with_param("s", HostType::String)
                    .with_return_type(HostType::String),
                )
                .constant("version", HostValue::Integer(3))
                .build(),
        );

        let engine = LuaEngine::new(&api).unwrap();
        engine.run_code("name = Util.upper('bot') .. Util.version");
        assert_eq!(engine.get_global("name").as_string(), Some("BOT3".to_string()));
    }

    #[test]
    fn test_messages_name_the_chunk() {
        let engine = LuaEngine::new(&HostApi::new()).unwrap();
        let seen = collect(&engine);

        engine.run_code("error('custom failure')");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ScriptErrorKind::RuntimeError);
        assert!(seen[0].1.contains("custom failure"));
        assert!(seen[0].1.starts_with(&engine.chunk_name));
    }

    #[test]
    fn test_host_error_inside_pcall_is_contained() {
        let mut api = HostApi::new();
        api.register_function_with_meta(
            HostFunction::new("fail", |_| Err(HostError::Custom("nope".to_string()))).with_return_type(HostType::Void),
        );
        let engine = LuaEngine::new(&api).unwrap();
        let seen = collect(&engine);

        engine.run_code("ok = pcall(fail)");
        assert_eq!(engine.get_global("ok").as_bool(), Some(false));
        assert!(seen.borrow().is_empty());

        engine.run_code("fail()");
        assert_eq!(seen.borrow()[0].0, ScriptErrorKind::OtherError);
        assert!(seen.borrow()[0].1.contains("nope"));
    }

    #[test]
    fn test_sequence_and_table_conversion() {
        let engine = LuaEngine::new(&HostApi::new()).unwrap();
        engine.run_code("list = { 10, 20, 30 } record = { id = 7, tags = { 'a' } }");

        assert_eq!(
            engine.get_global("list").to_host_value(),
            Some(HostValue::array(vec![
                HostValue::Integer(10),
                HostValue::Integer(20),
                HostValue::Integer(30)
            ]))
        );
        let record = engine.get_global("record").to_host_value().unwrap();
        assert_eq!(record.get("id"), Some(&HostValue::Integer(7)));
        assert_eq!(record.get("tags"), Some(&HostValue::array(vec![HostValue::from("a")])));
    }

    #[test]
    fn test_functions_do_not_marshal_out() {
        let engine = LuaEngine::new(&HostApi::new()).unwrap();
        let seen = collect(&engine);
        engine.run_code("function f() end");
        assert_eq!(engine.get_global("f").to_host_value(), None);
        assert_eq!(seen.borrow()[0].0, ScriptErrorKind::OtherError);
    }
}
