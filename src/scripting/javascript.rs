// Thu Feb 12 2026 - Alex

use crate::scripting::api::{HostApi, HostEnum, HostFunction, HostModule};
use crate::scripting::engine::{install_host_api, next_script_id, GlobalValue, ScriptEngine, ScriptLanguage};
use crate::scripting::error::{EngineInitError, ErrorChannel, Fault, HostError};
use crate::scripting::types::HostValue;
use crate::scripting::value::{NativeValue, ScriptValue};
use indexmap::IndexMap;
use log::debug;
use rquickjs::function::Rest;
use rquickjs::{qjs, Array, Context, Ctx, Error as JsError, Function, IntoJs, Object, Persistent, Runtime, Value};
use std::ffi::CString;

/// `name` of the exception object thrown when a host function fails.
const HOST_ERROR_NAME: &str = "HostError";

/// QuickJS-backed engine.
pub struct JavascriptEngine {
    context: Context,
    #[allow(dead_code)]
    runtime: Runtime,
    errors: ErrorChannel,
    script_id: u64,
    chunk_name: String,
}

impl JavascriptEngine {
    pub fn new(api: &HostApi) -> Result<Self, EngineInitError> {
        Self::with_errors(api, ErrorChannel::new())
    }

    pub fn with_errors(api: &HostApi, errors: ErrorChannel) -> Result<Self, EngineInitError> {
        let init_error = |e: JsError| EngineInitError::Interpreter {
            language: ScriptLanguage::Javascript,
            message: e.to_string(),
        };

        let runtime = Runtime::new().map_err(init_error)?;
        let context = Context::full(&runtime).map_err(init_error)?;
        let script_id = next_script_id();

        let engine = Self {
            context,
            runtime,
            errors,
            script_id,
            chunk_name: ScriptLanguage::Javascript.chunk_name(script_id),
        };
        install_host_api(&engine, api)?;

        debug!("Created JavaScript engine {}", engine.chunk_name);
        Ok(engine)
    }

    fn report(&self, fault: Fault) {
        let fault = Fault {
            message: format!("{}: {}", self.chunk_name, fault.message),
            ..fault
        };
        self.errors.report_fault(self.script_id, fault);
    }

    fn wrap(&self, result: Result<JsHandle, Fault>) -> ScriptValue {
        match result {
            Ok(handle) => ScriptValue::new(handle.into(), &self.errors, self.script_id),
            Err(fault) => {
                self.report(fault);
                ScriptValue::null(&self.errors, self.script_id)
            }
        }
    }
}

impl ScriptEngine for JavascriptEngine {
    fn language(&self) -> ScriptLanguage {
        ScriptLanguage::Javascript
    }

    fn script_id(&self) -> u64 {
        self.script_id
    }

    fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    fn define_global(&self, name: &str, value: GlobalValue) -> Result<(), String> {
        self.context
            .with(|ctx| {
                let value = global_to_js(&ctx, value)?;
                ctx.globals().set(name, value)
            })
            .map_err(|e| e.to_string())
    }

    fn define_enum(&self, host_enum: &HostEnum) -> Result<(), String> {
        self.define_global(&host_enum.name, GlobalValue::Data(host_enum.to_value()))
    }

    fn get_global(&self, name: &str) -> ScriptValue {
        let result = self.context.with(|ctx| {
            ctx.globals()
                .get::<_, Value>(name)
                .map(|value| JsHandle::new(&ctx, value, &self.context))
                .map_err(|e| fault_from(&ctx, e))
        });
        self.wrap(result)
    }

    fn run_code(&self, source: &str) {
        let result = self.context.with(|ctx| eval_named(&ctx, source, &self.chunk_name));

        if let Err(fault) = result {
            self.report(fault);
        }
    }

    fn call_with_return(&self, name: &str, args: &[HostValue]) -> ScriptValue {
        let result = self.context.with(|ctx| {
            let target: Value = ctx.globals().get(name).map_err(|e| fault_from(&ctx, e))?;
            let func = target
                .as_function()
                .ok_or_else(|| Fault::runtime(format!("TypeError: {} is not a function", name)))?;
            let args = call_args(&ctx, args)?;
            let ret = func
                .call::<_, Value>((Rest(args),))
                .map_err(|e| fault_from(&ctx, e))?;
            Ok(JsHandle::new(&ctx, ret, &self.context))
        });
        self.wrap(result)
    }
}

/// A JavaScript value kept alive outside of `Context::with`.
pub(crate) struct JsHandle {
    // Must drop before `context` releases the runtime.
    value: Persistent<Value<'static>>,
    context: Context,
}

impl JsHandle {
    fn new<'js>(ctx: &Ctx<'js>, value: Value<'js>, context: &Context) -> Self {
        Self {
            value: Persistent::save(ctx, value),
            context: context.clone(),
        }
    }

    fn with_value<R>(&self, f: impl for<'js> FnOnce(&Ctx<'js>, Value<'js>) -> Result<R, Fault>) -> Result<R, Fault> {
        self.context.with(|ctx| {
            let value = self
                .value
                .clone()
                .restore(&ctx)
                .map_err(|e| Fault::other(e.to_string()))?;
            f(&ctx, value)
        })
    }

    fn peek<R>(&self, f: impl for<'js> FnOnce(&Value<'js>) -> R) -> Option<R> {
        self.with_value(|_, value| Ok(f(&value))).ok()
    }

    fn lookup(
        &self,
        key: impl for<'js> FnOnce(&Object<'js>) -> rquickjs::Result<Value<'js>>,
    ) -> Result<JsHandle, Fault> {
        self.with_value(|ctx, value| {
            if value.is_null() || value.is_undefined() {
                return Err(Fault::other("cannot index a null value"));
            }
            let object = value
                .as_object()
                .ok_or_else(|| Fault::other(format!("cannot index a {}", type_name(&value))))?;
            let found = key(object).map_err(|e| fault_from(ctx, e))?;
            Ok(JsHandle::new(ctx, found, &self.context))
        })
    }
}

impl NativeValue for JsHandle {
    fn is_null(&self) -> bool {
        self.peek(|v| v.is_null() || v.is_undefined()).unwrap_or(true)
    }

    fn is_function(&self) -> bool {
        self.peek(|v| v.is_function()).unwrap_or(false)
    }

    fn type_name(&self) -> String {
        self.peek(type_name).unwrap_or_else(|| "unknown".to_string())
    }

    fn get_key(&self, key: &str) -> Result<Self, Fault> {
        self.lookup(|object| object.get::<_, Value>(key))
    }

    fn get_index(&self, index: i64) -> Result<Self, Fault> {
        self.lookup(|object| match u32::try_from(index) {
            Ok(i) => object.get::<_, Value>(i),
            Err(_) => object.get::<_, Value>(index.to_string()),
        })
    }

    fn to_bool(&self) -> Option<bool> {
        self.peek(|v| v.as_bool()).flatten()
    }

    fn to_number(&self) -> Option<f64> {
        self.peek(number_of).flatten()
    }

    fn to_text(&self) -> Option<String> {
        self.peek(|v| {
            if let Some(s) = v.as_string() {
                return s.to_string().ok();
            }
            if let Some(b) = v.as_bool() {
                return Some(b.to_string());
            }
            number_of(v).map(|n| n.to_string())
        })
        .flatten()
    }

    fn length(&self) -> Option<usize> {
        self.peek(|v| v.as_array().map(|a| a.len())).flatten()
    }

    fn invoke(&self, args: &[HostValue]) -> Result<Self, Fault> {
        self.with_value(|ctx, value| {
            let func = value
                .as_function()
                .ok_or_else(|| Fault::runtime(format!("TypeError: {} is not a function", type_name(&value))))?;
            let args = call_args(ctx, args)?;
            let ret = func
                .call::<_, Value>((Rest(args),))
                .map_err(|e| fault_from(ctx, e))?;
            Ok(JsHandle::new(ctx, ret, &self.context))
        })
    }

    fn to_host(&self) -> Result<HostValue, Fault> {
        self.with_value(|_, value| Ok(to_host(&value)?))
    }
}

fn type_name(value: &Value<'_>) -> String {
    format!("{:?}", value.type_of()).to_lowercase()
}

fn number_of(value: &Value<'_>) -> Option<f64> {
    value.as_int().map(f64::from).or_else(|| value.as_float())
}

/// Evaluates `source` as a sloppy-mode global script. QuickJS records `file_name` in
/// stack traces and error locations.
fn eval_named(ctx: &Ctx<'_>, source: &str, file_name: &str) -> Result<(), Fault> {
    let input = CString::new(source).map_err(|_| Fault::syntax("SyntaxError: source contains a NUL byte"))?;
    let file_name = CString::new(file_name).map_err(|e| Fault::other(e.to_string()))?;
    let raw = ctx.as_raw().as_ptr();

    // JS_Eval reads one byte past `input_len`, which CString guarantees is NUL.
    let value = unsafe {
        qjs::JS_Eval(
            raw,
            input.as_ptr(),
            source.len() as _,
            file_name.as_ptr(),
            qjs::JS_EVAL_TYPE_GLOBAL as i32,
        )
    };

    if unsafe { qjs::JS_IsException(value) } {
        return Err(fault_from(ctx, JsError::Exception));
    }
    unsafe { qjs::JS_FreeValue(raw, value) };
    Ok(())
}

/// Turns a failed QuickJS call into a classified fault, taking the pending exception.
fn fault_from(ctx: &Ctx<'_>, err: JsError) -> Fault {
    if !matches!(err, JsError::Exception) {
        return Fault::other(err.to_string());
    }

    let exception = ctx.catch();
    if let Some(object) = exception.as_object() {
        let name = object.get::<_, Option<String>>("name").ok().flatten();
        let message = object
            .get::<_, Option<String>>("message")
            .ok()
            .flatten()
            .unwrap_or_default();

        return match name.as_deref() {
            Some("SyntaxError") => Fault::syntax(format!("SyntaxError: {}", message)),
            Some(HOST_ERROR_NAME) => Fault::other(message),
            Some(name) => Fault::runtime(format!("{}: {}", name, message)),
            None => Fault::runtime(message),
        };
    }

    match exception.as_string().and_then(|s| s.to_string().ok()) {
        Some(text) => Fault::runtime(text),
        None => Fault::runtime(format!("uncaught {}", type_name(&exception))),
    }
}

fn host_error_object<'js>(ctx: &Ctx<'js>, message: &str) -> rquickjs::Result<Value<'js>> {
    let object = Object::new(ctx.clone())?;
    object.set("name", HOST_ERROR_NAME)?;
    object.set("message", message)?;
    Ok(object.into_value())
}

fn throw_host_error(ctx: &Ctx<'_>, message: &str) -> JsError {
    match host_error_object(ctx, message) {
        Ok(value) => ctx.throw(value),
        Err(err) => err,
    }
}

fn to_host(value: &Value<'_>) -> Result<HostValue, HostError> {
    let failed = |e: JsError| HostError::Custom(e.to_string());

    if value.is_null() || value.is_undefined() {
        return Ok(HostValue::Nil);
    }
    if let Some(b) = value.as_bool() {
        return Ok(HostValue::Boolean(b));
    }
    if let Some(n) = value.as_int() {
        return Ok(HostValue::Integer(i64::from(n)));
    }
    if let Some(n) = value.as_float() {
        return Ok(HostValue::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(HostValue::String(s.to_string().map_err(failed)?));
    }
    if value.is_function() {
        return Err(HostError::Unsupported("a JavaScript function".to_string()));
    }
    if let Some(array) = value.as_array() {
        let mut items = Vec::with_capacity(array.len());
        for item in array.iter::<Value>() {
            items.push(to_host(&item.map_err(failed)?)?);
        }
        return Ok(HostValue::Array(items));
    }
    if let Some(object) = value.as_object() {
        let mut table = IndexMap::new();
        for prop in object.props::<String, Value>() {
            let (key, item) = prop.map_err(failed)?;
            table.insert(key, to_host(&item)?);
        }
        return Ok(HostValue::Table(table));
    }

    Err(HostError::Unsupported(format!("a JavaScript {}", type_name(value))))
}

fn from_host<'js>(ctx: &Ctx<'js>, value: &HostValue) -> rquickjs::Result<Value<'js>> {
    Ok(match value {
        HostValue::Nil => Value::new_null(ctx.clone()),
        HostValue::Boolean(b) => Value::new_bool(ctx.clone(), *b),
        HostValue::Integer(n) => match i32::try_from(*n) {
            Ok(n) => Value::new_int(ctx.clone(), n),
            Err(_) => Value::new_float(ctx.clone(), *n as f64),
        },
        HostValue::Number(n) => Value::new_float(ctx.clone(), *n),
        HostValue::String(s) => s.as_str().into_js(ctx)?,
        HostValue::Array(items) => {
            let array = Array::new(ctx.clone())?;
            for (i, item) in items.iter().enumerate() {
                array.set(i, from_host(ctx, item)?)?;
            }
            array.into_value()
        }
        HostValue::Table(entries) => {
            let object = Object::new(ctx.clone())?;
            for (key, item) in entries {
                object.set(key.as_str(), from_host(ctx, item)?)?;
            }
            object.into_value()
        }
    })
}

fn call_args<'js>(ctx: &Ctx<'js>, args: &[HostValue]) -> Result<Vec<Value<'js>>, Fault> {
    args.iter()
        .map(|arg| {
            if !arg.is_primitive() && !arg.is_nil() {
                return Err(Fault::other(format!("unsupported argument type {}", arg.type_name())));
            }
            from_host(ctx, arg).map_err(|e| Fault::other(e.to_string()))
        })
        .collect()
}

fn host_function<'js>(ctx: &Ctx<'js>, func: HostFunction) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<Value<'js>> {
            let mut host_args = Vec::with_capacity(args.0.len());
            for arg in args.0.iter() {
                match to_host(arg) {
                    Ok(value) => host_args.push(value),
                    Err(err) => return Err(throw_host_error(&ctx, &err.to_string())),
                }
            }

            match func.call(&host_args) {
                Ok(result) => from_host(&ctx, &result),
                Err(err) => Err(throw_host_error(&ctx, &err.to_string())),
            }
        },
    )
}

fn module_object<'js>(ctx: &Ctx<'js>, module: &HostModule) -> rquickjs::Result<Value<'js>> {
    let object = Object::new(ctx.clone())?;
    for func in module.functions.values() {
        object.set(func.name.as_str(), host_function(ctx, func.clone())?)?;
    }
    for (name, value) in &module.constants {
        object.set(name.as_str(), from_host(ctx, value)?)?;
    }
    Ok(object.into_value())
}

fn global_to_js<'js>(ctx: &Ctx<'js>, value: GlobalValue) -> rquickjs::Result<Value<'js>> {
    match value {
        GlobalValue::Boolean(b) => Ok(Value::new_bool(ctx.clone(), b)),
        GlobalValue::Number(n) => Ok(Value::new_float(ctx.clone(), n)),
        GlobalValue::String(s) => s.as_str().into_js(ctx),
        GlobalValue::Data(data) => from_host(ctx, &data),
        GlobalValue::Object(module) => module_object(ctx, &module),
        GlobalValue::Function(func) => Ok(host_function(ctx, func)?.into_value()),
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

    fn api() -> HostApi {
        let mut api = HostApi::new();
        api.register_module(
            HostModuleBuilder::new("Vec")
                .function(
                    HostFunction::new("length", |args| {
                        let v = &args[0];
                        let x = v.get("x").and_then(|x| x.as_float()).unwrap_or(0.0);
                        let y = v.get("y").and_then(|y| y.as_float()).unwrap_or(0.0);
                        Ok(HostValue::Number((x * x + y * y).sqrt()))
                    })
                    .with_param("v", HostType::Table)
                    .with_return_type(HostType::Number),
                )
                .constant("origin", HostValue::table([("x", HostValue::Integer(0)), ("y", HostValue::Integer(0))]))
                .build(),
        );
        api
    }

    #[test]
    fn test_module_functions_and_constants() {
        let engine = JavascriptEngine::new(&api()).unwrap();
        engine.run_code("var len = Vec.length({ x: 3, y: 4 }); var ox = Vec.origin.x;");
        assert_eq!(engine.get_global("len").as_number(), Some(5.0));
        assert_eq!(engine.get_global("ox").as_number(), Some(0.0));
    }

    #[test]
    fn test_host_error_is_catchable_in_script() {
        let engine = JavascriptEngine::new(&api()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.errors().subscribe(move |e| sink.borrow_mut().push(e.kind));

        engine.run_code("var caught = ''; try { Vec.length(1); } catch (e) { caught = e.name; }");
        assert_eq!(engine.get_global("caught").as_string(), Some(HOST_ERROR_NAME.to_string()));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_thrown_string_is_runtime_error() {
        let engine = JavascriptEngine::new(&HostApi::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.errors().subscribe(move |e| sink.borrow_mut().push((e.kind, e.message.clone())));

        engine.run_code("throw 'custom failure';");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ScriptErrorKind::RuntimeError);
        assert!(seen[0].1.contains("custom failure"));
        assert!(seen[0].1.starts_with(&engine.chunk_name));
    }

    #[test]
    fn test_chunk_name_is_eval_filename() {
        let engine = JavascriptEngine::new(&HostApi::new()).unwrap();
        engine.run_code(
            "var trace = '';\n\
             function boom() { throw new Error('deep'); }\n\
             try { boom(); } catch (e) { trace = e.stack; }",
        );
        let trace = engine.get_global("trace").as_string().unwrap_or_default();
        assert!(trace.contains(&engine.chunk_name), "{}", trace);
        assert!(!trace.contains("eval_script"), "{}", trace);
    }

    #[test]
    fn test_nul_byte_in_source_is_syntax_error() {
        let engine = JavascriptEngine::new(&HostApi::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.errors().subscribe(move |e| sink.borrow_mut().push(e.kind));

        engine.run_code("var a = 1;\0");
        assert_eq!(*seen.borrow(), vec![ScriptErrorKind::SyntaxError]);
    }

    #[test]
    fn test_data_global_round_trip() {
        let engine = JavascriptEngine::new(&HostApi::new()).unwrap();
        let data = HostValue::table([
            ("name", HostValue::from("crate")),
            ("tags", HostValue::array(vec![HostValue::from("a"), HostValue::from("b")])),
        ]);
        engine.set_global("data", GlobalValue::Data(data.clone()));
        assert_eq!(engine.get_global("data").to_host_value(), Some(data));
    }
}
