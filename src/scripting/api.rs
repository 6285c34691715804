// Tue Feb 10 2026 - Alex

use crate::scripting::error::HostError;
use crate::scripting::types::{HostType, HostValue};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

pub type HostCallback = Rc<dyn Fn(&[HostValue]) -> Result<HostValue, HostError>>;

/// Fixed-arity function exposed to scripts.
#[derive(Clone)]
pub struct HostFunction {
    pub name: String,
    pub params: Vec<(String, HostType)>,
    pub return_type: HostType,
    pub description: String,
    handler: HostCallback,
}

impl HostFunction {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: HostType::Void,
            description: String::new(),
            handler: Rc::new(handler),
        }
    }

    pub fn with_param(mut self, name: &str, ty: HostType) -> Self {
        self.params.push((name.to_string(), ty));
        self
    }

    pub fn with_return_type(mut self, ty: HostType) -> Self {
        self.return_type = ty;
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Checks arity and declared parameter types, then runs the handler.
    pub fn call(&self, args: &[HostValue]) -> Result<HostValue, HostError> {
        if args.len() != self.params.len() {
            return Err(HostError::Arity {
                function: self.name.clone(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }

        for (index, ((_, ty), arg)) in self.params.iter().zip(args).enumerate() {
            if !ty.accepts(arg) {
                return Err(HostError::ArgumentType {
                    function: self.name.clone(),
                    index,
                    expected: ty.to_string(),
                    actual: arg.type_name().to_string(),
                });
            }
        }

        (self.handler)(args)
    }

    pub fn help_text(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect();

        let mut help = format!("{}({}) -> {}", self.name, params.join(", "), self.return_type);
        if !self.description.is_empty() {
            help.push_str(&format!("\n    {}", self.description));
        }
        help
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish()
    }
}

/// Object-valued global grouping related functions and constants.
#[derive(Clone, Debug)]
pub struct HostModule {
    pub name: String,
    pub description: String,
    pub functions: IndexMap<String, HostFunction>,
    pub constants: IndexMap<String, HostValue>,
}

impl HostModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            functions: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&HostFunction> {
        self.functions.get(name)
    }

    pub fn help_text(&self) -> String {
        let mut help = format!("Module: {}\n", self.name);
        if !self.description.is_empty() {
            help.push_str(&format!("{}\n", self.description));
        }

        for func in self.functions.values() {
            help.push_str(&format!("  {}.{}\n", self.name, func.help_text()));
        }
        for (name, value) in &self.constants {
            help.push_str(&format!("  {}.{} = {}\n", self.name, name, value));
        }
        help
    }
}

pub struct HostModuleBuilder {
    module: HostModule,
}

impl HostModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            module: HostModule::new(name),
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.module.description = desc.to_string();
        self
    }

    pub fn function(mut self, func: HostFunction) -> Self {
        self.module.functions.insert(func.name.clone(), func);
        self
    }

    pub fn constant(mut self, name: &str, value: HostValue) -> Self {
        self.module.constants.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> HostModule {
        self.module
    }
}

/// Name to integer table imported as a global.
#[derive(Clone, Debug, PartialEq)]
pub struct HostEnum {
    pub name: String,
    pub variants: IndexMap<String, i64>,
}

impl HostEnum {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variants: IndexMap::new(),
        }
    }

    pub fn from_pairs<'a>(name: &str, pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let mut host_enum = Self::new(name);
        for (variant, value) in pairs {
            host_enum.variants.insert(variant.to_string(), value);
        }
        host_enum
    }

    pub fn variant(mut self, name: &str, value: i64) -> Self {
        self.variants.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.variants.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn to_value(&self) -> HostValue {
        HostValue::Table(
            self.variants
                .iter()
                .map(|(k, v)| (k.clone(), HostValue::Integer(*v)))
                .collect(),
        )
    }
}

/// Everything installed into a fresh engine. Engines copy what they need, so one
/// `HostApi` can seed any number of them.
#[derive(Clone, Default, Debug)]
pub struct HostApi {
    functions: IndexMap<String, HostFunction>,
    modules: IndexMap<String, HostModule>,
    enums: IndexMap<String, HostEnum>,
}

impl HostApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + 'static,
    {
        self.functions.insert(name.to_string(), HostFunction::new(name, handler));
    }

    pub fn register_function_with_meta(&mut self, func: HostFunction) {
        self.functions.insert(func.name.clone(), func);
    }

    pub fn register_module(&mut self, module: HostModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn register_enum(&mut self, host_enum: HostEnum) {
        self.enums.insert(host_enum.name.clone(), host_enum);
    }

    pub fn functions(&self) -> impl Iterator<Item = &HostFunction> {
        self.functions.values()
    }

    pub fn modules(&self) -> impl Iterator<Item = &HostModule> {
        self.modules.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &HostEnum> {
        self.enums.values()
    }

    fn lookup(&self, name: &str) -> Option<&HostFunction> {
        if let Some(func) = self.functions.get(name) {
            return Some(func);
        }

        let (module_name, func_name) = name.split_once('.')?;
        self.modules.get(module_name)?.function(func_name)
    }

    /// Calls `name` or `Module.name` directly from the host side.
    pub fn call(&self, name: &str, args: &[HostValue]) -> Result<HostValue, HostError> {
        self.lookup(name)
            .ok_or_else(|| HostError::Custom(format!("Function '{}' not found", name)))?
            .call(args)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        for module in self.modules.values() {
            for func_name in module.functions.keys() {
                names.push(format!("{}.{}", module.name, func_name));
            }
        }
        names.sort();
        names
    }

    pub fn get_help(&self, name: &str) -> Option<String> {
        self.lookup(name).map(|f| f.help_text())
    }

    pub fn help_text(&self) -> String {
        let mut help = String::from("Functions:\n");
        for func in self.functions.values() {
            help.push_str(&format!("  {}\n", func.help_text()));
        }
        for module in self.modules.values() {
            help.push('\n');
            help.push_str(&module.help_text());
        }
        for host_enum in self.enums.values() {
            help.push_str(&format!("\nEnum: {} ({} values)\n", host_enum.name, host_enum.len()));
            for (name, value) in &host_enum.variants {
                help.push_str(&format!("  {}.{} = {}\n", host_enum.name, name, value));
            }
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> HostFunction {
        HostFunction::new("add", |args| {
            Ok(HostValue::Number(
                args[0].as_float().unwrap_or(0.0) + args[1].as_float().unwrap_or(0.0),
            ))
        })
        .with_param("a", HostType::Number)
        .with_param("b", HostType::Number)
        .with_return_type(HostType::Number)
        .with_description("Adds two numbers")
    }

    #[test]
    fn test_host_function_checks_arity_and_types() {
        let func = add();
        assert_eq!(
            func.call(&[HostValue::Integer(1), HostValue::Number(2.5)]),
            Ok(HostValue::Number(3.5))
        );
        assert!(matches!(func.call(&[HostValue::Integer(1)]), Err(HostError::Arity { expected: 2, actual: 1, .. })));
        assert!(matches!(
            func.call(&[HostValue::Integer(1), HostValue::from("x")]),
            Err(HostError::ArgumentType { index: 1, .. })
        ));
    }

    #[test]
    fn test_help_text() {
        let help = add().help_text();
        assert!(help.starts_with("add(a: number, b: number) -> number"));
        assert!(help.contains("Adds two numbers"));
    }

    #[test]
    fn test_module_lookup() {
        let mut api = HostApi::new();
        api.register_module(
            HostModuleBuilder::new("Math")
                .description("Math helpers")
                .function(add())
                .constant("pi", HostValue::Number(std::f64::consts::PI))
                .build(),
        );
        api.register_function("ping", |_| Ok(HostValue::from("pong")));

        assert!(api.has_function("Math.add"));
        assert!(api.has_function("ping"));
        assert!(!api.has_function("Math.sub"));
        assert_eq!(api.call("ping", &[]), Ok(HostValue::from("pong")));
        assert_eq!(api.function_names(), vec!["Math.add".to_string(), "ping".to_string()]);
        assert!(api.help_text().contains("Math.pi"));
    }

    #[test]
    fn test_enum_table() {
        let keys = HostEnum::from_pairs("Key", [("A", 97), ("B", 98)]).variant("C", 99);
        assert_eq!(keys.get("B"), Some(98));
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.to_value().get("C"), Some(&HostValue::Integer(99)));
    }
}
