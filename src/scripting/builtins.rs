// Fri Feb 13 2026 - Alex

use crate::scripting::api::{HostApi, HostEnum, HostFunction, HostModule, HostModuleBuilder};
use crate::scripting::error::HostError;
use crate::scripting::types::{HostType, HostValue};
use ahash::AHashSet;
use indexmap::IndexMap;
use log::{error, info, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);
    pub const UP: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Reads `{ x, y, z }`. Missing components are zero.
    pub fn from_value(value: &HostValue) -> Option<Self> {
        let table = value.as_table()?;
        let component = |name: &str| table.get(name).and_then(|v| v.as_float()).unwrap_or(0.0);
        Some(Self::new(component("x"), component("y"), component("z")))
    }

    pub fn to_value(self) -> HostValue {
        HostValue::table([
            ("x", HostValue::Number(self.x)),
            ("y", HostValue::Number(self.y)),
            ("z", HostValue::Number(self.z)),
        ])
    }

    pub fn add(self, other: Vector3) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vector3) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vector3) -> f64 {
        self.sub(other).length()
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

macro_rules! key_codes {
    ($($name:ident = $code:expr),* $(,)?) => {
        /// Subset of the game's key codes, numbered as the engine numbers them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeyCode {
            $($name = $code),*
        }

        impl KeyCode {
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$name),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(KeyCode::$name => stringify!($name)),*
                }
            }
        }
    };
}

key_codes! {
    None = 0,
    Backspace = 8,
    Tab = 9,
    Return = 13,
    Escape = 27,
    Space = 32,
    Alpha0 = 48,
    Alpha1 = 49,
    Alpha2 = 50,
    Alpha3 = 51,
    Alpha4 = 52,
    Alpha5 = 53,
    Alpha6 = 54,
    Alpha7 = 55,
    Alpha8 = 56,
    Alpha9 = 57,
    A = 97,
    D = 100,
    E = 101,
    F = 102,
    Q = 113,
    R = 114,
    S = 115,
    W = 119,
    UpArrow = 273,
    DownArrow = 274,
    RightArrow = 275,
    LeftArrow = 276,
    LeftShift = 304,
    LeftControl = 306,
    Mouse0 = 323,
    Mouse1 = 324,
}

impl KeyCode {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<KeyCode> {
        KeyCode::ALL.iter().copied().find(|k| k.code() == code)
    }

    pub fn from_name(name: &str) -> Option<KeyCode> {
        KeyCode::ALL.iter().copied().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    pub fn host_enum() -> HostEnum {
        HostEnum::from_pairs("KeyCode", KeyCode::ALL.iter().map(|k| (k.name(), k.code())))
    }
}

#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: AHashSet<i64>,
}

impl InputState {
    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key.code());
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key.code());
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_down(&self, code: i64) -> bool {
        self.held.contains(&code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelObject {
    pub id: u64,
    pub prefab: String,
    pub position: Vector3,
    pub rotation: Vector3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// In-memory stand-in for the running level.
#[derive(Debug)]
pub struct GameWorld {
    objects: IndexMap<u64, LevelObject>,
    next_id: u64,
    pub input: InputState,
    time: f64,
    delta_time: f64,
    frame: u64,
    output: Vec<LogEntry>,
}

pub type SharedWorld = Rc<RefCell<GameWorld>>;

#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub frame: u64,
    pub time: f64,
    pub objects: Vec<LevelObject>,
    pub output: Vec<LogEntry>,
}

impl Default for GameWorld {
    fn default() -> Self {
        Self {
            objects: IndexMap::new(),
            next_id: 1,
            input: InputState::default(),
            time: 0.0,
            delta_time: 1.0 / 60.0,
            frame: 0,
            output: Vec::new(),
        }
    }
}

impl GameWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedWorld {
        Rc::new(RefCell::new(self))
    }

    pub fn with_delta_time(mut self, delta_time: f64) -> Self {
        self.delta_time = delta_time;
        self
    }

    pub fn spawn(&mut self, prefab: &str, position: Vector3) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(
            id,
            LevelObject {
                id,
                prefab: prefab.to_string(),
                position,
                rotation: Vector3::ZERO,
            },
        );
        id
    }

    /// First live object spawned from `prefab`.
    pub fn find(&self, prefab: &str) -> Option<u64> {
        self.objects.values().find(|o| o.prefab == prefab).map(|o| o.id)
    }

    pub fn destroy(&mut self, id: u64) -> bool {
        self.objects.shift_remove(&id).is_some()
    }

    pub fn object(&self, id: u64) -> Option<&LevelObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: u64) -> Option<&mut LevelObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &LevelObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn advance(&mut self) {
        self.frame += 1;
        self.time += self.delta_time;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => info!("[script] {}", message),
            LogLevel::Warning => warn!("[script] {}", message),
            LogLevel::Error => error!("[script] {}", message),
        }
        self.output.push(LogEntry { level, message });
    }

    pub fn output(&self) -> &[LogEntry] {
        &self.output
    }

    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            frame: self.frame,
            time: self.time,
            objects: self.objects.values().cloned().collect(),
            output: self.output.clone(),
        }
    }
}

fn object_id(value: &HostValue) -> u64 {
    value.as_int().map(|id| id.max(0) as u64).unwrap_or(0)
}

fn missing_object(id: u64) -> HostError {
    HostError::Custom(format!("No level object with id {}", id))
}

fn vector_arg(value: &HostValue) -> Vector3 {
    Vector3::from_value(value).unwrap_or_default()
}

/// Installs the game surface: object and input globals, the `Vector3`, `Time` and
/// `Log` modules, and the `KeyCode` enum.
pub fn register_builtins(api: &mut HostApi, world: &SharedWorld) {
    register_world_functions(api, world);
    api.register_module(create_vector_module());
    api.register_module(create_time_module(world));
    api.register_module(create_log_module(world));
    api.register_enum(KeyCode::host_enum());
}

fn register_world_functions(api: &mut HostApi, world: &SharedWorld) {
    let w = world.clone();
    api.register_function_with_meta(
        HostFunction::new("print", move |args| {
            w.borrow_mut().log(LogLevel::Info, args[0].to_string());
            Ok(HostValue::Nil)
        })
        .with_param("message", HostType::Any)
        .with_description("Writes a line to the script log"),
    );

    let w = world.clone();
    api.register_function_with_meta(
        HostFunction::new("spawnObject", move |args| {
            let prefab = args[0].as_str().unwrap_or_default();
            let id = w.borrow_mut().spawn(prefab, vector_arg(&args[1]));
            Ok(HostValue::Integer(id as i64))
        })
        .with_param("prefab", HostType::String)
        .with_param("position", HostType::Table)
        .with_return_type(HostType::Integer)
        .with_description("Spawns a prefab and returns its object id"),
    );

    let w = world.clone();
    api.register_function_with_meta(
        HostFunction::new("findObject", move |args| {
            let prefab = args[0].as_str().unwrap_or_default();
            Ok(HostValue::from(w.borrow().find(prefab).map(|id| id as i64)))
        })
        .with_param("prefab", HostType::String)
        .with_return_type(HostType::Any)
        .with_description("Id of the first object spawned from a prefab, or nil"),
    );

    let w = world.clone();
    api.register_function_with_meta(
        HostFunction::new("destroyObject", move |args| {
            Ok(HostValue::Boolean(w.borrow_mut().destroy(object_id(&args[0]))))
        })
        .with_param("id", HostType::Integer)
        .with_return_type(HostType::Boolean),
    );

    for (getter, setter, pick) in [
        ("getPosition", "setPosition", Transform::Position),
        ("getRotation", "setRotation", Transform::Rotation),
    ] {
        let w = world.clone();
        api.register_function_with_meta(
            HostFunction::new(getter, move |args| {
                let id = object_id(&args[0]);
                let world = w.borrow();
                let object = world.object(id).ok_or_else(|| missing_object(id))?;
                Ok(pick.read(object).to_value())
            })
            .with_param("id", HostType::Integer)
            .with_return_type(HostType::Table),
        );

        let w = world.clone();
        api.register_function_with_meta(
            HostFunction::new(setter, move |args| {
                let id = object_id(&args[0]);
                let mut world = w.borrow_mut();
                let object = world.object_mut(id).ok_or_else(|| missing_object(id))?;
                pick.write(object, vector_arg(&args[1]));
                Ok(HostValue::Nil)
            })
            .with_param("id", HostType::Integer)
            .with_param("value", HostType::Table),
        );
    }

    let w = world.clone();
    api.register_function_with_meta(
        HostFunction::new("isKeyDown", move |args| {
            Ok(HostValue::Boolean(w.borrow().input.is_down(args[0].as_int().unwrap_or(0))))
        })
        .with_param("key", HostType::Integer)
        .with_return_type(HostType::Boolean)
        .with_description("True while the key is held. Pass a KeyCode value"),
    );
}

#[derive(Clone, Copy)]
enum Transform {
    Position,
    Rotation,
}

impl Transform {
    fn read(self, object: &LevelObject) -> Vector3 {
        match self {
            Transform::Position => object.position,
            Transform::Rotation => object.rotation,
        }
    }

    fn write(self, object: &mut LevelObject, value: Vector3) {
        match self {
            Transform::Position => object.position = value,
            Transform::Rotation => object.rotation = value,
        }
    }
}

fn create_vector_module() -> HostModule {
    let binary = |name: &str, op: fn(Vector3, Vector3) -> Vector3| {
        HostFunction::new(name, move |args| Ok(op(vector_arg(&args[0]), vector_arg(&args[1])).to_value()))
            .with_param("a", HostType::Table)
            .with_param("b", HostType::Table)
            .with_return_type(HostType::Table)
    };

    HostModuleBuilder::new("Vector3")
        .description("Vector helpers. Vectors are { x, y, z } tables")
        .function(
            HostFunction::new("new", |args| {
                let c = |i: usize| args[i].as_float().unwrap_or(0.0);
                Ok(Vector3::new(c(0), c(1), c(2)).to_value())
            })
            .with_param("x", HostType::Number)
            .with_param("y", HostType::Number)
            .with_param("z", HostType::Number)
            .with_return_type(HostType::Table),
        )
        .function(binary("add", Vector3::add))
        .function(binary("sub", Vector3::sub))
        .function(
            HostFunction::new("scale", |args| {
                Ok(vector_arg(&args[0]).scale(args[1].as_float().unwrap_or(1.0)).to_value())
            })
            .with_param("v", HostType::Table)
            .with_param("factor", HostType::Number)
            .with_return_type(HostType::Table),
        )
        .function(
            HostFunction::new("length", |args| Ok(HostValue::Number(vector_arg(&args[0]).length())))
                .with_param("v", HostType::Table)
                .with_return_type(HostType::Number),
        )
        .function(
            HostFunction::new("distance", |args| {
                Ok(HostValue::Number(vector_arg(&args[0]).distance(vector_arg(&args[1]))))
            })
            .with_param("a", HostType::Table)
            .with_param("b", HostType::Table)
            .with_return_type(HostType::Number),
        )
        .constant("zero", Vector3::ZERO.to_value())
        .constant("one", Vector3::ONE.to_value())
        .constant("up", Vector3::UP.to_value())
        .constant("forward", Vector3::FORWARD.to_value())
        .build()
}

fn create_time_module(world: &SharedWorld) -> HostModule {
    let (t, dt, f) = (world.clone(), world.clone(), world.clone());
    HostModuleBuilder::new("Time")
        .description("Frame clock")
        .function(
            HostFunction::new("time", move |_| Ok(HostValue::Number(t.borrow().time())))
                .with_return_type(HostType::Number),
        )
        .function(
            HostFunction::new("deltaTime", move |_| Ok(HostValue::Number(dt.borrow().delta_time())))
                .with_return_type(HostType::Number),
        )
        .function(
            HostFunction::new("frameCount", move |_| Ok(HostValue::Integer(f.borrow().frame() as i64)))
                .with_return_type(HostType::Integer),
        )
        .build()
}

fn create_log_module(world: &SharedWorld) -> HostModule {
    let mut builder = HostModuleBuilder::new("Log").description("Leveled script log");
    for (name, level) in [("info", LogLevel::Info), ("warn", LogLevel::Warning), ("error", LogLevel::Error)] {
        let w = world.clone();
        builder = builder.function(
            HostFunction::new(name, move |args| {
                w.borrow_mut().log(level, args[0].to_string());
                Ok(HostValue::Nil)
            })
            .with_param("message", HostType::Any),
        );
    }
    builder.build()
}
