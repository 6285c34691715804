// Fri Feb 13 2026 - Alex

use crate::scripting::api::HostApi;
use crate::scripting::engine::{ScriptEngine, ScriptLanguage, ScriptObject};
use crate::scripting::error::{EngineInitError, ErrorChannel};
use crate::scripting::types::HostValue;
use log::{debug, trace};

pub const DEFAULT_UPDATE_FUNCTION: &str = "Update";
pub const DEFAULT_EVENT_TABLE: &str = "Events";

/// Drives one script through its lifetime: run the source once, then call the
/// per-frame entry point and dispatch events to handlers the script registered.
///
/// The error channel outlives individual engines, so subscribers attached before
/// `start` see every failure across restarts.
pub struct ScriptBehaviour {
    language: ScriptLanguage,
    source: String,
    api: HostApi,
    update_function: String,
    event_table: String,
    errors: ErrorChannel,
    engine: Option<ScriptObject>,
}

impl ScriptBehaviour {
    pub fn new(language: ScriptLanguage, source: impl Into<String>, api: HostApi) -> Self {
        Self {
            language,
            source: source.into(),
            api,
            update_function: DEFAULT_UPDATE_FUNCTION.to_string(),
            event_table: DEFAULT_EVENT_TABLE.to_string(),
            errors: ErrorChannel::new(),
            engine: None,
        }
    }

    pub fn with_update_function(mut self, name: &str) -> Self {
        self.update_function = name.to_string();
        self
    }

    pub fn with_event_table(mut self, name: &str) -> Self {
        self.event_table = name.to_string();
        self
    }

    pub fn language(&self) -> ScriptLanguage {
        self.language
    }

    pub fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    pub fn engine(&self) -> Option<&ScriptObject> {
        self.engine.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    /// Builds a fresh engine and runs the source once. A running behaviour is
    /// restarted from scratch.
    pub fn start(&mut self) -> Result<(), EngineInitError> {
        let engine = ScriptObject::with_errors(self.language, &self.api, self.errors.clone())?;
        engine.run_code(&self.source);
        debug!("Started {} behaviour as script {}", self.language, engine.script_id());
        self.engine = Some(engine);
        Ok(())
    }

    pub fn update(&self) {
        let Some(engine) = &self.engine else {
            return;
        };
        if engine.has_function(&self.update_function) {
            engine.call(&self.update_function, &[]);
        }
    }

    /// Calls the handler stored under `event_id` in the event table. Missing tables,
    /// missing entries and non-function entries are ignored.
    pub fn trigger(&self, event_id: i64) {
        let Some(engine) = &self.engine else {
            return;
        };

        let events = engine.get_global(&self.event_table);
        if events.is_null() {
            trace!("No {} table in script {}", self.event_table, engine.script_id());
            return;
        }

        let handler = events.index(event_id);
        if handler.is_function() {
            handler.call_as_function(&[HostValue::Integer(event_id)]);
        } else {
            trace!("No handler for event {} in script {}", event_id, engine.script_id());
        }
    }

    pub fn stop(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!("Stopped script {}", engine.script_id());
        }
    }
}

impl std::fmt::Debug for ScriptBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBehaviour")
            .field("language", &self.language)
            .field("update_function", &self.update_function)
            .field("event_table", &self.event_table)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::error::ScriptErrorKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    const COUNTER_JS: &str = "var ticks = 0; var hits = 0;\n\
        function Update() { ticks += 1; }\n\
        var Events = { 3: function (id) { hits += id; }, 4: 'not a function' };";

    const COUNTER_LUA: &str = "ticks = 0 hits = 0\n\
        function Update() ticks = ticks + 1 end\n\
        Events = { [3] = function (id) hits = hits + id end, [4] = 'not a function' }";

    fn sources() -> [(ScriptLanguage, &'static str); 2] {
        [(ScriptLanguage::Javascript, COUNTER_JS), (ScriptLanguage::Lua, COUNTER_LUA)]
    }

    fn watch(behaviour: &ScriptBehaviour) -> Rc<RefCell<Vec<ScriptErrorKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        behaviour.errors().subscribe(move |e| sink.borrow_mut().push(e.kind));
        seen
    }

    fn number(behaviour: &ScriptBehaviour, name: &str) -> Option<f64> {
        behaviour.engine().and_then(|e| e.get_global(name).as_number())
    }

    #[test]
    fn test_update_runs_each_frame() {
        for (language, source) in sources() {
            let mut behaviour = ScriptBehaviour::new(language, source, HostApi::new());
            behaviour.start().unwrap();
            for _ in 0..3 {
                behaviour.update();
            }
            assert_eq!(number(&behaviour, "ticks"), Some(3.0), "{}", language);
        }
    }

    #[test]
    fn test_trigger_dispatches_and_ignores_missing() {
        for (language, source) in sources() {
            let mut behaviour = ScriptBehaviour::new(language, source, HostApi::new());
            let seen = watch(&behaviour);
            behaviour.start().unwrap();

            behaviour.trigger(3);
            behaviour.trigger(4);
            behaviour.trigger(99);
            behaviour.trigger(3);

            assert_eq!(number(&behaviour, "hits"), Some(6.0), "{}", language);
            assert!(seen.borrow().is_empty(), "{}", language);
        }
    }

    #[test]
    fn test_script_without_entry_points_is_quiet() {
        for language in [ScriptLanguage::Javascript, ScriptLanguage::Lua] {
            let mut behaviour = ScriptBehaviour::new(language, "", HostApi::new());
            let seen = watch(&behaviour);
            behaviour.start().unwrap();
            behaviour.update();
            behaviour.trigger(1);
            assert!(seen.borrow().is_empty(), "{}", language);
        }
    }

    #[test]
    fn test_failing_update_keeps_running() {
        let cases = [
            (ScriptLanguage::Javascript, "var n = 0; function Tick() { n += 1; throw new Error('bad'); }"),
            (ScriptLanguage::Lua, "n = 0 function Tick() n = n + 1 error('bad') end"),
        ];
        for (language, source) in cases {
            let mut behaviour = ScriptBehaviour::new(language, source, HostApi::new()).with_update_function("Tick");
            let seen = watch(&behaviour);
            behaviour.start().unwrap();
            behaviour.update();
            behaviour.update();
            assert_eq!(number(&behaviour, "n"), Some(2.0), "{}", language);
            assert_eq!(
                *seen.borrow(),
                vec![ScriptErrorKind::RuntimeError, ScriptErrorKind::RuntimeError],
                "{}",
                language
            );
        }
    }

    #[test]
    fn test_custom_event_table_and_restart() {
        let mut behaviour = ScriptBehaviour::new(
            ScriptLanguage::Lua,
            "count = 0 Zones = { [7] = function () count = count + 1 end }",
            HostApi::new(),
        )
        .with_event_table("Zones");

        behaviour.start().unwrap();
        behaviour.trigger(7);
        assert_eq!(number(&behaviour, "count"), Some(1.0));

        behaviour.start().unwrap();
        assert_eq!(number(&behaviour, "count"), Some(0.0));

        behaviour.stop();
        assert!(!behaviour.is_running());
        behaviour.trigger(7);
        behaviour.update();
    }
}
