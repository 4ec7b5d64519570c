//! Load-time trigger indexes.
//!
//! Every top-level script starts with an event-trigger block; the bus
//! indexes scripts by that trigger so raising an event is a map lookup,
//! not a scan. Key-pressed scripts index by resolved key code,
//! message scripts by message id, clone-start scripts by the original
//! object id. Scene-start scripts stay scene-filtered at dispatch time
//! because their scene is the owning object's, not a block parameter.

use std::sync::Arc;

use ahash::AHashMap;
use core_events::{KeyCode, resolve_key_param};
use core_model::{ObjectInfo, ParamValue, Script};
use tracing::{debug, warn};

/// A dispatchable script and the object that owns it.
#[derive(Debug, Clone)]
pub struct ScriptRef {
    pub object_id: String,
    pub script: Arc<Script>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    pub start: Vec<ScriptRef>,
    pub key_pressed: AHashMap<KeyCode, Vec<ScriptRef>>,
    pub stage_click: Vec<ScriptRef>,
    pub stage_click_canceled: Vec<ScriptRef>,
    pub object_click: Vec<ScriptRef>,
    pub object_click_canceled: Vec<ScriptRef>,
    pub message: AHashMap<String, Vec<ScriptRef>>,
    pub scene_start: Vec<ScriptRef>,
    pub clone_start: AHashMap<String, Vec<ScriptRef>>,
}

impl EventBus {
    /// Index every script of every object by its trigger block.
    pub fn build(objects: impl Iterator<Item = Arc<ObjectInfo>>) -> Self {
        let mut bus = Self::default();
        for info in objects {
            for script in &info.scripts {
                bus.index_script(&info.id, script);
            }
        }
        debug!(
            target: "engine.bus",
            start = bus.start.len(),
            keys = bus.key_pressed.len(),
            messages = bus.message.len(),
            "event bus built"
        );
        bus
    }

    fn index_script(&mut self, object_id: &str, script: &Script) {
        let Some(trigger) = script.blocks.first() else {
            return;
        };
        let entry = ScriptRef {
            object_id: object_id.to_owned(),
            script: Arc::new(script.clone()),
        };
        match trigger.opcode.as_str() {
            "when_run_button_click" => self.start.push(entry),
            "when_some_key_pressed" => {
                let Some(key) = first_literal(trigger).and_then(|k| resolve_key_param(&k)) else {
                    warn!(
                        target: "engine.bus",
                        object = %object_id,
                        block = %trigger.id,
                        "key trigger with unresolvable key; script unreachable"
                    );
                    return;
                };
                self.key_pressed.entry(key).or_default().push(entry);
            }
            "mouse_clicked" => self.stage_click.push(entry),
            // The editor writes the misspelled opcode; accept both.
            "mouse_click_cancled" | "mouse_click_canceled" => {
                self.stage_click_canceled.push(entry)
            }
            "when_object_click" => self.object_click.push(entry),
            "when_object_click_canceled" | "when_object_click_cancled" => {
                self.object_click_canceled.push(entry)
            }
            "when_message_cast" => {
                let Some(message_id) = first_literal(trigger) else {
                    warn!(
                        target: "engine.bus",
                        object = %object_id,
                        block = %trigger.id,
                        "message trigger without a message id; script unreachable"
                    );
                    return;
                };
                self.message.entry(message_id).or_default().push(entry);
            }
            "when_scene_start" => self.scene_start.push(entry),
            "when_clone_start" => self
                .clone_start
                .entry(object_id.to_owned())
                .or_default()
                .push(entry),
            other => {
                debug!(
                    target: "engine.bus",
                    object = %object_id,
                    opcode = %other,
                    "script does not start with a known trigger; never dispatched"
                );
            }
        }
    }
}

fn first_literal(trigger: &core_model::Block) -> Option<String> {
    trigger.params.iter().find_map(|p| match p {
        ParamValue::Text(s) => Some(s.clone()),
        ParamValue::Number(n) => Some(core_value::format_number(*n)),
        _ => None,
    })
}
