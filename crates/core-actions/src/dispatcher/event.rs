//! Event-raising statements. Messages queue on the world and fan out at
//! the start of the next tick; scene transitions are deferred to the
//! tick boundary so the current slice (and the rest of this tick's
//! slices) complete against a stable scene.

use core_events::InternalEvent;
use core_model::{Block, ScriptError};
use core_state::{SceneRequest, World};
use tracing::warn;

use super::{ExecOutcome, param_string};

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    match block.opcode.as_str() {
        "message_cast" => {
            let message_id = param_string(world, object_id, block, 0)?;
            if message_id.is_empty() {
                warn!(target: "exec.event", object = %object_id, "message_cast with an empty message id");
            } else {
                world
                    .pending_internal
                    .push(InternalEvent::Message(message_id));
            }
        }
        "start_scene" => {
            let scene_id = param_string(world, object_id, block, 0)?;
            if world.scene_exists(&scene_id) {
                world.pending_scene = Some(SceneRequest::Goto(scene_id));
            } else {
                warn!(target: "exec.event", object = %object_id, scene = %scene_id, "start_scene: unknown scene");
            }
        }
        "start_neighbor_scene" => {
            let which = param_string(world, object_id, block, 0)?;
            world.pending_scene = Some(match which.as_str() {
                "prev" => SceneRequest::Prev,
                _ => SceneRequest::Next,
            });
        }
        other => unreachable!("non-event opcode routed to event: {other}"),
    }
    Ok(ExecOutcome::Completed)
}
