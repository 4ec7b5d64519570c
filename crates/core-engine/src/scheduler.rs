//! Per-tick thread scheduling: wait expiry and slice execution.
//!
//! Ordering contract: entities iterate in draw order (scene-filtered),
//! threads within an entity in dispatch-sequence order. This is
//! observable whenever several scripts mutate shared state in one tick,
//! so it is asserted by tests, not just convention.

use core_actions::{SliceResult, run_slice};
use core_state::{ThreadId, WaitKind, World};
use tracing::trace;

/// Clear expired waits and run one slice per runnable thread.
pub(crate) fn run_ready_threads(world: &mut World) {
    let now = world.now_ms();
    for (entity_id, thread_id) in collect_threads(world) {
        enum Status {
            Gone,
            Terminated,
            Blocked,
            Ready,
        }
        let status = match world
            .entity(&entity_id)
            .and_then(|e| e.threads.get(&thread_id))
        {
            None => Status::Gone,
            Some(state) if state.terminate_requested => Status::Terminated,
            Some(state) => match &state.wait {
                None => Status::Ready,
                Some(wait) => {
                    let cleared = match &wait.kind {
                        WaitKind::ExplicitSecond | WaitKind::BlockInternal => now >= wait.end_ms,
                        WaitKind::SoundFinish { sound_id } => {
                            !world.audio.is_playing(&entity_id, sound_id)
                        }
                        // Cleared by the input drain on submission.
                        WaitKind::TextInput => false,
                    };
                    if cleared { Status::Ready } else { Status::Blocked }
                }
            },
        };

        match status {
            Status::Gone | Status::Blocked => continue,
            Status::Terminated => {
                remove_thread(world, &entity_id, thread_id);
            }
            Status::Ready => {
                if let Some(state) = world
                    .entity_mut(&entity_id)
                    .and_then(|e| e.threads.get_mut(&thread_id))
                {
                    state.clear_wait();
                }
                trace!(target: "engine.sched", entity = %entity_id, thread = thread_id.0, "running slice");
                if run_slice(world, &entity_id, thread_id) == SliceResult::Finished {
                    remove_thread(world, &entity_id, thread_id);
                }
            }
        }
    }
}

/// Snapshot of `(entity, thread)` pairs in scheduling order. Taken up
/// front because slices create and destroy threads while we iterate;
/// threads dispatched during this tick run first next tick.
fn collect_threads(world: &World) -> Vec<(String, ThreadId)> {
    let mut out = Vec::new();
    for entity_id in &world.draw_order {
        let Some(entity) = world.entity(entity_id) else {
            continue;
        };
        // BTreeMap iteration is ascending thread id = dispatch order.
        for thread_id in entity.threads.keys() {
            out.push((entity_id.clone(), *thread_id));
        }
    }
    out
}

fn remove_thread(world: &mut World, entity_id: &str, thread_id: ThreadId) {
    if let Some(entity) = world.entity_mut(entity_id) {
        entity.threads.remove(&thread_id);
    }
}

/// Expire timed dialogs.
pub(crate) fn update_dialogs(world: &mut World) {
    let now = world.now_ms();
    let ids: Vec<String> = world.draw_order.clone();
    for id in ids {
        if let Some(entity) = world.entity_mut(&id) {
            let expired = entity
                .dialog
                .as_ref()
                .is_some_and(|d| d.duration_ms > 0 && now >= d.start_ms + d.duration_ms);
            if expired {
                entity.dialog = None;
            }
        }
    }
}
