//! Sound statements. Playback is owner-scoped on the audio backend;
//! volume and speed are a single global state, clamped here and pushed
//! to the backend. The `_wait` variants set a sound-finish wait that the
//! scheduler clears once the backend stops reporting the sound.

use core_model::{Block, ScriptError, SoundFile};
use core_state::{ThreadId, WaitKind, World};
use tracing::warn;

use super::{ExecOutcome, param_number, param_string, require_entity};
use crate::executor::thread_state_mut;

pub(super) fn execute(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
) -> Result<ExecOutcome, ScriptError> {
    require_entity(world, object_id, block)?;
    match block.opcode.as_str() {
        "sound_something_with_block" | "sound_something_wait_with_block" => {
            let Some(sound) = resolve_sound(world, object_id, block, 0)? else {
                return Ok(ExecOutcome::Completed);
            };
            let (volume, speed) = (world.sound.volume, world.sound.speed);
            world.audio.play(object_id, &sound.id, volume, speed);
            finish_or_wait(world, object_id, thread_id, block, &sound.id)
        }
        "sound_something_second_with_block" | "sound_something_second_wait_with_block" => {
            let Some(sound) = resolve_sound(world, object_id, block, 0)? else {
                return Ok(ExecOutcome::Completed);
            };
            let seconds = param_number(world, object_id, block, 1)?.max(0.0);
            let (volume, speed) = (world.sound.volume, world.sound.speed);
            world
                .audio
                .play_for(object_id, &sound.id, seconds, volume, speed);
            finish_or_wait(world, object_id, thread_id, block, &sound.id)
        }
        "sound_from_to" | "sound_from_to_and_wait" => {
            let Some(sound) = resolve_sound(world, object_id, block, 0)? else {
                return Ok(ExecOutcome::Completed);
            };
            let from_s = param_number(world, object_id, block, 1)?.max(0.0);
            let to_s = param_number(world, object_id, block, 2)?.max(0.0);
            if to_s < from_s {
                // Reversed playback is not in the contract; surfacing the
                // authoring mistake beats silently swapping the bounds.
                warn!(
                    target: "exec.sound",
                    object = %object_id,
                    sound = %sound.id,
                    from_s,
                    to_s,
                    "segment end precedes start; nothing plays"
                );
                return Ok(ExecOutcome::Completed);
            }
            let (volume, speed) = (world.sound.volume, world.sound.speed);
            world
                .audio
                .play_segment(object_id, &sound.id, from_s, to_s, volume, speed);
            finish_or_wait(world, object_id, thread_id, block, &sound.id)
        }
        "sound_volume_change" => {
            let delta = param_number(world, object_id, block, 0)? / 100.0;
            world.sound.volume = (world.sound.volume + delta).clamp(0.0, 1.0);
            let volume = world.sound.volume;
            world.audio.set_volume(volume);
            Ok(ExecOutcome::Completed)
        }
        "sound_volume_set" => {
            // Only the _change variant clamps; a direct set passes
            // through untouched.
            let volume = param_number(world, object_id, block, 0)? / 100.0;
            world.sound.volume = volume;
            world.audio.set_volume(volume);
            Ok(ExecOutcome::Completed)
        }
        "sound_speed_change" => {
            let delta = param_number(world, object_id, block, 0)? / 100.0;
            world.sound.speed = (world.sound.speed + delta).clamp(0.5, 2.0);
            let speed = world.sound.speed;
            world.audio.set_speed(speed);
            Ok(ExecOutcome::Completed)
        }
        "sound_speed_set" => {
            let speed = param_number(world, object_id, block, 0)? / 100.0;
            world.sound.speed = speed;
            world.audio.set_speed(speed);
            Ok(ExecOutcome::Completed)
        }
        "sound_silent_all" => {
            let scope = param_string(world, object_id, block, 0)?;
            match scope.as_str() {
                "thisOnly" => world.audio.stop(object_id),
                "other_objects" => world.audio.stop_all_except(object_id),
                _ => world.audio.stop_all(),
            }
            Ok(ExecOutcome::Completed)
        }
        "play_bgm" => {
            let Some(sound) = resolve_sound(world, object_id, block, 0)? else {
                return Ok(ExecOutcome::Completed);
            };
            world.audio.stop_bgm();
            let volume = world.sound.volume;
            world.audio.play_bgm(&sound.id, volume);
            world.sound.bgm = Some(sound.id);
            Ok(ExecOutcome::Completed)
        }
        other => unreachable!("non-sound opcode routed to sound: {other}"),
    }
}

/// Wait variants suspend until the backend reports the sound done;
/// fire-and-forget variants complete immediately.
fn finish_or_wait(
    world: &mut World,
    object_id: &str,
    thread_id: ThreadId,
    block: &Block,
    sound_id: &str,
) -> Result<ExecOutcome, ScriptError> {
    if !block.opcode.contains("wait") {
        return Ok(ExecOutcome::Completed);
    }
    let now = world.now_ms();
    if let Some(state) = thread_state_mut(world, object_id, thread_id) {
        state.set_wait(
            WaitKind::SoundFinish {
                sound_id: sound_id.to_owned(),
            },
            now,
            &block.id,
        );
    }
    Ok(ExecOutcome::Suspended)
}

/// Look the sound up in the owner's authored sound table by id or name.
/// A miss is a WARN no-op, not an error.
fn resolve_sound(
    world: &mut World,
    object_id: &str,
    block: &Block,
    index: usize,
) -> Result<Option<SoundFile>, ScriptError> {
    let key = param_string(world, object_id, block, index)?;
    let found = world.entity(object_id).and_then(|e| {
        e.info
            .sounds
            .iter()
            .find(|s| s.id == key || s.name == key)
            .cloned()
    });
    if found.is_none() {
        warn!(target: "exec.sound", object = %object_id, sound = %key, "sound not found");
    }
    Ok(found)
}
