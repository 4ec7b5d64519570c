//! Audio contract, consumed only. Playback is owner-scoped: each stage
//! object owns at most one active effect-sound slot, plus one global BGM
//! slot. The engine polls `is_playing` to clear sound-finish waits.

use std::collections::HashSet;

pub trait AudioBackend: Send {
    /// Play a sound on the owner's slot, replacing whatever it played.
    fn play(&mut self, owner: &str, sound_id: &str, volume: f64, speed: f64);
    /// Play, stopping after `seconds` of output.
    fn play_for(&mut self, owner: &str, sound_id: &str, seconds: f64, volume: f64, speed: f64);
    /// Play the `[from_s, to_s]` segment.
    fn play_segment(
        &mut self,
        owner: &str,
        sound_id: &str,
        from_s: f64,
        to_s: f64,
        volume: f64,
        speed: f64,
    );
    fn play_bgm(&mut self, sound_id: &str, volume: f64);
    fn stop_bgm(&mut self);
    fn stop(&mut self, owner: &str);
    fn stop_all(&mut self);
    fn stop_all_except(&mut self, owner: &str);
    fn is_playing(&self, owner: &str, sound_id: &str) -> bool;
    /// Global playback volume, nominally in [0, 1].
    fn set_volume(&mut self, volume: f64);
    /// Global playback speed, nominally in [0.5, 2.0].
    fn set_speed(&mut self, speed: f64);
}

/// Headless audio: nothing plays, nothing is ever reported playing, so
/// sound-finish waits clear on the next tick.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play(&mut self, _owner: &str, _sound_id: &str, _volume: f64, _speed: f64) {}
    fn play_for(&mut self, _owner: &str, _sound_id: &str, _seconds: f64, _volume: f64, _speed: f64) {
    }
    fn play_segment(
        &mut self,
        _owner: &str,
        _sound_id: &str,
        _from_s: f64,
        _to_s: f64,
        _volume: f64,
        _speed: f64,
    ) {
    }
    fn play_bgm(&mut self, _sound_id: &str, _volume: f64) {}
    fn stop_bgm(&mut self) {}
    fn stop(&mut self, _owner: &str) {}
    fn stop_all(&mut self) {}
    fn stop_all_except(&mut self, _owner: &str) {}
    fn is_playing(&self, _owner: &str, _sound_id: &str) -> bool {
        false
    }
    fn set_volume(&mut self, _volume: f64) {}
    fn set_speed(&mut self, _speed: f64) {}
}

/// One recorded backend call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play { owner: String, sound_id: String },
    PlayFor { owner: String, sound_id: String, seconds: f64 },
    PlaySegment { owner: String, sound_id: String, from_s: f64, to_s: f64 },
    PlayBgm { sound_id: String },
    StopBgm,
    Stop { owner: String },
    StopAll,
    StopAllExcept { owner: String },
    SetVolume(f64),
    SetSpeed(f64),
}

/// Test double: records every call and tracks which (owner, sound) pairs
/// are "playing" until a test finishes them explicitly. Clones share the
/// same recording, so a test keeps one handle while the engine owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    inner: std::sync::Arc<std::sync::Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    calls: Vec<AudioCall>,
    playing: HashSet<(String, String)>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a sound as ended, as the device would at end-of-stream.
    pub fn finish(&self, owner: &str, sound_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .playing
            .remove(&(owner.to_owned(), sound_id.to_owned()));
    }

    pub fn finish_all(&self) {
        self.inner.lock().unwrap().playing.clear();
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, call: AudioCall) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn start(&self, owner: &str, sound_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .playing
            .insert((owner.to_owned(), sound_id.to_owned()));
    }
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, owner: &str, sound_id: &str, _volume: f64, _speed: f64) {
        self.start(owner, sound_id);
        self.record(AudioCall::Play {
            owner: owner.into(),
            sound_id: sound_id.into(),
        });
    }

    fn play_for(&mut self, owner: &str, sound_id: &str, seconds: f64, _volume: f64, _speed: f64) {
        self.start(owner, sound_id);
        self.record(AudioCall::PlayFor {
            owner: owner.into(),
            sound_id: sound_id.into(),
            seconds,
        });
    }

    fn play_segment(
        &mut self,
        owner: &str,
        sound_id: &str,
        from_s: f64,
        to_s: f64,
        _volume: f64,
        _speed: f64,
    ) {
        self.start(owner, sound_id);
        self.record(AudioCall::PlaySegment {
            owner: owner.into(),
            sound_id: sound_id.into(),
            from_s,
            to_s,
        });
    }

    fn play_bgm(&mut self, sound_id: &str, _volume: f64) {
        self.record(AudioCall::PlayBgm {
            sound_id: sound_id.into(),
        });
    }

    fn stop_bgm(&mut self) {
        self.record(AudioCall::StopBgm);
    }

    fn stop(&mut self, owner: &str) {
        self.inner
            .lock()
            .unwrap()
            .playing
            .retain(|(o, _)| o != owner);
        self.record(AudioCall::Stop {
            owner: owner.into(),
        });
    }

    fn stop_all(&mut self) {
        self.inner.lock().unwrap().playing.clear();
        self.record(AudioCall::StopAll);
    }

    fn stop_all_except(&mut self, owner: &str) {
        self.inner
            .lock()
            .unwrap()
            .playing
            .retain(|(o, _)| o == owner);
        self.record(AudioCall::StopAllExcept {
            owner: owner.into(),
        });
    }

    fn is_playing(&self, owner: &str, sound_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .playing
            .contains(&(owner.to_owned(), sound_id.to_owned()))
    }

    fn set_volume(&mut self, volume: f64) {
        self.record(AudioCall::SetVolume(volume));
    }

    fn set_speed(&mut self, speed: f64) {
        self.record(AudioCall::SetSpeed(speed));
    }
}
