//! Contract with the external sound-generation engine.
//!
//! The router never synthesizes audio itself; it drives a backend that
//! wraps a sampler or software synthesizer. Calls are synchronous and
//! fallible, and the router never retries them.

use crate::error::Result;
use std::path::Path;

/// Opaque handle to one synthesis voice owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the internal ID (for debugging/logging only)
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Sound-generation engine consumed by the router.
pub trait AudioBackend: Send + Sync {
    /// Create one synthesis voice (engine plus sampler, or one synth channel).
    ///
    /// Fails with [`Error::BackendLoadFailed`](crate::Error::BackendLoadFailed)
    /// when the engine cannot start.
    fn create_voice(&self) -> Result<VoiceHandle>;

    /// Load a sound-bank program into a voice.
    fn load_instrument(&self, voice: VoiceHandle, path: &Path, bank: u32, program: u32)
        -> Result<()>;

    /// Begin sounding a note on a voice.
    fn start_note(&self, voice: VoiceHandle, note: u8, velocity: u8) -> Result<()>;

    /// Stop sounding a note on a voice.
    fn stop_note(&self, voice: VoiceHandle, note: u8) -> Result<()>;

    /// Send a 14-bit pitch-bend value (0..=16383, 8192 = center).
    ///
    /// Must be idempotent: re-sending the current value is harmless.
    fn send_pitch_bend(&self, voice: VoiceHandle, bend: u16) -> Result<()>;

    /// Release a voice and stop its engine. Infallible teardown.
    fn release_voice(&self, voice: VoiceHandle);
}

pub use mock::{BackendCall, MockBackend};

/// Recording backend used by the test suite.
pub mod mock {
    use super::{AudioBackend, VoiceHandle};
    use crate::error::{Error, Result};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// One recorded backend invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BackendCall {
        CreateVoice(VoiceHandle),
        LoadInstrument {
            voice: VoiceHandle,
            path: PathBuf,
            bank: u32,
            program: u32,
        },
        StartNote {
            voice: VoiceHandle,
            note: u8,
            velocity: u8,
        },
        StopNote {
            voice: VoiceHandle,
            note: u8,
        },
        PitchBend {
            voice: VoiceHandle,
            bend: u16,
        },
        ReleaseVoice(VoiceHandle),
    }

    #[derive(Default)]
    struct MockState {
        next_voice: u64,
        calls: Vec<BackendCall>,
        fail_creates_from: Option<usize>,
        creates_seen: usize,
        fail_loads_from: Option<usize>,
        loads_seen: usize,
        fail_bends: bool,
    }

    /// In-memory [`AudioBackend`] that records every call.
    ///
    /// Failures can be scripted per call family to exercise rollback and
    /// error-propagation paths.
    #[derive(Default)]
    pub struct MockBackend {
        state: Mutex<MockState>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every `create_voice` call starting with the nth (0-based).
        pub fn fail_creates_from(&self, n: usize) {
            self.state.lock().unwrap().fail_creates_from = Some(n);
        }

        /// Fail every `load_instrument` call starting with the nth (0-based).
        pub fn fail_loads_from(&self, n: usize) {
            self.state.lock().unwrap().fail_loads_from = Some(n);
        }

        /// Make all `send_pitch_bend` calls fail.
        pub fn fail_pitch_bends(&self, fail: bool) {
            self.state.lock().unwrap().fail_bends = fail;
        }

        /// Snapshot of every call made so far, in order.
        pub fn calls(&self) -> Vec<BackendCall> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.state.lock().unwrap().calls.clear();
        }

        /// All bend values sent to one voice, in order.
        pub fn bends_for(&self, voice: VoiceHandle) -> Vec<u16> {
            self.state
                .lock()
                .unwrap()
                .calls
                .iter()
                .filter_map(|call| match call {
                    BackendCall::PitchBend { voice: v, bend } if *v == voice => Some(*bend),
                    _ => None,
                })
                .collect()
        }

        /// Voices created and not yet released.
        pub fn live_voices(&self) -> Vec<VoiceHandle> {
            let state = self.state.lock().unwrap();
            let mut live = Vec::new();
            for call in &state.calls {
                match call {
                    BackendCall::CreateVoice(v) => live.push(*v),
                    BackendCall::ReleaseVoice(v) => live.retain(|x| x != v),
                    _ => {}
                }
            }
            live
        }
    }

    impl AudioBackend for MockBackend {
        fn create_voice(&self) -> Result<VoiceHandle> {
            let mut state = self.state.lock().unwrap();
            let nth = state.creates_seen;
            state.creates_seen += 1;
            if state.fail_creates_from.is_some_and(|from| nth >= from) {
                return Err(Error::BackendLoadFailed(
                    "scripted engine-start failure".to_string(),
                ));
            }
            let voice = VoiceHandle::new(state.next_voice);
            state.next_voice += 1;
            state.calls.push(BackendCall::CreateVoice(voice));
            Ok(voice)
        }

        fn load_instrument(
            &self,
            voice: VoiceHandle,
            path: &Path,
            bank: u32,
            program: u32,
        ) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let nth = state.loads_seen;
            state.loads_seen += 1;
            if state.fail_loads_from.is_some_and(|from| nth >= from) {
                return Err(Error::BackendLoadFailed(format!(
                    "scripted failure loading '{}'",
                    path.display()
                )));
            }
            state.calls.push(BackendCall::LoadInstrument {
                voice,
                path: path.to_path_buf(),
                bank,
                program,
            });
            Ok(())
        }

        fn start_note(&self, voice: VoiceHandle, note: u8, velocity: u8) -> Result<()> {
            self.state.lock().unwrap().calls.push(BackendCall::StartNote {
                voice,
                note,
                velocity,
            });
            Ok(())
        }

        fn stop_note(&self, voice: VoiceHandle, note: u8) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .calls
                .push(BackendCall::StopNote { voice, note });
            Ok(())
        }

        fn send_pitch_bend(&self, voice: VoiceHandle, bend: u16) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_bends {
                return Err(Error::BackendOperationFailed(
                    "scripted pitch-bend failure".to_string(),
                ));
            }
            state.calls.push(BackendCall::PitchBend { voice, bend });
            Ok(())
        }

        fn release_voice(&self, voice: VoiceHandle) {
            self.state
                .lock()
                .unwrap()
                .calls
                .push(BackendCall::ReleaseVoice(voice));
        }
    }
}
