use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::loading::LoadDone;

/// Loadable, playable sound backend.
///
/// `load` must call `done` exactly once; a backend that never does stalls
/// [`Engine::load_sounds`](crate::Engine::load_sounds) forever.
pub trait SoundAsset {
    fn is_loaded(&self) -> bool;
    fn load(&mut self, done: LoadDone);
    fn play(&mut self);
}

/// Registry entry wrapping a sound backend.
pub struct Sound {
    asset: Box<dyn SoundAsset>,
}

impl Sound {
    pub fn new<A: SoundAsset + 'static>(asset: A) -> Self {
        Self {
            asset: Box::new(asset),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.asset.is_loaded()
    }

    pub fn load(&mut self, done: LoadDone) {
        self.asset.load(done);
    }

    pub fn play(&mut self) {
        self.asset.play();
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("loaded", &self.asset.is_loaded())
            .finish()
    }
}

/// Sound clip read from disk. Decoding and output are left to the host; this
/// only holds the encoded bytes and counts playback requests.
#[derive(Debug)]
pub struct FileSound {
    path: PathBuf,
    bytes: Option<Vec<u8>>,
    plays: u32,
}

impl FileSound {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bytes: None,
            plays: 0,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn plays(&self) -> u32 {
        self.plays
    }
}

impl SoundAsset for FileSound {
    fn is_loaded(&self) -> bool {
        self.bytes.is_some()
    }

    fn load(&mut self, done: LoadDone) {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "sound_loaded");
                self.bytes = Some(bytes);
            }
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "sound_load_failed");
            }
        }
        done();
    }

    fn play(&mut self) {
        if self.bytes.is_none() {
            warn!(path = %self.path.display(), "sound_play_before_load");
            return;
        }
        self.plays = self.plays.saturating_add(1);
        debug!(path = %self.path.display(), plays = self.plays, "sound_played");
    }
}
