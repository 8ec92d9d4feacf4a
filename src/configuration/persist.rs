//! File I/O for scenario snapshots and animation traces
//!
//! Two granularities of persistence, both JSON:
//! - `save_init`/`load_init`: one document holding the whole scenario
//! - `save_animation`/`load_animation`: a directory holding `config.json`
//!   plus one `N.json` of bare locations per frame, a pure replay trace
//!   that plays back without re-running the solver
//!
//! Loads are atomic: a fully-built value is returned or an error is, and
//! no partially-applied state is left behind either way.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::configuration::config::{
    AnimationConfig, FrameConfig, FrameParticleConfig, ScenarioConfig,
};
use crate::error::SimError;
use crate::simulation::scenario::{build_system, snapshot_system};
use crate::simulation::states::NVec3;
use crate::simulation::system::ParticleSystem;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SimError> {
    let file = File::open(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| SimError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SimError> {
    let file = File::create(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| SimError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a scenario snapshot of the system to one JSON document
pub fn save_init(path: impl AsRef<Path>, sys: &ParticleSystem) -> Result<(), SimError> {
    write_json(path.as_ref(), &snapshot_system(sys))
}

/// Load a scenario snapshot into a freshly built system
pub fn load_init(path: impl AsRef<Path>) -> Result<ParticleSystem, SimError> {
    let cfg: ScenarioConfig = read_json(path.as_ref())?;
    build_system(&cfg)
}

/// A loaded animation trace: the initial snapshot plus per-frame locations
#[derive(Debug, Clone)]
pub struct AnimationTrace {
    pub config: AnimationConfig,
    pub frames: Vec<Vec<NVec3>>,
}

fn frame_path(dir: &Path, frame: i32) -> PathBuf {
    dir.join(format!("{frame}.json"))
}

/// Save a run's per-frame locations as an animation trace directory
///
/// `frames` is the output of `run_frames`, one entry per frame of the
/// system's configured range
pub fn save_animation(
    dir: impl AsRef<Path>,
    sys: &ParticleSystem,
    frames: &[Vec<NVec3>],
) -> Result<(), SimError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| SimError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let config = AnimationConfig {
        particle_list: snapshot_system(sys).particle_list,
        frame_start: sys.frame_start,
        frame_end: sys.frame_end,
    };
    write_json(&dir.join("config.json"), &config)?;

    for (offset, frame) in frames.iter().enumerate() {
        let doc = FrameConfig {
            particle_list: frame
                .iter()
                .map(|loc| FrameParticleConfig {
                    location: [loc.x, loc.y, loc.z],
                })
                .collect(),
        };
        write_json(&frame_path(dir, sys.frame_start + offset as i32), &doc)?;
    }
    Ok(())
}

/// Load an animation trace directory back into memory
pub fn load_animation(dir: impl AsRef<Path>) -> Result<AnimationTrace, SimError> {
    let dir = dir.as_ref();
    let config: AnimationConfig = read_json(&dir.join("config.json"))?;

    let mut frames = Vec::with_capacity((config.frame_end - config.frame_start).max(0) as usize);
    for frame in config.frame_start..config.frame_end {
        let doc: FrameConfig = read_json(&frame_path(dir, frame))?;
        frames.push(
            doc.particle_list
                .iter()
                .map(|p| NVec3::new(p.location[0], p.location[1], p.location[2]))
                .collect(),
        );
    }

    Ok(AnimationTrace { config, frames })
}
