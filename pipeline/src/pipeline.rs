//! The voice cloning orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;
use voxclone_encoding::TransportData;
use voxclone_speech::{BaseSynthesizer, FormantSynthesizer, SpectralConverter, ToneConverter};
use voxclone_voiceprint::{EmbeddingExtractor, FbankExtractor, SpeakerEmbedding};

use crate::checkpoint::SOURCE_EMBEDDING;
use crate::codec::{self, WorkingFile};
use crate::device::{select_device, Device, DeviceSelection, DeviceSlots, SystemProbe};
use crate::error::{CloneError, EncodeError, Stage, StartupError};
use crate::request::{CloneRequest, ReferenceAudio};

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Directories and device settings for [`Pipeline::from_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Final artifacts land here.
    pub output_dir: PathBuf,
    /// Per-request working files live here.
    pub work_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub device: DeviceSelection,
    /// Concurrent conversions; defaults to the device capacity.
    pub max_concurrent_conversions: Option<usize>,
    /// How long a conversion waits for a device slot.
    pub slot_timeout: Duration,
    /// Files an output name must never replace, such as the saved
    /// reference sample.
    pub protected_paths: Vec<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            work_dir: std::env::temp_dir().join("voxclone"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            device: DeviceSelection::Auto,
            max_concurrent_conversions: None,
            slot_timeout: Duration::from_secs(30),
            protected_paths: Vec::new(),
        }
    }
}

/// Model capabilities shared by every request.
#[derive(Clone)]
pub struct Providers {
    pub synthesizer: Arc<dyn BaseSynthesizer>,
    pub extractor: Arc<dyn EmbeddingExtractor>,
    pub converter: Arc<dyn ToneConverter>,
    /// Timbre of the base speaker, loaded once.
    pub source_embedding: Arc<SpeakerEmbedding>,
}

/// The outcome of a successful request.
#[derive(Debug, Clone)]
pub struct CloneResult {
    pub output_path: PathBuf,
    pub audio: TransportData,
    pub duration_seconds: f64,
}

/// Runs clone requests: decode, synthesize, extract, convert, encode.
///
/// One `Pipeline` serves any number of concurrent requests. Providers and
/// the source embedding are shared read-only; every request owns its
/// working files, which are removed on every exit path.
pub struct Pipeline {
    providers: Providers,
    device: Device,
    slots: DeviceSlots,
    output_dir: PathBuf,
    work_dir: PathBuf,
    protected: Vec<PathBuf>,
}

impl Pipeline {
    /// Assembles a pipeline from explicit providers and creates its
    /// directories.
    pub fn new(providers: Providers, device: Device, cfg: &PipelineConfig) -> Result<Self, StartupError> {
        for dir in [&cfg.output_dir, &cfg.work_dir] {
            fs::create_dir_all(dir).map_err(|source| StartupError::Directory {
                path: dir.clone(),
                source,
            })?;
        }
        let capacity = cfg
            .max_concurrent_conversions
            .unwrap_or_else(|| device.default_capacity());
        Ok(Self {
            providers,
            device,
            slots: DeviceSlots::new(capacity, cfg.slot_timeout),
            output_dir: cfg.output_dir.clone(),
            work_dir: cfg.work_dir.clone(),
            protected: cfg.protected_paths.iter().map(|p| absolute(p)).collect(),
        })
    }

    /// Selects the device and loads the built-in providers from
    /// `checkpoint_dir`. Missing or malformed checkpoints fail startup.
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, StartupError> {
        let device = select_device(cfg.device, &SystemProbe);
        let synthesizer = FormantSynthesizer::open(&cfg.checkpoint_dir, device)?;
        let extractor = FbankExtractor::default();
        let source_embedding = extractor.load_source_embedding(&cfg.checkpoint_dir.join(SOURCE_EMBEDDING))?;
        let converter = SpectralConverter::open(&cfg.checkpoint_dir, device)?;
        converter.check_band_layout(&extractor)?;

        let pipeline = Self::new(
            Providers {
                synthesizer: Arc::new(synthesizer),
                extractor: Arc::new(extractor),
                converter: Arc::new(converter),
                source_embedding: Arc::new(source_embedding),
            },
            device,
            cfg,
        )?;
        info!(
            device = %device,
            slots = pipeline.slots.capacity(),
            output_dir = %pipeline.output_dir.display(),
            "pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn slots(&self) -> &DeviceSlots {
        &self.slots
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs one request to completion on the calling thread.
    pub fn clone_voice(&self, req: &CloneRequest) -> Result<CloneResult, CloneError> {
        let token = Uuid::new_v4();
        let span = info_span!("clone", request = %token.simple());
        let _enter = span.enter();

        let result = req
            .validate(&token)
            .and_then(|output_name| self.check_destination(&output_name).map(|()| output_name))
            .and_then(|output_name| self.run(req, &token, &output_name));
        match &result {
            Ok(r) => info!(
                output = %r.output_path.display(),
                duration_seconds = r.duration_seconds,
                "voice cloned"
            ),
            Err(e) => warn!(stage = %e.stage(), error = %e, "clone failed"),
        }
        result
    }

    /// Runs [`Pipeline::clone_voice`] on the blocking pool.
    ///
    /// Dropping the returned future does not stop the run; its working
    /// files are still removed when it finishes.
    pub async fn clone_voice_async(self: &Arc<Self>, req: CloneRequest) -> Result<CloneResult, CloneError> {
        let pipeline = Arc::clone(self);
        match tokio::task::spawn_blocking(move || pipeline.clone_voice(&req)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(CloneError::ResourceExhausted("blocking pool is shutting down".to_string())),
        }
    }

    fn check_destination(&self, output_name: &str) -> Result<(), CloneError> {
        let dest = absolute(&self.output_dir.join(output_name));
        if self.protected.contains(&dest) {
            return Err(CloneError::Validation(format!(
                "output name {output_name} would replace {}",
                dest.display()
            )));
        }
        Ok(())
    }

    // Working files are declared in stage order, so they drop in reverse
    // on every return path.
    fn run(&self, req: &CloneRequest, token: &Uuid, output_name: &str) -> Result<CloneResult, CloneError> {
        debug!(stage = %Stage::Decoding, "stage");
        let reference_path = self.work_dir.join(format!("{}_reference.wav", token.simple()));
        let reference = match &req.reference {
            ReferenceAudio::Transport(text) => codec::decode(text, reference_path)?,
            ReferenceAudio::Bytes(bytes) => codec::stage_bytes(bytes, reference_path)?,
            ReferenceAudio::File(path) => codec::stage_file(path, reference_path)?,
        };

        debug!(stage = %Stage::Synthesizing, "stage");
        let base_file = WorkingFile::new(self.work_dir.join(format!("{}_base.wav", token.simple())));
        let base = self.providers.synthesizer.synthesize(
            req.text.trim(),
            req.speed,
            &req.language,
            base_file.path(),
        )?;
        let _base_elsewhere = (base.path != base_file.path()).then(|| WorkingFile::new(&base.path));

        debug!(stage = %Stage::Extracting, "stage");
        let target = self.providers.extractor.extract(reference.path())?;

        debug!(stage = %Stage::Converting, "stage");
        let staging = WorkingFile::new(self.output_dir.join(format!(".{}.partial.wav", token.simple())));
        let converted = {
            let _slot = self.slots.acquire().ok_or_else(|| {
                CloneError::ResourceExhausted(format!(
                    "no {} slot free within {:?}",
                    self.device,
                    self.slots.timeout()
                ))
            })?;
            self.providers.converter.convert(
                &base,
                &self.providers.source_embedding,
                &target,
                staging.path(),
            )?
        };
        let final_file = if converted.path == staging.path() {
            staging
        } else {
            WorkingFile::new(&converted.path)
        };

        debug!(stage = %Stage::Encoding, "stage");
        let audio = codec::encode(final_file.path())?;
        let duration_seconds = codec::duration(final_file.path());
        let dest = self.output_dir.join(output_name);
        let output_path = final_file
            .persist(&dest)
            .map_err(|source| EncodeError::Persist { path: dest, source })?;

        debug!(stage = %Stage::Done, "stage");
        Ok(CloneResult {
            output_path,
            audio,
            duration_seconds,
        })
    }
}
