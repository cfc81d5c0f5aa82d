pub mod command;
pub mod config;
pub mod encoding;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod supervisor;
pub mod testing;
pub mod transcoder;

pub use command::{CommandSynthesizer, InvocationPlan, SynthesisError};
pub use config::{
    load_config, load_config_from_str, validate_config, ConfigLoadError, SeekStrategy,
    TranscoderConfig,
};
pub use encoding::{
    validate, AudioSpec, ConfigError, EncodingSpec, ThreadCount, ValidSpec, VideoSize, VideoSpec,
};
pub use probe::{FfprobeProber, ProbeError, Prober, SourceProbe, StreamKind};
pub use progress::{ProgressEvent, ProgressParser, ProgressUpdate};
pub use supervisor::{ProcessSupervisor, RunError, RunHandle, RunOutcome, RunState};
pub use transcoder::{EncodeError, EncodeJob, Encoder, FfmpegEncoder};
