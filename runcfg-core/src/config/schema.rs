//! Configuration schema types
//!
//! Typed, immutable view of a training-run document. Values are built by the
//! loader in `runcfg` after validation; this module only defines the shapes
//! and how they serialize back to the document format.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_yaml::Mapping;

/// Keys under `stages` that hold shared parameters rather than a stage.
pub const RESERVED_STAGE_KEYS: [&str; 3] =
    ["data_params", "criterion_params", "optimizer_params"];

/// Callback tag decoded as [`CallbackSpec::Loss`].
pub const LOSS_CALLBACK: &str = "LossCallback";

/// Callback tag decoded as [`CallbackSpec::Optimizer`].
pub const OPTIMIZER_CALLBACK: &str = "OptimizerCallback";

/// Callback tag decoded as [`CallbackSpec::LrFinder`].
pub const LR_FINDER_CALLBACK: &str = "LRFinder";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of a training-run document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Model selection and constructor arguments
    pub model_params: ModelParams,

    /// Experiment and log directories
    pub args: Args,

    /// Shared parameters and the ordered stage list
    pub stages: StagesConfig,
}

impl RunConfig {
    /// Renders the configuration in the document format.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML emission fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Model selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParams {
    /// Name of a model variant known to the training framework
    pub model: String,

    /// Remaining keys, forwarded as model constructor arguments
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Filesystem locations. Existence is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Args {
    /// Experiment directory
    pub expdir: String,

    /// Log directory
    pub logdir: String,
}

impl Args {
    /// Last path component of `expdir`, ignoring trailing slashes.
    ///
    /// The framework imports the experiment under this name.
    #[must_use]
    pub fn expdir_name(&self) -> &str {
        let trimmed = self.expdir.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

// ============================================================================
// Stages
// ============================================================================

/// The `stages` section: shared parameters plus named stages.
///
/// In the document the named stages are siblings of the reserved keys in
/// [`RESERVED_STAGE_KEYS`]; this type keeps them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct StagesConfig {
    /// Data loader parameters
    pub data_params: DataParams,

    /// Loss function selection
    pub criterion_params: CriterionParams,

    /// Optimizer selection
    pub optimizer_params: OptimizerParams,

    /// Stages in execution order
    pub stage_list: Vec<NamedStage>,
}

impl StagesConfig {
    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&NamedStage> {
        self.stage_list.iter().find(|s| s.name == name)
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stage_list.iter().map(|s| s.name.as_str())
    }
}

impl Serialize for StagesConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.stage_list.len()))?;
        map.serialize_entry("data_params", &self.data_params)?;
        map.serialize_entry("criterion_params", &self.criterion_params)?;
        map.serialize_entry("optimizer_params", &self.optimizer_params)?;
        for stage in &self.stage_list {
            map.serialize_entry(
                &stage.name,
                &StageBody {
                    state_params: &stage.state_params,
                    callbacks_params: &stage.callbacks,
                },
            )?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct StageBody<'a> {
    state_params: &'a StateParams,
    callbacks_params: &'a IndexMap<String, CallbackSpec>,
}

/// Data loading parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataParams {
    /// Samples per batch (> 0)
    pub batch_size: usize,

    /// Loader worker processes (>= 0)
    #[serde(rename = "n_workers")]
    pub num_workers: usize,

    /// Remaining keys, forwarded to the data loader
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Loss function selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionParams {
    /// Loss function identifier
    pub criterion: String,

    /// Remaining keys, forwarded as criterion constructor arguments
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Optimizer selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerParams {
    /// Optimizer identifier
    pub optimizer: String,

    /// Initial learning rate (> 0)
    #[serde(rename = "lr")]
    pub learning_rate: f64,

    /// L2 penalty (>= 0)
    pub weight_decay: f64,

    /// Remaining keys, forwarded as optimizer constructor arguments
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Whether a stage trains or only runs inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Regular training stage
    Training,
    /// Inference-only stage (name starts with `infer`)
    Inference,
}

/// A named phase of training.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStage {
    /// Stage name as written in the document
    pub name: String,

    /// Runner state for this stage
    pub state_params: StateParams,

    /// Callbacks in document order, keyed by callback name
    pub callbacks: IndexMap<String, CallbackSpec>,
}

impl NamedStage {
    /// Classifies the stage by the framework's naming convention.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        if self.name.starts_with("infer") {
            StageKind::Inference
        } else {
            StageKind::Training
        }
    }
}

/// Runner state parameters for a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateParams {
    /// Number of epochs (> 0)
    #[serde(rename = "n_epochs")]
    pub epoch_count: u64,

    /// Loader whose metrics select the best checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_loader: Option<String>,

    /// Metric compared across epochs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_metric: Option<String>,

    /// Whether a lower `main_metric` is better
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimize_metric: Option<bool>,

    /// Verbose progress output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Remaining runner state keys
    #[serde(flatten)]
    pub extra: Mapping,
}

impl StateParams {
    /// Creates state parameters with only an epoch count.
    #[must_use]
    pub fn with_epochs(epoch_count: u64) -> Self {
        Self {
            epoch_count,
            valid_loader: None,
            main_metric: None,
            minimize_metric: None,
            verbose: None,
            extra: Mapping::new(),
        }
    }

    /// Validation loader name, `"valid"` when unset.
    #[must_use]
    pub fn valid_loader(&self) -> &str {
        self.valid_loader.as_deref().unwrap_or("valid")
    }

    /// Main metric name, `"loss"` when unset.
    #[must_use]
    pub fn main_metric(&self) -> &str {
        self.main_metric.as_deref().unwrap_or("loss")
    }

    /// `true` unless the document says otherwise.
    #[must_use]
    pub fn minimize_metric(&self) -> bool {
        self.minimize_metric.unwrap_or(true)
    }

    /// `false` unless the document says otherwise.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// A callback declaration, resolved by its `callback` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackSpec {
    /// `LossCallback`: computes the loss
    Loss {
        /// Extra constructor arguments
        params: Mapping,
    },

    /// `OptimizerCallback`: steps the optimizer
    Optimizer {
        /// Extra constructor arguments
        params: Mapping,
    },

    /// `LRFinder`: sweeps the learning rate up to `final_learning_rate`
    LrFinder {
        /// Learning rate reached at the end of the sweep (> 0)
        final_learning_rate: f64,
        /// Number of sweep steps (> 0)
        step_count: u64,
        /// Extra constructor arguments
        params: Mapping,
    },

    /// Any other tag, kept verbatim for the framework to resolve
    Unknown {
        /// The tag as written
        callback: String,
        /// All fields except the tag
        params: Mapping,
    },
}

impl CallbackSpec {
    /// The `callback` tag this entry serializes with.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Loss { .. } => LOSS_CALLBACK,
            Self::Optimizer { .. } => OPTIMIZER_CALLBACK,
            Self::LrFinder { .. } => LR_FINDER_CALLBACK,
            Self::Unknown { callback, .. } => callback,
        }
    }

    /// Fields other than the tag and typed variant fields.
    #[must_use]
    pub const fn params(&self) -> &Mapping {
        match self {
            Self::Loss { params }
            | Self::Optimizer { params }
            | Self::LrFinder { params, .. }
            | Self::Unknown { params, .. } => params,
        }
    }
}

impl Serialize for CallbackSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("callback", self.tag())?;
        if let Self::LrFinder {
            final_learning_rate,
            step_count,
            ..
        } = self
        {
            map.serialize_entry("final_lr", final_learning_rate)?;
            map.serialize_entry("n_steps", step_count)?;
        }
        for (key, value) in self.params() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
