//! Configuration validation
//!
//! Checks a parsed YAML tree against the training-run schema and builds the
//! typed [`RunConfig`] in the same pass. Validation works on the generic
//! tree rather than through `serde` deserialization so that every problem in
//! a document is reported at once instead of stopping at the first.
//!
//! Errors are returned sorted by the rule that produced them (see
//! [`IssueKind`]); within a rule they keep document order.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::config::loader::LoaderOptions;
use crate::config::schema::{
    Args, CallbackSpec, CriterionParams, DataParams, LOSS_CALLBACK, LR_FINDER_CALLBACK,
    ModelParams, NamedStage, OPTIMIZER_CALLBACK, OptimizerParams, RESERVED_STAGE_KEYS, RunConfig,
    StagesConfig, StateParams,
};
use crate::error::{IssueKind, ValidationIssue};

const TOP_LEVEL_KEYS: [&str; 3] = ["model_params", "args", "stages"];
const ARGS_KEYS: [&str; 2] = ["expdir", "logdir"];
const STAGE_KEYS: [&str; 2] = ["state_params", "callbacks_params"];
const STATE_KEYS: [&str; 5] = [
    "n_epochs",
    "valid_loader",
    "main_metric",
    "minimize_metric",
    "verbose",
];

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

// ============================================================================
// Public API
// ============================================================================

/// Result of validating a document tree.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// The typed configuration; `Some` exactly when `errors` is empty.
    pub config: Option<RunConfig>,

    /// Validation errors (prevent loading), in rule order.
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schema validator for training-run documents.
///
/// Holds only the caller's options and the issues gathered during the
/// current [`validate`](Self::validate) call.
#[derive(Debug)]
pub struct Validator<'a> {
    options: &'a LoaderOptions,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

/// Marker for a value that failed validation. The issue has already been
/// recorded on the validator.
struct Invalid;

type Checked<T> = Result<T, Invalid>;

impl<'a> Validator<'a> {
    /// Creates a validator using the allow-list and limits in `options`.
    #[must_use]
    pub const fn new(options: &'a LoaderOptions) -> Self {
        Self {
            options,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Validates a parsed document and builds the typed configuration.
    ///
    /// All rules are applied; nothing short-circuits except descending into
    /// a section that is missing or has the wrong type.
    pub fn validate(&mut self, root: &Value) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let config = self.decode_root(root).ok();

        let mut errors = std::mem::take(&mut self.errors);
        errors.sort_by_key(|issue| issue.kind);

        ValidationResult {
            config: if errors.is_empty() { config } else { None },
            errors,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn decode_root(&mut self, root: &Value) -> Checked<RunConfig> {
        let Some(map) = root.as_mapping() else {
            self.errors.push(
                ValidationIssue::error(
                    IssueKind::TypeMismatch,
                    "<document>",
                    "expected a mapping at the document root",
                )
                .with_value(render(root)),
            );
            return Err(Invalid);
        };

        self.warn_unknown_keys(map, &TOP_LEVEL_KEYS, "");

        let model_params = self
            .required(map, "model_params", "")
            .and_then(|v| self.decode_model_params(v, "model_params"));
        let args = self
            .required(map, "args", "")
            .and_then(|v| self.decode_args(v, "args"));
        let stages = self
            .required(map, "stages", "")
            .and_then(|v| self.decode_stages(v, "stages"));

        Ok(RunConfig {
            model_params: model_params?,
            args: args?,
            stages: stages?,
        })
    }

    fn decode_model_params(&mut self, value: &Value, path: &str) -> Checked<ModelParams> {
        let map = self.expect_mapping(value, path)?;
        let model = self.required_string(map, "model", path);

        Ok(ModelParams {
            model: model?,
            extra: extra_keys(map, &["model"]),
        })
    }

    fn decode_args(&mut self, value: &Value, path: &str) -> Checked<Args> {
        let map = self.expect_mapping(value, path)?;
        self.warn_unknown_keys(map, &ARGS_KEYS, path);

        let expdir = self.required_string(map, "expdir", path);
        let logdir = self.required_string(map, "logdir", path);

        Ok(Args {
            expdir: expdir?,
            logdir: logdir?,
        })
    }

    fn decode_stages(&mut self, value: &Value, path: &str) -> Checked<StagesConfig> {
        let map = self.expect_mapping(value, path)?;

        let data_params = self
            .required(map, "data_params", path)
            .and_then(|v| self.decode_data_params(v, &join(path, "data_params")));
        let criterion_params = self
            .required(map, "criterion_params", path)
            .and_then(|v| self.decode_criterion_params(v, &join(path, "criterion_params")));
        let optimizer_params = self
            .required(map, "optimizer_params", path)
            .and_then(|v| self.decode_optimizer_params(v, &join(path, "optimizer_params")));

        let named: Vec<(&Value, &Value)> = map
            .iter()
            .filter(|(key, _)| {
                !key.as_str()
                    .is_some_and(|k| RESERVED_STAGE_KEYS.contains(&k))
            })
            .collect();

        if named.is_empty() {
            self.errors.push(ValidationIssue::error(
                IssueKind::NoStages,
                path,
                format!(
                    "at least one named stage is required besides {}",
                    RESERVED_STAGE_KEYS.join(", ")
                ),
            ));
        }

        let max_stages = self.options.limits.max_stages;
        if named.len() > max_stages {
            self.errors.push(
                ValidationIssue::error(
                    IssueKind::LimitExceeded,
                    path,
                    format!("at most {max_stages} stages are allowed"),
                )
                .with_value(named.len().to_string()),
            );
        }

        let mut stage_list = Vec::with_capacity(named.len());
        let mut stages_valid = true;
        for (key, body) in named {
            let stage = self
                .key_name(key, path, "stage name")
                .and_then(|name| self.decode_stage(name, body, path));
            match stage {
                Ok(stage) => stage_list.push(stage),
                Err(Invalid) => stages_valid = false,
            }
        }

        let data_params = data_params?;
        let criterion_params = criterion_params?;
        let optimizer_params = optimizer_params?;
        if !stages_valid || stage_list.is_empty() {
            return Err(Invalid);
        }

        Ok(StagesConfig {
            data_params,
            criterion_params,
            optimizer_params,
            stage_list,
        })
    }

    fn decode_data_params(&mut self, value: &Value, path: &str) -> Checked<DataParams> {
        let map = self.expect_mapping(value, path)?;

        let batch_size = self
            .required(map, "batch_size", path)
            .and_then(|v| self.positive_usize(v, &join(path, "batch_size")));
        let num_workers = self
            .required(map, "n_workers", path)
            .and_then(|v| self.non_negative_usize(v, &join(path, "n_workers")));

        Ok(DataParams {
            batch_size: batch_size?,
            num_workers: num_workers?,
            extra: extra_keys(map, &["batch_size", "n_workers"]),
        })
    }

    fn decode_criterion_params(&mut self, value: &Value, path: &str) -> Checked<CriterionParams> {
        let map = self.expect_mapping(value, path)?;
        let criterion = self.required_string(map, "criterion", path);

        Ok(CriterionParams {
            criterion: criterion?,
            extra: extra_keys(map, &["criterion"]),
        })
    }

    fn decode_optimizer_params(&mut self, value: &Value, path: &str) -> Checked<OptimizerParams> {
        let map = self.expect_mapping(value, path)?;

        let optimizer = self.required_string(map, "optimizer", path);
        let learning_rate = self
            .required(map, "lr", path)
            .and_then(|v| self.positive_f64(v, &join(path, "lr")));
        let weight_decay = self
            .required(map, "weight_decay", path)
            .and_then(|v| self.non_negative_f64(v, &join(path, "weight_decay")));

        Ok(OptimizerParams {
            optimizer: optimizer?,
            learning_rate: learning_rate?,
            weight_decay: weight_decay?,
            extra: extra_keys(map, &["optimizer", "lr", "weight_decay"]),
        })
    }

    fn decode_stage(&mut self, name: String, value: &Value, parent: &str) -> Checked<NamedStage> {
        let path = join(parent, &name);
        let map = self.expect_mapping(value, &path)?;
        self.warn_unknown_keys(map, &STAGE_KEYS, &path);

        let state_params = self
            .required(map, "state_params", &path)
            .and_then(|v| self.decode_state_params(v, &join(&path, "state_params")));
        let callbacks = self
            .required(map, "callbacks_params", &path)
            .and_then(|v| self.decode_callbacks(v, &join(&path, "callbacks_params")));

        Ok(NamedStage {
            name,
            state_params: state_params?,
            callbacks: callbacks?,
        })
    }

    fn decode_state_params(&mut self, value: &Value, path: &str) -> Checked<StateParams> {
        let map = self.expect_mapping(value, path)?;

        let epoch_count = self
            .required(map, "n_epochs", path)
            .and_then(|v| self.positive_u64(v, &join(path, "n_epochs")));
        let valid_loader = self.optional_string(map, "valid_loader", path);
        let main_metric = self.optional_string(map, "main_metric", path);
        let minimize_metric = self.optional_bool(map, "minimize_metric", path);
        let verbose = self.optional_bool(map, "verbose", path);

        Ok(StateParams {
            epoch_count: epoch_count?,
            valid_loader: valid_loader?,
            main_metric: main_metric?,
            minimize_metric: minimize_metric?,
            verbose: verbose?,
            extra: extra_keys(map, &STATE_KEYS),
        })
    }

    fn decode_callbacks(
        &mut self,
        value: &Value,
        path: &str,
    ) -> Checked<IndexMap<String, CallbackSpec>> {
        let map = self.expect_mapping(value, path)?;

        let max_callbacks = self.options.limits.max_callbacks;
        if map.len() > max_callbacks {
            self.errors.push(
                ValidationIssue::error(
                    IssueKind::LimitExceeded,
                    path,
                    format!("at most {max_callbacks} callbacks are allowed per stage"),
                )
                .with_value(map.len().to_string()),
            );
        }

        let mut callbacks = IndexMap::with_capacity(map.len());
        let mut valid = true;
        for (key, body) in map {
            let entry = self.key_name(key, path, "callback name").and_then(|name| {
                let spec = self.decode_callback(body, &join(path, &name))?;
                Ok((name, spec))
            });
            match entry {
                Ok((name, spec)) => {
                    callbacks.insert(name, spec);
                }
                Err(Invalid) => valid = false,
            }
        }

        if valid { Ok(callbacks) } else { Err(Invalid) }
    }

    fn decode_callback(&mut self, value: &Value, path: &str) -> Checked<CallbackSpec> {
        let map = self.expect_mapping(value, path)?;
        let tag = self.required_string(map, "callback", path)?;

        if !self.options.known_callbacks.iter().any(|known| *known == tag) {
            let known: Vec<&str> = self
                .options
                .known_callbacks
                .iter()
                .map(String::as_str)
                .collect();
            self.warnings.push(
                ValidationIssue::warning(
                    IssueKind::UnknownCallback,
                    join(path, "callback"),
                    with_suggestion(format!("unknown callback '{tag}'"), &tag, &known),
                )
                .with_value(tag.clone()),
            );
        }

        let spec = match tag.as_str() {
            LOSS_CALLBACK => CallbackSpec::Loss {
                params: extra_keys(map, &["callback"]),
            },
            OPTIMIZER_CALLBACK => CallbackSpec::Optimizer {
                params: extra_keys(map, &["callback"]),
            },
            LR_FINDER_CALLBACK => {
                let final_learning_rate = self
                    .required(map, "final_lr", path)
                    .and_then(|v| self.positive_f64(v, &join(path, "final_lr")));
                let step_count = self
                    .required(map, "n_steps", path)
                    .and_then(|v| self.positive_u64(v, &join(path, "n_steps")));
                CallbackSpec::LrFinder {
                    final_learning_rate: final_learning_rate?,
                    step_count: step_count?,
                    params: extra_keys(map, &["callback", "final_lr", "n_steps"]),
                }
            }
            _ => CallbackSpec::Unknown {
                params: extra_keys(map, &["callback"]),
                callback: tag,
            },
        };

        Ok(spec)
    }

    // ========================================================================
    // Field Helpers
    // ========================================================================

    /// Looks up a required key. A `null` value counts as missing.
    fn required<'v>(&mut self, map: &'v Mapping, key: &str, parent: &str) -> Checked<&'v Value> {
        match map.get(key) {
            Some(value) if !value.is_null() => Ok(value),
            _ => {
                self.errors.push(ValidationIssue::error(
                    IssueKind::MissingField,
                    join(parent, key),
                    format!("missing required field '{key}'"),
                ));
                Err(Invalid)
            }
        }
    }

    fn expect_mapping<'v>(&mut self, value: &'v Value, path: &str) -> Checked<&'v Mapping> {
        value.as_mapping().ok_or_else(|| {
            self.type_mismatch(value, path, "a mapping");
            Invalid
        })
    }

    fn required_string(&mut self, map: &Mapping, key: &str, parent: &str) -> Checked<String> {
        let value = self.required(map, key, parent)?;
        self.non_empty_string(value, &join(parent, key))
    }

    fn optional_string(
        &mut self,
        map: &Mapping,
        key: &str,
        parent: &str,
    ) -> Checked<Option<String>> {
        optional(map, key)
            .map(|v| self.non_empty_string(v, &join(parent, key)))
            .transpose()
    }

    fn optional_bool(&mut self, map: &Mapping, key: &str, parent: &str) -> Checked<Option<bool>> {
        optional(map, key)
            .map(|v| {
                v.as_bool().ok_or_else(|| {
                    self.type_mismatch(v, &join(parent, key), "a boolean");
                    Invalid
                })
            })
            .transpose()
    }

    fn non_empty_string(&mut self, value: &Value, path: &str) -> Checked<String> {
        let Some(s) = value.as_str() else {
            self.type_mismatch(value, path, "a string");
            return Err(Invalid);
        };
        if s.trim().is_empty() {
            self.errors.push(
                ValidationIssue::error(IssueKind::EmptyValue, path, "must not be empty")
                    .with_value(render(value)),
            );
            return Err(Invalid);
        }
        Ok(s.to_string())
    }

    /// Accepts YAML integers only; floats and strings are type errors.
    fn integer(&mut self, value: &Value, path: &str) -> Checked<i128> {
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .map(i128::from)
                .or_else(|| n.as_i64().map(i128::from)),
            _ => None,
        };
        parsed.ok_or_else(|| {
            self.type_mismatch(value, path, "an integer");
            Invalid
        })
    }

    fn positive_u64(&mut self, value: &Value, path: &str) -> Checked<u64> {
        let n = self.integer(value, path)?;
        if n <= 0 {
            self.out_of_range(value, path, "must be greater than 0");
            return Err(Invalid);
        }
        self.fit(n, value, path)
    }

    fn positive_usize(&mut self, value: &Value, path: &str) -> Checked<usize> {
        let n = self.integer(value, path)?;
        if n <= 0 {
            self.out_of_range(value, path, "must be greater than 0");
            return Err(Invalid);
        }
        self.fit(n, value, path)
    }

    fn non_negative_usize(&mut self, value: &Value, path: &str) -> Checked<usize> {
        let n = self.integer(value, path)?;
        if n < 0 {
            self.out_of_range(value, path, "must be greater than or equal to 0");
            return Err(Invalid);
        }
        self.fit(n, value, path)
    }

    fn fit<T: TryFrom<i128>>(&mut self, n: i128, value: &Value, path: &str) -> Checked<T> {
        T::try_from(n).map_err(|_| {
            self.out_of_range(value, path, "is too large");
            Invalid
        })
    }

    /// Accepts YAML numbers and numeric strings such as `"1e-3"`.
    fn number(&mut self, value: &Value, path: &str) -> Checked<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(f) if f.is_finite() => Ok(f),
            _ => {
                self.type_mismatch(value, path, "a finite number");
                Err(Invalid)
            }
        }
    }

    fn positive_f64(&mut self, value: &Value, path: &str) -> Checked<f64> {
        let f = self.number(value, path)?;
        if f <= 0.0 {
            self.out_of_range(value, path, "must be greater than 0");
            return Err(Invalid);
        }
        Ok(f)
    }

    fn non_negative_f64(&mut self, value: &Value, path: &str) -> Checked<f64> {
        let f = self.number(value, path)?;
        if f < 0.0 {
            self.out_of_range(value, path, "must be greater than or equal to 0");
            return Err(Invalid);
        }
        Ok(f)
    }

    /// Stage and callback names must be non-empty strings.
    fn key_name(&mut self, key: &Value, parent: &str, what: &str) -> Checked<String> {
        match key.as_str() {
            Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
            Some(_) => {
                self.errors.push(
                    ValidationIssue::error(
                        IssueKind::EmptyValue,
                        parent,
                        format!("{what} must not be empty"),
                    )
                    .with_value(render(key)),
                );
                Err(Invalid)
            }
            None => {
                self.errors.push(
                    ValidationIssue::error(
                        IssueKind::TypeMismatch,
                        parent,
                        format!("{what} must be a string"),
                    )
                    .with_value(render(key)),
                );
                Err(Invalid)
            }
        }
    }

    fn warn_unknown_keys(&mut self, map: &Mapping, allowed: &[&str], parent: &str) {
        for key in map.keys() {
            match key.as_str() {
                Some(name) if allowed.contains(&name) => {}
                Some(name) => self.warnings.push(ValidationIssue::warning(
                    IssueKind::UnknownKey,
                    join(parent, name),
                    with_suggestion(format!("unknown key '{name}'"), name, allowed),
                )),
                None => self.warnings.push(
                    ValidationIssue::warning(
                        IssueKind::UnknownKey,
                        if parent.is_empty() { "<document>" } else { parent },
                        "non-string key is ignored",
                    )
                    .with_value(render(key)),
                ),
            }
        }
    }

    fn type_mismatch(&mut self, value: &Value, path: &str, expected: &str) {
        self.errors.push(
            ValidationIssue::error(IssueKind::TypeMismatch, path, format!("expected {expected}"))
                .with_value(render(value)),
        );
    }

    fn out_of_range(&mut self, value: &Value, path: &str, constraint: &str) {
        self.errors.push(
            ValidationIssue::error(IssueKind::OutOfRange, path, constraint)
                .with_value(render(value)),
        );
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Joins a dotted parent path and a key.
fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Looks up an optional key; `null` counts as absent.
fn optional<'v>(map: &'v Mapping, key: &str) -> Option<&'v Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Copies entries whose key is not one of `known`, preserving order.
fn extra_keys(map: &Mapping, known: &[&str]) -> Mapping {
    map.iter()
        .filter(|(key, _)| !key.as_str().is_some_and(|k| known.contains(&k)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Renders a value for an issue report.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("a value tagged {}", tagged.tag),
    }
}

/// Suggests the closest candidate for a misspelled name.
///
/// Returns the closest match if its Damerau-Levenshtein distance is <= 3.
#[must_use]
pub fn suggest<'c>(input: &str, candidates: &[&'c str]) -> Option<&'c str> {
    candidates
        .iter()
        .map(|c| (*c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name)
}

fn with_suggestion(message: String, input: &str, candidates: &[&str]) -> String {
    match suggest(input, candidates) {
        Some(name) => format!("{message}, did you mean '{name}'?"),
        None => message,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let options = LoaderOptions::default();
        let root: Value = serde_yaml::from_str(yaml).unwrap();
        Validator::new(&options).validate(&root)
    }

    const MINIMAL: &str = r"
model_params:
  model: SimpleNet
args:
  expdir: mnist_simple
  logdir: ./logs
stages:
  data_params:
    batch_size: 64
    n_workers: 1
  criterion_params:
    criterion: CrossEntropyLoss
  optimizer_params:
    optimizer: Adam
    lr: 0.001
    weight_decay: 0.0001
  stage1:
    state_params:
      n_epochs: 3
    callbacks_params: {}
";

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_minimal_document_is_valid() {
        let result = validate(MINIMAL);
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
        let config = result.config.unwrap();
        assert_eq!(config.stages.stage_list.len(), 1);
        assert!(config.stages.stage_list[0].callbacks.is_empty());
    }

    #[test]
    fn test_non_mapping_root() {
        let result = validate("- just\n- a list\n");
        assert!(result.has_errors());
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
        assert_eq!(result.errors[0].path, "<document>");
        assert!(result.config.is_none());
    }

    #[test]
    fn test_missing_sections_reported_once_each() {
        let result = validate("model_params:\n  model: SimpleNet\n");
        assert_eq!(paths(&result.errors), ["args", "stages"]);
        assert!(
            result
                .errors
                .iter()
                .all(|i| i.kind == IssueKind::MissingField)
        );
    }

    #[test]
    fn test_null_value_counts_as_missing() {
        let yaml = MINIMAL.replace("model: SimpleNet", "model:");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["model_params.model"]);
        assert_eq!(result.errors[0].kind, IssueKind::MissingField);
    }

    #[test]
    fn test_empty_string_rejected() {
        let yaml = MINIMAL.replace("expdir: mnist_simple", "expdir: \"  \"");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["args.expdir"]);
        assert_eq!(result.errors[0].kind, IssueKind::EmptyValue);
    }

    #[test]
    fn test_float_for_integer_is_type_error() {
        let yaml = MINIMAL.replace("batch_size: 64", "batch_size: 64.0");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages.data_params.batch_size"]);
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
        assert!(result.errors[0].value.is_some());
    }

    #[test]
    fn test_string_for_integer_is_type_error() {
        let yaml = MINIMAL.replace("n_epochs: 3", "n_epochs: \"3\"");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages.stage1.state_params.n_epochs"]);
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn test_numeric_string_accepted_for_float() {
        let yaml = MINIMAL.replace("lr: 0.001", "lr: \"1e-3\"");
        let config = validate(&yaml).config.unwrap();
        assert!((config.stages.optimizer_params.learning_rate - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_integer_accepted_for_float() {
        let yaml = MINIMAL.replace("weight_decay: 0.0001", "weight_decay: 0");
        let config = validate(&yaml).config.unwrap();
        assert!(config.stages.optimizer_params.weight_decay.abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let yaml = MINIMAL.replace("lr: 0.001", "lr: .inf");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages.optimizer_params.lr"]);
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn test_range_checks() {
        let yaml = MINIMAL
            .replace("n_workers: 1", "n_workers: -1")
            .replace("lr: 0.001", "lr: 0")
            .replace("weight_decay: 0.0001", "weight_decay: -0.5")
            .replace("n_epochs: 3", "n_epochs: 0");
        let result = validate(&yaml);
        assert_eq!(
            paths(&result.errors),
            [
                "stages.data_params.n_workers",
                "stages.optimizer_params.lr",
                "stages.optimizer_params.weight_decay",
                "stages.stage1.state_params.n_epochs",
            ]
        );
        assert!(
            result
                .errors
                .iter()
                .all(|i| i.kind == IssueKind::OutOfRange)
        );
    }

    #[test]
    fn test_zero_workers_allowed() {
        let yaml = MINIMAL.replace("n_workers: 1", "n_workers: 0");
        assert!(validate(&yaml).is_valid());
    }

    #[test]
    fn test_errors_sorted_by_rule() {
        // Range error appears before the missing field in document order.
        let yaml = MINIMAL
            .replace("batch_size: 64", "batch_size: 0")
            .replace("    callbacks_params: {}\n", "");
        let result = validate(&yaml);
        assert_eq!(
            paths(&result.errors),
            [
                "stages.stage1.callbacks_params",
                "stages.data_params.batch_size"
            ]
        );
    }

    #[test]
    fn test_no_named_stage() {
        let end = MINIMAL.find("  stage1:").unwrap();
        let result = validate(&MINIMAL[..end]);
        assert_eq!(paths(&result.errors), ["stages"]);
        assert_eq!(result.errors[0].kind, IssueKind::NoStages);
    }

    #[test]
    fn test_stage_must_be_mapping() {
        let yaml = format!("{MINIMAL}  stage2: 5\n");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages.stage2"]);
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn test_non_string_stage_name() {
        let yaml = format!(
            "{MINIMAL}  42:\n    state_params:\n      n_epochs: 1\n    callbacks_params: {{}}\n"
        );
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages"]);
        assert_eq!(result.errors[0].value.as_deref(), Some("42"));
    }

    #[test]
    fn test_callback_requires_tag() {
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      loss:\n        input_key: targets",
        );
        let result = validate(&yaml);
        assert_eq!(
            paths(&result.errors),
            ["stages.stage1.callbacks_params.loss.callback"]
        );
    }

    #[test]
    fn test_lr_finder_requires_fields() {
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      finder:\n        callback: LRFinder\n        final_lr: -1",
        );
        let result = validate(&yaml);
        assert_eq!(
            paths(&result.errors),
            [
                "stages.stage1.callbacks_params.finder.n_steps",
                "stages.stage1.callbacks_params.finder.final_lr",
            ]
        );
        assert_eq!(result.errors[0].kind, IssueKind::MissingField);
        assert_eq!(result.errors[1].kind, IssueKind::OutOfRange);
    }

    #[test]
    fn test_lr_finder_zero_is_out_of_range() {
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      finder:\n        callback: LRFinder\n        final_lr: 0\n        n_steps: 0",
        );
        let result = validate(&yaml);
        assert_eq!(
            paths(&result.errors),
            [
                "stages.stage1.callbacks_params.finder.final_lr",
                "stages.stage1.callbacks_params.finder.n_steps",
            ]
        );
        assert!(
            result
                .errors
                .iter()
                .all(|i| i.kind == IssueKind::OutOfRange)
        );
        assert!(result.config.is_none());
    }

    #[test]
    fn test_callback_params_preserved() {
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      loss:\n        callback: LossCallback\n        input_key: targets",
        );
        let config = validate(&yaml).config.unwrap();
        let spec = &config.stages.stage_list[0].callbacks["loss"];
        assert!(matches!(spec, CallbackSpec::Loss { .. }));
        assert_eq!(
            spec.params().get("input_key"),
            Some(&Value::from("targets"))
        );
    }

    #[test]
    fn test_unknown_callback_warns_with_suggestion() {
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      loss:\n        callback: LossCallbak",
        );
        let result = validate(&yaml);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.kind, IssueKind::UnknownCallback);
        assert_eq!(warning.path, "stages.stage1.callbacks_params.loss.callback");
        assert!(warning.message.contains("did you mean 'LossCallback'"));
        let spec = &result.config.unwrap().stages.stage_list[0].callbacks["loss"];
        assert_eq!(spec.tag(), "LossCallbak");
    }

    #[test]
    fn test_allow_listed_tag_decodes_as_unknown_variant_without_warning() {
        let options = LoaderOptions {
            known_callbacks: vec!["EarlyStoppingCallback".to_string()],
            ..LoaderOptions::default()
        };
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      early:\n        callback: EarlyStoppingCallback\n        patience: 3",
        );
        let root: Value = serde_yaml::from_str(&yaml).unwrap();
        let result = Validator::new(&options).validate(&root);
        assert!(result.warnings.is_empty());
        let spec = &result.config.unwrap().stages.stage_list[0].callbacks["early"];
        assert!(matches!(spec, CallbackSpec::Unknown { callback, .. } if callback == "EarlyStoppingCallback"));
    }

    #[test]
    fn test_unknown_keys_warn() {
        let yaml = MINIMAL
            .replace("logdir: ./logs", "logdir: ./logs\n  logdri: typo")
            .replace("model_params:", "distributed_params: {}\nmodel_params:");
        let result = validate(&yaml);
        assert!(result.is_valid());
        assert_eq!(paths(&result.warnings), ["distributed_params", "args.logdri"]);
        assert!(result.warnings[1].message.contains("did you mean 'logdir'"));
    }

    #[test]
    fn test_extra_section_keys_preserved_without_warning() {
        let yaml = MINIMAL
            .replace("model: SimpleNet", "model: SimpleNet\n  num_classes: 10")
            .replace("optimizer: Adam", "optimizer: Adam\n    amsgrad: true")
            .replace("n_epochs: 3", "n_epochs: 3\n      checkpoint_data: {}");
        let result = validate(&yaml);
        assert!(result.warnings.is_empty());
        let config = result.config.unwrap();
        assert_eq!(
            config.model_params.extra.get("num_classes"),
            Some(&Value::from(10))
        );
        assert_eq!(
            config.stages.optimizer_params.extra.get("amsgrad"),
            Some(&Value::from(true))
        );
        assert!(
            config.stages.stage_list[0]
                .state_params
                .extra
                .contains_key("checkpoint_data")
        );
    }

    #[test]
    fn test_state_params_optional_fields() {
        let yaml = MINIMAL.replace(
            "n_epochs: 3",
            "n_epochs: 3\n      main_metric: accuracy\n      minimize_metric: false",
        );
        let config = validate(&yaml).config.unwrap();
        let state = &config.stages.stage_list[0].state_params;
        assert_eq!(state.main_metric(), "accuracy");
        assert!(!state.minimize_metric());
        assert_eq!(state.valid_loader(), "valid");
    }

    #[test]
    fn test_state_params_bool_type_checked() {
        let yaml = MINIMAL.replace("n_epochs: 3", "n_epochs: 3\n      verbose: yes please");
        let result = validate(&yaml);
        assert_eq!(paths(&result.errors), ["stages.stage1.state_params.verbose"]);
        assert_eq!(result.errors[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn test_stage_limit() {
        let mut options = LoaderOptions::default();
        options.limits.max_stages = 1;
        let yaml = format!(
            "{MINIMAL}  stage2:\n    state_params:\n      n_epochs: 1\n    callbacks_params: {{}}\n"
        );
        let root: Value = serde_yaml::from_str(&yaml).unwrap();
        let result = Validator::new(&options).validate(&root);
        assert_eq!(paths(&result.errors), ["stages"]);
        assert_eq!(result.errors[0].kind, IssueKind::LimitExceeded);
    }

    #[test]
    fn test_limit_errors_follow_range_errors() {
        let mut options = LoaderOptions::default();
        options.limits.max_stages = 1;
        let yaml = format!(
            "{MINIMAL}  stage2:\n    state_params:\n      n_epochs: 0\n    callbacks_params: {{}}\n"
        );
        let root: Value = serde_yaml::from_str(&yaml).unwrap();
        let result = Validator::new(&options).validate(&root);
        let kinds: Vec<IssueKind> = result.errors.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, [IssueKind::OutOfRange, IssueKind::LimitExceeded]);
    }

    #[test]
    fn test_callback_limit() {
        let mut options = LoaderOptions::default();
        options.limits.max_callbacks = 1;
        let yaml = MINIMAL.replace(
            "callbacks_params: {}",
            "callbacks_params:\n      loss:\n        callback: LossCallback\n      optimizer:\n        callback: OptimizerCallback",
        );
        let root: Value = serde_yaml::from_str(&yaml).unwrap();
        let result = Validator::new(&options).validate(&root);
        assert_eq!(paths(&result.errors), ["stages.stage1.callbacks_params"]);
        assert_eq!(result.errors[0].kind, IssueKind::LimitExceeded);
    }

    #[test]
    fn test_validator_reusable() {
        let options = LoaderOptions::default();
        let mut validator = Validator::new(&options);
        let bad: Value = serde_yaml::from_str("args: {}").unwrap();
        let good: Value = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(validator.validate(&bad).has_errors());
        assert!(validator.validate(&good).is_valid());
    }

    #[test]
    fn test_suggest() {
        let candidates = ["LossCallback", "OptimizerCallback", "LRFinder"];
        assert_eq!(suggest("LRFindr", &candidates), Some("LRFinder"));
        assert_eq!(suggest("TotallyDifferent", &candidates), None);
    }
}
