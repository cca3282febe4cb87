//! Threshold configuration for archsmell.
//!
//! Thresholds are grouped by smell category and addressed with
//! category-qualified keys such as `moduleSmells.missingAbstractionMaxElements`.
//! Two built-in profiles exist (`default` and the stricter `academic`); an
//! optional YAML or JSON override file adjusts individual keys on top of the
//! chosen profile. The resulting [`Thresholds`] value is immutable for the
//! whole run and is passed by reference to every detector.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::ConfigError;

/// Default override file names to search for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["archsmell.yaml", ".archsmell.yaml", "archsmell.json"];

/// Built-in threshold profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Lenient limits suited to production codebases.
    #[default]
    Default,
    /// Strict limits following the design-smell literature.
    Academic,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Default => write!(f, "default"),
            Profile::Academic => write!(f, "academic"),
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Profile::Default),
            "academic" | "strict" => Ok(Profile::Academic),
            _ => Err(ConfigError::InvalidValue {
                key: "profile".to_string(),
                reason: format!("unknown profile {:?}, expected 'default' or 'academic'", s),
            }),
        }
    }
}

/// Module-level limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleThresholds {
    /// Maximum unencapsulated top-level variables, functions and type aliases.
    pub missing_abstraction_max_elements: usize,
    pub max_declarations_per_file: usize,
    pub max_lines_per_file: usize,
    /// Maximum architectural layers inferred in one file.
    pub max_layers_per_module: usize,
    /// Free functions and variables needed before they count as a utility layer.
    pub unstructured_utility_min_elements: usize,
    /// Maximum percentage of type references leaving the module.
    pub weakened_modularity_max_external_percent: usize,
    /// References needed before the external ratio is meaningful.
    pub weakened_modularity_min_references: usize,
}

/// Type-level limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassThresholds {
    pub god_class_max_methods: usize,
    pub god_class_max_properties: usize,
    pub massive_controller_max_lines: usize,
    pub data_class_max_properties: usize,
    pub lazy_class_min_members: usize,
}

/// Function-level limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodThresholds {
    pub long_method_max_statements: usize,
    pub long_method_max_lines: usize,
    pub long_method_max_complexity: usize,
    pub message_chain_max_length: usize,
    pub feature_envy_max_foreign_percent: usize,
    pub feature_envy_min_accesses: usize,
    pub duplicate_block_min_statements: usize,
}

/// Abstraction design limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractionThresholds {
    pub multifaceted_max_responsibilities: usize,
    /// Largest number of operations a stateless type may have and still be flagged.
    pub imperative_max_operations: usize,
}

/// Encapsulation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncapsulationThresholds {
    /// Maximum externally writable stored properties per type.
    pub max_exposed_fields: usize,
}

/// Dependency-graph limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyThresholds {
    /// Maximum distinct sibling types one type may reference through fields.
    pub dense_structure_max_degree: usize,
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    /// Overall time budget for one run.
    pub timeout: Duration,
    /// Glob patterns for paths to skip during discovery.
    pub excluded_paths: Vec<String>,
}

/// Complete threshold configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub profile: Profile,
    pub module_smells: ModuleThresholds,
    pub class_smells: ClassThresholds,
    pub method_smells: MethodThresholds,
    pub abstraction_smells: AbstractionThresholds,
    pub encapsulation: EncapsulationThresholds,
    pub dependency_smells: DependencyThresholds,
    pub analysis: AnalysisSettings,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::for_profile(Profile::Default)
    }
}

impl Thresholds {
    /// Built-in values for a profile.
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Default => Self {
                profile,
                module_smells: ModuleThresholds {
                    missing_abstraction_max_elements: 20,
                    max_declarations_per_file: 40,
                    max_lines_per_file: 600,
                    max_layers_per_module: 2,
                    unstructured_utility_min_elements: 5,
                    weakened_modularity_max_external_percent: 85,
                    weakened_modularity_min_references: 10,
                },
                class_smells: ClassThresholds {
                    god_class_max_methods: 20,
                    god_class_max_properties: 15,
                    massive_controller_max_lines: 400,
                    data_class_max_properties: 6,
                    lazy_class_min_members: 2,
                },
                method_smells: MethodThresholds {
                    long_method_max_statements: 30,
                    long_method_max_lines: 60,
                    long_method_max_complexity: 15,
                    message_chain_max_length: 4,
                    feature_envy_max_foreign_percent: 75,
                    feature_envy_min_accesses: 5,
                    duplicate_block_min_statements: 5,
                },
                abstraction_smells: AbstractionThresholds {
                    multifaceted_max_responsibilities: 4,
                    imperative_max_operations: 1,
                },
                encapsulation: EncapsulationThresholds {
                    max_exposed_fields: 5,
                },
                dependency_smells: DependencyThresholds {
                    dense_structure_max_degree: 6,
                },
                analysis: AnalysisSettings {
                    timeout: Duration::from_secs(300),
                    excluded_paths: Vec::new(),
                },
            },
            Profile::Academic => Self {
                profile,
                module_smells: ModuleThresholds {
                    missing_abstraction_max_elements: 10,
                    max_declarations_per_file: 20,
                    max_lines_per_file: 300,
                    max_layers_per_module: 2,
                    unstructured_utility_min_elements: 3,
                    weakened_modularity_max_external_percent: 70,
                    weakened_modularity_min_references: 6,
                },
                class_smells: ClassThresholds {
                    god_class_max_methods: 10,
                    god_class_max_properties: 8,
                    massive_controller_max_lines: 200,
                    data_class_max_properties: 3,
                    lazy_class_min_members: 3,
                },
                method_smells: MethodThresholds {
                    long_method_max_statements: 15,
                    long_method_max_lines: 30,
                    long_method_max_complexity: 10,
                    message_chain_max_length: 2,
                    feature_envy_max_foreign_percent: 60,
                    feature_envy_min_accesses: 3,
                    duplicate_block_min_statements: 3,
                },
                abstraction_smells: AbstractionThresholds {
                    multifaceted_max_responsibilities: 2,
                    imperative_max_operations: 1,
                },
                encapsulation: EncapsulationThresholds {
                    max_exposed_fields: 0,
                },
                dependency_smells: DependencyThresholds {
                    dense_structure_max_degree: 4,
                },
                analysis: AnalysisSettings {
                    timeout: Duration::from_secs(300),
                    excluded_paths: Vec::new(),
                },
            },
        }
    }

    /// Load thresholds from an override file on top of a profile.
    ///
    /// `profile` (usually from the command line) wins over a `profile` key in
    /// the file; without either the default profile is used.
    pub fn load<P: AsRef<Path>>(path: P, profile: Option<Profile>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, profile).map_err(|e| match e {
            ConfigError::Syntax { source, .. } => ConfigError::Syntax {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse override content (YAML or JSON) on top of a profile.
    pub fn from_yaml_str(content: &str, profile: Option<Profile>) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Syntax {
            path: PathBuf::new(),
            source,
        })?;

        let mut flat = BTreeMap::new();
        flatten("", &root, &mut flat);

        let file_profile = match flat.remove("profile") {
            Some(Value::String(s)) => Some(s.parse::<Profile>()?),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "profile".to_string(),
                    reason: format!("expected a profile name, got {:?}", other),
                })
            }
            None => None,
        };

        let mut thresholds = Self::for_profile(profile.or(file_profile).unwrap_or_default());
        thresholds.apply_overrides(&flat)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Apply flattened `category.key` overrides. Unknown keys are ignored.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, Value>) -> Result<(), ConfigError> {
        for (key, value) in overrides {
            if !self.set(key, value)? {
                tracing::debug!(key = %key, "ignoring unknown threshold key");
            }
        }
        Ok(())
    }

    /// Set one key. Returns `false` when the key is not recognized.
    fn set(&mut self, key: &str, value: &Value) -> Result<bool, ConfigError> {
        let slot: &mut usize = match key {
            "moduleSmells.missingAbstractionMaxElements" => {
                &mut self.module_smells.missing_abstraction_max_elements
            }
            "moduleSmells.maxDeclarationsPerFile" => &mut self.module_smells.max_declarations_per_file,
            "moduleSmells.maxLinesPerFile" => &mut self.module_smells.max_lines_per_file,
            "moduleSmells.maxLayersPerModule" => &mut self.module_smells.max_layers_per_module,
            "moduleSmells.unstructuredUtilityMinElements" => {
                &mut self.module_smells.unstructured_utility_min_elements
            }
            "moduleSmells.weakenedModularityMaxExternalPercent" => {
                &mut self.module_smells.weakened_modularity_max_external_percent
            }
            "moduleSmells.weakenedModularityMinReferences" => {
                &mut self.module_smells.weakened_modularity_min_references
            }
            "classSmells.godClassMaxMethods" => &mut self.class_smells.god_class_max_methods,
            "classSmells.godClassMaxProperties" => &mut self.class_smells.god_class_max_properties,
            "classSmells.massiveControllerMaxLines" => {
                &mut self.class_smells.massive_controller_max_lines
            }
            "classSmells.dataClassMaxProperties" => &mut self.class_smells.data_class_max_properties,
            "classSmells.lazyClassMinMembers" => &mut self.class_smells.lazy_class_min_members,
            "methodSmells.longMethodMaxStatements" => {
                &mut self.method_smells.long_method_max_statements
            }
            "methodSmells.longMethodMaxLines" => &mut self.method_smells.long_method_max_lines,
            "methodSmells.longMethodMaxComplexity" => {
                &mut self.method_smells.long_method_max_complexity
            }
            "methodSmells.messageChainMaxLength" => &mut self.method_smells.message_chain_max_length,
            "methodSmells.featureEnvyMaxForeignPercent" => {
                &mut self.method_smells.feature_envy_max_foreign_percent
            }
            "methodSmells.featureEnvyMinAccesses" => &mut self.method_smells.feature_envy_min_accesses,
            "methodSmells.duplicateBlockMinStatements" => {
                &mut self.method_smells.duplicate_block_min_statements
            }
            "abstractionSmells.multifacetedMaxResponsibilities" => {
                &mut self.abstraction_smells.multifaceted_max_responsibilities
            }
            "abstractionSmells.imperativeMaxOperations" => {
                &mut self.abstraction_smells.imperative_max_operations
            }
            "encapsulation.maxExposedFields" => &mut self.encapsulation.max_exposed_fields,
            "dependencySmells.denseStructureMaxDegree" => {
                &mut self.dependency_smells.dense_structure_max_degree
            }
            "analysis.timeout" => {
                self.analysis.timeout = parse_duration(key, value)?;
                return Ok(true);
            }
            "analysis.excludedPaths" => {
                self.analysis.excluded_paths = parse_string_list(key, value)?;
                return Ok(true);
            }
            _ => return Ok(false),
        };
        *slot = parse_count(key, value)?;
        Ok(true)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let percents = [
            (
                "moduleSmells.weakenedModularityMaxExternalPercent",
                self.module_smells.weakened_modularity_max_external_percent,
            ),
            (
                "methodSmells.featureEnvyMaxForeignPercent",
                self.method_smells.feature_envy_max_foreign_percent,
            ),
        ];
        for (key, value) in percents {
            if value > 100 {
                return Err(invalid(key, format!("{} is not a percentage (0-100)", value)));
            }
        }

        if self.method_smells.duplicate_block_min_statements < 2 {
            return Err(invalid(
                "methodSmells.duplicateBlockMinStatements",
                "duplicate blocks need at least 2 statements".to_string(),
            ));
        }

        if self.analysis.timeout.is_zero() {
            return Err(invalid("analysis.timeout", "timeout must be positive".to_string()));
        }

        for pattern in &self.analysis.excluded_paths {
            Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Compile `analysis.excludedPaths` into one matcher.
    pub fn exclusion_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.analysis.excluded_paths {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: self.analysis.excluded_paths.join(", "),
            source,
        })
    }

    /// Effective values as flat `category.key` pairs.
    pub fn to_flat_map(&self) -> BTreeMap<String, Value> {
        let mut flat = BTreeMap::new();
        if let Ok(value) = serde_yaml::to_value(self) {
            flatten("", &value, &mut flat);
        }
        flat.insert(
            "analysis.timeout".to_string(),
            Value::String(format_duration(self.analysis.timeout)),
        );
        flat.retain(|k, _| !k.starts_with("analysis.timeout."));
        flat
    }

    /// Render the effective thresholds as an override file.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        let mut flat = self.to_flat_map();
        flat.remove("profile");
        let mut doc = serde_yaml::Mapping::new();
        doc.insert(
            Value::String("profile".to_string()),
            Value::String(self.profile.to_string()),
        );
        for (key, value) in flat {
            doc.insert(Value::String(key), value);
        }
        serde_yaml::to_string(&doc).map_err(|source| ConfigError::Syntax {
            path: PathBuf::new(),
            source,
        })
    }
}

/// Find an override file: explicit path, then the working directory, then
/// the user configuration directory.
pub fn discover_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    for name in DEFAULT_CONFIG_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }

    directories::ProjectDirs::from("", "", "archsmell")
        .map(|dirs| dirs.config_dir().join("thresholds.yaml"))
        .filter(|p| p.exists())
}

/// Flatten nested mappings into dotted keys (`a: {b: 1}` -> `a.b`).
fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&full, v, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}

fn parse_count(key: &str, value: &Value) -> Result<usize, ConfigError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(key, format!("expected a non-negative integer, got {:?}", value)))
}

fn parse_string_list(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(key, format!("expected a string, got {:?}", item)))
            })
            .collect(),
        Value::String(s) => Ok(vec![s.clone()]),
        other => Err(invalid(key, format!("expected a list of globs, got {:?}", other))),
    }
}

/// Accepts integer seconds or a string with an `ms`, `s`, `m` or `h` suffix.
fn parse_duration(key: &str, value: &Value) -> Result<Duration, ConfigError> {
    if let Some(secs) = value.as_u64() {
        return Ok(Duration::from_secs(secs));
    }
    let Some(text) = value.as_str() else {
        return Err(invalid(key, format!("expected a duration, got {:?}", value)));
    };
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| invalid(key, format!("invalid duration {:?}", text)))?;
    match unit.trim() {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => Ok(Duration::from_secs(amount)),
        "m" => scaled_secs(key, amount, 60),
        "h" => scaled_secs(key, amount, 3600),
        other => Err(invalid(key, format!("unknown duration unit {:?}", other))),
    }
}

fn scaled_secs(key: &str, amount: u64, factor: u64) -> Result<Duration, ConfigError> {
    amount
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(key, "duration out of range".to_string()))
}

/// Whole seconds when exact, milliseconds otherwise.
fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
