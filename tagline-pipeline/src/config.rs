use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tagline_core::serde_utils;
use tagline_rules::{load_rule_set_definitions, DeclarativeRuleProvider, RuleEngine};

use crate::assignment::TagAssignmentService;
use crate::error::PipelineError;
use crate::pipeline::TaggingPipeline;
use crate::selector::RuleSetSelector;

const CONFIG_PATH_VAR: &str = "TAGLINE_PIPELINE_CONFIG";

/// Declarative pipeline configuration, loaded once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// File or directory holding rule-set definition documents.
    pub rules_path: PathBuf,
    /// Event name → rule-set names to run for it.
    #[serde(default)]
    pub triggers: BTreeMap<String, Vec<String>>,
    /// Actor recorded on automated assignments. `None` = fully automated.
    #[serde(default)]
    pub applied_by: Option<String>,
    #[serde(default = "PipelineConfig::default_worker_count")]
    pub worker_count: usize,
}

impl PipelineConfig {
    fn default_worker_count() -> usize {
        4
    }

    /// Reads the configuration from a JSON or YAML document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_utils::from_json_str(&raw).map_err(|err| {
                PipelineError::Config(format!("failed to parse {}: {}", path.display(), err))
            })
        } else {
            serde_yaml::from_str(&raw).map_err(|err| {
                PipelineError::Config(format!("failed to parse {}: {}", path.display(), err))
            })
        }
    }

    /// Resolves the configuration file path from `TAGLINE_PIPELINE_CONFIG`.
    pub fn from_env() -> Result<Self, PipelineError> {
        let path = env::var(CONFIG_PATH_VAR)
            .map_err(|_| PipelineError::Config(format!("{} is not set", CONFIG_PATH_VAR)))?;
        Self::from_path(path)
    }

    pub fn selector(&self) -> RuleSetSelector {
        RuleSetSelector::new(self.triggers.clone())
    }

    /// Loads and compiles the configured declarative rule sets.
    ///
    /// This is the startup validation pass: unparseable conditions, duplicate
    /// set names and blank names all fail here, before any event is consumed.
    pub fn load_engine(&self) -> Result<RuleEngine, PipelineError> {
        let definitions = load_rule_set_definitions(&self.rules_path)?;
        let provider = DeclarativeRuleProvider::new("config", &definitions)?;
        Ok(RuleEngine::new(vec![Box::new(provider)]))
    }

    /// Builds the full pipeline against the given assignment service.
    pub fn build_pipeline(
        &self,
        assignments: Arc<dyn TagAssignmentService>,
    ) -> Result<TaggingPipeline, PipelineError> {
        Ok(TaggingPipeline::new(
            self.load_engine()?,
            self.selector(),
            assignments,
            self.applied_by.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create file");
        file.write_all(contents.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn loads_yaml_configuration_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "pipeline.yaml",
            "rules_path: /etc/tagline/rules\ntriggers:\n  DocumentUploaded:\n    - invoice-rules\n",
        );

        let config = PipelineConfig::from_path(path).expect("load");
        assert_eq!(config.rules_path, PathBuf::from("/etc/tagline/rules"));
        assert_eq!(config.worker_count, 4);
        assert!(config.applied_by.is_none());
        assert_eq!(
            config.selector().select("documentuploaded"),
            &["invoice-rules".to_string()]
        );
    }

    #[test]
    fn loads_json_configuration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "pipeline.json",
            r#"{"rules_path": "/etc/tagline/rules", "applied_by": "system-tagger", "worker_count": 2}"#,
        );

        let config = PipelineConfig::from_path(path).expect("load");
        assert_eq!(config.applied_by.as_deref(), Some("system-tagger"));
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn startup_validation_rejects_malformed_conditions() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "rules.yaml",
            "name: broken-rules\nrules:\n  - name: broken\n    condition: \"amount ~ 100\"\n",
        );

        let config = PipelineConfig {
            rules_path: dir.path().to_path_buf(),
            triggers: BTreeMap::new(),
            applied_by: None,
            worker_count: 1,
        };

        let err = config.load_engine().expect_err("should fail");
        assert!(matches!(err, PipelineError::Rules(_)));
    }

    #[test]
    fn valid_rules_load_into_an_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "rules.yaml",
            "name: invoice-rules\nrules:\n  - name: tag-invoice\n    condition: category == invoice\n    set:\n      tagIds:\n        - T-INVOICE\n",
        );

        let config = PipelineConfig {
            rules_path: dir.path().to_path_buf(),
            triggers: BTreeMap::new(),
            applied_by: None,
            worker_count: 1,
        };

        let engine = config.load_engine().expect("load");
        assert_eq!(engine.rule_set_names(), vec!["invoice-rules".to_string()]);
    }
}
