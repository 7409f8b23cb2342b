use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::definition::RuleSetDefinition;
use crate::error::RuleError;

/// Loads rule-set definitions from the given path (file or directory).
///
/// Documents may be JSON or YAML, each holding a single rule-set definition
/// or a list of them. Duplicate or blank rule-set names fail the load; this
/// runs at process start so configuration mistakes surface before any event
/// is consumed.
pub fn load_rule_set_definitions(
    path: impl AsRef<Path>,
) -> Result<Vec<RuleSetDefinition>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let definitions = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    validate(&definitions, path)?;
    Ok(definitions)
}

fn load_from_directory(path: &Path) -> Result<Vec<RuleSetDefinition>, RuleError> {
    let mut definitions = Vec::new();
    let mut entries: Vec<_> = fs::read_dir(path)
        .map_err(|err| RuleError::from_io(path, err))?
        .collect::<Result<_, _>>()
        .map_err(|err| RuleError::from_io(path, err))?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        if let Some(ext) = entry.path().extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                let mut file_definitions = load_from_file(&entry.path())?;
                definitions.append(&mut file_definitions);
            }
        }
    }

    Ok(definitions)
}

fn load_from_file(path: &Path) -> Result<Vec<RuleSetDefinition>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_definitions(&raw, path)
}

// YAML is a superset of the JSON documents we accept, so one parser covers
// both extensions.
fn parse_definitions(raw: &str, path: &Path) -> Result<Vec<RuleSetDefinition>, RuleError> {
    if let Ok(list) = serde_yaml::from_str::<Vec<RuleSetDefinition>>(raw) {
        return Ok(list);
    }

    if let Ok(single) = serde_yaml::from_str::<RuleSetDefinition>(raw) {
        return Ok(vec![single]);
    }

    Err(RuleError::parse_error(
        path.to_path_buf(),
        "expected a rule-set definition or a list of them",
    ))
}

fn validate(definitions: &[RuleSetDefinition], path: &Path) -> Result<(), RuleError> {
    let mut seen = HashSet::new();
    for definition in definitions {
        if definition.name.trim().is_empty() {
            return Err(RuleError::parse_error(
                path.to_path_buf(),
                "rule set with blank name",
            ));
        }
        if !seen.insert(definition.name.clone()) {
            return Err(RuleError::DuplicateSet(definition.name.clone()));
        }
    }
    Ok(())
}
