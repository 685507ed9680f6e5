use crate::config::{FunctionConfig, ValidationError};
use crate::resource::ResourceList;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Path meaning stdin for input and stdout for output
pub const STDIO_PATH: &str = "-";

/// Serialization format of the output `ResourceList`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Parse a `ResourceList` from a reader. JSON input is accepted as YAML.
pub fn read_resource_list<R: Read>(reader: R) -> Result<ResourceList> {
    let list: ResourceList =
        serde_yaml::from_reader(reader).wrap_err("Failed to parse ResourceList")?;
    info!("Read ResourceList with {} items", list.items.len());
    Ok(list)
}

/// Load a `ResourceList` from a file, or from stdin when the path is `-`
pub fn load_resource_list(path: &Path) -> Result<ResourceList> {
    if path == Path::new(STDIO_PATH) {
        info!("Loading ResourceList from stdin");
        return read_resource_list(std::io::stdin().lock());
    }

    info!("Loading ResourceList from: {:?}", path);
    let file = std::fs::File::open(path)
        .wrap_err_with(|| format!("Failed to open input file '{}'", path.display()))?;
    read_resource_list(file)
}

fn scalar_to_string(key: &str, value: &serde_yaml::Value) -> Result<String, ValidationError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        _ => Err(ValidationError::InvalidFunctionConfig(format!(
            "value of '{}' must be a scalar",
            key
        ))),
    }
}

/// Extract the function configuration from `ResourceList.functionConfig`.
///
/// The config is a ConfigMap-style object; only its `data` is read. A missing
/// function config yields the defaults.
pub fn function_config(list: &ResourceList) -> Result<FunctionConfig, ValidationError> {
    let Some(raw) = &list.function_config else {
        return Ok(FunctionConfig::default());
    };

    let data = match raw.get("data") {
        None | Some(serde_yaml::Value::Null) => BTreeMap::new(),
        Some(serde_yaml::Value::Mapping(mapping)) => {
            let mut data = BTreeMap::new();
            for (key, value) in mapping {
                let key = key.as_str().ok_or_else(|| {
                    ValidationError::InvalidFunctionConfig("data keys must be strings".to_string())
                })?;
                data.insert(key.to_string(), scalar_to_string(key, value)?);
            }
            data
        }
        Some(_) => {
            return Err(ValidationError::InvalidFunctionConfig(
                "data must be a mapping".to_string(),
            ))
        }
    };

    FunctionConfig::from_data(&data)
}

/// Render a `ResourceList` in the requested format
pub fn render_resource_list(list: &ResourceList, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(list).wrap_err("Failed to render ResourceList as YAML")?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(list).wrap_err("Failed to render ResourceList as JSON")?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

/// Write a `ResourceList` to a file, or to stdout when the path is `-`
pub fn write_resource_list(path: &Path, list: &ResourceList, format: OutputFormat) -> Result<()> {
    let rendered = render_resource_list(list, format)?;

    if path == Path::new(STDIO_PATH) {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes()).wrap_err("Failed to write to stdout")?;
        stdout.flush().wrap_err("Failed to flush stdout")?;
        return Ok(());
    }

    std::fs::write(path, rendered)
        .wrap_err_with(|| format!("Failed to write output file '{}'", path.display()))?;
    info!("Wrote ResourceList to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RESOURCE_LIST: &str = r#"
apiVersion: config.kubernetes.io/v1
kind: ResourceList
functionConfig:
  apiVersion: v1
  kind: ConfigMap
  metadata:
    name: fabric-config
  data:
    region: eu-west-1
    prefixLength: 22
items:
  - apiVersion: topo.yndd.io/v1alpha1
    kind: Definition
    metadata:
      name: dc1
      namespace: default
"#;

    #[test]
    fn test_load_resource_list() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", RESOURCE_LIST).unwrap();

        let list = load_resource_list(temp_file.path()).unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(list.function_config.is_some());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_resource_list(Path::new("/nonexistent/resources.yaml")).unwrap_err();
        assert!(format!("{}", err).contains("Failed to open input file"));
    }

    #[test]
    fn test_function_config_from_config_map() {
        let list = read_resource_list(RESOURCE_LIST.as_bytes()).unwrap();
        let config = function_config(&list).unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.prefix_length, 22);
        assert_eq!(config.network_instance, "vpc-mgmt-fabric");
    }

    #[test]
    fn test_function_config_defaults_when_absent() {
        let list = ResourceList::default();
        assert_eq!(function_config(&list).unwrap(), FunctionConfig::default());
    }

    #[test]
    fn test_function_config_rejects_nested_values() {
        let list = read_resource_list(
            r#"
functionConfig:
  data:
    region: [a, b]
"#
            .as_bytes(),
        )
        .unwrap();
        assert!(matches!(function_config(&list), Err(ValidationError::InvalidFunctionConfig(_))));
    }

    #[test]
    fn test_write_and_reload_json() {
        let list = read_resource_list(RESOURCE_LIST.as_bytes()).unwrap();
        let temp_file = NamedTempFile::new().unwrap();

        write_resource_list(temp_file.path(), &list, OutputFormat::Json).unwrap();
        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.trim_start().starts_with('{'));

        let reloaded = load_resource_list(temp_file.path()).unwrap();
        assert_eq!(reloaded, list);
    }
}
