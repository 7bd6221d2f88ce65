use crate::config::GeneratorConfig;
use crate::core::loader::CapabilityLoader;
use crate::core::transcriber::Transcriber;
use crate::domain::model::OutputConfig;
use crate::domain::ports::{CapabilitySource, Storage};
use crate::utils::error::Result;
use crate::utils::validation::validate_output_path;

/// Runs one generation: fetch capabilities, transcribe, serialize, write.
pub struct MapproxyGenerator<C: CapabilitySource, S: Storage> {
    loader: CapabilityLoader<C>,
    storage: S,
    config: GeneratorConfig,
}

impl<C: CapabilitySource, S: Storage> MapproxyGenerator<C, S> {
    pub fn new(source: C, storage: S, config: GeneratorConfig) -> Self {
        Self {
            loader: CapabilityLoader::new(source, config.retry.clone()),
            storage,
            config,
        }
    }

    pub async fn build(&self) -> Result<OutputConfig> {
        let doc = self
            .loader
            .load(&self.config.url, &self.config.version)
            .await?;
        Transcriber::new(&self.config.url).transcribe(&doc)
    }

    /// The configuration document as YAML, without writing it anywhere.
    pub async fn render(&self) -> Result<String> {
        let output = self.build().await?;
        to_yaml(&output)
    }

    /// Writes the configuration and returns the path it went to.
    pub async fn run(&self) -> Result<String> {
        let yaml = self.render().await?;
        let path = validate_output_path("output", &self.config.output)?.to_string();

        tracing::debug!("Writing {} bytes to {}", yaml.len(), path);
        self.storage.write_file(&path, yaml.as_bytes()).await?;

        Ok(path)
    }
}

/// Unicode text is written as-is; strings a YAML 1.1 reader would retype are quoted.
pub fn to_yaml(output: &OutputConfig) -> Result<String> {
    crate::adapters::yaml::to_yaml(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BoundingBox, CapabilityDocument, LayerNode};
    use crate::utils::error::GeneratorError;
    use crate::utils::retry::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct StaticSource(CapabilityDocument);

    #[async_trait]
    impl CapabilitySource for StaticSource {
        async fn fetch(&self, _url: &str, _version: &str) -> Result<CapabilityDocument> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CapabilitySource for FailingSource {
        async fn fetch(&self, url: &str, _version: &str) -> Result<CapabilityDocument> {
            Err(GeneratorError::HttpStatusError {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn sample() -> CapabilityDocument {
        CapabilityDocument {
            version: "1.1.1".to_string(),
            service_title: Some("Topo".to_string()),
            root: LayerNode::group(
                "Topografisk norgeskart",
                vec![
                    LayerNode::Leaf {
                        name: Some("Fylker".to_string()),
                        title: Some("Fylker".to_string()),
                        bbox: Some(BoundingBox::new(-5.0, 58.0, 31.0, 71.0)),
                    },
                    LayerNode::group(
                        "Vann",
                        vec![
                            LayerNode::leaf("Innsjøer", "Innsjøer"),
                            LayerNode::leaf("Elver", "Elver"),
                        ],
                    ),
                ],
            ),
        }
    }

    fn config() -> GeneratorConfig {
        let mut config = GeneratorConfig::new("https://wms.example.no/wms.topo");
        config.retry = RetryPolicy::default().with_initial_delay(Duration::from_millis(5));
        config
    }

    #[tokio::test]
    async fn test_run_writes_yaml_to_output_path() {
        let storage = MockStorage::new();
        let generator = MapproxyGenerator::new(StaticSource(sample()), storage.clone(), config());

        let path = generator.run().await.unwrap();
        assert_eq!(path, "mapproxy.yaml");

        let written = storage.get_file("mapproxy.yaml").await.unwrap();
        let yaml = String::from_utf8(written).unwrap();
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();

        assert_eq!(value["services"]["wms"]["md"]["title"], "Topografisk norgeskart");
        assert_eq!(value["sources"]["fylker"]["coverage"]["srs"], "EPSG:4326");
        assert_eq!(value["sources"]["innsjoer"]["req"]["layers"], "Innsjøer");
        assert_eq!(value["layers"][1]["layers"][0]["sources"][0], "innsjoer");
    }

    #[tokio::test]
    async fn test_yaml_layout() {
        let generator = MapproxyGenerator::new(StaticSource(sample()), MockStorage::new(), config());
        let yaml = generator.render().await.unwrap();

        // Sorted top-level keys, literal unicode, no null coverage.
        assert!(yaml.starts_with("layers:"));
        let services = yaml.find("\nservices:").unwrap();
        let sources = yaml.find("\nsources:").unwrap();
        assert!(services < sources);
        assert!(yaml.contains("Innsjøer"));
        assert!(!yaml.contains("null"));
        assert!(yaml.contains("demo: {}"));
        assert!(yaml.contains("type: wms_retry"));
        assert!(yaml.contains("error_message: Overforbruk"));
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let storage = MockStorage::new();
        let generator = MapproxyGenerator::new(FailingSource, storage.clone(), config());

        let err = generator.run().await.unwrap_err();
        assert!(matches!(err, GeneratorError::HttpStatusError { status: 404, .. }));
        assert!(storage.get_file("mapproxy.yaml").await.is_none());
    }

    #[tokio::test]
    async fn test_yaml11_lookalike_layer_names_stay_strings() {
        let names = ["NO", "on", "Off", "1:50", "1_000", "0x1F", "1.0"];
        let doc = CapabilityDocument {
            version: "1.1.1".to_string(),
            service_title: None,
            root: LayerNode::group(
                "Norge",
                names.iter().map(|n| LayerNode::leaf(n, n)).collect(),
            ),
        };
        let generator = MapproxyGenerator::new(StaticSource(doc), MockStorage::new(), config());
        let yaml = generator.render().await.unwrap();

        assert!(yaml.contains("layers: \"NO\""));
        assert!(yaml.contains("layers: \"1:50\""));
        assert!(yaml.contains("\n  \"no\":\n"));
        assert!(yaml.contains("\n  \"off\":\n"));
        assert!(yaml.contains("\n  \"on\":\n"));
        assert!(yaml.contains("  - \"no\"\n"));

        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        let sources = value["sources"].as_mapping().unwrap();
        assert_eq!(sources.len(), names.len());
        assert!(sources.keys().all(|k| k.is_string()));
        for (i, name) in names.iter().enumerate() {
            let slug = value["layers"][i]["sources"][0].as_str().unwrap();
            assert_eq!(value["sources"][slug]["req"]["layers"].as_str(), Some(*name));
            assert_eq!(value["layers"][i]["title"].as_str(), Some(*name));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_output_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let storage = MockStorage::new();
        let mut config = config();
        config.output = OsStr::from_bytes(b"map\xffproxy.yaml").into();
        let generator = MapproxyGenerator::new(StaticSource(sample()), storage.clone(), config);

        let err = generator.run().await.unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfigValueError { .. }));
        assert!(storage.files.lock().await.is_empty());
    }
}
