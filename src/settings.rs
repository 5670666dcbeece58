//! Run settings - read once to build the transformer and the index

use crate::error::{ConfigurationError, Result};
use crate::transform::{KmerLayout, Transformer, TransformerKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Configuration of one indexing run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// K-mer length (K)
    pub kmer_length: usize,
    /// Number of leading (transformed) symbols selecting the shard
    pub prefix_length: usize,
    /// Transformer selector, see [`crate::transform::AVAILABLE_METHODS`]
    pub method: String,
    /// Number of groups the shard sizes are binned into
    pub nb_bins: usize,
    /// Queue capacity, rounded up to a power of two
    pub queue_size: usize,
    /// Processor pool size (None = heuristic from the hardware thread count)
    pub processors: Option<usize>,
    /// Experiment tag reported in the first column of the output table
    pub tag: String,
    pub verbose: bool,
    /// Sample the queue occupancy while collectors run
    pub watch_queue: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kmer_length: 21,
            prefix_length: 10,
            method: "identity".to_string(),
            nb_bins: 100,
            queue_size: 1024,
            processors: None,
            tag: String::new(),
            verbose: true,
            watch_queue: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields keep their default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let settings = serde_json::from_reader(reader)?;
        Ok(settings)
    }

    pub fn layout(&self) -> std::result::Result<KmerLayout, ConfigurationError> {
        KmerLayout::new(self.kmer_length, self.prefix_length)
    }

    pub fn transformer_kind(&self) -> std::result::Result<TransformerKind, ConfigurationError> {
        self.method.parse()
    }

    /// Check every field without building anything.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.layout()?;
        self.transformer_kind()?;
        if self.nb_bins == 0 {
            return Err(ConfigurationError::InvalidBinCount);
        }
        if self.queue_size == 0 {
            return Err(ConfigurationError::InvalidQueueSize);
        }
        Ok(())
    }

    /// Resolve the method selector into a transformer for this layout.
    pub fn transformer(&self) -> std::result::Result<Arc<dyn Transformer>, ConfigurationError> {
        let layout = self.layout()?;
        self.transformer_kind()?.build(layout)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- kmer_length: {}", self.kmer_length)?;
        writeln!(f, "- prefix_length: {}", self.prefix_length)?;
        writeln!(f, "- method: {}", self.method)?;
        writeln!(f, "- nb_bins: {}", self.nb_bins)?;
        writeln!(f, "- queue_size: {}", self.queue_size)?;
        match self.processors {
            Some(n) => writeln!(f, "- processors: {}", n)?,
            None => writeln!(f, "- processors: auto")?,
        }
        writeln!(f, "- tag: {}", self.tag)?;
        writeln!(f, "- verbose: {}", self.verbose)?;
        write!(f, "- watch_queue: {}", self.watch_queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.validate(), Ok(()));
        let transformer = settings.transformer().unwrap();
        assert_eq!(transformer.kmer_length(), 21);
        assert_eq!(transformer.prefix_length(), 10);
        assert_eq!(transformer.description(), "Identity");
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings {
            prefix_length: 0,
            ..Settings::default()
        };
        assert_eq!(settings.validate(), Err(ConfigurationError::InvalidPrefixLength(0)));

        settings.prefix_length = 21;
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::PrefixNotShorterThanKmer { .. })
        ));

        settings.prefix_length = 10;
        settings.method = "lyndon".to_string();
        assert_eq!(
            settings.validate(),
            Err(ConfigurationError::UnknownTransformer("lyndon".to_string()))
        );

        settings.method = "cyclic".to_string();
        settings.nb_bins = 0;
        assert_eq!(settings.validate(), Err(ConfigurationError::InvalidBinCount));

        settings.nb_bins = 10;
        settings.queue_size = 0;
        assert_eq!(settings.validate(), Err(ConfigurationError::InvalidQueueSize));
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "kmer_length": 31, "method": "zigzag", "processors": 4 }}"#).unwrap();

        let settings = Settings::from_json_file(file.path()).unwrap();
        assert_eq!(settings.kmer_length, 31);
        assert_eq!(settings.method, "zigzag");
        assert_eq!(settings.processors, Some(4));
        assert_eq!(settings.prefix_length, 10);
        assert_eq!(settings.queue_size, 1024);
        assert_eq!(settings.transformer().unwrap().description(), "ZigZag");
    }

    #[test]
    fn test_display_summary() {
        let text = Settings::default().to_string();
        assert!(text.contains("- kmer_length: 21"));
        assert!(text.contains("- processors: auto"));
    }
}
