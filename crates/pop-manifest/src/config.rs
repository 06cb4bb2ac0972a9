//! # Pipeline Configuration
//!
//! [`PipelineConfig`] gathers every option of a run. It parses from YAML:
//!
//! ```yaml
//! schema:
//!   source_format: fixed
//! decode:
//!   charset: { ebcdic: cp037 }
//!   mode: lenient
//! merkle:
//!   fanout: 4
//!   workers: 8
//! commit_fields:
//!   - ACCT-ID
//!   - LINES.AMOUNT
//! ```
//!
//! Every section is optional and unknown keys are rejected. The commitment
//! master key is never part of the configuration. Reading the file is the
//! caller's concern.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pop_crypto::MerkleOptions;
use pop_decode::DecodeOptions;
use pop_schema::SchemaOptions;

use crate::builder::CryptoOptions;

/// Errors in pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The YAML text did not parse into a configuration.
    #[error("invalid configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// All options for compile, decode, tree construction, and commitments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Schema compilation.
    pub schema: SchemaOptions,
    /// Record decoding and canonicalization.
    pub decode: DecodeOptions,
    /// Merkle fanout and worker count.
    pub merkle: MerkleOptions,
    /// Field paths to commit to, with or without subscripts.
    pub commit_fields: Vec<String>,
}

impl PipelineConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.merkle
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.schema.max_record_length == 0 {
            return Err(ConfigError::Invalid("schema.max_record_length must be positive".into()));
        }
        let mut seen = BTreeSet::new();
        for field in &self.commit_fields {
            if field.trim().is_empty() {
                return Err(ConfigError::Invalid("commit_fields entries must not be empty".into()));
            }
            if !seen.insert(field.as_str()) {
                return Err(ConfigError::Invalid(format!("commit field {field:?} listed twice")));
            }
        }
        Ok(())
    }

    /// The tree and commitment options.
    pub fn crypto_options(&self) -> CryptoOptions {
        CryptoOptions {
            merkle: self.merkle,
            commit_fields: self.commit_fields.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_decode::{Charset, CodePage, Mode};
    use pop_schema::SourceFormat;

    #[test]
    fn empty_yaml_is_default() {
        let config = PipelineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn full_yaml() {
        let config = PipelineConfig::from_yaml_str(
            "
schema:
  source_format: fixed
decode:
  charset: { ebcdic: cp037 }
  mode: lenient
merkle:
  fanout: 4
  workers: 8
commit_fields:
  - ACCT-ID
  - LINES.AMOUNT
",
        )
        .unwrap();
        assert_eq!(config.schema.source_format, SourceFormat::Fixed);
        assert_eq!(config.decode.charset, Charset::Ebcdic(CodePage::Cp037));
        assert_eq!(config.decode.mode, Mode::Lenient);
        assert_eq!(config.merkle.fanout, 4);
        assert_eq!(config.merkle.workers, 8);
        assert_eq!(config.crypto_options().commit_fields, vec!["ACCT-ID", "LINES.AMOUNT"]);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            PipelineConfig::from_yaml_str("decoder: {}"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(PipelineConfig::from_yaml_str("decode: { charset: utf8 }").is_err());
    }

    #[test]
    fn validation() {
        assert!(matches!(
            PipelineConfig::from_yaml_str("merkle: { fanout: 1 }"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(PipelineConfig::from_yaml_str("commit_fields: [A, A]").is_err());
        assert!(PipelineConfig::from_yaml_str("commit_fields: ['  ']").is_err());
        assert!(PipelineConfig::from_yaml_str("schema: { max_record_length: 0 }").is_err());
    }
}
