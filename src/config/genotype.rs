use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::engines::generation::arena::MAX_TREE_HEIGHT;
use crate::error::GenomusError;
use crate::types::GenotypeType;
use serde::{Deserialize, Serialize};

/// Limits steering genotype derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenotypeConfig {
    pub germinal_vector_max_length: usize,
    pub max_genotype_vector_size: usize,
    pub max_genotype_depth: usize,
    pub max_list_size: usize,
}

impl Default for GenotypeConfig {
    fn default() -> Self {
        Self {
            germinal_vector_max_length: 100,
            max_genotype_vector_size: 1000,
            max_genotype_depth: 8,
            max_list_size: 10,
        }
    }
}

impl GenotypeConfig {
    /// Leaf values below this close a list.
    pub fn list_extension_threshold(&self) -> f64 {
        (1.0 / self.max_list_size.max(1) as f64).min(0.5)
    }

    /// Whether a list holding `length` values, the last being `last_value`,
    /// takes another one.
    pub fn list_continues(&self, last_value: f64, length: usize) -> bool {
        if last_value < self.list_extension_threshold() {
            return false;
        }
        length < self.max_list_size
    }

    /// Deepest nesting a derivation, a decoded vector or a parsed expression
    /// may reach. Default-only chains past `max_genotype_depth` close well
    /// before it.
    pub fn nesting_limit(&self) -> usize {
        self.max_genotype_depth + GenotypeType::ALL.len()
    }
}

impl ConfigSection for GenotypeConfig {
    fn section_name() -> &'static str {
        "genotype"
    }

    fn validate(&self) -> Result<(), GenomusError> {
        if self.germinal_vector_max_length == 0 {
            return Err(GenomusError::Configuration(
                "Germinal vector max length must be at least 1".to_string(),
            ));
        }
        if self.max_list_size == 0 {
            return Err(GenomusError::Configuration(
                "Max list size must be at least 1".to_string(),
            ));
        }
        if self.nesting_limit() > MAX_TREE_HEIGHT {
            return Err(GenomusError::Configuration(format!(
                "Max genotype depth must be at most {}",
                MAX_TREE_HEIGHT - GenotypeType::ALL.len()
            )));
        }
        if self.max_genotype_vector_size == 0 {
            return Err(GenomusError::Configuration(
                "Max genotype vector size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Genotype".to_string(),
            fields: vec![
                FieldManifest {
                    name: "germinal_vector_max_length".to_string(),
                    field_type: "integer".to_string(),
                    default: serde_json::json!(self.germinal_vector_max_length),
                    min: Some(1.0),
                    max: None,
                    description: "Upper bound on random germinal vector length".to_string(),
                },
                FieldManifest {
                    name: "max_genotype_vector_size".to_string(),
                    field_type: "integer".to_string(),
                    default: serde_json::json!(self.max_genotype_vector_size),
                    min: Some(1.0),
                    max: None,
                    description: "Tape position past which only default functions are chosen"
                        .to_string(),
                },
                FieldManifest {
                    name: "max_genotype_depth".to_string(),
                    field_type: "integer".to_string(),
                    default: serde_json::json!(self.max_genotype_depth),
                    min: Some(0.0),
                    max: Some((MAX_TREE_HEIGHT - GenotypeType::ALL.len()) as f64),
                    description: "Depth past which only default functions are chosen".to_string(),
                },
                FieldManifest {
                    name: "max_list_size".to_string(),
                    field_type: "integer".to_string(),
                    default: serde_json::json!(self.max_list_size),
                    min: Some(1.0),
                    max: None,
                    description: "Maximum number of values in a parameter list".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_capped() {
        let config = GenotypeConfig::default();
        assert_eq!(config.list_extension_threshold(), 0.1);

        let small = GenotypeConfig {
            max_list_size: 1,
            ..GenotypeConfig::default()
        };
        assert_eq!(small.list_extension_threshold(), 0.5);
    }

    #[test]
    fn test_list_continues() {
        let config = GenotypeConfig::default();
        assert!(config.list_continues(0.7, 1));
        assert!(!config.list_continues(0.05, 1));
        assert!(!config.list_continues(0.7, 10));
    }

    #[test]
    fn test_validate() {
        assert!(GenotypeConfig::default().validate().is_ok());
        let broken = GenotypeConfig {
            max_list_size: 0,
            ..GenotypeConfig::default()
        };
        assert!(matches!(broken.validate(), Err(GenomusError::Configuration(_))));

        let too_deep = GenotypeConfig {
            max_genotype_depth: MAX_TREE_HEIGHT,
            ..GenotypeConfig::default()
        };
        assert!(matches!(too_deep.validate(), Err(GenomusError::Configuration(_))));
    }

    #[test]
    fn test_nesting_limit_covers_default_chains() {
        let config = GenotypeConfig::default();
        assert_eq!(config.nesting_limit(), 8 + GenotypeType::ALL.len());
        assert!(config.nesting_limit() <= MAX_TREE_HEIGHT);
    }

    #[test]
    fn test_manifest_lists_every_field() {
        let manifest = GenotypeConfig::default().to_manifest();
        assert_eq!(manifest.fields.len(), 4);
        assert_eq!(manifest.fields[3].default, serde_json::json!(10));
    }
}
