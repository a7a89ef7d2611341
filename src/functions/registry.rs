use super::library::{Symbol, GENOTYPE_FUNCTIONS, NAME_ALIASES};
use crate::error::{GenomusError, Result};
use crate::types::GenotypeType;
use crate::utils::numeric::{closest_value, micro_key};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::sync::OnceLock;

/// Output type -> encoded indices of the eligible functions, ascending.
pub type FunctionTypeDictionary = BTreeMap<GenotypeType, Vec<f64>>;

/// Lookup tables over the genotype function vocabulary.
///
/// Built once; read-only afterwards, so a single instance can be shared by
/// any number of concurrent derivations.
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: BTreeMap<i64, Symbol>,
    function_type_dictionary: FunctionTypeDictionary,
    default_function_type_dictionary: FunctionTypeDictionary,
    autoreference_type_dictionary: BTreeMap<GenotypeType, f64>,
    function_name_to_index: HashMap<&'static str, f64>,
    name_aliases: HashMap<&'static str, &'static str>,
}

static REGISTRY: OnceLock<Result<FunctionRegistry>> = OnceLock::new();

impl FunctionRegistry {
    /// Shared registry over the full vocabulary. Only the first call builds
    /// it; a construction failure is reported on every call.
    pub fn global() -> Result<&'static FunctionRegistry> {
        REGISTRY
            .get_or_init(|| Self::from_symbols(&GENOTYPE_FUNCTIONS))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn new() -> Result<Self> {
        Self::from_symbols(&GENOTYPE_FUNCTIONS)
    }

    pub fn from_symbols(symbols: &[Symbol]) -> Result<Self> {
        let mut registry = Self {
            functions: BTreeMap::new(),
            function_type_dictionary: BTreeMap::new(),
            default_function_type_dictionary: BTreeMap::new(),
            autoreference_type_dictionary: BTreeMap::new(),
            function_name_to_index: HashMap::new(),
            name_aliases: NAME_ALIASES.iter().copied().collect(),
        };

        for &symbol in symbols {
            registry.register(symbol)?;
        }
        registry.check_default_functions()?;

        for indices in registry
            .function_type_dictionary
            .values_mut()
            .chain(registry.default_function_type_dictionary.values_mut())
        {
            indices.sort_by(|a, b| a.total_cmp(b));
        }

        log::debug!(
            "Function registry built: {} functions over {} types",
            registry.functions.len(),
            registry.function_type_dictionary.len()
        );
        Ok(registry)
    }

    fn register(&mut self, symbol: Symbol) -> Result<()> {
        let encoded_index = symbol.encoded_index();
        let key = micro_key(encoded_index);

        if self.functions.contains_key(&key) {
            return Err(GenomusError::DuplicateIndex {
                name: symbol.name().to_string(),
                index: encoded_index,
            });
        }

        let output_type = symbol.output_type();
        self.functions.insert(key, symbol);
        self.function_type_dictionary
            .entry(output_type)
            .or_default()
            .push(encoded_index);
        self.function_name_to_index.insert(symbol.name(), encoded_index);

        if symbol.is_autoreference() {
            if self.autoreference_type_dictionary.contains_key(&output_type) {
                return Err(GenomusError::DuplicateAutoreference(output_type.to_string()));
            }
            self.autoreference_type_dictionary.insert(output_type, encoded_index);
        }

        if symbol.is_default_for_type() {
            self.default_function_type_dictionary
                .entry(output_type)
                .or_default()
                .push(encoded_index);
        }
        Ok(())
    }

    fn check_default_functions(&self) -> Result<()> {
        for ty in self.function_type_dictionary.keys() {
            match self.default_function_type_dictionary.get(ty) {
                None => return Err(GenomusError::MissingDefault(ty.to_string())),
                Some(defaults) if defaults.len() > 1 => {
                    return Err(GenomusError::DuplicateDefault {
                        ty: ty.to_string(),
                        names: defaults
                            .iter()
                            .filter_map(|&i| self.get_by_index(i))
                            .map(|s| s.name().to_string())
                            .collect(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn get_by_index(&self, encoded_index: f64) -> Option<Symbol> {
        self.functions.get(&micro_key(encoded_index)).copied()
    }

    /// Function by name, aliases included.
    pub fn get_function(&self, name: &str) -> Option<Symbol> {
        let name = self.resolve_alias(name);
        self.function_name_to_index
            .get(name)
            .and_then(|&index| self.get_by_index(index))
    }

    pub fn resolve_alias<'a>(&self, name: &'a str) -> &'a str {
        match self.name_aliases.get(name) {
            Some(canonical) => *canonical,
            None => name,
        }
    }

    /// Eligible encoded indices for `ty`: every function normally, only the
    /// type's default when `defaults_only` is set.
    pub fn candidates(&self, ty: GenotypeType, defaults_only: bool) -> &[f64] {
        let dictionary = if defaults_only {
            &self.default_function_type_dictionary
        } else {
            &self.function_type_dictionary
        };
        dictionary.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn default_function(&self, ty: GenotypeType) -> Option<Symbol> {
        self.candidates(ty, true)
            .first()
            .and_then(|&index| self.get_by_index(index))
    }

    /// Autoreference symbol producing `ty`, if the grammar has one.
    pub fn autoreference_for(&self, ty: GenotypeType) -> Option<Symbol> {
        self.autoreference_type_dictionary
            .get(&ty)
            .and_then(|&index| self.get_by_index(index))
    }

    /// Function of type `ty` whose encoded index is closest to `value`.
    ///
    /// The type's autoreference is left out unless `allow_autoreference`.
    pub fn closest_function(
        &self,
        ty: GenotypeType,
        value: f64,
        defaults_only: bool,
        allow_autoreference: bool,
    ) -> Result<Symbol> {
        let excluded = if allow_autoreference {
            None
        } else {
            self.autoreference_for(ty).map(Symbol::encoded_index)
        };

        let candidates: Vec<f64> = self
            .candidates(ty, defaults_only)
            .iter()
            .copied()
            .filter(|&index| Some(index) != excluded)
            .collect();

        closest_value(&candidates, value)
            .and_then(|index| self.get_by_index(index))
            .ok_or_else(|| GenomusError::Generation(format!("No functions return {}", ty)))
    }

    pub fn functions(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.functions.values().copied()
    }

    pub fn function_type_dictionary(&self) -> &FunctionTypeDictionary {
        &self.function_type_dictionary
    }

    pub fn print_function_type_dictionary(&self) -> String {
        let mut out = String::from("FUNCTION DICTIONARY:\n");
        for (ty, indices) in &self.function_type_dictionary {
            let names: Vec<String> = indices
                .iter()
                .filter_map(|&i| self.get_by_index(i))
                .map(|s| format!("{}({})", s.name(), s.encoded_index()))
                .collect();
            let _ = writeln!(out, "\t{}: {}", ty, names.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = FunctionRegistry::new().unwrap();
        assert_eq!(registry.functions().count(), GENOTYPE_FUNCTIONS.len());
        assert_eq!(registry.get_function("e_piano"), Some(Symbol::EPiano));
        assert_eq!(registry.get_function("e"), Some(Symbol::EPiano));
        assert_eq!(registry.get_function("nonexistent"), None);
    }

    #[test]
    fn test_global_is_idempotent() {
        let first = FunctionRegistry::global().unwrap() as *const FunctionRegistry;
        let second = FunctionRegistry::global().unwrap() as *const FunctionRegistry;
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_default_per_type() {
        let registry = FunctionRegistry::new().unwrap();
        for ty in registry.function_type_dictionary().keys() {
            assert_eq!(registry.candidates(*ty, true).len(), 1, "{ty}");
        }
        assert_eq!(registry.default_function(GenotypeType::Score), Some(Symbol::S));
        assert_eq!(registry.default_function(GenotypeType::LIntensity), Some(Symbol::Li));
    }

    #[test]
    fn test_duplicate_index_is_rejected() {
        let result = FunctionRegistry::from_symbols(&[Symbol::N, Symbol::N]);
        assert!(matches!(result, Err(GenomusError::DuplicateIndex { .. })));
    }

    #[test]
    fn test_missing_default_is_rejected() {
        let result = FunctionRegistry::from_symbols(&[Symbol::NRnd]);
        assert!(matches!(result, Err(GenomusError::MissingDefault(_))));
    }

    #[test]
    fn test_closest_function_skips_autoreference_until_allowed() {
        let registry = FunctionRegistry::new().unwrap();
        let autoref_index = Symbol::EAutoref.encoded_index();

        let without = registry
            .closest_function(GenotypeType::Event, autoref_index, false, false)
            .unwrap();
        assert_eq!(without, Symbol::EPiano);

        let with = registry
            .closest_function(GenotypeType::Event, autoref_index, false, true)
            .unwrap();
        assert_eq!(with, Symbol::EAutoref);
    }

    #[test]
    fn test_autoreference_for() {
        let registry = FunctionRegistry::new().unwrap();
        assert_eq!(registry.autoreference_for(GenotypeType::Event), Some(Symbol::EAutoref));
        assert_eq!(registry.autoreference_for(GenotypeType::Voice), Some(Symbol::VAutoref));
        assert_eq!(registry.autoreference_for(GenotypeType::MidiPitch), None);
    }

    #[test]
    fn test_defaults_only_ignores_value() {
        let registry = FunctionRegistry::new().unwrap();
        let chosen = registry
            .closest_function(GenotypeType::Voice, Symbol::VMotif.encoded_index(), true, true)
            .unwrap();
        assert_eq!(chosen, Symbol::V);
    }
}
