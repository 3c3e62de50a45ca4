//! Rule providers and the explicit provider registry.
//!
//! A [`RuleProvider`] contributes a map from stable rule identifiers to
//! rules. Providers are not discovered reflectively: the host registers a
//! factory per provider in a [`ProviderRegistry`], optionally narrowed to the
//! providers listed in a [`ProviderManifest`] that was generated ahead of the
//! run.
//!
//! ```rust
//! use archrules_core::lang::{classes, ClassCondition};
//! use archrules_core::registry::{ProviderRegistry, RuleProvider, RuleSet};
//! use archrules_core::Result;
//!
//! #[derive(Default)]
//! struct NoDeprecation;
//!
//! impl RuleProvider for NoDeprecation {
//!     fn rules(&self) -> Result<RuleSet> {
//!         let mut rules = RuleSet::new();
//!         rules.insert(
//!             "no-deprecated".to_string(),
//!             Box::new(classes().should(ClassCondition::not_be_annotated_with("Deprecated"))),
//!         );
//!         Ok(rules)
//!     }
//! }
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register::<NoDeprecation>();
//! assert_eq!(registry.len(), 1);
//! ```

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ArchRulesError, Result};
use crate::rule::ArchRule;

/// Rules of one provider, keyed by their stable identifier.
pub type RuleSet = BTreeMap<String, Box<dyn ArchRule>>;

/// A pluggable source of rules.
pub trait RuleProvider: Send + Sync {
    /// Returns the provider's rules. An empty set is valid.
    ///
    /// # Errors
    ///
    /// Any error is treated as a fatal discovery fault.
    fn rules(&self) -> Result<RuleSet>;
}

type ProviderFactory = Box<dyn Fn() -> Result<Box<dyn RuleProvider>> + Send + Sync>;

struct RegistryEntry {
    name: String,
    factory: ProviderFactory,
}

/// A provider instantiated for one run, with its rules already supplied.
pub struct DiscoveredProvider {
    /// Fully-qualified provider name; override prefixes match against it.
    pub name: String,
    pub rules: RuleSet,
}

impl fmt::Debug for DiscoveredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredProvider")
            .field("name", &self.name)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Explicit, per-run registry of provider factories.
///
/// Iteration follows registration order. Rule outcomes never depend on that
/// order.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `P` under its Rust type path, e.g. `acme::rules::NoCycles`.
    pub fn register<P>(&mut self) -> &mut Self
    where
        P: RuleProvider + Default + 'static,
    {
        self.register_factory(type_name::<P>(), || Ok(Box::new(P::default())))
    }

    /// Registers a factory under an explicit name. A name registered twice keeps the later factory.
    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn RuleProvider>> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: ProviderFactory = Box::new(factory);
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => existing.factory = factory,
            None => self.entries.push(RegistryEntry { name, factory }),
        }
        self
    }

    /// Registered provider names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the providers listed in `manifest`, in manifest order.
    /// A name listed more than once is selected at its first position.
    ///
    /// # Errors
    ///
    /// Returns a [`ArchRulesError::DiscoveryError`] for a listed provider that is not registered.
    pub fn select(mut self, manifest: &ProviderManifest) -> Result<Self> {
        let mut selected = Vec::with_capacity(manifest.providers.len());
        for name in &manifest.providers {
            if selected.iter().any(|e: &RegistryEntry| &e.name == name) {
                continue;
            }
            let position = self
                .entries
                .iter()
                .position(|e| &e.name == name)
                .ok_or_else(|| {
                    ArchRulesError::discovery_error(name, "listed in the manifest but not registered")
                })?;
            selected.push(self.entries.swap_remove(position));
        }
        Ok(Self { entries: selected })
    }

    /// Builds the manifest describing the current registry contents.
    pub fn manifest(&self) -> ProviderManifest {
        ProviderManifest {
            providers: self.names().map(str::to_string).collect(),
        }
    }

    /// Instantiates every provider and collects its rules.
    ///
    /// # Errors
    ///
    /// Fails on the first provider whose factory or rule map fails.
    pub fn discover(&self) -> Result<Vec<DiscoveredProvider>> {
        let mut discovered = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let provider = (entry.factory)().map_err(|e| discovery_fault(&entry.name, e))?;
            let rules = provider
                .rules()
                .map_err(|e| discovery_fault(&entry.name, e))?;
            tracing::debug!(provider = %entry.name, rules = rules.len(), "Discovered rule provider");
            discovered.push(DiscoveredProvider {
                name: entry.name.clone(),
                rules,
            });
        }
        tracing::info!(
            "Rule classes detected: {}",
            discovered
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        Ok(discovered)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn discovery_fault(provider: &str, err: ArchRulesError) -> ArchRulesError {
    match err {
        already @ ArchRulesError::DiscoveryError { .. } => already,
        other => ArchRulesError::DiscoveryError {
            provider: provider.to_string(),
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

/// Newline-separated list of provider names, generated before a run.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderManifest {
    pub providers: Vec<String>,
}

impl ProviderManifest {
    pub fn parse(content: &str) -> Self {
        let providers = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { providers }
    }

    /// Reads a manifest file.
    ///
    /// # Errors
    ///
    /// A missing or unreadable manifest is a discovery fault.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ArchRulesError::DiscoveryError {
            provider: path.display().to_string(),
            message: "failed to read provider manifest".to_string(),
            source: Some(Box::new(e)),
        })?;
        Ok(Self::parse(&content))
    }

    pub fn render(&self) -> String {
        self.providers.join("\n")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ArchRulesError::io_error_with_source("create manifest directory", parent.to_path_buf(), e)
            })?;
        }
        fs::write(path, self.render())
            .map_err(|e| ArchRulesError::io_error_with_source("write manifest", path.to_path_buf(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{classes, ClassCondition};
    use tempfile::TempDir;

    #[derive(Default)]
    struct TwoRules;

    impl RuleProvider for TwoRules {
        fn rules(&self) -> Result<RuleSet> {
            let mut rules = RuleSet::new();
            rules.insert(
                "b".to_string(),
                Box::new(classes().should(ClassCondition::not_be_in_dependency_cycle())),
            );
            rules.insert(
                "a".to_string(),
                Box::new(classes().should(ClassCondition::not_be_annotated_with("Deprecated"))),
            );
            Ok(rules)
        }
    }

    #[derive(Default)]
    struct Empty;

    impl RuleProvider for Empty {
        fn rules(&self) -> Result<RuleSet> {
            Ok(RuleSet::new())
        }
    }

    struct Broken;

    impl RuleProvider for Broken {
        fn rules(&self) -> Result<RuleSet> {
            Err(ArchRulesError::invalid_input("rule map unavailable"))
        }
    }

    #[test]
    fn test_register_uses_type_path() {
        let mut registry = ProviderRegistry::new();
        registry.register::<TwoRules>();
        let name = registry.names().next().unwrap().to_string();
        assert!(name.ends_with("registry::tests::TwoRules"), "got {name}");
    }

    #[test]
    fn test_discover_collects_rules_and_allows_empty_providers() {
        let mut registry = ProviderRegistry::new();
        registry.register::<TwoRules>().register::<Empty>();
        let discovered = registry.discover().unwrap();
        assert_eq!(discovered.len(), 2);
        assert_eq!(
            discovered[0].rules.keys().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(discovered[1].rules.is_empty());
    }

    #[test]
    fn test_failing_provider_is_discovery_fault() {
        let mut registry = ProviderRegistry::new();
        registry.register_factory("acme.Broken", || Ok(Box::new(Broken)));
        let err = registry.discover().unwrap_err();
        assert!(
            matches!(&err, ArchRulesError::DiscoveryError { provider, .. } if provider == "acme.Broken")
        );
        assert!(err.to_string().contains("rule map unavailable"));
    }

    #[test]
    fn test_failing_factory_is_discovery_fault() {
        let mut registry = ProviderRegistry::new();
        registry.register_factory("acme.Unbuildable", || {
            Err(ArchRulesError::invalid_input("no default constructor"))
        });
        assert!(matches!(
            registry.discover(),
            Err(ArchRulesError::DiscoveryError { .. })
        ));
    }

    #[test]
    fn test_register_same_name_twice_replaces_factory() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_factory("acme.Rules", || Ok(Box::new(Broken)))
            .register_factory("acme.Rules", || Ok(Box::new(Empty)));
        assert_eq!(registry.len(), 1);
        assert!(registry.discover().is_ok());
    }

    #[test]
    fn test_select_follows_manifest() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_factory("one", || Ok(Box::new(Empty)))
            .register_factory("two", || Ok(Box::new(Empty)))
            .register_factory("three", || Ok(Box::new(Empty)));
        let manifest = ProviderManifest::parse("# generated\nthree\n\none\n");
        let selected = registry.select(&manifest).unwrap();
        assert_eq!(selected.names().collect::<Vec<_>>(), vec!["three", "one"]);
    }

    #[test]
    fn test_select_tolerates_repeated_manifest_entries() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_factory("one", || Ok(Box::new(Empty)))
            .register_factory("two", || Ok(Box::new(Empty)));
        let manifest = ProviderManifest::parse("one\ntwo\none\n");
        let selected = registry.select(&manifest).unwrap();
        assert_eq!(selected.names().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_select_unknown_provider_fails() {
        let registry = ProviderRegistry::new();
        let manifest = ProviderManifest::parse("acme.Missing");
        let err = registry.select(&manifest).unwrap_err();
        assert!(matches!(err, ArchRulesError::DiscoveryError { .. }));
    }

    #[test]
    fn test_manifest_write_then_load() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("META-INF").join("providers");
        let manifest = ProviderManifest {
            providers: vec!["a::One".to_string(), "b::Two".to_string()],
        };
        manifest.write(&path).unwrap();
        assert_eq!(ProviderManifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn test_missing_manifest_is_discovery_fault() {
        let err = ProviderManifest::load(Path::new("/nonexistent/manifest")).unwrap_err();
        assert!(matches!(err, ArchRulesError::DiscoveryError { .. }));
    }
}
