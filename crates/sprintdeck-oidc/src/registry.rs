//! Provider registry: static slug-to-configuration mapping.

use std::collections::HashMap;

use tracing::warn;

use crate::errors::{OidcError, Result};
use crate::types::{ProviderConfig, ProviderDefinition, DEFAULT_SCOPES};

/// Registry of configured identity providers.
///
/// Built once at startup from configuration and never mutated; handlers share
/// it behind an `Arc`.
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
    // Insertion order, so the providers endpoint lists them as configured
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Build a registry from provider definitions.
    ///
    /// Scope defaults (`openid email profile`) are applied here. A duplicate
    /// slug keeps the first definition; the duplicate is dropped with a
    /// warning.
    pub fn new(definitions: Vec<ProviderDefinition>) -> Self {
        let mut providers = HashMap::new();
        let mut order = Vec::new();

        for def in definitions {
            if providers.contains_key(&def.slug) {
                warn!(slug = %def.slug, "Duplicate provider slug in configuration, ignoring");
                continue;
            }

            let scopes = match def.scopes {
                Some(scopes) if !scopes.is_empty() => scopes,
                _ => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            };

            order.push(def.slug.clone());
            providers.insert(
                def.slug.clone(),
                ProviderConfig {
                    slug: def.slug,
                    name: def.name,
                    issuer_url: def.issuer_url,
                    discovery_url: def.discovery_url,
                    client_id: def.client_id,
                    client_secret: def.client_secret,
                    scopes,
                    enabled: def.enabled,
                },
            );
        }

        Self { providers, order }
    }

    /// Resolve a provider slug for login use.
    pub fn get(&self, slug: &str) -> Result<&ProviderConfig> {
        let provider = self
            .providers
            .get(slug)
            .ok_or_else(|| OidcError::ProviderNotFound(slug.to_string()))?;

        if !provider.enabled {
            return Err(OidcError::ProviderDisabled(slug.to_string()));
        }

        Ok(provider)
    }

    /// All enabled providers, in configuration order.
    pub fn enabled(&self) -> Vec<&ProviderConfig> {
        self.order
            .iter()
            .filter_map(|slug| self.providers.get(slug))
            .filter(|p| p.enabled)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(slug: &str, enabled: bool) -> ProviderDefinition {
        ProviderDefinition {
            slug: slug.to_string(),
            name: format!("{} IdP", slug),
            issuer_url: format!("https://{}.example", slug),
            discovery_url: None,
            client_id: "spd-client".to_string(),
            client_secret: "s3cret".to_string(),
            scopes: None,
            enabled,
        }
    }

    #[test]
    fn test_get_unknown_slug() {
        let registry = ProviderRegistry::new(vec![definition("dex", true)]);
        assert!(matches!(
            registry.get("nope"),
            Err(OidcError::ProviderNotFound(_))
        ));
    }

    #[test]
    fn test_get_disabled_provider() {
        let registry = ProviderRegistry::new(vec![definition("dex", false)]);
        assert!(matches!(
            registry.get("dex"),
            Err(OidcError::ProviderDisabled(_))
        ));
    }

    #[test]
    fn test_scope_defaults_applied() {
        let registry = ProviderRegistry::new(vec![definition("dex", true)]);
        let provider = registry.get("dex").unwrap();
        assert_eq!(provider.scopes, vec!["openid", "email", "profile"]);
    }

    #[test]
    fn test_explicit_scopes_kept() {
        let mut def = definition("dex", true);
        def.scopes = Some(vec!["openid".to_string(), "groups".to_string()]);
        let registry = ProviderRegistry::new(vec![def]);
        assert_eq!(registry.get("dex").unwrap().scopes, vec!["openid", "groups"]);
    }

    #[test]
    fn test_duplicate_slug_keeps_first() {
        let mut second = definition("dex", true);
        second.name = "Other".to_string();
        let registry = ProviderRegistry::new(vec![definition("dex", true), second]);
        assert_eq!(registry.get("dex").unwrap().name, "dex IdP");
        assert_eq!(registry.enabled().len(), 1);
    }

    #[test]
    fn test_enabled_excludes_disabled() {
        let registry =
            ProviderRegistry::new(vec![definition("dex", true), definition("okta", false)]);
        let enabled = registry.enabled();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].slug, "dex");
    }
}
