//! Build context - resolution state, output layout and expansion settings.

use std::fmt;
use std::sync::Arc;

use crate::resolver::PackageResolver;
use crate::sources::PathMapper;
use crate::util::config::BuildConfig;

/// Everything target expansion needs from its caller.
pub struct BuildContext {
    /// Resolution context owning the package records
    resolver: PackageResolver,

    /// Output path layout
    mapper: Arc<dyn PathMapper>,

    /// Expansion settings
    config: BuildConfig,
}

impl BuildContext {
    /// Create a build context with default settings.
    pub fn new(resolver: PackageResolver, mapper: Arc<dyn PathMapper>) -> Self {
        BuildContext {
            resolver,
            mapper,
            config: BuildConfig::default(),
        }
    }

    /// Replace the expansion settings.
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the resolution context.
    pub fn resolver(&self) -> &PackageResolver {
        &self.resolver
    }

    /// Get the output path layout.
    pub fn mapper(&self) -> &dyn PathMapper {
        self.mapper.as_ref()
    }

    /// Get the expansion settings.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Check if everything is being rebuilt.
    pub fn rebuild_all(&self) -> bool {
        self.config.rebuild_all
    }

    /// Check if generate directive scanning is disabled.
    pub fn no_generate(&self) -> bool {
        self.config.no_generate
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish()
    }
}
