use crate::default_map::DefaultMapResolver;
use crate::error::EngineError;
use crate::external::ExternalMapRegistry;
use crate::map::{self, ResolutionMap};
use crate::overrides::OverrideStore;
use std::sync::Arc;

/// Composes default, external and local maps into the current and next page views.
///
/// Precedence in both views is default < external < local overrides.
#[derive(Debug)]
pub struct PageMapResolver {
    defaults: Arc<DefaultMapResolver>,
    externals: Arc<ExternalMapRegistry>,
    overrides: OverrideStore,
    initial_overrides: ResolutionMap,
    initial_externals: Vec<String>,
}

impl PageMapResolver {
    /// `initial_overrides` and `initial_externals` describe what this load was rendered with.
    pub fn new(
        defaults: Arc<DefaultMapResolver>,
        externals: Arc<ExternalMapRegistry>,
        overrides: OverrideStore,
        initial_overrides: ResolutionMap,
        initial_externals: Vec<String>,
    ) -> Self {
        Self { defaults, externals, overrides, initial_overrides, initial_externals }
    }

    /// The map in effect for this load.
    pub async fn get_current_page_map(&self) -> Result<ResolutionMap, EngineError> {
        let defaults = self.defaults.get_default_map().await?;
        let externals = self.externals.get_external_override_map(&self.initial_externals).await;
        Ok(map::merge(&map::merge(&defaults, &externals), &self.initial_overrides))
    }

    /// The map a reload would produce given what is persisted right now.
    pub async fn get_next_page_map(&self) -> Result<ResolutionMap, EngineError> {
        let defaults = self.defaults.get_default_map().await?;
        let externals = self.externals.get_all_external_override_map().await?;
        let overrides = self.overrides.get_override_map(false)?;
        Ok(map::merge(&map::merge(&defaults, &externals), &overrides))
    }

    /// External map URLs that were already part of the page when the engine started.
    #[must_use]
    pub fn current_page_external_overrides(&self) -> &[String] {
        &self.initial_externals
    }

    #[must_use]
    pub const fn initial_override_map(&self) -> &ResolutionMap {
        &self.initial_overrides
    }
}
