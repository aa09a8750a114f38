//! Catalog resolution with feature-version fallback.
//!
//! Finds the catalog for a platform: an explicit feature version is tried
//! exactly once, otherwise the search walks back from the installed
//! feature version (`H2 -> H1`, `H1 -> previous H2`) until a catalog is
//! found or the 2020 floor is passed. Fetched archives and their extracted
//! XML are cached per `(platform, os type, feature version)`, and a cached
//! XML short-circuits the network.

use super::archive::{ArchiveError, extract_catalog_xml};
use super::parser::parse_catalog;
use super::record::CatalogDocument;
use super::source::{CatalogSource, catalog_url};
use crate::error::{InstallerError, Result};
use crate::http::HttpError;
use crate::platform::{DetectedPlatform, FeatureVersion, Platform};
use crate::run_log::RunLog;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

/// Why a single catalog fetch failed.
#[derive(Debug, thiserror::Error)]
enum FetchFailure {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("cache I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a resolved catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// Downloaded during this run.
    Network,
    /// Read from the local cache.
    Cache,
}

/// A resolved catalog plus the search that produced it.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The parsed catalog.
    pub document: CatalogDocument,
    /// Every feature version tried, in order; the last one succeeded.
    pub attempted: Vec<FeatureVersion>,
    /// Whether the catalog was downloaded or cached.
    pub origin: CatalogOrigin,
}

impl Resolution {
    /// Number of fallback steps taken before a catalog was found.
    #[must_use]
    pub fn fallback_steps(&self) -> usize {
        self.attempted.len().saturating_sub(1)
    }
}

/// Locates, caches and parses platform catalogs.
pub struct CatalogResolver<'a> {
    source: &'a dyn CatalogSource,
    catalog_host: &'a str,
    cache_dir: &'a Utf8Path,
    run_log: &'a RunLog,
    offline: bool,
}

impl<'a> CatalogResolver<'a> {
    /// Create a resolver.
    #[must_use]
    pub fn new(
        source: &'a dyn CatalogSource,
        catalog_host: &'a str,
        cache_dir: &'a Utf8Path,
        run_log: &'a RunLog,
    ) -> Self {
        Self {
            source,
            catalog_host,
            cache_dir,
            run_log,
            offline: false,
        }
    }

    /// Only consult the local cache; never touch the network.
    #[must_use]
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Cached XML path for a platform and feature version.
    #[must_use]
    pub fn cached_xml_path(&self, platform: &Platform, tag: FeatureVersion) -> Utf8PathBuf {
        self.cache_dir.join(format!("{}.xml", platform.catalog_stem(tag)))
    }

    fn cached_cab_path(&self, platform: &Platform, tag: FeatureVersion) -> Utf8PathBuf {
        self.cache_dir.join(format!("{}.cab", platform.catalog_stem(tag)))
    }

    /// Resolve the catalog for `detected`, optionally pinned to `explicit`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::CatalogNotFound`] when an explicit version
    /// (or, offline, the current version) has no catalog;
    /// [`InstallerError::NoDriversAvailable`] when fallback reaches the
    /// floor; [`InstallerError::MalformedCatalog`] when the found catalog
    /// cannot be parsed; [`InstallerError::Io`] when the cache cannot be
    /// read or written.
    pub fn resolve(
        &self,
        detected: &DetectedPlatform,
        explicit: Option<FeatureVersion>,
    ) -> Result<Resolution> {
        let platform = &detected.platform;
        if self.offline {
            return self.resolve_cached(detected, explicit.unwrap_or(platform.feature_version()));
        }

        let candidates: Vec<FeatureVersion> = match explicit {
            Some(tag) => vec![tag],
            None => platform.feature_version().fallback_sequence().collect(),
        };

        let mut attempted = Vec::new();
        for tag in candidates {
            attempted.push(tag);
            match self.load(platform, tag) {
                Ok((xml, origin)) => {
                    let document = parse_catalog(&xml, tag)?;
                    self.record_discovery(detected, tag);
                    return Ok(Resolution {
                        document,
                        attempted,
                        origin,
                    });
                }
                Err(FetchFailure::Io(e)) => return Err(e.into()),
                Err(e) => debug!("no catalog for {} {tag}: {e}", platform.id()),
            }
        }

        match explicit {
            Some(feature_version) => Err(InstallerError::CatalogNotFound {
                platform: platform.id().to_owned(),
                feature_version,
            }),
            None => Err(InstallerError::NoDriversAvailable {
                platform: platform.id().to_owned(),
                searched: attempted.len(),
            }),
        }
    }

    fn resolve_cached(
        &self,
        detected: &DetectedPlatform,
        tag: FeatureVersion,
    ) -> Result<Resolution> {
        let platform = &detected.platform;
        let path = self.cached_xml_path(platform, tag);
        if !path.exists() {
            return Err(InstallerError::CatalogNotFound {
                platform: platform.id().to_owned(),
                feature_version: tag,
            });
        }
        info!("offline: using cached catalog {path}");
        let xml = std::fs::read_to_string(&path)?;
        let document = parse_catalog(&xml, tag)?;
        self.record_discovery(detected, tag);
        Ok(Resolution {
            document,
            attempted: vec![tag],
            origin: CatalogOrigin::Cache,
        })
    }

    fn load(
        &self,
        platform: &Platform,
        tag: FeatureVersion,
    ) -> std::result::Result<(String, CatalogOrigin), FetchFailure> {
        let xml_path = self.cached_xml_path(platform, tag);
        if xml_path.exists() {
            debug!("catalog cache hit: {xml_path}");
            return Ok((std::fs::read_to_string(&xml_path)?, CatalogOrigin::Cache));
        }

        let url = catalog_url(self.catalog_host, platform, tag);
        info!("fetching catalog {url}");
        let bytes = self.source.fetch(&url)?;
        let xml = extract_catalog_xml(&bytes)?;

        std::fs::create_dir_all(self.cache_dir)?;
        std::fs::write(self.cached_cab_path(platform, tag), &bytes)?;
        std::fs::write(&xml_path, &xml)?;
        Ok((xml, CatalogOrigin::Network))
    }

    fn record_discovery(&self, detected: &DetectedPlatform, tag: FeatureVersion) {
        info!(
            "resolved catalog for {} ({}) at feature version {tag}",
            detected.model,
            detected.platform.id()
        );
        self.run_log
            .discovery(&detected.model, detected.platform.id(), &tag.to_string());
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
