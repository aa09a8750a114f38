//! Catalog retrieval from the vendor reference host.

use crate::http::{HttpClient, HttpError};
use crate::platform::{FeatureVersion, Platform};

/// Default host serving platform reference catalogs.
pub const DEFAULT_CATALOG_HOST: &str = "hpia.hpcloud.hp.com";

/// Trait for downloading catalog archives.
///
/// Abstractions allow tests to simulate the vendor host without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogSource {
    /// Download the cabinet at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the catalog is not found.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Catalog source backed by [`HttpClient`].
#[derive(Clone)]
pub struct HttpCatalogSource {
    client: HttpClient,
}

impl HttpCatalogSource {
    /// Create a source using `client`.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl CatalogSource for HttpCatalogSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.client.get_bytes(url)
    }
}

/// Construct the lower-cased catalog URL for a platform and feature version.
///
/// # Examples
///
/// ```
/// use hpdrivers::catalog::source::catalog_url;
/// use hpdrivers::platform::{FeatureVersion, OsType, Platform};
///
/// let tag: FeatureVersion = "22H2".parse().expect("tag");
/// let platform = Platform::new("8A78", OsType::Windows10, tag);
/// assert_eq!(
///     catalog_url("hpia.hpcloud.hp.com", &platform, tag),
///     "https://hpia.hpcloud.hp.com/ref/8a78/8a78_64_10.0.22h2.cab",
/// );
/// ```
#[must_use]
pub fn catalog_url(host: &str, platform: &Platform, feature_version: FeatureVersion) -> String {
    format!(
        "https://{host}/ref/{}/{}.cab",
        platform.id(),
        platform.catalog_stem(feature_version)
    )
    .to_lowercase()
}
