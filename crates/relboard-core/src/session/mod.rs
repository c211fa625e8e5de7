//! Module: session
//! Responsibility: the dashboard facade and the per-page session surface.
//! Does not own: query construction, row mapping or write planning.
//! Boundary: public page operations recover every error into a `Warning`.

mod page;
mod read;

#[cfg(test)]
mod tests;

use crate::{
    Error, ErrorClass,
    cache::{PageRepository, PageSnapshot},
    page::Page,
    schema::{SchemaCatalog, SchemaInferenceError},
    service::TabularDataService,
};
use futures::future::join_all;
use relboard_config::{DashboardConfig, ScopeConfig};
use std::fmt;
use tracing::{info, warn};

// re-exports
pub use page::PageSession;

use read::PageReader;

///
/// Warning
///
/// Transient, user-facing report of a failed operation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Warning {
    pub class: ErrorClass,
    pub message: String,
}

impl From<&Error> for Warning {
    fn from(err: &Error) -> Self {
        Self {
            class: err.class(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

///
/// Dashboard
///
/// Owns the data service, the page repository and the schema catalog for
/// one configured dashboard. Pages are read through `session`.
///

pub struct Dashboard<S, R> {
    name: String,
    pages: Vec<Page>,
    scope: Option<ScopeConfig>,
    service: S,
    repository: R,
    catalog: Option<SchemaCatalog>,
    warning: Option<Warning>,
}

impl<S, R> Dashboard<S, R>
where
    S: TabularDataService,
    R: PageRepository,
{
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a dashboard from validated configuration.
    pub fn new(config: &DashboardConfig, service: S, repository: R) -> Result<Self, Error> {
        let pages = config
            .pages
            .iter()
            .map(Page::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            pages,
            scope: config.scope.clone(),
            service,
            repository,
            catalog: None,
            warning: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.page_id == page_id)
    }

    #[must_use]
    pub const fn scope(&self) -> Option<&ScopeConfig> {
        self.scope.as_ref()
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    #[must_use]
    pub const fn catalog(&self) -> Option<&SchemaCatalog> {
        self.catalog.as_ref()
    }

    /// Warning left by the last schema load, if it failed.
    #[must_use]
    pub const fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch the metadata document and build the schema catalog.
    ///
    /// On failure the previous catalog is dropped, so later reads report
    /// the catalog as unavailable instead of using a stale schema.
    pub async fn load_schema(&mut self) -> Result<(), Error> {
        self.warning = None;

        let result = match self.service.fetch_metadata().await {
            Ok(metadata) => SchemaCatalog::from_metadata(&metadata).map_err(Error::from),
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(catalog) => {
                info!(dashboard = %self.name, tables = catalog.len(), "schema catalog loaded");
                self.catalog = Some(catalog);

                Ok(())
            }
            Err(err) => {
                warn!(dashboard = %self.name, error = %err, "schema load failed");
                self.catalog = None;
                self.warning = Some(Warning::from(&err));

                Err(err)
            }
        }
    }

    /// Read the first window of a page with its exact count and join
    /// options, and replace its cached snapshot.
    ///
    /// Rows are cached even when some option fetches failed; that failure
    /// is still returned.
    pub async fn load_page(&self, page_id: &str) -> Result<PageSnapshot, Error> {
        let page = self.require_page(page_id)?;
        let (snapshot, options_error) = self.reader(page)?.snapshot().await?;

        self.repository.replace(page_id, snapshot.clone());

        match options_error {
            Some(err) => Err(err.into()),
            None => Ok(snapshot),
        }
    }

    /// Reload every page concurrently.
    ///
    /// All loads settle before returning; the first failure in page order is
    /// returned and the rest are logged.
    pub async fn reload_all(&self) -> Result<(), Error> {
        let results = join_all(self.pages.iter().map(|page| self.load_page(&page.page_id))).await;

        let mut first = None;
        for (page, result) in self.pages.iter().zip(results) {
            if let Err(err) = result {
                warn!(page = %page.page_id, error = %err, "page reload failed");
                first.get_or_insert(err);
            }
        }

        first.map_or(Ok(()), Err)
    }

    /// Open a session on the cached state of a page.
    pub fn session(&self, page_id: &str) -> Result<PageSession<'_, S, R>, Error> {
        let page = self.require_page(page_id)?;
        let snapshot = self.repository.get(page_id).unwrap_or_else(|| PageSnapshot {
            page_id: page_id.to_string(),
            ..PageSnapshot::default()
        });

        Ok(PageSession::new(self, page, snapshot))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_page(&self, page_id: &str) -> Result<&Page, Error> {
        self.page(page_id).ok_or_else(|| Error::UnknownPage {
            page_id: page_id.to_string(),
        })
    }

    fn reader<'a>(&'a self, page: &'a Page) -> Result<PageReader<'a, S>, SchemaInferenceError> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or(SchemaInferenceError::CatalogUnavailable)?;

        Ok(PageReader::new(&self.service, catalog, page, self.scope.as_ref()))
    }
}
