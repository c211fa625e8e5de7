use crate::{
    Error, ErrorClass,
    cache::{PageRepository, PageSnapshot},
    item::Item,
    join::JoinOptionSet,
    mutation::{MutationCoordinator, MutationError, MutationReport, MutationStage},
    page::Page,
    pagination::PageView,
    query::{Conjunction, Filter, FilterSet, MatchFilter, Sort},
    schema::SchemaInferenceError,
    service::TabularDataService,
    session::{
        Dashboard, Warning,
        read::{PageRead, PageReader},
    },
    value::Value,
};
use relboard_config::DisplayMode;
use std::{collections::BTreeMap, ops::RangeInclusive};
use tracing::debug;

///
/// PageSession
///
/// One user's working copy of a page. Items are copied out of the page
/// repository, so local edits never reach the cache; successful writes
/// reload the page and replace both.
///
/// Operations never return errors. A failure is kept as the session's
/// warning until the next operation starts or `clear_warning` is called.
///

pub struct PageSession<'d, S, R> {
    dashboard: &'d Dashboard<S, R>,
    page: &'d Page,
    items: Vec<Item>,
    join_options: BTreeMap<String, JoinOptionSet>,
    view: PageView,
    warning: Option<Warning>,
    stage: MutationStage,
    unsaved: bool,
}

impl<'d, S, R> PageSession<'d, S, R>
where
    S: TabularDataService,
    R: PageRepository,
{
    pub(super) fn new(
        dashboard: &'d Dashboard<S, R>,
        page: &'d Page,
        snapshot: PageSnapshot,
    ) -> Self {
        let mut session = Self {
            dashboard,
            page,
            items: Vec::new(),
            join_options: BTreeMap::new(),
            view: PageView::for_page(page),
            warning: None,
            stage: MutationStage::Idle,
            unsaved: false,
        };
        session.apply(snapshot);

        session
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn page(&self) -> &Page {
        self.page
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Editable items; marks the session as changed.
    pub fn items_mut(&mut self) -> &mut [Item] {
        self.unsaved = true;
        &mut self.items
    }

    /// Exact row count of the current filters.
    #[must_use]
    pub const fn items_count(&self) -> u64 {
        self.view.total_count()
    }

    #[must_use]
    pub const fn join_options(&self) -> &BTreeMap<String, JoinOptionSet> {
        &self.join_options
    }

    #[must_use]
    pub const fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    pub fn clear_warning(&mut self) {
        self.warning = None;
    }

    #[must_use]
    pub const fn stage(&self) -> MutationStage {
        self.stage
    }

    #[must_use]
    pub const fn page_number(&self) -> u64 {
        self.view.page_number()
    }

    #[must_use]
    pub const fn max_pagination(&self) -> u64 {
        self.view.max_pagination()
    }

    #[must_use]
    pub const fn pagination_list(&self) -> RangeInclusive<u64> {
        self.view.pagination_list()
    }

    #[must_use]
    pub const fn have_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub const fn mark_changed(&mut self) {
        self.unsaved = true;
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Replace the items with the single row keyed by `key`.
    pub async fn get_item(&mut self, key: impl Into<Value>) {
        self.begin();
        let key = key.into();

        let result = self.read_key(key.clone()).await;
        let Some(read) = self.recover(result) else {
            return;
        };

        if read.items.is_empty() {
            self.warning = Some(Warning {
                class: ErrorClass::Input,
                message: format!("no row in '{}' with key {key}", self.page.table_id),
            });
            return;
        }
        self.items = read.items;
    }

    /// Reload the page from the backend and return to the first window.
    pub async fn get_items(&mut self) {
        self.begin();
        self.reload().await;
    }

    /// Move to page `number`, reusing the known row count.
    pub async fn set_page(&mut self, number: u64) {
        self.begin();
        self.view.set_page(number);

        let result = self.read_window(false).await;
        if let Some(read) = self.recover(result) {
            self.items = read.items;
        }
    }

    /// Apply new filters and sorts, recount, and return to the first page.
    pub async fn filter_items(
        &mut self,
        filters: Vec<Filter>,
        conjunction: Conjunction,
        sorts: Vec<Sort>,
    ) {
        self.begin();
        self.view.set_filters(FilterSet::new(conjunction, filters), sorts);

        let result = self.read_window(true).await;
        if let Some(read) = self.recover(result) {
            self.view.record_count(read.count.unwrap_or_default());
            self.items = read.items;
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert or update `item` across every table it touches, then reload.
    ///
    /// Returns the report of a committed write, including when the reload
    /// afterwards failed.
    pub async fn upsert_item(&mut self, item: &Item) -> Option<MutationReport> {
        self.begin();

        match self.write(item).await {
            Ok(mut report) => {
                self.stage = MutationStage::Reloading;
                report.stages.push(MutationStage::Reloading);

                if self.reload().await {
                    self.stage = MutationStage::Idle;
                    self.unsaved = false;
                } else {
                    self.stage = MutationStage::Failed;
                }

                Some(report)
            }
            Err(err) => {
                self.stage = MutationStage::Failed;
                self.warning = Some(Warning::from(&err.source));

                None
            }
        }
    }

    /// Delete the rows keyed by `keys` in one request, then reload.
    pub async fn delete_items(&mut self, keys: &[Value]) {
        self.begin();
        if keys.is_empty() {
            return;
        }

        let result = self.delete(keys).await;
        if self.recover(result).is_some() {
            self.reload().await;
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin(&mut self) {
        self.warning = None;
        self.stage = MutationStage::Idle;
    }

    fn recover<T>(&mut self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(page = %self.page.page_id, error = %err, "page operation failed");
                self.warning = Some(Warning::from(&err));

                None
            }
        }
    }

    fn apply(&mut self, snapshot: PageSnapshot) {
        self.items = snapshot.rows;
        if self.items.is_empty() && self.page.mode == DisplayMode::Single {
            self.items.push(Item::new());
        }
        self.join_options = snapshot.join_options;
        self.view = PageView::for_page(self.page);
        self.view.record_count(snapshot.total_count);
    }

    // Refresh the cached snapshot and adopt it. Rows are adopted even when
    // option fetches failed.
    async fn reload(&mut self) -> bool {
        let result = self.dashboard.load_page(&self.page.page_id).await;
        if let Some(snapshot) = self.dashboard.repository().get(&self.page.page_id) {
            self.apply(snapshot);
        }

        self.recover(result).is_some()
    }

    fn reader(&self) -> Result<PageReader<'d, S>, Error> {
        Ok(self.dashboard.reader(self.page)?)
    }

    async fn read_key(&self, key: Value) -> Result<PageRead, Error> {
        self.reader()?.by_key(key).await
    }

    async fn read_window(&self, count: bool) -> Result<PageRead, Error> {
        self.reader()?.window(&self.view, count).await
    }

    async fn delete(&self, keys: &[Value]) -> Result<(), Error> {
        let reader = self.reader()?;
        let filter = MatchFilter::any_eq(reader.primary_key()?, keys);
        self.dashboard
            .service()
            .delete(&self.page.table_id, &filter)
            .await?;

        Ok(())
    }

    async fn write(&self, item: &Item) -> Result<MutationReport, MutationError> {
        let catalog = self.dashboard.catalog().ok_or_else(|| MutationError {
            stage: MutationStage::Idle,
            source: SchemaInferenceError::CatalogUnavailable.into(),
        })?;
        let scope = self
            .dashboard
            .scope()
            .filter(|scope| catalog.column(&self.page.table_id, &scope.column).is_some());

        MutationCoordinator::new(self.dashboard.service(), catalog)
            .with_scope(scope)
            .upsert(self.page, item)
            .await
    }
}
