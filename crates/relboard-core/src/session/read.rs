use crate::{
    Error,
    attribute::AttributeId,
    cache::PageSnapshot,
    item::Item,
    join::JoinDataLoader,
    page::Page,
    pagination::PageView,
    query::{Filter, QueryAttributeSet, QueryExpression, SelectRequest},
    row::RowMapper,
    schema::{SchemaCatalog, SchemaInferenceError},
    service::{TabularDataService, TransportError},
    value::Value,
};
use relboard_config::ScopeConfig;
use tracing::debug;

///
/// PageRead
///
/// Mapped rows of one read, with the exact count when it was requested.
///

pub(super) struct PageRead {
    pub(super) items: Vec<Item>,
    pub(super) count: Option<u64>,
}

///
/// PageReader
///
/// The read path of one page: resolve, build, select, map.
///

pub(super) struct PageReader<'a, S: ?Sized> {
    service: &'a S,
    catalog: &'a SchemaCatalog,
    page: &'a Page,
    scope: Option<&'a ScopeConfig>,
}

impl<'a, S> PageReader<'a, S>
where
    S: TabularDataService + ?Sized,
{
    pub(super) const fn new(
        service: &'a S,
        catalog: &'a SchemaCatalog,
        page: &'a Page,
        scope: Option<&'a ScopeConfig>,
    ) -> Self {
        Self {
            service,
            catalog,
            page,
            scope,
        }
    }

    pub(super) fn primary_key(&self) -> Result<&'a str, SchemaInferenceError> {
        self.catalog.primary_key(&self.page.table_id)
    }

    /// Read the window described by `view`.
    pub(super) async fn window(&self, view: &PageView, count: bool) -> Result<PageRead, Error> {
        let (select, ids) = self.plan()?;
        let request = view.request(&self.page.table_id, select, count);

        self.read(request, &ids).await
    }

    /// Read the single row whose primary key is `key`.
    pub(super) async fn by_key(&self, key: Value) -> Result<PageRead, Error> {
        let (select, ids) = self.plan()?;
        let request = SelectRequest::new(&self.page.table_id, select)
            .require(Filter::eq(self.primary_key()?, key));

        self.read(request, &ids).await
    }

    /// First window, exact count and join options.
    ///
    /// Option fetch failures do not fail the snapshot; they are handed back
    /// next to it.
    pub(super) async fn snapshot(&self) -> Result<(PageSnapshot, Option<TransportError>), Error> {
        let read = self.window(&PageView::for_page(self.page), true).await?;
        let options = JoinDataLoader::new(self.service, self.catalog)
            .with_scope(self.scope)
            .load_options(self.page)
            .await?;
        let options_error = options.error();

        let snapshot = PageSnapshot {
            page_id: self.page.page_id.clone(),
            total_count: read.count.unwrap_or_default(),
            rows: read.items,
            join_options: options.options,
        };
        debug!(
            page = %self.page.page_id,
            rows = snapshot.rows.len(),
            total = snapshot.total_count,
            "page snapshot loaded"
        );

        Ok((snapshot, options_error))
    }

    fn plan(&self) -> Result<(QueryExpression, Vec<AttributeId>), SchemaInferenceError> {
        let set = QueryAttributeSet::resolve(self.page, self.catalog)?;
        let ids: Vec<AttributeId> = set.ids().cloned().collect();
        let select = QueryExpression::build(&ids, self.catalog)?;

        Ok((select, ids))
    }

    async fn read(&self, request: SelectRequest, ids: &[AttributeId]) -> Result<PageRead, Error> {
        let request = self.scoped(request);
        let response = self.service.select(&request).await?;
        let items =
            RowMapper::new(self.catalog, &self.page.table_id).rows_to_items(&response.rows, ids);

        Ok(PageRead {
            items,
            count: response.count,
        })
    }

    // The scope only applies to tables that carry its column.
    fn scoped(&self, request: SelectRequest) -> SelectRequest {
        match self
            .scope
            .filter(|scope| self.catalog.column(&self.page.table_id, &scope.column).is_some())
        {
            Some(scope) => request.require(Filter::eq(scope.column.clone(), scope.value.clone())),
            None => request,
        }
    }
}
