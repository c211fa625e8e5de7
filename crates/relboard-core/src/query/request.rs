use crate::query::{Filter, FilterSet, QueryExpression, RowRange, Sort};

///
/// SelectRequest
///
/// One read against the tabular data service.
///
/// `required` filters are always ANDed (row scope, key lookups) and sit
/// outside the user's `filters`, whose conjunction may be `or`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectRequest {
    pub table: String,
    pub select: QueryExpression,
    pub required: Vec<Filter>,
    pub filters: FilterSet,
    pub sorts: Vec<Sort>,
    pub range: Option<RowRange>,
    pub count: bool,
}

impl SelectRequest {
    pub fn new(table: impl Into<String>, select: QueryExpression) -> Self {
        Self {
            table: table.into(),
            select,
            required: Vec::new(),
            filters: FilterSet::default(),
            sorts: Vec::new(),
            range: None,
            count: false,
        }
    }

    #[must_use]
    pub fn require(mut self, filter: Filter) -> Self {
        self.required.push(filter);
        self
    }

    #[must_use]
    pub fn require_all(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.required.extend(filters);
        self
    }

    #[must_use]
    pub fn filter(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn order_by(mut self, sorts: Vec<Sort>) -> Self {
        self.sorts = sorts;
        self
    }

    #[must_use]
    pub const fn range(mut self, range: RowRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Ask the backend for the exact size of the filtered result set.
    #[must_use]
    pub const fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Query-string pairs in wire order: select, required, filters, order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.to_string())];

        pairs.extend(
            self.required
                .iter()
                .map(|filter| (filter.column.clone(), filter.operand())),
        );
        pairs.extend(self.filters.to_query_pairs());

        if !self.sorts.is_empty() {
            let order: Vec<String> = self.sorts.iter().map(ToString::to_string).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }

        pairs
    }

    /// Value of the `Range` header, when the request is windowed.
    #[must_use]
    pub fn range_header(&self) -> Option<String> {
        self.range.map(|range| range.to_string())
    }

    /// Value of the `Prefer` header.
    #[must_use]
    pub fn prefer_header(&self) -> Option<&'static str> {
        self.count.then_some("count=exact")
    }
}
