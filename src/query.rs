use serde::Deserialize;
use utoipa::IntoParams;

/// Default page size when the client does not send `limit`
pub const DEFAULT_LIMIT: i64 = 100;

/// SQL query builder for list endpoints
/// Builds a single parameterized query with equality filters, ordering and pagination
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: i64,
    offset: i64,
}

impl SQLQueryBuilder {
    /// Start from a `SELECT ... FROM table` statement
    pub fn new(base_query: impl Into<String>) -> Self {
        Self {
            base_query: base_query.into(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Adds `column = $n` for a text column
    /// `column` must be a trusted identifier, never client input
    pub fn add_eq_filter(&mut self, column: &str, value: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses.push(format!("{} = ${}", column, param_index));
        self.params.push(value.to_string());
    }

    /// Sets the ORDER BY clause verbatim
    pub fn set_order(&mut self, order: &str) {
        self.order_clause = Some(order.to_string());
    }

    pub fn set_pagination(&mut self, page: Pagination) {
        self.limit = page.limit;
        self.offset = page.skip;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET are validated integers, inlined rather than bound
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

/// Raw `skip` / `limit` query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Number of records to skip (>= 0, default 0)
    pub skip: Option<i64>,
    /// Maximum number of records to return (default 100)
    pub limit: Option<i64>,
}

/// Validated pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates pagination against an endpoint-specific upper bound on `limit`
    pub fn pagination(params: &PageParams, max_limit: i64) -> Result<Pagination, ValidationError> {
        let skip = params.skip.unwrap_or(0);
        if skip < 0 {
            return Err(ValidationError {
                message: "skip must be zero or greater".to_string(),
            });
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT.min(max_limit));
        if limit < 1 || limit > max_limit {
            return Err(ValidationError {
                message: format!("limit must be between 1 and {}", max_limit),
            });
        }

        Ok(Pagination { skip, limit })
    }

    /// Normalizes string parameters by trimming whitespace
    /// Returns None if the string is empty or whitespace-only
    pub fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_builder_without_filters() {
        let mut builder = SQLQueryBuilder::new("SELECT * FROM billing");
        builder.set_order("created_at DESC, id DESC");
        builder.set_pagination(Pagination { skip: 20, limit: 10 });

        let (query, params) = builder.build();
        assert_eq!(
            query,
            "SELECT * FROM billing ORDER BY created_at DESC, id DESC LIMIT 10 OFFSET 20"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_builder_numbers_parameters_in_order() {
        let mut builder = SQLQueryBuilder::new("SELECT * FROM billing");
        builder.add_eq_filter("operator_id", "aaa");
        builder.add_eq_filter("drone_id", "bbb");

        let (query, params) = builder.build();
        assert!(query.contains("WHERE operator_id = $1 AND drone_id = $2"));
        assert_eq!(params, vec!["aaa".to_string(), "bbb".to_string()]);
    }

    #[test]
    fn test_pagination_defaults() {
        let page = QueryValidator::pagination(&PageParams::default(), 200).unwrap();
        assert_eq!(page, Pagination { skip: 0, limit: 100 });
    }

    #[test]
    fn test_pagination_bounds() {
        let over = PageParams { skip: None, limit: Some(101) };
        assert!(QueryValidator::pagination(&over, 100).is_err());

        let zero = PageParams { skip: None, limit: Some(0) };
        assert!(QueryValidator::pagination(&zero, 100).is_err());

        let negative = PageParams { skip: Some(-1), limit: None };
        assert!(QueryValidator::pagination(&negative, 100).is_err());

        let max = PageParams { skip: Some(5), limit: Some(200) };
        assert_eq!(
            QueryValidator::pagination(&max, 200).unwrap(),
            Pagination { skip: 5, limit: 200 }
        );
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(QueryValidator::normalize_string(Some("  abc ".into())), Some("abc".into()));
        assert_eq!(QueryValidator::normalize_string(Some("   ".into())), None);
        assert_eq!(QueryValidator::normalize_string(None), None);
    }

    proptest! {
        #[test]
        fn prop_in_range_pagination_is_kept(skip in 0i64..10_000, limit in 1i64..=200) {
            let params = PageParams { skip: Some(skip), limit: Some(limit) };
            let page = QueryValidator::pagination(&params, 200).unwrap();
            prop_assert_eq!(page, Pagination { skip, limit });
        }

        #[test]
        fn prop_oversized_limit_is_rejected(limit in 201i64..100_000) {
            let params = PageParams { skip: None, limit: Some(limit) };
            prop_assert!(QueryValidator::pagination(&params, 200).is_err());
        }
    }
}
