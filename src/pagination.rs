//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest number of items a client may request per page.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    /// The page number, starting from one.
    pub page: u64,
    /// The number of items per page.
    pub per_page: u64,
}

impl Pagination {
    /// Validate the raw `page` and `per_page` query parameters, using the
    /// defaults in `config` for missing or empty values.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if `page` is not a positive integer,
    /// `per_page` is not an integer between one and the configured maximum,
    /// or the page starts beyond the largest offset SQLite accepts.
    pub fn from_query(
        page: Option<&str>,
        per_page: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = parse_or_default(page, "page", config.default_page)?;
        let per_page = parse_or_default(per_page, "per_page", config.default_page_size)?;

        if page < 1 {
            return Err(Error::Validation("page must be at least 1".to_owned()));
        }

        if per_page < 1 || per_page > config.max_page_size {
            return Err(Error::Validation(format!(
                "per_page must be between 1 and {}",
                config.max_page_size
            )));
        }

        // SQLite takes the offset as a signed 64-bit integer.
        let offset = (page - 1).checked_mul(per_page);
        if !offset.is_some_and(|offset| i64::try_from(offset).is_ok()) {
            return Err(Error::Validation(format!(
                "page {page} is too large for {per_page} items per page"
            )));
        }

        Ok(Self { page, per_page })
    }

    /// The SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }

    /// The SQL `OFFSET` for this page, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.per_page);

        i64::try_from(offset).unwrap_or(i64::MAX)
    }
}

fn parse_or_default(value: Option<&str>, name: &str, default: u64) -> Result<u64, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| Error::Validation(format!("{name} must be a positive integer"))),
    }
}

/// One page of items and where it sits in the full result set.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The items on this page, empty past the last page.
    pub data: Vec<T>,
    /// Where this page sits in the full result set.
    pub meta: PageMeta,
}

/// Pagination metadata for a [PaginatedResponse].
#[derive(Debug, Serialize, PartialEq)]
pub struct PageMeta {
    /// The page number that was requested.
    pub current_page: u64,
    /// The number of items across all pages.
    pub total_items: u64,
    /// The number of pages needed to show every item.
    pub total_pages: u64,
    /// The number of items per page.
    pub per_page: u64,
}

impl<T> PaginatedResponse<T> {
    /// Wrap one page of `data` out of `total_items` items.
    pub fn new(data: Vec<T>, total_items: u64, pagination: Pagination) -> Self {
        Self {
            data,
            meta: PageMeta {
                current_page: pagination.page,
                total_items,
                total_pages: total_items.div_ceil(pagination.per_page),
                per_page: pagination.per_page,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        pagination::{PageMeta, PaginatedResponse, Pagination, PaginationConfig},
    };

    #[test]
    fn missing_values_use_defaults() {
        let pagination = Pagination::from_query(None, None, &PaginationConfig::default());

        assert_eq!(
            pagination,
            Ok(Pagination {
                page: 1,
                per_page: 20
            })
        );
    }

    #[test]
    fn empty_values_use_defaults() {
        let pagination = Pagination::from_query(Some(""), Some(""), &PaginationConfig::default());

        assert_eq!(
            pagination,
            Ok(Pagination {
                page: 1,
                per_page: 20
            })
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let config = PaginationConfig::default();

        for (page, per_page) in [
            (Some("0"), None),
            (Some("-1"), None),
            (Some("abc"), None),
            (None, Some("0")),
            (None, Some("101")),
            (None, Some("ten")),
        ] {
            let result = Pagination::from_query(page, per_page, &config);

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "want validation error for page={page:?} per_page={per_page:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn accepts_max_page_size() {
        let pagination =
            Pagination::from_query(Some("3"), Some("100"), &PaginationConfig::default()).unwrap();

        assert_eq!(pagination.limit(), 100);
        assert_eq!(pagination.offset(), 200);
    }

    #[test]
    fn rejects_page_past_largest_offset() {
        let config = PaginationConfig::default();

        for (page, per_page) in [
            (u64::MAX.to_string(), "20"),
            (u64::MAX.to_string(), "1"),
            ((i64::MAX as u64 / 100 + 2).to_string(), "100"),
        ] {
            let result = Pagination::from_query(Some(&page), Some(per_page), &config);

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "want validation error for page={page} per_page={per_page}, got {result:?}"
            );
        }
    }

    #[test]
    fn accepts_page_at_largest_offset() {
        let page = (i64::MAX as u64 + 1).to_string();

        let pagination =
            Pagination::from_query(Some(&page), Some("1"), &PaginationConfig::default()).unwrap();

        assert_eq!(pagination.offset(), i64::MAX);
    }

    #[test]
    fn offset_saturates_for_unchecked_pages() {
        let pagination = Pagination {
            page: u64::MAX,
            per_page: 100,
        };

        assert_eq!(pagination.offset(), i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let pagination = Pagination {
            page: 2,
            per_page: 20,
        };

        let response = PaginatedResponse::new(vec![1, 2, 3], 41, pagination);

        assert_eq!(
            response.meta,
            PageMeta {
                current_page: 2,
                total_items: 41,
                total_pages: 3,
                per_page: 20
            }
        );
    }

    #[test]
    fn empty_result_has_no_pages() {
        let response = PaginatedResponse::<i32>::new(
            Vec::new(),
            0,
            Pagination {
                page: 1,
                per_page: 20,
            },
        );

        assert!(response.data.is_empty());
        assert_eq!(response.meta.total_pages, 0);
    }
}
