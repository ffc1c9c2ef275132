use chrono::NaiveDate;

use crate::{
    dtos::{BlogQueryDto, ListQueryDto, Metadata},
    error::ErrorMessage,
};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_SIZE: i64 = 10;
const DEFAULT_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated paging, ordering and search for one list request
///
/// `field` is always one of the whitelisted column names handed to
/// `from_query`, so it is safe to splice into an `ORDER BY`. The row offset
/// is computed there too and fits in an `i64`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub size: i64,
    pub order: SortOrder,
    pub field: &'static str,
    pub search: Option<String>,
    offset: i64,
}

impl ListParams {
    pub fn from_query(
        query: &ListQueryDto,
        sortable: &[&'static str],
    ) -> Result<Self, ErrorMessage> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let size = query.size.unwrap_or(DEFAULT_SIZE);
        if page < 1 || size < 1 || size == i64::MAX {
            return Err(ErrorMessage::InvalidRequest);
        }
        let offset = (page - 1)
            .checked_mul(size)
            .ok_or(ErrorMessage::InvalidRequest)?;

        let order = match query.order.as_deref().map(str::to_uppercase).as_deref() {
            None | Some("") | Some("ASC") => SortOrder::Asc,
            Some("DESC") => SortOrder::Desc,
            Some(_) => return Err(ErrorMessage::InvalidRequest),
        };

        let requested = query
            .field
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FIELD);
        let field = sortable
            .iter()
            .copied()
            .find(|allowed| *allowed == requested)
            .ok_or(ErrorMessage::InvalidRequest)?;

        let search = query
            .s
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ListParams {
            page,
            size,
            order,
            field,
            search,
            offset,
        })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// One row more than a page, so the store tells us whether more exist.
    pub fn fetch_limit(&self) -> i64 {
        self.size + 1
    }

    /// `%term%` pattern for `ILIKE`, with the LIKE wildcards escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }
}

/// Structured filters only the blog listing has
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogFilter {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub tags: Vec<i64>,
}

impl BlogFilter {
    pub fn from_query(query: &BlogQueryDto) -> Result<Self, ErrorMessage> {
        let start = non_empty(query.start_date.as_deref());
        let end = non_empty(query.end_date.as_deref());

        let date_range = match (start, end) {
            (None, None) => None,
            (Some(start), Some(end)) => {
                let start = parse_date(start)?;
                let end = parse_date(end)?;
                if start > end {
                    return Err(ErrorMessage::InvalidRequest);
                }
                Some((start, end))
            }
            _ => return Err(ErrorMessage::InvalidRequest),
        };

        let tags = match non_empty(query.tags.as_deref()) {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| id.parse::<i64>().map_err(|_| ErrorMessage::InvalidRequest))
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(BlogFilter { date_range, tags })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate, ErrorMessage> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ErrorMessage::InvalidRequest)
}

pub fn total_pages(total_data: i64, size: i64) -> i64 {
    if size <= 0 {
        return 0;
    }
    (total_data + size - 1) / size
}

/// Trim the look-ahead row and build the page metadata.
pub fn paginate<T>(mut rows: Vec<T>, total_data: i64, params: &ListParams) -> (Vec<T>, Metadata) {
    rows.truncate(params.size as usize);

    let meta = Metadata {
        page: params.page,
        size: params.size,
        order: params.order.as_sql().to_string(),
        total_data,
        total_pages: total_pages(total_data, params.size),
    };

    (rows, meta)
}
