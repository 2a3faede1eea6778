//! Pagination and selection formatting
//!
//! Page envelopes carry `data`, `links` and `meta`. The navigation window shows
//! three pages on each side of the current one and pins the first and last
//! two pages once there are 14 pages or more.

use reqwest::Url;
use serde::Serialize;

use super::error::{ResourceError, ResourceResult};
use crate::repository::Pagination;

/// Largest accepted `per_page`
pub const MAX_PER_PAGE: u64 = 100;

/// Largest row offset a page may start at (the SQL `OFFSET` is a signed 64-bit value)
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pages shown on each side of the current page
const ON_EACH_SIDE: u64 = 3;

/// Rendering mode for collection reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Pagination,
    Selection,
}

impl Mode {
    /// Parse the `mode` query parameter; absent means pagination
    pub fn parse(raw: Option<&str>) -> ResourceResult<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("pagination") => Ok(Self::Pagination),
            Some("selection") => Ok(Self::Selection),
            Some(other) => Err(ResourceError::validation(format!(
                "Invalid mode '{}'. Use 'pagination' or 'selection'.",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pagination => "pagination",
            Self::Selection => "selection",
        }
    }
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Validate `page` / `per_page`; both or neither must be supplied
    ///
    /// ```rust
    /// use procurement_service::resource::PageRequest;
    ///
    /// let request = PageRequest::parse(Some("2"), Some("25"), 10).unwrap();
    /// assert_eq!((request.page, request.per_page), (2, 25));
    /// assert_eq!(PageRequest::parse(None, None, 10).unwrap().per_page, 10);
    /// assert!(PageRequest::parse(Some("1"), None, 10).is_err());
    /// assert!(PageRequest::parse(Some("1"), Some("101"), 10).is_err());
    /// ```
    pub fn parse(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: u64,
    ) -> ResourceResult<Self> {
        match (page, per_page) {
            (None, None) => Ok(Self {
                page: 1,
                per_page: default_per_page.clamp(1, MAX_PER_PAGE),
            }),
            (Some(page), Some(per_page)) => {
                let page = parse_bounded("page", page, 1, u64::MAX)?;
                let per_page = parse_bounded("per_page", per_page, 1, MAX_PER_PAGE)?;
                match (page - 1).checked_mul(per_page) {
                    Some(offset) if offset <= MAX_OFFSET => Ok(Self { page, per_page }),
                    _ => Err(ResourceError::validation(
                        "The 'page' parameter is out of range.",
                    )),
                }
            }
            _ => Err(ResourceError::validation(
                "Both 'page' and 'per_page' parameters must be provided together.",
            )),
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.page, self.per_page)
    }
}

fn parse_bounded(name: &str, raw: &str, min: u64, max: u64) -> ResourceResult<u64> {
    let value = raw.trim().parse::<u64>().map_err(|_| {
        ResourceError::validation(format!("The '{}' parameter must be an integer.", name))
    })?;
    if value < min || value > max {
        return Err(if max == u64::MAX {
            ResourceError::validation(format!("The '{}' parameter must be at least {}.", name, min))
        } else {
            ResourceError::validation(format!(
                "The '{}' parameter must be between {} and {}.",
                name, min, max
            ))
        });
    }
    Ok(value)
}

/// Top-level page links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// One entry of the navigation sequence in `meta.links`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// Page metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub path: String,
    pub links: Vec<PageLink>,
}

/// Builds page URLs that keep `per_page` and the search term
#[derive(Debug, Clone)]
pub struct PageUrls {
    path: String,
    per_page: u64,
    search: Option<String>,
}

impl PageUrls {
    pub fn new(path: impl Into<String>, per_page: u64, search: Option<&str>) -> Self {
        Self {
            path: path.into(),
            per_page,
            search: search.map(str::to_string),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self, page: u64) -> String {
        let mut pairs = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }

        match Url::parse(&self.path) {
            Ok(mut url) => {
                url.query_pairs_mut().extend_pairs(pairs.iter());
                url.to_string()
            }
            Err(_) => {
                let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                format!("{}?{}", self.path, query.join("&"))
            }
        }
    }
}

/// Page numbers of the navigation window; `None` marks a `...` gap
///
/// ```rust
/// use procurement_service::resource::page_window;
///
/// assert_eq!(page_window(3, 5), vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
/// let window = page_window(10, 20);
/// assert_eq!(window.first(), Some(&Some(1)));
/// assert_eq!(window[2], None);
/// ```
pub fn page_window(current: u64, last: u64) -> Vec<Option<u64>> {
    let range = |from: u64, to: u64| (from..=to).map(Some).collect::<Vec<_>>();

    if last < ON_EACH_SIDE * 2 + 8 {
        return range(1, last.max(1));
    }

    let window = ON_EACH_SIDE + 4;
    let mut pages = Vec::new();
    if current <= window {
        pages.extend(range(1, window + ON_EACH_SIDE));
        pages.push(None);
        pages.extend(range(last - 1, last));
    } else if current > last - window {
        pages.extend(range(1, 2));
        pages.push(None);
        pages.extend(range(last - (window + ON_EACH_SIDE - 1), last));
    } else {
        pages.extend(range(1, 2));
        pages.push(None);
        pages.extend(range(current - ON_EACH_SIDE, current + ON_EACH_SIDE));
        pages.push(None);
        pages.extend(range(last - 1, last));
    }
    pages
}

/// A rendered page of items
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Assemble a page from the items of `request` and the total count
    pub fn new(data: Vec<T>, total: u64, request: PageRequest, urls: &PageUrls) -> Self {
        let per_page = request.per_page.max(1);
        let current = request.page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let offset = (current - 1).saturating_mul(per_page);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            (
                Some(offset.saturating_add(1)),
                Some(offset.saturating_add(data.len() as u64)),
            )
        };

        let prev = (current > 1).then(|| urls.url(current - 1));
        let next = (current < last_page).then(|| urls.url(current + 1));

        let mut nav = Vec::new();
        nav.push(PageLink {
            url: prev.clone(),
            label: "&laquo; Previous".to_string(),
            active: false,
        });
        for entry in page_window(current, last_page) {
            nav.push(match entry {
                Some(page) => PageLink {
                    url: Some(urls.url(page)),
                    label: page.to_string(),
                    active: page == current,
                },
                None => PageLink {
                    url: None,
                    label: "...".to_string(),
                    active: false,
                },
            });
        }
        nav.push(PageLink {
            url: next.clone(),
            label: "Next &raquo;".to_string(),
            active: false,
        });

        Self {
            data,
            links: PageLinks {
                first: urls.url(1),
                last: urls.url(last_page),
                prev,
                next,
            },
            meta: PageMeta {
                current_page: current,
                from,
                to,
                last_page,
                per_page,
                total,
                path: urls.path().to_string(),
                links: nav,
            },
        }
    }
}
