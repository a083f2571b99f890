use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// 1-based page request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }.clamped()
    }

    /// Page at least 1, limit within 1..=100.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    /// 1-based position of the first doc of this page within all docs.
    pub paging_counter: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: i64, req: PageRequest) -> Self {
        let req = req.clamped();
        let total_pages = if total_docs <= 0 {
            1
        } else {
            (total_docs + req.limit - 1) / req.limit
        };
        let has_prev_page = req.page > 1;
        let has_next_page = req.page < total_pages;
        Self {
            docs,
            total_docs: total_docs.max(0),
            limit: req.limit,
            page: req.page,
            total_pages,
            paging_counter: req.offset().saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| req.page - 1),
            next_page: has_next_page.then(|| req.page + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_clamped() {
        let r = PageRequest::new(0, 1000);
        assert_eq!(r.page, 1);
        assert_eq!(r.limit, 100);
        assert_eq!(PageRequest::new(3, 0).limit, 1);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let r = PageRequest::new(i64::MAX, 100);
        assert_eq!(r.offset(), i64::MAX);
        let page: Page<u8> = Page::new(vec![], 5, r);
        assert_eq!(page.paging_counter, i64::MAX);
        assert!(!page.has_next_page);
        assert_eq!(page.prev_page, Some(i64::MAX - 1));
    }

    #[test]
    fn middle_page_metadata() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 23, PageRequest::new(2, 5));
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.paging_counter, 6);
        assert!(page.has_prev_page && page.has_next_page);
        assert_eq!(page.prev_page, Some(1));
        assert_eq!(page.next_page, Some(3));
    }

    #[test]
    fn empty_result_is_single_page() {
        let page: Page<u8> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn serialises_camel_case() {
        let json = serde_json::to_value(Page::new(vec!["a"], 1, PageRequest::default())).unwrap();
        assert_eq!(json["totalDocs"], 1);
        assert_eq!(json["hasNextPage"], false);
        assert!(json["prevPage"].is_null());
    }
}
