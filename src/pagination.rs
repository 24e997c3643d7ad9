use axum::http::header::{CONTENT_RANGE, HeaderMap, HeaderValue};
use serde::Serialize;

/// One page of results with the metadata needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(data: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            data,
            total,
            per_page,
            current_page,
        }
    }

    /// 1-based position of the first item on this page, `None` when empty.
    #[must_use]
    pub fn first_item(&self) -> Option<u64> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.offset() + 1)
        }
    }

    /// 1-based position of the last item on this page, `None` when empty.
    #[must_use]
    pub fn last_item(&self) -> Option<u64> {
        self.first_item()
            .map(|first| first + self.data.len() as u64 - 1)
    }

    #[must_use]
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    fn offset(&self) -> u64 {
        self.current_page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Transform the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
        }
    }

    /// Fallible [`map`](Self::map).
    ///
    /// # Errors
    /// The first error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
        })
    }

    /// `Content-Range: <resource> <first>-<last>/<total>` for this page
    /// (0-based positions, as list clients expect).
    #[must_use]
    pub fn content_range(&self, resource_name: &str) -> HeaderMap {
        let start = self.offset();
        let end = (start + self.data.len() as u64).saturating_sub(1).max(start);
        let name = sanitize_resource_name(resource_name);

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("{name} {start}-{end}/{}", self.total)) {
            headers.insert(CONTENT_RANGE, value);
        }
        headers
    }
}

/// Strip control characters so the name is always a valid header value.
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Result of a read: a page when pagination was requested, otherwise every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    All(Vec<T>),
}

impl<T> Listing<T> {
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Page(page) => &page.data,
            Self::All(items) => items,
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.data,
            Self::All(items) => items,
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<&Page<T>> {
        match self {
            Self::Page(page) => Some(page),
            Self::All(_) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        match self {
            Self::Page(page) => Listing::Page(page.map(f)),
            Self::All(items) => Listing::All(items.into_iter().map(f).collect()),
        }
    }

    /// # Errors
    /// The first error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Listing<U>, E> {
        Ok(match self {
            Self::Page(page) => Listing::Page(page.try_map(f)?),
            Self::All(items) => Listing::All(items.into_iter().map(f).collect::<Result<_, _>>()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last_item() {
        let page = Page::new(vec!["a", "b"], 3, 2, 1);
        assert_eq!(page.first_item(), Some(1));
        assert_eq!(page.last_item(), Some(2));
        assert_eq!(page.last_page(), 2);
        assert!(page.has_more_pages());

        let page = Page::new(vec!["c"], 3, 2, 2);
        assert_eq!(page.first_item(), Some(3));
        assert_eq!(page.last_item(), Some(3));
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_empty_page_has_no_items() {
        let page: Page<u8> = Page::new(Vec::new(), 0, 15, 1);
        assert_eq!(page.first_item(), None);
        assert_eq!(page.last_item(), None);
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 10, 2, 3).map(|n| n * 10);
        assert_eq!(page, Page::new(vec![10, 20], 10, 2, 3));
    }

    #[test]
    fn test_content_range() {
        let page = Page::new(vec![1, 2], 3, 2, 1);
        let headers = page.content_range("users");
        assert_eq!(headers.get(CONTENT_RANGE).unwrap(), "users 0-1/3");

        let page = Page::new(vec![3], 3, 2, 2);
        assert_eq!(page.content_range("users").get(CONTENT_RANGE).unwrap(), "users 2-2/3");
    }

    #[test]
    fn test_content_range_strips_control_characters() {
        let page = Page::new(vec![1], 1, 10, 1);
        let headers = page.content_range("users\r\nInjected: evil");
        let value = headers.get(CONTENT_RANGE).unwrap().to_str().unwrap();
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_listing_serializes_untagged() {
        let listing = Listing::All(vec![1, 2]);
        assert_eq!(serde_json::to_value(&listing).unwrap(), serde_json::json!([1, 2]));

        let listing = Listing::Page(Page::new(vec![1], 1, 15, 1));
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["data"], serde_json::json!([1]));
    }
}
