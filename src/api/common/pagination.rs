//
//  bitbucket-ingest
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination Types for Bitbucket API Responses
//!
//! Bitbucket Cloud answers list requests in two incompatible shapes depending
//! on the API version, and these types normalize the difference.
//!
//! # Overview
//!
//! | Type | API | Shape |
//! |------|-----|-------|
//! | [`PaginatedResponse`] | 2.0 | Object with `values` and a `next` URL |
//! | bare JSON array | 1.0 (legacy) | The items, with no paging metadata |
//! | [`Page`] | both | Normalized: items plus an optional continuation |
//!
//! Legacy responses always normalize to a single, final page.
//!
//! # Example
//!
//! ```rust
//! use bitbucket_ingest::api::common::{Page, PaginatedResponse};
//!
//! let json = r#"{"values": [1, 2], "next": "https://bitbucket.org/api/2.0/x?page=2"}"#;
//! let modern: PaginatedResponse<u32> = serde_json::from_str(json).unwrap();
//! let page = Page::from(modern);
//! assert!(page.has_next());
//!
//! let legacy = Page::from_legacy(vec![1, 2, 3]);
//! assert!(!legacy.has_next());
//! ```

use serde::{Deserialize, Serialize};

/// Paginated response from the Bitbucket Cloud 2.0 API.
///
/// # Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `values` | `Vec<T>` | Array of items in the current page |
/// | `page` | `Option<u32>` | Current page number (1-indexed) |
/// | `pagelen` | `Option<u32>` | Number of items per page |
/// | `size` | `Option<u32>` | Total number of items across all pages |
/// | `next` | `Option<String>` | URL to fetch the next page |
/// | `previous` | `Option<String>` | URL to fetch the previous page |
///
/// # Notes
///
/// - The `size` field may not always be present for performance reasons
/// - `next` is a fully-qualified URL on the 2.0 base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Array of items in the current page. May be empty.
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,

    /// Current page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,

    /// Number of items per page.
    #[serde(default)]
    pub pagelen: Option<u32>,

    /// Total number of items across all pages, when the provider computes it.
    #[serde(default)]
    pub size: Option<u32>,

    /// URL to fetch the next page of results. `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,

    /// URL to fetch the previous page of results. `None` on the first page.
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// Checks if there are more pages of results available.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns the URL for the next page of results.
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref()
    }
}

/// A normalized page of results, independent of API version.
///
/// Produced by the page walker for every page it fetches and handed to the
/// caller's page callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in provider order.
    pub values: Vec<T>,

    /// Continuation reference, if another page follows.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Wraps a legacy (1.0) bare-array response.
    ///
    /// The result never carries a continuation, regardless of its length.
    pub fn from_legacy(values: Vec<T>) -> Self {
        Self { values, next: None }
    }

    /// Checks if another page follows this one.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

impl<T> From<PaginatedResponse<T>> for Page<T> {
    fn from(response: PaginatedResponse<T>) -> Self {
        Self {
            values: response.values,
            next: response.next,
        }
    }
}

/// Every item of a paginated walk plus the number of pages consumed.
///
/// `pages` feeds the per-resource call counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    /// Items across all pages, in the order the pages were emitted.
    pub items: Vec<T>,

    /// Number of pages fetched.
    pub pages: u64,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pages: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_page_keeps_next() {
        let json = r#"{
            "values": [{"n": 1}, {"n": 2}],
            "page": 1,
            "pagelen": 2,
            "size": 5,
            "next": "https://bitbucket.org/api/2.0/workspaces?page=2"
        }"#;
        let response: PaginatedResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(response.size, Some(5));
        assert_eq!(
            response.next_url(),
            Some("https://bitbucket.org/api/2.0/workspaces?page=2")
        );

        let page = Page::from(response);
        assert_eq!(page.values.len(), 2);
        assert!(page.has_next());
    }

    #[test]
    fn test_missing_values_is_empty_page() {
        let response: PaginatedResponse<u32> = serde_json::from_str("{}").unwrap();
        assert!(response.values.is_empty());
        assert!(!response.has_next());
    }

    #[test]
    fn test_legacy_page_never_continues() {
        for len in [0usize, 1, 10, 1000] {
            let page = Page::from_legacy(vec![0u8; len]);
            assert_eq!(page.values.len(), len);
            assert!(page.next.is_none());
        }
    }
}
