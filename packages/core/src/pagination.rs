//! Limit/offset windows and `prev`/`self`/`next` navigation links.
//!
//! The where-clause is display-only: it is echoed into every generated link
//! but never applied to the underlying read.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback ceiling for `limit` when none is configured.
pub const DEFAULT_LIMIT: usize = 10;

/// A navigation descriptor, serialised as `{ "rel": "next", "href": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    fn new(rel: &str, href: String) -> Self {
        Self {
            rel: rel.to_string(),
            href,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("{name} must be a non-negative integer, got: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Every parameter other than `limit` and `offset`, in query order.
    pub where_clause: Vec<(String, String)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListParams {
    /// Split query pairs into the window parameters and the where-clause.
    /// A repeated `limit` or `offset` keeps its last value.
    pub fn from_query(pairs: Vec<(String, String)>) -> Result<Self, PaginationError> {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "limit" => params.limit = Some(parse_number("limit", &value)?),
                "offset" => params.offset = Some(parse_number("offset", &value)?),
                _ => params.where_clause.push((key, value)),
            }
        }
        Ok(params)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<usize, PaginationError> {
    value.trim().parse().map_err(|_| PaginationError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

/// The slice of a result list a store should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Everything from the start; used by reads that are not paginated.
    pub const ALL: Page = Page {
        limit: usize::MAX,
        offset: 0,
    };
}

/// The effective window for one list request, with its links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub where_clause: Vec<(String, String)>,
    pub limit: usize,
    pub offset: Option<usize>,
    pub links: Vec<Link>,
}

/// Compute the window and links for a list request on `path`.
///
/// `ceiling` caps the limit and also stands in for a missing one. A zero
/// limit or zero offset counts as not supplied.
pub fn build_window(path: &str, params: ListParams, ceiling: usize) -> Window {
    let limit = match params.limit {
        Some(l) if l > 0 && l <= ceiling => l,
        _ => ceiling,
    };
    let offset = params.offset.filter(|&o| o > 0);

    let mut base = format!("{path}?");
    if !params.where_clause.is_empty() {
        let terms: Vec<String> = params
            .where_clause
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        base.push_str(&terms.join(","));
        base.push('&');
    }

    let mut links = Vec::with_capacity(3);
    match offset {
        Some(offset) => {
            let prev = match offset.checked_sub(limit) {
                Some(p) if p > 0 => format!("{base}limit={limit}&offset={p}"),
                _ => format!("{base}limit={limit}"),
            };
            links.push(Link::new("prev", prev));
            links.push(Link::new("self", format!("{base}limit={limit}&offset={offset}")));
            // No page can start past the largest representable offset.
            if let Some(next) = offset.checked_add(limit) {
                links.push(Link::new("next", format!("{base}limit={limit}&offset={next}")));
            }
        }
        None => {
            links.push(Link::new("self", format!("{base}limit={limit}")));
            links.push(Link::new("next", format!("{base}limit={limit}&offset={limit}")));
        }
    }

    Window {
        where_clause: params.where_clause,
        limit,
        offset,
        links,
    }
}

impl Window {
    /// The page to request from the store: one row past the window, so that
    /// [`Window::finish`] can tell whether a next page exists.
    pub fn fetch_page(&self) -> Page {
        Page {
            limit: self.limit.saturating_add(1),
            offset: self.offset.unwrap_or(0),
        }
    }

    /// Cut `items` (fetched with [`Window::fetch_page`]) down to the window
    /// and drop the trailing `next` link when there is no further page.
    pub fn finish<T>(&mut self, items: &mut Vec<T>) {
        if items.len() > self.limit {
            items.truncate(self.limit);
        } else if self.links.last().is_some_and(|l| l.rel == "next") {
            self.links.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<usize>, offset: Option<usize>) -> ListParams {
        ListParams {
            where_clause: vec![],
            limit,
            offset,
        }
    }

    fn hrefs(w: &Window) -> Vec<(&str, &str)> {
        w.links.iter().map(|l| (l.rel.as_str(), l.href.as_str())).collect()
    }

    #[test]
    fn no_offset_emits_self_and_next() {
        let w = build_window("/friends/alice", params(Some(2), None), 10);
        assert_eq!(w.limit, 2);
        assert_eq!(
            hrefs(&w),
            vec![
                ("self", "/friends/alice?limit=2"),
                ("next", "/friends/alice?limit=2&offset=2"),
            ]
        );
    }

    #[test]
    fn offset_emits_prev_self_next() {
        let w = build_window("/friends/alice", params(Some(2), Some(4)), 10);
        assert_eq!(
            hrefs(&w),
            vec![
                ("prev", "/friends/alice?limit=2&offset=2"),
                ("self", "/friends/alice?limit=2&offset=4"),
                ("next", "/friends/alice?limit=2&offset=6"),
            ]
        );
    }

    #[test]
    fn prev_drops_offset_when_it_would_not_be_positive() {
        let w = build_window("/friends/alice", params(Some(2), Some(1)), 10);
        assert_eq!(w.links[0].href, "/friends/alice?limit=2");

        let w = build_window("/friends/alice", params(Some(2), Some(2)), 10);
        assert_eq!(w.links[0].href, "/friends/alice?limit=2");
    }

    #[test]
    fn limit_is_capped_by_ceiling() {
        assert_eq!(build_window("/p", params(Some(50), None), 10).limit, 10);
        assert_eq!(build_window("/p", params(None, None), 10).limit, 10);
        assert_eq!(build_window("/p", params(Some(0), None), 10).limit, 10);
        assert_eq!(build_window("/p", params(Some(10), None), 10).limit, 10);
    }

    #[test]
    fn zero_offset_counts_as_absent() {
        let w = build_window("/p", params(Some(3), Some(0)), 10);
        assert_eq!(w.offset, None);
        assert_eq!(w.links.len(), 2);
    }

    #[test]
    fn where_clause_is_echoed_before_window_params() {
        let p = ListParams {
            where_clause: vec![("city".into(), "Paris".into()), ("age".into(), "30".into())],
            limit: Some(5),
            offset: None,
        };
        let w = build_window("/friends/alice", p, 10);
        assert_eq!(w.links[0].href, "/friends/alice?city=Paris,age=30&limit=5");
        assert_eq!(w.where_clause.len(), 2);
    }

    #[test]
    fn from_query_splits_window_params() {
        let p = ListParams::from_query(vec![
            ("limit".into(), "2".into()),
            ("city".into(), "Paris".into()),
            ("offset".into(), "4".into()),
        ])
        .unwrap();
        assert_eq!(p.limit, Some(2));
        assert_eq!(p.offset, Some(4));
        assert_eq!(p.where_clause, vec![("city".to_string(), "Paris".to_string())]);
    }

    #[test]
    fn offset_at_the_top_of_the_range_has_no_next() {
        let p = ListParams::from_query(vec![("offset".into(), usize::MAX.to_string())]).unwrap();
        let mut w = build_window("/p", p, 10);
        assert_eq!(w.links.len(), 2);
        assert_eq!(w.links[1].href, format!("/p?limit=10&offset={}", usize::MAX));
        assert_eq!(w.fetch_page(), Page { limit: 11, offset: usize::MAX });

        let mut items = vec!["a"; 11];
        w.finish(&mut items);
        assert_eq!(items.len(), 10);
        assert!(w.links.iter().all(|l| l.rel != "next"));
    }

    #[test]
    fn from_query_rejects_non_numeric_limit() {
        let err = ListParams::from_query(vec![("limit".into(), "ten".into())]).unwrap_err();
        assert_eq!(
            err,
            PaginationError::InvalidNumber {
                name: "limit",
                value: "ten".into()
            }
        );
    }

    #[test]
    fn full_page_without_lookahead_row_has_no_next() {
        let mut w = build_window("/p", params(Some(2), Some(4)), 10);
        assert_eq!(w.fetch_page(), Page { limit: 3, offset: 4 });

        let mut items = vec!["a", "b"];
        w.finish(&mut items);
        assert_eq!(items, vec!["a", "b"]);
        assert!(w.links.iter().all(|l| l.rel != "next"));
    }

    #[test]
    fn lookahead_row_keeps_next_and_is_cut() {
        let mut w = build_window("/p", params(Some(2), Some(4)), 10);
        let mut items = vec!["a", "b", "c"];
        w.finish(&mut items);
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(w.links.last().unwrap().rel, "next");
    }

    #[test]
    fn empty_result_has_no_next() {
        let mut w = build_window("/p", params(None, None), 10);
        let mut items: Vec<String> = vec![];
        w.finish(&mut items);
        assert_eq!(hrefs(&w), vec![("self", "/p?limit=10")]);
    }
}
