use plume_types::{Page, Post};

use crate::api::PageRequest;

/// A page fetch handed out by the loader. The generation ties the response
/// back to the feed identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub request: PageRequest,
}

/// Cursor-paginated view of the post feed.
///
/// A feed identity is the pair (filter, generation). Changing the filter or
/// invalidating starts a new generation: loaded pages are dropped and
/// pagination restarts at page one, while the previously displayed posts stay
/// visible until the new first page arrives. Responses for an older
/// generation are discarded.
#[derive(Debug, Default)]
pub struct FeedLoader {
    filter: Option<String>,
    generation: u64,
    pages: Vec<Page<Post>>,
    stale: Vec<Post>,
    in_flight: bool,
    error: Option<String>,
}

impl FeedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a (debounced) filter value. Returns true if the feed identity changed.
    pub fn set_filter(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        let filter = (!trimmed.is_empty()).then(|| trimmed.to_string());
        if filter == self.filter {
            return false;
        }

        log::debug!(target: "pagination", "Filter changed {:?} -> {:?}", self.filter, filter);
        self.filter = filter;
        self.restart();
        true
    }

    /// Mark every loaded page stale; the next read refetches from page one.
    pub fn invalidate(&mut self) {
        log::debug!(target: "pagination", "Feed invalidated at generation {}", self.generation);
        self.restart();
    }

    fn restart(&mut self) {
        if !self.pages.is_empty() {
            self.stale = self.pages.drain(..).flat_map(|page| page.results).collect();
        }
        self.generation += 1;
        self.in_flight = false;
        self.error = None;
    }

    /// Drop everything, including stale posts (logout, hard redirect)
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    /// Ticket for the first page when the current generation has none yet
    pub fn begin_first_page(&mut self) -> Option<PageTicket> {
        if !self.pages.is_empty() || self.in_flight || self.error.is_some() {
            return None;
        }

        self.in_flight = true;
        Some(PageTicket {
            generation: self.generation,
            request: PageRequest::First {
                filter: self.filter.clone(),
            },
        })
    }

    /// Ticket for the next page; `None` while a fetch is in flight or when
    /// the last page had no `next` cursor.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if self.in_flight || self.error.is_some() {
            return None;
        }

        let next = self.pages.last()?.next.clone()?;
        self.in_flight = true;
        log::debug!(target: "pagination", "Requesting page {} via cursor", self.pages.len() + 1);

        Some(PageTicket {
            generation: self.generation,
            request: PageRequest::Cursor(next),
        })
    }

    /// Append a fetched page. Returns false if the page belonged to an older
    /// feed identity and was dropped.
    pub fn complete_page(&mut self, generation: u64, page: Page<Post>) -> bool {
        if generation != self.generation {
            log::debug!(
                target: "pagination",
                "Dropping page for generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        self.in_flight = false;
        self.stale.clear();
        self.pages.push(page);
        true
    }

    /// Record a failed fetch for the current generation
    pub fn fail_page(&mut self, generation: u64, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = false;
        self.error = Some(message);
        true
    }

    /// Clear a fetch error so the failed page can be requested again
    pub fn retry(&mut self) {
        self.error = None;
    }

    /// Posts to display, in fetch order
    pub fn posts(&self) -> Vec<&Post> {
        if self.pages.is_empty() {
            self.stale.iter().collect()
        } else {
            self.pages.iter().flat_map(|page| page.results.iter()).collect()
        }
    }

    pub fn post_count(&self) -> usize {
        if self.pages.is_empty() {
            self.stale.len()
        } else {
            self.pages.iter().map(|page| page.results.len()).sum()
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        self.pages.last().map(|page| page.next.is_some()).unwrap_or(false)
    }

    /// Backward cursor of the first loaded page
    pub fn previous_cursor(&self) -> Option<&str> {
        self.pages.first().and_then(|page| page.previous.as_deref())
    }

    pub fn is_loading_first_page(&self) -> bool {
        self.in_flight && self.pages.is_empty()
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.in_flight && !self.pages.is_empty()
    }

    /// Showing the previous identity's posts while the new first page loads
    pub fn is_revalidating(&self) -> bool {
        self.pages.is_empty() && !self.stale.is_empty()
    }

    /// Every page of the current identity has been fetched
    pub fn is_exhausted(&self) -> bool {
        !self.pages.is_empty() && !self.has_next_page() && !self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: i64) -> Post {
        Post {
            id,
            title: format!("Post {}", id),
            content: "content".to_string(),
            author_username: "alice".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            like_count: 0,
            liked_by_current_user: false,
        }
    }

    fn page(ids: &[i64], next: Option<&str>) -> Page<Post> {
        Page {
            results: ids.iter().copied().map(post).collect(),
            next: next.map(String::from),
            previous: None,
        }
    }

    fn ids(feed: &FeedLoader) -> Vec<i64> {
        feed.posts().iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_first_page_then_cursor_pages_append_in_order() {
        let mut feed = FeedLoader::new();

        let first = feed.begin_first_page().unwrap();
        assert_eq!(first.request, PageRequest::First { filter: None });
        assert!(feed.complete_page(first.generation, page(&[1, 2], Some("c2"))));

        let second = feed.begin_next_page().unwrap();
        assert_eq!(second.request, PageRequest::Cursor("c2".to_string()));
        feed.complete_page(second.generation, page(&[3], None));

        assert_eq!(ids(&feed), vec![1, 2, 3]);
        assert!(!feed.has_next_page());
        assert!(feed.is_exhausted());
        assert_eq!(feed.begin_next_page(), None);
    }

    #[test]
    fn test_next_page_suppressed_while_in_flight() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1], Some("c2")));

        assert!(feed.begin_next_page().is_some());
        assert!(feed.is_fetching_next_page());
        assert_eq!(feed.begin_next_page(), None);
        assert_eq!(feed.begin_first_page(), None);
    }

    #[test]
    fn test_filter_change_restarts_with_filter_on_first_page_only() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1, 2], Some("c2")));

        assert!(feed.set_filter("  bob "));
        assert_eq!(feed.filter(), Some("bob"));

        let ticket = feed.begin_first_page().unwrap();
        assert_eq!(
            ticket.request,
            PageRequest::First {
                filter: Some("bob".to_string())
            }
        );
        feed.complete_page(ticket.generation, page(&[7], Some("http://api/post/?cursor=x")));

        // The cursor already encodes the filter; it is replayed as-is
        let next = feed.begin_next_page().unwrap();
        assert_eq!(
            next.request,
            PageRequest::Cursor("http://api/post/?cursor=x".to_string())
        );
    }

    #[test]
    fn test_same_filter_keeps_identity() {
        let mut feed = FeedLoader::new();
        assert!(feed.set_filter("amy"));
        let generation = feed.generation();
        assert!(!feed.set_filter(" amy "));
        assert_eq!(feed.generation(), generation);
        assert!(feed.set_filter(""));
        assert_eq!(feed.filter(), None);
    }

    #[test]
    fn test_previous_posts_stay_visible_until_new_first_page() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1, 2], Some("c2")));

        feed.set_filter("carol");
        let ticket = feed.begin_first_page().unwrap();

        assert!(feed.is_revalidating());
        assert!(feed.is_loading_first_page());
        assert_eq!(ids(&feed), vec![1, 2]);

        feed.complete_page(ticket.generation, page(&[9], None));
        assert!(!feed.is_revalidating());
        assert_eq!(ids(&feed), vec![9]);
    }

    #[test]
    fn test_late_page_from_old_identity_is_dropped() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1], Some("c2")));
        let stale_ticket = feed.begin_next_page().unwrap();

        feed.invalidate();
        let fresh = feed.begin_first_page().unwrap();

        assert!(!feed.complete_page(stale_ticket.generation, page(&[2], None)));
        assert!(feed.is_loading_first_page());
        assert!(feed.complete_page(fresh.generation, page(&[5, 1], None)));
        assert_eq!(ids(&feed), vec![5, 1]);
    }

    #[test]
    fn test_invalidate_refetches_from_first_page_with_same_filter() {
        let mut feed = FeedLoader::new();
        feed.set_filter("dan");
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1], Some("c2")));
        let second = feed.begin_next_page().unwrap();
        feed.complete_page(second.generation, page(&[2], None));

        feed.invalidate();

        assert_eq!(feed.page_count(), 0);
        assert_eq!(
            feed.begin_first_page().unwrap().request,
            PageRequest::First {
                filter: Some("dan".to_string())
            }
        );
    }

    #[test]
    fn test_failure_blocks_until_retry() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        assert!(feed.fail_page(first.generation, "Error loading posts".to_string()));

        assert_eq!(feed.error(), Some("Error loading posts"));
        assert_eq!(feed.begin_first_page(), None);

        feed.retry();
        assert!(feed.begin_first_page().is_some());
    }

    #[test]
    fn test_reset_drops_stale_posts() {
        let mut feed = FeedLoader::new();
        let first = feed.begin_first_page().unwrap();
        feed.complete_page(first.generation, page(&[1], None));

        feed.reset();

        assert_eq!(feed.post_count(), 0);
        assert!(!feed.complete_page(first.generation, page(&[1], None)));
    }
}
