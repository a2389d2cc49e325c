use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::traits::ListingSource;
use crate::api::SearchParams;
use crate::models::{ListingType, Property};

/// Filter state of the listings page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    /// Applied to fetched results only, never sent to the backend
    pub listing_type: Option<ListingType>,
    pub location: String,
    pub search: String,
}

impl ListingFilters {
    pub fn is_empty(&self) -> bool {
        self.listing_type.is_none() && self.location.trim().is_empty() && self.search.trim().is_empty()
    }
}

/// Which backend call a fetch will make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    ListAll { page: u32 },
    /// Location filters reuse the search endpoint with the location as term
    Search { term: String, page: u32 },
}

/// Filters, pagination and last results of the listings page
#[derive(Debug, Clone)]
pub struct ListingQuery {
    filters: ListingFilters,
    page: u32,
    total_pages: u32,
    results: Vec<Property>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new(ListingFilters::default())
    }
}

impl ListingQuery {
    pub fn new(filters: ListingFilters) -> Self {
        Self {
            filters,
            page: 1,
            total_pages: 0,
            results: Vec::new(),
        }
    }

    pub fn filters(&self) -> &ListingFilters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Update the search term. Returns whether it changed; a change resets to page 1.
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if search == self.filters.search {
            return false;
        }
        self.filters.search = search;
        self.page = 1;
        true
    }

    /// Update the location filter. Returns whether it changed; a change resets to page 1.
    pub fn set_location(&mut self, location: impl Into<String>) -> bool {
        let location = location.into();
        if location == self.filters.location {
            return false;
        }
        self.filters.location = location;
        self.page = 1;
        true
    }

    /// Client-side filter; keeps the current page
    pub fn set_listing_type(&mut self, listing_type: Option<ListingType>) {
        self.filters.listing_type = listing_type;
    }

    /// Reset filters and forget the last results until the next fetch
    pub fn clear(&mut self) {
        self.filters = ListingFilters::default();
        self.page = 1;
        self.total_pages = 0;
        self.results.clear();
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Move forward one page, bounded by the last known page count
    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn plan(&self) -> QueryPlan {
        let search = self.filters.search.trim();
        let location = self.filters.location.trim();

        if !search.is_empty() {
            QueryPlan::Search {
                term: search.to_string(),
                page: self.page,
            }
        } else if !location.is_empty() {
            QueryPlan::Search {
                term: location.to_string(),
                page: self.page,
            }
        } else {
            QueryPlan::ListAll { page: self.page }
        }
    }

    /// Run the current plan against `source` and return the visible listings
    pub async fn fetch(&mut self, source: &dyn ListingSource) -> Vec<&Property> {
        let plan = self.plan();
        debug!("Fetching listings with plan {:?}", plan);

        let result = match plan {
            QueryPlan::Search { term, page } => source.search(&SearchParams::term(term, page)).await,
            QueryPlan::ListAll { page } => source.list_all(page).await,
        };

        info!(
            "Fetched {} properties, page {} of {}",
            result.items.len(),
            self.page,
            result.pages
        );
        self.results = result.items;
        self.total_pages = result.pages;
        self.visible()
    }

    /// Last fetched results after the listing-type filter
    pub fn visible(&self) -> Vec<&Property> {
        self.results
            .iter()
            .filter(|p| self.filters.listing_type.map_or(true, |t| p.listing_type == t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Paged, PropertyKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn property(id: &str, listing_type: ListingType) -> Property {
        Property {
            id: id.to_string(),
            title: format!("Site {id}"),
            location: "Dallas, TX".to_string(),
            price: 1_000_000.0,
            acreage: None,
            unit_count: None,
            kind: PropertyKind::Other,
            listing_type,
            image: String::new(),
            description: None,
            images: Vec::new(),
            owner_id: None,
            realtor: None,
            active: true,
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<Vec<QueryPlan>>,
    }

    impl RecordingSource {
        fn calls(&self) -> Vec<QueryPlan> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, page: u32) -> Paged<Property> {
            Paged {
                items: vec![
                    property("1", ListingType::Sale),
                    property("2", ListingType::Lease),
                    property("3", ListingType::Sale),
                ],
                pages: 3,
                current_page: page,
            }
        }
    }

    #[async_trait]
    impl ListingSource for RecordingSource {
        async fn list_all(&self, page: u32) -> Paged<Property> {
            self.calls.lock().unwrap().push(QueryPlan::ListAll { page });
            self.page(page)
        }

        async fn search(&self, params: &SearchParams) -> Paged<Property> {
            let page = params.page.unwrap_or(1);
            self.calls.lock().unwrap().push(QueryPlan::Search {
                term: params.search_term.clone().unwrap_or_default(),
                page,
            });
            self.page(page)
        }
    }

    #[test]
    fn changing_search_resets_page() {
        let mut query = ListingQuery::default();
        query.set_page(4);

        assert!(query.set_search("storage"));
        assert_eq!(query.page(), 1);

        query.set_page(2);
        assert!(query.set_search("storage units"));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn changing_location_resets_page_but_listing_type_does_not() {
        let mut query = ListingQuery::default();
        query.set_page(3);
        query.set_listing_type(Some(ListingType::Lease));
        assert_eq!(query.page(), 3);

        assert!(query.set_location("TX"));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn setting_same_search_is_not_a_change() {
        let mut query = ListingQuery::default();
        query.set_search("Paris");
        query.set_page(2);

        assert!(!query.set_search("Paris"));
        assert_eq!(query.page(), 2);
    }

    #[test]
    fn plan_prefers_search_over_location() {
        let mut query = ListingQuery::default();
        assert_eq!(query.plan(), QueryPlan::ListAll { page: 1 });

        query.set_location("GA");
        assert_eq!(
            query.plan(),
            QueryPlan::Search {
                term: "GA".to_string(),
                page: 1
            }
        );

        query.set_search("Atlanta storage");
        assert_eq!(
            query.plan(),
            QueryPlan::Search {
                term: "Atlanta storage".to_string(),
                page: 1
            }
        );
    }

    #[tokio::test]
    async fn listing_type_filters_client_side_only() {
        let source = RecordingSource::default();
        let mut query = ListingQuery::default();
        query.set_listing_type(Some(ListingType::Lease));

        let visible: Vec<String> = query.fetch(&source).await.iter().map(|p| p.id.clone()).collect();

        assert_eq!(visible, vec!["2".to_string()]);
        assert_eq!(source.calls(), vec![QueryPlan::ListAll { page: 1 }]);
    }

    #[tokio::test]
    async fn location_goes_through_search_endpoint() {
        let source = RecordingSource::default();
        let mut query = ListingQuery::default();
        query.set_location("Monroe");
        query.fetch(&source).await;

        assert_eq!(
            source.calls(),
            vec![QueryPlan::Search {
                term: "Monroe".to_string(),
                page: 1
            }]
        );
    }

    #[tokio::test]
    async fn paging_is_bounded_by_fetched_page_count() {
        let source = RecordingSource::default();
        let mut query = ListingQuery::default();
        assert!(!query.next_page());

        query.fetch(&source).await;
        assert_eq!(query.total_pages(), 3);

        assert!(query.next_page());
        assert!(query.next_page());
        assert!(!query.next_page());
        assert_eq!(query.page(), 3);

        query.fetch(&source).await;
        assert_eq!(source.calls().last(), Some(&QueryPlan::ListAll { page: 3 }));

        assert!(query.previous_page());
        assert!(query.previous_page());
        assert!(!query.previous_page());
        assert_eq!(query.page(), 1);
    }

    #[tokio::test]
    async fn clear_forgets_fetched_results() {
        let source = RecordingSource::default();
        let mut query = ListingQuery::default();
        query.fetch(&source).await;
        assert_eq!(query.visible().len(), 3);

        query.clear();
        assert!(query.visible().is_empty());
        assert_eq!(query.total_pages(), 0);
        assert!(!query.next_page());
    }

    #[test]
    fn clear_resets_everything() {
        let mut query = ListingQuery::default();
        query.set_search("x");
        query.set_listing_type(Some(ListingType::Sale));
        query.set_page(5);
        query.clear();

        assert!(query.filters().is_empty());
        assert_eq!(query.page(), 1);
    }
}
