use tracing::{debug, error};

use super::traits::AdminSource;
use crate::error::ApiError;
use crate::models::{Blog, Property, Vendor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Vendors,
    Properties,
    Blogs,
}

/// Rows loaded for the active admin tab
#[derive(Debug, Clone)]
pub enum AdminData {
    Vendors(Vec<Vendor>),
    Properties(Vec<Property>),
    Blogs(Vec<Blog>),
}

impl AdminData {
    pub fn len(&self) -> usize {
        match self {
            AdminData::Vendors(v) => v.len(),
            AdminData::Properties(p) => p.len(),
            AdminData::Blogs(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tab, visibility toggles and pagination of the admin dashboard
#[derive(Debug, Clone)]
pub struct AdminQuery {
    tab: AdminTab,
    include_inactive: bool,
    include_unpublished: bool,
    page: u32,
    total_pages: u32,
}

impl Default for AdminQuery {
    fn default() -> Self {
        Self {
            tab: AdminTab::default(),
            include_inactive: false,
            include_unpublished: false,
            page: 1,
            total_pages: 0,
        }
    }
}

impl AdminQuery {
    pub fn tab(&self) -> AdminTab {
        self.tab
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn select_tab(&mut self, tab: AdminTab) {
        if tab != self.tab {
            self.tab = tab;
            self.page = 1;
            self.total_pages = 0;
        }
    }

    pub fn set_include_inactive(&mut self, include: bool) {
        if include != self.include_inactive {
            self.include_inactive = include;
            self.page = 1;
        }
    }

    pub fn set_include_unpublished(&mut self, include: bool) {
        if include != self.include_unpublished {
            self.include_unpublished = include;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

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

    /// Load the active tab. The vendors tab is unpaged.
    pub async fn fetch(&mut self, source: &dyn AdminSource, token: &str) -> Result<AdminData, ApiError> {
        debug!(
            "Loading admin tab {:?}, page {}, include_inactive {}, include_unpublished {}",
            self.tab, self.page, self.include_inactive, self.include_unpublished
        );

        let result = match self.tab {
            AdminTab::Vendors => source
                .load_vendors(self.include_inactive, token)
                .await
                .map(AdminData::Vendors),
            AdminTab::Properties => source
                .load_properties(self.page, self.include_inactive, token)
                .await
                .map(|paged| {
                    self.total_pages = paged.pages;
                    AdminData::Properties(paged.items)
                }),
            AdminTab::Blogs => source
                .load_blogs(self.page, self.include_unpublished, token)
                .await
                .map(|paged| {
                    self.total_pages = paged.pages;
                    AdminData::Blogs(paged.items)
                }),
        };

        result.inspect_err(|e| error!("Error fetching admin data: {}", e))
    }
}
