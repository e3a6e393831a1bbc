//! Discovery page URL builders
//!
//! Builds the paths of the two kinds of list pages discovery scans: the
//! shop-wide explore feed (newest designs) and per-category listing pages.
//! Paths are host-relative so the fetcher can point them at a mock server
//! in tests.

/// URL builder for shop discovery pages
#[derive(Debug, Clone)]
pub struct ListingUrlBuilder {
    shop_user: String,
}

impl ListingUrlBuilder {
    #[must_use]
    pub fn new(shop_user: &str) -> Self {
        Self {
            shop_user: shop_user.to_string(),
        }
    }

    /// Build an explore page path (newest designs, most recent first)
    ///
    /// # Examples
    ///
    /// ```
    /// use rotamap::crawler::list::ListingUrlBuilder;
    ///
    /// let urls = ListingUrlBuilder::new("WearWink");
    /// assert_eq!(
    ///     urls.explore_page(2),
    ///     "/people/WearWink/explore?asc=u&page=2&sortOrder=recent"
    /// );
    /// ```
    #[must_use]
    pub fn explore_page(&self, page: u32) -> String {
        format!(
            "/people/{user}/explore?asc=u&page={page}&sortOrder=recent",
            user = self.shop_user
        )
    }

    /// Build a category listing page path
    ///
    /// # Arguments
    ///
    /// * `ia_code` - Category code (e.g. `u-tees`, `all-stickers`)
    /// * `page` - Page number, 1-based
    ///
    /// # Examples
    ///
    /// ```
    /// use rotamap::crawler::list::ListingUrlBuilder;
    ///
    /// let urls = ListingUrlBuilder::new("WearWink");
    /// let path = urls.listing_page("u-tees", 1);
    /// assert!(path.contains("iaCode=u-tees"));
    /// assert!(path.contains("page=1"));
    /// ```
    #[must_use]
    pub fn listing_page(&self, ia_code: &str, page: u32) -> String {
        format!(
            "/people/{user}/shop?artistUserName={user}&asc=u&sortOrder=recent&page={page}&iaCode={ia_code}",
            user = self.shop_user
        )
    }
}
