/// Number of pages needed for `total` records, `limit` per page.
///
/// An unknown or zero total gives zero pages.
///
/// ```
/// use roster::pagination::total_pages;
///
/// assert_eq!(total_pages(Some(25), 10), 3);
/// assert_eq!(total_pages(Some(30), 10), 3);
/// assert_eq!(total_pages(None, 10), 0);
/// ```
pub const fn total_pages(total: Option<u64>, limit: u32) -> u32 {
    match total {
        Some(total) if limit > 0 => {
            let pages = total.div_ceil(limit as u64);
            if pages > u32::MAX as u64 {
                u32::MAX
            } else {
                pages as u32
            }
        }
        _ => 0,
    }
}

/// Position within the listing, as shown by the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total: u32,
}

impl Pagination {
    pub const fn new(page: u32, total: u32) -> Self {
        Self { page, total }
    }

    pub const fn previous_disabled(&self) -> bool {
        self.page == 1
    }

    /// Only inert on the exact last page; with zero pages it stays active.
    pub const fn next_disabled(&self) -> bool {
        self.page == self.total
    }

    /// Page the Previous control leads to, if active.
    pub const fn previous(&self) -> Option<u32> {
        if self.previous_disabled() {
            None
        } else {
            Some(self.page.saturating_sub(1))
        }
    }

    pub const fn next(&self) -> Option<u32> {
        if self.next_disabled() {
            None
        } else {
            Some(self.page.saturating_add(1))
        }
    }

    /// Page numbers to draw, `1..=total`.
    pub fn pages(&self) -> impl Iterator<Item = u32> + use<> {
        1..=self.total
    }

    pub const fn is_current(&self, page: u32) -> bool {
        self.page == page
    }
}
