//! Paging, sorting and filtering state for the list screens

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Sortable columns of the users table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortKey {
    #[default]
    Name,
    Email,
    Onboarding,
    Verified,
}

impl UserSortKey {
    pub fn as_param(&self) -> &'static str {
        match self {
            UserSortKey::Name => "name",
            UserSortKey::Email => "email",
            UserSortKey::Onboarding => "onboarding",
            UserSortKey::Verified => "verified",
        }
    }
}

pub const PAGE_SIZES: [u32; 3] = [5, 8, 10];

/// Paging state of the users table. Every change other than moving between
/// pages sends the view back to page 1.
#[derive(Debug, Clone, PartialEq)]
pub struct UserListState {
    pub page: u32,
    pub per_page: u32,
    pub sort_key: UserSortKey,
    pub sort_order: SortOrder,
    pub search: String,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Default for UserListState {
    fn default() -> Self {
        UserListState {
            page: 1,
            per_page: 10,
            sort_key: UserSortKey::Name,
            sort_order: SortOrder::Asc,
            search: String::new(),
            total_pages: 1,
            total_items: 0,
        }
    }
}

impl UserListState {
    /// The search box changed; the term itself is applied once typing settles
    pub fn search_edited(&mut self) {
        self.page = 1;
    }

    pub fn set_search(&mut self, search: &str) {
        if self.search != search {
            self.search = search.to_string();
            self.page = 1;
        }
    }

    pub fn set_per_page(&mut self, per_page: u32) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    /// Same column flips the direction, a new column starts ascending
    pub fn sort_by(&mut self, key: UserSortKey) {
        if self.sort_key == key {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Asc;
        }
        self.page = 1;
    }

    pub fn go_to(&mut self, page: u32) {
        self.page = page.clamp(1, self.total_pages.max(1));
    }

    pub fn set_totals(&mut self, total_pages: u32, total_items: u64) {
        self.total_pages = total_pages.max(1);
        self.total_items = total_items;
    }

    /// 1-based first and last row shown, for "Showing x to y of z"
    pub fn showing(&self) -> (u64, u64) {
        let per_page = self.per_page as u64;
        let first = (self.page as u64 - 1) * per_page + 1;
        let last = (self.page as u64 * per_page).min(self.total_items);
        (first.min(self.total_items.max(1)), last)
    }
}

/// Jumps the movements ledger to its last page on the first load of a mount,
/// so the most recent activity shows first. Consumed by that first load
/// whether or not a jump happened.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LastPageJump {
    consumed: bool,
}

impl LastPageJump {
    /// Returns the page to move to, at most once
    pub fn on_load(&mut self, current_page: u32, total_pages: u32) -> Option<u32> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        if current_page == 1 && total_pages > 1 {
            Some(total_pages)
        } else {
            None
        }
    }
}

/// Page numbers to render in a pager, with `None` for a gap
pub fn page_window(current: u32, total: u32) -> Vec<Option<u32>> {
    let total = total.max(1);
    if total <= 7 {
        return (1..=total).map(Some).collect();
    }
    let mut pages = vec![Some(1)];
    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    if start > 2 {
        pages.push(None);
    }
    for page in start..=end {
        pages.push(Some(page));
    }
    if end < total - 1 {
        pages.push(None);
    }
    pages.push(Some(total));
    pages
}
