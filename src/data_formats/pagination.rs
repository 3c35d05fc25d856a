use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

pub fn page_count(total: i64, per_page: u32) -> u32 {
    if total <= 0 {
        return 0;
    }
    let per_page = i64::from(per_page.max(1));
    u32::try_from((total + per_page - 1) / per_page).unwrap_or(u32::MAX)
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let pages = page_count(total, request.per_page);
        Paginated {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            pages,
            has_prev: request.page > 1,
            has_next: request.page < pages,
        }
    }

    /// Beyond the last page. Page 1 of an empty listing is still valid.
    pub fn is_past_end(&self) -> bool {
        self.page > 1 && self.page > self.pages
    }

    pub fn last_page(&self) -> u32 {
        self.pages.max(1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
        }
    }
}
