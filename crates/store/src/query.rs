use chrono::{DateTime, NaiveDate, Utc};

/// Date window for the ordered-items report.
///
/// Both bounds are inclusive calendar dates (UTC). A missing bound leaves
/// that side of the window open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderedItemsQuery {
    /// Earliest order date to count (inclusive).
    pub start: Option<NaiveDate>,

    /// Latest order date to count (inclusive).
    pub end: Option<NaiveDate>,
}

impl OrderedItemsQuery {
    /// Creates a query with an open window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts only orders placed on or after this date.
    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    /// Counts only orders placed on or before this date.
    pub fn end(mut self, date: NaiveDate) -> Self {
        self.end = Some(date);
        self
    }

    /// Returns true if an order created at `timestamp` falls in the window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        if let Some(start) = self.start
            && date < start
        {
            return false;
        }
        if let Some(end) = self.end
            && date > end
        {
            return false;
        }
        true
    }
}

/// Sort order of the leftovers report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeftoverSort {
    /// Ingredient name, ascending.
    #[default]
    Name,
    /// Stock level, descending.
    Quantity,
}

impl std::str::FromStr for LeftoverSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(LeftoverSort::Name),
            "quantity" => Ok(LeftoverSort::Quantity),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

/// One page of the leftovers report.
///
/// Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftoversQuery {
    pub sort_by: LeftoverSort,
    pub page: u32,
    pub page_size: u32,
}

impl Default for LeftoversQuery {
    fn default() -> Self {
        Self {
            sort_by: LeftoverSort::Name,
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

impl LeftoversQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Creates a query for the first page sorted by name.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, sort_by: LeftoverSort) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Selects a page; 0 is treated as 1.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size; 0 falls back to the default.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size == 0 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    /// Number of rows before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size.max(1)))
    }
}
