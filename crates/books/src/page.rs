/// Number of results on one page. It is sent explicitly with every search
/// so the page arithmetic below matches what the API returns.
pub const PAGE_SIZE: u32 = 10;

/// Page arithmetic for a result set of `total` items viewed at `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pagination {
    offset: u32,
    total: u32,
}

impl Pagination {
    /// Creates the pagination state. `offset` is rounded down to a page
    /// boundary.
    #[inline]
    pub fn new(offset: u32, total: u32) -> Self {
        Self {
            offset: align_offset(offset),
            total,
        }
    }

    /// Zero-based index of the first item on the page.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// One-based number of the current page.
    #[inline]
    pub fn current_page(&self) -> u32 {
        self.offset / PAGE_SIZE + 1
    }

    /// `ceil(total / PAGE_SIZE)`.
    #[inline]
    pub fn total_pages(&self) -> u32 {
        self.total.div_ceil(PAGE_SIZE)
    }

    /// The first page has no previous page.
    #[inline]
    pub fn previous_disabled(&self) -> bool {
        self.offset == 0
    }

    /// The page ending at or past `total` has no next page.
    #[inline]
    pub fn next_disabled(&self) -> bool {
        // Computed in u64 so the last representable page does not wrap.
        (u64::from(self.offset / PAGE_SIZE) + 1) * u64::from(PAGE_SIZE)
            >= u64::from(self.total)
    }

    /// Offset of the previous page, if it can be selected.
    pub fn previous_offset(&self) -> Option<u32> {
        (!self.previous_disabled()).then(|| self.offset - PAGE_SIZE)
    }

    /// Offset of the next page, if it can be selected.
    pub fn next_offset(&self) -> Option<u32> {
        if self.next_disabled() {
            return None;
        }
        self.offset.checked_add(PAGE_SIZE)
    }
}

pub(crate) fn align_offset(offset: u32) -> u32 {
    offset - offset % PAGE_SIZE
}
