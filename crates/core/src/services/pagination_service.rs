use serde::{Deserialize, Serialize};

/// First page of the page-number style.
pub const FIRST_PAGE: u32 = 1;

/// Where to read the next slice of a leaf list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageCursor {
    /// `limit` records starting at `offset` (0-based).
    Offset { limit: u32, offset: u32 },
    /// Page `page` (1-based) of `page_size` records.
    Page { page: u32, page_size: u32 },
}

impl PageCursor {
    /// Offset of the first record, for stores that only speak offset/limit.
    pub fn start(&self) -> usize {
        match *self {
            PageCursor::Offset { offset, .. } => offset as usize,
            PageCursor::Page { page, page_size } => {
                (page.max(FIRST_PAGE) as usize - 1) * page_size as usize
            }
        }
    }

    pub fn size(&self) -> usize {
        match *self {
            PageCursor::Offset { limit, .. } => limit as usize,
            PageCursor::Page { page_size, .. } => page_size as usize,
        }
    }
}

/// Page state of one leaf list.
///
/// The upstream does not reliably report totals, so "next" is always
/// available; "previous" is unavailable only at the lower bound. Changing
/// the owning identifier (account or investment) returns to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    cursor: PageCursor,
    owner: Option<String>,
}

impl PaginationController {
    /// Offset/limit style, starting at offset 0.
    pub fn offset(limit: u32) -> Self {
        Self {
            cursor: PageCursor::Offset {
                limit: limit.max(1),
                offset: 0,
            },
            owner: None,
        }
    }

    /// Page-number style, starting at page 1.
    pub fn page_number(page_size: u32) -> Self {
        Self {
            cursor: PageCursor::Page {
                page: FIRST_PAGE,
                page_size: page_size.max(1),
            },
            owner: None,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Bind to a new owner. Returns `true` if the owner changed, in which
    /// case the cursor is back at the initial page.
    pub fn set_owner(&mut self, owner: Option<&str>) -> bool {
        if self.owner.as_deref() == owner {
            return false;
        }
        self.owner = owner.map(str::to_string);
        self.reset();
        true
    }

    pub fn reset(&mut self) {
        match &mut self.cursor {
            PageCursor::Offset { offset, .. } => *offset = 0,
            PageCursor::Page { page, .. } => *page = FIRST_PAGE,
        }
    }

    pub fn is_at_start(&self) -> bool {
        match self.cursor {
            PageCursor::Offset { offset, .. } => offset == 0,
            PageCursor::Page { page, .. } => page <= FIRST_PAGE,
        }
    }

    pub fn has_previous(&self) -> bool {
        !self.is_at_start()
    }

    pub fn has_next(&self) -> bool {
        true
    }

    /// Advance one page.
    pub fn load_more(&mut self) {
        match &mut self.cursor {
            PageCursor::Offset { limit, offset } => *offset = offset.saturating_add(*limit),
            PageCursor::Page { page, .. } => *page = page.saturating_add(1),
        }
    }

    /// Go back one page, clamped at the lower bound.
    /// Returns `false` (and changes nothing) when already at the start.
    pub fn load_previous(&mut self) -> bool {
        if self.is_at_start() {
            return false;
        }
        match &mut self.cursor {
            PageCursor::Offset { limit, offset } => *offset = offset.saturating_sub(*limit),
            PageCursor::Page { page, .. } => *page = page.saturating_sub(1).max(FIRST_PAGE),
        }
        true
    }

    /// 1-based number of the current page, whatever the style.
    pub fn page_number_display(&self) -> u32 {
        match self.cursor {
            PageCursor::Offset { limit, offset } => offset / limit + 1,
            PageCursor::Page { page, .. } => page,
        }
    }
}
