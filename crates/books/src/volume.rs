use serde::{Deserialize, Serialize};

use crate::page::{PAGE_SIZE, Pagination};

const UNTITLED: &str = "Untitled";

/// One entry of a search result page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Volume identifier, used for detail lookups.
    pub id: String,
    /// Title, or "Untitled" when the record has none.
    pub title: String,
    /// Subtitle.
    pub subtitle: Option<String>,
    /// Author names, possibly empty.
    pub authors: Vec<String>,
    /// Publication date as the API reports it (a year, a month or a day).
    pub published_date: Option<String>,
    /// Description, may contain HTML.
    pub description: Option<String>,
    /// Cover thumbnail.
    pub thumbnail_url: Option<String>,
    /// Link to the preview page.
    pub preview_url: Option<String>,
}

/// A page of search results.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchPage {
    /// Results in the order the API ranked them, at most [`PAGE_SIZE`].
    pub items: Vec<SearchResultItem>,
    /// The total the API declared for the whole result set.
    pub total_count: u32,
    /// Index of the first item, a multiple of [`PAGE_SIZE`].
    pub page_offset: u32,
}

impl SearchPage {
    /// A page with no results.
    pub fn empty(page_offset: u32) -> Self {
        Self {
            items: vec![],
            total_count: 0,
            page_offset,
        }
    }

    /// Always [`PAGE_SIZE`].
    #[inline]
    pub fn page_size(&self) -> u32 {
        PAGE_SIZE
    }

    /// Page arithmetic for this page.
    #[inline]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page_offset, self.total_count)
    }
}

/// The expanded record of one book.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookDetail {
    /// Volume identifier.
    pub id: String,
    /// Title, or "Untitled" when the record has none.
    pub title: String,
    /// Subtitle.
    pub subtitle: Option<String>,
    /// Author names, possibly empty.
    pub authors: Vec<String>,
    /// Publisher name.
    pub publisher: Option<String>,
    /// Publication date as the API reports it.
    pub published_date: Option<String>,
    /// Description, may contain HTML.
    pub description: Option<String>,
    /// Number of printed pages.
    pub page_count: Option<u32>,
    /// Categories, possibly empty.
    pub categories: Vec<String>,
    /// Cover thumbnail.
    pub thumbnail_url: Option<String>,
    /// Link to the preview page.
    pub preview_url: Option<String>,
}

// -----------------------------
// Types received from the API
// -----------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumesResponse {
    #[serde(default)]
    pub items: Option<Vec<Volume>>,
    #[serde(default)]
    pub total_items: Option<u32>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub volume_info: Option<VolumeInfo>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Volume {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    page_count: Option<u32>,
    categories: Option<Vec<String>>,
    image_links: Option<ImageLinks>,
    preview_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub fn describe(&self) -> String {
        match (&self.message, self.code) {
            (Some(message), _) => message.clone(),
            (None, Some(code)) => format!("error code {code}"),
            (None, None) => "unknown error".to_owned(),
        }
    }
}

impl VolumesResponse {
    /// Keeps at most one page of items. Volumes without an identifier
    /// cannot be opened and are skipped.
    pub fn into_page(self, page_offset: u32) -> SearchPage {
        let items: Vec<_> = self
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(Volume::into_item)
            .take(PAGE_SIZE as usize)
            .collect();
        SearchPage {
            items,
            total_count: self.total_items.unwrap_or(0),
            page_offset,
        }
    }
}

impl Volume {
    fn into_item(self) -> Option<SearchResultItem> {
        let info = self.volume_info;
        let Some(id) = self.id.filter(|id| !id.is_empty()) else {
            warn!("skipping a volume without an id: {:?}", info.title);
            return None;
        };
        Some(SearchResultItem {
            id,
            title: info.title.unwrap_or_else(|| UNTITLED.to_owned()),
            subtitle: info.subtitle,
            authors: info.authors.unwrap_or_default(),
            published_date: info.published_date,
            description: info.description,
            thumbnail_url: info.image_links.and_then(|links| links.thumbnail),
            preview_url: info.preview_link,
        })
    }
}

impl VolumeInfo {
    pub fn into_detail(self, id: String) -> BookDetail {
        BookDetail {
            id,
            title: self.title.unwrap_or_else(|| UNTITLED.to_owned()),
            subtitle: self.subtitle,
            authors: self.authors.unwrap_or_default(),
            publisher: self.publisher,
            published_date: self.published_date,
            description: self.description,
            page_count: self.page_count,
            categories: self.categories.unwrap_or_default(),
            thumbnail_url: self.image_links.and_then(|links| links.thumbnail),
            preview_url: self.preview_link,
        }
    }
}
