use serde::{Deserialize, Serialize};
use sleuth_core::FetchedPage;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest<'a> {
    pub url: &'a str,
    pub formats: [&'static str; 1],
    pub only_main_content: bool,
}

impl<'a> ScrapeRequest<'a> {
    #[inline]
    pub fn new(url: &'a str, only_main_content: bool) -> Self {
        Self {
            url,
            formats: ["markdown"],
            only_main_content,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<ScrapeData>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ScrapeData {
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub metadata: Metadata,
}

// Metadata is scraped from `<meta>` tags, so repeated tags show up as
// arrays.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    One(String),
    Many(Vec<String>),
}

impl MetaValue {
    fn into_first(self) -> Option<String> {
        match self {
            MetaValue::One(value) => Some(value),
            MetaValue::Many(values) => values.into_iter().next(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: Option<MetaValue>,
    pub author: Option<MetaValue>,
    pub published_date: Option<MetaValue>,
    pub published_time: Option<MetaValue>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl From<ScrapeData> for FetchedPage {
    fn from(data: ScrapeData) -> Self {
        let Metadata {
            title,
            author,
            published_date,
            published_time,
            ..
        } = data.metadata;
        FetchedPage {
            content: data.markdown,
            title: title.and_then(MetaValue::into_first),
            author: author.and_then(MetaValue::into_first),
            published: published_date
                .or(published_time)
                .and_then(MetaValue::into_first),
        }
    }
}
