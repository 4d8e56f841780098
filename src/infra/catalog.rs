//! URL layout and HTML extraction for the catalog site.

use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::models::Series;

const SERIES_ITEM: &str = "li.js-collection-item.item-type-series";
const ITEM_LINK: &str = "a.browse-item-link[href]";
const ITEM_TITLE: &str = ".browse-item-title strong";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e:?}"))
}

/// Selectors and URL scheme of the catalog.
#[derive(Debug)]
pub struct Catalog {
    base_url: Url,
    series_item: Selector,
    item_link: Selector,
    item_title: Selector,
}

impl Catalog {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base_url {base_url:?}"))?;
        Ok(Self {
            base_url,
            series_item: selector(SERIES_ITEM)?,
            item_link: selector(ITEM_LINK)?,
            item_title: selector(ITEM_TITLE)?,
        })
    }

    /// `{base}/series` for page 1, `{base}/series?page=N` after that.
    pub fn series_index_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("series");
        }
        if page > 1 {
            url.query_pairs_mut()
                .clear()
                .append_pair("page", &page.to_string());
        }
        url
    }

    /// `{series}/season:N`.
    pub fn season_url(&self, series: &Series, season: u32) -> Url {
        let mut url = series.url.clone();
        let path = format!("{}/season:{season}", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    pub fn parse_series_page(&self, page_url: &Url, html: &str) -> Vec<Series> {
        let document = Html::parse_document(html);
        document
            .select(&self.series_item)
            .filter_map(|item| {
                let link = item.select(&self.item_link).next()?;
                let url = resolve_href(page_url, link)?;
                let title = item
                    .select(&self.item_title)
                    .next()
                    .map(|title| title.text().collect::<String>().trim().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                Some(Series { title, url })
            })
            .collect()
    }

    pub fn parse_episode_links(&self, series: &Series, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        document
            .select(&self.item_link)
            .filter_map(|link| resolve_href(&series.url, link))
            .collect()
    }
}

fn resolve_href(base: &Url, link: ElementRef<'_>) -> Option<Url> {
    let href = link.value().attr("href")?;
    match base.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("skipping unparseable href {href:?}: {e}");
            None
        }
    }
}
