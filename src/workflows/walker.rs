use anyhow::Result;
use std::collections::HashSet;
use url::Url;

use crate::domain::models::Series;
use crate::infra::catalog::Catalog;
use crate::infra::http::{FetchError, Page, PageSource};

/// Walks the series index and each series' season pages, one request at a time.
pub struct CatalogWalker<'a, S> {
    source: S,
    catalog: &'a Catalog,
}

impl<'a, S: PageSource> CatalogWalker<'a, S> {
    pub fn new(source: S, catalog: &'a Catalog) -> Self {
        Self { source, catalog }
    }

    /// `None` once the index runs past its last page.
    pub fn series_page(&mut self, page: u32) -> Result<Option<Vec<Series>>, FetchError> {
        let url = self.catalog.series_index_url(page);
        match self.source.fetch(&url, true)? {
            Page::Boundary => Ok(None),
            Page::Html(html) => Ok(Some(self.catalog.parse_series_page(&url, &html))),
        }
    }

    /// Every series in the index, de-duplicated by URL, in discovery order.
    pub fn all_series(&mut self) -> Result<Vec<Series>, FetchError> {
        let mut all_series = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1;

        while let Some(batch) = self.series_page(page)? {
            if batch.is_empty() {
                tracing::debug!("series index page {page} is empty, stopping");
                break;
            }
            for series in batch {
                if seen.insert(series.url.clone()) {
                    all_series.push(series);
                }
            }
            page += 1;
        }

        tracing::info!("found {} series over {} page(s)", all_series.len(), page);
        Ok(all_series)
    }

    pub fn season_episodes(
        &mut self,
        series: &Series,
        season: u32,
    ) -> Result<Vec<Url>, FetchError> {
        let url = self.catalog.season_url(series, season);
        match self.source.fetch(&url, false)? {
            Page::Html(html) => Ok(self.catalog.parse_episode_links(series, &html)),
            Page::Boundary => Ok(Vec::new()),
        }
    }

    /// Feeds each season's episode links to `sink`, starting at season 1 and
    /// stopping at the first season without any. Returns the number of links.
    pub fn walk_show<F>(&mut self, series: &Series, mut sink: F) -> Result<usize>
    where
        F: FnMut(u32, &[Url]) -> Result<()>,
    {
        let mut season = 1;
        let mut total = 0;

        loop {
            let episodes = self.season_episodes(series, season)?;
            if episodes.is_empty() {
                break;
            }
            tracing::debug!(
                "{}: season {season} has {} episode(s)",
                series.title,
                episodes.len()
            );
            sink(season, &episodes)?;
            total += episodes.len();
            season += 1;
        }

        Ok(total)
    }
}
