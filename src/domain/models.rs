use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub title: String,
    pub url: Url,
}

/// Why the scrape phase ended before walking every series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    RetriesExhausted(String),
}

#[derive(Debug, Default)]
pub struct ScrapeSummary {
    pub series: usize,
    pub urls_written: usize,
    pub stopped: Option<StopReason>,
}
