/// Status codes reported to the UI collaborator's error dialog (spec.md
/// §6). The source distinguished stopwords-missing with both `4` and `5`
/// at different call sites; both are treated as the same kind here and
/// aliased to `4` (spec.md §9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    ConnectFailed = 0,
    StoreError = 1,
    CollectionCreateFailed = 2,
    InvalidUri = 3,
    StopwordsMissing = 4,
}

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
}

/// Events the core publishes on a typed channel; the UI collaborator (or,
/// here, the binary) is the only subscriber. No lower crate references
/// any UI type (spec.md §9 REDESIGN FLAGS).
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// Raised `true` at crawl start, `false` once `CrawlFinished` fires.
    Waiting(bool),
    CrawlFinished { documents_indexed: usize },
    Error(ErrorReport),
}
