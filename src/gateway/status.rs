pub const ETALON_STATUS_HEADER: &str = "x-etalon-status";
pub const ETALON_STATUS_HEALTHY: &str = "healthy";
pub const ETALON_STATUS_READY: &str = "ready";
pub const ETALON_STATUS_NOT_READY: &str = "not_ready";
pub const ETALON_STATUS_ERROR: &str = "error";

/// Outcome of a search, reported in [`ETALON_STATUS_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    Matched,
    NotFound,
}

impl SearchStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            SearchStatus::Matched => "MATCHED",
            SearchStatus::NotFound => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}
