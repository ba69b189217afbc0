//! Shared HTTP constants (problem URIs, search limits).

pub(crate) const PROBLEM_INTERNAL: &str = "https://rackmap.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://rackmap.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://rackmap.dev/problems/not-found";
pub(crate) const PROBLEM_CONFLICT: &str = "https://rackmap.dev/problems/conflict";
pub(crate) const PROBLEM_VALIDATION: &str = "https://rackmap.dev/problems/validation-failed";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://rackmap.dev/problems/service-unavailable";
