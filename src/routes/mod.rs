/// Router Module Index
///
/// Groups routes by what they need from the session. Every group sits behind the session
/// middleware applied in `create_router`; none of them rejects anonymous visitors itself.

/// Routes with no page data: health and the current session.
pub mod public;

/// Entry pages (login, registration, account linking) that branch on the auth gate.
pub mod entry;

/// Data pages backed by the upstream API.
pub mod pages;
