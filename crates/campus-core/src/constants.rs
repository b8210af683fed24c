/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

/// Path the UI serves its account activation form on.
pub const ACTIVATION_UI_PATH: &str = "/activate";

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Number of random bytes behind session and activation tokens.
pub const TOKEN_BYTES: usize = 32;

/// Message template for slots that could not be persisted in a batch.
pub const BATCH_FAILURE_SUFFIX: &str = "créneaux n'ont pas pu être créés";
