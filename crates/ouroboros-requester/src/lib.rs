//! ouroboros-requester: request option normalization for API clients
//!
//! Shapes per-call options (body, query, auth header, streaming flag,
//! cancellation) into transport-ready [`RequestOptions`], and binds that
//! shaping to any transport through a five-verb [`Requester`].
//!
//! # Architecture
//!
//! - `format_query`: snake_case, bracket-notation query strings
//! - `default_options_handler`: resource config + call options -> `RequestOptions`
//! - `RequesterFactory` / `create_requester_fn`: options handler + request handler -> `Requester`
//! - `preset_resource_arguments`: bind a base configuration under resource constructors
//! - `ReqwestTransport`: ready-made handlers over `reqwest`

pub mod case;
pub mod config;
pub mod defaults;
pub mod error;
pub mod method;
pub mod options;
pub mod preset;
pub mod query;
pub mod requester;
pub mod response;
pub mod transport;

pub use case::{decamelize, decamelize_keys};
pub use config::TransportConfig;
pub use defaults::default_options_handler;
pub use error::{ErrorCategory, RequesterError, RequesterResult};
pub use method::HttpMethod;
pub use options::{
    AuthHeader, AuthHeaderProvider, ConfigMap, DefaultRequestOptions, EncodedBody, FormPart,
    FormPayload, RateLimit, RequestBody, RequestOptions, ResourceOptions, Sudo,
};
pub use preset::{preset, preset_resource_arguments, Constructor, Resource};
pub use query::format_query;
pub use requester::{
    create_requester_fn, IdentityOptionsHandler, OptionsHandler, RequestHandler, Requester,
    RequesterFactory,
};
pub use response::{FormattedResponse, ResponseBody};
pub use transport::ReqwestTransport;

// Re-exported so callers can build cancellation signals without a direct dependency
pub use tokio_util::sync::CancellationToken;
