//! Stored media references and their resolution to fetchable URLs.
//!
//! - **Reference**: [`MediaReference`], the classified shape of a stored string
//! - **Resolver**: [`MediaResolver`] (configured) and [`resolve`] (stock rules)

mod reference;
mod resolver;

pub use reference::MediaReference;
pub(crate) use resolver::is_absolute_origin;
pub use resolver::{DEFAULT_API_BASE_URL, MediaResolver, resolve};
