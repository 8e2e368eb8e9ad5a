//! Response middleware for the asset server.

pub(crate) mod headers;
