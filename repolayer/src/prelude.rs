//! Convenient re-exports of commonly used types from repolayer.
//!
//! ```ignore
//! use repolayer::prelude::*;
//! ```

pub use repolayer_core::{
    client::StoreClient,
    document::{Document, DocumentExt},
    error::{RepositoryError, RepositoryResult, StoreError, StoreErrorKind, StoreResult},
    filter::{Expr, FieldOp, Filter, FilterVisitor},
    page::{Page, PageRequest},
    repository::Repository,
    update::UpdateSpec,
};

pub use repolayer_macros::Document;
