//! Re-export so callers of the service layer need not depend on `common`.
pub use common::pagination::Pagination;
pub use common::types::Page;
