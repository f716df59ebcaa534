//! Boolean query construction.
//!
//! A query is plain text: terms, the operators `AND` / `OR` / `NOT`, and
//! parentheses, joined by single spaces when built through
//! [`QueryBuilder::append`]. Users may also type the whole expression, in which
//! case the text is taken verbatim.
//!
//! ```rust
//! use study_search::query::{Operator, QueryBuilder};
//!
//! let mut query = QueryBuilder::new();
//! query.append_term("memory");
//! query.append(Operator::And);
//! query.append_term("recall");
//! assert_eq!(query.value(), "memory AND recall");
//! ```

mod builder;
mod operator;

pub use builder::{QueryBuilder, TermSink};
pub use operator::{Operator, UnknownOperator};
