//! Function signatures, the builtin registry and overload resolution.
//!
//! # Example
//!
//! ```
//! use partiql_planner::binding::BindingName;
//! use partiql_planner::functions::{resolve, FnResolution, FunctionKind, FunctionRegistry};
//! use partiql_planner::types::StaticType;
//!
//! let registry = FunctionRegistry::builtins();
//! let plus = registry
//!     .lookup(None, FunctionKind::Operator, &BindingName::insensitive("plus"))
//!     .unwrap();
//!
//! match resolve(plus, &[StaticType::Int4, StaticType::Int8]) {
//!     FnResolution::Static(m) => assert_eq!(m.signature.specific(), "plus(INT8, INT8)"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

mod builtins;
pub mod registry;
pub mod resolver;
pub mod signature;

pub use registry::{FunctionRegistry, Namespace};
pub use resolver::{resolve, Coercion, FnMatch, FnResolution};
pub use signature::{FnParameter, FnSignature, FunctionKind};
