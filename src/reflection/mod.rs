// Mon Feb 02 2026 - Alex

pub mod accessor;
pub mod cache;
pub mod error;
pub mod key;
pub mod match_type;
pub mod member;
pub mod resolver;
pub mod types;
pub mod value;

pub use accessor::{Accessor, EventBinding};
pub use cache::{CacheStats, MemberCache};
pub use error::{AccessError, InvokeError, KeyError, ResolveError};
pub use key::{KeyShape, MemberKey, Signature};
pub use match_type::MatchType;
pub use member::{MemberDetail, MemberFlags, MemberHandle, MemberInfo, MemberKind};
pub use resolver::{resolve, Resolution};
pub use types::{builtin, BuiltinTypes, TypeBuilder, TypeHandle, TypeKind};
pub use value::{ObjectRef, Value};
