//! Ready-made recipes built on the visitor, matcher and scheduler APIs.

pub mod change_field_visibility;
pub mod change_method_name;
pub mod change_package;
pub mod find_methods;
pub mod rename_variable;
pub mod unwrap_parentheses;

pub use change_field_visibility::{ChangeFieldVisibility, Visibility};
pub use change_method_name::ChangeMethodName;
pub use change_package::ChangePackage;
pub use find_methods::FindMethods;
pub use rename_variable::RenameVariable;
pub use unwrap_parentheses::UnwrapParentheses;
