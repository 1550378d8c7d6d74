mod path_display_ext;
mod relative_path;
mod system_time_ext;

pub use path_display_ext::PathDisplayExt;
pub use relative_path::{components, join_relative, relative_depth};
pub use system_time_ext::SystemTimeExt;
