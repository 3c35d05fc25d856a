mod admin_helpers;
mod category_helpers;
mod comment_helpers;
mod link_helpers;
mod post_helpers;

pub use admin_helpers::*;
pub use category_helpers::*;
pub use comment_helpers::*;
pub use link_helpers::*;
pub use post_helpers::*;
