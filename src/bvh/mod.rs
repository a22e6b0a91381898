//! This module defines a [`BvhTree`].
//!
//! [`BvhTree`]: struct.BvhTree.html
//!

mod best_first;
mod bvh_impl;
mod bvh_node;
mod iter;

pub use self::best_first::*;
pub use self::bvh_impl::*;
pub use self::bvh_node::*;
pub use self::iter::*;
