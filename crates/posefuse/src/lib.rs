#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use posefuse_3d as k3d;

#[doc(inline)]
pub use posefuse_fusion as fusion;

#[doc(inline)]
pub use posefuse_io as io;

#[doc(inline)]
pub use posefuse_sync as sync;
