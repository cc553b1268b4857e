#![deny(missing_docs)]
#![doc = "Typed-array event store containers holding detector events under the `get`, `clouds` and `meta` namespaces."]

pub mod container;
pub mod dataset;
pub mod encode;
#[cfg(feature = "hdf5")]
pub mod h5;
pub mod namespace;
pub mod native;

pub use container::{AccessMode, Container};
pub use dataset::{ArrayData, Dataset, ElementType};
pub use encode::{encode, narrow_to_i16};
#[cfg(feature = "hdf5")]
pub use h5::Hdf5Container;
pub use namespace::Namespace;
pub use native::NativeContainer;
