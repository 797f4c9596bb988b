pub mod assembler;
pub mod capabilities;
pub mod envfile;
pub mod environment;
pub mod host;
pub mod idmap;
pub mod namespaces;
pub mod oci;
pub mod process;
pub mod subid;
pub mod types;

pub use assembler::{assemble, LaunchError, LaunchSpec};
