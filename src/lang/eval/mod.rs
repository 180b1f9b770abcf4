/// eval
///
/// Stack machine executing analyzed programs. The machine owns a single byte
/// stack: the program frame sits at the bottom, intermediate values are
/// pushed above it. All values are stored packed in native byte order.

mod executor;
pub(crate) mod store;
pub mod value;

pub(crate) use executor::Executor;
pub use value::Value;
