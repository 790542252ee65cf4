//! Byte-order aware readers and writers used by the tile payload codec.

mod value_reader;
pub use value_reader::*;

mod value_reader_slice;
pub use value_reader_slice::*;

mod value_writer;
pub use value_writer::*;

mod value_writer_blob;
pub use value_writer_blob::*;
