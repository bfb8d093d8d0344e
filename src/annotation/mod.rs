pub mod attributes;
pub mod builder;
pub mod io;

pub use attributes::{parse_attributes, Attributes};
pub use builder::{AnnotationLoader, LinePolicy, LoadedAnnotation};
pub use io::{parse_record_line, AnnotationReader, AnnotationRecord, ParseError};
