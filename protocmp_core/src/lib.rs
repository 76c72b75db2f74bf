pub mod compare;
pub mod descriptor;
pub mod matching;
pub mod message;
pub mod scalar;

pub use compare::{comparable, compare, compare_with_options, MessageComparator};
pub use descriptor::{
    EnumDescriptor, FieldDescriptor, FieldKind, FieldType, MapKeyType, MessageDescriptor,
    ScalarType,
};
pub use matching::find_perfect_matching;
pub use message::{DynamicMessage, MapKey, Value};
pub use scalar::scalar_equal;
