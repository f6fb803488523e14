//! Mapping from Rust types to the closed set of cell scalar kinds.

use std::any::{Any, TypeId};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::spec::EnumCellValue;

/// Types a primitive cell writer can emit.
///
/// Implemented only for the supported scalar kinds, so an unsupported value
/// type is rejected by the compiler instead of at write time.
pub trait CellScalar {
    fn to_cell_value(&self) -> EnumCellValue;
}

/// Implements [`CellScalar`] for every listed type and derives the runtime
/// lookups used by `try_cell` from the same list.
macro_rules! impl_cell_scalars {
    ($($ty:ty => |$val:ident| $convert:expr),+ $(,)?) => {
        $(
            impl CellScalar for $ty {
                fn to_cell_value(&self) -> EnumCellValue {
                    let $val: &$ty = self;
                    $convert
                }
            }
        )+

        /// Whether values of `T` can be converted by [`derive_cell_value_from_any`].
        pub fn is_supported_scalar_type<T: Any>() -> bool {
            let id_type = TypeId::of::<T>();
            [$(TypeId::of::<$ty>()),+].contains(&id_type)
        }

        /// Convert a dynamically typed value; `None` when its type is not a supported kind.
        pub fn derive_cell_value_from_any(value: &dyn Any) -> Option<EnumCellValue> {
            $(
                if let Some(val) = value.downcast_ref::<$ty>() {
                    return Some(val.to_cell_value());
                }
            )+
            None
        }
    };
}

impl_cell_scalars!(
    EnumCellValue => |val| val.clone(),
    String => |val| EnumCellValue::Text(val.clone()),
    &'static str => |val| EnumCellValue::Text((*val).to_string()),
    i8 => |val| EnumCellValue::Integer(i32::from(*val)),
    i16 => |val| EnumCellValue::Integer(i32::from(*val)),
    i32 => |val| EnumCellValue::Integer(*val),
    u8 => |val| EnumCellValue::Integer(i32::from(*val)),
    u16 => |val| EnumCellValue::Integer(i32::from(*val)),
    i64 => |val| EnumCellValue::LargeInteger(*val),
    u32 => |val| EnumCellValue::LargeInteger(i64::from(*val)),
    f32 => |val| EnumCellValue::Float(f64::from(*val)),
    f64 => |val| EnumCellValue::Float(*val),
    NaiveDateTime => |val| EnumCellValue::DateTime(*val),
    NaiveDate => |val| EnumCellValue::DateTime(val.and_time(NaiveTime::MIN)),
);
