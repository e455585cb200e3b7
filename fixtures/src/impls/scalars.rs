use alloc::string::String;

crate::fixture! { scalar bool: Default }
crate::fixture! { scalar char: Default }
crate::fixture! { scalar u8: Default }
crate::fixture! { scalar u16: Default }
crate::fixture! { scalar u32: Default }
crate::fixture! { scalar u64: Default }
crate::fixture! { scalar u128: Default }
crate::fixture! { scalar usize: Default }
crate::fixture! { scalar i8: Default }
crate::fixture! { scalar i16: Default }
crate::fixture! { scalar i32: Default }
crate::fixture! { scalar i64: Default }
crate::fixture! { scalar i128: Default }
crate::fixture! { scalar isize: Default }
crate::fixture! { scalar f32: Default }
crate::fixture! { scalar f64: Default }
crate::fixture! { scalar (): Default }
crate::fixture! { scalar String: Default }
crate::fixture! { scalar &'static str: Default }
