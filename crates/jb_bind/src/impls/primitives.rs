crate::impl_bind!(scalar bool, char, String, f32, f64);

crate::impl_bind!(scalar i8, i16, i32, i64, i128, isize);

crate::impl_bind!(scalar u8, u16, u32, u64, u128, usize);
