crate::impl_bind!(scalar num_bigint::BigInt, bigdecimal::BigDecimal);
