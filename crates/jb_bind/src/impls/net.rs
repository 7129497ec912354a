crate::impl_bind!(scalar url::Url);
