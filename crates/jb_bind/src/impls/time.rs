use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

crate::impl_bind!(scalar DateTime<Utc>, DateTime<FixedOffset>, DateTime<chrono_tz::Tz>);

crate::impl_bind!(scalar NaiveDateTime, NaiveDate, NaiveTime);

crate::impl_bind!(scalar FixedOffset, chrono_tz::Tz);

crate::impl_bind!(scalar std::time::SystemTime, std::time::Duration);

crate::impl_bind!(scalar crate::time::Period, crate::time::OffsetTime);
