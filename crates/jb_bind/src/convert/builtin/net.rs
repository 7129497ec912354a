use serde_json::Value;
use url::Url;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter};

struct UrlConverter;

impl TypedConverter<Url> for UrlConverter {
    #[inline]
    fn to_json(&self, value: &Url, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(value.as_str().to_owned()))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<Url, BindError> {
        let text = json
            .as_str()
            .ok_or_else(|| invalid::<Url>(json, "expected a URL string"))?;
        Url::parse(text).map_err(|e| invalid::<Url>(json, e.to_string()))
    }
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<Url, _>(UrlConverter);
}
