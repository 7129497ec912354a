use core::any::Any;
use std::sync::Arc;

use jb_stream::{DEFAULT_BUFFER_LENGTH, GeneratorFactory, ParserFactory};
use log::debug;
use serde::Deserialize;

use crate::access::{AccessMode, AccessPolicy};
use crate::binder::Engine;
use crate::convert::{BinaryStrategy, ConvertContext, Converter, ConverterRegistry, TypedConverter};
use crate::info::{Bind, TypeInfo};
use crate::model::{ModelCache, ModelSettings};
use crate::naming::{AttributeOrder, NamingStrategy};
use crate::policy::{InclusionPolicy, UNVERSIONED, WriteFilter};
use crate::{BindError, Mapper};

// -----------------------------------------------------------------------------
// MapperConfig

/// Declarative mapper options, loadable from any `serde` format.
///
/// Keys are kebab-case; unknown keys are rejected.
///
/// # Examples
///
/// ```
/// use jb_bind::MapperConfig;
///
/// let config = MapperConfig::from_json(r#"{
///     "access-mode": "strict-method",
///     "naming-strategy": "lower-case-with-dashes",
///     "buffer-length": 4096
/// }"#).unwrap();
/// let mapper = jb_bind::MapperBuilder::from_config(&config).unwrap().build().unwrap();
/// # drop(mapper);
///
/// assert!(MapperConfig::from_json(r#"{"acess-mode": "field"}"#).is_err());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MapperConfig {
    pub access_mode: Option<String>,
    pub accept_protected: Option<bool>,
    pub field_fallback: Option<bool>,
    pub naming_strategy: Option<String>,
    pub attribute_order: Option<String>,
    pub version: Option<i32>,
    pub binary_data_strategy: Option<String>,
    pub bigint_as_string: Option<bool>,
    pub bigdecimal_as_string: Option<bool>,
    pub date_format: Option<String>,
    pub locale: Option<String>,
    pub pretty: Option<bool>,
    pub buffer_length: Option<i64>,
    pub skip_null: Option<bool>,
}

impl MapperConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, BindError> {
        serde_json::from_str(text).map_err(|e| BindError::configuration(e.to_string()))
    }
}

// -----------------------------------------------------------------------------
// MapperBuilder

/// Fluent construction of a [`Mapper`].
///
/// Option values are validated by [`build`](Self::build), so a mapper never
/// fails at call time for configuration reasons.
pub struct MapperBuilder {
    access: AccessPolicy,
    naming: NamingStrategy,
    order: Option<AttributeOrder>,
    version: i32,
    filter: Option<WriteFilter>,
    convert: ConvertContext,
    registry: ConverterRegistry,
    pretty: bool,
    buffer_length: i64,
    skip_null: bool,
    eager: Vec<fn() -> TypeInfo>,
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperBuilder {
    pub fn new() -> Self {
        Self {
            access: AccessPolicy::default(),
            naming: NamingStrategy::default(),
            order: None,
            version: UNVERSIONED,
            filter: None,
            convert: ConvertContext::default(),
            registry: ConverterRegistry::with_builtins(),
            pretty: false,
            buffer_length: DEFAULT_BUFFER_LENGTH as i64,
            skip_null: true,
            eager: Vec::new(),
        }
    }

    /// Applies every option present in `config`.
    pub fn from_config(config: &MapperConfig) -> Result<Self, BindError> {
        let mut builder = Self::new();
        if let Some(mode) = &config.access_mode {
            builder.access.mode = mode.parse()?;
        }
        if let Some(accept) = config.accept_protected {
            builder.access.accept_protected = accept;
        }
        if let Some(fallback) = config.field_fallback {
            builder.access.field_fallback = fallback;
        }
        if let Some(naming) = &config.naming_strategy {
            builder.naming = naming.parse()?;
        }
        if let Some(order) = &config.attribute_order {
            builder.order = Some(order.parse()?);
        }
        if let Some(version) = config.version {
            builder.version = version;
        }
        if let Some(strategy) = &config.binary_data_strategy {
            builder.convert.binary = strategy.parse()?;
        }
        if let Some(flag) = config.bigint_as_string {
            builder.convert.bigint_as_string = flag;
        }
        if let Some(flag) = config.bigdecimal_as_string {
            builder.convert.bigdecimal_as_string = flag;
        }
        builder.convert.date_format.clone_from(&config.date_format);
        builder.convert.locale.clone_from(&config.locale);
        if let Some(pretty) = config.pretty {
            builder.pretty = pretty;
        }
        if let Some(length) = config.buffer_length {
            builder.buffer_length = length;
        }
        if let Some(skip) = config.skip_null {
            builder.skip_null = skip;
        }
        Ok(builder)
    }

    // -------------------------------------------------------------------------
    // Access and naming

    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access.mode = mode;
        self
    }

    /// Makes protected accessors eligible.
    pub fn accept_protected(mut self, accept: bool) -> Self {
        self.access.accept_protected = accept;
        self
    }

    /// Under [`AccessMode::Both`], uses the field when a declared accessor is
    /// not eligible. Off by default.
    pub fn field_fallback(mut self, fallback: bool) -> Self {
        self.access.field_fallback = fallback;
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Sorts written properties by wire name.
    pub fn attribute_order(mut self, order: AttributeOrder) -> Self {
        self.order = Some(order);
        self
    }

    // -------------------------------------------------------------------------
    // Inclusion

    /// The mapper version; negative means unversioned.
    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Emits a property only when `filter(wire_name, value)` returns `true`.
    pub fn write_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &dyn Any) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(WriteFilter::new(filter));
        self
    }

    /// Writes empty optionals as `null` when `false`.
    pub fn skip_null(mut self, skip: bool) -> Self {
        self.skip_null = skip;
        self
    }

    // -------------------------------------------------------------------------
    // Conversion

    pub fn binary_strategy(mut self, strategy: BinaryStrategy) -> Self {
        self.convert.binary = strategy;
        self
    }

    pub fn bigint_as_string(mut self, flag: bool) -> Self {
        self.convert.bigint_as_string = flag;
        self
    }

    pub fn bigdecimal_as_string(mut self, flag: bool) -> Self {
        self.convert.bigdecimal_as_string = flag;
        self
    }

    /// A `chrono` strftime pattern for date/time values.
    pub fn date_format(mut self, pattern: impl Into<String>) -> Self {
        self.convert.date_format = Some(pattern.into());
        self
    }

    /// Locale for date names and number symbols, as `de_DE`, `fr-FR` or `de`.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.convert.locale = Some(locale.into());
        self
    }

    /// Registers `converter` for exactly `T`, replacing any built-in.
    pub fn converter<T: Any>(mut self, converter: Arc<dyn Converter>) -> Self {
        self.registry.insert::<T>(converter);
        self
    }

    pub fn typed_converter<T: Any, C: TypedConverter<T>>(mut self, converter: C) -> Self {
        self.registry.insert_typed::<T, C>(converter);
        self
    }

    /// Registers `converter` for every type accepted by `matches`.
    pub fn converter_matching<F>(mut self, matches: F, converter: Arc<dyn Converter>) -> Self
    where
        F: Fn(&TypeInfo) -> bool + Send + Sync + 'static,
    {
        self.registry.push_matcher(matches, converter);
        self
    }

    // -------------------------------------------------------------------------
    // Output

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Generator buffer length in bytes; must be positive.
    pub fn buffer_length(mut self, length: i64) -> Self {
        self.buffer_length = length;
        self
    }

    // -------------------------------------------------------------------------
    // Build

    /// Builds the model of class `T` during [`build`](Self::build).
    pub fn register<T: Bind>(mut self) -> Self {
        self.eager.push(T::type_info);
        self
    }

    /// Validates the configuration and creates the mapper.
    pub fn build(self) -> Result<Mapper, BindError> {
        let generator = GeneratorFactory::new(self.pretty, self.buffer_length)
            .map_err(|e| BindError::configuration(e.to_string()))?;

        if let Some(tag) = self.convert.locale() {
            crate::convert::parse_locale(tag)?;
        }

        #[cfg(feature = "chrono")]
        if let Some(pattern) = self.convert.date_format()
            && !crate::convert::is_valid_pattern(pattern)
        {
            return Err(BindError::configuration(format!(
                "invalid date format pattern `{pattern}`"
            )));
        }

        let engine = Engine {
            registry: self.registry,
            models: ModelCache::default(),
            settings: ModelSettings {
                access: self.access,
                naming: self.naming,
                order: self.order,
            },
            convert: self.convert,
            policy: InclusionPolicy::new(self.version, self.filter),
            skip_null: self.skip_null,
            generator,
            parser: ParserFactory::new(),
        };

        let submitted = crate::auto_register::submitted();
        for info in self.eager.iter().map(|f| f()).chain(submitted) {
            if let Some(class) = info.as_class() {
                engine.model(class)?;
            }
        }

        debug!(
            "mapper created: access {}, version {:?}, {} models built eagerly",
            engine.settings.access.mode,
            engine.policy.version(),
            engine.models.len(),
        );
        Ok(Mapper::from_engine(engine))
    }
}
