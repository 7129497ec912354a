use core::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::thread;

use serde_json::{Value, json};

use crate::access::AccessMode;
use crate::convert::{BinaryStrategy, ConvertContext, from_fns};
use crate::info::{BindClass, BindEnum, ClassBuilder, EnumConstant, TypeRef};
use crate::naming::{AttributeOrder, NamingStrategy};
use crate::{Bind, BindError, ErrorKind, Mapper, MapperBuilder, MapperConfig, impl_bind};

fn mapper() -> Mapper {
    Mapper::new().unwrap()
}

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Clone, Copy, PartialEq, Debug)]
enum MyEnum {
    One,
    Two,
    Three,
}

impl BindEnum for MyEnum {
    const CONSTANTS: &'static [EnumConstant<Self>] = &[
        EnumConstant::new("ONE", MyEnum::One),
        EnumConstant::new("TWO", MyEnum::Two),
        EnumConstant::new("THREE", MyEnum::Three).alias("three"),
    ];
}

impl_bind!(enum MyEnum);

#[derive(Default, Debug, PartialEq)]
struct EnumHolder {
    my_enum: Option<MyEnum>,
}

impl BindClass for EnumHolder {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("myEnum", |h| &h.my_enum, |h| &mut h.my_enum);
    }
}

/// A generic base: the identifier type is fixed by subclasses.
#[derive(Default, Debug, PartialEq)]
struct Customer<ID> {
    id: ID,
    name: String,
}

impl<ID: Bind + Default> BindClass for Customer<ID> {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.type_param::<ID>("ID");
        class.default_constructor();
        class.field("id", |c| &c.id, |c| &mut c.id).declared(TypeRef::var("ID"));
        class.getter("id", |c| &c.id).declared(TypeRef::var("ID"));
        class.setter("id", |c, id: ID| c.id = id).declared(TypeRef::var("ID"));
        class.field("name", |c| &c.name, |c| &mut c.name);
        class.getter("name", |c| &c.name);
        class.setter("name", |c, name: String| c.name = name);
    }
}

#[derive(Default, Debug, PartialEq)]
struct VipCustomer<ID> {
    base: Customer<ID>,
    level: i32,
}

impl<ID: Bind + Default> BindClass for VipCustomer<ID> {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.type_param::<ID>("ID");
        class.default_constructor();
        class
            .extends::<Customer<ID>>(|v| &v.base, |v| &mut v.base)
            .args([TypeRef::var("ID")]);
        class.field("level", |v| &v.level, |v| &mut v.level);
        class.getter("level", |v| &v.level);
        class.setter("level", |v, level: i32| v.level = level);
    }
}

#[derive(Default, Debug, PartialEq)]
struct GoldCustomer {
    base: VipCustomer<i64>,
    gold: bool,
}

impl BindClass for GoldCustomer {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class
            .extends::<VipCustomer<i64>>(|g| &g.base, |g| &mut g.base)
            .args([TypeRef::of::<i64>()]);
        class.field("gold", |g| &g.gold, |g| &mut g.gold);
        class.getter("gold", |g| &g.gold);
        class.setter("gold", |g, gold: bool| g.gold = gold);
    }
}

impl_bind!(class [ID: Bind + Default] Customer<ID>);
impl_bind!(class [ID: Bind + Default] VipCustomer<ID>);
impl_bind!(class EnumHolder, GoldCustomer);

fn gold(id: i64) -> GoldCustomer {
    GoldCustomer {
        base: VipCustomer {
            base: Customer {
                id,
                name: "Ada".into(),
            },
            level: 2,
        },
        gold: true,
    }
}

// -----------------------------------------------------------------------------
// Enums, transient and versioned properties

#[test]
fn unknown_enum_text_fails() {
    let mapper = mapper();
    let err = mapper
        .read_str::<EnumHolder>(r#"{"myEnum":"UNKNOWN"}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/myEnum"));
    assert!(err.to_string().contains("UNKNOWN"));

    let holder: EnumHolder = mapper.read_str(r#"{"myEnum":"TWO"}"#).unwrap();
    assert_eq!(holder.my_enum, Some(MyEnum::Two));
    assert!(mapper.read_str::<EnumHolder>(r#"{"myEnum":"two"}"#).is_err());
}

#[test]
fn enum_alias_takes_precedence() {
    let mapper = mapper();
    let three = EnumHolder {
        my_enum: Some(MyEnum::Three),
    };
    assert_eq!(mapper.write_string(&three).unwrap(), r#"{"myEnum":"three"}"#);
    let back: EnumHolder = mapper.read_str(r#"{"myEnum":"three"}"#).unwrap();
    assert_eq!(back, three);
    let one = EnumHolder {
        my_enum: Some(MyEnum::One),
    };
    assert_eq!(mapper.write_string(&one).unwrap(), r#"{"myEnum":"ONE"}"#);
}

#[derive(Default)]
struct Transient {
    instance: Option<String>,
}

impl BindClass for Transient {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("instance", |t| &t.instance, |t| &mut t.instance).ignore();
    }
}

impl_bind!(class Transient);

#[test]
fn transient_is_never_bound() {
    let mapper = mapper();
    let value = Transient {
        instance: Some("set".into()),
    };
    assert_eq!(mapper.write_string(&value).unwrap(), "{}");
    let read: Transient = mapper.read_str(r#"{"instance":"whatever"}"#).unwrap();
    assert_eq!(read.instance, None);
}

#[derive(Default)]
struct Versioned {
    name: String,
}

impl BindClass for Versioned {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("name", |v| &v.name, |v| &mut v.name).since(2);
    }
}

impl_bind!(class Versioned);

#[test]
fn version_gate_applies_both_ways() {
    let value = Versioned { name: "foo".into() };
    let cases = [
        (-1, r#"{"name":"foo"}"#),
        (0, "{}"),
        (1, "{}"),
        (2, r#"{"name":"foo"}"#),
        (3, r#"{"name":"foo"}"#),
    ];
    for (version, expected) in cases {
        let mapper = Mapper::builder().version(version).build().unwrap();
        assert_eq!(mapper.write_string(&value).unwrap(), expected, "version {version}");
    }

    let old = Mapper::builder().version(1).build().unwrap();
    let read: Versioned = old.read_str(r#"{"name":"foo"}"#).unwrap();
    assert_eq!(read.name, "");
    let new = Mapper::builder().version(2).build().unwrap();
    let read: Versioned = new.read_str(r#"{"name":"foo"}"#).unwrap();
    assert_eq!(read.name, "foo");
}

// -----------------------------------------------------------------------------
// Write filter and naming

#[derive(Default)]
struct ListHolder {
    list: Vec<String>,
}

impl BindClass for ListHolder {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("list", |h| &h.list, |h| &mut h.list);
    }
}

#[derive(Default)]
struct SetHolder {
    list: BTreeSet<String>,
}

impl BindClass for SetHolder {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("list", |h| &h.list, |h| &mut h.list);
    }
}

impl_bind!(class ListHolder, SetHolder);

#[test]
fn write_filter_sees_values() {
    let mapper = Mapper::builder()
        .write_filter(|_, value: &dyn Any| !value.is::<BTreeSet<String>>())
        .build()
        .unwrap();
    let list = ListHolder {
        list: vec!["test".into()],
    };
    assert_eq!(mapper.write_string(&list).unwrap(), r#"{"list":["test"]}"#);
    let set = SetHolder {
        list: BTreeSet::from(["test".to_owned()]),
    };
    assert_eq!(mapper.write_string(&set).unwrap(), "{}");

    // The filter is write-only.
    let read: SetHolder = mapper.read_str(r#"{"list":["a","a","b"]}"#).unwrap();
    assert_eq!(read.list.len(), 2);
}

#[derive(Default, Debug, PartialEq)]
struct Named {
    lower_dash: String,
    foo_bar: i32,
}

impl BindClass for Named {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("lowerDash", |n| &n.lower_dash, |n| &mut n.lower_dash);
        class.field("fooBar", |n| &n.foo_bar, |n| &mut n.foo_bar);
    }
}

impl_bind!(class Named);

#[test]
fn naming_strategies_translate_both_ways() {
    let value = Named {
        lower_dash: "a".into(),
        foo_bar: 1,
    };
    let cases = [
        (NamingStrategy::LowerCaseWithDashes, r#"{"lower-dash":"a","foo-bar":1}"#),
        (NamingStrategy::LowerCaseWithUnderscores, r#"{"lower_dash":"a","foo_bar":1}"#),
        (NamingStrategy::UpperCamelCase, r#"{"LowerDash":"a","FooBar":1}"#),
        (NamingStrategy::UpperCamelCaseWithSpaces, r#"{"Lower Dash":"a","Foo Bar":1}"#),
    ];
    for (naming, expected) in cases {
        let mapper = Mapper::builder().naming(naming).build().unwrap();
        let text = mapper.write_string(&value).unwrap();
        assert_eq!(text, expected);
        assert_eq!(mapper.read_str::<Named>(&text).unwrap(), value);
    }
}

#[test]
fn case_insensitive_matching_on_read() {
    let lenient = Mapper::builder()
        .naming(NamingStrategy::CaseInsensitive)
        .build()
        .unwrap();
    let read: Customer<i64> = lenient.read_str(r#"{"ID":"5","NAME":"x"}"#).unwrap();
    assert_eq!((read.id, read.name.as_str()), (5, "x"));
    assert_eq!(
        lenient.write_string(&read).unwrap(),
        r#"{"id":5,"name":"x"}"#
    );

    let strict: Customer<i64> = mapper().read_str(r#"{"ID":"5","NAME":"x"}"#).unwrap();
    assert_eq!(strict, Customer::default());
}

#[test]
fn attribute_order_only_affects_writing() {
    let mapper = Mapper::builder()
        .attribute_order(AttributeOrder::lexicographic())
        .build()
        .unwrap();
    let text = mapper.write_string(&gold(1)).unwrap();
    assert_eq!(text, r#"{"gold":true,"id":1,"level":2,"name":"Ada"}"#);
    let back: GoldCustomer = mapper
        .read_str(r#"{"name":"Ada","level":2,"id":1,"gold":true}"#)
        .unwrap();
    assert_eq!(back, gold(1));
}

// -----------------------------------------------------------------------------
// Creators

#[derive(Debug, PartialEq)]
struct Factory {
    string_optional: String,
    int_optional: i32,
    note: String,
}

impl BindClass for Factory {
    fn describe(class: &mut ClassBuilder<Self>) {
        class
            .creator(|args| {
                Ok(Factory {
                    string_optional: args.take("stringOptional")?,
                    int_optional: args.take("intOptional")?,
                    note: String::new(),
                })
            })
            .param_or::<String>("stringOptional", || "default".to_owned())
            .param::<i32>("intOptional");
        class.field("stringOptional", |f| &f.string_optional, |f| &mut f.string_optional);
        class.field("intOptional", |f| &f.int_optional, |f| &mut f.int_optional);
        class.field("note", |f| &f.note, |f| &mut f.note);
    }
}

impl_bind!(class Factory);

#[test]
fn creator_defaults_fill_missing_parameters() {
    let mapper = mapper();
    let empty: Factory = mapper.read_str("{}").unwrap();
    assert_eq!(empty.string_optional, "default");
    assert_eq!(empty.int_optional, 0);

    let partial: Factory = mapper.read_str(r#"{"intOptional":4711}"#).unwrap();
    assert_eq!(partial.string_optional, "default");
    assert_eq!(partial.int_optional, 4711);
}

#[test]
fn creator_defers_other_properties() {
    let mapper = mapper();
    let read: Factory = mapper
        .read_str(r#"{"note":"later","stringOptional":"s","unknown":[1,{"a":2}]}"#)
        .unwrap();
    assert_eq!(
        read,
        Factory {
            string_optional: "s".into(),
            int_optional: 0,
            note: "later".into(),
        }
    );
    assert_eq!(
        mapper.write_string(&read).unwrap(),
        r#"{"stringOptional":"s","intOptional":0,"note":"later"}"#
    );
}

#[derive(Debug)]
struct NoConstructor {
    value: i32,
}

impl BindClass for NoConstructor {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.field("value", |n| &n.value, |n| &mut n.value);
    }
}

impl_bind!(class NoConstructor);

#[test]
fn missing_constructor_is_instantiation_error() {
    let mapper = mapper();
    assert_eq!(mapper.write_string(&NoConstructor { value: 1 }).unwrap(), r#"{"value":1}"#);
    let err = mapper.read_str::<NoConstructor>(r#"{"value":1}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Instantiation);
    assert_eq!(err.path(), Some(""));
}

// -----------------------------------------------------------------------------
// Generic hierarchy and access modes

#[test]
fn generic_hierarchy_under_every_access_mode() {
    let expected = r#"{"id":160883,"name":"Ada","level":2,"gold":true}"#;
    for mode in [
        AccessMode::Field,
        AccessMode::Method,
        AccessMode::StrictMethod,
        AccessMode::Both,
    ] {
        let mapper = Mapper::builder().access_mode(mode).build().unwrap();
        let value = gold(160883);
        assert_eq!(mapper.write_string(&value).unwrap(), expected, "{mode}");

        let from_number: GoldCustomer = mapper.read_str(expected).unwrap();
        assert_eq!(from_number, value, "{mode}");
        let from_string: GoldCustomer = mapper
            .read_str(r#"{"id":"160883","name":"Ada","level":2,"gold":true}"#)
            .unwrap();
        assert_eq!(from_string, value, "{mode}");

        let vip: VipCustomer<i64> = mapper.read_str(r#"{"id":"7","level":1}"#).unwrap();
        assert_eq!((vip.base.id, vip.level), (7, 1), "{mode}");
        let plain: Customer<String> = mapper.read_str(r#"{"id":160883}"#).unwrap();
        assert_eq!(plain.id, "160883", "{mode}");
    }
}

#[test]
fn class_model_exposes_resolved_types() {
    let mapper = mapper();
    let model = mapper.class_model::<GoldCustomer>().unwrap();
    assert_eq!(model.reader_names(), vec!["id", "name", "level", "gold"]);
    let id = model.writer("id").unwrap();
    assert!(id.ty().ty().is::<i64>());
    assert!(mapper.class_model::<i32>().is_err());
}

#[derive(Default)]
struct Tagged {
    tags: Vec<String>,
}

impl BindClass for Tagged {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.collection_getter("tags", |t| &t.tags, |t| &mut t.tags);
    }
}

impl_bind!(class Tagged);

#[test]
fn lenient_method_mode_writes_through_collection_getter() {
    let input = r#"{"tags":["a","b"]}"#;
    let lenient = Mapper::builder().access_mode(AccessMode::Method).build().unwrap();
    let read: Tagged = lenient.read_str(input).unwrap();
    assert_eq!(read.tags, vec!["a", "b"]);

    let strict = Mapper::builder()
        .access_mode(AccessMode::StrictMethod)
        .build()
        .unwrap();
    let read: Tagged = strict.read_str(input).unwrap();
    assert!(read.tags.is_empty());
    let tagged = Tagged {
        tags: vec!["x".into()],
    };
    assert_eq!(strict.write_string(&tagged).unwrap(), r#"{"tags":["x"]}"#);
}

#[derive(Default)]
struct Guarded {
    secret: String,
}

impl BindClass for Guarded {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("secret", |g| &g.secret, |g| &mut g.secret);
        class.getter("secret", |g| &g.secret).protected();
        class.setter("secret", |g, s: String| g.secret = s).protected();
    }
}

impl_bind!(class Guarded);

#[test]
fn protected_accessors_follow_policy() {
    let value = Guarded {
        secret: "s".into(),
    };
    let write = |builder: MapperBuilder| builder.build().unwrap().write_string(&value).unwrap();

    assert_eq!(write(Mapper::builder().access_mode(AccessMode::Method)), "{}");
    assert_eq!(
        write(Mapper::builder().access_mode(AccessMode::Method).accept_protected(true)),
        r#"{"secret":"s"}"#
    );
    assert_eq!(write(Mapper::builder().access_mode(AccessMode::Both)), "{}");
    assert_eq!(
        write(Mapper::builder().access_mode(AccessMode::Both).field_fallback(true)),
        r#"{"secret":"s"}"#
    );
    assert_eq!(
        write(Mapper::builder().access_mode(AccessMode::Both).accept_protected(true)),
        r#"{"secret":"s"}"#
    );

    let read = |builder: MapperBuilder| {
        builder
            .build()
            .unwrap()
            .read_str::<Guarded>(r#"{"secret":"in"}"#)
            .unwrap()
            .secret
    };
    assert_eq!(read(Mapper::builder().access_mode(AccessMode::Both)), "");
    assert_eq!(
        read(Mapper::builder().access_mode(AccessMode::Both).field_fallback(true)),
        "in"
    );
}

// -----------------------------------------------------------------------------
// Containers, nulls and determinism

#[derive(Default, Debug, PartialEq)]
struct Everything {
    text: String,
    number: i64,
    flag: bool,
    ratio: f64,
    tags: BTreeSet<String>,
    matrix: Vec<Vec<i32>>,
    pair: [u8; 2],
    scores: BTreeMap<String, i32>,
    nested: Option<Customer<String>>,
    missing: Option<String>,
}

impl BindClass for Everything {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("text", |e| &e.text, |e| &mut e.text);
        class.field("number", |e| &e.number, |e| &mut e.number);
        class.field("flag", |e| &e.flag, |e| &mut e.flag);
        class.field("ratio", |e| &e.ratio, |e| &mut e.ratio);
        class.field("tags", |e| &e.tags, |e| &mut e.tags);
        class.field("matrix", |e| &e.matrix, |e| &mut e.matrix);
        class.field("pair", |e| &e.pair, |e| &mut e.pair);
        class.field("scores", |e| &e.scores, |e| &mut e.scores);
        class.field("nested", |e| &e.nested, |e| &mut e.nested);
        class.field("missing", |e| &e.missing, |e| &mut e.missing);
    }
}

impl_bind!(class Everything);

fn everything() -> Everything {
    Everything {
        text: "hello".into(),
        number: -42,
        flag: true,
        ratio: 0.5,
        tags: BTreeSet::from(["b".to_owned(), "a".to_owned()]),
        matrix: vec![vec![1, 2], vec![]],
        pair: [7, 9],
        scores: BTreeMap::from([("z".to_owned(), 26), ("a".to_owned(), 1)]),
        nested: Some(Customer {
            id: "c-1".into(),
            name: "Bob".into(),
        }),
        missing: None,
    }
}

#[test]
fn structural_round_trip() {
    let mapper = mapper();
    let value = everything();
    let text = mapper.write_string(&value).unwrap();
    assert_eq!(
        text,
        concat!(
            r#"{"text":"hello","number":-42,"flag":true,"ratio":0.5,"tags":["a","b"],"#,
            r#""matrix":[[1,2],[]],"pair":[7,9],"scores":{"a":1,"z":26},"#,
            r#""nested":{"id":"c-1","name":"Bob"}}"#
        )
    );
    assert_eq!(mapper.read_str::<Everything>(&text).unwrap(), value);
}

#[test]
fn document_values_round_trip() {
    let mapper = mapper();
    let value = mapper.to_value(&gold(3)).unwrap();
    assert_eq!(value, json!({"id": 3, "name": "Ada", "level": 2, "gold": true}));
    assert_eq!(mapper.from_value::<GoldCustomer>(value).unwrap(), gold(3));
}

#[derive(Default)]
struct Bag {
    counts: HashMap<String, i32>,
    maybe: Option<String>,
}

impl BindClass for Bag {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("counts", |b| &b.counts, |b| &mut b.counts);
        class.field("maybe", |b| &b.maybe, |b| &mut b.maybe);
    }
}

impl_bind!(class Bag);

#[test]
fn writing_is_deterministic() {
    let mapper = mapper();
    let bag = Bag {
        counts: HashMap::from([
            ("delta".to_owned(), 4),
            ("alpha".to_owned(), 1),
            ("charlie".to_owned(), 3),
            ("bravo".to_owned(), 2),
        ]),
        maybe: None,
    };
    let first = mapper.write_string(&bag).unwrap();
    assert_eq!(first, r#"{"counts":{"alpha":1,"bravo":2,"charlie":3,"delta":4}}"#);
    for _ in 0..10 {
        assert_eq!(mapper.write_string(&bag).unwrap(), first);
    }
}

#[test]
fn nulls_written_when_not_skipped() {
    let mapper = Mapper::builder().skip_null(false).build().unwrap();
    assert_eq!(
        mapper.write_string(&Bag::default()).unwrap(),
        r#"{"counts":{},"maybe":null}"#
    );
    let items = vec![Some(1), None];
    assert_eq!(self::mapper().write_string(&items).unwrap(), "[1,null]");
}

#[derive(Debug)]
struct Preset {
    name: String,
    alias: Option<String>,
}

impl BindClass for Preset {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.constructor(|| Preset {
            name: "preset".into(),
            alias: Some("a".into()),
        });
        class.field("name", |p| &p.name, |p| &mut p.name);
        class.field("alias", |p| &p.alias, |p| &mut p.alias);
    }
}

impl_bind!(class Preset);

#[test]
fn null_handling_on_read() {
    let mapper = mapper();
    let read: Preset = mapper.read_str(r#"{"name":null,"alias":null}"#).unwrap();
    assert_eq!(read.name, "preset");
    assert_eq!(read.alias, None);

    let err = mapper.read_str::<Vec<String>>(r#"["a",null]"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/1"));

    let optional: Vec<Option<String>> = mapper.read_str(r#"["a",null]"#).unwrap();
    assert_eq!(optional, vec![Some("a".to_owned()), None]);

    let map: BTreeMap<String, i32> = mapper.read_str(r#"{"a":1,"b":null}"#).unwrap();
    assert_eq!(map, BTreeMap::from([("a".to_owned(), 1)]));

    assert!(mapper.read_str::<String>("null").is_err());
    assert_eq!(mapper.read_str::<Option<String>>("null").unwrap(), None);
}

#[test]
fn top_level_values_of_any_kind() {
    let mapper = mapper();
    assert_eq!(mapper.read_str::<Vec<String>>(r#"["a"]"#).unwrap(), vec!["a"]);
    assert!(mapper.read_str::<bool>("true").unwrap());
    assert_eq!(mapper.read_str::<i64>("\"74\"").unwrap(), 74);
    assert_eq!(mapper.write_string(&"x".to_owned()).unwrap(), r#""x""#);
    assert_eq!(mapper.write_string(&MyEnum::Two).unwrap(), r#""TWO""#);
}

#[derive(Default, Debug)]
struct Roster {
    customers: Vec<Customer<i64>>,
}

impl BindClass for Roster {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("customers", |r| &r.customers, |r| &mut r.customers);
    }
}

impl_bind!(class Roster);

#[test]
fn errors_carry_json_pointer() {
    let err = mapper()
        .read_str::<Roster>(r#"{"customers":[{"id":1},{"id":"x1"}]}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/customers/1/id"));
    assert!(err.to_string().contains("x1"));

    let err = mapper().read_str::<Roster>(r#"{"customers":{"id":1}}"#).unwrap_err();
    assert_eq!(err.path(), Some("/customers"));

    let err = mapper().read_str::<Roster>("{").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stream);
}

// -----------------------------------------------------------------------------
// Converters

#[derive(Default, Debug)]
struct Blob {
    data: Vec<u8>,
}

impl BindClass for Blob {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("data", |b| &b.data, |b| &mut b.data);
    }
}

impl_bind!(class Blob);

#[test]
fn binary_strategies() {
    let blob = Blob {
        data: b"test".to_vec(),
    };
    assert_eq!(mapper().write_string(&blob).unwrap(), r#"{"data":"dGVzdA=="}"#);
    let raw = Mapper::builder()
        .binary_strategy(BinaryStrategy::ByteArray)
        .build()
        .unwrap();
    assert_eq!(raw.write_string(&blob).unwrap(), r#"{"data":[116,101,115,116]}"#);

    let err = mapper()
        .read_str::<Blob>(r#"{"data":"dGVXz@dA=="}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/data"));
    assert!(err.to_string().contains("dGVXz@dA=="));
}

fn dollars() -> Arc<dyn crate::convert::Converter> {
    from_fns::<i64, _, _>(
        |cents, _| Ok(json!(format!("${cents}"))),
        |json: &Value, _: &ConvertContext| {
            json.as_str()
                .and_then(|text| text.strip_prefix('$'))
                .and_then(|digits| digits.parse().ok())
                .ok_or_else(|| BindError::conversion(json.to_string(), "cents", "expected `$<amount>`"))
        },
    )
}

#[derive(Default, Debug, PartialEq)]
struct Price {
    cents: i64,
    discount: Option<i64>,
    quantity: i64,
}

impl BindClass for Price {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("cents", |p| &p.cents, |p| &mut p.cents).converter(dollars());
        class.field("discount", |p| &p.discount, |p| &mut p.discount).converter(dollars());
        class.field("quantity", |p| &p.quantity, |p| &mut p.quantity);
    }
}

impl_bind!(class Price);

#[test]
fn property_converter_wins_and_wraps_optionals() {
    let mapper = mapper();
    let price = Price {
        cents: 250,
        discount: Some(50),
        quantity: 3,
    };
    let text = mapper.write_string(&price).unwrap();
    assert_eq!(text, r#"{"cents":"$250","discount":"$50","quantity":3}"#);
    assert_eq!(mapper.read_str::<Price>(&text).unwrap(), price);

    let err = mapper.read_str::<Price>(r#"{"cents":250}"#).unwrap_err();
    assert_eq!(err.path(), Some("/cents"));
}

#[test]
fn user_converter_replaces_builtin() {
    let mapper = Mapper::builder()
        .converter::<i64>(dollars())
        .build()
        .unwrap();
    let price = Price {
        cents: 1,
        discount: None,
        quantity: 3,
    };
    assert_eq!(
        mapper.write_string(&price).unwrap(),
        r#"{"cents":"$1","quantity":"$3"}"#
    );
}

#[derive(Default, Debug, PartialEq)]
struct Measured {
    weight: f64,
    count: u32,
    ratio: Option<f32>,
    raw: f64,
}

impl BindClass for Measured {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class
            .field("weight", |m| &m.weight, |m| &mut m.weight)
            .number_format("#,##0.0##", Some("de_DE"));
        class
            .field("count", |m| &m.count, |m| &mut m.count)
            .number_format("#,##0", None);
        class
            .field("ratio", |m| &m.ratio, |m| &mut m.ratio)
            .number_format("0.00", None);
        class.field("raw", |m| &m.raw, |m| &mut m.raw);
    }
}

impl_bind!(class Measured);

#[derive(Default)]
struct Labelled {
    label: String,
}

impl BindClass for Labelled {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class
            .field("label", |l| &l.label, |l| &mut l.label)
            .number_format("0.0", None);
    }
}

impl_bind!(class Labelled);

#[test]
fn number_formats_apply_per_property() {
    let measured = Measured {
        weight: 123456.8,
        count: 1500,
        ratio: Some(0.5),
        raw: 2.5,
    };

    let mapper = mapper();
    let text = mapper.write_string(&measured).unwrap();
    assert_eq!(text, r#"{"weight":"123.456,8","count":"1,500","ratio":"0.50","raw":2.5}"#);
    assert_eq!(mapper.read_str::<Measured>(&text).unwrap(), measured);

    let german = Mapper::builder().locale("de_DE").build().unwrap();
    let text = german.write_string(&measured).unwrap();
    assert_eq!(text, r#"{"weight":"123.456,8","count":"1.500","ratio":"0,50","raw":2.5}"#);
    assert_eq!(german.read_str::<Measured>(&text).unwrap(), measured);

    let plain = mapper.read_str::<Measured>(r#"{"count":42,"ratio":null}"#).unwrap();
    assert_eq!((plain.count, plain.ratio), (42, None));

    let err = mapper.read_str::<Measured>(r#"{"count":"1.5"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/count"));
}

#[test]
fn number_format_needs_numeric_property() {
    let err = mapper()
        .write_string(&Labelled { label: "x".into() })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeResolution);
    assert!(err.to_string().contains("0.0"));
}

#[cfg(feature = "chrono")]
#[derive(Default, Debug, PartialEq)]
struct Event {
    day: Option<chrono::NaiveDate>,
    every: crate::time::Period,
}

#[cfg(feature = "chrono")]
impl BindClass for Event {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.default_constructor();
        class.field("day", |e| &e.day, |e| &mut e.day);
        class.field("every", |e| &e.every, |e| &mut e.every);
    }
}

#[cfg(feature = "chrono")]
impl_bind!(class Event);

#[cfg(feature = "chrono")]
#[test]
fn dates_follow_mapper_locale() {
    let event = Event {
        day: chrono::NaiveDate::from_ymd_opt(2024, 10, 1),
        every: crate::time::Period::new(0, 1, 10),
    };
    let mapper = Mapper::builder()
        .date_format("%d %B %Y")
        .locale("fr_FR")
        .build()
        .unwrap();
    let text = mapper.write_string(&event).unwrap();
    assert_eq!(text, r#"{"day":"01 octobre 2024","every":"P1M10D"}"#);
    assert_eq!(mapper.read_str::<Event>(&text).unwrap(), event);
}

struct Opaque;
impl_bind!(scalar Opaque);

struct HasOpaque {
    opaque: Opaque,
}

impl BindClass for HasOpaque {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.field("opaque", |h| &h.opaque, |h| &mut h.opaque);
    }
}

impl_bind!(class HasOpaque);

#[test]
fn scalar_without_converter_is_unsupported() {
    let err = mapper()
        .write_string(&HasOpaque { opaque: Opaque })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert_eq!(err.path(), Some("/opaque"));

    let mapper = Mapper::builder()
        .converter_matching(
            |info| info.ty().is::<Opaque>(),
            from_fns::<Opaque, _, _>(|_, _| Ok(json!("opaque")), |_, _| Ok(Opaque)),
        )
        .build()
        .unwrap();
    assert_eq!(
        mapper.write_string(&HasOpaque { opaque: Opaque }).unwrap(),
        r#"{"opaque":"opaque"}"#
    );
}

// -----------------------------------------------------------------------------
// Dynamic entry points

#[test]
fn dynamic_entry_points() {
    let mapper = mapper();
    let ty = TypeRef::of::<GoldCustomer>();
    let text = mapper.write_dyn(&gold(9), &ty).unwrap();
    assert_eq!(text, r#"{"id":9,"name":"Ada","level":2,"gold":true}"#);
    let value = mapper.read_dyn(&text, &ty).unwrap();
    assert_eq!(value.downcast_ref::<GoldCustomer>(), Some(&gold(9)));

    let list = TypeRef::generic::<Vec<i64>>([TypeRef::of::<i64>()]);
    let value = mapper.read_dyn("[1,\"2\"]", &list).unwrap();
    assert_eq!(value.downcast_ref::<Vec<i64>>(), Some(&vec![1, 2]));

    assert!(mapper.write_dyn(&5_i32, &TypeRef::of::<String>()).is_err());
    let err = mapper.read_dyn("1", &TypeRef::var("T")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeResolution);
}

// -----------------------------------------------------------------------------
// Configuration

struct Clash {
    a: String,
    b: String,
}

impl BindClass for Clash {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.field("a", |c| &c.a, |c| &mut c.a).rename("x");
        class.field("b", |c| &c.b, |c| &mut c.b).rename("x");
    }
}

impl_bind!(class Clash);

#[test]
fn configuration_errors_fail_fast() {
    for length in [0, -1] {
        let err = Mapper::builder().buffer_length(length).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
    let err = Mapper::builder().register::<Clash>().build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let mapper = Mapper::builder().register::<GoldCustomer>().build().unwrap();
    assert_eq!(mapper.cached_models(), 1);

    let err = Mapper::builder().locale("xx_YY").build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("xx_YY"));

    let config = MapperConfig::from_json(r#"{"naming-strategy":"snake"}"#).unwrap();
    let err = MapperBuilder::from_config(&config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(MapperConfig::from_json(r#"{"verzion":1}"#).is_err());
}

#[test]
fn configuration_from_text() {
    let config = MapperConfig::from_json(
        r#"{
            "access-mode": "both",
            "naming-strategy": "upper-camel-case",
            "attribute-order": "reverse",
            "version": 2,
            "binary-data-strategy": "base64-url",
            "pretty": true,
            "buffer-length": 16,
            "skip-null": false
        }"#,
    )
    .unwrap();
    let mapper = MapperBuilder::from_config(&config).unwrap().build().unwrap();
    let text = mapper.write_string(&gold(1)).unwrap();
    let expected = json!({"Name": "Ada", "Level": 2, "Id": 1, "Gold": true});
    assert_eq!(text, serde_json::to_string_pretty(&expected).unwrap());
}

#[test]
fn write_to_and_read_from_streams() {
    let mapper = Mapper::builder().buffer_length(8).build().unwrap();
    let out = mapper.write_to(&everything(), Vec::new()).unwrap();
    let back: Everything = mapper.read_from(out.as_slice()).unwrap();
    assert_eq!(back, everything());
    assert_eq!(mapper.read_slice::<Everything>(&out).unwrap(), everything());
}

// -----------------------------------------------------------------------------
// Concurrency

#[test]
fn mapper_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Mapper>();

    let mapper = Arc::new(Mapper::builder().access_mode(AccessMode::Both).build().unwrap());
    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let mapper = Arc::clone(&mapper);
            thread::spawn(move || {
                for round in 0..50 {
                    let value = gold(worker * 1000 + round);
                    let text = mapper.write_string(&value).unwrap();
                    let back: GoldCustomer = mapper.read_str(&text).unwrap();
                    assert_eq!(back, value);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(mapper.cached_models(), 1);
}
