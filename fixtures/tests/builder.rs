use fixtures::{Builder, Registry, fixture};
use fixtures_testhelpers::IPanic;

#[derive(Debug, Clone, Default, PartialEq)]
struct Address {
    street: String,
    city: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Customer {
    name: String,
    age: u32,
    address: Address,
    billing: Option<Address>,
    nickname: Option<String>,
    tags: Vec<String>,
    verified: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Money {
    cents: i64,
}

fixture! { Address: Default { street: String, city: String } }
fixture! {
    Customer: Default {
        name: String,
        age: u32,
        address: Address,
        billing: Option<Address>,
        nickname: Option<String>,
        tags: Vec<String>,
        verified: bool,
    }
}
fixture! { Money { cents: i64 } }

#[test]
fn literals_land_at_their_paths() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder
        .with("c => c.name", String::from("Ada"))?
        .with("|c| c.address.city", String::from("London"))?
        .with("address.street", String::from("Baker Street"))?
        .with("age", 36u32)?;

    let customer = builder.build()?;
    assert_eq!(
        customer,
        Customer {
            name: "Ada".into(),
            age: 36,
            address: Address {
                street: "Baker Street".into(),
                city: "London".into(),
            },
            ..Customer::default()
        }
    );
    Ok(())
}

#[test]
fn the_first_registration_of_a_path_wins() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder
        .with("name", String::from("a"))?
        .with("o => o.name", String::from("b"))?;

    assert_eq!(builder.build()?.name, "a");
    Ok(())
}

#[test]
fn an_empty_builder_matches_default_plus_post_build() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_post_build::<Customer>(|c| c.verified = true)?;

    let built = Builder::<Customer>::new(&registry).build()?;
    let mut expected = Customer::default();
    expected.verified = true;
    assert_eq!(built, expected);
    Ok(())
}

#[test]
fn build_onto_keeps_what_the_baseline_already_has() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder.with("address.city", String::from("Rome"))?;

    let baseline = Customer {
        name: "Grace".into(),
        address: Address {
            street: "Main Street".into(),
            city: "Paris".into(),
        },
        ..Customer::default()
    };
    let built = builder.build_onto(baseline)?;
    assert_eq!(built.name, "Grace");
    assert_eq!(built.address.street, "Main Street");
    assert_eq!(built.address.city, "Rome");
    Ok(())
}

#[test]
fn options_are_filled_on_the_way_down() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder
        .with("billing.city", String::from("Bergen"))?
        .with("nickname", Some(String::from("Countess")))?;

    let built = builder.build()?;
    assert_eq!(
        built.billing,
        Some(Address {
            street: String::new(),
            city: "Bergen".into(),
        })
    );
    assert_eq!(built.nickname.as_deref(), Some("Countess"));
    Ok(())
}

#[test]
fn custom_constructor_and_post_build_override_the_registry() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_post_build::<Customer>(|c| c.tags.push("registry".into()))?;

    let mut builder = Builder::<Customer>::new(&registry)
        .with_constructor(|a| {
            Ok(Customer {
                name: a.from("name", String::from("anonymous"))?,
                ..Customer::default()
            })
        })
        .with_post_build(|c| c.tags.push("custom".into()));
    builder.with("age", 7u32)?;

    let built = builder.build()?;
    assert_eq!(built.name, "anonymous");
    assert_eq!(built.age, 7);
    assert_eq!(built.tags, ["custom"]);

    let plain = Builder::<Customer>::new(&registry).build()?;
    assert_eq!(plain.tags, ["registry"]);
    Ok(())
}

#[test]
fn builders_stay_configurable_after_building() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder.with("name", String::from("Ada"))?;
    let first = builder.build()?;

    builder.with("age", 3u32)?;
    let second = builder.build()?;

    assert_eq!(first.age, 0);
    assert_eq!(second.age, 3);
    assert_eq!(first.name, second.name);
    Ok(())
}

#[test]
fn registered_paths_can_be_read_back() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);
    builder.with("address.city", String::from("Oslo"))?;

    assert_eq!(builder.from("address.city", String::new())?, "Oslo");
    assert_eq!(builder.from("name", String::from("fallback"))?, "fallback");
    assert_eq!(
        builder.from("address", Address::default())?,
        Address {
            street: String::new(),
            city: "Oslo".into(),
        }
    );
    Ok(())
}

#[test]
fn registration_errors_name_the_member() {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry);

    let err = builder
        .with("adress.city", String::from("Oslo"))
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"`builder::Customer` has no member `adress` (did you mean `address`?)"
    );

    let err = builder.with("age", String::from("forty")).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"member `age` holds `u32`, but the supplied value is `alloc::string::String`"
    );
}

#[test]
fn types_without_a_constructor_need_a_factory() {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let err = Builder::<Money>::new(&registry).build().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"cannot construct `builder::Money`: it has no zero-argument constructor and no factory is registered for it"
    );
}

#[test]
fn builders_debug_print_their_configuration() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Customer>::new(&registry).with_post_build(|_| {});
    builder.with("name", String::from("Ada"))?;
    insta::assert_snapshot!(
        format!("{builder:?}"),
        @r#"Builder { type: "builder::Customer", paths: 1, custom_constructor: false, custom_post_build: true }"#
    );
    Ok(())
}
