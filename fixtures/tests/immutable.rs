//! Types without a zero-argument constructor, built through factories.

use fixtures::{Assembly, BuildError, Builder, Registry, fixture};
use fixtures_testhelpers::IPanic;

#[derive(Debug, Clone, PartialEq)]
struct Money {
    currency: String,
    cents: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: u64,
    owner: String,
    balance: Money,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Invoice {
    number: u32,
    total: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Address {
    city: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Badge {
    city: String,
    address: Address,
}

fixture! { Money { #[readonly] currency: String, cents: i64 } }
fixture! { Account { #[readonly] id: u64, owner: String, #[readonly] balance: Money } }
fixture! { Invoice: Default { number: u32, total: Option<Money> } }
fixture! { Address: Default { city: String } }
fixture! { Badge { #[readonly] city: String, address: Address } }

fn money_registry() -> Result<Registry, IPanic> {
    let mut registry = Registry::new();
    registry.add_constructor::<Money>(|a| {
        Ok(Money {
            currency: a.from("currency", String::from("EUR"))?,
            cents: 0,
        })
    })?;
    Ok(registry)
}

#[test]
fn factories_observe_registered_values() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();
    let registry = money_registry()?;

    let mut builder = Builder::<Money>::new(&registry);
    builder
        .with("currency", String::from("USD"))?
        .with("cents", 250i64)?;

    // `currency` went into the factory and is not written again afterwards,
    // which would fail since it is read-only
    let money = builder.build()?;
    assert_eq!(
        money,
        Money {
            currency: "USD".into(),
            cents: 250,
        }
    );
    Ok(())
}

#[test]
fn factories_see_the_fallback_for_missing_paths() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();
    let registry = money_registry()?;

    let money = Builder::<Money>::new(&registry).build()?;
    assert_eq!(money.currency, "EUR");
    assert_eq!(money.cents, 0);
    Ok(())
}

#[test]
fn read_only_members_the_factory_ignored_cannot_be_set() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_constructor::<Money>(|_| {
        Ok(Money {
            currency: "EUR".into(),
            cents: 0,
        })
    })?;

    let mut builder = Builder::<Money>::new(&registry);
    builder.with("currency", String::from("USD"))?;
    let err = builder.build().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"at `currency`: member `currency` of `immutable::Money` is read-only"
    );
    Ok(())
}

#[test]
fn nested_immutable_members_are_built_through_their_factory() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();
    let registry = money_registry()?;

    let mut builder = Builder::<Invoice>::new(&registry);
    builder
        .with("number", 17u32)?
        .with("total.cents", 999i64)?
        .with("total.currency", String::from("GBP"))?;

    let invoice = builder.build()?;
    assert_eq!(invoice.number, 17);
    assert_eq!(
        invoice.total,
        Some(Money {
            currency: "GBP".into(),
            cents: 999,
        })
    );
    Ok(())
}

#[test]
fn factories_can_take_whole_branches() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = money_registry()?;
    registry.add_constructor::<Account>(|a| {
        Ok(Account {
            id: a.from("id", 1)?,
            owner: String::new(),
            balance: a.from(
                "balance",
                Money {
                    currency: "NOK".into(),
                    cents: 0,
                },
            )?,
        })
    })?;

    let mut builder = Builder::<Account>::new(&registry);
    builder
        .with("id", 42u64)?
        .with("owner", String::from("Ada"))?
        .with("balance.cents", 5i64)?;

    let account = builder.build()?;
    assert_eq!(account.id, 42);
    assert_eq!(account.owner, "Ada");
    assert_eq!(
        account.balance,
        Money {
            currency: "EUR".into(),
            cents: 5,
        }
    );

    let fallback = Builder::<Account>::new(&registry).build()?;
    assert_eq!(fallback.id, 1);
    assert_eq!(fallback.balance.currency, "NOK");
    Ok(())
}

#[test]
fn factories_can_read_a_branch_and_its_members() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = money_registry()?;
    registry.add_constructor::<Badge>(|a| {
        Ok(Badge {
            address: a.from("address", Address::default())?,
            city: a.from("address.city", String::new())?,
        })
    })?;

    let mut builder = Builder::<Badge>::new(&registry);
    builder.with("address.city", String::from("Oslo"))?;

    let first = builder.build()?;
    assert_eq!(
        first,
        Badge {
            city: "Oslo".into(),
            address: Address {
                city: "Oslo".into(),
            },
        }
    );
    assert_eq!(builder.build()?, first);
    assert_eq!(builder.build()?, first);
    Ok(())
}

#[test]
fn members_read_by_an_outer_factory_still_reach_the_nested_one() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = money_registry()?;
    registry.add_constructor::<Account>(|a| {
        let cents: i64 = a.from("balance.cents", 0)?;
        Ok(Account {
            id: 1,
            owner: format!("holds {cents}"),
            balance: a.from(
                "balance",
                Money {
                    currency: "NOK".into(),
                    cents: 0,
                },
            )?,
        })
    })?;

    let mut builder = Builder::<Account>::new(&registry);
    builder
        .with("balance.cents", 5i64)?
        .with("balance.currency", String::from("GBP"))?;

    let first = builder.build()?;
    assert_eq!(
        first,
        Account {
            id: 1,
            owner: "holds 5".into(),
            balance: Money {
                currency: "GBP".into(),
                cents: 5,
            },
        }
    );
    assert_eq!(builder.build()?, first);
    Ok(())
}

#[test]
fn fallbacks_can_come_from_another_builder() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();
    let registry = money_registry()?;

    let factory = |a: &Assembly<'_, Account>| -> Result<Account, BuildError> {
        let mut fallback = Builder::<Money>::new(a.registry());
        fallback.with("cents", 100i64)?;
        Ok(Account {
            id: a.from("id", 1)?,
            owner: String::new(),
            balance: a.from_builder("balance", &fallback)?,
        })
    };

    let account = Builder::<Account>::new(&registry)
        .with_constructor(factory)
        .build()?;
    assert_eq!(
        account.balance,
        Money {
            currency: "EUR".into(),
            cents: 100,
        }
    );

    let mut builder = Builder::<Account>::new(&registry).with_constructor(factory);
    builder.with("balance.cents", 7i64)?;
    assert_eq!(builder.build()?.balance.cents, 7);
    Ok(())
}

#[test]
fn factories_know_they_are_running() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_constructor::<Money>(|a| {
        assert!(a.is_constructing());
        Ok(Money {
            currency: a.from_or_default("currency")?,
            cents: 0,
        })
    })?;

    let money = Builder::<Money>::new(&registry).build()?;
    assert_eq!(money.currency, "");
    Ok(())
}

#[test]
fn factory_errors_surface_from_build() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_constructor::<Money>(|a| {
        let cents: i64 = a.from("cents", 0)?;
        if cents < 0 {
            return Err(BuildError::factory::<Money>("negative amounts are not money"));
        }
        Ok(Money {
            currency: "EUR".into(),
            cents,
        })
    })?;

    let mut builder = Builder::<Money>::new(&registry);
    builder.with("cents", -5i64)?;
    let err = builder.build().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"factory for `immutable::Money` failed: negative amounts are not money"
    );
    Ok(())
}

#[test]
fn reading_a_path_as_the_wrong_type_fails() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let mut registry = Registry::new();
    registry.add_constructor::<Money>(|a| {
        let cents: u32 = a.from("cents", 0)?;
        Ok(Money {
            currency: "EUR".into(),
            cents: cents.into(),
        })
    })?;

    let mut builder = Builder::<Money>::new(&registry);
    builder.with("cents", 12i64)?;
    let err = builder.build().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"`cents` was read as `u32`, but it holds `i64`"
    );
    Ok(())
}
