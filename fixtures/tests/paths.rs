use fixtures::{Builder, Path, PathError, Registry, fixture};
use fixtures_testhelpers::IPanic;

#[derive(Debug, Clone, Default, PartialEq)]
struct Profile {
    handle: String,
    karma: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Member {
    profile: Profile,
    aliases: Vec<String>,
}

fixture! { Profile: Default { handle: String, karma: i32 } }
fixture! { Member: Default { profile: Profile, aliases: Vec<String> } }

fn register_error(path: &str) -> String {
    let registry = Registry::new();
    let mut builder = Builder::<Member>::new(&registry);
    match builder.with(path, 1i32) {
        Ok(_) => panic!("`{path}` should have been rejected"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn every_accessor_form_reaches_the_same_member() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    for path in [
        "profile.karma",
        "m => m.profile.karma",
        "|m| m.profile.karma",
        "m => (m.profile as Profile).karma",
        "(profile as Profile).karma",
        "m => (m.profile).karma",
    ] {
        let mut builder = Builder::<Member>::new(&registry);
        builder.with(path, 5i32)?;
        assert_eq!(builder.build()?.profile.karma, 5, "via `{path}`");
    }

    let mut builder = Builder::<Member>::new(&registry);
    builder.with(Path::root().field("profile").field("karma"), 6i32)?;
    assert_eq!(builder.build()?.profile.karma, 6);
    Ok(())
}

#[test]
fn indexer_arguments_may_be_negated_or_cast() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Member>::new(&registry);
    builder.with("aliases[0 as usize]", String::from("ada"))?;
    assert_eq!(builder.build()?.aliases, ["ada"]);

    let err = builder.with("aliases[-1]", String::new()).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"`alloc::vec::Vec<alloc::string::String>` has no member `[-1]`"
    );
    Ok(())
}

#[test]
fn only_member_and_indexer_chains_are_paths() {
    fixtures_testhelpers::setup();

    insta::assert_snapshot!(
        register_error("m => m.profile.handle.len()"),
        @"unsupported path expression: method call `len` in `m => m.profile.handle.len()`; paths may only contain member and indexer accesses"
    );
    insta::assert_snapshot!(
        register_error("m => m.profile.karma * 2"),
        @"unsupported path expression: binary operator `*` in `m => m.profile.karma * 2`; paths may only contain member and indexer accesses"
    );
    insta::assert_snapshot!(
        register_error("m => m"),
        @"path `m => m` does not reach any member of the root"
    );
    insta::assert_snapshot!(
        register_error("m => m.profile..karma"),
        @"invalid path `m => m.profile..karma` at offset 15: expected a member name after `.`, found `.`"
    );
}

#[test]
fn rejected_paths_do_not_change_the_result() -> Result<(), IPanic> {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Member>::new(&registry);
    let err = builder
        .with("profile.karmaa", 1i32)
        .unwrap_err();
    assert!(matches!(
        err,
        PathError::NoSuchMember {
            suggestion: Some("karma"),
            ..
        }
    ));

    assert_eq!(builder.build()?, Member::default());
    Ok(())
}

#[test]
fn empty_paths_cannot_be_registered() {
    fixtures_testhelpers::setup();

    let registry = Registry::new();
    let mut builder = Builder::<Member>::new(&registry);
    let err = builder.with(Path::root(), Member::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"path `<root>` does not reach any member of the root");
}
