/// Implement [`Fixture`](crate::Fixture) for a struct with named fields, or
/// for an opaque scalar.
///
/// ```
/// use fixtures::fixture;
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Customer {
///     id: u32,
///     name: String,
/// }
///
/// // Default-constructible: branches of this type are mutated in place.
/// fixture! { Customer: Default { #[readonly] id: u32, name: String } }
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Money {
///     cents: i64,
/// }
///
/// // No zero-argument constructor: needs a registered factory.
/// fixture! { Money { cents: i64 } }
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Status(u8);
///
/// // A value with no addressable members.
/// fixture! { scalar Status: Default }
/// ```
///
/// Listed fields must be `Clone` and themselves implement `Fixture`. Fields
/// marked `#[readonly]` reject writes after construction; a factory that
/// takes them as arguments through [`Assembly::from`](crate::Assembly::from)
/// keeps the assembly from trying.
#[macro_export]
macro_rules! fixture {
    (@readonly) => { false };
    (@readonly readonly $($rest:ident)*) => { true };
    (@readonly $other:ident $($rest:ident)*) => {
        ::core::compile_error!(::core::concat!(
            "unknown fixture field attribute `",
            ::core::stringify!($other),
            "`; expected `readonly`"
        ))
    };

    (@scalar $ty:ty, $ctor:expr) => {
        impl $crate::Fixture for $ty {
            fn default_constructor() -> ::core::option::Option<fn() -> Self> {
                $ctor
            }

            fn member(_segment: &$crate::Segment) -> ::core::option::Option<$crate::Shape> {
                ::core::option::Option::None
            }

            fn read(
                &self,
                segment: &$crate::Segment,
            ) -> ::core::result::Result<::core::option::Option<$crate::Value>, $crate::AccessError> {
                ::core::result::Result::Err($crate::AccessError::no_such_member::<Self>(segment))
            }

            fn write(
                &mut self,
                segment: &$crate::Segment,
                _value: $crate::Value,
            ) -> ::core::result::Result<(), $crate::AccessError> {
                ::core::result::Result::Err($crate::AccessError::no_such_member::<Self>(segment))
            }
        }
    };

    (@struct $ty:ident, $ctor:expr, { $( [$($attr:ident)*] $field:ident : $fty:ty ),* }) => {
        impl $crate::Fixture for $ty {
            fn default_constructor() -> ::core::option::Option<fn() -> Self> {
                $ctor
            }

            fn member(segment: &$crate::Segment) -> ::core::option::Option<$crate::Shape> {
                match segment.member_name() {
                    $(
                        ::core::option::Option::Some(::core::stringify!($field)) => {
                            ::core::option::Option::Some(<$fty as $crate::Fixture>::shape())
                        }
                    )*
                    _ => ::core::option::Option::None,
                }
            }

            fn member_names() -> &'static [&'static str] {
                &[$(::core::stringify!($field)),*]
            }

            fn read(
                &self,
                segment: &$crate::Segment,
            ) -> ::core::result::Result<::core::option::Option<$crate::Value>, $crate::AccessError> {
                match segment.member_name() {
                    $(
                        ::core::option::Option::Some(::core::stringify!($field)) => {
                            ::core::result::Result::Ok(::core::option::Option::Some(
                                $crate::Value::new(::core::clone::Clone::clone(&self.$field)),
                            ))
                        }
                    )*
                    _ => ::core::result::Result::Err($crate::AccessError::no_such_member::<Self>(segment)),
                }
            }

            #[allow(unused_variables)]
            fn write(
                &mut self,
                segment: &$crate::Segment,
                value: $crate::Value,
            ) -> ::core::result::Result<(), $crate::AccessError> {
                match segment.member_name() {
                    $(
                        ::core::option::Option::Some(::core::stringify!($field)) => {
                            if $crate::fixture!(@readonly $($attr)*) {
                                return ::core::result::Result::Err(
                                    $crate::AccessError::read_only::<Self>(segment),
                                );
                            }
                            self.$field = value.into_member::<$fty>(segment)?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => ::core::result::Result::Err($crate::AccessError::no_such_member::<Self>(segment)),
                }
            }
        }
    };

    (scalar $ty:ty : Default) => {
        $crate::fixture!(@scalar $ty, ::core::option::Option::Some(
            <$ty as ::core::default::Default>::default as fn() -> $ty
        ));
    };

    (scalar $ty:ty) => {
        $crate::fixture!(@scalar $ty, ::core::option::Option::None);
    };

    ($ty:ident : Default { $( $(#[$attr:ident])* $field:ident : $fty:ty ),* $(,)? }) => {
        $crate::fixture!(@struct $ty, ::core::option::Option::Some(
            <$ty as ::core::default::Default>::default as fn() -> $ty
        ), { $( [$($attr)*] $field : $fty ),* });
    };

    ($ty:ident { $( $(#[$attr:ident])* $field:ident : $fty:ty ),* $(,)? }) => {
        $crate::fixture!(@struct $ty, ::core::option::Option::None, { $( [$($attr)*] $field : $fty ),* });
    };
}
