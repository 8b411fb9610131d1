//! `define_port_error!`, shared by the storage, upload and record store
//! error enums.

/// Declare a port error enum with one snake_case constructor per variant.
///
/// Every variant carries its `#[error]` message after `=>`. Field
/// constructors take `impl Into<T>`, so callers hand over `&str`, `String`
/// or a `StorageKey` for `String` fields without converting first.
macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@fields $variant [] [] $( $field : $ty, )*);
    };

    (@fields $variant:ident [$($args:tt)*] [$($body:tt)*]) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($args)*) -> Self {
                Self::$variant { $($body)* }
            }
        }
    };

    (@fields $variant:ident [$($args:tt)*] [$($body:tt)*] $field:ident : $ty:ty, $($tail:tt)*) => {
        define_port_error!(
            @fields
            $variant
            [$($args)* $field: impl Into<$ty>,]
            [$($body)* $field: $field.into(),]
            $($tail)*
        );
    };

    (
        $(#[$enum_meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;
