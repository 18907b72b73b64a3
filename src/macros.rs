// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Declares a fieldless enum backed by fixed `u32` wire values, with a
/// display name per variant and a checked conversion from the raw value.
macro_rules! u32_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $value:expr => $str:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($variant),*
        }

        impl $name {
            const VARIANTS: &'static [$name] = &[$($name::$variant,)*];

            #[allow(dead_code)]
            pub fn iter() -> std::slice::Iter<'static, $name> {
                Self::VARIANTS.iter()
            }

            pub const fn value(self) -> u32 {
                match self {
                    $($name::$variant => $value,)*
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = u32;
            fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)*
                    _ => Err(value),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value.value()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use u32_enum;
