/// Declare a string-valued option enum.
///
/// The generated type parses from its wire names, serializes back to them, and reports unknown
/// names with the standard "Invalid value for parameter" message naming `$param`.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($param:literal, default = $default:ident) {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted wire name, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($wire),+];

            /// Wire name of this option.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::foundation::error::BindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err($crate::foundation::error::invalid_choice($param, other, Self::NAMES)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                match s.as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err($crate::foundation::error::invalid_choice_message(
                        $param,
                        other,
                        Self::NAMES,
                    )),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.as_str().to_string()
            }
        }
    };
}

pub(crate) use choice_enum;

#[cfg(test)]
#[path = "../../tests/unit/foundation/choice.rs"]
mod tests;
