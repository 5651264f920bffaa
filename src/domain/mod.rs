/// Declares a closed string enum stored as TEXT and exchanged as JSON strings.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod common;
pub mod event;
pub mod sermon;
pub mod prayer_request;
pub mod blog_post;
pub mod donation;
pub mod member;
pub mod testimony;
pub mod resource;

pub use common::*;
pub use event::*;
pub use sermon::*;
pub use prayer_request::*;
pub use blog_post::*;
pub use donation::*;
pub use member::*;
pub use testimony::*;
pub use resource::*;
