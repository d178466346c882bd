//! 核心宏定义
//!
//! 提供统一的宏来减少 ABI 类型声明的重复

/// 声明一个以 `u32` 为底层表示的 ABI 枚举
///
/// 跨边界的枚举必须能容纳对端新增的取值（前向兼容），因此不使用 Rust `enum`，
/// 而是生成 `#[repr(transparent)]` 的新类型 + 关联常量。
///
/// 使用示例:
/// ```rust
/// native_bridge::abi_enum! {
///     /// 示例枚举
///     pub struct Color {
///         RED = 0,
///         GREEN = 1,
///     }
/// }
///
/// assert_eq!(Color::GREEN.raw(), 1);
/// assert_eq!(Color::from_raw(0), Color::RED);
/// assert_eq!(format!("{:?}", Color::from_raw(7)), "Color(7)");
/// ```
#[macro_export]
macro_rules! abi_enum {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, $crate::bytemuck::Pod, $crate::bytemuck::Zeroable)]
        $vis struct $name(pub u32);

        impl $name {
            $(
                $(#[$vmeta])*
                pub const $variant: Self = Self($value);
            )*

            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            /// 已知取值的名称；对端新增的取值返回 `None`
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $(v if v == $value => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.name() {
                    Some(name) => write!(f, "{}::{}", stringify!($name), name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value.0
            }
        }
    };
}
