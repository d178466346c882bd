//! payload 结构体布局
//!
//! 按自然对齐计算字段偏移，所有填充都变成显式的 `_padN: [u8; N]` 字段，
//! 使生成的 `#[repr(C)]` 结构体没有隐式填充，可以安全地实现 `Pod`。

use super::TypeMapping;
use crate::idl::naming::rust_field_name;
use crate::idl::ApiArg;

/// 布局中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutItem<'t> {
    Field {
        /// 生成代码中的字段名（snake_case）
        name: String,
        mapping: &'t TypeMapping,
        offset: usize,
    },
    Pad {
        name: String,
        len: usize,
        offset: usize,
    },
}

/// 一个 payload 结构体的布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout<'t> {
    pub items: Vec<LayoutItem<'t>>,
    pub size: usize,
    pub align: usize,
}

impl<'t> StructLayout<'t> {
    /// 按声明顺序排布参数
    pub fn compute(args: &[ApiArg], mappings: &[&'t TypeMapping]) -> Self {
        let mut items = Vec::with_capacity(args.len());
        let mut offset = 0usize;
        let mut align = 1usize;
        let mut pads = 0usize;

        let mut push_pad = |items: &mut Vec<LayoutItem<'t>>, offset: usize, len: usize| {
            items.push(LayoutItem::Pad {
                name: format!("_pad{pads}"),
                len,
                offset,
            });
            pads += 1;
        };

        for (arg, mapping) in args.iter().zip(mappings) {
            align = align.max(mapping.align);
            let aligned = round_up(offset, mapping.align);
            if aligned > offset {
                push_pad(&mut items, offset, aligned - offset);
            }
            items.push(LayoutItem::Field {
                name: rust_field_name(&arg.name),
                mapping,
                offset: aligned,
            });
            offset = aligned + mapping.size;
        }

        let size = round_up(offset, align);
        if size > offset {
            push_pad(&mut items, offset, size - offset);
        }

        Self { items, size, align }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &'t TypeMapping)> + '_ {
        self.items.iter().filter_map(|item| match item {
            LayoutItem::Field { name, mapping, .. } => Some((name.as_str(), *mapping)),
            LayoutItem::Pad { .. } => None,
        })
    }

    pub fn has_padding(&self) -> bool {
        self.items.iter().any(|item| matches!(item, LayoutItem::Pad { .. }))
    }
}

fn round_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}
