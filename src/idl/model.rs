//! API 模型

use serde::{Deserialize, Serialize};

use crate::ids::Direction;

/// 函数参数（类型记号 + 参数名）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiArg {
    pub ty: String,
    pub name: String,
}

/// 一条声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFn {
    pub name: String,
    /// 顺序同时决定调用参数顺序与二进制字段顺序
    pub args: Vec<ApiArg>,
    /// 源文件中的行号（从 1 开始）
    pub line: usize,
}

impl ApiFn {
    /// 名称与参数列表均相同（忽略行号）
    pub fn same_signature(&self, other: &ApiFn) -> bool {
        self.name == other.name && self.args == other.args
    }
}

/// 一个 IDL 源单元解析出的声明列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiModel {
    pub host_fns: Vec<ApiFn>,
    pub core_fns: Vec<ApiFn>,
}

impl ApiModel {
    pub fn fns(&self, direction: Direction) -> &[ApiFn] {
        match direction {
            Direction::ToHost => &self.host_fns,
            Direction::ToCore => &self.core_fns,
        }
    }

    pub(crate) fn fns_mut(&mut self, direction: Direction) -> &mut Vec<ApiFn> {
        match direction {
            Direction::ToHost => &mut self.host_fns,
            Direction::ToCore => &mut self.core_fns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host_fns.is_empty() && self.core_fns.is_empty()
    }

    /// 两个模型的声明完全一致（忽略行号）
    pub fn same_declarations(&self, other: &ApiModel) -> bool {
        fn same(a: &[ApiFn], b: &[ApiFn]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_signature(y))
        }
        same(&self.host_fns, &other.host_fns) && same(&self.core_fns, &other.core_fns)
    }
}

/// 一个已解析并命名的模块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// 模块名（PascalCase），参与 ID 哈希
    pub name: String,
    /// 生成的 Rust 模块名（snake_case），也是生成文件名前缀
    pub namespace: String,
    pub model: ApiModel,
}
