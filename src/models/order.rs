//! 订单数据模型

use serde::{Deserialize, Serialize};

/// 单张机器人订单
///
/// 对应订单表的一行，五列均为必填，加载时校验一次，之后不再变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    /// 订单编号（同时用作产物文件名）
    #[serde(rename = "Order number")]
    pub order_number: String,

    /// 头部部件编号
    #[serde(rename = "Head")]
    pub head: String,

    /// 身体部件编号
    #[serde(rename = "Body")]
    pub body: String,

    /// 腿部部件编号
    #[serde(rename = "Legs")]
    pub legs: String,

    /// 收货地址
    #[serde(rename = "Address")]
    pub address: String,
}

impl OrderRow {
    /// 校验订单字段
    ///
    /// 五个字段均不能为空；订单编号会用作文件名，
    /// 不允许包含路径分隔符或上级目录引用
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("订单编号", &self.order_number),
            ("头部编号", &self.head),
            ("身体编号", &self.body),
            ("腿部编号", &self.legs),
            ("收货地址", &self.address),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("{}为空", name));
            }
        }

        if self.order_number.contains('/')
            || self.order_number.contains('\\')
            || self.order_number.contains("..")
        {
            return Err(format!("订单编号包含非法字符: {}", self.order_number));
        }

        Ok(())
    }
}
