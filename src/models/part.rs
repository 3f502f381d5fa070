//! 机器人部件目录
//!
//! 下单页面的头部 / 身体部件选项，编号与商品名的静态映射。
//! 只用于日志显示：未知编号不是加载错误，商店自己会用错误提示拒绝它

use phf::phf_map;

/// 头部部件编号 → 商品名
static HEAD_PARTS: phf::Map<&'static str, &'static str> = phf_map! {
    "1" => "Roll-a-thor head",
    "2" => "Peanut crusher head",
    "3" => "D.A.V.E head",
    "4" => "Andy Roid head",
    "5" => "Spanner mate head",
    "6" => "Drillbit 2000 head",
};

/// 身体部件编号 → 商品名
static BODY_PARTS: phf::Map<&'static str, &'static str> = phf_map! {
    "1" => "Roll-a-thor body",
    "2" => "Peanut crusher body",
    "3" => "D.A.V.E body",
    "4" => "Andy Roid body",
    "5" => "Spanner mate body",
    "6" => "Drillbit 2000 body",
};

/// 查找头部部件商品名
pub fn head_name(code: &str) -> Option<&'static str> {
    HEAD_PARTS.get(code).copied()
}

/// 查找身体部件商品名
pub fn body_name(code: &str) -> Option<&'static str> {
    BODY_PARTS.get(code).copied()
}

/// 部件的日志显示名，未知编号原样带出
pub fn display_label(code: &str, name: Option<&'static str>) -> String {
    match name {
        Some(name) => format!("{} ({})", name, code),
        None => format!("未知部件 ({})", code),
    }
}
