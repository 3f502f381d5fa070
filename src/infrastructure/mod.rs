//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（Page），只向上层暴露能力，不认识业务对象

pub mod page_driver;

pub use page_driver::{CdpDriver, PageDriver};
