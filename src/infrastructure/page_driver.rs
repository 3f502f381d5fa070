//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露单步页面操作能力

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{DriverError, DriverResult};

/// 页面操作能力集
///
/// 流程层只依赖该 trait，不接触具体浏览器实现。
/// 每个方法都是单步阻塞操作，内部不做重试
#[async_trait]
pub trait PageDriver {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 点击元素
    async fn click(&self, selector: &str) -> DriverResult<()>;

    /// 设置下拉框的值并触发 change 事件
    async fn select_option(&self, selector: &str, value: &str) -> DriverResult<()>;

    /// 勾选单选框（与浏览器原生点击等效）
    async fn set_checked(&self, selector: &str) -> DriverResult<()>;

    /// 清空输入框并填入文本
    async fn fill(&self, selector: &str, text: &str) -> DriverResult<()>;

    /// 元素当前是否存在（不存在不算错误）
    async fn element_exists(&self, selector: &str) -> DriverResult<bool>;

    /// 读取元素的 innerHTML，元素不存在视为错误
    async fn inner_html(&self, selector: &str) -> DriverResult<String>;

    /// 对元素截图并保存为 PNG
    async fn screenshot_element(&self, selector: &str, dest: &Path) -> DriverResult<()>;

    /// 重新加载当前页面
    async fn reload(&self) -> DriverResult<()>;
}

/// CDP 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 每次操作前按 slowmo 减速，贴近人工操作节奏
/// - 不认识 Order，不处理业务流程
pub struct CdpDriver {
    page: Page,
    slowmo: Duration,
}

impl CdpDriver {
    /// 创建新的页面驱动
    pub fn new(page: Page, slowmo_ms: u64) -> Self {
        Self {
            page,
            slowmo: Duration::from_millis(slowmo_ms),
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 操作前减速
    async fn pace(&self) {
        if !self.slowmo.is_zero() {
            sleep(self.slowmo).await;
        }
    }

    /// 执行 JS 代码并反序列化返回值
    async fn eval<T: DeserializeOwned>(&self, js_code: String) -> DriverResult<T> {
        let result = self.page.evaluate(js_code).await?;
        Ok(result.into_value()?)
    }
}

/// inner_html 的 JS 返回值
///
/// 用对象包一层，避免元素缺失时的 null 返回值在反序列化阶段丢失
#[derive(serde::Deserialize)]
struct HtmlProbe {
    found: bool,
    html: String,
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.pace().await;
        debug!("导航到: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        self.pace().await;
        debug!("点击: {}", selector);
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> DriverResult<()> {
        self.pace().await;
        debug!("选择 {} = {}", selector, value);
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.value = {};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?
        );

        let found: bool = self.eval(js_code).await?;
        if !found {
            return Err(DriverError::ElementMissing {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn set_checked(&self, selector: &str) -> DriverResult<()> {
        self.pace().await;
        debug!("勾选: {}", selector);
        // 原生点击会滚动到元素并触发页面脚本监听的事件
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> DriverResult<()> {
        self.pace().await;
        debug!("填写 {} ({} 字符)", selector, text.len());
        let element = self.page.find_element(selector).await?;
        element.click().await?;

        // type_str 只负责追加，先把旧值清掉
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.value = '';
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        let cleared: bool = self.eval(js_code).await?;
        if !cleared {
            return Err(DriverError::ElementMissing {
                selector: selector.to_string(),
            });
        }

        element.type_str(text).await?;
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> DriverResult<bool> {
        self.pace().await;
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        let exists: bool = self.eval(js_code).await?;
        debug!("元素 {} 存在: {}", selector, exists);
        Ok(exists)
    }

    async fn inner_html(&self, selector: &str) -> DriverResult<String> {
        self.pace().await;
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return {{ found: false, html: "" }};
                return {{ found: true, html: el.innerHTML }};
            }})()
            "#,
            serde_json::to_string(selector)?
        );

        let probe: HtmlProbe = self.eval(js_code).await?;
        if !probe.found {
            return Err(DriverError::ElementMissing {
                selector: selector.to_string(),
            });
        }
        Ok(probe.html)
    }

    async fn screenshot_element(&self, selector: &str, dest: &Path) -> DriverResult<()> {
        self.pace().await;
        debug!("截图 {} -> {}", selector, dest.display());
        let element = self.page.find_element(selector).await?;
        element
            .save_screenshot(CaptureScreenshotFormat::Png, dest)
            .await?;
        Ok(())
    }

    async fn reload(&self) -> DriverResult<()> {
        self.pace().await;
        debug!("重新加载页面");
        self.eval::<bool>("(() => { window.location.reload(); return true; })()".to_string())
            .await?;
        // 等待页面重新渲染
        sleep(Duration::from_millis(300)).await;
        Ok(())
    }
}

#[cfg(test)]
pub mod scripted {
    //! 测试用脚本驱动
    //!
    //! 模拟商店下单页面：每次点击 #order 消耗一条剧本，决定本次提交
    //! 是被接受、被拒绝（出现 .alert-danger）还是在填表阶段断连

    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::PageDriver;
    use crate::error::{DriverError, DriverResult};

    /// 脚本驱动返回的收据内容
    pub const RECEIPT_HTML: &str =
        "<div id=\"receipt\"><h3>Receipt</h3><p>Thank you for your order!</p></div>";

    /// 单次提交尝试的剧本
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ScriptedOutcome {
        /// 提交被接受，页面出现收据
        Accepted,
        /// 提交被拒绝，页面出现 .alert-danger
        Rejected,
        /// 填表阶段驱动报错（传输异常）
        TransportOnFill,
    }

    #[derive(Debug, Default)]
    struct State {
        script: VecDeque<ScriptedOutcome>,
        accepted: bool,
        alert: bool,
        clicks: Vec<String>,
        reloads: usize,
    }

    /// 脚本驱动
    pub struct ScriptedDriver {
        state: Mutex<State>,
        fail_screenshot: bool,
    }

    impl ScriptedDriver {
        pub fn new(script: Vec<ScriptedOutcome>) -> Self {
            Self {
                state: Mutex::new(State {
                    script: script.into(),
                    ..State::default()
                }),
                fail_screenshot: false,
            }
        }

        /// 截图阶段必定失败的驱动（用于产物失败降级的用例）
        pub fn with_failing_screenshot(script: Vec<ScriptedOutcome>) -> Self {
            Self {
                fail_screenshot: true,
                ..Self::new(script)
            }
        }

        /// 页面被重载的次数
        pub fn reload_count(&self) -> usize {
            self.state.lock().unwrap().reloads
        }

        /// 指定选择器被点击的次数
        pub fn click_count(&self, selector: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .clicks
                .iter()
                .filter(|s| s.as_str() == selector)
                .count()
        }

        /// 剩余未消耗的剧本条数
        pub fn remaining_script(&self) -> usize {
            self.state.lock().unwrap().script.len()
        }

        /// 填表阶段剧本是传输异常时弹出错误
        fn transport_on_fill(&self, selector: &str) -> DriverResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.script.front() == Some(&ScriptedOutcome::TransportOnFill) {
                state.script.pop_front();
                return Err(DriverError::ElementMissing {
                    selector: selector.to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn navigate(&self, _url: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn click(&self, selector: &str) -> DriverResult<()> {
            let mut state = self.state.lock().unwrap();
            state.clicks.push(selector.to_string());

            match selector {
                "#order" => {
                    let outcome = state.script.pop_front().expect("剧本耗尽：多余的提交尝试");
                    state.accepted = outcome == ScriptedOutcome::Accepted;
                    state.alert = outcome == ScriptedOutcome::Rejected;
                }
                "#order-another" => {
                    // 回到空白表单
                    state.accepted = false;
                    state.alert = false;
                }
                _ => {}
            }
            Ok(())
        }

        async fn select_option(&self, selector: &str, _value: &str) -> DriverResult<()> {
            self.transport_on_fill(selector)
        }

        async fn set_checked(&self, selector: &str) -> DriverResult<()> {
            self.transport_on_fill(selector)
        }

        async fn fill(&self, selector: &str, _text: &str) -> DriverResult<()> {
            self.transport_on_fill(selector)
        }

        async fn element_exists(&self, selector: &str) -> DriverResult<bool> {
            let state = self.state.lock().unwrap();
            if selector.contains("alert") {
                Ok(state.alert)
            } else {
                Ok(true)
            }
        }

        async fn inner_html(&self, selector: &str) -> DriverResult<String> {
            let state = self.state.lock().unwrap();
            if state.accepted {
                Ok(RECEIPT_HTML.to_string())
            } else {
                Err(DriverError::ElementMissing {
                    selector: selector.to_string(),
                })
            }
        }

        async fn screenshot_element(&self, selector: &str, dest: &Path) -> DriverResult<()> {
            if self.fail_screenshot {
                return Err(DriverError::ElementMissing {
                    selector: selector.to_string(),
                });
            }
            // 写一张真实的小 PNG，后续合并阶段要能解码它
            let preview = image::RgbImage::from_pixel(4, 4, image::Rgb([180, 180, 180]));
            preview.save(dest).expect("写入测试截图失败");
            Ok(())
        }

        async fn reload(&self) -> DriverResult<()> {
            let mut state = self.state.lock().unwrap();
            state.reloads += 1;
            state.accepted = false;
            state.alert = false;
            Ok(())
        }
    }
}
