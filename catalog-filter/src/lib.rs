use std::cell::RefCell;
use std::rc::Rc;

use catalog_common::{parse_number, ProductEntry};
use gloo_timers::callback::Timeout;
use log::LevelFilter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlInputElement};

// 导出模块
pub mod builder;
pub mod controller;
pub mod dom;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod slider;
pub mod surface;

pub use builder::FilterStateBuilder;
pub use controller::{CatalogContext, CatalogController};
pub use dom::DomSurface;
pub use engine::FilterEngine;
pub use error::{ConfigError, SurfaceError};
pub use events::{CatalogEvent, EventBus, EventSource, Outbox, SubscriptionId};
pub use models::{
    EmptyStateChange, EmptyStateMessage, FilterConfig, FilterOutcome, FilterParams, FilterResult,
    FilterState, MissingCharacteristic, Selectors,
};
pub use slider::PriceSlider;
pub use surface::{MemorySurface, RenderingSurface};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理和控制台日志
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 商品筛选 - 不依赖页面，直接处理条目列表
pub struct CatalogFilter;

impl CatalogFilter {
    /// 按参数筛选条目，返回可见条目的 ID
    pub fn filter_entries(
        entries: &[ProductEntry],
        params: &FilterParams,
        config: &FilterConfig,
    ) -> FilterResult {
        let state = FilterStateBuilder::new(&config.all_sentinel).params(params).build();
        let engine = FilterEngine::new(config.clone());

        let visible_ids: Vec<String> = entries
            .iter()
            .filter(|entry| engine.matches(&state, entry))
            .map(|entry| entry.id.clone())
            .collect();

        FilterResult {
            total: visible_ids.len(),
            visible_ids,
        }
    }
}

/// 筛选条目 - JSON 条目列表 + JSON 参数
#[wasm_bindgen]
pub fn filter_entries(
    entries_json: &str,
    params_json: &str,
    config_json: &str,
) -> Result<JsValue, JsValue> {
    let entries: Vec<ProductEntry> = serde_json::from_str(entries_json)
        .map_err(|e| JsValue::from_str(&format!("解析条目失败: {}", e)))?;
    let params: FilterParams = serde_json::from_str(params_json)
        .map_err(|e| JsValue::from_str(&format!("解析参数失败: {}", e)))?;
    let config = FilterConfig::from_json(config_json).map_err(to_js_error)?;

    let result = CatalogFilter::filter_entries(&entries, &params, &config);

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
}

type SharedController = Rc<RefCell<CatalogController<DomSurface>>>;

struct Listener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

/// 目录筛选器JS接口 - 绑定到当前页面
#[wasm_bindgen]
pub struct CatalogFilterJS {
    controller: SharedController,
    listeners: Vec<Listener>,
    pending_search: Rc<RefCell<Option<Timeout>>>,
}

#[wasm_bindgen]
impl CatalogFilterJS {
    /// 创建筛选器，`config_json` 为空时使用默认配置
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<CatalogFilterJS, JsValue> {
        let config = FilterConfig::from_json(config_json).map_err(to_js_error)?;
        let surface =
            DomSurface::new(config.selectors.clone(), config.formatter.clone()).map_err(to_js_error)?;
        let mut controller = CatalogController::new(FilterEngine::new(config), surface);

        for source in [EventSource::PriceSlider, EventSource::PriceReset, EventSource::ClearFilters] {
            controller.subscribe(source, |_, ctx, _| {
                if let Some(slider) = ctx.surface.price_slider() {
                    ctx.surface.render_slider(&slider);
                }
            });
        }

        Ok(CatalogFilterJS {
            controller: Rc::new(RefCell::new(controller)),
            listeners: Vec::new(),
            pending_search: Rc::new(RefCell::new(None)),
        })
    }

    /// 注册页面事件监听，重复调用不会重复注册
    pub fn attach(&mut self) -> Result<(), JsValue> {
        if !self.listeners.is_empty() {
            return Ok(());
        }

        let (document, selectors, debounce_ms) = {
            let controller = self.controller.borrow();
            let surface = controller.surface();
            if let Some(slider) = surface.price_slider() {
                surface.render_slider(&slider);
            }
            (
                surface.document().clone(),
                surface.selectors().clone(),
                controller.engine().config().search_debounce_ms,
            )
        };

        if let Some(input) = document.get_element_by_id(&selectors.search_input_id) {
            let controller = self.controller.clone();
            let pending = self.pending_search.clone();
            self.listen(input.into(), "input", move |event| {
                let query = input_of(&event).map(|input| input.value()).unwrap_or_default();
                let event = CatalogEvent::SearchChanged { query };
                if debounce_ms == 0 {
                    dispatch(&controller, event);
                } else {
                    // 替换旧定时器即取消上一次尚未触发的筛选
                    let controller = controller.clone();
                    *pending.borrow_mut() =
                        Some(Timeout::new(debounce_ms, move || dispatch(&controller, event)));
                }
            })?;
        }

        if let Some(slider) = document.get_element_by_id(&selectors.price_slider_id) {
            let controller = self.controller.clone();
            self.listen(slider.into(), "input", move |event| {
                let value = input_of(&event)
                    .and_then(|input| parse_number(&input.value()))
                    .unwrap_or(f64::NAN);
                dispatch(&controller, CatalogEvent::PriceChanged { value });
            })?;
        }

        if let Some(button) = document.get_element_by_id(&selectors.reset_price_id) {
            let controller = self.controller.clone();
            self.listen(button.into(), "click", move |_| {
                dispatch(&controller, CatalogEvent::PriceReset);
            })?;
        }

        if let Some(button) = document.get_element_by_id(&selectors.clear_filters_id) {
            let controller = self.controller.clone();
            self.listen(button.into(), "click", move |_| {
                dispatch(&controller, CatalogEvent::FiltersCleared);
            })?;
        }

        let (checkboxes, tabs) = {
            let controller = self.controller.borrow();
            let surface = controller.surface();
            match document.document_element() {
                Some(root) => (
                    surface.query_all(&root, &selectors.filter_checkbox),
                    surface.query_all(&root, &selectors.tab_toggle),
                ),
                None => (Vec::new(), Vec::new()),
            }
        };

        for (index, checkbox) in checkboxes.into_iter().enumerate() {
            let controller = self.controller.clone();
            self.listen(checkbox.into(), "change", move |event| {
                let checked = input_of(&event).map(|input| input.checked()).unwrap_or(false);
                dispatch(&controller, CatalogEvent::FilterToggled { index, checked });
            })?;
        }

        for tab in tabs {
            let controller = self.controller.clone();
            self.listen(tab.into(), "shown.bs.tab", move |_| {
                dispatch(&controller, CatalogEvent::ViewChanged);
            })?;
        }

        log::info!("目录筛选器已绑定 {} 个事件监听", self.listeners.len());
        Ok(())
    }

    /// 立即按页面当前输入重新筛选
    pub fn refresh(&self) -> Result<JsValue, JsValue> {
        let started = js_sys::Date::now();
        let mut controller = self
            .controller
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("筛选正在进行"))?;
        let outcome = controller.refresh().clone();
        log::debug!("筛选耗时 {:.1}ms", js_sys::Date::now() - started);

        serde_wasm_bindgen::to_value(&outcome)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }

    /// 清空所有筛选条件
    pub fn clear(&self) -> Result<JsValue, JsValue> {
        let mut controller = self
            .controller
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("筛选正在进行"))?;
        let outcome = controller.handle(CatalogEvent::FiltersCleared).cloned();

        serde_wasm_bindgen::to_value(&outcome)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }

    /// 当前价格滑块状态
    pub fn slider_state(&self) -> Result<JsValue, JsValue> {
        let slider = self.controller.borrow().surface().price_slider();
        serde_wasm_bindgen::to_value(&slider)
            .map_err(|e| JsValue::from_str(&format!("序列化滑块失败: {}", e)))
    }
}

impl CatalogFilterJS {
    fn listen<F>(&mut self, target: EventTarget, name: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|_| to_js_error(SurfaceError::Listener(name.to_string())))?;
        self.listeners.push(Listener { target, name, closure });
        Ok(())
    }
}

impl Drop for CatalogFilterJS {
    fn drop(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.name,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
    }
}

fn input_of(event: &Event) -> Option<HtmlInputElement> {
    event
        .target()
        .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
}

// 事件处理器运行期间不会重入；借用失败说明上一次筛选尚未结束
fn dispatch(controller: &SharedController, event: CatalogEvent) {
    match controller.try_borrow_mut() {
        Ok(mut controller) => {
            controller.handle(event);
        }
        Err(_) => log::warn!("筛选正在进行，忽略事件 {:?}", event),
    }
}

fn to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckedFilter;

    fn entries() -> Vec<ProductEntry> {
        vec![
            ProductEntry::new("1", "Acoustic panel", 40.0).with_characteristic("type", "acoustic"),
            ProductEntry::new("2", "Stretch ceiling", 60.0).with_characteristic("type", "stretch"),
            ProductEntry::new("3", "Spot light", 10.0),
        ]
    }

    #[test]
    fn filter_entries_applies_params() {
        let params = FilterParams {
            query: None,
            price_min: None,
            price_max: Some(50.0),
            filters: vec![CheckedFilter {
                category: "type".to_string(),
                value: "acoustic".to_string(),
            }],
        };
        let result = CatalogFilter::filter_entries(&entries(), &params, &FilterConfig::default());
        assert_eq!(result.visible_ids, vec!["1"]);
        assert_eq!(result.total, 1);
    }

    #[test]
    fn filter_entries_respects_lenient_config() {
        let params: FilterParams =
            serde_json::from_str(r#"{"filters":[{"category":"type","value":"acoustic"}]}"#).unwrap();
        let config = FilterConfig::from_json(r#"{"missing_characteristic":"lenient"}"#).unwrap();
        let result = CatalogFilter::filter_entries(&entries(), &params, &config);
        assert_eq!(result.visible_ids, vec!["1", "3"]);
    }

    #[test]
    fn default_params_show_everything() {
        let result =
            CatalogFilter::filter_entries(&entries(), &FilterParams::default(), &FilterConfig::default());
        assert_eq!(result.total, 3);
    }
}
