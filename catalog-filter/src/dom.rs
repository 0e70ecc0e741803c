use std::cell::RefCell;

use catalog_common::{escape_html, parse_price, Characteristic, FilterControl, Formatter, ProductEntry};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::error::SurfaceError;
use crate::models::{EmptyStateMessage, Selectors};
use crate::slider::PriceSlider;
use crate::surface::RenderingSurface;

/// 元素缓存 - 读取时查询一次，之后按索引写回时复用
///
/// 索引越界时重新加载一次。
struct ElementCache<T> {
    items: RefCell<Vec<T>>,
}

impl<T: Clone> ElementCache<T> {
    fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
        }
    }

    fn store(&self, items: Vec<T>) -> Vec<T> {
        *self.items.borrow_mut() = items.clone();
        items
    }

    fn get<F>(&self, index: usize, reload: F) -> Option<T>
    where
        F: FnOnce() -> Vec<T>,
    {
        if index >= self.items.borrow().len() {
            *self.items.borrow_mut() = reload();
        }
        self.items.borrow().get(index).cloned()
    }
}

/// 浏览器页面渲染面 - 通过 web-sys 读写目录页面
pub struct DomSurface {
    document: Document,
    selectors: Selectors,
    formatter: Formatter,
    items: ElementCache<Element>,
    checkboxes: ElementCache<HtmlInputElement>,
}

impl DomSurface {
    pub fn new(selectors: Selectors, formatter: Formatter) -> Result<Self, SurfaceError> {
        let window = web_sys::window().ok_or(SurfaceError::NoWindow)?;
        let document = window.document().ok_or(SurfaceError::NoDocument)?;
        Ok(Self {
            document,
            selectors,
            formatter,
            items: ElementCache::new(),
            checkboxes: ElementCache::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    fn input_by_id(&self, id: &str) -> Option<HtmlInputElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
    }

    /// 查询所有匹配的元素，选择器无效时记录日志并返回空列表
    pub fn query_all(&self, root: &Element, selector: &str) -> Vec<Element> {
        match root.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.item(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(_) => {
                log::warn!("{}", SurfaceError::Selector(selector.to_string()));
                Vec::new()
            }
        }
    }

    fn document_all(&self, selector: &str) -> Vec<Element> {
        match self.document.document_element() {
            Some(root) => self.query_all(&root, selector),
            None => Vec::new(),
        }
    }

    fn query_checkboxes(&self) -> Vec<HtmlInputElement> {
        self.document_all(&self.selectors.filter_checkbox)
            .into_iter()
            .filter_map(|element| element.dyn_into::<HtmlInputElement>().ok())
            .collect()
    }

    fn query_items(&self) -> Vec<Element> {
        self.document_all(&self.selectors.product_item)
    }

    fn child_text(&self, item: &Element, selector: &str) -> Option<String> {
        item.query_selector(selector)
            .ok()
            .flatten()
            .and_then(|element| element.text_content())
    }

    fn read_entry(&self, index: usize, item: &Element) -> ProductEntry {
        let attr = self.selectors.characteristic_attr.as_str();
        let characteristics = self
            .query_all(item, &format!("[{}]", attr))
            .iter()
            .filter_map(|element| {
                let category = element.get_attribute(attr)?;
                let value = element.text_content().unwrap_or_default();
                Some(Characteristic::new(category, value))
            })
            .collect();

        let view = item
            .closest(&self.selectors.view_pane)
            .ok()
            .flatten()
            .map(|pane| self.pane_key(&pane));

        ProductEntry {
            id: item
                .get_attribute("data-product-id")
                .unwrap_or_else(|| index.to_string()),
            name: self.child_text(item, &self.selectors.product_name).unwrap_or_default(),
            description: self
                .child_text(item, &self.selectors.product_description)
                .unwrap_or_default(),
            price: self
                .child_text(item, &self.selectors.product_price)
                .map(|text| parse_price(&text))
                .unwrap_or(0.0),
            characteristics,
            view,
        }
    }

    /// 标签页的视图标识，与 [`Selectors::pane_key`] 一致
    fn pane_key(&self, pane: &Element) -> String {
        let id = pane.id();
        if !id.trim().is_empty() {
            return id;
        }
        let active = pane.matches(&self.selectors.active_view).unwrap_or(false);
        let index = if active {
            0
        } else {
            self.document_all(&self.selectors.view_pane)
                .iter()
                .position(|other| other.is_same_node(Some(pane)))
                .unwrap_or(0)
        };
        self.selectors.pane_key(None, active, index)
    }

    /// 按视图标识查找标签页，找不到时退回当前激活的标签页
    fn pane(&self, view: &str) -> Option<Element> {
        self.document
            .get_element_by_id(view)
            .or_else(|| self.document.query_selector(&self.selectors.active_view).ok().flatten())
    }

    fn empty_state_in(&self, pane: &Element) -> Option<Element> {
        pane.query_selector(&format!(".{}", self.selectors.empty_state_class))
            .ok()
            .flatten()
    }

    /// 更新滑块旁的填充条和价格标签
    pub fn render_slider(&self, slider: &PriceSlider) {
        let formatter = &self.formatter;
        if let Some(fill) = self
            .document
            .get_element_by_id(&self.selectors.price_fill_id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        {
            let width = format!("{}%", slider.fill_percentage());
            if fill.style().set_property("width", &width).is_err() {
                log::warn!("无法设置填充条宽度");
            }
        }
        if let Some(label) = self.document.get_element_by_id(&self.selectors.price_min_label_id) {
            label.set_text_content(Some(&slider.min_label(formatter)));
        }
        if let Some(label) = self.document.get_element_by_id(&self.selectors.price_max_label_id) {
            label.set_text_content(Some(&slider.value_label(formatter)));
        }
    }
}

impl RenderingSurface for DomSurface {
    fn search_query(&self) -> String {
        self.input_by_id(&self.selectors.search_input_id)
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn set_search_query(&mut self, query: &str) {
        if let Some(input) = self.input_by_id(&self.selectors.search_input_id) {
            if input.value() != query {
                input.set_value(query);
            }
        }
    }

    fn price_slider(&self) -> Option<PriceSlider> {
        self.input_by_id(&self.selectors.price_slider_id)
            .map(|input| PriceSlider::from_raw(&input.min(), &input.max(), &input.value()))
    }

    fn set_price_value(&mut self, value: f64) {
        if let Some(input) = self.input_by_id(&self.selectors.price_slider_id) {
            let mut slider = PriceSlider::from_raw(&input.min(), &input.max(), &input.value());
            slider.set_value(value);
            if slider.value().is_finite() {
                input.set_value(&slider.value().to_string());
            }
        }
    }

    fn filter_controls(&self) -> Vec<FilterControl> {
        self.checkboxes
            .store(self.query_checkboxes())
            .iter()
            .map(|input| {
                FilterControl::new(
                    input.get_attribute("data-filter").unwrap_or_default(),
                    input.value(),
                    input.checked(),
                )
            })
            .collect()
    }

    fn set_filter_checked(&mut self, index: usize, checked: bool) {
        if let Some(input) = self.checkboxes.get(index, || self.query_checkboxes()) {
            input.set_checked(checked);
        }
    }

    fn entries(&self) -> Vec<ProductEntry> {
        self.items
            .store(self.query_items())
            .iter()
            .enumerate()
            .map(|(index, item)| self.read_entry(index, item))
            .collect()
    }

    fn set_entry_visible(&mut self, index: usize, visible: bool) {
        if let Some(item) = self.items.get(index, || self.query_items()) {
            let classes = item.class_list();
            let result = if visible {
                classes.remove_1(&self.selectors.hidden_class)
            } else {
                classes.add_1(&self.selectors.hidden_class)
            };
            if result.is_err() {
                log::warn!("无法更新条目 {} 的可见性", index);
            }
        }
    }

    fn active_view(&self) -> Option<String> {
        let pane = self.document.query_selector(&self.selectors.active_view).ok().flatten()?;
        Some(self.pane_key(&pane))
    }

    fn has_empty_state(&self, view: &str) -> bool {
        self.pane(view)
            .and_then(|pane| self.empty_state_in(&pane))
            .is_some()
    }

    fn show_empty_state(&mut self, view: &str, message: &EmptyStateMessage) {
        let Some(pane) = self.pane(view) else {
            return;
        };
        let element = match self.document.create_element("div") {
            Ok(element) => element,
            Err(_) => {
                log::warn!("无法创建空结果提示元素");
                return;
            }
        };
        element.set_class_name(&format!("{} text-center py-5", self.selectors.empty_state_class));
        element.set_inner_html(&format!(
            "<i class=\"fas fa-search fa-3x text-muted mb-3\"></i>\
             <h5 class=\"text-muted\">{}</h5>\
             <p class=\"text-muted\">{}</p>",
            escape_html(&message.title),
            escape_html(&message.hint)
        ));
        if pane.append_child(&element).is_err() {
            log::warn!("无法插入空结果提示");
        }
    }

    fn remove_empty_state(&mut self, view: &str) {
        if let Some(message) = self.pane(view).and_then(|pane| self.empty_state_in(&pane)) {
            message.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn cache_reuses_stored_items_for_writes() {
        let cache = ElementCache::new();
        let reloads = Cell::new(0);
        let reload = || {
            reloads.set(reloads.get() + 1);
            vec!["a".to_string(), "b".to_string()]
        };

        assert_eq!(cache.store(reload()).len(), 2);
        for index in 0..2 {
            assert!(cache.get(index, reload).is_some());
        }
        assert_eq!(reloads.get(), 1);
    }

    #[test]
    fn cache_reloads_once_when_index_is_out_of_range() {
        let cache: ElementCache<u32> = ElementCache::new();
        let reloads = Cell::new(0);
        let reload = || {
            reloads.set(reloads.get() + 1);
            vec![7, 8, 9]
        };

        assert_eq!(cache.get(2, reload), Some(9));
        assert_eq!(cache.get(1, reload), Some(8));
        assert_eq!(cache.get(5, reload), None);
        assert_eq!(reloads.get(), 2);
    }
}
