use catalog_common::{FilterControl, ProductEntry};
use std::collections::HashMap;

use crate::models::EmptyStateMessage;
use crate::slider::PriceSlider;

/// 渲染面 - 筛选引擎读写页面状态的唯一入口
///
/// 条目按索引寻址，索引与 [`RenderingSurface::entries`] 的顺序一致。
pub trait RenderingSurface {
    /// 当前搜索框内容
    fn search_query(&self) -> String;
    fn set_search_query(&mut self, query: &str);

    /// 价格滑块，不存在时返回 `None`
    fn price_slider(&self) -> Option<PriceSlider>;
    fn set_price_value(&mut self, value: f64);

    /// 所有类别筛选控件（包含未勾选的）
    fn filter_controls(&self) -> Vec<FilterControl>;
    fn set_filter_checked(&mut self, index: usize, checked: bool);

    /// 当前渲染的所有商品条目
    fn entries(&self) -> Vec<ProductEntry>;
    fn set_entry_visible(&mut self, index: usize, visible: bool);

    /// 当前激活的视图
    fn active_view(&self) -> Option<String>;

    fn has_empty_state(&self, view: &str) -> bool;
    fn show_empty_state(&mut self, view: &str, message: &EmptyStateMessage);
    fn remove_empty_state(&mut self, view: &str);
}

/// 内存渲染面 - 用于测试和命令行工具
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    search_query: String,
    slider: Option<PriceSlider>,
    controls: Vec<FilterControl>,
    entries: Vec<ProductEntry>,
    visible: Vec<bool>,
    active_view: Option<String>,
    empty_states: HashMap<String, EmptyStateMessage>,
    empty_state_log: Vec<(String, bool)>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ProductEntry) -> Self {
        self.push_entry(entry);
        self
    }

    pub fn with_slider(mut self, slider: PriceSlider) -> Self {
        self.slider = Some(slider);
        self
    }

    pub fn with_control(mut self, category: &str, value: &str, checked: bool) -> Self {
        self.push_control(FilterControl::new(category, value, checked));
        self
    }

    pub fn with_active_view(mut self, view: &str) -> Self {
        self.active_view = Some(view.to_string());
        self
    }

    pub fn push_entry(&mut self, entry: ProductEntry) {
        self.entries.push(entry);
        self.visible.push(true);
    }

    pub fn push_control(&mut self, control: FilterControl) {
        self.controls.push(control);
    }

    pub fn set_slider(&mut self, slider: Option<PriceSlider>) {
        self.slider = slider;
    }

    pub fn set_active_view(&mut self, view: Option<&str>) {
        self.active_view = view.map(str::to_string);
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    /// 可见条目的 ID
    pub fn visible_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .zip(&self.visible)
            .filter(|(_, visible)| **visible)
            .map(|(entry, _)| entry.id.as_str())
            .collect()
    }

    pub fn empty_state(&self, view: &str) -> Option<&EmptyStateMessage> {
        self.empty_states.get(view)
    }

    /// 空结果提示的显示/移除记录，按发生顺序
    pub fn empty_state_log(&self) -> &[(String, bool)] {
        &self.empty_state_log
    }

    pub fn controls(&self) -> &[FilterControl] {
        &self.controls
    }
}

impl RenderingSurface for MemorySurface {
    fn search_query(&self) -> String {
        self.search_query.clone()
    }

    fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    fn price_slider(&self) -> Option<PriceSlider> {
        self.slider
    }

    fn set_price_value(&mut self, value: f64) {
        if let Some(slider) = self.slider.as_mut() {
            slider.set_value(value);
        }
    }

    fn filter_controls(&self) -> Vec<FilterControl> {
        self.controls.clone()
    }

    fn set_filter_checked(&mut self, index: usize, checked: bool) {
        if let Some(control) = self.controls.get_mut(index) {
            control.checked = checked;
        }
    }

    fn entries(&self) -> Vec<ProductEntry> {
        self.entries.clone()
    }

    fn set_entry_visible(&mut self, index: usize, visible: bool) {
        if let Some(flag) = self.visible.get_mut(index) {
            *flag = visible;
        }
    }

    fn active_view(&self) -> Option<String> {
        self.active_view.clone()
    }

    fn has_empty_state(&self, view: &str) -> bool {
        self.empty_states.contains_key(view)
    }

    fn show_empty_state(&mut self, view: &str, message: &EmptyStateMessage) {
        self.empty_states.insert(view.to_string(), message.clone());
        self.empty_state_log.push((view.to_string(), true));
    }

    fn remove_empty_state(&mut self, view: &str) {
        if self.empty_states.remove(view).is_some() {
            self.empty_state_log.push((view.to_string(), false));
        }
    }
}
