use catalog_common::Formatter;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;

/// 商品缺少某个受限类别时的处理方式
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingCharacteristic {
    /// 缺少该类别即视为不匹配
    #[default]
    Strict,
    /// 缺少该类别时不做限制
    Lenient,
}

/// 空结果提示的内容
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EmptyStateMessage {
    pub title: String,
    pub hint: String,
}

impl Default for EmptyStateMessage {
    fn default() -> Self {
        Self {
            title: "Товары не найдены".to_string(),
            hint: "Попробуйте изменить критерии поиска или фильтрации".to_string(),
        }
    }
}

/// 页面元素选择器
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Selectors {
    pub search_input_id: String,
    pub price_slider_id: String,
    pub price_fill_id: String,
    pub price_min_label_id: String,
    pub price_max_label_id: String,
    pub reset_price_id: String,
    pub clear_filters_id: String,
    pub filter_checkbox: String,
    pub product_item: String,
    pub product_name: String,
    pub product_description: String,
    pub product_price: String,
    pub characteristic_attr: String,
    pub hidden_class: String,
    pub view_pane: String,
    pub active_view: String,
    pub tab_toggle: String,
    pub empty_state_class: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_input_id: "productSearch".to_string(),
            price_slider_id: "priceSlider".to_string(),
            price_fill_id: "priceRangeFill".to_string(),
            price_min_label_id: "currentPriceMin".to_string(),
            price_max_label_id: "currentPriceMax".to_string(),
            reset_price_id: "resetPriceRange".to_string(),
            clear_filters_id: "clearFilters".to_string(),
            filter_checkbox: "input[type=\"checkbox\"][data-filter]".to_string(),
            product_item: ".product-item".to_string(),
            product_name: ".product-name".to_string(),
            product_description: ".product-description".to_string(),
            product_price: ".product-price".to_string(),
            characteristic_attr: "data-characteristic".to_string(),
            hidden_class: "hidden".to_string(),
            view_pane: ".tab-pane".to_string(),
            active_view: ".tab-pane.active".to_string(),
            tab_toggle: "[data-bs-toggle=\"tab\"]".to_string(),
            empty_state_class: "no-results-message".to_string(),
        }
    }
}

impl Selectors {
    /// 视图标识：优先使用标签页 id；没有 id 时，激活的标签页用激活选择器，
    /// 其余按标签页在文档中的序号区分
    pub fn pane_key(&self, id: Option<&str>, active: bool, index: usize) -> String {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None if active => self.active_view.clone(),
            None => format!("{}:{}", self.view_pane, index),
        }
    }
}

/// 筛选器配置 - 页面以 JSON 形式传入
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FilterConfig {
    /// 表示"不限"的哨兵值
    #[serde(default = "default_sentinel")]
    pub all_sentinel: String,
    /// 缺少受限类别时的处理方式
    #[serde(default)]
    pub missing_characteristic: MissingCharacteristic,
    /// 空结果提示内容
    #[serde(default)]
    pub empty_state: EmptyStateMessage,
    /// 搜索输入的防抖时间（毫秒），0 表示立即筛选
    #[serde(default)]
    pub search_debounce_ms: u32,
    /// 页面元素选择器
    #[serde(default)]
    pub selectors: Selectors,
    /// 价格标签的数字格式
    #[serde(default)]
    pub formatter: Formatter,
}

fn default_sentinel() -> String {
    catalog_common::ALL_SENTINEL.to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            all_sentinel: default_sentinel(),
            missing_characteristic: MissingCharacteristic::default(),
            empty_state: EmptyStateMessage::default(),
            search_debounce_ms: 0,
            selectors: Selectors::default(),
            formatter: Formatter::default(),
        }
    }
}

impl FilterConfig {
    /// 从 JSON 解析配置，空字符串使用默认配置
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: FilterConfig = serde_json::from_str(json)?;
        if config.all_sentinel.trim().is_empty() {
            return Err(ConfigError::EmptySentinel);
        }
        Ok(config)
    }
}

/// 筛选状态 - 每次输入变化时重新构建
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FilterState {
    /// 小写后的搜索词，空表示不限
    pub search_term: String,
    /// 价格下限（包含）
    pub price_min: f64,
    /// 价格上限（包含）
    pub price_max: f64,
    /// 类别 -> 可接受的值
    pub category_filters: HashMap<String, HashSet<String>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            price_min: 0.0,
            price_max: f64::INFINITY,
            category_filters: HashMap::new(),
        }
    }
}

impl FilterState {
    pub fn is_unconstrained(&self) -> bool {
        self.search_term.is_empty()
            && self.price_min <= 0.0
            && self.price_max == f64::INFINITY
            && self.category_filters.is_empty()
    }
}

/// 筛选参数 - JS 直接传入的筛选条件
#[derive(Deserialize, Debug, Default)]
pub struct FilterParams {
    /// 搜索词 (可选)
    #[serde(default)]
    pub query: Option<String>,
    /// 价格下限 (可选, 默认为0)
    #[serde(default)]
    pub price_min: Option<f64>,
    /// 价格上限 (可选, 默认不限)
    #[serde(default)]
    pub price_max: Option<f64>,
    /// 已勾选的类别筛选值
    #[serde(default)]
    pub filters: Vec<CheckedFilter>,
}

/// 一个已勾选的 (类别, 值)
#[derive(Deserialize, Debug, Clone)]
pub struct CheckedFilter {
    pub category: String,
    pub value: String,
}

/// 空结果提示的变化
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyStateChange {
    Shown,
    Removed,
    Unchanged,
}

/// 一次筛选的结果
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FilterOutcome {
    /// 每个条目是否可见，与条目顺序一致
    pub visibility: Vec<bool>,
    /// 可见条目总数
    pub visible: usize,
    /// 隐藏条目总数
    pub hidden: usize,
    /// 当前视图
    pub active_view: Option<String>,
    /// 当前视图中的可见条目数
    pub active_view_visible: usize,
    /// 空结果提示的变化
    pub empty_state: EmptyStateChange,
}

/// 不依赖页面的筛选结果 - 返回给 JS 的可见条目 ID
#[derive(Serialize, Debug)]
pub struct FilterResult {
    pub visible_ids: Vec<String>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_json_uses_defaults() {
        let config = FilterConfig::from_json("  ").unwrap();
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.all_sentinel, "all");
        assert_eq!(config.missing_characteristic, MissingCharacteristic::Strict);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = FilterConfig::from_json(
            r#"{"missing_characteristic":"lenient","selectors":{"search_input_id":"q"}}"#,
        )
        .unwrap();
        assert_eq!(config.missing_characteristic, MissingCharacteristic::Lenient);
        assert_eq!(config.selectors.search_input_id, "q");
        assert_eq!(config.selectors.product_item, ".product-item");
        assert_eq!(config.search_debounce_ms, 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            FilterConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            FilterConfig::from_json(r#"{"all_sentinel":" "}"#),
            Err(ConfigError::EmptySentinel)
        ));
    }

    #[test]
    fn pane_key_falls_back_when_id_missing() {
        let selectors = Selectors::default();
        assert_eq!(selectors.pane_key(Some("lighting"), false, 3), "lighting");
        assert_eq!(selectors.pane_key(None, true, 0), ".tab-pane.active");
        assert_eq!(selectors.pane_key(Some(" "), true, 2), ".tab-pane.active");
        assert_eq!(selectors.pane_key(None, false, 2), ".tab-pane:2");
    }

    #[test]
    fn default_state_is_unconstrained() {
        assert!(FilterState::default().is_unconstrained());
    }
}
