use catalog_common::FilterControl;
use std::collections::{HashMap, HashSet};

use crate::models::{FilterParams, FilterState};
use crate::slider::PriceSlider;

/// 筛选状态构建器
///
/// 汇总搜索词、价格范围和已勾选的类别值，哨兵值不会进入约束集合。
pub struct FilterStateBuilder<'a> {
    sentinel: &'a str,
    search_term: String,
    price_min: f64,
    price_max: f64,
    category_filters: HashMap<String, HashSet<String>>,
}

impl<'a> FilterStateBuilder<'a> {
    /// 创建新的构建器
    pub fn new(sentinel: &'a str) -> Self {
        Self {
            sentinel,
            search_term: String::new(),
            price_min: 0.0,
            price_max: f64::INFINITY,
            category_filters: HashMap::new(),
        }
    }

    /// 设置搜索词
    pub fn search(mut self, query: &str) -> Self {
        self.search_term = query.to_lowercase();
        self
    }

    /// 设置价格范围，非法值退化为默认值
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min.filter(|v| v.is_finite()).unwrap_or(0.0);
        self.price_max = max.filter(|v| !v.is_nan()).unwrap_or(f64::INFINITY);
        self
    }

    /// 使用滑块的下限和当前值作为价格范围
    pub fn slider(self, slider: Option<&PriceSlider>) -> Self {
        match slider {
            Some(slider) => self.price_range(Some(slider.min()), Some(slider.value())),
            None => self.price_range(None, None),
        }
    }

    /// 接受某个类别的值
    pub fn accept(mut self, category: &str, value: &str) -> Self {
        let value = value.trim();
        if value == self.sentinel {
            return self;
        }
        self.category_filters
            .entry(category.to_string())
            .or_default()
            .insert(value.to_string());
        self
    }

    /// 接受所有已勾选的控件
    pub fn controls<'c, I>(self, controls: I) -> Self
    where
        I: IntoIterator<Item = &'c FilterControl>,
    {
        controls
            .into_iter()
            .filter(|control| control.checked)
            .fold(self, |builder, control| {
                builder.accept(&control.category, &control.value)
            })
    }

    /// 从 JS 传入的参数构建
    pub fn params(self, params: &FilterParams) -> Self {
        let builder = self
            .search(params.query.as_deref().unwrap_or(""))
            .price_range(params.price_min, params.price_max);

        params.filters.iter().fold(builder, |builder, filter| {
            builder.accept(&filter.category, &filter.value)
        })
    }

    /// 构建筛选状态
    pub fn build(self) -> FilterState {
        FilterState {
            search_term: self.search_term,
            price_min: self.price_min,
            price_max: self.price_max,
            category_filters: self.category_filters,
        }
    }
}
