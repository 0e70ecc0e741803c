use catalog_common::{parse_number, Formatter};
use serde::Serialize;

/// 价格滑块状态
///
/// 下限固定为滑块的 `min`，滑块当前值即价格上限。
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct PriceSlider {
    min: f64,
    max: f64,
    value: f64,
}

impl PriceSlider {
    /// 构建滑块，非法数值退化为宽松的默认值：下限 0，上限不限
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        let min = if min.is_finite() { min } else { 0.0 };
        let max = if max.is_nan() { f64::INFINITY } else { max.max(min) };
        let mut slider = Self { min, max, value: max };
        slider.set_value(value);
        slider
    }

    /// 从页面控件的原始属性文本构建
    pub fn from_raw(min: &str, max: &str, value: &str) -> Self {
        Self::new(
            parse_number(min).unwrap_or(0.0),
            parse_number(max).unwrap_or(f64::INFINITY),
            parse_number(value).unwrap_or(f64::NAN),
        )
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// 设置当前值，超出范围时截断，NaN 回到上限
    pub fn set_value(&mut self, value: f64) {
        self.value = if value.is_nan() {
            self.max
        } else {
            value.clamp(self.min, self.max)
        };
    }

    pub fn reset(&mut self) {
        self.value = self.max;
    }

    pub fn is_reset(&self) -> bool {
        self.value == self.max
    }

    /// 填充条宽度百分比
    pub fn fill_percentage(&self) -> f64 {
        let span = self.max - self.min;
        if !span.is_finite() || span <= 0.0 {
            return 100.0;
        }
        (self.value - self.min) / span * 100.0
    }

    /// 下限标签，取整后按数字格式输出
    pub fn min_label(&self, formatter: &Formatter) -> String {
        formatter.format_number(self.min.round())
    }

    pub fn value_label(&self, formatter: &Formatter) -> String {
        formatter.format_number(self.value.round())
    }
}
