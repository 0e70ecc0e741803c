use catalog_common::{parse_number, Alert, AlertKind, Formatter};
use gloo_timers::callback::Timeout;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// 初始化错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

// 提示框插入的位置
const ALERT_CONTAINER: &str = ".main-content";

// 下拉选项文本中的单价，例如 "Matte white - $12.50/m²"
static OPTION_PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([0-9]+\.?[0-9]*)").unwrap());

// 计算器错误，消息直接展示给用户
#[derive(Debug, Error, PartialEq)]
pub enum CalculatorError {
    #[error("Please fill all fields correctly.")]
    InvalidInput,
    #[error("Selected product has no price.")]
    MissingPrice,
    #[error("Calculation failed. Please check inputs.")]
    Rejected { reason: Option<String> },
    #[error("An error occurred. Please try again.")]
    MalformedResponse(String),
}

impl CalculatorError {
    pub fn alert(&self) -> Alert {
        match self {
            CalculatorError::MalformedResponse(_) => Alert::request_failed(),
            _ => Alert::danger(self.to_string()),
        }
    }
}

// 表单输入
#[derive(Clone, Debug, PartialEq)]
pub struct CalculatorInput {
    pub width: f64,
    pub length: f64,
    pub product_id: String,
}

impl CalculatorInput {
    // 从表单原始值构建，无法解析的尺寸按 0 处理
    pub fn from_form(width: &str, length: &str, product_id: &str) -> Self {
        Self {
            width: parse_number(width).unwrap_or(0.0),
            length: parse_number(length).unwrap_or(0.0),
            product_id: product_id.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CalculatorError> {
        if self.width > 0.0 && self.length > 0.0 && !self.product_id.is_empty() {
            Ok(())
        } else {
            Err(CalculatorError::InvalidInput)
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

// 计算结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub area: f64,
    pub price_per_sqm: f64,
    pub cost: f64,
    pub product_name: String,
}

impl Estimate {
    // 根据下拉选项文本在本地估算，用于输入过程中的实时展示
    pub fn from_option(input: &CalculatorInput, option_text: &str) -> Result<Self, CalculatorError> {
        input.validate()?;

        let price_per_sqm = OPTION_PRICE
            .captures(option_text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_number(m.as_str()))
            .ok_or(CalculatorError::MissingPrice)?;

        let product_name = option_text
            .split(" - ")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let area = input.area();
        Ok(Self {
            area,
            price_per_sqm,
            cost: area * price_per_sqm,
            product_name,
        })
    }

    pub fn view(&self, formatter: &Formatter) -> ResultView {
        ResultView {
            area: format!("{:.2} m²", self.area),
            price_per_sqm: formatter.format_currency(self.price_per_sqm),
            total_cost: formatter.format_currency(self.cost),
            product_name: self.product_name.clone(),
        }
    }
}

// 服务端返回的 JSON
#[derive(Debug, Deserialize)]
struct CalculationResponse {
    success: bool,
    #[serde(default)]
    area: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    price_per_sqm: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

// 解析服务端的计算结果
pub fn decode_response(json: &str) -> Result<Estimate, CalculatorError> {
    let response: CalculationResponse = serde_json::from_str(json)
        .map_err(|e| CalculatorError::MalformedResponse(e.to_string()))?;

    if !response.success {
        if let Some(reason) = response.error.as_deref() {
            log::warn!("计算请求被拒绝: {}", reason);
        }
        return Err(CalculatorError::Rejected {
            reason: response.error,
        });
    }

    match (response.area, response.cost, response.price_per_sqm) {
        (Some(area), Some(cost), Some(price_per_sqm)) => Ok(Estimate {
            area,
            price_per_sqm,
            cost,
            product_name: response.product_name.unwrap_or_default(),
        }),
        _ => Err(CalculatorError::MalformedResponse(
            "缺少 area/cost/price_per_sqm 字段".to_string(),
        )),
    }
}

// 结果区域各标签的文本
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultView {
    pub area: String,
    pub price_per_sqm: String,
    pub total_cost: String,
    pub product_name: String,
}

// 计算器JS接口
#[wasm_bindgen]
pub struct CalculatorJS {
    formatter: Formatter,
}

#[wasm_bindgen]
impl CalculatorJS {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CalculatorJS {
        CalculatorJS {
            formatter: Formatter::default(),
        }
    }

    // 校验表单，失败时返回提示文本
    pub fn validate(&self, width: &str, length: &str, product_id: &str) -> Result<(), JsValue> {
        CalculatorInput::from_form(width, length, product_id)
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // 实时估算，`product_id` 为选中项的值，输入不完整时返回 null
    pub fn live_estimate(
        &self,
        width: &str,
        length: &str,
        product_id: &str,
        option_text: &str,
    ) -> Result<JsValue, JsValue> {
        match self.live_view(width, length, product_id, option_text) {
            Some(view) => serde_wasm_bindgen::to_value(&view)
                .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    // 把服务端响应转换为结果标签文本，失败时在页面顶部显示提示
    pub fn render_response(&self, json: &str) -> Result<JsValue, JsValue> {
        let estimate = decode_response(json).map_err(|e| {
            if let Err(err) = insert_alert(&e.alert()) {
                log::warn!("无法显示提示: {:?}", err);
            }
            JsValue::from_str(&e.to_string())
        })?;
        serde_wasm_bindgen::to_value(&estimate.view(&self.formatter))
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }

    // 在页面顶部显示提示，5 秒后自动移除；未知类型按 success 处理
    pub fn show_alert(&self, message: &str, kind: &str) -> Result<(), JsValue> {
        let kind = AlertKind::from_name(kind).unwrap_or(AlertKind::Success);
        insert_alert(&Alert::new(message, kind))
    }
}

impl CalculatorJS {
    fn live_view(&self, width: &str, length: &str, product_id: &str, option_text: &str) -> Option<ResultView> {
        let input = CalculatorInput::from_form(width, length, product_id);
        Estimate::from_option(&input, option_text)
            .ok()
            .map(|estimate| estimate.view(&self.formatter))
    }
}

// 插入到内容区顶部，并在停留时间结束后移除
fn insert_alert(alert: &Alert) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("页面不可用"))?;
    let Some(container) = document.query_selector(ALERT_CONTAINER)? else {
        return Ok(());
    };

    let element = document.create_element("div")?;
    element.set_class_name(&alert.css_class());
    element.set_inner_html(&alert.inner_html());
    container.insert_before(&element, container.first_child().as_ref())?;

    Timeout::new(Alert::AUTO_DISMISS_MS, move || element.remove()).forget();
    Ok(())
}

impl Default for CalculatorJS {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_requires_positive_dimensions_and_product() {
        assert!(CalculatorInput::from_form("3", "4", "7").validate().is_ok());
        assert_eq!(
            CalculatorInput::from_form("0", "4", "7").validate(),
            Err(CalculatorError::InvalidInput)
        );
        assert_eq!(
            CalculatorInput::from_form("3", "abc", "7").validate(),
            Err(CalculatorError::InvalidInput)
        );
        assert_eq!(
            CalculatorInput::from_form("3", "4", " ").validate(),
            Err(CalculatorError::InvalidInput)
        );
    }

    #[test]
    fn live_estimate_reads_price_from_option_text() {
        let input = CalculatorInput::from_form("3.5", "4", "matte");
        let estimate = Estimate::from_option(&input, "Matte white - $12.50/m²").unwrap();

        assert_eq!(estimate.area, 14.0);
        assert_eq!(estimate.price_per_sqm, 12.5);
        assert_eq!(estimate.cost, 175.0);
        assert_eq!(estimate.product_name, "Matte white");
    }

    #[test]
    fn live_view_requires_selected_product() {
        let calculator = CalculatorJS::new();
        let option = "Matte white - $12.50/m²";

        let view = calculator.live_view("2", "5", "matte-white", option).unwrap();
        assert_eq!(view.total_cost, "$125.00");
        assert_eq!(view.product_name, "Matte white");

        assert!(calculator.live_view("2", "5", "", option).is_none());
        assert!(calculator.live_view("2", "", "matte-white", option).is_none());
    }

    #[test]
    fn option_without_price_cannot_be_estimated() {
        let input = CalculatorInput::from_form("3", "4", "x");
        assert_eq!(
            Estimate::from_option(&input, "Custom - price on request"),
            Err(CalculatorError::MissingPrice)
        );
    }

    #[test]
    fn successful_response_is_decoded() {
        let json = r#"{"success":true,"area":12.0,"cost":1500.0,"product_name":"Glossy","price_per_sqm":125.0}"#;
        let estimate = decode_response(json).unwrap();
        let view = estimate.view(&Formatter::default());

        assert_eq!(view.area, "12.00 m²");
        assert_eq!(view.price_per_sqm, "$125.00");
        assert_eq!(view.total_cost, "$1,500.00");
        assert_eq!(view.product_name, "Glossy");
    }

    #[test]
    fn rejected_and_malformed_responses() {
        assert_eq!(
            decode_response(r#"{"success":false,"error":"Invalid input values"}"#),
            Err(CalculatorError::Rejected {
                reason: Some("Invalid input values".to_string())
            })
        );
        assert!(matches!(
            decode_response("<html>"),
            Err(CalculatorError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_response(r#"{"success":true,"area":1.0}"#),
            Err(CalculatorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_messages_become_danger_alerts() {
        let alert = CalculatorError::Rejected { reason: None }.alert();
        assert_eq!(alert.message, "Calculation failed. Please check inputs.");
        assert_eq!(alert.css_class(), "alert alert-danger alert-dismissible fade show");

        let malformed = CalculatorError::MalformedResponse("eof".to_string()).alert();
        assert_eq!(malformed, Alert::request_failed());
    }
}
