use once_cell::sync::Lazy;
use regex::Regex;

/// 价格文本中除数字和小数点以外的字符
static PRICE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.]").unwrap());

/// 数字前缀，语义与浏览器的 parseFloat 一致
static NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?").unwrap());

/// 解析数字文本，只取开头的有效数字部分
///
/// 无法解析或结果不是有限数时返回 `None`。
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let matched = NUMERIC_PREFIX.find(text)?;

    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// 解析展示用的价格文本，例如 "$1,250.00 / m²"
///
/// 去掉货币符号、分隔符等字符后再解析，失败时按 0 处理。
pub fn parse_price(text: &str) -> f64 {
    let cleaned = PRICE_NOISE.replace_all(text, "");

    match parse_number(&cleaned) {
        Some(price) => price,
        None => {
            if !text.trim().is_empty() {
                log::warn!("无法解析价格文本 {:?}，按 0 处理", text);
            }
            0.0
        }
    }
}
