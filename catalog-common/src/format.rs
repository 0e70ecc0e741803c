use serde::{Deserialize, Serialize};

/// 数字与货币格式化服务
///
/// 由调用方显式构造并传递给需要格式化能力的组件，默认使用 en-US 习惯。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Formatter {
    /// 货币符号，放在金额之前
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// 千位分隔符
    #[serde(default = "default_group_separator")]
    pub group_separator: char,
    /// 小数点
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_group_separator() -> char {
    ','
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            group_separator: default_group_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl Formatter {
    /// 货币格式：固定两位小数，带千位分隔，例如 "$1,234.50"
    pub fn format_currency(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{}{}", self.currency_symbol, non_finite(amount));
        }

        let fixed = format!("{:.2}", amount.abs());
        let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

        format!(
            "{}{}{}{}{}",
            sign,
            self.currency_symbol,
            self.group_digits(integer),
            self.decimal_separator,
            fraction
        )
    }

    /// 普通数字格式：最多三位小数，去掉末尾的 0，例如 "1,234.5"
    pub fn format_number(&self, num: f64) -> String {
        if !num.is_finite() {
            return non_finite(num).to_string();
        }

        let fixed = format!("{:.3}", num.abs());
        let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let fraction = fraction.trim_end_matches('0');
        let is_zero = integer == "0" && fraction.is_empty();
        let sign = if num < 0.0 && !is_zero { "-" } else { "" };

        let mut out = format!("{}{}", sign, self.group_digits(integer));
        if !fraction.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(fraction);
        }
        out
    }

    // 从右往左每三位插入分隔符
    fn group_digits(&self, digits: &str) -> String {
        let len = digits.len();
        let mut grouped = String::with_capacity(len + len / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(ch);
        }
        grouped
    }
}

fn non_finite(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "∞"
    } else {
        "-∞"
    }
}

/// 提示框类型
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Danger => "danger",
        }
    }

    /// 按名称解析，未知名称返回 `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "success" => Some(AlertKind::Success),
            "info" => Some(AlertKind::Info),
            "warning" => Some(AlertKind::Warning),
            "danger" => Some(AlertKind::Danger),
            _ => None,
        }
    }
}

/// 页面顶部的可关闭提示框
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    /// 自动关闭前的停留时间
    pub const AUTO_DISMISS_MS: u32 = 5_000;

    pub fn new(message: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, AlertKind::Success)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(message, AlertKind::Danger)
    }

    /// 请求失败时的通用提示
    pub fn request_failed() -> Self {
        Self::danger("An error occurred. Please try again.")
    }

    pub fn css_class(&self) -> String {
        format!("alert alert-{} alert-dismissible fade show", self.kind.as_str())
    }

    /// 提示框内部的 HTML，消息内容会被转义
    pub fn inner_html(&self) -> String {
        format!(
            "{}<button type=\"button\" class=\"btn-close\" data-bs-dismiss=\"alert\"></button>",
            escape_html(&self.message)
        )
    }
}

/// 转义插入 HTML 的文本
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
