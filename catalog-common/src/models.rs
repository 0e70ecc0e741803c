use serde::{Deserialize, Serialize};

/// 哨兵筛选值 - 表示该类别不做任何限制
pub const ALL_SENTINEL: &str = "all";

/// 商品特征 - 附加在商品上的 (类别, 值) 对
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Characteristic {
    /// 特征类别，例如 "color"
    pub category: String,
    /// 特征值，例如 "red"
    pub value: String,
}

impl Characteristic {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into().trim().to_string(),
        }
    }
}

/// 商品条目 - 目录视图中渲染的一个商品
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProductEntry {
    /// 商品标识符
    pub id: String,
    /// 商品名称
    pub name: String,
    /// 商品描述
    #[serde(default)]
    pub description: String,
    /// 商品价格，无法解析时为 0
    #[serde(default)]
    pub price: f64,
    /// 商品特征列表
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    /// 商品所在视图（标签页）的标识
    #[serde(default)]
    pub view: Option<String>,
}

impl ProductEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            characteristics: Vec::new(),
            view: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_characteristic(mut self, category: &str, value: &str) -> Self {
        self.characteristics.push(Characteristic::new(category, value));
        self
    }

    pub fn in_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// 可搜索文本：名称、描述和所有特征值，小写后以空格连接
    pub fn searchable_text(&self) -> String {
        let characteristics = self
            .characteristics
            .iter()
            .map(|c| c.value.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        format!("{} {} {}", self.name, self.description, characteristics).to_lowercase()
    }

    /// 某个类别下的所有特征值
    pub fn values_for<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.characteristics
            .iter()
            .filter(move |c| c.category == category)
            .map(|c| c.value.as_str())
    }

    pub fn belongs_to(&self, view: &str) -> bool {
        self.view.as_deref() == Some(view)
    }
}

/// 筛选控件 - 页面上带类别标记的复选框
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FilterControl {
    pub category: String,
    pub value: String,
    #[serde(default)]
    pub checked: bool,
}

impl FilterControl {
    pub fn new(category: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
            checked,
        }
    }

    pub fn is_sentinel(&self, sentinel: &str) -> bool {
        self.value.trim() == sentinel
    }
}
