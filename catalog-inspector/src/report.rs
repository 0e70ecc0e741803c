use std::fs;
use std::path::{Path, PathBuf};

use catalog_common::{parse_number, FilterControl};
use catalog_filter::{FilterEngine, FilterOutcome, MemorySurface, PriceSlider, RenderingSurface};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::InspectError;
use crate::html::PageParser;

/// 命令行给出的筛选条件，覆盖页面上的初始状态
#[derive(Clone, Debug, Default)]
pub struct InspectOptions {
    pub query: Option<String>,
    pub max_price: Option<f64>,
    pub filters: Vec<(String, String)>,
}

impl InspectOptions {
    /// 解析 `类别=值` 形式的筛选参数
    pub fn parse_filter(arg: &str) -> Result<(String, String), InspectError> {
        match arg.split_once('=') {
            Some((category, value)) if !category.trim().is_empty() && !value.trim().is_empty() => {
                Ok((category.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(InspectError::FilterArg(arg.to_string())),
        }
    }

    pub fn parse_price(arg: &str) -> Result<f64, InspectError> {
        parse_number(arg)
            .filter(|price| *price >= 0.0)
            .ok_or_else(|| InspectError::PriceArg(arg.to_string()))
    }

    /// 把条件写入渲染面，相当于用户在页面上操作
    pub fn apply_to(&self, surface: &mut MemorySurface) {
        if let Some(query) = &self.query {
            surface.set_search_query(query);
        }

        if let Some(max_price) = self.max_price {
            if surface.price_slider().is_some() {
                surface.set_price_value(max_price);
            } else {
                surface.set_slider(Some(PriceSlider::new(0.0, f64::INFINITY, max_price)));
            }
        }

        for (category, value) in &self.filters {
            let existing = surface
                .filter_controls()
                .iter()
                .position(|c| &c.category == category && &c.value == value);
            match existing {
                Some(index) => surface.set_filter_checked(index, true),
                None => surface.push_control(FilterControl::new(category.as_str(), value.as_str(), true)),
            }
        }
    }
}

/// 单个条目的检查结果
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub view: Option<String>,
    pub visible: bool,
}

/// 单个页面的检查结果
#[derive(Serialize, Debug, Clone)]
pub struct PageReport {
    pub path: String,
    pub entries: Vec<EntryReport>,
    pub outcome: FilterOutcome,
    /// 当前视图是否显示空结果提示
    pub empty_state_shown: bool,
}

/// 解析页面并按条件筛选
pub fn inspect_html(
    path: &Path,
    html: &str,
    engine: &FilterEngine,
    options: &InspectOptions,
) -> Result<PageReport, InspectError> {
    let mut surface = PageParser::new(&engine.config().selectors).parse(html)?;
    options.apply_to(&mut surface);

    let outcome = engine.apply(&mut surface);
    let empty_state_shown = outcome
        .active_view
        .as_deref()
        .map(|view| surface.empty_state(view).is_some())
        .unwrap_or(false);

    let entries = surface
        .entries()
        .into_iter()
        .zip(outcome.visibility.iter())
        .map(|(entry, visible)| EntryReport {
            id: entry.id,
            name: entry.name,
            price: entry.price,
            view: entry.view,
            visible: *visible,
        })
        .collect();

    Ok(PageReport {
        path: path.display().to_string(),
        entries,
        outcome,
        empty_state_shown,
    })
}

pub fn inspect_file(
    path: &Path,
    engine: &FilterEngine,
    options: &InspectOptions,
) -> Result<PageReport, InspectError> {
    let html = fs::read_to_string(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    inspect_html(path, &html, engine, options)
}

/// 收集路径下的所有 HTML 页面，单个文件直接返回
pub fn collect_pages(path: &Path) -> Result<Vec<PathBuf>, InspectError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut pages = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().map_or(false, |ext| ext == "html") {
            pages.push(entry.into_path());
        }
    }

    if pages.is_empty() {
        return Err(InspectError::NoPages(path.to_path_buf()));
    }
    Ok(pages)
}
